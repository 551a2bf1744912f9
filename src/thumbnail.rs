use crate::render::{thumbnail_view, ThumbnailView};
use crate::{ImageLoadState, ImageLoader, PreviewError};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

struct Emission {
    generation: u64,
    state: ImageLoadState,
}

/// Drives the image loader for one visible thumbnail.
///
/// Holds the loader setup result rather than the loader itself: a loader
/// that failed to build degrades the slot to [`ThumbnailView::LinkOff`]
/// instead of failing the surrounding preview. Changing or hiding the target
/// aborts the previous load, and emissions are tagged with a generation so
/// anything it had already queued is dropped.
pub struct ThumbnailSlot {
    loader: Result<Arc<ImageLoader>, PreviewError>,
    target: Option<Option<String>>,
    generation: u64,
    state: ImageLoadState,
    tasks: JoinSet<()>,
    emissions_tx: mpsc::UnboundedSender<Emission>,
    emissions_rx: mpsc::UnboundedReceiver<Emission>,
}

impl ThumbnailSlot {
    pub fn new(loader: Result<ImageLoader, PreviewError>) -> Self {
        if let Err(e) = &loader {
            warn!(error = %e, "Thumbnail loader unavailable, showing link-off glyph");
        }
        let (emissions_tx, emissions_rx) = mpsc::unbounded_channel();
        Self {
            loader: loader.map(Arc::new),
            target: None,
            generation: 0,
            state: ImageLoadState::Empty,
            tasks: JoinSet::new(),
            emissions_tx,
            emissions_rx,
        }
    }

    pub fn state(&self) -> &ImageLoadState {
        &self.state
    }

    pub fn view(&self) -> ThumbnailView {
        match &self.loader {
            Ok(_) => thumbnail_view(&self.state),
            Err(_) => ThumbnailView::LinkOff,
        }
    }

    /// Makes the thumbnail visible for `url`; a no-op if it already shows it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn show(&mut self, url: Option<&str>) {
        let target = url.map(String::from);
        if self.target.as_ref() == Some(&target) {
            return;
        }
        self.generation += 1;
        self.target = Some(target);

        let Ok(loader) = &self.loader else {
            return;
        };

        self.state = ImageLoadState::Loading;
        self.tasks.abort_all();
        while self.tasks.try_join_next().is_some() {}

        let generation = self.generation;
        let tx = self.emissions_tx.clone();
        let mut states = loader.load(url);
        self.tasks.spawn(async move {
            while let Some(state) = states.next().await {
                if tx.send(Emission { generation, state }).is_err() {
                    break;
                }
            }
        });
    }

    /// Hides the thumbnail and cancels anything still loading for it.
    pub fn hide(&mut self) {
        if self.target.take().is_some() {
            self.generation += 1;
        }
        self.tasks.abort_all();
        self.state = ImageLoadState::Empty;
    }

    /// Waits for the next emission and applies it if it belongs to the
    /// current target. Returns `false` when nothing is pending or the
    /// emission was stale.
    pub async fn process_next(&mut self) -> bool {
        if self.state != ImageLoadState::Loading {
            return false;
        }
        let Some(emission) = self.emissions_rx.recv().await else {
            return false;
        };
        if emission.generation != self.generation {
            debug!(
                stale = emission.generation,
                current = self.generation,
                "Discarding thumbnail state for superseded target"
            );
            return false;
        }
        self.state = emission.state;
        true
    }

    /// Pumps emissions until the current load reaches `Success` or `Error`.
    pub async fn settle(&mut self) -> &ImageLoadState {
        while self.state == ImageLoadState::Loading {
            self.process_next().await;
        }
        &self.state
    }
}
