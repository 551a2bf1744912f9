use crate::render::{select_layout, Layout, RenderOptions};
use crate::{
    Generation, ImageLoader, ImageLoaderConfig, LinkChange, LinkMetadata, LinkOpener,
    MetadataFetcher, PreviewError, PreviewMachine, PreviewState, ThumbnailSlot,
    UrlValidationConfig, UrlValidator,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, instrument};

#[derive(Debug, Clone, Default)]
pub struct LinkPreviewConfig {
    pub validation: UrlValidationConfig,
    pub render: RenderOptions,
    pub image_loader: ImageLoaderConfig,
}

impl LinkPreviewConfig {
    pub fn with_validation(mut self, validation: UrlValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_placeholder_asset(mut self, asset: impl Into<PathBuf>) -> Self {
        self.render.placeholder_asset = asset.into();
        self
    }

    pub fn with_title_width(mut self, title_width: usize) -> Self {
        self.render.title_width = title_width;
        self
    }

    pub fn with_image_loader(mut self, image_loader: ImageLoaderConfig) -> Self {
        self.image_loader = image_loader;
        self
    }
}

struct Completion {
    generation: Generation,
    result: Result<LinkMetadata, PreviewError>,
}

/// One rich link preview widget instance.
///
/// Owns the preview state for a single link and runs at most one logical
/// fetch at a time: changing the link aborts the running fetch, starts a new
/// pipeline run and discards any result already queued by an older run. Fetches run as tokio
/// tasks; their results are applied on the owner's task through
/// [`process_next`](Self::process_next) or [`settle`](Self::settle).
/// Dropping the preview aborts all of its tasks.
pub struct LinkPreview {
    machine: PreviewMachine,
    fetcher: Arc<dyn MetadataFetcher>,
    opener: Arc<dyn LinkOpener>,
    render: RenderOptions,
    thumbnail: ThumbnailSlot,
    tasks: JoinSet<()>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    state_tx: watch::Sender<PreviewState>,
}

impl LinkPreview {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, opener: Arc<dyn LinkOpener>) -> Self {
        Self::new_with_config(fetcher, opener, LinkPreviewConfig::default())
    }

    /// Builds the preview with the default HTTP thumbnail loader. A loader
    /// that cannot be set up degrades the thumbnail, not the preview.
    pub fn new_with_config(
        fetcher: Arc<dyn MetadataFetcher>,
        opener: Arc<dyn LinkOpener>,
        config: LinkPreviewConfig,
    ) -> Self {
        let loader = ImageLoader::new(config.image_loader.clone());
        Self::with_image_loader(fetcher, opener, config, loader)
    }

    pub fn with_image_loader(
        fetcher: Arc<dyn MetadataFetcher>,
        opener: Arc<dyn LinkOpener>,
        config: LinkPreviewConfig,
        loader: Result<ImageLoader, PreviewError>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(PreviewState::Loading);
        Self {
            machine: PreviewMachine::new(UrlValidator::new(config.validation)),
            fetcher,
            opener,
            render: config.render,
            thumbnail: ThumbnailSlot::new(loader),
            tasks: JoinSet::new(),
            completions_tx,
            completions_rx,
            state_tx,
        }
    }

    pub fn state(&self) -> &PreviewState {
        self.machine.state()
    }

    pub fn link(&self) -> Option<&str> {
        self.machine.link()
    }

    /// Receives every state the preview moves through, latest value first.
    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.state_tx.subscribe()
    }

    pub fn thumbnail(&self) -> &ThumbnailSlot {
        &self.thumbnail
    }

    pub fn thumbnail_mut(&mut self) -> &mut ThumbnailSlot {
        &mut self.thumbnail
    }

    /// Feeds a (possibly new) link into the pipeline.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(level = "debug", skip(self, link), fields(link = %link.as_ref()))]
    pub fn set_link(&mut self, link: impl AsRef<str>) -> &PreviewState {
        let change = self.machine.on_link_change(link.as_ref());
        self.handle_change(change);
        self.machine.state()
    }

    /// Restarts the pipeline for the current link.
    pub fn remount(&mut self) -> &PreviewState {
        let change = self.machine.remount();
        self.handle_change(change);
        self.machine.state()
    }

    fn handle_change(&mut self, change: LinkChange) {
        match change {
            LinkChange::Unchanged => {}
            LinkChange::Invalid(_) => {
                self.tasks.abort_all();
                self.thumbnail.hide();
                self.state_tx.send_replace(PreviewState::Loading);
                self.publish();
            }
            LinkChange::Fetch(ticket) => {
                self.thumbnail.hide();
                self.publish();
                self.tasks.abort_all();
                while self.tasks.try_join_next().is_some() {}

                let fetcher = Arc::clone(&self.fetcher);
                let tx = self.completions_tx.clone();
                self.tasks.spawn(async move {
                    let result = AssertUnwindSafe(fetcher.fetch(&ticket.url))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            error!(url = %ticket.url, "Metadata fetcher panicked");
                            Err(PreviewError::FetchError("metadata fetcher panicked".into()))
                        });
                    let _ = tx.send(Completion {
                        generation: ticket.generation,
                        result,
                    });
                });
            }
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.machine.state().clone());
    }

    /// Waits for the next fetch completion and applies it. Returns `false`
    /// when the preview is not loading or the completion was stale.
    pub async fn process_next(&mut self) -> bool {
        if self.machine.state().is_terminal() || self.machine.link().is_none() {
            return false;
        }
        let Some(completion) = self.completions_rx.recv().await else {
            return false;
        };
        if !self.machine.complete(completion.generation, completion.result) {
            return false;
        }

        if let PreviewState::Success(metadata) = self.machine.state() {
            debug!(host = %metadata.host, "Preview loaded");
            let image_url = metadata.image_url.clone();
            self.thumbnail.show(image_url.as_deref());
        }
        self.publish();
        true
    }

    /// Pumps completions until the current link reaches a terminal state.
    pub async fn settle(&mut self) -> &PreviewState {
        while !self.machine.state().is_terminal() && self.machine.link().is_some() {
            self.process_next().await;
        }
        self.machine.state()
    }

    /// Current card layout.
    pub fn render(&self) -> Layout {
        select_layout(
            self.machine.state(),
            self.machine.link().unwrap_or_default(),
            self.thumbnail.view(),
            &self.render,
        )
    }

    /// Handles a user activating the card. Only a successful preview opens
    /// its link; returns whether the opener was invoked.
    pub fn activate(&self) -> bool {
        match (self.machine.state(), self.machine.link()) {
            (PreviewState::Success(_), Some(link)) => {
                debug!(link = %link, "Opening link");
                self.opener.open(link);
                true
            }
            _ => false,
        }
    }
}
