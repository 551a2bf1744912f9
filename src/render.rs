use crate::utils::truncate_str;
use crate::{ImageLoadState, PreviewState, Thumbnail};
use std::path::PathBuf;

pub const UNTITLED: &str = "Untitled";
pub const INVALID_LINK_HEADLINE: &str = "Provided link is invalid";

/// Looping animation shown while something is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub asset: PathBuf,
    pub looping: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub placeholder_asset: PathBuf,
    /// Display width (in terminal columns) the title is truncated to.
    pub title_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            placeholder_asset: PathBuf::from("files/loading.json"),
            title_width: 80,
        }
    }
}

impl RenderOptions {
    fn placeholder(&self) -> Placeholder {
        Placeholder {
            asset: self.placeholder_asset.clone(),
            looping: true,
        }
    }
}

/// What the thumbnail region of a successful preview shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailView {
    Placeholder,
    Image(Thumbnail),
    BrokenImage,
    /// The loader could not even be set up.
    LinkOff,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Loading {
        placeholder: Placeholder,
    },
    Preview {
        title: String,
        host: String,
        image_url: Option<String>,
        thumbnail: ThumbnailView,
        link: String,
    },
    Invalid {
        headline: &'static str,
        link: String,
    },
}

/// Maps the preview state onto one of the three card layouts.
pub fn select_layout(
    state: &PreviewState,
    link: &str,
    thumbnail: ThumbnailView,
    options: &RenderOptions,
) -> Layout {
    match state {
        PreviewState::Loading => Layout::Loading {
            placeholder: options.placeholder(),
        },
        PreviewState::Success(metadata) => Layout::Preview {
            title: truncate_str(
                metadata.title.as_deref().unwrap_or(UNTITLED),
                options.title_width,
            ),
            host: metadata.host.clone(),
            image_url: metadata.image_url.clone(),
            thumbnail,
            link: link.to_string(),
        },
        PreviewState::Failure(_) => Layout::Invalid {
            headline: INVALID_LINK_HEADLINE,
            link: link.to_string(),
        },
    }
}

pub fn thumbnail_view(state: &ImageLoadState) -> ThumbnailView {
    match state {
        ImageLoadState::Empty | ImageLoadState::Loading => ThumbnailView::Placeholder,
        ImageLoadState::Success(thumbnail) => ThumbnailView::Image(thumbnail.clone()),
        ImageLoadState::Error(_) => ThumbnailView::BrokenImage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FailureReason, LinkMetadata, PreviewError};

    #[test]
    fn test_loading_layout() {
        let layout = select_layout(
            &PreviewState::Loading,
            "https://example.com",
            ThumbnailView::Placeholder,
            &RenderOptions::default(),
        );
        assert_eq!(
            layout,
            Layout::Loading {
                placeholder: Placeholder {
                    asset: PathBuf::from("files/loading.json"),
                    looping: true,
                }
            }
        );
    }

    #[test]
    fn test_failure_layout_keeps_raw_link() {
        let state = PreviewState::Failure(FailureReason::InvalidUrl("bad".into()));
        let layout = select_layout(
            &state,
            "not a url",
            ThumbnailView::Placeholder,
            &RenderOptions::default(),
        );
        assert_eq!(
            layout,
            Layout::Invalid {
                headline: INVALID_LINK_HEADLINE,
                link: "not a url".to_string(),
            }
        );
    }

    #[test]
    fn test_success_layout_defaults_title() {
        let state = PreviewState::Success(LinkMetadata {
            title: None,
            host: "example.com".into(),
            image_url: None,
        });
        let layout = select_layout(
            &state,
            "https://example.com",
            ThumbnailView::BrokenImage,
            &RenderOptions::default(),
        );
        match layout {
            Layout::Preview {
                title,
                host,
                thumbnail,
                ..
            } => {
                assert_eq!(title, UNTITLED);
                assert_eq!(host, "example.com");
                assert_eq!(thumbnail, ThumbnailView::BrokenImage);
            }
            other => panic!("unexpected layout {other:?}"),
        }
    }

    #[test]
    fn test_long_title_is_truncated() {
        let state = PreviewState::Success(LinkMetadata {
            title: Some("A very long article title that keeps going".into()),
            host: "example.com".into(),
            image_url: None,
        });
        let options = RenderOptions {
            title_width: 16,
            ..RenderOptions::default()
        };
        match select_layout(&state, "https://example.com", ThumbnailView::Placeholder, &options) {
            Layout::Preview { title, .. } => assert_eq!(title, "A very long a..."),
            other => panic!("unexpected layout {other:?}"),
        }

        let narrow = RenderOptions {
            title_width: 2,
            ..RenderOptions::default()
        };
        match select_layout(&state, "https://example.com", ThumbnailView::Placeholder, &narrow) {
            Layout::Preview { title, .. } => assert_eq!(title, ".."),
            other => panic!("unexpected layout {other:?}"),
        }
    }

    #[test]
    fn test_thumbnail_view_mapping() {
        assert_eq!(thumbnail_view(&ImageLoadState::Empty), ThumbnailView::Placeholder);
        assert_eq!(thumbnail_view(&ImageLoadState::Loading), ThumbnailView::Placeholder);
        assert_eq!(
            thumbnail_view(&ImageLoadState::Error(PreviewError::MissingImageUrl)),
            ThumbnailView::BrokenImage
        );
    }
}
