mod error;
mod extractor;
mod fetcher;
mod image_loader;
mod link_preview;
mod logging;
mod opener;
mod preview_state;
mod render;
mod thumbnail;
mod utils;
mod validator;

pub use error::PreviewError;
pub use extractor::MetadataExtractor;
pub use fetcher::{FetcherConfig, HttpMetadataFetcher, MetadataFetcher};
pub use image_loader::{
    HttpImageSource, ImageLoadState, ImageLoader, ImageLoaderConfig, ImageSource, Thumbnail,
};
pub use link_preview::{LinkPreview, LinkPreviewConfig};
#[cfg(feature = "logging")]
pub use logging::{setup_logging, LogConfig};
pub use logging::{log_error_card, log_preview_card};
pub use opener::LinkOpener;
pub use preview_state::{
    FailureReason, FetchTicket, Generation, LinkChange, PreviewMachine, PreviewState,
};
pub use render::{
    select_layout, thumbnail_view, Layout, Placeholder, RenderOptions, ThumbnailView,
};
pub use thumbnail::ThumbnailSlot;
pub use utils::truncate_str;
pub use validator::{ParsedUrl, UrlValidationConfig, UrlValidator};

/// Title, host and thumbnail reference describing a linked page.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinkMetadata {
    pub title: Option<String>,
    pub host: String,
    pub image_url: Option<String>,
}
