use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreviewError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL scheme not allowed: {0}")]
    InvalidUrlScheme(String),

    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request timeout: {0}")]
    TimeoutError(String),

    #[error("Failed to extract metadata: {0}")]
    ExtractError(String),

    #[error("No image URL to load")]
    MissingImageUrl,

    #[error("Image body too large: {size} bytes (limit {limit})")]
    ContentTooLarge { size: usize, limit: usize },

    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("Failed to decode image: {0}")]
    ImageDecodeError(String),

    #[error("Failed to set up image loader: {0}")]
    LoaderSetup(String),
}

impl PreviewError {
    /// Maps a transport error from reqwest onto the taxonomy, keeping
    /// timeouts and status failures apart from generic fetch errors.
    pub(crate) fn from_reqwest(e: reqwest::Error, url: &str) -> Self {
        if e.is_timeout() {
            PreviewError::TimeoutError(format!("{url}: {e}"))
        } else if let Some(status) = e.status() {
            PreviewError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else {
            PreviewError::FetchError(e.to_string())
        }
    }

    pub fn log(&self) {
        match self {
            PreviewError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            PreviewError::InvalidUrl(e) => {
                warn!(error = %e, "URL rejected by validator");
            }
            PreviewError::InvalidUrlScheme(scheme) => {
                warn!(scheme = %scheme, "URL scheme not allowed");
            }
            PreviewError::FetchError(e) => {
                error!(error = %e, "Content fetch failed");
            }
            PreviewError::HttpStatus { status, url } => {
                warn!(status = *status, url = %url, "Non-success HTTP status");
            }
            PreviewError::TimeoutError(e) => {
                warn!(error = %e, "Request timed out");
            }
            PreviewError::ExtractError(e) => {
                error!(error = %e, "Metadata extraction failed");
            }
            PreviewError::MissingImageUrl => {
                warn!("Thumbnail has no image URL");
            }
            PreviewError::ContentTooLarge { size, limit } => {
                warn!(size = *size, limit = *limit, "Image body exceeds limit");
            }
            PreviewError::UnsupportedImageFormat(e) => {
                warn!(error = %e, "Unsupported image format");
            }
            PreviewError::ImageDecodeError(e) => {
                warn!(error = %e, "Image decode failed");
            }
            PreviewError::LoaderSetup(e) => {
                error!(error = %e, "Image loader setup failed");
            }
        }
    }
}
