use crate::{FetcherConfig, PreviewError};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use image::{imageops::FilterType, ImageError, ImageFormat, RgbaImage};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Where thumbnail bytes come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, PreviewError>;
}

/// Default [`ImageSource`] backed by reqwest.
#[derive(Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(config: &FetcherConfig) -> Result<Self, PreviewError> {
        Ok(Self::with_client(config.build_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, PreviewError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PreviewError::from_reqwest(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PreviewError::from_reqwest(e, url))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct ImageLoaderConfig {
    pub fetcher: FetcherConfig,
    /// Target frame the decoded image is cropped to, in pixels.
    pub frame_width: u32,
    pub frame_height: u32,
    /// Bodies larger than this are rejected before decoding.
    pub max_bytes: usize,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            frame_width: 74,
            frame_height: 74,
            max_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ImageLoaderConfig {
    pub fn with_frame(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_fetcher(mut self, fetcher: FetcherConfig) -> Self {
        self.fetcher = fetcher;
        self
    }
}

/// A decoded image already cropped to the loader's target frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub format: ImageFormat,
    pub pixels: Arc<RgbaImage>,
}

impl Thumbnail {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImageLoadState {
    #[default]
    Empty,
    Loading,
    Success(Thumbnail),
    Error(PreviewError),
}

impl ImageLoadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImageLoadState::Success(_) | ImageLoadState::Error(_))
    }
}

#[derive(Clone)]
pub struct ImageLoader {
    source: Arc<dyn ImageSource>,
    config: ImageLoaderConfig,
}

impl ImageLoader {
    /// Builds a loader on top of [`HttpImageSource`].
    pub fn new(config: ImageLoaderConfig) -> Result<Self, PreviewError> {
        let source = HttpImageSource::new(&config.fetcher)?;
        Self::with_source(Arc::new(source), config)
    }

    pub fn with_source(
        source: Arc<dyn ImageSource>,
        config: ImageLoaderConfig,
    ) -> Result<Self, PreviewError> {
        if config.frame_width == 0 || config.frame_height == 0 {
            return Err(PreviewError::LoaderSetup(format!(
                "empty target frame {}x{}",
                config.frame_width, config.frame_height
            )));
        }
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &ImageLoaderConfig {
        &self.config
    }

    /// Emits `Loading`, then exactly one of `Success` or `Error`.
    ///
    /// An absent or blank URL fails fast with [`PreviewError::MissingImageUrl`]
    /// without touching the image source.
    pub fn load(&self, url: Option<&str>) -> BoxStream<'static, ImageLoadState> {
        let url = url.map(str::trim).filter(|u| !u.is_empty()).map(String::from);
        let loader = self.clone();

        let outcome = async move {
            let result = match url {
                None => Err(PreviewError::MissingImageUrl),
                Some(url) => loader.load_thumbnail(&url).await,
            };
            match result {
                Ok(thumbnail) => ImageLoadState::Success(thumbnail),
                Err(e) => {
                    e.log();
                    ImageLoadState::Error(e)
                }
            }
        };

        stream::once(async { ImageLoadState::Loading })
            .chain(stream::once(outcome))
            .boxed()
    }

    #[instrument(level = "debug", skip(self))]
    async fn load_thumbnail(&self, url: &str) -> Result<Thumbnail, PreviewError> {
        let bytes = self.source.fetch_bytes(url).await?;
        if bytes.len() > self.config.max_bytes {
            return Err(PreviewError::ContentTooLarge {
                size: bytes.len(),
                limit: self.config.max_bytes,
            });
        }

        debug!(url = %url, size = bytes.len(), "Decoding thumbnail");
        let (width, height) = (self.config.frame_width, self.config.frame_height);
        tokio::task::spawn_blocking(move || decode_thumbnail(&bytes, width, height))
            .await
            .map_err(|e| PreviewError::ImageDecodeError(e.to_string()))?
    }
}

/// Decodes `bytes` and scales it to cover the frame, cropping the overflow
/// around the centre.
pub(crate) fn decode_thumbnail(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> Result<Thumbnail, PreviewError> {
    let format = image::guess_format(bytes)
        .map_err(|e| PreviewError::UnsupportedImageFormat(e.to_string()))?;

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| match e {
        ImageError::Unsupported(e) => PreviewError::UnsupportedImageFormat(e.to_string()),
        other => PreviewError::ImageDecodeError(other.to_string()),
    })?;

    let cropped = decoded.resize_to_fill(width, height, FilterType::Triangle);
    Ok(Thumbnail {
        format,
        pixels: Arc::new(cropped.to_rgba8()),
    })
}
