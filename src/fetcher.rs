use crate::{LinkMetadata, MetadataExtractor, ParsedUrl, PreviewError};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Source of [`LinkMetadata`] for a validated URL.
///
/// The preview pipeline only depends on this trait; callers that need a
/// bounded latency should enforce a timeout inside their implementation.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &ParsedUrl) -> Result<LinkMetadata, PreviewError>;
}

/// HTTP client settings shared by the default metadata and image fetchers.
///
/// # Examples
/// ```ignore
/// let fetcher = HttpMetadataFetcher::new()?;
///
/// // Using custom configuration
/// let custom = HttpMetadataFetcher::new_with_config(
///     FetcherConfig::default()
///         .with_user_agent("my-app/1.0")
///         .with_timeout(Duration::from_secs(5)),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub headers: Option<HeaderMap>,
    pub max_redirects: Option<usize>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("rich-link-preview/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(10),
            headers: None,
            max_redirects: None,
        }
    }
}

impl FetcherConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = Some(max_redirects);
        self
    }

    /// Builds a reqwest client; failure here is a setup error, not a fetch error.
    pub(crate) fn build_client(&self) -> Result<Client, PreviewError> {
        let mut client_builder = Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .pool_max_idle_per_host(10);

        if let Some(headers) = &self.headers {
            client_builder = client_builder.default_headers(headers.clone());
        }

        if let Some(max) = self.max_redirects {
            client_builder = client_builder.redirect(reqwest::redirect::Policy::limited(max));
        }

        client_builder.build().map_err(|e| {
            error!(error = %e, "Failed to create HTTP client");
            PreviewError::LoaderSetup(e.to_string())
        })
    }
}

/// Default [`MetadataFetcher`]: downloads the page and extracts Open Graph
/// and `<title>` metadata from it.
#[derive(Clone)]
pub struct HttpMetadataFetcher {
    client: Client,
    extractor: MetadataExtractor,
}

impl HttpMetadataFetcher {
    pub fn new() -> Result<Self, PreviewError> {
        debug!("Metadata fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default())
    }

    pub fn new_with_config(config: FetcherConfig) -> Result<Self, PreviewError> {
        Ok(Self::with_client(config.build_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            extractor: MetadataExtractor::new(),
        }
    }

    async fn fetch_html(&self, url: &ParsedUrl) -> Result<String, PreviewError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %url, "Failed to send request");
                PreviewError::from_reqwest(e, url.as_str())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content = response.text().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to read response body");
            PreviewError::from_reqwest(e, url.as_str())
        })?;

        debug!(url = %url, content_length = content.len(), "Successfully fetched webpage");
        Ok(content)
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    #[instrument(level = "debug", skip(self, url), fields(url = %url), err)]
    async fn fetch(&self, url: &ParsedUrl) -> Result<LinkMetadata, PreviewError> {
        let html = self.fetch_html(url).await?;
        Ok(self.extractor.extract(&html, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert!(config.user_agent.starts_with("rich-link-preview/"));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.headers.is_none());
    }

    #[test]
    fn test_builder_and_client() {
        let config = FetcherConfig::default()
            .with_user_agent("tester/1.0")
            .with_timeout(Duration::from_secs(3))
            .with_max_redirects(2);

        assert_eq!(config.user_agent, "tester/1.0");
        assert_eq!(config.max_redirects, Some(2));
        assert!(HttpMetadataFetcher::new_with_config(config).is_ok());
    }
}
