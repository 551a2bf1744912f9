use crate::error::PreviewError;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Configuration for URL validation
#[derive(Debug, Clone, Default)]
pub struct UrlValidationConfig {
    /// Allowed URL schemes. Empty means any scheme that carries an authority.
    pub allowed_schemes: HashSet<String>,
}

impl UrlValidationConfig {
    /// Restricts validation to `http` and `https`.
    pub fn web_only() -> Self {
        Self::default().with_schemes(["http", "https"])
    }

    pub fn with_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_schemes
            .extend(schemes.into_iter().map(|s| s.into().to_ascii_lowercase()));
        self
    }
}

/// An absolute URL that passed validation: it has a scheme and a non-empty host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedUrl {
    url: Url,
}

impl ParsedUrl {
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        // validated on construction
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Resolves a possibly relative reference (e.g. an `og:image` path) against this URL.
    pub fn join(&self, reference: &str) -> Result<Url, PreviewError> {
        Ok(self.url.join(reference)?)
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Validates raw link strings into [`ParsedUrl`]s. Pure, never touches the network.
#[derive(Debug, Clone, Default)]
pub struct UrlValidator {
    config: UrlValidationConfig,
}

impl UrlValidator {
    pub fn new(config: UrlValidationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(UrlValidationConfig::default())
    }

    /// Validates a URL string
    pub fn validate(&self, raw: &str) -> Result<ParsedUrl, PreviewError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PreviewError::InvalidUrl("empty link".to_string()));
        }

        let url = Url::parse(trimmed)?;

        if url.cannot_be_a_base() {
            return Err(PreviewError::InvalidUrl(format!(
                "{trimmed}: missing authority"
            )));
        }

        if !self.config.allowed_schemes.is_empty()
            && !self.config.allowed_schemes.contains(url.scheme())
        {
            return Err(PreviewError::InvalidUrlScheme(url.scheme().to_string()));
        }

        // The parser repairs inputs like `http:host`; require `scheme://host` as written.
        if raw_authority(trimmed).is_none() {
            return Err(PreviewError::InvalidUrl(format!(
                "{trimmed}: missing authority"
            )));
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => {
                return Err(PreviewError::InvalidUrl(format!(
                    "{trimmed}: missing host"
                )))
            }
        }

        Ok(ParsedUrl { url })
    }
}

/// Returns the authority exactly as written between `scheme://` and the path.
fn raw_authority(raw: &str) -> Option<&str> {
    let (_, rest) = raw.split_once(':')?;
    let after = rest.strip_prefix("//")?;
    let end = after
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(after.len());
    let authority = &after[..end];
    if authority.is_empty() || authority.contains('\\') {
        return None;
    }
    Some(authority)
}
