use crate::{LinkMetadata, ParsedUrl};
use scraper::{Html, Selector};
use tracing::debug;

/// Metadata extractor, responsible for turning webpage content into [`LinkMetadata`]
#[derive(Clone, Debug, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, html: &str, url: &ParsedUrl) -> LinkMetadata {
        let document = Html::parse_document(html);

        let title = self.extract_title(&document);
        let image_url = self
            .extract_image(&document)
            .and_then(|raw| self.resolve_image(url, &raw));

        debug!(url = %url, title = ?title, image_url = ?image_url, "Extracted link metadata");

        LinkMetadata {
            title,
            host: url.host().to_string(),
            image_url,
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        let meta_selector =
            Selector::parse("meta[property='og:title'], meta[name='twitter:title']").ok()?;
        let title_selector = Selector::parse("title").ok()?;

        let meta_title = document
            .select(&meta_selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from);

        // Fall back to the document <title>
        meta_title.or_else(|| {
            document
                .select(&title_selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty())
        })
    }

    fn extract_image(&self, document: &Html) -> Option<String> {
        let og_image_selector = Selector::parse(
            "meta[property='og:image'], meta[property='og:image:url'], meta[name='twitter:image'], meta[itemprop='image']",
        )
        .ok()?;

        document
            .select(&og_image_selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from)
    }

    fn resolve_image(&self, page: &ParsedUrl, raw: &str) -> Option<String> {
        match page.join(raw) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(e) => {
                debug!(image = %raw, error = %e, "Dropping unresolvable image reference");
                None
            }
        }
    }
}
