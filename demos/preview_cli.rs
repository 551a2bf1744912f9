use clap::Parser;
use rich_link_preview::{
    log_error_card, log_preview_card, FetcherConfig, HttpMetadataFetcher, ImageLoaderConfig,
    Layout, LinkOpener, LinkPreview, LinkPreviewConfig, PreviewError, PreviewState,
    ThumbnailView, UrlValidationConfig,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

/// Render rich link previews for the given links.
#[derive(Parser, Debug)]
struct Args {
    /// Links to preview
    #[arg(required = true)]
    links: Vec<String>,

    /// Request timeout in seconds for page and image fetches
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Only accept http and https links
    #[arg(long)]
    web_only: bool,

    /// Activate each successful preview (prints the link that would be opened)
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Args::parse();

    #[cfg(feature = "logging")]
    rich_link_preview::setup_logging(rich_link_preview::LogConfig::default())?;

    let fetcher_config = FetcherConfig::default().with_timeout(Duration::from_secs(args.timeout));
    let fetcher = Arc::new(HttpMetadataFetcher::new_with_config(fetcher_config.clone())?);
    let opener: Arc<dyn LinkOpener> = Arc::new(|link: &str| println!("-> opening {link}"));

    let validation = if args.web_only {
        UrlValidationConfig::web_only()
    } else {
        UrlValidationConfig::default()
    };
    let config = LinkPreviewConfig::default()
        .with_validation(validation)
        .with_image_loader(ImageLoaderConfig::default().with_fetcher(fetcher_config));

    for link in &args.links {
        let mut preview =
            LinkPreview::new_with_config(fetcher.clone(), opener.clone(), config.clone());
        preview.set_link(link);
        preview.settle().await;
        preview.thumbnail_mut().settle().await;

        match preview.state() {
            PreviewState::Success(metadata) => log_preview_card(metadata, link),
            PreviewState::Failure(reason) => {
                log_error_card(link, &PreviewError::FetchError(reason.to_string()))
            }
            PreviewState::Loading => {}
        }

        match preview.render() {
            Layout::Preview {
                title,
                host,
                thumbnail,
                ..
            } => {
                let thumb = match thumbnail {
                    ThumbnailView::Image(t) => {
                        format!("{}x{} {:?}", t.width(), t.height(), t.format)
                    }
                    ThumbnailView::BrokenImage => "broken image".to_string(),
                    ThumbnailView::LinkOff => "link off".to_string(),
                    ThumbnailView::Placeholder => "loading".to_string(),
                };
                println!("[{thumb}] {title}\n    {host}");
            }
            Layout::Invalid { headline, link } => println!("{headline}\n    {link}"),
            Layout::Loading { .. } => println!("loading {link}"),
        }

        if args.open {
            preview.activate();
        }
    }

    Ok(())
}
