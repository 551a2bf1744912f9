use crate::utils::{truncate_str, wrap_text};
use crate::LinkMetadata;
use std::fmt::Display;
use tracing::{error, info};

#[cfg(feature = "logging")]
pub use self::setup::{setup_logging, LogConfig};

fn create_separator(width: usize, ch: char) -> String {
    std::iter::repeat(ch).take(width).collect()
}

/// Logs a successful preview as a boxed card at info level.
pub fn log_preview_card(metadata: &LinkMetadata, link: &str) {
    const CARD_WIDTH: usize = 80;
    const CONTENT_WIDTH: usize = CARD_WIDTH - 2;

    let link_wrapped = wrap_text(link, CONTENT_WIDTH - 6);
    let title_wrapped = wrap_text(metadata.title.as_deref().unwrap_or("N/A"), CONTENT_WIDTH - 8);
    let host_wrapped = wrap_text(&metadata.host, CONTENT_WIDTH - 7);
    let image_wrapped = wrap_text(
        metadata.image_url.as_deref().unwrap_or("N/A"),
        CONTENT_WIDTH - 8,
    );

    let horizontal_line = create_separator(CARD_WIDTH - 2, '═');

    info!(
        "\n╔{}╗\n\
         Link: {}\n\
         Title: {}\n\
         Host: {}\n\
         Image: {}\n\
         ╚{}╝",
        horizontal_line,
        link_wrapped,
        title_wrapped,
        host_wrapped,
        image_wrapped,
        horizontal_line,
    );
}

/// Logs a failed preview, including the error's source chain head, at error level.
pub fn log_error_card<E: Display + std::error::Error>(link: &str, error: &E) {
    const CARD_WIDTH: usize = 70;
    const CONTENT_WIDTH: usize = CARD_WIDTH - 8;

    let top_bottom = create_separator(CARD_WIDTH - 2, '═');
    let middle = create_separator(CARD_WIDTH - 2, '─');

    let mut error_details = error.to_string();
    if let Some(source) = error.source() {
        error_details = format!("{error_details} (caused by: {source})");
    }

    error!(
        "\n╔═{}═╗\n\
         ║ Link:  {:<width$} ║\n\
         ║{}║\n\
         ║ Error: {:<width$} ║\n\
         ╚═{}═╝",
        top_bottom,
        truncate_str(link, CONTENT_WIDTH),
        middle,
        truncate_str(&error_details, CONTENT_WIDTH),
        top_bottom,
        width = CONTENT_WIDTH
    );
}

#[cfg(feature = "logging")]
mod setup {
    use std::path::PathBuf;
    use tracing::debug;
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{
        fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    #[derive(Debug, Clone)]
    pub struct LogConfig {
        pub log_dir: PathBuf,
        pub log_level: String,
        pub console_output: bool,
        pub file_output: bool,
    }

    impl Default for LogConfig {
        fn default() -> Self {
            Self {
                log_dir: "logs".into(),
                log_level: "info".into(),
                console_output: true,
                file_output: false,
            }
        }
    }

    /// Installs the global subscriber. `RUST_LOG` overrides `log_level` when set.
    pub fn setup_logging(
        config: LogConfig,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

        let mut layers = Vec::new();

        if config.console_output {
            let console_layer = subscriber_fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .compact();
            layers.push(console_layer.boxed());
        }

        if config.file_output {
            std::fs::create_dir_all(&config.log_dir)?;

            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "rich-link-preview.log");

            let file_layer = subscriber_fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_writer(file_appender);

            layers.push(file_layer.boxed());
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layers)
            .try_init()?;

        debug!("Logging system initialized with config: {:?}", config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PreviewError;

    #[test]
    fn test_separator() {
        assert_eq!(create_separator(3, '─'), "───");
    }

    #[test]
    fn test_cards_do_not_panic_without_subscriber() {
        let metadata = LinkMetadata {
            title: Some("Example".into()),
            host: "example.com".into(),
            image_url: None,
        };
        log_preview_card(&metadata, "https://example.com/article");
        log_error_card("not a url", &PreviewError::InvalidUrl("not a url".into()));
    }
}
