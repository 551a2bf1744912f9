use crate::{LinkMetadata, ParsedUrl, PreviewError, UrlValidator};
use std::fmt;
use tracing::debug;

/// Why a preview ended up in [`PreviewState::Failure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The link failed structural validation; no fetch was attempted.
    InvalidUrl(String),
    /// The metadata fetch failed, timed out or returned something unusable.
    FetchError(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::InvalidUrl(e) => write!(f, "invalid link: {e}"),
            FailureReason::FetchError(e) => write!(f, "metadata fetch failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    Loading,
    Success(LinkMetadata),
    Failure(FailureReason),
}

impl PreviewState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PreviewState::Loading)
    }

    pub fn metadata(&self) -> Option<&LinkMetadata> {
        match self {
            PreviewState::Success(metadata) => Some(metadata),
            _ => None,
        }
    }
}

/// Monotonic token identifying one run of the pipeline for one link value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fetch the caller has to run, tagged with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: Generation,
    pub url: ParsedUrl,
}

/// Outcome of feeding a link into [`PreviewMachine::on_link_change`].
#[derive(Debug, Clone, PartialEq)]
pub enum LinkChange {
    /// Same link as before; the running pipeline is left alone.
    Unchanged,
    /// Validation failed and the state went straight to `Failure`.
    Invalid(PreviewError),
    /// Validation passed; the state is `Loading` until the ticket completes.
    Fetch(FetchTicket),
}

/// The preview state for one widget instance.
///
/// Every pipeline run bumps the generation. Fetch results are applied only
/// if they carry the current generation and the state is still `Loading`,
/// so a result for a superseded link can never overwrite a newer one.
#[derive(Debug, Clone)]
pub struct PreviewMachine {
    validator: UrlValidator,
    link: Option<String>,
    generation: Generation,
    state: PreviewState,
}

impl Default for PreviewMachine {
    fn default() -> Self {
        Self::new(UrlValidator::with_default_config())
    }
}

impl PreviewMachine {
    pub fn new(validator: UrlValidator) -> Self {
        Self {
            validator,
            link: None,
            generation: Generation::default(),
            state: PreviewState::Loading,
        }
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn on_link_change(&mut self, link: &str) -> LinkChange {
        if self.link.as_deref() == Some(link) {
            return LinkChange::Unchanged;
        }
        self.link = Some(link.to_string());
        self.restart()
    }

    /// Runs the pipeline again for the current link, as a fresh instance would.
    pub fn remount(&mut self) -> LinkChange {
        if self.link.is_none() {
            return LinkChange::Unchanged;
        }
        self.restart()
    }

    fn restart(&mut self) -> LinkChange {
        self.generation = self.generation.next();
        self.state = PreviewState::Loading;

        let link = self.link.as_deref().unwrap_or_default();
        match self.validator.validate(link) {
            Ok(url) => {
                debug!(generation = %self.generation, url = %url, "Issuing metadata fetch");
                LinkChange::Fetch(FetchTicket {
                    generation: self.generation,
                    url,
                })
            }
            Err(e) => {
                e.log();
                self.state = PreviewState::Failure(FailureReason::InvalidUrl(e.to_string()));
                LinkChange::Invalid(e)
            }
        }
    }

    /// Applies a fetch result. Returns `false` when the result was discarded.
    pub fn complete(
        &mut self,
        generation: Generation,
        result: Result<LinkMetadata, PreviewError>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                stale = %generation,
                current = %self.generation,
                "Discarding result for superseded link"
            );
            return false;
        }
        if self.state.is_terminal() {
            debug!(generation = %generation, "Ignoring result after terminal state");
            return false;
        }

        self.state = match result {
            Ok(metadata) => PreviewState::Success(metadata),
            Err(e) => {
                e.log();
                PreviewState::Failure(FailureReason::FetchError(e.to_string()))
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(title: &str) -> LinkMetadata {
        LinkMetadata {
            title: Some(title.to_string()),
            host: "example.com".to_string(),
            image_url: None,
        }
    }

    fn ticket(change: LinkChange) -> FetchTicket {
        match change {
            LinkChange::Fetch(ticket) => ticket,
            other => panic!("expected a fetch ticket, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_link_fails_without_fetch() {
        let mut machine = PreviewMachine::default();

        let change = machine.on_link_change("not a url");
        assert!(matches!(change, LinkChange::Invalid(_)));
        assert!(matches!(
            machine.state(),
            PreviewState::Failure(FailureReason::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_loading_then_success() {
        let mut machine = PreviewMachine::default();

        let ticket = ticket(machine.on_link_change("https://example.com/article"));
        assert_eq!(machine.state(), &PreviewState::Loading);
        assert_eq!(ticket.url.host(), "example.com");

        assert!(machine.complete(ticket.generation, Ok(metadata("Example"))));
        assert_eq!(machine.state(), &PreviewState::Success(metadata("Example")));
    }

    #[test]
    fn test_fetch_error_is_terminal() {
        let mut machine = PreviewMachine::default();
        let ticket = ticket(machine.on_link_change("https://example.com"));

        assert!(machine.complete(
            ticket.generation,
            Err(PreviewError::FetchError("connection reset".into()))
        ));
        assert!(matches!(
            machine.state(),
            PreviewState::Failure(FailureReason::FetchError(_))
        ));

        // a second completion for the same generation cannot flip the state
        assert!(!machine.complete(ticket.generation, Ok(metadata("Late"))));
        assert!(matches!(machine.state(), PreviewState::Failure(_)));
    }

    #[test]
    fn test_superseded_results_are_discarded() {
        let mut machine = PreviewMachine::default();

        let first = ticket(machine.on_link_change("https://one.example"));
        let second = ticket(machine.on_link_change("https://two.example"));
        let third = ticket(machine.on_link_change("https://three.example"));
        assert!(first.generation < second.generation && second.generation < third.generation);

        assert!(!machine.complete(first.generation, Ok(metadata("one"))));
        assert!(!machine.complete(second.generation, Ok(metadata("two"))));
        assert_eq!(machine.state(), &PreviewState::Loading);

        assert!(machine.complete(third.generation, Ok(metadata("three"))));
        assert_eq!(machine.state(), &PreviewState::Success(metadata("three")));
    }

    #[test]
    fn test_same_link_is_a_no_op() {
        let mut machine = PreviewMachine::default();
        let ticket = ticket(machine.on_link_change("https://example.com"));
        machine.complete(ticket.generation, Ok(metadata("Example")));

        assert_eq!(
            machine.on_link_change("https://example.com"),
            LinkChange::Unchanged
        );
        assert_eq!(machine.generation(), ticket.generation);
        assert!(machine.state().is_terminal());
    }

    #[test]
    fn test_remount_restarts_current_link() {
        let mut machine = PreviewMachine::default();
        assert_eq!(machine.remount(), LinkChange::Unchanged);

        let first = ticket(machine.on_link_change("https://example.com"));
        machine.complete(first.generation, Err(PreviewError::TimeoutError("slow".into())));

        let retry = ticket(machine.remount());
        assert!(retry.generation > first.generation);
        assert_eq!(machine.state(), &PreviewState::Loading);
        assert_eq!(machine.link(), Some("https://example.com"));
    }

    #[test]
    fn test_invalid_link_supersedes_pending_fetch() {
        let mut machine = PreviewMachine::default();
        let pending = ticket(machine.on_link_change("https://example.com"));

        machine.on_link_change("");
        assert!(!machine.complete(pending.generation, Ok(metadata("Example"))));
        assert!(matches!(
            machine.state(),
            PreviewState::Failure(FailureReason::InvalidUrl(_))
        ));
    }
}
