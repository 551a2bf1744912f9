/// Opens a link outside the preview, e.g. in the system browser.
///
/// Invoked only when a successful preview is activated. Fire-and-forget: the
/// preview never observes the outcome.
pub trait LinkOpener: Send + Sync {
    fn open(&self, link: &str);
}

impl<F> LinkOpener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn open(&self, link: &str) {
        self(link)
    }
}
