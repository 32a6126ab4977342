//! Clipboard capture use case
//!
//! Each capture arms a one-shot paste listener in the session page, presses
//! the paste chord, and returns whatever the listener pulled out of the
//! resulting paste event. The listener is always armed before the chord is
//! sent and always disarmed afterwards, whichever way the capture ends.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::clipboard::{
    CaptureFailure, CaptureOutcome, CaptureRequest, ClipboardFile, ClipboardSnapshot, PasteKey,
    PasteModifier,
};

use super::ports::{AutomationError, BrowserLauncher, CapturePage, ListenerId};
use super::session::{SessionError, SessionManager};

/// Errors from the capture use case.
///
/// Everything else that can go wrong during a capture is reported through
/// [`CaptureOutcome::Failed`].
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Reading clipboard format \"{0}\" is not supported")]
    UnsupportedFormat(String),
}

/// Clipboard capture engine over one browser session
pub struct CaptureEngine<L: BrowserLauncher> {
    sessions: SessionManager<L>,
    modifier: PasteModifier,
    capture_timeout: Option<Duration>,
}

impl<L: BrowserLauncher> CaptureEngine<L> {
    /// Create an engine owning `sessions`, using the platform paste modifier
    /// and no capture timeout.
    pub fn new(sessions: SessionManager<L>) -> Self {
        Self {
            sessions,
            modifier: PasteModifier::platform_default(),
            capture_timeout: None,
        }
    }

    /// Use `modifier` for the paste chord
    pub fn with_modifier(mut self, modifier: PasteModifier) -> Self {
        self.modifier = modifier;
        self
    }

    /// Give up on a paste event after `timeout` instead of waiting forever
    pub fn with_capture_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// The session manager backing this engine
    pub fn sessions(&self) -> &SessionManager<L> {
        &self.sessions
    }

    /// Format names advertised by the paste event
    pub async fn clipboard_types(&self) -> Result<CaptureOutcome<Vec<String>>, CaptureError> {
        let outcome = self.capture(CaptureRequest::Types).await?;
        Ok(narrow(outcome, ClipboardSnapshot::into_types))
    }

    /// The `text/plain` slot
    pub async fn clipboard_plain_text(&self) -> Result<CaptureOutcome<String>, CaptureError> {
        let outcome = self.capture(CaptureRequest::PlainText).await?;
        Ok(narrow(outcome, ClipboardSnapshot::into_text))
    }

    /// The `text/html` slot
    pub async fn clipboard_rich_text(&self) -> Result<CaptureOutcome<String>, CaptureError> {
        let outcome = self.capture(CaptureRequest::RichText).await?;
        Ok(narrow(outcome, ClipboardSnapshot::into_html))
    }

    /// The first file of the paste event; further files are ignored
    pub async fn clipboard_file(&self) -> Result<CaptureOutcome<ClipboardFile>, CaptureError> {
        let outcome = self.capture(CaptureRequest::File).await?;
        Ok(narrow(outcome, ClipboardSnapshot::into_file))
    }

    /// Reading an arbitrary named format is not possible through a paste
    /// event, so this always fails without touching the browser.
    pub async fn clipboard_format(
        &self,
        format: &str,
    ) -> Result<CaptureOutcome<Vec<u8>>, CaptureError> {
        debug!(format, "arbitrary clipboard format requested");
        Err(CaptureError::UnsupportedFormat(format.to_string()))
    }

    /// Run one capture for `request`.
    ///
    /// Only a session that cannot be made ready is an error; every later
    /// failure becomes an outcome.
    pub async fn capture(
        &self,
        request: CaptureRequest,
    ) -> Result<CaptureOutcome<ClipboardSnapshot>, CaptureError> {
        let page = self.sessions.ensure_ready().await?;

        let listener = match page.arm_listener(request).await {
            Ok(listener) => listener,
            Err(e) => {
                warn!(%request, error = %e, "arming paste listener failed");
                return Ok(CaptureOutcome::Failed(CaptureFailure::Extraction(
                    e.to_string(),
                )));
            }
        };
        debug!(%request, %listener, "paste listener armed");

        let outcome = self.paste_and_collect(page.as_ref(), request, &listener).await;

        if let Err(e) = page.disarm(&listener).await {
            debug!(%listener, error = %e, "disarming paste listener failed");
        }

        Ok(outcome)
    }

    async fn paste_and_collect(
        &self,
        page: &dyn CapturePage,
        request: CaptureRequest,
        listener: &ListenerId,
    ) -> CaptureOutcome<ClipboardSnapshot> {
        if let Err(e) = self.press_paste_chord(page).await {
            warn!(%request, error = %e, "paste injection failed");
            return CaptureOutcome::Failed(CaptureFailure::Injection(e.to_string()));
        }

        let collected = match self.capture_timeout {
            Some(limit) => match tokio::time::timeout(limit, page.collect(listener)).await {
                Ok(collected) => collected,
                Err(_) => {
                    warn!(%request, ?limit, "no paste event before capture timeout");
                    return CaptureOutcome::Failed(CaptureFailure::TimedOut(limit));
                }
            },
            None => page.collect(listener).await,
        };

        match collected {
            Ok(Some(snapshot)) if snapshot.request() == request => {
                debug!(%request, "clipboard captured");
                CaptureOutcome::Captured(snapshot)
            }
            Ok(Some(snapshot)) => CaptureOutcome::Failed(CaptureFailure::Extraction(format!(
                "listener for {} returned {}",
                request,
                snapshot.request()
            ))),
            Ok(None) => {
                debug!(%request, "nothing of this kind on the clipboard");
                CaptureOutcome::Unavailable
            }
            Err(e) => {
                warn!(%request, error = %e, "clipboard extraction failed");
                CaptureOutcome::Failed(CaptureFailure::Extraction(e.to_string()))
            }
        }
    }

    /// Modifier down, V, modifier up. The modifier is released even when
    /// the V press fails.
    async fn press_paste_chord(&self, page: &dyn CapturePage) -> Result<(), AutomationError> {
        let modifier = self.modifier.key();
        page.key_down(modifier).await?;
        let pressed = page.key_press(PasteKey::V).await;
        let released = page.key_up(modifier).await;
        pressed.and(released)
    }
}

fn narrow<T>(
    outcome: CaptureOutcome<ClipboardSnapshot>,
    project: fn(ClipboardSnapshot) -> Option<T>,
) -> CaptureOutcome<T> {
    match outcome {
        CaptureOutcome::Captured(snapshot) => {
            let request = snapshot.request();
            match project(snapshot) {
                Some(value) => CaptureOutcome::Captured(value),
                None => CaptureOutcome::Failed(CaptureFailure::Extraction(format!(
                    "unexpected {} payload",
                    request
                ))),
            }
        }
        CaptureOutcome::Unavailable => CaptureOutcome::Unavailable,
        CaptureOutcome::Failed(failure) => CaptureOutcome::Failed(failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fakes::{launch_options, FakeClipboard, FakeLauncher, FakePage};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn engine_with(
        clipboard: FakeClipboard,
    ) -> (
        CaptureEngine<Arc<FakeLauncher>>,
        Arc<FakeLauncher>,
        Arc<FakePage>,
    ) {
        let page = FakePage::with_clipboard(clipboard);
        let launcher = FakeLauncher::new(Arc::clone(&page));
        let engine = CaptureEngine::new(SessionManager::new(
            Arc::clone(&launcher),
            launch_options(),
        ))
        .with_modifier(PasteModifier::Control);
        (engine, launcher, page)
    }

    #[tokio::test]
    async fn plain_text_clipboard() {
        let (engine, _, _) = engine_with(FakeClipboard::plain("hello"));

        assert_eq!(
            engine.clipboard_types().await.unwrap(),
            CaptureOutcome::Captured(vec!["text/plain".to_string()])
        );
        assert_eq!(
            engine.clipboard_plain_text().await.unwrap(),
            CaptureOutcome::Captured("hello".to_string())
        );
        assert_eq!(
            engine.clipboard_rich_text().await.unwrap(),
            CaptureOutcome::Unavailable
        );
    }

    #[tokio::test]
    async fn html_clipboard() {
        let (engine, _, _) = engine_with(FakeClipboard::html("<b>hi</b>", "hi"));

        assert_eq!(
            engine.clipboard_types().await.unwrap(),
            CaptureOutcome::Captured(vec!["text/plain".to_string(), "text/html".to_string()])
        );
        assert_eq!(
            engine.clipboard_rich_text().await.unwrap(),
            CaptureOutcome::Captured("<b>hi</b>".to_string())
        );
        assert_eq!(
            engine.clipboard_plain_text().await.unwrap(),
            CaptureOutcome::Captured("hi".to_string())
        );
    }

    #[tokio::test]
    async fn single_file_clipboard() {
        let report = ClipboardFile::new("report.pdf", "application/pdf", vec![1, 2, 3]);
        let (engine, _, _) = engine_with(FakeClipboard::files(vec![report.clone()]));

        assert_eq!(
            engine.clipboard_file().await.unwrap(),
            CaptureOutcome::Captured(report)
        );
    }

    #[tokio::test]
    async fn only_first_file_is_returned() {
        let first = ClipboardFile::new("a.txt", "text/plain", b"a".to_vec());
        let second = ClipboardFile::new("b.txt", "text/plain", b"b".to_vec());
        let (engine, _, _) = engine_with(FakeClipboard::files(vec![first.clone(), second]));

        assert_eq!(
            engine.clipboard_file().await.unwrap(),
            CaptureOutcome::Captured(first)
        );
    }

    #[tokio::test]
    async fn empty_clipboard_never_errors() {
        let (engine, _, _) = engine_with(FakeClipboard::empty());

        assert_eq!(
            engine.clipboard_types().await.unwrap(),
            CaptureOutcome::Captured(Vec::new())
        );
        assert!(engine.clipboard_plain_text().await.unwrap().is_unavailable());
        assert!(engine.clipboard_rich_text().await.unwrap().is_unavailable());
        assert!(engine.clipboard_file().await.unwrap().is_unavailable());
    }

    #[tokio::test]
    async fn empty_string_is_not_unavailable() {
        let (engine, _, _) = engine_with(FakeClipboard::plain(""));

        assert_eq!(
            engine.clipboard_plain_text().await.unwrap(),
            CaptureOutcome::Captured(String::new())
        );
    }

    #[tokio::test]
    async fn listener_is_armed_before_chord_and_disarmed_after() {
        let (engine, _, page) = engine_with(FakeClipboard::plain("hello"));
        engine.sessions().ensure_ready().await.unwrap();

        for request in CaptureRequest::all() {
            page.clear_calls();
            engine.capture(*request).await.unwrap();
            assert_eq!(
                page.calls(),
                vec![
                    format!("arm {}", request),
                    "down Control".to_string(),
                    "press v".to_string(),
                    "up Control".to_string(),
                    "collect".to_string(),
                    "disarm".to_string(),
                ]
            );
        }
        assert_eq!(page.armed_count(), 0);
    }

    #[tokio::test]
    async fn meta_modifier_is_used_when_configured() {
        let (engine, _, page) = engine_with(FakeClipboard::plain("hello"));
        let engine = engine.with_modifier(PasteModifier::Meta);

        let text = engine.clipboard_plain_text().await.unwrap();

        assert_eq!(text, CaptureOutcome::Captured("hello".to_string()));
        assert!(page.calls().contains(&"down Meta".to_string()));
    }

    #[tokio::test]
    async fn injection_failure_is_an_outcome_and_cleans_up() {
        let (engine, _, page) = engine_with(FakeClipboard::plain("hello"));
        page.fail_press.store(true, Ordering::SeqCst);

        let outcome = engine.clipboard_plain_text().await.unwrap();

        assert!(matches!(
            outcome,
            CaptureOutcome::Failed(CaptureFailure::Injection(_))
        ));
        let calls = page.calls();
        assert!(!calls.contains(&"collect".to_string()));
        assert!(calls.contains(&"up Control".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("disarm"));
        assert_eq!(page.armed_count(), 0);
    }

    #[tokio::test]
    async fn extraction_failure_is_an_outcome() {
        let (engine, _, page) = engine_with(FakeClipboard::plain("hello"));
        page.fail_collect.store(true, Ordering::SeqCst);

        let outcome = engine.clipboard_types().await.unwrap();

        assert!(matches!(
            outcome,
            CaptureOutcome::Failed(CaptureFailure::Extraction(_))
        ));
        assert_eq!(page.calls().last().map(String::as_str), Some("disarm"));
    }

    #[tokio::test]
    async fn arm_failure_skips_the_chord() {
        let (engine, _, page) = engine_with(FakeClipboard::plain("hello"));
        page.fail_arm.store(true, Ordering::SeqCst);

        let outcome = engine.clipboard_plain_text().await.unwrap();

        assert!(outcome.is_failed());
        assert!(!page.calls().iter().any(|c| c.starts_with("press")));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_paste_event_times_out_when_bounded() {
        let (engine, _, page) = engine_with(FakeClipboard::plain("hello"));
        page.swallow_paste.store(true, Ordering::SeqCst);
        let engine = engine.with_capture_timeout(Some(Duration::from_secs(3)));

        let outcome = engine.clipboard_plain_text().await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Failed(CaptureFailure::TimedOut(Duration::from_secs(3)))
        );
        assert_eq!(page.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_paste_event_waits_when_unbounded() {
        let (engine, _, page) = engine_with(FakeClipboard::plain("hello"));
        page.swallow_paste.store(true, Ordering::SeqCst);

        let waited =
            tokio::time::timeout(Duration::from_secs(60), engine.clipboard_plain_text()).await;

        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn unsupported_format_touches_nothing() {
        let (engine, launcher, page) = engine_with(FakeClipboard::plain("hello"));

        let err = engine.clipboard_format("text/csv").await.unwrap_err();

        assert!(matches!(err, CaptureError::UnsupportedFormat(ref f) if f == "text/csv"));
        assert!(err.to_string().contains("not supported"));
        assert_eq!(launcher.launches(), 0);
        assert!(page.calls().is_empty());
    }

    #[tokio::test]
    async fn launch_failure_is_the_only_error() {
        let (engine, launcher, _) = engine_with(FakeClipboard::plain("hello"));
        launcher.fail_launch.store(true, Ordering::SeqCst);

        let err = engine.clipboard_plain_text().await.unwrap_err();

        assert!(matches!(err, CaptureError::Session(_)));
    }

    #[tokio::test]
    async fn capture_after_disconnect_relaunches_once() {
        let (engine, launcher, _) = engine_with(FakeClipboard::plain("hello"));

        engine.clipboard_plain_text().await.unwrap();
        launcher.disconnect();
        engine.clipboard_plain_text().await.unwrap();
        engine.clipboard_plain_text().await.unwrap();

        assert_eq!(launcher.launches(), 2);
    }

    #[tokio::test]
    async fn every_call_reads_the_live_clipboard() {
        let (engine, _, page) = engine_with(FakeClipboard::plain("first"));

        let first = engine.clipboard_plain_text().await.unwrap();
        page.set_clipboard(FakeClipboard::plain("second"));
        let second = engine.clipboard_plain_text().await.unwrap();

        assert_eq!(first, CaptureOutcome::Captured("first".to_string()));
        assert_eq!(second, CaptureOutcome::Captured("second".to_string()));
    }
}
