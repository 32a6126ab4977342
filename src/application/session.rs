//! Browser session lifecycle
//!
//! Owns the single capture browser: launches it lazily, hides its window,
//! waits for the start page to settle and relaunches after a disconnect.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ports::{
    AutomationError, BrowserLauncher, BrowserSession, CapturePage, DisconnectSignal,
    LaunchOptions, WindowBounds,
};

/// Errors from making the session ready
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Browser session could not be started: {0}")]
    Launch(#[from] AutomationError),
}

/// The live browser/page pair
struct ActiveSession {
    browser: Box<dyn BrowserSession>,
    page: Arc<dyn CapturePage>,
    connected: Arc<AtomicBool>,
    disconnected: DisconnectSignal,
    observer: JoinHandle<()>,
}

impl ActiveSession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !*self.disconnected.borrow()
    }
}

/// Lazily launched, self-healing browser session.
///
/// `ensure_ready` is safe to call concurrently: launch state sits behind an
/// async mutex, so a caller arriving during a launch waits for it and reuses
/// the resulting page.
pub struct SessionManager<L: BrowserLauncher> {
    launcher: L,
    options: LaunchOptions,
    state: Mutex<Option<ActiveSession>>,
    launches: AtomicUsize,
}

impl<L: BrowserLauncher> SessionManager<L> {
    /// Create a manager; nothing is launched until the first `ensure_ready`
    pub fn new(launcher: L, options: LaunchOptions) -> Self {
        Self {
            launcher,
            options,
            state: Mutex::new(None),
            launches: AtomicUsize::new(0),
        }
    }

    /// Launch options in use
    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    /// Number of launch attempts so far
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Whether a connected session currently exists
    pub async fn is_connected(&self) -> bool {
        self.state
            .lock()
            .await
            .as_ref()
            .is_some_and(ActiveSession::is_connected)
    }

    /// Return a usable capture page, launching the browser if needed.
    pub async fn ensure_ready(&self) -> Result<Arc<dyn CapturePage>, SessionError> {
        let mut state = self.state.lock().await;

        if let Some(active) = state.as_ref() {
            if active.is_connected() {
                return Ok(Arc::clone(&active.page));
            }
            info!("browser session disconnected, relaunching");
        }

        if let Some(stale) = state.take() {
            stale.observer.abort();
            if let Err(e) = stale.browser.close().await {
                debug!(error = %e, "closing stale browser session failed");
            }
        }

        let active = self.launch().await?;
        let page = Arc::clone(&active.page);
        *state = Some(active);
        Ok(page)
    }

    /// Close the browser, if any. The next `ensure_ready` launches again.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let Some(active) = self.state.lock().await.take() else {
            return Ok(());
        };
        active.observer.abort();
        active.browser.close().await?;
        info!("browser session closed");
        Ok(())
    }

    async fn launch(&self) -> Result<ActiveSession, SessionError> {
        let attempt = self.launches.fetch_add(1, Ordering::SeqCst) + 1;
        info!(attempt, url = %self.options.start_url, "launching capture browser");

        let browser = self.launcher.launch(&self.options).await?;

        match self.prepare(browser.as_ref()).await {
            Ok((page, connected, disconnected, observer)) => {
                info!("capture browser ready");
                Ok(ActiveSession {
                    browser,
                    page,
                    connected,
                    disconnected,
                    observer,
                })
            }
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    debug!(error = %close_err, "closing half-started browser failed");
                }
                Err(e.into())
            }
        }
    }

    async fn prepare(
        &self,
        browser: &dyn BrowserSession,
    ) -> Result<
        (
            Arc<dyn CapturePage>,
            Arc<AtomicBool>,
            DisconnectSignal,
            JoinHandle<()>,
        ),
        AutomationError,
    > {
        let page = browser
            .pages()
            .await?
            .into_iter()
            .next()
            .ok_or(AutomationError::NoPage)?;

        let connected = Arc::new(AtomicBool::new(false));
        let disconnected = browser.disconnected();
        let observer = spawn_disconnect_observer(disconnected.clone(), Arc::clone(&connected));

        hide_window(page.as_ref()).await;

        if let Err(e) = page.wait_for_navigation(self.options.launch_timeout).await {
            observer.abort();
            return Err(e);
        }

        connected.store(true, Ordering::SeqCst);
        Ok((page, connected, disconnected, observer))
    }
}

/// One-shot watcher clearing `connected` once the browser goes away
fn spawn_disconnect_observer(
    mut disconnected: DisconnectSignal,
    connected: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // A dropped sender means the connection owner is gone as well.
        let _ = disconnected.wait_for(|gone| *gone).await;
        connected.store(false, Ordering::SeqCst);
        info!("capture browser disconnected");
    })
}

/// Shrink the window to nothing; failures only cost visibility
async fn hide_window(page: &dyn CapturePage) {
    if let Err(e) = shrink_window(page).await {
        warn!(error = %e, "could not hide capture window");
    }
}

async fn shrink_window(page: &dyn CapturePage) -> Result<(), AutomationError> {
    let window_id = page.window_id().await?;
    page.set_window_bounds(window_id, WindowBounds::hidden()).await
}
