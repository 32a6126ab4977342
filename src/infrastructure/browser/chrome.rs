//! Local Chrome/Chromium launcher
//!
//! Starts a headed browser in app mode on the start page, with remote
//! debugging bound to an ephemeral loopback port and a throwaway profile,
//! then connects to the page target's DevTools socket.

use std::env;
use std::io;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::cdp::CdpClient;
use super::page::CdpPage;
use crate::application::ports::{
    AutomationError, BrowserLauncher, BrowserSession, CapturePage, DisconnectSignal,
    LaunchOptions,
};

/// Environment variable naming the browser binary
pub const BROWSER_ENV: &str = "PASTEGRAB_BROWSER";

const DISCOVERY_POLL: Duration = Duration::from_millis(100);
const GRACEFUL_EXIT: Duration = Duration::from_secs(2);

/// Browser binaries to try, in order
pub fn browser_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) {
        candidates.push(path.to_path_buf());
    }
    if let Ok(path) = env::var(BROWSER_ENV) {
        if !path.trim().is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }
    if cfg!(target_os = "macos") {
        candidates.extend(
            [
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
            ]
            .iter()
            .map(PathBuf::from),
        );
    }
    candidates.extend(
        ["google-chrome", "chromium", "chromium-browser", "chrome"]
            .iter()
            .map(PathBuf::from),
    );
    candidates
}

/// Command-line flags for a capture browser
pub fn browser_args(port: u16, profile_dir: &Path, start_url: &str) -> Vec<String> {
    vec![
        format!("--remote-debugging-port={port}"),
        "--remote-debugging-address=127.0.0.1".to_string(),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-popup-blocking".to_string(),
        format!("--app={start_url}"),
    ]
}

fn pick_ephemeral_port() -> Result<u16, AutomationError> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|e| AutomationError::LaunchFailed(format!("port bind failed: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| AutomationError::LaunchFailed(format!("port lookup failed: {e}")))?
        .port();
    Ok(port)
}

/// One entry of the DevTools `/json/list` endpoint
#[derive(Debug, Deserialize)]
struct DevToolsTarget {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    ws_url: Option<String>,
}

/// Poll `{endpoint}/json/list` until a page target shows up.
pub async fn discover_page_target(
    http: &reqwest::Client,
    endpoint: &str,
    timeout: Duration,
) -> Result<String, AutomationError> {
    let url = format!("{}/json/list", endpoint.trim_end_matches('/'));
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        match http.get(&url).send().await {
            Ok(resp) => match resp.json::<Vec<DevToolsTarget>>().await {
                Ok(targets) => {
                    let page = targets
                        .into_iter()
                        .find(|t| t.kind == "page")
                        .and_then(|t| t.ws_url);
                    if let Some(ws_url) = page {
                        return Ok(ws_url);
                    }
                }
                Err(e) => tracing::trace!(error = %e, "DevTools target list not ready"),
            },
            Err(e) => tracing::trace!(error = %e, "DevTools endpoint not ready"),
        }

        if tokio::time::Instant::now() + DISCOVERY_POLL > deadline {
            return Err(AutomationError::Timeout {
                what: format!("DevTools page target at {url}"),
                after: timeout,
            });
        }
        tokio::time::sleep(DISCOVERY_POLL).await;
    }
}

/// Launches a local Chromium-family browser
pub struct ChromeLauncher {
    http: reqwest::Client,
}

impl ChromeLauncher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    fn spawn(&self, args: &[String], configured: Option<&Path>) -> Result<Child, AutomationError> {
        for candidate in browser_candidates(configured) {
            let spawned = Command::new(&candidate)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn();
            match spawned {
                Ok(child) => {
                    tracing::debug!(browser = %candidate.display(), "browser process started");
                    return Ok(child);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::trace!(browser = %candidate.display(), "browser candidate not found");
                }
                Err(e) => {
                    return Err(AutomationError::LaunchFailed(format!(
                        "{}: {e}",
                        candidate.display()
                    )))
                }
            }
        }
        Err(AutomationError::BrowserNotFound)
    }
}

impl Default for ChromeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, AutomationError> {
        let port = pick_ephemeral_port()?;
        let profile_dir = env::temp_dir().join(format!("pastegrab-{}-{port}", std::process::id()));
        tokio::fs::create_dir_all(&profile_dir)
            .await
            .map_err(|e| AutomationError::LaunchFailed(format!("profile dir: {e}")))?;

        let args = browser_args(port, &profile_dir, &options.start_url);
        let mut child = self.spawn(&args, options.browser_path.as_deref())?;

        let endpoint = format!("http://127.0.0.1:{port}");
        let connected = async {
            let ws_url =
                discover_page_target(&self.http, &endpoint, options.launch_timeout).await?;
            CdpClient::connect(&ws_url).await
        }
        .await;

        let client = match connected {
            Ok(client) => Arc::new(client),
            Err(e) => {
                let _ = child.kill().await;
                let _ = tokio::fs::remove_dir_all(&profile_dir).await;
                return Err(e);
            }
        };

        tracing::debug!(port, "connected to capture page");
        Ok(Box::new(ChromeSession {
            page: Arc::new(CdpPage::new(Arc::clone(&client))),
            client,
            child: Mutex::new(Some(child)),
            profile_dir,
        }))
    }
}

/// A running browser process plus its page connection
pub struct ChromeSession {
    client: Arc<CdpClient>,
    page: Arc<CdpPage>,
    child: Mutex<Option<Child>>,
    profile_dir: PathBuf,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn pages(&self) -> Result<Vec<Arc<dyn CapturePage>>, AutomationError> {
        Ok(vec![Arc::clone(&self.page) as Arc<dyn CapturePage>])
    }

    fn disconnected(&self) -> DisconnectSignal {
        self.client.closed()
    }

    async fn close(&self) -> Result<(), AutomationError> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        request_exit(&child);
        match tokio::time::timeout(GRACEFUL_EXIT, child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "browser exited"),
            _ => {
                tracing::debug!("browser did not exit in time, killing");
                child
                    .kill()
                    .await
                    .map_err(|e| AutomationError::LaunchFailed(format!("kill browser: {e}")))?;
            }
        }

        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            tracing::debug!(error = %e, dir = %self.profile_dir.display(), "profile cleanup failed");
        }
        Ok(())
    }
}

/// Ask the browser to exit on its own so it can flush its profile
#[cfg(unix)]
fn request_exit(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            tracing::debug!(pid, error = %e, "SIGTERM to browser failed");
        }
    }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) {}
