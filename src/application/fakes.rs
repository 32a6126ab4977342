//! In-memory automation doubles shared by the application tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::application::ports::{
    AutomationError, BrowserLauncher, BrowserSession, CapturePage, DisconnectSignal,
    LaunchOptions, ListenerId, WindowBounds,
};
use crate::domain::clipboard::{CaptureRequest, ClipboardFile, ClipboardSnapshot, PasteKey};

/// What the simulated OS clipboard holds
#[derive(Debug, Clone, Default)]
pub struct FakeClipboard {
    pub types: Vec<String>,
    pub plain: Option<String>,
    pub html: Option<String>,
    pub files: Vec<ClipboardFile>,
}

impl FakeClipboard {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn plain(text: &str) -> Self {
        Self {
            types: vec!["text/plain".into()],
            plain: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn html(html: &str, plain: &str) -> Self {
        Self {
            types: vec!["text/plain".into(), "text/html".into()],
            plain: Some(plain.into()),
            html: Some(html.into()),
            ..Default::default()
        }
    }

    pub fn files(files: Vec<ClipboardFile>) -> Self {
        Self {
            types: vec!["Files".into()],
            files,
            ..Default::default()
        }
    }

    /// What a paste listener for `request` would extract
    fn extract(&self, request: CaptureRequest) -> Option<ClipboardSnapshot> {
        match request {
            CaptureRequest::Types => Some(ClipboardSnapshot::Types(self.types.clone())),
            CaptureRequest::PlainText => self.plain.clone().map(ClipboardSnapshot::Text),
            CaptureRequest::RichText => self.html.clone().map(ClipboardSnapshot::Html),
            CaptureRequest::File => self.files.first().cloned().map(ClipboardSnapshot::File),
        }
    }
}

/// Page double: records every call and fires armed listeners on V
#[derive(Default)]
pub struct FakePage {
    clipboard: Mutex<FakeClipboard>,
    calls: Mutex<Vec<String>>,
    armed: Mutex<HashMap<String, CaptureRequest>>,
    fired: Mutex<HashMap<String, Option<ClipboardSnapshot>>>,
    held: Mutex<Vec<PasteKey>>,
    next_id: AtomicUsize,
    pub fail_press: AtomicBool,
    pub fail_arm: AtomicBool,
    pub fail_collect: AtomicBool,
    pub swallow_paste: AtomicBool,
    pub fail_window: AtomicBool,
}

impl FakePage {
    pub fn with_clipboard(clipboard: FakeClipboard) -> Arc<Self> {
        let page = Self::default();
        *page.clipboard.lock().unwrap() = clipboard;
        Arc::new(page)
    }

    pub fn set_clipboard(&self, clipboard: FakeClipboard) {
        *self.clipboard.lock().unwrap() = clipboard;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn armed_count(&self) -> usize {
        self.armed.lock().unwrap().len()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn paste(&self) {
        if self.swallow_paste.load(Ordering::SeqCst) {
            return;
        }
        let clipboard = self.clipboard.lock().unwrap().clone();
        let listeners: Vec<(String, CaptureRequest)> =
            self.armed.lock().unwrap().drain().collect();
        let mut fired = self.fired.lock().unwrap();
        for (id, request) in listeners {
            fired.insert(id, clipboard.extract(request));
        }
    }
}

#[async_trait]
impl CapturePage for FakePage {
    async fn window_id(&self) -> Result<i64, AutomationError> {
        self.record("window_id");
        if self.fail_window.load(Ordering::SeqCst) {
            return Err(AutomationError::Protocol("no window".into()));
        }
        Ok(7)
    }

    async fn set_window_bounds(
        &self,
        window_id: i64,
        bounds: WindowBounds,
    ) -> Result<(), AutomationError> {
        self.record(format!(
            "set_window_bounds {} {}x{}",
            window_id, bounds.width, bounds.height
        ));
        Ok(())
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> Result<(), AutomationError> {
        self.record("wait_for_navigation");
        Ok(())
    }

    async fn arm_listener(&self, request: CaptureRequest) -> Result<ListenerId, AutomationError> {
        self.record(format!("arm {}", request));
        if self.fail_arm.load(Ordering::SeqCst) {
            return Err(AutomationError::Script("document.body is null".into()));
        }
        let id = format!("l{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.armed.lock().unwrap().insert(id.clone(), request);
        Ok(ListenerId::new(id))
    }

    async fn collect(
        &self,
        listener: &ListenerId,
    ) -> Result<Option<ClipboardSnapshot>, AutomationError> {
        self.record("collect");
        if self.fail_collect.load(Ordering::SeqCst) {
            return Err(AutomationError::Script("page navigated away".into()));
        }
        let fired = self.fired.lock().unwrap().remove(listener.as_str());
        match fired {
            Some(result) => Ok(result),
            None => std::future::pending().await,
        }
    }

    async fn disarm(&self, listener: &ListenerId) -> Result<(), AutomationError> {
        self.record("disarm");
        self.armed.lock().unwrap().remove(listener.as_str());
        Ok(())
    }

    async fn key_down(&self, key: PasteKey) -> Result<(), AutomationError> {
        self.record(format!("down {}", key));
        self.held.lock().unwrap().push(key);
        Ok(())
    }

    async fn key_press(&self, key: PasteKey) -> Result<(), AutomationError> {
        self.record(format!("press {}", key));
        if self.fail_press.load(Ordering::SeqCst) {
            return Err(AutomationError::Disconnected);
        }
        let chord_held = self.held.lock().unwrap().iter().any(|k| k.is_modifier());
        if key == PasteKey::V && chord_held {
            self.paste();
        }
        Ok(())
    }

    async fn key_up(&self, key: PasteKey) -> Result<(), AutomationError> {
        self.record(format!("up {}", key));
        self.held.lock().unwrap().retain(|k| *k != key);
        Ok(())
    }
}

struct FakeSession {
    page: Arc<FakePage>,
    disconnected: DisconnectSignal,
    no_pages: bool,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn pages(&self) -> Result<Vec<Arc<dyn CapturePage>>, AutomationError> {
        if self.no_pages {
            return Ok(Vec::new());
        }
        Ok(vec![Arc::clone(&self.page) as Arc<dyn CapturePage>])
    }

    fn disconnected(&self) -> DisconnectSignal {
        self.disconnected.clone()
    }

    async fn close(&self) -> Result<(), AutomationError> {
        self.page.record("close");
        Ok(())
    }
}

/// Launcher double counting launches
#[derive(Default)]
pub struct FakeLauncher {
    pub page: Arc<FakePage>,
    launches: AtomicUsize,
    pub fail_launch: AtomicBool,
    pub no_pages: AtomicBool,
    launch_delay: Duration,
    current: Mutex<Option<watch::Sender<bool>>>,
}

impl FakeLauncher {
    pub fn new(page: Arc<FakePage>) -> Arc<Self> {
        Arc::new(Self {
            page,
            ..Default::default()
        })
    }

    pub fn slow(page: Arc<FakePage>, launch_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            page,
            launch_delay,
            ..Default::default()
        })
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Simulate the browser window closing
    pub fn disconnect(&self) {
        if let Some(tx) = self.current.lock().unwrap().as_ref() {
            let _ = tx.send(true);
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(
        &self,
        _options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, AutomationError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if !self.launch_delay.is_zero() {
            tokio::time::sleep(self.launch_delay).await;
        }
        if self.fail_launch.load(Ordering::SeqCst) {
            return Err(AutomationError::BrowserNotFound);
        }
        let (tx, rx) = watch::channel(false);
        *self.current.lock().unwrap() = Some(tx);
        Ok(Box::new(FakeSession {
            page: Arc::clone(&self.page),
            disconnected: rx,
            no_pages: self.no_pages.load(Ordering::SeqCst),
        }))
    }
}

pub fn launch_options() -> LaunchOptions {
    LaunchOptions {
        browser_path: None,
        start_url: "about:blank".into(),
        launch_timeout: Duration::from_secs(1),
    }
}
