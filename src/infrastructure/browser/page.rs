//! DevTools-backed capture page

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;

use super::cdp::{CdpClient, DEFAULT_COMMAND_TIMEOUT};
use super::scripts;
use crate::application::ports::{AutomationError, CapturePage, ListenerId, WindowBounds};
use crate::domain::clipboard::{CaptureRequest, ClipboardSnapshot, PasteKey};

/// A page target driven over its own DevTools connection
pub struct CdpPage {
    client: Arc<CdpClient>,
    modifiers: AtomicU32,
    next_listener: AtomicU64,
}

impl CdpPage {
    pub fn new(client: Arc<CdpClient>) -> Self {
        Self {
            client,
            modifiers: AtomicU32::new(0),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Run `expression` in the page, awaiting promises and returning the
    /// value by copy.
    async fn evaluate(
        &self,
        expression: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, AutomationError> {
        let response = self
            .client
            .send_command_with_timeout("Runtime.evaluate", evaluate_params(expression), timeout)
            .await?;
        evaluation_value(response)
    }

    async fn dispatch_key(&self, event_type: &str, key: PasteKey) -> Result<(), AutomationError> {
        let modifiers = self.modifiers.load(Ordering::SeqCst);
        self.client
            .send_command(
                "Input.dispatchKeyEvent",
                key_event_params(event_type, key, modifiers),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CapturePage for CdpPage {
    async fn window_id(&self) -> Result<i64, AutomationError> {
        let result = self
            .client
            .send_command("Browser.getWindowForTarget", json!({}))
            .await?;
        result
            .get("windowId")
            .and_then(Value::as_i64)
            .ok_or_else(|| AutomationError::Protocol("window lookup returned no windowId".into()))
    }

    async fn set_window_bounds(
        &self,
        window_id: i64,
        bounds: WindowBounds,
    ) -> Result<(), AutomationError> {
        self.client
            .send_command(
                "Browser.setWindowBounds",
                json!({
                    "windowId": window_id,
                    "bounds": { "width": bounds.width, "height": bounds.height },
                }),
            )
            .await?;
        Ok(())
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), AutomationError> {
        // Subscribe first so a load finishing in between is not lost.
        let mut events = self.client.subscribe();
        self.client.send_command("Page.enable", json!({})).await?;

        let state = self.evaluate(scripts::ready_state(), Some(timeout)).await?;
        if state.as_str() == Some("complete") {
            tracing::debug!("start page already loaded");
            return Ok(());
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Ok(event)) if event.method == "Page.loadEventFired" => return Ok(()),
                Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
                Ok(Err(RecvError::Closed)) => return Err(AutomationError::Disconnected),
                Err(_) => {
                    return Err(AutomationError::Timeout {
                        what: "start page load".into(),
                        after: timeout,
                    })
                }
            }
        }
    }

    async fn arm_listener(&self, request: CaptureRequest) -> Result<ListenerId, AutomationError> {
        let n = self.next_listener.fetch_add(1, Ordering::SeqCst);
        let listener = ListenerId::new(format!("pg-{n}"));
        self.evaluate(&scripts::arm(&listener, request), Some(DEFAULT_COMMAND_TIMEOUT))
            .await?;
        Ok(listener)
    }

    async fn collect(
        &self,
        listener: &ListenerId,
    ) -> Result<Option<ClipboardSnapshot>, AutomationError> {
        let value = self.evaluate(&scripts::collect(listener), None).await?;
        scripts::decode_payload(value)
    }

    async fn disarm(&self, listener: &ListenerId) -> Result<(), AutomationError> {
        self.evaluate(&scripts::disarm(listener), Some(DEFAULT_COMMAND_TIMEOUT))
            .await?;
        Ok(())
    }

    async fn key_down(&self, key: PasteKey) -> Result<(), AutomationError> {
        self.modifiers.fetch_or(key.modifier_bit(), Ordering::SeqCst);
        self.dispatch_key("rawKeyDown", key).await
    }

    async fn key_press(&self, key: PasteKey) -> Result<(), AutomationError> {
        self.key_down(key).await?;
        self.key_up(key).await
    }

    async fn key_up(&self, key: PasteKey) -> Result<(), AutomationError> {
        self.modifiers.fetch_and(!key.modifier_bit(), Ordering::SeqCst);
        self.dispatch_key("keyUp", key).await
    }
}

/// `Runtime.evaluate` parameters
pub fn evaluate_params(expression: &str) -> Value {
    json!({
        "expression": expression,
        "returnByValue": true,
        "awaitPromise": true,
    })
}

/// Pull the returned value out of a `Runtime.evaluate` result, turning a
/// thrown exception into an error.
fn evaluation_value(response: Value) -> Result<Value, AutomationError> {
    if let Some(details) = response.get("exceptionDetails") {
        let message = details
            .pointer("/exception/description")
            .or_else(|| details.get("text"))
            .and_then(Value::as_str)
            .unwrap_or("unknown exception");
        return Err(AutomationError::Script(message.to_string()));
    }
    Ok(response
        .pointer("/result/value")
        .cloned()
        .unwrap_or(Value::Null))
}

/// `Input.dispatchKeyEvent` parameters for one key transition.
///
/// V going down while Ctrl or Meta is held also asks the browser to run
/// its paste command.
pub fn key_event_params(event_type: &str, key: PasteKey, modifiers: u32) -> Value {
    let mut params = json!({
        "type": event_type,
        "modifiers": modifiers,
        "key": key.key(),
        "code": key.code(),
        "windowsVirtualKeyCode": key.virtual_key_code(),
        "nativeVirtualKeyCode": key.virtual_key_code(),
        "location": if key.is_modifier() { 1 } else { 0 },
    });
    let chord = PasteKey::Control.modifier_bit() | PasteKey::Meta.modifier_bit();
    if key == PasteKey::V && event_type != "keyUp" && modifiers & chord != 0 {
        params["commands"] = json!(["paste"]);
    }
    params
}
