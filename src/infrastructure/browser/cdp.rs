//! DevTools protocol WebSocket client
//!
//! Sends commands with auto-incrementing ids, correlates the responses, and
//! fans events out to any number of subscribers. A background task owns the
//! read half of the socket; when it stops, every pending command fails and
//! the closed signal flips to `true`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::application::ports::AutomationError;

/// Bound for ordinary commands
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type PendingMap = HashMap<u64, oneshot::Sender<CdpResponse>>;
type Pending = Arc<StdMutex<PendingMap>>;

fn lock_pending(pending: &Pending) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

/// Drops a command's reply slot once nobody is waiting on it, including
/// when the waiting future is cancelled.
struct PendingEntry<'a> {
    pending: &'a Pending,
    id: u64,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.id);
    }
}

/// An event pushed by the browser
#[derive(Debug, Clone)]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Serialize)]
struct CdpCommand<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

/// Reply to one command
#[derive(Debug, Clone)]
pub struct CdpResponse {
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<CdpResponseError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponseError {
    pub code: i64,
    pub message: String,
}

/// One incoming protocol message
#[derive(Debug, Clone)]
pub enum CdpMessage {
    Response(CdpResponse),
    Event(CdpEvent),
}

/// Classify a raw protocol message. Anything with an `id` is a response,
/// anything else with a `method` is an event.
pub fn parse_message(json: &Value) -> Option<CdpMessage> {
    if let Some(id) = json.get("id").and_then(Value::as_u64) {
        return Some(CdpMessage::Response(CdpResponse {
            id,
            result: json.get("result").cloned(),
            error: json
                .get("error")
                .and_then(|e| serde_json::from_value(e.clone()).ok()),
        }));
    }
    let method = json.get("method")?.as_str()?.to_string();
    let params = json.get("params").cloned().unwrap_or(Value::Null);
    Some(CdpMessage::Event(CdpEvent { method, params }))
}

/// Client for one DevTools target connection
pub struct CdpClient {
    next_id: AtomicU64,
    pending: Pending,
    writer: Mutex<WsSink>,
    events: broadcast::Sender<CdpEvent>,
    closed: watch::Receiver<bool>,
    reader: JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a target's `webSocketDebuggerUrl`
    pub async fn connect(ws_url: &str) -> Result<Self, AutomationError> {
        tracing::debug!(url = ws_url, "connecting to DevTools target");

        let (stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| AutomationError::LaunchFailed(format!("DevTools connect: {e}")))?;
        let (writer, reader) = stream.split();

        let pending: Pending = Arc::new(StdMutex::new(HashMap::new()));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (closed_tx, closed) = watch::channel(false);

        let reader = tokio::spawn(Self::read_loop(
            reader,
            Arc::clone(&pending),
            events.clone(),
            closed_tx,
        ));

        Ok(Self {
            next_id: AtomicU64::new(1),
            pending,
            writer: Mutex::new(writer),
            events,
            closed,
            reader,
        })
    }

    /// Send a command bounded by [`DEFAULT_COMMAND_TIMEOUT`]
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value, AutomationError> {
        self.send_command_with_timeout(method, params, Some(DEFAULT_COMMAND_TIMEOUT))
            .await
    }

    /// Send a command and wait for its reply.
    ///
    /// With `timeout` of `None` the wait ends only with the reply or the
    /// connection closing.
    pub async fn send_command_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, AutomationError> {
        if self.is_closed() {
            return Err(AutomationError::Disconnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let json = serde_json::to_string(&CdpCommand { id, method, params })
            .map_err(|e| AutomationError::Protocol(format!("serialize {method}: {e}")))?;

        tracing::trace!(id, method, "sending DevTools command");

        // Register before sending so a fast reply cannot be missed.
        let (tx, rx) = oneshot::channel();
        lock_pending(&self.pending).insert(id, tx);
        let _entry = PendingEntry {
            pending: &self.pending,
            id,
        };

        let sent = self.writer.lock().await.send(Message::Text(json)).await;
        if let Err(e) = sent {
            tracing::debug!(method, error = %e, "DevTools write failed");
            return Err(AutomationError::Disconnected);
        }

        let reply = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    return Err(AutomationError::Timeout {
                        what: method.to_string(),
                        after: limit,
                    });
                }
            },
            None => rx.await,
        };

        // A dropped sender means the reader stopped.
        let response = reply.map_err(|_| AutomationError::Disconnected)?;
        response_result(method, response)
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CdpEvent> {
        self.events.subscribe()
    }

    /// Flips to `true` once the connection is gone
    pub fn closed(&self) -> watch::Receiver<bool> {
        self.closed.clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    async fn read_loop(
        mut reader: SplitStream<WsStream>,
        pending: Pending,
        events: broadcast::Sender<CdpEvent>,
        closed: watch::Sender<bool>,
    ) {
        while let Some(frame) = reader.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => continue,
                },
                Ok(Message::Close(_)) => {
                    tracing::debug!("DevTools connection closed by browser");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "DevTools read failed");
                    break;
                }
            };

            let json: Value = match serde_json::from_str(&text) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(error = %e, "unparseable DevTools message");
                    continue;
                }
            };

            match parse_message(&json) {
                Some(CdpMessage::Response(response)) => {
                    let waiter = lock_pending(&pending).remove(&response.id);
                    if let Some(tx) = waiter {
                        let _ = tx.send(response);
                    }
                }
                Some(CdpMessage::Event(event)) => {
                    // No subscribers is fine.
                    let _ = events.send(event);
                }
                None => {}
            }
        }

        lock_pending(&pending).clear();
        let _ = closed.send(true);
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn response_result(method: &str, response: CdpResponse) -> Result<Value, AutomationError> {
    match response.error {
        Some(err) => Err(AutomationError::Command {
            method: method.to_string(),
            code: err.code,
            message: err.message,
        }),
        None => Ok(response.result.unwrap_or(Value::Null)),
    }
}
