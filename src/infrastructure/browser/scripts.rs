//! In-page paste listener scripts and their result decoding
//!
//! A listener lives in `window.__pastegrab[id]` as `{ result, disarm }`.
//! Arming attaches a one-shot `paste` handler to `document.body` and returns
//! immediately; collecting awaits `result`; disarming detaches the handler,
//! rejects `result` so an abandoned collect settles, and drops the slot. Handlers call `preventDefault()` so the page content
//! never changes.
//!
//! File bytes cross the protocol boundary as base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;

use crate::application::ports::{AutomationError, ListenerId};
use crate::domain::clipboard::{CaptureRequest, ClipboardFile, ClipboardSnapshot};

const ARM_TEMPLATE: &str = r#"(() => {
  const slots = (window.__pastegrab = window.__pastegrab || {});
  const id = __ID__;
  const target = document.body;
  if (!target) throw new Error("page has no body");
  const extract = __EXTRACT__;
  let handler, fail;
  const result = new Promise((resolve, reject) => {
    fail = reject;
    handler = (event) => {
      event.preventDefault();
      target.removeEventListener("paste", handler);
      Promise.resolve()
        .then(() => extract(event.clipboardData))
        .then(resolve, reject);
    };
  });
  result.catch(() => {});
  target.addEventListener("paste", handler);
  slots[id] = {
    result,
    disarm: () => {
      target.removeEventListener("paste", handler);
      fail(new Error("paste listener disarmed"));
    },
  };
  target.focus();
  return id;
})()"#;

const EXTRACT_TYPES: &str =
    r#"(data) => ({ kind: "types", value: data ? Array.from(data.types) : [] })"#;

const EXTRACT_TEXT: &str = r#"(data) =>
    data && Array.from(data.types).includes(__SLOT__)
      ? { kind: __KIND__, value: data.getData(__SLOT__) }
      : null"#;

const EXTRACT_FILE: &str = r#"async (data) => {
    const file = data && data.files.length ? data.files[0] : null;
    if (!file) return null;
    const reader = file.stream().getReader();
    const chunks = [];
    for (;;) {
      const { value, done } = await reader.read();
      if (done) break;
      chunks.push(value);
    }
    let binary = "";
    for (const chunk of chunks) {
      for (let i = 0; i < chunk.length; i += 0x8000) {
        binary += String.fromCharCode.apply(null, chunk.subarray(i, i + 0x8000));
      }
    }
    return {
      kind: "file",
      value: { name: file.name, mimeType: file.type, content: btoa(binary) },
    };
  }"#;

const COLLECT_TEMPLATE: &str = r#"(async () => {
  const slot = (window.__pastegrab || {})[__ID__];
  if (!slot) throw new Error("paste listener is not armed");
  return await slot.result;
})()"#;

const DISARM_TEMPLATE: &str = r#"(() => {
  const slots = window.__pastegrab || {};
  const slot = slots[__ID__];
  if (slot) {
    slot.disarm();
    delete slots[__ID__];
  }
  return true;
})()"#;

const READY_STATE: &str = "document.readyState";

/// Expression reporting the page's `document.readyState`
pub fn ready_state() -> &'static str {
    READY_STATE
}

/// Expression installing a listener for `request` under `listener`
pub fn arm(listener: &ListenerId, request: CaptureRequest) -> String {
    ARM_TEMPLATE
        .replace("__EXTRACT__", &extractor(request))
        .replace("__ID__", &js_string(listener.as_str()))
}

/// Expression resolving with the listener's extraction result
pub fn collect(listener: &ListenerId) -> String {
    COLLECT_TEMPLATE.replace("__ID__", &js_string(listener.as_str()))
}

/// Expression detaching the listener; safe to run more than once
pub fn disarm(listener: &ListenerId) -> String {
    DISARM_TEMPLATE.replace("__ID__", &js_string(listener.as_str()))
}

fn extractor(request: CaptureRequest) -> String {
    match request {
        CaptureRequest::Types => EXTRACT_TYPES.to_string(),
        CaptureRequest::PlainText | CaptureRequest::RichText => {
            let slot = request.data_slot().unwrap_or("text/plain");
            EXTRACT_TEXT
                .replace("__SLOT__", &js_string(slot))
                .replace("__KIND__", &js_string(wire_kind(request)))
        }
        CaptureRequest::File => EXTRACT_FILE.to_string(),
    }
}

fn wire_kind(request: CaptureRequest) -> &'static str {
    match request {
        CaptureRequest::Types => "types",
        CaptureRequest::PlainText => "text",
        CaptureRequest::RichText => "html",
        CaptureRequest::File => "file",
    }
}

/// JSON string literals are valid JS string literals
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
enum Payload {
    Types(Vec<String>),
    Text(String),
    Html(String),
    File(FilePayload),
}

#[derive(Debug, Deserialize)]
struct FilePayload {
    name: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
    content: String,
}

/// Decode what a collect expression returned.
///
/// `null` means the clipboard had nothing of the requested kind.
pub fn decode_payload(value: Value) -> Result<Option<ClipboardSnapshot>, AutomationError> {
    if value.is_null() {
        return Ok(None);
    }

    let payload: Payload = serde_json::from_value(value)
        .map_err(|e| AutomationError::Protocol(format!("unexpected listener result: {e}")))?;

    let snapshot = match payload {
        Payload::Types(types) => ClipboardSnapshot::Types(types),
        Payload::Text(text) => ClipboardSnapshot::Text(text),
        Payload::Html(html) => ClipboardSnapshot::Html(html),
        Payload::File(file) => {
            let content = STANDARD
                .decode(file.content.as_bytes())
                .map_err(|e| AutomationError::Protocol(format!("file content: {e}")))?;
            ClipboardSnapshot::File(ClipboardFile::new(file.name, file.mime_type, content))
        }
    };
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> ListenerId {
        ListenerId::new("pg-1")
    }

    #[test]
    fn arm_script_embeds_quoted_id_and_slot() {
        let script = arm(&id(), CaptureRequest::RichText);
        assert!(script.contains(r#"const id = "pg-1";"#));
        assert!(script.contains(r#"includes("text/html")"#));
        assert!(script.contains(r#"kind: "html""#));
        assert!(script.contains("preventDefault"));
    }

    #[test]
    fn every_request_gets_a_complete_script() {
        for request in CaptureRequest::all() {
            let script = arm(&id(), *request);
            assert!(!script.contains("__ID__"));
            assert!(!script.contains("__EXTRACT__"));
            assert!(!script.contains("__SLOT__"));
            assert!(!script.contains("__KIND__"));
        }
    }

    #[test]
    fn collect_and_disarm_target_the_listener() {
        assert!(collect(&id()).contains(r#"["pg-1"]"#));
        let script = disarm(&id());
        assert!(script.contains(r#"slots["pg-1"]"#));
        assert!(script.contains("delete"));
    }

    #[test]
    fn disarm_settles_a_waiting_collect() {
        let script = arm(&id(), CaptureRequest::Types);
        assert!(script.contains("fail = reject;"));
        assert!(script.contains(r#"fail(new Error("paste listener disarmed"))"#));
        assert!(disarm(&id()).contains("slot.disarm();"));
    }

    #[test]
    fn ids_are_escaped() {
        let script = collect(&ListenerId::new("a\"b"));
        assert!(script.contains(r#"["a\"b"]"#));
    }

    #[test]
    fn decode_null_is_absent() {
        assert_eq!(decode_payload(Value::Null).unwrap(), None);
    }

    #[test]
    fn decode_types_and_text() {
        let types = decode_payload(json!({"kind": "types", "value": ["text/plain"]})).unwrap();
        assert_eq!(
            types,
            Some(ClipboardSnapshot::Types(vec!["text/plain".into()]))
        );

        let text = decode_payload(json!({"kind": "text", "value": ""})).unwrap();
        assert_eq!(text, Some(ClipboardSnapshot::Text(String::new())));

        let html = decode_payload(json!({"kind": "html", "value": "<b>x</b>"})).unwrap();
        assert_eq!(html, Some(ClipboardSnapshot::Html("<b>x</b>".into())));
    }

    #[test]
    fn decode_file_content() {
        let value = json!({
            "kind": "file",
            "value": {"name": "a.bin", "mimeType": "", "content": "AAH/"}
        });
        let snapshot = decode_payload(value).unwrap().unwrap();
        let file = snapshot.into_file().unwrap();
        assert_eq!(file.name, "a.bin");
        assert_eq!(file.mime_type, "");
        assert_eq!(file.content, vec![0x00, 0x01, 0xff]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_payload(json!({"kind": "bogus"})).is_err());
        assert!(decode_payload(json!({
            "kind": "file",
            "value": {"name": "a", "mimeType": "", "content": "!!"}
        }))
        .is_err());
    }
}
