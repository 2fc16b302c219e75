//! Unwrapping alert payloads from platform invocation events.
//!
//! Upstream platforms deliver the alert inside the `body` field of a proxy
//! event, usually as a JSON-encoded string:
//!
//! ```json
//! {"httpMethod": "POST", "body": "{\"message_id\": \"m1\", ...}"}
//! ```

use serde_json::Value;

use crate::error::NotificationError;

/// Return the payload carried in an event's `body` field.
///
/// String bodies are decoded as JSON; object bodies are returned as-is.
pub fn extract_body(event: &Value) -> Result<Value, NotificationError> {
    match event.get("body") {
        Some(Value::String(raw)) => serde_json::from_str(raw)
            .map_err(|e| NotificationError::malformed(format!("body is not valid JSON: {e}"))),
        Some(body @ Value::Object(_)) => Ok(body.clone()),
        Some(Value::Null) | None => Err(NotificationError::malformed("event has no body")),
        Some(_) => Err(NotificationError::malformed(
            "event body must be a JSON string or object",
        )),
    }
}
