use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NotificationError;

/// Destination value meaning "nothing configured for this channel".
pub const NO_DESTINATION: &str = "null";

/// Response body for a delivered alert.
pub const SENT_BODY: &str = "Message sent successfully";

/// Alert priority tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    High,
}

impl Priority {
    pub fn from_code(code: &str) -> Result<Self, NotificationError> {
        match code {
            "L" => Ok(Self::Low),
            "M" => Ok(Self::Medium),
            "H" => Ok(Self::High),
            other => Err(NotificationError::InvalidPriority(other.to_string())),
        }
    }

    /// Directory attribute holding the channel selected for this tier.
    pub fn selector_field(self) -> &'static str {
        match self {
            Self::Low => "LowPrio",
            Self::Medium => "MediumPrio",
            Self::High => "HighPrio",
        }
    }
}

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Email,
    Call,
}

impl Channel {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sms" => Some(Self::Sms),
            "email" => Some(Self::Email),
            "call" => Some(Self::Call),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Call => "call",
        }
    }

    /// Directory attribute holding the destination for this channel.
    pub fn destination_field(self) -> &'static str {
        match self {
            Self::Sms => "SMSDestination",
            Self::Email => "EmailDestination",
            Self::Call => "CallDestination",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized alert received from upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub message_id: String,
    pub patient_id: String,
    pub contact_id: String,
    pub description: String,
    /// Raw priority code; validated when parameters are resolved
    pub priority: String,
}

impl AlertPayload {
    /// Extract the alert fields from an already unwrapped event body.
    pub fn from_value(value: &Value) -> Result<Self, NotificationError> {
        let object = value
            .as_object()
            .ok_or_else(|| NotificationError::malformed("payload must be a JSON object"))?;

        let field = |name: &str| -> Result<String, NotificationError> {
            match object.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Null) | None => Err(NotificationError::malformed(format!(
                    "missing required field '{name}'"
                ))),
                Some(_) => Err(NotificationError::malformed(format!(
                    "field '{name}' must be a string"
                ))),
            }
        };

        Ok(Self {
            message_id: field("message_id")?,
            patient_id: field("patient_id")?,
            contact_id: field("contact_id")?,
            description: field("description")?,
            priority: field("priority")?,
        })
    }

    /// Text sent over SMS and email.
    pub fn message_body(&self) -> String {
        format!("{} {}", self.description, self.patient_id)
    }
}

/// Terminal state of a single dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Sent,
    Skipped,
}

/// Response returned to the caller and cached by the idempotency guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl DispatchResponse {
    pub fn for_outcome(outcome: DispatchOutcome) -> Self {
        // A skipped delivery is only distinguishable in the logs.
        let body = match outcome {
            DispatchOutcome::Sent | DispatchOutcome::Skipped => SENT_BODY,
        };
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_from_value() {
        let payload = AlertPayload::from_value(&json!({
            "message_id": "m1",
            "patient_id": "p1",
            "contact_id": "c1",
            "description": "Blood results ready",
            "priority": "H",
            "type": "lab"
        }))
        .unwrap();

        assert_eq!(payload.message_id, "m1");
        assert_eq!(payload.priority, "H");
        assert_eq!(payload.message_body(), "Blood results ready p1");
    }

    #[test]
    fn test_payload_missing_field() {
        let result = AlertPayload::from_value(&json!({
            "message_id": "m1",
            "patient_id": "p1",
            "description": "Blood results ready",
            "priority": "H"
        }));
        match result {
            Err(NotificationError::MalformedPayload(msg)) => assert!(msg.contains("contact_id")),
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_rejects_non_object() {
        let result = AlertPayload::from_value(&json!(["m1"]));
        assert!(matches!(result, Err(NotificationError::MalformedPayload(_))));
    }

    #[test]
    fn test_priority_codes() {
        assert_eq!(Priority::from_code("L").unwrap().selector_field(), "LowPrio");
        assert_eq!(Priority::from_code("M").unwrap().selector_field(), "MediumPrio");
        assert_eq!(Priority::from_code("H").unwrap().selector_field(), "HighPrio");
        // codes are case-sensitive
        assert!(matches!(
            Priority::from_code("h"),
            Err(NotificationError::InvalidPriority(_))
        ));
    }

    #[test]
    fn test_response_serialization() {
        for outcome in [DispatchOutcome::Sent, DispatchOutcome::Skipped] {
            let response = DispatchResponse::for_outcome(outcome);
            assert_eq!(
                serde_json::to_value(&response).unwrap(),
                json!({"statusCode": 200, "body": "Message sent successfully"})
            );
        }
    }
}
