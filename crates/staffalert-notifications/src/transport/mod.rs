//! Message transports used by the channel publishers.
//!
//! Two operations cover every channel: publishing a message to a topic (SMS
//! and email subscribers hang off the topic) and originating an outbound
//! voice call through a contact center.

pub mod http;
pub mod logging;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Result of a topic publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublishReceipt {
    pub message_id: String,
}

/// Result of an outbound call request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallReceipt {
    pub contact_id: String,
}

/// Outbound voice call request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutboundCall {
    pub destination_phone_number: String,
    pub instance_id: String,
    pub contact_flow_id: String,
    pub source_phone_number: String,
    /// Attributes exposed to the call flow
    pub attributes: HashMap<String, String>,
}

/// Publishes a message to a topic
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        message: &str,
        subject: Option<&str>,
    ) -> Result<PublishReceipt, TransportError>;
}

/// Starts outbound voice calls
#[async_trait]
pub trait VoiceOriginator: Send + Sync {
    async fn start_outbound_call(&self, call: &OutboundCall) -> Result<CallReceipt, TransportError>;
}

pub use http::HttpTransport;
pub use logging::LoggingTransport;
