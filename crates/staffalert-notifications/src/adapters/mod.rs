pub mod email;
pub mod sms;
pub mod voice;

use async_trait::async_trait;

use crate::error::NotificationError;
use crate::types::{AlertPayload, Channel};

/// Result of delivering an alert over one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub channel: Channel,
    /// Identifier assigned by the transport (message id or contact id)
    pub external_id: String,
}

/// Delivers an alert over a single channel
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    fn channel(&self) -> Channel;

    /// Deliver the alert to a channel-specific destination
    async fn publish(
        &self,
        destination: &str,
        alert: &AlertPayload,
    ) -> Result<SendResult, NotificationError>;
}

pub use email::EmailPublisher;
pub use sms::SmsPublisher;
pub use voice::{VoicePublisher, VoiceSettings, contact_flow_id_from_arn};
