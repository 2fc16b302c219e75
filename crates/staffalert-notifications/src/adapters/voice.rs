use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{ChannelPublisher, SendResult};
use crate::error::NotificationError;
use crate::transport::{OutboundCall, VoiceOriginator};
use crate::types::{AlertPayload, Channel};

const GREETING: &str = "This is a message from Staff Alert.";

/// Contact-center parameters for outbound calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSettings {
    pub instance_id: String,
    pub contact_flow_id: String,
    pub source_phone_number: String,
}

/// Extract the call-flow id from a contact-flow ARN.
///
/// `arn:aws:connect:<region>:<account>:instance/<instance>/contact-flow/<flow>`
/// yields `<flow>`, the fourth `/`-separated segment.
pub fn contact_flow_id_from_arn(arn: &str) -> Option<&str> {
    arn.split('/').nth(3).filter(|id| !id.is_empty())
}

pub struct VoicePublisher {
    originator: Arc<dyn VoiceOriginator>,
    settings: VoiceSettings,
}

impl VoicePublisher {
    pub fn new(originator: Arc<dyn VoiceOriginator>, settings: VoiceSettings) -> Self {
        Self {
            originator,
            settings,
        }
    }

    fn outbound_call(&self, destination: &str, alert: &AlertPayload) -> OutboundCall {
        let attributes = HashMap::from([
            (
                "Message".to_string(),
                format!("{} {}", GREETING, alert.description),
            ),
            ("Message2".to_string(), alert.patient_id.clone()),
        ]);

        OutboundCall {
            destination_phone_number: destination.to_string(),
            instance_id: self.settings.instance_id.clone(),
            contact_flow_id: self.settings.contact_flow_id.clone(),
            source_phone_number: self.settings.source_phone_number.clone(),
            attributes,
        }
    }
}

#[async_trait]
impl ChannelPublisher for VoicePublisher {
    fn channel(&self) -> Channel {
        Channel::Call
    }

    async fn publish(
        &self,
        destination: &str,
        alert: &AlertPayload,
    ) -> Result<SendResult, NotificationError> {
        let call = self.outbound_call(destination, alert);
        let receipt = self
            .originator
            .start_outbound_call(&call)
            .await
            .map_err(|source| NotificationError::Publish {
                channel: Channel::Call,
                source,
            })?;

        info!(message_id = %alert.message_id, external_id = %receipt.contact_id, "Voice message sent");
        Ok(SendResult {
            channel: Channel::Call,
            external_id: receipt.contact_id,
        })
    }
}
