use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{ChannelPublisher, SendResult};
use crate::error::NotificationError;
use crate::transport::TopicPublisher;
use crate::types::{AlertPayload, Channel};

pub struct SmsPublisher {
    topics: Arc<dyn TopicPublisher>,
}

impl SmsPublisher {
    pub fn new(topics: Arc<dyn TopicPublisher>) -> Self {
        Self { topics }
    }
}

#[async_trait]
impl ChannelPublisher for SmsPublisher {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn publish(
        &self,
        destination: &str,
        alert: &AlertPayload,
    ) -> Result<SendResult, NotificationError> {
        let receipt = self
            .topics
            .publish(destination, &alert.message_body(), None)
            .await
            .map_err(|source| NotificationError::Publish {
                channel: Channel::Sms,
                source,
            })?;

        info!(message_id = %alert.message_id, external_id = %receipt.message_id, "SMS sent");
        Ok(SendResult {
            channel: Channel::Sms,
            external_id: receipt.message_id,
        })
    }
}
