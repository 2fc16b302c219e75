use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{ChannelPublisher, SendResult};
use crate::error::NotificationError;
use crate::transport::TopicPublisher;
use crate::types::{AlertPayload, Channel};

pub const EMAIL_SUBJECT: &str = "Staff Alert Notifications - Blood Results Ready";

pub struct EmailPublisher {
    topics: Arc<dyn TopicPublisher>,
}

impl EmailPublisher {
    pub fn new(topics: Arc<dyn TopicPublisher>) -> Self {
        Self { topics }
    }
}

#[async_trait]
impl ChannelPublisher for EmailPublisher {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn publish(
        &self,
        destination: &str,
        alert: &AlertPayload,
    ) -> Result<SendResult, NotificationError> {
        let receipt = self
            .topics
            .publish(destination, &alert.message_body(), Some(EMAIL_SUBJECT))
            .await
            .map_err(|source| NotificationError::Publish {
                channel: Channel::Email,
                source,
            })?;

        info!(message_id = %alert.message_id, external_id = %receipt.message_id, "Email sent");
        Ok(SendResult {
            channel: Channel::Email,
            external_id: receipt.message_id,
        })
    }
}
