use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{CallReceipt, OutboundCall, PublishReceipt, TopicPublisher, VoiceOriginator};
use crate::error::TransportError;

/// Transport that only logs what would have been sent.
///
/// Used for local runs without provider endpoints. Keeps counts of the
/// deliveries it accepted.
#[derive(Debug, Default)]
pub struct LoggingTransport {
    published: AtomicUsize,
    calls: AtomicUsize,
}

impl LoggingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_count(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TopicPublisher for LoggingTransport {
    async fn publish(
        &self,
        topic: &str,
        message: &str,
        subject: Option<&str>,
    ) -> Result<PublishReceipt, TransportError> {
        self.published.fetch_add(1, Ordering::SeqCst);
        let message_id = Uuid::new_v4().to_string();
        info!(topic, subject, message, %message_id, "Topic publish (logging transport)");
        Ok(PublishReceipt { message_id })
    }
}

#[async_trait]
impl VoiceOriginator for LoggingTransport {
    async fn start_outbound_call(&self, call: &OutboundCall) -> Result<CallReceipt, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let contact_id = Uuid::new_v4().to_string();
        info!(
            destination = %call.destination_phone_number,
            source = %call.source_phone_number,
            contact_flow_id = %call.contact_flow_id,
            attributes = ?call.attributes,
            %contact_id,
            "Outbound call (logging transport)"
        );
        Ok(CallReceipt { contact_id })
    }
}
