use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::adapters::{ChannelPublisher, EmailPublisher, SmsPublisher, VoicePublisher};
use crate::error::NotificationError;
use crate::resolver::ParameterResolver;
use crate::types::{AlertPayload, DispatchOutcome, DispatchResponse};

/// One stage of the alert handling chain.
///
/// Receives the unwrapped event body and returns the response to hand back
/// to the caller. Wrapping stages must either delegate to their inner handler
/// with the same payload or return without invoking it.
#[async_trait]
pub trait AlertHandler: Send + Sync {
    async fn handle(&self, payload: &Value) -> Result<DispatchResponse, NotificationError>;
}

/// Routes an alert to the channel configured for its contact and priority
pub struct AlertDispatcher {
    resolver: ParameterResolver,
    sms: SmsPublisher,
    email: EmailPublisher,
    voice: VoicePublisher,
}

impl AlertDispatcher {
    pub fn new(
        resolver: ParameterResolver,
        sms: SmsPublisher,
        email: EmailPublisher,
        voice: VoicePublisher,
    ) -> Self {
        Self {
            resolver,
            sms,
            email,
            voice,
        }
    }

    /// Publisher for a channel selector. Voice is the fallback for every
    /// value other than `sms` and `email`.
    pub fn route(&self, channel: &str) -> &dyn ChannelPublisher {
        match channel {
            "sms" => &self.sms,
            "email" => &self.email,
            _ => &self.voice,
        }
    }

    pub async fn dispatch(
        &self,
        alert: &AlertPayload,
    ) -> Result<DispatchOutcome, NotificationError> {
        info!(
            message_id = %alert.message_id,
            contact_id = %alert.contact_id,
            priority = %alert.priority,
            "Retrieving parameters"
        );
        let resolution = self
            .resolver
            .resolve(&alert.contact_id, &alert.priority)
            .await?;

        let Some(destination) = resolution.destination else {
            warn!(
                message_id = %alert.message_id,
                contact_id = %alert.contact_id,
                channel = %resolution.channel,
                "No destination configured, alert not delivered"
            );
            return Ok(DispatchOutcome::Skipped);
        };

        let publisher = self.route(&resolution.channel);
        info!(
            message_id = %alert.message_id,
            channel = %publisher.channel(),
            "Attempting delivery"
        );

        match publisher.publish(&destination, alert).await {
            Ok(result) => {
                info!(
                    message_id = %alert.message_id,
                    channel = %result.channel,
                    external_id = %result.external_id,
                    "Alert delivered"
                );
                Ok(DispatchOutcome::Sent)
            }
            Err(e) => {
                error!(message_id = %alert.message_id, error = %e, "Error sending message");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl AlertHandler for AlertDispatcher {
    async fn handle(&self, payload: &Value) -> Result<DispatchResponse, NotificationError> {
        let alert = AlertPayload::from_value(payload)?;
        let outcome = self.dispatch(&alert).await?;
        Ok(DispatchResponse::for_outcome(outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{RecordingTransport, clinician, dispatcher_with};
    use crate::types::{Channel, NO_DESTINATION, SENT_BODY};
    use serde_json::json;

    fn payload(priority: &str) -> Value {
        json!({
            "message_id": "m1",
            "patient_id": "p1",
            "contact_id": "c1",
            "description": "Blood results ready",
            "priority": priority
        })
    }

    #[tokio::test]
    async fn test_sms_example() {
        let transport = Arc::new(RecordingTransport::new());
        let mut record = clinician("c1");
        record.high_prio = "sms".into();
        record.sms_destination = "topic-arn-1".into();
        let dispatcher = dispatcher_with(vec![record], transport.clone());

        let response = dispatcher.handle(&payload("H")).await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, SENT_BODY);

        let published = transport.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "topic-arn-1");
        assert_eq!(published[0].message, "Blood results ready p1");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_email_channel() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = dispatcher_with(vec![clinician("c1")], transport.clone());

        dispatcher.handle(&payload("L")).await.unwrap();

        let published = transport.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "ops@example.org");
        assert!(published[0].subject.is_some());
    }

    #[tokio::test]
    async fn test_call_channel() {
        let transport = Arc::new(RecordingTransport::new());
        let mut record = clinician("c1");
        record.medium_prio = "call".into();
        let dispatcher = dispatcher_with(vec![record], transport.clone());

        dispatcher.handle(&payload("M")).await.unwrap();

        assert!(transport.published().is_empty());
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].destination_phone_number, "+15550100");
    }

    #[tokio::test]
    async fn test_route_falls_back_to_voice() {
        let dispatcher = dispatcher_with(vec![], Arc::new(RecordingTransport::new()));
        assert_eq!(dispatcher.route("sms").channel(), Channel::Sms);
        assert_eq!(dispatcher.route("email").channel(), Channel::Email);
        assert_eq!(dispatcher.route("call").channel(), Channel::Call);
        assert_eq!(dispatcher.route("fax").channel(), Channel::Call);
        assert_eq!(dispatcher.route("SMS").channel(), Channel::Call);
    }

    #[tokio::test]
    async fn test_missing_destination_is_skipped() {
        let transport = Arc::new(RecordingTransport::new());
        let mut record = clinician("c1");
        record.high_prio = "sms".into();
        record.sms_destination = NO_DESTINATION.into();
        let dispatcher = dispatcher_with(vec![record], transport.clone());

        let alert = AlertPayload::from_value(&payload("H")).unwrap();
        assert_eq!(dispatcher.dispatch(&alert).await.unwrap(), DispatchOutcome::Skipped);

        let response = dispatcher.handle(&payload("H")).await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, SENT_BODY);
        assert_eq!(transport.total(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = dispatcher_with(vec![clinician("c1")], transport.clone());

        let result = dispatcher
            .handle(&json!({"message_id": "m1", "priority": "H"}))
            .await;
        assert!(matches!(result, Err(NotificationError::MalformedPayload(_))));
        assert_eq!(transport.total(), 0);
    }

    #[tokio::test]
    async fn test_publisher_error_propagates() {
        let transport = Arc::new(RecordingTransport::failing());
        let dispatcher = dispatcher_with(vec![clinician("c1")], transport);

        let result = dispatcher.handle(&payload("H")).await;
        assert!(matches!(
            result,
            Err(NotificationError::Publish {
                channel: Channel::Sms,
                ..
            })
        ));
    }
}
