//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::adapters::{EmailPublisher, SmsPublisher, VoicePublisher, VoiceSettings};
use crate::directory::{ClinicianRecord, InMemoryClinicianDirectory};
use crate::dispatcher::AlertDispatcher;
use crate::error::TransportError;
use crate::resolver::ParameterResolver;
use crate::transport::{CallReceipt, OutboundCall, PublishReceipt, TopicPublisher, VoiceOriginator};

pub fn clinician(contact_id: &str) -> ClinicianRecord {
    ClinicianRecord {
        contact_id: contact_id.to_string(),
        clinician_id: Some(format!("clinician-{contact_id}")),
        low_prio: "email".into(),
        medium_prio: "sms".into(),
        high_prio: "sms".into(),
        email_destination: "ops@example.org".into(),
        sms_destination: "topic-arn-1".into(),
        call_destination: "+15550100".into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub message: String,
    pub subject: Option<String>,
}

/// Transport that records every call and can be made to fail or block.
#[derive(Default)]
pub struct RecordingTransport {
    pub published: Mutex<Vec<Published>>,
    pub calls: Mutex<Vec<OutboundCall>>,
    fail: bool,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Each delivery signals `entered` and then waits for `release`.
    pub fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<OutboundCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.published.lock().unwrap().len() + self.calls.lock().unwrap().len()
    }

    async fn pass_gate(&self) -> Result<(), TransportError> {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        if self.fail {
            return Err(TransportError::Rejected {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TopicPublisher for RecordingTransport {
    async fn publish(
        &self,
        topic: &str,
        message: &str,
        subject: Option<&str>,
    ) -> Result<PublishReceipt, TransportError> {
        self.pass_gate().await?;
        let mut published = self.published.lock().unwrap();
        published.push(Published {
            topic: topic.to_string(),
            message: message.to_string(),
            subject: subject.map(String::from),
        });
        Ok(PublishReceipt {
            message_id: format!("msg-{}", published.len()),
        })
    }
}

#[async_trait]
impl VoiceOriginator for RecordingTransport {
    async fn start_outbound_call(&self, call: &OutboundCall) -> Result<CallReceipt, TransportError> {
        self.pass_gate().await?;
        let mut calls = self.calls.lock().unwrap();
        calls.push(call.clone());
        Ok(CallReceipt {
            contact_id: format!("ct-{}", calls.len()),
        })
    }
}

pub fn voice_settings() -> VoiceSettings {
    VoiceSettings {
        instance_id: "instance-1".into(),
        contact_flow_id: "flow-1".into(),
        source_phone_number: "+15550199".into(),
    }
}

pub fn dispatcher_with(
    records: Vec<ClinicianRecord>,
    transport: Arc<RecordingTransport>,
) -> AlertDispatcher {
    let directory = Arc::new(InMemoryClinicianDirectory::with_records("clinicians", records));
    AlertDispatcher::new(
        ParameterResolver::new(directory),
        SmsPublisher::new(transport.clone()),
        EmailPublisher::new(transport.clone()),
        VoicePublisher::new(transport, voice_settings()),
    )
}
