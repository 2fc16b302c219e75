use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::NotificationError;
use crate::types::{Channel, Priority};

/// Clinician contact preferences, one item of the clinician directory table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClinicianRecord {
    pub contact_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinician_id: Option<String>,

    /// Channel selectors per priority tier: sms, email, call or "null"
    pub low_prio: String,
    pub medium_prio: String,
    pub high_prio: String,

    pub email_destination: String,
    #[serde(rename = "SMSDestination")]
    pub sms_destination: String,
    pub call_destination: String,
}

impl ClinicianRecord {
    /// Raw channel selector stored for a priority tier.
    pub fn channel_for(&self, priority: Priority) -> &str {
        match priority {
            Priority::Low => &self.low_prio,
            Priority::Medium => &self.medium_prio,
            Priority::High => &self.high_prio,
        }
    }

    pub fn destination_for(&self, channel: Channel) -> &str {
        match channel {
            Channel::Sms => &self.sms_destination,
            Channel::Email => &self.email_destination,
            Channel::Call => &self.call_destination,
        }
    }
}

/// Read-only access to the clinician directory
#[async_trait]
pub trait ClinicianDirectory: Send + Sync {
    /// Look up the record for a contact id
    async fn find(&self, contact_id: &str) -> Result<Option<ClinicianRecord>, NotificationError>;
}

/// Directory held in memory, keyed by `ContactId`
#[derive(Debug)]
pub struct InMemoryClinicianDirectory {
    table: String,
    records: DashMap<String, ClinicianRecord>,
}

impl InMemoryClinicianDirectory {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            records: DashMap::new(),
        }
    }

    pub fn with_records(
        table: impl Into<String>,
        records: impl IntoIterator<Item = ClinicianRecord>,
    ) -> Self {
        let directory = Self::new(table);
        for record in records {
            directory.upsert(record);
        }
        directory
    }

    /// Load directory items from a JSON array.
    pub fn from_json(table: impl Into<String>, json: &str) -> Result<Self, NotificationError> {
        let records: Vec<ClinicianRecord> = serde_json::from_str(json)
            .map_err(|e| NotificationError::Directory(format!("invalid directory items: {e}")))?;
        Ok(Self::with_records(table, records))
    }

    pub fn upsert(&self, record: ClinicianRecord) {
        self.records.insert(record.contact_id.clone(), record);
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ClinicianDirectory for InMemoryClinicianDirectory {
    async fn find(&self, contact_id: &str) -> Result<Option<ClinicianRecord>, NotificationError> {
        Ok(self.records.get(contact_id).map(|r| r.value().clone()))
    }
}
