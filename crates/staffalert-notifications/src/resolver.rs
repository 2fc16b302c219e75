use std::sync::Arc;

use tracing::{debug, info};

use crate::directory::ClinicianDirectory;
use crate::error::NotificationError;
use crate::types::{Channel, NO_DESTINATION, Priority};

/// Channel and destination selected for an alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Channel selector as stored in the directory
    pub channel: String,
    /// `None` when the destination is not configured and delivery must be skipped
    pub destination: Option<String>,
}

/// Looks up where a clinician wants alerts of a given priority delivered
pub struct ParameterResolver {
    directory: Arc<dyn ClinicianDirectory>,
}

impl ParameterResolver {
    pub fn new(directory: Arc<dyn ClinicianDirectory>) -> Self {
        Self { directory }
    }

    pub async fn resolve(
        &self,
        contact_id: &str,
        priority: &str,
    ) -> Result<Resolution, NotificationError> {
        let priority = Priority::from_code(priority)?;

        let record = self
            .directory
            .find(contact_id)
            .await?
            .ok_or_else(|| NotificationError::ContactNotFound(contact_id.to_string()))?;

        let selector = record.channel_for(priority);
        let channel =
            Channel::parse(selector).ok_or_else(|| NotificationError::UnknownChannel {
                contact_id: contact_id.to_string(),
                channel: selector.to_string(),
            })?;

        let destination = record.destination_for(channel);
        debug!(
            contact_id,
            clinician_id = ?record.clinician_id,
            priority_field = priority.selector_field(),
            destination_field = channel.destination_field(),
            "Directory record matched"
        );
        info!(contact_id, channel = %channel, "Parameters retrieved");

        Ok(Resolution {
            channel: selector.to_string(),
            destination: (destination != NO_DESTINATION).then(|| destination.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{ClinicianRecord, InMemoryClinicianDirectory};
    use crate::testing::clinician;

    fn resolver_with(records: Vec<ClinicianRecord>) -> ParameterResolver {
        ParameterResolver::new(Arc::new(InMemoryClinicianDirectory::with_records(
            "clinicians",
            records,
        )))
    }

    #[tokio::test]
    async fn test_resolves_each_priority_tier() {
        let mut record = clinician("c1");
        record.low_prio = "email".into();
        record.medium_prio = "sms".into();
        record.high_prio = "call".into();
        let resolver = resolver_with(vec![record]);

        let low = resolver.resolve("c1", "L").await.unwrap();
        assert_eq!(low.channel, "email");
        assert_eq!(low.destination.as_deref(), Some("ops@example.org"));

        let medium = resolver.resolve("c1", "M").await.unwrap();
        assert_eq!(medium.channel, "sms");
        assert_eq!(medium.destination.as_deref(), Some("topic-arn-1"));

        let high = resolver.resolve("c1", "H").await.unwrap();
        assert_eq!(high.channel, "call");
        assert_eq!(high.destination.as_deref(), Some("+15550100"));
    }

    #[tokio::test]
    async fn test_sentinel_destination_is_not_an_error() {
        let mut record = clinician("c1");
        record.high_prio = "email".into();
        record.email_destination = NO_DESTINATION.into();
        let resolver = resolver_with(vec![record]);

        let resolution = resolver.resolve("c1", "H").await.unwrap();
        assert_eq!(resolution.channel, "email");
        assert_eq!(resolution.destination, None);
    }

    #[tokio::test]
    async fn test_invalid_priority() {
        let resolver = resolver_with(vec![clinician("c1")]);
        let result = resolver.resolve("c1", "urgent").await;
        assert!(matches!(result, Err(NotificationError::InvalidPriority(p)) if p == "urgent"));
    }

    #[tokio::test]
    async fn test_contact_not_found() {
        let resolver = resolver_with(vec![clinician("c1")]);
        let result = resolver.resolve("c9", "H").await;
        assert!(matches!(result, Err(NotificationError::ContactNotFound(c)) if c == "c9"));
    }

    #[tokio::test]
    async fn test_unknown_channel() {
        let mut record = clinician("c1");
        record.low_prio = "pager".into();
        record.medium_prio = NO_DESTINATION.into();
        let resolver = resolver_with(vec![record]);

        assert!(matches!(
            resolver.resolve("c1", "L").await,
            Err(NotificationError::UnknownChannel { channel, .. }) if channel == "pager"
        ));
        assert!(matches!(
            resolver.resolve("c1", "M").await,
            Err(NotificationError::UnknownChannel { .. })
        ));
    }
}
