//! Wiring of the alert handler chain from configuration.

use std::sync::Arc;
use std::time::Duration;

use staffalert_notifications::{
    AlertDispatcher, AlertHandler, ClinicianDirectory, EmailPublisher, HttpTransport,
    IdempotencyGuard, IdempotencyStore, InMemoryClinicianDirectory, InMemoryIdempotencyStore,
    LoggingTransport, ParameterResolver, SmsPublisher, TopicPublisher, TransportError,
    VoiceOriginator, VoicePublisher,
};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use crate::config::{AppConfig, TransportMode};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read directory seed file {path}: {source}")]
    SeedFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Directory(#[from] staffalert_notifications::NotificationError),

    #[error("failed to build transport: {0}")]
    Transport(#[from] TransportError),
}

/// Message transports the publishers deliver through.
#[derive(Clone)]
pub struct Transports {
    pub topics: Arc<dyn TopicPublisher>,
    pub voice: Arc<dyn VoiceOriginator>,
}

impl Transports {
    /// Use one transport for both topic publishes and outbound calls.
    pub fn shared<T>(transport: Arc<T>) -> Self
    where
        T: TopicPublisher + VoiceOriginator + 'static,
    {
        Self {
            topics: transport.clone(),
            voice: transport,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, BootstrapError> {
        match cfg.transport.mode {
            TransportMode::Log => {
                tracing::info!("Using logging transport; no messages will leave this process");
                Ok(Self::shared(Arc::new(LoggingTransport::new())))
            }
            TransportMode::Http => {
                let topic_endpoint = cfg.transport.topic_endpoint.clone().ok_or_else(|| {
                    BootstrapError::Config("transport.topic_endpoint is required".into())
                })?;
                let voice_endpoint = cfg.transport.voice_endpoint.clone().ok_or_else(|| {
                    BootstrapError::Config("transport.voice_endpoint is required".into())
                })?;
                let mut transport =
                    HttpTransport::new(topic_endpoint, voice_endpoint, cfg.transport.timeout())?;
                if let Some(secret) = cfg.transport.signing_secret.as_deref()
                    && !secret.is_empty()
                {
                    transport = transport.with_signing_secret(secret);
                }
                Ok(Self::shared(Arc::new(transport)))
            }
        }
    }
}

/// Load the clinician directory, seeding it from the configured JSON file.
pub fn load_directory(cfg: &AppConfig) -> Result<InMemoryClinicianDirectory, BootstrapError> {
    let table = cfg.directory.table.clone();
    let Some(path) = cfg.directory.seed_file.as_ref() else {
        tracing::warn!(table = %table, "No directory seed file configured; directory is empty");
        return Ok(InMemoryClinicianDirectory::new(table));
    };

    let json = std::fs::read_to_string(path).map_err(|source| BootstrapError::SeedFile {
        path: path.display().to_string(),
        source,
    })?;
    let directory = InMemoryClinicianDirectory::from_json(table, &json)?;
    tracing::info!(
        table = %directory.table(),
        clinicians = directory.len(),
        "Clinician directory loaded"
    );
    Ok(directory)
}

/// Build the idempotent dispatch chain.
///
/// Returns the handler and the idempotency store it writes to, so the caller
/// can run the expiry sweeper against the same records.
pub fn build_handler(
    cfg: &AppConfig,
    transports: Transports,
) -> Result<(Arc<dyn AlertHandler>, Arc<InMemoryIdempotencyStore>), BootstrapError> {
    let voice_settings = cfg.voice.settings().map_err(BootstrapError::Config)?;
    let directory: Arc<dyn ClinicianDirectory> = Arc::new(load_directory(cfg)?);

    let dispatcher = AlertDispatcher::new(
        ParameterResolver::new(directory),
        SmsPublisher::new(transports.topics.clone()),
        EmailPublisher::new(transports.topics),
        VoicePublisher::new(transports.voice, voice_settings),
    );

    let store = Arc::new(InMemoryIdempotencyStore::new(cfg.idempotency.table.clone()));
    let guard = IdempotencyGuard::new(dispatcher, store.clone(), cfg.idempotency.settings());

    Ok((Arc::new(guard), store))
}

/// Periodically delete idempotency records that can no longer answer or block
/// an invocation.
pub fn spawn_idempotency_sweeper<S>(store: Arc<S>, interval: Duration) -> JoinHandle<()>
where
    S: IdempotencyStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired(OffsetDateTime::now_utc()).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Purged expired idempotency records"),
                Err(e) => tracing::warn!(error = %e, "Idempotency sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoiceConfig;
    use serde_json::json;
    use staffalert_notifications::SENT_BODY;
    use std::io::Write;

    fn config_with_seed(seed: Option<std::path::PathBuf>) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.auth.token = "s3cret".into();
        cfg.transport.mode = TransportMode::Log;
        cfg.directory.seed_file = seed;
        cfg.voice = VoiceConfig {
            source_phone_number: "+15550199".into(),
            connect_instance_id: "instance-1".into(),
            contact_flow_arn: "arn:aws:connect:eu-west-1:123456789012:instance/instance-1/contact-flow/flow-1".into(),
        };
        cfg
    }

    fn seed_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let items = json!([{
            "ContactId": "c1",
            "LowPrio": "email",
            "MediumPrio": "sms",
            "HighPrio": "sms",
            "EmailDestination": "ops@example.org",
            "SMSDestination": "topic-arn-1",
            "CallDestination": "+15550100"
        }]);
        write!(file, "{items}").unwrap();
        file
    }

    #[test]
    fn test_missing_seed_file_is_an_error() {
        let cfg = config_with_seed(Some("/nonexistent/clinicians.json".into()));
        let err = load_directory(&cfg).unwrap_err();
        assert!(matches!(err, BootstrapError::SeedFile { .. }));
    }

    #[test]
    fn test_no_seed_file_gives_empty_directory() {
        let cfg = config_with_seed(None);
        assert!(load_directory(&cfg).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handler_chain_dispatches_and_deduplicates() {
        let file = seed_file();
        let cfg = config_with_seed(Some(file.path().to_path_buf()));
        let transport = Arc::new(LoggingTransport::new());
        let (handler, store) = build_handler(&cfg, Transports::shared(transport.clone())).unwrap();

        let payload = json!({
            "message_id": "m1",
            "patient_id": "p1",
            "contact_id": "c1",
            "description": "Blood results ready",
            "priority": "H"
        });
        let first = handler.handle(&payload).await.unwrap();
        let second = handler.handle(&payload).await.unwrap();

        assert_eq!(first.body, SENT_BODY);
        assert_eq!(first, second);
        assert_eq!(transport.published_count(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.table(), "idempotency");
    }

    #[tokio::test]
    async fn test_sweeper_purges_expired_records() {
        let store = Arc::new(InMemoryIdempotencyStore::new("idempotency"));
        let settings = staffalert_notifications::IdempotencySettings {
            expires_after: time::Duration::ZERO,
            in_progress_timeout: time::Duration::ZERO,
        };
        let record = staffalert_notifications::IdempotencyRecord::in_progress(
            "m1",
            OffsetDateTime::now_utc(),
            &settings,
        )
        .unwrap();
        store.create_in_progress(record).await.unwrap();
        assert_eq!(store.len(), 1);

        let handle = spawn_idempotency_sweeper(store.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(store.is_empty());
    }
}
