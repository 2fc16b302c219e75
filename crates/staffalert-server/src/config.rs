use serde::{Deserialize, Serialize};
use staffalert_auth::AuthConfig;
use staffalert_notifications::{IdempotencySettings, VoiceSettings, contact_flow_id_from_arn};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Longest idempotency window accepted from configuration (365 days).
pub const MAX_IDEMPOTENCY_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Request authorizer configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Clinician directory
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Idempotency records
    #[serde(default)]
    pub idempotency: IdempotencyConfig,
    /// Outbound voice calls
    #[serde(default)]
    pub voice: VoiceConfig,
    /// Message transports
    #[serde(default)]
    pub transport: TransportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Auth validation
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        // Directory validation
        if self.directory.table.is_empty() {
            return Err("directory.table must not be empty".into());
        }
        // Idempotency validation
        if self.idempotency.table.is_empty() {
            return Err("idempotency.table must not be empty".into());
        }
        if self.idempotency.expires_after_secs == 0 {
            return Err("idempotency.expires_after_secs must be > 0".into());
        }
        if self.idempotency.in_progress_timeout_secs == 0 {
            return Err("idempotency.in_progress_timeout_secs must be > 0".into());
        }
        if self.idempotency.expires_after_secs > MAX_IDEMPOTENCY_WINDOW_SECS {
            return Err(format!(
                "idempotency.expires_after_secs must be <= {MAX_IDEMPOTENCY_WINDOW_SECS}"
            ));
        }
        if self.idempotency.in_progress_timeout_secs > MAX_IDEMPOTENCY_WINDOW_SECS {
            return Err(format!(
                "idempotency.in_progress_timeout_secs must be <= {MAX_IDEMPOTENCY_WINDOW_SECS}"
            ));
        }
        // Voice validation
        self.voice.settings()?;
        // Transport validation
        if self.transport.mode == TransportMode::Http {
            if self.transport.topic_endpoint.as_deref().unwrap_or("").is_empty() {
                return Err("transport.mode=http requires transport.topic_endpoint".into());
            }
            if self.transport.voice_endpoint.as_deref().unwrap_or("").is_empty() {
                return Err("transport.mode=http requires transport.voice_endpoint".into());
            }
            if self.transport.timeout_ms == 0 {
                return Err("transport.timeout_ms must be > 0".into());
            }
            // A request still in flight at the in-progress deadline could be
            // delivered after the key has been reclaimed.
            let in_progress_ms = self.idempotency.in_progress_timeout_secs.saturating_mul(1000);
            if self.transport.timeout_ms >= in_progress_ms {
                return Err(format!(
                    "transport.timeout_ms must be < idempotency.in_progress_timeout_secs ({in_progress_ms} ms)"
                ));
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Name of the clinician directory table
    #[serde(default = "default_directory_table")]
    pub table: String,
    /// JSON file with the directory items to load at startup
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_directory_table() -> String {
    "clinicians".into()
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            table: default_directory_table(),
            seed_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyConfig {
    /// Name of the idempotency record table
    #[serde(default = "default_idempotency_table")]
    pub table: String,
    /// How long a record deduplicates repeated invocations
    #[serde(default = "default_expires_after_secs")]
    pub expires_after_secs: u64,
    /// How long an in-progress record blocks other invocations
    #[serde(default = "default_in_progress_timeout_secs")]
    pub in_progress_timeout_secs: u64,
    /// How often expired records are purged
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_idempotency_table() -> String {
    "idempotency".into()
}
fn default_expires_after_secs() -> u64 {
    3600
}
fn default_in_progress_timeout_secs() -> u64 {
    30
}
fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            table: default_idempotency_table(),
            expires_after_secs: default_expires_after_secs(),
            in_progress_timeout_secs: default_in_progress_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl IdempotencyConfig {
    pub fn settings(&self) -> IdempotencySettings {
        let seconds = |secs: u64| time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX));
        IdempotencySettings {
            expires_after: seconds(self.expires_after_secs),
            in_progress_timeout: seconds(self.in_progress_timeout_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VoiceConfig {
    /// Number outbound calls are placed from (E.164)
    #[serde(default)]
    pub source_phone_number: String,
    /// Contact-center instance id
    #[serde(default)]
    pub connect_instance_id: String,
    /// Contact-flow ARN; the call-flow id is taken from it
    #[serde(default)]
    pub contact_flow_arn: String,
}

impl VoiceConfig {
    pub fn settings(&self) -> Result<VoiceSettings, String> {
        if self.source_phone_number.is_empty() {
            return Err("voice.source_phone_number must not be empty".into());
        }
        if self.connect_instance_id.is_empty() {
            return Err("voice.connect_instance_id must not be empty".into());
        }
        let contact_flow_id = contact_flow_id_from_arn(&self.contact_flow_arn).ok_or_else(|| {
            format!(
                "voice.contact_flow_arn {:?} has no contact-flow id segment",
                self.contact_flow_arn
            )
        })?;

        Ok(VoiceSettings {
            instance_id: self.connect_instance_id.clone(),
            contact_flow_id: contact_flow_id.to_string(),
            source_phone_number: self.source_phone_number.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Relay deliveries to HTTP endpoints
    #[default]
    Http,
    /// Log deliveries without sending anything
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub mode: TransportMode,
    /// Endpoint receiving topic publishes
    #[serde(default)]
    pub topic_endpoint: Option<String>,
    /// Endpoint receiving outbound call requests
    #[serde(default)]
    pub voice_endpoint: Option<String>,
    /// HMAC secret for relay request signatures
    #[serde(default)]
    pub signing_secret: Option<String>,
    #[serde(default = "default_transport_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_transport_timeout_ms() -> u64 {
    10_000
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::default(),
            topic_endpoint: None,
            voice_endpoint: None,
            signing_secret: None,
            timeout_ms: default_transport_timeout_ms(),
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::env;
    use std::path::PathBuf;

    /// Deployment variables read by earlier releases, mapped to config keys.
    const LEGACY_ENV_VARS: &[(&str, &str)] = &[
        ("ClinicianTable", "directory.table"),
        ("IdempotencyTable", "idempotency.table"),
        ("SourcePhoneNumber", "voice.source_phone_number"),
        ("ConnectInstanceId", "voice.connect_instance_id"),
        ("ContactFlowArn", "voice.contact_flow_arn"),
        ("token", "auth.token"),
    ];

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from("staffalert.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., STAFFALERT__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("STAFFALERT")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        for (var, key) in LEGACY_ENV_VARS {
            if let Ok(value) = env::var(var) {
                builder = builder
                    .set_override(*key, value)
                    .map_err(|e| format!("config override error for {var}: {e}"))?;
            }
        }
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}
