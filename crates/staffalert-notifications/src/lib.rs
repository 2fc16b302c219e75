//! Alert routing and delivery for the staff alert gateway.
//!
//! An alert travels through an explicit handler chain:
//!
//! ```text
//! event ──► envelope::extract_body ──► IdempotencyGuard ──► AlertDispatcher
//!                                            │                    │
//!                                     IdempotencyStore     ParameterResolver ──► ClinicianDirectory
//!                                                                 │
//!                                                   Sms / Email / Voice publisher ──► transport
//! ```
//!
//! Every stage implements [`AlertHandler`], so wrappers compose by value and
//! each one only passes the payload through or short-circuits with a cached
//! response or an error.

pub mod adapters;
pub mod directory;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod idempotency;
pub mod resolver;
pub mod transport;
pub mod types;

pub use adapters::{
    ChannelPublisher, EmailPublisher, SendResult, SmsPublisher, VoicePublisher, VoiceSettings,
    contact_flow_id_from_arn,
};
pub use directory::{ClinicianDirectory, ClinicianRecord, InMemoryClinicianDirectory};
pub use dispatcher::{AlertDispatcher, AlertHandler};
pub use error::{NotificationError, TransportError};
pub use idempotency::{
    Claim, IdempotencyGuard, IdempotencyRecord, IdempotencySettings, IdempotencyStatus,
    IdempotencyStore, InMemoryIdempotencyStore,
};
pub use resolver::{ParameterResolver, Resolution};
pub use transport::{
    CallReceipt, HttpTransport, LoggingTransport, OutboundCall, PublishReceipt, TopicPublisher,
    VoiceOriginator,
};
pub use types::*;

#[cfg(test)]
pub(crate) mod testing;
