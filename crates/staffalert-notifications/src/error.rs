use thiserror::Error;

use crate::types::Channel;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid priority: {0:?}")]
    InvalidPriority(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Unknown channel {channel:?} configured for contact {contact_id}")]
    UnknownChannel { contact_id: String, channel: String },

    #[error("{channel} publish failed: {source}")]
    Publish {
        channel: Channel,
        #[source]
        source: TransportError,
    },

    #[error("Missing idempotency key: message_id")]
    MissingIdempotencyKey,

    #[error("Invocation already in progress for message {0}")]
    ConcurrentInvocation(String),

    #[error("Dispatch for message {0} did not finish before its in-progress deadline")]
    DispatchTimeout(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Idempotency store error: {0}")]
    Store(String),
}

impl NotificationError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// True for errors caused by the caller's input rather than by a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload(_) | Self::InvalidPriority(_) | Self::MissingIdempotencyKey
        )
    }
}

/// Failure reported by an underlying message transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("provider rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
