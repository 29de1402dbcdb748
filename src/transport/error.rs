//! Transport error types

use thiserror::Error;

/// Errors raised by the publish/subscribe boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// Connection to the broker failed or was lost
    #[error("Connection to {broker} lost")]
    ConnectionLost { broker: String },
    /// Broker refused or failed a publish
    #[error("Publish to {topic} failed: {details}")]
    PublishFailed { topic: String, details: String },
    /// Outgoing payload could not be encoded
    #[error("Payload serialization failed: {details}")]
    Serialization { details: String },
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    /// Whether a later publish can be expected to succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TransportError::Serialization { .. })
    }
}
