//! Error types for tracking, configuration and the crate as a whole

use crate::processing::message::ParseError;
use crate::transport::TransportError;
use thiserror::Error;

/// Runtime errors raised while folding samples into tag state.
///
/// All of them are local: the offending sample is dropped and the engine
/// keeps serving whatever arrives next.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    /// Sample references an anchor that is not in the registry
    #[error("Unknown anchor: {anchor_id}")]
    UnknownAnchor { anchor_id: String },
    /// Tag id cannot be mapped to a known tag under the active policy
    #[error("Unresolved tag: {tag_id}")]
    UnresolvedTag { tag_id: String },
    /// Distance is zero, negative or not finite
    #[error("Invalid distance from anchor {anchor_id}: {distance_m} m")]
    InvalidDistance { anchor_id: String, distance_m: f64 },
    /// The selected anchors are collinear or nearly so
    #[error("Degenerate anchor geometry: determinant {determinant:e}")]
    DegenerateGeometry { determinant: f64 },
    /// Snapshot requested for a tag that is not configured
    #[error("Tag not found: {tag_id}")]
    TagNotFound { tag_id: String },
}

impl TrackingError {
    /// Whether the error should be surfaced to the transport layer
    pub fn is_silent(&self) -> bool {
        matches!(self, TrackingError::UnresolvedTag { .. })
    }
}

/// Startup-fatal configuration problems
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Duplicate anchor id: {anchor_id}")]
    DuplicateAnchor { anchor_id: String },
    #[error("Anchor table is empty")]
    EmptyAnchorTable,
    #[error("No tags configured")]
    NoTags,
    #[error("Duplicate tag id: {tag_id}")]
    DuplicateTag { tag_id: String },
    #[error("Invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("Configuration I/O error: {message}")]
    Io { message: String },
    #[error("Configuration format error: {message}")]
    Serialization { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Any error produced by this crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
