//! JSON payloads exchanged with the ranging network
//!
//! Distance report, as published by the anchors:
//!
//! ```text
//! { "anchor": "SA1", "distance_cm": 312, "rssi": -71, "tag": "T1T1T1T1" }
//! ```
//!
//! `rssi` and `tag` are optional; `tag_address` is accepted as an older
//! spelling of `tag`. Poll request, published by the host:
//!
//! ```text
//! { "poll_id": 1718000000000, "tag_address": "T1T1T1T1" }
//! ```

use crate::core::{Sample, CENTIMETERS_PER_METER};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while decoding a payload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Invalid message format: {details}")]
    InvalidFormat { details: String },
    #[error("Payload is not valid UTF-8: {details}")]
    InvalidEncoding { details: String },
}

/// Distance report from one anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMessage {
    pub anchor: String,
    pub distance_cm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_address: Option<String>,
}

impl DistanceMessage {
    pub fn parse(payload: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(payload).map_err(|e| ParseError::InvalidEncoding {
            details: e.to_string(),
        })?;
        Self::parse_str(text)
    }

    pub fn parse_str(text: &str) -> Result<Self, ParseError> {
        serde_json::from_str(text).map_err(|e| ParseError::InvalidFormat {
            details: e.to_string(),
        })
    }

    /// Tag named by the report; `tag` wins over `tag_address`
    pub fn tag_id(&self) -> Option<&str> {
        self.tag.as_deref().or(self.tag_address.as_deref())
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_cm / CENTIMETERS_PER_METER
    }

    /// Convert to an engine sample stamped with the receive time
    pub fn into_sample(self, received_at_ms: u64) -> Sample {
        let distance_m = self.distance_m();
        let tag_id = self.tag.or(self.tag_address);

        Sample {
            tag_id,
            anchor_id: self.anchor,
            distance_m,
            signal_strength: self.rssi,
            received_at_ms,
        }
    }
}

/// Request for the anchors to range a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRequest {
    /// Trigger time in epoch milliseconds; shared by all tags of one trigger
    pub poll_id: u64,
    pub tag_address: String,
}

impl PollRequest {
    pub fn new(poll_id: u64, tag_address: &str) -> Self {
        Self {
            poll_id,
            tag_address: tag_address.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, ParseError> {
        serde_json::to_string(self).map_err(|e| ParseError::InvalidFormat {
            details: e.to_string(),
        })
    }
}
