//! Tag resolution policy
//!
//! Single-tag deployments accept any tag id and fold it into their one tag,
//! which keeps older anchor firmware that reports foreign or stale tag
//! addresses working. Multi-tag deployments only accept the configured ids.

use crate::error::{ConfigError, TrackingError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagPolicy {
    /// Unknown tag ids are mapped to the default tag
    #[serde(rename = "coerce")]
    CoerceToDefault,
    /// Unknown tag ids are dropped
    #[serde(rename = "strict")]
    Strict,
}

impl TagPolicy {
    /// Policy used when configuration does not name one
    pub fn for_tag_count(count: usize) -> Self {
        if count == 1 {
            TagPolicy::CoerceToDefault
        } else {
            TagPolicy::Strict
        }
    }
}

/// Maps the tag id carried by a sample onto a configured tag
#[derive(Debug, Clone)]
pub struct TagResolver {
    known: Vec<String>,
    policy: TagPolicy,
}

impl TagResolver {
    pub fn new(known: Vec<String>, policy: TagPolicy) -> Result<Self, ConfigError> {
        if known.is_empty() {
            return Err(ConfigError::NoTags);
        }
        for (i, tag) in known.iter().enumerate() {
            if known[..i].contains(tag) {
                return Err(ConfigError::DuplicateTag { tag_id: tag.clone() });
            }
        }

        Ok(Self { known, policy })
    }

    /// The first configured tag
    pub fn default_tag(&self) -> &str {
        &self.known[0]
    }

    pub fn known(&self) -> &[String] {
        &self.known
    }

    pub fn policy(&self) -> TagPolicy {
        self.policy
    }

    pub fn is_known(&self, tag_id: &str) -> bool {
        self.known.iter().any(|t| t == tag_id)
    }

    /// Resolve a sample's tag id. A missing id always means the default tag.
    pub fn resolve(&self, tag_id: Option<&str>) -> Result<&str, TrackingError> {
        let Some(requested) = tag_id else {
            return Ok(self.default_tag());
        };

        if let Some(tag) = self.known.iter().find(|t| *t == requested) {
            return Ok(tag.as_str());
        }

        match self.policy {
            TagPolicy::CoerceToDefault => Ok(self.default_tag()),
            TagPolicy::Strict => Err(TrackingError::UnresolvedTag {
                tag_id: requested.to_string(),
            }),
        }
    }
}
