use crate::core::{
    AnchorRegistry, DEFAULT_DISTANCE_TOPIC, DEFAULT_MAX_HISTORY, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_POLL_REQUEST_TOPIC,
};
use crate::error::ConfigError;
use crate::tracking::{TagPolicy, TrackingOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete deployment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Broker connection (used by the transport only)
    pub broker: BrokerConfig,
    /// Anchor table; list order is the anchor selection order
    pub anchors: Vec<AnchorConfig>,
    /// Known tag ids; the first one is the default tag
    pub tags: Vec<String>,
    /// Positions kept per tag
    pub max_history: usize,
    /// Interval between automatic poll requests (milliseconds)
    pub poll_interval_ms: u64,
    /// Start with automatic polling enabled
    pub auto_poll: bool,
    /// Tag resolution policy; derived from the number of tags when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_policy: Option<TagPolicy>,
}

/// Broker connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub distance_topic: String,
    pub poll_request_topic: String,
}

/// Surveyed anchor position in meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl AnchorConfig {
    pub fn new(id: &str, x: f64, y: f64) -> Self {
        Self { id: id.to_string(), x, y }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: Some("position".to_string()),
            password: Some("position".to_string()),
            distance_topic: DEFAULT_DISTANCE_TOPIC.to_string(),
            poll_request_topic: DEFAULT_POLL_REQUEST_TOPIC.to_string(),
        }
    }
}

impl BrokerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TrackerConfig {
    /// Reference deployment: a 5.3 m × 3.65 m room with three anchors on
    /// its corners and a single tag.
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            anchors: vec![
                AnchorConfig::new("MA", 0.0, 0.0),
                AnchorConfig::new("SA1", 5.3, 0.0),
                AnchorConfig::new("SA2", 5.3, 3.65),
            ],
            tags: vec!["T1T1T1T1".to_string()],
            max_history: DEFAULT_MAX_HISTORY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            auto_poll: false,
            tag_policy: None,
        }
    }
}

impl TrackerConfig {
    /// Load and validate configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        Self::from_json_str(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Serialization {
                message: format!("Failed to parse config: {}", e),
            })?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to serialize config: {}", e),
        })
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = self.to_json_string()?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })
    }

    /// Startup checks; any failure here is fatal
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_registry()?;

        if self.tags.is_empty() {
            return Err(ConfigError::NoTags);
        }
        for (i, tag) in self.tags.iter().enumerate() {
            if tag.is_empty() {
                return Err(ConfigError::invalid("tags", i, "tag id must not be empty"));
            }
            if self.tags[..i].contains(tag) {
                return Err(ConfigError::DuplicateTag { tag_id: tag.clone() });
            }
        }

        if self.max_history == 0 {
            return Err(ConfigError::invalid(
                "max_history",
                self.max_history,
                "history must hold at least one position",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "poll_interval_ms",
                self.poll_interval_ms,
                "interval must be positive",
            ));
        }
        if self.broker.distance_topic == self.broker.poll_request_topic {
            return Err(ConfigError::invalid(
                "broker.poll_request_topic",
                &self.broker.poll_request_topic,
                "must differ from the distance topic",
            ));
        }

        Ok(())
    }

    /// Build the anchor registry in table order
    pub fn build_registry(&self) -> Result<AnchorRegistry, ConfigError> {
        let mut builder = AnchorRegistry::builder();
        for anchor in &self.anchors {
            builder.register(&anchor.id, anchor.x, anchor.y)?;
        }
        builder.build()
    }

    /// Configured policy, or the one implied by the tag count
    pub fn tag_policy(&self) -> TagPolicy {
        self.tag_policy
            .unwrap_or_else(|| TagPolicy::for_tag_count(self.tags.len()))
    }

    pub fn tracking_options(&self) -> TrackingOptions {
        TrackingOptions::for_tags(self.tags.clone(), self.max_history)
            .with_policy(self.tag_policy())
    }

    pub fn with_anchor(mut self, id: &str, x: f64, y: f64) -> Self {
        self.anchors.push(AnchorConfig::new(id, x, y));
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_tag_policy(mut self, policy: TagPolicy) -> Self {
        self.tag_policy = Some(policy);
        self
    }
}
