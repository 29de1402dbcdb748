//! Configuration loading

pub mod config;

pub use config::{AnchorConfig, BrokerConfig, TrackerConfig};
