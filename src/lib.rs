//! UWB Position Tracking
//!
//! Estimates the 2D position of ultra-wideband tags from anchor distance
//! reports and keeps a bounded trajectory per tag.
//!
//! Data flows one way: the transport pushes samples into a
//! [`TrackingEngine`] through [`MessageRouter`], consumers pull
//! [`TagSnapshot`]s on their own schedule, and a [`PollScheduler`] asks the
//! anchors to range the tags.

pub mod core;
pub mod algorithms;
pub mod tracking;
pub mod processing;
pub mod transport;
pub mod polling;
pub mod utils;
pub mod error;

// Re-export commonly used types
pub use self::core::{Anchor, AnchorRegistry, Position2D, RangeMeasurement, Sample};
pub use algorithms::{trilaterate, CircleIntersection, DegenerateGeometry};
pub use tracking::{
    IngestOutcome, SolveOutcome, TagPolicy, TagSnapshot, TrackingEngine, TrackingOptions,
};
pub use processing::{DistanceMessage, MessageRouter, PollRequest};
pub use transport::{MemoryPublisher, Publisher, TransportError};
pub use polling::{AutoPoller, PollRound, PollScheduler};
pub use utils::TrackerConfig;
pub use error::{ConfigError, Error, Result, TrackingError};
