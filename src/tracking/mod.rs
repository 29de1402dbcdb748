//! Per-tag tracking: state store, tag policy and the engine that drives them

pub mod engine;
pub mod history;
pub mod policy;
pub mod state;

pub use engine::{IngestOutcome, SolveOutcome, TrackingEngine, TrackingOptions};
pub use history::TrajectoryHistory;
pub use policy::{TagPolicy, TagResolver};
pub use state::{TagSnapshot, TagState};
