//! Outgoing poll requests

pub mod auto;
pub mod scheduler;

pub use auto::AutoPoller;
pub use scheduler::{epoch_millis, PollRound, PollScheduler};
