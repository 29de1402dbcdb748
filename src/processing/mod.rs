//! Payload decoding and topic routing

pub mod message;
pub mod router;

pub use message::{DistanceMessage, ParseError, PollRequest};
pub use router::{MessageRouter, Route};
