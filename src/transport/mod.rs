//! Messaging boundary
//!
//! The broker client itself lives outside this crate; the engine only needs
//! somewhere to hand outgoing poll requests.

pub mod error;
pub mod memory;
pub mod publisher;

pub use error::{TransportError, TransportResult};
pub use memory::{MemoryPublisher, PublishedMessage};
pub use publisher::Publisher;
