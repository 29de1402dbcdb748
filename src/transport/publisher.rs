//! Publisher interface for the messaging boundary

use crate::transport::TransportResult;

/// Outgoing side of the pub/sub channel.
///
/// Implementations hand the payload to the broker and return; there is no
/// acknowledgement or retry.
pub trait Publisher {
    /// Publish `payload` on `topic`
    fn publish(&mut self, topic: &str, payload: &[u8]) -> TransportResult<()>;

    /// Check if the broker connection is up
    fn is_connected(&self) -> bool;
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> TransportResult<()> {
        (**self).publish(topic, payload)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
