//! In-memory publisher for testing and offline runs

use crate::transport::{Publisher, TransportError, TransportResult};

/// A message captured by [`MemoryPublisher`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("")
    }
}

/// Publisher that records every message instead of sending it
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    sent: Vec<PublishedMessage>,
    connected: bool,
    publish_attempts: u32,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            connected: true,
            publish_attempts: 0,
        }
    }

    /// Simulate connection loss
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Restore connection
    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    pub fn sent(&self) -> &[PublishedMessage] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<PublishedMessage> {
        std::mem::take(&mut self.sent)
    }

    pub fn publish_attempts(&self) -> u32 {
        self.publish_attempts
    }
}

impl Publisher for MemoryPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> TransportResult<()> {
        self.publish_attempts += 1;
        if !self.connected {
            return Err(TransportError::ConnectionLost {
                broker: "memory".to_string(),
            });
        }

        self.sent.push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
