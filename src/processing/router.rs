//! Topic dispatch for incoming broker messages

use crate::error::Error;
use crate::processing::message::DistanceMessage;
use crate::tracking::{IngestOutcome, TrackingEngine};
use std::sync::Arc;
use tracing::{debug, trace};

/// Classification of an incoming topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Distance,
    /// Our own poll requests echoed back by the broker
    PollRequest,
    Other,
}

/// Feeds distance reports from the broker into the engine
pub struct MessageRouter {
    engine: Arc<TrackingEngine>,
    distance_topic: String,
    poll_request_topic: String,
}

impl MessageRouter {
    pub fn new(
        engine: Arc<TrackingEngine>,
        distance_topic: &str,
        poll_request_topic: &str,
    ) -> Self {
        Self {
            engine,
            distance_topic: distance_topic.to_string(),
            poll_request_topic: poll_request_topic.to_string(),
        }
    }

    pub fn engine(&self) -> &Arc<TrackingEngine> {
        &self.engine
    }

    /// Topics the host should subscribe to
    pub fn subscriptions(&self) -> [&str; 2] {
        [self.distance_topic.as_str(), self.poll_request_topic.as_str()]
    }

    pub fn route(&self, topic: &str) -> Route {
        if topic == self.distance_topic {
            Route::Distance
        } else if topic == self.poll_request_topic {
            Route::PollRequest
        } else {
            Route::Other
        }
    }

    /// Handle one broker message.
    ///
    /// Returns `Ok(None)` for messages that carry nothing for the engine,
    /// including samples for tags the policy drops.
    pub fn handle(
        &self,
        topic: &str,
        payload: &[u8],
        received_at_ms: u64,
    ) -> Result<Option<IngestOutcome>, Error> {
        match self.route(topic) {
            Route::Distance => {}
            Route::PollRequest => {
                trace!(topic, "poll request echo");
                return Ok(None);
            }
            Route::Other => {
                debug!(topic, "ignoring message on unexpected topic");
                return Ok(None);
            }
        }

        let message = DistanceMessage::parse(payload)?;
        match self.engine.ingest(&message.into_sample(received_at_ms)) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(err) if err.is_silent() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
