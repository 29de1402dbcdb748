//! Poll request scheduling
//!
//! The scheduler only decides *when* to poll and *what* to send. Each trigger
//! yields a [`PollRound`] holding one request per known tag; the caller
//! publishes it after releasing whatever lock guards the scheduler, so the
//! schedule never waits on the transport. Publishing is fire-and-forget.

use crate::processing::message::PollRequest;
use crate::transport::{Publisher, TransportError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Milliseconds since the Unix epoch
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Requests produced by one poll trigger
#[derive(Debug, Clone, PartialEq)]
pub struct PollRound {
    topic: String,
    poll_id: u64,
    requests: Vec<PollRequest>,
}

impl PollRound {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn poll_id(&self) -> u64 {
        self.poll_id
    }

    pub fn requests(&self) -> &[PollRequest] {
        &self.requests
    }

    /// Hand every request to `publisher`. A failed request is logged and the
    /// rest are still attempted. Returns the number published.
    pub fn publish<P: Publisher + ?Sized>(&self, publisher: &mut P) -> usize {
        let mut published = 0;

        for request in &self.requests {
            let result = request
                .to_json()
                .map_err(|e| TransportError::Serialization {
                    details: e.to_string(),
                })
                .and_then(|json| publisher.publish(&self.topic, json.as_bytes()));

            match result {
                Ok(()) => {
                    debug!(tag = %request.tag_address, poll_id = self.poll_id, "poll request sent");
                    published += 1;
                }
                Err(err) => {
                    warn!(tag = %request.tag_address, error = %err, "poll request not sent")
                }
            }
        }

        published
    }
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    topic: String,
    tags: Vec<String>,
    interval_ms: u64,
    enabled: bool,
    next_due_ms: Option<u64>,
    rounds: u64,
}

impl PollScheduler {
    pub fn new(topic: &str, tags: Vec<String>, interval_ms: u64) -> Self {
        Self {
            topic: topic.to_string(),
            tags,
            interval_ms,
            enabled: false,
            next_due_ms: None,
            rounds: 0,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    /// Number of poll rounds triggered so far
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Toggle automatic polling. Enabling makes a poll due right away.
    pub fn set_enabled(&mut self, enabled: bool, now_ms: u64) {
        self.enabled = enabled;
        self.next_due_ms = if enabled { Some(now_ms) } else { None };
        debug!(enabled, interval_ms = self.interval_ms, "auto poll toggled");
    }

    /// Time left until the next automatic poll, `None` while disabled
    pub fn time_until_due(&self, now_ms: u64) -> Option<Duration> {
        self.next_due_ms
            .map(|due| Duration::from_millis(due.saturating_sub(now_ms)))
    }

    /// Take the next automatic round if polling is enabled and due, and
    /// schedule the one after it.
    pub fn due_round(&mut self, now_ms: u64) -> Option<PollRound> {
        match self.next_due_ms {
            Some(due) if self.enabled && now_ms >= due => {
                self.next_due_ms = Some(now_ms + self.interval_ms);
                Some(self.round(now_ms))
            }
            _ => None,
        }
    }

    /// A round for the manual trigger, whether or not auto polling is on
    pub fn manual_round(&mut self, now_ms: u64) -> PollRound {
        self.round(now_ms)
    }

    /// [`due_round`](Self::due_round) and publish in one step, for a
    /// scheduler that is not shared
    pub fn on_tick<P: Publisher + ?Sized>(&mut self, now_ms: u64, publisher: &mut P) -> usize {
        self.due_round(now_ms)
            .map_or(0, |round| round.publish(publisher))
    }

    /// [`manual_round`](Self::manual_round) and publish in one step
    pub fn poll_now<P: Publisher + ?Sized>(&mut self, now_ms: u64, publisher: &mut P) -> usize {
        self.manual_round(now_ms).publish(publisher)
    }

    fn round(&mut self, poll_id: u64) -> PollRound {
        self.rounds += 1;
        PollRound {
            topic: self.topic.clone(),
            poll_id,
            requests: self
                .tags
                .iter()
                .map(|tag| PollRequest::new(poll_id, tag))
                .collect(),
        }
    }
}
