//! Command-line tracker
//!
//! Reads broker messages as JSON lines on stdin,
//! `{"topic": "uwb/trilateration/distance", "payload": {...}}`, and prints
//! every new position as a JSON snapshot on stdout. Poll requests go to
//! stdout as well, prefixed with their topic.

use parking_lot::Mutex;
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uwb_tracking::polling::epoch_millis;
use uwb_tracking::transport::TransportResult;
use uwb_tracking::{
    AutoPoller, MessageRouter, PollScheduler, Publisher, TrackerConfig, TrackingEngine,
    TransportError,
};

/// One line of input
#[derive(Debug, Deserialize)]
struct Envelope {
    topic: String,
    payload: serde_json::Value,
}

/// Writes published messages to stdout
struct StdoutPublisher;

impl Publisher for StdoutPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> TransportResult<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} {}", topic, String::from_utf8_lossy(payload)).map_err(|e| {
            TransportError::PublishFailed {
                topic: topic.to_string(),
                details: e.to_string(),
            }
        })
    }

    fn is_connected(&self) -> bool {
        true
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrackerConfig::from_file(path)?,
        None => TrackerConfig::default(),
    };

    let registry = Arc::new(config.build_registry()?);
    let engine = Arc::new(TrackingEngine::new(registry, config.tracking_options())?);
    let router = MessageRouter::new(
        Arc::clone(&engine),
        &config.broker.distance_topic,
        &config.broker.poll_request_topic,
    );
    info!(
        anchors = engine.registry().len(),
        tags = engine.known_tags().len(),
        policy = ?engine.policy(),
        broker = %config.broker.address(),
        "tracker ready"
    );

    let scheduler = Arc::new(Mutex::new(PollScheduler::new(
        &config.broker.poll_request_topic,
        config.tags.clone(),
        config.poll_interval_ms,
    )));
    let publisher = Arc::new(Mutex::new(StdoutPublisher));
    let poller = if config.auto_poll {
        Some(AutoPoller::start(scheduler, publisher)?)
    } else {
        let round = scheduler.lock().manual_round(epoch_millis());
        round.publish(&mut *publisher.lock());
        None
    };

    let started = Instant::now();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let envelope: Envelope = match serde_json::from_str(&line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "skipping malformed input line");
                continue;
            }
        };
        let payload = serde_json::to_vec(&envelope.payload)?;
        let received_at_ms = started.elapsed().as_millis() as u64;

        match router.handle(&envelope.topic, &payload, received_at_ms) {
            Ok(Some(outcome)) if outcome.solve.position().is_some() => {
                let snapshot = engine.snapshot(&outcome.tag_id)?;
                println!("{}", serde_json::to_string(&snapshot)?);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "sample dropped"),
        }
    }

    if let Some(poller) = poller {
        poller.stop();
    }
    Ok(())
}
