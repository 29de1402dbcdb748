//! End-to-end behavior of the reference deployment: three anchors in a
//! 5.3 m × 3.65 m room and one tag.

use approx::assert_abs_diff_eq;
use std::sync::Arc;
use uwb_tracking::core::{DEFAULT_DISTANCE_TOPIC, DEFAULT_POLL_REQUEST_TOPIC};
use uwb_tracking::{
    Error, MemoryPublisher, MessageRouter, PollRequest, PollScheduler, Position2D, SolveOutcome,
    TagPolicy, TrackerConfig, TrackingEngine, TrackingError,
};

fn router_for(config: &TrackerConfig) -> MessageRouter {
    let registry = Arc::new(config.build_registry().unwrap());
    let engine = TrackingEngine::new(registry, config.tracking_options()).unwrap();
    MessageRouter::new(
        Arc::new(engine),
        &config.broker.distance_topic,
        &config.broker.poll_request_topic,
    )
}

fn report(anchor: &str, distance_cm: f64, tag: Option<&str>) -> Vec<u8> {
    let mut payload = serde_json::json!({
        "anchor": anchor,
        "distance_cm": distance_cm,
        "rssi": -70,
    });
    if let Some(tag) = tag {
        payload["tag"] = serde_json::Value::from(tag);
    }
    serde_json::to_vec(&payload).unwrap()
}

#[test]
fn distances_from_all_three_anchors_produce_a_fix() {
    let router = router_for(&TrackerConfig::default());

    router.handle(DEFAULT_DISTANCE_TOPIC, &report("MA", 300.0, None), 1).unwrap();
    router.handle(DEFAULT_DISTANCE_TOPIC, &report("SA1", 300.0, None), 2).unwrap();
    let outcome = router
        .handle(DEFAULT_DISTANCE_TOPIC, &report("SA2", 500.0, None), 3)
        .unwrap()
        .unwrap();

    let position = outcome.solve.position().unwrap();
    assert_abs_diff_eq!(position.x, 2.65, epsilon = 1e-9);
    assert_abs_diff_eq!(position.y, -2.6775 / 7.3, epsilon = 1e-9);

    let snapshot = router.engine().snapshot("T1T1T1T1").unwrap();
    assert_eq!(snapshot.position, Some(position));
    assert_eq!(snapshot.revision, 3);
    assert_eq!(snapshot.last_update_ms, Some(3));
    assert_eq!(snapshot.signals.get("SA2"), Some(&Some(-70)));
}

#[test]
fn two_anchors_leave_position_absent() {
    let router = router_for(&TrackerConfig::default());

    router.handle(DEFAULT_DISTANCE_TOPIC, &report("MA", 300.0, None), 0).unwrap();
    let outcome = router
        .handle(DEFAULT_DISTANCE_TOPIC, &report("SA1", 300.0, None), 0)
        .unwrap()
        .unwrap();

    assert_eq!(outcome.solve, SolveOutcome::Pending { reporting: 2 });
    assert!(router.engine().snapshot("T1T1T1T1").unwrap().position.is_none());
}

#[test]
fn zero_distance_does_not_overwrite_previous_reading() {
    let router = router_for(&TrackerConfig::default());

    router.handle(DEFAULT_DISTANCE_TOPIC, &report("MA", 300.0, None), 0).unwrap();
    let err = router
        .handle(DEFAULT_DISTANCE_TOPIC, &report("MA", 0.0, None), 0)
        .unwrap_err();

    assert!(matches!(err, Error::Tracking(TrackingError::InvalidDistance { .. })));
    let snapshot = router.engine().snapshot("T1T1T1T1").unwrap();
    assert_eq!(snapshot.distances.get("MA"), Some(&3.0));
}

#[test]
fn walking_tag_keeps_last_fifty_positions() {
    let config = TrackerConfig::default();
    let router = router_for(&config);
    let registry = config.build_registry().unwrap();
    let mut fixes = Vec::new();

    let mut step = 0;
    while fixes.len() < 60 {
        let target = Position2D::new(0.5 + 0.07 * step as f64, 0.5 + 0.04 * step as f64);
        for anchor in registry.all() {
            let distance_cm = anchor.position.distance_to(&target) * 100.0;
            let outcome = router
                .handle(DEFAULT_DISTANCE_TOPIC, &report(&anchor.id, distance_cm, None), step)
                .unwrap()
                .unwrap();
            fixes.extend(outcome.solve.position());
        }
        step += 1;
    }

    let snapshot = router.engine().snapshot("T1T1T1T1").unwrap();
    assert_eq!(snapshot.history.len(), 50);
    assert_eq!(snapshot.history[0], fixes[10]);
    assert_eq!(*snapshot.history.last().unwrap(), fixes[59]);
}

#[test]
fn multi_tag_deployment_tracks_tags_separately() {
    let config = TrackerConfig::default().with_tags(&["TAG_A", "TAG_B"]);
    assert_eq!(config.tag_policy(), TagPolicy::Strict);
    let router = router_for(&config);

    for (anchor, cm) in [("MA", 300.0), ("SA1", 300.0), ("SA2", 500.0)] {
        router.handle(DEFAULT_DISTANCE_TOPIC, &report(anchor, cm, Some("TAG_B")), 0).unwrap();
    }
    // Unknown tag: silently dropped
    assert_eq!(
        router.handle(DEFAULT_DISTANCE_TOPIC, &report("MA", 100.0, Some("TAG_Z")), 0).unwrap(),
        None
    );

    let snapshots = router.engine().snapshot_all();
    assert!(snapshots[0].position.is_none());
    assert!(snapshots[1].position.is_some());
    assert_eq!(snapshots[0].revision, 0);
}

#[test]
fn poll_round_publishes_one_request_per_tag() {
    let config = TrackerConfig::default().with_tags(&["TAG_A", "TAG_B"]);
    let mut scheduler = PollScheduler::new(
        &config.broker.poll_request_topic,
        config.tags.clone(),
        config.poll_interval_ms,
    );
    let mut publisher = MemoryPublisher::new();

    scheduler.set_enabled(true, 10_000);
    assert_eq!(scheduler.on_tick(10_000, &mut publisher), 2);
    assert_eq!(scheduler.on_tick(11_999, &mut publisher), 0);
    assert_eq!(scheduler.on_tick(12_000, &mut publisher), 2);

    let requests: Vec<PollRequest> = publisher
        .sent()
        .iter()
        .map(|m| {
            assert_eq!(m.topic, DEFAULT_POLL_REQUEST_TOPIC);
            serde_json::from_slice(&m.payload).unwrap()
        })
        .collect();
    assert_eq!(
        requests,
        vec![
            PollRequest::new(10_000, "TAG_A"),
            PollRequest::new(10_000, "TAG_B"),
            PollRequest::new(12_000, "TAG_A"),
            PollRequest::new(12_000, "TAG_B"),
        ]
    );

    // The broker echoes poll requests back; the router ignores them
    let router = router_for(&config);
    let echo = &publisher.sent()[0].payload;
    assert_eq!(router.handle(DEFAULT_POLL_REQUEST_TOPIC, echo, 0).unwrap(), None);
}
