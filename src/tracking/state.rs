//! Per-tag tracking state

use crate::core::{AnchorRegistry, Position2D, RangeMeasurement, Sample};
use crate::tracking::history::TrajectoryHistory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Latest measurements and computed track of one tag.
///
/// `position` always equals the newest history entry; both are only changed
/// through [`TagState::commit_fix`] and [`TagState::reset`].
#[derive(Debug, Clone)]
pub struct TagState {
    tag_id: String,
    last_distance: HashMap<String, f64>,
    last_signal: HashMap<String, Option<i32>>,
    last_seen_ms: HashMap<String, u64>,
    position: Option<Position2D>,
    history: TrajectoryHistory,
    revision: u64,
    last_update_ms: Option<u64>,
}

/// Read-only copy of a tag's state handed to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSnapshot {
    pub tag_id: String,
    pub position: Option<Position2D>,
    /// Oldest first
    pub history: Vec<Position2D>,
    pub distances: BTreeMap<String, f64>,
    pub signals: BTreeMap<String, Option<i32>>,
    /// Receive time of each anchor's latest sample (milliseconds)
    pub last_seen_ms: BTreeMap<String, u64>,
    /// Number of samples accepted since creation or reset
    pub revision: u64,
    pub last_update_ms: Option<u64>,
}

impl TagSnapshot {
    /// Snapshot of a configured tag that has not reported yet
    pub fn empty(tag_id: &str) -> Self {
        Self {
            tag_id: tag_id.to_string(),
            position: None,
            history: Vec::new(),
            distances: BTreeMap::new(),
            signals: BTreeMap::new(),
            last_seen_ms: BTreeMap::new(),
            revision: 0,
            last_update_ms: None,
        }
    }
}

impl TagState {
    pub fn new(tag_id: &str, max_history: usize) -> Self {
        Self {
            tag_id: tag_id.to_string(),
            last_distance: HashMap::new(),
            last_signal: HashMap::new(),
            last_seen_ms: HashMap::new(),
            position: None,
            history: TrajectoryHistory::with_capacity(max_history),
            revision: 0,
            last_update_ms: None,
        }
    }

    pub fn tag_id(&self) -> &str {
        &self.tag_id
    }

    pub fn position(&self) -> Option<Position2D> {
        self.position
    }

    pub fn history(&self) -> &TrajectoryHistory {
        &self.history
    }

    pub fn distance(&self, anchor_id: &str) -> Option<f64> {
        self.last_distance.get(anchor_id).copied()
    }

    /// Overwrite the slot of the sample's anchor. Last write wins.
    pub fn record(&mut self, sample: &Sample) {
        self.last_distance.insert(sample.anchor_id.clone(), sample.distance_m);
        self.last_signal.insert(sample.anchor_id.clone(), sample.signal_strength);
        self.last_seen_ms.insert(sample.anchor_id.clone(), sample.received_at_ms);
        self.revision += 1;
        self.last_update_ms = Some(sample.received_at_ms);
    }

    /// Ranges with a positive stored distance, in registry order
    pub fn usable_ranges(&self, registry: &AnchorRegistry) -> Vec<RangeMeasurement> {
        registry
            .all()
            .iter()
            .filter_map(|anchor| {
                self.last_distance
                    .get(&anchor.id)
                    .filter(|&&distance| distance > 0.0)
                    .map(|&distance| RangeMeasurement::new(anchor.position, distance))
            })
            .collect()
    }

    /// Store a freshly solved position and append it to the history
    pub fn commit_fix(&mut self, position: Position2D) {
        self.position = Some(position);
        self.history.push(position);
    }

    pub fn reset(&mut self) {
        *self = TagState::new(&self.tag_id, self.history.capacity());
    }

    pub fn snapshot(&self) -> TagSnapshot {
        TagSnapshot {
            tag_id: self.tag_id.clone(),
            position: self.position,
            history: self.history.to_vec(),
            distances: self
                .last_distance
                .iter()
                .map(|(id, d)| (id.clone(), *d))
                .collect(),
            signals: self
                .last_signal
                .iter()
                .map(|(id, s)| (id.clone(), *s))
                .collect(),
            last_seen_ms: self
                .last_seen_ms
                .iter()
                .map(|(id, t)| (id.clone(), *t))
                .collect(),
            revision: self.revision,
            last_update_ms: self.last_update_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AnchorRegistry {
        AnchorRegistry::from_anchors(vec![
            crate::core::Anchor::new("MA", 0.0, 0.0),
            crate::core::Anchor::new("SA1", 5.3, 0.0),
            crate::core::Anchor::new("SA2", 5.3, 3.65),
            crate::core::Anchor::new("SA3", 0.0, 3.65),
        ])
        .unwrap()
    }

    #[test]
    fn test_last_write_wins() {
        let mut state = TagState::new("T1", 50);
        state.record(&Sample::new(None, "MA", 2.0).with_signal_strength(-60));
        state.record(&Sample::new(None, "MA", 2.5).with_signal_strength(-65));

        assert_eq!(state.distance("MA"), Some(2.5));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.signals.get("MA"), Some(&Some(-65)));
        assert_eq!(snapshot.revision, 2);
        assert_eq!(snapshot.last_seen_ms.get("MA"), Some(&0));
    }

    #[test]
    fn test_usable_ranges_follow_registry_order() {
        let registry = registry();
        let mut state = TagState::new("T1", 50);
        state.record(&Sample::new(None, "SA3", 1.0));
        state.record(&Sample::new(None, "SA1", 2.0));
        state.record(&Sample::new(None, "MA", 3.0));

        let ranges = state.usable_ranges(&registry);
        let distances: Vec<f64> = ranges.iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![3.0, 2.0, 1.0]);
        assert_eq!(ranges[2].anchor, Position2D::new(0.0, 3.65));
    }

    #[test]
    fn test_commit_keeps_position_and_history_in_step() {
        let mut state = TagState::new("T1", 2);
        for i in 0..3 {
            state.commit_fix(Position2D::new(i as f64, 1.0));
            assert_eq!(state.position().as_ref(), state.history().latest());
        }
        assert_eq!(state.history().len(), 2);
    }

    #[test]
    fn test_reset_clears_everything_but_capacity() {
        let mut state = TagState::new("T1", 7);
        state.record(&Sample::new(None, "MA", 2.0).with_timestamp(10));
        state.commit_fix(Position2D::new(1.0, 1.0));

        state.reset();

        assert_eq!(state.snapshot(), TagSnapshot::empty("T1"));
        assert_eq!(state.history().capacity(), 7);
    }
}
