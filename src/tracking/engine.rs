//! Tracking engine
//!
//! Turns a stream of per-anchor distance samples into per-tag positions.
//!
//! # Locking
//! Each tag's state sits behind its own mutex; the tag map itself is behind a
//! read/write lock that is only taken for writing the first time a tag
//! reports. An `ingest` holds the tag mutex for the whole
//! record → select → solve → commit sequence, so a concurrent `snapshot`
//! sees either all of an update or none of it. No lock is held once a call
//! returns.
//!
//! # Anchor selection
//! Anchors are considered in registry order and only the first three with a
//! positive stored distance take part in a fix. Additional anchors are never
//! used, even when they would give better geometry.

use crate::algorithms::{CircleIntersection, DegenerateGeometry};
use crate::core::{AnchorRegistry, Position2D, Sample, MIN_ANCHORS_FOR_FIX};
use crate::error::{ConfigError, TrackingError};
use crate::tracking::policy::{TagPolicy, TagResolver};
use crate::tracking::state::{TagSnapshot, TagState};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to the tag's position after a sample was accepted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    /// A new position was computed and appended to the history
    Solved(Position2D),
    /// Fewer than three anchors with a usable distance
    Pending { reporting: usize },
    /// The selected anchors are collinear; previous position kept
    Degenerate { determinant: f64 },
}

impl SolveOutcome {
    pub fn position(&self) -> Option<Position2D> {
        match self {
            SolveOutcome::Solved(position) => Some(*position),
            _ => None,
        }
    }
}

/// Result of a successful `ingest`
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// Tag the sample was folded into, after policy resolution
    pub tag_id: String,
    pub solve: SolveOutcome,
}

/// Startup parameters of the engine
#[derive(Debug, Clone)]
pub struct TrackingOptions {
    pub known_tags: Vec<String>,
    pub policy: TagPolicy,
    pub max_history: usize,
    pub solver: CircleIntersection,
}

impl TrackingOptions {
    /// Options with the policy derived from the number of tags
    pub fn for_tags(known_tags: Vec<String>, max_history: usize) -> Self {
        Self {
            policy: TagPolicy::for_tag_count(known_tags.len()),
            known_tags,
            max_history,
            solver: CircleIntersection::default(),
        }
    }

    pub fn with_policy(mut self, policy: TagPolicy) -> Self {
        self.policy = policy;
        self
    }
}

type TagSlot = Arc<Mutex<TagState>>;

/// Owner of all tag state
pub struct TrackingEngine {
    registry: Arc<AnchorRegistry>,
    resolver: TagResolver,
    solver: CircleIntersection,
    max_history: usize,
    tags: RwLock<HashMap<String, TagSlot>>,
}

impl TrackingEngine {
    pub fn new(
        registry: Arc<AnchorRegistry>,
        options: TrackingOptions,
    ) -> Result<Self, ConfigError> {
        if options.max_history == 0 {
            return Err(ConfigError::invalid(
                "max_history",
                options.max_history,
                "history must hold at least one position",
            ));
        }
        let resolver = TagResolver::new(options.known_tags, options.policy)?;

        Ok(Self {
            registry,
            resolver,
            solver: options.solver,
            max_history: options.max_history,
            tags: RwLock::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &AnchorRegistry {
        &self.registry
    }

    pub fn known_tags(&self) -> &[String] {
        self.resolver.known()
    }

    pub fn policy(&self) -> TagPolicy {
        self.resolver.policy()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Fold one sample into its tag and try to compute a new position.
    ///
    /// Samples with a non-positive or non-finite distance, an unresolvable
    /// tag or an unknown anchor are rejected before any state is touched.
    pub fn ingest(&self, sample: &Sample) -> Result<IngestOutcome, TrackingError> {
        if !sample.distance_m.is_finite() || sample.distance_m <= 0.0 {
            debug!(
                anchor = %sample.anchor_id,
                distance_m = sample.distance_m,
                "dropping sample with invalid distance"
            );
            return Err(TrackingError::InvalidDistance {
                anchor_id: sample.anchor_id.clone(),
                distance_m: sample.distance_m,
            });
        }

        let tag_id = match self.resolver.resolve(sample.tag_id.as_deref()) {
            Ok(tag_id) => tag_id,
            Err(err) => {
                debug!(tag = ?sample.tag_id, "dropping sample for unresolved tag");
                return Err(err);
            }
        };

        if !self.registry.contains(&sample.anchor_id) {
            debug!(
                anchor = %sample.anchor_id,
                tag = tag_id,
                "dropping sample from unknown anchor"
            );
            return Err(TrackingError::UnknownAnchor {
                anchor_id: sample.anchor_id.clone(),
            });
        }

        let slot = self.slot(tag_id);
        let mut state = slot.lock();
        state.record(sample);
        let solve = self.try_trilateration(&mut state);

        Ok(IngestOutcome {
            tag_id: tag_id.to_string(),
            solve,
        })
    }

    /// Consistent copy of a configured tag's state
    pub fn snapshot(&self, tag_id: &str) -> Result<TagSnapshot, TrackingError> {
        if !self.resolver.is_known(tag_id) {
            return Err(TrackingError::TagNotFound {
                tag_id: tag_id.to_string(),
            });
        }

        let slot = self.tags.read().get(tag_id).cloned();
        Ok(match slot {
            Some(slot) => slot.lock().snapshot(),
            None => TagSnapshot::empty(tag_id),
        })
    }

    /// One snapshot per configured tag, in configuration order
    pub fn snapshot_all(&self) -> Vec<TagSnapshot> {
        let tags = self.tags.read();
        self.resolver
            .known()
            .iter()
            .map(|tag_id| match tags.get(tag_id) {
                Some(slot) => slot.lock().snapshot(),
                None => TagSnapshot::empty(tag_id),
            })
            .collect()
    }

    /// Forget everything recorded for a tag
    pub fn reset(&self, tag_id: &str) -> Result<(), TrackingError> {
        if !self.resolver.is_known(tag_id) {
            return Err(TrackingError::TagNotFound {
                tag_id: tag_id.to_string(),
            });
        }

        if let Some(slot) = self.tags.read().get(tag_id) {
            slot.lock().reset();
        }
        Ok(())
    }

    fn slot(&self, tag_id: &str) -> TagSlot {
        if let Some(slot) = self.tags.read().get(tag_id) {
            return Arc::clone(slot);
        }

        let mut tags = self.tags.write();
        let slot = tags.entry(tag_id.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(TagState::new(tag_id, self.max_history)))
        });
        Arc::clone(slot)
    }

    fn try_trilateration(&self, state: &mut TagState) -> SolveOutcome {
        let ranges = state.usable_ranges(&self.registry);
        if ranges.len() < MIN_ANCHORS_FOR_FIX {
            return SolveOutcome::Pending {
                reporting: ranges.len(),
            };
        }

        match self.solver.solve(&[ranges[0], ranges[1], ranges[2]]) {
            Ok(position) => {
                state.commit_fix(position);
                debug!(
                    tag = state.tag_id(),
                    x = position.x,
                    y = position.y,
                    "position updated"
                );
                SolveOutcome::Solved(position)
            }
            Err(DegenerateGeometry { determinant }) => {
                warn!(
                    tag = state.tag_id(),
                    determinant,
                    "anchor geometry degenerate, keeping previous position"
                );
                SolveOutcome::Degenerate { determinant }
            }
        }
    }
}
