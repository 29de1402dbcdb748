//! Anchor registry
//!
//! The set of anchors is fixed at startup. Iteration order is the order in
//! which anchors were registered and is what the tracking engine uses to pick
//! the three anchors of a fix, so it must never change at runtime.

use crate::core::{Anchor, Position2D};
use crate::error::ConfigError;
use std::collections::HashMap;

/// Immutable, ordered table of anchors
#[derive(Debug, Clone)]
pub struct AnchorRegistry {
    anchors: Vec<Anchor>,
    index: HashMap<String, usize>,
}

/// Collects anchors before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    anchors: Vec<Anchor>,
    index: HashMap<String, usize>,
}

/// Axis-aligned bounding box of the anchor layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Position2D,
    pub max: Position2D,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, position: &Position2D) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.y >= self.min.y
            && position.y <= self.max.y
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anchor. Ids must be unique.
    pub fn register(&mut self, id: &str, x: f64, y: f64) -> Result<&mut Self, ConfigError> {
        if self.index.contains_key(id) {
            return Err(ConfigError::DuplicateAnchor { anchor_id: id.to_string() });
        }
        if !x.is_finite() || !y.is_finite() {
            return Err(ConfigError::invalid(
                "anchor position",
                format!("{} ({}, {})", id, x, y),
                "coordinates must be finite",
            ));
        }

        self.index.insert(id.to_string(), self.anchors.len());
        self.anchors.push(Anchor::new(id, x, y));
        Ok(self)
    }

    pub fn build(self) -> Result<AnchorRegistry, ConfigError> {
        if self.anchors.is_empty() {
            return Err(ConfigError::EmptyAnchorTable);
        }

        Ok(AnchorRegistry {
            anchors: self.anchors,
            index: self.index,
        })
    }
}

impl AnchorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from anchors in their final order
    pub fn from_anchors<I>(anchors: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Anchor>,
    {
        let mut builder = RegistryBuilder::new();
        for anchor in anchors {
            builder.register(&anchor.id, anchor.position.x, anchor.position.y)?;
        }
        builder.build()
    }

    pub fn lookup(&self, id: &str) -> Option<&Anchor> {
        self.index.get(id).map(|&i| &self.anchors[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All anchors in registration order
    pub fn all(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.anchors.iter().map(|a| a.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Bounding box of all anchors grown by `padding` meters on every side
    pub fn bounds(&self, padding: f64) -> Bounds {
        let mut min = self.anchors[0].position;
        let mut max = min;
        for anchor in &self.anchors[1..] {
            min.x = min.x.min(anchor.position.x);
            min.y = min.y.min(anchor.position.y);
            max.x = max.x.max(anchor.position.x);
            max.y = max.y.max(anchor.position.y);
        }

        Bounds {
            min: Position2D::new(min.x - padding, min.y - padding),
            max: Position2D::new(max.x + padding, max.y + padding),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn reference_registry() -> AnchorRegistry {
        let mut builder = AnchorRegistry::builder();
        builder
            .register("MA", 0.0, 0.0)
            .and_then(|b| b.register("SA1", 5.3, 0.0))
            .and_then(|b| b.register("SA2", 5.3, 3.65))
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_lookup_and_order() {
        let registry = reference_registry();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["MA", "SA1", "SA2"]);
        assert_eq!(registry.lookup("SA2").unwrap().position, Position2D::new(5.3, 3.65));
        assert!(registry.lookup("SA3").is_none());
        assert!(!registry.contains("ma"));
    }

    #[test]
    fn test_duplicate_anchor_rejected() {
        let mut builder = AnchorRegistry::builder();
        builder.register("MA", 0.0, 0.0).unwrap();
        let err = builder.register("MA", 1.0, 1.0).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateAnchor { anchor_id: "MA".to_string() });
    }

    #[test]
    fn test_empty_registry_rejected() {
        let err = AnchorRegistry::builder().build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyAnchorTable);
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let mut builder = AnchorRegistry::builder();
        assert!(matches!(
            builder.register("MA", f64::NAN, 0.0),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_bounds_with_padding() {
        let bounds = reference_registry().bounds(1.0);

        assert_abs_diff_eq!(bounds.min.x, -1.0);
        assert_abs_diff_eq!(bounds.min.y, -1.0);
        assert_abs_diff_eq!(bounds.max.x, 6.3, epsilon = 1e-12);
        assert_abs_diff_eq!(bounds.max.y, 4.65, epsilon = 1e-12);
        assert!(bounds.contains(&Position2D::new(2.65, -0.37)));
        assert!(!bounds.contains(&Position2D::new(7.0, 0.0)));
    }
}
