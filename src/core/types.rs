//! Core data types for the tracking engine

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Planar position in meters. The origin is the top-left corner of the
/// site and y grows downwards, matching the anchor survey.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_point(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Euclidean distance in meters
    pub fn distance_to(&self, other: &Position2D) -> f64 {
        nalgebra::distance(&self.to_point(), &other.to_point())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Point2<f64>> for Position2D {
    fn from(point: Point2<f64>) -> Self {
        Self::new(point.x, point.y)
    }
}

/// Fixed ranging anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: String,
    pub position: Position2D,
}

impl Anchor {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Position2D::new(x, y),
        }
    }
}

/// One distance report from an anchor, already converted to meters.
///
/// `tag_id` is `None` when the payload named no tag; the engine then applies
/// the default tag of the deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub tag_id: Option<String>,
    pub anchor_id: String,
    pub distance_m: f64,
    pub signal_strength: Option<i32>,
    /// Monotonic receive time (milliseconds)
    pub received_at_ms: u64,
}

impl Sample {
    pub fn new(tag_id: Option<&str>, anchor_id: &str, distance_m: f64) -> Self {
        Self {
            tag_id: tag_id.map(str::to_string),
            anchor_id: anchor_id.to_string(),
            distance_m,
            signal_strength: None,
            received_at_ms: 0,
        }
    }

    pub fn with_signal_strength(mut self, rssi: i32) -> Self {
        self.signal_strength = Some(rssi);
        self
    }

    pub fn with_timestamp(mut self, received_at_ms: u64) -> Self {
        self.received_at_ms = received_at_ms;
        self
    }
}

/// Solver input: a known anchor position and the range measured to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeMeasurement {
    pub anchor: Position2D,
    pub distance: f64,
}

impl RangeMeasurement {
    pub fn new(anchor: Position2D, distance: f64) -> Self {
        Self { anchor, distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_distance_between_positions() {
        let a = Position2D::new(0.0, 0.0);
        let b = Position2D::new(3.0, 4.0);
        assert_abs_diff_eq!(a.distance_to(&b), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.distance_to(&a), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_builder() {
        let sample = Sample::new(Some("T1"), "MA", 2.5)
            .with_signal_strength(-72)
            .with_timestamp(1200);

        assert_eq!(sample.tag_id.as_deref(), Some("T1"));
        assert_eq!(sample.signal_strength, Some(-72));
        assert_eq!(sample.received_at_ms, 1200);
    }
}
