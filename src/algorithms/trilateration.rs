//! Closed-form 2D trilateration from three ranges
//!
//! Subtracting the circle equation of anchor 2 from anchor 1, and of anchor 3
//! from anchor 2, leaves a 2x2 linear system:
//!
//! ```text
//! A·x + B·y = C    A = 2(x2−x1), B = 2(y2−y1), C = r1²−r2²−x1²+x2²−y1²+y2²
//! D·x + E·y = F    D = 2(x3−x2), E = 2(y3−y2), F = r2²−r3²−x2²+x3²−y2²+y3²
//! ```
//!
//! which is solved with Cramer's rule. The result is not checked against the
//! ranges or any plausible region; inconsistent ranges still produce the
//! point that satisfies both difference equations.

use crate::core::{Position2D, RangeMeasurement, DEGENERACY_EPSILON};
use crate::error::TrackingError;
use nalgebra::{Matrix2, Vector2};
use thiserror::Error;

/// The three anchors do not span the plane
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Degenerate anchor geometry: determinant {determinant:e}")]
pub struct DegenerateGeometry {
    pub determinant: f64,
}

impl From<DegenerateGeometry> for TrackingError {
    fn from(err: DegenerateGeometry) -> Self {
        TrackingError::DegenerateGeometry {
            determinant: err.determinant,
        }
    }
}

/// Linearized circle-intersection solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleIntersection {
    /// Smallest determinant magnitude accepted as non-degenerate
    pub degeneracy_epsilon: f64,
}

impl Default for CircleIntersection {
    fn default() -> Self {
        Self {
            degeneracy_epsilon: DEGENERACY_EPSILON,
        }
    }
}

impl CircleIntersection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(degeneracy_epsilon: f64) -> Self {
        Self { degeneracy_epsilon }
    }

    /// Solve for the point consistent with three anchor ranges.
    pub fn solve(&self, ranges: &[RangeMeasurement; 3]) -> Result<Position2D, DegenerateGeometry> {
        let (system, rhs) = Self::linear_system(ranges);

        let denom = system.determinant();
        if denom.is_nan() || denom.abs() < self.degeneracy_epsilon {
            return Err(DegenerateGeometry { determinant: denom });
        }

        let (a, b, d, e) = (system[(0, 0)], system[(0, 1)], system[(1, 0)], system[(1, 1)]);
        let (c, f) = (rhs[0], rhs[1]);

        Ok(Position2D::new(
            (c * e - b * f) / denom,
            (a * f - c * d) / denom,
        ))
    }

    fn linear_system(ranges: &[RangeMeasurement; 3]) -> (Matrix2<f64>, Vector2<f64>) {
        let [p1, p2, p3] = ranges;
        let (x1, y1, r1) = (p1.anchor.x, p1.anchor.y, p1.distance);
        let (x2, y2, r2) = (p2.anchor.x, p2.anchor.y, p2.distance);
        let (x3, y3, r3) = (p3.anchor.x, p3.anchor.y, p3.distance);

        #[rustfmt::skip]
        let system = Matrix2::new(
            2.0 * (x2 - x1), 2.0 * (y2 - y1),
            2.0 * (x3 - x2), 2.0 * (y3 - y2),
        );
        let rhs = Vector2::new(
            r1 * r1 - r2 * r2 - x1 * x1 + x2 * x2 - y1 * y1 + y2 * y2,
            r2 * r2 - r3 * r3 - x2 * x2 + x3 * x3 - y2 * y2 + y3 * y3,
        );

        (system, rhs)
    }
}

/// Solve with the default degeneracy threshold
pub fn trilaterate(ranges: &[RangeMeasurement; 3]) -> Result<Position2D, DegenerateGeometry> {
    CircleIntersection::default().solve(ranges)
}
