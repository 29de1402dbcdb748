//! Positioning algorithms

pub mod trilateration;

pub use trilateration::{trilaterate, CircleIntersection, DegenerateGeometry};
