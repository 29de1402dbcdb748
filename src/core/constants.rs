//! System parameters of the reference deployment

/// Number of positions kept per tag unless configured otherwise
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Interval between automatic poll requests (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Determinant magnitude below which three anchors are treated as collinear
pub const DEGENERACY_EPSILON: f64 = 1e-9;

/// Anchor reports arrive in centimeters
pub const CENTIMETERS_PER_METER: f64 = 100.0;

/// Minimum number of anchors for a 2D fix
pub const MIN_ANCHORS_FOR_FIX: usize = 3;

pub const DEFAULT_DISTANCE_TOPIC: &str = "uwb/trilateration/distance";
pub const DEFAULT_POLL_REQUEST_TOPIC: &str = "uwb/trilateration/poll_request";
