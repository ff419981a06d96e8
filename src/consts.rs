pub use std::f64::consts::PI;

pub const TWOPI: f64 = 2. * PI;

/// Tolerance used when matching kernel parameters against the table.
pub const KERNEL_MATCH_TOLERANCE: f64 = 1e-10;
