/// Floating point type used throughout system
pub type Real = f64;

/// Tolerance used when checking that configured weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: Real = 1e-6;
