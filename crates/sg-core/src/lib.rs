//! sg-core: stable foundation for stormgap.
//!
//! Contains:
//! - units (uom SI types + acre / square-foot / inch / acre-foot constructors)
//! - numeric (Real and the weight-sum tolerance)
//! - ids (compact IDs for segments and facilities)
//! - stats (descriptive statistics and reference distributions)
//!
//! Error enums live in the crates that raise them.

pub mod ids;
pub mod numeric;
pub mod stats;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use ids::*;
pub use numeric::*;
pub use stats::UndefinedReason;
pub use units::*;
