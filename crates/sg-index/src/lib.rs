//! sg-index: per-segment indices for stormgap.
//!
//! Provides:
//! - Composite vulnerability score (0-10) from physical attributes
//! - Facility-to-segment assignment and infrastructure density
//! - Alignment quadrants, gap index and vulnerability/density correlation
//!
//! Every function is a pure pass over the segment collection; results come
//! back in segment order.

pub mod alignment;
pub mod assignment;
pub mod correlation;
pub mod density;
pub mod error;
pub mod vulnerability;

pub use alignment::{
    AlignmentConfig, AlignmentReport, GapSummary, Quadrant, QuadrantSummary, analyze_alignment,
    classify_quadrants, gap_indices,
};
pub use assignment::{Facility, FacilityAssignment, assign_facilities};
pub use correlation::{
    Correlation, CorrelationPair, CorrelationStats, Direction, Strength, correlate,
};
pub use density::{SegmentDensity, compute_density};
pub use error::{IndexError, IndexResult};
pub use vulnerability::{
    DefaultedInput, NormalizedFactors, RawAttributes, SoilGroup, VulnerabilityClass,
    VulnerabilityConfig, VulnerabilityScore, VulnerabilityWeights, score_segment, score_segments,
};
