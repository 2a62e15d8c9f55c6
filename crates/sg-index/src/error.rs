//! Error types for index calculations.

use sg_core::{FacilityId, SegmentId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("vulnerability weights must sum to 1.0 (got {sum})")]
    WeightSum { sum: f64 },

    #[error("vulnerability weight '{name}' must be finite and non-negative (got {value})")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("segment {segment} area must be finite and positive (got {acres} acres)")]
    InvalidSegmentArea { segment: SegmentId, acres: f64 },

    #[error("facility {facility} has invalid footprint area {sqft} sq ft")]
    InvalidFacilityArea { facility: FacilityId, sqft: f64 },

    #[error("facility {facility} references unknown segment {segment}")]
    UnknownSegment {
        facility: FacilityId,
        segment: SegmentId,
    },

    #[error("input lengths differ: {what} ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("invalid parameter: {what}")]
    InvalidParameter { what: &'static str },

    #[error("segment collection is empty")]
    Empty,
}

pub type IndexResult<T> = Result<T, IndexError>;
