//! Error types for runoff modeling.

use sg_core::SegmentId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunoffError {
    #[error("curve number must be in (0, 100] (got {cn})")]
    InvalidCurveNumber { cn: f64 },

    #[error("design storm '{label}' has invalid depth {depth_in} in")]
    InvalidStorm { label: String, depth_in: f64 },

    #[error("segment {segment} area must be finite and positive (got {acres} acres)")]
    InvalidArea { segment: SegmentId, acres: f64 },

    #[error("segment {segment} has invalid {what}: {value}")]
    InvalidSegmentValue {
        segment: SegmentId,
        what: &'static str,
        value: f64,
    },

    #[error("invalid parameter: {what}")]
    InvalidParameter { what: &'static str },

    #[error("no design storms configured")]
    NoStorms,
}

pub type RunoffResult<T> = Result<T, RunoffError>;
