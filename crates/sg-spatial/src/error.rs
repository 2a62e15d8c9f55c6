//! Error types for spatial statistics.

use sg_core::SegmentId;
use sg_graph::GraphError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    #[error("attribute has {values} values but the graph has {segments} segments")]
    LengthMismatch { values: usize, segments: usize },

    #[error("attribute value for segment {segment} is not finite")]
    NonFiniteValue { segment: SegmentId },

    #[error("invalid parameter: {what}")]
    InvalidParameter { what: &'static str },

    #[error("neighbor graph: {0}")]
    Graph(#[from] GraphError),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
