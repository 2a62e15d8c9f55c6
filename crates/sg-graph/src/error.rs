//! Graph-specific error types.

use sg_core::SegmentId;

pub type GraphResult<T> = Result<T, GraphError>;

/// Geometry, graph construction and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// No segments were added before `build()`.
    EmptyCollection,

    /// A polygon ring has fewer than three distinct vertices or zero area.
    DegeneratePolygon { reason: &'static str },

    /// A coordinate is NaN or infinite.
    NonFiniteCoordinate,

    /// A builder parameter is out of range.
    InvalidParameter { what: &'static str },

    /// A segment ended up without neighbors after the fallback pass.
    IsolatedSegment { segment: SegmentId },

    /// An edge points outside the segment collection.
    InvalidNeighborRef { segment: SegmentId, neighbor: u32 },

    /// A segment lists itself as neighbor.
    SelfLoop { segment: SegmentId },

    /// A row lists the same neighbor twice.
    DuplicateNeighbor { segment: SegmentId, neighbor: SegmentId },

    /// An edge weight is non-finite or not positive.
    InvalidWeight { segment: SegmentId, weight: f64 },

    /// Offsets array does not describe the edge list.
    InconsistentAdjacency,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::EmptyCollection => write!(f, "Segment collection is empty"),
            GraphError::DegeneratePolygon { reason } => {
                write!(f, "Degenerate polygon: {}", reason)
            }
            GraphError::NonFiniteCoordinate => write!(f, "Geometry has a non-finite coordinate"),
            GraphError::InvalidParameter { what } => {
                write!(f, "Invalid neighbor graph parameter: {}", what)
            }
            GraphError::IsolatedSegment { segment } => {
                write!(f, "Segment {} has no neighbors after fallback", segment)
            }
            GraphError::InvalidNeighborRef { segment, neighbor } => {
                write!(
                    f,
                    "Segment {} refers to non-existent neighbor {}",
                    segment, neighbor
                )
            }
            GraphError::SelfLoop { segment } => {
                write!(f, "Segment {} lists itself as a neighbor", segment)
            }
            GraphError::DuplicateNeighbor { segment, neighbor } => {
                write!(f, "Segment {} lists neighbor {} twice", segment, neighbor)
            }
            GraphError::InvalidWeight { segment, weight } => {
                write!(f, "Segment {} has invalid edge weight {}", segment, weight)
            }
            GraphError::InconsistentAdjacency => {
                write!(f, "Adjacency offsets do not match the edge list")
            }
        }
    }
}

impl std::error::Error for GraphError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_segment_message() {
        let err = GraphError::IsolatedSegment {
            segment: SegmentId::from_index(4),
        };
        assert!(err.to_string().contains("Segment 4"));
    }
}
