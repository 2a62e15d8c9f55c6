//! Neighbor graph validation logic.

use sg_core::SegmentId;

use crate::error::{GraphError, GraphResult};
use crate::graph::NeighborEdge;

/// Validate compact rows: offsets consistent, every row non-empty,
/// references in range, no self loops or duplicates, weights positive.
pub(crate) fn validate_graph(
    n: usize,
    offsets: &[usize],
    edges: &[NeighborEdge],
) -> GraphResult<()> {
    if offsets.len() != n + 1 || offsets.first() != Some(&0) || offsets.last() != Some(&edges.len())
    {
        return Err(GraphError::InconsistentAdjacency);
    }
    if offsets.windows(2).any(|w| w[0] > w[1]) {
        return Err(GraphError::InconsistentAdjacency);
    }

    for i in 0..n {
        let segment = SegmentId::from_index(i as u32);
        let row = &edges[offsets[i]..offsets[i + 1]];

        // A segment without neighbors makes local statistics undefined
        if row.is_empty() {
            return Err(GraphError::IsolatedSegment { segment });
        }

        let mut prev: Option<u32> = None;
        for edge in row {
            let j = edge.neighbor.index();
            if j as usize >= n {
                return Err(GraphError::InvalidNeighborRef {
                    segment,
                    neighbor: j,
                });
            }
            if j as usize == i {
                return Err(GraphError::SelfLoop { segment });
            }
            if prev == Some(j) {
                return Err(GraphError::DuplicateNeighbor {
                    segment,
                    neighbor: edge.neighbor,
                });
            }
            if !(edge.weight.is_finite() && edge.weight > 0.0) {
                return Err(GraphError::InvalidWeight {
                    segment,
                    weight: edge.weight,
                });
            }
            prev = Some(j);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;

    fn edge(to: u32, weight: f64) -> NeighborEdge {
        NeighborEdge {
            neighbor: SegmentId::from_index(to),
            kind: EdgeKind::Contiguity,
            weight,
        }
    }

    #[test]
    fn valid_pair() {
        let edges = vec![edge(1, 1.0), edge(0, 1.0)];
        assert!(validate_graph(2, &[0, 1, 2], &edges).is_ok());
    }

    #[test]
    fn empty_row_is_rejected() {
        let edges = vec![edge(1, 1.0)];
        assert!(matches!(
            validate_graph(2, &[0, 1, 1], &edges),
            Err(GraphError::IsolatedSegment { .. })
        ));
    }

    #[test]
    fn self_loop_and_bad_ref_rejected() {
        assert!(matches!(
            validate_graph(1, &[0, 1], &[edge(0, 1.0)]),
            Err(GraphError::SelfLoop { .. })
        ));
        assert!(matches!(
            validate_graph(2, &[0, 1, 2], &[edge(7, 1.0), edge(0, 1.0)]),
            Err(GraphError::InvalidNeighborRef { .. })
        ));
    }

    #[test]
    fn bad_weight_and_offsets_rejected() {
        assert!(matches!(
            validate_graph(2, &[0, 1, 2], &[edge(1, 0.0), edge(0, 1.0)]),
            Err(GraphError::InvalidWeight { .. })
        ));
        assert_eq!(
            validate_graph(2, &[0, 2], &[edge(1, 1.0), edge(0, 1.0)]),
            Err(GraphError::InconsistentAdjacency)
        );
    }
}
