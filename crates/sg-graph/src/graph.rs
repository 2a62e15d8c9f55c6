//! Core neighbor graph data structure.

use sg_core::SegmentId;

use crate::geometry::Coord;

/// How an edge entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Shared boundary vertex (queen) or edge (rook).
    Contiguity,
    /// Centroid distance within the configured band.
    DistanceBand,
    /// k-nearest-neighbor fallback for a segment that had no other neighbor.
    Knn,
}

/// Directed edge `segment -> neighbor` with its raw (untransformed) weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborEdge {
    pub neighbor: SegmentId,
    pub kind: EdgeKind,
    pub weight: f64,
}

/// The neighbor graph: a validated, immutable adjacency over all segments.
///
/// Stored as compact rows: segment i's edges are in
/// `edges[offsets[i]..offsets[i + 1]]`, sorted by neighbor index.
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    pub(crate) offsets: Vec<usize>,
    pub(crate) edges: Vec<NeighborEdge>,
    pub(crate) centroids: Vec<Coord>,
}

impl NeighborGraph {
    /// Number of segments.
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// All segment IDs in collection order.
    pub fn segment_ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        (0..self.len() as u32).map(SegmentId::from_index)
    }

    /// Edges leaving a segment (empty slice for an out-of-range ID).
    pub fn neighbors(&self, id: SegmentId) -> &[NeighborEdge] {
        let idx = id.pos();
        if idx >= self.len() {
            return &[];
        }
        &self.edges[self.offsets[idx]..self.offsets[idx + 1]]
    }

    pub fn degree(&self, id: SegmentId) -> usize {
        self.neighbors(id).len()
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn centroid(&self, id: SegmentId) -> Option<Coord> {
        self.centroids.get(id.pos()).copied()
    }

    pub fn centroids(&self) -> &[Coord] {
        &self.centroids
    }

    /// Whether the segment's row came from the k-nearest fallback.
    pub fn used_fallback(&self, id: SegmentId) -> bool {
        self.neighbors(id).iter().any(|e| e.kind == EdgeKind::Knn)
    }

    /// Segments whose neighbors came from the k-nearest fallback.
    pub fn fallback_segments(&self) -> Vec<SegmentId> {
        self.segment_ids()
            .filter(|&id| self.used_fallback(id))
            .collect()
    }

    pub fn fallback_count(&self) -> usize {
        self.segment_ids().filter(|&id| self.used_fallback(id)).count()
    }

    /// Raw weight of `from -> to`, if the edge exists.
    pub fn weight(&self, from: SegmentId, to: SegmentId) -> Option<f64> {
        let row = self.neighbors(from);
        row.binary_search_by_key(&to.index(), |e| e.neighbor.index())
            .ok()
            .map(|pos| row[pos].weight)
    }

    pub fn is_symmetric(&self) -> bool {
        self.segment_ids().all(|from| {
            self.neighbors(from)
                .iter()
                .all(|e| self.weight(e.neighbor, from).is_some())
        })
    }
}
