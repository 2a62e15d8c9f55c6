//! Incremental neighbor graph builder.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sg_core::SegmentId;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::geometry::{distance, Coord, Polygon};
use crate::graph::{EdgeKind, NeighborEdge, NeighborGraph};
use crate::validate;

/// Default number of nearest neighbors assigned to an island.
pub const DEFAULT_KNN_FALLBACK: usize = 5;

/// Default vertex snapping tolerance, in coordinate units.
pub const DEFAULT_SNAP_TOLERANCE: f64 = 1e-6;

/// Which shared boundary counts as contiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContiguityRule {
    /// Any shared boundary vertex.
    #[default]
    Queen,
    /// A shared boundary edge (two consecutive shared vertices).
    Rook,
}

/// Primary neighbor definition; islands always fall back to k-nearest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeighborPolicy {
    Contiguity(ContiguityRule),
    /// Centroids within `threshold`. With `inverse_distance_power = Some(a)`
    /// the raw weight is `1 / d^a`, otherwise 1.
    DistanceBand {
        threshold: f64,
        inverse_distance_power: Option<f64>,
    },
}

impl Default for NeighborPolicy {
    fn default() -> Self {
        NeighborPolicy::Contiguity(ContiguityRule::Queen)
    }
}

/// Builder for constructing a neighbor graph from segment polygons.
///
/// Add segments in collection order, then call `build()` to derive edges,
/// resolve islands and freeze the result into an immutable `NeighborGraph`.
#[derive(Debug)]
pub struct NeighborGraphBuilder {
    policy: NeighborPolicy,
    knn_fallback: usize,
    snap_tolerance: f64,
    polygons: Vec<Polygon>,
}

impl NeighborGraphBuilder {
    pub fn new(policy: NeighborPolicy) -> Self {
        Self {
            policy,
            knn_fallback: DEFAULT_KNN_FALLBACK,
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            polygons: Vec::new(),
        }
    }

    /// Number of nearest neighbors given to a segment without other neighbors.
    pub fn with_knn_fallback(mut self, k: usize) -> Self {
        self.knn_fallback = k;
        self
    }

    /// Distance under which two boundary vertices are considered the same.
    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_tolerance = tolerance;
        self
    }

    /// Add a segment and return its ID.
    pub fn add_segment(&mut self, polygon: Polygon) -> SegmentId {
        let id = SegmentId::from_index(self.polygons.len() as u32);
        self.polygons.push(polygon);
        id
    }

    /// Derive edges, apply the island fallback and validate.
    pub fn build(self) -> GraphResult<NeighborGraph> {
        if self.polygons.is_empty() {
            return Err(GraphError::EmptyCollection);
        }
        if self.knn_fallback == 0 {
            return Err(GraphError::InvalidParameter {
                what: "knn fallback must be at least 1",
            });
        }
        if !(self.snap_tolerance.is_finite() && self.snap_tolerance > 0.0) {
            return Err(GraphError::InvalidParameter {
                what: "snap tolerance must be positive",
            });
        }

        let centroids: Vec<Coord> = self.polygons.iter().map(Polygon::centroid).collect();

        let mut rows: Vec<Vec<NeighborEdge>> = match self.policy {
            NeighborPolicy::Contiguity(rule) => {
                contiguity_rows(&self.polygons, rule, self.snap_tolerance)
            }
            NeighborPolicy::DistanceBand {
                threshold,
                inverse_distance_power,
            } => {
                if !(threshold.is_finite() && threshold > 0.0) {
                    return Err(GraphError::InvalidParameter {
                        what: "distance band threshold must be positive",
                    });
                }
                if inverse_distance_power.is_some_and(|a| !(a.is_finite() && a > 0.0)) {
                    return Err(GraphError::InvalidParameter {
                        what: "inverse distance power must be positive",
                    });
                }
                distance_band_rows(
                    &centroids,
                    threshold,
                    inverse_distance_power,
                    self.snap_tolerance,
                )
            }
        };

        let weight_fn = |d: f64| match self.policy {
            NeighborPolicy::DistanceBand {
                inverse_distance_power: Some(a),
                ..
            } => d.max(self.snap_tolerance).powf(-a),
            _ => 1.0,
        };

        let islands: Vec<usize> = (0..rows.len()).filter(|&i| rows[i].is_empty()).collect();
        for &i in &islands {
            rows[i] = knn_row(&centroids, i, self.knn_fallback, &weight_fn);
            debug!(
                segment = i,
                neighbors = rows[i].len(),
                "island resolved by k-nearest fallback"
            );
        }

        let (offsets, edges) = Self::flatten(rows);
        validate::validate_graph(centroids.len(), &offsets, &edges)?;

        Ok(NeighborGraph {
            offsets,
            edges,
            centroids,
        })
    }

    /// Build compact rows: offsets plus a flat edge list.
    fn flatten(rows: Vec<Vec<NeighborEdge>>) -> (Vec<usize>, Vec<NeighborEdge>) {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut edges = Vec::new();
        offsets.push(0);
        for mut row in rows {
            // Sort each row for determinism and binary-search lookups
            row.sort_by_key(|e| e.neighbor.index());
            edges.extend(row);
            offsets.push(edges.len());
        }
        (offsets, edges)
    }
}

type Cell = (i64, i64);

fn cell_of(p: Coord, tol: f64) -> Cell {
    ((p[0] / tol).floor() as i64, (p[1] / tol).floor() as i64)
}

/// Vertex position inside a polygon: (ring, vertex).
type VertexRef = (usize, usize);

/// Coinciding vertices of a pair, as positions on the first and second polygon.
type SharedVertices = (BTreeSet<VertexRef>, BTreeSet<VertexRef>);

fn contiguity_rows(polygons: &[Polygon], rule: ContiguityRule, tol: f64) -> Vec<Vec<NeighborEdge>> {
    // Spatial hash of every boundary vertex
    let mut grid: HashMap<Cell, Vec<(usize, VertexRef, Coord)>> = HashMap::new();
    for (seg, poly) in polygons.iter().enumerate() {
        for (ring_idx, ring) in poly.rings().enumerate() {
            for (v_idx, &v) in ring.iter().enumerate() {
                grid.entry(cell_of(v, tol))
                    .or_default()
                    .push((seg, (ring_idx, v_idx), v));
            }
        }
    }

    // For each unordered pair (s < t): the coinciding vertices, on both rings
    let mut shared: BTreeMap<(usize, usize), SharedVertices> = BTreeMap::new();
    for (s, poly) in polygons.iter().enumerate() {
        for (ring_idx, ring) in poly.rings().enumerate() {
            for (v_idx, &v) in ring.iter().enumerate() {
                let (cx, cy) = cell_of(v, tol);
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        let Some(bucket) = grid.get(&(cx + dx, cy + dy)) else {
                            continue;
                        };
                        for &(t, t_ref, w) in bucket {
                            if t > s && distance(v, w) <= tol {
                                let pair = shared.entry((s, t)).or_default();
                                pair.0.insert((ring_idx, v_idx));
                                pair.1.insert(t_ref);
                            }
                        }
                    }
                }
            }
        }
    }

    let mut rows: Vec<Vec<NeighborEdge>> = vec![Vec::new(); polygons.len()];
    for ((s, t), (on_s, on_t)) in shared {
        // a split edge is only consecutive on the unsplit ring
        let adjacent = match rule {
            ContiguityRule::Queen => true,
            ContiguityRule::Rook => {
                has_shared_edge(&polygons[s], &on_s) || has_shared_edge(&polygons[t], &on_t)
            }
        };
        if adjacent {
            rows[s].push(contiguity_edge(t));
            rows[t].push(contiguity_edge(s));
        }
    }
    rows
}

fn contiguity_edge(target: usize) -> NeighborEdge {
    NeighborEdge {
        neighbor: SegmentId::from_index(target as u32),
        kind: EdgeKind::Contiguity,
        weight: 1.0,
    }
}

/// Two shared vertices that are consecutive on the same ring form a shared edge.
fn has_shared_edge(poly: &Polygon, verts: &BTreeSet<VertexRef>) -> bool {
    let ring_lens: Vec<usize> = poly.rings().map(<[Coord]>::len).collect();
    verts.iter().any(|&(ring, v)| {
        let next = (v + 1) % ring_lens[ring];
        verts.contains(&(ring, next))
    })
}

fn distance_band_rows(
    centroids: &[Coord],
    threshold: f64,
    power: Option<f64>,
    tol: f64,
) -> Vec<Vec<NeighborEdge>> {
    let n = centroids.len();
    let mut rows: Vec<Vec<NeighborEdge>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = distance(centroids[i], centroids[j]);
            if d <= threshold {
                let weight = power.map_or(1.0, |a| d.max(tol).powf(-a));
                for (from, to) in [(i, j), (j, i)] {
                    rows[from].push(NeighborEdge {
                        neighbor: SegmentId::from_index(to as u32),
                        kind: EdgeKind::DistanceBand,
                        weight,
                    });
                }
            }
        }
    }
    rows
}

/// The k nearest other segments by centroid distance, ties by collection order.
fn knn_row(
    centroids: &[Coord],
    i: usize,
    k: usize,
    weight_fn: impl Fn(f64) -> f64,
) -> Vec<NeighborEdge> {
    let mut candidates: Vec<(f64, usize)> = centroids
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(j, &c)| (distance(centroids[i], c), j))
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    candidates
        .into_iter()
        .take(k)
        .map(|(d, j)| NeighborEdge {
            neighbor: SegmentId::from_index(j as u32),
            kind: EdgeKind::Knn,
            weight: weight_fn(d),
        })
        .collect()
}
