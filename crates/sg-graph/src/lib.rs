//! sg-graph: segment geometry and neighbor graphs for stormgap.
//!
//! Provides:
//! - Polygon geometry helpers (area, centroid, containment)
//! - `NeighborGraph`: immutable, validated adjacency over the segment collection
//! - Contiguity (queen / rook) and distance-band builders with a k-nearest
//!   fallback for islands, every edge tagged with how it was derived
//! - `SpatialWeights`: row-standardized or binary weights, optionally self-inclusive
//!
//! # Example
//!
//! ```
//! use sg_graph::{NeighborGraphBuilder, NeighborPolicy, Polygon};
//!
//! let square = |x: f64| Polygon::new(vec![[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0]]).unwrap();
//! let mut builder = NeighborGraphBuilder::new(NeighborPolicy::default());
//! let a = builder.add_segment(square(0.0));
//! let b = builder.add_segment(square(1.0));
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.neighbors(a)[0].neighbor, b);
//! assert_eq!(graph.fallback_count(), 0);
//! ```

pub mod builder;
pub mod error;
pub mod geometry;
pub mod graph;
pub(crate) mod validate;
pub mod weights;

// Re-exports for ergonomics
pub use builder::{ContiguityRule, NeighborGraphBuilder, NeighborPolicy};
pub use error::{GraphError, GraphResult};
pub use geometry::{Coord, Geometry, Polygon};
pub use graph::{EdgeKind, NeighborEdge, NeighborGraph};
pub use weights::{SpatialWeights, WeightTransform};
