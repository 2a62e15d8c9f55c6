//! Integration tests for sg-graph.

use proptest::prelude::*;
use sg_graph::{
    ContiguityRule, EdgeKind, NeighborGraphBuilder, NeighborPolicy, Polygon, SpatialWeights,
    WeightTransform,
};

fn cell(x: f64, y: f64, size: f64) -> Polygon {
    Polygon::new(vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size]]).unwrap()
}

/// 3x3 block of unit cells, row-major from the lower left.
fn grid_3x3(rule: ContiguityRule) -> sg_graph::NeighborGraph {
    let mut builder = NeighborGraphBuilder::new(NeighborPolicy::Contiguity(rule));
    for row in 0..3 {
        for col in 0..3 {
            builder.add_segment(cell(col as f64, row as f64, 1.0));
        }
    }
    builder.build().unwrap()
}

#[test]
fn queen_grid_degrees() {
    let graph = grid_3x3(ContiguityRule::Queen);
    let degrees: Vec<usize> = graph.segment_ids().map(|id| graph.degree(id)).collect();
    assert_eq!(degrees, vec![3, 5, 3, 5, 8, 5, 3, 5, 3]);
    assert!(graph.is_symmetric());
    assert_eq!(graph.fallback_count(), 0);
}

#[test]
fn rook_grid_degrees() {
    let graph = grid_3x3(ContiguityRule::Rook);
    let degrees: Vec<usize> = graph.segment_ids().map(|id| graph.degree(id)).collect();
    assert_eq!(degrees, vec![2, 3, 2, 3, 4, 3, 2, 3, 2]);
    assert_eq!(graph.edge_count(), 24);
}

#[test]
fn detached_segment_gets_knn_edges() {
    let mut builder = NeighborGraphBuilder::new(NeighborPolicy::default()).with_knn_fallback(2);
    let a = builder.add_segment(cell(0.0, 0.0, 1.0));
    let b = builder.add_segment(cell(1.0, 0.0, 1.0));
    let c = builder.add_segment(cell(2.0, 0.0, 1.0));
    let far = builder.add_segment(cell(50.0, 0.0, 1.0));
    let graph = builder.build().unwrap();

    let row = graph.neighbors(far);
    assert_eq!(row.len(), 2);
    assert!(row.iter().all(|e| e.kind == EdgeKind::Knn));
    let targets: Vec<_> = row.iter().map(|e| e.neighbor).collect();
    assert_eq!(targets, vec![b, c]);
    // fallback edges are directed only
    assert!(graph.weight(c, far).is_none());
    assert!(!graph.is_symmetric());
    assert!(!graph.used_fallback(a));
    assert_eq!(graph.fallback_segments(), vec![far]);
}

#[test]
fn distance_band_links_centroids() {
    let mut builder = NeighborGraphBuilder::new(NeighborPolicy::DistanceBand {
        threshold: 1.5,
        inverse_distance_power: None,
    });
    let ids: Vec<_> = (0..4)
        .map(|k| builder.add_segment(cell(k as f64 * 1.2, 0.0, 1.0)))
        .collect();
    let graph = builder.build().unwrap();
    assert_eq!(graph.degree(ids[0]), 1);
    assert_eq!(graph.degree(ids[1]), 2);
    assert!(
        graph
            .neighbors(ids[1])
            .iter()
            .all(|e| e.kind == EdgeKind::DistanceBand)
    );
}

#[test]
fn weights_from_grid() {
    let graph = grid_3x3(ContiguityRule::Rook);
    let w = SpatialWeights::from_graph(&graph, WeightTransform::RowStandardized);
    assert_eq!(w.n(), 9);
    assert!((w.s0() - 9.0).abs() < 1e-12);
    assert!((w.get(4, 1) - 0.25).abs() < 1e-12);

    let star = SpatialWeights::star(&graph, WeightTransform::Binary);
    assert_eq!(star.row_sum(4), 5.0);
    assert_eq!(star.row_sum_sq(0), 3.0);
}

proptest! {
    #[test]
    fn every_row_non_empty_after_fallback(
        origins in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 2..25),
        k in 1usize..6,
    ) {
        let mut builder = NeighborGraphBuilder::new(NeighborPolicy::default()).with_knn_fallback(k);
        for (x, y) in &origins {
            builder.add_segment(cell(*x, *y, 0.5));
        }
        let graph = builder.build().unwrap();
        for id in graph.segment_ids() {
            prop_assert!(graph.degree(id) >= 1);
            prop_assert!(graph.neighbors(id).iter().all(|e| e.neighbor != id));
        }
    }
}
