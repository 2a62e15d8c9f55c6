//! End-to-end tests for the spatial statistics.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use sg_core::UndefinedReason;
use sg_graph::{
    ContiguityRule, NeighborGraph, NeighborGraphBuilder, NeighborPolicy, Polygon, SpatialWeights,
    WeightTransform,
};
use sg_spatial::{LisaCluster, Outcome, SpatialConfig, analyze, global_moran};

fn square(x: f64, y: f64) -> Polygon {
    Polygon::new(vec![[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0]]).unwrap()
}

fn grid(side: usize) -> NeighborGraph {
    let mut b = NeighborGraphBuilder::new(NeighborPolicy::default());
    for r in 0..side {
        for c in 0..side {
            b.add_segment(square(c as f64, r as f64));
        }
    }
    b.build().unwrap()
}

/// Border cells of a 4x4 block: a rook cycle of 12 segments, each with
/// exactly two neighbors.
fn ring() -> NeighborGraph {
    let mut b = NeighborGraphBuilder::new(NeighborPolicy::Contiguity(ContiguityRule::Rook));
    for r in 0..4 {
        for c in 0..4 {
            if r == 0 || r == 3 || c == 0 || c == 3 {
                b.add_segment(square(c as f64, r as f64));
            }
        }
    }
    b.build().unwrap()
}

#[test]
fn clustered_surface_is_detected() {
    let graph = grid(7);
    // smooth gradient across columns
    let values: Vec<f64> = (0..49).map(|k| (k % 7) as f64).collect();
    let report = analyze(&graph, None, &values, &SpatialConfig::default()).unwrap();

    let global = report.global.defined().unwrap();
    assert!(global.i > 0.5);
    assert_eq!(global.interpretation.as_str(), "clustered");
    assert!(global.p_value() < 0.001);

    let counts = report.cluster_counts();
    assert_eq!(counts.values().sum::<usize>(), 49);
    assert!(counts.get("HH (High-High)").copied().unwrap_or(0) > 0);
    assert!(counts.get("LL (Low-Low)").copied().unwrap_or(0) > 0);
    assert_eq!(report.hotspot_counts().values().sum::<usize>(), 49);
    assert_eq!(report.permutations, 999);
}

#[test]
fn constant_attribute_reports_zero_variance() {
    let graph = grid(3);
    let report = analyze(&graph, None, &[4.2; 9], &SpatialConfig::default()).unwrap();
    for reason in [
        report.global.reason(),
        report.local.reason(),
        report.hotspots.reason(),
    ] {
        let reason = reason.unwrap();
        assert_eq!(reason, UndefinedReason::ZeroVariance);
        assert_eq!(reason.to_string(), "undefined due to zero variance");
    }
    assert!(report.cluster_counts().is_empty());
}

#[test]
fn too_few_segments_are_undefined() {
    let mut b = NeighborGraphBuilder::new(NeighborPolicy::default());
    b.add_segment(square(0.0, 0.0));
    b.add_segment(square(1.0, 0.0));
    let graph = b.build().unwrap();
    let report = analyze(&graph, None, &[1.0, 2.0], &SpatialConfig::default()).unwrap();
    assert!(matches!(
        report.global,
        Outcome::Undefined(UndefinedReason::TooFewSamples { n: 2, .. })
    ));
}

#[test]
fn statistics_do_not_depend_on_units() {
    let mut b = NeighborGraphBuilder::new(NeighborPolicy::default());
    for k in 0..6 {
        b.add_segment(square(k as f64, 0.0));
    }
    let strip = b.build().unwrap();
    let values: Vec<f64> = (1..=6).map(|k| k as f64).collect();
    let tiny: Vec<f64> = values.iter().map(|v| v * 1e-7).collect();
    let cfg = SpatialConfig::default();

    let a = analyze(&strip, None, &values, &cfg).unwrap();
    let t = analyze(&strip, None, &tiny, &cfg).unwrap();
    let (ga, gt) = (a.global.defined().unwrap(), t.global.defined().unwrap());
    assert!((ga.i - gt.i).abs() < 1e-9, "I = {} vs {}", ga.i, gt.i);
    assert!(ga.i > 0.5);

    let (ha, ht) = (a.hotspots.defined().unwrap(), t.hotspots.defined().unwrap());
    for (x, y) in ha.iter().zip(ht) {
        assert_eq!(x.class, y.class);
        if let (Some(zx), Some(zy)) = (x.z, y.z) {
            assert!((zx - zy).abs() < 1e-6);
        }
    }
}

#[test]
fn rejects_mismatched_values() {
    let graph = grid(3);
    assert!(analyze(&graph, None, &[1.0; 4], &SpatialConfig::default()).is_err());
    let mut vals = vec![1.0; 9];
    vals[3] = f64::NAN;
    assert!(analyze(&graph, None, &vals, &SpatialConfig::default()).is_err());
}

#[test]
fn separate_hotspot_graph_is_used() {
    let graph = grid(5);
    let mut b = NeighborGraphBuilder::new(NeighborPolicy::DistanceBand {
        threshold: 2.5,
        inverse_distance_power: Some(1.0),
    });
    for r in 0..5 {
        for c in 0..5 {
            b.add_segment(square(c as f64, r as f64));
        }
    }
    let band = b.build().unwrap();
    let values: Vec<f64> = (0..25).map(|k| if k < 5 { 20.0 } else { 1.0 }).collect();
    let a = analyze(&graph, None, &values, &SpatialConfig::default()).unwrap();
    let c = analyze(&graph, Some(&band), &values, &SpatialConfig::default()).unwrap();
    assert_eq!(a.global, c.global);
    assert_ne!(a.hotspots, c.hotspots);
}

#[test]
fn results_do_not_depend_on_thread_count() {
    let graph = grid(6);
    let values: Vec<f64> = (0..36).map(|k| ((k * 13) % 17) as f64).collect();
    let cfg = SpatialConfig {
        permutations: 199,
        ..SpatialConfig::default()
    };
    let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let single = pool.install(|| analyze(&graph, None, &values, &cfg).unwrap());
    let multi = analyze(&graph, None, &values, &cfg).unwrap();
    assert_eq!(single, multi);
    for l in multi.local.defined().unwrap() {
        if let LisaCluster::Significant(q) = l.cluster {
            assert_eq!(q, l.quadrant);
        }
    }
}

#[test]
fn permutation_average_matches_expectation() {
    let graph = grid(6);
    let w = SpatialWeights::from_graph(&graph, WeightTransform::RowStandardized);
    let mut values: Vec<f64> = (0..36).map(|k| (k as f64).sqrt()).collect();
    let cfg = SpatialConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let rounds = 2000;
    let mut total = 0.0;
    for _ in 0..rounds {
        values.shuffle(&mut rng);
        total += global_moran(&w, &values, &cfg).unwrap().defined().unwrap().i;
    }
    let mean_i = total / rounds as f64;
    assert!((mean_i - (-1.0 / 35.0)).abs() < 0.02, "mean I = {mean_i}");
}

proptest! {
    #[test]
    fn morans_i_bounded_on_regular_ring(values in prop::collection::vec(-100.0f64..100.0, 12)) {
        let w = SpatialWeights::from_graph(&ring(), WeightTransform::RowStandardized);
        match global_moran(&w, &values, &SpatialConfig::default()).unwrap() {
            Outcome::Defined(g) => prop_assert!(g.i >= -1.0 - 1e-9 && g.i <= 1.0 + 1e-9),
            Outcome::Undefined(reason) => prop_assert_eq!(reason, UndefinedReason::ZeroVariance),
        }
    }
}
