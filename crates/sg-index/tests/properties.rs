//! Property tests for the per-segment indices.

use proptest::prelude::*;
use sg_graph::{Geometry, Polygon};
use sg_index::{
    Facility, Quadrant, RawAttributes, SoilGroup, VulnerabilityConfig, assign_facilities,
    classify_quadrants, compute_density, gap_indices, score_segments,
};

fn soil() -> impl Strategy<Value = Option<SoilGroup>> {
    prop_oneof![
        Just(None),
        Just(Some(SoilGroup::A)),
        Just(Some(SoilGroup::B)),
        Just(Some(SoilGroup::C)),
        Just(Some(SoilGroup::D)),
    ]
}

fn raw() -> impl Strategy<Value = RawAttributes> {
    (
        prop::option::of(-50.0f64..200.0),
        prop::option::of(-5.0f64..80.0),
        soil(),
        prop::option::of(any::<bool>()),
        prop::option::of(-10.0f64..5000.0),
    )
        .prop_map(|(imp, slope, soil, flood, dist)| RawAttributes {
            imperviousness_pct: imp,
            slope_pct: slope,
            soil_group: soil,
            flood_zone: flood,
            drainage_distance_ft: dist,
        })
}

proptest! {
    #[test]
    fn score_stays_in_range(attrs in prop::collection::vec(raw(), 1..40)) {
        let scores = score_segments(&attrs, &VulnerabilityConfig::default()).unwrap();
        prop_assert_eq!(scores.len(), attrs.len());
        for s in scores {
            prop_assert!((0.0..=10.0).contains(&s.score));
        }
    }

    #[test]
    fn density_zero_iff_no_footprint(
        areas in prop::collection::vec(0.1f64..50.0, 1..8),
        footprints in prop::collection::vec((0usize..8, 0.0f64..5000.0), 0..20),
    ) {
        let n = areas.len();
        let polygons: Vec<Polygon> = (0..n)
            .map(|k| {
                let x = k as f64 * 10.0;
                Polygon::new(vec![[x, 0.0], [x + 10.0, 0.0], [x + 10.0, 10.0], [x, 10.0]]).unwrap()
            })
            .collect();
        let facilities: Vec<Facility> = footprints
            .iter()
            .map(|&(seg, sqft)| Facility {
                geometry: Geometry::Point([(seg % n) as f64 * 10.0 + 5.0, 5.0]),
                area_sqft: sqft,
                kind: None,
                segment: None,
            })
            .collect();

        let assignment = assign_facilities(&polygons, &facilities).unwrap();
        prop_assert!(assignment.unassigned.is_empty());
        let density = compute_density(&areas, &facilities, &assignment).unwrap();
        for d in &density {
            prop_assert!(d.density_sqft_per_acre >= 0.0);
            prop_assert_eq!(d.density_sqft_per_acre == 0.0, d.infrastructure_sqft == 0.0);
        }
    }

    #[test]
    fn quadrants_partition_the_collection(
        pairs in prop::collection::vec((0.0f64..10.0, 0.0f64..2000.0), 1..60),
    ) {
        let v: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let d: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let q = classify_quadrants(&v, &d).unwrap();
        let total: usize = Quadrant::ALL.iter().map(|&x| q.count(x)).sum();
        prop_assert_eq!(total, v.len());
        prop_assert_eq!(q.labels.len(), v.len());

        let gap = gap_indices(&v, &d).unwrap();
        for (g, vi) in gap.values.iter().zip(&v) {
            prop_assert!(*g >= 0.0 && *g <= *vi);
        }
    }
}
