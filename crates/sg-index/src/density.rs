//! Infrastructure density per segment (sq ft of facility footprint per acre).

use sg_core::{SegmentId, acres, sq_ft, sqft_per_acre};

use crate::assignment::{Facility, FacilityAssignment};
use crate::error::{IndexError, IndexResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDensity {
    pub facility_count: usize,
    pub infrastructure_sqft: f64,
    pub density_sqft_per_acre: f64,
}

/// Density for every segment. Segment areas must be finite and positive.
pub fn compute_density(
    areas_acres: &[f64],
    facilities: &[Facility],
    assignment: &FacilityAssignment,
) -> IndexResult<Vec<SegmentDensity>> {
    if assignment.per_segment.len() != areas_acres.len() {
        return Err(IndexError::LengthMismatch {
            what: "segment areas vs assignment",
            left: areas_acres.len(),
            right: assignment.per_segment.len(),
        });
    }

    areas_acres
        .iter()
        .zip(&assignment.per_segment)
        .enumerate()
        .map(|(i, (&area, members))| {
            if !(area.is_finite() && area > 0.0) {
                return Err(IndexError::InvalidSegmentArea {
                    segment: SegmentId::from_index(i as u32),
                    acres: area,
                });
            }
            let infrastructure_sqft: f64 = members
                .iter()
                .filter_map(|fid| facilities.get(fid.pos()))
                .map(|f| f.area_sqft)
                .sum();
            Ok(SegmentDensity {
                facility_count: members.len(),
                infrastructure_sqft,
                density_sqft_per_acre: sqft_per_acre(sq_ft(infrastructure_sqft), acres(area)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::FacilityId;
    use sg_graph::Geometry;

    fn facility(sqft: f64) -> Facility {
        Facility {
            geometry: Geometry::Point([0.0, 0.0]),
            area_sqft: sqft,
            kind: Some("bioretention".into()),
            segment: None,
        }
    }

    #[test]
    fn density_is_area_over_acres() {
        let facilities = vec![facility(1000.0), facility(500.0)];
        let assignment = FacilityAssignment {
            per_segment: vec![
                vec![FacilityId::from_index(0), FacilityId::from_index(1)],
                vec![],
            ],
            unassigned: vec![],
        };
        let d = compute_density(&[2.0, 3.0], &facilities, &assignment).unwrap();
        assert_eq!(d[0].facility_count, 2);
        assert!((d[0].density_sqft_per_acre - 750.0).abs() < 1e-9);
        assert_eq!(d[1].density_sqft_per_acre, 0.0);
    }

    #[test]
    fn non_positive_area_is_fatal() {
        let assignment = FacilityAssignment {
            per_segment: vec![vec![]],
            unassigned: vec![],
        };
        for bad in [0.0, -1.0, f64::INFINITY] {
            assert!(matches!(
                compute_density(&[bad], &[], &assignment),
                Err(IndexError::InvalidSegmentArea { .. })
            ));
        }
    }
}
