//! Facility-to-segment spatial join.

use sg_core::{FacilityId, SegmentId};
use sg_graph::{Geometry, Polygon};
use tracing::{debug, warn};

use crate::error::{IndexError, IndexResult};

/// Protective infrastructure facility (green infrastructure practice,
/// detention basin, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub geometry: Geometry,
    /// Footprint area in square feet.
    pub area_sqft: f64,
    pub kind: Option<String>,
    /// Segment the upstream extract already joined this facility to.
    pub segment: Option<SegmentId>,
}

/// Result of the join: facility IDs grouped per segment, plus the facilities
/// that fell outside every segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityAssignment {
    pub per_segment: Vec<Vec<FacilityId>>,
    pub unassigned: Vec<FacilityId>,
}

impl FacilityAssignment {
    pub fn facilities_in(&self, segment: SegmentId) -> &[FacilityId] {
        self.per_segment
            .get(segment.pos())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn assigned_count(&self) -> usize {
        self.per_segment.iter().map(Vec::len).sum()
    }
}

/// Assign each facility to one segment.
///
/// A pre-assigned segment wins; otherwise the first segment (in collection
/// order) whose polygon contains the facility's representative point.
pub fn assign_facilities(
    segments: &[Polygon],
    facilities: &[Facility],
) -> IndexResult<FacilityAssignment> {
    let mut assignment = FacilityAssignment {
        per_segment: vec![Vec::new(); segments.len()],
        unassigned: Vec::new(),
    };

    for (f_idx, facility) in facilities.iter().enumerate() {
        let fid = FacilityId::from_index(f_idx as u32);
        if !(facility.area_sqft.is_finite() && facility.area_sqft >= 0.0) {
            return Err(IndexError::InvalidFacilityArea {
                facility: fid,
                sqft: facility.area_sqft,
            });
        }

        let target = match facility.segment {
            Some(seg) if seg.pos() < segments.len() => Some(seg),
            Some(seg) => {
                return Err(IndexError::UnknownSegment {
                    facility: fid,
                    segment: seg,
                });
            }
            None => {
                let p = facility.geometry.representative_point();
                segments
                    .iter()
                    .position(|poly| poly.contains(p))
                    .map(|i| SegmentId::from_index(i as u32))
            }
        };

        match target {
            Some(seg) => assignment.per_segment[seg.pos()].push(fid),
            None => {
                debug!(facility = f_idx, "facility outside every segment");
                assignment.unassigned.push(fid);
            }
        }
    }

    if !assignment.unassigned.is_empty() {
        warn!(
            unassigned = assignment.unassigned.len(),
            total = facilities.len(),
            "facilities not assigned to any segment"
        );
    }

    Ok(assignment)
}
