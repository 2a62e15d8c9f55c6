//! Project validation logic.
//!
//! Everything here is a configuration error: it is reported before any
//! computation starts.

use std::collections::HashSet;

use sg_core::WEIGHT_SUM_TOLERANCE;

use crate::schema::{
    AnalysisConfigDef, CoordDef, FacilityDef, GeometryDef, NeighborPolicyDef, Project,
    SegmentDef,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Empty collection: {what}")]
    Empty { what: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite and positive"))
    }
}

fn non_negative(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite and non-negative"))
    }
}

fn probability(field: &str, v: f64) -> Result<(), ValidationError> {
    if v > 0.0 && v < 1.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be in (0, 1)"))
    }
}

fn curve_number(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 && v <= 100.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "curve number must be in (0, 100]"))
    }
}

fn ring(field: &str, coords: &[CoordDef]) -> Result<(), ValidationError> {
    if coords.iter().flatten().any(|v| !v.is_finite()) {
        return Err(invalid(field, "coordinates", "non-finite coordinate"));
    }
    let mut distinct = coords.to_vec();
    if distinct.len() > 1 && distinct.first() == distinct.last() {
        distinct.pop();
    }
    if distinct.len() < 3 {
        return Err(invalid(field, coords.len(), "ring needs at least three vertices"));
    }
    Ok(())
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }
    if project.segments.is_empty() {
        return Err(ValidationError::Empty {
            what: "segments".to_string(),
        });
    }

    let mut segment_ids = HashSet::new();
    for segment in &project.segments {
        if !segment_ids.insert(segment.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: segment.id.clone(),
                context: "segments".to_string(),
            });
        }
        validate_segment(segment)?;
    }

    let mut facility_ids = HashSet::new();
    for facility in &project.facilities {
        if !facility_ids.insert(facility.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: facility.id.clone(),
                context: "facilities".to_string(),
            });
        }
        validate_facility(facility, &segment_ids)?;
    }

    validate_config(&project.config)
}

fn validate_segment(segment: &SegmentDef) -> Result<(), ValidationError> {
    let ctx = |field: &str| format!("segment '{}' {}", segment.id, field);
    if segment.id.trim().is_empty() {
        return Err(invalid("segment id", "''", "must not be empty"));
    }
    positive(&ctx("area_acres"), segment.area_acres)?;
    ring(&ctx("exterior"), &segment.geometry.exterior)?;
    for hole in &segment.geometry.holes {
        ring(&ctx("hole"), hole)?;
    }

    let attrs = &segment.attributes;
    for (name, value) in [
        ("imperviousness_pct", attrs.imperviousness_pct),
        ("slope_pct", attrs.slope_pct),
        ("drainage_distance_ft", attrs.drainage_distance_ft),
    ] {
        // NaN is tolerated as "missing"; infinities are not
        if let Some(v) = value.filter(|v| v.is_infinite()) {
            return Err(invalid(ctx(name), v, "must be finite"));
        }
    }
    if let Some(group) = &attrs.soil_group {
        let known = ["A", "B", "C", "D", "A/D", "B/D", "C/D"];
        if !known.contains(&group.trim().to_ascii_uppercase().as_str()) {
            return Err(invalid(ctx("soil_group"), group, "unknown hydrologic soil group"));
        }
    }
    Ok(())
}

fn validate_facility(
    facility: &FacilityDef,
    segment_ids: &HashSet<&str>,
) -> Result<(), ValidationError> {
    let ctx = |field: &str| format!("facility '{}' {}", facility.id, field);
    non_negative(&ctx("area_sqft"), facility.area_sqft)?;
    match &facility.geometry {
        GeometryDef::Point { coordinates } => {
            if coordinates.iter().any(|v| !v.is_finite()) {
                return Err(invalid(ctx("geometry"), "point", "non-finite coordinate"));
            }
        }
        GeometryDef::LineString { coordinates } => {
            if coordinates.is_empty() || coordinates.iter().flatten().any(|v| !v.is_finite()) {
                return Err(invalid(ctx("geometry"), "line", "empty or non-finite line"));
            }
        }
        GeometryDef::Polygon { exterior, holes } => {
            ring(&ctx("geometry"), exterior)?;
            for hole in holes {
                ring(&ctx("hole"), hole)?;
            }
        }
    }
    if let Some(seg) = &facility.segment_id {
        if !segment_ids.contains(seg.as_str()) {
            return Err(ValidationError::MissingReference {
                id: seg.clone(),
                context: ctx("segment_id"),
            });
        }
    }
    Ok(())
}

fn validate_policy(field: &str, policy: &NeighborPolicyDef) -> Result<(), ValidationError> {
    if let NeighborPolicyDef::DistanceBand {
        threshold,
        inverse_distance_power,
    } = policy
    {
        positive(&format!("{field}.threshold"), *threshold)?;
        if let Some(a) = inverse_distance_power {
            positive(&format!("{field}.inverse_distance_power"), *a)?;
        }
    }
    Ok(())
}

fn validate_config(config: &AnalysisConfigDef) -> Result<(), ValidationError> {
    let v = &config.vulnerability;
    let w = &v.weights;
    for (name, value) in [
        ("imperviousness", w.imperviousness),
        ("slope", w.slope),
        ("soil", w.soil),
        ("flood_zone", w.flood_zone),
        ("drainage_proximity", w.drainage_proximity),
    ] {
        non_negative(&format!("vulnerability.weights.{name}"), value)?;
    }
    if (w.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(invalid("vulnerability.weights", w.sum(), "weights must sum to 1.0"));
    }
    positive("vulnerability.slope_cap_pct", v.slope_cap_pct)?;
    positive("vulnerability.drainage_cap_ft", v.drainage_cap_ft)?;

    probability("alignment.alpha", config.alignment.alpha)?;

    let n = &config.neighbors;
    validate_policy("neighbors.policy", &n.policy)?;
    if n.knn_fallback == 0 {
        return Err(invalid("neighbors.knn_fallback", 0, "must be at least 1"));
    }
    positive("neighbors.snap_tolerance", n.snap_tolerance)?;

    let s = &config.spatial;
    probability("spatial.alpha", s.alpha)?;
    if s.permutations == 0 {
        return Err(invalid("spatial.permutations", 0, "must be at least 1"));
    }
    if s.permutation_cap == 0 {
        return Err(invalid("spatial.permutation_cap", 0, "must be at least 1"));
    }
    if let Some(policy) = &s.hotspot_neighbors {
        validate_policy("spatial.hotspot_neighbors", policy)?;
    }

    let r = &config.runoff;
    if r.storms.is_empty() {
        return Err(ValidationError::Empty {
            what: "runoff.storms".to_string(),
        });
    }
    let mut labels = HashSet::new();
    for storm in &r.storms {
        if !labels.insert(storm.label.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: storm.label.clone(),
                context: "runoff.storms".to_string(),
            });
        }
        positive(&format!("runoff.storms.{}.depth_in", storm.label), storm.depth_in)?;
    }
    let p = &r.pervious_cn;
    for (name, value) in [("a", p.a), ("b", p.b), ("c", p.c), ("d", p.d)] {
        curve_number(&format!("runoff.pervious_cn.{name}"), value)?;
    }
    curve_number("runoff.impervious_cn", r.impervious_cn)?;
    curve_number("runoff.cn_floor", r.cn_floor)?;
    positive("runoff.max_cn_reduction", r.max_cn_reduction)?;
    positive("runoff.half_saturation_density", r.half_saturation_density)?;
    non_negative("runoff.investment_budget_sqft", r.investment_budget_sqft)?;
    positive("runoff.density_ceiling", r.density_ceiling)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributesDef, PolygonDef};

    fn segment(id: &str, x: f64) -> SegmentDef {
        SegmentDef {
            id: id.to_string(),
            geometry: PolygonDef {
                exterior: vec![[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0]],
                holes: vec![],
            },
            area_acres: 2.5,
            attributes: AttributesDef::default(),
        }
    }

    fn project() -> Project {
        Project {
            version: 1,
            name: "t".to_string(),
            config: AnalysisConfigDef::default(),
            segments: vec![segment("a", 0.0), segment("b", 1.0)],
            facilities: vec![],
        }
    }

    #[test]
    fn default_project_is_valid() {
        validate_project(&project()).unwrap();
    }

    #[test]
    fn duplicate_segment_id() {
        let mut p = project();
        p.segments[1].id = "a".to_string();
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut p = project();
        p.config.vulnerability.weights.soil = 0.3;
        let err = validate_project(&p).unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn zero_area_and_bad_soil() {
        let mut p = project();
        p.segments[0].area_acres = 0.0;
        assert!(validate_project(&p).is_err());

        let mut p = project();
        p.segments[0].attributes.soil_group = Some("E".to_string());
        assert!(validate_project(&p).is_err());
        p.segments[0].attributes.soil_group = Some("b/d".to_string());
        assert!(validate_project(&p).is_ok());
    }

    #[test]
    fn empty_segments_and_storms() {
        let mut p = project();
        p.segments.clear();
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::Empty { .. })
        ));

        let mut p = project();
        p.config.runoff.storms.clear();
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn future_version_rejected() {
        let mut p = project();
        p.version = 99;
        assert_eq!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { version: 99 })
        );
    }
}
