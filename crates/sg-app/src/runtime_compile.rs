//! Compile a validated project into the analysis crates' runtime inputs.

use std::collections::HashMap;

use sg_core::SegmentId;
use sg_graph::{ContiguityRule, Geometry, NeighborPolicy, Polygon, WeightTransform};
use sg_index::{
    AlignmentConfig, Facility, RawAttributes, SoilGroup, VulnerabilityConfig, VulnerabilityWeights,
};
use sg_project::schema::{
    AnalysisConfigDef, GeometryDef, LisaInferenceDef, NeighborPolicyDef, PolygonDef, Project,
    SpatialAttributeDef, WeightTransformDef,
};
use sg_runoff::{CurveNumberParams, DesignStorm, RunoffConfig};
use sg_spatial::{LisaInference, SpatialConfig};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Segment attribute the spatial statistics run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialAttribute {
    GapIndex,
    Vulnerability,
    Density,
}

impl SpatialAttribute {
    pub fn as_str(self) -> &'static str {
        match self {
            SpatialAttribute::GapIndex => "gap_index",
            SpatialAttribute::Vulnerability => "vuln_mean",
            SpatialAttribute::Density => "density_sqft_per_acre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborSettings {
    pub policy: NeighborPolicy,
    pub knn_fallback: usize,
    pub snap_tolerance: f64,
}

/// Runtime configuration for every component.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub vulnerability: VulnerabilityConfig,
    pub alignment: AlignmentConfig,
    pub neighbors: NeighborSettings,
    pub spatial_attribute: SpatialAttribute,
    pub spatial: SpatialConfig,
    pub runoff: RunoffConfig,
}

/// Runtime view of a project: parallel vectors in segment order.
#[derive(Debug, Clone)]
pub struct CompiledProject {
    pub name: String,
    pub segment_ids: Vec<String>,
    pub polygons: Vec<Polygon>,
    pub areas_acres: Vec<f64>,
    pub attributes: Vec<RawAttributes>,
    pub facility_ids: Vec<String>,
    pub facilities: Vec<Facility>,
    pub settings: AnalysisSettings,
}

impl CompiledProject {
    pub fn len(&self) -> usize {
        self.segment_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_ids.is_empty()
    }
}

fn neighbor_policy(def: &NeighborPolicyDef) -> NeighborPolicy {
    match def {
        NeighborPolicyDef::Queen => NeighborPolicy::Contiguity(ContiguityRule::Queen),
        NeighborPolicyDef::Rook => NeighborPolicy::Contiguity(ContiguityRule::Rook),
        NeighborPolicyDef::DistanceBand {
            threshold,
            inverse_distance_power,
        } => NeighborPolicy::DistanceBand {
            threshold: *threshold,
            inverse_distance_power: *inverse_distance_power,
        },
    }
}

pub fn compile_settings(def: &AnalysisConfigDef) -> AnalysisSettings {
    let w = &def.vulnerability.weights;
    let s = &def.spatial;
    let r = &def.runoff;

    AnalysisSettings {
        vulnerability: VulnerabilityConfig {
            weights: VulnerabilityWeights {
                imperviousness: w.imperviousness,
                slope: w.slope,
                soil: w.soil,
                flood_zone: w.flood_zone,
                drainage_proximity: w.drainage_proximity,
            },
            slope_cap_pct: def.vulnerability.slope_cap_pct,
            drainage_cap_ft: def.vulnerability.drainage_cap_ft,
        },
        alignment: AlignmentConfig {
            alpha: def.alignment.alpha,
        },
        neighbors: NeighborSettings {
            policy: neighbor_policy(&def.neighbors.policy),
            knn_fallback: def.neighbors.knn_fallback,
            snap_tolerance: def.neighbors.snap_tolerance,
        },
        spatial_attribute: match s.attribute {
            SpatialAttributeDef::GapIndex => SpatialAttribute::GapIndex,
            SpatialAttributeDef::Vulnerability => SpatialAttribute::Vulnerability,
            SpatialAttributeDef::Density => SpatialAttribute::Density,
        },
        spatial: SpatialConfig {
            transform: match s.transform {
                WeightTransformDef::RowStandardized => WeightTransform::RowStandardized,
                WeightTransformDef::Binary => WeightTransform::Binary,
            },
            alpha: s.alpha,
            permutations: s.permutations,
            permutation_cap: s.permutation_cap,
            seed: s.seed,
            lisa_inference: match s.lisa_inference {
                LisaInferenceDef::Permutation => LisaInference::Permutation,
                LisaInferenceDef::Normal => LisaInference::Normal,
            },
            standardize: s.standardize,
            global_permutation_test: s.global_permutation_test,
            hotspot_neighbors: s.hotspot_neighbors.as_ref().map(neighbor_policy),
        },
        runoff: RunoffConfig {
            storms: r
                .storms
                .iter()
                .map(|st| DesignStorm::new(st.label.clone(), st.depth_in))
                .collect(),
            curve_number: CurveNumberParams {
                pervious: [
                    r.pervious_cn.a,
                    r.pervious_cn.b,
                    r.pervious_cn.c,
                    r.pervious_cn.d,
                ],
                impervious: r.impervious_cn,
                floor: r.cn_floor,
                max_reduction: r.max_cn_reduction,
                half_saturation_density: r.half_saturation_density,
            },
            investment_budget_sqft: r.investment_budget_sqft,
            density_ceiling: r.density_ceiling,
        },
    }
}

fn polygon(def: &PolygonDef) -> AppResult<Polygon> {
    Ok(Polygon::with_holes(def.exterior.clone(), def.holes.clone())?)
}

/// Compile a project that already passed `validate_project`.
pub fn compile_project(project: &Project) -> AppResult<CompiledProject> {
    let n = project.segments.len();
    let mut segment_ids = Vec::with_capacity(n);
    let mut polygons = Vec::with_capacity(n);
    let mut areas_acres = Vec::with_capacity(n);
    let mut attributes = Vec::with_capacity(n);
    let mut index_of: HashMap<&str, SegmentId> = HashMap::with_capacity(n);

    for (i, seg) in project.segments.iter().enumerate() {
        let poly = polygon(&seg.geometry)
            .map_err(|e| AppError::Compile(format!("segment '{}': {}", seg.id, e)))?;
        let soil_group = match &seg.attributes.soil_group {
            Some(s) => Some(s.parse::<SoilGroup>().map_err(|e| {
                AppError::Compile(format!("segment '{}': {}", seg.id, e))
            })?),
            None => None,
        };
        index_of.insert(seg.id.as_str(), SegmentId::from_index(i as u32));
        segment_ids.push(seg.id.clone());
        polygons.push(poly);
        areas_acres.push(seg.area_acres);
        attributes.push(RawAttributes {
            imperviousness_pct: seg.attributes.imperviousness_pct,
            slope_pct: seg.attributes.slope_pct,
            soil_group,
            flood_zone: seg.attributes.flood_zone,
            drainage_distance_ft: seg.attributes.drainage_distance_ft,
        });
    }

    let mut facility_ids = Vec::with_capacity(project.facilities.len());
    let mut facilities = Vec::with_capacity(project.facilities.len());
    for f in &project.facilities {
        let geometry = match &f.geometry {
            GeometryDef::Point { coordinates } => Geometry::Point(*coordinates),
            GeometryDef::LineString { coordinates } => Geometry::LineString(coordinates.clone()),
            GeometryDef::Polygon { exterior, holes } => Geometry::Polygon(
                Polygon::with_holes(exterior.clone(), holes.clone())
                    .map_err(|e| AppError::Compile(format!("facility '{}': {}", f.id, e)))?,
            ),
        };
        let segment = match &f.segment_id {
            Some(id) => Some(*index_of.get(id.as_str()).ok_or_else(|| {
                AppError::Compile(format!(
                    "facility '{}' references unknown segment '{}'",
                    f.id, id
                ))
            })?),
            None => None,
        };
        facility_ids.push(f.id.clone());
        facilities.push(Facility {
            geometry,
            area_sqft: f.area_sqft,
            kind: f.kind.clone(),
            segment,
        });
    }

    debug!(
        segments = n,
        facilities = facilities.len(),
        "project compiled"
    );

    Ok(CompiledProject {
        name: project.name.clone(),
        segment_ids,
        polygons,
        areas_acres,
        attributes,
        facility_ids,
        facilities,
        settings: compile_settings(&project.config),
    })
}
