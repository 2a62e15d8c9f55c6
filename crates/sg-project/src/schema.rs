//! Project schema definitions.
//!
//! Every configuration field has a serde default equal to the engine's
//! documented constant, so a project file only needs `version`, `name` and
//! `segments`.

use serde::{Deserialize, Serialize};

pub type CoordDef = [f64; 2];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub config: AnalysisConfigDef,
    pub segments: Vec<SegmentDef>,
    #[serde(default)]
    pub facilities: Vec<FacilityDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentDef {
    pub id: String,
    pub geometry: PolygonDef,
    pub area_acres: f64,
    #[serde(default)]
    pub attributes: AttributesDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolygonDef {
    pub exterior: Vec<CoordDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<CoordDef>>,
}

/// Zonal statistics extracted upstream. Missing values fall back to
/// defaults during scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AttributesDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imperviousness_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope_pct: Option<f64>,
    /// `A`, `B`, `C`, `D` or a dual class such as `B/D`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flood_zone: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drainage_distance_ft: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacilityDef {
    pub id: String,
    pub geometry: GeometryDef,
    pub area_sqft: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GeometryDef {
    Point {
        coordinates: CoordDef,
    },
    LineString {
        coordinates: Vec<CoordDef>,
    },
    Polygon {
        exterior: Vec<CoordDef>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        holes: Vec<Vec<CoordDef>>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfigDef {
    #[serde(default)]
    pub vulnerability: VulnerabilityDef,
    #[serde(default)]
    pub alignment: AlignmentDef,
    #[serde(default)]
    pub neighbors: NeighborsDef,
    #[serde(default)]
    pub spatial: SpatialDef,
    #[serde(default)]
    pub runoff: RunoffDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VulnerabilityDef {
    #[serde(default)]
    pub weights: WeightsDef,
    #[serde(default = "default_slope_cap")]
    pub slope_cap_pct: f64,
    #[serde(default = "default_drainage_cap")]
    pub drainage_cap_ft: f64,
}

impl Default for VulnerabilityDef {
    fn default() -> Self {
        Self {
            weights: WeightsDef::default(),
            slope_cap_pct: default_slope_cap(),
            drainage_cap_ft: default_drainage_cap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightsDef {
    pub imperviousness: f64,
    pub slope: f64,
    pub soil: f64,
    pub flood_zone: f64,
    pub drainage_proximity: f64,
}

impl Default for WeightsDef {
    fn default() -> Self {
        Self {
            imperviousness: 0.25,
            slope: 0.15,
            soil: 0.20,
            flood_zone: 0.15,
            drainage_proximity: 0.25,
        }
    }
}

impl WeightsDef {
    pub fn sum(&self) -> f64 {
        self.imperviousness + self.slope + self.soil + self.flood_zone + self.drainage_proximity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignmentDef {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for AlignmentDef {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum NeighborPolicyDef {
    Queen,
    Rook,
    DistanceBand {
        threshold: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inverse_distance_power: Option<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NeighborsDef {
    #[serde(default = "default_policy")]
    pub policy: NeighborPolicyDef,
    #[serde(default = "default_knn")]
    pub knn_fallback: usize,
    #[serde(default = "default_snap")]
    pub snap_tolerance: f64,
}

impl Default for NeighborsDef {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            knn_fallback: default_knn(),
            snap_tolerance: default_snap(),
        }
    }
}

/// Per-segment attribute the spatial statistics run on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpatialAttributeDef {
    #[default]
    GapIndex,
    Vulnerability,
    Density,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightTransformDef {
    #[default]
    RowStandardized,
    Binary,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LisaInferenceDef {
    #[default]
    Permutation,
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpatialDef {
    #[serde(default)]
    pub attribute: SpatialAttributeDef,
    #[serde(default)]
    pub transform: WeightTransformDef,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_permutations")]
    pub permutations: u32,
    #[serde(default = "default_permutation_cap")]
    pub permutation_cap: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub lisa_inference: LisaInferenceDef,
    #[serde(default = "default_true")]
    pub standardize: bool,
    #[serde(default)]
    pub global_permutation_test: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot_neighbors: Option<NeighborPolicyDef>,
}

impl Default for SpatialDef {
    fn default() -> Self {
        Self {
            attribute: SpatialAttributeDef::default(),
            transform: WeightTransformDef::default(),
            alpha: default_alpha(),
            permutations: default_permutations(),
            permutation_cap: default_permutation_cap(),
            seed: default_seed(),
            lisa_inference: LisaInferenceDef::default(),
            standardize: true,
            global_permutation_test: false,
            hotspot_neighbors: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StormDef {
    pub label: String,
    pub depth_in: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerviousCnDef {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for PerviousCnDef {
    fn default() -> Self {
        Self {
            a: 39.0,
            b: 61.0,
            c: 74.0,
            d: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunoffDef {
    #[serde(default = "default_storms")]
    pub storms: Vec<StormDef>,
    #[serde(default)]
    pub pervious_cn: PerviousCnDef,
    #[serde(default = "default_impervious_cn")]
    pub impervious_cn: f64,
    #[serde(default = "default_cn_floor")]
    pub cn_floor: f64,
    #[serde(default = "default_max_cn_reduction")]
    pub max_cn_reduction: f64,
    #[serde(default = "default_half_saturation")]
    pub half_saturation_density: f64,
    #[serde(default = "default_budget")]
    pub investment_budget_sqft: f64,
    #[serde(default = "default_ceiling")]
    pub density_ceiling: f64,
}

impl Default for RunoffDef {
    fn default() -> Self {
        Self {
            storms: default_storms(),
            pervious_cn: PerviousCnDef::default(),
            impervious_cn: default_impervious_cn(),
            cn_floor: default_cn_floor(),
            max_cn_reduction: default_max_cn_reduction(),
            half_saturation_density: default_half_saturation(),
            investment_budget_sqft: default_budget(),
            density_ceiling: default_ceiling(),
        }
    }
}

fn default_slope_cap() -> f64 {
    15.0
}

fn default_drainage_cap() -> f64 {
    1000.0
}

fn default_alpha() -> f64 {
    0.05
}

fn default_policy() -> NeighborPolicyDef {
    NeighborPolicyDef::Queen
}

fn default_knn() -> usize {
    5
}

fn default_snap() -> f64 {
    1e-6
}

fn default_permutations() -> u32 {
    999
}

fn default_permutation_cap() -> u32 {
    99_999
}

fn default_seed() -> u64 {
    12_345
}

fn default_true() -> bool {
    true
}

fn default_storms() -> Vec<StormDef> {
    [
        ("2-year", 2.2),
        ("5-year", 2.6),
        ("10-year", 2.9),
        ("25-year", 3.4),
        ("50-year", 3.8),
        ("100-year", 4.3),
    ]
    .into_iter()
    .map(|(label, depth_in)| StormDef {
        label: label.to_string(),
        depth_in,
    })
    .collect()
}

fn default_impervious_cn() -> f64 {
    98.0
}

fn default_cn_floor() -> f64 {
    30.0
}

fn default_max_cn_reduction() -> f64 {
    20.0
}

fn default_half_saturation() -> f64 {
    10_000.0
}

fn default_budget() -> f64 {
    100_000.0
}

fn default_ceiling() -> f64 {
    1_500.0
}
