//! Result data types.
//!
//! Everything here is plain serializable data: labels are stored as the
//! strings the analysis crates render, so a stored run can be read back
//! without the analysis code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project_name: String,
    pub timestamp: String,
    pub engine_version: String,
    pub segment_count: usize,
    pub components: Vec<ComponentReport>,
}

impl RunManifest {
    /// Manifest stamped with the current UTC time.
    pub fn new(
        run_id: RunId,
        project_name: impl Into<String>,
        engine_version: impl Into<String>,
        segment_count: usize,
        components: Vec<ComponentReport>,
    ) -> Self {
        Self {
            run_id,
            project_name: project_name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            engine_version: engine_version.into(),
            segment_count,
            components,
        }
    }

    pub fn status(&self, component: Component) -> Option<&ComponentStatus> {
        self.components
            .iter()
            .find(|c| c.component == component)
            .map(|c| &c.status)
    }
}

/// Analysis stages with their own result columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Vulnerability,
    Alignment,
    Spatial,
    Runoff,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Vulnerability,
        Component::Alignment,
        Component::Spatial,
        Component::Runoff,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Component::Vulnerability => "vulnerability",
            Component::Alignment => "alignment",
            Component::Spatial => "spatial",
            Component::Runoff => "runoff",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentStatus {
    Succeeded,
    Skipped { reason: String, detail: String },
}

impl ComponentStatus {
    pub fn skipped(reason: &str, detail: impl Into<String>) -> Self {
        ComponentStatus::Skipped {
            reason: reason.to_string(),
            detail: detail.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, ComponentStatus::Succeeded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentReport {
    pub component: Component,
    #[serde(flatten)]
    pub status: ComponentStatus,
}

/// One row of the result table.
///
/// Columns of a component that did not succeed stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SegmentRecord {
    pub segment_id: String,
    pub area_acres: f64,

    // vulnerability
    pub imperviousness_pct: Option<f64>,
    pub slope_pct: Option<f64>,
    pub soil_group: Option<String>,
    pub flood_zone: Option<bool>,
    pub drainage_distance_ft: Option<f64>,
    pub vuln_mean: Option<f64>,
    pub vuln_class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults_applied: Vec<String>,

    // alignment
    pub facility_count: Option<usize>,
    pub infrastructure_sqft: Option<f64>,
    pub density_sqft_per_acre: Option<f64>,
    pub quadrant: Option<String>,
    pub gap_index: Option<f64>,

    // spatial
    pub morans_i_local: Option<f64>,
    pub lisa_z: Option<f64>,
    pub lisa_p: Option<f64>,
    pub lisa_cluster: Option<String>,
    pub gi_star: Option<f64>,
    pub gi_p: Option<f64>,
    pub hotspot_class: Option<String>,
    #[serde(default)]
    pub knn_fallback: bool,

    // runoff
    pub cn_current: Option<f64>,
    pub cn_with_gsi: Option<f64>,
    pub cn_at_floor: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runoff: Vec<RunoffCell>,
}

impl SegmentRecord {
    pub fn new(segment_id: impl Into<String>, area_acres: f64) -> Self {
        Self {
            segment_id: segment_id.into(),
            area_acres,
            ..Self::default()
        }
    }

    pub fn runoff_cell(&self, storm: &str, scenario: &str) -> Option<&RunoffCell> {
        self.runoff
            .iter()
            .find(|c| c.storm == storm && c.scenario == scenario)
    }
}

/// Runoff for one (storm, scenario) pair of a segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunoffCell {
    pub storm: String,
    pub scenario: String,
    pub density_sqft_per_acre: f64,
    pub cn: f64,
    pub depth_in: f64,
    pub volume_acft: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub segment_count: usize,
    pub total_area_acres: f64,
    pub facility_count: usize,
    pub unassigned_facilities: usize,
    pub vulnerability: Option<VulnerabilitySummary>,
    pub alignment: Option<AlignmentSummary>,
    pub spatial: Option<SpatialSummary>,
    pub runoff: Option<RunoffSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VulnerabilitySummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub class_counts: BTreeMap<String, usize>,
    pub defaulted_segments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignmentSummary {
    pub mean_density: f64,
    pub median_density: f64,
    pub min_density: f64,
    pub max_density: f64,
    pub zero_infrastructure_count: usize,
    pub median_vulnerability: f64,
    pub quadrant_counts: BTreeMap<String, usize>,
    pub mean_gap: f64,
    pub high_gap_count: usize,
    pub pearson: CorrelationSummary,
    pub spearman: CorrelationSummary,
}

/// A statistic that may be undefined; `undefined_reason` is set exactly
/// when the numeric fields are not.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CorrelationSummary {
    pub coefficient: Option<f64>,
    pub p_value: Option<f64>,
    pub strength: Option<String>,
    pub direction: Option<String>,
    pub significant: Option<bool>,
    pub undefined_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpatialSummary {
    pub attribute: String,
    pub global: GlobalMoranSummary,
    pub permutations: u32,
    pub lisa_inference: String,
    pub cluster_counts: BTreeMap<String, usize>,
    pub hotspot_counts: BTreeMap<String, usize>,
    pub fallback_segments: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalMoranSummary {
    pub i: Option<f64>,
    pub expected: Option<f64>,
    pub z_score: Option<f64>,
    pub p_value: Option<f64>,
    pub z_randomization: Option<f64>,
    pub p_randomization: Option<f64>,
    pub p_permutation: Option<f64>,
    pub interpretation: Option<String>,
    pub undefined_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunoffSummary {
    pub mean_cn_current: f64,
    pub mean_cn_with_gsi: f64,
    pub floor_segments: usize,
    pub storms: Vec<StormSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StormSummary {
    pub label: String,
    pub depth_in: f64,
    pub no_infrastructure_volume_acft: f64,
    pub existing_benefit_acft: f64,
    pub scenarios: Vec<ScenarioSummary>,
}

impl StormSummary {
    pub fn scenario(&self, name: &str) -> Option<&ScenarioSummary> {
        self.scenarios.iter().find(|s| s.scenario == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSummary {
    pub scenario: String,
    pub plan: String,
    pub not_applicable: Option<String>,
    pub total_volume_acft: f64,
    pub reduction_acft: f64,
    pub reduction_pct: f64,
}
