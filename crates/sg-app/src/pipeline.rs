//! The analysis pipeline: successive passes over the segment table.
//!
//! Each component fills only its own columns. A component that cannot run
//! is reported as skipped with a reason code and leaves its columns empty;
//! its siblings still run. Data flows vulnerability -> alignment -> spatial
//! and alignment -> runoff.

use std::collections::BTreeMap;
use std::time::Instant;

use sg_core::{SegmentId, stats};
use sg_graph::{NeighborGraph, NeighborGraphBuilder, NeighborPolicy};
use sg_index::{
    AlignmentReport, Correlation, FacilityAssignment, IndexResult, Quadrant, SegmentDensity,
    VulnerabilityScore, analyze_alignment, assign_facilities, compute_density, score_segments,
};
use sg_project::schema::Project;
use sg_results::{
    AlignmentSummary, Component, ComponentReport, ComponentStatus, CorrelationSummary,
    GlobalMoranSummary, RunSummary, RunoffCell, RunoffSummary, ScenarioSummary, SegmentRecord,
    SpatialSummary, StormSummary, VulnerabilitySummary,
};
use sg_runoff::{RunoffReport, RunoffSegment, run_scenarios};
use sg_spatial::{GlobalMoran, LisaInference, MIN_SEGMENTS, Outcome, SpatialReport};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::progress::{ProgressCallback, RunStage, emit};
use crate::runtime_compile::{
    CompiledProject, NeighborSettings, SpatialAttribute, compile_project,
};

/// Version string folded into run ids.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reason codes of skipped components.
pub mod reason {
    pub const TOO_FEW_SEGMENTS: &str = "too_few_segments";
    pub const UPSTREAM_UNAVAILABLE: &str = "upstream_unavailable";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const GRAPH_CONSTRUCTION: &str = "graph_construction";
}

/// Result table, summary and per-component status of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub records: Vec<SegmentRecord>,
    pub summary: RunSummary,
    pub components: Vec<ComponentReport>,
}

impl AnalysisOutput {
    pub fn status(&self, component: Component) -> Option<&ComponentStatus> {
        self.components
            .iter()
            .find(|c| c.component == component)
            .map(|c| &c.status)
    }
}

/// Validate, compile and analyze a project held in memory.
pub fn analyze_project(project: &Project) -> AppResult<AnalysisOutput> {
    sg_project::validate_project(project)?;
    let compiled = compile_project(project)?;
    Ok(run_analysis(&compiled))
}

pub fn run_analysis(compiled: &CompiledProject) -> AnalysisOutput {
    run_analysis_with_progress(compiled, &mut None, Instant::now())
}

struct AlignmentPass {
    assignment: FacilityAssignment,
    density: Vec<SegmentDensity>,
    report: AlignmentReport,
}

fn skip(
    components: &mut Vec<ComponentReport>,
    component: Component,
    code: &str,
    detail: String,
) {
    warn!(component = component.as_str(), reason = code, %detail, "component skipped");
    components.push(ComponentReport {
        component,
        status: ComponentStatus::skipped(code, detail),
    });
}

fn succeed(components: &mut Vec<ComponentReport>, component: Component) {
    components.push(ComponentReport {
        component,
        status: ComponentStatus::Succeeded,
    });
}

pub(crate) fn run_analysis_with_progress(
    compiled: &CompiledProject,
    progress_cb: &mut ProgressCallback<'_>,
    started: Instant,
) -> AnalysisOutput {
    let settings = &compiled.settings;
    let n = compiled.len();
    let mut components = Vec::with_capacity(Component::ALL.len());
    let mut records: Vec<SegmentRecord> = compiled
        .segment_ids
        .iter()
        .zip(&compiled.areas_acres)
        .map(|(id, &area)| SegmentRecord::new(id.clone(), area))
        .collect();
    let mut summary = RunSummary {
        segment_count: n,
        total_area_acres: compiled.areas_acres.iter().sum(),
        facility_count: compiled.facilities.len(),
        ..RunSummary::default()
    };

    // vulnerability
    emit(progress_cb, RunStage::ScoringVulnerability, started, "Scoring vulnerability");
    let vulnerability = match score_segments(&compiled.attributes, &settings.vulnerability) {
        Ok(scores) => {
            fill_vulnerability(&mut records, compiled, &scores);
            summary.vulnerability = Some(vulnerability_summary(&scores));
            succeed(&mut components, Component::Vulnerability);
            Some(scores)
        }
        Err(e) => {
            skip(
                &mut components,
                Component::Vulnerability,
                reason::INVALID_INPUT,
                e.to_string(),
            );
            None
        }
    };
    let vuln_values: Option<Vec<f64>> = vulnerability
        .as_ref()
        .map(|scores| scores.iter().map(|s| s.score).collect());

    // alignment
    emit(progress_cb, RunStage::ClassifyingAlignment, started, "Classifying alignment");
    let alignment = match &vuln_values {
        None => {
            skip(
                &mut components,
                Component::Alignment,
                reason::UPSTREAM_UNAVAILABLE,
                "vulnerability scores unavailable".to_string(),
            );
            None
        }
        Some(vuln) => match alignment_pass(compiled, vuln) {
            Ok(pass) => {
                fill_alignment(&mut records, &pass);
                summary.unassigned_facilities = pass.assignment.unassigned.len();
                summary.alignment = Some(alignment_summary(&pass));
                succeed(&mut components, Component::Alignment);
                Some(pass)
            }
            Err(e) => {
                skip(
                    &mut components,
                    Component::Alignment,
                    reason::INVALID_INPUT,
                    e.to_string(),
                );
                None
            }
        },
    };
    let density_values: Option<Vec<f64>> = alignment
        .as_ref()
        .map(|a| a.density.iter().map(|d| d.density_sqft_per_acre).collect());

    // spatial
    let spatial_values = match settings.spatial_attribute {
        SpatialAttribute::GapIndex => alignment.as_ref().map(|a| a.report.gap.values.clone()),
        SpatialAttribute::Vulnerability => vuln_values.clone(),
        SpatialAttribute::Density => density_values,
    };
    match spatial_pass(compiled, spatial_values, progress_cb, started) {
        Ok((graph, report)) => {
            fill_spatial(&mut records, &graph, &report);
            summary.spatial = Some(spatial_summary(compiled, &graph, &report));
            succeed(&mut components, Component::Spatial);
        }
        Err((code, detail)) => skip(&mut components, Component::Spatial, code, detail),
    }

    // runoff
    emit(progress_cb, RunStage::ModelingRunoff, started, "Modeling runoff");
    match (&vulnerability, &alignment) {
        (Some(scores), Some(pass)) => {
            let params = &settings.runoff.curve_number;
            let inputs: Vec<RunoffSegment> = scores
                .iter()
                .zip(&pass.density)
                .zip(&pass.report.gap.values)
                .zip(&compiled.areas_acres)
                .map(|(((score, density), &gap_index), &area_acres)| RunoffSegment {
                    area_acres,
                    cn_current: params
                        .composite_cn(score.soil_group, score.factors.imperviousness * 100.0),
                    density_sqft_per_acre: density.density_sqft_per_acre,
                    gap_index,
                })
                .collect();
            match run_scenarios(&inputs, &settings.runoff) {
                Ok(report) => {
                    fill_runoff(&mut records, &report);
                    summary.runoff = Some(runoff_summary(&report));
                    succeed(&mut components, Component::Runoff);
                }
                Err(e) => {
                    skip(&mut components, Component::Runoff, reason::INVALID_INPUT, e.to_string())
                }
            }
        }
        _ => skip(
            &mut components,
            Component::Runoff,
            reason::UPSTREAM_UNAVAILABLE,
            "vulnerability or density unavailable".to_string(),
        ),
    }

    let succeeded = components.iter().filter(|c| c.status.succeeded()).count();
    info!(
        project = %compiled.name,
        segments = n,
        succeeded,
        skipped = components.len() - succeeded,
        "analysis complete"
    );

    AnalysisOutput {
        records,
        summary,
        components,
    }
}

fn alignment_pass(
    compiled: &CompiledProject,
    vulnerability: &[f64],
) -> IndexResult<AlignmentPass> {
    let assignment = assign_facilities(&compiled.polygons, &compiled.facilities)?;
    let density = compute_density(&compiled.areas_acres, &compiled.facilities, &assignment)?;
    let density_values: Vec<f64> = density.iter().map(|d| d.density_sqft_per_acre).collect();
    let report = analyze_alignment(vulnerability, &density_values, &compiled.settings.alignment)?;
    Ok(AlignmentPass {
        assignment,
        density,
        report,
    })
}

/// Graph construction and statistics, or the skip reason and detail.
fn spatial_pass(
    compiled: &CompiledProject,
    values: Option<Vec<f64>>,
    progress_cb: &mut ProgressCallback<'_>,
    started: Instant,
) -> Result<(NeighborGraph, SpatialReport), (&'static str, String)> {
    let settings = &compiled.settings;
    let n = compiled.len();
    if n < MIN_SEGMENTS {
        return Err((
            reason::TOO_FEW_SEGMENTS,
            format!("{n} segments, at least {MIN_SEGMENTS} required"),
        ));
    }
    let values = values.ok_or_else(|| {
        (
            reason::UPSTREAM_UNAVAILABLE,
            format!("{} unavailable", settings.spatial_attribute.as_str()),
        )
    })?;

    emit(progress_cb, RunStage::BuildingNeighborGraph, started, "Building neighbor graph");
    let (graph, hotspot_graph) =
        build_graphs(compiled, &settings.neighbors, settings.spatial.hotspot_neighbors)
            .map_err(|e| (reason::GRAPH_CONSTRUCTION, e.to_string()))?;

    emit(
        progress_cb,
        RunStage::ComputingSpatialStatistics,
        started,
        "Computing spatial statistics",
    );
    let report = sg_spatial::analyze(&graph, hotspot_graph.as_ref(), &values, &settings.spatial)
        .map_err(|e| (reason::INVALID_INPUT, e.to_string()))?;
    Ok((graph, report))
}

fn build_graph(
    compiled: &CompiledProject,
    policy: NeighborPolicy,
    neighbors: &NeighborSettings,
) -> sg_graph::GraphResult<NeighborGraph> {
    let mut builder = NeighborGraphBuilder::new(policy)
        .with_knn_fallback(neighbors.knn_fallback)
        .with_snap_tolerance(neighbors.snap_tolerance);
    for polygon in &compiled.polygons {
        builder.add_segment(polygon.clone());
    }
    builder.build()
}

fn build_graphs(
    compiled: &CompiledProject,
    neighbors: &NeighborSettings,
    hotspot_policy: Option<NeighborPolicy>,
) -> sg_graph::GraphResult<(NeighborGraph, Option<NeighborGraph>)> {
    let graph = build_graph(compiled, neighbors.policy, neighbors)?;
    let hotspot_graph = match hotspot_policy {
        Some(policy) if policy != neighbors.policy => {
            Some(build_graph(compiled, policy, neighbors)?)
        }
        _ => None,
    };
    Ok((graph, hotspot_graph))
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn fill_vulnerability(
    records: &mut [SegmentRecord],
    compiled: &CompiledProject,
    scores: &[VulnerabilityScore],
) {
    for ((record, raw), score) in records.iter_mut().zip(&compiled.attributes).zip(scores) {
        record.imperviousness_pct = finite(raw.imperviousness_pct);
        record.slope_pct = finite(raw.slope_pct);
        record.soil_group = Some(score.soil_group.as_str().to_string());
        record.flood_zone = raw.flood_zone;
        record.drainage_distance_ft = finite(raw.drainage_distance_ft);
        record.vuln_mean = Some(score.score);
        record.vuln_class = Some(score.class.as_str().to_string());
        record.defaults_applied = score
            .defaults_applied
            .iter()
            .map(|d| d.as_str().to_string())
            .collect();
    }
}

fn fill_alignment(records: &mut [SegmentRecord], pass: &AlignmentPass) {
    let rows = records
        .iter_mut()
        .zip(&pass.density)
        .zip(&pass.report.quadrants.labels)
        .zip(&pass.report.gap.values);
    for (((record, density), quadrant), &gap) in rows {
        record.facility_count = Some(density.facility_count);
        record.infrastructure_sqft = Some(density.infrastructure_sqft);
        record.density_sqft_per_acre = Some(density.density_sqft_per_acre);
        record.quadrant = Some(quadrant.as_str().to_string());
        record.gap_index = Some(gap);
    }
}

fn fill_spatial(records: &mut [SegmentRecord], graph: &NeighborGraph, report: &SpatialReport) {
    for (i, record) in records.iter_mut().enumerate() {
        record.knn_fallback = graph.used_fallback(SegmentId::from_index(i as u32));
    }
    if let Some(locals) = report.local.defined() {
        for (record, local) in records.iter_mut().zip(locals) {
            record.morans_i_local = Some(local.local_i);
            record.lisa_z = Some(local.z);
            record.lisa_p = Some(local.p_value);
            record.lisa_cluster = Some(local.cluster.label().to_string());
        }
    }
    if let Some(hotspots) = report.hotspots.defined() {
        for (record, gi) in records.iter_mut().zip(hotspots) {
            record.gi_star = gi.z;
            record.gi_p = gi.p_value;
            record.hotspot_class = Some(gi.class.label().to_string());
        }
    }
}

fn fill_runoff(records: &mut [SegmentRecord], report: &RunoffReport) {
    for (i, record) in records.iter_mut().enumerate() {
        record.cn_current = report.cn_current.get(i).copied();
        if let Some(adj) = report.cn_with_gsi.get(i) {
            record.cn_with_gsi = Some(adj.cn);
            record.cn_at_floor = Some(adj.at_floor);
        }
        for storm in &report.storms {
            for outcome in &storm.scenarios {
                if let Some(seg) = outcome.segments.get(i) {
                    record.runoff.push(RunoffCell {
                        storm: storm.storm.label.clone(),
                        scenario: outcome.scenario.as_str().to_string(),
                        density_sqft_per_acre: seg.density_sqft_per_acre,
                        cn: seg.cn,
                        depth_in: seg.depth_in,
                        volume_acft: seg.volume_acft,
                    });
                }
            }
        }
    }
}

fn vulnerability_summary(scores: &[VulnerabilityScore]) -> VulnerabilitySummary {
    let values: Vec<f64> = scores.iter().map(|s| s.score).collect();
    let mut class_counts = BTreeMap::new();
    for s in scores {
        *class_counts.entry(s.class.as_str().to_string()).or_insert(0) += 1;
    }
    VulnerabilitySummary {
        mean: stats::mean(&values).unwrap_or(0.0),
        median: stats::median(&values).unwrap_or(0.0),
        std_dev: stats::population_std(&values),
        min: stats::min(&values).unwrap_or(0.0),
        max: stats::max(&values).unwrap_or(0.0),
        class_counts,
        defaulted_segments: scores
            .iter()
            .filter(|s| !s.defaults_applied.is_empty())
            .count(),
    }
}

fn correlation_summary(c: &Correlation) -> CorrelationSummary {
    match c {
        Correlation::Defined(s) => CorrelationSummary {
            coefficient: Some(s.coefficient),
            p_value: Some(s.p_value),
            strength: Some(s.strength.as_str().to_string()),
            direction: Some(s.direction.as_str().to_string()),
            significant: Some(s.significant),
            undefined_reason: None,
        },
        Correlation::Undefined(r) => CorrelationSummary {
            undefined_reason: Some(r.code().to_string()),
            ..CorrelationSummary::default()
        },
    }
}

fn alignment_summary(pass: &AlignmentPass) -> AlignmentSummary {
    let density: Vec<f64> = pass.density.iter().map(|d| d.density_sqft_per_acre).collect();
    let quadrants = &pass.report.quadrants;
    let quadrant_counts = Quadrant::ALL
        .iter()
        .map(|&q| (q.as_str().to_string(), quadrants.count(q)))
        .collect();
    AlignmentSummary {
        mean_density: stats::mean(&density).unwrap_or(0.0),
        median_density: quadrants.median_density,
        min_density: stats::min(&density).unwrap_or(0.0),
        max_density: pass.report.gap.max_density,
        zero_infrastructure_count: pass.density.iter().filter(|d| d.facility_count == 0).count(),
        median_vulnerability: quadrants.median_vulnerability,
        quadrant_counts,
        mean_gap: pass.report.gap.mean_gap,
        high_gap_count: pass.report.gap.high_gap_count,
        pearson: correlation_summary(&pass.report.correlation.pearson),
        spearman: correlation_summary(&pass.report.correlation.spearman),
    }
}

fn global_summary(global: &Outcome<GlobalMoran>) -> GlobalMoranSummary {
    match global {
        Outcome::Defined(g) => GlobalMoranSummary {
            i: Some(g.i),
            expected: Some(g.expected),
            z_score: Some(g.z_score()),
            p_value: Some(g.p_value()),
            z_randomization: g.z_randomization,
            p_randomization: g.p_randomization,
            p_permutation: g.permutation_p,
            interpretation: Some(g.interpretation.as_str().to_string()),
            undefined_reason: None,
        },
        Outcome::Undefined(r) => GlobalMoranSummary {
            undefined_reason: Some(r.code().to_string()),
            ..GlobalMoranSummary::default()
        },
    }
}

fn spatial_summary(
    compiled: &CompiledProject,
    graph: &NeighborGraph,
    report: &SpatialReport,
) -> SpatialSummary {
    let to_owned = |counts: BTreeMap<&'static str, usize>| -> BTreeMap<String, usize> {
        counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    };
    SpatialSummary {
        attribute: compiled.settings.spatial_attribute.as_str().to_string(),
        global: global_summary(&report.global),
        permutations: report.permutations,
        lisa_inference: match compiled.settings.spatial.lisa_inference {
            LisaInference::Permutation => "permutation",
            LisaInference::Normal => "normal",
        }
        .to_string(),
        cluster_counts: to_owned(report.cluster_counts()),
        hotspot_counts: to_owned(report.hotspot_counts()),
        fallback_segments: graph
            .fallback_segments()
            .into_iter()
            .filter_map(|id| compiled.segment_ids.get(id.pos()).cloned())
            .collect(),
    }
}

fn runoff_summary(report: &RunoffReport) -> RunoffSummary {
    let with_gsi: Vec<f64> = report.cn_with_gsi.iter().map(|a| a.cn).collect();
    RunoffSummary {
        mean_cn_current: stats::mean(&report.cn_current).unwrap_or(0.0),
        mean_cn_with_gsi: stats::mean(&with_gsi).unwrap_or(0.0),
        floor_segments: report.floor_segments,
        storms: report
            .storms
            .iter()
            .map(|s| StormSummary {
                label: s.storm.label.clone(),
                depth_in: s.storm.depth_in,
                no_infrastructure_volume_acft: s.no_infrastructure_volume_acft,
                existing_benefit_acft: s.existing_benefit_acft,
                scenarios: s
                    .scenarios
                    .iter()
                    .map(|o| ScenarioSummary {
                        scenario: o.scenario.as_str().to_string(),
                        plan: o.plan.as_str().to_string(),
                        not_applicable: o.not_applicable.map(|na| na.code().to_string()),
                        total_volume_acft: o.total_volume_acft,
                        reduction_acft: o.reduction_acft,
                        reduction_pct: o.reduction_pct,
                    })
                    .collect(),
            })
            .collect(),
    }
}
