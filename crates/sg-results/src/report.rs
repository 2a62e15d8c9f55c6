//! Plain-text summary report of a stored run.

use std::fmt::Write;

use crate::types::{
    Component, ComponentStatus, CorrelationSummary, RunManifest, RunSummary,
};

const RULE: &str = "----------------------------------------------------------------------";
const DOUBLE_RULE: &str = "======================================================================";

fn fmt_opt(v: Option<f64>, prec: usize) -> String {
    match v {
        Some(x) => format!("{x:.prec$}"),
        None => "n/a".to_string(),
    }
}

fn correlation_line(out: &mut String, label: &str, c: &CorrelationSummary) {
    match (c.coefficient, &c.undefined_reason) {
        (Some(r), _) => {
            let _ = writeln!(
                out,
                "{label}: r = {r:.3}, p = {} ({} {})",
                fmt_opt(c.p_value, 4),
                c.strength.as_deref().unwrap_or(""),
                c.direction.as_deref().unwrap_or(""),
            );
        }
        (None, Some(reason)) => {
            let _ = writeln!(out, "{label}: undefined ({reason})");
        }
        (None, None) => {
            let _ = writeln!(out, "{label}: n/a");
        }
    }
}

pub fn render_report(manifest: &RunManifest, summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{DOUBLE_RULE}");
    let _ = writeln!(out, "CORRIDOR ANALYSIS SUMMARY: {}", manifest.project_name);
    let _ = writeln!(out, "run {} ({})", manifest.run_id, manifest.timestamp);
    let _ = writeln!(out, "{DOUBLE_RULE}\n");

    let _ = writeln!(out, "STUDY AREA\n{RULE}");
    let _ = writeln!(out, "Number of segments: {}", summary.segment_count);
    let _ = writeln!(out, "Total area: {:.0} acres", summary.total_area_acres);
    let _ = writeln!(
        out,
        "Facilities: {} ({} unassigned)\n",
        summary.facility_count, summary.unassigned_facilities
    );

    let _ = writeln!(out, "COMPONENTS\n{RULE}");
    for component in Component::ALL {
        let status = match manifest.status(component) {
            Some(ComponentStatus::Succeeded) => "succeeded".to_string(),
            Some(ComponentStatus::Skipped { reason, detail }) => {
                format!("skipped [{reason}] {detail}")
            }
            None => "not run".to_string(),
        };
        let _ = writeln!(out, "  {}: {status}", component.as_str());
    }
    out.push('\n');

    if let Some(v) = &summary.vulnerability {
        let _ = writeln!(out, "VULNERABILITY ASSESSMENT\n{RULE}");
        let _ = writeln!(out, "Mean vulnerability: {:.2}", v.mean);
        let _ = writeln!(out, "Median: {:.2}", v.median);
        let _ = writeln!(out, "Std dev: {}", fmt_opt(v.std_dev, 2));
        let _ = writeln!(out, "Range: {:.2} - {:.2}", v.min, v.max);
        let _ = writeln!(out, "Segments with defaulted inputs: {}", v.defaulted_segments);
        let _ = writeln!(out, "\nClassification:");
        for (class, count) in &v.class_counts {
            let _ = writeln!(out, "  {class}: {count}");
        }
        out.push('\n');
    }

    if let Some(a) = &summary.alignment {
        let _ = writeln!(out, "INFRASTRUCTURE DENSITY\n{RULE}");
        let _ = writeln!(out, "Mean density: {:.1} sq ft/acre", a.mean_density);
        let _ = writeln!(out, "Median density: {:.1} sq ft/acre", a.median_density);
        let _ = writeln!(
            out,
            "Range: {:.1} - {:.1} sq ft/acre",
            a.min_density, a.max_density
        );
        let _ = writeln!(
            out,
            "Segments with zero infrastructure: {}\n",
            a.zero_infrastructure_count
        );

        let _ = writeln!(out, "ALIGNMENT ANALYSIS\n{RULE}");
        correlation_line(&mut out, "Pearson", &a.pearson);
        correlation_line(&mut out, "Spearman", &a.spearman);
        let _ = writeln!(
            out,
            "\nQuadrant distribution (split at the sample medians: vulnerability {:.2}, density {:.1}):",
            a.median_vulnerability, a.median_density
        );
        for (quadrant, count) in &a.quadrant_counts {
            let _ = writeln!(out, "  {quadrant}: {count}");
        }
        let _ = writeln!(out, "\nMean gap index: {:.2}", a.mean_gap);
        let _ = writeln!(out, "High gap segments (>5): {}\n", a.high_gap_count);
    }

    if let Some(s) = &summary.spatial {
        let _ = writeln!(out, "SPATIAL CLUSTERING ({})\n{RULE}", s.attribute);
        let g = &s.global;
        match (&g.undefined_reason, g.i) {
            (Some(reason), _) => {
                let _ = writeln!(out, "Global Moran's I: undefined ({reason})");
            }
            (None, i) => {
                let _ = writeln!(out, "Global Moran's I: {}", fmt_opt(i, 3));
                let _ = writeln!(out, "Z-score: {}", fmt_opt(g.z_score, 3));
                let _ = writeln!(out, "P-value: {}", fmt_opt(g.p_value, 4));
                if let Some(p) = g.p_permutation {
                    let _ = writeln!(out, "Permutation p-value: {p:.4}");
                }
                if let Some(text) = &g.interpretation {
                    let _ = writeln!(out, "Pattern: {text}");
                }
            }
        }
        let _ = writeln!(
            out,
            "\nLISA clusters ({} inference, {} permutations):",
            s.lisa_inference, s.permutations
        );
        for (label, count) in &s.cluster_counts {
            let _ = writeln!(out, "  {label}: {count}");
        }
        let _ = writeln!(out, "\nHot spots (Gi*):");
        for (label, count) in &s.hotspot_counts {
            let _ = writeln!(out, "  {label}: {count}");
        }
        if !s.fallback_segments.is_empty() {
            let _ = writeln!(
                out,
                "\nSegments using nearest-neighbor fallback: {}",
                s.fallback_segments.join(", ")
            );
        }
        out.push('\n');
    }

    if let Some(r) = &summary.runoff {
        let _ = writeln!(out, "RUNOFF REDUCTION MODELING\n{RULE}");
        let _ = writeln!(out, "Mean CN (current): {:.1}", r.mean_cn_current);
        let _ = writeln!(out, "Mean CN (with GSI): {:.1}", r.mean_cn_with_gsi);
        let _ = writeln!(out, "Segments at CN floor: {}", r.floor_segments);
        for storm in &r.storms {
            let _ = writeln!(out, "\n  {} ({:.2} in):", storm.label, storm.depth_in);
            let _ = writeln!(
                out,
                "    Without GSI: {:.1} ac-ft (existing GSI saves {:.1})",
                storm.no_infrastructure_volume_acft, storm.existing_benefit_acft
            );
            for s in &storm.scenarios {
                let note = match &s.not_applicable {
                    Some(code) => format!(" [not applicable: {code}]"),
                    None => String::new(),
                };
                let _ = writeln!(
                    out,
                    "    {:<15} {:>9.1} ac-ft  reduction {:>7.2} ({:>5.1}%) via {}{note}",
                    s.scenario, s.total_volume_acft, s.reduction_acft, s.reduction_pct, s.plan
                );
            }
        }
        out.push('\n');
    }

    out
}
