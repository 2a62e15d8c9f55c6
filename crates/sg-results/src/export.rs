//! Flat CSV export of the segment table.
//!
//! One row per segment; runoff cells become `runoff_<storm>_<scenario>`
//! columns in the order of the first record that carries runoff.

use crate::types::SegmentRecord;

pub const CSV_HEADER: &[&str] = &[
    "segment_id",
    "area_acres",
    "imperviousness_pct",
    "slope_pct",
    "soil_group",
    "flood_zone",
    "drainage_distance_ft",
    "vuln_mean",
    "vuln_class",
    "defaults_applied",
    "facility_count",
    "infrastructure_sqft",
    "density_sqft_per_acre",
    "quadrant",
    "gap_index",
    "morans_i_local",
    "lisa_z",
    "lisa_p",
    "lisa_cluster",
    "gi_star",
    "gi_p",
    "hotspot_class",
    "knn_fallback",
    "cn_current",
    "cn_with_gsi",
    "cn_at_floor",
];

fn num(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Quote a field when it contains a delimiter, quote or newline.
fn field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn runoff_columns(records: &[SegmentRecord]) -> Vec<(String, String)> {
    records
        .iter()
        .find(|r| !r.runoff.is_empty())
        .map(|r| {
            r.runoff
                .iter()
                .map(|c| (c.storm.clone(), c.scenario.clone()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn segments_to_csv(records: &[SegmentRecord]) -> String {
    let runoff = runoff_columns(records);

    let mut header: Vec<String> = CSV_HEADER.iter().map(|h| h.to_string()).collect();
    header.extend(
        runoff
            .iter()
            .map(|(storm, scenario)| field(&format!("runoff_{storm}_{scenario}"))),
    );

    let mut csv = header.join(",");
    csv.push('\n');

    for r in records {
        let mut row = vec![
            field(&r.segment_id),
            r.area_acres.to_string(),
            num(r.imperviousness_pct),
            num(r.slope_pct),
            field(r.soil_group.as_deref().unwrap_or("")),
            opt(r.flood_zone),
            num(r.drainage_distance_ft),
            num(r.vuln_mean),
            field(r.vuln_class.as_deref().unwrap_or("")),
            field(&r.defaults_applied.join(";")),
            opt(r.facility_count),
            num(r.infrastructure_sqft),
            num(r.density_sqft_per_acre),
            field(r.quadrant.as_deref().unwrap_or("")),
            num(r.gap_index),
            num(r.morans_i_local),
            num(r.lisa_z),
            num(r.lisa_p),
            field(r.lisa_cluster.as_deref().unwrap_or("")),
            num(r.gi_star),
            num(r.gi_p),
            field(r.hotspot_class.as_deref().unwrap_or("")),
            r.knn_fallback.to_string(),
            num(r.cn_current),
            num(r.cn_with_gsi),
            opt(r.cn_at_floor),
        ];
        row.extend(runoff.iter().map(|(storm, scenario)| {
            num(r.runoff_cell(storm, scenario).map(|c| c.volume_acft))
        }));
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}
