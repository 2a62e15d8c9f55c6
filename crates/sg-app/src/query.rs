//! Query helpers for extracting data from loaded runs.

use sg_results::{ScenarioSummary, SegmentRecord, RunSummary};

use crate::error::{AppError, AppResult};

/// Numeric per-segment columns addressable by name.
pub const NUMERIC_COLUMNS: &[&str] = &[
    "vuln_mean",
    "density_sqft_per_acre",
    "infrastructure_sqft",
    "gap_index",
    "morans_i_local",
    "lisa_p",
    "gi_star",
    "cn_current",
    "cn_with_gsi",
];

fn column_value(record: &SegmentRecord, column: &str) -> AppResult<Option<f64>> {
    let v = match column {
        "vuln_mean" | "vulnerability" => record.vuln_mean,
        "density_sqft_per_acre" | "density" => record.density_sqft_per_acre,
        "infrastructure_sqft" => record.infrastructure_sqft,
        "gap_index" | "gap" => record.gap_index,
        "morans_i_local" => record.morans_i_local,
        "lisa_p" => record.lisa_p,
        "gi_star" => record.gi_star,
        "cn_current" => record.cn_current,
        "cn_with_gsi" => record.cn_with_gsi,
        _ => {
            return Err(AppError::InvalidInput(format!(
                "Unknown column: {} (expected one of {})",
                column,
                NUMERIC_COLUMNS.join(", ")
            )));
        }
    };
    Ok(v)
}

pub fn find_segment<'a>(
    records: &'a [SegmentRecord],
    segment_id: &str,
) -> AppResult<&'a SegmentRecord> {
    records
        .iter()
        .find(|r| r.segment_id == segment_id)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown segment: {}", segment_id)))
}

/// `(segment_id, value)` for every segment where the column is present.
pub fn extract_column(records: &[SegmentRecord], column: &str) -> AppResult<Vec<(String, f64)>> {
    let mut series = Vec::with_capacity(records.len());
    for record in records {
        if let Some(v) = column_value(record, column)? {
            series.push((record.segment_id.clone(), v));
        }
    }
    Ok(series)
}

/// The `k` segments with the largest values of a column, ties in segment order.
pub fn top_segments(
    records: &[SegmentRecord],
    column: &str,
    k: usize,
) -> AppResult<Vec<(String, f64)>> {
    let mut series = extract_column(records, column)?;
    series.sort_by(|a, b| b.1.total_cmp(&a.1));
    series.truncate(k);
    Ok(series)
}

pub fn segments_in_quadrant<'a>(records: &'a [SegmentRecord], quadrant: &str) -> Vec<&'a str> {
    records
        .iter()
        .filter(|r| r.quadrant.as_deref() == Some(quadrant))
        .map(|r| r.segment_id.as_str())
        .collect()
}

/// Scenario rows of one storm.
pub fn scenario_table<'a>(
    summary: &'a RunSummary,
    storm: &str,
) -> AppResult<&'a [ScenarioSummary]> {
    let runoff = summary
        .runoff
        .as_ref()
        .ok_or_else(|| AppError::InvalidInput("Run has no runoff results".to_string()))?;
    runoff
        .storms
        .iter()
        .find(|s| s.label == storm)
        .map(|s| s.scenarios.as_slice())
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown storm: {}", storm)))
}
