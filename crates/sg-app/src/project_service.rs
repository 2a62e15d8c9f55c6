//! Project loading, saving, validation, and introspection.

use std::path::Path;

use sg_project::schema::Project;

use crate::error::{AppError, AppResult};

/// Headline numbers of a project for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub name: String,
    pub version: u32,
    pub segment_count: usize,
    pub facility_count: usize,
    pub preassigned_facilities: usize,
    pub total_area_acres: f64,
    pub storm_labels: Vec<String>,
    /// Segments with at least one attribute left for defaulting.
    pub incomplete_segments: usize,
}

/// Load, migrate and validate a project file (YAML or JSON by extension).
pub fn load_project(path: &Path) -> AppResult<Project> {
    if !path.exists() {
        return Err(AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(sg_project::load_project(path)?)
}

pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    Ok(sg_project::save_project(path, project)?)
}

pub fn validate_project(project: &Project) -> AppResult<()> {
    Ok(sg_project::validate_project(project)?)
}

pub fn summarize_project(project: &Project) -> ProjectSummary {
    let incomplete_segments = project
        .segments
        .iter()
        .filter(|s| {
            let a = &s.attributes;
            a.imperviousness_pct.is_none_or(|v| !v.is_finite())
                || a.slope_pct.is_none_or(|v| !v.is_finite())
                || a.soil_group.is_none()
                || a.flood_zone.is_none()
                || a.drainage_distance_ft.is_none_or(|v| !v.is_finite())
        })
        .count();

    ProjectSummary {
        name: project.name.clone(),
        version: project.version,
        segment_count: project.segments.len(),
        facility_count: project.facilities.len(),
        preassigned_facilities: project
            .facilities
            .iter()
            .filter(|f| f.segment_id.is_some())
            .count(),
        total_area_acres: project.segments.iter().map(|s| s.area_acres).sum(),
        storm_labels: project
            .config
            .runoff
            .storms
            .iter()
            .map(|s| s.label.clone())
            .collect(),
        incomplete_segments,
    }
}
