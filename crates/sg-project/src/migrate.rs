//! Schema migration framework.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 files stored soil groups in lower case.
fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    for segment in &mut project.segments {
        if let Some(group) = segment.attributes.soil_group.as_mut() {
            *group = group.trim().to_ascii_uppercase();
        }
    }
    project.version = 1;
    Ok(project)
}
