//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use sg_project::schema::Project;

use crate::ResultsResult;

/// SHA-256 over the canonical JSON of the project and the engine version.
///
/// The project name is part of the hash; renaming a project starts a new
/// cache line.
pub fn compute_run_id(project: &Project, engine_version: &str) -> ResultsResult<String> {
    let mut hasher = Sha256::new();

    let project_json = serde_json::to_string(project)?;
    hasher.update(project_json.as_bytes());
    hasher.update([0u8]);
    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_project::schema::*;

    fn project(name: &str) -> Project {
        Project {
            version: 1,
            name: name.to_string(),
            config: AnalysisConfigDef::default(),
            segments: vec![SegmentDef {
                id: "s1".to_string(),
                geometry: PolygonDef {
                    exterior: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
                    holes: vec![],
                },
                area_acres: 1.0,
                attributes: AttributesDef::default(),
            }],
            facilities: vec![],
        }
    }

    #[test]
    fn hash_stability() {
        let p = project("A");
        let hash1 = compute_run_id(&p, "v1").unwrap();
        let hash2 = compute_run_id(&p, "v1").unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let a = compute_run_id(&project("A"), "v1").unwrap();
        let b = compute_run_id(&project("B"), "v1").unwrap();
        let c = compute_run_id(&project("A"), "v2").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);

        let mut seeded = project("A");
        seeded.config.spatial.seed += 1;
        assert_ne!(a, compute_run_id(&seeded, "v1").unwrap());
    }
}
