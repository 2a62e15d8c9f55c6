//! Run storage API.
//!
//! Layout under the store root:
//!
//! ```text
//! <run_id>/manifest.json
//! <run_id>/summary.json
//! <run_id>/segments.jsonl
//! ```

use crate::types::{RunManifest, RunSummary, SegmentRecord};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "manifest.json";
const SUMMARY_FILE: &str = "summary.json";
const SEGMENTS_FILE: &str = "segments.jsonl";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store next to the project file: `<project dir>/.stormgap/runs`.
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        let runs_dir = project_dir.join(".stormgap").join("runs");
        Self::new(runs_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        let dir = self.run_dir(run_id);
        [MANIFEST_FILE, SUMMARY_FILE, SEGMENTS_FILE]
            .iter()
            .all(|f| dir.join(f).exists())
    }

    pub fn save_run(
        &self,
        manifest: &RunManifest,
        summary: &RunSummary,
        records: &[SegmentRecord],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        fs::write(
            run_dir.join(SUMMARY_FILE),
            serde_json::to_string_pretty(summary)?,
        )?;

        let mut segments_content = String::new();
        for record in records {
            segments_content.push_str(&serde_json::to_string(record)?);
            segments_content.push('\n');
        }
        fs::write(run_dir.join(SEGMENTS_FILE), segments_content)?;

        // manifest last: its presence marks a complete run
        fs::write(
            run_dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(manifest)?,
        )?;

        Ok(())
    }

    fn read_run_file(&self, run_id: &str, file: &str) -> ResultsResult<String> {
        let path = self.run_dir(run_id).join(file);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(fs::read_to_string(path)?)
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let content = self.read_run_file(run_id, MANIFEST_FILE)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_summary(&self, run_id: &str) -> ResultsResult<RunSummary> {
        let content = self.read_run_file(run_id, SUMMARY_FILE)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_segments(&self, run_id: &str) -> ResultsResult<Vec<SegmentRecord>> {
        let content = self.read_run_file(run_id, SEGMENTS_FILE)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(line)?);
            }
        }
        Ok(records)
    }

    /// Runs of one project, oldest first.
    pub fn list_runs(&self, project_name: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().to_string();
            if let Ok(manifest) = self.load_manifest(&run_id) {
                if manifest.project_name == project_name {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
