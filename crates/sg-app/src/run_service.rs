//! Run execution and caching service.

use std::path::Path;
use std::time::Instant;

use sg_results::{RunManifest, RunStore, RunSummary, SegmentRecord};
use tracing::info;

use crate::error::AppResult;
use crate::pipeline::{ENGINE_VERSION, run_analysis_with_progress};
use crate::progress::{ProgressCallback, RunStage, emit};
use crate::project_service;
use crate::runtime_compile::compile_project;

/// Options for running an analysis.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub engine_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub analysis_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: ProgressCallback<'_>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit(&mut progress_cb, RunStage::LoadingProject, started, "Loading project");
    let project = project_service::load_project(request.project_path)?;

    emit(&mut progress_cb, RunStage::CheckingCache, started, "Checking run cache");
    let run_id = sg_results::compute_run_id(&project, &request.options.engine_version)?;
    let store = RunStore::for_project(request.project_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            "Loading cached run",
        );
        let load_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.total_time_s = started.elapsed().as_secs_f64();
        emit(&mut progress_cb, RunStage::Completed, started, "Loaded cached run");
        info!(run_id = %run_id, "run loaded from cache");
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            timing,
        });
    }

    emit(&mut progress_cb, RunStage::CompilingProject, started, "Compiling project");
    let compile_started = Instant::now();
    let compiled = compile_project(&project)?;
    timing.compile_time_s = compile_started.elapsed().as_secs_f64();

    let analysis_started = Instant::now();
    let output = run_analysis_with_progress(&compiled, &mut progress_cb, started);
    timing.analysis_time_s = analysis_started.elapsed().as_secs_f64();

    let manifest = RunManifest::new(
        run_id.clone(),
        project.name.clone(),
        request.options.engine_version.clone(),
        compiled.len(),
        output.components.clone(),
    );

    emit(&mut progress_cb, RunStage::SavingResults, started, "Saving run output");
    let save_started = Instant::now();
    store.save_run(&manifest, &output.summary, &output.records)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();

    timing.total_time_s = started.elapsed().as_secs_f64();
    emit(&mut progress_cb, RunStage::Completed, started, "Run completed");
    info!(run_id = %run_id, total_s = timing.total_time_s, "run saved");

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}

/// Runs of the project at `project_path`, most recent first.
pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let project = project_service::load_project(project_path)?;
    let store = RunStore::for_project(project_path)?;

    let mut runs = store.list_runs(&project.name)?;
    runs.reverse();
    Ok(runs)
}

/// A stored run: manifest, summary and the segment table.
pub fn load_run(
    project_path: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, RunSummary, Vec<SegmentRecord>)> {
    let store = RunStore::for_project(project_path)?;

    let manifest = store.load_manifest(run_id)?;
    let summary = store.load_summary(run_id)?;
    let records = store.load_segments(run_id)?;

    Ok((manifest, summary, records))
}

/// Resolve a run id prefix (as printed by `runs`) to the full id.
pub fn resolve_run_id(project_path: &Path, prefix: &str) -> AppResult<String> {
    let matches: Vec<String> = list_runs(project_path)?
        .into_iter()
        .map(|m| m.run_id)
        .filter(|id| id.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err(crate::AppError::RunNotFound(prefix.to_string())),
        _ => Err(crate::AppError::InvalidInput(format!(
            "run id prefix '{prefix}' is ambiguous ({} runs)",
            matches.len()
        ))),
    }
}

