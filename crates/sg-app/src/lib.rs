//! Shared application service layer for stormgap.
//!
//! Centralizes project loading, compilation into runtime inputs, the
//! analysis pipeline, run caching and result queries so the CLI stays thin.

pub mod error;
pub mod pipeline;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod run_service;
pub mod runtime_compile;

// Re-export key types for convenience
pub use error::{AppError, AppResult};
pub use pipeline::{AnalysisOutput, ENGINE_VERSION, analyze_project, reason, run_analysis};
pub use progress::{ProgressCallback, RunProgressEvent, RunStage};
pub use project_service::{
    ProjectSummary, load_project, save_project, summarize_project, validate_project,
};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
    list_runs, load_run, resolve_run_id,
};
pub use runtime_compile::{
    AnalysisSettings, CompiledProject, NeighborSettings, SpatialAttribute, compile_project,
    compile_settings,
};
