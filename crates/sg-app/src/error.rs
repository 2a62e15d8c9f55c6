//! Error types for the sg-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors behind one
/// interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Project compilation failed: {0}")]
    Compile(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sg-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<sg_project::ProjectError> for AppError {
    fn from(err: sg_project::ProjectError) -> Self {
        match err {
            sg_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<sg_project::ValidationError> for AppError {
    fn from(err: sg_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<sg_results::ResultsError> for AppError {
    fn from(err: sg_results::ResultsError) -> Self {
        match err {
            sg_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}

impl From<sg_graph::GraphError> for AppError {
    fn from(err: sg_graph::GraphError) -> Self {
        AppError::Compile(err.to_string())
    }
}
