#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingProject,
    CheckingCache,
    LoadingCachedResult,
    CompilingProject,
    ScoringVulnerability,
    ClassifyingAlignment,
    BuildingNeighborGraph,
    ComputingSpatialStatistics,
    ModelingRunoff,
    SavingResults,
    Completed,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
        }
    }
}

/// Optional sink for progress events.
pub type ProgressCallback<'a> = Option<&'a mut dyn FnMut(RunProgressEvent)>;

pub(crate) fn emit(
    progress_cb: &mut ProgressCallback<'_>,
    stage: RunStage,
    started: std::time::Instant,
    message: &str,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            Some(message.to_string()),
        ));
    }
}
