use std::path::PathBuf;

use sg_app::{
    RunOptions, RunProgressEvent, RunRequest, RunStage, ensure_run, ensure_run_with_progress,
    list_runs, load_run, query, resolve_run_id,
};

/// Copy the demo project into a fresh directory so runs land in a temp store.
fn demo_in(dir_name: &str) -> PathBuf {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf();
    let dir = std::env::temp_dir().join(dir_name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("corridor.yaml");
    std::fs::copy(root.join("demos/corridor.yaml"), &path).unwrap();
    path
}

#[test]
fn run_persists_and_is_cached() {
    let project_path = demo_in("sg_app_run_cache");

    let first = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions::default(),
    })
    .expect("first run");
    assert!(!first.loaded_from_cache);

    let second = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions::default(),
    })
    .expect("second run");
    assert!(second.loaded_from_cache);
    assert_eq!(first.run_id, second.run_id);

    let forced = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    })
    .expect("forced run");
    assert!(!forced.loaded_from_cache);
    assert_eq!(forced.run_id, first.run_id);

    let runs = list_runs(&project_path).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].project_name, "Harbor Corridor");

    let (manifest, summary, records) = load_run(&project_path, &first.run_id).unwrap();
    assert_eq!(manifest.segment_count, 12);
    assert_eq!(records.len(), 12);
    assert!(summary.runoff.is_some());

    let table = query::scenario_table(&summary, "25-year").unwrap();
    assert_eq!(table.len(), 4);
    let gaps = query::top_segments(&records, "gap_index", 3).unwrap();
    assert_eq!(gaps.len(), 3);
    assert!(gaps[0].1 >= gaps[2].1);

    assert_eq!(
        resolve_run_id(&project_path, &first.run_id[..8]).unwrap(),
        first.run_id
    );
}

#[test]
fn different_engine_version_is_a_new_run() {
    let project_path = demo_in("sg_app_run_versions");
    let a = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions::default(),
    })
    .unwrap();
    let b = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions {
            engine_version: "test-next".to_string(),
            ..RunOptions::default()
        },
    })
    .unwrap();
    assert_ne!(a.run_id, b.run_id);
    assert_eq!(list_runs(&project_path).unwrap().len(), 2);
    assert!(resolve_run_id(&project_path, "").is_err());
}

#[test]
fn progress_stages_are_reported() {
    let project_path = demo_in("sg_app_run_progress");
    let mut events: Vec<RunProgressEvent> = Vec::new();
    let response = ensure_run_with_progress(
        &RunRequest {
            project_path: &project_path,
            options: RunOptions::default(),
        },
        Some(&mut |event: RunProgressEvent| events.push(event)),
    )
    .expect("run with progress");

    assert!(!response.loaded_from_cache);
    let stages: Vec<RunStage> = events.iter().map(|e| e.stage).collect();
    for expected in [
        RunStage::LoadingProject,
        RunStage::CompilingProject,
        RunStage::ScoringVulnerability,
        RunStage::ClassifyingAlignment,
        RunStage::BuildingNeighborGraph,
        RunStage::ComputingSpatialStatistics,
        RunStage::ModelingRunoff,
        RunStage::SavingResults,
        RunStage::Completed,
    ] {
        assert!(stages.contains(&expected), "missing stage {:?}", expected);
    }
    assert!(events.windows(2).all(|w| w[0].elapsed_wall_s <= w[1].elapsed_wall_s));
    assert!(response.timing.total_time_s >= response.timing.analysis_time_s);
}
