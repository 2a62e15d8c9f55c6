use std::path::PathBuf;

#[test]
fn demos_load_and_validate() {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root");

    let path = root.join("demos/corridor.yaml");
    let project = sg_project::load_yaml(&path)
        .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e));

    assert_eq!(project.segments.len(), 12);
    assert_eq!(project.facilities.len(), 6);
    assert_eq!(project.config.spatial.seed, 2024);
    assert!(
        project.segments[11]
            .attributes
            .drainage_distance_ft
            .is_none()
    );
}
