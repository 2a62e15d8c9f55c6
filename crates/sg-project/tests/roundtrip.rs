use sg_project::schema::*;
use sg_project::{load_json, load_project, load_yaml, save_json, save_yaml, validate_project};

fn square(x: f64, y: f64) -> PolygonDef {
    PolygonDef {
        exterior: vec![[x, y], [x + 100.0, y], [x + 100.0, y + 100.0], [x, y + 100.0]],
        holes: vec![],
    }
}

fn small_project() -> Project {
    Project {
        version: 1,
        name: "Three Blocks".to_string(),
        config: AnalysisConfigDef::default(),
        segments: (0..3)
            .map(|i| SegmentDef {
                id: format!("blk-{i}"),
                geometry: square(100.0 * i as f64, 0.0),
                area_acres: 0.23,
                attributes: AttributesDef {
                    imperviousness_pct: Some(40.0 + 10.0 * i as f64),
                    slope_pct: Some(2.0),
                    soil_group: Some("C".to_string()),
                    flood_zone: Some(i == 0),
                    drainage_distance_ft: None,
                },
            })
            .collect(),
        facilities: vec![
            FacilityDef {
                id: "swale".to_string(),
                geometry: GeometryDef::LineString {
                    coordinates: vec![[10.0, 50.0], [90.0, 50.0]],
                },
                area_sqft: 800.0,
                kind: Some("bioswale".to_string()),
                segment_id: None,
            },
            FacilityDef {
                id: "basin".to_string(),
                geometry: GeometryDef::Point {
                    coordinates: [250.0, 50.0],
                },
                area_sqft: 1500.0,
                kind: None,
                segment_id: Some("blk-2".to_string()),
            },
        ],
    }
}

#[test]
fn roundtrip_yaml_small_project() {
    let project = small_project();
    validate_project(&project).unwrap();

    let path = std::env::temp_dir().join("sg_project_roundtrip_small.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_json_with_distance_band() {
    let mut project = small_project();
    project.config.neighbors.policy = NeighborPolicyDef::DistanceBand {
        threshold: 250.0,
        inverse_distance_power: Some(1.0),
    };
    project.config.spatial.lisa_inference = LisaInferenceDef::Normal;
    project.config.spatial.hotspot_neighbors = Some(NeighborPolicyDef::Rook);

    let path = std::env::temp_dir().join("sg_project_roundtrip_band.json");
    save_json(&path, &project).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn minimal_yaml_takes_defaults() {
    let yaml = r#"
version: 1
name: Minimal
segments:
  - id: a
    geometry:
      exterior: [[0, 0], [1, 0], [1, 1], [0, 1]]
    area_acres: 1.0
"#;
    let project: Project = serde_yaml::from_str(yaml).unwrap();
    validate_project(&project).unwrap();
    assert_eq!(project.config, AnalysisConfigDef::default());
    assert_eq!(project.config.runoff.storms.len(), 6);
    assert_eq!(project.config.spatial.attribute, SpatialAttributeDef::GapIndex);
    assert!(project.segments[0].attributes.soil_group.is_none());
}

#[test]
fn invalid_project_is_not_saved() {
    let mut project = small_project();
    project.facilities[1].segment_id = Some("nowhere".to_string());
    let path = std::env::temp_dir().join("sg_project_invalid.yaml");
    let _ = std::fs::remove_file(&path);
    assert!(save_yaml(&path, &project).is_err());
    assert!(!path.exists());
}

#[test]
fn unknown_extension_rejected() {
    let path = std::env::temp_dir().join("sg_project.toml");
    assert!(matches!(
        load_project(&path),
        Err(sg_project::ProjectError::UnknownFormat { .. })
    ));
}

#[test]
fn hotspot_distance_band_is_opt_in() {
    assert_eq!(SpatialDef::default().hotspot_neighbors, None);

    let spatial: SpatialDef = serde_yaml::from_str(
        "hotspot_neighbors:\n  type: DistanceBand\n  threshold: 15840\n  inverse_distance_power: 1\n",
    )
    .unwrap();
    assert_eq!(
        spatial.hotspot_neighbors,
        Some(NeighborPolicyDef::DistanceBand {
            threshold: 15840.0,
            inverse_distance_power: Some(1.0),
        })
    );

    let mut project = small_project();
    project.config.spatial = spatial;
    validate_project(&project).unwrap();
}
