//! Loading, unloading and element-addition tests.
//!
//! Tests verify:
//! - Layer records track registered elements one to one
//! - Unloading removes layers and systems declared only by that object
//! - Duplicate element names across objects get distinct layer names
//! - Annotation mismatches are recoverable
//! - Single-element addition is atomic
//! - Scene manifests load end to end

use std::io::Write;

use spatialdata_view::{
    AnnotationTable, ControllerError, Element, LinkError, RegistryError, SceneManifest,
    SpatialDataObject, Transform, TransformError,
};

use super::test_utils::{
    controller, key, object_o1, object_o2, oid, system_names, SinkOp, TestController,
};

fn assert_records_match_registry(controller: &TestController) {
    let registry = controller.linker().registry();
    assert_eq!(controller.records().count(), registry.len());
    for record in controller.records() {
        assert!(registry.contains(&record.key));
    }
}

// =============================================================================
// Unloading
// =============================================================================

#[test]
fn test_unload_while_aligned_active() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.load_object(object_o2());
    controller.switch_to("aligned").unwrap();
    let cells_handle = controller.record(&key("o1", "cells")).unwrap().handle.unwrap();

    controller.unload_object(&oid("o1")).unwrap();

    assert!(controller.record(&key("o1", "cells")).is_none());
    assert!(controller.record(&key("o1", "image")).is_none());
    assert!(controller
        .sink()
        .ops()
        .contains(&SinkOp::Remove {
            handle: cells_handle
        }));
    assert!(controller.sink().layers().layer(cells_handle).is_none());

    // "o1_local" was declared by O1 only; "global" is still used by O2's alignment
    assert_eq!(system_names(&controller), vec!["global", "aligned"]);
    assert_eq!(controller.current_system().unwrap().name(), "aligned");
    assert!(controller.record(&key("o2", "tissue")).unwrap().visible());
    assert_records_match_registry(&controller);
}

#[test]
fn test_unload_of_current_system_owner_deactivates() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.load_object(object_o2());
    controller.switch_to("aligned").unwrap();

    controller.unload_object(&oid("o2")).unwrap();

    assert!(controller.current_system().is_none());
    assert!(controller.records().all(|r| !r.displayed));
    assert_eq!(controller.sink().layers().visible_layers().count(), 0);
    assert_eq!(system_names(&controller), vec!["global", "o1_local"]);
}

#[test]
fn test_unload_unknown_object() {
    let mut controller = controller();
    assert_eq!(
        controller.unload_object(&oid("nope")),
        Err(ControllerError::UnknownObject(oid("nope")))
    );
}

#[test]
fn test_records_track_registry_through_lifecycle() {
    let mut controller = controller();
    controller.load_object(object_o1());
    assert_records_match_registry(&controller);
    controller.load_object(object_o2());
    assert_records_match_registry(&controller);
    controller.switch_to("global").unwrap();
    controller
        .add_single_element(
            &oid("o2"),
            Element::polygons("boundaries", 40),
            Transform::IDENTITY,
            "aligned",
        )
        .unwrap();
    assert_records_match_registry(&controller);
    controller.unload_object(&oid("o1")).unwrap();
    assert_records_match_registry(&controller);
    controller.load_object(object_o1());
    assert_records_match_registry(&controller);
}

// =============================================================================
// Duplicate Names and Annotations
// =============================================================================

#[test]
fn test_duplicate_element_names_across_objects() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.load_object(
        SpatialDataObject::new("o3")
            .with_element(Element::points("cells", 10))
            .with_transform("cells", "global", Transform::IDENTITY),
    );
    controller.switch_to("global").unwrap();

    assert_eq!(
        controller.layer_by_name("cells_0").unwrap().key,
        key("o1", "cells")
    );
    assert_eq!(
        controller.layer_by_name("cells_1").unwrap().key,
        key("o3", "cells")
    );
    assert_eq!(controller.layer_by_name("image").unwrap().key, key("o1", "image"));

    controller.unload_object(&oid("o3")).unwrap();
    controller.refresh();
    assert_eq!(controller.layer_by_name("cells").unwrap().key, key("o1", "cells"));
}

#[test]
fn test_annotation_mismatch_is_recoverable() {
    let mut controller = controller();
    let table = AnnotationTable::new("region", "cell_id")
        .with_rows("cells", [1, 2, 2])
        .with_rows("image", [1, 2]);
    let report = controller.load_object(object_o1().with_table(table));

    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].key, key("o1", "cells"));
    assert!(matches!(
        report.issues[0].error,
        LinkError::Registry(RegistryError::AnnotationMismatch { instance: 2, .. })
    ));

    controller.switch_to("global").unwrap();
    let cells = controller.record(&key("o1", "cells")).unwrap();
    assert!(cells.displayed);
    assert!(cells.applied_spec().unwrap().annotation.is_none());

    let image = controller
        .linker()
        .registry()
        .get(&key("o1", "image"))
        .unwrap();
    assert_eq!(image.annotation.as_ref().unwrap().len(), 2);
}

#[test]
fn test_update_table_relinks() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.switch_to("global").unwrap();

    let table = AnnotationTable::new("region", "cell_id").with_rows("cells", 0..5000);
    let report = controller.update_table(&oid("o1"), Some(table)).unwrap();
    assert!(report.is_clean());

    let spec = controller
        .record(&key("o1", "cells"))
        .unwrap()
        .applied_spec()
        .unwrap();
    assert_eq!(spec.annotation.as_ref().unwrap().len(), 5000);

    assert_eq!(
        controller.update_table(&oid("nope"), None),
        Err(ControllerError::UnknownObject(oid("nope")))
    );
}

// =============================================================================
// Single-Element Addition
// =============================================================================

#[test]
fn test_add_single_element_rollback_leaves_state_unchanged() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.switch_to("global").unwrap();
    let systems = system_names(&controller);
    let records: Vec<_> = controller.records().cloned().collect();
    let ops = controller.sink().op_count();

    let err = controller
        .add_single_element(
            &oid("o1"),
            Element::points("squashed", 100),
            Transform::from_matrix([[1.0, 2.0, 0.0], [2.0, 4.0, 0.0], [0.0, 0.0, 1.0]]).unwrap(),
            "squashed_space",
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ControllerError::RolledBack(LinkError::Transform(
            TransformError::DegenerateTransform { .. }
        ))
    ));

    assert_eq!(system_names(&controller), systems);
    assert_eq!(controller.records().cloned().collect::<Vec<_>>(), records);
    assert_eq!(controller.sink().op_count(), ops);
    assert!(!controller
        .linker()
        .registry()
        .contains(&key("o1", "squashed")));
    assert_records_match_registry(&controller);
}

#[test]
fn test_add_single_element_into_other_system() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.switch_to("global").unwrap();

    let report = controller
        .add_single_element(
            &oid("o1"),
            Element::circles("spots", 200),
            Transform::IDENTITY,
            "o1_local",
        )
        .unwrap();

    // Linked into the active system, where it has no transform
    let spots = key("o1", "spots");
    assert_eq!(report.hidden, vec![spots.clone()]);
    controller.switch_to("o1_local").unwrap();
    assert!(controller.record(&spots).unwrap().visible());
    assert_eq!(
        controller.elements_in_system("o1_local").unwrap(),
        vec![key("o1", "image"), spots]
    );
}

// =============================================================================
// Scene Manifests
// =============================================================================

const SCENE: &str = r#"{
    "objects": [
        {
            "id": "visium",
            "elements": [
                {"name": "spots", "type": "shapes", "geometry": "circles", "count": 4992},
                {"name": "hires", "type": "image", "channels": 3, "axes": ["c", "y", "x"],
                 "levels": [{"width": 2000, "height": 2000}]}
            ],
            "table": {
                "region_key": "region",
                "instance_key": "spot_id",
                "rows": [
                    {"region": "spots", "instance": 0},
                    {"region": "spots", "instance": 1}
                ]
            },
            "transforms": [
                {"element": "spots", "system": "global", "transform": {"type": "identity"}},
                {"element": "hires", "system": "global",
                 "transform": {"type": "sequence", "transformations": [
                    {"type": "scale", "scale": [4.0, 4.0]},
                    {"type": "translation", "translation": [1.0, 1.0]}
                 ]}}
            ]
        },
        {
            "id": "xenium",
            "elements": [
                {"name": "transcripts", "type": "points", "count": 250000}
            ],
            "transforms": [
                {"element": "transcripts", "system": "xenium_global", "transform": {"type": "identity"}}
            ],
            "alignments": [
                {"from": "xenium_global", "to": "global",
                 "transform": {"type": "affine", "matrix": [[0.5, 0.0, 3.0], [0.0, 0.5, 4.0], [0.0, 0.0, 1.0]]}}
            ]
        }
    ]
}"#;

#[test]
fn test_manifest_loads_end_to_end() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCENE.as_bytes()).unwrap();
    let manifest = SceneManifest::from_path(file.path()).unwrap();

    let mut controller = controller();
    for object in manifest.objects {
        assert!(controller.load_object(object).is_clean());
    }
    assert_eq!(system_names(&controller), vec!["global", "xenium_global"]);
    let graph = controller.linker().graph();
    let direct: Vec<String> = graph
        .list_systems_for(&key("xenium", "transcripts"))
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(direct, vec!["xenium_global"]);

    let report = controller.switch_to("global").unwrap();
    assert_eq!(report.displayed.len(), 3);

    let hires = controller.record(&key("visium", "hires")).unwrap();
    assert_eq!(hires.transform.unwrap().transform_point([1.0, 1.0]), [5.0, 5.0]);

    let transcripts = controller.record(&key("xenium", "transcripts")).unwrap();
    assert_eq!(
        transcripts.transform.unwrap().transform_point([2.0, 2.0]),
        [4.0, 5.0]
    );
    assert!(transcripts.decision.as_ref().unwrap().subsample);

    let spots = controller.record(&key("visium", "spots")).unwrap();
    assert_eq!(
        spots.applied_spec().unwrap().annotation.as_ref().unwrap().len(),
        2
    );
}

#[test]
fn test_manifest_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = SceneManifest::from_path(&missing).unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}
