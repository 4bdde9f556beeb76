//! Coordinate-system switching tests.
//!
//! Tests verify:
//! - An element is displayed iff it has a transform path into the system
//! - Alignment chains compose as a matrix product
//! - Degenerate transforms hide the element and are reported
//! - A singular branch never masks an invertible path
//! - Unknown systems are rejected without any state change

use spatialdata_view::{
    ControllerError, Element, LayerRecord, LinkError, SpatialDataObject, Transform,
    TransformError,
};

use super::test_utils::{
    controller, controller_with_thresholds, key, object_o1, object_o2, system_names,
};

const TOL: f64 = 1e-9;

// =============================================================================
// Displayed State
// =============================================================================

#[test]
fn test_displayed_iff_transform_resolves() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.load_object(object_o2());

    for system in controller.list_systems() {
        controller.switch_to(system.name()).unwrap();
        for record in controller.records() {
            let resolves = controller
                .linker()
                .graph()
                .get_transform(&record.key, &system)
                .is_ok();
            assert_eq!(record.displayed, resolves, "{} in {}", record.key, system);
        }
    }
}

#[test]
fn test_systems_listed_in_first_declaration_order() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.load_object(object_o2());
    assert_eq!(
        system_names(&controller),
        vec!["global", "o1_local", "aligned"]
    );
}

#[test]
fn test_activating_twice_yields_identical_records() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.load_object(object_o2());

    controller.switch_to("aligned").unwrap();
    let first: Vec<LayerRecord> = controller.records().cloned().collect();
    let ops = controller.sink().op_count();

    controller.switch_to("aligned").unwrap();
    let second: Vec<LayerRecord> = controller.records().cloned().collect();

    assert_eq!(first, second);
    assert_eq!(controller.sink().op_count(), ops);
}

#[test]
fn test_unknown_system_rejected_without_change() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.switch_to("global").unwrap();
    let before: Vec<LayerRecord> = controller.records().cloned().collect();
    let ops = controller.sink().op_count();

    let err = controller.switch_to("missing").unwrap_err();
    assert_eq!(
        err,
        ControllerError::UnknownCoordinateSystem("missing".to_string())
    );
    assert_eq!(controller.current_system().unwrap().name(), "global");
    assert_eq!(controller.records().cloned().collect::<Vec<_>>(), before);
    assert_eq!(controller.sink().op_count(), ops);
}

// =============================================================================
// Alignment Chains
// =============================================================================

#[test]
fn test_aligned_scenario_keeps_cells_displayed() {
    let mut controller = controller_with_thresholds(1000, 500);
    controller.load_object(object_o1());
    controller.switch_to("global").unwrap();
    controller.load_object(object_o2());

    let report = controller.switch_to("aligned").unwrap();
    let cells = key("o1", "cells");
    assert!(report.displayed.contains(&cells));
    assert!(report.is_clean());

    let record = controller.record(&cells).unwrap();
    assert!(record.visible());

    // element -> global (scale 2) -> aligned (shift x by 10)
    let expected = Transform::from_scale(2.0, 2.0).then(&Transform::from_translation(10.0, 0.0));
    let applied = record.transform.unwrap();
    assert!(applied.abs_diff_eq(&expected, TOL));
    assert_eq!(applied.transform_point([1.0, 1.0]), [12.0, 2.0]);

    let spec = record.applied_spec().unwrap();
    assert!(spec.transform.abs_diff_eq(&expected, TOL));
    assert!(spec.decision.subsample);
    assert_eq!(spec.decision.indices.as_ref().unwrap().len(), 1000);
}

#[test]
fn test_composition_is_matrix_product() {
    let a = Transform::from_matrix([[2.0, 1.0, 3.0], [0.0, 1.0, -1.0], [0.0, 0.0, 1.0]]).unwrap();
    let b = Transform::from_matrix([[0.0, -1.0, 5.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]).unwrap();

    let mut controller = controller();
    controller.load_object(
        SpatialDataObject::new("o1")
            .with_element(Element::points("cells", 10))
            .with_transform("cells", "s1", a)
            .with_alignment("s1", "s2", b),
    );
    controller.switch_to("s2").unwrap();

    let applied = controller.record(&key("o1", "cells")).unwrap().transform.unwrap();
    let expected = Transform::from_affine(*b.as_affine() * *a.as_affine());
    assert!(applied.abs_diff_eq(&expected, TOL));
    assert!(applied.is_invertible());
}

#[test]
fn test_degenerate_alignment_hides_and_reports() {
    let mut controller = controller();
    controller.load_object(
        object_o1().with_alignment("global", "flat", Transform::from_scale(1.0, 0.0)),
    );

    let report = controller.switch_to("flat").unwrap();
    let cells = key("o1", "cells");
    assert!(report.hidden.contains(&cells));
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].key, cells);
    assert!(matches!(
        report.issues[0].error,
        LinkError::Transform(TransformError::DegenerateTransform { .. })
    ));

    let record = controller.record(&cells).unwrap();
    assert!(!record.displayed);
    assert!(record.remembered_visible);
}

#[test]
fn test_small_unit_scale_is_displayed() {
    let mut controller = controller();
    controller.load_object(
        SpatialDataObject::new("o1")
            .with_element(Element::points("cells", 10))
            .with_transform("cells", "metres", Transform::from_scale(1e-6, 1e-6)),
    );

    let report = controller.switch_to("metres").unwrap();
    assert!(report.is_clean());
    assert_eq!(report.displayed, vec![key("o1", "cells")]);
    assert!(controller.record(&key("o1", "cells")).unwrap().visible());
}

#[test]
fn test_singular_branch_does_not_hide_element() {
    let mut controller = controller();
    controller.load_object(
        SpatialDataObject::new("o1")
            .with_element(Element::points("cells", 10))
            .with_transform("cells", "a", Transform::from_scale(0.0, 1.0))
            .with_transform("cells", "b", Transform::IDENTITY)
            .with_alignment("a", "x", Transform::IDENTITY)
            .with_alignment("b", "x", Transform::IDENTITY),
    );

    let report = controller.switch_to("x").unwrap();
    assert!(report.is_clean());
    assert_eq!(report.displayed, vec![key("o1", "cells")]);
}

#[test]
fn test_missing_transform_is_hidden_not_reported() {
    let mut controller = controller();
    controller.load_object(object_o1());

    let report = controller.switch_to("o1_local").unwrap();
    assert_eq!(report.displayed, vec![key("o1", "image")]);
    assert_eq!(report.hidden, vec![key("o1", "cells")]);
    assert!(report.is_clean());
}

#[test]
fn test_layer_order_is_stable_across_switches() {
    let mut controller = controller();
    controller.load_object(object_o1());
    controller.load_object(object_o2());

    let order = |c: &super::test_utils::TestController| {
        c.records().map(|r| r.key.clone()).collect::<Vec<_>>()
    };

    controller.switch_to("global").unwrap();
    let first = order(&controller);
    controller.switch_to("aligned").unwrap();
    controller.switch_to("o1_local").unwrap();
    assert_eq!(order(&controller), first);
    assert_eq!(
        first,
        vec![key("o1", "cells"), key("o1", "image"), key("o2", "tissue")]
    );
}
