//! Shared controller tests.
//!
//! Tests verify:
//! - Concurrent tasks never interleave inside an action
//! - All clones observe the same engine state

use spatialdata_view::{
    CoordinateSystemController, Element, RenderThresholds, SharedController, SpatialDataObject,
    Transform,
};

use super::test_utils::{key, oid, RecordingSink};

fn shared() -> SharedController<RecordingSink> {
    SharedController::new(CoordinateSystemController::new(
        RecordingSink::new(),
        RenderThresholds::default(),
    ))
}

#[tokio::test]
async fn test_concurrent_additions_keep_records_consistent() {
    let controller = shared();
    controller
        .load_object(
            SpatialDataObject::new("o1")
                .with_element(Element::points("seed", 1))
                .with_transform("seed", "global", Transform::IDENTITY),
        )
        .await;
    controller.switch_to("global").await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let controller = controller.clone();
        tasks.push(tokio::spawn(async move {
            controller
                .add_single_element(
                    &oid("o1"),
                    Element::points(format!("cells_{}", i), 10),
                    Transform::from_translation(i as f64, 0.0),
                    "global",
                )
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let (records, registered, visible) = controller
        .with(|c| {
            (
                c.records().count(),
                c.linker().registry().len(),
                c.sink().layers().visible_layers().count(),
            )
        })
        .await;
    assert_eq!(records, 17);
    assert_eq!(registered, 17);
    assert_eq!(visible, 17);
}

#[tokio::test]
async fn test_concurrent_switches_end_in_consistent_state() {
    let controller = shared();
    controller
        .load_object(
            SpatialDataObject::new("o1")
                .with_element(Element::points("a", 5))
                .with_element(Element::points("b", 5))
                .with_transform("a", "left", Transform::IDENTITY)
                .with_transform("b", "right", Transform::IDENTITY),
        )
        .await;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let controller = controller.clone();
        let system = if i % 2 == 0 { "left" } else { "right" };
        tasks.push(tokio::spawn(async move {
            controller.switch_to(system).await.map(|report| report.displayed)
        }));
    }
    for task in tasks {
        let displayed = task.await.unwrap().unwrap();
        assert_eq!(displayed.len(), 1);
    }

    let current = controller.current_system().await.unwrap();
    let expected = if current.name() == "left" {
        key("o1", "a")
    } else {
        key("o1", "b")
    };
    let displayed: Vec<_> = controller
        .with(|c| c.records().filter(|r| r.displayed).map(|r| r.key.clone()).collect())
        .await;
    assert_eq!(displayed, vec![expected]);
}

#[tokio::test]
async fn test_summaries_reflect_visibility_changes() {
    let controller = shared();
    controller
        .load_object(
            SpatialDataObject::new("o1")
                .with_element(Element::points("cells", 5))
                .with_transform("cells", "global", Transform::IDENTITY),
        )
        .await;
    controller.switch_to("global").await.unwrap();
    controller
        .set_visibility(&key("o1", "cells"), false)
        .await
        .unwrap();

    let summaries = controller.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].layer, "cells");
    assert!(summaries[0].displayed);
    assert!(!summaries[0].visible);
    assert_eq!(summaries[0].system.as_deref(), Some("global"));

    let report = controller.unload_object(&oid("o1")).await.unwrap();
    assert!(report.system.is_none());
    assert!(controller.list_systems().await.is_empty());
}
