use std::sync::Arc;

use eframe::egui::{Pos2, pos2};
use rstest::{fixture, rstest};

use crate::graph::testing::transaction;
use crate::graph::{GroupingConfig, HUB_ID, INPUT_GROUP_ID, build_graph};
use crate::layout::{CanvasSize, LayoutConfig, LayoutEngine, Visibility, VisibilityLease};

use super::*;

struct Scene {
    engine: LayoutEngine,
    _lease: VisibilityLease,
}

/// Hub, a collapsed input group of 40, one external output, one change output and a fee.
#[fixture]
fn scene() -> Scene {
    let graph = Arc::new(build_graph(
        &transaction("interaction", 40, 1, 1, Some(500)),
        &GroupingConfig::default(),
    ));
    let visibility = Visibility::new();
    let lease = visibility.acquire();
    let mut engine = LayoutEngine::new(
        graph,
        CanvasSize::new(800.0, 600.0, 1.0),
        LayoutConfig::default(),
        visibility,
    );
    for _ in 0..300 {
        engine.step();
    }
    Scene {
        engine,
        _lease: lease,
    }
}

fn center(engine: &LayoutEngine, id: &str) -> Pos2 {
    engine.snapshot().get(id).expect("node is laid out").center
}

fn empty_point(engine: &LayoutEngine) -> Pos2 {
    let padding = engine.config().hit_padding_dp;
    (0..40)
        .flat_map(|x| (0..30).map(move |y| pos2(x as f32 * 20.0 + 10.0, y as f32 * 20.0 + 10.0)))
        .find(|point| hit_test(engine.snapshot(), *point, padding).is_none())
        .expect("canvas has free space")
}

#[test]
fn later_nodes_win_overlapping_hits() {
    let snapshot = LayoutSnapshot::from_nodes(vec![
        NodeLayout {
            id: "below".to_owned(),
            center: pos2(100.0, 100.0),
            radius: 20.0,
        },
        NodeLayout {
            id: "above".to_owned(),
            center: pos2(110.0, 100.0),
            radius: 20.0,
        },
    ]);
    let hit = hit_test(&snapshot, pos2(100.0, 100.0), 0.0).map(|node| node.id.as_str());
    assert_eq!(hit, Some("above"));
    let hit = hit_test(&snapshot, pos2(82.0, 100.0), 0.0).map(|node| node.id.as_str());
    assert_eq!(hit, Some("below"));
    assert!(hit_test(&snapshot, pos2(75.0, 100.0), 0.0).is_none());
    assert!(hit_test(&snapshot, pos2(75.0, 100.0), 6.0).is_some(), "padding widens the target");
}

#[rstest]
fn tap_selects_and_clears(scene: Scene) {
    let mut controller = InteractionController::new();
    let output = center(&scene.engine, "output-0");

    assert_eq!(
        controller.tap(&scene.engine, output),
        InteractionEvent::SelectionChanged(Some("output-0".to_owned()))
    );
    assert_eq!(controller.selected(), Some("output-0"));

    let hub = center(&scene.engine, HUB_ID);
    assert_eq!(
        controller.tap(&scene.engine, hub),
        InteractionEvent::SelectionChanged(Some(HUB_ID.to_owned()))
    );

    let empty = empty_point(&scene.engine);
    assert_eq!(
        controller.tap(&scene.engine, empty),
        InteractionEvent::SelectionChanged(None)
    );
    assert_eq!(controller.selected(), None);
}

#[rstest]
fn tap_on_group_requests_expand_without_selecting(scene: Scene) {
    let mut controller = InteractionController::new();
    let group = center(&scene.engine, INPUT_GROUP_ID);
    assert_eq!(
        controller.tap(&scene.engine, group),
        InteractionEvent::ExpandRequested(INPUT_GROUP_ID.to_owned())
    );
    assert_eq!(controller.selected(), None);
}

#[rstest]
fn drag_on_group_expands_instead_of_pinning(mut scene: Scene) {
    let mut controller = InteractionController::new();
    let group = center(&scene.engine, INPUT_GROUP_ID);

    let event = controller.drag_start(&mut scene.engine, group);
    assert_eq!(event, Some(InteractionEvent::ExpandRequested(INPUT_GROUP_ID.to_owned())));
    assert_eq!(scene.engine.pointer_count(), 0);
    assert_eq!(controller.dragged_node(), None);
}

#[rstest]
fn drag_moves_only_the_grabbed_node(mut scene: Scene) {
    let mut controller = InteractionController::new();
    let output = center(&scene.engine, "output-0");

    let event = controller.drag_start(&mut scene.engine, output);
    assert_eq!(event, Some(InteractionEvent::SelectionChanged(Some("output-0".to_owned()))));
    assert_eq!(controller.dragged_node(), Some("output-0"));
    assert_eq!(scene.engine.pointer_count(), 1);

    let target = pos2(400.0, 300.0);
    assert_eq!(controller.drag_move(&mut scene.engine, target), None);
    let constraint = controller.drag.as_ref().map(|drag| drag.constraint).expect("active drag");
    let pinned = scene.engine.pointer_target(constraint).expect("pointer target");
    assert!(pinned.distance(target) < 1e-3);
    assert_eq!(scene.engine.pointer_count(), 1);

    controller.drag_end(&mut scene.engine);
    assert_eq!(scene.engine.pointer_count(), 0);
    assert_eq!(controller.dragged_node(), None);
    assert_eq!(controller.selected(), Some("output-0"), "selection outlives the drag");
}

#[rstest]
fn drag_move_without_start_picks_up_a_node(mut scene: Scene) {
    let mut controller = InteractionController::new();
    let empty = empty_point(&scene.engine);
    assert_eq!(controller.drag_start(&mut scene.engine, empty), None);
    assert_eq!(scene.engine.pointer_count(), 0);

    let fee = center(&scene.engine, "fee");
    let event = controller.drag_move(&mut scene.engine, fee);
    assert_eq!(event, Some(InteractionEvent::SelectionChanged(Some("fee".to_owned()))));
    assert_eq!(controller.dragged_node(), Some("fee"));
    assert_eq!(scene.engine.pointer_count(), 1);
}

#[rstest]
fn stale_constraint_is_reacquired(mut scene: Scene) {
    let mut controller = InteractionController::new();
    let output = center(&scene.engine, "output-0");
    controller.drag_start(&mut scene.engine, output);

    let canvas = scene.engine.canvas();
    let graph = Arc::clone(scene.engine.graph());
    let visibility = Visibility::new();
    let _lease = visibility.acquire();
    let mut rebuilt = LayoutEngine::new(graph, canvas, LayoutConfig::default(), visibility);
    for _ in 0..300 {
        rebuilt.step();
    }
    let hub = center(&rebuilt, HUB_ID);

    let event = controller.drag_move(&mut rebuilt, hub);
    assert_eq!(event, Some(InteractionEvent::SelectionChanged(Some(HUB_ID.to_owned()))));
    assert_eq!(rebuilt.pointer_count(), 1);

    controller.drag_cancel(&mut rebuilt);
    assert_eq!(rebuilt.pointer_count(), 0);
}

#[rstest]
fn cancel_after_teardown_is_harmless(mut scene: Scene) {
    let mut controller = InteractionController::new();
    let output = center(&scene.engine, "output-0");
    controller.drag_start(&mut scene.engine, output);
    scene.engine.teardown();

    controller.drag_cancel(&mut scene.engine);
    controller.drag_cancel(&mut scene.engine);
    assert_eq!(controller.dragged_node(), None);
}

#[rstest]
fn reconcile_clears_vanished_selection(scene: Scene) {
    let mut controller = InteractionController::new();
    controller.tap(&scene.engine, center(&scene.engine, "output-0"));
    assert_eq!(controller.reconcile(scene.engine.graph()), None);
    assert_eq!(controller.selected(), Some("output-0"));

    let smaller = build_graph(&transaction("interaction", 2, 0, 0, None), &GroupingConfig::default());
    assert_eq!(
        controller.reconcile(&smaller),
        Some(InteractionEvent::SelectionChanged(None))
    );
    assert_eq!(controller.selected(), None);
}
