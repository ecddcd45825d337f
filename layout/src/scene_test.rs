use super::*;
use crate::arrange::compute_circular_layout;
use crate::geometry::Entity;
use crate::group::group_by_connectivity;

fn scene() -> Scene {
    let positions = compute_circular_layout(&[1, 2, 3], 1000.0, 1000.0);
    let grouping = group_by_connectivity(&[Entity::new(1), Entity::new(2), Entity::new(3)]);
    Scene::new(positions, grouping)
}

#[test]
fn hit_test_finds_node_within_radius() {
    let scene = scene();
    let top = scene.positions[&1];
    assert_eq!(scene.hit_test(Point::new(top.x + 10.0, top.y - 10.0)), Some(1));
    assert_eq!(scene.hit_test(Point::new(500.0, 500.0)), None);
}

#[test]
fn hit_test_prefers_higher_id_on_overlap() {
    let mut positions = PositionMap::new();
    positions.insert(1, Point::new(100.0, 100.0));
    positions.insert(2, Point::new(120.0, 100.0));
    let scene = Scene::new(positions, Grouping::default());
    assert_eq!(scene.hit_test(Point::new(110.0, 100.0)), Some(2));
}

#[test]
fn drag_updates_position_live_and_writes_once() {
    let mut scene = scene();
    let start = scene.positions[&1];
    assert_eq!(scene.begin_drag(Point::new(start.x + 5.0, start.y)), Some(1));

    scene.drag_to(Point::new(start.x + 25.0, start.y + 40.0));
    assert_eq!(scene.positions[&1], Point::new(start.x + 20.0, start.y + 40.0));

    let write = scene.end_drag();
    assert_eq!(write, Some(PositionWrite { id: 1, position: Point::new(start.x + 20.0, start.y + 40.0) }));
    assert!(scene.dragging().is_none());
    assert!(scene.end_drag().is_none());
}

#[test]
fn drag_without_movement_writes_nothing() {
    let mut scene = scene();
    let start = scene.positions[&2];
    scene.begin_drag(start);
    assert!(scene.end_drag().is_none());
}

#[test]
fn begin_drag_on_empty_space_does_nothing() {
    let mut scene = scene();
    assert!(scene.begin_drag(Point::new(-500.0, -500.0)).is_none());
    scene.drag_to(Point::new(0.0, 0.0));
    assert!(scene.end_drag().is_none());
}

#[test]
fn replace_keeps_live_drag_position() {
    let mut scene = scene();
    let start = scene.positions[&3];
    scene.begin_drag(start);
    scene.drag_to(Point::new(10.0, 10.0));

    let refreshed = compute_circular_layout(&[1, 2, 3, 4], 1000.0, 1000.0);
    scene.replace(refreshed, Grouping::default());
    assert_eq!(scene.positions[&3], Point::new(10.0, 10.0));
    assert_eq!(scene.positions.len(), 4);
    assert_eq!(scene.end_drag().map(|w| w.id), Some(3));
}
