mod support;

use cavegen::geometry::VertexArena;
use cavegen::intersections::IntersectionsController;
use support::{ring_from, square_ring};

#[test]
fn exemption_allows_exactly_one_box() {
    let mut arena = VertexArena::new();
    let mut controller = IntersectionsController::new(0.1);

    // Commit one box spanning the unit column from z=0 to z=4.
    let a = square_ring(&mut arena, 0.0);
    let b = square_ring(&mut arena, 4.0);
    controller.add_ring(&arena, &a);
    controller.add_ring(&arena, &b);
    controller.add_current_box();
    assert_eq!(controller.box_count(), 1);
    assert_eq!(controller.last_box(), Some(0));

    // Geometry fully inside the committed box.
    let c = ring_from(
        &mut arena,
        &[(0.3, 0.3, 1.0), (0.3, 0.7, 1.0), (0.7, 0.7, 1.0), (0.7, 0.3, 1.0)],
    );
    let d = ring_from(
        &mut arena,
        &[(0.3, 0.3, 2.0), (0.3, 0.7, 2.0), (0.7, 0.7, 2.0), (0.7, 0.3, 2.0)],
    );
    assert!(!controller.do_intersect(&arena, &c, &d, Some(0)));
    assert!(controller.do_intersect(&arena, &c, &d, None));
    assert!(controller.do_intersect(&arena, &c, &d, Some(17)));
}

#[test]
fn single_ring_runs_commit_nothing() {
    let mut arena = VertexArena::new();
    let mut controller = IntersectionsController::new(0.1);
    let a = square_ring(&mut arena, 0.0);
    controller.add_ring(&arena, &a);
    controller.add_current_box();
    assert_eq!(controller.box_count(), 0);
}

#[test]
fn repeated_ring_is_dropped() {
    let mut arena = VertexArena::new();
    let mut controller = IntersectionsController::new(0.1);
    let a = square_ring(&mut arena, 0.0);
    controller.add_ring(&arena, &a);
    controller.add_ring(&arena, &a);
    controller.add_current_box();
    // The duplicate did not count as a second ring.
    assert_eq!(controller.box_count(), 0);
}

#[test]
fn shrunk_boxes_do_not_block_their_own_walls() {
    let mut arena = VertexArena::new();
    let mut controller = IntersectionsController::new(0.1);
    let a = square_ring(&mut arena, 0.0);
    let b = square_ring(&mut arena, 4.0);
    controller.add_ring(&arena, &a);
    controller.add_ring(&arena, &b);
    controller.add_current_box();

    // A tunnel continuing just past the committed box: its candidate box
    // touches only the shrunk-away skin, so it passes.
    let c = square_ring(&mut arena, 4.05);
    let d = square_ring(&mut arena, 6.0);
    assert!(!controller.do_intersect(&arena, &c, &d, None));
}

#[test]
fn distinct_rings_after_a_commit_start_a_new_run() {
    let mut arena = VertexArena::new();
    let mut controller = IntersectionsController::new(0.1);
    let a = square_ring(&mut arena, 0.0);
    let b = square_ring(&mut arena, 2.0);
    controller.add_ring(&arena, &a);
    controller.add_ring(&arena, &b);
    controller.add_current_box();

    let c = square_ring(&mut arena, 10.0);
    let d = square_ring(&mut arena, 12.0);
    controller.add_ring(&arena, &c);
    controller.add_ring(&arena, &d);
    controller.add_current_box();
    assert_eq!(controller.box_count(), 2);
}
