mod support;

use cavegen::geometry::{Polyline, VertexArena};
use cavegen::{CaveError, CaveMesh};
use nalgebra::Point3;
use support::{approx_point, square_ring};

/// Offsets every vertex of `ring` along +Z by `distance` into a fresh ring.
fn offset_up(arena: &mut VertexArena, ring: &Polyline, distance: cavegen::Real) -> Polyline {
    let next = Polyline::with_size(arena, ring.size());
    for i in 0..ring.size() as isize {
        let p = ring.position(arena, i);
        next.extrude_vertex(arena, i, p, nalgebra::Vector3::z(), distance);
    }
    next
}

#[test]
fn triangulation_emits_two_triangles_per_quad() {
    let mut arena = VertexArena::new();
    let a = square_ring(&mut arena, 0.0);
    let b = offset_up(&mut arena, &a, 1.0);
    let mut mesh = CaveMesh::new(50.0);
    mesh.add_ring(&mut arena, &a);
    mesh.add_ring(&mut arena, &b);
    mesh.triangulate_rings(&arena, &a, &b).unwrap();
    assert_eq!(mesh.triangle_count(), 2 * a.size());
    // Every index references a vertex of one of the two rings.
    assert!(mesh.triangles().iter().all(|&i| (i as usize) < 8));
}

#[test]
fn mismatched_ring_sizes_are_an_error() {
    let mut arena = VertexArena::new();
    let a = square_ring(&mut arena, 0.0);
    let b = Polyline::with_size(&mut arena, 5);
    let mut mesh = CaveMesh::new(50.0);
    mesh.add_ring(&mut arena, &a);
    mesh.add_ring(&mut arena, &b);
    assert_eq!(
        mesh.triangulate_rings(&arena, &a, &b).unwrap_err(),
        CaveError::MismatchedRingSizes { left: 4, right: 5 }
    );
}

#[test]
fn fully_marked_quad_is_suppressed() {
    let mut arena = VertexArena::new();
    let a = square_ring(&mut arena, 0.0);
    let b = offset_up(&mut arena, &a, 1.0);

    // All four corners of quad 0 marked: exactly one quad (2 triangles) gone.
    arena[a.vertex(0)].in_hole = true;
    arena[a.vertex(1)].in_hole = true;
    arena[b.vertex(0)].in_hole = true;
    arena[b.vertex(1)].in_hole = true;
    let mut mesh = CaveMesh::new(50.0);
    mesh.add_ring(&mut arena, &a);
    mesh.add_ring(&mut arena, &b);
    mesh.triangulate_rings(&arena, &a, &b).unwrap();
    assert_eq!(mesh.triangle_count(), 2 * a.size() - 2);
}

#[test]
fn partially_marked_quad_is_kept() {
    let mut arena = VertexArena::new();
    let a = square_ring(&mut arena, 0.0);
    let b = offset_up(&mut arena, &a, 1.0);

    // Only one ring's side of the quad marked: nothing suppressed.
    arena[a.vertex(0)].in_hole = true;
    arena[a.vertex(1)].in_hole = true;
    let mut mesh = CaveMesh::new(50.0);
    mesh.add_ring(&mut arena, &a);
    mesh.add_ring(&mut arena, &b);
    mesh.triangulate_rings(&arena, &a, &b).unwrap();
    assert_eq!(mesh.triangle_count(), 2 * a.size());
}

#[test]
fn closing_cap_adds_one_vertex_and_a_fan() {
    let mut arena = VertexArena::new();
    let ring = square_ring(&mut arena, 0.0);
    let mut mesh = CaveMesh::new(50.0);
    mesh.add_ring(&mut arena, &ring);
    mesh.close_ring(&mut arena, &ring);
    assert_eq!(mesh.vertex_count(), ring.size() + 1);
    assert_eq!(mesh.triangle_count(), ring.size());
    assert!(mesh.indices_in_bounds());
    // The cap vertex sits at the barycenter.
    let cap = mesh.positions()[mesh.vertex_count() - 1];
    assert!(approx_point(&cap, &Point3::new(0.5, 0.5, 0.0)));
}

/// Square gate, five fixed-distance extrusions along +Z, capped: the full
/// straight-tube scenario with exact counts.
#[test]
fn square_tube_round_trip() {
    let mut arena = VertexArena::new();
    let mut ring = square_ring(&mut arena, 0.0);
    let direction = ring.normal(&arena);
    assert!(support::approx_vector(&direction, &nalgebra::Vector3::z()));

    let mut mesh = CaveMesh::new(50.0);
    mesh.add_ring(&mut arena, &ring);
    for _ in 0..5 {
        let next = offset_up(&mut arena, &ring, 1.0);
        mesh.add_ring(&mut arena, &next);
        mesh.triangulate_rings(&arena, &ring, &next).unwrap();
        ring = next;
    }
    mesh.close_ring(&mut arena, &ring);

    // 4 seed + 5 * 4 extruded + 1 cap.
    assert_eq!(mesh.vertex_count(), 25);
    // 5 ring-pairs * 8 + 4 cap fan.
    assert_eq!(mesh.triangle_count(), 44);
    assert!(mesh.indices_in_bounds());
    assert!(approx_point(
        &ring.barycenter(&arena),
        &Point3::new(0.5, 0.5, 5.0)
    ));
}

#[test]
fn tunnel_start_stitching_covers_both_rings() {
    let mut arena = VertexArena::new();
    // An 8-vertex mouth stitched to a 4-vertex entrance.
    let mouth = support::circle_ring(&mut arena, 8, 2.0, 0.0);
    let entrance = square_ring(&mut arena, 0.5);
    let mut mesh = CaveMesh::new(50.0);
    mesh.add_ring(&mut arena, &mouth);
    mesh.add_ring(&mut arena, &entrance);
    mesh.triangulate_tunnel_start(&arena, &mouth, &entrance);
    // The advancing front emits one triangle per advanced vertex.
    assert_eq!(mesh.triangle_count(), mouth.size() + entrance.size());
    assert!(mesh.indices_in_bounds());
}

#[test]
fn hole_smoothing_is_deterministic() {
    fn build() -> CaveMesh {
        let mut arena = VertexArena::new();
        let a = square_ring(&mut arena, 0.0);
        let b = offset_up(&mut arena, &a, 1.0);
        let mut mesh = CaveMesh::new(50.0);
        mesh.add_ring(&mut arena, &a);
        mesh.add_ring(&mut arena, &b);
        mesh.triangulate_rings(&arena, &a, &b).unwrap();
        for i in 0..8 {
            mesh.add_hole_index(i);
        }
        mesh
    }
    // Two byte-identical meshes must smooth to byte-identical results.
    let mut first = build();
    let mut second = build();
    first.smooth_holes(5, 0.5);
    second.smooth_holes(5, 0.5);
    assert_eq!(first.positions(), second.positions());
    assert_eq!(first.uvs(), second.uvs());
}

#[test]
fn hole_smoothing_pulls_boundary_vertices_together() {
    let mut arena = VertexArena::new();
    let a = square_ring(&mut arena, 0.0);
    let b = offset_up(&mut arena, &a, 1.0);
    let mut mesh = CaveMesh::new(50.0);
    mesh.add_ring(&mut arena, &a);
    mesh.add_ring(&mut arena, &b);
    mesh.triangulate_rings(&arena, &a, &b).unwrap();
    // Earmark one wall edge as hole boundary.
    mesh.add_hole_index(0);
    mesh.add_hole_index(1);
    let before: Vec<Point3<_>> = mesh.positions().to_vec();
    mesh.smooth_holes(3, 0.5);
    let after = mesh.positions();
    // The two earmarked vertices moved towards each other; the rest did not.
    assert_ne!(before[0], after[0]);
    assert_ne!(before[1], after[1]);
    assert!((after[0] - after[1]).norm() < (before[0] - before[1]).norm());
    for i in 2..before.len() {
        assert_eq!(before[i], after[i]);
    }
}
