//! Test support library
//! Shared helpers and ring builders for the integration tests.

#![allow(dead_code)]

use cavegen::Real;
use cavegen::float_types::PI;
use cavegen::geometry::{InitialPolyline, Polyline, VertexArena};
use nalgebra::{Point3, Vector3};

pub const TOLERANCE: Real = 1e-3;

pub fn approx_eq(a: Real, b: Real) -> bool {
    (a - b).abs() <= TOLERANCE
}

pub fn approx_point(a: &Point3<Real>, b: &Point3<Real>) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

pub fn approx_vector(a: &Vector3<Real>, b: &Vector3<Real>) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

/// Builds a ring from explicit points, in order.
pub fn ring_from(arena: &mut VertexArena, points: &[(Real, Real, Real)]) -> Polyline {
    let mut builder = InitialPolyline::new(points.len());
    for &(x, y, z) in points {
        builder
            .push_position(arena, Point3::new(x, y, z))
            .expect("builder sized for the points");
    }
    builder.into_ring().expect("at least three points")
}

/// Unit square in the XY plane at height `z`, wound so its normal is +Z.
pub fn square_ring(arena: &mut VertexArena, z: Real) -> Polyline {
    ring_from(
        arena,
        &[(0.0, 0.0, z), (0.0, 1.0, z), (1.0, 1.0, z), (1.0, 0.0, z)],
    )
}

/// Regular `n`-gon of the given radius in the XY plane at height `z`, with
/// the first vertex duplicated as a closing seam vertex (`n + 1` total).
pub fn circle_ring(arena: &mut VertexArena, n: usize, radius: Real, z: Real) -> Polyline {
    let mut points: Vec<(Real, Real, Real)> = (0..n)
        .map(|i| {
            let a = i as Real / n as Real * 2.0 * PI;
            (a.sin() * radius, a.cos() * radius, z)
        })
        .collect();
    points.push(points[0]);
    ring_from(arena, &points)
}
