//! Geometric primitives: the shared vertex arena, cyclic polylines
//! (tunnel cross-sections) and axis-aligned bounding boxes.

pub mod aabb;
pub mod polyline;
pub mod vertex;

use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

pub use aabb::Aabb;
pub use polyline::{InitialPolyline, Polyline};
pub use vertex::{Vertex, VertexArena, VertexId};

/// Projects `point` onto the plane through `origin` with (unit) `normal`.
pub fn project_to_plane(
    point: Point3<Real>,
    origin: Point3<Real>,
    normal: Vector3<Real>,
) -> Point3<Real> {
    point - normal * (point - origin).dot(&normal)
}

/// Angle between two vectors in degrees. Zero-length input yields 0.
pub fn angle_degrees(a: &Vector3<Real>, b: &Vector3<Real>) -> Real {
    let denom = a.norm() * b.norm();
    if denom <= crate::float_types::EPSILON {
        return 0.0;
    }
    let cos = (a.dot(b) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
