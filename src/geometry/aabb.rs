//! Axis-aligned bounding boxes used by the intersection bookkeeping.

use crate::float_types::Real;
use nalgebra::Point3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Aabb {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// Smallest box containing all the given points. Empty input yields an
    /// inverted (never-intersecting) box.
    pub fn from_points<I: IntoIterator<Item = Point3<Real>>>(points: I) -> Self {
        let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
        let mut maxs = Point3::new(Real::MIN, Real::MIN, Real::MIN);
        for p in points {
            mins.x = mins.x.min(p.x);
            mins.y = mins.y.min(p.y);
            mins.z = mins.z.min(p.z);
            maxs.x = maxs.x.max(p.x);
            maxs.y = maxs.y.max(p.y);
            maxs.z = maxs.z.max(p.z);
        }
        Self { mins, maxs }
    }

    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.maxs.x >= other.mins.x
            && self.mins.x <= other.maxs.x
            && self.maxs.y >= other.mins.y
            && self.mins.y <= other.maxs.y
            && self.maxs.z >= other.mins.z
            && self.mins.z <= other.maxs.z
    }

    /// Pulls every face inward by `epsilon`, so a box does not block the
    /// tunnel run that produced it.
    #[inline]
    pub fn shrunk(&self, epsilon: Real) -> Self {
        Self {
            mins: Point3::new(
                self.mins.x + epsilon,
                self.mins.y + epsilon,
                self.mins.z + epsilon,
            ),
            maxs: Point3::new(
                self.maxs.x - epsilon,
                self.maxs.y - epsilon,
                self.maxs.z - epsilon,
            ),
        }
    }

    #[inline]
    pub fn center(&self) -> Point3<Real> {
        Point3::new(
            (self.mins.x + self.maxs.x) / 2.0,
            (self.mins.y + self.maxs.y) / 2.0,
            (self.mins.z + self.maxs.z) / 2.0,
        )
    }
}
