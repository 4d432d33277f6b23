//! Cyclic polylines: one [`Polyline`] is a closed tunnel cross-section
//! ("ring"). Topology is fixed after construction; vertex positions, UVs and
//! flags stay mutable through the arena. [`InitialPolyline`] is a ring under
//! append-only construction, used for the gate, hole boundaries and
//! decoration seeds.

use crate::errors::CaveError;
use crate::float_types::{EPSILON, Real};
use crate::geometry::vertex::{Vertex, VertexArena, VertexId};
use crate::geometry::angle_degrees;
use nalgebra::{Point3, Rotation3, Unit, Vector2, Vector3};

/// Angle below which three consecutive vertices count as collinear for the
/// convexity test.
const COLLINEAR_TOLERANCE_DEG: Real = 3.0;

/// Default radius guard bounds for [`Polyline::scale`].
pub const DEFAULT_MIN_RADIUS: Real = 1.0;
pub const DEFAULT_MAX_RADIUS: Real = 25.0;

/// An ordered, cyclic ring of vertex handles. Indices wrap: `vertex(size)`
/// is `vertex(0)` and `vertex(-1)` is `vertex(size - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    ids: Vec<VertexId>,
    min_radius: Real,
    max_radius: Real,
}

impl Polyline {
    pub fn from_ids(ids: Vec<VertexId>) -> Self {
        Polyline {
            ids,
            min_radius: DEFAULT_MIN_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }

    /// Allocates a ring of `size` fresh vertices at the origin.
    pub fn with_size(arena: &mut VertexArena, size: usize) -> Self {
        let ids = (0..size).map(|_| arena.alloc(Point3::origin())).collect();
        Self::from_ids(ids)
    }

    pub fn size(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    fn wrap(&self, i: isize) -> usize {
        i.rem_euclid(self.ids.len() as isize) as usize
    }

    /// Cyclic access: any `i` (negative included) maps into the ring.
    pub fn vertex(&self, i: isize) -> VertexId {
        self.ids[self.wrap(i)]
    }

    pub fn position(&self, arena: &VertexArena, i: isize) -> Point3<Real> {
        arena[self.vertex(i)].pos
    }

    pub fn points<'a>(
        &'a self,
        arena: &'a VertexArena,
    ) -> impl Iterator<Item = Point3<Real>> + 'a {
        self.ids.iter().map(move |&id| arena[id].pos)
    }

    pub fn min_radius(&self) -> Real {
        self.min_radius
    }

    pub fn set_min_radius(&mut self, r: Real) {
        self.min_radius = r;
    }

    pub fn max_radius(&self) -> Real {
        self.max_radius
    }

    pub fn set_max_radius(&mut self, r: Real) {
        self.max_radius = r;
    }

    pub fn copy_radius_bounds(&mut self, other: &Polyline) {
        self.min_radius = other.min_radius;
        self.max_radius = other.max_radius;
    }

    /// Places vertex `i` at `origin + direction * distance`. No validation of
    /// the direction; a zero vector simply copies `origin`.
    pub fn extrude_vertex(
        &self,
        arena: &mut VertexArena,
        i: isize,
        origin: Point3<Real>,
        direction: Vector3<Real>,
        distance: Real,
    ) {
        arena[self.vertex(i)].pos = origin + direction * distance;
    }

    /// Mean of the vertex positions.
    pub fn barycenter(&self, arena: &VertexArena) -> Point3<Real> {
        let mut sum = Vector3::zeros();
        for p in self.points(arena) {
            sum += p.coords;
        }
        Point3::from(sum / self.ids.len() as Real)
    }

    /// Ring normal via Newell's method, negated and normalized. The sign
    /// matches the left-handed, inside-facing triangle winding of the mesh.
    /// Returns a zero vector for degenerate rings.
    pub fn normal(&self, arena: &VertexArena) -> Vector3<Real> {
        let n = self.ids.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let c = self.position(arena, i as isize);
            let nx = self.position(arena, i as isize + 1);
            normal.x += (c.y - nx.y) * (c.z + nx.z);
            normal.y += (c.z - nx.z) * (c.x + nx.x);
            normal.z += (c.x - nx.x) * (c.y + nx.y);
        }
        if normal.norm() <= EPSILON {
            return Vector3::zeros();
        }
        -normal.normalize()
    }

    /// Uniformly scales the ring about its barycenter. The whole call is a
    /// silent no-op if any vertex would end up nearer than `min_radius`
    /// (shrinking) or farther than `max_radius` (growing) from the
    /// barycenter: either every vertex moves or none does.
    pub fn scale(&self, arena: &mut VertexArena, factor: Real) {
        let b = self.barycenter(arena);
        for p in self.points(arena) {
            let r = (p - b).norm() * factor;
            if factor < 1.0 && r < self.min_radius {
                return;
            }
            if factor > 1.0 && r > self.max_radius {
                return;
            }
        }
        for &id in &self.ids {
            let p = arena[id].pos;
            arena[id].pos = b + (p - b) * factor;
        }
    }

    /// Rotates every vertex about the barycenter around the ring's own
    /// normal axis. Degenerate rings are left untouched.
    pub fn rotate(&self, arena: &mut VertexArena, angle_degrees: Real) {
        let normal = self.normal(arena);
        if normal.norm() <= EPSILON {
            return;
        }
        let rot = Rotation3::from_axis_angle(
            &Unit::new_normalize(normal),
            angle_degrees.to_radians(),
        );
        let b = self.barycenter(arena);
        for &id in &self.ids {
            let p = arena[id].pos;
            arena[id].pos = b + rot * (p - b);
        }
    }

    /// Largest vertex-to-barycenter distance, ignoring the duplicated
    /// closing vertex.
    pub fn radius(&self, arena: &VertexArena) -> Real {
        let b = self.barycenter(arena);
        self.points(arena)
            .take(self.ids.len().saturating_sub(1))
            .map(|p| (p - b).norm())
            .fold(0.0, Real::max)
    }

    /// Smallest vertex-to-barycenter distance, ignoring the duplicated
    /// closing vertex.
    pub fn minimum_radius(&self, arena: &VertexArena) -> Real {
        let b = self.barycenter(arena);
        self.points(arena)
            .take(self.ids.len().saturating_sub(1))
            .map(|p| (p - b).norm())
            .fold(Real::MAX, Real::min)
    }

    /// Plane normal from the first non-collinear vertex triple. Covers rings
    /// whose signed area cancels out (a bowtie has a zero Newell normal but
    /// still spans a plane).
    fn fallback_plane_normal(&self, arena: &VertexArena) -> Option<Vector3<Real>> {
        let n = self.ids.len() as isize;
        for i in 0..n {
            let e1 = self.position(arena, i + 1) - self.position(arena, i);
            let e2 = self.position(arena, i + 2) - self.position(arena, i + 1);
            let cross = e1.cross(&e2);
            if cross.norm() > EPSILON {
                return Some(cross);
            }
        }
        None
    }

    /// Naive O(n^2) self-intersection test of the ring's edges, restricted
    /// to the ring's best-fit plane. Adjacent edges are not tested against
    /// each other.
    pub fn is_simple(&self, arena: &VertexArena) -> bool {
        let n = self.ids.len();
        if n < 4 {
            return true;
        }
        let mut normal = self.normal(arena);
        if normal.norm() <= EPSILON {
            // Zero net area does not mean no plane; only fully collinear
            // rings have nothing left to test.
            match self.fallback_plane_normal(arena) {
                Some(fallback) => normal = fallback,
                None => return true,
            }
        }
        let (u, v) = plane_basis(normal);
        let b = self.barycenter(arena);
        let flat: Vec<Vector2<Real>> = self
            .points(arena)
            .map(|p| Vector2::new((p - b).dot(&u), (p - b).dot(&v)))
            .collect();
        for i in 0..n {
            for j in (i + 1)..n {
                // Skip edges sharing a vertex (cyclic neighbours included).
                if j == i || j == (i + 1) % n || (j + 1) % n == i {
                    continue;
                }
                let (a1, a2) = (flat[i], flat[(i + 1) % n]);
                let (b1, b2) = (flat[j], flat[(j + 1) % n]);
                if segments_cross(a1, a2, b1, b2) {
                    return false;
                }
            }
        }
        true
    }

    /// Checks that consecutive edge cross products stay on one side of the
    /// ring's plane. Near-collinear triples (<= 3 degrees) do not disqualify.
    pub fn is_convex(&self, arena: &VertexArena) -> bool {
        let n = self.ids.len();
        if n < 4 {
            return true;
        }
        let normal = self.normal(arena);
        if normal.norm() <= EPSILON {
            return true;
        }
        let mut side = 0.0;
        for i in 0..n {
            let p0 = self.position(arena, i as isize);
            let p1 = self.position(arena, i as isize + 1);
            let p2 = self.position(arena, i as isize + 2);
            let e1 = p1 - p0;
            let e2 = p2 - p1;
            if angle_degrees(&e1, &e2) <= COLLINEAR_TOLERANCE_DEG {
                continue;
            }
            let s = e1.cross(&e2).dot(&normal);
            if s.abs() <= EPSILON {
                continue;
            }
            if side == 0.0 {
                side = s.signum();
            } else if s.signum() != side {
                return false;
            }
        }
        true
    }
}

/// Orthonormal basis of the plane orthogonal to `normal`.
fn plane_basis(normal: Vector3<Real>) -> (Vector3<Real>, Vector3<Real>) {
    let n = normal.normalize();
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = n.cross(&helper).normalize();
    let v = n.cross(&u);
    (u, v)
}

fn orient(a: Vector2<Real>, b: Vector2<Real>, c: Vector2<Real>) -> Real {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Proper crossing test for two 2D segments.
fn segments_cross(
    a1: Vector2<Real>,
    a2: Vector2<Real>,
    b1: Vector2<Real>,
    b2: Vector2<Real>,
) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
}

/// A ring under incremental, append-only construction.
#[derive(Debug, Clone)]
pub struct InitialPolyline {
    inner: Polyline,
    capacity: usize,
}

impl InitialPolyline {
    pub fn new(capacity: usize) -> Self {
        InitialPolyline {
            inner: Polyline::from_ids(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.ids.len() >= self.capacity
    }

    /// Read-only view of the ring built so far.
    pub fn ring(&self) -> &Polyline {
        &self.inner
    }

    /// Appends a fresh vertex at `pos`.
    pub fn push_position(
        &mut self,
        arena: &mut VertexArena,
        pos: Point3<Real>,
    ) -> Result<(), CaveError> {
        if self.is_full() {
            return Err(CaveError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.inner.ids.push(arena.alloc(pos));
        Ok(())
    }

    /// Appends a *shared* vertex handle: the new ring aliases the vertex
    /// record of whichever ring it was taken from.
    pub fn push_vertex(&mut self, id: VertexId) -> Result<(), CaveError> {
        if self.is_full() {
            return Err(CaveError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.inner.ids.push(id);
        Ok(())
    }

    /// Stamps vertex indices 0..n in ring order.
    pub fn initialize_indices(&self, arena: &mut VertexArena) {
        for (i, &id) in self.inner.ids.iter().enumerate() {
            arena[id].index = i as i32;
        }
    }

    /// One smoothing pass: every position becomes the mean of itself and its
    /// two cyclic neighbours. Repeated application rounds and slightly
    /// shrinks the ring.
    pub fn smooth_mean(&self, arena: &mut VertexArena) {
        let n = self.inner.ids.len();
        if n < 3 {
            return;
        }
        let old: Vec<Point3<Real>> = self.inner.points(arena).collect();
        for i in 0..n {
            let prev = old[(i + n - 1) % n];
            let next = old[(i + 1) % n];
            let mean = (prev.coords + old[i].coords + next.coords) / 3.0;
            arena[self.inner.ids[i]].pos = Point3::from(mean);
        }
    }

    /// Assigns texture coordinates: `u` is the cumulative-perimeter parameter
    /// in [0, 1), `v` is the given row coordinate.
    pub fn generate_uvs(&self, arena: &mut VertexArena, v_coord: Real) {
        let n = self.inner.ids.len();
        if n == 0 {
            return;
        }
        let mut lengths = Vec::with_capacity(n);
        let mut total = 0.0;
        for i in 0..n {
            lengths.push(total);
            let a = self.inner.position(arena, i as isize);
            let b = self.inner.position(arena, i as isize + 1);
            total += (b - a).norm();
        }
        for i in 0..n {
            let u = if total > EPSILON { lengths[i] / total } else { 0.0 };
            arena[self.inner.ids[i]].uv = Vector2::new(u, v_coord);
        }
    }

    /// Appends a copy of the first vertex with `u = 1.0` so the texture seam
    /// between the last and first wall quad closes cleanly. Grows the ring by
    /// one vertex past the declared capacity by design.
    pub fn duplicate_first_vertex(&mut self, arena: &mut VertexArena) {
        let Some(&first) = self.inner.ids.first() else {
            return;
        };
        let mut copy = Vertex::new(arena[first].pos);
        copy.uv = Vector2::new(1.0, arena[first].uv.y);
        copy.in_hole = arena[first].in_hole;
        let id = arena.alloc_vertex(copy);
        self.capacity += 1;
        self.inner.ids.push(id);
    }

    /// Finishes construction.
    pub fn into_ring(self) -> Result<Polyline, CaveError> {
        if self.inner.ids.len() < 3 {
            return Err(CaveError::RingTooSmall {
                size: self.inner.ids.len(),
            });
        }
        Ok(self.inner)
    }
}
