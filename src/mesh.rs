//! Accumulation of the triangle mesh. One [`CaveMesh`] holds the append-only
//! vertex/triangle/UV buffers of a single tunnel branch (a separate instance
//! collects all decoration geometry).
//!
//! Triangles are wound left-handed with normals facing the *inside* of the
//! cave, so the walls are visible from within; the `_outside` variants flip
//! the winding for decoration tubes seen from outside.

use crate::errors::CaveError;
use crate::float_types::Real;
use crate::geometry::{Polyline, VertexArena, VertexId, angle_degrees};
use nalgebra::{Point3, Vector2};

/// Final plain buffers of one mesh, ready for a rendering host. Triangle
/// indices are local to `positions`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshBuffers {
    pub positions: Vec<Point3<Real>>,
    pub triangles: Vec<u32>,
    pub uvs: Vec<Vector2<Real>>,
}

#[derive(Debug, Clone)]
pub struct CaveMesh {
    vertices: Vec<Point3<Real>>,
    triangles: Vec<u32>,
    uvs: Vec<Vector2<Real>>,
    /// Mesh indices of hole-boundary vertices, earmarked for smoothing.
    hole_indices: Vec<u32>,
    uv_factor: Real,
}

impl CaveMesh {
    pub fn new(uv_factor: Real) -> Self {
        CaveMesh {
            vertices: Vec::new(),
            triangles: Vec::new(),
            uvs: Vec::new(),
            hole_indices: Vec::new(),
            uv_factor,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn positions(&self) -> &[Point3<Real>] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    pub fn uvs(&self) -> &[Vector2<Real>] {
        &self.uvs
    }

    pub fn hole_indices(&self) -> &[u32] {
        &self.hole_indices
    }

    /// Appends every vertex of the ring (position + UV) and stamps its mesh
    /// index. Index-on-append is the one assignment convention: a vertex's
    /// index is whatever slot this call gives it.
    pub fn add_ring(&mut self, arena: &mut VertexArena, ring: &Polyline) {
        for &id in ring.ids() {
            let next = self.vertices.len() as i32;
            let v = &mut arena[id];
            v.index = next;
            self.vertices.push(v.pos);
            self.uvs.push(v.uv);
        }
    }

    /// Earmarks a committed vertex index for hole smoothing.
    pub fn add_hole_index(&mut self, index: u32) {
        self.hole_indices.push(index);
    }

    fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.triangles.push(a);
        self.triangles.push(b);
        self.triangles.push(c);
    }

    fn mesh_index(arena: &VertexArena, id: VertexId) -> u32 {
        let index = arena[id].index;
        debug_assert!(index >= 0, "vertex referenced before being added");
        index as u32
    }

    /// Emits the two triangles of one wall quad, unless all four corners are
    /// part of a hole.
    ///
    /// ```text
    ///     tl___tr
    ///     |    |      seen from outside the cave
    ///     bl___br
    /// ```
    fn quad(
        &mut self,
        arena: &VertexArena,
        bl: VertexId,
        br: VertexId,
        tl: VertexId,
        tr: VertexId,
        outside: bool,
    ) {
        let hole = arena[bl].in_hole
            && arena[br].in_hole
            && arena[tl].in_hole
            && arena[tr].in_hole;
        if hole {
            return;
        }
        let (bl, br, tl, tr) = (
            Self::mesh_index(arena, bl),
            Self::mesh_index(arena, br),
            Self::mesh_index(arena, tl),
            Self::mesh_index(arena, tr),
        );
        if outside {
            self.push_triangle(bl, tl, tr);
            self.push_triangle(bl, tr, br);
        } else {
            self.push_triangle(bl, tr, tl);
            self.push_triangle(bl, br, tr);
        }
    }

    fn triangulate_rings_impl(
        &mut self,
        arena: &VertexArena,
        a: &Polyline,
        b: &Polyline,
        outside: bool,
    ) -> Result<(), CaveError> {
        if a.size() != b.size() {
            return Err(CaveError::MismatchedRingSizes {
                left: a.size(),
                right: b.size(),
            });
        }
        for i in 0..a.size() as isize {
            self.quad(
                arena,
                a.vertex(i),
                a.vertex(i + 1),
                b.vertex(i),
                b.vertex(i + 1),
                outside,
            );
        }
        Ok(())
    }

    /// Triangulates the wall between two consecutive same-size rings. Vertex
    /// order must correspond (ring `b` is an extrusion of ring `a`).
    pub fn triangulate_rings(
        &mut self,
        arena: &VertexArena,
        a: &Polyline,
        b: &Polyline,
    ) -> Result<(), CaveError> {
        self.triangulate_rings_impl(arena, a, b, false)
    }

    /// Same construction with reversed winding, for geometry viewed from
    /// outside (stalagmites and the like).
    pub fn triangulate_rings_outside(
        &mut self,
        arena: &VertexArena,
        a: &Polyline,
        b: &Polyline,
    ) -> Result<(), CaveError> {
        self.triangulate_rings_impl(arena, a, b, true)
    }

    fn close_ring_impl(&mut self, arena: &mut VertexArena, ring: &Polyline, outside: bool) {
        let center = ring.barycenter(arena);
        let cap = self.vertices.len() as u32;
        // The cap vertex advances the texture row by the ring radius, as if
        // the wall kept running to the center.
        let mean_v = ring
            .ids()
            .iter()
            .map(|&id| arena[id].uv.y)
            .sum::<Real>()
            / ring.size() as Real;
        self.vertices.push(center);
        self.uvs
            .push(Vector2::new(0.5, mean_v + ring.radius(arena) / self.uv_factor));
        for i in 0..ring.size() as isize {
            let a = Self::mesh_index(arena, ring.vertex(i));
            let b = Self::mesh_index(arena, ring.vertex(i + 1));
            if outside {
                self.push_triangle(b, a, cap);
            } else {
                self.push_triangle(a, b, cap);
            }
        }
    }

    /// Caps an open tunnel end: appends the barycenter as one closing vertex
    /// and fan-triangulates the ring against it (left-handed).
    pub fn close_ring(&mut self, arena: &mut VertexArena, ring: &Polyline) {
        self.close_ring_impl(arena, ring, false);
    }

    /// Outside-facing cap for decoration tubes.
    pub fn close_ring_outside(&mut self, arena: &mut VertexArena, ring: &Polyline) {
        self.close_ring_impl(arena, ring, true);
    }

    /// Stitches a hole-boundary ring to its projected interior ring with a
    /// greedy angle-based advancing front: at every step whichever ring's
    /// next vertex turns least against the current base edge contributes the
    /// triangle; once a ring is exhausted the remainder fans against the
    /// other ring's cursor.
    ///
    /// Known-approximate: the greedy choice can occasionally mis-triangulate
    /// strongly warped hole mouths.
    pub fn triangulate_tunnel_start(
        &mut self,
        arena: &VertexArena,
        hole: &Polyline,
        projection: &Polyline,
    ) {
        let m = hole.size() as isize;
        let n = projection.size() as isize;
        let mut i = 0isize;
        let mut j = 0isize;
        while i < m || j < n {
            let a = hole.vertex(i);
            let b = projection.vertex(j);
            let pa = arena[a].pos;
            let pb = arena[b].pos;
            let advance_hole = if i >= m {
                false
            } else if j >= n {
                true
            } else {
                let cand_a = hole.position(arena, i + 1);
                let cand_b = projection.position(arena, j + 1);
                let ang_a = angle_degrees(&(cand_a - pa), &(pb - pa));
                let ang_b = angle_degrees(&(cand_b - pb), &(pa - pb));
                ang_a <= ang_b
            };
            if advance_hole {
                self.push_triangle(
                    Self::mesh_index(arena, a),
                    Self::mesh_index(arena, hole.vertex(i + 1)),
                    Self::mesh_index(arena, b),
                );
                i += 1;
            } else {
                self.push_triangle(
                    Self::mesh_index(arena, a),
                    Self::mesh_index(arena, projection.vertex(j + 1)),
                    Self::mesh_index(arena, b),
                );
                j += 1;
            }
        }
    }

    /// Relaxed Laplacian smoothing of the hole-boundary vertices:
    /// `v += lambda * (mean(adjacent) - v)` on position and UV. The adjacency
    /// is computed once and restricted to hole vertices to bound cost. Each
    /// iteration reads a snapshot of the previous one and walks the boundary
    /// in sorted index order, so the result is independent of insertion order
    /// and identical across runs. The buffer's final closing vertex keeps its
    /// UV.
    pub fn smooth_holes(&mut self, iterations: usize, lambda: Real) {
        if self.hole_indices.is_empty() || iterations == 0 {
            return;
        }
        let mut boundary: Vec<u32> = self.hole_indices.clone();
        boundary.sort_unstable();
        boundary.dedup();
        // Neighbours are stored as slots into `boundary`.
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); boundary.len()];
        for tri in self.triangles.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let (Ok(sa), Ok(sb)) =
                    (boundary.binary_search(&a), boundary.binary_search(&b))
                else {
                    continue;
                };
                if !adjacency[sa].contains(&sb) {
                    adjacency[sa].push(sb);
                }
                if !adjacency[sb].contains(&sa) {
                    adjacency[sb].push(sa);
                }
            }
        }
        let last = self.vertices.len().saturating_sub(1) as u32;
        for _ in 0..iterations {
            let pos_snapshot: Vec<Point3<Real>> = boundary
                .iter()
                .map(|&v| self.vertices[v as usize])
                .collect();
            let uv_snapshot: Vec<Vector2<Real>> =
                boundary.iter().map(|&v| self.uvs[v as usize]).collect();
            for (slot, &v) in boundary.iter().enumerate() {
                let neighbours = &adjacency[slot];
                if neighbours.is_empty() {
                    continue;
                }
                let mut pos_sum = nalgebra::Vector3::zeros();
                let mut uv_sum = Vector2::zeros();
                for &nb in neighbours {
                    pos_sum += pos_snapshot[nb].coords;
                    uv_sum += uv_snapshot[nb];
                }
                let inv = 1.0 / neighbours.len() as Real;
                let pos_delta = (pos_sum * inv - pos_snapshot[slot].coords) * lambda;
                let uv_delta = (uv_sum * inv - uv_snapshot[slot]) * lambda;
                let vi = v as usize;
                self.vertices[vi] += pos_delta;
                if v != last {
                    self.uvs[vi] += uv_delta;
                }
            }
        }
    }

    pub fn into_buffers(self) -> MeshBuffers {
        MeshBuffers {
            positions: self.vertices,
            triangles: self.triangles,
            uvs: self.uvs,
        }
    }
}

impl CaveMesh {
    /// Convenience check used by tests and debugging: every triangle index
    /// points into the vertex buffer.
    pub fn indices_in_bounds(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.triangles.iter().all(|&i| i < n)
    }
}
