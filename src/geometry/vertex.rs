//! The vertex arena. Rings never own their vertices: they hold [`VertexId`]
//! handles into one shared [`VertexArena`], so a hole-boundary ring and the
//! tunnel rings it was carved from see the same vertex records. Marking a
//! vertex as part of a hole through one ring is visible through every other
//! ring holding the handle, which is what lets the wall triangulation skip
//! hole faces later.

use crate::float_types::Real;
use nalgebra::{Point3, Vector2};
use std::ops::{Index, IndexMut};

/// Handle to a vertex stored in a [`VertexArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(u32);

impl VertexId {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A cross-section vertex: position, assigned mesh index (-1 until the vertex
/// is appended to a mesh buffer), hole membership and texture coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub index: i32,
    pub in_hole: bool,
    pub uv: Vector2<Real>,
}

impl Vertex {
    pub fn new(pos: Point3<Real>) -> Self {
        Vertex {
            pos,
            index: -1,
            in_hole: false,
            uv: Vector2::zeros(),
        }
    }
}

/// Append-only store of every vertex created during one generation run.
#[derive(Debug, Default, Clone)]
pub struct VertexArena {
    verts: Vec<Vertex>,
}

impl VertexArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.verts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// Allocates a fresh vertex at `pos` with no index, no hole flag.
    pub fn alloc(&mut self, pos: Point3<Real>) -> VertexId {
        self.alloc_vertex(Vertex::new(pos))
    }

    pub fn alloc_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.verts.len() as u32);
        self.verts.push(vertex);
        id
    }

    /// Allocates the interpolation of two vertices: position and UV are
    /// lerped, index and hole flag start fresh.
    pub fn lerp(&mut self, a: VertexId, b: VertexId, t: Real) -> VertexId {
        let (va, vb) = (&self[a], &self[b]);
        let mut v = Vertex::new(va.pos + (vb.pos - va.pos) * t);
        v.uv = va.uv + (vb.uv - va.uv) * t;
        self.alloc_vertex(v)
    }
}

impl Index<VertexId> for VertexArena {
    type Output = Vertex;

    fn index(&self, id: VertexId) -> &Vertex {
        &self.verts[id.0 as usize]
    }
}

impl IndexMut<VertexId> for VertexArena {
    fn index_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.verts[id.0 as usize]
    }
}
