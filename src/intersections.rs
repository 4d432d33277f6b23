//! Spatial bookkeeping that keeps the cave locally valid. Rings accumulate
//! into an "open run" (everything extruded since the last direction change,
//! hole or branch boundary); a run is committed as one axis-aligned bounding
//! box, shrunk slightly inward so it does not block the tunnel that produced
//! it. Candidate extrusions are tested against every committed box except
//! the single one they are allowed to overlap.
//!
//! Coarse and conservative by design: false positives (over-rejection) are
//! acceptable, false negatives are not.

use crate::float_types::Real;
use crate::geometry::{Aabb, Polyline, VertexArena, VertexId};
use log::trace;
use nalgebra::Point3;

#[derive(Debug, Clone)]
pub struct IntersectionsController {
    boxes: Vec<Aabb>,
    run_points: Vec<Point3<Real>>,
    run_rings: usize,
    /// Signature of the last ring added, to drop immediate repeats.
    last_ring: Option<(VertexId, usize)>,
    epsilon: Real,
}

impl IntersectionsController {
    pub fn new(epsilon: Real) -> Self {
        IntersectionsController {
            boxes: Vec::new(),
            run_points: Vec::new(),
            run_rings: 0,
            last_ring: None,
            epsilon,
        }
    }

    pub fn boxes(&self) -> &[Aabb] {
        &self.boxes
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Index of the most recently committed box.
    pub fn last_box(&self) -> Option<usize> {
        self.boxes.len().checked_sub(1)
    }

    /// Appends a ring to the current open run. Adding the same ring twice in
    /// a row is a no-op.
    pub fn add_ring(&mut self, arena: &VertexArena, ring: &Polyline) {
        let signature = (ring.vertex(0), ring.size());
        if self.last_ring == Some(signature) {
            return;
        }
        self.last_ring = Some(signature);
        self.run_points.extend(ring.points(arena));
        self.run_rings += 1;
    }

    /// Commits the open run as one box (only if it holds at least two rings)
    /// and clears it.
    pub fn add_current_box(&mut self) {
        if self.run_rings > 1 {
            let aabb = Aabb::from_points(self.run_points.iter().copied())
                .shrunk(self.epsilon);
            trace!(
                "committed bounding box {} over {} rings",
                self.boxes.len(),
                self.run_rings
            );
            self.boxes.push(aabb);
        }
        self.run_points.clear();
        self.run_rings = 0;
        self.last_ring = None;
    }

    /// Tests the candidate extrusion (the box spanned by just its two rings)
    /// against every committed box except `exempt`.
    pub fn do_intersect(
        &self,
        arena: &VertexArena,
        origin: &Polyline,
        dest: &Polyline,
        exempt: Option<usize>,
    ) -> bool {
        let candidate =
            Aabb::from_points(origin.points(arena).chain(dest.points(arena)));
        self.boxes.iter().enumerate().any(|(index, aabb)| {
            Some(index) != exempt && candidate.intersects(aabb)
        })
    }
}
