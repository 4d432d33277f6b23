//! The generation engine: drives the extrusion loop over a work-list of
//! pending branch seeds, consulting the decision policy for parameters and
//! the intersections controller for validity, and accumulating geometry into
//! per-branch meshes.
//!
//! The three traversal strategies share this one engine; only the order in
//! which branch seeds are picked up differs (see [`Strategy`]).

mod decoration;

use crate::config::{CaveConfig, Strategy};
use crate::decision::{DecisionGenerator, HoleSpan};
use crate::errors::CaveError;
use crate::float_types::{EPSILON, Real};
use crate::geometry::{InitialPolyline, Polyline, VertexArena, project_to_plane};
use crate::intersections::IntersectionsController;
use crate::mesh::{CaveMesh, MeshBuffers};
use crate::ops::ExtrusionOperations;
use log::{debug, trace, warn};
use nalgebra::{Point3, Vector2, Vector3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;

/// Everything a rendering host needs: one buffer triple per tunnel branch,
/// one for all decoration geometry, and the generated point-light positions.
#[derive(Debug, Clone, PartialEq)]
pub struct CaveOutput {
    pub tunnels: Vec<MeshBuffers>,
    pub decorations: MeshBuffers,
    pub lights: Vec<Point3<Real>>,
}

/// Advisory progress hook, invoked after each committed extrusion step and
/// after each branch closes. Purely observational: generation does not
/// depend on it.
pub trait StepObserver {
    fn on_step(&mut self, _mesh: &CaveMesh) {}
    fn on_branch_closed(&mut self, _mesh: &CaveMesh) {}
}

impl StepObserver for () {}

/// A tunnel waiting to be extruded.
#[derive(Debug, Clone)]
struct BranchSeed {
    ring: Polyline,
    /// The one committed bounding box this branch may overlap (its parent's).
    can_intersect: Option<usize>,
    /// Probability that this tunnel digs further holes; decays with depth.
    tunnel_prob: Real,
}

pub struct CaveGenerator {
    config: CaveConfig,
    decision: DecisionGenerator,
    intersections: IntersectionsController,
    arena: VertexArena,
    meshes: Vec<CaveMesh>,
    decorations: CaveMesh,
    lights: Vec<Point3<Real>>,
    pending: VecDeque<BranchSeed>,
    /// Remaining branch budget; acts as a countdown.
    hole_budget: i32,
}

/// One-call convenience entry point.
pub fn generate_cave(
    gate: &[Point3<Real>],
    config: CaveConfig,
    seed: u64,
) -> Result<CaveOutput, CaveError> {
    CaveGenerator::new(config, seed).generate(gate)
}

impl CaveGenerator {
    pub fn new(config: CaveConfig, seed: u64) -> Self {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_rng(mut config: CaveConfig, rng: StdRng) -> Self {
        // Hole mouths are split evenly across two rings, so entrances must
        // have an even vertex count.
        if config.entrance_size % 2 == 1 {
            config.entrance_size += 1;
        }
        config.entrance_size = config.entrance_size.max(4);
        let hole_budget = config.max_holes;
        CaveGenerator {
            decision: DecisionGenerator::new(config.clone(), rng),
            intersections: IntersectionsController::new(config.aabb_epsilon),
            arena: VertexArena::new(),
            meshes: Vec::new(),
            decorations: CaveMesh::new(config.uv_factor),
            lights: Vec::new(),
            pending: VecDeque::new(),
            hole_budget,
            config,
        }
    }

    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Generates the whole cave from the gate polyline.
    pub fn generate(self, gate: &[Point3<Real>]) -> Result<CaveOutput, CaveError> {
        self.generate_with(gate, &mut ())
    }

    /// Generates the whole cave, reporting progress to `observer`.
    pub fn generate_with<O: StepObserver>(
        mut self,
        gate: &[Point3<Real>],
        observer: &mut O,
    ) -> Result<CaveOutput, CaveError> {
        let ring = self.prepare_gate(gate)?;
        let seed = BranchSeed {
            ring,
            can_intersect: None,
            tunnel_prob: self.config.initial_hole_prob,
        };
        self.pending.push_back(seed);
        while let Some(seed) = self.pop_seed() {
            self.run_branch(observer, seed)?;
        }
        for mesh in &mut self.meshes {
            mesh.smooth_holes(self.config.smooth_iterations, self.config.smooth_lambda);
        }
        Ok(CaveOutput {
            tunnels: self.meshes.into_iter().map(CaveMesh::into_buffers).collect(),
            decorations: self.decorations.into_buffers(),
            lights: self.lights,
        })
    }

    /// Validates and conditions the user-supplied gate: smoothing passes,
    /// texture coordinates, the duplicated seam vertex.
    fn prepare_gate(&mut self, gate: &[Point3<Real>]) -> Result<Polyline, CaveError> {
        if gate.len() < 3 {
            return Err(CaveError::DegenerateGate);
        }
        let mut initial = InitialPolyline::new(gate.len());
        for &p in gate {
            initial.push_position(&mut self.arena, p)?;
        }
        if initial.ring().normal(&self.arena).norm() <= EPSILON {
            return Err(CaveError::DegenerateGate);
        }
        for _ in 0..self.config.smooth_iterations {
            initial.smooth_mean(&mut self.arena);
        }
        initial.generate_uvs(&mut self.arena, 0.0);
        initial.duplicate_first_vertex(&mut self.arena);
        initial.initialize_indices(&mut self.arena);
        let mut ring = initial.into_ring()?;
        ring.set_min_radius(self.config.min_ring_radius);
        ring.set_max_radius(self.config.max_ring_radius);
        Ok(ring)
    }

    fn pop_seed(&mut self) -> Option<BranchSeed> {
        match self.config.strategy {
            Strategy::Stack => self.pending.pop_back(),
            Strategy::Queue | Strategy::Recursive => self.pending.pop_front(),
        }
    }

    /// Extrudes one tunnel from its seed ring until the step or hole budget
    /// runs out, then caps it.
    fn run_branch<O: StepObserver>(
        &mut self,
        observer: &mut O,
        seed: BranchSeed,
    ) -> Result<(), CaveError> {
        let BranchSeed {
            mut ring,
            can_intersect,
            tunnel_prob,
        } = seed;
        self.hole_budget -= 1;
        let mut mesh = CaveMesh::new(self.config.uv_factor);
        mesh.add_ring(&mut self.arena, &ring);

        let mut op = self.decision.new_operation(&self.arena, &ring);
        op.set_can_intersect(can_intersect);
        let mut num_extrude = 0usize;
        let mut retries = 0usize;

        while self.hole_budget >= 0 && num_extrude < self.config.max_extrude_times {
            self.intersections.add_ring(&self.arena, &ring);
            let Some(mut new_ring) = self.extrude(&mut op, &ring) else {
                retries += 1;
                if retries > self.config.max_extrude_retries {
                    warn!(
                        "aborting branch at step {num_extrude} after {retries} rejected extrusions"
                    );
                    break;
                }
                // Roll an entirely new schedule and retry this step index.
                let exempt = op.can_intersect();
                op = self.decision.new_operation(&self.arena, &ring);
                op.set_can_intersect(exempt);
                continue;
            };
            retries = 0;

            let mut dest_in_mesh = false;
            if op.hole() {
                // The run so far becomes a committed box; the hole branch is
                // allowed to overlap the box that will follow it.
                self.intersections.add_current_box();
                op.set_can_intersect(Some(self.intersections.box_count()));
                match self.make_hole(&mut mesh, &ring, &new_ring)? {
                    Some(child_ring) => {
                        dest_in_mesh = true;
                        let child = BranchSeed {
                            ring: child_ring,
                            can_intersect: Some(self.intersections.box_count()),
                            tunnel_prob: (tunnel_prob - self.config.hole_prob_decay)
                                .max(0.0),
                        };
                        match self.config.strategy {
                            Strategy::Recursive => self.run_branch(observer, child)?,
                            Strategy::Stack | Strategy::Queue => {
                                self.pending.push_back(child);
                            },
                        }
                        // Re-open the run from the origin ring.
                        self.intersections.add_ring(&self.arena, &ring);
                    },
                    None => {
                        // Fall back to a short plain extrusion from the same
                        // origin. A larger distance already passed the
                        // intersection test, so the shorter one holds too.
                        debug!("hole rejected at step {num_extrude}, extruding short instead");
                        let direction = op.direction().end_value();
                        let distance = self.decision.generate_distance(false);
                        new_ring = self.offset_ring(&ring, direction, distance);
                    },
                }
                op.set_hole(false);
                let next_distance = self.decision.generate_distance(false);
                op.distance_mut().force(1, next_distance);
            }

            if !dest_in_mesh {
                mesh.add_ring(&mut self.arena, &new_ring);
            }
            mesh.triangulate_rings(&self.arena, &ring, &new_ring)?;

            if let Some(kind) = op.take_decoration() {
                self.make_decoration(kind, &ring, &new_ring)?;
            }
            if op.take_point_light() {
                let a = ring.barycenter(&self.arena);
                let b = new_ring.barycenter(&self.arena);
                self.lights.push(Point3::from((a.coords + b.coords) / 2.0));
            }

            observer.on_step(&mesh);
            ring = new_ring;
            num_extrude += 1;

            let direction_was_active = op.direction().active();
            self.decision
                .next_operation(&self.arena, &ring, &mut op, num_extrude, tunnel_prob);
            if !direction_was_active && op.direction().active() {
                // A direction change closes the current straight run.
                self.intersections.add_current_box();
                self.intersections.add_ring(&self.arena, &ring);
            }
        }

        self.intersections.add_ring(&self.arena, &ring);
        self.intersections.add_current_box();
        mesh.close_ring(&mut self.arena, &ring);
        debug!(
            "branch closed after {num_extrude} extrusions, {} vertices",
            mesh.vertex_count()
        );
        observer.on_branch_closed(&mesh);
        self.meshes.push(mesh);
        Ok(())
    }

    /// One extrusion attempt: offsets the ring along the scheduled direction
    /// and distance, applies any active scale/rotation, and rejects the
    /// result when it would overlap committed geometry.
    fn extrude(
        &mut self,
        op: &mut ExtrusionOperations,
        origin: &Polyline,
    ) -> Option<Polyline> {
        let direction = op.direction_mut().apply();
        let distance = op.distance_mut().apply();
        let new_ring = self.offset_ring(origin, direction, distance);
        if op.scale().active() {
            let factor = op.scale_mut().apply();
            new_ring.scale(&mut self.arena, factor);
        }
        if op.rotation().active() {
            let angle = op.rotation_mut().apply();
            new_ring.rotate(&mut self.arena, angle);
        }
        if self
            .intersections
            .do_intersect(&self.arena, origin, &new_ring, op.can_intersect())
        {
            debug!("extrusion rejected: candidate box overlaps committed geometry");
            return None;
        }
        Some(new_ring)
    }

    /// Fresh ring: every vertex of `origin` offset by `direction * distance`,
    /// UV row advanced by the travelled distance.
    fn offset_ring(
        &mut self,
        origin: &Polyline,
        direction: Vector3<Real>,
        distance: Real,
    ) -> Polyline {
        let uv_incr = Vector2::new(0.0, distance / self.config.uv_factor);
        self.offset_ring_with(origin, direction, distance, uv_incr)
    }

    pub(crate) fn offset_ring_with(
        &mut self,
        origin: &Polyline,
        direction: Vector3<Real>,
        distance: Real,
        uv_incr: Vector2<Real>,
    ) -> Polyline {
        let size = origin.size();
        let mut ring = Polyline::with_size(&mut self.arena, size);
        ring.copy_radius_bounds(origin);
        for i in 0..size as isize {
            let origin_pos = origin.position(&self.arena, i);
            ring.extrude_vertex(&mut self.arena, i, origin_pos, direction, distance);
            let uv = self.arena[origin.vertex(i)].uv + uv_incr;
            self.arena[ring.vertex(i)].uv = uv;
        }
        ring
    }

    /// Digs a hole between two consecutive rings and returns the projected
    /// interior ring seeding the new branch, or `None` when the hole is
    /// geometrically unacceptable (every tentative flag is rolled back).
    fn make_hole(
        &mut self,
        mesh: &mut CaveMesh,
        origin: &Polyline,
        dest: &Polyline,
    ) -> Result<Option<Polyline>, CaveError> {
        let Some(HoleSpan { first_index, size }) =
            self.decision.where_to_dig(&self.arena, origin)
        else {
            return Ok(None);
        };
        let half = size / 2;

        // Collect the mouth: ascending along the origin ring, descending
        // along the destination ring, so the boundary winds consistently.
        let mut hole = InitialPolyline::new(size);
        for i in 0..half {
            let id = origin.vertex((first_index + i) as isize);
            self.arena[id].in_hole = true;
            hole.push_vertex(id)?;
        }
        for i in (0..half).rev() {
            let id = dest.vertex((first_index + i) as isize);
            self.arena[id].in_hole = true;
            hole.push_vertex(id)?;
        }
        let hole_ring = hole.into_ring()?;

        if self.config.walk_mode {
            let normal = hole_ring.normal(&self.arena);
            if normal.y.abs() > self.config.y_walk_limit {
                trace!("hole discarded: mouth too steep for walk mode");
                self.unmark_hole(origin, dest, first_index, half);
                return Ok(None);
            }
        }

        let projection = self.generate_projection(&hole_ring)?;
        if !projection.ring().is_convex(&self.arena)
            || !projection.ring().is_simple(&self.arena)
            || self
                .intersections
                .do_intersect(&self.arena, &hole_ring, projection.ring(), None)
        {
            trace!("hole discarded: projected entrance invalid");
            self.unmark_hole(origin, dest, first_index, half);
            return Ok(None);
        }

        // Commit: the destination ring enters the mesh now so the mouth and
        // the projection can be stitched against valid indices.
        mesh.add_ring(&mut self.arena, dest);
        for &id in hole_ring.ids() {
            let index = self.arena[id].index;
            debug_assert!(index >= 0);
            mesh.add_hole_index(index as u32);
        }

        let v_first = self.arena[hole_ring.vertex(0)].uv.y;
        let v_last = self.arena[hole_ring.vertex(-1)].uv.y;
        let mut projection = projection;
        projection.generate_uvs(&mut self.arena, (v_first + v_last) / 2.0);
        projection.duplicate_first_vertex(&mut self.arena);
        let mut projection_ring = projection.into_ring()?;
        projection_ring.copy_radius_bounds(origin);

        mesh.add_ring(&mut self.arena, &projection_ring);
        mesh.triangulate_tunnel_start(&self.arena, &hole_ring, &projection_ring);
        self.intersections.add_ring(&self.arena, &projection_ring);
        debug!(
            "hole dug: {size} mouth vertices, entrance of {}",
            projection_ring.size()
        );
        Ok(Some(projection_ring))
    }

    fn unmark_hole(
        &mut self,
        origin: &Polyline,
        dest: &Polyline,
        first_index: usize,
        half: usize,
    ) {
        for i in 0..half {
            let a = origin.vertex((first_index + i) as isize);
            let b = dest.vertex((first_index + i) as isize);
            self.arena[a].in_hole = false;
            self.arena[b].in_hole = false;
        }
    }

    /// Builds the interior entrance ring of a hole: the mouth resampled to
    /// `entrance_size` vertices, projected onto the mouth's normal plane and
    /// rounded by repeated midpoint averaging (which also shrinks it inward).
    fn generate_projection(
        &mut self,
        hole: &Polyline,
    ) -> Result<InitialPolyline, CaveError> {
        let count = self.config.entrance_size;
        let m = hole.size();
        let barycenter = hole.barycenter(&self.arena);
        let normal = hole.normal(&self.arena);

        let mut prefix = Vec::with_capacity(m + 1);
        let mut total = 0.0;
        for i in 0..m as isize {
            prefix.push(total);
            let a = hole.position(&self.arena, i);
            let b = hole.position(&self.arena, i + 1);
            total += (b - a).norm();
        }
        prefix.push(total);

        let mut projection = InitialPolyline::new(count);
        let mut segment = 0usize;
        for k in 0..count {
            let target = total * k as Real / count as Real;
            while segment + 1 < m && prefix[segment + 1] <= target {
                segment += 1;
            }
            let span = prefix[segment + 1] - prefix[segment];
            let t = if span > EPSILON {
                (target - prefix[segment]) / span
            } else {
                0.0
            };
            let id = self.arena.lerp(
                hole.vertex(segment as isize),
                hole.vertex(segment as isize + 1),
                t,
            );
            projection.push_vertex(id)?;
        }

        if normal.norm() > EPSILON {
            let n = normal.normalize();
            for &id in projection.ring().ids() {
                let p = self.arena[id].pos;
                self.arena[id].pos = project_to_plane(p, barycenter, n);
            }
        }
        for _ in 0..self.config.smooth_iterations {
            projection.smooth_mean(&mut self.arena);
        }
        Ok(projection)
    }
}
