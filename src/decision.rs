//! The stochastic policy: every random draw of the generation goes through
//! one [`DecisionGenerator`] holding an injected, seedable RNG, so a fixed
//! seed reproduces the cave exactly.

use crate::config::{Cadence, CaveConfig, HolePolicy};
use crate::float_types::{EPSILON, Real};
use crate::geometry::{Polyline, VertexArena, angle_degrees};
use crate::ops::{DecorationKind, ExtrusionOperations};
use log::trace;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Where a hole is dug on a ring: `size` vertices starting at `first_index`,
/// split evenly between the two cross-sections that form the hole mouth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleSpan {
    pub first_index: usize,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct DecisionGenerator {
    config: CaveConfig,
    rng: StdRng,
}

impl DecisionGenerator {
    pub fn new(config: CaveConfig, rng: StdRng) -> Self {
        DecisionGenerator { config, rng }
    }

    pub fn from_seed(config: CaveConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Extrusion distance: the `big` range precedes a hole, to leave room
    /// for the fork.
    pub fn generate_distance(&mut self, big: bool) -> Real {
        if big {
            self.rng
                .gen_range(self.config.distance_hole_min..=self.config.distance_hole_max)
        } else {
            self.rng
                .gen_range(self.config.distance_min..=self.config.distance_max)
        }
    }

    /// Draws a new normalized extrusion direction, walk-limited in y and
    /// constrained to turn at most `max_turn_angle` degrees away from
    /// `current`. Returns `None` when no draw passes within the try budget;
    /// the caller treats that as "no direction change this step".
    pub fn generate_direction(&mut self, current: Vector3<Real>) -> Option<Vector3<Real>> {
        for _ in 0..self.config.direction_tries {
            let x = self.rng.gen_range(-1.0..=1.0);
            let y = if self.config.walk_mode {
                self.rng
                    .gen_range(-self.config.y_walk_limit..=self.config.y_walk_limit)
            } else {
                self.rng.gen_range(-1.0..=1.0)
            };
            let z = self.rng.gen_range(-1.0..=1.0);
            let dir = Vector3::new(x, y, z);
            if dir.norm() <= EPSILON {
                continue;
            }
            let dir = dir.normalize();
            if current.norm() <= EPSILON
                || angle_degrees(&dir, &current) <= self.config.max_turn_angle
            {
                return Some(dir);
            }
        }
        None
    }

    pub fn generate_scale(&mut self) -> Real {
        self.rng
            .gen_range(self.config.scale_min..=self.config.scale_max)
    }

    /// Rotation in degrees, symmetric about zero.
    pub fn generate_rotation(&mut self) -> Real {
        self.rng
            .gen_range(-self.config.rotation_limit..=self.config.rotation_limit)
    }

    /// Whether this step should dig a hole. Gated by the warm-up, the
    /// per-tunnel probability (decaying with branch depth) and the selected
    /// policy.
    pub fn decide_hole(&mut self, num_extrude: usize, tunnel_prob: Real) -> bool {
        if num_extrude < self.config.min_extrusions_for_hole {
            return false;
        }
        if self.rng.gen_range(0.0..1.0) > tunnel_prob {
            return false;
        }
        let r: Real = self.rng.gen_range(0.0..1.0);
        let k = self.config.hole_k.max(1);
        match self.config.hole_policy {
            HolePolicy::EachK => num_extrude % k == 0,
            HolePolicy::EachKProbability => {
                num_extrude % k == 0 && r <= self.config.hole_prob
            },
            HolePolicy::MoreExtrusionsMoreProbable => {
                r <= self.config.hole_prob + num_extrude as Real * self.config.hole_lambda
            },
            HolePolicy::MoreExtrusionsLessProbable => {
                r <= self.config.hole_prob - num_extrude as Real * self.config.hole_lambda
            },
        }
    }

    /// Picks the vertex span of a hole: draw an approximate outward
    /// direction, find the first ring vertex (wrapping, duplicated closing
    /// vertex ignored) whose direction from the barycenter lies within the
    /// angular tolerance, then count how many consecutive vertices stay in
    /// tolerance. The span is doubled (it is split across both rings of the
    /// mouth), forced even and clamped.
    pub fn where_to_dig(
        &mut self,
        arena: &VertexArena,
        ring: &Polyline,
    ) -> Option<HoleSpan> {
        let n = ring.size().saturating_sub(1);
        if n < 3 {
            return None;
        }
        let approximate = self.generate_direction(Vector3::zeros())?;
        let barycenter = ring.barycenter(arena);
        let within = |arena: &VertexArena, i: usize| {
            let out = ring.position(arena, i as isize) - barycenter;
            angle_degrees(&out, &approximate) <= self.config.hole_angle_tolerance
        };
        let first_index = (0..n).find(|&i| within(arena, i))?;
        let mut count = 1;
        while count < n && within(arena, (first_index + count) % n) {
            count += 1;
        }
        let max = (self.config.hole_max_vertices / 2) * 2;
        let size = (2 * count).min(max).min((n / 2) * 2);
        if size < self.config.hole_min_vertices {
            trace!("hole span of {size} vertices below minimum, not digging");
            return None;
        }
        Some(HoleSpan { first_index, size })
    }

    fn roll_wait(&mut self, cadence: Cadence) -> i32 {
        cadence.base + self.rng.gen_range(-cadence.deviation..=cadence.deviation)
    }

    fn roll_duration(&mut self) -> i32 {
        self.rng
            .gen_range(self.config.op_duration_min..=self.config.op_duration_max)
    }

    /// Fresh operation bundle for a new branch: the first extrusion is
    /// always a big one, heading along the seed ring's normal.
    pub fn new_operation(
        &mut self,
        arena: &VertexArena,
        ring: &Polyline,
    ) -> ExtrusionOperations {
        let mut op = ExtrusionOperations::new();
        op.distance_mut().force(1, self.generate_distance(true));
        op.direction_mut().set_end(ring.normal(arena));
        let direction_wait = self.roll_wait(self.config.direction_cadence);
        op.direction_mut().set_wait(direction_wait);
        let scale_wait = self.roll_wait(self.config.scale_cadence);
        op.scale_mut().set_wait(scale_wait);
        let rotation_wait = self.roll_wait(self.config.rotation_cadence);
        op.rotation_mut().set_wait(rotation_wait);
        let decoration_wait = self.roll_wait(self.config.decoration_cadence);
        op.decoration_mut().set_wait(decoration_wait);
        let light_wait = self.roll_wait(self.config.point_light_cadence);
        op.point_light_mut().set_wait(light_wait);
        op
    }

    /// Rolls the schedule forward after a committed step: distance is always
    /// refreshed, the hole flag re-decided, and each cooled-down concern
    /// independently starts a new multi-step activation. The independent
    /// timers give overlapping pulses rather than one operation at a time.
    pub fn next_operation(
        &mut self,
        arena: &VertexArena,
        ring: &Polyline,
        op: &mut ExtrusionOperations,
        num_extrude: usize,
        tunnel_prob: Real,
    ) {
        op.tick_waits();

        let hole = self.decide_hole(num_extrude, tunnel_prob);
        op.set_hole(hole);
        op.distance_mut().force(1, self.generate_distance(hole));

        if op.direction().need_generate() {
            if let Some(target) = self.generate_direction(ring.normal(arena)) {
                let steps = self.roll_duration();
                op.direction_mut().start_towards(steps, target);
            }
            let wait = self.roll_wait(self.config.direction_cadence);
            op.direction_mut().set_wait(wait);
        }

        if op.scale().need_generate() {
            let steps = self.roll_duration();
            let target = self.generate_scale();
            // Spread the target ratio across the steps; applying every step
            // compounds back to it.
            op.scale_mut()
                .force(steps, target.powf(1.0 / steps as Real));
            let wait = self.roll_wait(self.config.scale_cadence);
            op.scale_mut().set_wait(wait);
        }

        if op.rotation().need_generate() {
            let steps = self.roll_duration();
            let total = self.generate_rotation();
            op.rotation_mut().force(steps, total / steps as Real);
            let wait = self.roll_wait(self.config.rotation_cadence);
            op.rotation_mut().set_wait(wait);
        }

        if self.config.decorations_enabled && op.decoration().need_generate() {
            let kind = match self.rng.gen_range(0..3) {
                0 => DecorationKind::Stalagmite,
                1 => DecorationKind::Stalactite,
                _ => DecorationKind::Pillar,
            };
            op.decoration_mut().force(1, Some(kind));
            let wait = self.roll_wait(self.config.decoration_cadence);
            op.decoration_mut().set_wait(wait);
        }

        if self.config.point_lights_enabled && op.point_light().need_generate() {
            op.point_light_mut().force(1, true);
            let wait = self.roll_wait(self.config.point_light_cadence);
            op.point_light_mut().set_wait(wait);
        }
    }

    /// Number of extrusion steps a decoration tube takes.
    pub fn decoration_steps(&mut self) -> usize {
        self.rng.gen_range(4..10)
    }

    /// Fraction of the available room a stalagmite is allowed to fill.
    pub fn decoration_size_factor(&mut self) -> Real {
        self.rng.gen_range(0.45..=0.75)
    }
}
