//! Decoration geometry grown from tunnel walls: stalagmites rising from the
//! floor, stalactites hanging from the ceiling, and pillars joining the two.
//! All of it accumulates into the generator's shared decoration mesh, wound
//! outside-facing since these tubes are seen from without.

use crate::errors::CaveError;
use crate::float_types::{EPSILON, Real};
use crate::geometry::{InitialPolyline, Polyline, VertexId, angle_degrees};
use crate::ops::DecorationKind;
use log::trace;
use nalgebra::{Point3, Vector2, Vector3};

use super::CaveGenerator;

/// Tip radius a spike tapers down to.
const SPIKE_FINAL_RADIUS: Real = 0.1;
/// Pillars stay thicker; both half-tubes taper to this waist radius.
const PILLAR_FINAL_RADIUS: Real = 0.3;

impl CaveGenerator {
    /// Grows one decoration between two consecutive wall rings. Silently does
    /// nothing when the wall offers no acceptable seed quad.
    pub(crate) fn make_decoration(
        &mut self,
        kind: DecorationKind,
        origin: &Polyline,
        dest: &Polyline,
    ) -> Result<(), CaveError> {
        match kind {
            // A stalactite hangs from the ceiling, so its seed quad faces up;
            // a stalagmite sits on the floor and faces down.
            DecorationKind::Stalactite => self.make_spike(origin, dest, Vector3::y()),
            DecorationKind::Stalagmite => self.make_spike(origin, dest, -Vector3::y()),
            DecorationKind::Pillar => self.make_pillar(origin, dest),
        }
    }

    /// Picks the wall quad between the two rings whose normal points closest
    /// to `objective`, or `None` when even the best candidate misses it by
    /// more than the configured angle.
    fn decoration_seed(
        &mut self,
        origin: &Polyline,
        dest: &Polyline,
        objective: Vector3<Real>,
    ) -> Option<Vec<VertexId>> {
        let mut best: Option<(Real, Vec<VertexId>)> = None;
        // The duplicated closing vertex aliases position 0; skip its quad.
        for i in 0..origin.size() as isize - 1 {
            let ids = vec![
                origin.vertex(i + 1),
                origin.vertex(i),
                dest.vertex(i),
                dest.vertex(i + 1),
            ];
            let probe = Polyline::from_ids(ids.clone());
            let angle = angle_degrees(&probe.normal(&self.arena), &objective);
            if best.as_ref().is_none_or(|(a, _)| angle < *a) {
                best = Some((angle, ids));
            }
        }
        let (angle, ids) = best?;
        if angle > self.config.decoration_max_angle {
            trace!("no decoration seed within {} degrees", self.config.decoration_max_angle);
            return None;
        }
        Some(ids)
    }

    /// Deep-copies a seed quad into fresh vertices (with their own UVs and a
    /// duplicated seam vertex) and registers it with the decoration mesh. The
    /// copy keeps the decoration's topology independent of the wall it grew
    /// from.
    fn materialize_seed(&mut self, ids: &[VertexId]) -> Result<Polyline, CaveError> {
        let positions: Vec<Point3<Real>> =
            ids.iter().map(|&id| self.arena[id].pos).collect();
        let mut seed = InitialPolyline::new(positions.len());
        for pos in positions {
            seed.push_position(&mut self.arena, pos)?;
        }
        seed.generate_uvs(&mut self.arena, 0.0);
        seed.duplicate_first_vertex(&mut self.arena);
        let mut ring = seed.into_ring()?;
        // Decorations may taper all the way down.
        ring.set_min_radius(0.0);
        self.decorations.add_ring(&mut self.arena, &ring);
        Ok(ring)
    }

    fn make_spike(
        &mut self,
        origin: &Polyline,
        dest: &Polyline,
        objective: Vector3<Real>,
    ) -> Result<(), CaveError> {
        let Some(ids) = self.decoration_seed(origin, dest, objective) else {
            return Ok(());
        };
        let probe = Polyline::from_ids(ids.clone());
        let direction = probe.normal(&self.arena);
        if direction.norm() <= EPSILON {
            return Ok(());
        }

        // Room available: distance from the wall-side edge of the seed to the
        // ring vertex the spike grows towards.
        let wall_mid = Point3::from(
            (self.arena[ids[0]].pos.coords + self.arena[ids[1]].pos.coords) / 2.0,
        );
        let mut min_angle = Real::MAX;
        let mut counterpart = origin.position(&self.arena, 0);
        for i in 0..origin.size() as isize - 1 {
            let p = origin.position(&self.arena, i);
            let angle = angle_degrees(&direction, &(p - wall_mid));
            if angle < min_angle {
                min_angle = angle;
                counterpart = p;
            }
        }
        let room = (counterpart - wall_mid).norm();
        let length = room * self.decision.decoration_size_factor();
        let steps = self.decision.decoration_steps();
        let distance = length / steps as Real;

        let ring = self.materialize_seed(&ids)?;
        let scale = taper_scale(2.0 * ring.radius(&self.arena), SPIKE_FINAL_RADIUS, steps);
        // Texture v runs with the growth direction: down the wall for
        // stalagmites, up for stalactites.
        let v_step = if objective.y > 0.0 { 1.0 } else { -1.0 };
        let uv_incr = Vector2::new(0.0, v_step * distance / self.config.uv_factor);
        self.extrude_decoration(steps, direction, distance, scale, uv_incr, ring)
    }

    /// A pillar is two spikes grown towards each other: a floor seed, then a
    /// second seed found opposite the first one, each half covering half the
    /// span between their barycenters.
    fn make_pillar(
        &mut self,
        origin: &Polyline,
        dest: &Polyline,
    ) -> Result<(), CaveError> {
        let Some(floor_ids) = self.decoration_seed(origin, dest, -Vector3::y()) else {
            return Ok(());
        };
        let floor_probe = Polyline::from_ids(floor_ids.clone());
        let floor_normal = floor_probe.normal(&self.arena);
        let Some(ceil_ids) = self.decoration_seed(origin, dest, -floor_normal) else {
            return Ok(());
        };
        let ceil_probe = Polyline::from_ids(ceil_ids.clone());
        let span = ceil_probe.barycenter(&self.arena) - floor_probe.barycenter(&self.arena);
        if span.norm() <= EPSILON {
            return Ok(());
        }
        // Only near-vertical pillars look right.
        if angle_degrees(&span, &-Vector3::y()) > self.config.decoration_max_angle {
            trace!("pillar span too slanted, skipping");
            return Ok(());
        }

        let steps = self.decision.decoration_steps();
        let distance = span.norm() / 2.0 / steps as Real;
        let direction = span.normalize();

        let floor_ring = self.materialize_seed(&floor_ids)?;
        let scale =
            taper_scale(2.0 * floor_ring.radius(&self.arena), PILLAR_FINAL_RADIUS, steps);
        let uv_incr = Vector2::new(0.0, -distance / self.config.uv_factor);
        self.extrude_decoration(steps, direction, distance, scale, uv_incr, floor_ring)?;

        let ceil_ring = self.materialize_seed(&ceil_ids)?;
        let scale =
            taper_scale(2.0 * ceil_ring.radius(&self.arena), PILLAR_FINAL_RADIUS, steps);
        self.extrude_decoration(steps, -direction, distance, scale, -uv_incr, ceil_ring)
    }

    /// Extrudes a decoration tube `steps` rings out from its seed, scaling
    /// each ring by the per-step taper, and caps the tip.
    fn extrude_decoration(
        &mut self,
        steps: usize,
        direction: Vector3<Real>,
        distance: Real,
        scale: Real,
        uv_incr: Vector2<Real>,
        seed: Polyline,
    ) -> Result<(), CaveError> {
        let mut current = seed;
        for _ in 0..steps {
            let next = self.offset_ring_with(&current, direction, distance, uv_incr);
            next.scale(&mut self.arena, scale);
            self.decorations.add_ring(&mut self.arena, &next);
            self.decorations
                .triangulate_rings_outside(&self.arena, &current, &next)?;
            current = next;
        }
        self.decorations.close_ring_outside(&mut self.arena, &current);
        Ok(())
    }
}

/// Per-step scale factor that compounds from the seed diameter down to
/// `final_radius` over `steps` applications.
fn taper_scale(diameter: Real, final_radius: Real, steps: usize) -> Real {
    if diameter <= EPSILON || steps == 0 {
        return 1.0;
    }
    (final_radius / diameter).powf(1.0 / steps as Real)
}

#[cfg(test)]
mod tests {
    use super::taper_scale;
    use crate::float_types::Real;

    #[test]
    fn taper_compounds_to_the_target_ratio() {
        let diameter: Real = 4.0;
        let final_radius: Real = 0.1;
        let steps = 5;
        let scale = taper_scale(diameter, final_radius, steps);
        let compound = scale.powi(steps as i32);
        assert!((compound - final_radius / diameter).abs() < 1e-5);
    }

    #[test]
    fn degenerate_seed_does_not_taper() {
        assert_eq!(taper_scale(0.0, 0.1, 5), 1.0);
        assert_eq!(taper_scale(4.0, 0.1, 0), 1.0);
    }
}
