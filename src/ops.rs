//! Per-extrusion scheduled operations. Each sub-operation is a two-state
//! machine: idle (`countdown <= 0`) or active (`countdown > 0`, decremented
//! once per applied step). A separate wait counter ticks down every step and
//! gates when a fresh activation may be rolled.

use crate::float_types::{EPSILON, Real};
use nalgebra::{Unit, Vector3};

/// A scalar (or one-shot) operation holding a per-step value, an activation
/// countdown and a cooldown wait.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation<T: Clone> {
    value: T,
    countdown: i32,
    wait: i32,
}

impl<T: Clone> Operation<T> {
    pub fn new(value: T) -> Self {
        Operation {
            value,
            countdown: 0,
            wait: 0,
        }
    }

    pub fn active(&self) -> bool {
        self.countdown > 0
    }

    /// Idle and the cooldown has expired: a new activation may be rolled.
    pub fn need_generate(&self) -> bool {
        !self.active() && self.wait <= 0
    }

    /// Activates for `steps` applications of `value`.
    pub fn force(&mut self, steps: i32, value: T) {
        self.countdown = steps;
        self.value = value;
    }

    /// Returns the step value and burns one countdown tick.
    pub fn apply(&mut self) -> T {
        self.countdown -= 1;
        self.value.clone()
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn countdown(&self) -> i32 {
        self.countdown
    }

    pub fn reset(&mut self) {
        self.countdown = 0;
    }

    pub fn wait(&self) -> i32 {
        self.wait
    }

    pub fn set_wait(&mut self, wait: i32) {
        self.wait = wait;
    }

    pub fn tick_wait(&mut self) {
        self.wait -= 1;
    }
}

/// Direction operation: spherical interpolation from a start to an end
/// direction spread over the activation's steps. While idle it reports the
/// end value, so the tunnel keeps its last heading.
#[derive(Debug, Clone, PartialEq)]
pub struct LerpOperation {
    start: Vector3<Real>,
    end: Vector3<Real>,
    countdown: i32,
    num_steps: i32,
    wait: i32,
}

impl Default for LerpOperation {
    fn default() -> Self {
        LerpOperation {
            start: Vector3::zeros(),
            end: Vector3::zeros(),
            countdown: 0,
            num_steps: 0,
            wait: 0,
        }
    }
}

impl LerpOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> bool {
        self.countdown > 0
    }

    pub fn need_generate(&self) -> bool {
        !self.active() && self.wait <= 0
    }

    pub fn end_value(&self) -> Vector3<Real> {
        self.end
    }

    /// Sets the heading without starting an interpolation.
    pub fn set_end(&mut self, end: Vector3<Real>) {
        self.end = end;
    }

    /// Starts interpolating from the current heading towards `target` over
    /// `steps` extrusions.
    pub fn start_towards(&mut self, steps: i32, target: Vector3<Real>) {
        self.start = self.end;
        self.end = target;
        self.countdown = steps;
        self.num_steps = steps;
    }

    /// Current step direction: slerps while active, otherwise the heading.
    pub fn apply(&mut self) -> Vector3<Real> {
        if !self.active() {
            return self.end;
        }
        self.countdown -= 1;
        let t = (self.num_steps - self.countdown) as Real / self.num_steps as Real;
        slerp_direction(self.start, self.end, t)
    }

    pub fn wait(&self) -> i32 {
        self.wait
    }

    pub fn set_wait(&mut self, wait: i32) {
        self.wait = wait;
    }

    pub fn tick_wait(&mut self) {
        self.wait -= 1;
    }
}

/// Spherical interpolation between two directions, renormalized. Falls back
/// to linear interpolation when either input is (near) zero or the two are
/// antipodal.
fn slerp_direction(a: Vector3<Real>, b: Vector3<Real>, t: Real) -> Vector3<Real> {
    match (Unit::try_new(a, EPSILON), Unit::try_new(b, EPSILON)) {
        (Some(ua), Some(ub)) => match ua.try_slerp(&ub, t, EPSILON) {
            Some(u) => u.into_inner(),
            None => ub.into_inner(),
        },
        _ => {
            let v = a + (b - a) * t;
            if v.norm() > EPSILON { v.normalize() } else { b }
        },
    }
}

/// Kind of decoration geometry grown from a tunnel wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationKind {
    Stalagmite,
    Stalactite,
    Pillar,
}

/// The full bundle of operations scheduled for the current state of a tunnel
/// being extruded. Cloned (cheap, all plain data) before risky steps so a
/// rejected extrusion can revert to the prior schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionOperations {
    distance: Operation<Real>,
    direction: LerpOperation,
    scale: Operation<Real>,
    rotation: Operation<Real>,
    hole: bool,
    decoration: Operation<Option<DecorationKind>>,
    point_light: Operation<bool>,
    /// The one committed bounding box this extrusion may overlap.
    can_intersect: Option<usize>,
}

impl Default for ExtrusionOperations {
    fn default() -> Self {
        ExtrusionOperations {
            distance: Operation::new(0.0),
            direction: LerpOperation::new(),
            scale: Operation::new(1.0),
            rotation: Operation::new(0.0),
            hole: false,
            decoration: Operation::new(None),
            point_light: Operation::new(false),
            can_intersect: None,
        }
    }
}

impl ExtrusionOperations {
    /// A plain extrusion: no scheduled operation, no hole.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance(&self) -> &Operation<Real> {
        &self.distance
    }

    pub fn distance_mut(&mut self) -> &mut Operation<Real> {
        &mut self.distance
    }

    pub fn direction(&self) -> &LerpOperation {
        &self.direction
    }

    pub fn direction_mut(&mut self) -> &mut LerpOperation {
        &mut self.direction
    }

    pub fn scale(&self) -> &Operation<Real> {
        &self.scale
    }

    pub fn scale_mut(&mut self) -> &mut Operation<Real> {
        &mut self.scale
    }

    pub fn rotation(&self) -> &Operation<Real> {
        &self.rotation
    }

    pub fn rotation_mut(&mut self) -> &mut Operation<Real> {
        &mut self.rotation
    }

    pub fn hole(&self) -> bool {
        self.hole
    }

    pub fn set_hole(&mut self, hole: bool) {
        self.hole = hole;
    }

    pub fn decoration(&self) -> &Operation<Option<DecorationKind>> {
        &self.decoration
    }

    pub fn decoration_mut(&mut self) -> &mut Operation<Option<DecorationKind>> {
        &mut self.decoration
    }

    pub fn point_light(&self) -> &Operation<bool> {
        &self.point_light
    }

    pub fn point_light_mut(&mut self) -> &mut Operation<bool> {
        &mut self.point_light
    }

    pub fn can_intersect(&self) -> Option<usize> {
        self.can_intersect
    }

    pub fn set_can_intersect(&mut self, index: Option<usize>) {
        self.can_intersect = index;
    }

    /// True when nothing beyond the plain extrusion is scheduled this step.
    pub fn just_extrude(&self) -> bool {
        !(self.distance.active()
            || self.direction.active()
            || self.scale.active()
            || self.rotation.active()
            || self.hole)
    }

    /// Takes the one-shot decoration flag, if armed.
    pub fn take_decoration(&mut self) -> Option<DecorationKind> {
        if self.decoration.active() {
            self.decoration.apply()
        } else {
            None
        }
    }

    /// Takes the one-shot point-light flag.
    pub fn take_point_light(&mut self) -> bool {
        if self.point_light.active() {
            self.point_light.apply()
        } else {
            false
        }
    }

    /// Ticks every cooldown; called once per committed extrusion step.
    pub fn tick_waits(&mut self) {
        self.direction.tick_wait();
        self.scale.tick_wait();
        self.rotation.tick_wait();
        self.decoration.tick_wait();
        self.point_light.tick_wait();
    }
}
