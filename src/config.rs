//! Tunable parameters of the generation engine. Every field mirrors a knob
//! the host application exposes; [`CaveConfig::default`] reproduces the
//! reference behaviour.

use crate::float_types::Real;

/// Traversal order of the branch work-list. The three strategies produce the
/// same local geometry but different cave topologies: depth-first orders grow
/// long corridors first, breadth-first fans out evenly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Depth-first via native recursion: a hole is fully generated the
    /// moment it is dug, before its parent tunnel continues.
    Recursive,
    /// Depth-first via an explicit stack (LIFO): holes are generated after
    /// their parent tunnel closes, newest first.
    Stack,
    /// Breadth-first via a queue (FIFO).
    Queue,
}

/// When a tunnel decides to dig a hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HolePolicy {
    /// Every k-th extrusion.
    EachK,
    /// Every k-th extrusion, gated by `hole_prob`.
    EachKProbability,
    /// Probability grows with the extrusion count: `hole_prob + n * lambda`.
    MoreExtrusionsMoreProbable,
    /// Probability shrinks with the extrusion count: `hole_prob - n * lambda`.
    MoreExtrusionsLessProbable,
}

/// Cadence of an independently-timed operation: after one finishes, the next
/// may fire once `base ± deviation` further extrusions have passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    pub base: i32,
    pub deviation: i32,
}

impl Cadence {
    pub const fn new(base: i32, deviation: i32) -> Self {
        Self { base, deviation }
    }
}

#[derive(Clone, Debug)]
pub struct CaveConfig {
    pub strategy: Strategy,

    /// Vertex count of a tunnel entrance (hole projections); forced even.
    pub entrance_size: usize,
    /// How many holes may fork into new tunnels (global branch budget).
    pub max_holes: i32,
    /// Maximum extrusion steps per branch.
    pub max_extrude_times: usize,
    /// Intersection-rejected attempts tolerated per step before the branch
    /// aborts.
    pub max_extrude_retries: usize,

    /// Probability that a given tunnel digs holes at all, decaying per branch.
    pub initial_hole_prob: Real,
    pub hole_prob_decay: Real,
    pub hole_policy: HolePolicy,
    pub hole_k: usize,
    pub hole_prob: Real,
    pub hole_lambda: Real,
    pub min_extrusions_for_hole: usize,
    pub hole_min_vertices: usize,
    pub hole_max_vertices: usize,
    /// Angular tolerance (degrees) when scanning a ring for the hole span.
    pub hole_angle_tolerance: Real,

    /// Regular extrusion distance range.
    pub distance_min: Real,
    pub distance_max: Real,
    /// Hole-preceding distance range (bigger, to make room for the fork).
    pub distance_hole_min: Real,
    pub distance_hole_max: Real,

    /// Keep corridors roughly walkable: clamp the y component of generated
    /// directions and reject holes that start too steep.
    pub walk_mode: bool,
    pub y_walk_limit: Real,
    /// Maximum angle (degrees) between a new direction and the current ring
    /// normal.
    pub max_turn_angle: Real,
    pub direction_tries: usize,

    pub scale_min: Real,
    pub scale_max: Real,
    /// Rotation draws are uniform in `[-rotation_limit, rotation_limit]`
    /// degrees.
    pub rotation_limit: Real,

    /// Multi-step operation duration range (extrusion steps).
    pub op_duration_min: i32,
    pub op_duration_max: i32,
    pub direction_cadence: Cadence,
    pub scale_cadence: Cadence,
    pub rotation_cadence: Cadence,
    pub decoration_cadence: Cadence,
    pub point_light_cadence: Cadence,

    pub decorations_enabled: bool,
    pub point_lights_enabled: bool,
    /// Maximum angle (degrees) between a decoration seed normal and vertical.
    pub decoration_max_angle: Real,

    /// Laplacian rounds applied to hole boundaries (and corner-cut passes on
    /// the gate and hole projections).
    pub smooth_iterations: usize,
    pub smooth_lambda: Real,

    /// Inward shrink of committed bounding boxes.
    pub aabb_epsilon: Real,
    /// World units of tunnel per unit of texture `v`.
    pub uv_factor: Real,

    /// Radius guard bounds stamped on every extruded ring.
    pub min_ring_radius: Real,
    pub max_ring_radius: Real,
}

impl Default for CaveConfig {
    fn default() -> Self {
        CaveConfig {
            strategy: Strategy::Stack,
            entrance_size: 8,
            max_holes: 15,
            max_extrude_times: 80,
            max_extrude_retries: 8,
            initial_hole_prob: 1.0,
            hole_prob_decay: 0.01,
            hole_policy: HolePolicy::EachKProbability,
            hole_k: 5,
            hole_prob: 0.4,
            hole_lambda: 0.02,
            min_extrusions_for_hole: 3,
            hole_min_vertices: 6,
            hole_max_vertices: 10,
            hole_angle_tolerance: 60.0,
            distance_min: 2.0,
            distance_max: 3.0,
            distance_hole_min: 8.0,
            distance_hole_max: 10.0,
            walk_mode: false,
            y_walk_limit: 0.35,
            max_turn_angle: 40.0,
            direction_tries: 10,
            scale_min: 0.5,
            scale_max: 1.5,
            rotation_limit: 30.0,
            op_duration_min: 1,
            op_duration_max: 4,
            direction_cadence: Cadence::new(4, 1),
            scale_cadence: Cadence::new(6, 2),
            rotation_cadence: Cadence::new(5, 2),
            decoration_cadence: Cadence::new(8, 3),
            point_light_cadence: Cadence::new(10, 3),
            decorations_enabled: true,
            point_lights_enabled: true,
            decoration_max_angle: 15.0,
            smooth_iterations: 3,
            smooth_lambda: 0.1,
            aabb_epsilon: 0.1,
            uv_factor: 50.0,
            min_ring_radius: 1.0,
            max_ring_radius: 25.0,
        }
    }
}
