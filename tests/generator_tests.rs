mod support;

use cavegen::float_types::PI;
use cavegen::generator::StepObserver;
use cavegen::mesh::CaveMesh;
use cavegen::{CaveConfig, CaveError, CaveGenerator, Real, Strategy, generate_cave};
use nalgebra::Point3;

fn octagon_gate() -> Vec<Point3<Real>> {
    (0..8)
        .map(|i| {
            let a = i as Real / 8.0 * 2.0 * PI;
            Point3::new(a.cos() * 3.0, a.sin() * 3.0, 0.0)
        })
        .collect()
}

fn small_config() -> CaveConfig {
    CaveConfig {
        max_extrude_times: 12,
        max_holes: 2,
        ..CaveConfig::default()
    }
}

#[test]
fn same_seed_reproduces_the_cave() {
    let gate = octagon_gate();
    let first = generate_cave(&gate, small_config(), 7).unwrap();
    let second = generate_cave(&gate, small_config(), 7).unwrap();
    assert_eq!(first, second);
}

#[test]
fn different_seeds_diverge() {
    let gate = octagon_gate();
    let first = generate_cave(&gate, small_config(), 7).unwrap();
    let other = generate_cave(&gate, small_config(), 8).unwrap();
    assert_ne!(first.tunnels, other.tunnels);
}

#[test]
fn buffers_are_consistent() {
    let gate = octagon_gate();
    let cave = generate_cave(&gate, small_config(), 11).unwrap();
    assert!(!cave.tunnels.is_empty());
    for buffers in cave.tunnels.iter().chain(std::iter::once(&cave.decorations)) {
        assert_eq!(buffers.positions.len(), buffers.uvs.len());
        assert_eq!(buffers.triangles.len() % 3, 0);
        let n = buffers.positions.len() as u32;
        assert!(buffers.triangles.iter().all(|&i| i < n));
        assert!(
            buffers
                .positions
                .iter()
                .all(|p| p.coords.iter().all(|c| c.is_finite()))
        );
    }
    for light in &cave.lights {
        assert!(light.coords.iter().all(|c| c.is_finite()));
    }
}

#[test]
fn every_strategy_terminates() {
    let gate = octagon_gate();
    for strategy in [Strategy::Recursive, Strategy::Stack, Strategy::Queue] {
        let config = CaveConfig {
            strategy,
            max_extrude_times: 8,
            max_holes: 3,
            ..CaveConfig::default()
        };
        let cave = generate_cave(&gate, config, 21).unwrap();
        assert!(!cave.tunnels.is_empty());
    }
}

#[test]
fn degenerate_gates_are_rejected() {
    let two_points = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
    assert_eq!(
        generate_cave(&two_points, small_config(), 1).unwrap_err(),
        CaveError::DegenerateGate
    );

    let collinear = vec![
        Point3::origin(),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(2.0, 2.0, 2.0),
    ];
    assert_eq!(
        generate_cave(&collinear, small_config(), 1).unwrap_err(),
        CaveError::DegenerateGate
    );
}

#[test]
fn exhausted_hole_budget_closes_branches_immediately() {
    let gate = octagon_gate();
    let config = CaveConfig {
        max_holes: 0,
        max_extrude_times: 10,
        ..CaveConfig::default()
    };
    let cave = generate_cave(&gate, config, 5).unwrap();
    assert_eq!(cave.tunnels.len(), 1);
    let tunnel = &cave.tunnels[0];
    // A spent budget stops extrusion outright: the gate ring (8 + seam) is
    // capped as a stub, not grown into a corridor.
    assert_eq!(tunnel.positions.len(), 10);
    assert_eq!(tunnel.triangles.len() / 3, 9);
}

#[test]
fn remaining_budget_allows_a_full_corridor() {
    let gate = octagon_gate();
    let config = CaveConfig {
        max_holes: 1,
        max_extrude_times: 10,
        ..CaveConfig::default()
    };
    let cave = generate_cave(&gate, config, 5).unwrap();
    // The gate branch keeps its budget at zero while it runs, so it extrudes.
    assert!(cave.tunnels[0].positions.len() > 10);
}

struct Counting {
    steps: usize,
    branches: usize,
}

impl StepObserver for Counting {
    fn on_step(&mut self, _mesh: &CaveMesh) {
        self.steps += 1;
    }

    fn on_branch_closed(&mut self, _mesh: &CaveMesh) {
        self.branches += 1;
    }
}

#[test]
fn observer_sees_every_step_and_branch() {
    let gate = octagon_gate();
    let mut observer = Counting {
        steps: 0,
        branches: 0,
    };
    let generator = CaveGenerator::new(small_config(), 13);
    let cave = generator.generate_with(&gate, &mut observer).unwrap();
    assert!(observer.steps > 0);
    assert_eq!(observer.branches, cave.tunnels.len());
}

#[test]
fn disabled_decorations_leave_the_buffer_empty() {
    let gate = octagon_gate();
    let config = CaveConfig {
        decorations_enabled: false,
        point_lights_enabled: false,
        max_extrude_times: 10,
        max_holes: 1,
        ..CaveConfig::default()
    };
    let cave = generate_cave(&gate, config, 9).unwrap();
    assert!(cave.decorations.positions.is_empty());
    assert!(cave.decorations.triangles.is_empty());
    assert!(cave.lights.is_empty());
}
