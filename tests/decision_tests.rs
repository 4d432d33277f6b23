mod support;

use cavegen::decision::DecisionGenerator;
use cavegen::geometry::{VertexArena, angle_degrees};
use cavegen::{CaveConfig, HolePolicy};
use nalgebra::Vector3;
use support::circle_ring;

#[test]
fn distances_stay_in_their_ranges() {
    let mut decision = DecisionGenerator::from_seed(CaveConfig::default(), 1);
    for _ in 0..200 {
        let small = decision.generate_distance(false);
        assert!((2.0..=3.0).contains(&small));
        let big = decision.generate_distance(true);
        assert!((8.0..=10.0).contains(&big));
    }
}

#[test]
fn scale_and_rotation_stay_in_their_ranges() {
    let mut decision = DecisionGenerator::from_seed(CaveConfig::default(), 2);
    for _ in 0..200 {
        assert!((0.5..=1.5).contains(&decision.generate_scale()));
        let r = decision.generate_rotation();
        assert!((-30.0..=30.0).contains(&r));
    }
}

#[test]
fn directions_respect_the_turn_limit() {
    let mut decision = DecisionGenerator::from_seed(CaveConfig::default(), 3);
    let current = Vector3::new(0.0, 0.0, 1.0);
    for _ in 0..100 {
        if let Some(dir) = decision.generate_direction(current) {
            assert!(angle_degrees(&dir, &current) <= 40.0 + 1e-3);
            assert!((dir.norm() - 1.0).abs() < 1e-4);
        }
    }
}

/// With a zero turn tolerance no draw can pass: the bounded retry loop must
/// give up rather than hang.
#[test]
fn impossible_turn_limit_gives_up() {
    let config = CaveConfig {
        max_turn_angle: 0.0,
        ..CaveConfig::default()
    };
    for seed in 0..10 {
        let mut decision = DecisionGenerator::from_seed(config.clone(), seed);
        assert_eq!(decision.generate_direction(Vector3::y()), None);
    }
}

#[test]
fn no_holes_before_the_warm_up() {
    let mut decision = DecisionGenerator::from_seed(CaveConfig::default(), 4);
    for n in 0..3 {
        for _ in 0..50 {
            assert!(!decision.decide_hole(n, 1.0));
        }
    }
}

#[test]
fn each_k_policy_is_periodic() {
    let config = CaveConfig {
        hole_policy: HolePolicy::EachK,
        hole_k: 5,
        ..CaveConfig::default()
    };
    let mut decision = DecisionGenerator::from_seed(config, 5);
    assert!(decision.decide_hole(5, 1.0));
    assert!(!decision.decide_hole(6, 1.0));
    assert!(decision.decide_hole(10, 1.0));
}

#[test]
fn zero_tunnel_probability_never_digs() {
    let mut decision = DecisionGenerator::from_seed(CaveConfig::default(), 6);
    for n in 3..100 {
        assert!(!decision.decide_hole(n, 0.0));
    }
}

#[test]
fn hole_spans_are_even_and_bounded() {
    let mut arena = VertexArena::new();
    let ring = circle_ring(&mut arena, 16, 3.0, 0.0);
    let config = CaveConfig::default();
    let mut dug = 0;
    for seed in 0..40 {
        let mut decision = DecisionGenerator::from_seed(config.clone(), seed);
        if let Some(span) = decision.where_to_dig(&arena, &ring) {
            assert_eq!(span.size % 2, 0);
            assert!(span.size <= config.hole_max_vertices);
            assert!(span.size >= config.hole_min_vertices);
            assert!(span.first_index < ring.size() - 1);
            dug += 1;
        }
    }
    assert!(dug > 0, "a 16-gon should accept some hole spans");
}

#[test]
fn tiny_rings_are_never_dug() {
    let mut arena = VertexArena::new();
    let ring = circle_ring(&mut arena, 3, 1.0, 0.0);
    let mut decision = DecisionGenerator::from_seed(CaveConfig::default(), 7);
    for _ in 0..20 {
        assert_eq!(decision.where_to_dig(&arena, &ring), None);
    }
}
