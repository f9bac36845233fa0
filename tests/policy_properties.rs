extern crate float_eq;
extern crate lander;
mod common;

use common::*;
use float_eq::*;
use lander::policy::{decide, raw_command};
use lander::*;
use rstest::rstest;

fn sample_states() -> Vec<StateVector> {
    let mut states = vec![];
    for &y in &[0.0, 0.03, 0.08, 0.1, 0.12, 0.3, 0.9, 1.4] {
        for &yv in &[-1.2, -0.3, -0.09, -0.05, 0.0, 0.4] {
            for &(x, xv, theta, omega) in &[
                (0.0, 0.0, 0.0, 0.0),
                (-0.4, 0.2, 0.1, -0.05),
                (0.5, -0.3, -0.3, 0.2),
            ] {
                states.push(airborne(x, y, xv, yv, theta, omega));
                states.push(landed(x, y, xv, yv, theta, omega));
            }
        }
    }
    states
}

#[test]
fn decisions_are_deterministic() {
    for s in sample_states() {
        for mode in [ActionSpaceMode::Continuous, ActionSpaceMode::Discrete] {
            assert_eq!(decide(&s, mode), decide(&s, mode), "{s:?}");
        }
    }
}

#[test]
fn raw_command_does_not_depend_on_mode() {
    for s in sample_states() {
        let raw = raw_command(&s);
        let (main, lateral) = continuous_values(&decide(&s, ActionSpaceMode::Continuous));
        assert_eq!((main, lateral), (raw.y_booster, raw.x_booster));

        let a = discrete_value(&decide(&s, ActionSpaceMode::Discrete));
        assert_eq!(a, lander::policy::quantize(&raw, &s));
    }
}

#[test]
fn landed_or_ascending_never_brakes() {
    for s in sample_states() {
        if !s.is_flying() || s.yv >= 0. {
            assert_eq!(raw_command(&s).y_booster, 0., "{s:?}");
        }
    }
}

#[test]
fn braking_term_switches_at_ten_centimetres() {
    let eps = 1e-6;
    let high = raw_command(&airborne(0., 0.10 + eps, 0., -1., 0., 0.));
    let low = raw_command(&airborne(0., 0.10 - eps, 0., -1., 0., 0.));
    assert_float_eq!(high.y_booster, 1. - (0.10 + eps) / 7., abs <= 1e-12);
    assert_float_eq!(low.y_booster, 1. + 0.10, abs <= 1e-12);
}

#[rstest]
// y_booster = 1.1 - 0.7 / 7 = 1.0, x_booster = 0.08 * 2.5 = 0.2
#[case::main_dominates(airborne(0., 0.7, 0., -1.1, 0., 0.08), DiscreteAction::FireMain)]
#[case::near_ground_coast(airborne(0., 0.03, 0., 0., 0., 0.), DiscreteAction::Noop)]
#[case::near_ground_brake(airborne(0., 0.03, 0., -0.2, 0., 0.2), DiscreteAction::FireMain)]
#[case::fire_left(airborne(0., 0.5, 0., -0.05, 0., -0.24), DiscreteAction::FireLeft)]
#[case::fire_right(airborne(0., 0.5, 0., -0.05, 0., 0.24), DiscreteAction::FireRight)]
#[case::stable_coast(airborne(0., 0.3, 0., 0., 0., 0.12), DiscreteAction::Noop)]
#[case::drifting_right_of_pad(airborne(0.4, 0.8, 0.1, 0., 0., 0.), DiscreteAction::FireLeft)]
#[case::resting_on_pad(landed(0., 0., 0., 0., 0., 0.), DiscreteAction::Noop)]
fn discrete_decisions(#[case] s: StateVector, #[case] expected: DiscreteAction) {
    let policy = LanderPolicy::new(ActionSpaceMode::Discrete);
    assert_eq!(discrete_value(&policy.decide(&s)), expected);
}

#[test]
fn tilt_and_spin_push_towards_upright() {
    let (_, lateral) = continuous_values(&decide(
        &airborne(0., 1., 0., 0., 0.2, 0.1),
        ActionSpaceMode::Continuous,
    ));
    assert_float_eq!(lateral, 0.2f64.sin() * 2.5 + 0.25, abs <= 1e-12);
    insta::assert_debug_snapshot!(
        decide(&airborne(0., 1., 0., 0., 0.2, 0.1), ActionSpaceMode::Discrete),
        @r###"
Discrete(
    FireRight,
)
"###
    );
}

#[test]
fn policy_is_shareable_across_threads() {
    let policy = LanderPolicy::new(ActionSpaceMode::Discrete);
    let states = sample_states();
    let expected = states.iter().map(|s| policy.decide(s)).collect::<Vec<_>>();

    std::thread::scope(|scope| {
        let handles = (0..4)
            .map(|_| scope.spawn(|| states.iter().map(|s| policy.decide(s)).collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}
