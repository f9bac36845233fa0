extern crate lander;
mod common;

use common::*;
use lander::*;

// These need a gymnasium http server listening on API_URL.

#[test]
#[ignore]
fn discrete_lander_e2e() {
    let config = ConfigFile::from_json_str(r#"{"Echelon 0": {"continuous": false}}"#)
        .unwrap()
        .echelon(0)
        .unwrap();
    let mut env = Environment::new(API_URL, &config).unwrap();
    assert_eq!(env.action_space(), &ObsActSpace::Discrete { n: 4 });
    assert!(matches!(
        env.observation_space(),
        ObsActSpace::Box { shape, .. } if shape[..] == [8]
    ));

    let s = env.reset(Some(2718)).unwrap();
    assert!(s.is_flying());
    assert!(s.y > 1.);

    let sample = env.action_space_sample().unwrap();
    assert_eq!(sample.mode(), ActionSpaceMode::Discrete);

    let mut policy = LanderPolicy::new(config.action_space());
    let report = Runner::default().run_episode(&mut env, &mut policy, 2718).unwrap();
    assert!(report.terminated || report.truncated);
    assert!(report.steps > 0);

    env.close().unwrap();
}

#[test]
#[ignore]
fn continuous_lander_e2e() {
    let config = EnvConfig::default().with_action_space(ActionSpaceMode::Continuous);
    let mut env = Environment::new(API_URL, &config).unwrap();
    assert!(env.action_space().accepts(ActionSpaceMode::Continuous));

    let s = env.reset(Some(2718)).unwrap();
    let si = env.step(&LanderPolicy::new(ActionSpaceMode::Continuous).decide(&s)).unwrap();
    assert!(si.observation.y < s.y + 1.);

    let err = env
        .step(&Action::Discrete(DiscreteAction::Noop))
        .unwrap_err();
    assert!(matches!(err, AgentError::ActionSpaceMismatch { .. }));

    env.close().unwrap();
}

#[test]
#[ignore]
fn mismatched_action_space_is_rejected() {
    let config = EnvConfig::default().with_action_space(ActionSpaceMode::Continuous);
    let mut env = Environment::new(API_URL, &config).unwrap();

    let err = Environment::reference(API_URL, env.instance_id(), ActionSpaceMode::Discrete).unwrap_err();
    assert!(matches!(err, AgentError::ActionSpaceMismatch { .. }));

    env.close().unwrap();
}
