use crate::common::defs::*;
use rand::prelude::*;

/// Altitude above which the braking margin shrinks with height.
pub const BRAKE_ALTITUDE: Continuous = 0.10;
/// Constant sink allowance granted below `BRAKE_ALTITUDE`.
pub const NEAR_GROUND_ALLOWANCE: Continuous = 0.10;
pub const ALTITUDE_DIVISOR: Continuous = 7.;
pub const ANGLE_GAIN: Continuous = 2.5;
pub const ANGULAR_RATE_GAIN: Continuous = 2.5;
pub const POSITION_GAIN: Continuous = 3.;
pub const DRIFT_GAIN: Continuous = 4.;

/// Below this altitude the discrete policy only brakes or coasts.
pub const TOUCHDOWN_ALTITUDE: Continuous = 0.05;
pub const LATERAL_THRESHOLD: Continuous = 0.5;
pub const SINK_RATE_LIMIT: Continuous = -0.1;
pub const STABLE_SINK_RATE: Continuous = -0.08;
pub const STABLE_ALTITUDE: Continuous = 0.15;

pub trait Policy {
    fn name(&self) -> &str;

    fn act(&mut self, s: &StateVector) -> Action;

    /// Called before every episode.
    fn reset(&mut self, _seed: u64) {}
}

/// Hand tuned PD controller for `LunarLander`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanderPolicy {
    mode: ActionSpaceMode,
}

impl LanderPolicy {
    pub fn new(mode: ActionSpaceMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ActionSpaceMode {
        self.mode
    }

    pub fn decide(&self, s: &StateVector) -> Action {
        decide(s, self.mode)
    }
}

impl Policy for LanderPolicy {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn act(&mut self, s: &StateVector) -> Action {
        self.decide(s)
    }
}

pub fn decide(s: &StateVector, mode: ActionSpaceMode) -> Action {
    let raw = raw_command(s);
    match mode {
        ActionSpaceMode::Continuous => raw.into(),
        ActionSpaceMode::Discrete => quantize(&raw, s).into(),
    }
}

pub fn raw_command(s: &StateVector) -> RawCommand {
    let y_booster = if s.is_flying() && s.yv < 0. {
        let margin = if s.y > BRAKE_ALTITUDE {
            s.y / ALTITUDE_DIVISOR
        } else {
            -NEAR_GROUND_ALLOWANCE
        };
        s.yv.abs() - margin
    } else {
        0.
    };

    let mut x_booster = s.theta.sin() * ANGLE_GAIN + s.omega * ANGULAR_RATE_GAIN;
    x_booster -= s.x * POSITION_GAIN + s.xv * DRIFT_GAIN;

    RawCommand {
        y_booster,
        x_booster,
    }
}

pub struct QuantizationRule {
    pub name: &'static str,
    pub apply: fn(&RawCommand, &StateVector) -> Option<DiscreteAction>,
}

/// Evaluated top to bottom, first match wins. When none matches, `FALLBACK_RULE` decides.
///
/// NOTE: a dominant vertical command wins even right above the pad, before the touchdown rule
/// gets a say.
pub static QUANTIZATION_RULES: [QuantizationRule; 5] = [
    QuantizationRule {
        name: "main_dominates",
        apply: |raw, _| (raw.y_booster > raw.x_booster.abs()).then_some(DiscreteAction::FireMain),
    },
    QuantizationRule {
        name: "touchdown",
        apply: |_, s| (s.y < TOUCHDOWN_ALTITUDE).then(|| brake_or_coast(s)),
    },
    QuantizationRule {
        name: "fire_left",
        apply: |raw, _| (raw.x_booster < -LATERAL_THRESHOLD).then_some(DiscreteAction::FireLeft),
    },
    QuantizationRule {
        name: "fire_right",
        apply: |raw, _| (raw.x_booster > LATERAL_THRESHOLD).then_some(DiscreteAction::FireRight),
    },
    QuantizationRule {
        name: "stable_descent",
        apply: |_, s| {
            (s.yv > STABLE_SINK_RATE && s.y > STABLE_ALTITUDE).then_some(DiscreteAction::Noop)
        },
    },
];

/// Brakes when sinking faster than `SINK_RATE_LIMIT`, coasts otherwise.
pub const FALLBACK_RULE: &str = "brake_or_coast";

fn brake_or_coast(s: &StateVector) -> DiscreteAction {
    if s.yv < SINK_RATE_LIMIT {
        DiscreteAction::FireMain
    } else {
        DiscreteAction::Noop
    }
}

/// Rule names in evaluation order, fallback last.
pub fn rule_names() -> impl Iterator<Item = &'static str> {
    QUANTIZATION_RULES
        .iter()
        .map(|r| r.name)
        .chain(std::iter::once(FALLBACK_RULE))
}

/// Returns the first matching rule together with its action.
pub fn matching_rule(raw: &RawCommand, s: &StateVector) -> (&'static str, DiscreteAction) {
    QUANTIZATION_RULES
        .iter()
        .find_map(|r| (r.apply)(raw, s).map(|a| (r.name, a)))
        .unwrap_or_else(|| (FALLBACK_RULE, brake_or_coast(s)))
}

pub fn quantize(raw: &RawCommand, s: &StateVector) -> DiscreteAction {
    matching_rule(raw, s).1
}

/// Baseline that ignores the state and samples uniformly from the action space.
pub struct RandomPolicy {
    mode: ActionSpaceMode,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(mode: ActionSpaceMode, seed: u64) -> Self {
        Self {
            mode,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn act(&mut self, _s: &StateVector) -> Action {
        match self.mode {
            ActionSpaceMode::Continuous => Action::Continuous {
                main: self.rng.gen_range(-1.0..=1.0),
                lateral: self.rng.gen_range(-1.0..=1.0),
            },
            ActionSpaceMode::Discrete => Action::Discrete(
                *DiscreteAction::ALL
                    .choose(&mut self.rng)
                    .unwrap_or(&DiscreteAction::Noop),
            ),
        }
    }

    fn reset(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
