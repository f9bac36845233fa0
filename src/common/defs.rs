use crate::error::{AgentError, ConfigError};
use serde_json::{to_value, Value};
use std::fmt;
use std::str::FromStr;

pub type Discrete = i32;
pub type Continuous = f64;

/// Kinematic state of the lander as reported by `LunarLander`.
///
/// Refer: https://gymnasium.farama.org/environments/box2d/lunar_lander/#observation-space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateVector {
    pub x: Continuous,
    pub y: Continuous,
    pub xv: Continuous,
    pub yv: Continuous,
    pub theta: Continuous,
    pub omega: Continuous,
    pub left_contact: bool,
    pub right_contact: bool,
}

impl StateVector {
    pub const LEN: usize = 8;

    /// Builds a state from the simulator's 8 element observation. Contact legs are reported as
    /// 0.0 / 1.0, anything non-zero counts as touching the ground.
    pub fn from_slice(vals: &[Continuous]) -> Result<Self, AgentError> {
        if vals.len() != Self::LEN {
            return Err(AgentError::MalformedObservation(format!(
                "expected {} values, got {}",
                Self::LEN,
                vals.len()
            )));
        }

        if let Some(i) = vals.iter().position(|v| !v.is_finite()) {
            return Err(AgentError::MalformedObservation(format!(
                "value at index {i} is not finite: {}",
                vals[i]
            )));
        }

        Ok(Self {
            x: vals[0],
            y: vals[1],
            xv: vals[2],
            yv: vals[3],
            theta: vals[4],
            omega: vals[5],
            left_contact: vals[6] != 0.,
            right_contact: vals[7] != 0.,
        })
    }

    /// The lander is flying until both legs touch the ground.
    pub fn is_flying(&self) -> bool {
        !self.left_contact || !self.right_contact
    }
}

impl TryFrom<&[Continuous]> for StateVector {
    type Error = AgentError;

    fn try_from(vals: &[Continuous]) -> Result<Self, Self::Error> {
        Self::from_slice(vals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionSpaceMode {
    Continuous,
    #[default]
    Discrete,
}

impl ActionSpaceMode {
    pub fn from_continuous_flag(continuous: bool) -> Self {
        if continuous {
            Self::Continuous
        } else {
            Self::Discrete
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous)
    }
}

impl FromStr for ActionSpaceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "discrete" => Ok(Self::Discrete),
            _ => Err(ConfigError::InvalidActionSpace(s.to_string())),
        }
    }
}

impl fmt::Display for ActionSpaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous => f.write_str("continuous"),
            Self::Discrete => f.write_str("discrete"),
        }
    }
}

/// Refer: https://gymnasium.farama.org/environments/box2d/lunar_lander/#action-space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DiscreteAction {
    Noop = 0,
    FireLeft = 1,
    FireMain = 2,
    FireRight = 3,
}

impl DiscreteAction {
    pub const ALL: [DiscreteAction; 4] = [
        DiscreteAction::Noop,
        DiscreteAction::FireLeft,
        DiscreteAction::FireMain,
        DiscreteAction::FireRight,
    ];

    pub fn code(self) -> Discrete {
        self as Discrete
    }
}

impl TryFrom<Discrete> for DiscreteAction {
    type Error = AgentError;

    fn try_from(code: Discrete) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|a| a.code() == code)
            .ok_or_else(|| AgentError::UnexpectedResponse(format!("unknown discrete action {code}")))
    }
}

/// Stage one output of the lander policy: `y` drives the main engine, `x` the side engines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawCommand {
    pub y_booster: Continuous,
    pub x_booster: Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Unclamped. The simulator clips both engines to [-1, 1].
    Continuous {
        main: Continuous,
        lateral: Continuous,
    },
    Discrete(DiscreteAction),
}

impl Action {
    pub fn mode(&self) -> ActionSpaceMode {
        match self {
            Self::Continuous { .. } => ActionSpaceMode::Continuous,
            Self::Discrete(_) => ActionSpaceMode::Discrete,
        }
    }

    /// Wire form for the `step/` endpoint.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Continuous { main, lateral } => to_value([*main, *lateral]),
            Self::Discrete(a) => to_value(a.code()),
        }
        .unwrap_or(Value::Null)
    }
}

impl From<RawCommand> for Action {
    fn from(raw: RawCommand) -> Self {
        Self::Continuous {
            main: raw.y_booster,
            lateral: raw.x_booster,
        }
    }
}

impl From<DiscreteAction> for Action {
    fn from(a: DiscreteAction) -> Self {
        Self::Discrete(a)
    }
}
