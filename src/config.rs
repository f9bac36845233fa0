use crate::common::defs::*;
use crate::error::ConfigError;
use itertools::Itertools;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_ENV_ID: &str = "LunarLander-v2";

const KNOWN_KEYS: [&str; 9] = [
    "id",
    "render_mode",
    "continuous",
    "gravity",
    "enable_wind",
    "wind_power",
    "turbulence_power",
    "max_episode_steps",
    "action_space",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    None,
    Human,
    RgbArray,
}

impl RenderMode {
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Human => Some("human"),
            Self::RgbArray => Some("rgb_array"),
        }
    }
}

impl FromStr for RenderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(Self::Human),
            "rgb_array" => Ok(Self::RgbArray),
            "none" | "" => Ok(Self::None),
            _ => Err(ConfigError::InvalidRenderMode(s.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("none"))
    }
}

/// Validated settings for one environment instance. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    id: String,
    render_mode: RenderMode,
    action_space: ActionSpaceMode,
    gravity: Option<Continuous>,
    enable_wind: Option<bool>,
    wind_power: Option<Continuous>,
    turbulence_power: Option<Continuous>,
    max_episode_steps: Option<Discrete>,
    extra: Map<String, Value>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_ENV_ID.to_string(),
            render_mode: RenderMode::default(),
            action_space: ActionSpaceMode::default(),
            gravity: None,
            enable_wind: None,
            wind_power: None,
            turbulence_power: None,
            max_episode_steps: None,
            extra: Map::new(),
        }
    }
}

impl EnvConfig {
    /// Parses a single named entry of the config file. Numeric fields may be given as JSON
    /// numbers or as numeric strings, anything else is rejected.
    pub fn from_json(obj: &Map<String, Value>) -> Result<Self, ConfigError> {
        let id = match obj.get("id") {
            None | Some(Value::Null) => DEFAULT_ENV_ID.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(invalid_type("id", "a string")),
        };

        let render_mode = match obj.get("render_mode") {
            None | Some(Value::Null) => RenderMode::None,
            Some(Value::String(s)) => s.parse()?,
            Some(_) => return Err(invalid_type("render_mode", "a string or null")),
        };

        let action_space = match (non_null(obj, "continuous"), non_null(obj, "action_space")) {
            (Some(v), _) => parse_mode("continuous", v)?,
            (None, Some(v)) => parse_mode("action_space", v)?,
            (None, None) => ActionSpaceMode::default(),
        };

        let max_episode_steps = parse_f64(obj, "max_episode_steps")?
            .map(|n| {
                if n.fract() == 0. && n >= 1. && n <= Discrete::MAX as f64 {
                    Ok(n as Discrete)
                } else {
                    Err(ConfigError::InvalidNumber {
                        field: "max_episode_steps".to_string(),
                        value: n.to_string(),
                    })
                }
            })
            .transpose()?;

        let extra = obj
            .iter()
            .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Map<_, _>>();

        let config = Self {
            id,
            render_mode,
            action_space,
            gravity: parse_f64(obj, "gravity")?,
            enable_wind: parse_bool(obj, "enable_wind")?,
            wind_power: parse_f64(obj, "wind_power")?,
            turbulence_power: parse_f64(obj, "turbulence_power")?,
            max_episode_steps,
            extra,
        };
        debug!(?config, "parsed environment config");

        Ok(config)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn action_space(&self) -> ActionSpaceMode {
        self.action_space
    }

    pub fn max_episode_steps(&self) -> Option<Discrete> {
        self.max_episode_steps
    }

    pub fn observation_as_rgb(&self) -> bool {
        self.render_mode == RenderMode::RgbArray
    }

    /// Copy of this config with a different render mode.
    pub fn with_render_mode(&self, render_mode: RenderMode) -> Self {
        Self {
            render_mode,
            ..self.clone()
        }
    }

    pub fn with_action_space(&self, action_space: ActionSpaceMode) -> Self {
        Self {
            action_space,
            ..self.clone()
        }
    }

    /// Keyword arguments forwarded to `gym.make`.
    pub fn kwargs(&self) -> Map<String, Value> {
        let mut kwargs = self.extra.clone();
        let mut put = |k: &str, v: Value| {
            kwargs.insert(k.to_string(), v);
        };

        put(
            "render_mode",
            self.render_mode.as_str().map_or(Value::Null, Value::from),
        );
        put("continuous", Value::Bool(self.action_space.is_continuous()));
        if let Some(gravity) = self.gravity {
            put("gravity", Value::from(gravity));
        }
        if let Some(enable_wind) = self.enable_wind {
            put("enable_wind", Value::Bool(enable_wind));
        }
        if let Some(wind_power) = self.wind_power {
            put("wind_power", Value::from(wind_power));
        }
        if let Some(turbulence_power) = self.turbulence_power {
            put("turbulence_power", Value::from(turbulence_power));
        }

        kwargs
    }
}

/// All named configurations of a config file, keyed like `"Echelon 2 - windy"`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    entries: Map<String, Value>,
}

impl ConfigFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(ConfigError::NotAnObject),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// First entry whose name starts with `Echelon {id}`.
    pub fn echelon(&self, id: u32) -> Result<EnvConfig, ConfigError> {
        let prefix = format!("Echelon {id}");
        let (name, entry) = self
            .entries
            .iter()
            .find(|(k, _)| is_echelon(k, &prefix))
            .ok_or_else(|| ConfigError::UnknownEchelon {
                id,
                available: self.names().sorted().map(|n| format!("'{n}'")).join(", "),
            })?;

        debug!(name = %name, "selected environment config");
        match entry {
            Value::Object(obj) => EnvConfig::from_json(obj),
            _ => Err(invalid_type(name, "an object")),
        }
    }
}

/// `Echelon 1` must not pick up `Echelon 12`.
fn is_echelon(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_digit()))
}

fn non_null<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

fn invalid_type(field: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidType {
        field: field.to_string(),
        expected,
    }
}

fn parse_mode(field: &str, v: &Value) -> Result<ActionSpaceMode, ConfigError> {
    let mode = match v {
        Value::Bool(b) => Ok(ActionSpaceMode::from_continuous_flag(*b)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(ActionSpaceMode::Continuous),
            "false" => Ok(ActionSpaceMode::Discrete),
            _ => s.parse(),
        },
        other => Err(ConfigError::InvalidActionSpace(other.to_string())),
    };

    mode.map_err(|e| match e {
        ConfigError::InvalidActionSpace(_) => ConfigError::InvalidActionSpace(format!("{field}={v}")),
        e => e,
    })
}

fn parse_f64(obj: &Map<String, Value>, field: &str) -> Result<Option<Continuous>, ConfigError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| ConfigError::InvalidNumber {
            field: field.to_string(),
            value: n.to_string(),
        }),
        Some(Value::String(s)) => s
            .trim()
            .parse::<Continuous>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidNumber {
                field: field.to_string(),
                value: s.clone(),
            }),
        Some(_) => Err(invalid_type(field, "a number or numeric string")),
    }
}

fn parse_bool(obj: &Map<String, Value>, field: &str) -> Result<Option<bool>, ConfigError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(invalid_type(field, "a bool")),
        },
        Some(_) => Err(invalid_type(field, "a bool")),
    }
}
