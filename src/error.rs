use crate::common::defs::ActionSpaceMode;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AgentError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config root must be a JSON object of named environment configs")]
    NotAnObject,

    #[error("no config named 'Echelon {id}'. Available: [{available}]")]
    UnknownEchelon { id: u32, available: String },

    #[error("invalid action space '{0}', expected 'continuous' or 'discrete'")]
    InvalidActionSpace(String),

    #[error("invalid render mode '{0}', expected 'human' or 'rgb_array'")]
    InvalidRenderMode(String),

    #[error("field '{field}' is not a number: '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("field '{field}' has an unexpected type, expected {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("request to gymnasium server failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from gymnasium server: {0}")]
    UnexpectedResponse(String),

    #[error("malformed observation: {0}")]
    MalformedObservation(String),

    #[error("environment action space {space} does not match the {mode} action space mode")]
    ActionSpaceMismatch { mode: ActionSpaceMode, space: String },
}
