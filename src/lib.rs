extern crate rand;
extern crate reqwest;
extern crate serde;
extern crate serde_json;

pub mod common;
pub mod config;
pub mod error;
pub mod policy;
pub mod runner;

pub use common::defs::*;
pub use config::{ConfigFile, EnvConfig, RenderMode};
pub use error::{AgentError, ConfigError, Result};
pub use policy::{LanderPolicy, Policy, RandomPolicy};
pub use runner::{EpisodeReport, Runner};

use common::utils::*;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::ser::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ObsActSpace {
    /// Refer: https://gymnasium.farama.org/api/spaces/fundamental/#discrete
    Discrete { n: Discrete },

    /// Refer: https://gymnasium.farama.org/api/spaces/fundamental/#box
    Box {
        shape: Vec<Discrete>,
        high: Vec<Continuous>,
        low: Vec<Continuous>,
    },
}

impl ObsActSpace {
    pub fn from_json(info: &Map<String, Value>) -> Result<Self> {
        let info = Value::Object(info.clone());
        match as_str(field(&info, "name")?, "name")? {
            "Discrete" => Ok(ObsActSpace::Discrete {
                n: as_discrete(field(&info, "n")?, "n")?,
            }),
            "Box" => Ok(ObsActSpace::Box {
                shape: as_discrete_vec(field(&info, "shape")?, "shape")?,
                high: as_continuous_vec(field(&info, "high")?, "high")?,
                low: as_continuous_vec(field(&info, "low")?, "low")?,
            }),
            e => Err(AgentError::UnexpectedResponse(format!(
                "unsupported space: {e}"
            ))),
        }
    }

    /// Whether actions of `mode` can be sent to an environment with this action space.
    pub fn accepts(&self, mode: ActionSpaceMode) -> bool {
        match (self, mode) {
            (ObsActSpace::Discrete { n }, ActionSpaceMode::Discrete) => {
                *n as usize == DiscreteAction::ALL.len()
            }
            (ObsActSpace::Box { shape, .. }, ActionSpaceMode::Continuous) => shape[..] == [2],
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepInfo {
    pub observation: StateVector,
    pub reward: f64,
    pub truncated: bool,
    pub terminated: bool,
    pub info: Value,
}

impl StepInfo {
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// The environment side of an episode. All calls are blocking.
pub trait Simulator {
    fn reset(&mut self, seed: Option<u64>) -> Result<StateVector>;

    fn step(&mut self, action: &Action) -> Result<StepInfo>;

    fn close(&mut self) -> Result<()>;
}

/// A `LunarLander` instance hosted by a gymnasium http server.
/// NOTE: All APIs are sync as the server is expected to be local.
#[derive(Debug)]
pub struct Environment {
    client: Client,
    api_url: String,
    instance_id: String,
    mode: ActionSpaceMode,
    obs_space: ObsActSpace,
    act_space: ObsActSpace,
}

impl Environment {
    pub fn envs(api_url: &str) -> Result<HashMap<String, String>> {
        let client = Client::new(api_url)?;

        let url = client.make_api_url("");
        let val = client.http_get(&url)?;

        as_object(field(&val, "all_envs")?, "all_envs")?
            .iter()
            .map(|(k, v)| Ok::<_, AgentError>((k.clone(), as_str(v, k)?.to_string())))
            .collect()
    }

    pub fn new(api_url: &str, config: &EnvConfig) -> Result<Self> {
        let mut body = HashMap::<&str, Value>::from([("env_id", Value::from(config.id()))]);

        if let Some(max_episode_steps) = config.max_episode_steps() {
            body.insert("max_episode_steps", Value::from(max_episode_steps));
        }
        body.insert("kwargs", Value::Object(config.kwargs()));

        let c = Client::new(api_url)?;
        let base_url = c.make_api_url("");
        let obj = c.http_post(&base_url, &body)?;
        let inst_id = as_str(field(&obj, "instance_id")?, "instance_id")?;
        info!(env_id = config.id(), instance_id = inst_id, "created environment");

        Self::reference(api_url, inst_id, config.action_space()).or_else(|e| {
            let url = c.make_api_url(&format!("{inst_id}/close/"));
            if let Err(close_err) = c.http_post(&url, &HashMap::<&str, Value>::new()) {
                warn!(instance_id = inst_id, "failed to close environment after setup error: {close_err}");
            }
            Err(e)
        })
    }

    /// Attaches to an existing instance.
    pub fn reference(api_url: &str, instance_id: &str, mode: ActionSpaceMode) -> Result<Self> {
        let client = Client::new(api_url)?;

        let url = client.make_api_url(&format!("{instance_id}/observation_space/"));
        let obj = client.http_get(&url)?;
        let obs_space = ObsActSpace::from_json(as_object(field(&obj, "info")?, "info")?)?;

        let url = client.make_api_url(&format!("{instance_id}/action_space/"));
        let obj = client.http_get(&url)?;
        let act_space = ObsActSpace::from_json(as_object(field(&obj, "info")?, "info")?)?;

        if !act_space.accepts(mode) {
            return Err(AgentError::ActionSpaceMismatch {
                mode,
                space: format!("{act_space:?}"),
            });
        }

        let env_api_url = client.make_api_url(&format!("{instance_id}/"));
        Ok(Self {
            client,
            api_url: env_api_url,
            instance_id: instance_id.to_string(),
            mode,
            obs_space,
            act_space,
        })
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn mode(&self) -> ActionSpaceMode {
        self.mode
    }

    /// Refer: https://gymnasium.farama.org/api/env/#gymnasium.Env.action_space
    pub fn action_space(&self) -> &ObsActSpace {
        &self.act_space
    }

    /// Refer: https://gymnasium.farama.org/api/env/#gymnasium.Env.observation_space
    pub fn observation_space(&self) -> &ObsActSpace {
        &self.obs_space
    }

    pub fn action_space_sample(&self) -> Result<Action> {
        let url = self.make_api_url("action_space/sample/");
        let obj = self.client.http_get(&url)?;
        action_from_json(self.mode, field(&obj, "action")?)
    }

    fn make_api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

impl Simulator for Environment {
    fn reset(&mut self, seed: Option<u64>) -> Result<StateVector> {
        let mut body = HashMap::from([]);
        if let Some(seed) = seed {
            let _ = body.insert("seed", seed.to_string());
        }

        let url = self.make_api_url("reset/");
        let obj = self.client.http_post(&url, &body)?;
        observation_from_json(field(&obj, "observation")?)
    }

    fn step(&mut self, action: &Action) -> Result<StepInfo> {
        if action.mode() != self.mode {
            return Err(AgentError::ActionSpaceMismatch {
                mode: action.mode(),
                space: format!("{:?}", self.act_space),
            });
        }

        let req = HashMap::from([("action", action.to_json())]);
        let url = self.make_api_url("step/");
        let obj = self.client.http_post(&url, &req)?;

        Ok(StepInfo {
            observation: observation_from_json(field(&obj, "observation")?)?,
            reward: as_f64(field(&obj, "reward")?, "reward")?,
            truncated: as_bool(field(&obj, "truncated")?, "truncated")?,
            terminated: as_bool(field(&obj, "terminated")?, "terminated")?,
            info: obj.get("info").cloned().unwrap_or(Value::Null),
        })
    }

    fn close(&mut self) -> Result<()> {
        let url = self.make_api_url("close/");
        self.client.http_post(&url, &HashMap::<&str, Value>::new())?;
        debug!(instance_id = %self.instance_id, "closed environment");
        Ok(())
    }
}

fn observation_from_json(val: &Value) -> Result<StateVector> {
    StateVector::from_slice(&as_continuous_vec(val, "observation")?)
}

fn action_from_json(mode: ActionSpaceMode, val: &Value) -> Result<Action> {
    match mode {
        ActionSpaceMode::Discrete => Ok(Action::Discrete(DiscreteAction::try_from(as_discrete(
            val, "action",
        )?)?)),
        ActionSpaceMode::Continuous => match as_continuous_vec(val, "action")?[..] {
            [main, lateral] => Ok(Action::Continuous { main, lateral }),
            _ => Err(AgentError::UnexpectedResponse(format!(
                "expected 2 engine values, got {val}"
            ))),
        },
    }
}

#[derive(Debug)]
pub struct Client {
    api_url: String,
    client: reqwest::blocking::Client,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = base_url.replace("//localhost:", "//127.0.0.1:");
        if base_url.ends_with('/') {
            _ = base_url.remove(base_url.len() - 1);
        }

        let api_url = format!("{base_url}/v1/envs/");

        Ok(Self {
            api_url,
            // The server is expected to be local.
            client: reqwest::blocking::Client::builder().no_proxy().build()?,
        })
    }

    pub fn make_api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn http_get(&self, url: &str) -> Result<Value> {
        let res = self
            .client
            .get(url)
            .headers(Self::construct_common_headers())
            .send()?;
        Ok(res.error_for_status()?.json::<Value>()?)
    }

    fn http_post<T: Serialize>(&self, url: &str, body: &HashMap<&str, T>) -> Result<Value> {
        let res = self
            .client
            .post(url)
            .headers(Self::construct_common_headers())
            .json(body)
            .send()?;
        Ok(res.error_for_status()?.json::<Value>()?)
    }

    fn construct_common_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}
