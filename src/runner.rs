use crate::common::defs::StateVector;
use crate::error::Result;
use crate::policy::Policy;
use crate::Simulator;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::num::NonZeroUsize;
use tracing::{debug, info, trace};

/// `LunarLander` truncates episodes after this many steps.
pub const DEFAULT_MAX_STEPS: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => panic!("step cap must be non-zero"),
};

#[derive(Debug, Clone)]
pub struct EpisodeReport {
    pub seed: u64,
    pub steps: usize,
    pub cumulative_reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub final_state: StateVector,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl EpisodeReport {
    /// Both legs down at the end of a terminated episode.
    pub fn landed(&self) -> bool {
        self.terminated && !self.final_state.is_flying()
    }
}

/// Drives a policy against a simulator, one step per observed state.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    max_steps: NonZeroUsize,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

impl Runner {
    pub fn new(max_steps: NonZeroUsize) -> Self {
        Self { max_steps }
    }

    pub fn max_steps(&self) -> NonZeroUsize {
        self.max_steps
    }

    pub fn run_episode<S, P>(&self, sim: &mut S, policy: &mut P, seed: u64) -> Result<EpisodeReport>
    where
        S: Simulator + ?Sized,
        P: Policy + ?Sized,
    {
        policy.reset(seed);
        let started_at = Utc::now();
        let mut state = sim.reset(Some(seed))?;

        let mut steps = 0;
        let mut cumulative_reward = 0.;
        let (mut terminated, mut truncated) = (false, false);
        while steps < self.max_steps.get() {
            let action = policy.act(&state);
            let si = sim.step(&action)?;
            steps += 1;
            cumulative_reward += si.reward;
            trace!(step = steps, ?action, reward = si.reward, "stepped");

            state = si.observation;
            if si.is_done() {
                terminated = si.terminated;
                truncated = si.truncated;
                break;
            }
        }

        if !terminated && !truncated {
            debug!(seed, max_steps = self.max_steps.get(), "step cap reached");
            truncated = true;
        }

        let report = EpisodeReport {
            seed,
            steps,
            cumulative_reward,
            terminated,
            truncated,
            final_state: state,
            started_at,
            elapsed: Utc::now() - started_at,
        };
        info!(
            seed,
            steps,
            reward = cumulative_reward,
            terminated,
            truncated,
            policy = policy.name(),
            elapsed_ms = report.elapsed.num_milliseconds(),
            "finished episode"
        );

        Ok(report)
    }

    /// Runs `episodes` episodes seeded `seed, seed + 1, ...`. A random base seed is drawn when
    /// none is given.
    pub fn run<S, P>(
        &self,
        sim: &mut S,
        policy: &mut P,
        episodes: usize,
        seed: Option<u64>,
    ) -> Result<Vec<EpisodeReport>>
    where
        S: Simulator + ?Sized,
        P: Policy + ?Sized,
    {
        let base = seed.unwrap_or_else(|| rand::thread_rng().gen::<u32>() as u64);
        (0..episodes as u64)
            .map(|i| self.run_episode(sim, policy, base.wrapping_add(i)))
            .collect()
    }
}

pub fn mean_reward(reports: &[EpisodeReport]) -> Option<f64> {
    if reports.is_empty() {
        return None;
    }
    Some(reports.iter().map(|r| r.cumulative_reward).sum::<f64>() / reports.len() as f64)
}
