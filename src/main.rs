use clap::{ArgAction, Parser, ValueEnum};
use itertools::Itertools;
use lander::runner::{mean_reward, DEFAULT_MAX_STEPS};
use lander::*;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyArg {
    Heuristic,
    Random,
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum RenderArg {
    None,
    Human,
    RgbArray,
}

impl From<RenderArg> for RenderMode {
    fn from(r: RenderArg) -> Self {
        match r {
            RenderArg::None => RenderMode::None,
            RenderArg::Human => RenderMode::Human,
            RenderArg::RgbArray => RenderMode::RgbArray,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ActionSpaceArg {
    Continuous,
    Discrete,
}

#[derive(Debug, Parser)]
#[command(
    name = "lunar-lander",
    about = "Flies LunarLander on a gymnasium http server with a hand tuned policy",
    version
)]
struct Args {
    /// JSON file of named environment configs.
    #[arg(long, default_value = "env_configs.json")]
    config: PathBuf,

    /// Picks the first config whose name starts with "Echelon <N>".
    #[arg(long, default_value_t = 2)]
    echelon: u32,

    #[arg(long, default_value = "http://127.0.0.1:40004")]
    api_url: String,

    /// Seed of the first episode, later episodes count up from it.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1)]
    episodes: usize,

    /// Step cap per episode, at least 1.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: NonZeroUsize,

    /// Render mode forwarded to the server. Pass `none` to keep the episode headless.
    #[arg(long, value_enum, default_value_t = RenderArg::Human)]
    render_mode: RenderArg,

    /// Overrides the action space of the selected config.
    #[arg(long, value_enum)]
    action_space: Option<ActionSpaceArg>,

    #[arg(long, value_enum, default_value_t = PolicyArg::Heuristic)]
    policy: PolicyArg,

    /// Prints the open environment instances of the server and exits.
    #[arg(long)]
    list_envs: bool,

    /// Verbosity: -v, -vv. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(args: &Args) -> Result<()> {
    if args.list_envs {
        for (instance_id, env_id) in Environment::envs(&args.api_url)?.iter().sorted() {
            println!("{instance_id}: {env_id}");
        }
        return Ok(());
    }

    let mut config = ConfigFile::from_path(&args.config)?
        .echelon(args.echelon)?
        .with_render_mode(args.render_mode.into());
    if let Some(action_space) = args.action_space {
        config = config.with_action_space(match action_space {
            ActionSpaceArg::Continuous => ActionSpaceMode::Continuous,
            ActionSpaceArg::Discrete => ActionSpaceMode::Discrete,
        });
    }
    if config.observation_as_rgb() {
        warn!("render_mode=rgb_array only changes what the server renders, the policy still reads the state vector");
    }

    info!(
        env_id = config.id(),
        echelon = args.echelon,
        action_space = %config.action_space(),
        render_mode = %config.render_mode(),
        api_url = %args.api_url,
        "starting"
    );

    let mut env = Environment::new(&args.api_url, &config)?;
    let mut policy: Box<dyn Policy> = match args.policy {
        PolicyArg::Heuristic => Box::new(LanderPolicy::new(config.action_space())),
        PolicyArg::Random => Box::new(RandomPolicy::new(
            config.action_space(),
            args.seed.unwrap_or_default(),
        )),
    };

    let result = Runner::new(args.max_steps).run(&mut env, policy.as_mut(), args.episodes, args.seed);
    if let Err(e) = env.close() {
        warn!("failed to close environment {}: {e}", env.instance_id());
    }

    let reports = result?;
    for r in &reports {
        println!(
            "Episode seed {}: cumulative reward: {:.2} ({} steps{})",
            r.seed,
            r.cumulative_reward,
            r.steps,
            if r.landed() { ", landed" } else { "" }
        );
    }
    if let Some(mean) = mean_reward(&reports) {
        println!("Mean cumulative reward over {} episodes: {:.2}", reports.len(), mean);
    }

    Ok(())
}
