//! # Episode Loop
//!
//! Command-line options, configuration loading and the loop that drives
//! [`EpisodeController`] with a policy.
//!
//! The planner policy never touches the live environment: it replays
//! candidate actions on a private replica reset from the live state's
//! feature vector, then the chosen action is applied to the live episode.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cartpole::{
    Action, ActionMode, ActionSpace, Command, Env, EnvConfig, EpisodeController, FeatureVector, LookaheadPlanner,
    Scorer, WorldState,
};
use clap::{Parser, ValueEnum};

/// Ticks between progress lines.
const LOG_EVERY: u32 = 50;

#[derive(Parser, Debug)]
#[command(name = "cartpolepp")]
#[command(version, about = "Run CartPole++ episodes", long_about = None)]
pub struct Cli {
    /// Environment configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Feature vector (JSON) every episode starts from
    #[arg(long)]
    pub start: Option<PathBuf>,

    /// Number of episodes
    #[arg(long, default_value_t = 1)]
    pub episodes: usize,

    /// How actions are chosen
    #[arg(long, value_enum, default_value_t = Policy::Planner)]
    pub policy: Policy,

    /// Seed for random resets, overrides the configuration
    #[arg(long)]
    pub seed: Option<u64>,

    /// Drive the cart with a scalar force instead of discrete actions
    #[arg(long)]
    pub continuous: bool,

    /// Write every state to stdout as a feature-vector JSON line
    #[arg(long)]
    pub dump_states: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Two-step lookahead over all action pairs
    Planner,
    /// Never push
    Nothing,
    /// Uniformly random action or scalar
    Random,
}

/// Run every requested episode.
///
/// # Errors
///
/// Fails on unreadable or malformed input files, on a planner asked to
/// drive a continuous environment, and on any environment error.
pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let start = cli.start.as_deref().map(load_start).transpose()?;
    let mut env = EpisodeController::new(config);
    let space = env.action_space();
    if cli.policy == Policy::Planner && !matches!(space, ActionSpace::Discrete(_)) {
        bail!("the planner only enumerates discrete actions; drop --continuous or pick another policy");
    }

    tracing::info!(
        episodes = cli.episodes,
        policy = ?cli.policy,
        ?space,
        seed = ?env.config().seed,
        "starting"
    );

    let mut driver = Driver::new(cli.policy, space, env.config());
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for episode in 1..=cli.episodes {
        let mut state = env
            .reset(start.as_ref())
            .with_context(|| format!("resetting episode {episode}"))?;
        driver.observe(&state);
        if cli.dump_states {
            dump(&mut out, &state)?;
        }

        let reward = loop {
            let command = driver.command(&state)?;
            let outcome = env
                .step(command)
                .with_context(|| format!("stepping episode {episode} at tick {}", env.tick()))?;
            if cli.dump_states {
                dump(&mut out, &outcome.state)?;
            }
            state = outcome.state;

            if env.tick() % LOG_EVERY == 0 {
                let (roll, pitch) = state.pole.tilt();
                tracing::info!(episode, tick = env.tick(), reward = outcome.reward, roll, pitch, "progress");
            }
            if outcome.done {
                break outcome.reward;
            }
        };

        let (roll, pitch) = state.pole.tilt();
        tracing::info!(episode, ticks = env.tick(), reward, roll, pitch, "episode finished");
    }

    env.close();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<EnvConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = read(path)?;
            EnvConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EnvConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if cli.continuous {
        config.action_mode = ActionMode::Continuous;
    }
    Ok(config)
}

fn load_start(path: &Path) -> Result<FeatureVector> {
    let json = read(path)?;
    FeatureVector::from_json(&json).with_context(|| format!("parsing start state {}", path.display()))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn dump(out: &mut impl Write, state: &WorldState) -> Result<()> {
    let json = FeatureVector::from(state).to_json()?;
    writeln!(out, "{json}").context("writing state")
}

/// Turns states into commands.
struct Driver {
    policy: Policy,
    space: ActionSpace,
    rng: fastrand::Rng,
    planner: LookaheadPlanner,
    replica: Option<EpisodeController>,
}

impl Driver {
    fn new(policy: Policy, space: ActionSpace, config: &EnvConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        // the replica is reset from full feature vectors, blocks included
        let replica = (policy == Policy::Planner).then(|| {
            let mut replica_config = config.clone();
            replica_config.apply_block_velocities = true;
            EpisodeController::new(replica_config)
        });
        let planner = LookaheadPlanner::new(Scorer::new(config.score));
        tracing::debug!(weights = ?planner.scorer().weights(), "score weights");
        Self {
            policy,
            space,
            rng,
            planner,
            replica,
        }
    }

    /// Pick up the wall corners from the first state of an episode.
    fn observe(&mut self, state: &WorldState) {
        if let Some(walls) = &state.walls {
            self.planner.scorer_mut().observe_walls(walls);
        }
    }

    fn command(&mut self, state: &WorldState) -> Result<Command> {
        let command = match (self.policy, self.space) {
            (Policy::Nothing, ActionSpace::Discrete(_)) => Action::Nothing.into(),
            (Policy::Nothing, ActionSpace::Box { .. }) => Command::Continuous(0.0),
            (Policy::Random, ActionSpace::Discrete(n)) => Action::from_index(self.rng.usize(..n))?.into(),
            (Policy::Random, ActionSpace::Box { low, high }) => Command::Continuous(low + (high - low) * self.rng.f64()),
            (Policy::Planner, _) => {
                let Some(replica) = self.replica.as_mut() else {
                    bail!("planner has no replica environment");
                };
                let (action, expected) = self
                    .planner
                    .best_action(replica, &FeatureVector::from(state))
                    .context("planning the next action")?;
                let (roll, pitch) = expected.pole.tilt();
                tracing::debug!(%action, roll, pitch, "planned");
                action.into()
            }
        };
        Ok(command)
    }
}
