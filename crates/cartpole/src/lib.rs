#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # CartPole++ Environment
//!
//! A cart balancing a pole on a spherical joint, inside a box of walls, with
//! a few bouncing blocks flying around. The crate turns the `physics` engine
//! into an episodic environment and adds a planner on top:
//!
//! -   [`EpisodeController`] owns the world and implements [`Env`]:
//!     `reset` (random or from a [`FeatureVector`]), `step`, `is_done`,
//!     `get_reward`, `close`.
//! -   [`action`] maps the five discrete actions (or a continuous scalar) to a
//!     force on the cart.
//! -   [`StateExtractor`] snapshots the world into a rounded [`WorldState`].
//! -   [`Scorer`] and [`LookaheadPlanner`] pick the best action by replaying
//!     all 25 two-step action pairs from a given state.
//!
//! ## Usage
//!
//! ```rust
//! use cartpole::{Action, Env, EnvConfig, EpisodeController, LookaheadPlanner};
//!
//! # fn main() -> Result<(), cartpole::EnvError> {
//! let mut env = EpisodeController::new(EnvConfig::default().with_seed(1));
//! let first = env.reset(None)?;
//! let outcome = env.step(Action::Nothing.into())?;
//! assert_eq!(env.tick(), 1);
//! assert!(outcome.reward > 0.0);
//!
//! let planner = LookaheadPlanner::default();
//! let (action, _expected) = planner.best_action(&mut env, &first.into())?;
//! println!("best first action: {action}");
//! env.close();
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod episode;
pub mod error;
pub mod extract;
pub mod feature;
pub mod planner;
pub mod score;
pub mod state;

pub use action::{action_labels, map_action, Action, ActionMapper, ActionMode, ActionSpace, Command};
pub use config::EnvConfig;
pub use episode::{episode_done, Env, EpisodeController, Phase, StepOutcome};
pub use error::EnvError;
pub use extract::{Scene, StateExtractor};
pub use feature::FeatureVector;
pub use planner::{LookaheadPlanner, Rollout};
pub use score::{ScoreWeights, Scorer};
pub use state::{BlockState, CartState, PoleOrientation, PoleState, StateDiff, WorldState};
