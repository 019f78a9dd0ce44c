//! Environment configuration
//!
//! Every field has a default, so a JSON document only names what it
//! changes:
//!
//! ```json
//! { "seed": 7, "action_mode": "continuous", "score": { "corner": 0.01, "block": 0.05 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::action::ActionMode;
use crate::error::EnvError;
use crate::score::ScoreWeights;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub action_mode: ActionMode,
    /// Magnitude of the force a discrete action applies, in newtons.
    pub force_magnitude: f64,
    /// Length of one tick in seconds.
    pub time_step: f64,
    /// Ticks after which an episode is over.
    pub tick_limit: u32,
    /// Pole roll or pitch, in degrees, at which an episode is over.
    pub angle_limit: f64,
    /// Upward force applied to every block each tick.
    pub block_anti_gravity: f64,
    pub min_blocks: usize,
    pub max_blocks: usize,
    /// Minimum planar distance between a random block and the cart.
    pub min_block_distance: f64,
    /// Apply block velocities from a supplied feature vector.
    pub apply_block_velocities: bool,
    /// Normalize the random initial pole quaternion.
    pub renormalize_pole_noise: bool,
    /// Report the pole as Euler angles instead of a quaternion.
    pub euler_pole: bool,
    /// Seed for random resets; entropy when absent.
    pub seed: Option<u64>,
    /// Request a GUI connection from the engine.
    pub render: bool,
    pub score: ScoreWeights,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            action_mode: ActionMode::Discrete,
            force_magnitude: 10.0,
            time_step: 1.0 / 50.0,
            tick_limit: 200,
            angle_limit: 10.0,
            block_anti_gravity: 9.8,
            min_blocks: 1,
            max_blocks: 4,
            min_block_distance: 1.0,
            apply_block_velocities: false,
            renormalize_pole_noise: false,
            euler_pole: false,
            seed: None,
            render: false,
            score: ScoreWeights::default(),
        }
    }
}

impl EnvConfig {
    /// # Errors
    ///
    /// Fails with [`EnvError::FeatureVector`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, EnvError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Same configuration with a fixed seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(EnvConfig::from_json("{}").unwrap(), EnvConfig::default());
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let config = EnvConfig::from_json(
            r#"{"seed": 7, "action_mode": "continuous", "tick_limit": 50, "score": {"corner": 0.01}}"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.action_mode, ActionMode::Continuous);
        assert_eq!(config.tick_limit, 50);
        assert_eq!(config.score.corner, 0.01);
        assert_eq!(config.score.block, 0.0);
        assert_eq!(config.force_magnitude, 10.0);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(EnvConfig::from_json(r#"{"action_mode": "analog"}"#).is_err());
    }
}
