//! # Actions
//!
//! The discrete action vocabulary, the continuous command, and the mapping
//! from either to a force on the cart expressed in the cart's own frame.
//!
//! The mapping counter-rotates by the cart heading, so once the engine turns
//! the link-frame force back into the world frame every label pushes along a
//! fixed world axis: `left` along +x, `forward` along +y.

use std::fmt;
use std::str::FromStr;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::EnvError;

/// One of the five discrete actions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Left,
    Right,
    Forward,
    Backward,
    Nothing,
}

impl Action {
    /// Every action in index order. The planner enumerates in this order.
    pub const ALL: [Action; 5] = [
        Action::Left,
        Action::Right,
        Action::Forward,
        Action::Backward,
        Action::Nothing,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// # Errors
    ///
    /// Fails with [`EnvError::InvalidAction`] for indices past 4.
    pub fn from_index(index: usize) -> Result<Self, EnvError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| EnvError::invalid_action(format!("action index {index} out of range 0..5")))
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Right => "right",
            Action::Forward => "forward",
            Action::Backward => "backward",
            Action::Nothing => "nothing",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Action {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.label() == s)
            .ok_or_else(|| EnvError::invalid_action(format!("unknown discrete action [{s}]")))
    }
}

/// The five action labels in index order.
#[must_use]
pub fn action_labels() -> [&'static str; 5] {
    Action::ALL.map(Action::label)
}

/// What a caller asks the environment to do for one tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Discrete(Action),
    /// Signed force magnitude along the cart heading.
    Continuous(f64),
}

impl From<Action> for Command {
    fn from(action: Action) -> Self {
        Command::Discrete(action)
    }
}

impl From<f64> for Command {
    fn from(value: f64) -> Self {
        Command::Continuous(value)
    }
}

/// Which kind of [`Command`] an environment accepts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMode {
    #[default]
    Discrete,
    Continuous,
}

/// Shape of the accepted commands.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ActionSpace {
    /// `n` labelled actions, indices `0..n`.
    Discrete(usize),
    /// A scalar in `[low, high]`.
    Box { low: f64, high: f64 },
}

/// Planar force `(fx, fy)` in the cart frame for a discrete action.
///
/// With `base = (F cos h, -F sin h)`: `left` is `base`, `right` its
/// negation, `forward` and `backward` the two perpendiculars.
#[must_use]
pub fn map_action(action: Action, force_magnitude: f64, heading: f64) -> (f64, f64) {
    let fx = force_magnitude * heading.cos();
    let fy = -force_magnitude * heading.sin();
    match action {
        Action::Nothing => (0.0, 0.0),
        Action::Left => (fx, fy),
        Action::Right => (-fx, -fy),
        Action::Forward => (-fy, fx),
        Action::Backward => (fy, -fx),
    }
}

/// Planar force for a continuous command: `value` clamped to `[-F, F]`
/// along the heading.
#[must_use]
pub fn map_continuous(value: f64, force_magnitude: f64, heading: f64) -> (f64, f64) {
    let f = value.clamp(-force_magnitude, force_magnitude);
    (f * heading.cos(), -f * heading.sin())
}

/// Turns commands into cart forces for one action mode.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActionMapper {
    mode: ActionMode,
    force_magnitude: f64,
}

impl ActionMapper {
    #[must_use]
    pub fn new(mode: ActionMode, force_magnitude: f64) -> Self {
        Self { mode, force_magnitude }
    }

    #[must_use]
    pub fn space(&self) -> ActionSpace {
        match self.mode {
            ActionMode::Discrete => ActionSpace::Discrete(Action::ALL.len()),
            ActionMode::Continuous => ActionSpace::Box {
                low: -self.force_magnitude,
                high: self.force_magnitude,
            },
        }
    }

    /// Cart-frame force for `command` at the given heading (radians).
    ///
    /// # Errors
    ///
    /// Fails with [`EnvError::InvalidAction`] when the command kind does not
    /// match the mode, or a continuous value is not finite.
    pub fn force(&self, command: Command, heading: f64) -> Result<DVec3, EnvError> {
        let (fx, fy) = match (self.mode, command) {
            (ActionMode::Discrete, Command::Discrete(action)) => map_action(action, self.force_magnitude, heading),
            (ActionMode::Continuous, Command::Continuous(value)) => {
                if !value.is_finite() {
                    return Err(EnvError::invalid_action(format!("continuous action {value} is not finite")));
                }
                map_continuous(value, self.force_magnitude, heading)
            }
            (mode, command) => {
                return Err(EnvError::invalid_action(format!(
                    "{command:?} does not fit the {mode:?} action space"
                )))
            }
        };
        Ok(DVec3::new(fx, fy, 0.0))
    }
}
