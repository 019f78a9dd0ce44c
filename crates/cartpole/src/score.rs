//! # Scoring
//!
//! Cost of a world state for the planner. Lower is better. The base cost is
//! the pole tilt, `|roll| + |pitch|` in degrees. Two proximity terms can be
//! switched on through [`ScoreWeights`]:
//!
//! - corners: `+ w_corner * d` for each of the first three wall corners
//!   closer to the cart than the corner-0 to corner-2 diagonal
//! - blocks: `- w_block * d` for each block, rewarding distance from blocks

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::state::WorldState;

/// Weights of the proximity terms. Both default to zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub corner: f64,
    pub block: f64,
}

impl ScoreWeights {
    /// Corner weight 0.01 and block weight 0.05.
    #[must_use]
    pub const fn proximity() -> Self {
        Self {
            corner: 0.01,
            block: 0.05,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scorer {
    weights: ScoreWeights,
    corners: Option<[DVec3; 3]>,
    origin_dist: f64,
}

impl Scorer {
    #[must_use]
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights,
            corners: None,
            origin_dist: 0.0,
        }
    }

    #[must_use]
    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Record the wall corners from the first state of an episode. Without
    /// them the corner term is zero.
    pub fn observe_walls(&mut self, walls: &[DVec3; 8]) {
        self.corners = Some([walls[0], walls[1], walls[2]]);
        self.origin_dist = walls[0].distance(walls[2]);
        tracing::debug!(origin_dist = self.origin_dist, "wall corners recorded");
    }

    #[must_use]
    pub fn has_walls(&self) -> bool {
        self.corners.is_some()
    }

    #[must_use]
    pub fn score(&self, state: &WorldState) -> f64 {
        let (roll, pitch) = state.pole.tilt();
        let mut cost = roll + pitch;
        let cart = state.cart.position;

        if self.weights.corner != 0.0 {
            if let Some(corners) = &self.corners {
                let near: f64 = corners
                    .iter()
                    .map(|corner| cart.distance(*corner))
                    .filter(|d| *d < self.origin_dist)
                    .sum();
                cost += self.weights.corner * near;
            }
        }

        if self.weights.block != 0.0 {
            let spread: f64 = state.blocks.iter().map(|block| cart.distance(block.position)).sum();
            cost -= self.weights.block * spread;
        }

        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BlockState, CartState, PoleOrientation, PoleState};
    use approx::assert_relative_eq;
    use glam::DQuat;
    use physics::WallBox;

    fn state(cart: DVec3, pole: DQuat, blocks: &[DVec3]) -> WorldState {
        WorldState {
            cart: CartState {
                position: cart,
                velocity: DVec3::ZERO,
            },
            pole: PoleState {
                orientation: PoleOrientation::Quaternion(pole),
                angular_velocity: DVec3::ZERO,
            },
            blocks: blocks
                .iter()
                .map(|&position| BlockState {
                    id: None,
                    position,
                    velocity: DVec3::ZERO,
                })
                .collect(),
            walls: None,
        }
    }

    #[test]
    fn upright_pole_costs_nothing() {
        let scorer = Scorer::default();
        let s = state(DVec3::new(2.0, -1.0, 0.0), DQuat::IDENTITY, &[DVec3::new(0.0, 0.0, 5.0)]);
        assert_eq!(scorer.score(&s), 0.0);
    }

    #[test]
    fn tilt_is_sum_of_roll_and_pitch() {
        let scorer = Scorer::default();
        let pole = physics::orientation::from_euler(30.0, -3.0, 4.0);
        let s = state(DVec3::ZERO, pole, &[]);
        assert_relative_eq!(scorer.score(&s), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn proximity_terms_follow_weights() {
        let mut scorer = Scorer::new(ScoreWeights::proximity());
        scorer.observe_walls(&WallBox::default().corners());
        let block = DVec3::new(0.0, 0.0, 5.0);
        let s = state(DVec3::ZERO, DQuat::IDENTITY, &[block]);

        // the origin is 50^0.5 from each of the three floor corners, all
        // inside the 200^0.5 diagonal
        let expected = 0.01 * 3.0 * 50f64.sqrt() - 0.05 * 5.0;
        assert_relative_eq!(scorer.score(&s), expected, epsilon = 1e-12);
    }

    #[test]
    fn corner_term_needs_walls() {
        let scorer = Scorer::new(ScoreWeights { corner: 1.0, block: 0.0 });
        assert!(!scorer.has_walls());
        assert_eq!(scorer.score(&state(DVec3::ZERO, DQuat::IDENTITY, &[])), 0.0);
    }
}
