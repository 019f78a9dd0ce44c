//! # Two-Step Lookahead Planner
//!
//! Brute force over every ordered pair of discrete actions. Each pair is
//! replayed from the same start: reset to the start state, step the first
//! action, keep the intermediate state, step the second action and score
//! what comes out. The first action of the cheapest pair wins; ties go to
//! the pair enumerated first.
//!
//! Rollouts run one after another on a single environment. There is no
//! pruning and nothing is cached between calls.

use crate::action::Action;
use crate::episode::Env;
use crate::error::EnvError;
use crate::feature::FeatureVector;
use crate::score::Scorer;
use crate::state::WorldState;

/// One scored action pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Rollout {
    pub first: Action,
    pub second: Action,
    pub cost: f64,
    /// State after the first action.
    pub intermediate: WorldState,
}

#[derive(Clone, Debug, Default)]
pub struct LookaheadPlanner {
    scorer: Scorer,
}

impl LookaheadPlanner {
    #[must_use]
    pub fn new(scorer: Scorer) -> Self {
        Self { scorer }
    }

    #[must_use]
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn scorer_mut(&mut self) -> &mut Scorer {
        &mut self.scorer
    }

    /// Score all 25 pairs, first action major, in [`Action::ALL`] order.
    ///
    /// # Errors
    ///
    /// Propagates the first environment failure.
    pub fn evaluate<E: Env + ?Sized>(&self, env: &mut E, start: &FeatureVector) -> Result<Vec<Rollout>, EnvError> {
        let mut rollouts = Vec::with_capacity(Action::ALL.len() * Action::ALL.len());
        for first in Action::ALL {
            for second in Action::ALL {
                env.reset(Some(start))?;
                let intermediate = env.step(first.into())?.state;
                let last = env.step(second.into())?.state;
                let cost = self.scorer.score(&last);
                tracing::trace!(%first, %second, cost, "rollout scored");
                rollouts.push(Rollout {
                    first,
                    second,
                    cost,
                    intermediate,
                });
            }
        }
        Ok(rollouts)
    }

    /// First action of the cheapest pair and the state it leads to.
    ///
    /// # Errors
    ///
    /// Propagates the first environment failure.
    pub fn best_action<E: Env + ?Sized>(
        &self,
        env: &mut E,
        start: &FeatureVector,
    ) -> Result<(Action, WorldState), EnvError> {
        let mut best: Option<Rollout> = None;
        for rollout in self.evaluate(env, start)? {
            // strict: the earliest of equal costs stays
            if best.as_ref().map_or(true, |b| rollout.cost < b.cost) {
                best = Some(rollout);
            }
        }
        let best = best.ok_or_else(|| EnvError::invalid_action("no action pairs to evaluate"))?;
        tracing::debug!(action = %best.first, second = %best.second, cost = best.cost, "best action");
        Ok((best.first, best.intermediate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionSpace, Command};
    use crate::episode::StepOutcome;
    use crate::state::{CartState, PoleOrientation, PoleState};
    use glam::{DQuat, DVec3};
    use std::collections::BTreeMap;

    /// Scripted environment: the pole pitch after two steps is looked up
    /// from the action pair.
    struct Scripted {
        pitch: fn(Action, Action) -> f64,
        history: Vec<Action>,
        resets: usize,
    }

    impl Scripted {
        fn state(&self, pitch: f64) -> WorldState {
            WorldState {
                cart: CartState {
                    position: DVec3::new(self.history.len() as f64, 0.0, 0.0),
                    velocity: DVec3::ZERO,
                },
                pole: PoleState {
                    orientation: PoleOrientation::Euler(DVec3::new(0.0, pitch, 0.0)),
                    angular_velocity: DVec3::ZERO,
                },
                blocks: Vec::new(),
                walls: None,
            }
        }
    }

    impl Env for Scripted {
        fn reset(&mut self, _start: Option<&FeatureVector>) -> Result<WorldState, EnvError> {
            self.history.clear();
            self.resets += 1;
            Ok(self.state(0.0))
        }

        fn step(&mut self, command: Command) -> Result<StepOutcome, EnvError> {
            let Command::Discrete(action) = command else {
                return Err(EnvError::invalid_action("scripted env is discrete"));
            };
            self.history.push(action);
            let pitch = match self.history.as_slice() {
                [a, b] => (self.pitch)(*a, *b),
                _ => 0.0,
            };
            Ok(StepOutcome {
                state: self.state(pitch),
                reward: 0.0,
                done: false,
                info: BTreeMap::new(),
            })
        }

        fn action_space(&self) -> ActionSpace {
            ActionSpace::Discrete(5)
        }
    }

    fn start() -> FeatureVector {
        FeatureVector::from(&WorldState {
            cart: CartState {
                position: DVec3::ZERO,
                velocity: DVec3::ZERO,
            },
            pole: PoleState {
                orientation: PoleOrientation::Quaternion(DQuat::IDENTITY),
                angular_velocity: DVec3::ZERO,
            },
            blocks: Vec::new(),
            walls: None,
        })
    }

    #[test]
    fn evaluates_all_pairs_in_order() {
        let mut env = Scripted {
            pitch: |_, _| 1.0,
            history: Vec::new(),
            resets: 0,
        };
        let rollouts = LookaheadPlanner::default().evaluate(&mut env, &start()).unwrap();
        assert_eq!(rollouts.len(), 25);
        assert_eq!(env.resets, 25);
        assert_eq!((rollouts[0].first, rollouts[0].second), (Action::Left, Action::Left));
        assert_eq!((rollouts[8].first, rollouts[8].second), (Action::Right, Action::Backward));
        assert_eq!((rollouts[24].first, rollouts[24].second), (Action::Nothing, Action::Nothing));
    }

    #[test]
    fn ties_keep_the_first_pair() {
        let mut env = Scripted {
            pitch: |a, _| if a == Action::Left { 3.0 } else { 2.0 },
            history: Vec::new(),
            resets: 0,
        };
        let (action, intermediate) = LookaheadPlanner::default().best_action(&mut env, &start()).unwrap();
        assert_eq!(action, Action::Right);
        assert_eq!(intermediate.cart.position.x, 1.0);
    }

    #[test]
    fn cheapest_second_step_decides_first_action() {
        let mut env = Scripted {
            pitch: |a, b| if (a, b) == (Action::Backward, Action::Forward) { 0.5 } else { 4.0 },
            history: Vec::new(),
            resets: 0,
        };
        let (action, _) = LookaheadPlanner::default().best_action(&mut env, &start()).unwrap();
        assert_eq!(action, Action::Backward);
    }

    #[test]
    fn environment_failures_propagate() {
        struct Broken;
        impl Env for Broken {
            fn reset(&mut self, _: Option<&FeatureVector>) -> Result<WorldState, EnvError> {
                Err(physics::PhysicsError::InvalidHandle("gone".into()).into())
            }
            fn step(&mut self, _: Command) -> Result<StepOutcome, EnvError> {
                unreachable!()
            }
            fn action_space(&self) -> ActionSpace {
                ActionSpace::Discrete(5)
            }
        }
        assert!(LookaheadPlanner::default().best_action(&mut Broken, &start()).is_err());
    }
}
