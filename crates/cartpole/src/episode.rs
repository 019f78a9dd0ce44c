//! # Episode Control
//!
//! [`EpisodeController`] owns the physics world for one environment and
//! runs episodes on it:
//!
//! ```text
//! Uninitialized --reset--> Ready --step--> Stepping --step--> ... --> Done
//!       ^                    ^                                        |
//!       +------ close -------+------------- reset --------------------+
//! ```
//!
//! The world is created lazily by the first [`reset`](Env::reset). Every
//! reset reloads the cart and the blocks in place, so body handles follow
//! the same allocation sequence each time and rollouts replayed from the
//! same feature vector are bit-for-bit identical.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::{DQuat, DVec3};
use physics::{
    orientation, CartPoleConfig, Frame, JointMotor, JointState, Material, Model, PhysicsError, World, BASE_LINK,
    CART_LINK, POLE_LINK,
};

use crate::action::{ActionMapper, ActionSpace, Command};
use crate::config::EnvConfig;
use crate::error::EnvError;
use crate::extract::{Scene, StateExtractor};
use crate::feature::FeatureVector;
use crate::state::WorldState;

/// Downward acceleration of the world, m/s^2.
const GRAVITY: f64 = 9.8;
/// Orientation every block is reset to: half a turn about z.
const BLOCK_ORIENTATION: DQuat = DQuat::from_xyzw(0.0, 0.0, 1.0, 0.0);
/// Half-width of the random cart position range.
const CART_POSITION_RANGE: f64 = 3.0;
/// Half-width of the random cart velocity range.
const CART_VELOCITY_RANGE: f64 = 1.0;
/// Half-width of the random pole perturbation range.
const POLE_NOISE: f64 = 0.01;
/// Half-width of the random block position range.
const BLOCK_POSITION_RANGE: f64 = 4.0;
/// Height added to random block positions.
const BLOCK_LIFT: f64 = 5.0;
/// Speed range of random blocks, per axis.
const BLOCK_SPEED: (f64, f64) = (6.0, 10.0);
/// Resampling attempts before a block is accepted closer than the minimum.
const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Lifecycle of an [`EpisodeController`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Stepping,
    Done,
}

/// Result of one [`Env::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub state: WorldState,
    pub reward: f64,
    pub done: bool,
    pub info: BTreeMap<String, String>,
}

/// An environment the planner can replay.
pub trait Env {
    /// Start a new episode, randomly or from a feature vector. The returned
    /// state carries the wall corners.
    ///
    /// # Errors
    ///
    /// Fails if the engine cannot be reached or rejects a call.
    fn reset(&mut self, start: Option<&FeatureVector>) -> Result<WorldState, EnvError>;

    /// Advance one tick under `command`.
    ///
    /// # Errors
    ///
    /// Fails for a command outside the action space or before the first reset.
    fn step(&mut self, command: Command) -> Result<StepOutcome, EnvError>;

    fn action_space(&self) -> ActionSpace;
}

/// `true` once the horizon is reached or the pole tilts too far. Angles in
/// degrees.
#[must_use]
pub fn episode_done(tick: u32, tick_limit: u32, roll: f64, pitch: f64, angle_limit: f64) -> bool {
    tick >= tick_limit || roll.abs() >= angle_limit || pitch.abs() >= angle_limit
}

/// Owns the physics world and runs episodes on it.
pub struct EpisodeController {
    config: EnvConfig,
    mapper: ActionMapper,
    extractor: StateExtractor,
    rng: fastrand::Rng,
    world: Option<World>,
    scene: Scene,
    tick: u32,
    phase: Phase,
    started_at: f64,
}

impl EpisodeController {
    #[must_use]
    pub fn new(config: EnvConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            mapper: ActionMapper::new(config.action_mode, config.force_magnitude),
            extractor: StateExtractor::new(config.euler_pole),
            rng,
            world: None,
            scene: Scene::default(),
            tick: 0,
            phase: Phase::Uninitialized,
            started_at: 0.0,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Connect to the engine and load the static walls.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::EngineUnavailable`] if no connection can be made.
    pub fn generate_world(&mut self) -> Result<(), EnvError> {
        let mut world = World::connect_with(self.config.render, CartPoleConfig::default())?;
        world.set_gravity(DVec3::new(0.0, 0.0, -GRAVITY))?;
        world.set_time_step(self.config.time_step)?;
        let walls = world.load_body(Model::Walls)?;
        tracing::info!(time_step = self.config.time_step, "world generated");
        self.scene = Scene {
            cartpole: None,
            walls: Some(walls),
            blocks: Vec::new(),
        };
        self.world = Some(world);
        Ok(())
    }

    /// Reload the cart and the blocks, randomly or from `start`.
    ///
    /// # Errors
    ///
    /// Fails before [`generate_world`](Self::generate_world) or if the
    /// engine rejects a call.
    pub fn reset_world(&mut self, start: Option<&FeatureVector>) -> Result<(), EnvError> {
        let world = self
            .world
            .as_mut()
            .ok_or_else(|| PhysicsError::InvalidHandle("world not generated".into()))?;

        if let Some(old) = self.scene.cartpole.take() {
            world.remove_body(old)?;
        }
        for old in self.scene.blocks.drain(..) {
            world.remove_body(old)?;
        }

        let cart = world.load_body(Model::GroundCart)?;
        self.scene.cartpole = Some(cart);
        world.set_joint_motor(cart, POLE_LINK, JointMotor::loose_spherical())?;
        world.reset_base_pose(cart, DVec3::ZERO, DQuat::IDENTITY)?;

        let rng = &mut self.rng;
        let (cart_position, cart_velocity) = match start {
            Some(features) => (features.cart_position(), features.cart_velocity()),
            None => (
                DVec3::new(
                    uniform(rng, CART_POSITION_RANGE),
                    uniform(rng, CART_POSITION_RANGE),
                    0.0,
                ),
                DVec3::new(
                    uniform(rng, CART_VELOCITY_RANGE),
                    uniform(rng, CART_VELOCITY_RANGE),
                    0.0,
                ),
            ),
        };
        world.reset_joint_state(
            cart,
            CART_LINK,
            JointState::Planar {
                position: cart_position,
                velocity: cart_velocity,
            },
        )?;

        let (pole_orientation, pole_velocity) = match start {
            Some(features) => (
                features.pole_quaternion(),
                DVec3::new(features.pole.x_velocity, features.pole.y_velocity, 0.0),
            ),
            None => {
                let noise: [f64; 5] = std::array::from_fn(|_| uniform(rng, POLE_NOISE));
                let mut q = DQuat::from_xyzw(noise[0], noise[1], noise[2], 1.0);
                if self.config.renormalize_pole_noise {
                    q = q.normalize();
                }
                (q, DVec3::new(noise[3], noise[4], 0.0))
            }
        };
        world.reset_joint_state(
            cart,
            POLE_LINK,
            JointState::Spherical {
                orientation: pole_orientation,
                angular_velocity: pole_velocity,
            },
        )?;

        let placements = match start {
            Some(features) => {
                if features.blocks.is_empty() {
                    tracing::warn!("feature vector has no blocks");
                }
                features
                    .blocks
                    .iter()
                    .map(|block| {
                        let velocity = self.config.apply_block_velocities.then(|| block.velocity());
                        (block.position(), velocity)
                    })
                    .collect::<Vec<_>>()
            }
            None => random_blocks(rng, &self.config, cart_position),
        };

        for (position, velocity) in placements {
            let block = world.load_body(Model::Block)?;
            world.change_dynamics(block, BASE_LINK, Material::bouncy())?;
            world.reset_base_pose(block, position, BLOCK_ORIENTATION)?;
            if let Some(velocity) = velocity {
                world.reset_base_velocity(block, velocity, DVec3::ZERO)?;
            }
            self.scene.blocks.push(block);
        }

        Ok(())
    }

    /// Whether the episode is over: tick limit reached or pole past the
    /// angle limit. Does not touch the world.
    ///
    /// # Errors
    ///
    /// Fails before the first reset.
    pub fn is_done(&self) -> Result<bool, EnvError> {
        let (world, cart) = self.live()?;
        let JointState::Spherical { orientation: q, .. } = world.joint_state(cart, POLE_LINK)? else {
            return Err(PhysicsError::InvalidHandle("pole joint is not spherical".into()).into());
        };
        let (roll, pitch, _) = orientation::to_euler(q);
        Ok(episode_done(
            self.tick,
            self.config.tick_limit,
            roll,
            pitch,
            self.config.angle_limit,
        ))
    }

    /// `tick / tick_limit`, capped at 1 when stepping past the horizon.
    #[must_use]
    pub fn get_reward(&self) -> f64 {
        (f64::from(self.tick) / f64::from(self.config.tick_limit.max(1))).min(1.0)
    }

    /// Seconds since the epoch at the last reset plus simulated time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.started_at + f64::from(self.tick) * self.config.time_step
    }

    /// Snapshot the world without stepping.
    ///
    /// # Errors
    ///
    /// Fails before the first reset.
    pub fn state(&self, include_walls: bool) -> Result<WorldState, EnvError> {
        let (world, _) = self.live()?;
        self.extractor.extract(world, &self.scene, include_walls)
    }

    /// Disconnect from the engine. A later reset starts from scratch.
    pub fn close(&mut self) {
        if let Some(mut world) = self.world.take() {
            world.disconnect();
            tracing::info!(tick = self.tick, "environment closed");
        }
        self.scene = Scene::default();
        self.tick = 0;
        self.phase = Phase::Uninitialized;
    }

    fn live(&self) -> Result<(&World, physics::BodyId), EnvError> {
        let world = self
            .world
            .as_ref()
            .ok_or_else(|| PhysicsError::InvalidHandle("environment not reset".into()))?;
        Ok((world, self.scene.cartpole()?))
    }
}

impl Env for EpisodeController {
    fn reset(&mut self, start: Option<&FeatureVector>) -> Result<WorldState, EnvError> {
        self.started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        if self.world.is_none() {
            self.generate_world()?;
        }
        self.tick = 0;
        self.reset_world(start)?;
        self.phase = Phase::Ready;

        let state = self.state(true)?;
        tracing::debug!(
            blocks = state.blocks.len(),
            from_features = start.is_some(),
            "episode reset"
        );
        Ok(state)
    }

    fn step(&mut self, command: Command) -> Result<StepOutcome, EnvError> {
        let (world, cart) = self.live()?;
        let heading = orientation::heading(world.link_state(cart, CART_LINK)?.orientation);
        let force = self.mapper.force(command, heading)?;

        let anti_gravity = DVec3::new(0.0, 0.0, self.config.block_anti_gravity);
        let world = self
            .world
            .as_mut()
            .ok_or_else(|| PhysicsError::InvalidHandle("environment not reset".into()))?;
        world.apply_external_force(cart, CART_LINK, force, DVec3::ZERO, Frame::Link)?;
        for &block in &self.scene.blocks {
            world.apply_external_force(block, BASE_LINK, anti_gravity, DVec3::ZERO, Frame::Link)?;
        }
        world.step_simulation()?;
        self.tick += 1;

        let done = self.is_done()?;
        let reward = self.get_reward();
        self.phase = if done { Phase::Done } else { Phase::Stepping };
        let state = self.state(false)?;
        tracing::debug!(tick = self.tick, ?command, reward, done, "step");

        Ok(StepOutcome {
            state,
            reward,
            done,
            info: BTreeMap::new(),
        })
    }

    fn action_space(&self) -> ActionSpace {
        self.mapper.space()
    }
}

impl Drop for EpisodeController {
    fn drop(&mut self) {
        self.close();
    }
}

/// Uniform sample in `[-half_width, half_width)`.
fn uniform(rng: &mut fastrand::Rng, half_width: f64) -> f64 {
    range(rng, -half_width, half_width)
}

fn range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + (high - low) * rng.f64()
}

/// Random block placements: count, position clear of the cart, and velocity.
fn random_blocks(rng: &mut fastrand::Rng, config: &EnvConfig, cart: DVec3) -> Vec<(DVec3, Option<DVec3>)> {
    let (lo, hi) = (config.min_blocks.min(config.max_blocks), config.min_blocks.max(config.max_blocks));
    let count = rng.usize(lo..=hi);

    let sample = |rng: &mut fastrand::Rng| {
        DVec3::new(
            uniform(rng, BLOCK_POSITION_RANGE),
            uniform(rng, BLOCK_POSITION_RANGE),
            uniform(rng, BLOCK_POSITION_RANGE) + BLOCK_LIFT,
        )
    };
    let planar = |p: DVec3| (p - cart).truncate().length();

    (0..count)
        .map(|_| {
            let mut position = sample(rng);
            let mut attempts = 1;
            while planar(position) < config.min_block_distance {
                if attempts >= MAX_PLACEMENT_ATTEMPTS {
                    tracing::warn!(?position, "no block placement clear of the cart, keeping the last sample");
                    break;
                }
                position = sample(rng);
                attempts += 1;
            }

            let velocity = DVec3::from_array(std::array::from_fn(|_| {
                let speed = range(rng, BLOCK_SPEED.0, BLOCK_SPEED.1);
                if rng.bool() {
                    -speed
                } else {
                    speed
                }
            }));
            (position, Some(velocity))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_at_horizon_regardless_of_tilt() {
        assert!(episode_done(200, 200, 0.0, 0.0, 10.0));
        assert!(episode_done(250, 200, 0.0, 0.0, 10.0));
        assert!(!episode_done(199, 200, 9.99, -9.99, 10.0));
    }

    #[test]
    fn done_on_tilt_regardless_of_tick() {
        assert!(episode_done(0, 200, 10.0, 0.0, 10.0));
        assert!(episode_done(0, 200, 0.0, -10.0, 10.0));
        assert!(episode_done(3, 200, -45.0, 12.0, 10.0));
    }

    #[test]
    fn random_blocks_respect_count_and_clearance() {
        let mut rng = fastrand::Rng::with_seed(11);
        let config = EnvConfig::default();
        let cart = DVec3::new(1.0, -2.0, 0.0);
        for _ in 0..50 {
            let blocks = random_blocks(&mut rng, &config, cart);
            assert!((1..=4).contains(&blocks.len()));
            for (position, velocity) in blocks {
                assert!((position - cart).truncate().length() >= 1.0);
                assert!((1.0..9.0).contains(&position.z));
                let velocity = velocity.unwrap();
                for speed in velocity.to_array() {
                    assert!((6.0..10.0).contains(&speed.abs()));
                }
            }
        }
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..1000 {
            let u = uniform(&mut rng, POLE_NOISE);
            assert!((-POLE_NOISE..POLE_NOISE).contains(&u));
        }
    }
}
