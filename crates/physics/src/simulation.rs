//! # Physics Simulation Core
//!
//! This module provides the [`World`], the engine connection that owns every
//! body, and its query, reset and actuation surface. Body creation lives in
//! [`crate::builder`], numerical integration in [`crate::integrator`] and
//! contact handling in [`crate::collision`].

use std::collections::BTreeSet;

use glam::{DQuat, DVec3};

use crate::cartpole::{CartPoleBody, CartPoleConfig};
use crate::collision;
use crate::error::PhysicsError;
use crate::integrator::{integrate_blocks, integrate_cartpoles};
use crate::types::{
    BodyId, Frame, JointMotor, JointState, LinkState, Material, Model, PhysParams, WallBox,
    BASE_LINK, CART_LINK, POLE_LINK,
};

/// Free cube.
#[derive(Clone, Debug)]
pub(crate) struct BlockBody {
    pub pos: DVec3,
    pub orientation: DQuat,
    pub vel: DVec3,
    pub angular_vel: DVec3,
    pub half_extent: f64,
    pub mass: f64,
    pub material: Material,
    /// External force accumulated for the next step, world frame
    pub force: DVec3,
}

/// Static box of walls.
#[derive(Clone, Debug)]
pub(crate) struct WallBody {
    pub bounds: WallBox,
    pub material: Material,
}

#[derive(Clone, Debug)]
pub(crate) enum Body {
    CartPole(Box<CartPoleBody>),
    Walls(WallBody),
    Block(BlockBody),
}

impl Body {
    pub fn model(&self) -> Model {
        match self {
            Body::CartPole(_) => Model::GroundCart,
            Body::Walls(_) => Model::Walls,
            Body::Block(_) => Model::Block,
        }
    }
}

/// A connection to the physics engine and every body it owns.
///
/// A world is single-threaded and synchronous: every call completes before
/// returning. After [`disconnect`](World::disconnect) all operations fail
/// with [`PhysicsError::InvalidHandle`].
pub struct World {
    pub(crate) params: PhysParams,
    pub(crate) cart_config: CartPoleConfig,
    pub(crate) slots: Vec<Option<Body>>,
    pub(crate) free_slots: BTreeSet<u32>,
    connected: bool,
    steps: u64,
}

impl World {
    /// Open a connection to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::EngineUnavailable`] when `render` is requested:
    /// this engine has no GUI backend.
    pub fn connect(render: bool) -> Result<Self, PhysicsError> {
        Self::connect_with(render, CartPoleConfig::default())
    }

    /// Open a connection whose ground-cart model uses the given geometry.
    ///
    /// # Errors
    ///
    /// See [`World::connect`].
    pub fn connect_with(render: bool, cart_config: CartPoleConfig) -> Result<Self, PhysicsError> {
        if render {
            return Err(PhysicsError::EngineUnavailable(
                "GUI connection requested but only the headless backend is available".into(),
            ));
        }
        tracing::info!("physics world connected (headless)");
        Ok(Self {
            params: PhysParams::default(),
            cart_config,
            slots: Vec::new(),
            free_slots: BTreeSet::new(),
            connected: true,
            steps: 0,
        })
    }

    /// Release the connection and every body. Idempotent.
    pub fn disconnect(&mut self) {
        if self.connected {
            tracing::debug!(bodies = self.num_bodies(), steps = self.steps, "physics world disconnected");
        }
        self.connected = false;
        self.slots.clear();
        self.free_slots.clear();
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn params(&self) -> PhysParams {
        self.params
    }

    /// Number of ticks advanced since connecting.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// # Errors
    ///
    /// Fails if the world is disconnected.
    pub fn set_gravity(&mut self, gravity: DVec3) -> Result<(), PhysicsError> {
        self.ensure_connected()?;
        self.params.gravity = gravity;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the world is disconnected or `dt` is not a positive number.
    pub fn set_time_step(&mut self, dt: f64) -> Result<(), PhysicsError> {
        self.ensure_connected()?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::invalid(format!("time step must be positive, got {dt}")));
        }
        self.params.dt = dt;
        Ok(())
    }

    /// Advance the simulation by one fixed tick.
    ///
    /// Forces applied since the previous step act for the whole tick and are
    /// cleared afterwards.
    ///
    /// # Errors
    ///
    /// Fails if the world is disconnected.
    pub fn step_simulation(&mut self) -> Result<(), PhysicsError> {
        self.ensure_connected()?;
        let PhysParams { gravity, dt } = self.params;

        // 1. Integrate articulated and free bodies
        integrate_cartpoles(self.slots.iter_mut().flatten(), gravity, dt);
        integrate_blocks(self.slots.iter_mut().flatten(), gravity, dt);

        // 2. Contacts
        collision::resolve_contacts(&mut self.slots);

        // 3. Forces only last one tick
        for body in self.slots.iter_mut().flatten() {
            match body {
                Body::CartPole(cart) => cart.clear_forces(),
                Body::Block(block) => block.force = DVec3::ZERO,
                Body::Walls(_) => {}
            }
        }

        self.steps += 1;
        Ok(())
    }

    /// Apply an external force to a link for the next step.
    ///
    /// With [`Frame::Link`] both `force` and `position` are expressed in the
    /// link frame, `position` relative to the link origin; with
    /// [`Frame::World`] both are world quantities. Forces on static bases are
    /// accepted and have no effect.
    ///
    /// # Errors
    ///
    /// Fails for a disconnected world, a removed body or a missing link.
    pub fn apply_external_force(
        &mut self,
        body: BodyId,
        link: i32,
        force: DVec3,
        position: DVec3,
        frame: Frame,
    ) -> Result<(), PhysicsError> {
        match self.body_mut(body)? {
            Body::CartPole(cart) => match link {
                BASE_LINK => Ok(()),
                CART_LINK => {
                    let world_force = match frame {
                        Frame::World => force,
                        Frame::Link => cart.base_orientation * force,
                    };
                    cart.cart_force += world_force;
                    Ok(())
                }
                POLE_LINK => {
                    let pole = cart.pole_link();
                    let (world_force, world_point) = match frame {
                        Frame::World => (force, position),
                        Frame::Link => (pole.orientation * force, pole.position + pole.orientation * position),
                    };
                    cart.pole_torque += (world_point - cart.pivot()).cross(world_force);
                    cart.cart_force += world_force;
                    Ok(())
                }
                _ => Err(missing_link(body, link)),
            },
            Body::Block(block) => {
                if link != BASE_LINK {
                    return Err(missing_link(body, link));
                }
                block.force += match frame {
                    Frame::World => force,
                    Frame::Link => block.orientation * force,
                };
                Ok(())
            }
            Body::Walls(_) => {
                if link == BASE_LINK {
                    Ok(())
                } else {
                    Err(missing_link(body, link))
                }
            }
        }
    }

    /// Install a PD motor on a joint. The motor's target must match the
    /// joint kind.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle, a body without that joint or a target of the
    /// wrong kind.
    pub fn set_joint_motor(&mut self, body: BodyId, joint: i32, motor: JointMotor) -> Result<(), PhysicsError> {
        let Body::CartPole(cart) = self.body_mut(body)? else {
            return Err(missing_joint(body, joint));
        };
        match (joint, motor.target) {
            (CART_LINK, JointState::Planar { .. }) => cart.cart_motor = Some(motor),
            (POLE_LINK, JointState::Spherical { .. }) => cart.pole_motor = Some(motor),
            (CART_LINK | POLE_LINK, target) => {
                return Err(PhysicsError::invalid(format!(
                    "joint {joint} of body {body} does not accept a {} target",
                    target.kind()
                )))
            }
            _ => return Err(missing_joint(body, joint)),
        }
        Ok(())
    }

    /// Change the contact material of a link.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle or missing link.
    pub fn change_dynamics(&mut self, body: BodyId, link: i32, material: Material) -> Result<(), PhysicsError> {
        match (self.body_mut(body)?, link) {
            (Body::CartPole(cart), CART_LINK) => cart.cart_material = material,
            (Body::CartPole(cart), POLE_LINK) => cart.pole_material = material,
            (Body::Walls(walls), BASE_LINK) => walls.material = material,
            (Body::Block(block), BASE_LINK) => block.material = material,
            _ => return Err(missing_link(body, link)),
        }
        Ok(())
    }

    /// Position and orientation of a body's base.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle.
    pub fn base_pose(&self, body: BodyId) -> Result<(DVec3, DQuat), PhysicsError> {
        Ok(match self.body(body)? {
            Body::CartPole(cart) => (cart.base_position, cart.base_orientation),
            Body::Walls(walls) => ((walls.bounds.min + walls.bounds.max) * 0.5, DQuat::IDENTITY),
            Body::Block(block) => (block.pos, block.orientation),
        })
    }

    /// Linear and angular velocity of a body's base. Static bases report zero.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle.
    pub fn base_velocity(&self, body: BodyId) -> Result<(DVec3, DVec3), PhysicsError> {
        Ok(match self.body(body)? {
            Body::CartPole(_) | Body::Walls(_) => (DVec3::ZERO, DVec3::ZERO),
            Body::Block(block) => (block.vel, block.angular_vel),
        })
    }

    /// World-frame state of one link; [`BASE_LINK`] gives the base.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle or missing link.
    pub fn link_state(&self, body: BodyId, link: i32) -> Result<LinkState, PhysicsError> {
        match (self.body(body)?, link) {
            (Body::CartPole(cart), CART_LINK) => Ok(cart.cart_link()),
            (Body::CartPole(cart), POLE_LINK) => Ok(cart.pole_link()),
            (_, BASE_LINK) => {
                let (position, orientation) = self.base_pose(body)?;
                let (linear_velocity, angular_velocity) = self.base_velocity(body)?;
                Ok(LinkState {
                    position,
                    orientation,
                    linear_velocity,
                    angular_velocity,
                })
            }
            _ => Err(missing_link(body, link)),
        }
    }

    /// Joint coordinates as stored, without normalization.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle or missing joint.
    pub fn joint_state(&self, body: BodyId, joint: i32) -> Result<JointState, PhysicsError> {
        match (self.body(body)?, joint) {
            (Body::CartPole(cart), CART_LINK) => Ok(cart.cart_joint()),
            (Body::CartPole(cart), POLE_LINK) => Ok(cart.pole_joint()),
            _ => Err(missing_joint(body, joint)),
        }
    }

    /// Teleport a body's base.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle or for the static walls.
    pub fn reset_base_pose(&mut self, body: BodyId, position: DVec3, orientation: DQuat) -> Result<(), PhysicsError> {
        match self.body_mut(body)? {
            Body::CartPole(cart) => {
                cart.base_position = position;
                cart.base_orientation = orientation;
            }
            Body::Block(block) => {
                block.pos = position;
                block.orientation = orientation;
            }
            Body::Walls(_) => return Err(static_base(body)),
        }
        Ok(())
    }

    /// Overwrite the velocity of a free body's base.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle or a static base.
    pub fn reset_base_velocity(&mut self, body: BodyId, linear: DVec3, angular: DVec3) -> Result<(), PhysicsError> {
        match self.body_mut(body)? {
            Body::Block(block) => {
                block.vel = linear;
                block.angular_vel = angular;
                Ok(())
            }
            Body::CartPole(_) | Body::Walls(_) => Err(static_base(body)),
        }
    }

    /// Overwrite joint coordinates. Values are stored verbatim: a
    /// non-unit quaternion stays non-unit until the joint next rotates.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle, a missing joint or a state of the wrong kind.
    pub fn reset_joint_state(&mut self, body: BodyId, joint: i32, state: JointState) -> Result<(), PhysicsError> {
        let Body::CartPole(cart) = self.body_mut(body)? else {
            return Err(missing_joint(body, joint));
        };
        match (joint, state) {
            (CART_LINK, JointState::Planar { position, velocity }) => {
                cart.cart_offset = position;
                cart.cart_velocity = velocity;
            }
            (
                POLE_LINK,
                JointState::Spherical {
                    orientation,
                    angular_velocity,
                },
            ) => {
                cart.pole_orientation = orientation;
                cart.pole_angular_velocity = angular_velocity;
            }
            (CART_LINK | POLE_LINK, state) => {
                return Err(PhysicsError::invalid(format!(
                    "joint {joint} of body {body} cannot take a {} state",
                    state.kind()
                )))
            }
            _ => return Err(missing_joint(body, joint)),
        }
        Ok(())
    }

    /// Corners of a walls body, see [`WallBox::corners`].
    ///
    /// # Errors
    ///
    /// Fails for a bad handle or a body that is not a walls model.
    pub fn wall_corners(&self, body: BodyId) -> Result<[DVec3; 8], PhysicsError> {
        match self.body(body)? {
            Body::Walls(walls) => Ok(walls.bounds.corners()),
            other => Err(PhysicsError::invalid(format!(
                "body {body} is a {} model, not walls",
                other.model()
            ))),
        }
    }

    /// Model of a live body.
    ///
    /// # Errors
    ///
    /// Fails for a bad handle.
    pub fn model(&self, body: BodyId) -> Result<Model, PhysicsError> {
        Ok(self.body(body)?.model())
    }

    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub(crate) fn ensure_connected(&self) -> Result<(), PhysicsError> {
        if self.connected {
            Ok(())
        } else {
            Err(PhysicsError::invalid("world is disconnected"))
        }
    }

    pub(crate) fn body(&self, id: BodyId) -> Result<&Body, PhysicsError> {
        self.ensure_connected()?;
        self.slots
            .get(id.slot())
            .and_then(Option::as_ref)
            .ok_or_else(|| PhysicsError::invalid(format!("body {id} does not exist")))
    }

    pub(crate) fn body_mut(&mut self, id: BodyId) -> Result<&mut Body, PhysicsError> {
        self.ensure_connected()?;
        self.slots
            .get_mut(id.slot())
            .and_then(Option::as_mut)
            .ok_or_else(|| PhysicsError::invalid(format!("body {id} does not exist")))
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn missing_link(body: BodyId, link: i32) -> PhysicsError {
    PhysicsError::invalid(format!("body {body} has no link {link}"))
}

fn missing_joint(body: BodyId, joint: i32) -> PhysicsError {
    PhysicsError::invalid(format!("body {body} has no joint {joint}"))
}

fn static_base(body: BodyId) -> PhysicsError {
    PhysicsError::invalid(format!("base of body {body} is static"))
}
