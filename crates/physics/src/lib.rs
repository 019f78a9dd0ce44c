#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # CartPole++ Physics Engine
//!
//! A small CPU rigid-body engine that hosts the CartPole++ world: a cart on a
//! planar joint over a static ground, a pole on a spherical joint at the top
//! of the cart, a bounding box of walls and a handful of free-floating blocks.
//!
//! The engine is the "world client" collaborator of the `cartpole`
//! environment crate. It deliberately mirrors the primitive surface of a
//! general purpose rigid-body engine so that the environment code reads like
//! it is driving one:
//!
//! -   **Lifecycle:** [`World::connect`] / [`World::disconnect`]. A world owns
//!     its bodies; dropping it releases everything.
//! -   **Bodies:** [`World::load_body`] and [`World::remove_body`] hand out
//!     opaque [`BodyId`] handles for the models in [`Model`].
//! -   **Actuation:** [`World::apply_external_force`] and
//!     [`World::set_joint_motor`].
//! -   **Time:** [`World::step_simulation`] advances one fixed tick.
//! -   **Queries and resets:** base poses, link states and joint states, see
//!     the [`simulation`] module.
//!
//! Orientation helpers shared with the environment live in [`orientation`].
//!
//! ## Usage
//!
//! ```rust
//! use physics::{Frame, Model, World, CART_LINK};
//! use glam::DVec3;
//!
//! # fn main() -> Result<(), physics::PhysicsError> {
//! let mut world = World::connect(false)?;
//! let cart = world.load_body(Model::GroundCart)?;
//! world.apply_external_force(cart, CART_LINK, DVec3::new(10.0, 0.0, 0.0), DVec3::ZERO, Frame::Link)?;
//! world.step_simulation()?;
//! assert!(world.link_state(cart, CART_LINK)?.linear_velocity.x > 0.0);
//! world.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cartpole;
mod collision;
pub mod error;
mod integrator;
pub mod orientation;
pub mod simulation;
pub mod types;

pub use cartpole::CartPoleConfig;
pub use error::PhysicsError;
pub use simulation::World;
pub use types::{
    BodyId, Frame, JointMotor, JointState, LinkState, Material, Model, PhysParams, WallBox,
    BASE_LINK, CART_LINK, POLE_LINK,
};
