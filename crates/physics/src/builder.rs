//! # Body Builder
//!
//! Loading and removal of bodies. Handles are pool slots: removal frees the
//! slot and the next load reuses the lowest free slot.

use glam::{DQuat, DVec3};

use crate::cartpole::CartPoleBody;
use crate::error::PhysicsError;
use crate::simulation::{BlockBody, Body, WallBody, World};
use crate::types::{BodyId, Material, Model, WallBox};

/// Half edge length of the block model.
pub const BLOCK_HALF_EXTENT: f64 = 0.25;
/// Mass of the block model in kg.
pub const BLOCK_MASS: f64 = 1.0;

impl World {
    /// Build a body from a model and return its handle.
    ///
    /// New bodies start at the origin, at rest, with identity orientation.
    ///
    /// # Errors
    ///
    /// Fails if the world is disconnected.
    pub fn load_body(&mut self, model: Model) -> Result<BodyId, PhysicsError> {
        self.ensure_connected()?;
        let body = match model {
            Model::GroundCart => Body::CartPole(Box::new(CartPoleBody::new(self.cart_config.clone()))),
            Model::Walls => Body::Walls(WallBody {
                bounds: WallBox::default(),
                material: Material::bouncy(),
            }),
            Model::Block => Body::Block(BlockBody {
                pos: DVec3::ZERO,
                orientation: DQuat::IDENTITY,
                vel: DVec3::ZERO,
                angular_vel: DVec3::ZERO,
                half_extent: BLOCK_HALF_EXTENT,
                mass: BLOCK_MASS,
                material: Material::bouncy(),
                force: DVec3::ZERO,
            }),
        };
        let id = self.allocate(body);
        tracing::trace!(%model, %id, "body loaded");
        Ok(id)
    }

    /// Destroy a body. Its handle becomes invalid until the slot is reused.
    ///
    /// # Errors
    ///
    /// Fails if the world is disconnected or the body does not exist.
    pub fn remove_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        self.body(id)?;
        self.slots[id.slot()] = None;
        self.free_slots.insert(id.raw());
        tracing::trace!(%id, "body removed");
        Ok(())
    }

    fn allocate(&mut self, body: Body) -> BodyId {
        if let Some(slot) = self.free_slots.pop_first() {
            self.slots[slot as usize] = Some(body);
            BodyId(slot)
        } else {
            self.slots.push(Some(body));
            let slot = u32::try_from(self.slots.len() - 1).unwrap_or(u32::MAX);
            BodyId(slot)
        }
    }
}
