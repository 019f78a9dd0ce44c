//! State extraction
//!
//! Reads the engine and builds a fresh, rounded [`WorldState`].

use glam::{DQuat, DVec3};
use physics::{orientation, BodyId, JointState, PhysicsError, World, CART_LINK, POLE_LINK};

use crate::error::EnvError;
use crate::state::{round16, round_vec, BlockState, CartState, PoleOrientation, PoleState, WorldState};

/// Handles of the bodies that make up one episode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scene {
    pub cartpole: Option<BodyId>,
    pub walls: Option<BodyId>,
    pub blocks: Vec<BodyId>,
}

impl Scene {
    /// # Errors
    ///
    /// Fails with [`PhysicsError::InvalidHandle`] before the cart is loaded.
    pub fn cartpole(&self) -> Result<BodyId, PhysicsError> {
        self.cartpole
            .ok_or_else(|| PhysicsError::InvalidHandle("no cart loaded".into()))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StateExtractor {
    /// Report the pole as `(roll, pitch, yaw)` degrees instead of a quaternion.
    pub euler_pole: bool,
}

impl StateExtractor {
    #[must_use]
    pub fn new(euler_pole: bool) -> Self {
        Self { euler_pole }
    }

    /// Snapshot the world. Wall corners are included only when asked for.
    ///
    /// # Errors
    ///
    /// Propagates [`PhysicsError::InvalidHandle`] for a disconnected world or
    /// a scene that no longer matches it.
    pub fn extract(&self, world: &World, scene: &Scene, include_walls: bool) -> Result<WorldState, EnvError> {
        let cartpole = scene.cartpole()?;

        let (base, _) = world.base_pose(cartpole)?;
        let JointState::Planar { position, velocity } = world.joint_state(cartpole, CART_LINK)? else {
            return Err(unexpected_joint(cartpole, CART_LINK));
        };
        let cart = CartState {
            position: round_vec(base + position),
            velocity: DVec3::new(round16(velocity.x), round16(velocity.y), 0.0),
        };

        let JointState::Spherical {
            orientation: joint,
            angular_velocity,
        } = world.joint_state(cartpole, POLE_LINK)?
        else {
            return Err(unexpected_joint(cartpole, POLE_LINK));
        };
        let orientation = if self.euler_pole {
            let (roll, pitch, yaw) = orientation::to_euler(joint);
            PoleOrientation::Euler(round_vec(DVec3::new(roll, pitch, yaw)))
        } else {
            PoleOrientation::Quaternion(DQuat::from_xyzw(
                round16(joint.x),
                round16(joint.y),
                round16(joint.z),
                round16(joint.w),
            ))
        };
        let pole = PoleState {
            orientation,
            angular_velocity: round_vec(angular_velocity),
        };

        let blocks = scene
            .blocks
            .iter()
            .map(|&id| -> Result<BlockState, PhysicsError> {
                let (position, _) = world.base_pose(id)?;
                let (velocity, _) = world.base_velocity(id)?;
                Ok(BlockState {
                    id: Some(id),
                    position: round_vec(position),
                    velocity: round_vec(velocity),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let walls = match (include_walls, scene.walls) {
            (true, Some(id)) => Some(world.wall_corners(id)?.map(round_vec)),
            _ => None,
        };

        Ok(WorldState {
            cart,
            pole,
            blocks,
            walls,
        })
    }
}

fn unexpected_joint(body: BodyId, joint: i32) -> EnvError {
    PhysicsError::InvalidHandle(format!("joint {joint} of body {body} has an unexpected kind")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use physics::Model;

    fn scene(world: &mut World) -> Scene {
        let cartpole = world.load_body(Model::GroundCart).unwrap();
        let walls = world.load_body(Model::Walls).unwrap();
        let block = world.load_body(Model::Block).unwrap();
        world
            .reset_base_pose(block, DVec3::new(1.0, 2.0, 6.0), DQuat::from_xyzw(0.0, 0.0, 1.0, 0.0))
            .unwrap();
        world
            .reset_base_velocity(block, DVec3::new(-7.0, 6.5, 9.0), DVec3::ZERO)
            .unwrap();
        Scene {
            cartpole: Some(cartpole),
            walls: Some(walls),
            blocks: vec![block],
        }
    }

    #[test]
    fn reads_cart_pole_and_blocks() {
        let mut world = World::connect(false).unwrap();
        let scene = scene(&mut world);
        let cart = scene.cartpole.unwrap();
        world
            .reset_joint_state(
                cart,
                CART_LINK,
                JointState::Planar {
                    position: DVec3::new(1.5, -2.0, 0.0),
                    velocity: DVec3::new(0.5, 0.25, 3.0),
                },
            )
            .unwrap();

        let state = StateExtractor::default().extract(&world, &scene, false).unwrap();
        assert_eq!(state.cart.position, DVec3::new(1.5, -2.0, 0.0));
        assert_eq!(state.cart.velocity, DVec3::new(0.5, 0.25, 0.0));
        assert_eq!(state.pole.orientation, PoleOrientation::Quaternion(DQuat::IDENTITY));
        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.blocks[0].position, DVec3::new(1.0, 2.0, 6.0));
        assert_eq!(state.blocks[0].velocity, DVec3::new(-7.0, 6.5, 9.0));
        assert!(state.walls.is_none());
    }

    #[test]
    fn walls_only_on_request() {
        let mut world = World::connect(false).unwrap();
        let scene = scene(&mut world);
        let state = StateExtractor::default().extract(&world, &scene, true).unwrap();
        let walls = state.walls.unwrap();
        assert_eq!(walls[0], DVec3::new(-5.0, -5.0, 0.0));
        assert_eq!(walls[7], DVec3::new(-5.0, 5.0, 10.0));
    }

    #[test]
    fn euler_mode_reports_degrees() {
        let mut world = World::connect(false).unwrap();
        let scene = scene(&mut world);
        world
            .reset_joint_state(
                scene.cartpole.unwrap(),
                POLE_LINK,
                JointState::Spherical {
                    orientation: orientation::from_euler(0.0, 0.0, 5.0),
                    angular_velocity: DVec3::ZERO,
                },
            )
            .unwrap();

        let state = StateExtractor::new(true).extract(&world, &scene, false).unwrap();
        let PoleOrientation::Euler(angles) = state.pole.orientation else {
            panic!("expected Euler angles");
        };
        approx::assert_relative_eq!(angles.x, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn disconnected_world_is_an_invalid_handle() {
        let mut world = World::connect(false).unwrap();
        let scene = scene(&mut world);
        world.disconnect();
        let err = StateExtractor::default().extract(&world, &scene, false).unwrap_err();
        assert!(matches!(err, EnvError::Physics(PhysicsError::InvalidHandle(_))));
    }
}
