use std::fmt;

use glam::{DQuat, DVec3};

/// Link index addressing a body's base.
pub const BASE_LINK: i32 = -1;
/// Link (and joint) index of the cart on a [`Model::GroundCart`] body.
pub const CART_LINK: i32 = 0;
/// Link (and joint) index of the pole on a [`Model::GroundCart`] body.
pub const POLE_LINK: i32 = 1;

/// Opaque handle to a body loaded into a [`World`](crate::World).
///
/// Handles are slot indices. A removed body's slot is handed out again by the
/// next [`load_body`](crate::World::load_body), lowest slot first, so the same
/// sequence of loads and removals always produces the same handles.
///
/// A stale handle is only rejected while its slot is empty. Once the slot is
/// reused the old handle addresses the new body, so drop handles when
/// removing their bodies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub(crate) u32);

impl BodyId {
    /// Rebuild a handle from its raw value, e.g. one read back from JSON.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Body models the engine knows how to build.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Model {
    /// Static ground base carrying a cart (planar joint, link 0) and a pole
    /// (spherical joint, link 1).
    GroundCart,
    /// Static axis-aligned box of walls, floor and ceiling.
    Walls,
    /// Free cube of unit mass.
    Block,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Model::GroundCart => "ground_cart",
            Model::Walls => "walls",
            Model::Block => "block",
        };
        f.write_str(name)
    }
}

/// Surface properties used by contact resolution.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub restitution: f64,
    pub friction: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.5,
        }
    }
}

impl Material {
    /// Perfectly elastic, frictionless surface.
    #[must_use]
    pub const fn bouncy() -> Self {
        Self {
            restitution: 1.0,
            friction: 0.0,
        }
    }
}

/// Reference frame of a force and its application point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    World,
    /// Expressed in the target link's own frame.
    Link,
}

/// Global simulation parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhysParams {
    pub gravity: DVec3,
    /// Duration of one [`step_simulation`](crate::World::step_simulation).
    pub dt: f64,
}

impl Default for PhysParams {
    fn default() -> Self {
        Self {
            gravity: DVec3::new(0.0, 0.0, -9.8),
            dt: 1.0 / 50.0,
        }
    }
}

/// World-frame kinematic state of one link.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinkState {
    pub position: DVec3,
    pub orientation: DQuat,
    pub linear_velocity: DVec3,
    pub angular_velocity: DVec3,
}

/// Joint coordinates, in the frame of the joint's parent link.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum JointState {
    /// Translational joint: offset and velocity of the child link.
    Planar { position: DVec3, velocity: DVec3 },
    /// Ball joint: child orientation and angular velocity.
    Spherical {
        orientation: DQuat,
        angular_velocity: DVec3,
    },
}

impl JointState {
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            JointState::Planar { .. } => "planar",
            JointState::Spherical { .. } => "spherical",
        }
    }
}

/// PD motor driving a joint towards a target state.
///
/// The generalized force is `position_gain * position_error + velocity_gain *
/// velocity_error`, clamped per axis to `max_force`. A zero `max_force`
/// leaves the joint free.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointMotor {
    pub target: JointState,
    pub position_gain: f64,
    pub velocity_gain: f64,
    pub max_force: DVec3,
}

impl JointMotor {
    /// Motor that exerts no force, leaving a spherical joint loose.
    #[must_use]
    pub const fn loose_spherical() -> Self {
        Self {
            target: JointState::Spherical {
                orientation: DQuat::IDENTITY,
                angular_velocity: DVec3::ZERO,
            },
            position_gain: 0.0,
            velocity_gain: 0.1,
            max_force: DVec3::ZERO,
        }
    }

    pub(crate) fn clamp(&self, raw: DVec3) -> DVec3 {
        raw.clamp(-self.max_force.abs(), self.max_force.abs())
    }
}

/// Axis-aligned box enclosed by the walls model.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WallBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for WallBox {
    fn default() -> Self {
        Self {
            min: DVec3::new(-5.0, -5.0, 0.0),
            max: DVec3::new(5.0, 5.0, 10.0),
        }
    }
}

impl WallBox {
    /// The eight corners: floor ring first, then ceiling ring, each ring
    /// walked counter-clockwise from `(min.x, min.y)`.
    #[must_use]
    pub fn corners(&self) -> [DVec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            DVec3::new(lo.x, lo.y, lo.z),
            DVec3::new(hi.x, lo.y, lo.z),
            DVec3::new(hi.x, hi.y, lo.z),
            DVec3::new(lo.x, hi.y, lo.z),
            DVec3::new(lo.x, lo.y, hi.z),
            DVec3::new(hi.x, lo.y, hi.z),
            DVec3::new(hi.x, hi.y, hi.z),
            DVec3::new(lo.x, hi.y, hi.z),
        ]
    }
}
