//! Articulated ground-cart body
//!
//! The [`Model::GroundCart`](crate::Model::GroundCart) model is a static
//! ground base with two links:
//!
//! - link 0, the cart, on a planar joint. It translates in the ground plane
//!   and never rotates relative to the base.
//! - link 1, the pole, a uniform rod on a spherical joint at the top of the
//!   cart.
//!
//! The pole is driven by gravity, by the inertial pseudo-force of the
//! accelerating cart and by any joint-motor or external torque. The pole's
//! reaction on the cart is neglected; the cart carries the pole's mass.

use glam::{DQuat, DVec3};

use crate::types::{JointMotor, JointState, LinkState, Material};

/// Geometry and mass of the ground-cart model.
#[derive(Clone, Debug, PartialEq)]
pub struct CartPoleConfig {
    /// Cart half-extents (x, y, z)
    pub cart_half_extents: DVec3,
    /// Cart mass in kg
    pub cart_mass: f64,
    /// Pole length in meters
    pub pole_length: f64,
    /// Pole mass in kg
    pub pole_mass: f64,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            cart_half_extents: DVec3::new(0.25, 0.25, 0.1),
            cart_mass: 1.0,
            pole_length: 1.0,
            pole_mass: 0.1,
        }
    }
}

impl CartPoleConfig {
    /// Moment of inertia of the pole about its pivot.
    #[must_use]
    pub fn pole_pivot_inertia(&self) -> f64 {
        self.pole_mass * self.pole_length * self.pole_length / 3.0
    }

    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.cart_mass + self.pole_mass
    }
}

/// Live state of one ground-cart body.
#[derive(Clone, Debug)]
pub(crate) struct CartPoleBody {
    pub config: CartPoleConfig,
    pub base_position: DVec3,
    pub base_orientation: DQuat,
    /// Planar joint offset of the cart, base frame
    pub cart_offset: DVec3,
    /// Planar joint velocity of the cart, base frame
    pub cart_velocity: DVec3,
    /// Spherical joint orientation of the pole relative to the cart
    pub pole_orientation: DQuat,
    /// Spherical joint angular velocity, cart frame
    pub pole_angular_velocity: DVec3,
    pub cart_motor: Option<JointMotor>,
    pub pole_motor: Option<JointMotor>,
    pub cart_material: Material,
    pub pole_material: Material,
    /// External force on the cart accumulated for the next step, world frame
    pub cart_force: DVec3,
    /// External torque about the pole pivot accumulated for the next step, world frame
    pub pole_torque: DVec3,
}

impl CartPoleBody {
    pub fn new(config: CartPoleConfig) -> Self {
        Self {
            config,
            base_position: DVec3::ZERO,
            base_orientation: DQuat::IDENTITY,
            cart_offset: DVec3::ZERO,
            cart_velocity: DVec3::ZERO,
            pole_orientation: DQuat::IDENTITY,
            pole_angular_velocity: DVec3::ZERO,
            cart_motor: None,
            pole_motor: None,
            cart_material: Material::default(),
            pole_material: Material::default(),
            cart_force: DVec3::ZERO,
            pole_torque: DVec3::ZERO,
        }
    }

    pub fn cart_position(&self) -> DVec3 {
        self.base_position + self.base_orientation * self.cart_offset
    }

    pub fn cart_world_velocity(&self) -> DVec3 {
        self.base_orientation * self.cart_velocity
    }

    /// Add a world-frame velocity change to the cart, keeping it in the plane.
    pub fn add_cart_velocity(&mut self, delta: DVec3) {
        let local = self.base_orientation.inverse() * delta;
        self.cart_velocity += DVec3::new(local.x, local.y, 0.0);
    }

    /// Move the cart by a world-frame offset, keeping it in the plane.
    pub fn translate_cart(&mut self, delta: DVec3) {
        let local = self.base_orientation.inverse() * delta;
        self.cart_offset += DVec3::new(local.x, local.y, 0.0);
    }

    pub fn pivot(&self) -> DVec3 {
        self.cart_position() + self.base_orientation * DVec3::new(0.0, 0.0, self.config.cart_half_extents.z)
    }

    /// World orientation of the pole, normalized for use in dynamics.
    pub fn pole_world_orientation(&self) -> DQuat {
        let q = self.base_orientation * self.pole_orientation;
        if q.length_squared() > 0.0 {
            q.normalize()
        } else {
            DQuat::IDENTITY
        }
    }

    pub fn pole_world_angular_velocity(&self) -> DVec3 {
        self.base_orientation * self.pole_angular_velocity
    }

    /// Vector from the pivot to the pole's center of mass.
    pub fn pole_lever(&self) -> DVec3 {
        self.pole_world_orientation() * DVec3::Z * (self.config.pole_length * 0.5)
    }

    pub fn cart_link(&self) -> LinkState {
        LinkState {
            position: self.cart_position(),
            orientation: self.base_orientation,
            linear_velocity: self.cart_world_velocity(),
            angular_velocity: DVec3::ZERO,
        }
    }

    pub fn pole_link(&self) -> LinkState {
        let lever = self.pole_lever();
        let omega = self.pole_world_angular_velocity();
        LinkState {
            position: self.pivot() + lever,
            orientation: self.pole_world_orientation(),
            linear_velocity: self.cart_world_velocity() + omega.cross(lever),
            angular_velocity: omega,
        }
    }

    pub fn cart_joint(&self) -> JointState {
        JointState::Planar {
            position: self.cart_offset,
            velocity: self.cart_velocity,
        }
    }

    pub fn pole_joint(&self) -> JointState {
        JointState::Spherical {
            orientation: self.pole_orientation,
            angular_velocity: self.pole_angular_velocity,
        }
    }

    /// Generalized force of the planar joint motor, world frame.
    fn cart_motor_force(&self) -> DVec3 {
        let Some(motor) = self.cart_motor else {
            return DVec3::ZERO;
        };
        let JointState::Planar { position, velocity } = motor.target else {
            return DVec3::ZERO;
        };
        let raw = (position - self.cart_offset) * motor.position_gain
            + (velocity - self.cart_velocity) * motor.velocity_gain;
        self.base_orientation * motor.clamp(raw)
    }

    /// Torque of the spherical joint motor, world frame.
    fn pole_motor_torque(&self) -> DVec3 {
        let Some(motor) = self.pole_motor else {
            return DVec3::ZERO;
        };
        let JointState::Spherical {
            orientation,
            angular_velocity,
        } = motor.target
        else {
            return DVec3::ZERO;
        };
        let current = if self.pole_orientation.length_squared() > 0.0 {
            self.pole_orientation.normalize()
        } else {
            DQuat::IDENTITY
        };
        let mut error = orientation * current.inverse();
        if error.w < 0.0 {
            error = -error;
        }
        let raw = error.to_scaled_axis() * motor.position_gain
            + (angular_velocity - self.pole_angular_velocity) * motor.velocity_gain;
        self.base_orientation * motor.clamp(raw)
    }

    /// Advance cart and pole by one tick (semi-implicit Euler).
    pub fn integrate(&mut self, gravity: DVec3, dt: f64) {
        let force = self.cart_force + self.cart_motor_force();
        let local = self.base_orientation.inverse() * force;
        let planar = DVec3::new(local.x, local.y, 0.0);
        let cart_accel_local = planar / self.config.total_mass();

        self.cart_velocity += cart_accel_local * dt;
        self.cart_velocity.z = 0.0;
        self.cart_offset += self.cart_velocity * dt;

        let cart_accel = self.base_orientation * cart_accel_local;
        let lever = self.pole_lever();
        let axis = lever.normalize_or_zero();
        let effective_gravity = (gravity - cart_accel) * self.config.pole_mass;
        let torque = lever.cross(effective_gravity) + self.pole_torque + self.pole_motor_torque();

        // spin about the rod's own axis has no inertia in this model
        let mut alpha = torque / self.config.pole_pivot_inertia();
        alpha -= axis * alpha.dot(axis);

        let omega = self.pole_world_angular_velocity() + alpha * dt;
        self.pole_angular_velocity = self.base_orientation.inverse() * omega;

        if omega != DVec3::ZERO {
            let rotated = (DQuat::from_scaled_axis(omega * dt) * self.pole_world_orientation()).normalize();
            self.pole_orientation = self.base_orientation.inverse() * rotated;
        }
    }

    pub fn clear_forces(&mut self) {
        self.cart_force = DVec3::ZERO;
        self.pole_torque = DVec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GRAVITY: DVec3 = DVec3::new(0.0, 0.0, -9.8);

    #[test]
    fn upright_pole_at_rest_stays_exactly_upright() {
        let mut body = CartPoleBody::new(CartPoleConfig::default());
        for _ in 0..100 {
            body.integrate(GRAVITY, 0.02);
        }
        assert_eq!(body.pole_orientation, DQuat::IDENTITY);
        assert_eq!(body.cart_offset, DVec3::ZERO);
    }

    #[test]
    fn cart_push_tips_pole_backwards() {
        let mut body = CartPoleBody::new(CartPoleConfig::default());
        body.cart_force = DVec3::new(11.0, 0.0, 0.0);
        body.integrate(GRAVITY, 0.02);

        // a = F / (m_cart + m_pole)
        assert_relative_eq!(body.cart_velocity.x, 0.2, epsilon = 1e-12);
        assert!(body.pole_lever().x < 0.0);
        assert!(body.pole_angular_velocity.y < 0.0);
    }

    #[test]
    fn tilted_pole_falls_further() {
        let mut body = CartPoleBody::new(CartPoleConfig::default());
        body.pole_orientation = DQuat::from_rotation_x(0.05);
        let start = body.pole_lever().y.abs();
        for _ in 0..10 {
            body.integrate(GRAVITY, 0.02);
        }
        assert!(body.pole_lever().y.abs() > start);
    }

    #[test]
    fn stiff_motor_holds_pole_upright() {
        let mut body = CartPoleBody::new(CartPoleConfig::default());
        body.pole_orientation = DQuat::from_rotation_y(0.1);
        body.pole_motor = Some(JointMotor {
            position_gain: 50.0,
            velocity_gain: 5.0,
            max_force: DVec3::splat(100.0),
            ..JointMotor::loose_spherical()
        });
        for _ in 0..200 {
            body.integrate(GRAVITY, 0.005);
        }
        assert!(body.pole_orientation.angle_between(DQuat::IDENTITY) < 0.01);
    }

    #[test]
    fn lateral_velocity_changes_stay_in_plane() {
        let mut body = CartPoleBody::new(CartPoleConfig::default());
        body.add_cart_velocity(DVec3::new(1.0, -2.0, 3.0));
        body.translate_cart(DVec3::new(0.5, 0.5, 0.5));
        assert_eq!(body.cart_velocity, DVec3::new(1.0, -2.0, 0.0));
        assert_eq!(body.cart_offset, DVec3::new(0.5, 0.5, 0.0));
    }
}
