//! # Physics Integration
//!
//! Numerical integration of bodies over one tick: semi-implicit Euler,
//! velocity first, then position.

use glam::DVec3;

use crate::simulation::{BlockBody, Body};

/// Integrate every ground-cart articulation.
pub(crate) fn integrate_cartpoles<'a>(bodies: impl Iterator<Item = &'a mut Body>, gravity: DVec3, dt: f64) {
    for body in bodies {
        if let Body::CartPole(cart) = body {
            cart.integrate(gravity, dt);
        }
    }
}

/// Integrate every free block under gravity and its accumulated force.
pub(crate) fn integrate_blocks<'a>(bodies: impl Iterator<Item = &'a mut Body>, gravity: DVec3, dt: f64) {
    for body in bodies {
        if let Body::Block(block) = body {
            integrate_block(block, gravity, dt);
        }
    }
}

fn integrate_block(block: &mut BlockBody, gravity: DVec3, dt: f64) {
    let acceleration = gravity + block.force / block.mass;
    block.vel += acceleration * dt;
    block.pos += block.vel * dt;
}
