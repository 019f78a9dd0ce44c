//! # Collision Detection and Response
//!
//! Contacts between blocks, between blocks and the cart, and between moving
//! bodies and the wall box. Response is impulse based. Blocks collide as
//! their inscribed sphere; the cart is an axis-aligned box.

mod block_block;
mod block_cart;
mod response;
mod walls;

pub use block_block::detect_block_block_collision;
pub use block_cart::detect_block_cart_collision;
pub use walls::{contain_block, contain_cart};

use crate::simulation::{Body, WallBody};
use crate::types::Material;
use glam::DVec3;

/// Contact information for collision response
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Contact point in world space
    pub point: DVec3,
    /// Contact normal (from body A to body B)
    pub normal: DVec3,
    /// Penetration depth
    pub depth: f64,
    /// Combined friction coefficient
    pub friction: f64,
    /// Combined restitution coefficient
    pub restitution: f64,
}

impl Contact {
    /// Create a new contact with material properties
    #[must_use]
    pub fn new(point: DVec3, normal: DVec3, depth: f64, mat_a: &Material, mat_b: &Material) -> Self {
        Self {
            point,
            normal,
            depth,
            friction: combine_friction(mat_a.friction, mat_b.friction),
            restitution: combine_restitution(mat_a.restitution, mat_b.restitution),
        }
    }
}

/// Combine friction coefficients using geometric mean
fn combine_friction(f1: f64, f2: f64) -> f64 {
    (f1 * f2).sqrt()
}

/// Combine restitution coefficients using geometric mean
fn combine_restitution(r1: f64, r2: f64) -> f64 {
    (r1 * r2).sqrt()
}

/// Detect and resolve every contact in the world for one tick.
pub(crate) fn resolve_contacts(slots: &mut [Option<Body>]) {
    let mut walls: Vec<WallBody> = Vec::new();
    let mut blocks = Vec::new();
    let mut carts = Vec::new();
    for (index, slot) in slots.iter().enumerate() {
        match slot {
            Some(Body::Walls(w)) => walls.push(w.clone()),
            Some(Body::Block(_)) => blocks.push(index),
            Some(Body::CartPole(_)) => carts.push(index),
            None => {}
        }
    }

    for (n, &i) in blocks.iter().enumerate() {
        for &j in &blocks[n + 1..] {
            if let Some((Body::Block(a), Body::Block(b))) = pair_mut(slots, i, j) {
                if let Some(contact) = detect_block_block_collision(a, b) {
                    tracing::trace!(point = ?contact.point, depth = contact.depth, "block-block contact");
                    response::resolve_pair(a, b, &contact);
                }
            }
        }
    }

    for &c in &carts {
        for &i in &blocks {
            if let Some((Body::CartPole(cart), Body::Block(block))) = pair_mut(slots, c, i) {
                if let Some(contact) = detect_block_cart_collision(cart, block) {
                    tracing::trace!(point = ?contact.point, depth = contact.depth, "block-cart contact");
                    response::resolve_pair(cart.as_mut(), block, &contact);
                }
            }
        }
    }

    for body in slots.iter_mut().flatten() {
        for wall in &walls {
            match body {
                Body::Block(block) => contain_block(block, wall),
                Body::CartPole(cart) => contain_cart(cart, wall),
                Body::Walls(_) => {}
            }
        }
    }
}

/// Two distinct slots borrowed mutably, in the order asked for.
fn pair_mut(slots: &mut [Option<Body>], i: usize, j: usize) -> Option<(&mut Body, &mut Body)> {
    if i == j {
        return None;
    }
    let (lo, hi) = (i.min(j), i.max(j));
    let (head, tail) = slots.split_at_mut(hi);
    let a = head.get_mut(lo)?.as_mut()?;
    let b = tail.first_mut()?.as_mut()?;
    Some(if i < j { (a, b) } else { (b, a) })
}
