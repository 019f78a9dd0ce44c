//! Block-cart collision detection
//!
//! The block is its inscribed sphere, the cart a box aligned with the ground
//! base. The pole does not collide.

use glam::DVec3;

use super::Contact;
use crate::cartpole::CartPoleBody;
use crate::simulation::BlockBody;

/// Detect collision between the cart and a block.
///
/// The contact normal points from the cart to the block.
#[must_use]
pub fn detect_block_cart_collision(cart: &CartPoleBody, block: &BlockBody) -> Option<Contact> {
    let to_local = cart.base_orientation.inverse();
    let center = cart.cart_position();
    let half = cart.config.cart_half_extents;
    let local = to_local * (block.pos - center);

    let closest = local.clamp(-half, half);
    let delta = local - closest;
    let distance_squared = delta.length_squared();
    let radius = block.half_extent;
    if distance_squared >= radius * radius {
        return None;
    }

    let distance = distance_squared.sqrt();
    let (local_normal, depth) = if distance > 1e-4 {
        (delta / distance, radius - distance)
    } else {
        let normal = closest_face_normal(local, half);
        let face_gap = (half - local.abs()).dot(normal.abs());
        (normal, radius + face_gap)
    };

    let normal = cart.base_orientation * local_normal;
    let point = block.pos - normal * radius;
    Some(Contact::new(point, normal, depth, &cart.cart_material, &block.material))
}

/// Normal of the box face closest to a point inside the box.
fn closest_face_normal(local: DVec3, half: DVec3) -> DVec3 {
    let gap = half - local.abs();
    if gap.x < gap.y && gap.x < gap.z {
        DVec3::new(sign(local.x), 0.0, 0.0)
    } else if gap.y < gap.z {
        DVec3::new(0.0, sign(local.y), 0.0)
    } else {
        DVec3::new(0.0, 0.0, sign(local.z))
    }
}

fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}
