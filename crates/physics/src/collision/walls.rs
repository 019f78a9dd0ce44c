//! Containment inside the wall box
//!
//! Each face of the box is a plane facing inwards. Blocks touch all six
//! faces; the cart rides on the ground so only the four side faces apply.

use glam::DVec3;

use super::response::{resolve_static, CollisionResponder};
use super::Contact;
use crate::cartpole::CartPoleBody;
use crate::simulation::{BlockBody, WallBody};
use crate::types::Material;

/// Push a block back inside the walls and bounce it off every face it crossed.
pub fn contain_block(block: &mut BlockBody, wall: &WallBody) {
    let half = DVec3::splat(block.half_extent);
    let material = block.material;
    contain(block, half, [true, true, true], &material, wall);
}

/// Keep the cart inside the side walls.
pub fn contain_cart(cart: &mut CartPoleBody, wall: &WallBody) {
    let half = cart.config.cart_half_extents;
    let material = cart.cart_material;
    contain(cart, half, [true, true, false], &material, wall);
}

fn contain<B: CollisionResponder + Positioned>(
    body: &mut B,
    half: DVec3,
    axes: [bool; 3],
    material: &Material,
    wall: &WallBody,
) {
    for (axis, enabled) in axes.into_iter().enumerate() {
        if !enabled {
            continue;
        }
        let unit = DVec3::AXES[axis];
        let center = body.center()[axis];

        let low_gap = wall.bounds.min[axis] - (center - half[axis]);
        if low_gap > 0.0 {
            let point = body.center() - unit * half[axis];
            let contact = Contact::new(point, unit, low_gap, &wall.material, material);
            resolve_static(body, &contact);
            continue;
        }

        let high_gap = (center + half[axis]) - wall.bounds.max[axis];
        if high_gap > 0.0 {
            let point = body.center() + unit * half[axis];
            let contact = Contact::new(point, -unit, high_gap, &wall.material, material);
            resolve_static(body, &contact);
        }
    }
}

/// Bodies with a single reference point for containment.
trait Positioned {
    fn center(&self) -> DVec3;
}

impl Positioned for BlockBody {
    fn center(&self) -> DVec3 {
        self.pos
    }
}

impl Positioned for CartPoleBody {
    fn center(&self) -> DVec3 {
        self.cart_position()
    }
}
