//! Block-block collision detection

use glam::DVec3;

use super::Contact;
use crate::simulation::BlockBody;

/// Detect collision between two blocks, each treated as its inscribed sphere.
///
/// The contact normal points from `a` to `b`.
#[must_use]
pub fn detect_block_block_collision(a: &BlockBody, b: &BlockBody) -> Option<Contact> {
    let delta = b.pos - a.pos;
    let distance_squared = delta.length_squared();
    let min_distance = a.half_extent + b.half_extent;

    if distance_squared >= min_distance * min_distance {
        return None;
    }

    let distance = distance_squared.sqrt();
    let normal = if distance > 1e-4 { delta / distance } else { DVec3::Z };
    let depth = min_distance - distance;
    let point = a.pos + normal * a.half_extent;

    Some(Contact::new(point, normal, depth, &a.material, &b.material))
}
