//! Impulse-based collision response shared by every contact pair

use glam::DVec3;

use super::Contact;
use crate::cartpole::CartPoleBody;
use crate::simulation::BlockBody;

/// Fraction of the penetration removed per tick between two moving bodies.
const POSITION_CORRECTION: f64 = 0.8;
/// Penetration below this is left alone.
const PENETRATION_SLOP: f64 = 0.001;
/// Closing speeds below this do not bounce.
const RESTITUTION_SLOP: f64 = 0.01;

/// Trait for bodies that can respond to collisions
pub trait CollisionResponder {
    /// Current linear velocity, world frame
    fn velocity(&self) -> DVec3;

    /// Mass taking part in the contact
    fn mass(&self) -> f64;

    /// Apply impulse to change velocity
    fn apply_impulse(&mut self, impulse: DVec3);

    /// Apply position correction
    fn apply_correction(&mut self, correction: DVec3);
}

impl CollisionResponder for BlockBody {
    fn velocity(&self) -> DVec3 {
        self.vel
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn apply_impulse(&mut self, impulse: DVec3) {
        self.vel += impulse / self.mass;
    }

    fn apply_correction(&mut self, correction: DVec3) {
        self.pos += correction;
    }
}

// The cart only moves in its plane, so impulses lose their normal-to-plane part.
impl CollisionResponder for CartPoleBody {
    fn velocity(&self) -> DVec3 {
        self.cart_world_velocity()
    }

    fn mass(&self) -> f64 {
        self.config.total_mass()
    }

    fn apply_impulse(&mut self, impulse: DVec3) {
        let mass = self.config.total_mass();
        self.add_cart_velocity(impulse / mass);
    }

    fn apply_correction(&mut self, correction: DVec3) {
        self.translate_cart(correction);
    }
}

/// Resolve a contact between two moving bodies. The normal points from `a` to `b`.
pub(crate) fn resolve_pair<A, B>(a: &mut A, b: &mut B, contact: &Contact)
where
    A: CollisionResponder + ?Sized,
    B: CollisionResponder + ?Sized,
{
    let inv_a = 1.0 / a.mass();
    let inv_b = 1.0 / b.mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    if contact.depth > PENETRATION_SLOP {
        let correction = contact.normal * contact.depth * POSITION_CORRECTION / inv_sum;
        a.apply_correction(-correction * inv_a);
        b.apply_correction(correction * inv_b);
    }

    let relative = b.velocity() - a.velocity();
    let closing = relative.dot(contact.normal);
    if closing >= 0.0 {
        return;
    }

    let restitution = if closing.abs() > RESTITUTION_SLOP {
        contact.restitution
    } else {
        0.0
    };
    let normal_impulse = -(1.0 + restitution) * closing / inv_sum;
    let impulse = contact.normal * normal_impulse;
    a.apply_impulse(-impulse);
    b.apply_impulse(impulse);

    // Coulomb friction on the tangential slip, never reversing it
    let tangent = relative - contact.normal * closing;
    let slip = tangent.length();
    if contact.friction <= 0.0 || slip < 1e-6 {
        return;
    }
    let direction = tangent / slip;
    let friction = (contact.friction * normal_impulse).min(slip / inv_sum);
    a.apply_impulse(direction * friction);
    b.apply_impulse(-direction * friction);
}

/// Resolve a contact against an immovable surface. The normal points away
/// from the surface, towards the body. Penetration is removed completely.
pub(crate) fn resolve_static<D>(body: &mut D, contact: &Contact)
where
    D: CollisionResponder + ?Sized,
{
    if contact.depth > 0.0 {
        body.apply_correction(contact.normal * contact.depth);
    }

    let velocity = body.velocity();
    let closing = velocity.dot(contact.normal);
    if closing >= 0.0 {
        return;
    }

    let restitution = if closing.abs() > RESTITUTION_SLOP {
        contact.restitution
    } else {
        0.0
    };
    let normal_impulse = -(1.0 + restitution) * closing * body.mass();
    body.apply_impulse(contact.normal * normal_impulse);

    let tangent = velocity - contact.normal * closing;
    let slip = tangent.length();
    if contact.friction <= 0.0 || slip < 1e-6 {
        return;
    }
    let friction = (contact.friction * normal_impulse).min(slip * body.mass());
    body.apply_impulse(-tangent / slip * friction);
}
