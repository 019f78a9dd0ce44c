//! # World State
//!
//! Immutable snapshots of the cart, pole, blocks and walls. A snapshot is a
//! plain value: it never aliases engine internals and stays valid after the
//! world moves on or is closed.

use glam::{DQuat, DVec3};
use physics::{orientation, BodyId};

/// Decimal places every extracted scalar is rounded to.
pub const STATE_PRECISION: usize = 16;
/// Decimal places of [`WorldState::diff`].
pub const DIFF_PRECISION: usize = 6;

/// Round to `places` decimal digits. Non-finite values pass through.
#[must_use]
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.places$}").parse().unwrap_or(value)
}

#[must_use]
pub(crate) fn round16(value: f64) -> f64 {
    round_to(value, STATE_PRECISION)
}

pub(crate) fn round_vec(v: DVec3) -> DVec3 {
    DVec3::new(round16(v.x), round16(v.y), round16(v.z))
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CartState {
    pub position: DVec3,
    /// `z` is always 0: the cart does not leave the ground plane.
    pub velocity: DVec3,
}

/// How the pole orientation is reported.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PoleOrientation {
    /// Joint quaternion as stored by the engine, not renormalized.
    Quaternion(DQuat),
    /// `(roll, pitch, yaw)` in degrees.
    Euler(DVec3),
}

impl PoleOrientation {
    /// `(roll, pitch, yaw)` in degrees.
    #[must_use]
    pub fn euler_degrees(&self) -> (f64, f64, f64) {
        match *self {
            PoleOrientation::Quaternion(q) => orientation::to_euler(q),
            PoleOrientation::Euler(e) => (e.x, e.y, e.z),
        }
    }

    /// Quaternion form; Euler angles are converted back.
    #[must_use]
    pub fn quaternion(&self) -> DQuat {
        match *self {
            PoleOrientation::Quaternion(q) => q,
            PoleOrientation::Euler(e) => orientation::from_euler(e.z, e.y, e.x),
        }
    }

    fn components(&self) -> Vec<f64> {
        match *self {
            PoleOrientation::Quaternion(q) => vec![q.x, q.y, q.z, q.w],
            PoleOrientation::Euler(e) => vec![e.x, e.y, e.z],
        }
    }

    fn same_kind(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (PoleOrientation::Quaternion(_), PoleOrientation::Quaternion(_))
                | (PoleOrientation::Euler(_), PoleOrientation::Euler(_))
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PoleState {
    pub orientation: PoleOrientation,
    pub angular_velocity: DVec3,
}

impl PoleState {
    /// Absolute roll and pitch in degrees, the two angles that end an episode.
    #[must_use]
    pub fn tilt(&self) -> (f64, f64) {
        let (roll, pitch, _) = self.orientation.euler_degrees();
        (roll.abs(), pitch.abs())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockState {
    /// Engine handle of the block, when known.
    pub id: Option<BodyId>,
    pub position: DVec3,
    pub velocity: DVec3,
}

/// One snapshot of the whole world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldState {
    pub cart: CartState,
    pub pole: PoleState,
    pub blocks: Vec<BlockState>,
    /// The eight wall corners; only on the snapshot taken right after a reset.
    pub walls: Option<[DVec3; 8]>,
}

/// Field-wise difference between two snapshots, see [`WorldState::diff`].
#[derive(Clone, Debug, PartialEq)]
pub struct StateDiff {
    /// Position then velocity, `x, y, z` each.
    pub cart: [f64; 6],
    /// Orientation components then angular velocity. Orientation is left
    /// out when the two snapshots report it in different forms.
    pub pole: Vec<f64>,
}

impl WorldState {
    /// `self - other` for the cart and pole, rounded to 6 decimals.
    #[must_use]
    pub fn diff(&self, other: &WorldState) -> StateDiff {
        let d = |a: f64, b: f64| round_to(a - b, DIFF_PRECISION);

        let (p, q) = (self.cart.position, other.cart.position);
        let (v, w) = (self.cart.velocity, other.cart.velocity);
        let cart = [d(p.x, q.x), d(p.y, q.y), d(p.z, q.z), d(v.x, w.x), d(v.y, w.y), d(v.z, w.z)];

        let mut pole = Vec::with_capacity(7);
        if self.pole.orientation.same_kind(&other.pole.orientation) {
            let mine = self.pole.orientation.components();
            let theirs = other.pole.orientation.components();
            pole.extend(mine.iter().zip(&theirs).map(|(a, b)| d(*a, *b)));
        }
        let (a, b) = (self.pole.angular_velocity, other.pole.angular_velocity);
        pole.extend([d(a.x, b.x), d(a.y, b.y), d(a.z, b.z)]);

        StateDiff { cart, pole }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upright() -> WorldState {
        WorldState {
            cart: CartState {
                position: DVec3::ZERO,
                velocity: DVec3::ZERO,
            },
            pole: PoleState {
                orientation: PoleOrientation::Quaternion(DQuat::IDENTITY),
                angular_velocity: DVec3::ZERO,
            },
            blocks: Vec::new(),
            walls: None,
        }
    }

    #[test]
    fn rounding_keeps_short_decimals() {
        assert_eq!(round_to(0.004, 16), 0.004);
        assert_eq!(round_to(-2.5, 16), -2.5);
        assert_eq!(round_to(0.123_456_789, 6), 0.123_457);
        assert!(round_to(f64::NAN, 16).is_nan());
        assert_eq!(round_to(f64::INFINITY, 6), f64::INFINITY);
    }

    #[test]
    fn rounding_is_idempotent() {
        for value in [0.1 + 0.2, 1.0 / 3.0, -7.123_456_789_012_345_6, 1e-17] {
            let once = round16(value);
            assert_eq!(round16(once), once);
        }
    }

    #[test]
    fn diff_rounds_to_six_places() {
        let a = upright();
        let mut b = upright();
        b.cart.position.x = 0.000_000_4;
        b.cart.velocity.y = -0.25;
        b.pole.angular_velocity.x = 0.123_456_789;

        let diff = b.diff(&a);
        assert_eq!(diff.cart, [0.0, 0.0, 0.0, 0.0, -0.25, 0.0]);
        assert_eq!(diff.pole, vec![0.0, 0.0, 0.0, 0.0, 0.123_457, 0.0, 0.0]);
    }

    #[test]
    fn diff_skips_orientation_of_mixed_forms() {
        let a = upright();
        let mut b = upright();
        b.pole.orientation = PoleOrientation::Euler(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.diff(&a).pole.len(), 3);
    }

    #[test]
    fn tilt_reads_both_forms() {
        let mut state = upright();
        state.pole.orientation = PoleOrientation::Euler(DVec3::new(-4.0, 6.0, 90.0));
        assert_eq!(state.pole.tilt(), (4.0, 6.0));
        assert_eq!(upright().pole.tilt(), (0.0, 0.0));
    }
}
