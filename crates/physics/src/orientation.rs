//! Quaternion and Euler-angle conversions.
//!
//! Angles are in degrees and follow the roll (x), pitch (y), yaw (z)
//! convention: a quaternion is `yaw * pitch * roll` applied right to left.

use glam::DQuat;

/// Convert a quaternion to `(roll, pitch, yaw)` in degrees.
///
/// The arcsine argument for pitch is clamped to `[-1, 1]`; floating-point
/// overshoot near gimbal lock is not an error.
#[must_use]
pub fn quaternion_to_euler(x: f64, y: f64, z: f64, w: f64) -> (f64, f64, f64) {
    let ysqr = y * y;

    let t0 = 2.0 * (w * x + y * z);
    let t1 = 1.0 - 2.0 * (x * x + ysqr);
    let roll = t0.atan2(t1).to_degrees();

    let t2 = clamp_unit(2.0 * (w * y - z * x));
    let pitch = t2.asin().to_degrees();

    let t3 = 2.0 * (w * z + x * y);
    let t4 = 1.0 - 2.0 * (ysqr + z * z);
    let yaw = t3.atan2(t4).to_degrees();

    (roll, pitch, yaw)
}

/// Inverse of [`quaternion_to_euler`]. Takes degrees, returns `(x, y, z, w)`.
#[must_use]
pub fn euler_to_quaternion(yaw: f64, pitch: f64, roll: f64) -> (f64, f64, f64, f64) {
    let (sy, cy) = (yaw.to_radians() * 0.5).sin_cos();
    let (sp, cp) = (pitch.to_radians() * 0.5).sin_cos();
    let (sr, cr) = (roll.to_radians() * 0.5).sin_cos();

    let x = sr * cp * cy - cr * sp * sy;
    let y = cr * sp * cy + sr * cp * sy;
    let z = cr * cp * sy - sr * sp * cy;
    let w = cr * cp * cy + sr * sp * sy;
    (x, y, z, w)
}

/// [`quaternion_to_euler`] for a glam quaternion.
#[must_use]
pub fn to_euler(q: DQuat) -> (f64, f64, f64) {
    quaternion_to_euler(q.x, q.y, q.z, q.w)
}

/// [`euler_to_quaternion`] returning a glam quaternion.
#[must_use]
pub fn from_euler(yaw: f64, pitch: f64, roll: f64) -> DQuat {
    let (x, y, z, w) = euler_to_quaternion(yaw, pitch, roll);
    DQuat::from_xyzw(x, y, z, w)
}

/// Heading of a link about the vertical axis, in radians.
#[must_use]
pub fn heading(q: DQuat) -> f64 {
    to_euler(q).2.to_radians()
}

fn clamp_unit(value: f64) -> f64 {
    if (-1.0..=1.0).contains(&value) {
        value
    } else {
        tracing::debug!(value, "arcsine argument outside [-1, 1], clamping");
        value.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn same_rotation(a: DQuat, b: DQuat) -> bool {
        // q and -q are the same rotation
        a.dot(b).abs() > 1.0 - 1e-12
    }

    #[test]
    fn identity_has_zero_angles() {
        let (roll, pitch, yaw) = quaternion_to_euler(0.0, 0.0, 0.0, 1.0);
        assert_eq!((roll, pitch, yaw), (0.0, 0.0, 0.0));
    }

    #[test]
    fn single_axis_rotations() {
        let q = DQuat::from_rotation_x(20f64.to_radians());
        let (roll, pitch, yaw) = to_euler(q);
        assert_relative_eq!(roll, 20.0, epsilon = 1e-9);
        assert_relative_eq!(pitch, 0.0, epsilon = 1e-9);
        assert_relative_eq!(yaw, 0.0, epsilon = 1e-9);

        let q = DQuat::from_rotation_y(-7.5f64.to_radians());
        assert_relative_eq!(to_euler(q).1, -7.5, epsilon = 1e-9);

        let q = DQuat::from_rotation_z(135f64.to_radians());
        assert_relative_eq!(to_euler(q).2, 135.0, epsilon = 1e-9);
        assert_relative_eq!(heading(q), 135f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn euler_round_trip() {
        let samples = [
            (0.0, 0.0, 0.0),
            (10.0, -20.0, 30.0),
            (-170.0, 45.0, 5.0),
            (90.0, 80.0, -120.0),
            (33.3, -1.0e-6, 179.0),
        ];
        for (yaw, pitch, roll) in samples {
            let q = from_euler(yaw, pitch, roll);
            assert_relative_eq!(q.length(), 1.0, epsilon = 1e-12);
            let (r, p, y) = to_euler(q);
            let back = from_euler(y, p, r);
            assert!(same_rotation(q, back), "{q:?} vs {back:?}");
        }
    }

    #[test]
    fn matches_glam_composition_order() {
        let (yaw, pitch, roll) = (25.0f64, -12.0f64, 7.0f64);
        let expected = DQuat::from_rotation_z(yaw.to_radians())
            * DQuat::from_rotation_y(pitch.to_radians())
            * DQuat::from_rotation_x(roll.to_radians());
        assert!(same_rotation(from_euler(yaw, pitch, roll), expected));
    }

    #[test]
    fn pitch_overshoot_is_clamped() {
        // 2(wy - zx) slightly above one
        let s = std::f64::consts::FRAC_1_SQRT_2 + 1e-9;
        let (_, pitch, _) = quaternion_to_euler(0.0, s, 0.0, s);
        assert!(pitch.is_finite());
        assert_relative_eq!(pitch, 90.0, epsilon = 1e-9);
    }
}
