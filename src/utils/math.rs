use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Convert radians to degrees
#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Quaternion derivative from body angular rates: q̇ = ½ · q ⊗ (0, p, q, r)
pub fn quaternion_derivative(q: &UnitQuaternion<f64>, omega: &Vector3<f64>) -> Quaternion<f64> {
    let omega_quat = Quaternion::new(0.0, omega.x, omega.y, omega.z);
    q.into_inner() * omega_quat * 0.5
}

/// Renormalize a raw quaternion into a unit quaternion, falling back to
/// identity when the norm degenerates.
pub fn renormalize(q: &Quaternion<f64>) -> UnitQuaternion<f64> {
    let norm = q.norm();
    if norm.is_finite() && norm > 1e-12 {
        UnitQuaternion::from_quaternion(*q)
    } else {
        UnitQuaternion::identity()
    }
}

/// Extract ZYX Euler angles (roll, pitch, yaw) with the pitch term clamped
/// at the ±π/2 singularity.
pub fn euler_from_quaternion(q: &UnitQuaternion<f64>) -> (f64, f64, f64) {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);

    let sinr_cosp = 2.0 * (w * x + y * z);
    let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
    let roll = sinr_cosp.atan2(cosr_cosp);

    let sinp = 2.0 * (w * y - z * x);
    let pitch = if sinp.abs() >= 1.0 {
        FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };

    let siny_cosp = 2.0 * (w * z + x * y);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    let yaw = siny_cosp.atan2(cosy_cosp);

    (roll, pitch, yaw)
}

/// Build the orientation quaternion from a roll/pitch/yaw triple (ZYX
/// composition with half-angle formulas).
pub fn quaternion_from_euler(roll: f64, pitch: f64, yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(roll, pitch, yaw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_euler_round_trip() {
        let cases = [
            (0.0, 0.0, 0.0),
            (0.3, -0.2, 1.1),
            (-1.0, 1.55, -2.5),
            (2.9, -1.55, 0.4),
        ];
        for (roll, pitch, yaw) in cases {
            let q = quaternion_from_euler(roll, pitch, yaw);
            let (r, p, y) = euler_from_quaternion(&q);
            assert_relative_eq!(r, roll, epsilon = 1e-3);
            assert_relative_eq!(p, pitch, epsilon = 1e-3);
            assert_relative_eq!(y, yaw, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_pitch_singularity_clamped() {
        let q = quaternion_from_euler(0.0, FRAC_PI_2, 0.0);
        let (_, pitch, _) = euler_from_quaternion(&q);
        assert!(pitch.abs() <= FRAC_PI_2 + 1e-12);
    }

    #[test]
    fn test_quaternion_derivative_pure_roll() {
        let q = UnitQuaternion::identity();
        let omega = Vector3::new(0.2, 0.0, 0.0);
        let dq = quaternion_derivative(&q, &omega);
        assert_relative_eq!(dq.w, 0.0, epsilon = 1e-12);
        assert_relative_eq!(dq.i, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_renormalize_degenerate() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        let unit = renormalize(&q);
        assert_relative_eq!(unit.norm(), 1.0, epsilon = 1e-12);
    }
}
