//! Field-of-view visibility predicate and heading helpers
//!
//! A target is visible when it lies inside a cone of fixed half-angle around
//! the observer's forward (body +x) axis. Only the cone is tested; nothing
//! is ray-traced for occlusion.

use std::f64::consts::PI;

use nalgebra::{UnitQuaternion, Vector3};

use crate::common::Point3D;

/// Camera half-angle field of view [rad]
pub const CAMERA_FOV: f64 = PI / 8.0;

/// Targets closer than this to the observer are always visible [m]
pub const VISIBILITY_EPSILON: f64 = 0.05;

/// Whether `point` falls inside the observer's view cone
pub fn is_visible(
    point: &Point3D,
    position: &Point3D,
    orientation: &UnitQuaternion<f64>,
    half_angle: f64,
) -> bool {
    let to_point = position.vector_to(point);
    let distance = to_point.norm();
    if distance < VISIBILITY_EPSILON {
        return true;
    }

    let forward = orientation * Vector3::x();
    let cos_angle = (forward.dot(&to_point) / distance).clamp(-1.0, 1.0);
    cos_angle.acos() <= half_angle
}

/// Horizontal bearing from `position` to `target` [rad]
pub fn yaw_towards(target: &Point3D, position: &Point3D) -> f64 {
    (target.y - position.y).atan2(target.x - position.x)
}

/// Level orientation at `position` facing `target` by yaw only
pub fn orientation_facing(target: &Point3D, position: &Point3D) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_towards(target, position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_point_ahead_is_visible() {
        let q = UnitQuaternion::identity();
        let origin = Point3D::origin();
        assert!(is_visible(&Point3D::new(10.0, 0.0, 0.0), &origin, &q, CAMERA_FOV));
        assert!(is_visible(&Point3D::new(10.0, 3.0, 0.0), &origin, &q, CAMERA_FOV));
    }

    #[test]
    fn test_point_outside_cone_is_hidden() {
        let q = UnitQuaternion::identity();
        let origin = Point3D::origin();
        assert!(!is_visible(&Point3D::new(10.0, 5.0, 0.0), &origin, &q, CAMERA_FOV));
        assert!(!is_visible(&Point3D::new(-10.0, 0.0, 0.0), &origin, &q, CAMERA_FOV));
        assert!(!is_visible(&Point3D::new(0.0, 0.0, 3.0), &origin, &q, CAMERA_FOV));
    }

    #[test]
    fn test_coincident_point_is_visible() {
        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, 2.0);
        let p = Point3D::new(1.0, 1.0, 1.0);
        assert!(is_visible(&Point3D::new(1.01, 1.0, 1.0), &p, &q, 0.0));
    }

    #[test]
    fn test_rotated_observer() {
        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2);
        let origin = Point3D::origin();
        assert!(is_visible(&Point3D::new(0.0, 5.0, 0.0), &origin, &q, CAMERA_FOV));
        assert!(!is_visible(&Point3D::new(5.0, 0.0, 0.0), &origin, &q, CAMERA_FOV));
    }

    #[test]
    fn test_facing_orientation_sees_level_target() {
        let position = Point3D::new(2.0, -3.0, 1.0);
        let target = Point3D::new(-7.0, 4.0, 1.0);
        let q = orientation_facing(&target, &position);
        assert!(is_visible(&target, &position, &q, 1e-6));
    }

    #[test]
    fn test_facing_orientation_limits_elevation() {
        let position = Point3D::origin();
        // 45 degrees above the horizon is outside a 22.5 degree cone
        let target = Point3D::new(5.0, 0.0, 5.0);
        let q = orientation_facing(&target, &position);
        assert!(!is_visible(&target, &position, &q, CAMERA_FOV));
    }

    #[test]
    fn test_yaw_towards() {
        let yaw = yaw_towards(&Point3D::new(0.0, 2.0, 0.0), &Point3D::origin());
        assert_relative_eq!(yaw, FRAC_PI_2, epsilon = 1e-12);
    }
}
