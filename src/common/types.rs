//! Common types used throughout rust_drone_nav

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// 3D point representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn distance(&self, other: &Point3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Displacement vector from `self` to `other`
    pub fn vector_to(&self, other: &Point3D) -> Vector3<f64> {
        other.to_vector() - self.to_vector()
    }

    /// Point offset from `self` by `v`
    pub fn offset(&self, v: &Vector3<f64>) -> Point3D {
        Point3D::new(self.x + v[0], self.y + v[1], self.z + v[2])
    }

    /// Linear interpolation, `s = 0` gives `self`, `s = 1` gives `other`
    pub fn lerp(&self, other: &Point3D, s: f64) -> Point3D {
        Point3D::new(
            self.x + s * (other.x - self.x),
            self.y + s * (other.y - self.y),
            self.z + s * (other.z - self.z),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<(f64, f64, f64)> for Point3D {
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1, z: tuple.2 }
    }
}

impl From<[f64; 3]> for Point3D {
    fn from(a: [f64; 3]) -> Self {
        Self { x: a[0], y: a[1], z: a[2] }
    }
}

impl From<Vector3<f64>> for Point3D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], z: v[2] }
    }
}

/// Vehicle pose: position plus body orientation (body +x is forward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose3D {
    pub position: Point3D,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose3D {
    pub fn new(position: Point3D, orientation: UnitQuaternion<f64>) -> Self {
        Self { position, orientation }
    }

    /// Level pose with the given heading
    pub fn from_yaw(position: Point3D, yaw: f64) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        }
    }

    pub fn origin() -> Self {
        Self::from_yaw(Point3D::origin(), 0.0)
    }

    /// Heading about the world z axis [rad]
    pub fn yaw(&self) -> f64 {
        self.orientation.euler_angles().2
    }

    /// Unit forward axis in the world frame
    pub fn forward(&self) -> Vector3<f64> {
        self.orientation * Vector3::x()
    }
}

/// Linear velocity plus absolute yaw target sent to the flight controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    pub velocity: Vector3<f64>,
    /// Absolute yaw [rad]
    pub yaw: f64,
}

impl VelocityCommand {
    pub fn new(velocity: Vector3<f64>, yaw: f64) -> Self {
        Self { velocity, yaw }
    }

    /// Zero velocity holding the given yaw
    pub fn hover(yaw: f64) -> Self {
        Self { velocity: Vector3::zeros(), yaw }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

/// Total length of a polyline
pub fn polyline_length(points: &[Point3D]) -> f64 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}
