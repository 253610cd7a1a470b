//! Common traits defining the seams between navigation components

use std::time::Duration;

use crate::common::error::NavResult;
use crate::common::types::*;
use crate::mapping::{Voxel, VoxelGrid};

/// Read-only view of voxel occupancy
///
/// Lookups through this trait never refresh recency, so a planner may scan
/// a view without perturbing the eviction order of the live store.
pub trait OccupancyView {
    /// Whether the voxel is believed to be obstructed
    fn is_occupied(&self, voxel: &Voxel) -> bool;

    /// Grid used to quantize points for this view
    fn grid(&self) -> &VoxelGrid;

    /// The 26 neighbours of `voxel` that are not occupied
    fn empty_neighbors(&self, voxel: &Voxel) -> Vec<Voxel> {
        voxel
            .neighbors26()
            .into_iter()
            .filter(|v| !self.is_occupied(v))
            .collect()
    }
}

/// Trait for 3D path planning algorithms over an occupancy view
pub trait PathPlanner3D {
    /// Plan a waypoint list from start to goal
    fn plan(&self, start: Point3D, goal: Point3D, map: &dyn OccupancyView) -> NavResult<Vec<Point3D>>;
}

/// Capability object for everything the core needs from the vehicle
///
/// Connection, arming and disarming belong to the mission layer; the
/// navigation core only reads pose/sensors and issues commands.
pub trait VehicleInterface {
    /// Current pose
    fn pose(&mut self) -> NavResult<Pose3D>;

    /// Range returns gathered since the last call
    fn sensor_points(&mut self) -> NavResult<Vec<Point3D>>;

    /// Issue a velocity command valid for `duration` and wait for it to be
    /// accepted (or time out) before returning.
    fn send_velocity(&mut self, command: VelocityCommand, duration: Duration) -> NavResult<()>;

    /// Coarse rotate-in-place to an absolute yaw [rad]
    fn rotate_to_yaw(&mut self, yaw: f64, timeout: Duration) -> NavResult<()>;

    /// Wait for the remainder of a control period
    fn sleep(&mut self, duration: Duration);
}
