//! Endpoint validation and random target generation for exploration legs

use log::debug;
use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;

use crate::common::{NavError, NavResult, OccupancyView, Point3D, Pose3D};
use crate::path_planning::is_visible;

/// Accept `endpoint` only if it is unoccupied and inside the camera cone of
/// `pose`.
pub fn is_valid_endpoint(
    endpoint: &Point3D,
    map: &dyn OccupancyView,
    pose: &Pose3D,
    half_angle: f64,
) -> NavResult<()> {
    if !endpoint.is_finite() {
        return Err(NavError::InvalidEndpoint(format!("non-finite endpoint {:?}", endpoint)));
    }
    let voxel = map.grid().quantize(endpoint);
    if map.is_occupied(&voxel) {
        return Err(NavError::InvalidEndpoint(format!("endpoint voxel {:?} is occupied", voxel)));
    }
    if !is_visible(endpoint, &pose.position, &pose.orientation, half_angle) {
        return Err(NavError::InvalidEndpoint(format!(
            "endpoint {:?} is outside the field of view",
            endpoint
        )));
    }
    Ok(())
}

/// Draw a random valid endpoint ahead of the vehicle.
///
/// Candidates are drawn in the body's heading frame within `radius`, mostly
/// forward and above the vehicle (negative z), and snapped to voxel
/// centres. Gives up with `None` after `attempts` rejected candidates.
pub fn generate_target<R: Rng + ?Sized>(
    map: &dyn OccupancyView,
    pose: &Pose3D,
    radius: f64,
    half_angle: f64,
    attempts: usize,
    rng: &mut R,
) -> Option<Point3D> {
    let grid = map.grid();
    let heading = UnitQuaternion::from_euler_angles(0.0, 0.0, pose.yaw());

    for attempt in 1..=attempts {
        let local = grid.snap(&Point3D::new(
            radius * rng.gen::<f64>(),
            0.1 * radius * rng.gen::<f64>(),
            -radius * rng.gen::<f64>(),
        ));
        let offset: Vector3<f64> = heading * local.to_vector();
        let candidate = grid.snap(&pose.position.offset(&offset));

        if is_valid_endpoint(&candidate, map, pose, half_angle).is_ok() {
            debug!("target {:?} accepted after {} attempts", candidate, attempt);
            return Some(candidate);
        }
    }
    debug!("no valid target after {} attempts", attempts);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FrozenOccupancy, OccupancyStore, VoxelGrid};
    use crate::path_planning::CAMERA_FOV;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_endpoint_ahead_is_valid() {
        let map = FrozenOccupancy::empty(VoxelGrid::new(1.0).unwrap());
        let pose = Pose3D::origin();
        assert!(is_valid_endpoint(&Point3D::new(10.0, 0.0, 0.0), &map, &pose, CAMERA_FOV).is_ok());
    }

    #[test]
    fn test_endpoint_behind_is_rejected() {
        let map = FrozenOccupancy::empty(VoxelGrid::new(1.0).unwrap());
        let pose = Pose3D::origin();
        let result = is_valid_endpoint(&Point3D::new(-10.0, 0.0, 0.0), &map, &pose, CAMERA_FOV);
        assert!(matches!(result, Err(NavError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_occupied_endpoint_is_rejected() {
        let mut store = OccupancyStore::new(1.0, 1000).unwrap();
        store.add_point(&Point3D::new(10.0, 0.0, 0.0));
        let pose = Pose3D::origin();
        let result = is_valid_endpoint(&Point3D::new(10.0, 0.0, 0.0), &store, &pose, CAMERA_FOV);
        assert!(matches!(result, Err(NavError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_generated_targets_are_valid_voxel_centres() {
        let store = OccupancyStore::new(1.0, 1000).unwrap();
        let pose = Pose3D::from_yaw(Point3D::new(3.0, -2.0, -5.0), 0.7);
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..20 {
            let target = generate_target(&store, &pose, 10.0, CAMERA_FOV, 5000, &mut rng).unwrap();
            assert!(is_valid_endpoint(&target, &store, &pose, CAMERA_FOV).is_ok());
            assert_eq!(store.grid().snap(&target), target);
        }
    }

    #[test]
    fn test_generation_gives_up() {
        let map = FrozenOccupancy::empty(VoxelGrid::new(1.0).unwrap());
        let mut rng = StdRng::seed_from_u64(1);
        // Camera pointing straight down while candidates are drawn above
        let pose = Pose3D::new(
            Point3D::new(0.3, 0.3, 0.3),
            UnitQuaternion::from_euler_angles(0.0, -std::f64::consts::FRAC_PI_2, 0.0),
        );
        let target = generate_target(&map, &pose, 10.0, CAMERA_FOV, 50, &mut rng);
        assert!(target.is_none());
    }
}
