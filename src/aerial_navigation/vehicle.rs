//! Kinematic stand-in for a multirotor behind [`VehicleInterface`]

use std::time::Duration;

use crate::common::{NavError, NavResult, Point3D, Pose3D, VehicleInterface, VelocityCommand};

/// Point-mass vehicle that follows velocity commands exactly.
///
/// Obstacles are a static point cloud; every sensor call returns the points
/// within `sensing_range` of the current position. A command moves the
/// vehicle over its whole duration at once; the clock only advances through
/// `sleep` and `rotate_to_yaw`, so tests run as fast as the CPU allows.
#[derive(Debug, Clone)]
pub struct SimulatedVehicle {
    pose: Pose3D,
    obstacles: Vec<Point3D>,
    sensing_range: f64,
    clock: Duration,
    commands: Vec<VelocityCommand>,
    trace: Vec<Point3D>,
}

impl SimulatedVehicle {
    pub fn new(pose: Pose3D) -> Self {
        SimulatedVehicle {
            pose,
            obstacles: Vec::new(),
            sensing_range: 20.0,
            clock: Duration::ZERO,
            commands: Vec::new(),
            trace: vec![pose.position],
        }
    }

    pub fn with_obstacles(mut self, obstacles: Vec<Point3D>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn with_sensing_range(mut self, range: f64) -> Self {
        self.sensing_range = range;
        self
    }

    pub fn position(&self) -> Point3D {
        self.pose.position
    }

    /// Simulated time elapsed
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Every velocity command received, in order
    pub fn commands(&self) -> &[VelocityCommand] {
        &self.commands
    }

    /// Position after every command, starting with the initial one
    pub fn trace(&self) -> &[Point3D] {
        &self.trace
    }

    pub fn obstacles(&self) -> &[Point3D] {
        &self.obstacles
    }
}

impl VehicleInterface for SimulatedVehicle {
    fn pose(&mut self) -> NavResult<Pose3D> {
        Ok(self.pose)
    }

    fn sensor_points(&mut self) -> NavResult<Vec<Point3D>> {
        let position = self.pose.position;
        Ok(self
            .obstacles
            .iter()
            .filter(|p| p.distance(&position) <= self.sensing_range)
            .copied()
            .collect())
    }

    fn send_velocity(&mut self, command: VelocityCommand, duration: Duration) -> NavResult<()> {
        if !(command.velocity.iter().all(|v| v.is_finite()) && command.yaw.is_finite()) {
            return Err(NavError::Vehicle(format!("non-finite command {:?}", command)));
        }
        let dt = duration.as_secs_f64();
        let position = self.pose.position.offset(&(command.velocity * dt));
        self.pose = Pose3D::from_yaw(position, command.yaw);
        self.commands.push(command);
        self.trace.push(position);
        Ok(())
    }

    fn rotate_to_yaw(&mut self, yaw: f64, timeout: Duration) -> NavResult<()> {
        if !yaw.is_finite() {
            return Err(NavError::Vehicle(format!("non-finite yaw {}", yaw)));
        }
        self.pose = Pose3D::from_yaw(self.pose.position, yaw);
        self.clock += timeout;
        Ok(())
    }

    fn sleep(&mut self, duration: Duration) {
        self.clock += duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_velocity_integration() {
        let mut vehicle = SimulatedVehicle::new(Pose3D::origin());
        let cmd = VelocityCommand::new(Vector3::new(0.5, 0.0, -0.1), 0.3);
        for _ in 0..10 {
            vehicle.send_velocity(cmd, Duration::from_millis(100)).unwrap();
            vehicle.sleep(Duration::from_millis(100));
        }
        let p = vehicle.position();
        assert_relative_eq!(p.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.z, -0.1, epsilon = 1e-12);
        assert_relative_eq!(vehicle.pose().unwrap().yaw(), 0.3, epsilon = 1e-12);
        assert_eq!(vehicle.commands().len(), 10);
        assert_eq!(vehicle.trace().len(), 11);
        assert_eq!(vehicle.clock(), Duration::from_secs(1));
    }

    #[test]
    fn test_sensor_range_filter() {
        let obstacles = vec![Point3D::new(5.0, 0.0, 0.0), Point3D::new(50.0, 0.0, 0.0)];
        let mut vehicle = SimulatedVehicle::new(Pose3D::origin())
            .with_obstacles(obstacles)
            .with_sensing_range(10.0);
        assert_eq!(vehicle.sensor_points().unwrap(), vec![Point3D::new(5.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_rejects_nan_command() {
        let mut vehicle = SimulatedVehicle::new(Pose3D::origin());
        let cmd = VelocityCommand::new(Vector3::new(f64::NAN, 0.0, 0.0), 0.0);
        assert!(matches!(
            vehicle.send_velocity(cmd, Duration::from_millis(100)),
            Err(NavError::Vehicle(_))
        ));
        assert!(vehicle.commands().is_empty());
    }
}
