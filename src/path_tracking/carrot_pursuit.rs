// Carrot pursuit tracking of a 3D trajectory
//
// The trajectory is densely sampled into a polyline. Each cycle the vehicle
// finds its progress along the polyline and chases the point a fixed arc
// length ahead of it at constant speed, heading towards it.

use std::sync::Arc;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, Point3D, VelocityCommand};
use crate::path_planning::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrotPursuitConfig {
    /// Commanded speed [m/s]
    pub speed: f64,
    /// Lookahead arc length [m]
    pub lookahead: f64,
    /// Polyline resolution of the sampled trajectory
    pub samples: usize,
}

impl Default for CarrotPursuitConfig {
    fn default() -> Self {
        CarrotPursuitConfig {
            speed: 0.5,
            lookahead: 1.0,
            samples: 1000,
        }
    }
}

/// Index of the sample closest to `position`
pub fn nearest_index(samples: &[Point3D], position: &Point3D) -> usize {
    let mut d_min = f64::MAX;
    let mut ind_min = 0;
    for (i, s) in samples.iter().enumerate() {
        let d = s.distance(position);
        if d < d_min {
            d_min = d;
            ind_min = i;
        }
    }
    ind_min
}

/// Arc length travelled along `samples` when standing at `position`.
///
/// Full segments before `index` plus the projection of `position` onto
/// segment `index`. The projection is not clamped, so the result can fall
/// below zero behind the first sample.
pub fn progress(samples: &[Point3D], index: usize, position: &Point3D) -> NavResult<f64> {
    if samples.len() < 2 {
        return Err(NavError::DegenerateTrajectory(format!(
            "pursuit needs at least 2 samples, got {}",
            samples.len()
        )));
    }
    let index = index.min(samples.len() - 2);

    let travelled: f64 = samples[..=index].windows(2).map(|w| w[0].distance(&w[1])).sum();

    let p1 = samples[index];
    let p2 = samples[index + 1];
    let segment = p1.vector_to(&p2);
    let seg_len = segment.norm();
    if seg_len <= f64::EPSILON {
        return Err(NavError::DegenerateTrajectory(format!(
            "zero-length segment at sample {}",
            index
        )));
    }
    Ok(travelled + p1.vector_to(position).dot(&segment) / seg_len)
}

/// Point `lookahead` metres of arc past `progress`, and whether the walk
/// ran off the end of the polyline.
///
/// Fewer than 2 samples is a `DegenerateTrajectory` error.
///
/// # Panics
/// When the interpolation weights leave [0, 1], which means the arc length
/// bookkeeping is broken.
pub fn lookahead_point(samples: &[Point3D], progress: f64, lookahead: f64) -> NavResult<(Point3D, bool)> {
    if samples.len() < 2 {
        return Err(NavError::DegenerateTrajectory(format!(
            "lookahead needs at least 2 samples, got {}",
            samples.len()
        )));
    }
    let target = (progress + lookahead).max(0.0);
    let mut arc = 0.0;
    let mut behind = samples[0];
    for &ahead in &samples[1..] {
        let seg_len = behind.distance(&ahead);
        arc += seg_len;
        if arc > target {
            let behind_weight = (arc - target) / seg_len;
            let ahead_weight = 1.0 - behind_weight;
            assert!(
                (0.0..=1.0).contains(&behind_weight) && (0.0..=1.0).contains(&ahead_weight),
                "invalid interpolation weights {} / {}",
                behind_weight,
                ahead_weight
            );
            return Ok((behind.lerp(&ahead, ahead_weight), false));
        }
        behind = ahead;
    }
    Ok((samples[samples.len() - 1], true))
}

/// One pursuit decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuitCommand {
    pub velocity: Vector3<f64>,
    /// Heading towards the lookahead point [rad]
    pub yaw: f64,
    pub lookahead: Point3D,
    /// Arc length already covered [m]
    pub progress: f64,
    /// Lookahead clamped to the end and the vehicle within one lookahead of it
    pub at_end: bool,
}

impl PursuitCommand {
    pub fn to_velocity_command(&self) -> VelocityCommand {
        VelocityCommand::new(self.velocity, self.yaw)
    }
}

/// Lookahead pursuit controller with a per-trajectory sample cache
pub struct CarrotPursuit {
    config: CarrotPursuitConfig,
    cached: Option<(Arc<Trajectory>, Vec<Point3D>)>,
    last_yaw: f64,
}

impl CarrotPursuit {
    pub fn new(config: CarrotPursuitConfig) -> Self {
        CarrotPursuit { config, cached: None, last_yaw: 0.0 }
    }

    pub fn config(&self) -> &CarrotPursuitConfig {
        &self.config
    }

    /// Samples of `trajectory`, recomputed only when a different
    /// trajectory is passed in
    fn samples(&mut self, trajectory: &Arc<Trajectory>) -> NavResult<&[Point3D]> {
        let stale = match &self.cached {
            Some((cached, _)) => !Arc::ptr_eq(cached, trajectory),
            None => true,
        };
        if stale {
            let samples = trajectory.sample(self.config.samples.max(2))?;
            self.cached = Some((Arc::clone(trajectory), samples));
        }
        match &self.cached {
            Some((_, samples)) => Ok(samples),
            None => Err(NavError::DegenerateTrajectory("no samples cached".to_string())),
        }
    }

    pub fn command(&mut self, trajectory: &Arc<Trajectory>, position: &Point3D) -> NavResult<PursuitCommand> {
        let config = self.config;
        let samples = self.samples(trajectory)?;

        let index = nearest_index(samples, position);
        let progress = progress(samples, index, position)?;
        let (lookahead, clamped) = lookahead_point(samples, progress, config.lookahead)?;
        let at_end = clamped && position.distance(&samples[samples.len() - 1]) <= config.lookahead;

        let displacement = position.vector_to(&lookahead);
        let distance = displacement.norm();
        let velocity = if distance > f64::EPSILON {
            displacement * (config.speed / distance)
        } else {
            Vector3::zeros()
        };
        if displacement.x.hypot(displacement.y) > f64::EPSILON {
            self.last_yaw = displacement.y.atan2(displacement.x);
        }

        Ok(PursuitCommand {
            velocity,
            yaw: self.last_yaw,
            lookahead,
            progress,
            at_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(n: usize, length: f64) -> Vec<Point3D> {
        (0..n)
            .map(|i| Point3D::new(length * i as f64 / (n - 1) as f64, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn test_nearest_index() {
        let samples = line(11, 10.0);
        assert_eq!(nearest_index(&samples, &Point3D::new(3.2, 1.0, 0.0)), 3);
        assert_eq!(nearest_index(&samples, &Point3D::new(-4.0, 0.0, 0.0)), 0);
    }

    #[test]
    fn test_progress_on_straight_line() {
        let samples = line(11, 10.0);
        let p = Point3D::new(3.4, 0.5, 0.0);
        let i = nearest_index(&samples, &p);
        assert_relative_eq!(progress(&samples, i, &p).unwrap(), 3.4, epsilon = 1e-12);
        // Past the end the last segment is extended
        let past = Point3D::new(10.5, 0.0, 0.0);
        assert_relative_eq!(progress(&samples, 10, &past).unwrap(), 10.5, epsilon = 1e-12);
    }

    #[test]
    fn test_progress_degenerate_inputs() {
        let single = vec![Point3D::origin()];
        assert!(matches!(
            progress(&single, 0, &Point3D::origin()),
            Err(NavError::DegenerateTrajectory(_))
        ));
        let stalled = vec![Point3D::origin(), Point3D::origin(), Point3D::new(1.0, 0.0, 0.0)];
        assert!(matches!(
            progress(&stalled, 0, &Point3D::origin()),
            Err(NavError::DegenerateTrajectory(_))
        ));
    }

    #[test]
    fn test_lookahead_is_one_metre_ahead() {
        let samples = line(1000, 10.0);
        let mut last = f64::NEG_INFINITY;
        for k in 0..90 {
            let x = k as f64 * 0.1;
            let p = Point3D::new(x, 0.0, 0.0);
            let prog = progress(&samples, nearest_index(&samples, &p), &p).unwrap();
            let (carrot, clamped) = lookahead_point(&samples, prog, 1.0).unwrap();
            assert!(!clamped);
            assert_relative_eq!(carrot.x, x + 1.0, epsilon = 1e-9);
            assert!(carrot.x > last);
            last = carrot.x;
        }
    }

    #[test]
    fn test_lookahead_clamps_at_end() {
        let samples = line(1000, 10.0);
        let (carrot, clamped) = lookahead_point(&samples, 9.5, 1.0).unwrap();
        assert!(clamped);
        assert_eq!(carrot, Point3D::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_lookahead_behind_start_chases_first_sample() {
        let samples = line(11, 10.0);
        let (carrot, clamped) = lookahead_point(&samples, -5.0, 1.0).unwrap();
        assert!(!clamped);
        assert_relative_eq!(carrot.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lookahead_needs_two_samples() {
        assert!(matches!(
            lookahead_point(&[], 0.0, 1.0),
            Err(NavError::DegenerateTrajectory(_))
        ));
        assert!(matches!(
            lookahead_point(&[Point3D::origin()], 0.0, 1.0),
            Err(NavError::DegenerateTrajectory(_))
        ));
    }

    #[test]
    fn test_command_speed_and_heading() {
        let knots: Vec<Point3D> = (0..=10).map(|i| Point3D::new(0.0, i as f64, -2.0)).collect();
        let traj = Arc::new(Trajectory::fit(&knots).unwrap());
        let mut pursuit = CarrotPursuit::new(CarrotPursuitConfig::default());

        let cmd = pursuit.command(&traj, &Point3D::new(0.0, 2.0, -2.0)).unwrap();
        assert_relative_eq!(cmd.velocity.norm(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(cmd.yaw, std::f64::consts::FRAC_PI_2, epsilon = 1e-6);
        assert_relative_eq!(cmd.lookahead.y, 3.0, epsilon = 1e-3);
        assert!(!cmd.at_end);

        let end = pursuit.command(&traj, &Point3D::new(0.0, 9.8, -2.0)).unwrap();
        assert!(end.at_end);
    }

    #[test]
    fn test_sample_cache_follows_trajectory_identity() {
        let a = Arc::new(Trajectory::fit(&line(3, 10.0)).unwrap());
        let b = Arc::new(Trajectory::fit(&line(3, 20.0)).unwrap());
        let mut pursuit = CarrotPursuit::new(CarrotPursuitConfig { samples: 50, ..Default::default() });

        pursuit.command(&a, &Point3D::origin()).unwrap();
        assert!(Arc::ptr_eq(&pursuit.cached.as_ref().unwrap().0, &a));
        pursuit.command(&Arc::clone(&a), &Point3D::origin()).unwrap();
        assert!(Arc::ptr_eq(&pursuit.cached.as_ref().unwrap().0, &a));
        pursuit.command(&b, &Point3D::origin()).unwrap();
        assert_eq!(pursuit.cached.as_ref().unwrap().1[49], Point3D::new(20.0, 0.0, 0.0));
    }
}
