// Momentum-smoothed random walk
//
// Generates a wandering exploration route: each step keeps most of the
// previous heading and mixes in a normally distributed sideways/vertical
// perturbation. Steps that land in occupied voxels are redrawn.

use log::debug;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::common::{NavError, NavResult, OccupancyView, Point3D};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkConfig {
    /// Weight of the previous heading in [0, 1]
    pub momentum: f64,
    pub step_size: f64,
    /// Per-axis bound on the heading components
    pub gradient_limit: f64,
    /// Altitude bounds (min, max) [m]
    pub z_limit: (f64, f64),
    /// Number of steps after the start point
    pub path_length: usize,
    /// Redraws per step, and restarts per walk, before giving up
    pub retry_limit: usize,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        RandomWalkConfig {
            momentum: 0.75,
            step_size: 0.75,
            gradient_limit: PI / 9.0,
            z_limit: (-20.0, 0.0),
            path_length: 30,
            retry_limit: 10,
        }
    }
}

fn normal_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    Vector3::new(
        StandardNormal.sample(rng),
        StandardNormal.sample(rng),
        StandardNormal.sample(rng),
    )
}

fn normalize_or(v: Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(f64::EPSILON).unwrap_or(fallback)
}

/// Random walk of `config.path_length` steps from `start`.
///
/// With a map, every step must land in an unoccupied voxel. A step that
/// cannot be placed within `retry_limit` draws restarts the walk, and
/// `retry_limit` failed walks give `NoPathFound`.
pub fn random_walk<R: Rng + ?Sized>(
    start: Point3D,
    config: &RandomWalkConfig,
    map: Option<&dyn OccupancyView>,
    rng: &mut R,
) -> NavResult<Vec<Point3D>> {
    if !(0.0..=1.0).contains(&config.momentum) || !(config.step_size > 0.0) {
        return Err(NavError::InvalidParameter(format!(
            "random walk momentum {} / step size {}",
            config.momentum, config.step_size
        )));
    }
    if config.z_limit.0 > config.z_limit.1 {
        return Err(NavError::InvalidParameter("z_limit min above max".to_string()));
    }

    let is_free = |p: &Point3D| match map {
        Some(m) => !m.is_occupied(&m.grid().quantize(p)),
        None => true,
    };

    let mut total_draws = 0;
    for attempt in 0..config.retry_limit.max(1) {
        let mut direction = normalize_or(normal_vector(rng), Vector3::x());
        let mut path = Vec::with_capacity(config.path_length + 1);
        path.push(start);

        let mut stuck = false;
        for _ in 0..config.path_length {
            let last = path[path.len() - 1];
            let mut placed = None;
            for _ in 0..config.retry_limit.max(1) {
                total_draws += 1;
                let sideways = normal_vector(rng);
                let perturbance = normalize_or(Vector3::new(0.0, sideways.y, sideways.z), Vector3::zeros())
                    .component_mul(&direction);

                direction = normalize_or(
                    config.momentum * direction + (1.0 - config.momentum) * perturbance,
                    direction,
                )
                .map(|u| u.clamp(-config.gradient_limit, config.gradient_limit));

                let mut next = last.offset(&(config.step_size * direction));
                next.z = next.z.clamp(config.z_limit.0, config.z_limit.1);

                if is_free(&next) {
                    placed = Some(next);
                    break;
                }
            }

            match placed {
                Some(p) => path.push(p),
                None => {
                    stuck = true;
                    break;
                }
            }
        }

        if !stuck {
            return Ok(path);
        }
        debug!("[RandomWalk] attempt {} stuck after {} steps", attempt + 1, path.len() - 1);
    }

    Err(NavError::NoPathFound { expansions: total_draws })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FrozenOccupancy, OccupancyStore, VoxelGrid};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_walk_length_and_start() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = Point3D::new(1.0, 2.0, -5.0);
        let path = random_walk(start, &RandomWalkConfig::default(), None, &mut rng).unwrap();
        assert_eq!(path.len(), 31);
        assert_eq!(path[0], start);
    }

    #[test]
    fn test_steps_are_bounded() {
        let config = RandomWalkConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let path = random_walk(Point3D::new(0.0, 0.0, -10.0), &config, None, &mut rng).unwrap();
        let max_step = config.step_size * config.gradient_limit * 3f64.sqrt() + 1e-9;
        for w in path.windows(2) {
            assert!(w[0].distance(&w[1]) <= max_step);
        }
    }

    #[test]
    fn test_altitude_clamped() {
        let config = RandomWalkConfig { z_limit: (-1.0, -0.5), path_length: 200, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(3);
        let path = random_walk(Point3D::new(0.0, 0.0, -0.75), &config, None, &mut rng).unwrap();
        assert!(path.iter().skip(1).all(|p| (-1.0..=-0.5).contains(&p.z)));
    }

    #[test]
    fn test_walk_avoids_occupied_voxels() {
        let mut store = OccupancyStore::new(1.0, 10_000).unwrap();
        for x in [-6, 6] {
            for y in -6..=6 {
                store.add_point(&Point3D::new(x as f64, y as f64, -10.0));
            }
        }
        let frozen = store.freeze();
        let mut rng = StdRng::seed_from_u64(11);
        if let Ok(path) = random_walk(Point3D::new(0.0, 0.0, -10.0), &RandomWalkConfig::default(), Some(&frozen), &mut rng) {
            for p in &path[1..] {
                assert!(!frozen.is_occupied(&frozen.grid().quantize(p)));
            }
        }
    }

    #[test]
    fn test_boxed_in_walk_fails() {
        let mut store = OccupancyStore::new(1.0, 10_000).unwrap();
        for x in -4..=4 {
            for y in -4..=4 {
                for z in -4..=4 {
                    if x * x + y * y + z * z > 1 {
                        store.add_point(&Point3D::new(x as f64, y as f64, z as f64 - 10.0));
                    }
                }
            }
        }
        let mut rng = StdRng::seed_from_u64(5);
        let config = RandomWalkConfig { path_length: 5, ..Default::default() };
        let result = random_walk(Point3D::new(0.0, 0.0, -10.0), &config, Some(&store.freeze()), &mut rng);
        assert!(matches!(result, Err(NavError::NoPathFound { .. })));
    }

    #[test]
    fn test_rejects_bad_momentum() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = RandomWalkConfig { momentum: 1.5, ..Default::default() };
        let empty = FrozenOccupancy::empty(VoxelGrid::new(1.0).unwrap());
        assert!(random_walk(Point3D::origin(), &config, Some(&empty), &mut rng).is_err());
    }
}
