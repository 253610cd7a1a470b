//! Visibility-constrained A* over the voxel grid
//!
//! Standard A* on the 26-connected grid of unoccupied voxels, with one extra
//! rule: a successor is never expanded if the goal would fall outside the
//! camera cone after yawing to face it from that successor. The vehicle
//! therefore always keeps the goal in view along the returned route.
//!
//! The heuristic is a large multiple of Euclidean distance. That makes the
//! search greedy and non-admissible, trading optimality for speed; the
//! weight is a tunable in [`VoxelAStarConfig`].
//!
//! Improved g-scores push a fresh heap entry instead of updating in place;
//! stale entries are skipped on pop by comparing against the best known g.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use log::{debug, trace};
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, OccupancyView, PathPlanner3D, Point3D};
use crate::mapping::Voxel;
use crate::path_planning::visibility::{is_visible, orientation_facing, CAMERA_FOV};

/// Configuration for the voxel A* planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelAStarConfig {
    /// Heuristic weight (1.0 = admissible, larger = greedier)
    pub heuristic_weight: f64,
    /// Camera half-angle used to prune successors [rad]
    pub fov_half_angle: f64,
    /// Give up after this many node expansions
    pub max_expansions: usize,
}

impl Default for VoxelAStarConfig {
    fn default() -> Self {
        Self {
            heuristic_weight: 100.0,
            fov_half_angle: CAMERA_FOV,
            max_expansions: 200_000,
        }
    }
}

/// Visibility-constrained voxel A* planner
#[derive(Debug, Clone)]
pub struct VoxelAStarPlanner {
    config: VoxelAStarConfig,
}

impl VoxelAStarPlanner {
    pub fn new(config: VoxelAStarConfig) -> Self {
        VoxelAStarPlanner { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(VoxelAStarConfig::default())
    }

    pub fn config(&self) -> &VoxelAStarConfig {
        &self.config
    }

    /// Plan with the weighted Euclidean heuristic and Euclidean edge cost
    pub fn plan_voxels(&self, start: Point3D, goal: Point3D, map: &dyn OccupancyView) -> NavResult<Vec<Voxel>> {
        let w = self.config.heuristic_weight;
        self.plan_with(start, goal, map, |v, g| w * v.distance(g), |a, b| a.distance(b))
    }

    /// Plan with caller-supplied heuristic `h(voxel, goal)` and edge cost `d(from, to)`
    pub fn plan_with<H, D>(
        &self,
        start: Point3D,
        goal: Point3D,
        map: &dyn OccupancyView,
        h: H,
        d: D,
    ) -> NavResult<Vec<Voxel>>
    where
        H: Fn(&Voxel, &Voxel) -> f64,
        D: Fn(&Voxel, &Voxel) -> f64,
    {
        let grid = *map.grid();
        let start_voxel = grid.quantize(&start);
        let goal_voxel = grid.quantize(&goal);
        let goal_center = grid.center(&goal_voxel);

        debug!(
            "[VoxelAStar] plan: start={:?} goal={:?}",
            start_voxel, goal_voxel
        );

        if goal_voxel != start_voxel && map.is_occupied(&goal_voxel) {
            return Err(NavError::InvalidEndpoint(format!(
                "goal voxel {:?} is occupied",
                goal_voxel
            )));
        }

        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<Voxel, Voxel> = HashMap::new();
        let mut g_score: HashMap<Voxel, f64> = HashMap::new();

        g_score.insert(start_voxel, 0.0);
        open_set.push(Reverse((score(h(&start_voxel, &goal_voxel))?, score(0.0)?, start_voxel)));

        let mut expansions = 0;
        while let Some(Reverse((_, g, current))) = open_set.pop() {
            let best = g_score.get(&current).copied().unwrap_or(f64::INFINITY);
            if g.into_inner() > best {
                continue;
            }

            if current == goal_voxel {
                let path = reconstruct_path(&came_from, current);
                debug!(
                    "[VoxelAStar] found path of {} voxels after {} expansions",
                    path.len(),
                    expansions
                );
                return Ok(path);
            }

            expansions += 1;
            if expansions > self.config.max_expansions {
                debug!("[VoxelAStar] FAILED: expansion limit {} hit", self.config.max_expansions);
                return Err(NavError::NoPathFound { expansions });
            }
            if expansions % 1000 == 0 {
                trace!(
                    "[VoxelAStar] expansions: {}, open set size: {}",
                    expansions,
                    open_set.len()
                );
            }

            for neighbor in map.empty_neighbors(&current) {
                // skip successors from which the goal isn't visible
                let position = grid.center(&neighbor);
                let orientation = orientation_facing(&goal_center, &position);
                if !is_visible(&goal_center, &position, &orientation, self.config.fov_half_angle) {
                    continue;
                }

                let tentative = best + d(&current, &neighbor);
                if tentative < g_score.get(&neighbor).copied().unwrap_or(f64::INFINITY) {
                    came_from.insert(neighbor, current);
                    g_score.insert(neighbor, tentative);
                    let f = tentative + h(&neighbor, &goal_voxel);
                    open_set.push(Reverse((score(f)?, score(tentative)?, neighbor)));
                }
            }
        }

        debug!("[VoxelAStar] FAILED: open set empty after {} expansions", expansions);
        Err(NavError::NoPathFound { expansions })
    }
}

impl PathPlanner3D for VoxelAStarPlanner {
    fn plan(&self, start: Point3D, goal: Point3D, map: &dyn OccupancyView) -> NavResult<Vec<Point3D>> {
        let grid = *map.grid();
        let voxels = self.plan_voxels(start, goal, map)?;
        Ok(voxels.iter().map(|v| grid.center(v)).collect())
    }
}

fn score(value: f64) -> NavResult<NotNan<f64>> {
    NotNan::new(value).map_err(|_| NavError::NumericalError("NaN search score".to_string()))
}

fn reconstruct_path(came_from: &HashMap<Voxel, Voxel>, goal: Voxel) -> Vec<Voxel> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}
