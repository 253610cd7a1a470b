//! Configuration for the replanning navigation loop

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult};
use crate::path_planning::VoxelAStarConfig;
use crate::path_tracking::CarrotPursuitConfig;

/// Top-level navigation configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Control loop period in milliseconds (default: 100)
    #[serde(default = "default_control_period_ms")]
    pub control_period_ms: u64,

    /// Stop the leg once this close to the goal [m] (default: 3.0)
    #[serde(default = "default_endpoint_tolerance")]
    pub endpoint_tolerance: f64,

    /// Occupancy voxel edge length [m] (default: 1.0)
    #[serde(default = "default_voxel_size")]
    pub voxel_size: f64,

    /// Maximum number of remembered occupied voxels (default: 100000)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Timeout for the initial turn towards the goal in milliseconds (default: 100)
    #[serde(default = "default_yaw_timeout_ms")]
    pub yaw_timeout_ms: u64,

    /// Random target draws before giving up (default: 5000)
    #[serde(default = "default_max_endpoint_attempts")]
    pub max_endpoint_attempts: usize,

    /// Radius for random exploration targets [m] (default: 10.0)
    #[serde(default = "default_target_radius")]
    pub target_radius: f64,

    /// Consecutive failed replans that abort a leg (default: 5)
    #[serde(default = "default_max_planning_failures")]
    pub max_planning_failures: usize,

    /// Control cycles after which a leg times out (default: 100000)
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,

    /// Cycles a plan may stay pending before a warning (default: 20)
    #[serde(default = "default_slow_plan_cycles")]
    pub slow_plan_cycles: usize,

    #[serde(default)]
    pub planner: VoxelAStarConfig,

    #[serde(default)]
    pub pursuit: CarrotPursuitConfig,
}

fn default_control_period_ms() -> u64 {
    100
}
fn default_endpoint_tolerance() -> f64 {
    3.0
}
fn default_voxel_size() -> f64 {
    1.0
}
fn default_cache_size() -> usize {
    100_000
}
fn default_yaw_timeout_ms() -> u64 {
    100
}
fn default_max_endpoint_attempts() -> usize {
    5000
}
fn default_target_radius() -> f64 {
    10.0
}
fn default_max_planning_failures() -> usize {
    5
}
fn default_max_cycles() -> usize {
    100_000
}
fn default_slow_plan_cycles() -> usize {
    20
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            control_period_ms: default_control_period_ms(),
            endpoint_tolerance: default_endpoint_tolerance(),
            voxel_size: default_voxel_size(),
            cache_size: default_cache_size(),
            yaw_timeout_ms: default_yaw_timeout_ms(),
            max_endpoint_attempts: default_max_endpoint_attempts(),
            target_radius: default_target_radius(),
            max_planning_failures: default_max_planning_failures(),
            max_cycles: default_max_cycles(),
            slow_plan_cycles: default_slow_plan_cycles(),
            planner: VoxelAStarConfig::default(),
            pursuit: CarrotPursuitConfig::default(),
        }
    }
}

impl NavigationConfig {
    pub fn from_toml_str(content: &str) -> NavResult<Self> {
        let config: NavigationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> NavResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> NavResult<()> {
        if self.control_period_ms == 0 {
            return Err(NavError::Config("control_period_ms must be positive".to_string()));
        }
        if !(self.voxel_size > 0.0) {
            return Err(NavError::Config(format!("voxel_size must be positive, got {}", self.voxel_size)));
        }
        if !(self.endpoint_tolerance >= 0.0) {
            return Err(NavError::Config("endpoint_tolerance must be non-negative".to_string()));
        }
        if !(self.pursuit.speed > 0.0 && self.pursuit.lookahead > 0.0) {
            return Err(NavError::Config("pursuit speed and lookahead must be positive".to_string()));
        }
        if self.pursuit.samples < 2 {
            return Err(NavError::Config("pursuit needs at least 2 samples".to_string()));
        }
        Ok(())
    }

    pub fn control_period(&self) -> Duration {
        Duration::from_millis(self.control_period_ms)
    }

    pub fn yaw_timeout(&self) -> Duration {
        Duration::from_millis(self.yaw_timeout_ms)
    }
}
