//! RustDroneNav - reactive aerial navigation in Rust
//!
//! This crate provides the navigation core of a multirotor flying to a goal
//! through unknown space: bounded voxel occupancy memory, visibility
//! constrained path search, spline trajectories, lookahead pursuit, and a
//! replanning control loop with a background planner.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod mapping;
pub mod path_planning;
pub mod path_tracking;
pub mod mission_planning;
pub mod aerial_navigation;

// Re-export common types for convenience
pub use common::{Point3D, Pose3D, VelocityCommand};
pub use common::{OccupancyView, PathPlanner3D, VehicleInterface};
pub use common::{NavError, NavResult};
