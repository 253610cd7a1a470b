//! Spatial occupancy memory
//!
//! Voxel quantization and the bounded, recency-evicted occupancy store fed
//! by range-sensor returns.

pub mod voxel_grid;
pub mod occupancy;

pub use voxel_grid::{Voxel, VoxelGrid};
pub use occupancy::{FrozenOccupancy, OccupancySnapshot, OccupancyStore};
