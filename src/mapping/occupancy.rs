//! Bounded voxel occupancy memory
//!
//! Occupancy is binary: a voxel is either believed occupied or unknown.
//! Memory is bounded by evicting the least recently touched voxel, and both
//! insertion and membership lookups count as a touch.

use std::collections::HashSet;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::common::{NavResult, OccupancyView, Point3D};
use crate::mapping::voxel_grid::{Voxel, VoxelGrid};
use crate::utils::LruSet;

/// Recency-evicted set of occupied voxels
#[derive(Debug, Clone)]
pub struct OccupancyStore {
    grid: VoxelGrid,
    cache: LruSet<Voxel>,
}

impl OccupancyStore {
    pub fn new(voxel_size: f64, capacity: usize) -> NavResult<Self> {
        Ok(OccupancyStore {
            grid: VoxelGrid::new(voxel_size)?,
            cache: LruSet::new(capacity),
        })
    }

    pub fn with_grid(grid: VoxelGrid, capacity: usize) -> Self {
        OccupancyStore { grid, cache: LruSet::new(capacity) }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    pub fn quantize(&self, point: &Point3D) -> Voxel {
        self.grid.quantize(point)
    }

    /// Mark the point's voxel and its 26 neighbours occupied.
    ///
    /// Each voxel is touched independently and may evict on its own. The
    /// neighbours go first so the observed voxel ends up most recent.
    /// Returns how many voxels were evicted. Non-finite points and points
    /// beyond the grid's index range are ignored.
    pub fn add_point(&mut self, point: &Point3D) -> usize {
        if !point.is_finite() || !self.grid.in_range(point) {
            return 0;
        }
        let voxel = self.grid.quantize(point);
        let mut evicted = 0;
        for v in voxel.neighbors26() {
            evicted += self.cache.insert(v).is_some() as usize;
        }
        evicted += self.cache.insert(voxel).is_some() as usize;
        evicted
    }

    /// Ingest a batch of sensor returns
    pub fn add_points<'a, I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = &'a Point3D>,
    {
        let mut count = 0;
        let mut evicted = 0;
        for p in points {
            evicted += self.add_point(p);
            count += 1;
        }
        if count > 0 {
            trace!(
                "ingested {} points, {} voxels stored, {} evicted",
                count,
                self.cache.len(),
                evicted
            );
        }
        evicted
    }

    /// Membership by point; refreshes recency on a hit
    pub fn contains_point(&mut self, point: &Point3D) -> bool {
        let voxel = self.grid.quantize(point);
        self.cache.contains(&voxel)
    }

    /// Membership by voxel; refreshes recency on a hit
    pub fn contains_voxel(&mut self, voxel: &Voxel) -> bool {
        self.cache.contains(voxel)
    }

    pub fn discard(&mut self, voxel: &Voxel) -> bool {
        self.cache.remove(voxel)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Stored voxels from least to most recently touched
    pub fn voxels(&self) -> impl Iterator<Item = &Voxel> {
        self.cache.iter()
    }

    /// Copy-on-read view for a concurrent planner
    pub fn freeze(&self) -> FrozenOccupancy {
        FrozenOccupancy {
            grid: self.grid,
            occupied: self.cache.iter().copied().collect(),
        }
    }

    /// Serializable copy preserving recency order
    pub fn snapshot(&self) -> OccupancySnapshot {
        OccupancySnapshot {
            voxel_size: self.grid.cell_size(),
            capacity: self.cache.capacity(),
            voxels: self.cache.iter().copied().collect(),
        }
    }

    pub fn from_snapshot(snapshot: &OccupancySnapshot) -> NavResult<Self> {
        let mut store = OccupancyStore::new(snapshot.voxel_size, snapshot.capacity)?;
        for v in &snapshot.voxels {
            store.cache.insert(*v);
        }
        Ok(store)
    }
}

impl OccupancyView for OccupancyStore {
    fn is_occupied(&self, voxel: &Voxel) -> bool {
        self.cache.peek(voxel)
    }

    fn grid(&self) -> &VoxelGrid {
        &self.grid
    }
}

/// Immutable occupancy set handed to the planner
#[derive(Debug, Clone)]
pub struct FrozenOccupancy {
    grid: VoxelGrid,
    occupied: HashSet<Voxel>,
}

impl FrozenOccupancy {
    pub fn empty(grid: VoxelGrid) -> Self {
        FrozenOccupancy { grid, occupied: HashSet::new() }
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }
}

impl OccupancyView for FrozenOccupancy {
    fn is_occupied(&self, voxel: &Voxel) -> bool {
        self.occupied.contains(voxel)
    }

    fn grid(&self) -> &VoxelGrid {
        &self.grid
    }
}

/// Opaque store snapshot for replay and testing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    pub voxel_size: f64,
    pub capacity: usize,
    /// Least to most recently touched
    pub voxels: Vec<Voxel>,
}

impl OccupancySnapshot {
    pub fn to_json(&self) -> NavResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> NavResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
