//! Voxel grid: continuous points to integer cells
//!
//! A point maps to the cell whose centre is nearest on every axis, i.e.
//! `round(v / cell_size)` per axis. Ties at exact cell boundaries round
//! half away from zero (`f64::round`), so `0.5` goes to cell `1` and `-0.5`
//! goes to cell `-1`.

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, Point3D};

const DELTA: [i64; 3] = [-1, 0, 1];

/// Largest |v / cell_size| a point may have and still be stored.
/// Beyond 2^52 an f64 no longer resolves single cells.
pub const MAX_CELL_INDEX: f64 = 4_503_599_627_370_496.0;

/// Integer-quantized grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Voxel {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Voxel {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Voxel { x, y, z }
    }

    /// The 26 face/edge/corner-adjacent cells.
    ///
    /// Order is fixed: z outermost, then y, then x, each stepping -1, 0, +1,
    /// with the cell itself skipped.
    pub fn neighbors26(&self) -> Vec<Voxel> {
        iproduct!(DELTA, DELTA, DELTA)
            .filter(|&(dz, dy, dx)| (dx, dy, dz) != (0, 0, 0))
            .map(|(dz, dy, dx)| Voxel::new(
                    self.x.saturating_add(dx),
                    self.y.saturating_add(dy),
                    self.z.saturating_add(dz),
                ))
            .collect()
    }

    /// Chebyshev distance of exactly one
    pub fn is_adjacent26(&self, other: &Voxel) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        let dz = (self.z - other.z).abs();
        dx.max(dy).max(dz) == 1
    }

    /// Euclidean distance in cell units
    pub fn distance(&self, other: &Voxel) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        let dz = (self.z - other.z) as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Uniform cubic grid of a fixed cell size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelGrid {
    cell_size: f64,
}

impl VoxelGrid {
    pub fn new(cell_size: f64) -> NavResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(NavError::InvalidParameter(format!(
                "voxel size must be positive and finite, got {}",
                cell_size
            )));
        }
        Ok(VoxelGrid { cell_size })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn quantize(&self, point: &Point3D) -> Voxel {
        Voxel::new(
            self.quantize_axis(point.x),
            self.quantize_axis(point.y),
            self.quantize_axis(point.z),
        )
    }

    /// Centre of a cell in world coordinates
    pub fn center(&self, voxel: &Voxel) -> Point3D {
        Point3D::new(
            voxel.x as f64 * self.cell_size,
            voxel.y as f64 * self.cell_size,
            voxel.z as f64 * self.cell_size,
        )
    }

    /// Whether every axis of `point` quantizes inside `MAX_CELL_INDEX`
    pub fn in_range(&self, point: &Point3D) -> bool {
        [point.x, point.y, point.z]
            .iter()
            .all(|v| (v / self.cell_size).abs() < MAX_CELL_INDEX)
    }

    /// Snap a point to the centre of its cell
    pub fn snap(&self, point: &Point3D) -> Point3D {
        self.center(&self.quantize(point))
    }

    fn quantize_axis(&self, v: f64) -> i64 {
        (v / self.cell_size).round() as i64
    }
}
