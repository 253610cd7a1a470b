//! Landmark ("blaze") selection for hiking missions
//!
//! A blaze is an occupied voxel, typically a tree trunk, that the vehicle
//! can navigate towards. Blazes are found by scanning square rings of
//! growing radius around the previous blaze, within an altitude band, for
//! occupied voxels that are not too close to any blaze already chosen.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, OccupancyView, Point3D};
use crate::mapping::Voxel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlazeConfig {
    /// Number of blazes to chain
    pub count: usize,
    /// Altitude band [m], lower bound inclusive, upper bound exclusive
    pub z_limit: (f64, f64),
    /// Minimum spacing between any two blazes [m]
    pub min_distance: f64,
    /// Ring radius the scan starts at [cells]
    pub min_radius: i64,
    /// Ring radius at which the scan gives up [cells]
    pub max_search_radius: i64,
}

impl Default for BlazeConfig {
    fn default() -> Self {
        BlazeConfig {
            count: 2,
            z_limit: (-10.0, -5.0),
            min_distance: 10.0,
            min_radius: 5,
            max_search_radius: 1000,
        }
    }
}

const CORNERS: [(i64, i64); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];
const TANGENTS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// First acceptable occupied voxel on the ring of radius `k` around
/// `center`, scanning altitude cells from the top of the band down.
fn check_band(
    map: &dyn OccupancyView,
    center: &Voxel,
    k: i64,
    z_cells: (i64, i64),
    blazes: &[Voxel],
    min_cells: f64,
) -> Option<Voxel> {
    for z in (z_cells.0..z_cells.1).rev() {
        for (&(cx, cy), &(tx, ty)) in CORNERS.iter().zip(TANGENTS.iter()) {
            for i in 0..2 * k {
                let voxel = Voxel::new(center.x + cx * k + i * tx, center.y + cy * k + i * ty, z);
                if map.is_occupied(&voxel) && blazes.iter().all(|b| b.distance(&voxel) >= min_cells) {
                    return Some(voxel);
                }
            }
        }
    }
    None
}

/// Chain `config.count` blazes starting from `start`.
///
/// Each blaze is searched for around the previous one (the first around
/// `start`). Fails with `NoLandmarkFound` when a ring scan reaches
/// `max_search_radius` without a hit.
pub fn generate_blazes(map: &dyn OccupancyView, start: &Point3D, config: &BlazeConfig) -> NavResult<Vec<Voxel>> {
    let (z_lo, z_hi) = config.z_limit;
    if !(z_lo < z_hi) {
        return Err(NavError::InvalidParameter(format!(
            "blaze altitude band must be increasing, got {:?}",
            config.z_limit
        )));
    }
    if config.min_radius < 1 {
        return Err(NavError::InvalidParameter(format!(
            "blaze ring radius must start at 1 or more, got {}",
            config.min_radius
        )));
    }

    let grid = map.grid();
    let z_cells = (
        grid.quantize(&Point3D::new(0.0, 0.0, z_lo)).z,
        grid.quantize(&Point3D::new(0.0, 0.0, z_hi)).z,
    );
    let min_cells = config.min_distance / grid.cell_size();

    let mut blazes: Vec<Voxel> = Vec::with_capacity(config.count);
    let mut center = grid.quantize(start);
    for n in 0..config.count {
        let found = (config.min_radius..config.max_search_radius)
            .find_map(|k| check_band(map, &center, k, z_cells, &blazes, min_cells));
        match found {
            Some(blaze) => {
                debug!("blaze {} at {:?}", n, blaze);
                blazes.push(blaze);
                center = blaze;
            }
            None => {
                return Err(NavError::NoLandmarkFound { radius: config.max_search_radius });
            }
        }
    }
    Ok(blazes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::OccupancyStore;

    fn forest(trees: &[Point3D]) -> OccupancyStore {
        let mut store = OccupancyStore::new(1.0, 10_000).unwrap();
        for t in trees {
            store.add_point(t);
        }
        store
    }

    fn config(count: usize) -> BlazeConfig {
        BlazeConfig { count, max_search_radius: 40, ..Default::default() }
    }

    #[test]
    fn test_first_blaze_on_nearest_ring() {
        let store = forest(&[Point3D::new(8.0, 0.0, -7.0)]);
        let blazes = generate_blazes(&store, &Point3D::new(0.0, 0.0, -7.0), &config(1)).unwrap();
        // Tree thickened to x 7..=9; the ring of radius 7 reaches it first,
        // on the top altitude cell of the band.
        assert_eq!(blazes, vec![Voxel::new(7, -1, -6)]);
    }

    #[test]
    fn test_blazes_chain_and_keep_their_distance() {
        let store = forest(&[Point3D::new(8.0, 0.0, -7.0), Point3D::new(8.0, 20.0, -7.0)]);
        let blazes = generate_blazes(&store, &Point3D::new(0.0, 0.0, -7.0), &config(2)).unwrap();
        assert_eq!(blazes.len(), 2);
        assert_eq!(blazes[0], Voxel::new(7, -1, -6));
        assert_eq!(blazes[1], Voxel::new(9, 19, -6));
        assert!(blazes[0].distance(&blazes[1]) >= 10.0);
    }

    #[test]
    fn test_single_tree_cannot_host_two_blazes() {
        let store = forest(&[Point3D::new(8.0, 0.0, -7.0)]);
        let result = generate_blazes(&store, &Point3D::new(0.0, 0.0, -7.0), &config(2));
        assert!(matches!(result, Err(NavError::NoLandmarkFound { radius: 40 })));
    }

    #[test]
    fn test_trees_outside_altitude_band_ignored() {
        let store = forest(&[Point3D::new(8.0, 0.0, -20.0)]);
        let result = generate_blazes(&store, &Point3D::new(0.0, 0.0, -7.0), &config(1));
        assert!(matches!(result, Err(NavError::NoLandmarkFound { .. })));
    }

    #[test]
    fn test_zero_blazes_and_bad_band() {
        let store = forest(&[]);
        assert!(generate_blazes(&store, &Point3D::origin(), &config(0)).unwrap().is_empty());

        let inverted = BlazeConfig { z_limit: (-5.0, -10.0), ..config(1) };
        assert!(matches!(
            generate_blazes(&store, &Point3D::origin(), &inverted),
            Err(NavError::InvalidParameter(_))
        ));
    }
}
