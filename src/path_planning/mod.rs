// Path Planning algorithms module

pub mod visibility;
pub mod voxel_a_star;
pub mod cubic_spline;
pub mod random_walk;

pub use visibility::*;
pub use voxel_a_star::*;
pub use cubic_spline::*;
pub use random_walk::*;
