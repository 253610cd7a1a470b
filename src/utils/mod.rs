//! Utility modules for rust_drone_nav

pub mod lru_set;
pub mod visualization;

pub use lru_set::LruSet;
pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
