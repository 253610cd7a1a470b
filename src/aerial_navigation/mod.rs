// Aerial navigation: replanning flight legs over a live occupancy map

pub mod config;
pub mod vehicle;
pub mod shared_trajectory;
pub mod planner_task;
pub mod coordinator;

pub use config::*;
pub use vehicle::*;
pub use shared_trajectory::*;
pub use planner_task::*;
pub use coordinator::*;
