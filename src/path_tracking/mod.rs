// Path Tracking algorithms module

pub mod carrot_pursuit;

pub use carrot_pursuit::*;
