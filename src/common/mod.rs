//! Common types, traits, and error definitions for rust_drone_nav
//!
//! This module provides the foundational building blocks used across
//! the mapping, planning, tracking and coordination modules.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
