//! Error types for rust_drone_nav

use thiserror::Error;

/// Main error type for the navigation core
#[derive(Error, Debug)]
pub enum NavError {
    /// Search exhausted (or hit its expansion bound) without reaching the goal voxel
    #[error("No path found after {expansions} expansions")]
    NoPathFound { expansions: usize },

    /// Goal voxel occupied or not visible from the current pose
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Trajectory evaluated outside [0, 1]
    #[error("Trajectory parameter {t} outside [0, 1]")]
    Domain { t: f64 },

    /// Fewer than two knots, or a zero-length segment in arc-length math
    #[error("Degenerate trajectory: {0}")]
    DegenerateTrajectory(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical computation failed (singular spline system, etc.)
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Vehicle interface rejected or failed a request
    #[error("Vehicle error: {0}")]
    Vehicle(String),

    /// Landmark ring scan reached its radius limit without a hit
    #[error("No landmark found within {radius} cells")]
    NoLandmarkFound { radius: i64 },

    /// A navigation leg ran out of control cycles
    #[error("Leg did not terminate within {cycles} control cycles")]
    LegTimeout { cycles: usize },

    /// Background planner worker is gone
    #[error("Planner worker stopped")]
    PlannerStopped,

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NavError {
    /// Whether the mission layer may handle this by choosing a new goal.
    ///
    /// Everything else signals a broken contract and must not be swallowed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NavError::NoPathFound { .. } | NavError::InvalidEndpoint(_))
    }
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

/// Result type alias for navigation operations
pub type NavResult<T> = Result<T, NavError>;
