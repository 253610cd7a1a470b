//! Trajectory handle shared between the planner side and the control loop
//!
//! Replacement is a pointer swap under a write lock held only for the store,
//! so readers always see a complete trajectory, either the old one or the
//! new one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::path_planning::Trajectory;

#[derive(Debug)]
pub struct SharedTrajectory {
    current: RwLock<Arc<Trajectory>>,
    generation: AtomicU64,
}

impl SharedTrajectory {
    pub fn new(trajectory: Trajectory) -> Self {
        SharedTrajectory {
            current: RwLock::new(Arc::new(trajectory)),
            generation: AtomicU64::new(0),
        }
    }

    /// Current trajectory; stays valid even if it is replaced afterwards
    pub fn load(&self) -> Arc<Trajectory> {
        Arc::clone(&self.current.read())
    }

    /// Current trajectory together with its generation
    pub fn load_versioned(&self) -> (Arc<Trajectory>, u64) {
        let guard = self.current.read();
        (Arc::clone(&guard), self.generation.load(Ordering::Acquire))
    }

    /// Publish a new trajectory and return its generation
    pub fn store(&self, trajectory: Trajectory) -> u64 {
        let next = Arc::new(trajectory);
        let mut guard = self.current.write();
        *guard = next;
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Number of replacements since construction
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
