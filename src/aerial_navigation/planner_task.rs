//! Background path planning.
//!
//! The control loop must keep issuing commands while a plan is computed, so
//! planning runs on a dedicated worker thread. The loop talks to it only
//! through [`PlannerTask::submit`] and [`PlannerTask::poll`]; at most one
//! request is in flight at a time.
//!
//! ```text
//!   control loop                        worker thread
//!   ───────────                         ─────────────
//!   submit(PlanRequest) ──request──▶  planner.plan(start, goal, snapshot)
//!   poll(timeout)      ◀──result───   send result
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::common::{NavError, NavResult, PathPlanner3D, Point3D};
use crate::mapping::FrozenOccupancy;

/// Everything the worker needs for one plan
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub start: Point3D,
    pub goal: Point3D,
    /// Occupancy frozen at submit time; later sensor updates are not seen
    pub snapshot: FrozenOccupancy,
}

type PlanResult = NavResult<Vec<Point3D>>;

/// Outcome of polling the worker
#[derive(Debug)]
pub enum PlanPoll {
    /// Nothing submitted
    Idle,
    /// A request is still being worked on
    Pending,
    Ready(PlanResult),
}

pub struct PlannerTask {
    request_tx: Option<mpsc::Sender<PlanRequest>>,
    result_rx: mpsc::Receiver<PlanResult>,
    thread_handle: Option<JoinHandle<()>>,
    should_stop: Arc<AtomicBool>,
    submitted_at: Option<Instant>,
}

impl PlannerTask {
    /// Start a worker thread around `planner`
    pub fn spawn(planner: Arc<dyn PathPlanner3D + Send + Sync>) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<PlanRequest>();
        let (result_tx, result_rx) = mpsc::channel::<PlanResult>();
        let should_stop = Arc::new(AtomicBool::new(false));

        let stop = Arc::clone(&should_stop);
        let handle = thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                match request_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(request) => {
                        let result = planner.plan(request.start, request.goal, &request.snapshot);
                        if stop.load(Ordering::SeqCst) {
                            break;
                        }
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            trace!("planner worker exiting");
        });

        PlannerTask {
            request_tx: Some(request_tx),
            result_rx,
            thread_handle: Some(handle),
            should_stop,
            submitted_at: None,
        }
    }

    /// Whether a request is in flight
    pub fn is_busy(&self) -> bool {
        self.submitted_at.is_some()
    }

    /// Time since the in-flight request was submitted
    pub fn pending_for(&self) -> Option<Duration> {
        self.submitted_at.map(|t| t.elapsed())
    }

    /// Hand a request to the worker.
    ///
    /// Returns `Ok(false)` without queuing anything if a request is already
    /// in flight.
    pub fn submit(&mut self, request: PlanRequest) -> NavResult<bool> {
        if self.is_busy() {
            return Ok(false);
        }
        let tx = self.request_tx.as_ref().ok_or(NavError::PlannerStopped)?;
        debug!(
            "submitting plan {:?} -> {:?} over {} voxels",
            request.start,
            request.goal,
            request.snapshot.len()
        );
        tx.send(request).map_err(|_| NavError::PlannerStopped)?;
        self.submitted_at = Some(Instant::now());
        Ok(true)
    }

    /// Wait up to `timeout` for the in-flight request to finish
    pub fn poll(&mut self, timeout: Duration) -> PlanPoll {
        if !self.is_busy() {
            return PlanPoll::Idle;
        }
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.submitted_at = None;
                PlanPoll::Ready(result)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => PlanPoll::Pending,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.submitted_at = None;
                PlanPoll::Ready(Err(NavError::PlannerStopped))
            }
        }
    }

    /// Stop the worker, discarding any in-flight result.
    ///
    /// Blocks until a plan already running on the worker has finished.
    pub fn stop(&mut self) {
        self.should_stop.store(true, Ordering::SeqCst);
        self.request_tx = None;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        self.submitted_at = None;
    }
}

impl Drop for PlannerTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::OccupancyView;
    use crate::mapping::VoxelGrid;
    use crate::path_planning::VoxelAStarPlanner;

    struct SlowPlanner(Duration);

    impl PathPlanner3D for SlowPlanner {
        fn plan(&self, start: Point3D, goal: Point3D, _map: &dyn OccupancyView) -> NavResult<Vec<Point3D>> {
            thread::sleep(self.0);
            Ok(vec![start, goal])
        }
    }

    fn request(goal: Point3D) -> PlanRequest {
        PlanRequest {
            start: Point3D::origin(),
            goal,
            snapshot: FrozenOccupancy::empty(VoxelGrid::new(1.0).unwrap()),
        }
    }

    #[test]
    fn test_idle_until_submitted() {
        let mut task = PlannerTask::spawn(Arc::new(VoxelAStarPlanner::with_defaults()));
        assert!(matches!(task.poll(Duration::ZERO), PlanPoll::Idle));
    }

    #[test]
    fn test_plan_round_trip() {
        let mut task = PlannerTask::spawn(Arc::new(VoxelAStarPlanner::with_defaults()));
        assert!(task.submit(request(Point3D::new(5.0, 0.0, 0.0))).unwrap());
        let path = loop {
            match task.poll(Duration::from_millis(50)) {
                PlanPoll::Ready(result) => break result.unwrap(),
                PlanPoll::Pending => continue,
                PlanPoll::Idle => panic!("request lost"),
            }
        };
        assert_eq!(path.len(), 6);
        assert_eq!(path[5], Point3D::new(5.0, 0.0, 0.0));
        assert!(!task.is_busy());
    }

    #[test]
    fn test_one_request_in_flight() {
        let mut task = PlannerTask::spawn(Arc::new(SlowPlanner(Duration::from_millis(200))));
        assert!(task.submit(request(Point3D::new(1.0, 0.0, 0.0))).unwrap());
        assert!(!task.submit(request(Point3D::new(2.0, 0.0, 0.0))).unwrap());
        assert!(matches!(task.poll(Duration::from_millis(1)), PlanPoll::Pending));

        match task.poll(Duration::from_secs(5)) {
            PlanPoll::Ready(Ok(path)) => assert_eq!(path[1], Point3D::new(1.0, 0.0, 0.0)),
            other => panic!("unexpected poll result {:?}", other),
        }
        assert!(matches!(task.poll(Duration::ZERO), PlanPoll::Idle));
    }

    #[test]
    fn test_stop_discards_in_flight_plan() {
        let mut task = PlannerTask::spawn(Arc::new(SlowPlanner(Duration::from_millis(50))));
        task.submit(request(Point3D::new(1.0, 0.0, 0.0))).unwrap();
        task.stop();
        assert!(matches!(task.poll(Duration::ZERO), PlanPoll::Idle));
        assert!(matches!(
            task.submit(request(Point3D::new(1.0, 0.0, 0.0))),
            Err(NavError::PlannerStopped)
        ));
    }
}
