//! Replanning control loop for a single navigation leg.
//!
//! Each control cycle ingests sensor returns, collects any finished plan,
//! submits a new one when the planner is idle, and sends one pursuit
//! command. The planner never blocks the loop for longer than one control
//! period; a slow plan only means the vehicle keeps tracking the previous
//! trajectory.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rand::Rng;

use crate::aerial_navigation::config::NavigationConfig;
use crate::aerial_navigation::planner_task::{PlanPoll, PlanRequest, PlannerTask};
use crate::aerial_navigation::shared_trajectory::SharedTrajectory;
use crate::common::{NavError, NavResult, PathPlanner3D, Point3D, VehicleInterface, VelocityCommand};
use crate::mapping::OccupancyStore;
use crate::mission_planning::{generate_target, is_valid_endpoint};
use crate::path_planning::{yaw_towards, Trajectory, VoxelAStarPlanner};
use crate::path_tracking::CarrotPursuit;

/// Where a leg currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegPhase {
    /// No trajectory yet; hovering until the first plan arrives
    PlanningInitial,
    Tracking,
    Terminal,
}

/// Summary of a completed leg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegOutcome {
    pub cycles: usize,
    /// Trajectories accepted after the initial one
    pub replans: usize,
    pub final_position: Point3D,
}

#[derive(Debug, Default)]
struct LegTally {
    cycles: usize,
    replans: usize,
}

pub struct ReplanningCoordinator {
    config: NavigationConfig,
    planner: Arc<dyn PathPlanner3D + Send + Sync>,
    pursuit: CarrotPursuit,
    phase: LegPhase,
    trajectory: Option<Arc<SharedTrajectory>>,
}

impl ReplanningCoordinator {
    /// Coordinator using the visibility-constrained voxel A* planner
    pub fn new(config: NavigationConfig) -> Self {
        let planner = Arc::new(VoxelAStarPlanner::new(config.planner.clone()));
        Self::with_planner(config, planner)
    }

    pub fn with_planner(config: NavigationConfig, planner: Arc<dyn PathPlanner3D + Send + Sync>) -> Self {
        let pursuit = CarrotPursuit::new(config.pursuit);
        ReplanningCoordinator {
            config,
            planner,
            pursuit,
            phase: LegPhase::Terminal,
            trajectory: None,
        }
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn phase(&self) -> LegPhase {
        self.phase
    }

    /// Handle to the trajectory being tracked, once one exists
    pub fn trajectory(&self) -> Option<Arc<SharedTrajectory>> {
        self.trajectory.clone()
    }

    fn set_phase(&mut self, phase: LegPhase) {
        if self.phase != phase {
            info!("leg phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Fly towards `goal`, replanning continuously, until within
    /// `early_stop` of it or at the end of the trajectory.
    ///
    /// Cycles are paced to the configured control period through
    /// [`VehicleInterface::sleep`]. The last command sent always holds
    /// position, whether the leg succeeds or fails.
    pub fn run_leg<V>(
        &mut self,
        vehicle: &mut V,
        store: &mut OccupancyStore,
        goal: Point3D,
        early_stop: Option<f64>,
    ) -> NavResult<LegOutcome>
    where
        V: VehicleInterface + ?Sized,
    {
        let mut task = PlannerTask::spawn(Arc::clone(&self.planner));
        self.trajectory = None;
        self.set_phase(LegPhase::PlanningInitial);

        let mut tally = LegTally::default();
        let result = self.drive(vehicle, store, goal, early_stop, &mut task, &mut tally);
        let finished = self.finish(vehicle, &tally);
        match result {
            Ok(()) => finished,
            Err(e) => {
                if let Err(hover_err) = finished {
                    warn!("could not hold position after '{}': {}", e, hover_err);
                }
                Err(e)
            }
        }
    }

    /// The control cycles of one leg. `Ok` means the leg is done.
    fn drive<V>(
        &mut self,
        vehicle: &mut V,
        store: &mut OccupancyStore,
        goal: Point3D,
        early_stop: Option<f64>,
        task: &mut PlannerTask,
        tally: &mut LegTally,
    ) -> NavResult<()>
    where
        V: VehicleInterface + ?Sized,
    {
        let period = self.config.control_period();
        let mut failures = 0;
        let mut pending_cycles = 0;

        for cycle in 1..=self.config.max_cycles {
            let cycle_start = Instant::now();
            tally.cycles = cycle;

            let pose = vehicle.pose()?;
            let position = pose.position;
            store.add_points(&vehicle.sensor_points()?);

            if let Some(radius) = early_stop {
                if position.distance(&goal) < radius {
                    debug!("within {} m of goal at cycle {}", radius, cycle);
                    return Ok(());
                }
            }

            match task.poll(period) {
                PlanPoll::Ready(Ok(knots)) => {
                    pending_cycles = 0;
                    failures = 0;
                    if knots.len() < 2 {
                        debug!("start and goal share a voxel at cycle {}", cycle);
                        return Ok(());
                    }
                    let trajectory = Trajectory::fit(&knots)?;
                    match &self.trajectory {
                        Some(shared) => {
                            let generation = shared.store(trajectory);
                            tally.replans += 1;
                            debug!("trajectory {} accepted at cycle {}", generation, cycle);
                        }
                        None => {
                            debug!("initial trajectory of {} knots", knots.len());
                            self.trajectory = Some(Arc::new(SharedTrajectory::new(trajectory)));
                            self.set_phase(LegPhase::Tracking);
                        }
                    }
                }
                PlanPoll::Ready(Err(e)) if e.is_recoverable() => {
                    pending_cycles = 0;
                    failures += 1;
                    warn!("planning failed ({}/{}): {}", failures, self.config.max_planning_failures, e);
                    if failures >= self.config.max_planning_failures {
                        return Err(e);
                    }
                }
                PlanPoll::Ready(Err(e)) => return Err(e),
                PlanPoll::Pending => {
                    pending_cycles += 1;
                    if pending_cycles == self.config.slow_plan_cycles {
                        warn!(
                            "plan pending for {} cycles, still tracking previous trajectory",
                            pending_cycles
                        );
                    }
                }
                PlanPoll::Idle => {}
            }

            if !task.is_busy() {
                task.submit(PlanRequest {
                    start: position,
                    goal,
                    snapshot: store.freeze(),
                })?;
            }

            let command = match &self.trajectory {
                Some(shared) => {
                    let trajectory = shared.load();
                    let pursuit = self.pursuit.command(&trajectory, &position)?;
                    if pursuit.at_end {
                        debug!("reached trajectory end at cycle {}", cycle);
                        return Ok(());
                    }
                    pursuit.to_velocity_command()
                }
                None => VelocityCommand::hover(pose.yaw()),
            };
            vehicle.send_velocity(command, period)?;
            vehicle.sleep(period.saturating_sub(cycle_start.elapsed()));
        }

        Err(NavError::LegTimeout { cycles: self.config.max_cycles })
    }

    /// Zero the velocity and close the leg
    fn finish<V>(&mut self, vehicle: &mut V, tally: &LegTally) -> NavResult<LegOutcome>
    where
        V: VehicleInterface + ?Sized,
    {
        self.set_phase(LegPhase::Terminal);
        let pose = vehicle.pose()?;
        vehicle.send_velocity(VelocityCommand::hover(pose.yaw()), self.config.control_period())?;
        let final_position = vehicle.pose()?.position;
        info!(
            "leg finished after {} cycles and {} replans at {:?}",
            tally.cycles, tally.replans, final_position
        );
        Ok(LegOutcome {
            cycles: tally.cycles,
            replans: tally.replans,
            final_position,
        })
    }
}

/// Turn towards `goal`, check it is a usable endpoint, and fly there.
pub fn move_to_endpoint<V>(
    vehicle: &mut V,
    store: &mut OccupancyStore,
    goal: Point3D,
    config: &NavigationConfig,
) -> NavResult<LegOutcome>
where
    V: VehicleInterface + ?Sized,
{
    store.add_points(&vehicle.sensor_points()?);
    let pose = vehicle.pose()?;
    vehicle.rotate_to_yaw(yaw_towards(&goal, &pose.position), config.yaw_timeout())?;

    let pose = vehicle.pose()?;
    is_valid_endpoint(&goal, store, &pose, config.planner.fov_half_angle)?;

    let mut coordinator = ReplanningCoordinator::new(config.clone());
    coordinator.run_leg(vehicle, store, goal, Some(config.endpoint_tolerance))
}

/// Draw a random target ahead of the vehicle and fly to it.
///
/// Targets come from [`generate_target`] with the configured radius and
/// attempt budget. `Ok(None)` means no valid target turned up.
pub fn explore_random_target<V, R>(
    vehicle: &mut V,
    store: &mut OccupancyStore,
    config: &NavigationConfig,
    rng: &mut R,
) -> NavResult<Option<(Point3D, LegOutcome)>>
where
    V: VehicleInterface + ?Sized,
    R: Rng + ?Sized,
{
    store.add_points(&vehicle.sensor_points()?);
    let pose = vehicle.pose()?;
    let target = generate_target(
        &*store,
        &pose,
        config.target_radius,
        config.planner.fov_half_angle,
        config.max_endpoint_attempts,
        rng,
    );
    let target = match target {
        Some(target) => target,
        None => {
            warn!("no exploration target after {} attempts", config.max_endpoint_attempts);
            return Ok(None);
        }
    };
    info!("exploring towards {:?}", target);
    let outcome = move_to_endpoint(vehicle, store, target, config)?;
    Ok(Some((target, outcome)))
}
