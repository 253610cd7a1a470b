//! Random Walk Following Example
//!
//! Generates a momentum-smoothed random walk, fits a spline through it and
//! follows it with the carrot pursuit controller on a simulated vehicle.
//! Afterwards an exploration target ahead of the vehicle is drawn.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use rust_drone_nav::aerial_navigation::{NavigationConfig, SimulatedVehicle};
use rust_drone_nav::common::{polyline_length, NavError, Point3D, Pose3D, VehicleInterface};
use rust_drone_nav::mapping::OccupancyStore;
use rust_drone_nav::mission_planning::generate_target;
use rust_drone_nav::path_planning::{random_walk, RandomWalkConfig, Trajectory};
use rust_drone_nav::path_tracking::CarrotPursuit;
use rust_drone_nav::utils::{colors, PathStyle, PointStyle, Visualizer};

fn main() -> Result<(), NavError> {
    env_logger::init();
    println!("Random walk following start!!");

    let config = NavigationConfig::default();
    let mut rng = StdRng::seed_from_u64(2024);
    let start = Point3D::new(0.0, 0.0, -10.0);
    let walk_config = RandomWalkConfig { path_length: 60, ..Default::default() };
    let walk = random_walk(start, &walk_config, None, &mut rng)?;
    println!("Random walk of {} points, {:.1} m long", walk.len(), polyline_length(&walk));

    let trajectory = Arc::new(Trajectory::fit(&walk)?);
    let mut pursuit = CarrotPursuit::new(config.pursuit);
    let mut vehicle = SimulatedVehicle::new(Pose3D::from_yaw(start, 0.0));
    let period = config.control_period();

    let mut cycles = 0;
    let mut max_error: f64 = 0.0;
    while cycles < 20_000 {
        let position = vehicle.pose()?.position;
        let command = pursuit.command(&trajectory, &position)?;
        if command.at_end {
            break;
        }
        let nearest = trajectory.evaluate(trajectory.project(&position))?;
        max_error = max_error.max(nearest.distance(&position));
        vehicle.send_velocity(command.to_velocity_command(), period)?;
        cycles += 1;
    }
    println!(
        "Followed in {} cycles, final error {:.2} m, max cross-track error {:.2} m",
        cycles,
        vehicle.position().distance(&trajectory.end()),
        max_error
    );

    let store = OccupancyStore::new(config.voxel_size, config.cache_size)?;
    let pose = vehicle.pose()?;
    let target = generate_target(
        &store,
        &pose,
        config.target_radius,
        config.planner.fov_half_angle,
        config.max_endpoint_attempts,
        &mut rng,
    );
    match target {
        Some(target) => println!("Next exploration target: {:?}", target),
        None => println!("No exploration target found"),
    }

    let mut vis = Visualizer::new();
    vis.set_title("Random walk following (top view)");
    vis.plot_points(&walk, &PointStyle::new(colors::WAYPOINT, "Walk").with_size(0.5));
    vis.plot_path(&trajectory.sample(500)?, &PathStyle::new(colors::TRAJECTORY, "Spline").with_line_width(1.0));
    vis.plot_path(vehicle.trace(), &PathStyle::new(colors::PATH, "Flown"));
    vis.plot_vehicle(&pose, 1.0);
    vis.plot_start(start);

    if let Err(e) = vis.save_png("img/aerial_navigation/random_walk_follow.png", 800, 600) {
        println!("Could not save plot: {}", e);
    }
    let _ = vis.show();

    println!("Random walk following finish!!");
    Ok(())
}
