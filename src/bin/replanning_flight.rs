// Replanning flight around a wall
//
// A simulated multirotor flies to a goal hidden behind a wall it only
// discovers through its range sensor, replanning every control cycle.
//
// Usage: replanning_flight [config.toml]
use std::error::Error;
use std::path::Path;

use log::info;
use rust_drone_nav::aerial_navigation::{move_to_endpoint, NavigationConfig, SimulatedVehicle};
use rust_drone_nav::common::{OccupancyView, Point3D, Pose3D};
use rust_drone_nav::mapping::OccupancyStore;
use rust_drone_nav::utils::{colors, PathStyle, PointStyle, Visualizer};

fn wall(x: f64, half_width: i32, z_range: (i32, i32)) -> Vec<Point3D> {
    let mut points = Vec::new();
    for y in -half_width..=half_width {
        for z in z_range.0..=z_range.1 {
            points.push(Point3D::new(x, y as f64, z as f64));
        }
    }
    points
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    println!("Replanning flight start!!");

    let config = match std::env::args().nth(1) {
        Some(path) => NavigationConfig::from_toml_file(Path::new(&path))?,
        None => NavigationConfig::default(),
    };

    let start = Point3D::new(0.0, 0.0, -5.0);
    let goal = Point3D::new(25.0, 0.0, -5.0);
    let obstacles = wall(12.0, 5, (-9, -1));

    let mut vehicle = SimulatedVehicle::new(Pose3D::from_yaw(start, 0.0))
        .with_obstacles(obstacles)
        .with_sensing_range(15.0);
    let mut store = OccupancyStore::new(config.voxel_size, config.cache_size)?;

    let outcome = move_to_endpoint(&mut vehicle, &mut store, goal, &config)?;
    info!("{:?}", outcome);
    println!(
        "Reached {:.2} m from goal in {} cycles ({} replans, {:.1} s simulated)",
        outcome.final_position.distance(&goal),
        outcome.cycles,
        outcome.replans,
        vehicle.clock().as_secs_f64()
    );

    let mut vis = Visualizer::new();
    vis.set_title("Replanning flight (top view)");
    vis.plot_voxels(store.voxels(), store.grid());
    vis.plot_points(
        vehicle.obstacles(),
        &PointStyle::new(colors::WALL, "Wall").with_symbol('x'),
    );
    vis.plot_path(vehicle.trace(), &PathStyle::new(colors::PATH, "Flown"));
    vis.plot_start(start);
    vis.plot_goal(goal);

    std::fs::create_dir_all("img/aerial_navigation")?;
    vis.save_png("img/aerial_navigation/replanning_flight.png", 800, 600)?;
    println!("Plot saved to: img/aerial_navigation/replanning_flight.png");

    println!("Replanning flight finish!!");
    Ok(())
}
