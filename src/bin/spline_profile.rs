// Per-axis profile of a planned trajectory
//
// Plans a route with the voxel A* planner around a small obstacle, fits the
// natural cubic spline through it and draws x(t), y(t), z(t) together with
// the knots.
use std::error::Error;

use plotlib::page::Page;
use plotlib::repr::Plot;
use plotlib::style::{LineStyle, PointStyle};
use plotlib::view::ContinuousView;

use rust_drone_nav::common::{PathPlanner3D, Point3D};
use rust_drone_nav::mapping::OccupancyStore;
use rust_drone_nav::path_planning::{Trajectory, VoxelAStarConfig, VoxelAStarPlanner};

fn axis_plot(samples: &[(f64, Point3D)], axis: fn(&Point3D) -> f64, colour: &str) -> Plot {
    let data: Vec<(f64, f64)> = samples.iter().map(|(t, p)| (*t, axis(p))).collect();
    Plot::new(data).line_style(LineStyle::new().colour(colour).width(2.))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut store = OccupancyStore::new(1.0, 10_000)?;
    for y in -2..=2 {
        store.add_point(&Point3D::new(6.0, y as f64, -3.0));
    }

    let planner = VoxelAStarPlanner::new(VoxelAStarConfig::default());
    let start = Point3D::new(0.0, 0.0, -3.0);
    let goal = Point3D::new(12.0, 1.0, -3.0);
    let knots = planner.plan(start, goal, &store)?;
    println!("Planned {} knots", knots.len());

    let trajectory = Trajectory::fit(&knots)?;
    let n = 400;
    let samples: Vec<(f64, Point3D)> = trajectory
        .sample(n)?
        .into_iter()
        .enumerate()
        .map(|(i, p)| (i as f64 / (n - 1) as f64, p))
        .collect();

    let knot_x: Vec<(f64, f64)> = trajectory
        .knot_params()
        .iter()
        .zip(trajectory.knots())
        .map(|(t, k)| (*t, k.x))
        .collect();
    let knot_y: Vec<(f64, f64)> = trajectory
        .knot_params()
        .iter()
        .zip(trajectory.knots())
        .map(|(t, k)| (*t, k.y))
        .collect();

    let v = ContinuousView::new()
        .add(axis_plot(&samples, |p| p.x, "#FF0000"))
        .add(axis_plot(&samples, |p| p.y, "#35C788"))
        .add(axis_plot(&samples, |p| p.z, "#0000FF"))
        .add(Plot::new(knot_x).point_style(PointStyle::new().colour("#000000")))
        .add(Plot::new(knot_y).point_style(PointStyle::new().colour("#000000")))
        .x_range(0., 1.)
        .y_range(-5., 14.)
        .x_label("t")
        .y_label("position [m]");

    std::fs::create_dir_all("img/aerial_navigation")?;
    Page::single(&v)
        .save("img/aerial_navigation/spline_profile.svg")
        .map_err(|e| format!("{:?}", e))?;
    println!("Plot saved to: img/aerial_navigation/spline_profile.svg");
    Ok(())
}
