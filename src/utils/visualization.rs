//! Visualization utilities for rust_drone_nav
//!
//! Top-down (x/y) plots of flights using gnuplot. Altitude is dropped and
//! the axes are always drawn at a 1:1 scale.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Point3D, Pose3D};
use crate::mapping::{Voxel, VoxelGrid};

/// Colours for the things a flight plot shows
pub mod colors {
    pub const OCCUPIED: &str = "#000000";
    pub const WALL: &str = "#808080";
    pub const START: &str = "#00FF00";
    pub const GOAL: &str = "#0000FF";
    pub const TRAJECTORY: &str = "#0000FF";
    pub const PATH: &str = "#FF0000";
    pub const VEHICLE: &str = "#00FFFF";
    pub const WAYPOINT: &str = "#808080";
}

#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

/// Builder over a single gnuplot figure
pub struct Visualizer {
    figure: Figure,
    title: String,
}

impl Visualizer {
    pub fn new() -> Self {
        Self { figure: Figure::new(), title: String::new() }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Plot a polyline
    pub fn plot_path(&mut self, path: &[Point3D], style: &PathStyle) -> &mut Self {
        let (x, y) = top_view(path);
        self.figure.axes2d().lines(
            &x,
            &y,
            &[Caption(&style.caption), Color(&style.color), LineWidth(style.line_width)],
        );
        self
    }

    /// Plot occupied voxels at their centres
    pub fn plot_voxels<'a, I>(&mut self, voxels: I, grid: &VoxelGrid) -> &mut Self
    where
        I: IntoIterator<Item = &'a Voxel>,
    {
        let centres: Vec<Point3D> = voxels.into_iter().map(|v| grid.center(v)).collect();
        let style = PointStyle::new(colors::OCCUPIED, "Occupied").with_symbol('S').with_size(0.5);
        self.plot_points(&centres, &style)
    }

    pub fn plot_points(&mut self, points: &[Point3D], style: &PointStyle) -> &mut Self {
        let (x, y) = top_view(points);
        self.figure.axes2d().points(
            &x,
            &y,
            &[
                Caption(&style.caption),
                Color(&style.color),
                PointSymbol(style.symbol),
                PointSize(style.size),
            ],
        );
        self
    }

    /// Vehicle position with a short heading tick
    pub fn plot_vehicle(&mut self, pose: &Pose3D, size: f64) -> &mut Self {
        let p = pose.position;
        let yaw = pose.yaw();
        self.plot_points(&[p], &PointStyle::new(colors::VEHICLE, "Vehicle").with_size(size));

        let tick = size * 0.5;
        self.figure.axes2d().lines(
            &[p.x, p.x + tick * yaw.cos()],
            &[p.y, p.y + tick * yaw.sin()],
            &[Color(colors::VEHICLE), LineWidth(2.0)],
        );
        self
    }

    pub fn plot_start(&mut self, point: Point3D) -> &mut Self {
        self.plot_points(&[point], &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    pub fn plot_goal(&mut self, point: Point3D) -> &mut Self {
        self.plot_points(&[point], &PointStyle::new(colors::GOAL, "Goal").with_size(1.5))
    }

    pub fn show(&mut self) -> Result<(), String> {
        self.apply_settings();
        self.figure.show().map_err(|e| e.to_string()).map(|_| ())
    }

    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> Result<(), String> {
        self.apply_settings();
        self.figure.save_to_png(path, width, height).map_err(|e| e.to_string())
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();
        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("X [m]", &[]);
        axes.set_y_label("Y [m]", &[]);
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

fn top_view(points: &[Point3D]) -> (Vec<f64>, Vec<f64>) {
    points.iter().map(|p| (p.x, p.y)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_view_drops_altitude() {
        let (x, y) = top_view(&[Point3D::new(1.0, 2.0, -5.0), Point3D::new(3.0, 4.0, 0.0)]);
        assert_eq!(x, vec![1.0, 3.0]);
        assert_eq!(y, vec![2.0, 4.0]);
    }

    #[test]
    fn test_point_style() {
        let style = PointStyle::new(colors::OCCUPIED, "Occupied")
            .with_symbol('S')
            .with_size(0.5);
        assert_eq!(style.symbol, 'S');
        assert_eq!(style.size, 0.5);
    }
}
