// Natural cubic spline trajectory
//
// Based on the cubic spline planner of PythonRobotics / CppRobotics:
// https://github.com/AtsushiSakai/PythonRobotics/tree/master/PathPlanning/CubicSpline
//
// Each axis of the route is interpolated independently against a shared
// parameter t in [0, 1], with knots spaced uniformly in t.

extern crate nalgebra as na;

use na::Vector3;

use crate::common::{NavError, NavResult, Point3D};

/// Number of uniform samples used by [`Trajectory::project`]
pub const PROJECTION_SAMPLES: usize = 1000;

/// One-dimensional natural cubic spline
///
/// On segment i, `y(t) = a_i + b_i dx + c_i dx^2 + d_i dx^3` with
/// `dx = t - x_i`. Natural boundary: second derivative zero at both ends.
#[derive(Debug, Clone)]
pub struct CubicSpline1D {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    x: Vec<f64>,
}

impl CubicSpline1D {
    /// Fit through `(x_i, y_i)`; `x` must be strictly increasing
    pub fn new(x: &[f64], y: &[f64]) -> NavResult<Self> {
        let nx = x.len();
        if nx < 2 || y.len() != nx {
            return Err(NavError::DegenerateTrajectory(format!(
                "spline needs at least 2 matching samples, got {} x and {} y",
                nx,
                y.len()
            )));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        if h.iter().any(|&hi| !(hi > 0.0)) {
            return Err(NavError::InvalidParameter(
                "spline parameters must be strictly increasing".to_string(),
            ));
        }

        let a = y.to_vec();
        let a_mat = Self::calc_a(&h);
        let b_mat = Self::calc_b(&h, &a);
        let c_na = a_mat
            .lu()
            .solve(&b_mat)
            .ok_or_else(|| NavError::NumericalError("singular spline system".to_string()))?;
        let c: Vec<f64> = c_na.iter().copied().collect();

        let mut b = Vec::with_capacity(nx - 1);
        let mut d = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3.0 * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(CubicSpline1D { a, b, c, d, x: x.to_vec() })
    }

    /// Value at `t`; `t` is clamped onto the first/last segment
    pub fn calc(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    /// First derivative at `t`
    pub fn calc_d(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.b[i] + 2.0 * self.c[i] * dx + 3.0 * self.d[i] * dx.powi(2)
    }

    /// Second derivative at `t`
    pub fn calc_dd(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        2.0 * self.c[i] + 6.0 * self.d[i] * dx
    }

    /// Segment whose start is the largest knot <= t
    fn search_index(&self, t: f64) -> usize {
        let last_segment = self.x.len() - 2;
        self.x.partition_point(|&xi| xi <= t).saturating_sub(1).min(last_segment)
    }

    fn calc_a(h: &[f64]) -> na::DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = na::DMatrix::zeros(nx, nx);
        a[(0, 0)] = 1.0;
        for i in 1..nx - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
        }
        a[(nx - 1, nx - 1)] = 1.0;
        a
    }

    fn calc_b(h: &[f64], a: &[f64]) -> na::DVector<f64> {
        let nx = h.len() + 1;
        let mut b = na::DVector::zeros(nx);
        for i in 1..nx - 1 {
            b[i] = 3.0 * (a[i + 1] - a[i]) / h[i] - 3.0 * (a[i] - a[i - 1]) / h[i - 1];
        }
        b
    }
}

/// Smooth 3D route through uniformly parametrized knots
///
/// Immutable once fitted: replanning builds a new value.
#[derive(Debug, Clone)]
pub struct Trajectory {
    knots: Vec<Point3D>,
    params: Vec<f64>,
    sx: CubicSpline1D,
    sy: CubicSpline1D,
    sz: CubicSpline1D,
}

impl Trajectory {
    pub fn fit(knots: &[Point3D]) -> NavResult<Self> {
        let n = knots.len();
        if n < 2 {
            return Err(NavError::DegenerateTrajectory(format!(
                "need at least 2 knots, got {}",
                n
            )));
        }
        if knots.iter().any(|k| !k.is_finite()) {
            return Err(NavError::InvalidParameter("non-finite knot".to_string()));
        }

        let params: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
        let xs: Vec<f64> = knots.iter().map(|k| k.x).collect();
        let ys: Vec<f64> = knots.iter().map(|k| k.y).collect();
        let zs: Vec<f64> = knots.iter().map(|k| k.z).collect();

        Ok(Trajectory {
            sx: CubicSpline1D::new(&params, &xs)?,
            sy: CubicSpline1D::new(&params, &ys)?,
            sz: CubicSpline1D::new(&params, &zs)?,
            knots: knots.to_vec(),
            params,
        })
    }

    /// Point on the curve at `t` in [0, 1]
    pub fn evaluate(&self, t: f64) -> NavResult<Point3D> {
        check_domain(t)?;
        Ok(Point3D::new(self.sx.calc(t), self.sy.calc(t), self.sz.calc(t)))
    }

    /// Tangent dP/dt at `t` in [0, 1]
    pub fn derivative(&self, t: f64) -> NavResult<Vector3<f64>> {
        check_domain(t)?;
        Ok(Vector3::new(self.sx.calc_d(t), self.sy.calc_d(t), self.sz.calc_d(t)))
    }

    /// Second derivative d2P/dt2 at `t` in [0, 1]
    pub fn second_derivative(&self, t: f64) -> NavResult<Vector3<f64>> {
        check_domain(t)?;
        Ok(Vector3::new(self.sx.calc_dd(t), self.sy.calc_dd(t), self.sz.calc_dd(t)))
    }

    /// `n` points at uniform parameter spacing, both ends included
    pub fn sample(&self, n: usize) -> NavResult<Vec<Point3D>> {
        if n < 2 {
            return Err(NavError::InvalidParameter(format!(
                "need at least 2 samples, got {}",
                n
            )));
        }
        (0..n)
            .map(|i| self.evaluate(i as f64 / (n - 1) as f64))
            .collect()
    }

    /// Approximate nearest parameter to `point`.
    ///
    /// Arg-min over [`PROJECTION_SAMPLES`] uniform samples, not an exact
    /// projection.
    pub fn project(&self, point: &Point3D) -> f64 {
        let n = PROJECTION_SAMPLES;
        let mut best_t = 0.0;
        let mut best_d = f64::INFINITY;
        for i in 0..n {
            let t = i as f64 / (n - 1) as f64;
            let p = Point3D::new(self.sx.calc(t), self.sy.calc(t), self.sz.calc(t));
            let d = p.distance(point);
            if d < best_d {
                best_d = d;
                best_t = t;
            }
        }
        best_t
    }

    pub fn knots(&self) -> &[Point3D] {
        &self.knots
    }

    /// Parameter assigned to each knot
    pub fn knot_params(&self) -> &[f64] {
        &self.params
    }

    pub fn start(&self) -> Point3D {
        self.knots[0]
    }

    /// Final knot (the route's goal)
    pub fn end(&self) -> Point3D {
        self.knots[self.knots.len() - 1]
    }
}

fn check_domain(t: f64) -> NavResult<()> {
    if (0.0..=1.0).contains(&t) {
        Ok(())
    } else {
        Err(NavError::Domain { t })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn zigzag() -> Vec<Point3D> {
        vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(10.0, -6.0, 1.0),
            Point3D::new(20.5, 5.0, 2.0),
            Point3D::new(30.0, 6.5, 2.0),
            Point3D::new(40.5, 0.0, -1.0),
            Point3D::new(50.0, -4.0, 0.0),
        ]
    }

    #[test]
    fn test_spline_passes_through_knots() {
        let knots = zigzag();
        let traj = Trajectory::fit(&knots).unwrap();
        for (k, &t) in knots.iter().zip(traj.knot_params()) {
            let p = traj.evaluate(t).unwrap();
            assert_relative_eq!(p.x, k.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, k.y, epsilon = 1e-9);
            assert_relative_eq!(p.z, k.z, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_two_knots_is_a_line() {
        let a = Point3D::new(0.0, 0.0, 0.0);
        let b = Point3D::new(10.0, 0.0, 0.0);
        let traj = Trajectory::fit(&[a, b]).unwrap();
        let mid = traj.evaluate(0.25).unwrap();
        assert_relative_eq!(mid.x, 2.5, epsilon = 1e-12);
        assert_relative_eq!(mid.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_continuity_at_interior_knots() {
        let traj = Trajectory::fit(&zigzag()).unwrap();
        let eps = 1e-9;
        for &t in &traj.knot_params()[1..traj.knot_params().len() - 1] {
            let left = traj.evaluate(t - eps).unwrap();
            let right = traj.evaluate(t + eps).unwrap();
            assert!(left.distance(&right) < 1e-6);

            let dl = traj.derivative(t - eps).unwrap();
            let dr = traj.derivative(t + eps).unwrap();
            assert!((dl - dr).norm() < 1e-4);

            let ddl = traj.second_derivative(t - eps).unwrap();
            let ddr = traj.second_derivative(t + eps).unwrap();
            assert!((ddl - ddr).norm() < 1e-2 * (1.0 + ddl.norm()));
        }
    }

    #[test]
    fn test_natural_boundary_conditions() {
        let traj = Trajectory::fit(&zigzag()).unwrap();
        assert!(traj.second_derivative(0.0).unwrap().norm() < 1e-9);
        assert!(traj.second_derivative(1.0).unwrap().norm() < 1e-6);
    }

    #[test]
    fn test_evaluate_outside_domain() {
        let traj = Trajectory::fit(&zigzag()).unwrap();
        assert!(matches!(traj.evaluate(-0.01), Err(NavError::Domain { .. })));
        assert!(matches!(traj.evaluate(1.01), Err(NavError::Domain { .. })));
        assert!(matches!(traj.evaluate(f64::NAN), Err(NavError::Domain { .. })));
        assert!(traj.evaluate(0.0).is_ok());
        assert!(traj.evaluate(1.0).is_ok());
    }

    #[test]
    fn test_too_few_knots() {
        assert!(matches!(
            Trajectory::fit(&[Point3D::origin()]),
            Err(NavError::DegenerateTrajectory(_))
        ));
        assert!(matches!(Trajectory::fit(&[]), Err(NavError::DegenerateTrajectory(_))));
    }

    #[test]
    fn test_project_finds_nearest_parameter() {
        let knots: Vec<Point3D> = (0..=10).map(|i| Point3D::new(i as f64, 0.0, 0.0)).collect();
        let traj = Trajectory::fit(&knots).unwrap();
        let t = traj.project(&Point3D::new(3.0, 2.0, 0.0));
        assert_relative_eq!(t, 0.3, epsilon = 2e-3);
        assert_eq!(traj.project(&Point3D::new(-5.0, 0.0, 0.0)), 0.0);
        assert_eq!(traj.project(&Point3D::new(50.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_sample_endpoints() {
        let knots = zigzag();
        let traj = Trajectory::fit(&knots).unwrap();
        let samples = traj.sample(100).unwrap();
        assert_eq!(samples.len(), 100);
        assert!(samples[0].distance(&knots[0]) < 1e-9);
        assert!(samples[99].distance(&knots[5]) < 1e-9);
        assert!(traj.sample(1).is_err());
    }

    #[test]
    fn test_spline_1d_rejects_unsorted() {
        assert!(CubicSpline1D::new(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
    }
}
