//! Natural cubic spline through tabulated device curves.
//!
//! Photovoltaic open-circuit voltage and fill factor are published as a few
//! points against short-circuit current density. A natural cubic spline
//! gives a smooth curve through them with zero curvature at both ends.

use crate::provider::MaterialError;

#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots.
    curvature: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural spline through `(x, y)` knots sorted by `x`.
    ///
    /// # Errors
    ///
    /// [`MaterialError::DataError`] for fewer than two knots, mismatched
    /// lengths, or `xs` not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, MaterialError> {
        if xs.len() != ys.len() {
            return Err(MaterialError::DataError(format!(
                "spline has {} abscissae but {} ordinates",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(MaterialError::DataError(
                "spline needs at least two knots".into(),
            ));
        }
        if let Some(i) = (1..xs.len()).find(|&i| !(xs[i] > xs[i - 1])) {
            return Err(MaterialError::DataError(format!(
                "spline knots must be strictly increasing (index {i})"
            )));
        }

        let n = xs.len();
        let mut curvature = vec![0.0; n];
        let mut rhs = vec![0.0; n];

        // Tridiagonal elimination with natural end conditions.
        for i in 1..n - 1 {
            let span = xs[i + 1] - xs[i - 1];
            let sig = (xs[i] - xs[i - 1]) / span;
            let pivot = sig * curvature[i - 1] + 2.0;
            curvature[i] = (sig - 1.0) / pivot;
            let slope_jump =
                (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]) - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            rhs[i] = (6.0 * slope_jump / span - sig * rhs[i - 1]) / pivot;
        }
        curvature[n - 1] = 0.0;
        for k in (1..n - 1).rev() {
            curvature[k] = curvature[k] * curvature[k + 1] + rhs[k];
        }

        Ok(Self { xs, ys, curvature })
    }

    /// Spline with the same value everywhere.
    pub fn constant(value: f64) -> Self {
        Self {
            xs: vec![0.0, 1.0],
            ys: vec![value, value],
            curvature: vec![0.0, 0.0],
        }
    }

    /// Value at `x`; outside the knots the end polynomials are extended.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let hi = self.xs.partition_point(|&k| k <= x).clamp(1, n - 1);
        let lo = hi - 1;

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = 1.0 - a;
        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a.powi(3) - a) * self.curvature[lo] + (b.powi(3) - b) * self.curvature[hi]) * h * h
                / 6.0
    }

    /// Value at `x` with `x` held inside the knot range.
    pub fn evaluate_clamped(&self, x: f64) -> f64 {
        let (first, last) = (self.xs[0], self.xs[self.xs.len() - 1]);
        self.evaluate(x.clamp(first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_spline_passes_through_knots() {
        let xs = vec![0.0, 50.0, 100.0, 200.0, 400.0];
        let ys = vec![0.50, 0.58, 0.61, 0.63, 0.65];
        let spline = CubicSpline::new(xs.clone(), ys.clone()).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            assert_abs_diff_eq!(spline.evaluate(*x), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_data_stays_linear() {
        let spline = CubicSpline::new(vec![1.0, 2.0, 4.0], vec![3.0, 5.0, 9.0]).unwrap();
        assert_abs_diff_eq!(spline.evaluate(3.0), 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(spline.evaluate_clamped(10.0), 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(spline.evaluate_clamped(-1.0), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_knots() {
        assert!(CubicSpline::new(vec![1.0], vec![1.0]).is_err());
        assert!(CubicSpline::new(vec![1.0, 1.0], vec![1.0, 2.0]).is_err());
        assert!(CubicSpline::new(vec![1.0, 2.0], vec![1.0]).is_err());
    }
}
