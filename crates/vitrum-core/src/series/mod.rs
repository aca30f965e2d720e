//! Wavelength-indexed value algebra.
//!
//! A [`Series`] is a sorted mapping $\lambda \mapsto y$ with unique keys. It is
//! the currency used to carry per-wavelength quantities (spectra, per-band
//! layer properties, spectrally weighted matrix cells) through
//! interpolation, weighting and integration.
//!
//! Integration produces a *cumulative* series $C(\lambda_i) = \int_{\lambda_0}^{\lambda_i} y\,d\lambda$.
//! A ranged sum over $[a, b]$ adds every whole interval
//! $[\lambda_k, \lambda_{k+1}]$ whose left knot lies in $[a, b)$:
//!
//! $$\sum_{a \le \lambda_k < b} \left(C(\lambda_{k+1}) - C(\lambda_k)\right)$$
//!
//! so a bound falling between knots includes or drops the interval it cuts
//! according to where that interval starts.
//!
//! The slice kernels in this module are shared with
//! [`MatrixSeries`](matrix::MatrixSeries), whose cells all live on one grid.

pub mod matrix;
pub mod wavelengths;

use serde::Serialize;

use crate::error::OpticsError;
use crate::types::IntegrationRule;

pub use matrix::MatrixSeries;
pub use wavelengths::{common_wavelengths, merge_grids, overlap};

/// Sorted, duplicate-free spectral series.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Series {
    wavelengths: Vec<f64>,
    values: Vec<f64>,
}

impl Series {
    /// Build a series from `(wavelength, value)` pairs in any order.
    ///
    /// # Errors
    ///
    /// [`OpticsError::InvalidSeries`] on a duplicated wavelength or a
    /// non-finite wavelength or value.
    pub fn new<I>(samples: I) -> Result<Self, OpticsError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut pairs: Vec<(f64, f64)> = samples.into_iter().collect();
        if let Some((x, y)) = pairs.iter().find(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(OpticsError::InvalidSeries(format!(
                "non-finite sample ({x}, {y})"
            )));
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(w) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(OpticsError::InvalidSeries(format!(
                "duplicate wavelength {}",
                w[0].0
            )));
        }
        let (wavelengths, values) = pairs.into_iter().unzip();
        Ok(Self {
            wavelengths,
            values,
        })
    }

    /// Build from a grid that is already known to be strictly ascending.
    pub(crate) fn from_sorted(wavelengths: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(wavelengths.len(), values.len());
        debug_assert!(wavelengths.windows(2).all(|w| w[0] < w[1]));
        Self {
            wavelengths,
            values,
        }
    }

    /// A series holding the same value at every point of `grid`.
    pub fn constant(grid: &[f64], value: f64) -> Result<Self, OpticsError> {
        Self::new(grid.iter().map(|&x| (x, value)))
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths.iter().copied().zip(self.values.iter().copied())
    }

    pub fn min_wavelength(&self) -> Option<f64> {
        self.wavelengths.first().copied()
    }

    pub fn max_wavelength(&self) -> Option<f64> {
        self.wavelengths.last().copied()
    }

    /// Linearly interpolated value at `wavelength`, holding the boundary
    /// samples outside the domain. An empty series evaluates to zero.
    pub fn value_at(&self, wavelength: f64) -> f64 {
        interpolate_at(&self.wavelengths, &self.values, wavelength)
    }

    /// Resample onto `grid` (any order, unique points).
    pub fn interpolate(&self, grid: &[f64]) -> Result<Series, OpticsError> {
        Series::new(grid.iter().map(|&x| (x, self.value_at(x))))
    }

    /// Elementwise product on the union of both wavelength grids.
    pub fn multiply(&self, other: &Series) -> Series {
        if self.is_empty() || other.is_empty() {
            return Series::default();
        }
        let grid = merge_grids(&[&self.wavelengths, &other.wavelengths]);
        let values = grid
            .iter()
            .map(|&x| self.value_at(x) * other.value_at(x))
            .collect();
        Series::from_sorted(grid, values)
    }

    /// Multiply every value by `factor`.
    pub fn scale(&self, factor: f64) -> Series {
        self.map(|y| y * factor)
    }

    /// Apply `f` to every value, keeping the grid.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Series {
        Series::from_sorted(
            self.wavelengths.clone(),
            self.values.iter().map(|&y| f(y)).collect(),
        )
    }

    /// Cumulative integral of the series, divided by `normalization`.
    ///
    /// The first point of the result is always zero.
    ///
    /// # Errors
    ///
    /// [`OpticsError::InvalidSeries`] if `normalization` is zero or not finite.
    pub fn integrate(
        &self,
        rule: IntegrationRule,
        normalization: f64,
    ) -> Result<Series, OpticsError> {
        check_normalization(normalization)?;
        let cumulative = cumulative_integral(&self.wavelengths, &self.values, rule, normalization);
        Ok(Series::from_sorted(self.wavelengths.clone(), cumulative))
    }

    /// Integral over `[min, max]` read from a cumulative series produced by
    /// [`integrate`](Self::integrate): the sum of every interval whose left
    /// knot lies in `[min, max)`.
    pub fn sum(&self, min: f64, max: f64) -> f64 {
        ranged_sum(&self.wavelengths, &self.values, min, max)
    }

    /// Integral of the whole series under `rule`.
    pub fn total(&self, rule: IntegrationRule) -> f64 {
        cumulative_integral(&self.wavelengths, &self.values, rule, 1.0)
            .last()
            .copied()
            .unwrap_or(0.0)
    }
}

pub(crate) fn check_normalization(normalization: f64) -> Result<(), OpticsError> {
    if normalization == 0.0 || !normalization.is_finite() {
        return Err(OpticsError::InvalidSeries(format!(
            "invalid normalization coefficient {normalization}"
        )));
    }
    Ok(())
}

/// Piecewise-linear interpolation on an ascending grid with boundary hold.
pub(crate) fn interpolate_at(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let (Some(&first), Some(&last)) = (xs.first(), xs.last()) else {
        return 0.0;
    };
    if x <= first {
        return ys[0];
    }
    if x >= last {
        return ys[ys.len() - 1];
    }
    let k = xs.partition_point(|&v| v <= x);
    let (x0, x1) = (xs[k - 1], xs[k]);
    let (y0, y1) = (ys[k - 1], ys[k]);
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}

/// Running integral of `ys` over `xs`.
pub(crate) fn cumulative_integral(
    xs: &[f64],
    ys: &[f64],
    rule: IntegrationRule,
    normalization: f64,
) -> Vec<f64> {
    let mut out = Vec::with_capacity(xs.len());
    let mut acc = 0.0;
    if !xs.is_empty() {
        out.push(0.0);
    }
    for k in 1..xs.len() {
        let dx = xs[k] - xs[k - 1];
        acc += match rule {
            IntegrationRule::Trapezoidal => dx * (ys[k] + ys[k - 1]) / 2.0,
            IntegrationRule::Rectangular => dx * ys[k - 1],
            IntegrationRule::PreWeighted => ys[k - 1],
        };
        out.push(acc / normalization);
    }
    out
}

/// Slack allowed when deciding whether a knot lies inside a range.
const RANGE_TOLERANCE: f64 = 1e-9;

/// Sum of the intervals of a cumulative grid whose left knot lies in
/// `[min, max)`.
pub(crate) fn ranged_sum(xs: &[f64], cumulative: &[f64], min: f64, max: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let last_left = xs.len() - 2;
    let first = xs.partition_point(|&x| x < min - RANGE_TOLERANCE);
    let end = xs.partition_point(|&x| x < max - RANGE_TOLERANCE);
    if first >= end || first > last_left {
        return 0.0;
    }
    let last = (end - 1).min(last_left);
    cumulative[last + 1] - cumulative[first]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp() -> Series {
        Series::new(vec![(0.5, 2.0), (0.3, 1.0), (0.4, 1.5), (0.7, 3.0)]).unwrap()
    }

    #[test]
    fn test_new_sorts_samples() {
        let s = ramp();
        assert_eq!(s.wavelengths(), &[0.3, 0.4, 0.5, 0.7]);
        assert_eq!(s.values(), &[1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn test_duplicate_wavelength_rejected() {
        let result = Series::new(vec![(0.3, 1.0), (0.4, 2.0), (0.3, 5.0)]);
        assert!(matches!(result, Err(OpticsError::InvalidSeries(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let result = Series::new(vec![(0.3, f64::NAN)]);
        assert!(matches!(result, Err(OpticsError::InvalidSeries(_))));
    }

    #[test]
    fn test_interpolate_onto_own_grid_is_exact() {
        let s = ramp();
        let same = s.interpolate(s.wavelengths()).unwrap();
        assert_eq!(same, s);
    }

    #[test]
    fn test_interpolation_holds_boundaries() {
        let s = ramp();
        assert_eq!(s.value_at(0.1), 1.0);
        assert_eq!(s.value_at(2.0), 3.0);
        assert_abs_diff_eq!(s.value_at(0.6), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_multiply_uses_union_grid() {
        let a = Series::new(vec![(1.0, 2.0), (3.0, 4.0)]).unwrap();
        let b = Series::new(vec![(2.0, 10.0), (4.0, 10.0)]).unwrap();
        let p = a.multiply(&b);
        assert_eq!(p.wavelengths(), &[1.0, 2.0, 3.0, 4.0]);
        // a(1) = 2 * b held at 10
        assert_abs_diff_eq!(p.values()[0], 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.values()[1], 30.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.values()[3], 40.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trapezoidal_full_range_sum_matches_naive_total() {
        let s = ramp();
        let naive: f64 = s
            .wavelengths()
            .windows(2)
            .zip(s.values().windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
            .sum();
        let c = s.integrate(IntegrationRule::Trapezoidal, 1.0).unwrap();
        assert_abs_diff_eq!(c.sum(0.3, 0.7), naive, epsilon = 1e-14);
        assert_abs_diff_eq!(s.total(IntegrationRule::Trapezoidal), naive, epsilon = 1e-14);
    }

    #[test]
    fn test_sum_counts_whole_intervals_by_left_knot() {
        let s = Series::new(vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0)]).unwrap();
        let c = s.integrate(IntegrationRule::Trapezoidal, 1.0).unwrap();
        // [0.25, 1.5] starts one interval, at 1.0
        assert_abs_diff_eq!(c.sum(0.25, 1.5), 2.5, epsilon = 1e-12);
        // the interval starting at 2.0 is counted whole although 2.5 cuts it
        assert_abs_diff_eq!(c.sum(1.0, 2.5), 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.sum(-5.0, 5.0), 7.5, epsilon = 1e-12);
        // an upper bound on a knot closes the range there
        assert_abs_diff_eq!(c.sum(1.0, 2.0), 2.5, epsilon = 1e-12);
        assert_eq!(c.sum(1.0, 1.0), 0.0);
        // the last knot starts no interval
        assert_eq!(c.sum(3.0, 4.0), 0.0);
        assert_eq!(c.sum(1.2, 1.8), 0.0);
    }

    #[test]
    fn test_rectangular_and_pre_weighted_rules() {
        let s = Series::new(vec![(0.0, 2.0), (1.0, 4.0), (3.0, 6.0)]).unwrap();
        let rect = s.integrate(IntegrationRule::Rectangular, 1.0).unwrap();
        assert_eq!(rect.values(), &[0.0, 2.0, 10.0]);
        let pre = s.integrate(IntegrationRule::PreWeighted, 2.0).unwrap();
        assert_eq!(pre.values(), &[0.0, 1.0, 3.0]);
    }

    #[test]
    fn test_zero_normalization_rejected() {
        let result = ramp().integrate(IntegrationRule::Trapezoidal, 0.0);
        assert!(matches!(result, Err(OpticsError::InvalidSeries(_))));
    }

    #[test]
    fn test_empty_series() {
        let s = Series::default();
        assert_eq!(s.value_at(1.0), 0.0);
        assert_eq!(s.total(IntegrationRule::Trapezoidal), 0.0);
        assert!(s.multiply(&ramp()).is_empty());
    }
}
