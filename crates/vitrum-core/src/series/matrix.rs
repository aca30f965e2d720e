//! Matrices whose cells are spectral series.
//!
//! A [`MatrixSeries`] carries one value per `(row, column, wavelength)`. All
//! cells share a single wavelength grid, so the data is held in one
//! `rows × cols × n_λ` array and every per-cell operation is a slice kernel
//! from the parent module.
//!
//! Columns index incoming directions. Rows index outgoing directions for
//! scattering matrices, or layers for absorptance.

use ndarray::{s, Array1, Array2, Array3};
use vitrum_compute::ComputeBackend;

use super::{
    check_normalization, cumulative_integral, interpolate_at, merge_grids, ranged_sum, Series,
};
use crate::error::OpticsError;
use crate::types::IntegrationRule;

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSeries {
    wavelengths: Vec<f64>,
    /// Indexed `[row, col, wavelength]`.
    data: Array3<f64>,
}

impl MatrixSeries {
    /// Stack one matrix per wavelength into a matrix of series.
    ///
    /// # Errors
    ///
    /// [`OpticsError::InvalidSeries`] if the grid is not strictly ascending,
    /// the number of matrices differs from the number of wavelengths, or the
    /// matrices do not all have the same shape.
    pub fn from_matrices(
        wavelengths: Vec<f64>,
        matrices: &[Array2<f64>],
    ) -> Result<Self, OpticsError> {
        check_grid(&wavelengths)?;
        if matrices.len() != wavelengths.len() {
            return Err(OpticsError::InvalidSeries(format!(
                "{} matrices supplied for {} wavelengths",
                matrices.len(),
                wavelengths.len()
            )));
        }
        let (rows, cols) = matrices.first().map_or((0, 0), |m| m.dim());
        let mut data = Array3::zeros((rows, cols, wavelengths.len()));
        for (k, m) in matrices.iter().enumerate() {
            if m.dim() != (rows, cols) {
                return Err(OpticsError::InvalidSeries(format!(
                    "matrix at wavelength {} is {:?}, expected {:?}",
                    wavelengths[k],
                    m.dim(),
                    (rows, cols)
                )));
            }
            data.slice_mut(s![.., .., k]).assign(m);
        }
        Ok(Self { wavelengths, data })
    }

    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// The series held in cell `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Series {
        Series::from_sorted(
            self.wavelengths.clone(),
            self.data.slice(s![row, col, ..]).to_vec(),
        )
    }

    /// The matrix at wavelength index `k`.
    pub fn matrix_at(&self, k: usize) -> Array2<f64> {
        self.data.slice(s![.., .., k]).to_owned()
    }

    /// Resample every cell onto `grid`.
    pub fn interpolate(&self, grid: &[f64]) -> Result<MatrixSeries, OpticsError> {
        let mut grid = grid.to_vec();
        grid.sort_by(f64::total_cmp);
        check_grid(&grid)?;
        Ok(self.resampled(grid))
    }

    /// Multiply every cell by `other` on the union of both grids.
    pub fn multiply(&self, other: &Series) -> MatrixSeries {
        let grid = merge_grids(&[&self.wavelengths, other.wavelengths()]);
        let mut out = self.resampled(grid);
        for (k, &x) in out.wavelengths.iter().enumerate() {
            let factor = other.value_at(x);
            out.data.slice_mut(s![.., .., k]).mapv_inplace(|v| v * factor);
        }
        out
    }

    /// Weight every column (incoming direction) by its own spectral load,
    /// evaluated on this matrix's grid.
    pub fn scale_by_columns(&self, loads: &[Series]) -> Result<MatrixSeries, OpticsError> {
        if loads.len() != self.cols() {
            return Err(OpticsError::InvalidSeries(format!(
                "{} column loads supplied for {} columns",
                loads.len(),
                self.cols()
            )));
        }
        let mut out = self.clone();
        for (j, load) in loads.iter().enumerate() {
            for (k, &x) in self.wavelengths.iter().enumerate() {
                let factor = load.value_at(x);
                out.data.slice_mut(s![.., j, k]).mapv_inplace(|v| v * factor);
            }
        }
        Ok(out)
    }

    /// Weight every row by its own spectral factor, evaluated on this
    /// matrix's grid.
    pub fn scale_by_rows(&self, factors: &[Series]) -> Result<MatrixSeries, OpticsError> {
        if factors.len() != self.rows() {
            return Err(OpticsError::InvalidSeries(format!(
                "{} row factors supplied for {} rows",
                factors.len(),
                self.rows()
            )));
        }
        let mut out = self.clone();
        for (i, factor) in factors.iter().enumerate() {
            for (k, &x) in self.wavelengths.iter().enumerate() {
                let f = factor.value_at(x);
                out.data.slice_mut(s![i, .., k]).mapv_inplace(|v| v * f);
            }
        }
        Ok(out)
    }

    /// Replace every cell with its cumulative integral.
    pub fn integrate(
        &self,
        rule: IntegrationRule,
        normalization: f64,
    ) -> Result<MatrixSeries, OpticsError> {
        check_normalization(normalization)?;
        let mut out = self.clone();
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                let ys = self.data.slice(s![i, j, ..]).to_vec();
                let c = cumulative_integral(&self.wavelengths, &ys, rule, normalization);
                out.data.slice_mut(s![i, j, ..]).assign(&Array1::from(c));
            }
        }
        Ok(out)
    }

    /// Ranged sum of every (already integrated) cell.
    pub fn sum(&self, min: f64, max: f64) -> Array2<f64> {
        Array2::from_shape_fn((self.rows(), self.cols()), |(i, j)| {
            let c = self.data.slice(s![i, j, ..]).to_vec();
            ranged_sum(&self.wavelengths, &c, min, max)
        })
    }

    /// Ranged sum of every (already integrated) cell, with column `j`
    /// divided by `divisors[j]`. Cells are reduced in parallel on `backend`.
    ///
    /// # Errors
    ///
    /// [`OpticsError::InvalidSeries`] if the number of divisors differs from
    /// the number of columns or a divisor is zero or not finite.
    pub fn reduce_to_matrix(
        &self,
        min: f64,
        max: f64,
        divisors: &[f64],
        backend: &dyn ComputeBackend,
    ) -> Result<Array2<f64>, OpticsError> {
        if divisors.len() != self.cols() {
            return Err(OpticsError::InvalidSeries(format!(
                "{} divisors supplied for {} columns",
                divisors.len(),
                self.cols()
            )));
        }
        if let Some((j, d)) = divisors
            .iter()
            .enumerate()
            .find(|(_, d)| **d == 0.0 || !d.is_finite())
        {
            return Err(OpticsError::InvalidSeries(format!(
                "divisor {d} for column {j}"
            )));
        }
        let reduced = backend.parallel_matrix_fill(self.rows(), self.cols(), &|i, j| {
            let c: Vec<f64> = self.data.slice(s![i, j, ..]).to_vec();
            ranged_sum(&self.wavelengths, &c, min, max) / divisors[j]
        })?;
        Ok(reduced)
    }

    fn resampled(&self, grid: Vec<f64>) -> MatrixSeries {
        let mut data = Array3::zeros((self.rows(), self.cols(), grid.len()));
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                let ys = self.data.slice(s![i, j, ..]).to_vec();
                for (k, &x) in grid.iter().enumerate() {
                    data[[i, j, k]] = interpolate_at(&self.wavelengths, &ys, x);
                }
            }
        }
        MatrixSeries {
            wavelengths: grid,
            data,
        }
    }
}

fn check_grid(grid: &[f64]) -> Result<(), OpticsError> {
    if grid.iter().any(|x| !x.is_finite()) {
        return Err(OpticsError::InvalidSeries("non-finite wavelength".into()));
    }
    if grid.windows(2).any(|w| w[0] >= w[1]) {
        return Err(OpticsError::InvalidSeries(
            "wavelength grid must be strictly ascending without duplicates".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use vitrum_compute::SerialBackend;

    fn two_by_two() -> MatrixSeries {
        MatrixSeries::from_matrices(
            vec![0.4, 0.5, 0.6],
            &[
                array![[1.0, 2.0], [3.0, 4.0]],
                array![[1.0, 2.0], [3.0, 4.0]],
                array![[1.0, 2.0], [3.0, 4.0]],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cell_extraction() {
        let m = two_by_two();
        let cell = m.cell(1, 0);
        assert_eq!(cell.wavelengths(), &[0.4, 0.5, 0.6]);
        assert_eq!(cell.values(), &[3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = MatrixSeries::from_matrices(
            vec![0.4, 0.5],
            &[array![[1.0]], array![[1.0, 2.0]]],
        );
        assert!(matches!(result, Err(OpticsError::InvalidSeries(_))));
    }

    #[test]
    fn test_scale_by_columns_weights_incoming_direction() {
        let m = two_by_two();
        let loads = vec![
            Series::constant(&[0.4, 0.6], 2.0).unwrap(),
            Series::constant(&[0.4, 0.6], 0.5).unwrap(),
        ];
        let scaled = m.scale_by_columns(&loads).unwrap();
        assert_eq!(scaled.matrix_at(1), array![[2.0, 1.0], [6.0, 2.0]]);
    }

    #[test]
    fn test_integrate_and_reduce() {
        let m = two_by_two();
        let c = m.integrate(IntegrationRule::Trapezoidal, 1.0).unwrap();
        let totals = c.sum(0.4, 0.6);
        assert_abs_diff_eq!(totals[[1, 1]], 0.8, epsilon = 1e-12);

        let reduced = c
            .reduce_to_matrix(0.4, 0.6, &[0.2, 0.4], &SerialBackend)
            .unwrap();
        assert_abs_diff_eq!(reduced[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(reduced[[1, 1]], 2.0, epsilon = 1e-12);

        let zero = c.reduce_to_matrix(0.4, 0.6, &[0.2, 0.0], &SerialBackend);
        assert!(matches!(zero, Err(OpticsError::InvalidSeries(_))));
    }

    #[test]
    fn test_multiply_by_series() {
        let m = two_by_two();
        let s = Series::new(vec![(0.4, 1.0), (0.6, 3.0)]).unwrap();
        let p = m.multiply(&s);
        assert_eq!(p.wavelengths(), &[0.4, 0.5, 0.6]);
        assert_abs_diff_eq!(p.cell(0, 1).values()[1], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolate_cells() {
        let m = MatrixSeries::from_matrices(
            vec![0.0, 1.0],
            &[array![[0.0]], array![[10.0]]],
        )
        .unwrap();
        let r = m.interpolate(&[0.25, 0.5]).unwrap();
        assert_eq!(r.cell(0, 0).values(), &[2.5, 5.0]);
    }
}
