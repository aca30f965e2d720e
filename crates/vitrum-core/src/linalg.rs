//! Dense linear algebra helpers.
//!
//! Matrix inversion uses LU decomposition with partial pivoting via `faer`.
//! The interreflection operators inverted here are small (at most a few
//! hundred directions), so an explicit inverse is cheap and keeps the
//! combinator formulas readable.

use faer::linalg::solvers::SpSolver;
use ndarray::Array2;

use crate::error::OpticsError;

/// Largest acceptable entry of `A·A⁻¹ − I`.
const RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Invert a square matrix.
///
/// # Errors
///
/// [`OpticsError::SingularSystem`] if the matrix is not square, the
/// decomposition produces non-finite values, or the inverse fails the
/// residual check.
pub fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>, OpticsError> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(OpticsError::SingularSystem(format!(
            "cannot invert a {rows}x{cols} matrix"
        )));
    }
    let n = rows;

    let faer_mat = faer::Mat::<f64>::from_fn(n, n, |i, j| matrix[[i, j]]);
    let identity = faer::Mat::<f64>::identity(n, n);

    // LU decomposition with partial pivoting, solved against the identity
    let lu = faer_mat.partial_piv_lu();
    let faer_inv = lu.solve(&identity);

    let inverse = Array2::from_shape_fn((n, n), |(i, j)| faer_inv.read(i, j));
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(OpticsError::SingularSystem(
            "inverse contains non-finite values".into(),
        ));
    }

    let residual = matrix.dot(&inverse) - Array2::<f64>::eye(n);
    let worst = residual.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if worst > RESIDUAL_TOLERANCE * (1.0 + max_abs(&inverse)) {
        return Err(OpticsError::SingularSystem(format!(
            "inverse residual {worst:.2e} exceeds tolerance"
        )));
    }

    Ok(inverse)
}

/// Column sums, i.e. the total leaving for each incoming direction of a flux
/// transfer matrix.
pub fn column_sums(matrix: &Array2<f64>) -> ndarray::Array1<f64> {
    matrix.sum_axis(ndarray::Axis(0))
}

fn max_abs(matrix: &Array2<f64>) -> f64 {
    matrix.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}
