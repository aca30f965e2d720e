//! Common wavelength grids for multi-layer calculations.
//!
//! Every layer is sampled on its own native grid. Before spectral
//! integration all layers are brought onto one common grid: by default the
//! union of every native grid, restricted to the range that all layers
//! cover, so that no layer loses resolution.

use crate::error::OpticsError;

/// Two wavelengths closer than this are treated as the same knot.
const KNOT_TOLERANCE: f64 = 1e-12;

/// Sorted union of all grids with duplicate knots removed.
pub fn merge_grids(grids: &[&[f64]]) -> Vec<f64> {
    let mut merged: Vec<f64> = grids.iter().flat_map(|g| g.iter().copied()).collect();
    merged.sort_by(f64::total_cmp);
    merged.dedup_by(|a, b| (*a - *b).abs() < KNOT_TOLERANCE);
    merged
}

/// The wavelength range covered by every grid, if any.
pub fn overlap(grids: &[&[f64]]) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for grid in grids {
        let (Some(&lo), Some(&hi)) = (grid.first(), grid.last()) else {
            return None;
        };
        range = Some(match range {
            None => (lo, hi),
            Some((a, b)) => (a.max(lo), b.min(hi)),
        });
    }
    range.filter(|(lo, hi)| lo <= hi)
}

/// Union of all grids restricted to their common range.
///
/// # Errors
///
/// [`OpticsError::InvalidLayer`] if there are no grids or the grids do not
/// overlap.
pub fn common_wavelengths(grids: &[&[f64]]) -> Result<Vec<f64>, OpticsError> {
    let (lo, hi) = overlap(grids).ok_or_else(|| {
        OpticsError::InvalidLayer("layer wavelength ranges do not overlap".into())
    })?;
    Ok(merge_grids(grids)
        .into_iter()
        .filter(|&x| x >= lo - KNOT_TOLERANCE && x <= hi + KNOT_TOLERANCE)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_removes_duplicates() {
        let a = [0.3, 0.4, 0.5];
        let b = [0.35, 0.4, 0.6];
        assert_eq!(merge_grids(&[&a, &b]), vec![0.3, 0.35, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_common_grid_restricted_to_overlap() {
        let a = [0.3, 0.4, 0.5, 2.5];
        let b = [0.35, 0.45, 1.0, 5.0, 25.0];
        let grid = common_wavelengths(&[&a, &b]).unwrap();
        assert_eq!(grid, vec![0.35, 0.4, 0.45, 0.5, 1.0, 2.5]);
    }

    #[test]
    fn test_disjoint_grids_rejected() {
        let a = [0.3, 0.4];
        let b = [0.5, 0.6];
        assert!(overlap(&[&a, &b]).is_none());
        assert!(common_wavelengths(&[&a, &b]).is_err());
    }

    #[test]
    fn test_no_grids() {
        assert!(common_wavelengths(&[]).is_err());
    }
}
