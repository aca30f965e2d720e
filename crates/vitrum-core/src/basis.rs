//! Discretised hemispherical direction basis.
//!
//! The hemisphere is cut into rings of constant polar angle $\theta$, and every
//! ring into $n_\phi$ equal azimuthal sectors. Each resulting patch carries
//! its projected solid angle
//!
//! $$\lambda = \int_{\Delta\phi}\int_{\theta_{lo}}^{\theta_{hi}} \cos\theta \sin\theta \, d\theta \, d\phi
//!   = \frac{\Delta\phi}{2}\left(\sin^2\theta_{hi} - \sin^2\theta_{lo}\right)$$
//!
//! so that the weights of a complete hemisphere sum to $\pi$.
//!
//! Ring boundaries are derived from the nominal ring centres, walking inwards
//! from the horizon: the outermost ring ends at 90° and every lower boundary
//! mirrors the previous boundary about the ring centre.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::OpticsError;

/// A direction on the hemisphere, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    /// Polar angle measured from the surface normal (degrees).
    pub theta: f64,
    /// Azimuth (degrees).
    pub phi: f64,
}

impl Direction {
    pub fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }

    /// Unit vector in the local frame where the normal is `z`.
    pub fn unit_vector(&self) -> [f64; 3] {
        let (st, ct) = self.theta.to_radians().sin_cos();
        let (sp, cp) = self.phi.to_radians().sin_cos();
        [st * cp, st * sp, ct]
    }
}

/// One solid-angle bin of the basis.
#[derive(Debug, Clone, Serialize)]
pub struct Patch {
    /// Representative direction of the bin.
    pub centre: Direction,
    /// Polar limits `[lo, hi]` (degrees).
    pub theta_limits: [f64; 2],
    /// Azimuthal limits `[lo, hi]` (degrees); `lo` may be negative for the
    /// sector centred on 0°.
    pub phi_limits: [f64; 2],
    /// Projected solid angle $\cos\theta\,d\Omega$ of the bin.
    pub lambda: f64,
}

/// Nominal centre and azimuthal subdivision of one ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingDefinition {
    /// Nominal ring centre (degrees).
    pub theta: f64,
    /// Number of equal azimuthal sectors in the ring.
    pub num_phis: usize,
}

impl RingDefinition {
    pub fn new(theta: f64, num_phis: usize) -> Self {
        Self { theta, num_phis }
    }
}

/// Supported basis resolutions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisResolution {
    /// 7 rings of one patch each.
    Small,
    /// 41 patches.
    Quarter,
    /// 77 patches.
    Half,
    /// 145 patches.
    #[default]
    Full,
    /// Caller-supplied ring layout.
    Custom(Vec<RingDefinition>),
}

impl BasisResolution {
    /// Ring layout for this resolution.
    pub fn rings(&self) -> Vec<RingDefinition> {
        fn zip(thetas: &[f64], phis: &[usize]) -> Vec<RingDefinition> {
            thetas
                .iter()
                .zip(phis)
                .map(|(&theta, &num_phis)| RingDefinition::new(theta, num_phis))
                .collect()
        }

        match self {
            Self::Small => zip(
                &[0.0, 13.0, 26.0, 39.0, 52.0, 65.0, 80.75],
                &[1, 1, 1, 1, 1, 1, 1],
            ),
            Self::Quarter => zip(&[0.0, 18.0, 36.0, 54.0, 76.5], &[1, 8, 12, 12, 8]),
            Self::Half => zip(
                &[0.0, 13.0, 26.0, 39.0, 52.0, 65.0, 80.75],
                &[1, 8, 12, 16, 20, 12, 8],
            ),
            Self::Full => zip(
                &[0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 82.5],
                &[1, 8, 16, 20, 24, 24, 24, 16, 12],
            ),
            Self::Custom(rings) => rings.clone(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Quarter => "quarter",
            Self::Half => "half",
            Self::Full => "full",
            Self::Custom(_) => "custom",
        }
    }
}

/// Ring boundaries for a list of ascending ring centres.
///
/// Returns `centres.len() + 1` boundaries, ascending, the last one at 90°.
/// Boundaries that would fall below the normal are clamped to 0°.
///
/// # Errors
///
/// [`OpticsError::InvalidBasis`] if the centres cannot be bracketed by
/// strictly ascending limits, e.g. `[10, 20]`, whose middle boundary would sit
/// below the normal.
pub fn theta_limits(centres: &[f64]) -> Result<Vec<f64>, OpticsError> {
    let mut limits = Vec::with_capacity(centres.len() + 1);
    let mut previous = 90.0;
    limits.push(previous);
    for &centre in centres.iter().rev() {
        let limit = (previous - 2.0 * (previous - centre)).clamp(0.0, 90.0);
        limits.push(limit);
        previous = limit;
    }
    limits.reverse();
    if let Some(k) = limits.windows(2).position(|w| w[0] >= w[1]) {
        return Err(OpticsError::InvalidBasis(format!(
            "ring centres {centres:?} give non-ascending theta limits {} and {} at ring {k}",
            limits[k],
            limits[k + 1]
        )));
    }
    Ok(limits)
}

/// An immutable, indexed set of hemisphere patches.
///
/// Patches are ordered ring by ring from the normal outwards, and by
/// increasing azimuth within a ring. Incoming and outgoing directions share
/// the same indexing.
#[derive(Debug, Clone)]
pub struct DirectionalBasis {
    resolution: BasisResolution,
    patches: Vec<Patch>,
    lambda: Array1<f64>,
    /// Unit vectors of patch centres, cached for nearest-patch lookups.
    centres: Vec<[f64; 3]>,
}

impl DirectionalBasis {
    /// Build the basis for a resolution.
    ///
    /// # Errors
    ///
    /// [`OpticsError::InvalidBasis`] if the resolution has no rings, a ring
    /// has no azimuthal sectors, or ring centres are not ascending within
    /// `[0°, 90°]`.
    pub fn build(resolution: BasisResolution) -> Result<Self, OpticsError> {
        let rings = resolution.rings();
        if rings.is_empty() {
            return Err(OpticsError::InvalidBasis(
                "basis definition contains no theta rings".into(),
            ));
        }
        for (k, ring) in rings.iter().enumerate() {
            if ring.num_phis == 0 {
                return Err(OpticsError::InvalidBasis(format!(
                    "ring {k} (theta = {}) has no phi divisions",
                    ring.theta
                )));
            }
            if !(0.0..=90.0).contains(&ring.theta) {
                return Err(OpticsError::InvalidBasis(format!(
                    "ring {k} centre {} outside [0, 90] degrees",
                    ring.theta
                )));
            }
            if k > 0 && ring.theta <= rings[k - 1].theta {
                return Err(OpticsError::InvalidBasis(
                    "ring centres must be strictly ascending".into(),
                ));
            }
        }

        let centres: Vec<f64> = rings.iter().map(|r| r.theta).collect();
        let limits = theta_limits(&centres)?;

        let mut patches = Vec::new();
        for (k, ring) in rings.iter().enumerate() {
            let (lo, hi) = (limits[k], limits[k + 1]);
            let delta_phi = 360.0 / ring.num_phis as f64;
            let sin_lo = lo.to_radians().sin();
            let sin_hi = hi.to_radians().sin();
            let lambda = delta_phi.to_radians() * (sin_hi * sin_hi - sin_lo * sin_lo) / 2.0;

            for p in 0..ring.num_phis {
                let phi = p as f64 * delta_phi;
                patches.push(Patch {
                    centre: Direction::new(ring.theta, phi),
                    theta_limits: [lo, hi],
                    phi_limits: [phi - delta_phi / 2.0, phi + delta_phi / 2.0],
                    lambda,
                });
            }
        }

        let lambda = Array1::from_iter(patches.iter().map(|p| p.lambda));
        let centres = patches.iter().map(|p| p.centre.unit_vector()).collect();

        log::debug!(
            "Built {} basis with {} patches",
            resolution.name(),
            patches.len()
        );

        Ok(Self {
            resolution,
            patches,
            lambda,
            centres,
        })
    }

    pub fn resolution(&self) -> &BasisResolution {
        &self.resolution
    }

    /// Number of patches.
    pub fn size(&self) -> usize {
        self.patches.len()
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn patch(&self, index: usize) -> &Patch {
        &self.patches[index]
    }

    /// Projected solid angle of every patch, in patch order.
    pub fn lambda(&self) -> &Array1<f64> {
        &self.lambda
    }

    /// Sum of all patch weights ($\pi$ for a complete hemisphere).
    pub fn lambda_sum(&self) -> f64 {
        self.lambda.sum()
    }

    /// Index of the patch whose centre is angularly closest to
    /// `(theta, phi)`. Ties go to the lowest index.
    pub fn nearest_patch(&self, theta: f64, phi: f64) -> usize {
        let target = Direction::new(theta, phi).unit_vector();
        let mut best = 0;
        let mut best_dot = f64::NEG_INFINITY;
        for (i, c) in self.centres.iter().enumerate() {
            let dot = c[0] * target[0] + c[1] * target[1] + c[2] * target[2];
            if dot > best_dot + 1e-12 {
                best_dot = dot;
                best = i;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_full_basis_theta_limits() {
        let centres: Vec<f64> = BasisResolution::Full.rings().iter().map(|r| r.theta).collect();
        let limits = theta_limits(&centres).unwrap();
        let expected = [0.0, 5.0, 15.0, 25.0, 35.0, 45.0, 55.0, 65.0, 75.0, 90.0];
        assert_eq!(limits.len(), expected.len());
        for (a, b) in limits.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unbracketable_centres_rejected() {
        assert!(matches!(theta_limits(&[10.0, 20.0]), Err(OpticsError::InvalidBasis(_))));
        let custom = BasisResolution::Custom(vec![
            RingDefinition::new(10.0, 1),
            RingDefinition::new(20.0, 4),
        ]);
        assert!(matches!(
            DirectionalBasis::build(custom),
            Err(OpticsError::InvalidBasis(_))
        ));
        // a single ring spans the whole hemisphere
        assert_eq!(theta_limits(&[45.0]).unwrap(), vec![0.0, 90.0]);
    }

    #[test]
    fn test_basis_sizes() {
        let sizes = [
            (BasisResolution::Small, 7),
            (BasisResolution::Quarter, 41),
            (BasisResolution::Half, 77),
            (BasisResolution::Full, 145),
        ];
        for (resolution, n) in sizes {
            let basis = DirectionalBasis::build(resolution).unwrap();
            assert_eq!(basis.size(), n);
        }
    }

    #[test]
    fn test_weights_sum_to_pi() {
        for resolution in [
            BasisResolution::Small,
            BasisResolution::Quarter,
            BasisResolution::Half,
            BasisResolution::Full,
        ] {
            let basis = DirectionalBasis::build(resolution).unwrap();
            assert_abs_diff_eq!(basis.lambda_sum(), PI, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_phi_centres_of_eight_sector_ring() {
        let basis = DirectionalBasis::build(BasisResolution::Full).unwrap();
        let phis: Vec<f64> = basis.patches()[1..9].iter().map(|p| p.centre.phi).collect();
        let expected = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];
        for (a, b) in phis.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_empty_definition_rejected() {
        let result = DirectionalBasis::build(BasisResolution::Custom(Vec::new()));
        assert!(matches!(result, Err(OpticsError::InvalidBasis(_))));
    }

    #[test]
    fn test_ring_without_phis_rejected() {
        let rings = vec![RingDefinition::new(0.0, 1), RingDefinition::new(45.0, 0)];
        let result = DirectionalBasis::build(BasisResolution::Custom(rings));
        assert!(matches!(result, Err(OpticsError::InvalidBasis(_))));
    }

    #[test]
    fn test_nearest_patch() {
        let basis = DirectionalBasis::build(BasisResolution::Full).unwrap();
        assert_eq!(basis.nearest_patch(0.0, 0.0), 0);
        assert_eq!(basis.nearest_patch(0.0, 123.0), 0);
        // second ring (theta = 10) starts at index 1 with phi = 0, 45, ...
        assert_eq!(basis.nearest_patch(11.0, 44.0), 2);
        assert_eq!(basis.nearest_patch(10.0, 350.0), 1);
        // outermost ring occupies the last 12 indices
        assert_eq!(basis.nearest_patch(89.0, 0.0), 133);
    }

    #[test]
    fn test_nearest_patch_tie_goes_to_lowest_index() {
        let basis = DirectionalBasis::build(BasisResolution::Full).unwrap();
        // exactly between the phi = 0 and phi = 45 patches of the 10 degree ring
        assert_eq!(basis.nearest_patch(10.0, 22.5), 1);
    }

    #[test]
    fn test_small_basis_single_patch_rings() {
        let basis = DirectionalBasis::build(BasisResolution::Small).unwrap();
        for p in basis.patches() {
            assert_abs_diff_eq!(p.phi_limits[1] - p.phi_limits[0], 360.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(basis.patch(6).theta_limits[1], 90.0);
    }
}
