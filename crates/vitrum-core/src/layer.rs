//! The capability contract between layer providers and the combinator.
//!
//! A layer is anything that can report, for each of its native wavelength
//! bands, the four BSDF matrices of a single pane or shade over a shared
//! [`DirectionalBasis`]. The combinator and the orchestrator depend only on
//! [`OpticalLayer`]; they never see what kind of cell produced the numbers.
//!
//! BSDF matrices are indexed `[outgoing][incoming]` and hold radiance ratios
//! (units of sr⁻¹). Multiplying row `i` by the projected solid angle
//! $\lambda_i$ of outgoing patch `i` turns a BSDF matrix into a flux transfer
//! matrix whose column `j` says where the flux incident in patch `j` goes.

use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};

use crate::basis::DirectionalBasis;
use crate::error::OpticsError;
use crate::types::{Property, Side};

/// BSDF matrices and self-absorptance of one layer in one wavelength band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandProperties {
    pub tau_front: Array2<f64>,
    pub rho_front: Array2<f64>,
    pub tau_back: Array2<f64>,
    pub rho_back: Array2<f64>,
    /// Fraction of flux incident in each patch absorbed by the layer.
    pub abs_front: Array1<f64>,
    pub abs_back: Array1<f64>,
}

impl BandProperties {
    /// Build from the four BSDF matrices, deriving self-absorptance from
    /// local energy balance:
    ///
    /// $$A_j = 1 - \sum_i (\tau_{ij} + \rho_{ij}) \lambda_i$$
    pub fn from_bsdf(
        basis: &DirectionalBasis,
        tau_front: Array2<f64>,
        rho_front: Array2<f64>,
        tau_back: Array2<f64>,
        rho_back: Array2<f64>,
    ) -> Result<Self, OpticsError> {
        let n = basis.size();
        for (name, m) in [
            ("tau_front", &tau_front),
            ("rho_front", &rho_front),
            ("tau_back", &tau_back),
            ("rho_back", &rho_back),
        ] {
            if m.dim() != (n, n) {
                return Err(OpticsError::InvalidLayer(format!(
                    "{name} is {:?}, basis has {n} patches",
                    m.dim()
                )));
            }
        }
        let lambda = basis.lambda();
        let leaving = |t: &Array2<f64>, r: &Array2<f64>| -> Array1<f64> {
            (t + r)
                .axis_iter(Axis(1))
                .map(|col| col.dot(lambda))
                .collect()
        };
        let abs_front = leaving(&tau_front, &rho_front).mapv(|v| 1.0 - v);
        let abs_back = leaving(&tau_back, &rho_back).mapv(|v| 1.0 - v);
        Ok(Self {
            tau_front,
            rho_front,
            tau_back,
            rho_back,
            abs_front,
            abs_back,
        })
    }

    /// BSDF matrix for one side and quantity.
    pub fn matrix(&self, side: Side, property: Property) -> &Array2<f64> {
        match (side, property) {
            (Side::Front, Property::Tau) => &self.tau_front,
            (Side::Front, Property::Rho) => &self.rho_front,
            (Side::Back, Property::Tau) => &self.tau_back,
            (Side::Back, Property::Rho) => &self.rho_back,
        }
    }

    pub fn absorptance(&self, side: Side) -> &Array1<f64> {
        match side {
            Side::Front => &self.abs_front,
            Side::Back => &self.abs_back,
        }
    }

    /// Number of basis directions.
    pub fn size(&self) -> usize {
        self.abs_front.len()
    }

    /// Linear blend `(1 - t)·a + t·b` of two bands.
    pub fn lerp(a: &BandProperties, b: &BandProperties, t: f64) -> BandProperties {
        let mix2 = |x: &Array2<f64>, y: &Array2<f64>| x * (1.0 - t) + y * t;
        let mix1 = |x: &Array1<f64>, y: &Array1<f64>| x * (1.0 - t) + y * t;
        BandProperties {
            tau_front: mix2(&a.tau_front, &b.tau_front),
            rho_front: mix2(&a.rho_front, &b.rho_front),
            tau_back: mix2(&a.tau_back, &b.tau_back),
            rho_back: mix2(&a.rho_back, &b.rho_back),
            abs_front: mix1(&a.abs_front, &b.abs_front),
            abs_back: mix1(&a.abs_back, &b.abs_back),
        }
    }
}

/// Photovoltaic conversion behaviour of an active layer.
pub trait PhotovoltaicResponse: Send + Sync {
    /// Spectral responsivity (A/W) at `wavelength` (µm).
    fn responsivity(&self, wavelength: f64) -> f64;

    /// Open-circuit voltage (V) at short-circuit current density `jsc` (A/m²).
    fn voc(&self, jsc: f64) -> f64;

    /// Fill factor at short-circuit current density `jsc` (A/m²).
    fn ff(&self, jsc: f64) -> f64;
}

/// A single pane, shade or cell that can take part in a stack.
pub trait OpticalLayer: Send + Sync {
    /// Basis shared by every matrix this layer produces.
    fn basis(&self) -> &Arc<DirectionalBasis>;

    /// Native band wavelengths (µm), strictly ascending.
    fn wavelengths(&self) -> &[f64];

    /// Properties of native band `index`.
    fn band_properties(&self, index: usize) -> Result<BandProperties, OpticsError>;

    /// Properties at an arbitrary wavelength, linearly interpolated between
    /// the bracketing native bands and held constant outside them.
    fn properties_at(&self, wavelength: f64) -> Result<BandProperties, OpticsError> {
        let grid = self.wavelengths();
        let n = grid.len();
        if n == 0 {
            return Err(OpticsError::InvalidLayer("layer has no wavelength bands".into()));
        }
        if wavelength <= grid[0] {
            return self.band_properties(0);
        }
        if wavelength >= grid[n - 1] {
            return self.band_properties(n - 1);
        }
        let k = grid.partition_point(|&x| x <= wavelength);
        if grid[k - 1] == wavelength {
            return self.band_properties(k - 1);
        }
        let t = (wavelength - grid[k - 1]) / (grid[k] - grid[k - 1]);
        let lo = self.band_properties(k - 1)?;
        let hi = self.band_properties(k)?;
        Ok(BandProperties::lerp(&lo, &hi, t))
    }

    /// Photovoltaic response, for active layers.
    fn photovoltaic(&self) -> Option<&dyn PhotovoltaicResponse> {
        None
    }

    /// Short label used in logs and reports.
    fn name(&self) -> &str {
        "layer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisResolution;
    use approx::assert_abs_diff_eq;

    /// Specular layer with constant properties on every band.
    struct Grey {
        basis: Arc<DirectionalBasis>,
        grid: Vec<f64>,
        tau: Vec<f64>,
    }

    impl OpticalLayer for Grey {
        fn basis(&self) -> &Arc<DirectionalBasis> {
            &self.basis
        }

        fn wavelengths(&self) -> &[f64] {
            &self.grid
        }

        fn band_properties(&self, index: usize) -> Result<BandProperties, OpticsError> {
            let lambda = self.basis.lambda();
            let diag = Array2::from_diag(&lambda.mapv(|l| self.tau[index] / l));
            let zero = Array2::zeros(diag.dim());
            BandProperties::from_bsdf(&self.basis, diag.clone(), zero.clone(), diag, zero)
        }
    }

    fn grey() -> Grey {
        Grey {
            basis: Arc::new(DirectionalBasis::build(BasisResolution::Small).unwrap()),
            grid: vec![0.4, 0.6],
            tau: vec![0.2, 0.6],
        }
    }

    #[test]
    fn test_absorptance_from_energy_balance() {
        let layer = grey();
        let band = layer.band_properties(0).unwrap();
        for a in band.abs_front.iter() {
            assert_abs_diff_eq!(*a, 0.8, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_properties_between_bands_are_blended() {
        let layer = grey();
        let band = layer.properties_at(0.5).unwrap();
        assert_abs_diff_eq!(band.abs_back[3], 0.6, epsilon = 1e-12);
        let held = layer.properties_at(0.9).unwrap();
        assert_abs_diff_eq!(held.abs_back[3], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_matrix_size_rejected() {
        let basis = DirectionalBasis::build(BasisResolution::Small).unwrap();
        let m = Array2::zeros((3, 3));
        let result = BandProperties::from_bsdf(&basis, m.clone(), m.clone(), m.clone(), m);
        assert!(matches!(result, Err(OpticsError::InvalidLayer(_))));
    }
}
