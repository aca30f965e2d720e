//! Band-integrated results of a multi-layer calculation.
//!
//! A [`BsdfResults`] holds, for one wavelength range, the equivalent BSDF
//! matrices of the whole stack and the in-context absorptance of every layer
//! for every incoming direction. All directional and hemispherical scalar
//! properties are read from it:
//!
//! - direct-direct: $\tau_{jj}\lambda_j$
//! - direct-hemispherical: $\sum_i \tau_{ij}\lambda_i$
//! - diffuse-diffuse: $\sum_j h_j\lambda_j / \sum_j \lambda_j$, where $h_j$ is
//!   the direct-hemispherical value for incidence in patch $j$.
//!
//! Layer indices passed to absorptance queries start at 1 and count from the
//! side the light enters: front index 1 is the front-most layer, back index 1
//! is the back-most layer.

use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

use crate::basis::DirectionalBasis;
use crate::error::OpticsError;
use crate::types::{Property, Scattering, ScatteringSimple, Side};

/// Per-side absorptance data for every layer.
#[derive(Debug, Clone, Default)]
pub(crate) struct SideAbsorptance {
    /// Total absorptance per layer, per incoming direction.
    pub total: Vec<Array1<f64>>,
    /// Part of `total` converted to electricity (zero for passive layers).
    pub electricity: Vec<Array1<f64>>,
}

#[derive(Debug, Clone)]
pub struct BsdfResults {
    pub(crate) basis: Arc<DirectionalBasis>,
    pub(crate) min_lambda: f64,
    pub(crate) max_lambda: f64,
    pub(crate) tau_front: Array2<f64>,
    pub(crate) rho_front: Array2<f64>,
    pub(crate) tau_back: Array2<f64>,
    pub(crate) rho_back: Array2<f64>,
    pub(crate) abs_front: SideAbsorptance,
    pub(crate) abs_back: SideAbsorptance,
    /// Incident power per incoming direction over the range.
    pub(crate) incident_power: Array1<f64>,
}

/// Scalar summary of a result set, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub min_lambda: f64,
    pub max_lambda: f64,
    pub theta: f64,
    pub phi: f64,
    pub tau_front_dir_dir: f64,
    pub tau_front_dir_hem: f64,
    pub rho_front_dir_hem: f64,
    pub tau_back_dir_hem: f64,
    pub rho_back_dir_hem: f64,
    pub tau_front_diff_diff: f64,
    pub rho_front_diff_diff: f64,
    pub rho_back_diff_diff: f64,
    /// Front-incidence absorptances, front-most layer first.
    pub abs_front: Vec<f64>,
    /// Back-incidence absorptances, back-most layer first.
    pub abs_back: Vec<f64>,
    pub abs_front_diffuse: Vec<f64>,
    pub abs_back_diffuse: Vec<f64>,
}

impl BsdfResults {
    pub fn basis(&self) -> &Arc<DirectionalBasis> {
        &self.basis
    }

    /// Wavelength range `(min, max)` these results were integrated over.
    pub fn range(&self) -> (f64, f64) {
        (self.min_lambda, self.max_lambda)
    }

    pub fn layer_count(&self) -> usize {
        self.abs_front.total.len()
    }

    /// Equivalent BSDF matrix `[outgoing][incoming]`.
    pub fn matrix(&self, side: Side, property: Property) -> &Array2<f64> {
        match (side, property) {
            (Side::Front, Property::Tau) => &self.tau_front,
            (Side::Front, Property::Rho) => &self.rho_front,
            (Side::Back, Property::Tau) => &self.tau_back,
            (Side::Back, Property::Rho) => &self.rho_back,
        }
    }

    /// Index of the patch nearest to `(theta, phi)`.
    pub fn nearest_index(&self, theta: f64, phi: f64) -> usize {
        self.basis.nearest_patch(theta, phi)
    }

    pub fn dir_dir_index(&self, side: Side, property: Property, index: usize) -> f64 {
        self.matrix(side, property)[[index, index]] * self.basis.lambda()[index]
    }

    pub fn dir_dir(&self, side: Side, property: Property, theta: f64, phi: f64) -> f64 {
        self.dir_dir_index(side, property, self.nearest_index(theta, phi))
    }

    /// Direct-hemispherical value for every incoming direction.
    pub fn dir_hem_vector(&self, side: Side, property: Property) -> Array1<f64> {
        let lambda = self.basis.lambda();
        self.matrix(side, property)
            .axis_iter(Axis(1))
            .map(|col| col.dot(lambda))
            .collect()
    }

    pub fn dir_hem_index(&self, side: Side, property: Property, index: usize) -> f64 {
        self.matrix(side, property).column(index).dot(self.basis.lambda())
    }

    pub fn dir_hem(&self, side: Side, property: Property, theta: f64, phi: f64) -> f64 {
        self.dir_hem_index(side, property, self.nearest_index(theta, phi))
    }

    /// Scattered part of the direct-hemispherical value.
    pub fn dir_diff(&self, side: Side, property: Property, theta: f64, phi: f64) -> f64 {
        let index = self.nearest_index(theta, phi);
        self.dir_hem_index(side, property, index) - self.dir_dir_index(side, property, index)
    }

    pub fn diff_diff(&self, side: Side, property: Property) -> f64 {
        self.hemispherical_average(&self.dir_hem_vector(side, property))
    }

    pub fn property_simple(
        &self,
        side: Side,
        property: Property,
        scattering: Scattering,
        theta: f64,
        phi: f64,
    ) -> f64 {
        match scattering {
            Scattering::DirectDirect => self.dir_dir(side, property, theta, phi),
            Scattering::DirectDiffuse => self.dir_diff(side, property, theta, phi),
            Scattering::DirectHemispherical => self.dir_hem(side, property, theta, phi),
            Scattering::DiffuseDiffuse => self.diff_diff(side, property),
        }
    }

    /// Absorptance of layer `index` (1-based) for every incoming direction.
    pub fn abs(&self, side: Side, index: usize) -> Result<&Array1<f64>, OpticsError> {
        let slot = self.slot(side, index)?;
        Ok(&self.side_abs(side).total[slot])
    }

    pub fn abs_at(&self, side: Side, index: usize, theta: f64, phi: f64) -> Result<f64, OpticsError> {
        Ok(self.abs(side, index)?[self.nearest_index(theta, phi)])
    }

    /// Part of the absorptance of layer `index` converted to electricity.
    pub fn abs_electricity(&self, side: Side, index: usize) -> Result<&Array1<f64>, OpticsError> {
        let slot = self.slot(side, index)?;
        Ok(&self.side_abs(side).electricity[slot])
    }

    pub fn abs_electricity_at(
        &self,
        side: Side,
        index: usize,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        Ok(self.abs_electricity(side, index)?[self.nearest_index(theta, phi)])
    }

    /// Part of the absorptance of layer `index` released as heat.
    pub fn abs_heat(&self, side: Side, index: usize) -> Result<Array1<f64>, OpticsError> {
        Ok(self.abs(side, index)? - self.abs_electricity(side, index)?)
    }

    pub fn abs_heat_at(&self, side: Side, index: usize, theta: f64, phi: f64) -> Result<f64, OpticsError> {
        Ok(self.abs_at(side, index, theta, phi)? - self.abs_electricity_at(side, index, theta, phi)?)
    }

    /// Absorptance of layer `index` under diffuse incidence.
    pub fn abs_diff(&self, side: Side, index: usize) -> Result<f64, OpticsError> {
        Ok(self.hemispherical_average(self.abs(side, index)?))
    }

    pub fn abs_diff_electricity(&self, side: Side, index: usize) -> Result<f64, OpticsError> {
        Ok(self.hemispherical_average(self.abs_electricity(side, index)?))
    }

    pub fn abs_diff_heat(&self, side: Side, index: usize) -> Result<f64, OpticsError> {
        Ok(self.abs_diff(side, index)? - self.abs_diff_electricity(side, index)?)
    }

    /// Absorptance of every layer in index order: front to back for
    /// [`Side::Front`], back to front for [`Side::Back`].
    pub fn absorptance_layers(
        &self,
        side: Side,
        scattering: ScatteringSimple,
        theta: f64,
        phi: f64,
    ) -> Vec<f64> {
        let beam = self.nearest_index(theta, phi);
        let mut values: Vec<f64> = self
            .side_abs(side)
            .total
            .iter()
            .map(|a| match scattering {
                ScatteringSimple::Direct => a[beam],
                ScatteringSimple::Diffuse => self.hemispherical_average(a),
            })
            .collect();
        if side == Side::Back {
            values.reverse();
        }
        values
    }

    /// Incident power for the patch nearest to `(theta, phi)`.
    pub fn incident_power(&self, theta: f64, phi: f64) -> f64 {
        self.incident_power[self.nearest_index(theta, phi)]
    }

    /// Power transmitted or reflected for a beam at `(theta, phi)`.
    pub fn energy(&self, side: Side, property: Property, theta: f64, phi: f64) -> f64 {
        let index = self.nearest_index(theta, phi);
        self.dir_hem_index(side, property, index) * self.incident_power[index]
    }

    /// Power absorbed in layer `index` for a beam at `(theta, phi)`.
    pub fn energy_abs(&self, side: Side, index: usize, theta: f64, phi: f64) -> Result<f64, OpticsError> {
        let beam = self.nearest_index(theta, phi);
        Ok(self.abs(side, index)?[beam] * self.incident_power[beam])
    }

    /// Scalar summary at one incidence direction.
    pub fn summary(&self, theta: f64, phi: f64) -> ResultSummary {
        let layers = |side, scattering| self.absorptance_layers(side, scattering, theta, phi);
        ResultSummary {
            min_lambda: self.min_lambda,
            max_lambda: self.max_lambda,
            theta,
            phi,
            tau_front_dir_dir: self.dir_dir(Side::Front, Property::Tau, theta, phi),
            tau_front_dir_hem: self.dir_hem(Side::Front, Property::Tau, theta, phi),
            rho_front_dir_hem: self.dir_hem(Side::Front, Property::Rho, theta, phi),
            tau_back_dir_hem: self.dir_hem(Side::Back, Property::Tau, theta, phi),
            rho_back_dir_hem: self.dir_hem(Side::Back, Property::Rho, theta, phi),
            tau_front_diff_diff: self.diff_diff(Side::Front, Property::Tau),
            rho_front_diff_diff: self.diff_diff(Side::Front, Property::Rho),
            rho_back_diff_diff: self.diff_diff(Side::Back, Property::Rho),
            abs_front: layers(Side::Front, ScatteringSimple::Direct),
            abs_back: layers(Side::Back, ScatteringSimple::Direct),
            abs_front_diffuse: layers(Side::Front, ScatteringSimple::Diffuse),
            abs_back_diffuse: layers(Side::Back, ScatteringSimple::Diffuse),
        }
    }

    fn hemispherical_average(&self, per_direction: &Array1<f64>) -> f64 {
        let lambda = self.basis.lambda();
        per_direction.dot(lambda) / lambda.sum()
    }

    fn side_abs(&self, side: Side) -> &SideAbsorptance {
        match side {
            Side::Front => &self.abs_front,
            Side::Back => &self.abs_back,
        }
    }

    /// Storage position (stack order) of layer `index` counted from `side`.
    fn slot(&self, side: Side, index: usize) -> Result<usize, OpticsError> {
        let count = self.layer_count();
        if index == 0 || index > count {
            return Err(OpticsError::InvalidIndex { index, count });
        }
        Ok(match side {
            Side::Front => index - 1,
            Side::Back => count - index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisResolution;
    use approx::assert_abs_diff_eq;

    /// Results for a single grey diffuser: every BSDF entry is `t / pi`.
    fn diffuser(t: f64, r: f64) -> BsdfResults {
        let basis = Arc::new(DirectionalBasis::build(BasisResolution::Quarter).unwrap());
        let n = basis.size();
        let pi = std::f64::consts::PI;
        let tau = Array2::from_elem((n, n), t / pi);
        let rho = Array2::from_elem((n, n), r / pi);
        let abs = SideAbsorptance {
            total: vec![Array1::from_elem(n, 1.0 - t - r)],
            electricity: vec![Array1::zeros(n)],
        };
        BsdfResults {
            basis,
            min_lambda: 0.3,
            max_lambda: 2.5,
            tau_front: tau.clone(),
            rho_front: rho.clone(),
            tau_back: tau,
            rho_back: rho,
            abs_front: abs.clone(),
            abs_back: abs,
            incident_power: Array1::from_elem(n, 800.0),
        }
    }

    #[test]
    fn test_diffuser_hemispherical_values() {
        let res = diffuser(0.4, 0.3);
        assert_abs_diff_eq!(res.dir_hem(Side::Front, Property::Tau, 0.0, 0.0), 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(res.dir_hem(Side::Back, Property::Rho, 60.0, 90.0), 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(res.diff_diff(Side::Front, Property::Tau), 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_dir_diff_is_hem_minus_dir() {
        let res = diffuser(0.4, 0.3);
        let hem = res.dir_hem(Side::Front, Property::Tau, 30.0, 0.0);
        let dir = res.dir_dir(Side::Front, Property::Tau, 30.0, 0.0);
        assert_abs_diff_eq!(
            res.property_simple(Side::Front, Property::Tau, Scattering::DirectDiffuse, 30.0, 0.0),
            hem - dir,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_layer_index_is_one_based() {
        let res = diffuser(0.4, 0.3);
        assert_abs_diff_eq!(res.abs_at(Side::Front, 1, 0.0, 0.0).unwrap(), 0.3, epsilon = 1e-12);
        assert!(matches!(
            res.abs(Side::Front, 0),
            Err(OpticsError::InvalidIndex { index: 0, count: 1 })
        ));
        assert!(matches!(
            res.abs(Side::Back, 2),
            Err(OpticsError::InvalidIndex { index: 2, count: 1 })
        ));
    }

    #[test]
    fn test_back_indices_count_from_the_back() {
        let mut res = diffuser(0.4, 0.3);
        let n = res.basis.size();
        // stack order: front-most layer first
        res.abs_back = SideAbsorptance {
            total: vec![Array1::from_elem(n, 0.12), Array1::from_elem(n, 0.18)],
            electricity: vec![Array1::zeros(n), Array1::from_elem(n, 0.05)],
        };
        res.abs_front = res.abs_back.clone();

        assert_abs_diff_eq!(res.abs_at(Side::Back, 1, 0.0, 0.0).unwrap(), 0.18, epsilon = 1e-12);
        assert_abs_diff_eq!(res.abs_at(Side::Back, 2, 0.0, 0.0).unwrap(), 0.12, epsilon = 1e-12);
        assert_abs_diff_eq!(res.abs_at(Side::Front, 1, 0.0, 0.0).unwrap(), 0.12, epsilon = 1e-12);
        assert_abs_diff_eq!(res.abs_diff_electricity(Side::Back, 1).unwrap(), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(res.abs_diff_heat(Side::Back, 1).unwrap(), 0.13, epsilon = 1e-12);
        assert_eq!(
            res.absorptance_layers(Side::Back, ScatteringSimple::Direct, 0.0, 0.0),
            vec![0.18, 0.12]
        );
        assert_eq!(
            res.absorptance_layers(Side::Front, ScatteringSimple::Direct, 0.0, 0.0),
            vec![0.12, 0.18]
        );
        assert_eq!(res.summary(0.0, 0.0).abs_back, vec![0.18, 0.12]);
    }

    #[test]
    fn test_heat_and_electricity_split() {
        let res = diffuser(0.4, 0.3);
        assert_abs_diff_eq!(res.abs_diff_heat(Side::Front, 1).unwrap(), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(res.abs_diff_electricity(Side::Front, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_energy_scales_by_incident_power() {
        let res = diffuser(0.4, 0.3);
        assert_abs_diff_eq!(res.energy(Side::Front, Property::Tau, 0.0, 0.0), 320.0, epsilon = 1e-6);
        assert_abs_diff_eq!(res.energy_abs(Side::Front, 1, 0.0, 0.0).unwrap(), 240.0, epsilon = 1e-6);
    }
}
