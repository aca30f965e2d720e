//! Integration test: stacks of perfectly diffusing layers.
//!
//! Two Lambertian layers have a closed-form combination, which makes them a
//! convenient end-to-end check of the combinator, the spectral integration
//! and the result queries on a non-diagonal basis matrix.

use std::f64::consts::PI;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use vitrum_core::{
    BandProperties, BasisResolution, DirectionalBasis, MultiPaneBsdf, OpticalLayer, OpticsError,
    Property, ScatteringSimple, Series, Side,
};

struct LambertPane {
    basis: Arc<DirectionalBasis>,
    grid: Vec<f64>,
    tau: Vec<f64>,
    rho: f64,
}

impl OpticalLayer for LambertPane {
    fn basis(&self) -> &Arc<DirectionalBasis> {
        &self.basis
    }

    fn wavelengths(&self) -> &[f64] {
        &self.grid
    }

    fn band_properties(&self, index: usize) -> Result<BandProperties, OpticsError> {
        let n = self.basis.size();
        let uniform = |v: f64| Array2::from_elem((n, n), v / PI);
        let t = self.tau[index];
        BandProperties::from_bsdf(
            &self.basis,
            uniform(t),
            uniform(self.rho),
            uniform(t),
            uniform(self.rho),
        )
    }

    fn name(&self) -> &str {
        "lambertian"
    }
}

fn pane(basis: &Arc<DirectionalBasis>, tau: [f64; 2], rho: f64) -> Arc<dyn OpticalLayer> {
    Arc::new(LambertPane {
        basis: basis.clone(),
        grid: vec![0.4, 0.6],
        tau: tau.to_vec(),
        rho,
    })
}

fn flat_sun() -> Series {
    Series::new([(0.4, 1.0), (0.6, 1.0)]).unwrap()
}

#[test]
fn test_two_lambertian_layers_closed_form() {
    let basis = Arc::new(DirectionalBasis::build(BasisResolution::Quarter).unwrap());
    let layers = vec![pane(&basis, [0.5, 0.5], 0.3), pane(&basis, [0.6, 0.6], 0.2)];
    let mut system = MultiPaneBsdf::new(layers, flat_sun()).unwrap();
    let results = system.calculate(0.4, 0.6).unwrap();

    let tau = 0.5 * 0.6 / (1.0 - 0.3 * 0.2);
    let rho_front = 0.3 + 0.5 * 0.2 * 0.5 / (1.0 - 0.3 * 0.2);
    for j in [0, 5, 40] {
        assert_abs_diff_eq!(results.dir_hem_index(Side::Front, Property::Tau, j), tau, epsilon = 1e-10);
        assert_abs_diff_eq!(
            results.dir_hem_index(Side::Front, Property::Rho, j),
            rho_front,
            epsilon = 1e-10
        );
    }
    assert_abs_diff_eq!(results.diff_diff(Side::Back, Property::Tau), tau, epsilon = 1e-10);

    for side in Side::ALL {
        let absorbed: f64 = results
            .absorptance_layers(side, ScatteringSimple::Diffuse, 0.0, 0.0)
            .iter()
            .sum();
        let t = results.diff_diff(side, Property::Tau);
        let r = results.diff_diff(side, Property::Rho);
        assert_abs_diff_eq!(t + r + absorbed, 1.0, epsilon = 1e-10);
    }
}

#[test]
fn test_per_direction_incident_spectra() {
    let basis = Arc::new(DirectionalBasis::build(BasisResolution::Small).unwrap());
    let mut system = MultiPaneBsdf::new(vec![pane(&basis, [0.2, 0.6], 0.1)], flat_sun()).unwrap();
    let flat = system.dir_hem_index(0.4, 0.6, Side::Front, Property::Tau, 0).unwrap();
    assert_abs_diff_eq!(flat, 0.4, epsilon = 1e-12);

    let mut spectra = vec![flat_sun(); basis.size()];
    spectra[0] = Series::new([(0.4, 0.0), (0.6, 1.0)]).unwrap();
    system.set_incoming_spectra(spectra).unwrap();

    let weighted = system.dir_hem_index(0.4, 0.6, Side::Front, Property::Tau, 0).unwrap();
    let other = system.dir_hem_index(0.4, 0.6, Side::Front, Property::Tau, 3).unwrap();
    assert_abs_diff_eq!(weighted, 0.6, epsilon = 1e-12);
    assert_abs_diff_eq!(other, 0.4, epsilon = 1e-12);

    assert!(system.set_incoming_spectra(vec![flat_sun()]).is_err());
}

#[test]
fn test_summary_serialises() {
    let basis = Arc::new(DirectionalBasis::build(BasisResolution::Small).unwrap());
    let mut system = MultiPaneBsdf::new(vec![pane(&basis, [0.5, 0.5], 0.3)], flat_sun()).unwrap();
    let summary = system.calculate(0.4, 0.6).unwrap().summary(0.0, 0.0);
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["abs_front"].as_array().unwrap().len(), 1);
    assert_abs_diff_eq!(json["tau_front_dir_hem"].as_f64().unwrap(), 0.5, epsilon = 1e-12);
}
