//! Spectral-directional orchestrator for a stack of BSDF layers.
//!
//! [`MultiPaneBsdf`] owns the per-wavelength layer stacks, the incident
//! spectrum and a cache of band-integrated results. For a wavelength range
//! $[\lambda_{min}, \lambda_{max}]$ every incoming direction $j$ is weighted by
//! its incident spectrum $E_j(\lambda)$:
//!
//! $$\bar{X}_{ij} = \frac{\int X_{ij}(\lambda) E_j(\lambda)\,d\lambda}{\int E_j(\lambda)\,d\lambda}$$
//!
//! where $X$ is a flux transfer matrix of the stack or an in-context layer
//! absorptance.
//!
//! Layers are combined at every wavelength of their merged grid. When a
//! calculation grid is supplied the combined results are interpolated onto it
//! before weighting, so the incident spectrum is integrated on its own knots.
//!
//! Photovoltaic layers additionally convert part of their absorbed flux to
//! electricity. With spectral responsivity $S_k(\lambda)$ the short-circuit
//! current for incidence $j$ is
//!
//! $$J_{sc,kj} = \int A_{kj}(\lambda) E_j(\lambda) S_k(\lambda)\,d\lambda$$
//!
//! and the electrical fraction is $V_{oc}(J_{sc}) \cdot FF(J_{sc}) \cdot J_{sc} / \int E_j\,d\lambda$,
//! with the cell curves evaluated on the current before any integration
//! normalization is applied.
//! The remainder of the absorptance is heat.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array2};
use vitrum_compute::ComputeBackend;

use crate::basis::DirectionalBasis;
use crate::equivalent::SpectralStacks;
use crate::error::OpticsError;
use crate::layer::OpticalLayer;
use crate::results::{BsdfResults, SideAbsorptance};
use crate::series::{MatrixSeries, Series};
use crate::types::{IntegrationRule, Property, Scattering, ScatteringSimple, Side};

/// Construction options for [`MultiPaneBsdf`].
#[derive(Clone)]
pub struct MultiPaneOptions {
    /// Detector response multiplied into the incident spectrum.
    pub detector: Option<Series>,
    /// Calculation grid the combined results are interpolated onto; the
    /// merged layer grid otherwise.
    pub wavelengths: Option<Vec<f64>>,
    pub rule: IntegrationRule,
    pub normalization: f64,
    /// Backend for stack combination and spectral reductions;
    /// [`vitrum_compute::default_backend`] otherwise.
    pub backend: Option<Arc<dyn ComputeBackend>>,
}

impl Default for MultiPaneOptions {
    fn default() -> Self {
        Self {
            detector: None,
            wavelengths: None,
            rule: IntegrationRule::Trapezoidal,
            normalization: 1.0,
            backend: None,
        }
    }
}

impl fmt::Debug for MultiPaneOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiPaneOptions")
            .field("detector", &self.detector)
            .field("wavelengths", &self.wavelengths.as_ref().map(Vec::len))
            .field("rule", &self.rule)
            .field("normalization", &self.normalization)
            .field(
                "backend",
                &self.backend.as_ref().map(|b| b.device_info().name),
            )
            .finish()
    }
}

pub struct MultiPaneBsdf {
    stacks: SpectralStacks,
    /// Calculation grid; follows the merged layer grid if unset.
    calculation_grid: Option<Vec<f64>>,
    /// Incident spectrum with the detector response applied.
    spectrum: Series,
    /// Per-direction incident spectra; every direction sees `spectrum` if unset.
    incoming_spectra: Option<Vec<Series>>,
    rule: IntegrationRule,
    normalization: f64,
    cache: HashMap<(u64, u64), Arc<BsdfResults>>,
    version: u64,
}

impl MultiPaneBsdf {
    /// Build from layers ordered front (exterior) to back.
    pub fn new(layers: Vec<Arc<dyn OpticalLayer>>, spectrum: Series) -> Result<Self, OpticsError> {
        Self::with_options(layers, spectrum, MultiPaneOptions::default())
    }

    pub fn with_options(
        layers: Vec<Arc<dyn OpticalLayer>>,
        spectrum: Series,
        options: MultiPaneOptions,
    ) -> Result<Self, OpticsError> {
        let spectrum = prepare_spectrum(spectrum, &options)?;
        let backend = options
            .backend
            .unwrap_or_else(vitrum_compute::default_backend);
        let stacks = SpectralStacks::new(layers, backend)?;
        log::info!(
            "Multi-pane BSDF with {} layers on {} wavelengths ({} directions)",
            stacks.layer_count(),
            stacks.wavelengths().len(),
            stacks.basis().size()
        );
        Ok(Self {
            stacks,
            calculation_grid: options.wavelengths,
            spectrum,
            incoming_spectra: None,
            rule: options.rule,
            normalization: options.normalization,
            cache: HashMap::new(),
            version: 0,
        })
    }

    /// Append a layer at the back of the stack. Invalidates cached results.
    pub fn add_layer(&mut self, layer: Arc<dyn OpticalLayer>) -> Result<(), OpticsError> {
        self.stacks.add_layer(layer)?;
        self.invalidate();
        Ok(())
    }

    /// Change the integration rule. Invalidates cached results.
    pub fn set_integration_rule(
        &mut self,
        rule: IntegrationRule,
        normalization: f64,
    ) -> Result<(), OpticsError> {
        crate::series::check_normalization(normalization)?;
        self.rule = rule;
        self.normalization = normalization;
        self.invalidate();
        Ok(())
    }

    /// Give every incoming direction its own incident spectrum.
    pub fn set_incoming_spectra(&mut self, spectra: Vec<Series>) -> Result<(), OpticsError> {
        let n = self.basis().size();
        if spectra.len() != n {
            return Err(OpticsError::InvalidSeries(format!(
                "{} incoming spectra supplied for {n} directions",
                spectra.len()
            )));
        }
        self.incoming_spectra = Some(spectra);
        self.invalidate();
        Ok(())
    }

    pub fn basis(&self) -> &Arc<DirectionalBasis> {
        self.stacks.basis()
    }

    pub fn layer_count(&self) -> usize {
        self.stacks.layer_count()
    }

    /// The calculation grid results are integrated on.
    pub fn wavelengths(&self) -> &[f64] {
        self.calculation_grid
            .as_deref()
            .unwrap_or_else(|| self.stacks.wavelengths())
    }

    /// The merged layer grid the stack is combined on.
    pub fn layer_wavelengths(&self) -> &[f64] {
        self.stacks.wavelengths()
    }

    pub fn min_lambda(&self) -> f64 {
        self.wavelengths().first().copied().unwrap_or(0.0)
    }

    pub fn max_lambda(&self) -> f64 {
        self.wavelengths().last().copied().unwrap_or(0.0)
    }

    /// Cache generation; bumped whenever cached results become stale.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Band-integrated results over `[min_lambda, max_lambda]`.
    ///
    /// Results are cached per exact range; repeated calls return the same
    /// shared result until a layer is added or the integration rule changes.
    ///
    /// # Errors
    ///
    /// [`OpticsError::InvalidSeries`] if the range is not finite and ordered,
    /// or if no incident power falls inside it for some direction (a range
    /// outside the grid, or one too narrow to start an interval).
    pub fn calculate(&mut self, min_lambda: f64, max_lambda: f64) -> Result<Arc<BsdfResults>, OpticsError> {
        check_range(min_lambda, max_lambda)?;
        let key = (min_lambda.to_bits(), max_lambda.to_bits());
        if let Some(results) = self.cache.get(&key) {
            log::debug!("Cache hit for [{min_lambda}, {max_lambda}] (version {})", self.version);
            return Ok(results.clone());
        }

        log::info!("Integrating layer stack over [{min_lambda}, {max_lambda}] um");
        let results = Arc::new(self.integrate(min_lambda, max_lambda)?);
        self.cache.insert(key, results.clone());
        Ok(results)
    }

    pub fn get_matrix(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
    ) -> Result<Array2<f64>, OpticsError> {
        Ok(self.calculate(min_lambda, max_lambda)?.matrix(side, property).clone())
    }

    pub fn dir_dir(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        Ok(self.calculate(min_lambda, max_lambda)?.dir_dir(side, property, theta, phi))
    }

    pub fn dir_dir_index(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        index: usize,
    ) -> Result<f64, OpticsError> {
        let results = self.calculate(min_lambda, max_lambda)?;
        check_beam(index, results.basis().size())?;
        Ok(results.dir_dir_index(side, property, index))
    }

    pub fn dir_hem(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        Ok(self.calculate(min_lambda, max_lambda)?.dir_hem(side, property, theta, phi))
    }

    pub fn dir_hem_index(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        index: usize,
    ) -> Result<f64, OpticsError> {
        let results = self.calculate(min_lambda, max_lambda)?;
        check_beam(index, results.basis().size())?;
        Ok(results.dir_hem_index(side, property, index))
    }

    pub fn dir_diff(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        Ok(self.calculate(min_lambda, max_lambda)?.dir_diff(side, property, theta, phi))
    }

    pub fn diff_diff(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
    ) -> Result<f64, OpticsError> {
        Ok(self.calculate(min_lambda, max_lambda)?.diff_diff(side, property))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn property_simple(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        scattering: Scattering,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        Ok(self
            .calculate(min_lambda, max_lambda)?
            .property_simple(side, property, scattering, theta, phi))
    }

    /// Absorptance of layer `index` (1-based) for every incoming direction.
    pub fn abs(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
    ) -> Result<Array1<f64>, OpticsError> {
        Ok(self.calculate(min_lambda, max_lambda)?.abs(side, index)?.clone())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn abs_at(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        self.calculate(min_lambda, max_lambda)?.abs_at(side, index, theta, phi)
    }

    pub fn abs_heat(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
    ) -> Result<Array1<f64>, OpticsError> {
        self.calculate(min_lambda, max_lambda)?.abs_heat(side, index)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn abs_heat_at(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        self.calculate(min_lambda, max_lambda)?.abs_heat_at(side, index, theta, phi)
    }

    pub fn abs_electricity(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
    ) -> Result<Array1<f64>, OpticsError> {
        Ok(self
            .calculate(min_lambda, max_lambda)?
            .abs_electricity(side, index)?
            .clone())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn abs_electricity_at(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        self.calculate(min_lambda, max_lambda)?
            .abs_electricity_at(side, index, theta, phi)
    }

    pub fn abs_diff(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
    ) -> Result<f64, OpticsError> {
        self.calculate(min_lambda, max_lambda)?.abs_diff(side, index)
    }

    pub fn abs_diff_heat(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
    ) -> Result<f64, OpticsError> {
        self.calculate(min_lambda, max_lambda)?.abs_diff_heat(side, index)
    }

    pub fn abs_diff_electricity(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
    ) -> Result<f64, OpticsError> {
        self.calculate(min_lambda, max_lambda)?
            .abs_diff_electricity(side, index)
    }

    /// Absorptance of every layer, front to back.
    #[allow(clippy::too_many_arguments)]
    pub fn absorptance_layers(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        scattering: ScatteringSimple,
        theta: f64,
        phi: f64,
    ) -> Result<Vec<f64>, OpticsError> {
        Ok(self
            .calculate(min_lambda, max_lambda)?
            .absorptance_layers(side, scattering, theta, phi))
    }

    /// Transmitted or reflected power (W/m²) for a beam at `(theta, phi)`.
    #[allow(clippy::too_many_arguments)]
    pub fn energy(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        Ok(self
            .calculate(min_lambda, max_lambda)?
            .energy(side, property, theta, phi))
    }

    /// Power absorbed (W/m²) in layer `index` for a beam at `(theta, phi)`.
    #[allow(clippy::too_many_arguments)]
    pub fn energy_abs(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
        theta: f64,
        phi: f64,
    ) -> Result<f64, OpticsError> {
        self.calculate(min_lambda, max_lambda)?
            .energy_abs(side, index, theta, phi)
    }

    fn invalidate(&mut self) {
        self.version += 1;
        self.cache.clear();
        log::debug!("Result cache invalidated (version {})", self.version);
    }

    /// Incident spectra for every direction, resampled on the calculation grid.
    fn incident_loads(&self) -> Result<Vec<Series>, OpticsError> {
        let grid = self.wavelengths();
        match &self.incoming_spectra {
            Some(spectra) => spectra.iter().map(|s| s.interpolate(grid)).collect(),
            None => {
                let load = self.spectrum.interpolate(grid)?;
                Ok(vec![load; self.basis().size()])
            }
        }
    }

    fn integrate(&self, min_lambda: f64, max_lambda: f64) -> Result<BsdfResults, OpticsError> {
        let basis = self.basis().clone();
        let lambda = basis.lambda();
        let loads = self.incident_loads()?;
        let incident_power: Array1<f64> = loads
            .iter()
            .map(|load| {
                load.integrate(self.rule, self.normalization)
                    .map(|c| c.sum(min_lambda, max_lambda))
            })
            .collect::<Result<_, _>>()?;
        if let Some((j, power)) = incident_power
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.is_finite() && **p > 0.0))
        {
            return Err(OpticsError::InvalidSeries(format!(
                "incident power {power} for direction {j} over [{min_lambda}, {max_lambda}]"
            )));
        }
        let divisors = incident_power.to_vec();
        let backend = self.stacks.backend().as_ref();

        let band_integrated = |series: MatrixSeries| -> Result<Array2<f64>, OpticsError> {
            series
                .scale_by_columns(&loads)?
                .integrate(self.rule, self.normalization)?
                .reduce_to_matrix(min_lambda, max_lambda, &divisors, backend)
        };
        let to_bsdf = |mut flux: Array2<f64>| -> Array2<f64> {
            for (mut row, &l) in flux.rows_mut().into_iter().zip(lambda.iter()) {
                row /= l;
            }
            flux
        };

        let mut matrices = HashMap::new();
        for side in Side::ALL {
            for property in Property::ALL {
                let flux = band_integrated(self.on_grid(self.stacks.flux_series(side, property)?)?)?;
                matrices.insert((side, property), to_bsdf(flux));
            }
        }

        let mut absorptance = HashMap::new();
        for side in Side::ALL {
            let series = self.on_grid(self.stacks.absorptance_series(side)?)?;
            let total = band_integrated(series.clone())?;
            let electricity = self.electricity(&series, &loads, &divisors, min_lambda, max_lambda)?;
            absorptance.insert(
                side,
                SideAbsorptance {
                    total: total.rows().into_iter().map(|r| r.to_owned()).collect(),
                    electricity,
                },
            );
        }

        let mut take = |side: Side, property: Property| matrices.remove(&(side, property)).unwrap_or_default();
        Ok(BsdfResults {
            basis,
            min_lambda,
            max_lambda,
            tau_front: take(Side::Front, Property::Tau),
            rho_front: take(Side::Front, Property::Rho),
            tau_back: take(Side::Back, Property::Tau),
            rho_back: take(Side::Back, Property::Rho),
            abs_front: absorptance.remove(&Side::Front).unwrap_or_default(),
            abs_back: absorptance.remove(&Side::Back).unwrap_or_default(),
            incident_power,
        })
    }

    fn on_grid(&self, series: MatrixSeries) -> Result<MatrixSeries, OpticsError> {
        match &self.calculation_grid {
            Some(grid) => series.interpolate(grid),
            None => Ok(series),
        }
    }

    /// Electrical fraction of the absorptance of every layer.
    fn electricity(
        &self,
        absorptance: &MatrixSeries,
        loads: &[Series],
        divisors: &[f64],
        min_lambda: f64,
        max_lambda: f64,
    ) -> Result<Vec<Array1<f64>>, OpticsError> {
        let n = self.basis().size();
        let layers = self.stacks.layers();
        if layers.iter().all(|l| l.photovoltaic().is_none()) {
            return Ok(vec![Array1::zeros(n); layers.len()]);
        }

        let grid = self.wavelengths();
        let responsivity: Vec<Series> = layers
            .iter()
            .map(|layer| {
                let values = grid
                    .iter()
                    .map(|&x| layer.photovoltaic().map_or(0.0, |pv| pv.responsivity(x)))
                    .collect();
                Series::from_sorted(grid.to_vec(), values)
            })
            .collect();

        let jsc = absorptance
            .scale_by_columns(loads)?
            .scale_by_rows(&responsivity)?
            .integrate(self.rule, self.normalization)?
            .sum(min_lambda, max_lambda);

        Ok(layers
            .iter()
            .enumerate()
            .map(|(k, layer)| match layer.photovoltaic() {
                None => Array1::zeros(n),
                Some(pv) => Array1::from_shape_fn(n, |j| {
                    let current = jsc[[k, j]];
                    let raw = current * self.normalization;
                    pv.voc(raw) * pv.ff(raw) * current / divisors[j]
                }),
            })
            .collect())
    }
}

/// Validate `options` and apply its detector response to `spectrum`.
pub(crate) fn prepare_spectrum(
    spectrum: Series,
    options: &MultiPaneOptions,
) -> Result<Series, OpticsError> {
    if spectrum.is_empty() {
        return Err(OpticsError::InvalidSeries("incident spectrum is empty".into()));
    }
    crate::series::check_normalization(options.normalization)?;
    if let Some(grid) = &options.wavelengths {
        if grid.is_empty() || grid.windows(2).any(|p| p[0] >= p[1]) {
            return Err(OpticsError::InvalidSeries(
                "calculation wavelengths must be non-empty and strictly ascending".into(),
            ));
        }
    }
    match &options.detector {
        Some(detector) => Series::new(
            spectrum
                .iter()
                .map(|(x, y)| (x, y * detector.value_at(x))),
        ),
        None => Ok(spectrum),
    }
}

pub(crate) fn check_range(min_lambda: f64, max_lambda: f64) -> Result<(), OpticsError> {
    if !min_lambda.is_finite() || !max_lambda.is_finite() || min_lambda > max_lambda {
        return Err(OpticsError::InvalidSeries(format!(
            "invalid wavelength range [{min_lambda}, {max_lambda}]"
        )));
    }
    Ok(())
}

fn check_beam(index: usize, size: usize) -> Result<(), OpticsError> {
    if index >= size {
        return Err(OpticsError::InvalidIndex { index, count: size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisResolution;
    use crate::layer::{BandProperties, PhotovoltaicResponse};
    use approx::assert_abs_diff_eq;
    use vitrum_compute::SerialBackend;

    struct FlatPane {
        basis: Arc<DirectionalBasis>,
        grid: Vec<f64>,
        tau: Vec<f64>,
        rho: f64,
        cell: Option<LinearCell>,
    }

    /// Unit responsivity, a voltage equal to the current and a fill factor of one.
    struct LinearCell;

    impl PhotovoltaicResponse for LinearCell {
        fn responsivity(&self, _wavelength: f64) -> f64 {
            1.0
        }

        fn voc(&self, jsc: f64) -> f64 {
            jsc
        }

        fn ff(&self, _jsc: f64) -> f64 {
            1.0
        }
    }

    impl OpticalLayer for FlatPane {
        fn basis(&self) -> &Arc<DirectionalBasis> {
            &self.basis
        }

        fn wavelengths(&self) -> &[f64] {
            &self.grid
        }

        fn band_properties(&self, index: usize) -> Result<BandProperties, OpticsError> {
            let inv = self.basis.lambda().mapv(|l| 1.0 / l);
            let diag = |v: f64| Array2::from_diag(&inv.mapv(|x| x * v));
            let t = self.tau[index];
            BandProperties::from_bsdf(&self.basis, diag(t), diag(self.rho), diag(t), diag(self.rho))
        }

        fn photovoltaic(&self) -> Option<&dyn PhotovoltaicResponse> {
            self.cell.as_ref().map(|c| c as &dyn PhotovoltaicResponse)
        }
    }

    fn basis() -> Arc<DirectionalBasis> {
        Arc::new(DirectionalBasis::build(BasisResolution::Small).unwrap())
    }

    fn flat(basis: &Arc<DirectionalBasis>, tau: [f64; 3], rho: f64) -> Arc<dyn OpticalLayer> {
        Arc::new(FlatPane {
            basis: basis.clone(),
            grid: vec![0.4, 0.5, 0.6],
            tau: tau.to_vec(),
            rho,
            cell: None,
        })
    }

    fn sun() -> Series {
        Series::new(vec![(0.4, 1.0), (0.5, 1.0), (0.6, 1.0)]).unwrap()
    }

    #[test]
    fn test_flat_spectrum_averages_band_values() {
        let b = basis();
        let mut mp = MultiPaneBsdf::new(vec![flat(&b, [0.2, 0.4, 0.6], 0.1)], sun()).unwrap();
        // trapezoid of a linear ramp with a flat spectrum
        let t = mp.dir_dir(0.4, 0.6, Side::Front, Property::Tau, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(t, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_cache_returns_same_results() {
        let b = basis();
        let mut mp = MultiPaneBsdf::new(vec![flat(&b, [0.8; 3], 0.1)], sun()).unwrap();
        let first = mp.calculate(0.4, 0.6).unwrap();
        let second = mp.calculate(0.4, 0.6).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = mp.calculate(0.45, 0.6).unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn test_add_layer_invalidates_cache() {
        let b = basis();
        let mut mp = MultiPaneBsdf::new(vec![flat(&b, [0.8; 3], 0.1)], sun()).unwrap();
        let before = mp.calculate(0.4, 0.6).unwrap();
        let version = mp.version();
        mp.add_layer(flat(&b, [0.8; 3], 0.1)).unwrap();
        assert!(mp.version() > version);
        let after = mp.calculate(0.4, 0.6).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.layer_count(), 2);
        // the previously returned result is untouched
        assert_eq!(before.layer_count(), 1);
        assert_abs_diff_eq!(
            after.dir_dir(Side::Front, Property::Tau, 0.0, 0.0),
            0.64 / 0.99,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_detector_weights_spectrum() {
        let b = basis();
        let detector = Series::new(vec![(0.4, 0.0), (0.5, 0.0), (0.6, 1.0)]).unwrap();
        let options = MultiPaneOptions {
            detector: Some(detector),
            ..Default::default()
        };
        let mut mp =
            MultiPaneBsdf::with_options(vec![flat(&b, [0.2, 0.4, 0.6], 0.1)], sun(), options)
                .unwrap();
        // only the 0.5-0.6 interval carries weight: (0.4*0 + 0.6*1) / (0 + 1)
        let t = mp.dir_dir(0.4, 0.6, Side::Front, Property::Tau, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(t, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_layer_index() {
        let b = basis();
        let mut mp = MultiPaneBsdf::new(vec![flat(&b, [0.8; 3], 0.1)], sun()).unwrap();
        assert!(matches!(
            mp.abs_diff(0.4, 0.6, Side::Front, 0),
            Err(OpticsError::InvalidIndex { .. })
        ));
        assert!(matches!(
            mp.abs_diff(0.4, 0.6, Side::Front, 2),
            Err(OpticsError::InvalidIndex { .. })
        ));
        assert!(mp.abs_diff(0.4, 0.6, Side::Front, 1).is_ok());
    }

    #[test]
    fn test_energy_balance_after_integration() {
        let b = basis();
        let mut mp = MultiPaneBsdf::new(
            vec![flat(&b, [0.7, 0.75, 0.8], 0.08), flat(&b, [0.5, 0.6, 0.4], 0.2)],
            sun(),
        )
        .unwrap();
        let res = mp.calculate(0.4, 0.6).unwrap();
        for side in Side::ALL {
            let t = res.dir_hem(side, Property::Tau, 40.0, 0.0);
            let r = res.dir_hem(side, Property::Rho, 40.0, 0.0);
            let a: f64 = res
                .absorptance_layers(side, ScatteringSimple::Direct, 40.0, 0.0)
                .iter()
                .sum();
            assert_abs_diff_eq!(t + r + a, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_wavelength_accessors() {
        let b = basis();
        let mp = MultiPaneBsdf::new(vec![flat(&b, [0.8; 3], 0.1)], sun()).unwrap();
        assert_eq!(mp.wavelengths(), &[0.4, 0.5, 0.6]);
        assert_eq!(mp.min_lambda(), 0.4);
        assert_eq!(mp.max_lambda(), 0.6);
    }

    #[test]
    fn test_range_without_incident_power_rejected() {
        let b = basis();
        let mut mp = MultiPaneBsdf::new(vec![flat(&b, [0.8; 3], 0.1)], sun()).unwrap();
        // outside the grid
        assert!(matches!(mp.calculate(3.0, 4.0), Err(OpticsError::InvalidSeries(_))));
        // zero width, on and between knots
        assert!(matches!(mp.calculate(0.5, 0.5), Err(OpticsError::InvalidSeries(_))));
        assert!(matches!(mp.calculate(0.45, 0.45), Err(OpticsError::InvalidSeries(_))));
        // nothing was cached, so the same range still fails
        assert!(mp.dir_dir(3.0, 4.0, Side::Front, Property::Tau, 0.0, 0.0).is_err());
        assert!(mp.calculate(0.4, 0.6).is_ok());
    }

    #[test]
    fn test_calculation_grid_interpolates_combined_results() {
        let b = basis();
        let options = MultiPaneOptions {
            wavelengths: Some(vec![0.3, 0.4, 0.6, 0.7]),
            backend: Some(Arc::new(SerialBackend)),
            ..Default::default()
        };
        let sun = Series::new(vec![(0.3, 1.0), (0.7, 1.0)]).unwrap();
        let mut mp =
            MultiPaneBsdf::with_options(vec![flat(&b, [0.2, 0.8, 0.2], 0.1)], sun, options)
                .unwrap();
        assert_eq!(mp.wavelengths(), &[0.3, 0.4, 0.6, 0.7]);
        assert_eq!(mp.layer_wavelengths(), &[0.4, 0.5, 0.6]);
        // the 0.5 peak falls between calculation knots; ends are held flat
        let t = mp.dir_dir(0.3, 0.7, Side::Front, Property::Tau, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(t, 0.2, epsilon = 1e-12);

        let merged = MultiPaneBsdf::new(vec![flat(&b, [0.2, 0.8, 0.2], 0.1)], self::sun())
            .unwrap()
            .dir_dir(0.4, 0.6, Side::Front, Property::Tau, 0.0, 0.0)
            .unwrap();
        assert_abs_diff_eq!(merged, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_unsorted_calculation_grid_rejected() {
        let b = basis();
        let options = MultiPaneOptions {
            wavelengths: Some(vec![0.5, 0.4]),
            ..Default::default()
        };
        let result = MultiPaneBsdf::with_options(vec![flat(&b, [0.8; 3], 0.1)], sun(), options);
        assert!(matches!(result, Err(OpticsError::InvalidSeries(_))));
    }

    #[test]
    fn test_cell_curves_see_unnormalized_current() {
        let b = basis();
        let cell = || -> Arc<dyn OpticalLayer> {
            Arc::new(FlatPane {
                basis: b.clone(),
                grid: vec![0.4, 0.5, 0.6],
                tau: vec![0.8; 3],
                rho: 0.1,
                cell: Some(LinearCell),
            })
        };
        let electricity = |normalization: f64| {
            let options = MultiPaneOptions {
                normalization,
                ..Default::default()
            };
            MultiPaneBsdf::with_options(vec![cell()], sun(), options)
                .unwrap()
                .abs_electricity_at(0.4, 0.6, Side::Front, 1, 0.0, 0.0)
                .unwrap()
        };
        // Jsc = 0.1 * 0.2 A/m2, so the fraction is Voc * Jsc / E = 0.02 * 0.02 / 0.2
        assert_abs_diff_eq!(electricity(1.0), 0.002, epsilon = 1e-12);
        assert_abs_diff_eq!(electricity(2.0), 0.002, epsilon = 1e-12);
        assert_abs_diff_eq!(electricity(1000.0), 0.002, epsilon = 1e-12);
    }
}
