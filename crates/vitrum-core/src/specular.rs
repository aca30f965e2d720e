//! Angle-exact spectral orchestrator for stacks of specular panes.
//!
//! A specular pane keeps a beam in its direction of incidence, so at one
//! polar angle a stack of them reduces to three scalars per wavelength: the
//! transmittance and the reflectance of each face. [`MultiPaneSpecular`]
//! combines the panes at exactly the angle asked for rather than at a basis
//! patch centre. Appending a pane $(t, r_f, r_b)$ behind an equivalent layer
//! $(T, R_f, R_b)$ gives
//!
//! $$T' = \frac{T\,t}{1 - R_b r_f}, \qquad R_f' = R_f + \frac{T^2 r_f}{1 - R_b r_f}, \qquad R_b' = r_b + \frac{t^2 R_b}{1 - R_b r_f}$$
//!
//! Layers are combined on their merged wavelength grid; with a calculation
//! grid the combined values are interpolated onto it before being weighted by
//! the incident spectrum. Diffuse-diffuse values integrate the angular results
//! at 0°, 10°, ..., 90° with [`hemispherical_2d`].
//!
//! Layer indices follow [`results`](crate::results): back-side index 1 is the
//! back-most layer.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use vitrum_compute::ComputeBackend;

use crate::equivalent::per_wavelength;
use crate::error::OpticsError;
use crate::hemispherical::hemispherical_2d;
use crate::multipane::{check_range, prepare_spectrum, MultiPaneOptions};
use crate::series::{common_wavelengths, interpolate_at, Series};
use crate::types::{IntegrationRule, Property, Scattering, ScatteringSimple, Side};

/// Incidence angles (degrees) sampled for hemispherical integration.
pub const HEMISPHERE_ANGLES: [f64; 10] = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];

/// Transmittance and face reflectances of a specular layer at one wavelength
/// and angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpecularProperties {
    pub tau: f64,
    pub rho_front: f64,
    pub rho_back: f64,
}

impl SpecularProperties {
    /// Transmits everything; the identity of [`then`](Self::then).
    pub const CLEAR: Self = Self {
        tau: 1.0,
        rho_front: 0.0,
        rho_back: 0.0,
    };

    pub fn rho(&self, side: Side) -> f64 {
        match side {
            Side::Front => self.rho_front,
            Side::Back => self.rho_back,
        }
    }

    pub fn absorptance(&self, side: Side) -> f64 {
        1.0 - self.tau - self.rho(side)
    }

    /// The same layer seen from its back.
    pub fn flipped(&self) -> Self {
        Self {
            tau: self.tau,
            rho_front: self.rho_back,
            rho_back: self.rho_front,
        }
    }

    /// Equivalent of `self` with `next` placed behind it.
    pub fn then(&self, next: &Self) -> Self {
        let m = interreflection(self.rho_back, next.rho_front);
        Self {
            tau: self.tau * next.tau * m,
            rho_front: self.rho_front + self.tau * self.tau * next.rho_front * m,
            rho_back: next.rho_back + next.tau * next.tau * self.rho_back * m,
        }
    }
}

/// A layer whose properties depend only on wavelength and polar angle.
pub trait SpecularLayer: Send + Sync {
    /// Native wavelengths (µm), strictly ascending.
    fn wavelengths(&self) -> &[f64];

    /// Properties at `wavelength` (µm) for a beam `theta` degrees off the
    /// normal.
    fn properties_at(&self, wavelength: f64, theta: f64) -> Result<SpecularProperties, OpticsError>;

    fn name(&self) -> &str {
        "specular layer"
    }
}

/// Geometric sum of the bounces between reflectances `a` and `b`.
///
/// Zero once `a * b` reaches one: a face that reflects everything transmits
/// nothing, so every term this multiplies vanishes.
fn interreflection(a: f64, b: f64) -> f64 {
    let denom = 1.0 - a * b;
    if denom <= 0.0 {
        0.0
    } else {
        1.0 / denom
    }
}

/// Equivalent of `layers`, front to back.
pub fn combine(layers: &[SpecularProperties]) -> SpecularProperties {
    layers
        .iter()
        .fold(SpecularProperties::CLEAR, |acc, layer| acc.then(layer))
}

/// In-context absorptance of every layer for light entering the front of
/// `layers`, front-most layer first.
pub fn front_absorptances(layers: &[SpecularProperties]) -> Vec<f64> {
    (0..layers.len())
        .map(|k| {
            let layer = &layers[k];
            let before = combine(&layers[..k]);
            let behind = combine(&layers[k + 1..]);
            let bounce = interreflection(layer.rho_back, behind.rho_front);
            let rho_behind = layer.rho_front + layer.tau * layer.tau * behind.rho_front * bounce;
            let forward = before.tau * interreflection(before.rho_back, rho_behind);
            let backward = forward * layer.tau * behind.rho_front * bounce;
            forward * layer.absorptance(Side::Front) + backward * layer.absorptance(Side::Back)
        })
        .collect()
}

/// In-context absorptance of every layer for light entering the back of
/// `layers`, back-most layer first.
pub fn back_absorptances(layers: &[SpecularProperties]) -> Vec<f64> {
    let reversed: Vec<SpecularProperties> = layers.iter().rev().map(|l| l.flipped()).collect();
    front_absorptances(&reversed)
}

/// Band-integrated properties of a specular stack at one incidence angle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecularResults {
    pub theta: f64,
    pub min_lambda: f64,
    pub max_lambda: f64,
    pub tau: f64,
    pub rho_front: f64,
    pub rho_back: f64,
    /// Front-incidence absorptances, front-most layer first.
    pub abs_front: Vec<f64>,
    /// Back-incidence absorptances, back-most layer first.
    pub abs_back: Vec<f64>,
    /// Integrated incident spectrum over the range.
    pub incident_power: f64,
}

impl SpecularResults {
    pub fn property(&self, side: Side, property: Property) -> f64 {
        match (side, property) {
            (_, Property::Tau) => self.tau,
            (Side::Front, Property::Rho) => self.rho_front,
            (Side::Back, Property::Rho) => self.rho_back,
        }
    }

    /// Absorptances in index order for `side`.
    pub fn absorptances(&self, side: Side) -> &[f64] {
        match side {
            Side::Front => &self.abs_front,
            Side::Back => &self.abs_back,
        }
    }

    /// Absorptance of layer `index` (1-based, counted from `side`).
    pub fn abs(&self, side: Side, index: usize) -> Result<f64, OpticsError> {
        let values = self.absorptances(side);
        if index == 0 || index > values.len() {
            return Err(OpticsError::InvalidIndex {
                index,
                count: values.len(),
            });
        }
        Ok(values[index - 1])
    }
}

/// Stack combination at one wavelength.
struct Combined {
    total: SpecularProperties,
    abs_front: Vec<f64>,
    abs_back: Vec<f64>,
}

pub struct MultiPaneSpecular {
    layers: Vec<Arc<dyn SpecularLayer>>,
    layer_grid: Vec<f64>,
    calculation_grid: Option<Vec<f64>>,
    /// Incident spectrum with the detector response applied.
    spectrum: Series,
    rule: IntegrationRule,
    normalization: f64,
    backend: Arc<dyn ComputeBackend>,
    cache: HashMap<(u64, u64, u64), Arc<SpecularResults>>,
    version: u64,
}

impl MultiPaneSpecular {
    /// Build from layers ordered front (exterior) to back.
    pub fn new(layers: Vec<Arc<dyn SpecularLayer>>, spectrum: Series) -> Result<Self, OpticsError> {
        Self::with_options(layers, spectrum, MultiPaneOptions::default())
    }

    pub fn with_options(
        layers: Vec<Arc<dyn SpecularLayer>>,
        spectrum: Series,
        options: MultiPaneOptions,
    ) -> Result<Self, OpticsError> {
        let spectrum = prepare_spectrum(spectrum, &options)?;
        let layer_grid = merged_grid(&layers)?;
        log::info!(
            "Specular stack with {} layers on {} wavelengths",
            layers.len(),
            layer_grid.len()
        );
        Ok(Self {
            layers,
            layer_grid,
            calculation_grid: options.wavelengths,
            spectrum,
            rule: options.rule,
            normalization: options.normalization,
            backend: options
                .backend
                .unwrap_or_else(vitrum_compute::default_backend),
            cache: HashMap::new(),
            version: 0,
        })
    }

    /// Append a layer at the back of the stack. Invalidates cached results.
    pub fn add_layer(&mut self, layer: Arc<dyn SpecularLayer>) -> Result<(), OpticsError> {
        let mut layers = self.layers.clone();
        layers.push(layer);
        self.layer_grid = merged_grid(&layers)?;
        self.layers = layers;
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

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// The calculation grid results are integrated on.
    pub fn wavelengths(&self) -> &[f64] {
        self.calculation_grid
            .as_deref()
            .unwrap_or(self.layer_grid.as_slice())
    }

    /// The merged layer grid the stack is combined on.
    pub fn layer_wavelengths(&self) -> &[f64] {
        &self.layer_grid
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

    /// Band-integrated results over `[min_lambda, max_lambda]` for a beam
    /// `theta` degrees off the normal, cached per range and angle.
    ///
    /// # Errors
    ///
    /// - [`OpticsError::InvalidAngle`] if `theta` is outside `[0, 90]`.
    /// - [`OpticsError::InvalidSeries`] for a malformed range or one that
    ///   holds no incident power.
    pub fn calculate(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        theta: f64,
    ) -> Result<Arc<SpecularResults>, OpticsError> {
        check_range(min_lambda, max_lambda)?;
        if !(0.0..=90.0).contains(&theta) {
            return Err(OpticsError::InvalidAngle(theta));
        }
        let key = (min_lambda.to_bits(), max_lambda.to_bits(), theta.to_bits());
        if let Some(results) = self.cache.get(&key) {
            return Ok(results.clone());
        }
        log::debug!("Integrating specular stack over [{min_lambda}, {max_lambda}] um at {theta} deg");
        let results = Arc::new(self.integrate(min_lambda, max_lambda, theta)?);
        self.cache.insert(key, results.clone());
        Ok(results)
    }

    /// Transmittance or reflectance for a beam at `theta`.
    pub fn property(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        theta: f64,
    ) -> Result<f64, OpticsError> {
        Ok(self.calculate(min_lambda, max_lambda, theta)?.property(side, property))
    }

    /// Hemispherical (diffuse-diffuse) transmittance or reflectance.
    pub fn hemispherical(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
    ) -> Result<f64, OpticsError> {
        self.hemispherical_of(min_lambda, max_lambda, |r| Ok(r.property(side, property)))
    }

    /// Scalar property in the same terms as
    /// [`MultiPaneBsdf::property_simple`](crate::multipane::MultiPaneBsdf::property_simple).
    /// Nothing is scattered, so direct-hemispherical equals direct-direct and
    /// direct-diffuse is zero. `phi` does not matter for a specular stack.
    #[allow(clippy::too_many_arguments)]
    pub fn property_simple(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        property: Property,
        scattering: Scattering,
        theta: f64,
        _phi: f64,
    ) -> Result<f64, OpticsError> {
        match scattering {
            Scattering::DirectDirect | Scattering::DirectHemispherical => {
                self.property(min_lambda, max_lambda, side, property, theta)
            }
            Scattering::DirectDiffuse => {
                self.calculate(min_lambda, max_lambda, theta)?;
                Ok(0.0)
            }
            Scattering::DiffuseDiffuse => self.hemispherical(min_lambda, max_lambda, side, property),
        }
    }

    /// Absorptance of layer `index` (1-based, counted from `side`) at `theta`.
    pub fn abs(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
        theta: f64,
    ) -> Result<f64, OpticsError> {
        self.calculate(min_lambda, max_lambda, theta)?.abs(side, index)
    }

    /// Absorptance of layer `index` under diffuse irradiance.
    pub fn abs_hemispherical(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        index: usize,
    ) -> Result<f64, OpticsError> {
        self.hemispherical_of(min_lambda, max_lambda, |r| r.abs(side, index))
    }

    /// Absorptance of every layer in index order for `side`.
    #[allow(clippy::too_many_arguments)]
    pub fn absorptance_layers(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        side: Side,
        scattering: ScatteringSimple,
        theta: f64,
        _phi: f64,
    ) -> Result<Vec<f64>, OpticsError> {
        match scattering {
            ScatteringSimple::Direct => Ok(self
                .calculate(min_lambda, max_lambda, theta)?
                .absorptances(side)
                .to_vec()),
            ScatteringSimple::Diffuse => (1..=self.layer_count())
                .map(|index| self.abs_hemispherical(min_lambda, max_lambda, side, index))
                .collect(),
        }
    }

    fn hemispherical_of(
        &mut self,
        min_lambda: f64,
        max_lambda: f64,
        value: impl Fn(&SpecularResults) -> Result<f64, OpticsError>,
    ) -> Result<f64, OpticsError> {
        let mut angular = Vec::with_capacity(HEMISPHERE_ANGLES.len());
        for theta in HEMISPHERE_ANGLES {
            let results = self.calculate(min_lambda, max_lambda, theta)?;
            angular.push((theta, value(&results)?));
        }
        hemispherical_2d(&Series::new(angular)?, IntegrationRule::Trapezoidal)
    }

    fn invalidate(&mut self) {
        self.version += 1;
        self.cache.clear();
        log::debug!("Specular result cache invalidated (version {})", self.version);
    }

    fn integrate(&self, min_lambda: f64, max_lambda: f64, theta: f64) -> Result<SpecularResults, OpticsError> {
        let layer_grid = &self.layer_grid;
        let combined = per_wavelength(self.backend.as_ref(), layer_grid.len(), |k| {
            let properties = self
                .layers
                .iter()
                .map(|layer| layer.properties_at(layer_grid[k], theta))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Combined {
                total: combine(&properties),
                abs_front: front_absorptances(&properties),
                abs_back: back_absorptances(&properties),
            })
        })?;

        let grid = self.wavelengths().to_vec();
        let load: Vec<f64> = grid.iter().map(|&x| self.spectrum.value_at(x)).collect();
        let integral = |values: Vec<f64>| -> Result<f64, OpticsError> {
            Ok(Series::from_sorted(grid.clone(), values)
                .integrate(self.rule, self.normalization)?
                .sum(min_lambda, max_lambda))
        };
        let incident_power = integral(load.clone())?;
        if !(incident_power.is_finite() && incident_power > 0.0) {
            return Err(OpticsError::InvalidSeries(format!(
                "incident power {incident_power} over [{min_lambda}, {max_lambda}]"
            )));
        }
        let band = |pick: &dyn Fn(&Combined) -> f64| -> Result<f64, OpticsError> {
            let native: Vec<f64> = combined.iter().map(pick).collect();
            let weighted = grid
                .iter()
                .zip(&load)
                .map(|(&x, &e)| interpolate_at(layer_grid, &native, x) * e)
                .collect();
            Ok(integral(weighted)? / incident_power)
        };

        let n = self.layers.len();
        Ok(SpecularResults {
            theta,
            min_lambda,
            max_lambda,
            tau: band(&|c| c.total.tau)?,
            rho_front: band(&|c| c.total.rho_front)?,
            rho_back: band(&|c| c.total.rho_back)?,
            abs_front: (0..n)
                .map(|k| band(&|c| c.abs_front[k]))
                .collect::<Result<_, _>>()?,
            abs_back: (0..n)
                .map(|k| band(&|c| c.abs_back[k]))
                .collect::<Result<_, _>>()?,
            incident_power,
        })
    }
}

fn merged_grid(layers: &[Arc<dyn SpecularLayer>]) -> Result<Vec<f64>, OpticsError> {
    if layers.is_empty() {
        return Err(OpticsError::InvalidLayer("at least one layer is required".into()));
    }
    let grids: Vec<&[f64]> = layers.iter().map(|l| l.wavelengths()).collect();
    let wavelengths = common_wavelengths(&grids)?;
    if wavelengths.is_empty() {
        return Err(OpticsError::InvalidLayer("common wavelength grid is empty".into()));
    }
    Ok(wavelengths)
}
