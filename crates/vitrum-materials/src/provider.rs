//! Material property provider trait.
//!
//! All spectral material sources implement [`MaterialProvider`], which
//! returns normal-incidence transmittance and the reflectance of each face
//! on the material's native wavelength grid.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vitrum_core::OpticsError;

/// Errors from material providers and cell builders.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("Wavelength {wavelength} µm is outside the data range [{min}, {max}] µm")]
    OutOfRange { wavelength: f64, min: f64, max: f64 },

    #[error("Material not found: {0}")]
    NotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error(transparent)]
    Optics(#[from] OpticsError),
}

/// Normal-incidence optical properties at one wavelength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalProperties {
    pub tau: f64,
    pub rho_front: f64,
    pub rho_back: f64,
}

impl NormalProperties {
    /// Reflectance seen from `front` (`true`) or back.
    pub fn rho(&self, front: bool) -> f64 {
        if front {
            self.rho_front
        } else {
            self.rho_back
        }
    }

    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            tau: a.tau + t * (b.tau - a.tau),
            rho_front: a.rho_front + t * (b.rho_front - a.rho_front),
            rho_back: a.rho_back + t * (b.rho_back - a.rho_back),
        }
    }
}

/// Provides wavelength-dependent normal-incidence properties.
///
/// Implementations include measured spectral samples
/// ([`SpectralSample`](crate::sample::SpectralSample)) and spectrally flat
/// materials ([`UniformMaterial`](crate::sample::UniformMaterial)).
pub trait MaterialProvider: Send + Sync {
    /// Human-readable name of this material.
    fn name(&self) -> &str;

    /// Native wavelengths (µm), strictly ascending.
    fn wavelengths(&self) -> &[f64];

    /// Properties at native wavelength `index`.
    fn properties(&self, index: usize) -> Result<NormalProperties, MaterialError>;

    /// Wavelength range over which data is available (µm).
    fn wavelength_range(&self) -> (f64, f64) {
        let grid = self.wavelengths();
        match (grid.first(), grid.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => (f64::NAN, f64::NAN),
        }
    }

    /// Properties at an arbitrary wavelength inside the data range, linearly
    /// interpolated between native samples.
    fn properties_at(&self, wavelength: f64) -> Result<NormalProperties, MaterialError> {
        let grid = self.wavelengths();
        let (min, max) = self.wavelength_range();
        if grid.is_empty() || !(min..=max).contains(&wavelength) {
            return Err(MaterialError::OutOfRange {
                wavelength,
                min,
                max,
            });
        }
        let k = grid.partition_point(|&x| x < wavelength);
        if grid[k] == wavelength {
            return self.properties(k);
        }
        let t = (wavelength - grid[k - 1]) / (grid[k] - grid[k - 1]);
        Ok(NormalProperties::lerp(
            &self.properties(k - 1)?,
            &self.properties(k)?,
            t,
        ))
    }
}
