//! Measured and synthetic spectral materials.

use serde::{Deserialize, Serialize};

use crate::provider::{MaterialError, MaterialProvider, NormalProperties};

/// One measured wavelength of a spectral sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    /// Wavelength (µm).
    pub wavelength: f64,
    pub tau: f64,
    pub rho_front: f64,
    pub rho_back: f64,
}

/// Normal-incidence measurements of a pane, as published in glazing
/// databases.
#[derive(Debug, Clone)]
pub struct SpectralSample {
    name: String,
    wavelengths: Vec<f64>,
    properties: Vec<NormalProperties>,
}

impl SpectralSample {
    /// Build a sample from rows in any order.
    ///
    /// # Errors
    ///
    /// [`MaterialError::DataError`] for an empty table, a repeated
    /// wavelength, or a value outside `[0, 1]`.
    pub fn new(name: impl Into<String>, mut rows: Vec<SampleRow>) -> Result<Self, MaterialError> {
        let name = name.into();
        if rows.is_empty() {
            return Err(MaterialError::DataError(format!("sample '{name}' has no rows")));
        }
        rows.sort_by(|a, b| a.wavelength.total_cmp(&b.wavelength));
        if let Some(w) = rows.windows(2).find(|w| w[0].wavelength == w[1].wavelength) {
            return Err(MaterialError::DataError(format!(
                "sample '{name}' repeats wavelength {}",
                w[0].wavelength
            )));
        }
        for row in &rows {
            let valid = |v: f64| (0.0..=1.0).contains(&v);
            if !row.wavelength.is_finite()
                || row.wavelength <= 0.0
                || !valid(row.tau)
                || !valid(row.rho_front)
                || !valid(row.rho_back)
            {
                return Err(MaterialError::DataError(format!(
                    "sample '{name}' has an invalid row at {} µm",
                    row.wavelength
                )));
            }
        }
        log::debug!("Loaded sample '{}' with {} wavelengths", name, rows.len());
        Ok(Self {
            name,
            wavelengths: rows.iter().map(|r| r.wavelength).collect(),
            properties: rows
                .iter()
                .map(|r| NormalProperties {
                    tau: r.tau,
                    rho_front: r.rho_front,
                    rho_back: r.rho_back,
                })
                .collect(),
        })
    }

    /// The same pane installed the other way round.
    pub fn flipped(&self) -> Self {
        Self {
            name: self.name.clone(),
            wavelengths: self.wavelengths.clone(),
            properties: self
                .properties
                .iter()
                .map(|p| NormalProperties {
                    tau: p.tau,
                    rho_front: p.rho_back,
                    rho_back: p.rho_front,
                })
                .collect(),
        }
    }
}

impl MaterialProvider for SpectralSample {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    fn properties(&self, index: usize) -> Result<NormalProperties, MaterialError> {
        self.properties.get(index).copied().ok_or_else(|| {
            MaterialError::DataError(format!(
                "sample '{}' has no wavelength index {index}",
                self.name
            ))
        })
    }
}

/// Spectrally flat material, e.g. the yarn of a shade fabric.
#[derive(Debug, Clone)]
pub struct UniformMaterial {
    name: String,
    range: [f64; 2],
    properties: NormalProperties,
}

impl UniformMaterial {
    pub fn new(
        name: impl Into<String>,
        properties: NormalProperties,
        min_lambda: f64,
        max_lambda: f64,
    ) -> Result<Self, MaterialError> {
        let name = name.into();
        let NormalProperties {
            tau,
            rho_front,
            rho_back,
        } = properties;
        if !(min_lambda < max_lambda) || min_lambda <= 0.0 {
            return Err(MaterialError::DataError(format!(
                "material '{name}' has an empty wavelength range [{min_lambda}, {max_lambda}]"
            )));
        }
        if tau < 0.0 || rho_front < 0.0 || rho_back < 0.0 || tau + rho_front.max(rho_back) > 1.0 {
            return Err(MaterialError::DataError(format!(
                "material '{name}' violates energy conservation"
            )));
        }
        Ok(Self {
            name,
            range: [min_lambda, max_lambda],
            properties,
        })
    }
}

impl MaterialProvider for UniformMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelengths(&self) -> &[f64] {
        &self.range
    }

    fn properties(&self, index: usize) -> Result<NormalProperties, MaterialError> {
        if index < self.range.len() {
            Ok(self.properties)
        } else {
            Err(MaterialError::DataError(format!(
                "material '{}' has no wavelength index {index}",
                self.name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rows() -> Vec<SampleRow> {
        vec![
            SampleRow {
                wavelength: 0.5,
                tau: 0.6,
                rho_front: 0.1,
                rho_back: 0.3,
            },
            SampleRow {
                wavelength: 0.4,
                tau: 0.4,
                rho_front: 0.2,
                rho_back: 0.2,
            },
        ]
    }

    #[test]
    fn test_rows_are_sorted() {
        let sample = SpectralSample::new("s", rows()).unwrap();
        assert_eq!(sample.wavelengths(), &[0.4, 0.5]);
        assert_eq!(sample.properties(1).unwrap().tau, 0.6);
    }

    #[test]
    fn test_flip_swaps_faces() {
        let sample = SpectralSample::new("s", rows()).unwrap().flipped();
        let p = sample.properties(1).unwrap();
        assert_eq!((p.tau, p.rho_front, p.rho_back), (0.6, 0.3, 0.1));
    }

    #[test]
    fn test_interpolation_and_range() {
        let sample = SpectralSample::new("s", rows()).unwrap();
        let p = sample.properties_at(0.45).unwrap();
        assert_abs_diff_eq!(p.tau, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p.rho_back, 0.25, epsilon = 1e-12);
        assert!(matches!(
            sample.properties_at(0.7),
            Err(MaterialError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_rows_rejected() {
        let mut bad = rows();
        bad[0].tau = 1.2;
        assert!(SpectralSample::new("s", bad).is_err());
        let mut dup = rows();
        dup[0].wavelength = 0.4;
        assert!(SpectralSample::new("s", dup).is_err());
        assert!(SpectralSample::new("s", Vec::new()).is_err());
    }

    #[test]
    fn test_uniform_material() {
        let props = NormalProperties {
            tau: 0.1,
            rho_front: 0.5,
            rho_back: 0.4,
        };
        let fabric = UniformMaterial::new("fabric", props, 0.3, 2.5).unwrap();
        assert_eq!(fabric.wavelength_range(), (0.3, 2.5));
        assert_eq!(fabric.properties_at(1.0).unwrap(), props);
        let dark = NormalProperties { tau: 0.6, ..props };
        assert!(UniformMaterial::new("dark", dark, 0.3, 2.5).is_err());
    }
}
