//! Small enums shared across the optical pipeline.

use serde::{Deserialize, Serialize};

/// Which face of a layer or stack the light is incident on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Front, Side::Back];

    /// The opposite face.
    pub fn opposite(self) -> Side {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

/// Optical quantity carried by a scattering matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Transmittance (Tau).
    Tau,
    /// Reflectance (Rho).
    Rho,
}

impl Property {
    pub const ALL: [Property; 2] = [Property::Tau, Property::Rho];
}

/// Angular integration mode for scalar property queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scattering {
    /// Specular (same patch) component for a given incidence.
    DirectDirect,
    /// Scattered component for a given incidence: direct-hemispherical minus
    /// direct-direct.
    DirectDiffuse,
    /// Everything leaving the layer for a given incidence.
    DirectHemispherical,
    /// Hemispherically averaged over all incidence directions.
    DiffuseDiffuse,
}

/// Incidence mode for absorptance queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScatteringSimple {
    /// Beam incident from a single direction.
    Direct,
    /// Uniform diffuse irradiance over the hemisphere.
    Diffuse,
}

/// Numerical rule used to turn a sampled series into a cumulative integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationRule {
    /// Trapezoids between consecutive samples.
    #[default]
    Trapezoidal,
    /// Left-point rectangles between consecutive samples.
    Rectangular,
    /// Every sample already holds the integrated contribution of the band
    /// starting at its wavelength.
    PreWeighted,
}
