//! Reference scattering cells.
//!
//! A [`Cell`] turns the normal-incidence properties of a material into the
//! directional behaviour of a pane or shade. The set of cell kinds is
//! closed; everything downstream sees a prepared [`CellBand`] through one
//! narrow question: what fraction of the flux incident in patch `j` leaves
//! through patch `i`?
//!
//! | Kind | Transmission | Reflection |
//! |------|--------------|------------|
//! | [`Cell::Specular`] | patch `j` to patch `j`, uncoated Fresnel angular model | mirror into patch `j` |
//! | [`Cell::DiffuseShade`] | open fraction direct, rest Lambertian | Lambertian |

use std::f64::consts::PI;
use std::sync::Arc;

use vitrum_core::{DirectionalBasis, Property, Side};

use crate::angular::uncoated_properties;
use crate::provider::{MaterialError, MaterialProvider, NormalProperties};

/// Closed set of supported cell geometries.
#[derive(Clone)]
pub enum Cell {
    /// Flat glazing pane.
    Specular { material: Arc<dyn MaterialProvider> },
    /// Perfectly diffusing shade with a geometric open fraction.
    DiffuseShade {
        material: Arc<dyn MaterialProvider>,
        openness: f64,
    },
}

impl Cell {
    pub fn specular(material: Arc<dyn MaterialProvider>) -> Self {
        Cell::Specular { material }
    }

    /// # Errors
    ///
    /// [`MaterialError::DataError`] if `openness` is outside `[0, 1]`.
    pub fn diffuse_shade(
        material: Arc<dyn MaterialProvider>,
        openness: f64,
    ) -> Result<Self, MaterialError> {
        if !(0.0..=1.0).contains(&openness) {
            return Err(MaterialError::DataError(format!(
                "shade openness {openness} is outside [0, 1]"
            )));
        }
        Ok(Cell::DiffuseShade { material, openness })
    }

    pub fn material(&self) -> &Arc<dyn MaterialProvider> {
        match self {
            Cell::Specular { material } | Cell::DiffuseShade { material, .. } => material,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Specular { .. } => "specular",
            Cell::DiffuseShade { .. } => "diffuse_shade",
        }
    }

    /// Evaluate the cell at native wavelength `index` of its material.
    pub fn prepare(
        &self,
        basis: &DirectionalBasis,
        index: usize,
    ) -> Result<CellBand, MaterialError> {
        let normal = self.material().properties(index)?;
        Ok(match self {
            Cell::Specular { .. } => CellBand::Specular {
                per_patch: basis
                    .patches()
                    .iter()
                    .map(|p| {
                        let (tau, rho_front, rho_back) = uncoated_properties(
                            normal.tau,
                            normal.rho_front,
                            normal.rho_back,
                            p.centre.theta,
                        );
                        NormalProperties {
                            tau,
                            rho_front,
                            rho_back,
                        }
                    })
                    .collect(),
            },
            Cell::DiffuseShade { openness, .. } => CellBand::Diffuse {
                openness: *openness,
                material: normal,
                lambda: basis.lambda().to_vec(),
            },
        })
    }
}

/// A cell evaluated in one wavelength band.
#[derive(Debug, Clone)]
pub enum CellBand {
    Specular {
        /// Directional properties for beams incident in each patch.
        per_patch: Vec<NormalProperties>,
    },
    Diffuse {
        openness: f64,
        material: NormalProperties,
        lambda: Vec<f64>,
    },
}

impl CellBand {
    /// Fraction of the flux incident in patch `incoming` on `side` that is
    /// transmitted or reflected into patch `outgoing`.
    pub fn flux(&self, side: Side, property: Property, incoming: usize, outgoing: usize) -> f64 {
        match self {
            CellBand::Specular { per_patch } => {
                if incoming != outgoing {
                    return 0.0;
                }
                let p = &per_patch[incoming];
                match property {
                    Property::Tau => p.tau,
                    Property::Rho => p.rho(side == Side::Front),
                }
            }
            CellBand::Diffuse {
                openness,
                material,
                lambda,
            } => {
                let closed = 1.0 - openness;
                let lambertian = lambda[outgoing] / PI;
                match property {
                    Property::Tau => {
                        let direct = if incoming == outgoing { *openness } else { 0.0 };
                        direct + closed * material.tau * lambertian
                    }
                    Property::Rho => closed * material.rho(side == Side::Front) * lambertian,
                }
            }
        }
    }
}
