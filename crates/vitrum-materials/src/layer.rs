//! Cells presented as stackable layers.

use std::sync::Arc;

use ndarray::Array2;
use vitrum_compute::ComputeBackend;
use vitrum_core::layer::BandProperties;
use vitrum_core::{DirectionalBasis, OpticalLayer, OpticsError, PhotovoltaicResponse, Property, Side};

use crate::cell::{Cell, CellBand};
use crate::pv::PvResponse;

/// A [`Cell`] on a directional basis, evaluated band by band.
///
/// Each band's flux fractions are converted to BSDF form by dividing row `i`
/// by the projected solid angle of outgoing patch `i`.
pub struct BsdfLayer {
    name: String,
    basis: Arc<DirectionalBasis>,
    cell: Cell,
    wavelengths: Vec<f64>,
    photovoltaic: Option<PvResponse>,
    backend: Arc<dyn ComputeBackend>,
}

impl BsdfLayer {
    pub fn new(basis: Arc<DirectionalBasis>, cell: Cell) -> Self {
        let material = cell.material();
        Self {
            name: format!("{} ({})", material.name(), cell.kind()),
            wavelengths: material.wavelengths().to_vec(),
            basis,
            cell,
            photovoltaic: None,
            backend: vitrum_compute::default_backend(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn ComputeBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Mark the layer as photovoltaically active.
    pub fn with_photovoltaic(mut self, response: PvResponse) -> Self {
        self.photovoltaic = Some(response);
        self
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    fn bsdf(&self, band: &CellBand, side: Side, property: Property) -> Result<Array2<f64>, OpticsError> {
        let lambda = self.basis.lambda();
        let n = self.basis.size();
        Ok(self
            .backend
            .parallel_matrix_fill(n, n, &|i, j| band.flux(side, property, j, i) / lambda[i])?)
    }
}

impl OpticalLayer for BsdfLayer {
    fn basis(&self) -> &Arc<DirectionalBasis> {
        &self.basis
    }

    fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    fn band_properties(&self, index: usize) -> Result<BandProperties, OpticsError> {
        let band = self
            .cell
            .prepare(&self.basis, index)
            .map_err(|e| OpticsError::InvalidLayer(format!("{}: {e}", self.name)))?;
        BandProperties::from_bsdf(
            &self.basis,
            self.bsdf(&band, Side::Front, Property::Tau)?,
            self.bsdf(&band, Side::Front, Property::Rho)?,
            self.bsdf(&band, Side::Back, Property::Tau)?,
            self.bsdf(&band, Side::Back, Property::Rho)?,
        )
    }

    fn photovoltaic(&self) -> Option<&dyn PhotovoltaicResponse> {
        self.photovoltaic
            .as_ref()
            .map(|pv| pv as &dyn PhotovoltaicResponse)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
