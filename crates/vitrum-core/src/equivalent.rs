//! One equivalent layer stack per wavelength of a common grid.
//!
//! [`SpectralStacks`] owns the layer list and, for every wavelength of the
//! merged layer grid, an [`EquivalentLayerStack`] combining all layers at
//! that wavelength. Wavelengths never interact, so the per-wavelength stacks
//! are built over index ranges handed out by the [`ComputeBackend`].

use std::sync::{Arc, OnceLock};

use ndarray::{Array1, Array2};
use vitrum_compute::ComputeBackend;

use crate::basis::DirectionalBasis;
use crate::error::OpticsError;
use crate::layer::OpticalLayer;
use crate::series::{common_wavelengths, MatrixSeries};
use crate::stack::EquivalentLayerStack;
use crate::types::{Property, Side};

pub struct SpectralStacks {
    basis: Arc<DirectionalBasis>,
    layers: Vec<Arc<dyn OpticalLayer>>,
    backend: Arc<dyn ComputeBackend>,
    wavelengths: Vec<f64>,
    stacks: Vec<EquivalentLayerStack>,
}

impl SpectralStacks {
    /// Combine `layers` (front to back) at every wavelength of their merged
    /// grid, restricted to the range all layers cover.
    ///
    /// # Errors
    ///
    /// [`OpticsError::InvalidLayer`] if `layers` is empty, the layers do not
    /// share one basis, or their wavelength ranges do not overlap; any error
    /// from combining the layers.
    pub fn new(
        layers: Vec<Arc<dyn OpticalLayer>>,
        backend: Arc<dyn ComputeBackend>,
    ) -> Result<Self, OpticsError> {
        let first = layers
            .first()
            .ok_or_else(|| OpticsError::InvalidLayer("at least one layer is required".into()))?;
        let basis = first.basis().clone();
        for layer in &layers {
            check_basis(&basis, layer.as_ref())?;
        }
        let wavelengths = merged_grid(&layers)?;
        let stacks = build_stacks(backend.as_ref(), &basis, &layers, &wavelengths)?;
        Ok(Self {
            basis,
            layers,
            backend,
            wavelengths,
            stacks,
        })
    }

    /// Append a layer at the back of the stack.
    ///
    /// The new per-wavelength stacks are built completely before anything is
    /// replaced, so a failure leaves `self` unchanged.
    pub fn add_layer(&mut self, layer: Arc<dyn OpticalLayer>) -> Result<(), OpticsError> {
        check_basis(&self.basis, layer.as_ref())?;
        let mut layers = self.layers.clone();
        layers.push(layer.clone());
        let wavelengths = merged_grid(&layers)?;

        let stacks = if wavelengths == self.wavelengths {
            per_wavelength(self.backend.as_ref(), wavelengths.len(), |k| {
                let mut next = self.stacks[k].clone();
                next.append(&layer.properties_at(wavelengths[k])?)?;
                Ok(next)
            })?
        } else {
            log::debug!(
                "Common grid changed to {} wavelengths, rebuilding stacks",
                wavelengths.len()
            );
            build_stacks(self.backend.as_ref(), &self.basis, &layers, &wavelengths)?
        };

        self.layers = layers;
        self.wavelengths = wavelengths;
        self.stacks = stacks;
        Ok(())
    }

    pub fn basis(&self) -> &Arc<DirectionalBasis> {
        &self.basis
    }

    pub fn layers(&self) -> &[Arc<dyn OpticalLayer>] {
        &self.layers
    }

    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// The merged wavelength grid.
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn stacks(&self) -> &[EquivalentLayerStack] {
        &self.stacks
    }

    /// Flux transfer matrix of the stack at every common wavelength.
    pub fn flux_series(&self, side: Side, property: Property) -> Result<MatrixSeries, OpticsError> {
        let matrices: Vec<Array2<f64>> = self
            .stacks
            .iter()
            .map(|s| s.flux_matrix(side, property).clone())
            .collect();
        MatrixSeries::from_matrices(self.wavelengths.clone(), &matrices)
    }

    /// Absorptance matrix series: rows are layers, columns are incoming
    /// directions.
    pub fn absorptance_series(&self, side: Side) -> Result<MatrixSeries, OpticsError> {
        let matrices: Vec<Array2<f64>> = self
            .stacks
            .iter()
            .map(|s| rows_to_matrix(s.absorptances(side), self.basis.size()))
            .collect();
        MatrixSeries::from_matrices(self.wavelengths.clone(), &matrices)
    }
}

fn check_basis(basis: &Arc<DirectionalBasis>, layer: &dyn OpticalLayer) -> Result<(), OpticsError> {
    if !Arc::ptr_eq(basis, layer.basis()) {
        return Err(OpticsError::InvalidLayer(format!(
            "layer '{}' is defined on a different directional basis",
            layer.name()
        )));
    }
    Ok(())
}

fn merged_grid(layers: &[Arc<dyn OpticalLayer>]) -> Result<Vec<f64>, OpticsError> {
    let grids: Vec<&[f64]> = layers.iter().map(|l| l.wavelengths()).collect();
    let wavelengths = common_wavelengths(&grids)?;
    if wavelengths.is_empty() {
        return Err(OpticsError::InvalidLayer("common wavelength grid is empty".into()));
    }
    Ok(wavelengths)
}

/// Evaluate `f` at every wavelength index, one backend range at a time.
pub(crate) fn per_wavelength<T, F>(
    backend: &dyn ComputeBackend,
    len: usize,
    f: F,
) -> Result<Vec<T>, OpticsError>
where
    T: Send + Sync,
    F: Fn(usize) -> Result<T, OpticsError> + Sync,
{
    let slots: Vec<OnceLock<Result<T, OpticsError>>> = (0..len).map(|_| OnceLock::new()).collect();
    backend.parallel_ranges(len, &|range| {
        for k in range.iter() {
            let _ = slots[k].set(f(k));
        }
    })?;
    slots
        .into_iter()
        .enumerate()
        .map(|(k, slot)| {
            slot.into_inner().unwrap_or_else(|| {
                Err(OpticsError::InvalidSeries(format!(
                    "wavelength {k} was not visited by the {} backend",
                    backend.device_info().name
                )))
            })
        })
        .collect()
}

fn build_stacks(
    backend: &dyn ComputeBackend,
    basis: &Arc<DirectionalBasis>,
    layers: &[Arc<dyn OpticalLayer>],
    wavelengths: &[f64],
) -> Result<Vec<EquivalentLayerStack>, OpticsError> {
    log::debug!(
        "Combining {} layers at {} wavelengths on a {}-patch basis ({})",
        layers.len(),
        wavelengths.len(),
        basis.size(),
        backend.device_info().name
    );
    per_wavelength(backend, wavelengths.len(), |k| {
        let mut stack = EquivalentLayerStack::new(basis.clone());
        for layer in layers {
            stack.append(&layer.properties_at(wavelengths[k])?)?;
        }
        Ok(stack)
    })
}

fn rows_to_matrix(rows: &[Array1<f64>], cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), cols), |(i, j)| rows[i][j])
}
