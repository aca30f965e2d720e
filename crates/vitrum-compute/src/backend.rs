//! Compute backend trait and device abstraction.
//!
//! The [`ComputeBackend`] trait abstracts over execution environments so that
//! the optics code stays device-agnostic. The hot paths in the workspace are
//! embarrassingly parallel: filling a BSDF matrix one direction pair at a
//! time, reducing one spectral series per matrix cell, and combining the
//! layer stack independently at every wavelength.

use ndarray::Array2;
use thiserror::Error;

use crate::partition::IndexRange;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("Device error: {0}")]
    DeviceError(String),
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: Option<usize>,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Serial,
    Cpu,
}

/// Abstraction over compute backends.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Fill a `rows × cols` matrix where every entry is computed independently.
    fn parallel_matrix_fill(
        &self,
        rows: usize,
        cols: usize,
        fill_fn: &(dyn Fn(usize, usize) -> f64 + Send + Sync),
    ) -> Result<Array2<f64>, ComputeError>;

    /// Run `task` once for every range of a partition of `[0, len)`.
    ///
    /// Ranges are disjoint and together cover every index exactly once; they
    /// may run concurrently and finish in any order.
    fn parallel_ranges(
        &self,
        len: usize,
        task: &(dyn Fn(IndexRange) + Send + Sync),
    ) -> Result<(), ComputeError>;
}

/// Single-threaded reference backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial".into(),
            backend_type: BackendType::Serial,
            compute_units: Some(1),
        }
    }

    fn parallel_matrix_fill(
        &self,
        rows: usize,
        cols: usize,
        fill_fn: &(dyn Fn(usize, usize) -> f64 + Send + Sync),
    ) -> Result<Array2<f64>, ComputeError> {
        Ok(Array2::from_shape_fn((rows, cols), |(i, j)| fill_fn(i, j)))
    }

    fn parallel_ranges(
        &self,
        len: usize,
        task: &(dyn Fn(IndexRange) + Send + Sync),
    ) -> Result<(), ComputeError> {
        if len > 0 {
            task(IndexRange::new(0, len));
        }
        Ok(())
    }
}
