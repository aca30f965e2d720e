//! Error type shared by every fallible operation in `vitrum-core`.

use thiserror::Error;
use vitrum_compute::ComputeError;

/// Errors raised while building bases, series or layer stacks, or while
/// querying the orchestrator.
///
/// Every variant is fail-fast: the operation that produced it leaves no
/// partially updated state behind, so retrying with corrected input is safe.
#[derive(Debug, Error)]
pub enum OpticsError {
    #[error("Invalid directional basis: {0}")]
    InvalidBasis(String),

    #[error("Invalid layer: {0}")]
    InvalidLayer(String),

    #[error("Layer index {index} out of range (stack has {count} layers, indices start at 1)")]
    InvalidIndex { index: usize, count: usize },

    #[error("Singular interreflection system: {0}")]
    SingularSystem(String),

    #[error("Invalid spectral series: {0}")]
    InvalidSeries(String),

    #[error("Incidence angle {0}° is outside [0, 90]")]
    InvalidAngle(f64),

    #[error("Compute backend error: {0}")]
    Compute(#[from] ComputeError),
}
