//! # Vitrum Compute
//!
//! Compute backend abstraction for the Vitrum workspace. The optical code in
//! `vitrum-core` and `vitrum-materials` fills matrices and reduces spectral
//! series through the [`ComputeBackend`](backend::ComputeBackend) trait so
//! that it never touches threads directly.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Status |
//! |---------|-------------|--------|
//! | CPU (Rayon) | `cpu` (default) | Implemented |
//!
//! Work is split into contiguous index ranges with
//! [`chunk_it`](partition::chunk_it); every range is independent, so ranges
//! may complete in any order.

pub mod backend;
pub mod partition;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo, SerialBackend};
pub use partition::{chunk_it, IndexRange};

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;

/// The backend used when the caller does not choose one.
#[cfg(feature = "cpu")]
pub fn default_backend() -> std::sync::Arc<dyn ComputeBackend> {
    std::sync::Arc::new(CpuBackend::new())
}

/// The backend used when the caller does not choose one.
#[cfg(not(feature = "cpu"))]
pub fn default_backend() -> std::sync::Arc<dyn ComputeBackend> {
    std::sync::Arc::new(SerialBackend)
}
