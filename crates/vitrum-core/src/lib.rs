//! # Vitrum Core
//!
//! Spectral and angular optics of glazing and shading stacks. This crate
//! combines per-layer BSDF matrices into the equivalent optical behaviour of
//! a whole stack and integrates it over the solar spectrum.
//!
//! ## Architecture
//!
//! Layers are supplied through the [`layer::OpticalLayer`] trait. For every
//! wavelength of a common grid the layers are folded front to back by the
//! adding method ([`stack::EquivalentLayerStack`]); the orchestrator
//! ([`multipane::MultiPaneBsdf`]) then weights the per-wavelength results by
//! the incident spectrum, integrates them and caches the band-integrated
//! [`results::BsdfResults`].
//!
//! Stacks made only of specular panes can also be evaluated at exact
//! incidence angles with [`specular::MultiPaneSpecular`], which needs no
//! directional basis.
//!
//! ## Modules
//!
//! - [`basis`]: Hemispherical direction basis.
//! - [`series`]: Spectral series and matrices of series.
//! - [`layer`]: Layer capability contract.
//! - [`stack`]: Adding-method combinator for one wavelength.
//! - [`equivalent`]: Per-wavelength stacks on a common grid.
//! - [`multipane`]: Spectral-directional orchestrator with result cache.
//! - [`results`]: Directional and hemispherical queries.
//! - [`specular`]: Angle-exact orchestrator for specular stacks.
//! - [`hemispherical`]: Hemispherical averaging of angular data.
//! - [`linalg`]: Dense inversion via `faer`.

pub mod basis;
pub mod equivalent;
pub mod error;
pub mod hemispherical;
pub mod layer;
pub mod linalg;
pub mod multipane;
pub mod results;
pub mod series;
pub mod specular;
pub mod stack;
pub mod types;

pub use basis::{BasisResolution, Direction, DirectionalBasis, RingDefinition};
pub use error::OpticsError;
pub use layer::{BandProperties, OpticalLayer, PhotovoltaicResponse};
pub use multipane::{MultiPaneBsdf, MultiPaneOptions};
pub use results::BsdfResults;
pub use series::{MatrixSeries, Series};
pub use specular::{MultiPaneSpecular, SpecularLayer, SpecularProperties, SpecularResults};
pub use types::{IntegrationRule, Property, Scattering, ScatteringSimple, Side};
