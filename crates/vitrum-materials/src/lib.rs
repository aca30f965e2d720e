//! # Vitrum Materials
//!
//! Glazing and shading layers for the Vitrum optics stack. Spectral data
//! sources implement [`MaterialProvider`](provider::MaterialProvider); a
//! [`Cell`](cell::Cell) gives a material its directional behaviour, and a
//! [`BsdfLayer`](layer::BsdfLayer) presents the cell to the combinator as an
//! [`OpticalLayer`](vitrum_core::OpticalLayer).
//!
//! ## Available data
//!
//! | Source | Module | Contents |
//! |--------|--------|----------|
//! | IGDB measurements | [`nfrc`] | NFRC 102 clear, NFRC 2191 low-e |
//! | ASTM E891 | [`solar`] | Direct normal solar irradiance |
//! | Flat spectra | [`sample::UniformMaterial`] | Shade fabrics, test panes |
//!
//! ## Angular behaviour
//!
//! Specular panes derive oblique-incidence properties from their
//! normal-incidence measurements with the uncoated-glass Fresnel model in
//! [`angular`]. Stacks of such panes can also be evaluated at exact
//! incidence angles through [`SpecularPane`](specular::SpecularPane).
//! Photovoltaic curves are interpolated with natural cubic
//! splines ([`spline::CubicSpline`]).

pub mod angular;
pub mod cell;
pub mod layer;
pub mod nfrc;
pub mod provider;
pub mod pv;
pub mod sample;
pub mod solar;
pub mod specular;
pub mod spline;

pub use cell::Cell;
pub use layer::BsdfLayer;
pub use provider::{MaterialError, MaterialProvider, NormalProperties};
pub use pv::PvResponse;
pub use sample::{SampleRow, SpectralSample, UniformMaterial};
pub use specular::SpecularPane;
