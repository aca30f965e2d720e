//! Photovoltaic response of active layers.
//!
//! The spectral responsivity follows from the external quantum efficiency:
//!
//! $$S(\lambda) = \mathrm{EQE}(\lambda)\,\frac{q\lambda}{hc}$$
//!
//! Open-circuit voltage and fill factor are splines over short-circuit
//! current density, held at their end values outside the tabulated range.

use vitrum_core::{PhotovoltaicResponse, Series};

use crate::provider::MaterialError;
use crate::spline::CubicSpline;

const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
const PLANCK: f64 = 6.626_070_15e-34;
const SPEED_OF_LIGHT: f64 = 299_792_458.0;

#[derive(Debug, Clone)]
pub struct PvResponse {
    eqe: Series,
    voc: CubicSpline,
    ff: CubicSpline,
}

impl PvResponse {
    /// # Errors
    ///
    /// [`MaterialError::DataError`] if the EQE is empty or leaves `[0, 1]`.
    pub fn new(eqe: Series, voc: CubicSpline, ff: CubicSpline) -> Result<Self, MaterialError> {
        if eqe.is_empty() {
            return Err(MaterialError::DataError("EQE series is empty".into()));
        }
        if let Some((wl, q)) = eqe.iter().find(|(_, q)| !(0.0..=1.0).contains(q)) {
            return Err(MaterialError::DataError(format!(
                "EQE {q} at {wl} µm is outside [0, 1]"
            )));
        }
        Ok(Self { eqe, voc, ff })
    }

    pub fn eqe(&self) -> &Series {
        &self.eqe
    }
}

impl PhotovoltaicResponse for PvResponse {
    fn responsivity(&self, wavelength: f64) -> f64 {
        let metres = wavelength * 1e-6;
        self.eqe.value_at(wavelength) * ELEMENTARY_CHARGE * metres / (PLANCK * SPEED_OF_LIGHT)
    }

    fn voc(&self, jsc: f64) -> f64 {
        self.voc.evaluate_clamped(jsc)
    }

    fn ff(&self, jsc: f64) -> f64 {
        self.ff.evaluate_clamped(jsc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cell() -> PvResponse {
        let eqe = Series::new([(0.3, 0.0), (0.5, 0.9), (1.1, 0.9), (1.2, 0.0)]).unwrap();
        let voc = CubicSpline::new(vec![0.0, 100.0, 300.0], vec![0.5, 0.6, 0.65]).unwrap();
        PvResponse::new(eqe, voc, CubicSpline::constant(0.75)).unwrap()
    }

    #[test]
    fn test_responsivity_from_eqe() {
        let pv = cell();
        assert_relative_eq!(pv.responsivity(1.0), 0.9 * 0.806_554, max_relative = 1e-5);
        assert_eq!(pv.responsivity(0.3), 0.0);
    }

    #[test]
    fn test_curves_are_clamped() {
        let pv = cell();
        assert_relative_eq!(pv.voc(1000.0), 0.65, max_relative = 1e-12);
        assert_relative_eq!(pv.voc(-5.0), 0.5, max_relative = 1e-12);
        assert_relative_eq!(pv.ff(42.0), 0.75, max_relative = 1e-12);
    }

    #[test]
    fn test_eqe_validated() {
        let eqe = Series::new([(0.4, 1.2)]).unwrap();
        let result = PvResponse::new(eqe, CubicSpline::constant(0.6), CubicSpline::constant(0.7));
        assert!(result.is_err());
    }
}
