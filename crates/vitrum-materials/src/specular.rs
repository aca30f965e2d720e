//! Panes for the angle-exact specular orchestrator.
//!
//! A [`SpecularPane`] interpolates its material's normal-incidence data at the
//! requested wavelength and then applies the uncoated-glass angular model in
//! [`angular`](crate::angular), so the stack sees the pane at the exact angle
//! of the beam rather than at a basis patch centre.

use std::sync::Arc;

use vitrum_core::{OpticsError, SpecularLayer, SpecularProperties};

use crate::angular::uncoated_properties;
use crate::provider::MaterialProvider;

pub struct SpecularPane {
    name: String,
    material: Arc<dyn MaterialProvider>,
}

impl SpecularPane {
    pub fn new(material: Arc<dyn MaterialProvider>) -> Self {
        Self {
            name: format!("{} (specular)", material.name()),
            material,
        }
    }

    pub fn material(&self) -> &Arc<dyn MaterialProvider> {
        &self.material
    }
}

impl SpecularLayer for SpecularPane {
    fn wavelengths(&self) -> &[f64] {
        self.material.wavelengths()
    }

    fn properties_at(&self, wavelength: f64, theta: f64) -> Result<SpecularProperties, OpticsError> {
        let normal = self
            .material
            .properties_at(wavelength)
            .map_err(|e| OpticsError::InvalidLayer(format!("{}: {e}", self.name)))?;
        let (tau, rho_front, rho_back) =
            uncoated_properties(normal.tau, normal.rho_front, normal.rho_back, theta);
        Ok(SpecularProperties {
            tau,
            rho_front,
            rho_back,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfrc;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normal_incidence_interpolates_measurements() {
        let glass: Arc<dyn MaterialProvider> = Arc::new(nfrc::nfrc_102().unwrap());
        let pane = SpecularPane::new(glass.clone());
        let (lo, hi) = (glass.properties(20).unwrap(), glass.properties(21).unwrap());
        let mid = 0.5 * (glass.wavelengths()[20] + glass.wavelengths()[21]);
        let props = pane.properties_at(mid, 0.0).unwrap();
        assert_abs_diff_eq!(props.tau, 0.5 * (lo.tau + hi.tau), epsilon = 1e-12);
        assert_abs_diff_eq!(props.rho_back, 0.5 * (lo.rho_back + hi.rho_back), epsilon = 1e-12);
    }

    #[test]
    fn test_oblique_incidence_follows_angular_model() {
        let glass: Arc<dyn MaterialProvider> = Arc::new(nfrc::nfrc_2191().unwrap());
        let pane = SpecularPane::new(glass.clone());
        let normal = glass.properties_at(0.55).unwrap();
        let (tau, rho_front, rho_back) =
            uncoated_properties(normal.tau, normal.rho_front, normal.rho_back, 60.0);
        let props = pane.properties_at(0.55, 60.0).unwrap();
        assert_eq!(props.tau, tau);
        assert_eq!(props.rho_front, rho_front);
        assert_eq!(props.rho_back, rho_back);
        assert!(props.tau < normal.tau);
    }

    #[test]
    fn test_out_of_range_wavelength_is_a_layer_error() {
        let pane = SpecularPane::new(Arc::new(nfrc::nfrc_102().unwrap()));
        assert!(matches!(
            pane.properties_at(10.0, 0.0),
            Err(OpticsError::InvalidLayer(_))
        ));
    }
}
