//! Hemispherical averaging of angle-dependent properties.
//!
//! For a property $f(\theta)$ that depends only on the polar angle of
//! incidence, the diffuse (hemispherical) value under uniform radiance is
//!
//! $$\bar{f} = 2\int_0^{\pi/2} f(\theta)\sin\theta\cos\theta\,d\theta
//!   = \int_0^{\pi/2} f(\theta)\sin 2\theta\,d\theta$$

use crate::error::OpticsError;
use crate::series::Series;
use crate::types::IntegrationRule;

/// Hemispherical value of an angular property series.
///
/// # Arguments
///
/// * `angular` - Property values keyed by incidence angle in degrees.
/// * `rule` - Quadrature rule applied over the angle in radians.
pub fn hemispherical_2d(angular: &Series, rule: IntegrationRule) -> Result<f64, OpticsError> {
    let weighted = Series::new(angular.iter().map(|(theta_deg, value)| {
        let theta = theta_deg.to_radians();
        (theta, value * (2.0 * theta).sin())
    }))?;
    Ok(weighted.total(rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_double_glazing_solar_transmittance() {
        // normal-to-grazing solar transmittance of a clear double glazing
        let angular = Series::new(vec![
            (0.0, 0.652),
            (10.0, 0.651),
            (20.0, 0.648),
            (30.0, 0.640),
            (40.0, 0.624),
            (50.0, 0.592),
            (60.0, 0.527),
            (70.0, 0.397),
            (80.0, 0.185),
            (90.0, 0.000),
        ])
        .unwrap();
        let value = hemispherical_2d(&angular, IntegrationRule::Trapezoidal).unwrap();
        assert_abs_diff_eq!(value, 0.552_539_784_383_093_5, epsilon = 1e-6);
    }

    #[test]
    fn test_constant_property_integrates_to_itself() {
        let angles: Vec<(f64, f64)> = (0..=90).map(|d| (d as f64, 0.5)).collect();
        let value = hemispherical_2d(&Series::new(angles).unwrap(), IntegrationRule::Trapezoidal)
            .unwrap();
        assert_abs_diff_eq!(value, 0.5, epsilon = 1e-4);
    }
}
