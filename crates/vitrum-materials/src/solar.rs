//! Reference incident spectra.
//!
//! ASTM E891 direct normal solar irradiance at air mass 1.5, tabulated as
//! `(λ/µm, W·m⁻²·µm⁻¹)`.

use vitrum_core::Series;

use crate::provider::MaterialError;

/// Names accepted by [`by_name`].
pub const AVAILABLE: &[&str] = &["ASTM_E891"];

pub fn by_name(name: &str) -> Result<Series, MaterialError> {
    match name.to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
        "ASTM_E891" | "E891" => astm_e891(),
        _ => Err(MaterialError::NotFound(name.to_string())),
    }
}

/// ASTM E891 direct normal solar spectrum.
pub fn astm_e891() -> Result<Series, MaterialError> {
    Ok(Series::new(ASTM_E891.iter().copied())?)
}

#[rustfmt::skip]
const ASTM_E891: &[(f64, f64)] = &[
    (0.3, 0.0),
    (0.305, 3.4),
    (0.31, 15.6),
    (0.315, 41.1),
    (0.32, 71.2),
    (0.325, 100.2),
    (0.33, 152.4),
    (0.335, 155.6),
    (0.34, 179.4),
    (0.345, 186.7),
    (0.35, 212.0),
    (0.36, 240.5),
    (0.37, 324.0),
    (0.38, 362.4),
    (0.39, 381.7),
    (0.4, 556.0),
    (0.41, 656.3),
    (0.42, 690.8),
    (0.43, 641.9),
    (0.44, 798.5),
    (0.45, 956.6),
    (0.46, 990.0),
    (0.47, 998.0),
    (0.48, 1046.1),
    (0.49, 1005.1),
    (0.5, 1026.7),
    (0.51, 1066.7),
    (0.52, 1011.5),
    (0.53, 1084.9),
    (0.54, 1082.4),
    (0.55, 1102.2),
    (0.57, 1087.4),
    (0.59, 1024.3),
    (0.61, 1088.8),
    (0.63, 1062.1),
    (0.65, 1061.7),
    (0.67, 1046.2),
    (0.69, 859.2),
    (0.71, 1002.4),
    (0.718, 816.9),
    (0.7244, 842.8),
    (0.74, 971.0),
    (0.7525, 956.3),
    (0.7575, 942.2),
    (0.7625, 524.8),
    (0.7675, 830.7),
    (0.78, 908.9),
    (0.8, 873.4),
    (0.816, 712.0),
    (0.8237, 660.2),
    (0.8315, 765.5),
    (0.84, 799.8),
    (0.86, 815.2),
    (0.88, 778.3),
    (0.905, 630.4),
    (0.915, 565.2),
    (0.925, 586.4),
    (0.93, 348.1),
    (0.937, 224.2),
    (0.948, 271.4),
    (0.965, 451.2),
    (0.98, 549.7),
    (0.9935, 630.1),
    (1.04, 582.9),
    (1.07, 539.7),
    (1.1, 366.2),
    (1.12, 98.1),
    (1.13, 169.5),
    (1.137, 118.7),
    (1.161, 301.9),
    (1.18, 406.8),
    (1.2, 375.2),
    (1.235, 423.6),
    (1.29, 365.7),
    (1.32, 223.4),
    (1.35, 30.1),
    (1.395, 1.4),
    (1.4425, 51.6),
    (1.4625, 97.0),
    (1.477, 97.3),
    (1.497, 167.1),
    (1.52, 239.3),
    (1.539, 248.8),
    (1.558, 249.3),
    (1.578, 222.3),
    (1.592, 227.3),
    (1.61, 210.5),
    (1.63, 224.7),
    (1.646, 215.9),
    (1.678, 202.8),
    (1.74, 158.2),
    (1.8, 28.6),
    (1.86, 1.8),
    (1.92, 1.1),
    (1.96, 19.7),
    (1.985, 84.9),
    (2.005, 25.0),
    (2.035, 92.5),
    (2.065, 56.3),
    (2.1, 82.7),
    (2.148, 76.2),
    (2.198, 66.4),
    (2.27, 65.0),
    (2.36, 57.6),
    (2.45, 19.8),
    (2.494, 17.0),
    (2.537, 3.0),
    (2.941, 4.0),
    (2.973, 7.0),
    (3.005, 6.0),
    (3.056, 3.0),
    (3.132, 5.0),
    (3.156, 18.0),
    (3.204, 1.2),
    (3.245, 3.0),
    (3.317, 12.0),
    (3.344, 3.0),
    (3.45, 12.2),
    (3.573, 11.0),
    (3.765, 9.0),
    (4.045, 6.9),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solar_table_shape() {
        let solar = astm_e891().unwrap();
        assert_eq!(solar.len(), 121);
        assert_eq!(solar.min_wavelength(), Some(0.3));
        assert_eq!(solar.max_wavelength(), Some(4.045));
    }

    #[test]
    fn test_unknown_spectrum() {
        assert!(matches!(by_name("AM0"), Err(MaterialError::NotFound(_))));
    }
}
