//! NFRC reference glazing samples.
//!
//! Normal-incidence spectral measurements from the International Glazing
//! Database, tabulated as `(λ/µm, T, R_front, R_back)`:
//!
//! | Name | Product |
//! |------|---------|
//! | `NFRC_102` | Clear float glass, 3 mm |
//! | `NFRC_2191` | Low-e coated glass, 3 mm |

use crate::provider::MaterialError;
use crate::sample::{SampleRow, SpectralSample};

/// Names accepted by [`by_name`].
pub const AVAILABLE: &[&str] = &["NFRC_102", "NFRC_2191"];

/// Look up a built-in sample by its NFRC identifier.
pub fn by_name(name: &str) -> Result<SpectralSample, MaterialError> {
    match name.to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
        "NFRC_102" | "102" => nfrc_102(),
        "NFRC_2191" | "2191" => nfrc_2191(),
        _ => Err(MaterialError::NotFound(name.to_string())),
    }
}

/// Clear float glass.
pub fn nfrc_102() -> Result<SpectralSample, MaterialError> {
    SpectralSample::new("NFRC_102", rows(NFRC_102))
}

/// Low-e coated glass.
pub fn nfrc_2191() -> Result<SpectralSample, MaterialError> {
    SpectralSample::new("NFRC_2191", rows(NFRC_2191))
}

fn rows(table: &[(f64, f64, f64, f64)]) -> Vec<SampleRow> {
    table
        .iter()
        .map(|&(wavelength, tau, rho_front, rho_back)| SampleRow {
            wavelength,
            tau,
            rho_front,
            rho_back,
        })
        .collect()
}

#[rustfmt::skip]
const NFRC_102: &[(f64, f64, f64, f64)] = &[
    (0.3, 0.002, 0.047, 0.048),
    (0.305, 0.003, 0.047, 0.048),
    (0.31, 0.009, 0.047, 0.048),
    (0.315, 0.035, 0.047, 0.048),
    (0.32, 0.1, 0.047, 0.048),
    (0.325, 0.218, 0.049, 0.05),
    (0.33, 0.356, 0.053, 0.054),
    (0.335, 0.498, 0.06, 0.061),
    (0.34, 0.616, 0.067, 0.067),
    (0.345, 0.709, 0.073, 0.074),
    (0.35, 0.774, 0.078, 0.079),
    (0.355, 0.818, 0.082, 0.082),
    (0.36, 0.847, 0.084, 0.084),
    (0.365, 0.863, 0.085, 0.085),
    (0.37, 0.869, 0.085, 0.086),
    (0.375, 0.861, 0.085, 0.085),
    (0.38, 0.856, 0.084, 0.084),
    (0.385, 0.866, 0.085, 0.085),
    (0.39, 0.881, 0.086, 0.086),
    (0.395, 0.889, 0.086, 0.086),
    (0.4, 0.893, 0.086, 0.086),
    (0.41, 0.893, 0.086, 0.086),
    (0.42, 0.892, 0.086, 0.086),
    (0.43, 0.892, 0.085, 0.085),
    (0.44, 0.892, 0.085, 0.085),
    (0.45, 0.896, 0.085, 0.085),
    (0.46, 0.9, 0.085, 0.085),
    (0.47, 0.902, 0.084, 0.084),
    (0.48, 0.903, 0.084, 0.084),
    (0.49, 0.904, 0.085, 0.085),
    (0.5, 0.905, 0.084, 0.084),
    (0.51, 0.905, 0.084, 0.084),
    (0.52, 0.905, 0.084, 0.084),
    (0.53, 0.904, 0.084, 0.084),
    (0.54, 0.904, 0.083, 0.083),
    (0.55, 0.903, 0.083, 0.083),
    (0.56, 0.902, 0.083, 0.083),
    (0.57, 0.9, 0.082, 0.082),
    (0.58, 0.898, 0.082, 0.082),
    (0.59, 0.896, 0.081, 0.081),
    (0.6, 0.893, 0.081, 0.081),
    (0.61, 0.89, 0.081, 0.081),
    (0.62, 0.886, 0.08, 0.08),
    (0.63, 0.883, 0.08, 0.08),
    (0.64, 0.879, 0.079, 0.079),
    (0.65, 0.875, 0.079, 0.079),
    (0.66, 0.872, 0.079, 0.079),
    (0.67, 0.868, 0.078, 0.078),
    (0.68, 0.863, 0.078, 0.078),
    (0.69, 0.859, 0.077, 0.077),
    (0.7, 0.854, 0.076, 0.077),
    (0.71, 0.85, 0.076, 0.076),
    (0.72, 0.845, 0.075, 0.076),
    (0.73, 0.84, 0.075, 0.075),
    (0.74, 0.835, 0.075, 0.075),
    (0.75, 0.831, 0.074, 0.074),
    (0.76, 0.826, 0.074, 0.074),
    (0.77, 0.821, 0.074, 0.074),
    (0.78, 0.816, 0.073, 0.073),
    (0.79, 0.812, 0.073, 0.073),
    (0.8, 0.808, 0.072, 0.072),
    (0.81, 0.803, 0.072, 0.072),
    (0.82, 0.8, 0.072, 0.072),
    (0.83, 0.796, 0.071, 0.071),
    (0.84, 0.793, 0.07, 0.071),
    (0.85, 0.788, 0.07, 0.071),
    (0.86, 0.786, 0.07, 0.07),
    (0.87, 0.782, 0.074, 0.074),
    (0.88, 0.78, 0.072, 0.072),
    (0.89, 0.777, 0.073, 0.074),
    (0.9, 0.776, 0.072, 0.072),
    (0.91, 0.773, 0.072, 0.072),
    (0.92, 0.771, 0.071, 0.071),
    (0.93, 0.77, 0.07, 0.07),
    (0.94, 0.768, 0.069, 0.069),
    (0.95, 0.766, 0.068, 0.068),
    (0.96, 0.766, 0.067, 0.068),
    (0.97, 0.764, 0.068, 0.068),
    (0.98, 0.763, 0.068, 0.068),
    (0.99, 0.762, 0.067, 0.067),
    (1.0, 0.762, 0.066, 0.067),
    (1.05, 0.76, 0.066, 0.066),
    (1.1, 0.759, 0.066, 0.066),
    (1.15, 0.761, 0.066, 0.066),
    (1.2, 0.765, 0.066, 0.066),
    (1.25, 0.77, 0.065, 0.065),
    (1.3, 0.777, 0.067, 0.067),
    (1.35, 0.786, 0.066, 0.067),
    (1.4, 0.795, 0.067, 0.068),
    (1.45, 0.808, 0.067, 0.067),
    (1.5, 0.819, 0.069, 0.069),
    (1.55, 0.829, 0.069, 0.069),
    (1.6, 0.836, 0.07, 0.07),
    (1.65, 0.84, 0.07, 0.07),
    (1.7, 0.842, 0.069, 0.07),
    (1.75, 0.842, 0.069, 0.07),
    (1.8, 0.841, 0.07, 0.07),
    (1.85, 0.84, 0.069, 0.069),
    (1.9, 0.839, 0.068, 0.068),
    (1.95, 0.839, 0.071, 0.071),
    (2.0, 0.839, 0.069, 0.069),
    (2.05, 0.84, 0.068, 0.068),
    (2.1, 0.841, 0.068, 0.068),
    (2.15, 0.839, 0.069, 0.069),
    (2.2, 0.83, 0.07, 0.07),
    (2.25, 0.83, 0.07, 0.07),
    (2.3, 0.832, 0.069, 0.069),
    (2.35, 0.832, 0.069, 0.07),
    (2.4, 0.832, 0.07, 0.07),
    (2.45, 0.826, 0.069, 0.069),
    (2.5, 0.822, 0.068, 0.068),
];

#[rustfmt::skip]
const NFRC_2191: &[(f64, f64, f64, f64)] = &[
    (0.3, 0.0007, 0.0565, 0.1042),
    (0.305, 0.0006, 0.0557, 0.1146),
    (0.31, 0.0019, 0.0552, 0.1321),
    (0.315, 0.0083, 0.055, 0.1537),
    (0.32, 0.0258, 0.0578, 0.1805),
    (0.325, 0.0595, 0.0652, 0.2041),
    (0.33, 0.1079, 0.0832, 0.2254),
    (0.335, 0.1638, 0.1121, 0.2413),
    (0.34, 0.22, 0.147, 0.2528),
    (0.345, 0.2722, 0.1796, 0.2591),
    (0.35, 0.3182, 0.2066, 0.2626),
    (0.355, 0.3592, 0.2261, 0.264),
    (0.36, 0.3977, 0.238, 0.2629),
    (0.365, 0.4343, 0.244, 0.2611),
    (0.37, 0.4695, 0.2437, 0.258),
    (0.375, 0.5015, 0.2364, 0.2528),
    (0.38, 0.5355, 0.2272, 0.2452),
    (0.385, 0.5783, 0.2224, 0.2369),
    (0.39, 0.6243, 0.2181, 0.2273),
    (0.395, 0.6656, 0.2101, 0.2157),
    (0.4, 0.7002, 0.1991, 0.2026),
    (0.41, 0.7509, 0.1753, 0.1755),
    (0.42, 0.7853, 0.154, 0.151),
    (0.43, 0.8099, 0.1375, 0.1308),
    (0.44, 0.8258, 0.1253, 0.1155),
    (0.45, 0.8395, 0.117, 0.1044),
    (0.46, 0.8496, 0.1113, 0.0964),
    (0.47, 0.8566, 0.1072, 0.0912),
    (0.48, 0.8611, 0.1043, 0.0879),
    (0.49, 0.8652, 0.1022, 0.086),
    (0.5, 0.8682, 0.1007, 0.085),
    (0.51, 0.8709, 0.0994, 0.0844),
    (0.52, 0.8721, 0.0982, 0.0837),
    (0.53, 0.873, 0.0967, 0.0828),
    (0.54, 0.8738, 0.0953, 0.0818),
    (0.55, 0.8738, 0.0938, 0.0805),
    (0.56, 0.8738, 0.0918, 0.0789),
    (0.57, 0.8736, 0.0896, 0.077),
    (0.58, 0.8729, 0.0875, 0.0751),
    (0.59, 0.872, 0.0848, 0.0726),
    (0.6, 0.871, 0.0823, 0.0703),
    (0.61, 0.8697, 0.0796, 0.0678),
    (0.62, 0.8682, 0.0767, 0.0649),
    (0.63, 0.8665, 0.0738, 0.0621),
    (0.64, 0.865, 0.0709, 0.0593),
    (0.65, 0.8626, 0.0683, 0.0566),
    (0.66, 0.8609, 0.0656, 0.0539),
    (0.67, 0.8583, 0.0629, 0.0511),
    (0.68, 0.8555, 0.0604, 0.0487),
    (0.69, 0.8518, 0.0581, 0.0463),
    (0.7, 0.8481, 0.0562, 0.0443),
    (0.71, 0.8448, 0.0543, 0.0423),
    (0.72, 0.8406, 0.0528, 0.0408),
    (0.73, 0.8361, 0.0515, 0.0395),
    (0.74, 0.8312, 0.0506, 0.0386),
    (0.75, 0.8257, 0.0499, 0.038),
    (0.76, 0.8209, 0.0496, 0.0379),
    (0.77, 0.815, 0.0496, 0.038),
    (0.78, 0.8096, 0.0499, 0.0386),
    (0.79, 0.8028, 0.0505, 0.0398),
    (0.8, 0.7961, 0.0515, 0.0412),
    (0.81, 0.7899, 0.0528, 0.0432),
    (0.82, 0.784, 0.0544, 0.0457),
    (0.83, 0.7775, 0.0561, 0.0486),
    (0.84, 0.7716, 0.0583, 0.052),
    (0.85, 0.7634, 0.0608, 0.0557),
    (0.86, 0.7576, 0.0638, 0.0601),
    (0.87, 0.7515, 0.0667, 0.0652),
    (0.88, 0.746, 0.0714, 0.0702),
    (0.89, 0.7385, 0.0745, 0.0754),
    (0.9, 0.7307, 0.077, 0.0814),
    (0.91, 0.7227, 0.0815, 0.0877),
    (0.92, 0.7147, 0.0851, 0.0944),
    (0.93, 0.707, 0.0891, 0.1006),
    (0.94, 0.6988, 0.0937, 0.108),
    (0.95, 0.6905, 0.098, 0.115),
    (0.96, 0.6825, 0.1027, 0.1223),
    (0.97, 0.6744, 0.1075, 0.1298),
    (0.98, 0.6664, 0.1123, 0.1378),
    (0.99, 0.6584, 0.1174, 0.1457),
    (1.0, 0.6502, 0.1226, 0.1543),
    (1.05, 0.6099, 0.15, 0.1973),
    (1.1, 0.5703, 0.1793, 0.2425),
    (1.15, 0.5325, 0.2093, 0.2881),
    (1.2, 0.4967, 0.2401, 0.3329),
    (1.25, 0.4639, 0.2712, 0.3757),
    (1.3, 0.434, 0.3024, 0.4157),
    (1.35, 0.4065, 0.3338, 0.4527),
    (1.4, 0.382, 0.3658, 0.4883),
    (1.45, 0.3597, 0.3974, 0.5199),
    (1.5, 0.3393, 0.4292, 0.549),
    (1.55, 0.3198, 0.4585, 0.5758),
    (1.6, 0.3008, 0.4845, 0.6005),
    (1.65, 0.2824, 0.5071, 0.6227),
    (1.7, 0.2649, 0.5256, 0.6433),
    (1.75, 0.2483, 0.5415, 0.6628),
    (1.8, 0.2319, 0.5535, 0.6794),
    (1.85, 0.2174, 0.5647, 0.6944),
    (1.9, 0.2049, 0.5755, 0.7092),
    (1.95, 0.1934, 0.5863, 0.7233),
    (2.0, 0.1822, 0.5942, 0.7339),
    (2.05, 0.1731, 0.603, 0.7451),
    (2.1, 0.1624, 0.611, 0.7554),
    (2.15, 0.155, 0.6157, 0.7629),
    (2.2, 0.1444, 0.6105, 0.774),
    (2.25, 0.1362, 0.6137, 0.7805),
    (2.3, 0.1307, 0.626, 0.7899),
    (2.35, 0.1264, 0.6335, 0.7956),
    (2.4, 0.1202, 0.6325, 0.8019),
    (2.45, 0.113, 0.6304, 0.8067),
    (2.5, 0.1078, 0.6227, 0.8021),
    (5.0, 0.0, 0.031, 0.931),
    (6.0, 0.0, 0.025, 0.9374),
    (7.0, 0.0, 0.013, 0.9393),
    (8.0, 0.0, 0.003, 0.9411),
    (9.0, 0.0, 0.21, 0.9439),
    (10.0, 0.0, 0.246, 0.9444),
    (11.0, 0.0, 0.151, 0.9432),
    (12.0, 0.0, 0.071, 0.9437),
    (13.0, 0.0, 0.08, 0.9448),
    (14.0, 0.0, 0.067, 0.9455),
    (15.0, 0.0, 0.054, 0.9452),
    (16.0, 0.0, 0.045, 0.9454),
    (17.0, 0.0, 0.031, 0.9445),
    (18.0, 0.0, 0.026, 0.9457),
    (19.0, 0.0, 0.077, 0.9483),
    (20.0, 0.0, 0.183, 0.9489),
    (21.0, 0.0, 0.236, 0.949),
    (22.0, 0.0, 0.235, 0.9503),
    (23.0, 0.0, 0.21, 0.9524),
    (24.0, 0.0, 0.187, 0.9508),
    (25.0, 0.0, 0.17, 0.9497),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MaterialProvider;

    #[test]
    fn test_tables_are_sorted() {
        for table in [NFRC_102, NFRC_2191] {
            for pair in table.windows(2) {
                assert!(pair[0].0 < pair[1].0);
            }
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(by_name("nfrc 102").unwrap().wavelengths().len(), 111);
        assert_eq!(by_name("2191").unwrap().wavelengths().len(), 132);
        assert!(matches!(by_name("NFRC_103"), Err(MaterialError::NotFound(_))));
    }

    #[test]
    fn test_energy_balance_of_measurements() {
        for table in [NFRC_102, NFRC_2191] {
            for &(_, t, rf, rb) in table {
                assert!(t + rf <= 1.0 && t + rb <= 1.0);
            }
        }
    }
}
