//! TOML configuration deserialisation for optics jobs.

use serde::Deserialize;
use vitrum_core::{BasisResolution, IntegrationRule};

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub basis: BasisConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub calculation: CalculationConfig,
    /// Layers ordered from the exterior (front) to the interior.
    #[serde(default, rename = "layer")]
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct BasisConfig {
    /// `"small"`, `"quarter"`, `"half"`, `"full"` or a custom ring list.
    #[serde(default)]
    pub resolution: BasisResolution,
}

/// Incident spectrum and optional detector response.
#[derive(Debug, Deserialize)]
pub struct SpectrumConfig {
    #[serde(flatten)]
    pub source: SpectrumSource,
    /// `[wavelength_um, response]` pairs multiplied into the spectrum.
    #[serde(default)]
    pub detector: Option<Vec<[f64; 2]>>,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            source: SpectrumSource::Named {
                source: default_spectrum(),
            },
            detector: None,
        }
    }
}

/// Incident spectrum: either a built-in name or explicit values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SpectrumSource {
    Values {
        values: Vec<[f64; 2]>,
    },
    Named {
        #[serde(default = "default_spectrum")]
        source: String,
    },
}

fn default_spectrum() -> String {
    "ASTM_E891".into()
}

/// How the common wavelength grid is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridMode {
    /// Union of the layer grids over their common range.
    #[default]
    Merged,
    /// The wavelengths of the incident spectrum.
    Spectrum,
}

#[derive(Debug, Deserialize)]
pub struct CalculationConfig {
    #[serde(default = "default_min_lambda")]
    pub min_lambda: f64,
    #[serde(default = "default_max_lambda")]
    pub max_lambda: f64,
    #[serde(default)]
    pub rule: IntegrationRule,
    #[serde(default = "default_normalization")]
    pub normalization: f64,
    #[serde(default)]
    pub grid: GridMode,
    /// Compute backend: "cpu" or "serial". Default: "cpu".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// `[theta, phi]` incidence directions (degrees) to summarise.
    #[serde(default = "default_directions")]
    pub directions: Vec<[f64; 2]>,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            min_lambda: default_min_lambda(),
            max_lambda: default_max_lambda(),
            rule: IntegrationRule::default(),
            normalization: default_normalization(),
            grid: GridMode::default(),
            backend: default_backend(),
            directions: default_directions(),
        }
    }
}

fn default_min_lambda() -> f64 {
    0.3
}
fn default_max_lambda() -> f64 {
    2.5
}
fn default_normalization() -> f64 {
    1.0
}
fn default_backend() -> String {
    "cpu".into()
}
fn default_directions() -> Vec<[f64; 2]> {
    vec![[0.0, 0.0]]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Specular,
    DiffuseShade,
}

/// A single layer of the stack.
///
/// Exactly one of `sample`, `rows` or `uniform` supplies the material.
#[derive(Debug, Deserialize)]
pub struct LayerConfig {
    pub kind: LayerKind,
    /// Built-in sample identifier (e.g. "NFRC_102").
    #[serde(default)]
    pub sample: Option<String>,
    /// Inline `[wavelength_um, T, R_front, R_back]` measurements.
    #[serde(default)]
    pub rows: Option<Vec<[f64; 4]>>,
    #[serde(default)]
    pub uniform: Option<UniformConfig>,
    /// Install the material back to front.
    #[serde(default)]
    pub flipped: bool,
    /// Open fraction of a shade.
    #[serde(default)]
    pub openness: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photovoltaic: Option<PhotovoltaicConfig>,
}

#[derive(Debug, Deserialize)]
pub struct UniformConfig {
    pub tau: f64,
    pub rho_front: f64,
    pub rho_back: f64,
    #[serde(default = "default_uniform_range")]
    pub range: [f64; 2],
}

fn default_uniform_range() -> [f64; 2] {
    [0.3, 2.5]
}

/// Photovoltaic response of an active layer.
#[derive(Debug, Deserialize)]
pub struct PhotovoltaicConfig {
    /// `[wavelength_um, eqe]` pairs.
    pub eqe: Vec<[f64; 2]>,
    /// `[jsc_A_per_m2, voc_V]` knots.
    pub voc: Vec<[f64; 2]>,
    /// `[jsc_A_per_m2, ff]` knots.
    pub ff: Vec<[f64; 2]>,
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save the scalar summary as JSON (default: true).
    #[serde(default = "default_true")]
    pub save_json: bool,
    /// Whether to save the four BSDF matrices as CSV (default: false).
    #[serde(default)]
    pub save_matrices: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_json: true,
            save_matrices: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    if config.layers.is_empty() {
        anyhow::bail!("a job needs at least one [[layer]]");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_job_uses_defaults() {
        let job = parse_config(
            r#"
            [[layer]]
            kind = "specular"
            sample = "NFRC_102"
            "#,
        )
        .unwrap();
        assert_eq!(job.basis.resolution, BasisResolution::Full);
        assert!(matches!(
            job.spectrum.source,
            SpectrumSource::Named { ref source } if source == "ASTM_E891"
        ));
        assert_eq!(job.calculation.min_lambda, 0.3);
        assert_eq!(job.calculation.grid, GridMode::Merged);
        assert_eq!(job.calculation.directions, vec![[0.0, 0.0]]);
        assert!(job.output.save_json);
        assert!(!job.layers[0].flipped);
    }

    #[test]
    fn test_full_job() {
        let job = parse_config(
            r#"
            [basis]
            resolution = "quarter"

            [spectrum]
            values = [[0.3, 100.0], [2.5, 50.0]]
            detector = [[0.3, 1.0], [2.5, 0.5]]

            [calculation]
            min_lambda = 0.38
            max_lambda = 0.78
            rule = "rectangular"
            grid = "spectrum"
            directions = [[0.0, 0.0], [60.0, 90.0]]

            [[layer]]
            kind = "specular"
            sample = "NFRC_2191"
            flipped = true

            [[layer]]
            kind = "diffuse_shade"
            openness = 0.05
            uniform = { tau = 0.1, rho_front = 0.6, rho_back = 0.5 }
            "#,
        )
        .unwrap();
        assert_eq!(job.basis.resolution, BasisResolution::Quarter);
        assert!(matches!(job.spectrum.source, SpectrumSource::Values { ref values } if values.len() == 2));
        assert_eq!(job.calculation.rule, IntegrationRule::Rectangular);
        assert_eq!(job.calculation.grid, GridMode::Spectrum);
        assert_eq!(job.layers.len(), 2);
        assert_eq!(job.layers[1].kind, LayerKind::DiffuseShade);
        assert_eq!(job.layers[1].uniform.as_ref().unwrap().range, [0.3, 2.5]);
    }

    #[test]
    fn test_job_without_layers_rejected() {
        assert!(parse_config("[basis]\nresolution = \"small\"\n").is_err());
    }

    #[test]
    fn test_bundled_jobs_parse() {
        let glazing = parse_config(include_str!("../../../jobs/double_glazing.toml")).unwrap();
        assert_eq!(glazing.layers.len(), 2);
        assert!(glazing.layers[0].flipped);
        let shaded = parse_config(include_str!("../../../jobs/shaded_pv.toml")).unwrap();
        assert!(shaded.layers[1].photovoltaic.is_some());
        assert_eq!(shaded.layers[2].kind, LayerKind::DiffuseShade);
    }
}
