//! Job runner: ties together spectra, materials, cells and the multi-pane
//! calculation.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use vitrum_compute::ComputeBackend;
use vitrum_core::results::ResultSummary;
use vitrum_core::{
    BsdfResults, DirectionalBasis, MultiPaneBsdf, MultiPaneOptions, OpticalLayer, Property,
    Series, Side,
};
use vitrum_materials::spline::CubicSpline;
use vitrum_materials::{
    nfrc, solar, BsdfLayer, Cell, MaterialProvider, NormalProperties, PvResponse, SampleRow,
    SpectralSample, UniformMaterial,
};

use crate::config::{
    GridMode, JobConfig, LayerConfig, LayerKind, PhotovoltaicConfig, SpectrumSource,
};

/// Everything a finished job reports.
#[derive(Debug, Serialize)]
pub struct JobReport {
    pub basis: String,
    pub patches: usize,
    pub layers: Vec<String>,
    pub wavelengths: usize,
    pub summaries: Vec<ResultSummary>,
    #[serde(skip)]
    pub results: Arc<BsdfResults>,
}

/// Build the stack described by `job`.
pub fn build_system(job: &JobConfig) -> Result<MultiPaneBsdf> {
    let basis = Arc::new(
        DirectionalBasis::build(job.basis.resolution.clone()).context("building the basis")?,
    );
    let backend = create_backend(&job.calculation.backend)?;

    let spectrum = match &job.spectrum.source {
        SpectrumSource::Named { source } => solar::by_name(source)?,
        SpectrumSource::Values { values } => pairs_to_series(values).context("spectrum values")?,
    };
    let detector = job
        .spectrum
        .detector
        .as_deref()
        .map(pairs_to_series)
        .transpose()
        .context("detector values")?;

    let layers = job
        .layers
        .iter()
        .enumerate()
        .map(|(i, cfg)| {
            build_layer(&basis, cfg, &backend).with_context(|| format!("layer {}", i + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    let options = MultiPaneOptions {
        detector,
        wavelengths: match job.calculation.grid {
            GridMode::Merged => None,
            GridMode::Spectrum => Some(spectrum.wavelengths().to_vec()),
        },
        rule: job.calculation.rule,
        normalization: job.calculation.normalization,
        backend: Some(backend),
    };
    Ok(MultiPaneBsdf::with_options(layers, spectrum, options)?)
}

/// Run a full calculation from a parsed job configuration.
pub fn run_job(job: &JobConfig) -> Result<JobReport> {
    let mut system = build_system(job)?;
    let calc = &job.calculation;
    println!(
        "  {} layers, {} wavelengths, {} directions",
        system.layer_count(),
        system.wavelengths().len(),
        system.basis().size()
    );

    let results = system
        .calculate(calc.min_lambda, calc.max_lambda)
        .with_context(|| format!("integrating over [{}, {}]", calc.min_lambda, calc.max_lambda))?;

    let summaries: Vec<ResultSummary> = calc
        .directions
        .iter()
        .map(|&[theta, phi]| results.summary(theta, phi))
        .collect();
    for s in &summaries {
        println!(
            "  θ={:5.1}° φ={:5.1}°: T={:.6}  Rf={:.6}  Rb={:.6}",
            s.theta, s.phi, s.tau_front_dir_hem, s.rho_front_dir_hem, s.rho_back_dir_hem
        );
    }
    println!(
        "  Hemispherical: T={:.6}  Rf={:.6}  Rb={:.6}",
        results.diff_diff(Side::Front, Property::Tau),
        results.diff_diff(Side::Front, Property::Rho),
        results.diff_diff(Side::Back, Property::Rho)
    );

    let basis = system.basis();
    Ok(JobReport {
        basis: basis.resolution().name().to_string(),
        patches: basis.size(),
        layers: system_layer_names(job),
        wavelengths: system.wavelengths().len(),
        summaries,
        results,
    })
}

fn system_layer_names(job: &JobConfig) -> Vec<String> {
    job.layers
        .iter()
        .enumerate()
        .map(|(i, l)| {
            l.name.clone().unwrap_or_else(|| {
                let material = l
                    .sample
                    .clone()
                    .unwrap_or_else(|| if l.uniform.is_some() { "uniform" } else { "custom" }.into());
                format!("{}: {material}{}", i + 1, if l.flipped { " (flipped)" } else { "" })
            })
        })
        .collect()
}

fn build_layer(
    basis: &Arc<DirectionalBasis>,
    cfg: &LayerConfig,
    backend: &Arc<dyn ComputeBackend>,
) -> Result<Arc<dyn OpticalLayer>> {
    let material = build_material(cfg)?;
    let cell = match cfg.kind {
        LayerKind::Specular => Cell::specular(material),
        LayerKind::DiffuseShade => Cell::diffuse_shade(material, cfg.openness)?,
    };
    let mut layer = BsdfLayer::new(basis.clone(), cell).with_backend(backend.clone());
    if let Some(pv) = &cfg.photovoltaic {
        layer = layer.with_photovoltaic(build_photovoltaic(pv)?);
    }
    log::debug!("Built layer '{}'", layer.name());
    Ok(Arc::new(layer))
}

fn build_material(cfg: &LayerConfig) -> Result<Arc<dyn MaterialProvider>> {
    match (&cfg.sample, &cfg.rows, &cfg.uniform) {
        (Some(name), None, None) => {
            let sample = nfrc::by_name(name)?;
            Ok(Arc::new(if cfg.flipped { sample.flipped() } else { sample }))
        }
        (None, Some(rows), None) => {
            let rows = rows
                .iter()
                .map(|&[wavelength, tau, rho_front, rho_back]| SampleRow {
                    wavelength,
                    tau,
                    rho_front,
                    rho_back,
                })
                .collect();
            let name = cfg.name.clone().unwrap_or_else(|| "custom".into());
            let sample = SpectralSample::new(name, rows)?;
            Ok(Arc::new(if cfg.flipped { sample.flipped() } else { sample }))
        }
        (None, None, Some(u)) => {
            let (rho_front, rho_back) = if cfg.flipped {
                (u.rho_back, u.rho_front)
            } else {
                (u.rho_front, u.rho_back)
            };
            let props = NormalProperties {
                tau: u.tau,
                rho_front,
                rho_back,
            };
            let name = cfg.name.clone().unwrap_or_else(|| "uniform".into());
            Ok(Arc::new(UniformMaterial::new(name, props, u.range[0], u.range[1])?))
        }
        _ => anyhow::bail!("exactly one of 'sample', 'rows' or 'uniform' must be given"),
    }
}

fn build_photovoltaic(cfg: &PhotovoltaicConfig) -> Result<PvResponse> {
    let curve = |knots: &[[f64; 2]], what: &str| -> Result<CubicSpline> {
        let (xs, ys) = knots.iter().map(|k| (k[0], k[1])).unzip();
        CubicSpline::new(xs, ys).with_context(|| format!("photovoltaic {what} curve"))
    };
    Ok(PvResponse::new(
        pairs_to_series(&cfg.eqe).context("photovoltaic EQE")?,
        curve(&cfg.voc, "Voc")?,
        curve(&cfg.ff, "FF")?,
    )?)
}

fn pairs_to_series(pairs: &[[f64; 2]]) -> Result<Series> {
    Ok(Series::new(pairs.iter().map(|p| (p[0], p[1])))?)
}

/// Write the job report to a JSON file.
pub fn write_report_json(report: &JobReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Summary (JSON) written to: {}", path.display());
    Ok(())
}

/// Write one band-integrated BSDF matrix to a CSV file with a metadata
/// header. Rows are outgoing directions, columns incoming directions.
pub fn write_matrix_csv(
    results: &BsdfResults,
    side: Side,
    property: Property,
    path: &Path,
    job: &JobConfig,
) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    let (min_lambda, max_lambda) = results.range();

    writeln!(file, "# Vitrum BSDF matrix ({:?} {:?}, sr^-1)", side, property)?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# basis: {}", results.basis().resolution().name())?;
    writeln!(file, "# range: [{min_lambda}, {max_lambda}] um")?;
    for (i, layer) in system_layer_names(job).iter().enumerate() {
        writeln!(file, "# layer {}: {}", i + 1, layer)?;
    }
    writeln!(file, "#")?;

    for row in results.matrix(side, property).rows() {
        let line: Vec<String> = row.iter().map(|v| format!("{v:.6e}")).collect();
        writeln!(file, "{}", line.join(","))?;
    }

    println!("Matrix written to: {}", path.display());
    Ok(())
}

/// Create a compute backend based on the user's preference string.
///
/// - `"serial"`: single-threaded reference backend.
/// - `"cpu"` (default): rayon thread pool.
fn create_backend(preference: &str) -> Result<Arc<dyn ComputeBackend>> {
    let backend: Arc<dyn ComputeBackend> = match preference {
        "cpu" | "auto" => Arc::new(vitrum_compute::CpuBackend::new()),
        "serial" => Arc::new(vitrum_compute::SerialBackend),
        other => anyhow::bail!("Unknown backend '{other}'. Valid values: cpu, serial"),
    };
    log::info!("Backend: {}", backend.device_info().name);
    Ok(backend)
}
