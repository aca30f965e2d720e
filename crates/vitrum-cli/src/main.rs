//! Vitrum command-line interface.
//!
//! Run multi-layer fenestration calculations from TOML job files:
//! ```sh
//! vitrum-cli run job.toml
//! vitrum-cli validate job.toml
//! vitrum-cli materials
//! vitrum-cli bases
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vitrum_core::{BasisResolution, DirectionalBasis, Property, Side};
use vitrum_materials::{nfrc, solar};

#[derive(Parser)]
#[command(name = "vitrum-cli")]
#[command(about = "Vitrum: spectral-directional optics of glazing and shading stacks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a calculation from a TOML job file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a job file and build its layers without integrating.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// List the built-in samples and spectra.
    Materials,
    /// List the standard directional bases.
    Bases,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Vitrum multi-layer optics");
            println!("=========================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let report = runner::run_job(&job)?;
            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_json {
                runner::write_report_json(&report, &out_dir.join("summary.json"))?;
            }

            if job.output.save_matrices {
                for side in Side::ALL {
                    for property in Property::ALL {
                        let name = format!("{side:?}_{property:?}.csv").to_lowercase();
                        runner::write_matrix_csv(
                            &report.results,
                            side,
                            property,
                            &out_dir.join(name),
                            &job,
                        )?;
                    }
                }
            }

            println!("Calculation complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let system = runner::build_system(&job)?;
            println!(
                "Configuration is valid: {} ({} layers, {} wavelengths)",
                config.display(),
                system.layer_count(),
                system.wavelengths().len()
            );
            Ok(())
        }
        Commands::Materials => {
            println!("Built-in glazing samples:");
            for name in nfrc::AVAILABLE {
                let sample = nfrc::by_name(name)?;
                let (lo, hi) = vitrum_materials::MaterialProvider::wavelength_range(&sample);
                println!("    {name:<10} {lo:.3}–{hi:.3} µm");
            }
            println!();
            println!("Built-in incident spectra:");
            for name in solar::AVAILABLE {
                let spectrum = solar::by_name(name)?;
                println!(
                    "    {name:<10} {:.3}–{:.3} µm",
                    spectrum.min_wavelength().unwrap_or(0.0),
                    spectrum.max_wavelength().unwrap_or(0.0)
                );
            }
            Ok(())
        }
        Commands::Bases => {
            println!("Standard directional bases:");
            for resolution in [
                BasisResolution::Small,
                BasisResolution::Quarter,
                BasisResolution::Half,
                BasisResolution::Full,
            ] {
                let name = resolution.name();
                let rings = resolution.rings().len();
                let basis = DirectionalBasis::build(resolution)?;
                println!("    {name:<8} {rings} rings, {} patches", basis.size());
            }
            Ok(())
        }
    }
}
