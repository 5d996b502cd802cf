//! Paleolatitude CLI.
//!
//! Computes the paleolatitude of a site for an age, an age range or all ages,
//! and prints a summary or a machine-readable block with the full result
//! table and a KML map.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paleolatitude::dataset::DEFAULT_DATASET_ID;
use paleolatitude::solver::output;
use paleolatitude::{
    known_apwp_datasets, AgeOptions, DataPaths, PaleoLatitude, QueryParameters, ReferenceData,
};

const ABOUT: &str = "\
This is PaleoLatitude version {version} (http://www.paleolatitude.org)

If you use this model, please cite:
  D.J.J. van Hinsbergen, L.V. de Groot, S.J. van Schaik, W. Spakman, P.K. Bijl,
  A. Sluijs, C.G. Langereis, H. Brinkhuis: \"A Paleolatitude Calculator for
  Paleoclimate Studies\", PLoS ONE 10(6), 2015,
  http://doi.org/10.1371/journal.pone.0126946
";

/// Compute the paleolatitude of a site through geological time.
#[derive(Parser, Debug)]
#[command(name = "paleolatitude")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Site latitude in degrees, [-90, 90].
    #[arg(long, allow_negative_numbers = true)]
    site_lat: Option<f64>,

    /// Site longitude in degrees, [-180, 180].
    #[arg(long, allow_negative_numbers = true)]
    site_lon: Option<f64>,

    /// Age of interest in Myr.
    #[arg(long)]
    age: Option<f64>,

    /// Lower end of the age range in Myr; requires --max-age.
    #[arg(long)]
    min_age: Option<f64>,

    /// Upper end of the age range in Myr; requires --min-age.
    #[arg(long)]
    max_age: Option<f64>,

    /// Uncertainty on --age in Myr; the range becomes [age - pm, age + pm].
    #[arg(long, visible_alias = "age-error")]
    age_pm: Option<f64>,

    /// Compute for every age in the rotation model.
    #[arg(long)]
    all_ages: bool,

    /// Directory holding the reference datasets.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Polar wander path dataset id (see --list-apwp-datasets).
    #[arg(long)]
    apwp_dataset: Option<String>,

    /// List the polar wander path datasets in --data-dir and exit.
    #[arg(long)]
    list_apwp_datasets: bool,

    /// Polar wander path CSV; overrides --apwp-dataset.
    #[arg(long)]
    input_apwp_csv: Option<PathBuf>,

    /// Euler rotation CSV; overrides --apwp-dataset.
    #[arg(long)]
    input_euler_rotation_csv: Option<PathBuf>,

    /// Plate polygons (.gpml or .kml).
    #[arg(long)]
    input_plates_file: Option<PathBuf>,

    /// Load reference data from a snapshot instead of the input files.
    #[arg(long)]
    reference_snapshot: Option<PathBuf>,

    /// Save the loaded reference data as a snapshot.
    #[arg(long)]
    write_snapshot: Option<PathBuf>,

    /// Write the result table as CSV.
    #[arg(long)]
    csv_output_file: Option<PathBuf>,

    /// Write the site and plates as KML.
    #[arg(long)]
    kml_output_file: Option<PathBuf>,

    /// Print results in a machine-readable format.
    #[arg(long)]
    machine_readable: bool,

    /// Do not print the about text.
    #[arg(long)]
    skip_about: bool,

    /// Print the about text and exit.
    #[arg(long)]
    about: bool,

    /// 0 = errors, 1 = warnings, 2 = info, 3 = debug, 4 = trace.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=4))]
    log_level: u8,
}

impl Cli {
    fn age_options(&self) -> AgeOptions {
        AgeOptions {
            age: self.age,
            age_min: self.min_age,
            age_max: self.max_age,
            age_pm: self.age_pm,
            all_ages: self.all_ages,
        }
    }

    fn data_paths(&self) -> anyhow::Result<DataPaths> {
        let dataset_id = match &self.apwp_dataset {
            Some(id) => {
                let known = known_apwp_datasets(&self.data_dir).with_context(|| {
                    format!("Failed to list datasets in {}", self.data_dir.display())
                })?;
                if !known.contains_key(id) {
                    bail!(
                        "Unknown polar wander path dataset '{}' (known: {})",
                        id,
                        known.keys().cloned().collect::<Vec<_>>().join(", ")
                    );
                }
                id.as_str()
            }
            None => DEFAULT_DATASET_ID,
        };

        let mut paths = DataPaths::for_dataset(&self.data_dir, dataset_id);
        if let Some(p) = &self.input_apwp_csv {
            paths.apwp_csv = p.clone();
        }
        if let Some(p) = &self.input_euler_rotation_csv {
            paths.euler_csv = p.clone();
        }
        if let Some(p) = &self.input_plates_file {
            paths.plates_file = p.clone();
        }
        Ok(paths)
    }
}

fn init_logging(level: u8) {
    let level = match level {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn create_output(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    if cli.about || !(cli.skip_about || cli.machine_readable) {
        println!("{}", ABOUT.replace("{version}", paleolatitude::VERSION));
    }
    if cli.about {
        return Ok(());
    }

    if cli.list_apwp_datasets {
        let known = known_apwp_datasets(&cli.data_dir)
            .with_context(|| format!("Failed to list datasets in {}", cli.data_dir.display()))?;
        for (id, path) in known {
            println!("{}\t{}", id, path.display());
        }
        return Ok(());
    }

    let data = match &cli.reference_snapshot {
        Some(path) => ReferenceData::load_from_file(path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?,
        None => {
            let paths = cli.data_paths()?;
            ReferenceData::load(&paths).context("Failed to load reference data")?
        }
    };

    if let Some(path) = &cli.write_snapshot {
        data.save_to_file(path)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        if cli.site_lat.is_none() && cli.site_lon.is_none() {
            return Ok(());
        }
    }

    let (Some(lat), Some(lon)) = (cli.site_lat, cli.site_lon) else {
        bail!("Both --site-lat and --site-lon are required");
    };
    let params = QueryParameters::from_options(lat, lon, cli.age_options())?;

    let mut pl = PaleoLatitude::new(data);
    if !pl.compute(&params)? {
        match pl.rejection() {
            Some(reason) => bail!("{}", reason),
            None => bail!("Paleolatitude computation failed"),
        }
    }

    let plate = pl.resolved_plate()?;
    let entries = pl.relevant_entries()?;
    let plates = &pl.data().plates;

    if cli.machine_readable {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        output::write_machine_readable(&mut out, &params.site, plate, entries, plates)?;
        out.flush()?;
    } else {
        let summary = pl.paleolatitude()?;
        println!(
            "{}",
            output::summary_line(&params.site, &summary, params.age_years().is_some())
        );
    }

    if let Some(path) = &cli.csv_output_file {
        let mut out = create_output(path)?;
        output::write_csv(&mut out, entries, plates)?;
        out.flush()?;
        info!("Wrote CSV output to {}", path.display());
    }
    if let Some(path) = &cli.kml_output_file {
        let mut out = create_output(path)?;
        output::write_kml(&mut out, &params.site, plate.id, plates)?;
        out.flush()?;
        info!("Wrote KML output to {}", path.display());
    }

    Ok(())
}
