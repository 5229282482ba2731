//! CLI entry point for the climate atlas ETL.
//!
//! Builds one climatology document per registered location, and manages the
//! location registry those runs read from.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use climate_atlas::config::EtlConfig;
use climate_atlas::pipeline::{Pipeline, RunOptions, Sources};
use climate_atlas::registry::{Location, LocationRegistry, UpsertOutcome};
use climate_atlas::sources::{nager::Nager, open_meteo::OpenMeteo, usgs::Usgs};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "climate_atlas")]
#[command(about = "Builds day-of-year climatology documents for travel destinations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, aggregate and write documents for registered locations
    Run {
        /// Comma-separated slugs to process (default: all)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Location registry (overrides LOCATION_REGISTRY)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Also write a gzip copy of every document
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Reprocess locations even if their output is recent
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print the registered locations
    ListLocations {
        #[arg(long)]
        registry: Option<PathBuf>,
    },
    /// Add a location to the registry, or update an existing one
    UpsertLocation {
        /// Registry key, e.g. "lisbon-pt"
        #[arg(long)]
        slug: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        country: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, default_value_t = false)]
        coastal: bool,

        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Holiday country code when the slug suffix is not one
        #[arg(long)]
        country_code: Option<String>,

        /// Offshore point for marine data
        #[arg(long, allow_hyphen_values = true, requires = "marine_lon")]
        marine_lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, requires = "marine_lat")]
        marine_lon: Option<f64>,

        #[arg(long)]
        registry: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = EtlConfig::from_env()?;

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/climate_atlas.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("climate_atlas.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            only,
            registry,
            gzip,
            force,
        } => {
            let registry_path = registry.unwrap_or_else(|| config.registry_path.clone());
            let registry = LocationRegistry::load(&registry_path)?;
            info!(path = %registry_path.display(), locations = registry.len(), "registry loaded");

            let sources = Sources {
                archive: Box::new(OpenMeteo::new(config.api_key.clone(), config.retry)?),
                holidays: Box::new(Nager::new(config.retry)?),
                seismic: Box::new(Usgs::new(config.retry)?),
            };
            if config.api_key.is_some() {
                info!("using customer API hosts");
            }

            let pipeline = Pipeline::new(config, sources);
            let options = RunOptions { only, gzip, force };
            let summary = pipeline.run(&registry, &options).await?;
            if summary.failed > 0 {
                warn!(failed = summary.failed, "some locations failed, see the run ledger");
            }
        }
        Commands::ListLocations { registry } => {
            let registry_path = registry.unwrap_or(config.registry_path);
            let registry = LocationRegistry::load(&registry_path)?;

            for (slug, location) in registry.iter() {
                info!(
                    slug,
                    name = %location.name,
                    country = %location.country,
                    lat = location.lat,
                    lon = location.lon,
                    coastal = location.is_coastal,
                    "Location"
                );
            }
            info!(total = registry.len(), "Location list summary");
        }
        Commands::UpsertLocation {
            slug,
            name,
            country,
            lat,
            lon,
            coastal,
            timezone,
            country_code,
            marine_lat,
            marine_lon,
            registry,
        } => {
            let registry_path = registry.unwrap_or(config.registry_path);
            let mut registry = LocationRegistry::load_or_default(&registry_path)?;

            let location = Location {
                name,
                country,
                lat,
                lon,
                is_coastal: coastal,
                timezone,
                country_code,
                marine_lat,
                marine_lon,
            };
            let outcome = registry.upsert(&slug, location)?;
            if outcome != UpsertOutcome::Unchanged {
                registry.save(&registry_path)?;
            }
            info!(%slug, ?outcome, path = %registry_path.display(), "registry updated");
        }
    }

    Ok(())
}
