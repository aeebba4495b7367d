pub mod types;
pub mod error;
pub mod config;
pub mod schema;
pub mod data;
pub mod processing;
pub mod render;
pub mod inspect;

use clap::{Parser, Subcommand};
use error::GenerateResult;
use geo::Point;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use types::GenerationSummary;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the concentric WWA priority sample
    Generate {
        /// TOML config; built-in defaults are used when omitted
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Check ring nesting and attributes of a generated dataset
    Inspect {
        #[arg(value_name = "FILE")]
        dataset: PathBuf,
    },
}

/// Load categories, build rings, write them. Nothing is created on disk
/// unless the input and geometry settings are valid.
pub fn generate(app_config: &config::AppConfig) -> GenerateResult<GenerationSummary> {
    app_config.validate()?;

    // 1. Load categories
    let categories = data::load_categories(&app_config.input.categories)?;

    // 2. Build rings
    let [lon, lat] = app_config.geometry.centroid;
    let centroid = Point::new(lon, lat);
    let rings = processing::RingGenerator::new(
        &categories,
        centroid,
        app_config.geometry.increment,
        app_config.geometry.segments,
    )?;
    let innermost_radius = rings.radius_at(1);
    let outermost_radius = rings.radius_at(categories.len());

    // 3. Write dataset
    let records = render::write_rings(&app_config.output.path, rings)?;

    Ok(GenerationSummary {
        records,
        centroid,
        innermost_radius,
        outermost_radius,
        output: app_config.output.path.clone(),
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            let app_config = config::AppConfig::load_or_default(config.as_deref())?;
            info!("Generating sample with config: {:?}", config);

            let summary = generate(&app_config)?;

            info!(
                records = summary.records,
                centroid = ?(summary.centroid.x(), summary.centroid.y()),
                innermost = summary.innermost_radius,
                outermost = summary.outermost_radius,
                "Generation complete: {:?}",
                summary.output
            );
        }
        Commands::Inspect { dataset } => {
            let features = data::load_dataset(dataset)?;
            let report = inspect::inspect(&features);

            info!("{} features in {:?}", report.features, dataset);
            for (i, category) in report.categories.iter().enumerate() {
                info!("  {:>3}  {}", i + 1, category);
            }
            for position in &report.nesting_violations {
                warn!(
                    "Ring {} ({}) does not contain ring {}",
                    position + 1,
                    report.categories[*position],
                    position
                );
            }
            if !report.varying_fields.is_empty() {
                warn!("Fields vary between features: {}", report.varying_fields.join(", "));
            }

            if !report.is_valid() {
                anyhow::bail!("{:?} failed inspection", dataset);
            }
            info!("Ring nesting and attributes OK");
        }
    }

    Ok(())
}
