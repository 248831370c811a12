//! IATI scraper orchestrator - builds one HDX dataset per country from d-portal data

use anyhow::{Context, Result};
use clap::Parser;
use hdx_scraper_iati::iati::assemble::DatasetAssembler;
use hdx_scraper_iati::iati::config::{Configuration, StaticTemplate};
use hdx_scraper_iati::iati::countries::{
    default_countries_path, filter_countries, CountryProvider, CsvCountryProvider,
};
use hdx_scraper_iati::iati::fetch::{Retriever, SaveMode};
use hdx_scraper_iati::iati::publish::JsonFileSink;
use hdx_scraper_iati::iati::run::generate_datasets;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Generate per-country IATI activity datasets for HDX.
#[derive(Parser, Debug)]
#[command(name = "iati-scraper")]
struct Args {
    /// Save downloaded data into the saved-data directory
    #[arg(long, env = "IATI_SAVE")]
    save: bool,

    /// Read previously saved data instead of querying d-portal
    #[arg(long, env = "IATI_USE_SAVED", conflicts_with = "save")]
    use_saved: bool,

    /// Directory used by --save and --use-saved
    #[arg(long, default_value = "saved_data", env = "IATI_SAVED_DIR")]
    saved_dir: PathBuf,

    /// Directory consulted when a download fails
    #[arg(long, env = "IATI_FALLBACK_DIR")]
    fallback_dir: Option<PathBuf>,

    /// Directory holding project_configuration.yaml, hdx_dataset_static.yaml and countries.csv
    #[arg(long, default_value = "config", env = "IATI_CONFIG_DIR")]
    config_dir: PathBuf,

    /// Country list, defaults to countries.csv in the config directory
    #[arg(long, env = "IATI_COUNTRIES_FILE")]
    countries_file: Option<PathBuf>,

    /// Only process these ISO2 codes (comma separated)
    #[arg(long, value_delimiter = ',', env = "IATI_COUNTRIES")]
    countries: Vec<String>,

    /// Where resource CSV files are written
    #[arg(long, default_value = "/tmp/hdx-scraper-iati", env = "TEMP_DIR")]
    work_dir: PathBuf,

    /// Where finalized dataset records are written
    #[arg(long, default_value = "output", env = "IATI_OUTPUT_DIR")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    let args = Args::parse();
    info!("Starting IATI scraper");

    let configuration = Configuration::read(&args.config_dir.join("project_configuration.yaml"))?;
    let static_template = StaticTemplate::read(&args.config_dir.join("hdx_dataset_static.yaml"))?;
    info!("Configuration loaded");

    let countries_file = args
        .countries_file
        .clone()
        .unwrap_or_else(|| default_countries_path(&args.config_dir));
    let countries = CsvCountryProvider::new(countries_file).countries()?;
    let countries = filter_countries(countries, &args.countries);
    if countries.is_empty() {
        warn!("No countries to process");
    }

    let mode = SaveMode::from_flags(args.save, args.use_saved)?;
    let mut retriever = Retriever::new(&args.saved_dir, mode)?;
    if let Some(dir) = &args.fallback_dir {
        retriever = retriever.with_fallback_dir(dir);
    }

    fs::create_dir_all(&args.work_dir)
        .with_context(|| format!("creating work directory {:?}", args.work_dir))?;
    let assembler = DatasetAssembler::new(&configuration, &retriever, &args.work_dir);
    let mut sink = JsonFileSink::new(&args.output_dir)?;

    let stats = generate_datasets(&assembler, &countries, &static_template, &mut sink).await;

    if stats.errors > 0 {
        return Err(anyhow::anyhow!("{} countries failed ({})", stats.errors, stats));
    }

    info!("IATI scraper complete");
    Ok(())
}
