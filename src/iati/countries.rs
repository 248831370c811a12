//! Country reference provider

use crate::iati::types::Country;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of the countries to scrape
pub trait CountryProvider {
    fn countries(&self) -> Result<Vec<Country>>;
}

#[derive(Debug, Deserialize)]
struct CountryRow {
    iso2: Option<String>,
    iso3: Option<String>,
    name: Option<String>,
}

/// Reads `iso2,iso3,name` rows from a CSV file
pub struct CsvCountryProvider {
    path: PathBuf,
}

impl CsvCountryProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CountryProvider for CsvCountryProvider {
    fn countries(&self) -> Result<Vec<Country>> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("opening country list {:?}", self.path))?;
        let countries = parse_countries(reader)?;
        info!("Loaded {} countries from {:?}", countries.len(), self.path);
        Ok(countries)
    }
}

fn parse_countries<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Country>> {
    let mut countries = Vec::new();

    for result in reader.deserialize::<CountryRow>() {
        let row = result?;
        match (row.iso2, row.iso3) {
            (Some(iso2), Some(iso3)) if !iso2.is_empty() && !iso3.is_empty() => {
                let name = row.name.filter(|n| !n.is_empty()).unwrap_or_else(|| iso3.clone());
                countries.push(Country { iso2, iso3, name });
            }
            (iso2, iso3) => {
                debug!("Skipping country row without codes: {:?}/{:?}", iso2, iso3);
            }
        }
    }

    Ok(countries)
}

/// Keep only the countries whose iso2 is listed (case-insensitive); empty filter keeps all
pub fn filter_countries(countries: Vec<Country>, iso2_filter: &[String]) -> Vec<Country> {
    if iso2_filter.is_empty() {
        return countries;
    }
    countries
        .into_iter()
        .filter(|c| iso2_filter.iter().any(|f| f.eq_ignore_ascii_case(&c.iso2)))
        .collect()
}

/// Path of the bundled country list inside a config directory
pub fn default_countries_path(config_dir: &Path) -> PathBuf {
    config_dir.join("countries.csv")
}
