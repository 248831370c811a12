//! Per-country dataset assembly: fetch both tables, derive the date range and attach
//! a resource for every non-empty table

use crate::iati::config::Configuration;
use crate::iati::dates;
use crate::iati::fetch::{fetch_table_text, TextRetriever};
use crate::iati::parse;
use crate::iati::publish::{Dataset, ResourceData};
use crate::iati::types::{Country, SkipReason, Table, TableKind};
use crate::iati::utils::substitute_country;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of assembling one country
#[derive(Debug)]
pub enum AssembleOutcome {
    Found(Dataset),
    Skipped(SkipReason),
}

/// Dataset slug for a country
pub fn dataset_name(country: &Country) -> String {
    format!("iati-{}", country.iso3.to_lowercase())
}

/// CSV filename for a resource; non-ASCII letters are transliterated
pub fn resource_filename(resource_name: &str) -> String {
    format!("{}.csv", slug::slugify(resource_name))
}

pub struct DatasetAssembler<'a> {
    config: &'a Configuration,
    retriever: &'a dyn TextRetriever,
    folder: PathBuf,
}

impl<'a> DatasetAssembler<'a> {
    pub fn new(config: &'a Configuration, retriever: &'a dyn TextRetriever, folder: &Path) -> Self {
        Self {
            config,
            retriever,
            folder: folder.to_path_buf(),
        }
    }

    /// Fetch and parse one table; an empty result is logged, not an error
    pub async fn fetch_table(&self, kind: TableKind, country: &Country) -> Result<Table> {
        let text = fetch_table_text(self.retriever, &self.config.base_url, kind, &country.iso2)
            .await
            .with_context(|| format!("fetching {} for {}", kind, country.iso2))?;
        let table = parse::load(&text);
        if table.is_empty() {
            warn!("No {} data for {}", kind, country);
        } else {
            info!("Fetched {} {} rows for {}", table.len(), kind, country.iso2);
        }
        Ok(table)
    }

    fn resource_data(&self, kind: TableKind, country_name: &str) -> ResourceData {
        match kind {
            TableKind::Activities => ResourceData {
                name: substitute_country(&self.config.title_activities, country_name),
                description: substitute_country(&self.config.description_activities, country_name),
                format: Some("CSV".to_string()),
            },
            TableKind::Locations => ResourceData {
                name: substitute_country(&self.config.title_locations, country_name),
                description: substitute_country(&self.config.description_locations, country_name),
                format: None,
            },
        }
    }

    pub async fn assemble(&self, country: &Country) -> Result<AssembleOutcome> {
        let activities = self.fetch_table(TableKind::Activities, country).await?;
        let locations = self.fetch_table(TableKind::Locations, country).await?;

        if activities.is_empty() && locations.is_empty() {
            info!("No IATI data for {}", country);
            return Ok(AssembleOutcome::Skipped(SkipReason::NoData));
        }

        let present: Vec<&Table> = [&activities, &locations]
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect();
        let range = dates::derive(&present);

        let title = substitute_country(&self.config.title, &country.name);
        info!("Creating dataset: {}", title);
        let mut dataset = Dataset::new(dataset_name(country), title);
        dataset.add_country_location(country);
        dataset.add_tags(self.config.tags.as_slice());
        match (range.min_date, range.max_date) {
            (Some(start), Some(end)) => dataset.set_time_period(start, end)?,
            _ => warn!("No usable start dates for {}, time period left unset", country.iso2),
        }

        for (kind, table) in [
            (TableKind::Activities, &activities),
            (TableKind::Locations, &locations),
        ] {
            if table.is_empty() {
                continue;
            }
            let resource_data = self.resource_data(kind, &country.name);
            let filename = resource_filename(&resource_data.name);
            dataset.generate_resource_from_rows(
                &table.header,
                &table.rows,
                &self.config.hxl_tags,
                &self.folder,
                &filename,
                resource_data,
                None,
            )?;
        }

        Ok(AssembleOutcome::Found(dataset))
    }
}
