//! Dataset and resource model, resource materialization and dataset sinks
//!
//! Resources are written as CSV files carrying a header row, an optional HXL hashtag
//! row aligned to the header, then the data rows. A finalized dataset is handed to a
//! [`DatasetSink`] which persists or uploads it.

use crate::iati::config::StaticTemplate;
use crate::iati::types::Country;
use crate::iati::utils::substitute_country;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("quick charts are not supported for resource {0}")]
    QuickChartsUnsupported(String),

    #[error("row {row} has {actual} cells, header has {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("time period start {start} is after end {end}")]
    InvertedTimePeriod { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
}

/// Chart configuration accepted by the resource generator; never produced here
#[derive(Debug, Clone)]
pub struct QuickCharts {
    pub hashtag: String,
    pub values: Vec<String>,
}

/// Metadata supplied when generating a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceData {
    pub name: String,
    pub description: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub name: String,
    pub description: String,
    pub format: String,
    pub resource_type: String,
    pub url_type: String,
    /// Local path of the materialized CSV
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub name: String,
    pub title: String,
    pub tags: Vec<Tag>,
    pub groups: Vec<Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_date: Option<String>,
    #[serde(flatten)]
    pub static_fields: StaticTemplate,
    pub resources: Vec<Resource>,
    #[serde(skip)]
    location_name: Option<String>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            tags: Vec::new(),
            groups: Vec::new(),
            dataset_date: None,
            static_fields: StaticTemplate::default(),
            resources: Vec::new(),
            location_name: None,
        }
    }

    pub fn add_country_location(&mut self, country: &Country) {
        let group = Group {
            name: country.iso3.to_lowercase(),
        };
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
        self.location_name = Some(country.name.clone());
    }

    /// Add tags, keeping first-seen order and dropping duplicates
    pub fn add_tags<S: AsRef<str>>(&mut self, tags: &[S]) {
        for tag in tags {
            let tag = Tag {
                name: tag.as_ref().to_string(),
            };
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }

    /// Store the inclusive period as `[start 00:00:00 TO end 23:59:59]`
    pub fn set_time_period(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), PublishError> {
        if start > end {
            return Err(PublishError::InvertedTimePeriod { start, end });
        }
        self.dataset_date = Some(format!(
            "[{}T00:00:00 TO {}T23:59:59]",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ));
        Ok(())
    }

    /// Merge static template fields.
    ///
    /// The published notes intentionally differ from the template text: a literal
    /// `(country)` token is replaced by the location name instead of being kept verbatim.
    /// Without a location the notes are copied unchanged.
    pub fn update_from_static(&mut self, template: &StaticTemplate) {
        let mut fields = template.clone();
        if let (Some(notes), Some(country)) = (fields.notes.as_mut(), self.location_name.as_deref()) {
            *notes = substitute_country(notes, country);
        }
        self.static_fields = fields;
    }

    /// Write `rows` to `folder/filename` and attach a resource for it.
    ///
    /// Returns `false` without writing anything when there are no rows.
    pub fn generate_resource_from_rows(
        &mut self,
        headers: &[String],
        rows: &[Vec<String>],
        hxltags: &HashMap<String, String>,
        folder: &Path,
        filename: &str,
        resource_data: ResourceData,
        quickcharts: Option<QuickCharts>,
    ) -> Result<bool> {
        if quickcharts.is_some() {
            return Err(PublishError::QuickChartsUnsupported(resource_data.name).into());
        }
        if rows.is_empty() {
            debug!("No rows for resource {}, not generating", resource_data.name);
            return Ok(false);
        }

        let path = folder.join(filename);
        write_csv(&path, headers, rows, hxltags)
            .with_context(|| format!("writing resource {}", resource_data.name))?;
        info!("Wrote {} rows to {:?}", rows.len(), path);

        self.resources.push(Resource {
            name: resource_data.name,
            description: resource_data.description,
            format: resource_data.format.unwrap_or_else(|| "csv".to_string()).to_lowercase(),
            resource_type: "file.upload".to_string(),
            url_type: "upload".to_string(),
            file: path,
        });
        Ok(true)
    }
}

/// HXL row aligned to `headers`, or `None` when no header is tagged
pub fn hxl_row(headers: &[String], hxltags: &HashMap<String, String>) -> Option<Vec<String>> {
    if !headers.iter().any(|h| hxltags.contains_key(h)) {
        return None;
    }
    Some(
        headers
            .iter()
            .map(|h| hxltags.get(h).cloned().unwrap_or_default())
            .collect(),
    )
}

fn write_csv(
    path: &Path,
    headers: &[String],
    rows: &[Vec<String>],
    hxltags: &HashMap<String, String>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(headers)?;
    if let Some(tags) = hxl_row(headers, hxltags) {
        writer.write_record(&tags)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != headers.len() {
            return Err(PublishError::RowWidth {
                row: idx,
                expected: headers.len(),
                actual: row.len(),
            }
            .into());
        }
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Destination for finalized datasets
pub trait DatasetSink {
    fn create(&mut self, dataset: &Dataset) -> Result<()>;
}

/// Writes each dataset as `{output_dir}/{name}.json`
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating output directory {output_dir:?}"))?;
        Ok(Self { output_dir })
    }
}

impl DatasetSink for JsonFileSink {
    fn create(&mut self, dataset: &Dataset) -> Result<()> {
        let path = self.output_dir.join(format!("{}.json", dataset.name));
        let json = serde_json::to_string_pretty(dataset)?;
        fs::write(&path, json).with_context(|| format!("writing {path:?}"))?;
        info!(
            "Created dataset {} with {} resources at {:?}",
            dataset.name,
            dataset.resources.len(),
            path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn afghanistan() -> Country {
        Country {
            iso2: "AF".to_string(),
            iso3: "AFG".to_string(),
            name: "Afghanistan".to_string(),
        }
    }

    #[test]
    fn test_tags_and_location() {
        let mut dataset = Dataset::new("iati-afg", "Title");
        dataset.add_tags(&["funding", "hxl", "funding"]);
        dataset.add_country_location(&afghanistan());
        dataset.add_country_location(&afghanistan());

        assert_eq!(
            dataset.tags,
            vec![
                Tag { name: "funding".to_string() },
                Tag { name: "hxl".to_string() }
            ]
        );
        assert_eq!(dataset.groups, vec![Group { name: "afg".to_string() }]);
    }

    #[test]
    fn test_time_period() {
        let mut dataset = Dataset::new("iati-afg", "Title");
        dataset
            .set_time_period(
                NaiveDate::from_ymd_opt(1986, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 15).unwrap(),
            )
            .unwrap();
        assert_eq!(
            dataset.dataset_date.as_deref(),
            Some("[1986-01-01T00:00:00 TO 2025-12-15T23:59:59]")
        );

        let inverted = dataset.set_time_period(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert!(matches!(inverted, Err(PublishError::InvertedTimePeriod { .. })));
    }

    #[test]
    fn test_hxl_row() {
        let headers = strings(&["aid", "title", "day_start"]);
        let mut tags = HashMap::new();
        tags.insert("aid".to_string(), "#activity+code".to_string());
        tags.insert("day_start".to_string(), "#date+start".to_string());
        tags.insert("unused".to_string(), "#meta".to_string());

        assert_eq!(
            hxl_row(&headers, &tags),
            Some(strings(&["#activity+code", "", "#date+start"]))
        );
        assert_eq!(hxl_row(&strings(&["other"]), &tags), None);
    }

    #[test]
    fn test_generate_resource_writes_csv() {
        let temp = tempdir().unwrap();
        let mut dataset = Dataset::new("iati-afg", "Title");
        let headers = strings(&["aid", "title"]);
        let rows = vec![strings(&["XM-1", "Water, sanitation"]), strings(&["XM-2", ""])];
        let mut tags = HashMap::new();
        tags.insert("aid".to_string(), "#activity+code".to_string());

        let attached = dataset
            .generate_resource_from_rows(
                &headers,
                &rows,
                &tags,
                temp.path(),
                "activities.csv",
                ResourceData {
                    name: "Activities".to_string(),
                    description: "All activities".to_string(),
                    format: Some("CSV".to_string()),
                },
                None,
            )
            .unwrap();

        assert!(attached);
        let written = fs::read_to_string(temp.path().join("activities.csv")).unwrap();
        assert_eq!(
            written,
            "aid,title\n#activity+code,\nXM-1,\"Water, sanitation\"\nXM-2,\n"
        );
        let resource = &dataset.resources[0];
        assert_eq!(resource.format, "csv");
        assert_eq!(resource.resource_type, "file.upload");
        assert_eq!(resource.url_type, "upload");
    }

    #[test]
    fn test_generate_resource_no_rows() {
        let temp = tempdir().unwrap();
        let mut dataset = Dataset::new("iati-afg", "Title");
        let attached = dataset
            .generate_resource_from_rows(
                &strings(&["aid"]),
                &[],
                &HashMap::new(),
                temp.path(),
                "empty.csv",
                ResourceData {
                    name: "Empty".to_string(),
                    description: String::new(),
                    format: None,
                },
                None,
            )
            .unwrap();

        assert!(!attached);
        assert!(dataset.resources.is_empty());
        assert!(!temp.path().join("empty.csv").exists());
    }

    #[test]
    fn test_quickcharts_rejected() {
        let temp = tempdir().unwrap();
        let mut dataset = Dataset::new("iati-afg", "Title");
        let result = dataset.generate_resource_from_rows(
            &strings(&["aid"]),
            &[strings(&["XM-1"])],
            &HashMap::new(),
            temp.path(),
            "a.csv",
            ResourceData {
                name: "A".to_string(),
                description: String::new(),
                format: None,
            },
            Some(QuickCharts {
                hashtag: "#activity+code".to_string(),
                values: vec![],
            }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_update_from_static_substitutes_notes() {
        let mut dataset = Dataset::new("iati-afg", "Title");
        dataset.add_country_location(&afghanistan());
        dataset.update_from_static(&StaticTemplate {
            license_id: Some("hdx-other".to_string()),
            notes: Some("List of active aid activities for (country)".to_string()),
            ..Default::default()
        });

        assert_eq!(dataset.static_fields.license_id.as_deref(), Some("hdx-other"));
        assert_eq!(
            dataset.static_fields.notes.as_deref(),
            Some("List of active aid activities for Afghanistan")
        );
    }

    #[test]
    fn test_update_from_static_without_location_keeps_token() {
        let mut dataset = Dataset::new("iati-afg", "Title");
        dataset.update_from_static(&StaticTemplate {
            notes: Some("List of active aid activities for (country)".to_string()),
            ..Default::default()
        });

        assert_eq!(
            dataset.static_fields.notes.as_deref(),
            Some("List of active aid activities for (country)")
        );
    }

    #[test]
    fn test_json_sink() {
        let temp = tempdir().unwrap();
        let mut sink = JsonFileSink::new(temp.path().join("out")).unwrap();
        let mut dataset = Dataset::new("iati-afg", "Current IATI Aid Activities in Afghanistan");
        dataset.add_tags(&["hxl"]);
        sink.create(&dataset).unwrap();

        let text = fs::read_to_string(temp.path().join("out").join("iati-afg.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["name"], "iati-afg");
        assert_eq!(json["tags"][0]["name"], "hxl");
        assert!(json.get("dataset_date").is_none());
        assert!(json.get("caveats").is_none());
    }
}
