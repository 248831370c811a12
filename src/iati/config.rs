//! Project configuration - templates, tags and HXL mapping
//!
//! Loaded once per run from `project_configuration.yaml` and passed by reference into
//! the assembler. Nothing here is mutated after load.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Token replaced by the country name in every template
pub const COUNTRY_PLACEHOLDER: &str = "(country)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration field `{0}` must not be empty")]
    Empty(&'static str),
}

/// Scraper configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub base_url: String,
    pub title: String,
    pub title_activities: String,
    pub description_activities: String,
    pub title_locations: String,
    pub description_locations: String,
    pub tags: Vec<String>,
    /// Column header -> HXL hashtag
    #[serde(default)]
    pub hxl_tags: HashMap<String, String>,
}

impl Configuration {
    pub fn from_yaml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Configuration =
            serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Empty("base_url"));
        }
        if self.title.trim().is_empty() {
            return Err(ConfigError::Empty("title"));
        }
        Ok(())
    }
}

/// Static fields merged into every dataset before creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caveats: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_other: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_update_frequency: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl StaticTemplate {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
