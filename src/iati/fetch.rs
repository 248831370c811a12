//! Fetch functions - retrieve raw CSV text from d-portal, with local save/replay

use crate::iati::query::{build_url, cache_filename};
use crate::iati::types::TableKind;
use crate::iati::utils::{http_client, http_get_text};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("`save` and `use_saved` cannot both be set")]
    ConflictingModes,

    #[error("no saved copy of {filename} in {dir:?}")]
    MissingSaved { dir: PathBuf, filename: String },
}

/// Text download port: a URL plus the filename it is cached under
#[async_trait]
pub trait TextRetriever: Send + Sync {
    async fn download_text(&self, url: &str, filename: &str) -> Result<String>;
}

/// How the retriever treats the saved-data directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Network only
    #[default]
    Off,
    /// Network, and persist every body into the saved directory
    Save,
    /// Replay from the saved directory, no network
    UseSaved,
}

impl SaveMode {
    pub fn from_flags(save: bool, use_saved: bool) -> Result<Self, RetrieveError> {
        match (save, use_saved) {
            (true, true) => Err(RetrieveError::ConflictingModes),
            (true, false) => Ok(SaveMode::Save),
            (false, true) => Ok(SaveMode::UseSaved),
            (false, false) => Ok(SaveMode::Off),
        }
    }
}

/// reqwest-backed retriever
pub struct Retriever {
    client: Client,
    saved_dir: PathBuf,
    fallback_dir: Option<PathBuf>,
    mode: SaveMode,
}

impl Retriever {
    pub fn new(saved_dir: impl Into<PathBuf>, mode: SaveMode) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            saved_dir: saved_dir.into(),
            fallback_dir: None,
            mode,
        })
    }

    /// Directory consulted when a download fails
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = Some(dir.into());
        self
    }

    fn read_saved(&self, filename: &str) -> Result<String> {
        let path = self.saved_dir.join(filename);
        if !path.exists() {
            return Err(RetrieveError::MissingSaved {
                dir: self.saved_dir.clone(),
                filename: filename.to_string(),
            }
            .into());
        }
        info!("Using saved {:?}", path);
        let text = fs::read_to_string(&path).with_context(|| format!("reading {path:?}"))?;
        Ok(text)
    }

    fn write_saved(&self, filename: &str, text: &str) -> Result<()> {
        fs::create_dir_all(&self.saved_dir)?;
        let path = self.saved_dir.join(filename);
        fs::write(&path, text).with_context(|| format!("writing {path:?}"))?;
        info!("Saved to {:?}", path);
        Ok(())
    }

    fn read_fallback(&self, filename: &str) -> Option<String> {
        let path = self.fallback_dir.as_deref()?.join(filename);
        fs::read_to_string(path).ok()
    }
}

#[async_trait]
impl TextRetriever for Retriever {
    async fn download_text(&self, url: &str, filename: &str) -> Result<String> {
        if self.mode == SaveMode::UseSaved {
            return self.read_saved(filename);
        }

        match http_get_text(&self.client, url).await {
            Ok(text) => {
                if self.mode == SaveMode::Save {
                    self.write_saved(filename, &text)?;
                }
                Ok(text)
            }
            Err(e) => match self.read_fallback(filename) {
                Some(text) => {
                    warn!("Download of {} failed ({}), using fallback copy", filename, e);
                    Ok(text)
                }
                None => Err(e.context(format!("downloading {filename}"))),
            },
        }
    }
}

/// Fetch the raw CSV text of one table for one country
pub async fn fetch_table_text(
    retriever: &dyn TextRetriever,
    base_url: &str,
    kind: TableKind,
    iso2: &str,
) -> Result<String> {
    let url = build_url(base_url, kind, iso2)?;
    let filename = cache_filename(kind, iso2);
    info!("Fetching {} for {}", kind, iso2);
    retriever.download_text(url.as_str(), &filename).await
}
