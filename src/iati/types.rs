//! Core data types for the IATI pipeline
//! Pure data structures with no I/O

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Country reference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub iso2: String,
    pub iso3: String,
    pub name: String,
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.iso2, self.iso3)
    }
}

/// The two tables fetched per country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Activities,
    Locations,
}

impl TableKind {
    /// Prefix used for cache filenames
    pub fn prefix(&self) -> &'static str {
        match self {
            TableKind::Activities => "iati-activities",
            TableKind::Locations => "iati-locations",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::Activities => write!(f, "activities"),
            TableKind::Locations => write!(f, "locations"),
        }
    }
}

/// Tabular data: ordered header plus rows aligned to it.
///
/// Every row has exactly `header.len()` cells. A table with zero rows is valid and
/// distinct from a failed fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Iterate over the values of one column, if present
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }
}

/// Overall start/end of the activities in a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

#[cfg(test)]
impl DateRange {
    pub fn is_absent(&self) -> bool {
        self.min_date.is_none() && self.max_date.is_none()
    }

    /// Both bounds as `YYYY-MM-DD`, only when both are known
    pub fn formatted(&self) -> Option<(String, String)> {
        match (self.min_date, self.max_date) {
            (Some(min), Some(max)) => Some((
                min.format("%Y-%m-%d").to_string(),
                max.format("%Y-%m-%d").to_string(),
            )),
            _ => None,
        }
    }
}

/// Why a country produced no dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoData,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no activities or locations returned"),
        }
    }
}

/// Run statistics for the batch
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub created: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "created: {}, skipped: {}, errors: {}",
            self.created, self.skipped, self.errors
        )
    }
}
