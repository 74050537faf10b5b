//! Local fund reference table loaded from CSV.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// One row of the catalog. All codes are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FundEntry {
    pub isin: String,
    pub scheme_name: String,
    pub scheme_code: String,
    /// Research provider identifier, e.g. `F00000PDC9`.
    #[serde(rename = "ID")]
    pub fund_id: String,
}

impl FundEntry {
    fn matches(&self, needle: &str) -> bool {
        [
            &self.isin,
            &self.scheme_name,
            &self.scheme_code,
            &self.fund_id,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FundCatalog {
    entries: Vec<FundEntry>,
}

impl FundCatalog {
    pub fn new(entries: Vec<FundEntry>) -> Self {
        Self { entries }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open fund catalog: {}", path.display()))?;
        Self::from_reader(reader)
            .with_context(|| format!("Failed to read fund catalog: {}", path.display()))
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let entries = reader
            .deserialize()
            .collect::<Result<Vec<FundEntry>, csv::Error>>()?;
        debug!("Loaded {} catalog entries", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring search over ISIN, name, scheme code and ID.
    ///
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&FundEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries.iter().filter(|e| e.matches(&needle)).collect()
    }
}
