//! Market-data sources feeding the normalizer.

use super::raw::{parse_index_date, RawTable};
use crate::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

/// Upstream provider of raw daily price tables.
///
/// Implementations return `Ok(None)` when they have nothing for the request.
/// The pipeline reports that and any error other than `Schema` as missing data.
pub trait PriceSource {
    /// Fetch daily prices for `identifiers` between `start` (inclusive) and `end` (exclusive).
    fn fetch(
        &self,
        identifiers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<RawTable>>;
}

/// Reads a raw table serialized as JSON from disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for JsonFileSource {
    fn fetch(
        &self,
        identifiers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<RawTable>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let mut table: RawTable = serde_json::from_str(&content)?;
        table.check_shape()?;

        // Labels that are not dates are kept so the normalizer reports them
        table.retain_rows(|label| match parse_index_date(label) {
            Some(date) => date >= start && date < end,
            None => true,
        });

        tracing::debug!(
            path = %self.path.display(),
            rows = table.row_count(),
            instruments = identifiers.len(),
            "Loaded raw price table"
        );
        Ok(Some(table))
    }
}

/// In-memory source returning a fixed table regardless of the request.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    table: Option<RawTable>,
}

impl StaticSource {
    /// Source that always returns `table`.
    pub fn new(table: RawTable) -> Self {
        Self { table: Some(table) }
    }

    /// Source that never has data.
    pub fn empty() -> Self {
        Self { table: None }
    }
}

impl PriceSource for StaticSource {
    fn fetch(
        &self,
        _identifiers: &[String],
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Option<RawTable>> {
        Ok(self.table.clone())
    }
}
