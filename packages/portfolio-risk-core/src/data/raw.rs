//! Raw tabular price data as handed over by a market-data source.
//!
//! The shape is loose: a source may return one flat column per
//! field (single instrument) or two-level `(field, instrument)` /
//! `(instrument, field)` column keys (several instruments).

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column label, either a single name or a two-level pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnKey {
    Flat(String),
    Composite([String; 2]),
}

impl ColumnKey {
    /// Convenience constructor for a two-level key.
    pub fn composite(outer: &str, inner: &str) -> Self {
        ColumnKey::Composite([outer.to_string(), inner.to_string()])
    }
}

/// Cell values of one raw column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column holds numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnValues::Numeric(_))
    }

    /// Read a cell as a number; text cells are parsed, unparseable ones are `None`.
    pub fn number_at(&self, row: usize) -> Option<f64> {
        match self {
            ColumnValues::Numeric(v) => v.get(row).copied().flatten(),
            ColumnValues::Text(v) => v
                .get(row)
                .and_then(|cell| cell.as_deref())
                .and_then(|s| s.trim().parse::<f64>().ok()),
        }
    }

    fn retain_indices(&mut self, keep: &[bool]) {
        match self {
            ColumnValues::Numeric(v) => retain_by_mask(v, keep),
            ColumnValues::Text(v) => retain_by_mask(v, keep),
        }
    }
}

fn retain_by_mask<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    values.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
}

/// A single labeled column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    pub key: ColumnKey,
    pub values: ColumnValues,
}

impl RawColumn {
    /// Create a flat numeric column.
    pub fn flat(name: &str, values: Vec<Option<f64>>) -> Self {
        Self {
            key: ColumnKey::Flat(name.to_string()),
            values: ColumnValues::Numeric(values),
        }
    }

    /// Create a two-level numeric column.
    pub fn composite(outer: &str, inner: &str, values: Vec<Option<f64>>) -> Self {
        Self {
            key: ColumnKey::composite(outer, inner),
            values: ColumnValues::Numeric(values),
        }
    }
}

/// Which column labeling a table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnScheme {
    Flat,
    Composite,
}

/// Raw price table: row labels (dates as text) and labeled columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Row labels, expected to be dates or timestamps
    pub index: Vec<String>,
    /// Columns, each with one value per row label
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    /// Create a table from row labels and columns.
    pub fn new(index: Vec<String>, columns: Vec<RawColumn>) -> Self {
        Self { index, columns }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// A table with no rows or no columns carries no data.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    /// Check that every column has exactly one value per row label.
    pub fn check_shape(&self) -> Result<()> {
        for column in &self.columns {
            if column.values.len() != self.index.len() {
                return Err(Error::Schema(format!(
                    "column {:?} has {} values for {} rows",
                    column.key,
                    column.values.len(),
                    self.index.len()
                )));
            }
        }
        Ok(())
    }

    /// Determine the column labeling; mixing flat and two-level keys is rejected.
    pub fn scheme(&self) -> Result<ColumnScheme> {
        let composite = self
            .columns
            .iter()
            .filter(|c| matches!(c.key, ColumnKey::Composite(_)))
            .count();

        match composite {
            0 => Ok(ColumnScheme::Flat),
            n if n == self.columns.len() => Ok(ColumnScheme::Composite),
            _ => Err(Error::Schema(
                "table mixes flat and two-level column labels".to_string(),
            )),
        }
    }

    /// Keep only the rows whose label satisfies `keep`.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        let mask: Vec<bool> = self.index.iter().map(|label| keep(label.as_str())).collect();
        retain_by_mask(&mut self.index, &mask);
        for column in &mut self.columns {
            column.values.retain_indices(&mask);
        }
    }
}

/// Parse a row label into a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DD HH:MM:SS`.
pub fn parse_index_date(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    if let Ok(date) = NaiveDate::parse_from_str(label, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(label) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(label, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|ts| ts.date())
}
