//! Canonical price matrix: trading days x instruments.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aligned daily prices, one row per trading day (ascending, unique) and one
/// column per instrument. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPriceMatrix {
    dates: Vec<NaiveDate>,
    identifiers: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl CanonicalPriceMatrix {
    /// Build a matrix, checking its shape and date ordering.
    pub fn new(
        dates: Vec<NaiveDate>,
        identifiers: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if dates.len() != rows.len() {
            return Err(Error::Validation(format!(
                "{} dates for {} price rows",
                dates.len(),
                rows.len()
            )));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != identifiers.len()) {
            return Err(Error::Validation(format!(
                "price row has {} cells for {} instruments",
                row.len(),
                identifiers.len()
            )));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Validation(
                "dates must be strictly ascending".to_string(),
            ));
        }

        Ok(Self {
            dates,
            identifiers,
            rows,
        })
    }

    /// Build a matrix from fully observed prices.
    pub fn from_prices(
        dates: Vec<NaiveDate>,
        identifiers: Vec<String>,
        prices: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let rows = prices
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect();
        Self::new(dates, identifiers, rows)
    }

    /// Trading days, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Instrument identifiers in column order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Price rows, one per trading day.
    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    /// Number of trading days.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of instruments.
    pub fn column_count(&self) -> usize {
        self.identifiers.len()
    }

    /// Prices with gaps filled forward, then backward, per column.
    ///
    /// Only for display; a column with no observation at all stays empty.
    pub fn filled(&self) -> Vec<Vec<Option<f64>>> {
        let mut filled = self.rows.clone();

        for col in 0..self.column_count() {
            let mut last = None;
            for row in filled.iter_mut() {
                match row[col] {
                    Some(price) => last = Some(price),
                    None => row[col] = last,
                }
            }

            let mut next = None;
            for row in filled.iter_mut().rev() {
                match row[col] {
                    Some(price) => next = Some(price),
                    None => row[col] = next,
                }
            }
        }

        filled
    }
}
