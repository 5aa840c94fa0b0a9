//! Daily simple returns from a canonical price matrix.

use crate::data::CanonicalPriceMatrix;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily simple returns, one row per trading day with a complete set of returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    identifiers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    /// Build a return matrix from explicit rows.
    pub fn new(dates: Vec<NaiveDate>, identifiers: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if dates.len() != rows.len() {
            return Err(Error::Validation(format!(
                "{} dates for {} return rows",
                dates.len(),
                rows.len()
            )));
        }
        if rows.iter().any(|r| r.len() != identifiers.len()) {
            return Err(Error::Validation(format!(
                "every return row must have {} cells",
                identifiers.len()
            )));
        }
        Ok(Self {
            dates,
            identifiers,
            rows,
        })
    }

    /// Day each return row ends on.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Instrument identifiers in column order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Return rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of return days.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of instruments.
    pub fn column_count(&self) -> usize {
        self.identifiers.len()
    }

    /// Return series of one instrument.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[col]).collect()
    }

    /// Daily portfolio return series: each row dotted with `weights`.
    pub fn portfolio_returns(&self, weights: &[f64]) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.iter().zip(weights).map(|(r, w)| r * w).sum())
            .collect()
    }
}

/// Calculate daily simple returns (`price[t] / price[t-1] - 1`).
///
/// The first day has no prior price and is dropped; any later day where some
/// instrument lacks a price on that day or the day before is dropped as well.
pub fn daily_returns(prices: &CanonicalPriceMatrix) -> ReturnMatrix {
    let mut dates = Vec::with_capacity(prices.row_count().saturating_sub(1));
    let mut rows = Vec::with_capacity(prices.row_count().saturating_sub(1));

    for (t, pair) in prices.rows().windows(2).enumerate() {
        let row: Option<Vec<f64>> = pair[0]
            .iter()
            .zip(&pair[1])
            .map(|(prev, curr)| match (prev, curr) {
                (Some(p), Some(c)) => Some(c / p - 1.0).filter(|r| r.is_finite()),
                _ => None,
            })
            .collect();

        if let Some(row) = row {
            dates.push(prices.dates()[t + 1]);
            rows.push(row);
        }
    }

    let dropped = prices.row_count().saturating_sub(1) - rows.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Dropped days without a complete set of returns");
    }

    ReturnMatrix {
        dates,
        identifiers: prices.identifiers().to_vec(),
        rows,
    }
}
