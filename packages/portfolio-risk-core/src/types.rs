//! Core data types for the portfolio risk pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Square matrix labeled by instrument identifier on both axes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabeledMatrix<T> {
    /// Instrument identifiers, in column order
    pub labels: Vec<String>,
    /// Row-major values, `values[row][col]`
    pub values: Vec<Vec<T>>,
}

impl<T: Clone> LabeledMatrix<T> {
    /// Look up a cell by instrument identifiers.
    pub fn get(&self, row: &str, col: &str) -> Option<T> {
        let i = self.labels.iter().position(|l| l == row)?;
        let j = self.labels.iter().position(|l| l == col)?;
        Some(self.values[i][j].clone())
    }

    /// Convert to a nested map keyed `[col][row]`, mapping each cell through `f`.
    pub fn to_nested_map<U, F>(&self, f: F) -> BTreeMap<String, BTreeMap<String, U>>
    where
        F: Fn(&T) -> U,
    {
        self.labels
            .iter()
            .enumerate()
            .map(|(j, col)| {
                let column = self
                    .labels
                    .iter()
                    .enumerate()
                    .map(|(i, row)| (row.clone(), f(&self.values[i][j])))
                    .collect();
                (col.clone(), column)
            })
            .collect()
    }
}

/// Portfolio return statistics derived from a daily return matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioStatistics {
    /// Annualized portfolio mean return
    pub mean_annual: f64,
    /// Annualized portfolio standard deviation
    pub std_annual: f64,
    /// Daily mean return per instrument, in column order
    pub mean_daily: Vec<f64>,
    /// Daily sample covariance matrix
    pub cov_daily: LabeledMatrix<f64>,
    /// Daily correlation matrix (`None` where an instrument has zero variance)
    pub corr: LabeledMatrix<Option<f64>>,
    /// Annualization factor used for the figures above
    pub trading_days_per_year: u32,
}

impl PortfolioStatistics {
    /// Annualized mean return of each instrument.
    pub fn instrument_annual_means(&self) -> Vec<f64> {
        let days = f64::from(self.trading_days_per_year);
        self.mean_daily.iter().map(|m| m * days).collect()
    }
}

/// Risk figures for one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// Historical VaR (positive = loss)
    pub historical_var: f64,
    /// Parametric (normal) VaR (positive = loss)
    pub parametric_var: f64,
    /// Sharpe ratio, absent when volatility is zero
    pub sharpe: Option<f64>,
    /// Confidence level used for both VaR figures
    pub confidence: f64,
    /// Horizon in trading days used for both VaR figures
    pub horizon_days: u32,
}

/// A request to analyze a set of instruments over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Instrument identifiers (trimmed and upper-cased before use)
    pub tickers: Vec<String>,
    /// Portfolio weights aligned with the price columns; equal weight if absent
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    /// First day of the range (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the range (exclusive)
    pub end_date: NaiveDate,
    /// VaR confidence level; configured default if absent
    #[serde(default)]
    pub confidence: Option<f64>,
    /// VaR horizon in trading days; configured default if absent
    #[serde(default)]
    pub horizon_days: Option<u32>,
    /// Annual risk-free rate for the Sharpe ratio; configured default if absent
    #[serde(default)]
    pub risk_free_rate: Option<f64>,
}

impl AnalysisRequest {
    /// Create a request with equal weights and configured defaults.
    pub fn new(tickers: Vec<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            tickers,
            weights: None,
            start_date,
            end_date,
            confidence: None,
            horizon_days: None,
            risk_free_rate: None,
        }
    }

    /// Set explicit portfolio weights.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Override the VaR confidence level.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Override the VaR horizon.
    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = Some(horizon_days);
        self
    }

    /// Override the risk-free rate.
    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = Some(risk_free_rate);
        self
    }
}

/// Presentation-ready analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Annualized portfolio mean return
    pub mean_annual: f64,
    /// Annualized portfolio volatility
    pub std_annual: f64,
    /// Historical VaR over the requested horizon
    pub historical_var: f64,
    /// Parametric VaR over the requested horizon
    pub parametric_var: f64,
    /// Sharpe ratio (null when volatility is zero)
    pub sharpe: Option<f64>,
    /// Daily covariance, `cov[col][row]`, rounded
    pub cov: BTreeMap<String, BTreeMap<String, f64>>,
    /// Daily correlation, `corr[col][row]`, rounded
    pub corr: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

/// Canonical prices for display, gaps filled forward then backward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceView {
    /// Trading days (YYYY-MM-DD), ascending
    pub dates: Vec<String>,
    /// Instrument identifiers, in column order
    pub tickers: Vec<String>,
    /// Price matrix: dates x tickers
    pub prices: Vec<Vec<Option<f64>>>,
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
