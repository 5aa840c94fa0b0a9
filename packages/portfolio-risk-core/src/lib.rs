//! Portfolio Risk Core - price normalization and portfolio risk analytics.
//!
//! This crate turns historical daily prices into portfolio risk figures:
//!
//! - **Price normalization**: Resolve an ambiguous raw price table into a canonical price matrix
//! - **Daily returns**: Simple percentage returns, one row per trading day
//! - **Portfolio statistics**: Annualized mean/volatility, covariance and correlation
//! - **Risk metrics**: Historical VaR, parametric VaR, Sharpe ratio
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use portfolio_risk_core::{analyze, AnalysisConfig, AnalysisRequest, JsonFileSource};
//!
//! let source = JsonFileSource::new("prices.json");
//! let request = AnalysisRequest::new(
//!     vec!["AAPL".to_string(), "MSFT".to_string()],
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
//! );
//!
//! let report = analyze(&source, &request, &AnalysisConfig::default()).unwrap();
//! println!("Annualized volatility: {:.4}", report.std_annual);
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use config::AnalysisConfig;
pub use types::{
    AnalysisReport, AnalysisRequest, ApiResponse, LabeledMatrix, PortfolioStatistics, PriceView,
    RiskReport,
};

// Re-export main functionality
pub use analysis::{
    daily_returns, historical_var, norm_ppf, parametric_var, portfolio_stats, resolve_weights,
    sharpe_ratio, ReturnMatrix,
};
pub use data::{
    normalize, CanonicalPriceMatrix, ColumnKey, ColumnValues, JsonFileSource, PriceSource,
    RawColumn, RawTable, StaticSource,
};
pub use pipeline::{analyze, load_prices, normalize_identifiers, price_view};

/// Error types for portfolio-risk-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for portfolio-risk-core operations.
pub type Result<T> = std::result::Result<T, Error>;
