//! Analysis defaults and their TOML configuration file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Standard annualization factor for daily returns.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;
/// Default VaR confidence level.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;
/// Default annual risk-free rate for the Sharpe ratio.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;
/// Default VaR horizon in trading days.
pub const DEFAULT_HORIZON_DAYS: u32 = 1;
/// Most decimal places a reported matrix may be rounded to.
pub const MAX_REPORT_DECIMALS: u32 = 15;

/// Named defaults for an analysis, each overridable per request.
///
/// Loaded from `config.toml`; every key is optional:
///
/// ```toml
/// trading_days_per_year = 252
/// confidence = 0.99
/// risk_free_rate = 0.045
/// horizon_days = 10
/// covariance_decimals = 8
/// correlation_decimals = 4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Annualization factor applied to daily mean and variance
    pub trading_days_per_year: u32,
    /// VaR confidence level, strictly between 0 and 1
    pub confidence: f64,
    /// Annual risk-free rate
    pub risk_free_rate: f64,
    /// VaR horizon in trading days
    pub horizon_days: u32,
    /// Decimal places kept in the reported covariance matrix
    pub covariance_decimals: u32,
    /// Decimal places kept in the reported correlation matrix
    pub correlation_decimals: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            confidence: DEFAULT_CONFIDENCE,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            horizon_days: DEFAULT_HORIZON_DAYS,
            covariance_decimals: 8,
            correlation_decimals: 4,
        }
    }
}

impl AnalysisConfig {
    /// Load the configuration from the default path.
    ///
    /// Falls back to the built-in defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Get the default configuration file path.
    ///
    /// Default path: `<config dir>/portfolio-risk/config.toml`
    /// Can be overridden with `PORTFOLIO_RISK_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("PORTFOLIO_RISK_CONFIG") {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("", "", "portfolio-risk")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("portfolio-risk.toml"))
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check that every value is usable by the analysis formulas.
    pub fn validate(&self) -> Result<()> {
        if self.trading_days_per_year == 0 {
            return Err(Error::Validation(
                "trading_days_per_year must be positive".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(Error::Validation(format!(
                "confidence must be strictly between 0 and 1, got {}",
                self.confidence
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(Error::Validation(
                "risk_free_rate must be a finite number".to_string(),
            ));
        }
        if self.horizon_days == 0 {
            return Err(Error::Validation(
                "horizon_days must be at least 1".to_string(),
            ));
        }
        for (name, decimals) in [
            ("covariance_decimals", self.covariance_decimals),
            ("correlation_decimals", self.correlation_decimals),
        ] {
            if decimals > MAX_REPORT_DECIMALS {
                return Err(Error::Validation(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_REPORT_DECIMALS, decimals
                )));
            }
        }
        Ok(())
    }
}
