//! End-to-end analysis: source -> canonical prices -> returns -> statistics and risk.

use crate::analysis::{daily_returns, portfolio_stats, resolve_weights, risk_report};
use crate::config::AnalysisConfig;
use crate::data::{normalize, CanonicalPriceMatrix, PriceSource};
use crate::types::{AnalysisReport, AnalysisRequest, PriceView};
use crate::{Error, Result};
use std::collections::HashSet;

/// Trim and upper-case requested identifiers.
///
/// Rejects an empty list, blank entries and duplicates.
pub fn normalize_identifiers(tickers: &[String]) -> Result<Vec<String>> {
    if tickers.is_empty() {
        return Err(Error::Validation(
            "at least one instrument identifier is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    tickers
        .iter()
        .map(|t| {
            let id = t.trim().to_uppercase();
            if id.is_empty() {
                return Err(Error::Validation(
                    "instrument identifiers must not be blank".to_string(),
                ));
            }
            if !seen.insert(id.clone()) {
                return Err(Error::Validation(format!(
                    "instrument identifier {} requested twice",
                    id
                )));
            }
            Ok(id)
        })
        .collect()
}

/// Fetch and normalize the canonical price matrix for a request.
pub fn load_prices(source: &dyn PriceSource, request: &AnalysisRequest) -> Result<CanonicalPriceMatrix> {
    let identifiers = normalize_identifiers(&request.tickers)?;
    if request.start_date >= request.end_date {
        return Err(Error::Validation(format!(
            "start date {} must be before end date {}",
            request.start_date, request.end_date
        )));
    }

    // A malformed table stays a schema error; any other failure means no data
    let raw = source
        .fetch(&identifiers, request.start_date, request.end_date)
        .map_err(|e| match e {
            Error::Schema(_) => e,
            e => Error::NoData(format!("price source failed: {}", e)),
        })?;

    let prices = normalize(raw.as_ref(), &identifiers)?;
    tracing::debug!(
        days = prices.row_count(),
        instruments = prices.column_count(),
        "Normalized price matrix"
    );
    Ok(prices)
}

/// Canonical prices for display, gaps filled forward then backward.
///
/// The filling here never feeds the return or risk figures.
pub fn price_view(source: &dyn PriceSource, request: &AnalysisRequest) -> Result<PriceView> {
    let prices = load_prices(source, request)?;

    Ok(PriceView {
        dates: prices
            .dates()
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect(),
        tickers: prices.identifiers().to_vec(),
        prices: prices.filled(),
    })
}

/// Run the full analysis for a request.
///
/// Request overrides (confidence, horizon, risk-free rate) take precedence
/// over `config`.
///
/// # Errors
///
/// * `Validation` - bad identifiers, dates, weights, confidence, horizon or config
/// * `NoData` / `Schema` / `EmptyResult` - from loading and normalizing prices,
///   or fewer than two usable daily returns
pub fn analyze(
    source: &dyn PriceSource,
    request: &AnalysisRequest,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate()?;
    let confidence = request.confidence.unwrap_or(config.confidence);
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(Error::Validation(format!(
            "confidence must be strictly between 0 and 1, got {}",
            confidence
        )));
    }
    let horizon_days = request.horizon_days.unwrap_or(config.horizon_days);
    if horizon_days == 0 {
        return Err(Error::Validation(
            "horizon must be at least one day".to_string(),
        ));
    }
    let risk_free_rate = request.risk_free_rate.unwrap_or(config.risk_free_rate);
    if !risk_free_rate.is_finite() {
        return Err(Error::Validation(
            "risk-free rate must be a finite number".to_string(),
        ));
    }

    let prices = load_prices(source, request)?;
    let returns = daily_returns(&prices);
    if returns.row_count() < 2 {
        return Err(Error::EmptyResult(format!(
            "need at least two daily returns, got {}",
            returns.row_count()
        )));
    }

    let weights = resolve_weights(request.weights.as_deref(), prices.column_count())?;

    let stats = portfolio_stats(&returns, &weights, config.trading_days_per_year);
    let risk = risk_report(
        &returns,
        &weights,
        confidence,
        horizon_days,
        stats.mean_annual,
        stats.std_annual,
        risk_free_rate,
    );

    tracing::info!(
        instruments = prices.column_count(),
        days = returns.row_count(),
        mean_annual = stats.mean_annual,
        std_annual = stats.std_annual,
        historical_var = risk.historical_var,
        "Portfolio analysis complete"
    );

    let cov_decimals = config.covariance_decimals;
    let corr_decimals = config.correlation_decimals;
    Ok(AnalysisReport {
        mean_annual: stats.mean_annual,
        std_annual: stats.std_annual,
        historical_var: risk.historical_var,
        parametric_var: risk.parametric_var,
        sharpe: risk.sharpe,
        cov: stats.cov_daily.to_nested_map(|v| round_to(*v, cov_decimals)),
        corr: stats
            .corr
            .to_nested_map(|v| v.map(|c| round_to(c, corr_decimals))),
    })
}

/// Round half away from zero to `decimals` places.
///
/// Exact ties are rare at the configured precision, so this differs from
/// round-half-to-even only in the last reported digit, if at all.
fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
