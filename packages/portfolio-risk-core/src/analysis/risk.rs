//! Portfolio risk metrics calculation.
//!
//! Provides historical VaR, parametric VaR and the Sharpe ratio.
//!
//! Multi-day VaR uses square-root-of-time scaling of the one-day figure, which
//! assumes i.i.d. daily returns and is only an approximation for horizons
//! beyond one day.

use super::returns::ReturnMatrix;
use super::stats::{mean, sample_std};
use crate::types::RiskReport;

/// Empirical quantile with linear interpolation between order statistics.
///
/// Returns NaN for an empty series.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Calculate Value at Risk (VaR) from the empirical return distribution.
///
/// # Arguments
///
/// * `returns` - Daily instrument returns
/// * `weights` - Portfolio weights aligned with the return columns
/// * `confidence` - Confidence level, strictly between 0 and 1 (e.g., 0.95)
/// * `horizon_days` - Horizon in trading days, at least 1
///
/// # Returns
///
/// Loss magnitude as a fraction of portfolio value (positive = loss).
pub fn historical_var(
    returns: &ReturnMatrix,
    weights: &[f64],
    confidence: f64,
    horizon_days: u32,
) -> f64 {
    let port = returns.portfolio_returns(weights);
    let var_1day = -quantile(&port, 1.0 - confidence);
    var_1day * f64::from(horizon_days).sqrt()
}

/// Calculate Value at Risk (VaR) assuming normally distributed returns.
///
/// One-day VaR is `-(mu + z * sigma)` with `z = norm_ppf(1 - confidence)` and
/// `sigma` the sample standard deviation of the portfolio return series.
/// Same arguments and sign convention as [`historical_var`].
pub fn parametric_var(
    returns: &ReturnMatrix,
    weights: &[f64],
    confidence: f64,
    horizon_days: u32,
) -> f64 {
    let port = returns.portfolio_returns(weights);
    let mu = mean(&port);
    let sigma = sample_std(&port);
    let z = norm_ppf(1.0 - confidence);

    let var_1day = -(mu + z * sigma);
    var_1day * f64::from(horizon_days).sqrt()
}

/// Calculate the Sharpe ratio from annualized figures.
///
/// Returns `None` when `annual_std` is exactly zero: the ratio is not
/// computable rather than infinite.
pub fn sharpe_ratio(annual_return: f64, annual_std: f64, risk_free_rate: f64) -> Option<f64> {
    if annual_std == 0.0 {
        return None;
    }
    Some((annual_return - risk_free_rate) / annual_std)
}

/// Compute both VaR figures and the Sharpe ratio for one portfolio.
pub fn risk_report(
    returns: &ReturnMatrix,
    weights: &[f64],
    confidence: f64,
    horizon_days: u32,
    annual_return: f64,
    annual_std: f64,
    risk_free_rate: f64,
) -> RiskReport {
    RiskReport {
        historical_var: historical_var(returns, weights, confidence, horizon_days),
        parametric_var: parametric_var(returns, weights, confidence, horizon_days),
        sharpe: sharpe_ratio(annual_return, annual_std, risk_free_rate),
        confidence,
        horizon_days,
    }
}

/// Inverse cumulative distribution function for standard normal distribution.
///
/// Uses Acklam's algorithm for high accuracy across the full range.
/// Source: https://web.archive.org/web/20151110174102/http://home.online.no/~pjacklam/notes/invnorm/
pub fn norm_ppf(p: f64) -> f64 {
    // Coefficients in rational approximations
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];

    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];

    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];

    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
