//! Return and risk analytics module.
//!
//! Provides daily returns, weight validation, portfolio statistics and risk metrics.

mod returns;
mod risk;
mod stats;
mod weights;

pub use returns::{daily_returns, ReturnMatrix};
pub use risk::{
    historical_var, norm_ppf, parametric_var, quantile, risk_report, sharpe_ratio,
};
pub use stats::portfolio_stats;
pub use weights::resolve_weights;
