//! Portfolio mean, volatility, covariance and correlation.

use super::returns::ReturnMatrix;
use crate::types::{LabeledMatrix, PortfolioStatistics};

/// Arithmetic mean; NaN for an empty series.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator); NaN for fewer than two values.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() as f64 - 1.0)).sqrt()
}

/// Sample covariance matrix (N-1 denominator) of the return columns.
fn covariance(columns: &[Vec<f64>], means: &[f64]) -> Vec<Vec<f64>> {
    let k = columns.len();
    let n = columns.first().map_or(0, Vec::len) as f64;
    let mut cov = vec![vec![0.0; k]; k];

    for i in 0..k {
        for j in i..k {
            let s: f64 = columns[i]
                .iter()
                .zip(&columns[j])
                .map(|(a, b)| (a - means[i]) * (b - means[j]))
                .sum();
            let c = s / (n - 1.0);
            cov[i][j] = c;
            cov[j][i] = c;
        }
    }

    cov
}

/// Correlation from covariance; `None` where either variance is zero.
fn correlation(cov: &[Vec<f64>]) -> Vec<Vec<Option<f64>>> {
    let std: Vec<f64> = (0..cov.len()).map(|i| cov[i][i].sqrt()).collect();

    (0..cov.len())
        .map(|i| {
            (0..cov.len())
                .map(|j| {
                    if std[i] > 0.0 && std[j] > 0.0 {
                        if i == j {
                            Some(1.0)
                        } else {
                            Some((cov[i][j] / (std[i] * std[j])).clamp(-1.0, 1.0))
                        }
                    } else {
                        None
                    }
                })
                .collect()
        })
        .collect()
}

/// Calculate portfolio statistics from daily returns.
///
/// # Arguments
///
/// * `returns` - Daily return matrix (at least two rows for a defined covariance)
/// * `weights` - Weights aligned with the return columns, already summing to one
/// * `trading_days_per_year` - Annualization factor (typically 252)
///
/// # Returns
///
/// Annualized mean is `(w . mean_daily) * days`, annualized volatility is
/// `sqrt((w' . cov_daily . w) * days)`.
pub fn portfolio_stats(
    returns: &ReturnMatrix,
    weights: &[f64],
    trading_days_per_year: u32,
) -> PortfolioStatistics {
    let days = f64::from(trading_days_per_year);
    let columns: Vec<Vec<f64>> = (0..returns.column_count())
        .map(|j| returns.column(j))
        .collect();

    let mean_daily: Vec<f64> = columns.iter().map(|c| mean(c)).collect();
    let cov = covariance(&columns, &mean_daily);
    let corr = correlation(&cov);

    let mean_annual = weights
        .iter()
        .zip(&mean_daily)
        .map(|(w, m)| w * m)
        .sum::<f64>()
        * days;

    let var_daily: f64 = weights
        .iter()
        .enumerate()
        .map(|(i, wi)| {
            weights
                .iter()
                .enumerate()
                .map(|(j, wj)| wi * cov[i][j] * wj)
                .sum::<f64>()
        })
        .sum();
    // Rounding can leave a tiny negative variance for degenerate portfolios
    let std_annual = (var_daily.max(0.0) * days).sqrt();

    let labels = returns.identifiers().to_vec();
    PortfolioStatistics {
        mean_annual,
        std_annual,
        mean_daily,
        cov_daily: LabeledMatrix {
            labels: labels.clone(),
            values: cov,
        },
        corr: LabeledMatrix {
            labels,
            values: corr,
        },
        trading_days_per_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;

    fn returns(rows: Vec<Vec<f64>>, ids: &[&str]) -> ReturnMatrix {
        let dates = (0..rows.len())
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Days::new(d as u64))
            .collect();
        ReturnMatrix::new(dates, ids.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    fn sample() -> ReturnMatrix {
        returns(
            vec![
                vec![0.01, 0.02, -0.01],
                vec![-0.02, 0.01, 0.00],
                vec![0.015, -0.01, 0.02],
                vec![0.005, 0.00, -0.005],
                vec![-0.01, 0.015, 0.01],
            ],
            &["AAA", "BBB", "CCC"],
        )
    }

    #[test]
    fn test_sample_std() {
        // Sample variance of 1..=4 is 5/3
        assert_relative_eq!(sample_std(&[1.0, 2.0, 3.0, 4.0]), (5.0_f64 / 3.0).sqrt());
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn test_covariance_symmetric_and_sample() {
        let stats = portfolio_stats(&sample(), &[1.0 / 3.0; 3], 252);
        let cov = &stats.cov_daily.values;

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(cov[i][j], cov[j][i]);
            }
        }
        let aaa = sample().column(0);
        assert_relative_eq!(cov[0][0], sample_std(&aaa).powi(2), epsilon = 1e-15);
    }

    #[test]
    fn test_correlation_diagonal_is_one() {
        let stats = portfolio_stats(&sample(), &[1.0 / 3.0; 3], 252);
        for i in 0..3 {
            assert_eq!(stats.corr.values[i][i], Some(1.0));
        }
        let ab = stats.corr.get("AAA", "BBB").flatten().unwrap();
        assert!((-1.0..=1.0).contains(&ab));
        assert_eq!(stats.corr.get("BBB", "AAA").flatten(), Some(ab));
    }

    #[test]
    fn test_zero_variance_instrument_has_undefined_correlation() {
        let flat = returns(
            vec![vec![0.01, 0.0], vec![-0.01, 0.0], vec![0.02, 0.0]],
            &["AAA", "CASH"],
        );
        let stats = portfolio_stats(&flat, &[0.5, 0.5], 252);
        assert_eq!(stats.corr.get("AAA", "CASH"), Some(None));
        assert_eq!(stats.corr.get("CASH", "CASH"), Some(None));
        assert_eq!(stats.corr.get("AAA", "AAA"), Some(Some(1.0)));
    }

    #[test]
    fn test_annual_mean_is_linear_in_weights() {
        let weights = [0.5, 0.3, 0.2];
        let stats = portfolio_stats(&sample(), &weights, 252);

        let weighted: f64 = stats
            .instrument_annual_means()
            .iter()
            .zip(&weights)
            .map(|(m, w)| m * w)
            .sum();
        assert_relative_eq!(stats.mean_annual, weighted, epsilon = 1e-12);
    }

    #[test]
    fn test_single_asset_volatility_matches_sample_std() {
        let single = returns(
            vec![vec![0.01], vec![-0.02], vec![0.015], vec![0.0]],
            &["AAA"],
        );
        let stats = portfolio_stats(&single, &[1.0], 252);
        let expected = sample_std(&single.column(0)) * 252.0_f64.sqrt();
        assert_relative_eq!(stats.std_annual, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_trading_days_override() {
        let stats_252 = portfolio_stats(&sample(), &[1.0 / 3.0; 3], 252);
        let stats_365 = portfolio_stats(&sample(), &[1.0 / 3.0; 3], 365);
        assert_relative_eq!(
            stats_365.mean_annual,
            stats_252.mean_annual * 365.0 / 252.0,
            epsilon = 1e-12
        );
        assert_eq!(stats_365.trading_days_per_year, 365);
    }

    #[test]
    fn test_constant_returns_have_zero_volatility() {
        let constant = returns(vec![vec![0.001, 0.001]; 5], &["AAA", "BBB"]);
        let stats = portfolio_stats(&constant, &[0.5, 0.5], 252);
        assert_abs_diff_eq!(stats.std_annual, 0.0);
        assert_relative_eq!(stats.mean_annual, 0.252, epsilon = 1e-12);
    }
}
