//! Portfolio weight validation.

use crate::{Error, Result};

/// Resolve the weight vector for `n` instruments.
///
/// Without explicit weights every instrument gets `1/n`. Explicit weights must
/// match the instrument count, be finite and have a non-zero sum; they are
/// rescaled to sum to one.
pub fn resolve_weights(weights: Option<&[f64]>, n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(Error::Validation(
            "cannot weight a portfolio with no instruments".to_string(),
        ));
    }

    let Some(weights) = weights else {
        return Ok(vec![1.0 / n as f64; n]);
    };

    if weights.len() != n {
        return Err(Error::Validation(format!(
            "weights length mismatch: {} weights for {} instruments",
            weights.len(),
            n
        )));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
        return Err(Error::Validation(format!("weight {} is not a finite number", w)));
    }

    let sum: f64 = weights.iter().sum();
    if sum == 0.0 {
        return Err(Error::Validation("sum of weights is zero".to_string()));
    }

    Ok(weights.iter().map(|w| w / sum).collect())
}
