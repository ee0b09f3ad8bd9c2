//! Information criteria for model selection (AIC, BIC)

use crate::errors::{StatsError, StatsResult};

/// Maximised Gaussian log-likelihood of a least-squares fit
///
/// logL = -n/2 * (ln(2π) + ln(RSS/n) + 1)
///
/// A perfect fit (RSS = 0) has an infinite log-likelihood.
pub fn gaussian_log_likelihood(rss: f64, n: usize) -> StatsResult<f64> {
    if n == 0 {
        return Err(StatsError::InvalidValue {
            field: "n",
            message: "must be > 0".into(),
        });
    }
    if rss < 0.0 {
        return Err(StatsError::InvalidValue {
            field: "rss",
            message: "must be non-negative".into(),
        });
    }

    let n_f = n as f64;
    if rss == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(-0.5 * n_f * ((2.0 * std::f64::consts::PI).ln() + (rss / n_f).ln() + 1.0))
}

/// Compute AIC (Akaike Information Criterion)
///
/// AIC = -2 logL + 2k
///
/// where k is the number of estimated parameters. For a linear model that
/// includes the residual variance.
pub fn compute_aic(log_likelihood: f64, k: usize) -> f64 {
    -2.0 * log_likelihood + 2.0 * k as f64
}

/// Compute BIC (Bayesian Information Criterion)
///
/// BIC = -2 logL + k ln(n)
///
/// BIC penalizes model complexity more heavily than AIC once n > e².
pub fn compute_bic(log_likelihood: f64, n: usize, k: usize) -> f64 {
    -2.0 * log_likelihood + k as f64 * (n as f64).ln()
}
