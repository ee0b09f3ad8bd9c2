//! Residual computation for regression models

use crate::errors::{StatsError, StatsResult};

/// Residuals of one fit
#[derive(Debug)]
pub struct ResidualsResult {
    /// Raw residuals: e = y - y_hat
    pub raw: Vec<f64>,
    /// Standardized residuals: e / sqrt(v * (1 - h_ii))
    pub standardized: Vec<f64>,
}

/// Compute raw and standardized residuals
///
/// # Arguments
/// * `y` - Observed responses
/// * `y_hat` - Fitted values
/// * `variance` - Estimated variance of each observation (σ² for a linear
///   model, μ(1 - μ) for a logistic one)
/// * `leverage` - Hat-matrix diagonal
pub fn compute_residuals(
    y: &[f64],
    y_hat: &[f64],
    variance: &[f64],
    leverage: &[f64],
) -> StatsResult<ResidualsResult> {
    let n = y.len();

    if n == 0 {
        return Err(StatsError::EmptyInput { field: "y" });
    }

    let lengths = [
        ("y_hat", y_hat.len()),
        ("variance", variance.len()),
        ("leverage", leverage.len()),
    ];
    for (field, len) in lengths {
        if len != n {
            return Err(StatsError::InvalidValue {
                field: "residuals",
                message: format!("y has {} elements, {} has {}", n, field, len),
            });
        }
    }

    let raw: Vec<f64> = y.iter().zip(y_hat).map(|(yi, yhi)| yi - yhi).collect();

    let standardized = raw
        .iter()
        .zip(variance.iter().zip(leverage))
        .map(|(e, (v, h))| {
            let denom = (v * (1.0 - h).max(1e-10)).sqrt();
            if denom > 0.0 {
                e / denom
            } else {
                f64::NAN
            }
        })
        .collect();

    Ok(ResidualsResult { raw, standardized })
}
