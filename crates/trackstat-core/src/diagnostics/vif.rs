//! Variance Inflation Factor (VIF) computation

use crate::errors::{StatsError, StatsResult};
use crate::models::{least_squares, INTERCEPT};
use crate::types::FittedModel;
use serde::Serialize;

/// VIF of one design column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VifRow {
    pub term: String,
    pub vif: f64,
}

/// Compute VIF (Variance Inflation Factor) for each non-intercept design column.
///
/// VIF measures multicollinearity. For each column j, we regress it on
/// all other columns (with an intercept) and compute VIF_j = 1 / (1 - R²_j).
///
/// VIF interpretation:
/// - VIF = 1: No correlation with other columns
/// - VIF < 5: Generally acceptable
/// - VIF 5-10: Moderate multicollinearity
/// - VIF > 10: High multicollinearity, may need to address
pub fn compute_vif(model: &FittedModel) -> StatsResult<Vec<VifRow>> {
    let features: Vec<usize> = (0..model.terms.len())
        .filter(|&j| model.terms[j] != INTERCEPT)
        .collect();

    if features.is_empty() {
        return Err(StatsError::EmptyInput { field: "terms" });
    }

    if features.len() == 1 {
        // Single column has VIF = 1 (no other columns to correlate with)
        return Ok(vec![VifRow {
            term: model.terms[features[0]].clone(),
            vif: 1.0,
        }]);
    }

    let n_obs = model.n_observations;
    let mut rows = Vec::with_capacity(features.len());

    for &j in &features {
        let y = &model.design[j];

        let mut names = vec![INTERCEPT.to_string()];
        let mut others = vec![vec![1.0; n_obs]];
        for &k in features.iter().filter(|&&k| k != j) {
            names.push(model.terms[k].clone());
            others.push(model.design[k].clone());
        }

        let vif = match least_squares(&others, y, &names) {
            Ok(fit) => {
                let mean = y.iter().sum::<f64>() / n_obs as f64;
                let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
                let r_squared = if tss > 0.0 { 1.0 - fit.rss / tss } else { 1.0 };

                // R² ≈ 1 is perfect multicollinearity
                if r_squared >= 0.9999 {
                    f64::INFINITY
                } else {
                    1.0 / (1.0 - r_squared.max(0.0))
                }
            }
            // Singular auxiliary regression: column is collinear
            Err(_) => f64::INFINITY,
        };

        rows.push(VifRow {
            term: model.terms[j].clone(),
            vif,
        });
    }

    Ok(rows)
}
