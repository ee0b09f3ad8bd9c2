//! Report views over a fitted model
//!
//! Three pure extractions: the coefficient table, the one-row model summary,
//! and per-observation fitted values and residuals.

use std::cmp::Ordering;

use crate::errors::StatsResult;
use crate::models::critical_value;
use crate::types::{
    CoefficientOptions, CoefficientRow, FittedModel, ModelSummary, PredictionRow, TermOrder,
};

/// Coefficient table with confidence intervals
///
/// Rows follow declaration order unless `options.order` asks otherwise. With
/// `exponentiate`, the estimate and interval bounds are exp-transformed (odds
/// ratios for a logistic model); standard error and statistic stay on the
/// link scale.
pub fn coefficients(
    model: &FittedModel,
    options: &CoefficientOptions,
) -> StatsResult<Vec<CoefficientRow>> {
    let q = critical_value(model.statistic_kind, model.df_residual, options.confidence_level)?;

    let mut rows: Vec<CoefficientRow> = (0..model.terms.len())
        .map(|j| {
            let estimate = model.coefficients[j];
            let se = model.std_errors[j];
            let (low, high) = (estimate - q * se, estimate + q * se);
            let transform = |v: f64| if options.exponentiate { v.exp() } else { v };
            CoefficientRow {
                term: model.terms[j].clone(),
                estimate: transform(estimate),
                std_error: se,
                statistic: model.statistics[j],
                p_value: model.p_values[j],
                conf_low: transform(low),
                conf_high: transform(high),
            }
        })
        .collect();

    match options.order {
        TermOrder::Declared => {}
        TermOrder::Alphabetical => rows.sort_by(|a, b| a.term.cmp(&b.term)),
        // stable sort: ties keep declaration order
        TermOrder::Statistic => rows.sort_by(|a, b| {
            b.statistic
                .abs()
                .partial_cmp(&a.statistic.abs())
                .unwrap_or(Ordering::Equal)
        }),
    }

    Ok(rows)
}

/// Single-row model summary
pub fn summary(model: &FittedModel) -> ModelSummary {
    let stats = &model.stats;
    ModelSummary {
        r_squared: stats.r_squared,
        adj_r_squared: stats.adj_r_squared,
        sigma: stats.sigma,
        statistic: stats.f_statistic,
        p_value: stats.f_pvalue,
        log_likelihood: stats.log_likelihood,
        aic: stats.aic,
        bic: stats.bic,
        deviance: stats.deviance,
        null_deviance: stats.null_deviance,
        df_residual: model.df_residual,
        n_observations: model.n_observations,
        n_terms: model.terms.len(),
    }
}

/// Fitted value and residual for every observation used in the fit
pub fn predictions(model: &FittedModel) -> Vec<PredictionRow> {
    model
        .observations
        .iter()
        .map(|o| PredictionRow {
            row: o.row,
            observed: o.observed,
            fitted_value: o.fitted,
            residual: o.residual,
            leverage: o.leverage,
            std_residual: o.std_residual,
        })
        .collect()
}
