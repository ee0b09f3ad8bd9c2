//! Logistic regression (binomial family, logit link) fitted by IRLS

use crate::diagnostics::{compute_aic, compute_bic, compute_residuals};
use crate::errors::{StatsError, StatsResult};
use crate::formula::ModelSpec;
use crate::models::design::DesignMatrix;
use crate::models::inference::two_sided_p_value;
use crate::models::linalg::{to_mat, QrDecomposition};
use crate::types::{
    FitOptions, FitStatistics, FittedModel, ModelFamily, ObservationFit, StatisticKind,
};
use faer::{Col, Mat};

const MU_EPSILON: f64 = 1e-10;

fn inverse_logit(eta: f64) -> f64 {
    (1.0 / (1.0 + (-eta).exp())).clamp(MU_EPSILON, 1.0 - MU_EPSILON)
}

/// Rows of `x` scaled by the square roots of `weights`
fn weighted(x: &Mat<f64>, weights: &[f64]) -> Mat<f64> {
    Mat::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] * weights[i].sqrt())
}

/// Binomial deviance, -2 logL for 0/1 responses
fn deviance(y: &[f64], mu: &[f64]) -> f64 {
    -2.0 * y
        .iter()
        .zip(mu)
        .map(|(&yi, &mi)| if yi > 0.5 { mi.ln() } else { (1.0 - mi).ln() })
        .sum::<f64>()
}

/// Fit a logistic regression model
///
/// Iteratively reweighted least squares starting from μ = (y + 0.5) / 2.
/// Each step solves the weighted least-squares problem by QR.
///
/// Converged when |D - D_prev| / (|D| + 0.1) < `options.tolerance`, where D
/// is the deviance. For 0/1 responses D = -2 logL, so this equals the
/// relative log-likelihood change |ΔlogL| / (|logL| + 0.05).
///
/// # Errors
/// * `FitDidNotConverge` after `options.max_iterations` iterations
/// * `SingularDesign` if the weighted design is rank-deficient
pub fn fit_logistic(
    design: &DesignMatrix,
    spec: &ModelSpec,
    options: &FitOptions,
) -> StatsResult<FittedModel> {
    let n_obs = design.n_rows();
    let n_cols = design.n_cols();
    let y = &design.y;

    if n_cols == 0 {
        return Err(StatsError::EmptyInput { field: "terms" });
    }
    if n_obs <= n_cols {
        return Err(StatsError::InsufficientData {
            rows: n_obs,
            cols: n_cols,
        });
    }
    if options.max_iterations == 0 {
        return Err(StatsError::InvalidValue {
            field: "max_iterations",
            message: "must be > 0".into(),
        });
    }

    let x = to_mat(&design.columns, n_obs);

    let mut mu: Vec<f64> = y.iter().map(|yi| (yi + 0.5) / 2.0).collect();
    let mut eta: Vec<f64> = mu.iter().map(|m| (m / (1.0 - m)).ln()).collect();
    let mut dev_old = deviance(y, &mu);

    let mut beta = vec![0.0; n_cols];
    let mut converged = false;
    let mut iterations = 0;

    for iter in 1..=options.max_iterations {
        iterations = iter;

        // Weighted least squares on the working response
        let weights: Vec<f64> = mu.iter().map(|m| m * (1.0 - m)).collect();
        let zw = Col::from_fn(n_obs, |i| {
            (eta[i] + (y[i] - mu[i]) / weights[i]) * weights[i].sqrt()
        });
        let beta_col = QrDecomposition::new(&weighted(&x, &weights), &design.names)?.solve(&zw);
        beta = beta_col.iter().copied().collect();

        let eta_col = x.as_ref() * beta_col.as_ref();
        eta = eta_col.iter().copied().collect();
        mu = eta.iter().map(|&e| inverse_logit(e)).collect();

        let dev = deviance(y, &mu);
        let change = (dev - dev_old).abs() / (dev.abs() + 0.1);
        log::trace!("{}: IRLS iteration {} deviance {:.8}", spec, iter, dev);
        dev_old = dev;

        if change < options.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(StatsError::FitDidNotConverge {
            iterations: options.max_iterations,
            tolerance: options.tolerance,
        });
    }

    // Fisher information at the final estimate
    let variance: Vec<f64> = mu.iter().map(|m| m * (1.0 - m)).collect();
    let information = QrDecomposition::new(&weighted(&x, &variance), &design.names)?;
    let covariance = information.unscaled_covariance();

    let std_errors: Vec<f64> = (0..n_cols).map(|j| covariance[(j, j)].sqrt()).collect();
    let statistics: Vec<f64> = beta
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b / se)
        .collect();
    let p_values = statistics
        .iter()
        .map(|&z| two_sided_p_value(StatisticKind::Z, 0, z))
        .collect::<StatsResult<Vec<f64>>>()?;

    let residual_deviance = dev_old;
    let log_likelihood = -0.5 * residual_deviance;

    let null_mu = if design.has_intercept() {
        (y.iter().sum::<f64>() / n_obs as f64).clamp(MU_EPSILON, 1.0 - MU_EPSILON)
    } else {
        0.5
    };
    let null_deviance = deviance(y, &vec![null_mu; n_obs]);
    let pseudo_r_squared = if null_deviance > 0.0 {
        1.0 - residual_deviance / null_deviance
    } else {
        0.0
    };

    // GLM hat values w_i * x_i' (X'WX)^-1 x_i, the hat diagonal of W^1/2 X
    let leverage = information.leverage();
    let residuals = compute_residuals(y, &mu, &variance, &leverage)?;

    let observations = (0..n_obs)
        .map(|i| ObservationFit {
            row: design.rows[i],
            observed: y[i],
            fitted: mu[i],
            residual: residuals.raw[i],
            leverage: leverage[i],
            std_residual: residuals.standardized[i],
        })
        .collect();

    log::debug!(
        "{}: logistic fit converged in {} iterations, deviance {:.4}",
        spec,
        iterations,
        residual_deviance
    );

    Ok(FittedModel {
        spec: spec.clone(),
        family: ModelFamily::Logistic,
        standardized: options.standardize,
        terms: design.names.clone(),
        design: design.columns.clone(),
        coefficients: beta,
        std_errors,
        statistics,
        p_values,
        statistic_kind: StatisticKind::Z,
        df_residual: n_obs - n_cols,
        n_observations: n_obs,
        stats: FitStatistics {
            r_squared: pseudo_r_squared,
            adj_r_squared: f64::NAN,
            sigma: 1.0,
            log_likelihood,
            aic: compute_aic(log_likelihood, n_cols),
            bic: compute_bic(log_likelihood, n_obs, n_cols),
            deviance: residual_deviance,
            null_deviance,
            f_statistic: None,
            f_pvalue: None,
            iterations,
        },
        observations,
    })
}
