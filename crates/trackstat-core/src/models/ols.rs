//! Ordinary Least Squares (OLS) regression

use crate::diagnostics::{compute_aic, compute_bic, compute_residuals, gaussian_log_likelihood};
use crate::errors::{StatsError, StatsResult};
use crate::formula::ModelSpec;
use crate::models::design::DesignMatrix;
use crate::models::inference::{f_p_value, two_sided_p_value};
use crate::models::linalg::{to_col, to_mat, QrDecomposition};
use crate::types::{
    FitOptions, FitStatistics, FittedModel, ModelFamily, ObservationFit, StatisticKind,
};

/// Least-squares solution with the factorization it came from
pub(crate) struct LeastSquares {
    pub beta: Vec<f64>,
    pub fitted: Vec<f64>,
    pub rss: f64,
    pub qr: QrDecomposition,
}

/// Solve min ||y - Xb||² through a QR factorization of X
///
/// # Errors
/// `SingularDesign` naming the first column that is collinear with earlier ones.
pub(crate) fn least_squares(
    columns: &[Vec<f64>],
    y: &[f64],
    names: &[String],
) -> StatsResult<LeastSquares> {
    let x = to_mat(columns, y.len());
    let qr = QrDecomposition::new(&x, names)?;
    let beta = qr.solve(&to_col(y));
    let fitted = x.as_ref() * beta.as_ref();

    let beta: Vec<f64> = beta.iter().copied().collect();
    let fitted: Vec<f64> = fitted.iter().copied().collect();
    let rss = y.iter().zip(&fitted).map(|(a, b)| (a - b).powi(2)).sum();

    Ok(LeastSquares {
        beta,
        fitted,
        rss,
        qr,
    })
}

/// Fit an OLS regression model
///
/// # Arguments
/// * `design` - Response and design columns, after row exclusion
/// * `spec` - Model specification the design was built from
/// * `options` - Fitting options
///
/// # Returns
/// * `FittedModel` with t statistics on n - p degrees of freedom
pub fn fit_ols(
    design: &DesignMatrix,
    spec: &ModelSpec,
    options: &FitOptions,
) -> StatsResult<FittedModel> {
    let n_obs = design.n_rows();
    let n_cols = design.n_cols();

    if n_cols == 0 {
        return Err(StatsError::EmptyInput { field: "terms" });
    }
    if n_obs <= n_cols {
        return Err(StatsError::InsufficientData {
            rows: n_obs,
            cols: n_cols,
        });
    }

    let ls = least_squares(&design.columns, &design.y, &design.names)?;
    let xtx_inv = ls.qr.unscaled_covariance();

    let df_residual = n_obs - n_cols;
    let sigma2 = ls.rss / df_residual as f64;
    let sigma = sigma2.sqrt();

    let std_errors: Vec<f64> = (0..n_cols)
        .map(|j| (sigma2 * xtx_inv[(j, j)]).sqrt())
        .collect();
    let statistics: Vec<f64> = ls
        .beta
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b / se)
        .collect();
    let p_values = statistics
        .iter()
        .map(|&t| two_sided_p_value(StatisticKind::T, df_residual, t))
        .collect::<StatsResult<Vec<f64>>>()?;

    // Total sum of squares about the mean, or about zero without an intercept
    let has_intercept = design.has_intercept();
    let center = if has_intercept {
        design.y.iter().sum::<f64>() / n_obs as f64
    } else {
        0.0
    };
    let tss: f64 = design.y.iter().map(|y| (y - center).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - ls.rss / tss } else { 0.0 };
    let intercept_df = if has_intercept { 1.0 } else { 0.0 };
    let adj_r_squared =
        1.0 - (1.0 - r_squared) * ((n_obs as f64 - intercept_df) / df_residual as f64);

    let (f_statistic, f_pvalue) = if has_intercept && n_cols > 1 && sigma2 > 0.0 {
        let df_model = n_cols - 1;
        let f = ((tss - ls.rss) / df_model as f64) / sigma2;
        (Some(f), Some(f_p_value(f, df_model, df_residual)?))
    } else {
        (None, None)
    };

    // The residual variance counts as an estimated parameter
    let log_likelihood = gaussian_log_likelihood(ls.rss, n_obs)?;
    let k = n_cols + 1;

    let leverage = ls.qr.leverage();
    let residuals = compute_residuals(&design.y, &ls.fitted, &vec![sigma2; n_obs], &leverage)?;

    let observations = (0..n_obs)
        .map(|i| ObservationFit {
            row: design.rows[i],
            observed: design.y[i],
            fitted: ls.fitted[i],
            residual: residuals.raw[i],
            leverage: leverage[i],
            std_residual: residuals.standardized[i],
        })
        .collect();

    log::debug!(
        "{}: OLS on {} observations, R² = {:.4}",
        spec,
        n_obs,
        r_squared
    );

    Ok(FittedModel {
        spec: spec.clone(),
        family: ModelFamily::Linear,
        standardized: options.standardize,
        terms: design.names.clone(),
        design: design.columns.clone(),
        coefficients: ls.beta,
        std_errors,
        statistics,
        p_values,
        statistic_kind: StatisticKind::T,
        df_residual,
        n_observations: n_obs,
        stats: FitStatistics {
            r_squared,
            adj_r_squared,
            sigma,
            log_likelihood,
            aic: compute_aic(log_likelihood, k),
            bic: compute_bic(log_likelihood, n_obs, k),
            deviance: ls.rss,
            null_deviance: tss,
            f_statistic,
            f_pvalue,
            iterations: 0,
        },
        observations,
    })
}
