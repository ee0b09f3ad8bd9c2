//! Regression model implementations

mod design;
mod inference;
mod linalg;
mod logistic;
mod ols;

pub use design::{build_design, DesignMatrix, INTERCEPT};
pub use logistic::fit_logistic;
pub use ols::fit_ols;

pub(crate) use inference::{critical_value, two_sided_p_value};
pub(crate) use ols::least_squares;

use crate::errors::StatsResult;
use crate::formula::ModelSpec;
use crate::table::Table;
use crate::types::{FitOptions, FittedModel, ModelFamily};

/// Fit one model over `table`
///
/// # Errors
/// * `UnknownTerm` if the dependent variable or a term names an absent column
/// * `SingularDesign` if the design matrix is rank-deficient
/// * `FitDidNotConverge` if a logistic fit exhausts its iterations
pub fn fit(table: &Table, spec: &ModelSpec, options: &FitOptions) -> StatsResult<FittedModel> {
    let design = build_design(table, spec, options)?;
    match spec.family {
        ModelFamily::Linear => fit_ols(&design, spec, options),
        ModelFamily::Logistic => fit_logistic(&design, spec, options),
    }
}

/// Fit independent models; one failure does not stop the others
pub fn fit_many(
    table: &Table,
    specs: &[ModelSpec],
    options: &FitOptions,
) -> Vec<StatsResult<FittedModel>> {
    specs
        .iter()
        .map(|spec| {
            let result = fit(table, spec, options);
            if let Err(e) = &result {
                log::warn!("{}: {}", spec, e);
            }
            result
        })
        .collect()
}
