//! Diagnostic functions for regression models

mod information_criteria;
mod residuals;
mod vif;

pub use information_criteria::{compute_aic, compute_bic, gaussian_log_likelihood};
pub use residuals::{compute_residuals, ResidualsResult};
pub use vif::{compute_vif, VifRow};
