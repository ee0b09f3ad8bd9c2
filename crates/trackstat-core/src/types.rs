use serde::Serialize;

use crate::formula::ModelSpec;

/// Model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Gaussian response, ordinary least squares
    #[default]
    Linear,
    /// Binary response, logit link, maximum likelihood via IRLS
    Logistic,
}

/// Options for model fitting
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Whether to fit an intercept term
    pub fit_intercept: bool,
    /// Z-score numeric columns over the post-exclusion rows before fitting
    pub standardize: bool,
    /// Maximum IRLS iterations (logistic family)
    pub max_iterations: u32,
    /// Convergence threshold on |D - D_prev| / (|D| + 0.1), D the deviance
    /// (-2 logL for 0/1 responses); logistic family
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            fit_intercept: true,
            standardize: false,
            max_iterations: 25,
            tolerance: 1e-8,
        }
    }
}

/// Which test statistic the coefficient table reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatisticKind {
    /// Student t with the residual degrees of freedom (linear family)
    T,
    /// Standard normal Wald z (logistic family)
    Z,
}

/// Model-level fit statistics
#[derive(Debug, Clone)]
pub struct FitStatistics {
    /// R-squared, or McFadden pseudo R-squared for the logistic family
    pub r_squared: f64,
    /// Adjusted R-squared (NaN for the logistic family)
    pub adj_r_squared: f64,
    /// Residual standard error (1.0 for the logistic family)
    pub sigma: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Residual sum of squares (linear) or residual deviance (logistic)
    pub deviance: f64,
    pub null_deviance: f64,
    /// Overall F statistic (linear family with intercept only)
    pub f_statistic: Option<f64>,
    pub f_pvalue: Option<f64>,
    /// IRLS iterations used (0 for the linear family)
    pub iterations: u32,
}

/// Fit of a single input observation
#[derive(Debug, Clone)]
pub struct ObservationFit {
    /// Row index in the table passed to `fit`
    pub row: usize,
    pub observed: f64,
    /// Fitted value on the response scale (probability for logistic)
    pub fitted: f64,
    /// Response residual: observed - fitted
    pub residual: f64,
    /// Diagonal of the hat matrix
    pub leverage: f64,
    /// Residual scaled by its estimated standard deviation
    pub std_residual: f64,
}

/// Immutable result of one `fit` call
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub spec: ModelSpec,
    pub family: ModelFamily,
    pub standardized: bool,
    /// Design column names, in declaration order
    pub terms: Vec<String>,
    /// Design columns (column-major) over the observations used, for diagnostics
    pub design: Vec<Vec<f64>>,
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub statistics: Vec<f64>,
    pub p_values: Vec<f64>,
    pub statistic_kind: StatisticKind,
    pub df_residual: usize,
    pub n_observations: usize,
    pub stats: FitStatistics,
    pub observations: Vec<ObservationFit>,
}

impl FittedModel {
    /// Coefficient estimate for the named design column
    pub fn coefficient(&self, term: &str) -> Option<f64> {
        self.terms
            .iter()
            .position(|t| t == term)
            .map(|i| self.coefficients[i])
    }
}

/// Ordering of the coefficient table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermOrder {
    /// Order in which terms were declared in the model specification
    #[default]
    Declared,
    /// Alphabetical by term name
    Alphabetical,
    /// Descending absolute test statistic
    Statistic,
}

/// Options for the coefficient report
#[derive(Debug, Clone)]
pub struct CoefficientOptions {
    /// Report exp(estimate) and exp(interval), i.e. odds ratios for logistic models
    pub exponentiate: bool,
    /// Confidence level for the interval (default: 0.95)
    pub confidence_level: f64,
    pub order: TermOrder,
}

impl Default for CoefficientOptions {
    fn default() -> Self {
        Self {
            exponentiate: false,
            confidence_level: 0.95,
            order: TermOrder::Declared,
        }
    }
}

/// One row of the coefficient report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientRow {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
    pub conf_low: f64,
    pub conf_high: f64,
}

/// Single-row model summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub sigma: f64,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub deviance: f64,
    pub null_deviance: f64,
    pub df_residual: usize,
    pub n_observations: usize,
    pub n_terms: usize,
}

/// One row of the per-observation report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub row: usize,
    pub observed: f64,
    pub fitted_value: f64,
    pub residual: f64,
    pub leverage: f64,
    pub std_residual: f64,
}

/// Options for CSV reading and writing
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Cell spellings read as missing, besides the empty cell
    pub missing: Vec<String>,
    /// Decimal places for numeric output
    pub precision: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            missing: vec!["NA".to_string()],
            precision: 3,
        }
    }
}
