use thiserror::Error;

/// Errors that can occur while loading, cleaning, or modeling a track table
#[derive(Error, Debug)]
pub enum StatsError {
    // Input table errors
    #[error("Schema mismatch: missing required column(s) {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Column '{column}', row {row}: cannot parse '{value}' as a number")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    // Cleaning errors
    #[error("Column '{column}', row {row}: value {value} has no label in the recoding scheme")]
    UnmappedCategory {
        column: String,
        row: usize,
        value: String,
    },

    // Model specification errors
    #[error("Invalid formula '{formula}': {message}")]
    InvalidFormula { formula: String, message: String },

    #[error("Term '{term}' references unknown column '{column}'")]
    UnknownTerm { term: String, column: String },

    #[error("Term '{term}' references text column '{column}'; recode it to a categorical first")]
    NonNumericTerm { term: String, column: String },

    #[error("Logistic response '{column}' must take exactly two distinct values, found {distinct}")]
    NonBinaryResponse { column: String, distinct: usize },

    // Input validation errors
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("Insufficient data: {rows} rows, {cols} design columns (need rows > columns)")]
    InsufficientData { rows: usize, cols: usize },

    #[error("All rows excluded due to missing values")]
    NoValidData,

    #[error("Empty input: {field} cannot be empty")]
    EmptyInput { field: &'static str },

    // Numerical errors
    #[error("Design matrix is rank-deficient: column '{term}' is collinear with earlier columns")]
    SingularDesign { term: String },

    #[error("Logistic fit did not converge in {iterations} iterations (tol {tolerance})")]
    FitDidNotConverge { iterations: u32, tolerance: f64 },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for track statistics operations
pub type StatsResult<T> = Result<T, StatsError>;
