//! Design matrix construction
//!
//! Categorical columns expand to one 0/1 indicator per non-reference level.
//! Interaction columns are always products of those same indicator (or
//! numeric) columns, so an interaction never depends on any external numeric
//! recoding of a categorical.

use crate::compare::mean_sd;
use crate::errors::{StatsError, StatsResult};
use crate::formula::{ModelSpec, Term};
use crate::table::{Column, Table};
use crate::types::{FitOptions, ModelFamily};

/// Name of the intercept column
pub const INTERCEPT: &str = "(Intercept)";

/// Response vector and named design columns over the rows used for fitting
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    /// Design column names, intercept first when present
    pub names: Vec<String>,
    /// Design columns, each of length `y.len()`
    pub columns: Vec<Vec<f64>>,
    pub y: Vec<f64>,
    /// Index into the source table of each used row
    pub rows: Vec<usize>,
}

impl DesignMatrix {
    pub fn n_rows(&self) -> usize {
        self.y.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn has_intercept(&self) -> bool {
        self.names.first().is_some_and(|n| n == INTERCEPT)
    }
}

type Block = Vec<(String, Vec<f64>)>;

/// Build the design matrix for `spec` over `table`
///
/// Rows with a missing or non-finite value in the dependent variable or any
/// referenced column are excluded before anything else is computed.
pub fn build_design(
    table: &Table,
    spec: &ModelSpec,
    options: &FitOptions,
) -> StatsResult<DesignMatrix> {
    let dependent = lookup(table, &spec.dependent, &spec.dependent)?;
    let mut variables: Vec<(&str, &Column)> = Vec::new();
    for term in &spec.terms {
        for name in term.columns() {
            let column = lookup(table, &term.label(), name)?;
            if !variables.iter().any(|(n, _)| *n == name) {
                variables.push((name, column));
            }
        }
    }

    let rows: Vec<usize> = (0..table.n_rows())
        .filter(|&i| dependent.is_present(i) && variables.iter().all(|(_, c)| c.is_present(i)))
        .collect();
    if rows.len() < table.n_rows() {
        log::debug!(
            "{}: excluded {} of {} rows with missing values",
            spec,
            table.n_rows() - rows.len(),
            table.n_rows()
        );
    }
    if rows.is_empty() {
        return Err(StatsError::NoValidData);
    }

    let y = response(&spec.dependent, dependent, &rows, spec.family, options.standardize)?;

    let block = |name: &str| -> StatsResult<Block> {
        let (_, column) = variables
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| StatsError::UnknownTerm {
                term: name.to_string(),
                column: name.to_string(),
            })?;
        main_effect(name, column, &rows, options.standardize)
    };

    let mut names = Vec::new();
    let mut columns = Vec::new();
    if options.fit_intercept && spec.intercept {
        names.push(INTERCEPT.to_string());
        columns.push(vec![1.0; rows.len()]);
    }

    for term in &spec.terms {
        match term {
            Term::Main(name) => {
                for (n, values) in block(name)? {
                    names.push(n);
                    columns.push(values);
                }
            }
            Term::Interaction(a, b) => {
                let left = block(a)?;
                for (nb, vb) in block(b)? {
                    for (na, va) in &left {
                        names.push(format!("{}:{}", na, nb));
                        columns.push(va.iter().zip(&vb).map(|(x, z)| x * z).collect());
                    }
                }
            }
        }
    }

    if columns.is_empty() {
        return Err(StatsError::EmptyInput { field: "terms" });
    }

    log::debug!("{}: design {} x {}", spec, rows.len(), columns.len());

    Ok(DesignMatrix {
        names,
        columns,
        y,
        rows,
    })
}

fn lookup<'a>(table: &'a Table, term: &str, name: &str) -> StatsResult<&'a Column> {
    match table.column(name) {
        None => Err(StatsError::UnknownTerm {
            term: term.to_string(),
            column: name.to_string(),
        }),
        Some(Column::Text(_)) => Err(StatsError::NonNumericTerm {
            term: term.to_string(),
            column: name.to_string(),
        }),
        Some(column) => Ok(column),
    }
}

/// Design columns contributed by one column's main effect
fn main_effect(
    name: &str,
    column: &Column,
    rows: &[usize],
    standardize: bool,
) -> StatsResult<Block> {
    match column {
        Column::Numeric(v) => {
            let values: Vec<f64> = rows.iter().filter_map(|&i| v[i]).collect();
            let values = if standardize {
                z_scores(name, values)?
            } else {
                values
            };
            Ok(vec![(name.to_string(), values)])
        }
        Column::Categorical(c) => Ok(c
            .levels
            .iter()
            .enumerate()
            .skip(1)
            .map(|(level, label)| {
                let indicator = rows
                    .iter()
                    .map(|&i| if c.codes[i] == Some(level) { 1.0 } else { 0.0 })
                    .collect();
                (format!("{}{}", name, label), indicator)
            })
            .collect()),
        Column::Text(_) => Err(StatsError::NonNumericTerm {
            term: name.to_string(),
            column: name.to_string(),
        }),
    }
}

fn response(
    name: &str,
    column: &Column,
    rows: &[usize],
    family: ModelFamily,
    standardize: bool,
) -> StatsResult<Vec<f64>> {
    match (family, column) {
        (ModelFamily::Linear, Column::Numeric(v)) => {
            let values: Vec<f64> = rows.iter().filter_map(|&i| v[i]).collect();
            if standardize {
                z_scores(name, values)
            } else {
                Ok(values)
            }
        }
        (ModelFamily::Linear, _) => Err(StatsError::InvalidValue {
            field: "dependent",
            message: format!("'{}' must be numeric for a linear model", name),
        }),
        (ModelFamily::Logistic, Column::Numeric(v)) => {
            let values: Vec<f64> = rows.iter().filter_map(|&i| v[i]).collect();
            let mut distinct: Vec<f64> = Vec::new();
            for &x in &values {
                if !distinct.contains(&x) {
                    distinct.push(x);
                }
            }
            if distinct.len() != 2 {
                return Err(StatsError::NonBinaryResponse {
                    column: name.to_string(),
                    distinct: distinct.len(),
                });
            }
            let low = distinct[0].min(distinct[1]);
            Ok(values.iter().map(|&x| if x == low { 0.0 } else { 1.0 }).collect())
        }
        (ModelFamily::Logistic, Column::Categorical(c)) => {
            if c.levels.len() != 2 {
                return Err(StatsError::NonBinaryResponse {
                    column: name.to_string(),
                    distinct: c.levels.len(),
                });
            }
            Ok(rows
                .iter()
                .map(|&i| if c.codes[i] == Some(1) { 1.0 } else { 0.0 })
                .collect())
        }
        (ModelFamily::Logistic, Column::Text(_)) => Err(StatsError::NonNumericTerm {
            term: name.to_string(),
            column: name.to_string(),
        }),
    }
}

fn z_scores(name: &str, values: Vec<f64>) -> StatsResult<Vec<f64>> {
    let (mean, sd) = mean_sd(&values);
    if !(sd > 0.0) {
        return Err(StatsError::InvalidValue {
            field: "standardize",
            message: format!("'{}' has zero variance", name),
        });
    }
    Ok(values.into_iter().map(|x| (x - mean) / sd).collect())
}
