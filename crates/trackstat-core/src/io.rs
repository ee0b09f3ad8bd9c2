//! Delimited-file input and report output

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::diagnostics::VifRow;
use crate::errors::{StatsError, StatsResult};
use crate::table::{Column, Table, Value};
use crate::types::{CoefficientRow, CsvOptions, ModelSummary, PredictionRow};

/// Kind of a schema column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
}

/// Columns a table must provide, with their kinds
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<(String, ColumnKind)>,
}

impl Schema {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, ColumnKind)>) -> Self {
        Self {
            columns: columns.into_iter().map(|(n, k)| (n.into(), k)).collect(),
        }
    }

    /// The public track dataset: identifiers, album and playlist fields,
    /// audio features, popularity, mode, and key
    pub fn tracks() -> Self {
        use ColumnKind::{Numeric, Text};
        Self::new([
            ("track_id", Text),
            ("track_name", Text),
            ("track_artist", Text),
            ("track_popularity", Numeric),
            ("track_album_id", Text),
            ("track_album_name", Text),
            ("track_album_release_date", Text),
            ("playlist_name", Text),
            ("playlist_id", Text),
            ("playlist_genre", Text),
            ("playlist_subgenre", Text),
            ("danceability", Numeric),
            ("energy", Numeric),
            ("key", Numeric),
            ("loudness", Numeric),
            ("mode", Numeric),
            ("speechiness", Numeric),
            ("acousticness", Numeric),
            ("instrumentalness", Numeric),
            ("liveness", Numeric),
            ("valence", Numeric),
            ("tempo", Numeric),
            ("duration_ms", Numeric),
        ])
    }

    /// Schema columns minus the given names
    pub fn without(&self, names: &[&str]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|(n, _)| !names.contains(&n.as_str()))
                .cloned()
                .collect(),
        }
    }

    fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, k)| *k)
    }
}

/// Read a delimited table, checking the header against `schema` first
///
/// Columns outside the schema are kept as text. Empty cells and the
/// `options.missing` spellings are missing values.
///
/// # Errors
/// * `SchemaMismatch` listing every schema column absent from the header
/// * `Parse` for a non-numeric cell in a numeric column
pub fn read_table<R: Read>(reader: R, schema: &Schema, options: &CsvOptions) -> StatsResult<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    let missing: Vec<String> = schema
        .columns
        .iter()
        .filter(|(name, _)| !headers.contains(name))
        .map(|(name, _)| name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(StatsError::SchemaMismatch { missing });
    }

    let kinds: Vec<ColumnKind> = headers
        .iter()
        .map(|h| schema.kind_of(h).unwrap_or(ColumnKind::Text))
        .collect();
    let mut numeric: Vec<Vec<Option<f64>>> = vec![Vec::new(); headers.len()];
    let mut text: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        for (j, kind) in kinds.iter().enumerate() {
            let cell = record.get(j).unwrap_or("").trim();
            let is_missing = cell.is_empty() || options.missing.iter().any(|m| m == cell);
            match kind {
                ColumnKind::Numeric => {
                    let value = if is_missing {
                        None
                    } else {
                        Some(cell.parse::<f64>().map_err(|_| StatsError::Parse {
                            column: headers[j].clone(),
                            row,
                            value: cell.to_string(),
                        })?)
                    };
                    numeric[j].push(value);
                }
                ColumnKind::Text => text[j].push((!is_missing).then(|| cell.to_string())),
            }
        }
    }

    let mut table = Table::new();
    for (j, name) in headers.into_iter().enumerate() {
        let column = match kinds[j] {
            ColumnKind::Numeric => Column::Numeric(std::mem::take(&mut numeric[j])),
            ColumnKind::Text => Column::Text(std::mem::take(&mut text[j])),
        };
        table.push_column(name, column)?;
    }

    log::debug!("read {} rows x {} columns", table.n_rows(), table.n_cols());
    Ok(table)
}

/// [`read_table`] from a file path
pub fn read_table_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &CsvOptions,
) -> StatsResult<Table> {
    let file = File::open(path.as_ref())?;
    read_table(file, schema, options)
}

/// Round to `precision` decimals and format without trailing zeros
pub fn format_number(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NA".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor).round() / factor;
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}", rounded)
}

fn format_option(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format_number(v, precision))
}

fn writer<W: Write>(out: W, options: &CsvOptions) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(out)
}

/// Write coefficient tables, one row per (model, term)
pub fn write_coefficients<W: Write>(
    out: W,
    models: &[(String, Vec<CoefficientRow>)],
    options: &CsvOptions,
) -> StatsResult<()> {
    let p = options.precision;
    let mut w = writer(out, options);
    w.write_record([
        "model", "term", "estimate", "std_error", "statistic", "p_value", "conf_low", "conf_high",
    ])?;
    for (label, rows) in models {
        for r in rows {
            w.write_record([
                label.clone(),
                r.term.clone(),
                format_number(r.estimate, p),
                format_number(r.std_error, p),
                format_number(r.statistic, p),
                format_number(r.p_value, p),
                format_number(r.conf_low, p),
                format_number(r.conf_high, p),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Write model summaries, one row per model, labelled by `models[i].0`
pub fn write_summary<W: Write>(
    out: W,
    models: &[(String, ModelSummary)],
    options: &CsvOptions,
) -> StatsResult<()> {
    let p = options.precision;
    let mut w = writer(out, options);
    w.write_record([
        "model",
        "r_squared",
        "adj_r_squared",
        "sigma",
        "statistic",
        "p_value",
        "log_likelihood",
        "aic",
        "bic",
        "deviance",
        "null_deviance",
        "df_residual",
        "n_observations",
        "n_terms",
    ])?;
    for (label, s) in models {
        w.write_record([
            label.clone(),
            format_number(s.r_squared, p),
            format_number(s.adj_r_squared, p),
            format_number(s.sigma, p),
            format_option(s.statistic, p),
            format_option(s.p_value, p),
            format_number(s.log_likelihood, p),
            format_number(s.aic, p),
            format_number(s.bic, p),
            format_number(s.deviance, p),
            format_number(s.null_deviance, p),
            s.df_residual.to_string(),
            s.n_observations.to_string(),
            s.n_terms.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Write per-observation fitted values and residuals for each model
pub fn write_predictions<W: Write>(
    out: W,
    models: &[(String, Vec<PredictionRow>)],
    options: &CsvOptions,
) -> StatsResult<()> {
    let p = options.precision;
    let mut w = writer(out, options);
    w.write_record([
        "model", "row", "observed", "fitted_value", "residual", "leverage", "std_residual",
    ])?;
    for (label, rows) in models {
        for r in rows {
            w.write_record([
                label.clone(),
                r.row.to_string(),
                format_number(r.observed, p),
                format_number(r.fitted_value, p),
                format_number(r.residual, p),
                format_number(r.leverage, p),
                format_number(r.std_residual, p),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Write variance inflation factors for each model
pub fn write_vif<W: Write>(
    out: W,
    models: &[(String, Vec<VifRow>)],
    options: &CsvOptions,
) -> StatsResult<()> {
    let mut w = writer(out, options);
    w.write_record(["model", "term", "vif"])?;
    for (label, rows) in models {
        for r in rows {
            w.write_record([
                label.clone(),
                r.term.clone(),
                format_number(r.vif, options.precision),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Write a table; categorical cells are written as their labels
///
/// Numbers are written in full so a written table reads back unchanged.
pub fn write_table<W: Write>(out: W, table: &Table, options: &CsvOptions) -> StatsResult<()> {
    let mut w = writer(out, options);
    w.write_record(table.column_names())?;
    for i in 0..table.n_rows() {
        let record: Vec<String> = table
            .row(i)
            .into_iter()
            .map(|v| match v {
                Value::Missing => "NA".to_string(),
                Value::Number(x) => x.to_string(),
                Value::Text(s) => s,
            })
            .collect();
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}
