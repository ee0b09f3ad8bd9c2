//! Subcommand implementations

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use trackstat_core::clean::{
    self, filter_numeric, restore_labels, threshold_indicator, Recode, RecodeScheme,
    ALBUM_PLAYLIST_COLUMNS,
};
use trackstat_core::compare::{group_means, welch_t_test, GroupSummary, WelchResult};
use trackstat_core::diagnostics::{compute_vif, VifRow};
use trackstat_core::formula::ModelSpec;
use trackstat_core::io::{
    read_table, write_coefficients, write_predictions, write_summary, write_table, write_vif,
    ColumnKind, Schema,
};
use trackstat_core::models::fit_many;
use trackstat_core::report::{coefficients, predictions, summary};
use trackstat_core::table::Table;
use trackstat_core::{
    CoefficientOptions, CoefficientRow, CsvOptions, FitOptions, ModelSummary, PredictionRow,
};

use crate::cli::{CleanArgs, Command, CompareArgs, FitArgs, OutputFormat, RecodeArgs};

const POPULARITY: &str = "track_popularity";
const POPULAR: &str = "popular";

pub fn execute(command: Command) -> Result<()> {
    match command {
        Command::Clean(args) => run_clean(args),
        Command::Fit(args) => run_fit(args),
        Command::Compare(args) => run_compare(args),
    }
}

fn open_input(path: &str) -> Result<Box<dyn Read>> {
    if path == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("cannot open input '{}'", path))?;
    Ok(Box::new(BufReader::new(file)))
}

fn create_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path)
        .with_context(|| format!("cannot create output '{}'", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn load(path: &str, schema: &Schema, csv: &CsvOptions) -> Result<Table> {
    let table = read_table(open_input(path)?, schema, csv)
        .with_context(|| format!("failed to read '{}'", path))?;
    log::info!("{}: {} rows x {} columns", path, table.n_rows(), table.n_cols());
    Ok(table)
}

/// Schema for tables that may already be cleaned
///
/// Album and playlist columns are optional. Mode and key are read as text so
/// labels written by `clean --recode-*` can be restored.
fn analysis_schema() -> Schema {
    let mut schema = Schema::tracks().without(ALBUM_PLAYLIST_COLUMNS);
    for (name, kind) in schema.columns.iter_mut() {
        if name == "mode" || name == "key" {
            *kind = ColumnKind::Text;
        }
    }
    schema
}

fn recodes(args: RecodeArgs) -> Vec<Recode> {
    let mut out = Vec::new();
    if args.recode_mode {
        out.push(Recode::in_place("mode", RecodeScheme::mode()));
    }
    if args.recode_key {
        out.push(Recode::in_place("key", RecodeScheme::key()));
    }
    out
}

/// Restore mode and key to numbers or labels, then apply requested recodes
fn prepare(table: Table, args: RecodeArgs) -> Result<Table> {
    let mut table = restore_labels(&table, "mode", &RecodeScheme::mode())?;
    table = restore_labels(&table, "key", &RecodeScheme::key())?;
    for recode in recodes(args) {
        table = clean::recode(&table, &recode)?;
    }
    Ok(table)
}

fn run_clean(args: CleanArgs) -> Result<()> {
    let csv = CsvOptions::default();
    let raw = load(&args.input, &Schema::tracks(), &csv)?;

    let mut options = args.by.options();
    if args.keep_extra_columns {
        options.drop_columns.clear();
    }
    options.recodes = recodes(args.recode);

    let cleaned = clean::clean(&raw, &options)?;
    log::info!("cleaned {} rows to {} tracks", raw.n_rows(), cleaned.n_rows());

    let mut out = create_output(Path::new(&args.output))?;
    write_table(&mut out, &cleaned, &csv)
        .with_context(|| format!("failed to write '{}'", args.output))?;
    out.flush()?;
    Ok(())
}

/// Everything reported for one model
#[derive(Debug, Serialize)]
struct ModelReport {
    model: String,
    family: trackstat_core::ModelFamily,
    coefficients: Vec<CoefficientRow>,
    summary: ModelSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    predictions: Option<Vec<PredictionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vif: Option<Vec<VifRow>>,
}

#[derive(Debug, Serialize)]
struct FitFailure {
    model: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct FitOutput {
    models: Vec<ModelReport>,
    failures: Vec<FitFailure>,
}

fn run_fit(args: FitArgs) -> Result<()> {
    let csv = CsvOptions {
        precision: args.precision,
        ..Default::default()
    };
    let mut table = prepare(load(&args.input, &analysis_schema(), &csv)?, args.recode)?;

    if let Some(by) = args.dedupe {
        table = clean::clean(&table, &by.options())?;
    }
    if let Some(min) = args.min_popularity {
        table = filter_numeric(&table, POPULARITY, |p| p >= min)?;
    }
    if let Some(threshold) = args.popular_threshold {
        table = threshold_indicator(&table, POPULARITY, threshold, POPULAR)?;
    }

    let specs = args
        .formulas
        .iter()
        .map(|f| ModelSpec::parse(f, args.family.into()))
        .collect::<Result<Vec<_>, _>>()?;
    let fit_options = FitOptions {
        fit_intercept: !args.no_intercept,
        standardize: args.standardize,
        ..Default::default()
    };
    let coefficient_options = CoefficientOptions {
        exponentiate: args.exponentiate,
        confidence_level: args.level,
        order: args.order.into(),
    };

    let mut output = FitOutput {
        models: Vec::new(),
        failures: Vec::new(),
    };
    for (spec, result) in specs.iter().zip(fit_many(&table, &specs, &fit_options)) {
        let label = spec.to_string();
        let model = match result {
            Ok(model) => model,
            Err(e) => {
                eprintln!("error: {}: {}", label, e);
                output.failures.push(FitFailure {
                    model: label,
                    error: e.to_string(),
                });
                continue;
            }
        };
        let vif = if args.vif {
            match compute_vif(&model) {
                Ok(rows) => Some(rows),
                Err(e) => {
                    log::warn!("{}: no variance inflation factors: {}", label, e);
                    Some(Vec::new())
                }
            }
        } else {
            None
        };
        output.models.push(ModelReport {
            coefficients: coefficients(&model, &coefficient_options)?,
            summary: summary(&model),
            predictions: args.predictions.is_some().then(|| predictions(&model)),
            family: model.family,
            model: label,
            vif,
        });
    }

    match args.format {
        OutputFormat::Json => {
            let mut out = io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, &output)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_fit_csv(&args, &output.models, &csv)?,
    }

    if !output.failures.is_empty() {
        bail!(
            "{} of {} model(s) failed to fit",
            output.failures.len(),
            specs.len()
        );
    }
    Ok(())
}

fn write_fit_csv(args: &FitArgs, models: &[ModelReport], csv: &CsvOptions) -> Result<()> {
    let coefs: Vec<(String, Vec<CoefficientRow>)> = models
        .iter()
        .map(|m| (m.model.clone(), m.coefficients.clone()))
        .collect();
    let summaries: Vec<(String, ModelSummary)> = models
        .iter()
        .map(|m| (m.model.clone(), m.summary.clone()))
        .collect();

    let stdout = Path::new("-");
    let mut out = create_output(args.coefficients.as_deref().unwrap_or(stdout))?;
    write_coefficients(&mut out, &coefs, csv)?;
    out.flush()?;

    // Tables sharing stdout are separated by a blank line
    if args.summary.is_none() {
        println!();
    }
    let mut out = create_output(args.summary.as_deref().unwrap_or(stdout))?;
    write_summary(&mut out, &summaries, csv)?;
    out.flush()?;

    if let Some(path) = &args.predictions {
        let rows: Vec<(String, Vec<PredictionRow>)> = models
            .iter()
            .map(|m| (m.model.clone(), m.predictions.clone().unwrap_or_default()))
            .collect();
        let mut out = create_output(path)?;
        write_predictions(&mut out, &rows, csv)?;
        out.flush()?;
    }

    if args.vif {
        let rows: Vec<(String, Vec<VifRow>)> = models
            .iter()
            .map(|m| (m.model.clone(), m.vif.clone().unwrap_or_default()))
            .collect();
        println!();
        let mut out = io::stdout().lock();
        write_vif(&mut out, &rows, csv)?;
        out.flush()?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct CompareOutput {
    groups: Vec<GroupSummary>,
    welch: WelchResult,
}

fn run_compare(args: CompareArgs) -> Result<()> {
    let csv = CsvOptions::default();
    let table = prepare(load(&args.input, &analysis_schema(), &csv)?, args.recode)?;

    let groups = group_means(&table, &args.value, &args.group)?;
    let welch = welch_t_test(&table, &args.value, &args.group, args.level)?;

    let mut out = io::stdout().lock();
    match args.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &CompareOutput { groups, welch })?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut w = csv::Writer::from_writer(&mut out);
            for g in &groups {
                w.serialize(g)?;
            }
            w.flush()?;
            drop(w);
            writeln!(out)?;
            let mut w = csv::Writer::from_writer(&mut out);
            w.serialize(&welch)?;
            w.flush()?;
        }
    }
    Ok(())
}
