//! Command-line arguments for trackstat

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use trackstat_core::clean::CleanOptions;
use trackstat_core::{ModelFamily, TermOrder};

#[derive(Parser, Debug)]
#[command(name = "trackstat")]
#[command(version)]
#[command(
    about = "Clean music-track tables and fit regression models over them",
    long_about = None
)]
pub struct Cli {
    /// Log debug detail to stderr (otherwise RUST_LOG governs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deduplicate a raw track table to one row per track
    Clean(CleanArgs),
    /// Fit one or more regression models and report them
    Fit(FitArgs),
    /// Compare a numeric column between groups (Welch t-test)
    Compare(CompareArgs),
}

/// Grouping key for deduplication
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DedupeBy {
    /// Artist and track name
    ArtistTrack,
    /// Track identifier
    TrackId,
}

impl DedupeBy {
    pub fn options(self) -> CleanOptions {
        match self {
            DedupeBy::ArtistTrack => CleanOptions::by_artist_and_track(),
            DedupeBy::TrackId => CleanOptions::by_track_id(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Family {
    Linear,
    Logistic,
}

impl From<Family> for ModelFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::Linear => ModelFamily::Linear,
            Family::Logistic => ModelFamily::Logistic,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Order {
    Declared,
    Alphabetical,
    Statistic,
}

impl From<Order> for TermOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Declared => TermOrder::Declared,
            Order::Alphabetical => TermOrder::Alphabetical,
            Order::Statistic => TermOrder::Statistic,
        }
    }
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated tables, rounded to --precision
    Csv,
    /// One JSON document with every report
    Json,
}

/// Recoding flags shared by every subcommand
#[derive(Args, Debug, Clone, Copy)]
pub struct RecodeArgs {
    /// Recode mode 0/1 as minor/major
    #[arg(long)]
    pub recode_mode: bool,

    /// Recode key 0..11 as pitch-class names
    #[arg(long)]
    pub recode_key: bool,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Raw table path, or - for stdin
    #[arg(short, long, value_name = "PATH")]
    pub input: String,

    /// Cleaned table path, or - for stdout
    #[arg(short, long, value_name = "PATH", default_value = "-")]
    pub output: String,

    /// Columns identifying one logical track
    #[arg(long, value_enum, default_value = "artist-track")]
    pub by: DedupeBy,

    /// Keep album and playlist columns (first row's values)
    #[arg(long)]
    pub keep_extra_columns: bool,

    #[command(flatten)]
    pub recode: RecodeArgs,
}

#[derive(Args, Debug)]
pub struct FitArgs {
    /// Table path, or - for stdin
    #[arg(short, long, value_name = "PATH")]
    pub input: String,

    /// Model formula, e.g. "track_popularity ~ mode * energy" (repeatable)
    #[arg(short, long = "formula", value_name = "FORMULA", required = true)]
    pub formulas: Vec<String>,

    #[arg(long, value_enum, default_value = "linear")]
    pub family: Family,

    /// Z-score numeric columns before fitting
    #[arg(long)]
    pub standardize: bool,

    /// Fit without an intercept
    #[arg(long)]
    pub no_intercept: bool,

    /// Drop tracks with popularity below this value
    #[arg(long, value_name = "N")]
    pub min_popularity: Option<f64>,

    /// Deduplicate the input before fitting
    #[arg(long, value_enum, value_name = "BY")]
    pub dedupe: Option<DedupeBy>,

    #[command(flatten)]
    pub recode: RecodeArgs,

    /// Add a 0/1 `popular` column for popularity above this value
    #[arg(long, value_name = "T")]
    pub popular_threshold: Option<f64>,

    /// Report exp(estimate), e.g. odds ratios
    #[arg(long)]
    pub exponentiate: bool,

    /// Confidence level for coefficient intervals
    #[arg(long, value_name = "L", default_value_t = 0.95)]
    pub level: f64,

    #[arg(long, value_enum, default_value = "declared")]
    pub order: Order,

    /// Write the coefficient table here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub coefficients: Option<PathBuf>,

    /// Write the model summaries here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Write fitted values and residuals here
    #[arg(long, value_name = "PATH")]
    pub predictions: Option<PathBuf>,

    /// Report variance inflation factors
    #[arg(long)]
    pub vif: bool,

    /// Decimal places in CSV output
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub precision: usize,

    #[arg(long, value_enum, default_value = "csv")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Table path, or - for stdin
    #[arg(short, long, value_name = "PATH")]
    pub input: String,

    /// Numeric column to compare
    #[arg(long, value_name = "COLUMN", default_value = "track_popularity")]
    pub value: String,

    /// Grouping column with exactly two groups
    #[arg(long, value_name = "COLUMN", default_value = "mode")]
    pub group: String,

    /// Confidence level for the difference in means
    #[arg(long, value_name = "L", default_value_t = 0.95)]
    pub level: f64,

    #[command(flatten)]
    pub recode: RecodeArgs,

    #[arg(long, value_enum, default_value = "csv")]
    pub format: OutputFormat,
}
