//! trackstat-core: cleaning and regression modeling for music-track tables
//!
//! This crate turns the raw multi-row-per-track dataset into a one-row-per-track
//! table, fits linear and logistic regression models over it, and extracts
//! coefficient, summary, and per-observation report views.

pub mod clean;
pub mod compare;
pub mod diagnostics;
pub mod errors;
pub mod formula;
pub mod io;
pub mod models;
pub mod report;
pub mod table;
pub mod types;

pub use errors::{StatsError, StatsResult};
pub use types::*;
