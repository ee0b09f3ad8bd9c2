//! Sampling distributions for coefficient tests and intervals

use crate::errors::{StatsError, StatsResult};
use crate::types::StatisticKind;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

fn distribution_error(e: impl std::fmt::Display) -> StatsError {
    StatsError::InvalidValue {
        field: "distribution",
        message: e.to_string(),
    }
}

/// Two-sided p-value of a t (with `df`) or z statistic
pub(crate) fn two_sided_p_value(
    kind: StatisticKind,
    df: usize,
    statistic: f64,
) -> StatsResult<f64> {
    if statistic.is_nan() {
        return Ok(f64::NAN);
    }
    let tail = match kind {
        StatisticKind::T => StudentsT::new(0.0, 1.0, df as f64)
            .map_err(distribution_error)?
            .sf(statistic.abs()),
        StatisticKind::Z => Normal::new(0.0, 1.0)
            .map_err(distribution_error)?
            .sf(statistic.abs()),
    };
    Ok((2.0 * tail).min(1.0))
}

/// Critical value for a two-sided interval at `confidence_level`
pub(crate) fn critical_value(
    kind: StatisticKind,
    df: usize,
    confidence_level: f64,
) -> StatsResult<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(StatsError::InvalidValue {
            field: "confidence_level",
            message: format!("{} is not in (0, 1)", confidence_level),
        });
    }
    let q = 1.0 - (1.0 - confidence_level) / 2.0;
    Ok(match kind {
        StatisticKind::T => StudentsT::new(0.0, 1.0, df as f64)
            .map_err(distribution_error)?
            .inverse_cdf(q),
        StatisticKind::Z => Normal::new(0.0, 1.0)
            .map_err(distribution_error)?
            .inverse_cdf(q),
    })
}

/// Upper-tail p-value of an F statistic
pub(crate) fn f_p_value(statistic: f64, df1: usize, df2: usize) -> StatsResult<f64> {
    Ok(FisherSnedecor::new(df1 as f64, df2 as f64)
        .map_err(distribution_error)?
        .sf(statistic))
}
