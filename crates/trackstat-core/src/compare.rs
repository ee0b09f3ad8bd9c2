//! Group summaries and two-group comparisons
//!
//! - Per-group mean, standard deviation, and count
//! - Welch two-sample t-test, delegated to anofox-tests

use crate::errors::{StatsError, StatsResult};
use crate::table::{Column, Table};
use anofox_tests::{t_test, Alternative, TTestKind};
use serde::Serialize;

/// Mean and sample standard deviation (n - 1 denominator)
///
/// The standard deviation is NaN for fewer than two values.
pub fn mean_sd(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (ss / (n - 1.0)).sqrt())
}

/// Summary of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
}

/// Welch t-test result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WelchResult {
    pub first_group: String,
    pub second_group: String,
    /// mean(second) - mean(first)
    pub difference: f64,
    pub statistic: f64,
    pub df: f64,
    pub p_value: f64,
    pub conf_low: f64,
    pub conf_high: f64,
    pub confidence_level: f64,
}

/// Values of `value` grouped by `group`, groups in first-appearance order
///
/// Rows with a missing value or group are skipped. Categorical groups list
/// every declared level that occurs, in first-appearance order as well.
fn grouped_values(
    table: &Table,
    value: &str,
    group: &str,
) -> StatsResult<Vec<(String, Vec<f64>)>> {
    let values = table.numeric(value)?;
    let groups = table.require(group)?;

    let mut out: Vec<(String, Vec<f64>)> = Vec::new();
    for (i, v) in values.iter().enumerate() {
        let Some(v) = v.filter(|x| x.is_finite()) else {
            continue;
        };
        let label = match groups {
            Column::Numeric(g) => g[i].map(|x| x.to_string()),
            Column::Text(g) => g[i].clone(),
            Column::Categorical(c) => c.label(i).map(str::to_string),
        };
        let Some(label) = label else {
            continue;
        };
        match out.iter_mut().find(|(l, _)| *l == label) {
            Some((_, bucket)) => bucket.push(v),
            None => out.push((label, vec![v])),
        }
    }
    Ok(out)
}

/// Mean, sd, and count of `value` per `group`
pub fn group_means(table: &Table, value: &str, group: &str) -> StatsResult<Vec<GroupSummary>> {
    Ok(grouped_values(table, value, group)?
        .into_iter()
        .map(|(group, values)| {
            let (mean, sd) = mean_sd(&values);
            GroupSummary {
                group,
                n: values.len(),
                mean,
                sd,
            }
        })
        .collect())
}

/// Welch two-sample t-test of `value` between the two groups of `group`
///
/// # Errors
/// `InvalidValue` unless exactly two groups occur, each with at least two
/// observations.
pub fn welch_t_test(
    table: &Table,
    value: &str,
    group: &str,
    confidence_level: f64,
) -> StatsResult<WelchResult> {
    let groups = grouped_values(table, value, group)?;
    if groups.len() != 2 {
        return Err(StatsError::InvalidValue {
            field: "group",
            message: format!("'{}' has {} groups, expected 2", group, groups.len()),
        });
    }
    for (label, values) in &groups {
        if values.len() < 2 {
            return Err(StatsError::InvalidValue {
                field: "group",
                message: format!("group '{}' has {} observation(s), need 2", label, values.len()),
            });
        }
    }

    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(StatsError::InvalidValue {
            field: "confidence_level",
            message: format!("{} is not in (0, 1)", confidence_level),
        });
    }

    let (first, a) = &groups[0];
    let (second, b) = &groups[1];
    let (mean_a, sd_a) = mean_sd(a);
    let (mean_b, sd_b) = mean_sd(b);
    if sd_a == 0.0 && sd_b == 0.0 {
        return Err(StatsError::InvalidValue {
            field: "value",
            message: format!("'{}' is constant within both groups", value),
        });
    }

    // Second group first so the statistic and interval are for mean(second) - mean(first)
    let result = t_test(
        b,
        a,
        TTestKind::Welch,
        Alternative::TwoSided,
        0.0,
        Some(confidence_level),
    )
    .map_err(convert_error)?;
    let (conf_low, conf_high) = result
        .conf_int
        .as_ref()
        .map(|ci| (ci.lower, ci.upper))
        .unwrap_or((f64::NAN, f64::NAN));

    Ok(WelchResult {
        first_group: first.clone(),
        second_group: second.clone(),
        difference: mean_b - mean_a,
        statistic: result.statistic,
        df: result.df,
        p_value: result.p_value,
        conf_low,
        conf_high,
        confidence_level,
    })
}

fn convert_error(e: anofox_tests::StatError) -> StatsError {
    StatsError::InvalidValue {
        field: "welch",
        message: e.to_string(),
    }
}
