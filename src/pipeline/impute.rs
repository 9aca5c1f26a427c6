//! Missing value analysis and single imputation

use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::error::{ChurnError, Result};

/// Statistic used to fill missing numeric cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ImputeMethod {
    /// Column mean of the observed values (default)
    #[default]
    Mean,
    /// Column median of the observed values
    Median,
}

impl std::fmt::Display for ImputeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImputeMethod::Mean => write!(f, "mean"),
            ImputeMethod::Median => write!(f, "median"),
        }
    }
}

impl std::str::FromStr for ImputeMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(ImputeMethod::Mean),
            "median" => Ok(ImputeMethod::Median),
            _ => Err(format!("Unknown imputation method: '{}'. Use 'mean' or 'median'.", s)),
        }
    }
}

/// Fill value and count for one imputed column
#[derive(Debug, Clone, Serialize)]
pub struct ImputedColumn {
    pub column: String,
    pub filled: usize,
    pub fill_value: f64,
}

/// Analyze missing values in the dataset.
///
/// Returns `(column, null_count / row_count)` pairs sorted by ratio descending.
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    // Handle empty DataFrame
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let rows = df.height() as f64;
    let mut missing_ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count() as f64 / rows))
        .collect();

    // Sort by missing ratio descending
    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(missing_ratios)
}

/// Fill missing values in the named numeric columns.
///
/// Targeted columns come back as Float64 with no nulls. All other columns,
/// the row count and the row order are untouched. A column with no observed
/// values cannot be imputed and fails with a data error.
pub fn impute_columns(
    df: &DataFrame,
    columns: &[String],
    method: ImputeMethod,
) -> Result<(DataFrame, Vec<ImputedColumn>)> {
    let mut out = df.clone();
    let mut summary = Vec::with_capacity(columns.len());

    for name in columns {
        let col = df
            .column(name)
            .map_err(|_| ChurnError::data(format!("Column '{}' not found for imputation", name)))?;

        let float_col = col.cast(&DataType::Float64)?;
        let ca = float_col.f64()?;
        let missing = ca.null_count();

        if df.height() > 0 && missing == df.height() {
            return Err(ChurnError::data(format!(
                "Column '{}' is entirely missing - nothing to impute from",
                name
            )));
        }

        let fill_value = match method {
            ImputeMethod::Mean => ca.mean(),
            ImputeMethod::Median => ca.median(),
        }
        .unwrap_or(0.0);

        let filled: Float64Chunked = ca
            .into_iter()
            .map(|v| Some(v.unwrap_or(fill_value)))
            .collect();
        out.with_column(filled.with_name(name.as_str().into()).into_column())?;

        debug!(column = %name, missing, fill_value, %method, "imputed column");
        summary.push(ImputedColumn {
            column: name.clone(),
            filled: missing,
            fill_value,
        });
    }

    Ok((out, summary))
}
