//! Dataset loader for CSV and Parquet files

use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use super::error::{ChurnError, Result};
use crate::utils::create_spinner;

/// Build a LazyFrame for a file (CSV or Parquet based on extension)
fn scan_dataset(path: &Path, infer_schema_length: usize) -> Result<LazyFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    // 0 means full table scan
    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .finish()?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?,
        _ => {
            return Err(ChurnError::data(format!(
                "Unsupported file format: '{}'. Supported formats: csv, parquet",
                extension
            )))
        }
    };

    Ok(lf)
}

/// Load a dataset into memory.
///
/// Returns the DataFrame together with its row count, column count and
/// estimated size in megabytes.
pub fn load_dataset_with_progress(
    path: &Path,
    infer_schema_length: usize,
) -> Result<(DataFrame, usize, usize, f64)> {
    if !path.exists() {
        return Err(ChurnError::data(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let spinner = create_spinner(&format!("Loading {}...", path.display()));
    let df = scan_dataset(path, infer_schema_length)?.collect()?;
    spinner.finish_and_clear();

    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    info!(rows, cols, path = %path.display(), "dataset loaded");

    Ok((df, rows, cols, memory_mb))
}

/// Read column names without materializing the data
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let mut lf = scan_dataset(path, 100)?;
    let schema = lf.collect_schema()?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

/// Coerce a column to Float64 in place.
///
/// String cells are trimmed and parsed; anything that fails to parse
/// (including blanks) becomes null so the imputer can fill it later.
/// Returns the number of cells that were non-null before coercion but null after.
pub fn coerce_numeric(df: &mut DataFrame, column: &str) -> Result<usize> {
    let col = df
        .column(column)
        .map_err(|_| ChurnError::data(format!("Column '{}' not found in dataset", column)))?;
    let before_nulls = col.null_count();

    let coerced: Float64Chunked = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect(),
        dtype if dtype.is_primitive_numeric() => col.cast(&DataType::Float64)?.f64()?.clone(),
        other => {
            return Err(ChurnError::data(format!(
                "Column '{}' has type {:?} and cannot be coerced to a number",
                column, other
            )))
        }
    };

    let failed = coerced.null_count().saturating_sub(before_nulls);
    if failed > 0 {
        debug!(column, failed, "unparseable cells coerced to missing");
    }

    df.with_column(coerced.with_name(column.into()).into_column())?;
    Ok(failed)
}

/// Ensure every named column exists in the DataFrame
pub fn require_columns(df: &DataFrame, columns: &[String]) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let missing: Vec<&String> = columns.iter().filter(|c| !present.contains(c)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChurnError::data(format!(
            "Column(s) {:?} not found in dataset. Available columns: {:?}",
            missing, present
        )))
    }
}
