//! Variance inflation factor diagnostics for numeric predictors
//!
//! VIF_j = 1 / (1 - R²_j), where R²_j comes from regressing column j on all
//! other listed columns with an intercept. With the standardized correlation
//! matrix R this is the j-th diagonal entry of R⁻¹. The output is advisory
//! and never changes which predictors are fitted.

use faer::prelude::*;
use faer::linalg::solvers::Cholesky;
use faer::{Mat, Side};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::error::{ChurnError, Result};

/// Conventional rule-of-thumb cutoff, used for display only
pub const HIGH_VIF: f64 = 10.0;

/// Squared pivot below which the correlation matrix is treated as singular
const SINGULAR_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Serialize)]
pub struct VifEntry {
    pub column: String,
    /// +inf for a constant or perfectly explained column, NaN when the other
    /// columns are themselves collinear and the regression is not identified
    pub vif: f64,
}

impl VifEntry {
    pub fn r_squared(&self) -> f64 {
        if self.vif.is_infinite() {
            1.0
        } else {
            1.0 - 1.0 / self.vif
        }
    }

    pub fn is_high(&self) -> bool {
        self.vif > HIGH_VIF
    }
}

/// Standardize a column: (x - mean) / (std * sqrt(n)), so Zᵀ·Z is the
/// correlation matrix. Returns None for a constant column.
fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    let std = var.sqrt();
    if std == 0.0 || !std.is_finite() {
        return None;
    }
    Some(values.iter().map(|x| (x - mean) / (std * n.sqrt())).collect())
}

/// Cholesky of a unit-diagonal matrix, rejecting negligible pivots
fn stable_cholesky(m: &Mat<f64>) -> Option<Cholesky<f64>> {
    let chol = m.cholesky(Side::Lower).ok()?;
    let l = chol.compute_l();
    let full_rank = (0..m.nrows()).all(|j| l[(j, j)] * l[(j, j)] >= SINGULAR_TOLERANCE);
    full_rank.then_some(chol)
}

fn submatrix_without(r: &Mat<f64>, skip: usize) -> (Mat<f64>, Mat<f64>) {
    let m = r.nrows();
    let keep: Vec<usize> = (0..m).filter(|&i| i != skip).collect();
    let mut sub = Mat::<f64>::zeros(keep.len(), keep.len());
    let mut rhs = Mat::<f64>::zeros(keep.len(), 1);
    for (a, &i) in keep.iter().enumerate() {
        rhs[(a, 0)] = r[(i, skip)];
        for (b, &j) in keep.iter().enumerate() {
            sub[(a, b)] = r[(i, j)];
        }
    }
    (sub, rhs)
}

/// Compute a VIF for every listed numeric column
pub fn variance_inflation_factors(df: &DataFrame, columns: &[String]) -> Result<Vec<VifEntry>> {
    if df.height() < 2 {
        return Err(ChurnError::data(
            "at least two rows are required for collinearity diagnostics",
        ));
    }

    let mut standardized: Vec<(String, Option<Vec<f64>>)> = Vec::with_capacity(columns.len());
    for name in columns {
        let col = df
            .column(name)
            .map_err(|_| ChurnError::data(format!("Column '{}' not found for VIF", name)))?;
        let float_col = col.cast(&DataType::Float64)?;
        let values: Vec<f64> = float_col
            .f64()?
            .into_iter()
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| ChurnError::data(format!("Column '{}' has missing values", name)))?;
        standardized.push((name.clone(), standardize(&values)));
    }

    let valid: Vec<&Vec<f64>> = standardized.iter().filter_map(|(_, z)| z.as_ref()).collect();
    let m = valid.len();
    let n = df.height();

    // Build Z (n x m) and R = Zᵀ·Z
    let mut z = Mat::<f64>::zeros(n, m);
    for (j, col) in valid.iter().enumerate() {
        for (i, &v) in col.iter().enumerate() {
            z[(i, j)] = v;
        }
    }
    let r = z.transpose() * &z;

    let full = if m > 0 { stable_cholesky(&r) } else { None };
    let inverse_diagonal: Option<Vec<f64>> = full.map(|chol| {
        let inv = chol.inverse();
        (0..m).map(|j| inv[(j, j)]).collect()
    });

    let mut entries = Vec::with_capacity(columns.len());
    let mut valid_idx = 0;
    for (name, z) in &standardized {
        let vif = if z.is_none() {
            f64::INFINITY
        } else {
            let j = valid_idx;
            valid_idx += 1;
            if m == 1 {
                1.0
            } else if let Some(diag) = &inverse_diagonal {
                diag[j].max(1.0)
            } else {
                // R is singular; only identified when the other columns are independent
                match r_squared_from_correlation(&r, j) {
                    Some(r2) if 1.0 - r2 < SINGULAR_TOLERANCE => f64::INFINITY,
                    Some(r2) => 1.0 / (1.0 - r2),
                    None => f64::NAN,
                }
            }
        };
        debug!(column = %name, vif, "variance inflation factor");
        entries.push(VifEntry {
            column: name.clone(),
            vif,
        });
    }

    Ok(entries)
}

/// R² of column `target` regressed on the others, via the correlation matrix
fn r_squared_from_correlation(r: &Mat<f64>, target: usize) -> Option<f64> {
    let (others, rhs) = submatrix_without(r, target);
    let chol = stable_cholesky(&others)?;
    let beta = chol.solve(rhs.as_ref());
    Some((0..rhs.nrows()).map(|a| rhs[(a, 0)] * beta[(a, 0)]).sum())
}
