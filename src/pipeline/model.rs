//! Logistic regression trainer and scorer
//!
//! Fits `P(y = 1) = sigmoid(X * beta)` by iteratively reweighted least squares
//! (Newton-Raphson on the log-likelihood). The design matrix carries an
//! intercept, the numeric predictors as-is, and one indicator column per
//! non-baseline level of each categorical predictor. Levels are sorted
//! lexicographically and the first one is the baseline.

use std::collections::BTreeSet;

use faer::prelude::*;
use faer::{Mat, Side};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{ChurnError, ModelError, Result};

/// Name of the intercept term
pub const INTERCEPT: &str = "Intercept";

/// Squared pivot below which the scaled Gram matrix is treated as singular
const RANK_TOLERANCE: f64 = 1e-10;

/// Floor on the IRLS weights p(1-p) to keep the Hessian invertible
const MIN_WEIGHT: f64 = 1e-12;

const DEFAULT_MAX_ITERATIONS: usize = 25;
const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Predictor layout and solver settings for a fit
#[derive(Debug, Clone, Serialize)]
pub struct ModelSpec {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    pub target: String,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl ModelSpec {
    pub fn new(categorical: Vec<String>, numeric: Vec<String>, target: impl Into<String>) -> Self {
        Self {
            categorical,
            numeric,
            target: target.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// All predictor columns, categorical first
    pub fn predictors(&self) -> Vec<String> {
        self.categorical
            .iter()
            .chain(self.numeric.iter())
            .cloned()
            .collect()
    }
}

/// Reference coding for one categorical predictor
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalEncoding {
    pub column: String,
    pub baseline: String,
    /// Non-baseline levels, each with its own indicator column
    pub levels: Vec<String>,
}

/// One estimated coefficient
#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
}

/// Fitted logistic regression parameters
#[derive(Debug, Clone, Serialize)]
pub struct LogisticModel {
    numeric: Vec<String>,
    encodings: Vec<CategoricalEncoding>,
    terms: Vec<String>,
    beta: Vec<f64>,
    std_errors: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
    pub log_likelihood: f64,
    pub n_observations: usize,
}

impl LogisticModel {
    pub fn coefficients(&self) -> Vec<Coefficient> {
        self.terms
            .iter()
            .zip(self.beta.iter())
            .zip(self.std_errors.iter())
            .map(|((term, &estimate), &std_error)| Coefficient {
                term: term.clone(),
                estimate,
                std_error,
            })
            .collect()
    }

    pub fn encodings(&self) -> &[CategoricalEncoding] {
        &self.encodings
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn numeric_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let col = df
        .column(column)
        .map_err(|_| ChurnError::data(format!("Predictor column '{}' not found", column)))?;
    let float_col = col.cast(&DataType::Float64)?;
    float_col
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                ChurnError::data(format!(
                    "Numeric predictor '{}' is missing at row {} (impute before fitting)",
                    column, row
                ))
            })
        })
        .collect()
}

fn categorical_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let col = df
        .column(column)
        .map_err(|_| ChurnError::data(format!("Predictor column '{}' not found", column)))?;
    let string_col = col.cast(&DataType::String)?;
    string_col
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(|s| s.to_string()).ok_or_else(|| {
                ChurnError::data(format!(
                    "Categorical predictor '{}' is missing at row {}",
                    column, row
                ))
            })
        })
        .collect()
}

/// Extract a 0/1 target vector
pub fn target_values(df: &DataFrame, column: &str) -> Result<Vec<u8>> {
    numeric_values(df, column)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            if v == 0.0 {
                Ok(0)
            } else if v == 1.0 {
                Ok(1)
            } else {
                Err(ChurnError::data(format!(
                    "Target '{}' must be 0/1, found {} at row {}",
                    column, v, row
                )))
            }
        })
        .collect()
}

/// Build the design matrix for a table under a fixed encoding.
///
/// Returns the matrix and the number of cells carrying a level that the
/// encoding has never seen (those rows fall back to the baseline).
fn design_matrix(
    df: &DataFrame,
    numeric: &[String],
    encodings: &[CategoricalEncoding],
) -> Result<(Mat<f64>, usize)> {
    let n = df.height();
    let p = 1 + numeric.len() + encodings.iter().map(|e| e.levels.len()).sum::<usize>();
    let mut x = Mat::<f64>::zeros(n, p);
    let mut unseen = 0usize;

    for i in 0..n {
        x[(i, 0)] = 1.0;
    }

    let mut offset = 1;
    for column in numeric {
        for (i, v) in numeric_values(df, column)?.into_iter().enumerate() {
            x[(i, offset)] = v;
        }
        offset += 1;
    }

    for encoding in encodings {
        for (i, value) in categorical_values(df, &encoding.column)?.iter().enumerate() {
            match encoding.levels.iter().position(|level| level == value) {
                Some(j) => x[(i, offset + j)] = 1.0,
                None if *value != encoding.baseline => unseen += 1,
                None => {}
            }
        }
        offset += encoding.levels.len();
    }

    Ok((x, unseen))
}

/// Verify the columns of X are linearly independent.
///
/// Scales X^T X to unit diagonal so each squared Cholesky pivot is
/// 1 - R^2 of that column against the preceding ones.
fn check_full_rank(x: &Mat<f64>, terms: &[String]) -> Result<()> {
    let gram = x.transpose() * x;
    let p = gram.nrows();

    let mut scale = vec![0.0; p];
    for j in 0..p {
        let d = gram[(j, j)];
        if d <= 0.0 {
            return Err(ModelError::RankDeficient {
                term: terms[j].clone(),
            }
            .into());
        }
        scale[j] = 1.0 / d.sqrt();
    }

    let mut scaled = Mat::<f64>::zeros(p, p);
    for i in 0..p {
        for j in 0..p {
            scaled[(i, j)] = gram[(i, j)] * scale[i] * scale[j];
        }
    }

    // The last pivot of each leading block is the pivot of that term, so the
    // first failing block names the first dependent term.
    for size in 1..=p {
        let block = scaled.submatrix(0, 0, size, size).to_owned();
        let independent = last_squared_pivot(&block).is_some_and(|d| d >= RANK_TOLERANCE);
        if !independent {
            return Err(ModelError::RankDeficient {
                term: terms[size - 1].clone(),
            }
            .into());
        }
    }

    Ok(())
}

/// Squared last Cholesky pivot, or None when the factorization breaks down
fn last_squared_pivot(block: &Mat<f64>) -> Option<f64> {
    let n = block.nrows();
    let chol = block.cholesky(Side::Lower).ok()?;
    let l = chol.compute_l();
    Some(l[(n - 1, n - 1)] * l[(n - 1, n - 1)])
}

fn log_likelihood(y: &[u8], probabilities: &[f64]) -> f64 {
    y.iter()
        .zip(probabilities.iter())
        .map(|(&yi, &p)| {
            let p = p.clamp(1e-15, 1.0 - 1e-15);
            if yi == 1 {
                p.ln()
            } else {
                (1.0 - p).ln()
            }
        })
        .sum()
}

/// Fit a logistic regression on the training table
pub fn fit(train: &DataFrame, spec: &ModelSpec) -> Result<LogisticModel> {
    let n = train.height();
    if n == 0 {
        return Err(ModelError::EmptyTrainingSet.into());
    }

    let y = target_values(train, &spec.target)?;
    let positives = y.iter().filter(|&&v| v == 1).count();
    if positives == 0 || positives == n {
        return Err(ModelError::SingleClass {
            target: spec.target.clone(),
            value: y[0],
        }
        .into());
    }

    let mut encodings = Vec::with_capacity(spec.categorical.len());
    for column in &spec.categorical {
        let distinct: BTreeSet<String> = categorical_values(train, column)?.into_iter().collect();
        let mut levels = distinct.into_iter();
        // BTreeSet iterates in lexicographic order; the first level is the baseline
        let baseline = levels.next().unwrap_or_default();
        encodings.push(CategoricalEncoding {
            column: column.clone(),
            baseline,
            levels: levels.collect(),
        });
    }

    let mut terms = vec![INTERCEPT.to_string()];
    terms.extend(spec.numeric.iter().cloned());
    for encoding in &encodings {
        terms.extend(
            encoding
                .levels
                .iter()
                .map(|level| format!("{}={}", encoding.column, level)),
        );
    }

    let (x, _) = design_matrix(train, &spec.numeric, &encodings)?;
    check_full_rank(&x, &terms)?;

    let p = x.ncols();
    let mut beta = Mat::<f64>::zeros(p, 1);
    let mut converged = false;
    let mut iterations = 0;
    let mut hessian = Mat::<f64>::identity(p, p);

    while iterations < spec.max_iterations {
        iterations += 1;

        let eta = &x * &beta;
        let mut weighted = x.clone();
        let mut residual = Mat::<f64>::zeros(n, 1);
        for i in 0..n {
            let prob = sigmoid(eta[(i, 0)]);
            let w = (prob * (1.0 - prob)).max(MIN_WEIGHT);
            residual[(i, 0)] = f64::from(y[i]) - prob;
            for j in 0..p {
                weighted[(i, j)] *= w;
            }
        }

        hessian = x.transpose() * &weighted;
        let gradient = x.transpose() * &residual;

        let chol = hessian.cholesky(Side::Lower).map_err(|_| ModelError::RankDeficient {
            term: "information matrix".to_string(),
        })?;
        let delta = chol.solve(gradient.as_ref());

        let mut max_step = 0.0f64;
        for j in 0..p {
            beta[(j, 0)] += delta[(j, 0)];
            max_step = max_step.max(delta[(j, 0)].abs());
        }

        debug!(iteration = iterations, max_step, "irls step");
        if !max_step.is_finite() {
            break;
        }
        if max_step < spec.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            iterations,
            "logistic regression did not converge; possible quasi-complete separation"
        );
    }

    let std_errors: Vec<f64> = match hessian.cholesky(Side::Lower) {
        Ok(chol) => {
            let covariance = chol.inverse();
            (0..p).map(|j| covariance[(j, j)].max(0.0).sqrt()).collect()
        }
        Err(_) => vec![f64::NAN; p],
    };

    let model_beta: Vec<f64> = (0..p).map(|j| beta[(j, 0)]).collect();
    let probabilities: Vec<f64> = {
        let eta = &x * &beta;
        (0..n).map(|i| sigmoid(eta[(i, 0)])).collect()
    };

    Ok(LogisticModel {
        numeric: spec.numeric.clone(),
        encodings,
        terms,
        beta: model_beta,
        std_errors,
        iterations,
        converged,
        log_likelihood: log_likelihood(&y, &probabilities),
        n_observations: n,
    })
}

/// Predicted churn probabilities for every row of `table`, in row order
pub fn score(model: &LogisticModel, table: &DataFrame) -> Result<Vec<f64>> {
    let (x, unseen) = design_matrix(table, &model.numeric, &model.encodings)?;
    if unseen > 0 {
        warn!(unseen, "categorical levels not seen during fit scored as baseline");
    }

    let n = x.nrows();
    let probabilities = (0..n)
        .map(|i| {
            let eta: f64 = (0..x.ncols()).map(|j| x[(i, j)] * model.beta[j]).sum();
            sigmoid(eta)
        })
        .collect();

    Ok(probabilities)
}
