//! Round-robin k-fold cross-validation with pooled out-of-fold metrics
//!
//! Row `i` (0-based) belongs to fold `(i mod k) + 1`. Each fold trains a fresh
//! model on the other k-1 folds and scores its own rows. Folds only read the
//! shared table, so they run in parallel; the results are reduced in fold
//! order into one pooled confusion matrix. Pooled metrics are computed once
//! over all out-of-fold predictions and are not an average of fold metrics.

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::error::{ChurnError, Result};
use super::evaluate::{
    confusion, threshold_predict, validate_threshold, ClassificationReport, ConfusionMatrix,
};
use super::model::{fit, score, target_values, ModelSpec};
use crate::utils::create_fold_bar;

pub const DEFAULT_FOLDS: usize = 5;

/// Fold id in [1, k] for every row, assigned round-robin
pub fn assign_folds(n_rows: usize, k: usize) -> Result<Vec<usize>> {
    if k < 2 {
        return Err(ChurnError::validation(format!(
            "k must be at least 2, got {}",
            k
        )));
    }
    if k > n_rows {
        return Err(ChurnError::validation(format!(
            "k ({}) cannot exceed the number of rows ({})",
            k, n_rows
        )));
    }
    Ok((0..n_rows).map(|i| (i % k) + 1).collect())
}

/// Held-out predictions of a single fold
#[derive(Debug, Clone, Serialize)]
pub struct FoldOutcome {
    pub fold: usize,
    pub train_size: usize,
    /// Original row indices of the test slice, ascending
    #[serde(skip)]
    pub test_rows: Vec<usize>,
    #[serde(skip)]
    pub actual: Vec<u8>,
    #[serde(skip)]
    pub probabilities: Vec<f64>,
    pub confusion: ConfusionMatrix,
    pub iterations: usize,
    pub converged: bool,
}

/// Concatenated out-of-fold predictions, in fold order
#[derive(Debug, Clone, Default)]
pub struct PooledPredictions {
    pub rows: Vec<usize>,
    pub actual: Vec<u8>,
    pub probabilities: Vec<f64>,
}

impl PooledPredictions {
    /// Append one fold's held-out predictions
    pub fn absorb(mut self, outcome: &FoldOutcome) -> Self {
        self.rows.extend_from_slice(&outcome.test_rows);
        self.actual.extend_from_slice(&outcome.actual);
        self.probabilities.extend_from_slice(&outcome.probabilities);
        self
    }

    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CrossValidationResult {
    pub k: usize,
    pub folds: Vec<FoldOutcome>,
    pub pooled: PooledPredictions,
    pub report: ClassificationReport,
}

impl CrossValidationResult {
    /// Out-of-fold probability for every row, in original row order
    pub fn out_of_fold_probabilities(&self) -> Vec<f64> {
        let mut out = vec![f64::NAN; self.pooled.len()];
        for (&row, &p) in self.pooled.rows.iter().zip(self.pooled.probabilities.iter()) {
            out[row] = p;
        }
        out
    }

    /// Element-wise sum of the per-fold matrices
    pub fn summed_fold_confusion(&self) -> ConfusionMatrix {
        self.folds
            .iter()
            .fold(ConfusionMatrix::default(), |acc, f| acc + f.confusion)
    }
}

fn fold_mask(folds: &[usize], fold: usize, test: bool) -> BooleanChunked {
    let mask: Vec<bool> = folds.iter().map(|&f| (f == fold) == test).collect();
    BooleanChunked::from_slice("fold_mask".into(), &mask)
}

/// Train on every fold but `fold`, score `fold`
fn run_fold(
    df: &DataFrame,
    folds: &[usize],
    fold: usize,
    spec: &ModelSpec,
    threshold: f64,
) -> Result<FoldOutcome> {
    let train = df.filter(&fold_mask(folds, fold, false))?;
    let test = df.filter(&fold_mask(folds, fold, true))?;
    let test_rows: Vec<usize> = folds
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f == fold)
        .map(|(i, _)| i)
        .collect();

    let model = fit(&train, spec)?;
    let probabilities = score(&model, &test)?;
    let actual = target_values(&test, &spec.target)?;
    let predicted = threshold_predict(&probabilities, threshold)?;
    let matrix = confusion(&actual, &predicted)?;

    debug!(
        fold,
        train = train.height(),
        test = test.height(),
        iterations = model.iterations,
        "fold scored"
    );

    Ok(FoldOutcome {
        fold,
        train_size: train.height(),
        test_rows,
        actual,
        probabilities,
        confusion: matrix,
        iterations: model.iterations,
        converged: model.converged,
    })
}

/// Run k-fold cross-validation over the full table.
///
/// Fails with the lowest-numbered fold whose training slice cannot be fitted;
/// no partial results are returned.
pub fn cross_validate(
    df: &DataFrame,
    spec: &ModelSpec,
    k: usize,
    threshold: f64,
) -> Result<CrossValidationResult> {
    validate_threshold(threshold)?;
    let folds = assign_folds(df.height(), k)?;

    let pb = create_fold_bar(k);

    let results: Vec<Result<FoldOutcome>> = (1..=k)
        .into_par_iter()
        .map(|fold| {
            let outcome = run_fold(df, &folds, fold, spec, threshold).map_err(|e| ChurnError::Fold {
                fold,
                source: Box::new(e),
            });
            pb.inc(1);
            outcome
        })
        .collect();

    pb.finish_and_clear();

    // Folds finish out of order; report failures in fold order
    let outcomes = results.into_iter().collect::<Result<Vec<_>>>()?;

    let pooled = outcomes
        .iter()
        .fold(PooledPredictions::default(), PooledPredictions::absorb);
    let report = ClassificationReport::evaluate(&pooled.actual, &pooled.probabilities, threshold)?;

    info!(k, rows = pooled.len(), "cross-validation complete");

    Ok(CrossValidationResult {
        k,
        folds: outcomes,
        pooled,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_folds_round_robin() {
        let folds = assign_folds(7, 3).unwrap();
        assert_eq!(folds, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_assign_folds_rejects_bad_k() {
        assert!(assign_folds(10, 1).unwrap_err().is_validation_error());
        assert!(assign_folds(3, 4).unwrap_err().is_validation_error());
    }

    #[test]
    fn test_fold_mask_partitions_rows() {
        let folds = assign_folds(5, 2).unwrap();
        let test = fold_mask(&folds, 2, true);
        let train = fold_mask(&folds, 2, false);
        let t: Vec<bool> = test.into_no_null_iter().collect();
        let r: Vec<bool> = train.into_no_null_iter().collect();
        assert_eq!(t, vec![false, true, false, true, false]);
        assert!(t.iter().zip(r.iter()).all(|(a, b)| a != b));
    }
}
