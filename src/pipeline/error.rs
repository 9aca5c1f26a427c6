//! Error types for the churn pipeline.
//!
//! Every failure is fatal to the current run. The variants mirror the stages
//! that can raise them: data preparation, model fitting, input validation for
//! the evaluator, and metrics whose denominator is zero.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Result alias used throughout the pipeline modules.
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Errors raised while fitting a logistic regression model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// The training slice has no rows.
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// The target column has fewer than two distinct values in the training slice.
    #[error("target column '{target}' has a single class ({value}) in the training slice")]
    SingleClass { target: String, value: u8 },

    /// The design matrix is rank deficient (perfect collinearity).
    #[error("design matrix is rank deficient near term '{term}'")]
    RankDeficient { term: String },
}

/// Top-level pipeline error.
#[derive(Debug, Error)]
pub enum ChurnError {
    /// Malformed input or a column that cannot be repaired by imputation.
    #[error("data error: {0}")]
    Data(String),

    /// The model could not be fitted.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Invalid arguments passed to the evaluator or cross-validator.
    #[error("validation error: {0}")]
    Validation(String),

    /// A metric was required but its denominator is zero.
    #[error("metric '{metric}' is undefined (zero denominator)")]
    MetricUndefined { metric: &'static str },

    /// Fold-scoped failure during cross-validation.
    #[error("fold {fold} failed: {source}")]
    Fold {
        fold: usize,
        #[source]
        source: Box<ChurnError>,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChurnError {
    pub fn data(message: impl Into<String>) -> Self {
        ChurnError::Data(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ChurnError::Validation(message.into())
    }

    /// The innermost error, unwrapping fold context.
    pub fn root(&self) -> &ChurnError {
        match self {
            ChurnError::Fold { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_model_error(&self) -> bool {
        matches!(self.root(), ChurnError::Model(_))
    }

    pub fn is_data_error(&self) -> bool {
        matches!(self.root(), ChurnError::Data(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self.root(), ChurnError::Validation(_))
    }
}
