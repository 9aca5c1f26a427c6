//! Command-line argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::{ImputeMethod, LabelPolicy, PipelineConfig, DEFAULT_CATEGORICAL, DEFAULT_NUMERIC};

/// churnlab - Predict customer churn with logistic regression and k-fold cross-validation
#[derive(Parser, Debug)]
#[command(name = "churnlab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target column holding the raw churn label ("Yes" means churn).
    /// If not provided, will be selected interactively from available columns
    /// (or defaults to "Churn" with --no-confirm).
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of cross-validation folds
    #[arg(short = 'k', long, default_value = "5", value_parser = validate_folds)]
    pub folds: usize,

    /// Probability threshold - predict churn when p >= threshold
    #[arg(long, default_value = "0.5", value_parser = validate_threshold)]
    pub threshold: f64,

    /// Customer identifier column copied into the predictions file
    #[arg(long, default_value = "customerID")]
    pub id_column: String,

    /// Categorical predictors (comma-separated), reference coded.
    /// Defaults to the Telco demographic, contract and bucket columns.
    #[arg(long, value_delimiter = ',')]
    pub categorical: Vec<String>,

    /// Numeric predictors (comma-separated), used as-is.
    /// Defaults to tenure, MonthlyCharges and TotalCharges.
    #[arg(long, value_delimiter = ',')]
    pub numeric: Vec<String>,

    /// Numeric columns to coerce and impute (comma-separated).
    /// Defaults to the numeric predictors.
    #[arg(long, value_delimiter = ',')]
    pub impute: Vec<String>,

    /// Imputation statistic for missing numeric cells.
    /// Options: "mean" (default) or "median"
    #[arg(long, default_value = "mean")]
    pub impute_method: String,

    /// Tenure column used for the tenure_group buckets
    #[arg(long, default_value = "tenure")]
    pub tenure_column: String,

    /// Monthly charge column used for the monthly_charge_group buckets
    #[arg(long, default_value = "MonthlyCharges")]
    pub monthly_charge_column: String,

    /// Reject target labels other than "Yes"/"No" instead of treating them as non-churn
    #[arg(long, default_value = "false")]
    pub strict_labels: bool,

    /// Directory for output artifacts. Defaults to the input file's directory.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Skip interactive prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Emit debug diagnostics on stderr
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,
}

fn or_default(values: &[String], default: &[&str]) -> Vec<String> {
    if values.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        values.to_vec()
    }
}

impl Cli {
    /// Get the output directory, deriving it from the input if not provided.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            self.input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// Resolve the run configuration for a chosen target column
    pub fn to_config(&self, target: String) -> Result<PipelineConfig, String> {
        let impute_method: ImputeMethod = self.impute_method.parse()?;
        let numeric = or_default(&self.numeric, DEFAULT_NUMERIC);
        let impute = if self.impute.is_empty() {
            numeric.clone()
        } else {
            self.impute.clone()
        };

        Ok(PipelineConfig {
            input: self.input.clone(),
            output_dir: self.output_dir(),
            target,
            id_column: Some(self.id_column.clone()),
            categorical: or_default(&self.categorical, DEFAULT_CATEGORICAL),
            numeric,
            impute,
            impute_method,
            label_policy: if self.strict_labels {
                LabelPolicy::Strict
            } else {
                LabelPolicy::Lenient
            },
            tenure_column: self.tenure_column.clone(),
            monthly_charge_column: self.monthly_charge_column.clone(),
            folds: self.folds,
            threshold: self.threshold,
            infer_schema_length: self.infer_schema_length,
        })
    }
}

/// Validator for folds parameter
fn validate_folds(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid fold count", s))?;

    if value < 2 {
        Err(format!("folds must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for threshold parameter
fn validate_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("threshold must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}
