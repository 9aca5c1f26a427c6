//! Run configuration and dataset preparation (coerce, impute, derive)

use std::path::PathBuf;

use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use super::error::{ChurnError, Result};
use super::evaluate::DEFAULT_THRESHOLD;
use super::features::{derive_features, FeatureConfig, LabelPolicy, CHURN_FLAG};
use super::cross_validation::DEFAULT_FOLDS;
use super::impute::{analyze_missing_values, impute_columns, ImputeMethod, ImputedColumn};
use super::loader::{coerce_numeric, require_columns};
use super::model::ModelSpec;

/// Telco categorical predictors used when none are given
pub const DEFAULT_CATEGORICAL: &[&str] = &[
    "gender",
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "PhoneService",
    "InternetService",
    "Contract",
    "PaperlessBilling",
    "PaymentMethod",
    "tenure_group",
    "monthly_charge_group",
];

/// Telco numeric predictors used when none are given
pub const DEFAULT_NUMERIC: &[&str] = &["tenure", "MonthlyCharges", "TotalCharges"];

/// Everything a run needs, resolved from the command line
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub target: String,
    pub id_column: Option<String>,
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    /// Numeric columns coerced to Float64 and imputed
    pub impute: Vec<String>,
    pub impute_method: ImputeMethod,
    pub label_policy: LabelPolicy,
    pub tenure_column: String,
    pub monthly_charge_column: String,
    pub folds: usize,
    pub threshold: f64,
    pub infer_schema_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_dir: PathBuf::from("."),
            target: "Churn".to_string(),
            id_column: Some("customerID".to_string()),
            categorical: DEFAULT_CATEGORICAL.iter().map(|s| s.to_string()).collect(),
            numeric: DEFAULT_NUMERIC.iter().map(|s| s.to_string()).collect(),
            impute: DEFAULT_NUMERIC.iter().map(|s| s.to_string()).collect(),
            impute_method: ImputeMethod::Mean,
            label_policy: LabelPolicy::Lenient,
            tenure_column: "tenure".to_string(),
            monthly_charge_column: "MonthlyCharges".to_string(),
            folds: DEFAULT_FOLDS,
            threshold: DEFAULT_THRESHOLD,
            infer_schema_length: 10000,
        }
    }
}

impl PipelineConfig {
    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig {
            label_column: self.target.clone(),
            tenure_column: self.tenure_column.clone(),
            monthly_charge_column: self.monthly_charge_column.clone(),
            label_policy: self.label_policy,
        }
    }

    /// Model layout over the derived `churn_flag` target
    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec::new(self.categorical.clone(), self.numeric.clone(), CHURN_FLAG)
    }
}

/// Table ready for modeling plus what happened on the way
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub frame: DataFrame,
    /// Missing ratios after numeric coercion, before imputation
    pub missing_ratios: Vec<(String, f64)>,
    pub imputed: Vec<ImputedColumn>,
    /// Cells that held text which could not be parsed as a number
    pub coerced_to_missing: usize,
}

/// Coerce and impute the numeric columns, then derive the churn features
pub fn prepare_dataset(df: &DataFrame, config: &PipelineConfig) -> Result<PreparedData> {
    if df.height() == 0 {
        return Err(ChurnError::data("dataset has no rows"));
    }

    require_columns(df, &config.impute)?;
    require_columns(df, std::slice::from_ref(&config.target))?;

    let mut frame = df.clone();
    let mut coerced_to_missing = 0;
    for column in &config.impute {
        coerced_to_missing += coerce_numeric(&mut frame, column)?;
    }

    let missing_ratios = analyze_missing_values(&frame)?;
    let (frame, imputed) = impute_columns(&frame, &config.impute, config.impute_method)?;
    let frame = derive_features(&frame, &config.feature_config())?;

    require_columns(&frame, &config.model_spec().predictors())?;

    info!(
        rows = frame.height(),
        coerced_to_missing,
        "dataset prepared"
    );

    Ok(PreparedData {
        frame,
        missing_ratios,
        imputed,
        coerced_to_missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::TENURE_GROUP;

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            categorical: vec!["Contract".to_string(), TENURE_GROUP.to_string()],
            numeric: vec!["tenure".to_string(), "TotalCharges".to_string()],
            impute: vec!["TotalCharges".to_string()],
            ..PipelineConfig::default()
        }
    }

    fn raw() -> DataFrame {
        df! {
            "customerID" => ["a", "b", "c", "d"],
            "Contract" => ["Month-to-month", "Two year", "One year", "Month-to-month"],
            "tenure" => [1i64, 0, 30, 60],
            "MonthlyCharges" => [29.85f64, 20.0, 56.95, 104.8],
            "TotalCharges" => ["29.85", " ", "1889.5", "6000"],
            "Churn" => ["Yes", "No", "No", "Yes"],
        }
        .unwrap()
    }

    #[test]
    fn test_prepare_coerces_then_imputes() {
        let prepared = prepare_dataset(&raw(), &small_config()).unwrap();

        assert_eq!(prepared.coerced_to_missing, 1);
        assert_eq!(prepared.imputed[0].filled, 1);
        let total = prepared.frame.column("TotalCharges").unwrap();
        assert_eq!(total.null_count(), 0);
        let filled = total.f64().unwrap().get(1).unwrap();
        assert!((filled - (29.85 + 1889.5 + 6000.0) / 3.0).abs() < 1e-9);
        assert_eq!(prepared.frame.height(), 4);
    }

    #[test]
    fn test_missing_ratio_reflects_coerced_blanks() {
        let prepared = prepare_dataset(&raw(), &small_config()).unwrap();
        let (name, ratio) = &prepared.missing_ratios[0];
        assert_eq!(name, "TotalCharges");
        assert!((ratio - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_model_spec_targets_churn_flag() {
        let spec = small_config().model_spec();
        assert_eq!(spec.target, CHURN_FLAG);
        assert_eq!(spec.predictors().len(), 4);
    }
}
