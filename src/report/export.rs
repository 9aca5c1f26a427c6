//! Output artifacts: predictions CSV, ROC CSV and the JSON run report

use std::path::{Path, PathBuf};

use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{
    ChurnError, ClassificationReport, Coefficient, CrossValidationResult, FoldOutcome,
    ImputedColumn, LogisticModel, PipelineConfig, Result, RocCurve, VifEntry,
};

/// Where each artifact of a run is written
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub predictions: PathBuf,
    pub roc: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    /// Derive artifact names from the input file stem
    pub fn new(output_dir: &Path, input: &Path) -> Self {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("churn");
        Self {
            predictions: output_dir.join(format!("{}_predictions.csv", stem)),
            roc: output_dir.join(format!("{}_roc.csv", stem)),
            report: output_dir.join(format!("{}_churn_report.json", stem)),
        }
    }
}

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub churnlab_version: String,
    pub input_file: String,
    pub rows: usize,
}

#[derive(Serialize)]
pub struct ModelSummary {
    pub coefficients: Vec<Coefficient>,
    pub iterations: usize,
    pub converged: bool,
    pub log_likelihood: f64,
    pub n_observations: usize,
}

impl From<&LogisticModel> for ModelSummary {
    fn from(model: &LogisticModel) -> Self {
        Self {
            coefficients: model.coefficients(),
            iterations: model.iterations,
            converged: model.converged,
            log_likelihood: model.log_likelihood,
            n_observations: model.n_observations,
        }
    }
}

#[derive(Serialize)]
pub struct CrossValidationSummary {
    pub k: usize,
    pub pooled: ClassificationReport,
    pub folds: Vec<FoldOutcome>,
}

impl From<&CrossValidationResult> for CrossValidationSummary {
    fn from(cv: &CrossValidationResult) -> Self {
        Self {
            k: cv.k,
            pooled: cv.report.clone(),
            folds: cv.folds.clone(),
        }
    }
}

/// Complete run report
#[derive(Serialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub config: PipelineConfig,
    pub missing_ratios: Vec<(String, f64)>,
    pub imputed: Vec<ImputedColumn>,
    pub collinearity: Vec<VifEntry>,
    pub model: ModelSummary,
    pub in_sample: ClassificationReport,
    pub cross_validation: CrossValidationSummary,
}

/// Inputs gathered by the binary for one report
pub struct ReportParts<'a> {
    pub config: &'a PipelineConfig,
    pub rows: usize,
    pub missing_ratios: &'a [(String, f64)],
    pub imputed: &'a [ImputedColumn],
    pub collinearity: &'a [VifEntry],
    pub model: &'a LogisticModel,
    pub in_sample: &'a ClassificationReport,
    pub cross_validation: &'a CrossValidationResult,
}

impl RunReport {
    pub fn build(parts: ReportParts<'_>) -> Self {
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                churnlab_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: parts.config.input.display().to_string(),
                rows: parts.rows,
            },
            config: parts.config.clone(),
            missing_ratios: parts.missing_ratios.to_vec(),
            imputed: parts.imputed.to_vec(),
            collinearity: parts.collinearity.to_vec(),
            model: ModelSummary::from(parts.model),
            in_sample: parts.in_sample.clone(),
            cross_validation: CrossValidationSummary::from(parts.cross_validation),
        }
    }
}

/// Write the run report as pretty-printed JSON
pub fn export_run_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| ChurnError::data(format!("Failed to serialize run report: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Per-row predictions for the predictions CSV
pub struct PredictionColumns<'a> {
    pub actual: &'a [u8],
    pub probability: &'a [f64],
    pub predicted: &'a [u8],
    pub oof_probability: &'a [f64],
}

/// Write one row per customer: id (when present), churn_flag, in-sample
/// probability and class, and the out-of-fold probability
pub fn write_predictions(
    frame: &DataFrame,
    id_column: Option<&str>,
    predictions: &PredictionColumns<'_>,
    path: &Path,
) -> Result<()> {
    let n = frame.height();
    if predictions.actual.len() != n
        || predictions.probability.len() != n
        || predictions.predicted.len() != n
        || predictions.oof_probability.len() != n
    {
        return Err(ChurnError::validation(
            "prediction columns must have one entry per row",
        ));
    }

    let mut columns: Vec<Column> = Vec::with_capacity(5);
    if let Some(id) = id_column {
        if let Ok(col) = frame.column(id) {
            columns.push(col.clone());
        }
    }
    columns.push(Column::new(
        "churn_flag".into(),
        predictions.actual.iter().map(|&v| i32::from(v)).collect::<Vec<i32>>(),
    ));
    columns.push(Column::new("probability".into(), predictions.probability));
    columns.push(Column::new(
        "predicted".into(),
        predictions.predicted.iter().map(|&v| i32::from(v)).collect::<Vec<i32>>(),
    ));
    columns.push(Column::new("oof_probability".into(), predictions.oof_probability));

    let mut out = DataFrame::new(columns)?;
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(&mut out)?;
    Ok(())
}

/// Write both ROC curves into one long-format CSV
pub fn write_roc_curves(in_sample: &RocCurve, pooled: &RocCurve, path: &Path) -> Result<()> {
    let mut curve: Vec<&str> = Vec::new();
    let mut threshold: Vec<f64> = Vec::new();
    let mut fpr: Vec<f64> = Vec::new();
    let mut tpr: Vec<f64> = Vec::new();

    for (name, roc) in [("in_sample", in_sample), ("cross_validation", pooled)] {
        for point in &roc.points {
            curve.push(name);
            threshold.push(point.threshold);
            fpr.push(point.false_positive_rate);
            tpr.push(point.true_positive_rate);
        }
    }

    let mut out = DataFrame::new(vec![
        Column::new("curve".into(), curve),
        Column::new("threshold".into(), threshold),
        Column::new("false_positive_rate".into(), fpr),
        Column::new("true_positive_rate".into(), tpr),
    ])?;
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(&mut out)?;
    Ok(())
}
