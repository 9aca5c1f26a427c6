//! churnlab: Churn Prediction CLI Tool
//!
//! Fits a logistic regression churn model on telecom customer records and
//! reports in-sample and pooled k-fold cross-validated classification metrics.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use churnlab::cli::{confirm_overwrite, select_target_column, Cli};
use churnlab::pipeline::{
    cross_validate, fit, get_column_names, load_dataset_with_progress, prepare_dataset, roc_curve,
    score, target_values, threshold_predict, variance_inflation_factors, ClassificationReport,
    CHURN_FLAG,
};
use churnlab::report::{
    display_coefficients, display_folds, display_imputation, display_reports, display_vif,
    export_run_report, write_predictions, write_roc_curves, OutputPaths, PredictionColumns,
    ReportParts, RunReport,
};
use churnlab::utils::{
    create_spinner, finish_fit, init_logging, print_banner,
    print_completion, print_config, print_count, print_info, print_step_header, print_step_time,
    print_success, print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine target column - from CLI, the default, or interactive selection
    let target = match (&cli.target, cli.no_confirm) {
        (Some(target), _) => target.clone(),
        (None, true) => "Churn".to_string(),
        (None, false) => {
            let columns = get_column_names(&cli.input)
                .with_context(|| format!("Failed to read columns of {}", cli.input.display()))?;
            if columns.is_empty() {
                anyhow::bail!("Input file {} has no columns", cli.input.display());
            }
            select_target_column(&columns)?
        }
    };

    let config = cli.to_config(target).map_err(|e| anyhow::anyhow!(e))?;
    let paths = OutputPaths::new(&config.output_dir, &config.input);

    let existing = [&paths.predictions, &paths.roc, &paths.report]
        .iter()
        .filter(|p| p.exists())
        .count();
    if existing > 0 && !cli.no_confirm && !confirm_overwrite(existing)? {
        println!("Cancelled by user.");
        return Ok(());
    }

    // Print styled banner
    print_banner(env!("CARGO_PKG_VERSION"));

    // Print configuration card
    print_config(
        &config.input,
        &config.target,
        &config.output_dir,
        config.folds,
        config.threshold,
    );

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let (raw, rows, cols, memory_mb) =
        load_dataset_with_progress(&config.input, config.infer_schema_length)
            .with_context(|| format!("Failed to load {}", config.input.display()))?;
    print_success("Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);
    print_step_time(step_start.elapsed());

    // Step 2: Coerce, impute, derive features
    print_step_header(2, "Imputation & Feature Derivation");
    let step_start = Instant::now();
    let prepared = prepare_dataset(&raw, &config).context("Failed to prepare dataset")?;
    display_imputation(&prepared.imputed, prepared.coerced_to_missing);

    let actual = target_values(&prepared.frame, CHURN_FLAG)?;
    let churners = actual.iter().filter(|&&v| v == 1).count();
    print_count(
        "churner(s)",
        churners,
        Some(&format!(
            "({:.1}% of {} customers)",
            100.0 * churners as f64 / actual.len() as f64,
            actual.len()
        )),
    );
    print_success("Derived churn_flag, tenure_group and monthly_charge_group");
    print_step_time(step_start.elapsed());

    // Step 3: Collinearity diagnostics (advisory only)
    print_step_header(3, "Collinearity Diagnostics");
    let step_start = Instant::now();
    let vif = variance_inflation_factors(&prepared.frame, &config.numeric)
        .context("Failed to compute variance inflation factors")?;
    display_vif(&vif);
    let high = vif.iter().filter(|v| v.is_high()).count();
    if high > 0 {
        print_warning(&format!("{} predictor(s) with VIF > 10", high));
    } else {
        print_info("No predictor exceeds VIF 10");
    }
    print_step_time(step_start.elapsed());

    // Step 4: Fit on the full table and score it
    print_step_header(4, "Logistic Regression");
    let step_start = Instant::now();
    let spec = config.model_spec();
    let spinner = create_spinner("Fitting logistic regression...");
    let model = fit(&prepared.frame, &spec).context("Failed to fit churn model")?;
    finish_fit(&spinner, model.converged, model.iterations);
    display_coefficients(&model.coefficients());

    let probabilities = score(&model, &prepared.frame)?;
    let predicted = threshold_predict(&probabilities, config.threshold)?;
    let in_sample = ClassificationReport::evaluate(&actual, &probabilities, config.threshold)?;
    print_step_time(step_start.elapsed());

    // Step 5: k-fold cross-validation
    print_step_header(5, "Cross-Validation");
    let step_start = Instant::now();
    let cv = cross_validate(&prepared.frame, &spec, config.folds, config.threshold)
        .context("Cross-validation failed")?;
    display_folds(&cv.folds);
    print_success(&format!("{} folds scored", cv.k));
    print_step_time(step_start.elapsed());

    // Step 6: Save artifacts
    print_step_header(6, "Save Results");
    let step_start = Instant::now();
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    let oof = cv.out_of_fold_probabilities();
    write_predictions(
        &prepared.frame,
        config.id_column.as_deref(),
        &PredictionColumns {
            actual: &actual,
            probability: &probabilities,
            predicted: &predicted,
            oof_probability: &oof,
        },
        &paths.predictions,
    )
    .with_context(|| format!("Failed to write {}", paths.predictions.display()))?;
    print_success(&format!("Predictions saved to {}", paths.predictions.display()));

    let in_sample_roc = roc_curve(&actual, &probabilities)?;
    let pooled_roc = roc_curve(&cv.pooled.actual, &cv.pooled.probabilities)?;
    write_roc_curves(&in_sample_roc, &pooled_roc, &paths.roc)
        .with_context(|| format!("Failed to write {}", paths.roc.display()))?;
    print_success(&format!("ROC curves saved to {}", paths.roc.display()));

    let report = RunReport::build(ReportParts {
        config: &config,
        rows,
        missing_ratios: &prepared.missing_ratios,
        imputed: &prepared.imputed,
        collinearity: &vif,
        model: &model,
        in_sample: &in_sample,
        cross_validation: &cv,
    });
    export_run_report(&report, &paths.report)
        .with_context(|| format!("Failed to write {}", paths.report.display()))?;
    print_success(&format!("Report saved to {}", paths.report.display()));
    print_step_time(step_start.elapsed());

    // Display summary
    display_reports(&in_sample, &cv.report, cv.k);

    // Final completion message
    print_completion();

    Ok(())
}
