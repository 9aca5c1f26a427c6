//! Terminal summary tables for a churn run

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{ClassificationReport, Coefficient, FoldOutcome, ImputedColumn, Metric, VifEntry};

fn print_table(table: &Table) {
    // Indent the table
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn section_header(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn metric_cell(metric: Metric) -> Cell {
    let cell = Cell::new(metric.to_string()).set_alignment(CellAlignment::Right);
    if metric.is_defined() {
        cell
    } else {
        cell.fg(Color::Yellow)
    }
}

/// Imputation fills per column
pub fn display_imputation(imputed: &[ImputedColumn], coerced_to_missing: usize) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Filled").add_attribute(Attribute::Bold),
        Cell::new("Fill value").add_attribute(Attribute::Bold),
    ]);

    for entry in imputed {
        table.add_row(vec![
            Cell::new(&entry.column),
            Cell::new(entry.filled).fg(if entry.filled > 0 {
                Color::Yellow
            } else {
                Color::White
            }),
            Cell::new(format!("{:.4}", entry.fill_value)),
        ]);
    }

    print_table(&table);
    if coerced_to_missing > 0 {
        println!(
            "      {} unparseable numeric cell(s) treated as missing",
            style(coerced_to_missing).yellow()
        );
    }
}

/// Variance inflation factors
pub fn display_vif(entries: &[VifEntry]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Predictor").add_attribute(Attribute::Bold),
        Cell::new("VIF").add_attribute(Attribute::Bold),
        Cell::new("R²").add_attribute(Attribute::Bold),
    ]);

    for entry in entries {
        let vif = if entry.vif.is_nan() {
            "n/a".to_string()
        } else if entry.vif.is_infinite() {
            "inf".to_string()
        } else {
            format!("{:.2}", entry.vif)
        };
        table.add_row(vec![
            Cell::new(&entry.column),
            Cell::new(vif).fg(if entry.is_high() {
                Color::Red
            } else {
                Color::Green
            }),
            Cell::new(format!("{:.4}", entry.r_squared())),
        ]);
    }

    print_table(&table);
}

/// Fitted coefficients of the full-data model
pub fn display_coefficients(coefficients: &[Coefficient]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Term").add_attribute(Attribute::Bold),
        Cell::new("Estimate").add_attribute(Attribute::Bold),
        Cell::new("Std. Error").add_attribute(Attribute::Bold),
    ]);

    for c in coefficients {
        table.add_row(vec![
            Cell::new(&c.term),
            Cell::new(format!("{:+.4}", c.estimate)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", c.std_error)).set_alignment(CellAlignment::Right),
        ]);
    }

    print_table(&table);
}

/// Per-fold confusion counts
pub fn display_folds(folds: &[FoldOutcome]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Fold").add_attribute(Attribute::Bold),
        Cell::new("Train").add_attribute(Attribute::Bold),
        Cell::new("Test").add_attribute(Attribute::Bold),
        Cell::new("TP").add_attribute(Attribute::Bold),
        Cell::new("FP").add_attribute(Attribute::Bold),
        Cell::new("FN").add_attribute(Attribute::Bold),
        Cell::new("TN").add_attribute(Attribute::Bold),
    ]);

    for f in folds {
        table.add_row(vec![
            Cell::new(f.fold),
            Cell::new(f.train_size),
            Cell::new(f.confusion.total()),
            Cell::new(f.confusion.true_positives),
            Cell::new(f.confusion.false_positives),
            Cell::new(f.confusion.false_negatives),
            Cell::new(f.confusion.true_negatives),
        ]);
    }

    print_table(&table);
}

/// Side-by-side in-sample and pooled cross-validation metrics
pub fn display_reports(in_sample: &ClassificationReport, pooled: &ClassificationReport, k: usize) {
    section_header("📋", "CLASSIFICATION SUMMARY");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("In-sample").add_attribute(Attribute::Bold),
        Cell::new(format!("Pooled {}-fold", k)).add_attribute(Attribute::Bold),
    ]);

    let counts: [(&str, fn(&ClassificationReport) -> u64); 4] = [
        ("True positives", |r| r.confusion.true_positives),
        ("False positives", |r| r.confusion.false_positives),
        ("False negatives", |r| r.confusion.false_negatives),
        ("True negatives", |r| r.confusion.true_negatives),
    ];
    for (name, get) in counts {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(get(in_sample)).set_alignment(CellAlignment::Right),
            Cell::new(get(pooled)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.add_row(vec![
        Cell::new("Precision"),
        metric_cell(in_sample.precision),
        metric_cell(pooled.precision),
    ]);
    table.add_row(vec![
        Cell::new("Recall"),
        metric_cell(in_sample.recall),
        metric_cell(pooled.recall),
    ]);
    table.add_row(vec![
        Cell::new("F1").add_attribute(Attribute::Bold),
        metric_cell(in_sample.f1).add_attribute(Attribute::Bold),
        metric_cell(pooled.f1)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Accuracy"),
        metric_cell(in_sample.accuracy),
        metric_cell(pooled.accuracy),
    ]);
    table.add_row(vec![
        Cell::new("AUC"),
        metric_cell(in_sample.auc.map_or(Metric::Undefined, Metric::Value)),
        metric_cell(pooled.auc.map_or(Metric::Undefined, Metric::Value)),
    ]);

    print_table(&table);
    println!(
        "      {}",
        style(format!("Threshold: p ≥ {:.2} predicts churn", pooled.threshold)).dim()
    );
}
