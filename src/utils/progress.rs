//! Spinners and the fold progress bar (indicatif)

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Spinner for a step of unknown length (loading, fitting)
pub fn create_spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .template("    {spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICKS);

    let pb = ProgressBar::new_spinner().with_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar advanced once per finished fold; folds finish out of order
pub fn create_fold_bar(folds: usize) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("    {msg} [{bar:30.cyan/blue}] {pos}/{len} folds ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");

    let pb = ProgressBar::new(folds as u64).with_style(style);
    pb.set_message("Cross-validating");
    pb
}

/// Close the fit spinner with the solver outcome
pub fn finish_fit(pb: &ProgressBar, converged: bool, iterations: usize) {
    if converged {
        pb.finish_with_message(format!("✅ IRLS converged in {} iteration(s)", iterations));
    } else {
        pb.finish_with_message(format!(
            "⚠️  IRLS stopped after {} iteration(s) without converging",
            iterations
        ));
    }
}
