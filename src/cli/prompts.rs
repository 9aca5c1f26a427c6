//! Interactive prompts using dialoguer

use anyhow::Result;
use dialoguer::{Confirm, Select};

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Prompt user to confirm overwriting existing output artifacts
pub fn confirm_overwrite(existing: usize) -> Result<bool> {
    let message = format!("{} output file(s) already exist. Overwrite?", existing);
    confirm_step(&message)
}

/// Let the user pick the target column, preselecting "Churn" when present
pub fn select_target_column(columns: &[String]) -> Result<String> {
    let default = columns.iter().position(|c| c == "Churn").unwrap_or(0);
    let selection = Select::new()
        .with_prompt("Select the churn label column")
        .items(columns)
        .default(default)
        .interact()?;
    Ok(columns[selection].clone())
}
