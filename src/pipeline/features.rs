//! Derived features: binary churn target and tenure / charge buckets.
//!
//! The row-level functions are pure and total. `derive_features` applies them
//! column-wise and appends `churn_flag`, `tenure_group` and
//! `monthly_charge_group` to the table.

use polars::prelude::*;
use serde::Serialize;

use super::error::{ChurnError, Result};

pub const CHURN_FLAG: &str = "churn_flag";
pub const TENURE_GROUP: &str = "tenure_group";
pub const MONTHLY_CHARGE_GROUP: &str = "monthly_charge_group";

/// The label value that maps to churn_flag = 1
pub const EVENT_LABEL: &str = "Yes";
/// The only other label accepted under the strict policy
pub const NON_EVENT_LABEL: &str = "No";

/// How labels other than "Yes" are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LabelPolicy {
    /// Anything other than "Yes" (including empty and null) is non-churn
    #[default]
    Lenient,
    /// Only "Yes" and "No" are accepted; anything else is a data error
    Strict,
}

/// Tenure bucket: [0,12), [12,24), [24,48), [48,inf)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TenureGroup {
    UpTo12,
    From12To24,
    From24To48,
    Over48,
}

impl TenureGroup {
    pub fn label(&self) -> &'static str {
        match self {
            TenureGroup::UpTo12 => "0-12 mo",
            TenureGroup::From12To24 => "12-24 mo",
            TenureGroup::From24To48 => "24-48 mo",
            TenureGroup::Over48 => "48+ mo",
        }
    }
}

/// Monthly charge bucket: <35, [35,70), >=70
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ChargeGroup {
    Low,
    Medium,
    High,
}

impl ChargeGroup {
    pub fn label(&self) -> &'static str {
        match self {
            ChargeGroup::Low => "Low",
            ChargeGroup::Medium => "Medium",
            ChargeGroup::High => "High",
        }
    }
}

/// 1 iff the label is exactly "Yes" (case-sensitive)
pub fn churn_flag(label: Option<&str>) -> u8 {
    match label {
        Some(EVENT_LABEL) => 1,
        _ => 0,
    }
}

pub fn tenure_group(tenure: f64) -> TenureGroup {
    if tenure < 12.0 {
        TenureGroup::UpTo12
    } else if tenure < 24.0 {
        TenureGroup::From12To24
    } else if tenure < 48.0 {
        TenureGroup::From24To48
    } else {
        TenureGroup::Over48
    }
}

pub fn monthly_charge_group(charge: f64) -> ChargeGroup {
    if charge < 35.0 {
        ChargeGroup::Low
    } else if charge < 70.0 {
        ChargeGroup::Medium
    } else {
        ChargeGroup::High
    }
}

/// Source columns for the derived features
#[derive(Debug, Clone, Serialize)]
pub struct FeatureConfig {
    pub label_column: String,
    pub tenure_column: String,
    pub monthly_charge_column: String,
    pub label_policy: LabelPolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            label_column: "Churn".to_string(),
            tenure_column: "tenure".to_string(),
            monthly_charge_column: "MonthlyCharges".to_string(),
            label_policy: LabelPolicy::Lenient,
        }
    }
}

/// Compute churn flags for a label column under the given policy
pub fn churn_flags(col: &Column, policy: LabelPolicy) -> Result<Vec<u8>> {
    let labels = col.cast(&DataType::String)?;
    let ca = labels.str()?;

    let mut flags = Vec::with_capacity(ca.len());
    for (row, label) in ca.into_iter().enumerate() {
        if policy == LabelPolicy::Strict && !matches!(label, Some(EVENT_LABEL) | Some(NON_EVENT_LABEL)) {
            return Err(ChurnError::data(format!(
                "Unrecognized churn label {:?} in column '{}' at row {} (expected \"{}\" or \"{}\")",
                label.unwrap_or("<null>"),
                col.name(),
                row,
                EVENT_LABEL,
                NON_EVENT_LABEL
            )));
        }
        flags.push(churn_flag(label));
    }

    Ok(flags)
}

fn bucket_column<F>(df: &DataFrame, source: &str, output: &str, bucket: F) -> Result<Column>
where
    F: Fn(f64) -> &'static str,
{
    let col = df
        .column(source)
        .map_err(|_| ChurnError::data(format!("Column '{}' not found in dataset", source)))?;
    let float_col = col.cast(&DataType::Float64)?;
    let labels: StringChunked = float_col
        .f64()?
        .into_iter()
        .map(|v| v.map(&bucket))
        .collect();
    Ok(labels.with_name(output.into()).into_column())
}

/// Append `churn_flag`, `tenure_group` and `monthly_charge_group` to the table
pub fn derive_features(df: &DataFrame, config: &FeatureConfig) -> Result<DataFrame> {
    let label_col = df.column(&config.label_column).map_err(|_| {
        ChurnError::data(format!(
            "Target column '{}' not found in dataset",
            config.label_column
        ))
    })?;

    let flags: Vec<i32> = churn_flags(label_col, config.label_policy)?
        .into_iter()
        .map(i32::from)
        .collect();

    let mut out = df.clone();
    out.with_column(Column::new(CHURN_FLAG.into(), flags))?;
    out.with_column(bucket_column(
        df,
        &config.tenure_column,
        TENURE_GROUP,
        |t| tenure_group(t).label(),
    )?)?;
    out.with_column(bucket_column(
        df,
        &config.monthly_charge_column,
        MONTHLY_CHARGE_GROUP,
        |c| monthly_charge_group(c).label(),
    )?)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_churn_flag_exact_match() {
        assert_eq!(churn_flag(Some("Yes")), 1);
        assert_eq!(churn_flag(Some("No")), 0);
        assert_eq!(churn_flag(Some("yes")), 0);
        assert_eq!(churn_flag(Some("Yes ")), 0);
        assert_eq!(churn_flag(Some("")), 0);
        assert_eq!(churn_flag(None), 0);
    }

    #[test]
    fn test_tenure_boundaries() {
        assert_eq!(tenure_group(0.0), TenureGroup::UpTo12);
        assert_eq!(tenure_group(11.99), TenureGroup::UpTo12);
        assert_eq!(tenure_group(12.0).label(), "12-24 mo");
        assert_eq!(tenure_group(24.0), TenureGroup::From24To48);
        assert_eq!(tenure_group(47.9).label(), "24-48 mo");
        assert_eq!(tenure_group(48.0), TenureGroup::Over48);
        assert_eq!(tenure_group(720.0), TenureGroup::Over48);
    }

    #[test]
    fn test_charge_boundaries() {
        assert_eq!(monthly_charge_group(18.25), ChargeGroup::Low);
        assert_eq!(monthly_charge_group(35.0), ChargeGroup::Medium);
        assert_eq!(monthly_charge_group(69.99), ChargeGroup::Medium);
        assert_eq!(monthly_charge_group(70.0).label(), "High");
    }

    #[test]
    fn test_strict_policy_rejects_unknown_label() {
        let col = Column::new("Churn".into(), ["Yes", "No", "Maybe"]);
        let err = churn_flags(&col, LabelPolicy::Strict).unwrap_err();
        assert!(err.is_data_error());
        assert!(err.to_string().contains("row 2"));

        let flags = churn_flags(&col, LabelPolicy::Lenient).unwrap();
        assert_eq!(flags, vec![1, 0, 0]);
    }
}
