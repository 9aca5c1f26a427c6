//! Shared test utilities and fixture generators
#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

const INTERNET: [&str; 3] = ["DSL", "Fiber optic", "No"];
const CONTRACT: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const PAYMENT: [&str; 4] = [
    "Bank transfer (automatic)",
    "Credit card (automatic)",
    "Electronic check",
    "Mailed check",
];

fn yes_no(rng: &mut StdRng, p_yes: f64) -> &'static str {
    if rng.gen::<f64>() < p_yes {
        "Yes"
    } else {
        "No"
    }
}

/// Create a synthetic Telco-style customer table
///
/// Columns mirror the public Telco churn extract:
/// - `customerID`, demographic and contract categoricals
/// - `tenure` (integer months), `MonthlyCharges` (float)
/// - `TotalCharges` as text, blank (" ") for every customer with zero tenure
/// - `Churn` as "Yes"/"No", more likely for short tenure and month-to-month contracts
pub fn create_telco_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut ids = Vec::with_capacity(rows);
    let mut gender = Vec::with_capacity(rows);
    let mut senior = Vec::with_capacity(rows);
    let mut partner = Vec::with_capacity(rows);
    let mut dependents = Vec::with_capacity(rows);
    let mut phone = Vec::with_capacity(rows);
    let mut internet = Vec::with_capacity(rows);
    let mut contract = Vec::with_capacity(rows);
    let mut paperless = Vec::with_capacity(rows);
    let mut payment = Vec::with_capacity(rows);
    let mut tenure = Vec::with_capacity(rows);
    let mut monthly = Vec::with_capacity(rows);
    let mut total = Vec::with_capacity(rows);
    let mut churn = Vec::with_capacity(rows);

    for i in 0..rows {
        let t: i64 = if i % 50 == 7 { 0 } else { rng.gen_range(1..=72) };
        let m: f64 = (rng.gen_range(18.25..118.75_f64) * 100.0).round() / 100.0;
        let c = CONTRACT[rng.gen_range(0..CONTRACT.len())];

        let logit = 0.5 - 0.05 * t as f64 + 0.02 * (m - 65.0)
            + if c == "Month-to-month" { 1.0 } else { -0.5 };
        let p = 1.0 / (1.0 + (-logit).exp());

        ids.push(format!("{:04}-TEST", i));
        gender.push(if rng.gen::<bool>() { "Female" } else { "Male" });
        senior.push(i64::from(rng.gen::<f64>() < 0.2));
        partner.push(yes_no(&mut rng, 0.5));
        dependents.push(yes_no(&mut rng, 0.3));
        phone.push(yes_no(&mut rng, 0.9));
        internet.push(INTERNET[rng.gen_range(0..INTERNET.len())]);
        contract.push(c);
        paperless.push(yes_no(&mut rng, 0.6));
        payment.push(PAYMENT[rng.gen_range(0..PAYMENT.len())]);
        tenure.push(t);
        monthly.push(m);
        total.push(if t == 0 {
            " ".to_string()
        } else {
            format!("{:.2}", t as f64 * m * rng.gen_range(0.9..1.1))
        });
        churn.push(yes_no(&mut rng, p));
    }

    df! {
        "customerID" => ids,
        "gender" => gender,
        "SeniorCitizen" => senior,
        "Partner" => partner,
        "Dependents" => dependents,
        "PhoneService" => phone,
        "InternetService" => internet,
        "Contract" => contract,
        "PaperlessBilling" => paperless,
        "PaymentMethod" => payment,
        "tenure" => tenure,
        "MonthlyCharges" => monthly,
        "TotalCharges" => total,
        "Churn" => churn,
    }
    .unwrap()
}

/// Create a small modeling table with an already binary target
///
/// Both classes appear at least twice in each `plan` level of every
/// training slice for k = 2..=5, so every fold fit converges.
pub fn create_overlapping_dataframe() -> DataFrame {
    df! {
        "churn_flag" => [0i32, 0, 1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0, 0, 1],
        "x" => [1.0f64, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 2.2, 6.0,
                1.8, 5.5, 1.2, 4.8, 3.1, 2.9, 5.9, 2.4, 3.6, 4.1],
        "plan" => ["b", "b", "a", "b", "b", "b", "a", "a", "a", "b",
                   "a", "a", "a", "b", "b", "a", "b", "a", "b", "a"],
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert two floats agree to within `tol`
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {} ± {}, got {}",
        expected,
        tol,
        actual
    );
}
