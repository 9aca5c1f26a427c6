//! Tests for variance inflation factor diagnostics

use churnlab::pipeline::{variance_inflation_factors, HIGH_VIF};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_uncorrelated_columns_have_vif_near_one() {
    // Orthogonal after centering
    let df = df! {
        "a" => [1.0f64, -1.0, 1.0, -1.0],
        "b" => [1.0f64, 1.0, -1.0, -1.0],
    }
    .unwrap();

    let entries = variance_inflation_factors(&df, &names(&["a", "b"])).unwrap();

    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_close(entry.vif, 1.0, 1e-9);
        assert!(!entry.is_high());
    }
}

#[test]
fn test_two_columns_vif_matches_correlation() {
    // corr(a, b) = 0.6 by construction
    let df = df! {
        "a" => [1.0f64, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
        "b" => [1.0f64, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0],
    }
    .unwrap();

    let entries = variance_inflation_factors(&df, &names(&["a", "b"])).unwrap();

    let expected = 1.0 / (1.0 - 0.6 * 0.6);
    assert_close(entries[0].vif, expected, 1e-9);
    assert_close(entries[1].vif, expected, 1e-9);
    assert_close(entries[0].r_squared(), 0.36, 1e-9);
}

#[test]
fn test_exact_collinear_pair_is_infinite() {
    let df = df! {
        "MonthlyCharges" => [20.0f64, 45.5, 70.0, 99.9, 30.25],
        "DoubleCharges" => [40.0f64, 91.0, 140.0, 199.8, 60.5],
    }
    .unwrap();

    let entries =
        variance_inflation_factors(&df, &names(&["MonthlyCharges", "DoubleCharges"])).unwrap();

    assert!(entries.iter().all(|e| e.vif.is_infinite()));
    assert!(entries.iter().all(|e| e.is_high()));
}

#[test]
fn test_collinear_pair_does_not_poison_independent_regressors() {
    let df = df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.0],
        "c" => [5.0f64, 1.0, 4.0, 2.0, 6.0, 3.0],
    }
    .unwrap();

    let entries = variance_inflation_factors(&df, &names(&["a", "b", "c"])).unwrap();

    assert!(entries[0].vif.is_infinite());
    assert!(entries[1].vif.is_infinite());
    // c regresses on a and b, which are themselves collinear
    assert!(entries[2].vif.is_nan());
}

#[test]
fn test_constant_column_is_infinite_and_skipped() {
    let df = df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0],
        "flat" => [9.0f64; 4],
        "b" => [1.0f64, -1.0, 1.0, -1.0],
    }
    .unwrap();

    let entries = variance_inflation_factors(&df, &names(&["a", "flat", "b"])).unwrap();

    assert!(entries[1].vif.is_infinite());
    assert!(entries[0].vif.is_finite());
    assert!(entries[2].vif.is_finite());
}

#[test]
fn test_generated_telco_charges_are_flagged() {
    let mut df = create_telco_dataframe(300, 11);
    // TotalCharges ~ tenure * MonthlyCharges; parse it for the diagnostic
    churnlab::pipeline::coerce_numeric(&mut df, "TotalCharges").unwrap();
    let (df, _) = churnlab::pipeline::impute_columns(
        &df,
        &names(&["TotalCharges"]),
        churnlab::pipeline::ImputeMethod::Mean,
    )
    .unwrap();

    let entries =
        variance_inflation_factors(&df, &names(&["tenure", "MonthlyCharges", "TotalCharges"]))
            .unwrap();

    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.vif >= 1.0));
    assert!(entries.iter().all(|e| e.vif < HIGH_VIF * 100.0));
}

#[test]
fn test_single_row_is_data_error() {
    let df = df! { "a" => [1.0f64], "b" => [2.0f64] }.unwrap();
    assert!(variance_inflation_factors(&df, &names(&["a", "b"]))
        .unwrap_err()
        .is_data_error());
}
