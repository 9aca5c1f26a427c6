//! Tests for the logistic regression trainer and scorer

use churnlab::pipeline::{fit, score, ChurnError, ModelError, ModelSpec, INTERCEPT};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn spec() -> ModelSpec {
    ModelSpec::new(vec!["plan".into()], vec!["x".into()], "churn_flag")
}

#[test]
fn test_fit_converges_on_overlapping_classes() {
    let df = create_overlapping_dataframe();

    let model = fit(&df, &spec()).unwrap();

    assert!(model.converged);
    assert!(model.iterations <= 25);
    assert_eq!(model.n_observations, 20);
    assert!(model.log_likelihood < 0.0);

    let coefficients = model.coefficients();
    assert_eq!(coefficients.len(), 3);
    assert_eq!(coefficients[0].term, INTERCEPT);
    assert!(coefficients.iter().all(|c| c.estimate.is_finite()));
    assert!(coefficients.iter().all(|c| c.std_error > 0.0));
}

#[test]
fn test_probabilities_in_unit_interval_and_row_aligned() {
    let df = create_overlapping_dataframe();
    let model = fit(&df, &spec()).unwrap();

    let probs = score(&model, &df).unwrap();

    assert_eq!(probs.len(), df.height());
    assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));

    // Scoring a reversed table yields the reversed probabilities
    let reversed = df.reverse();
    let reversed_probs = score(&model, &reversed).unwrap();
    let mut expected = probs.clone();
    expected.reverse();
    for (a, b) in reversed_probs.iter().zip(expected.iter()) {
        assert_close(*a, *b, 1e-12);
    }
}

#[test]
fn test_intercept_only_model_matches_base_rate() {
    let df = create_overlapping_dataframe();
    let model = fit(&df, &ModelSpec::new(vec![], vec![], "churn_flag")).unwrap();

    let probs = score(&model, &df).unwrap();

    // 10 churners out of 20
    assert!(probs.iter().all(|p| (p - 0.5).abs() < 1e-6));
}

#[test]
fn test_single_class_training_set_is_model_error() {
    let df = df! {
        "churn_flag" => [0i32, 0, 0, 0],
        "x" => [1.0f64, 2.0, 3.0, 4.0],
    }
    .unwrap();

    let err = fit(&df, &ModelSpec::new(vec![], vec!["x".into()], "churn_flag")).unwrap_err();

    assert!(err.is_model_error());
    assert!(matches!(
        err,
        ChurnError::Model(ModelError::SingleClass { value: 0, .. })
    ));
}

#[test]
fn test_empty_training_set_is_model_error() {
    let df = create_overlapping_dataframe().head(Some(0));

    let err = fit(&df, &spec()).unwrap_err();

    assert!(matches!(err, ChurnError::Model(ModelError::EmptyTrainingSet)));
}

#[test]
fn test_duplicated_predictor_is_rank_deficient() {
    let mut df = create_overlapping_dataframe();
    let copy = df.column("x").unwrap().clone().with_name("x_copy".into());
    df.with_column(copy).unwrap();

    let err = fit(
        &df,
        &ModelSpec::new(vec![], vec!["x".into(), "x_copy".into()], "churn_flag"),
    )
    .unwrap_err();

    assert!(err.is_model_error());
    match err {
        ChurnError::Model(ModelError::RankDeficient { term }) => assert_eq!(term, "x_copy"),
        other => panic!("expected RankDeficient, got {:?}", other),
    }
}

#[test]
fn test_constant_predictor_is_rank_deficient() {
    let mut df = create_overlapping_dataframe();
    df.with_column(Column::new("flat".into(), vec![3.0f64; 20])).unwrap();

    let err = fit(
        &df,
        &ModelSpec::new(vec![], vec!["flat".into()], "churn_flag"),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ChurnError::Model(ModelError::RankDeficient { .. })
    ));
}

#[test]
fn test_missing_numeric_predictor_is_data_error() {
    let df = df! {
        "churn_flag" => [0i32, 1, 0, 1],
        "x" => [Some(1.0f64), None, Some(3.0), Some(4.0)],
    }
    .unwrap();

    let err = fit(&df, &ModelSpec::new(vec![], vec!["x".into()], "churn_flag")).unwrap_err();

    assert!(err.is_data_error());
}

#[test]
fn test_numeric_category_codes_are_reference_coded() {
    let df = df! {
        "churn_flag" => [0i32, 1, 0, 1, 1, 0, 0, 1, 0, 1],
        "SeniorCitizen" => [0i64, 0, 0, 1, 1, 0, 1, 0, 1, 1],
    }
    .unwrap();

    let model = fit(
        &df,
        &ModelSpec::new(vec!["SeniorCitizen".into()], vec![], "churn_flag"),
    )
    .unwrap();

    assert_eq!(model.encodings()[0].baseline, "0");
    assert_eq!(model.terms(), &["Intercept", "SeniorCitizen=1"]);
}
