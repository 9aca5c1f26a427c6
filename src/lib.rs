//! churnlab: Churn Prediction Library
//!
//! Loads telecom customer records, imputes missing charges, derives the
//! churn target and tenure/charge buckets, fits a logistic regression and
//! assesses it with round-robin k-fold cross-validation.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
