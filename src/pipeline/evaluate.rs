//! Classification metrics: thresholding, confusion matrix, precision/recall/F1, ROC

use std::ops::{Add, AddAssign};

use serde::{Serialize, Serializer};

use super::error::{ChurnError, Result};

/// Default probability cutoff for the positive class
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// A ratio metric that may be undefined because its denominator is zero.
///
/// Undefined metrics are never reported as 0. They display as "undefined"
/// and serialize as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Undefined,
}

impl Metric {
    fn ratio(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Metric::Undefined
        } else {
            Metric::Value(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            Metric::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Value(_))
    }

    /// The metric value, or `MetricUndefined` naming the metric
    pub fn require(self, metric: &'static str) -> Result<f64> {
        self.value()
            .ok_or(ChurnError::MetricUndefined { metric })
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.4}", v),
            Metric::Undefined => write!(f, "undefined"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Binary confusion counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_negatives: u64,
}

impl ConfusionMatrix {
    pub fn new(tp: u64, fp: u64, fn_: u64, tn: u64) -> Self {
        Self {
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
            true_negatives: tn,
        }
    }

    pub fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    pub fn actual_positives(&self) -> u64 {
        self.true_positives + self.false_negatives
    }

    pub fn actual_negatives(&self) -> u64 {
        self.true_negatives + self.false_positives
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> Metric {
        Metric::ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN)
    pub fn recall(&self) -> Metric {
        Metric::ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall.
    ///
    /// Undefined when either input is undefined or when both are zero.
    pub fn f1(&self) -> Metric {
        match (self.precision(), self.recall()) {
            (Metric::Value(p), Metric::Value(r)) if p + r > 0.0 => {
                Metric::Value(2.0 * p * r / (p + r))
            }
            _ => Metric::Undefined,
        }
    }

    pub fn accuracy(&self) -> Metric {
        Metric::ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// FP / (FP + TN)
    pub fn false_positive_rate(&self) -> Metric {
        Metric::ratio(self.false_positives, self.false_positives + self.true_negatives)
    }
}

impl Add for ConfusionMatrix {
    type Output = ConfusionMatrix;

    fn add(self, other: ConfusionMatrix) -> ConfusionMatrix {
        ConfusionMatrix::new(
            self.true_positives + other.true_positives,
            self.false_positives + other.false_positives,
            self.false_negatives + other.false_negatives,
            self.true_negatives + other.true_negatives,
        )
    }
}

impl AddAssign for ConfusionMatrix {
    fn add_assign(&mut self, other: ConfusionMatrix) {
        *self = *self + other;
    }
}

/// Confusion matrix plus the derived metrics, ready for display/export
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub threshold: f64,
    pub confusion: ConfusionMatrix,
    pub precision: Metric,
    pub recall: Metric,
    pub f1: Metric,
    pub accuracy: Metric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auc: Option<f64>,
}

impl ClassificationReport {
    pub fn from_confusion(confusion: ConfusionMatrix, threshold: f64) -> Self {
        Self {
            threshold,
            confusion,
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            accuracy: confusion.accuracy(),
            auc: None,
        }
    }

    /// Threshold the probabilities, build the matrix, and attach AUC when both
    /// classes are present.
    pub fn evaluate(actual: &[u8], probabilities: &[f64], threshold: f64) -> Result<Self> {
        let predicted = threshold_predict(probabilities, threshold)?;
        let matrix = confusion(actual, &predicted)?;
        let mut report = Self::from_confusion(matrix, threshold);
        if matrix.actual_positives() > 0 && matrix.actual_negatives() > 0 {
            report.auc = Some(roc_curve(actual, probabilities)?.auc());
        }
        Ok(report)
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
        return Err(ChurnError::validation(format!(
            "threshold must be within [0, 1], got {}",
            threshold
        )));
    }
    Ok(())
}

/// 1 iff probability >= threshold
pub fn threshold_predict(probabilities: &[f64], threshold: f64) -> Result<Vec<u8>> {
    validate_threshold(threshold)?;
    Ok(probabilities
        .iter()
        .map(|&p| u8::from(p >= threshold))
        .collect())
}

/// Confusion counts over aligned actual/predicted sequences
pub fn confusion(actual: &[u8], predicted: &[u8]) -> Result<ConfusionMatrix> {
    if actual.len() != predicted.len() {
        return Err(ChurnError::validation(format!(
            "actual and predicted lengths differ ({} vs {})",
            actual.len(),
            predicted.len()
        )));
    }

    let mut matrix = ConfusionMatrix::default();
    for (i, (&a, &p)) in actual.iter().zip(predicted.iter()).enumerate() {
        match (a, p) {
            (1, 1) => matrix.true_positives += 1,
            (0, 1) => matrix.false_positives += 1,
            (1, 0) => matrix.false_negatives += 1,
            (0, 0) => matrix.true_negatives += 1,
            _ => {
                return Err(ChurnError::validation(format!(
                    "non-binary class at position {} (actual={}, predicted={})",
                    i, a, p
                )))
            }
        }
    }

    Ok(matrix)
}

/// One operating point of the ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
}

/// ROC curve from (0,0) to (1,1)
#[derive(Debug, Clone, Serialize)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
}

impl RocCurve {
    /// Area under the curve by the trapezoid rule
    pub fn auc(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| {
                let dx = w[1].false_positive_rate - w[0].false_positive_rate;
                dx * (w[0].true_positive_rate + w[1].true_positive_rate) / 2.0
            })
            .sum()
    }
}

/// ROC points at every distinct probability, scanned from high to low.
///
/// The first point uses threshold +inf (nothing predicted positive). Tied
/// probabilities are consumed together so each point is a real cutoff.
pub fn roc_curve(actual: &[u8], probabilities: &[f64]) -> Result<RocCurve> {
    if actual.len() != probabilities.len() {
        return Err(ChurnError::validation(format!(
            "actual and probability lengths differ ({} vs {})",
            actual.len(),
            probabilities.len()
        )));
    }

    let positives = actual.iter().filter(|&&a| a == 1).count() as f64;
    let negatives = actual.iter().filter(|&&a| a == 0).count() as f64;
    if positives as usize + negatives as usize != actual.len() {
        return Err(ChurnError::validation("ROC requires 0/1 actual classes"));
    }
    if positives == 0.0 || negatives == 0.0 {
        return Err(ChurnError::validation(
            "ROC requires both positive and negative cases",
        ));
    }

    let mut order: Vec<usize> = (0..actual.len()).collect();
    order.sort_by(|&a, &b| {
        probabilities[b]
            .partial_cmp(&probabilities[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        false_positive_rate: 0.0,
        true_positive_rate: 0.0,
    }];
    let (mut tp, mut fp) = (0.0, 0.0);

    let mut idx = 0;
    while idx < order.len() {
        let cutoff = probabilities[order[idx]];
        while idx < order.len() && probabilities[order[idx]] == cutoff {
            if actual[order[idx]] == 1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            idx += 1;
        }
        points.push(RocPoint {
            threshold: cutoff,
            false_positive_rate: fp / negatives,
            true_positive_rate: tp / positives,
        });
    }

    Ok(RocCurve { points })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_display_and_require() {
        assert_eq!(Metric::Undefined.to_string(), "undefined");
        assert_eq!(Metric::Value(0.8).to_string(), "0.8000");
        assert!(matches!(
            Metric::Undefined.require("precision"),
            Err(ChurnError::MetricUndefined { metric: "precision" })
        ));
    }

    #[test]
    fn test_metric_serializes_undefined_as_null() {
        let json = serde_json::to_string(&vec![Metric::Value(0.5), Metric::Undefined]).unwrap();
        assert_eq!(json, "[0.5,null]");
    }

    #[test]
    fn test_f1_undefined_when_no_true_positives() {
        let m = ConfusionMatrix::new(0, 3, 4, 10);
        assert_eq!(m.precision(), Metric::Value(0.0));
        assert_eq!(m.recall(), Metric::Value(0.0));
        assert_eq!(m.f1(), Metric::Undefined);
    }

    #[test]
    fn test_threshold_rejects_out_of_range() {
        assert!(threshold_predict(&[0.2], 1.5).unwrap_err().is_validation_error());
        assert!(threshold_predict(&[0.2], f64::NAN).is_err());
    }

    #[test]
    fn test_roc_ties_collapse_to_one_point() {
        let curve = roc_curve(&[1, 0, 1, 0], &[0.7, 0.7, 0.9, 0.1]).unwrap();
        assert_eq!(curve.points.len(), 4);
        let last = curve.points.last().unwrap();
        assert_eq!(last.false_positive_rate, 1.0);
        assert_eq!(last.true_positive_rate, 1.0);
    }
}
