//! Confidence scoring — accuracy metrics and one composite 0–100 score.
//!
//! Every metric is a pure function over aligned predicted/actual slices.
//! Degenerate inputs (constant actuals, zero mean) resolve to 0.0 rather
//! than NaN so the composite score stays bounded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from metric computation over structurally invalid input.
#[derive(Debug, Error)]
pub enum ConfidenceError {
    #[error("predicted and actual lengths differ: {predicted} vs {actual}")]
    LengthMismatch { predicted: usize, actual: usize },
    #[error("input slices are empty")]
    Empty,
    #[error("{slice} contains a non-finite value at index {index}")]
    NonFinite { slice: &'static str, index: usize },
}

/// Confidence band over the composite score. Thresholds are contractual:
/// ≥80 high, ≥60 medium, else low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ConfidenceBand::High
        } else if score >= 60.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Accuracy metrics plus the composite confidence score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    pub r2: f64,
    /// Fraction of matching consecutive-delta signs, in [0, 1].
    pub directional_accuracy: f64,
    pub rmse: f64,
    pub mae: f64,
    /// RMSE divided by mean(actual).
    pub normalized_rmse: f64,
    pub max_error: f64,
    pub max_error_pct: f64,
    pub error_std: f64,
    /// Composite score in [0, 100]:
    /// 30·max(0,r2) + 40·dir_acc + 20·max(0,1-nrmse) + 10·max(0,1-error_std/mean).
    pub composite_score: f64,
}

impl ConfidenceMetrics {
    pub fn compute(predicted: &[f64], actual: &[f64]) -> Result<Self, ConfidenceError> {
        if predicted.len() != actual.len() {
            return Err(ConfidenceError::LengthMismatch {
                predicted: predicted.len(),
                actual: actual.len(),
            });
        }
        if predicted.is_empty() {
            return Err(ConfidenceError::Empty);
        }
        for (slice, values) in [("predicted", predicted), ("actual", actual)] {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(ConfidenceError::NonFinite { slice, index });
            }
        }

        let r2 = r_squared(predicted, actual);
        let directional_accuracy = directional_accuracy(predicted, actual);
        let rmse = rmse(predicted, actual);
        let mae = mae(predicted, actual);
        let mean_actual = mean(actual);
        let normalized_rmse = if mean_actual != 0.0 { rmse / mean_actual } else { 0.0 };

        let max_error = predicted
            .iter()
            .zip(actual)
            .map(|(p, a)| (p - a).abs())
            .fold(0.0_f64, f64::max);
        let max_error_pct = if mean_actual != 0.0 {
            max_error / mean_actual * 100.0
        } else {
            0.0
        };

        let errors: Vec<f64> = predicted.iter().zip(actual).map(|(p, a)| p - a).collect();
        let error_std = std_dev(&errors);

        let stability = if mean_actual > 0.0 {
            (1.0 - error_std / mean_actual).max(0.0)
        } else {
            0.0
        };
        let composite_score = (30.0 * r2.max(0.0)
            + 40.0 * directional_accuracy
            + 20.0 * (1.0 - normalized_rmse).max(0.0)
            + 10.0 * stability)
            .clamp(0.0, 100.0);

        Ok(Self {
            r2,
            directional_accuracy,
            rmse,
            mae,
            normalized_rmse,
            max_error,
            max_error_pct,
            error_std,
            composite_score,
        })
    }

    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.composite_score)
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Coefficient of determination. Constant actuals yield 0.0.
pub fn r_squared(predicted: &[f64], actual: &[f64]) -> f64 {
    let mean_actual = mean(actual);
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    if ss_tot < 1e-15 {
        return 0.0;
    }
    let ss_res: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (a - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Fraction of consecutive predicted deltas whose sign matches the realized
/// delta. 0.0 when fewer than two points.
///
/// A zero delta has sign 0 and matches only a flat step, so a constant
/// forecast earns no credit against a moving market. `f64::signum` would
/// map +0.0 to +1.0 and silently count those as up-moves.
pub fn directional_accuracy(predicted: &[f64], actual: &[f64]) -> f64 {
    fn sign(delta: f64) -> f64 {
        if delta > 0.0 {
            1.0
        } else if delta < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    if predicted.len() < 2 {
        return 0.0;
    }
    let n = predicted.len() - 1;
    let matches = (1..predicted.len())
        .filter(|&i| {
            let pred_dir = sign(predicted[i] - predicted[i - 1]);
            let actual_dir = sign(actual[i] - actual[i - 1]);
            pred_dir == actual_dir
        })
        .count();
    matches as f64 / n as f64
}

/// Root mean squared error.
pub fn rmse(predicted: &[f64], actual: &[f64]) -> f64 {
    let mse: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / predicted.len() as f64;
    mse.sqrt()
}

/// Mean absolute error.
pub fn mae(predicted: &[f64], actual: &[f64]) -> f64 {
    predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / predicted.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
