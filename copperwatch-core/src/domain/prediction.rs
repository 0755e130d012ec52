//! Prediction records accumulated across walk-forward windows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One out-of-sample prediction paired with the realized value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub predicted: f64,
    pub actual: f64,
}

impl PredictionRecord {
    /// Signed prediction error (predicted - actual).
    pub fn error(&self) -> f64 {
        self.predicted - self.actual
    }
}
