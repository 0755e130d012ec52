//! The fit/predict capability every forecasting model must expose.
//!
//! Models themselves are external collaborators. The orchestrator only ever
//! sees this trait, so a model wrapper (statistical, ML, or macro-factor) is
//! pluggable as long as it implements the two operations.

use thiserror::Error;

/// Errors raised by a model during fit or predict.
///
/// The orchestrator treats these as per-fold failures: logged, counted, and
/// skipped — never fatal to the run.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("fit failed: {0}")]
    Fit(String),
    #[error("predict failed: {0}")]
    Predict(String),
}

/// Model output for a test window.
///
/// Path-producing models return one value per feature row. Models that emit a
/// single structured forecast (e.g. a macro-factor point estimate) return
/// `Point`, which is broadcast over the window.
#[derive(Debug, Clone, PartialEq)]
pub enum Forecast {
    Series(Vec<f64>),
    Point(f64),
}

impl Forecast {
    /// Expand into one value per test row.
    pub fn into_series(self, len: usize) -> Vec<f64> {
        match self {
            Forecast::Series(values) => values,
            Forecast::Point(value) => vec![value; len],
        }
    }
}

/// Fit/predict capability interface.
pub trait Predictor {
    /// Fit on feature rows and aligned target values.
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), PredictorError>;

    /// Predict for the given feature rows.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Forecast, PredictorError>;
}

/// Baseline model: predicts the last training target for every test row.
///
/// Used as the fallback forecaster and as the reference point every real
/// model must beat.
#[derive(Debug, Clone, Default)]
pub struct LastValuePredictor {
    last: Option<f64>,
}

impl Predictor for LastValuePredictor {
    fn fit(&mut self, _features: &[Vec<f64>], targets: &[f64]) -> Result<(), PredictorError> {
        match targets.last() {
            Some(&value) => {
                self.last = Some(value);
                Ok(())
            }
            None => Err(PredictorError::Fit("empty training target".into())),
        }
    }

    fn predict(&self, _features: &[Vec<f64>]) -> Result<Forecast, PredictorError> {
        match self.last {
            Some(value) => Ok(Forecast::Point(value)),
            None => Err(PredictorError::Predict("predict before fit".into())),
        }
    }
}
