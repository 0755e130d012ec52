//! Validation orchestrator — one end-to-end walk-forward run.
//!
//! Composes the windower, predictor, confidence scorer, scenario library and
//! position advisor. Structural input errors abort the run; a single window's
//! predictor failure is logged with the window index and skipped.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::confidence::{ConfidenceBand, ConfidenceError, ConfidenceMetrics};
use crate::domain::{AlignedData, FeatureError, FeatureTable, PredictionRecord, PriceSeries};
use crate::position::{PositionAdvice, PositionConfig};
use crate::predictor::Predictor;
use crate::report;
use crate::scenario::{self, ScenarioConfig, ScenarioSweep};
use crate::windower::{WindowConfig, WindowError, WindowPlan};

/// Errors that abort a validation run. Everything else is isolated per fold.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("price series is empty")]
    EmptySeries,
    #[error(transparent)]
    Features(#[from] FeatureError),
    #[error(transparent)]
    Windows(#[from] WindowError),
    #[error("no usable windows: {skipped} skipped for short training data, {failed} predictor failures")]
    NoUsableWindows { skipped: usize, failed: usize },
    #[error(transparent)]
    Metrics(#[from] ConfidenceError),
}

/// Market-state bucket derived from recent return magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Trending,
    Sideways,
}

/// Metrics over the prediction records falling in one regime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeMetrics {
    pub regime: Regime,
    pub count: usize,
    pub rmse: f64,
    pub mae: f64,
    pub directional_accuracy: f64,
}

/// Per-fold bookkeeping surfaced in the final result.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FoldOutcomes {
    pub evaluated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub windows: WindowConfig,
    /// Lookback (bars) for the regime return (default 20).
    pub regime_lookback: usize,
    /// |lookback return| above this is a trending market (default 10%).
    pub trend_threshold: f64,
    pub scenarios: ScenarioConfig,
    pub position: PositionConfig,
    /// Account value the position advisor sizes against.
    pub account_value: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            windows: WindowConfig::default(),
            regime_lookback: 20,
            trend_threshold: 0.10,
            scenarios: ScenarioConfig::default(),
            position: PositionConfig::default(),
            account_value: 1_000_000.0,
        }
    }
}

/// Complete result of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub records: Vec<PredictionRecord>,
    pub metrics: ConfidenceMetrics,
    pub band: ConfidenceBand,
    pub regimes: Vec<RegimeMetrics>,
    pub folds: FoldOutcomes,
    pub scenarios: Option<ScenarioSweep>,
    pub advice: Option<PositionAdvice>,
    /// Fixed-order plain-text summary: confidence → stress test →
    /// recommendations. Rendering into HTML or slides happens elsewhere.
    pub summary: String,
}

/// End-to-end validation runner.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Run the full validation: walk-forward evaluation, aggregate and
    /// per-regime metrics, and — when a base prediction is supplied — the
    /// scenario sweep and position recommendations.
    pub fn run(
        &self,
        predictor: &mut dyn Predictor,
        series: &PriceSeries,
        features: &FeatureTable,
        base_prediction: Option<f64>,
    ) -> Result<ValidationReport, ValidationError> {
        if series.is_empty() {
            return Err(ValidationError::EmptySeries);
        }
        let aligned = features.align(series)?;
        let plan = WindowPlan::new(self.config.windows.clone(), aligned.len())?;

        let (records, folds) = self.walk_forward(predictor, &aligned, &plan);
        if records.is_empty() {
            return Err(ValidationError::NoUsableWindows {
                skipped: folds.skipped,
                failed: folds.failed,
            });
        }

        let predicted: Vec<f64> = records.iter().map(|r| r.predicted).collect();
        let actual: Vec<f64> = records.iter().map(|r| r.actual).collect();
        let metrics = ConfidenceMetrics::compute(&predicted, &actual)?;
        let band = metrics.band();
        let regimes = self.regime_breakdown(&records);

        let volatility = daily_volatility(&aligned.closes);
        let (scenarios, advice) = match base_prediction {
            Some(base) => {
                let sweep = scenario::run_all(base, &self.config.scenarios);
                for failure in &sweep.failures {
                    warn!(%failure, "scenario omitted from stress test");
                }
                let advice = self.config.position.advise(
                    self.config.account_value,
                    metrics.composite_score,
                    base,
                    volatility,
                );
                (Some(sweep), Some(advice))
            }
            None => (None, None),
        };

        let summary = report::render(
            &metrics,
            band,
            &folds,
            &regimes,
            scenarios.as_ref(),
            advice.as_ref(),
            &self.config.position,
        );

        Ok(ValidationReport {
            records,
            metrics,
            band,
            regimes,
            folds,
            scenarios,
            advice,
            summary,
        })
    }

    fn walk_forward(
        &self,
        predictor: &mut dyn Predictor,
        aligned: &AlignedData,
        plan: &WindowPlan,
    ) -> (Vec<PredictionRecord>, FoldOutcomes) {
        let mut records = Vec::new();
        let mut folds = FoldOutcomes {
            skipped: plan.skipped(),
            ..FoldOutcomes::default()
        };

        for window in plan.iter() {
            // Rows with missing features are excluded from training; targets
            // stay aligned to the surviving rows.
            let mut train_rows = Vec::new();
            let mut train_targets = Vec::new();
            for i in window.train.clone() {
                if aligned.row_is_complete(i) {
                    train_rows.push(aligned.rows[i].clone());
                    train_targets.push(aligned.closes[i]);
                }
            }

            if let Err(err) = predictor.fit(&train_rows, &train_targets) {
                warn!(window = window.index, %err, "predictor fit failed, window skipped");
                folds.failed += 1;
                continue;
            }

            let test_rows: Vec<Vec<f64>> = window.test.clone().map(|i| aligned.rows[i].clone()).collect();
            let forecast = match predictor.predict(&test_rows) {
                Ok(forecast) => forecast,
                Err(err) => {
                    warn!(window = window.index, %err, "predictor failed, window skipped");
                    folds.failed += 1;
                    continue;
                }
            };

            let predicted = forecast.into_series(window.test.len());
            if predicted.len() != window.test.len() {
                warn!(
                    window = window.index,
                    got = predicted.len(),
                    expected = window.test.len(),
                    "forecast length mismatch, window skipped"
                );
                folds.failed += 1;
                continue;
            }

            for (offset, i) in window.test.clone().enumerate() {
                records.push(PredictionRecord {
                    date: aligned.dates[i],
                    predicted: predicted[offset],
                    actual: aligned.closes[i],
                });
            }
            folds.evaluated += 1;
            debug!(
                window = window.index,
                train = window.train.len(),
                test = window.test.len(),
                "window evaluated"
            );
        }

        (records, folds)
    }

    /// Partition records into trending and sideways buckets by the magnitude
    /// of the lookback return over realized values.
    fn regime_breakdown(&self, records: &[PredictionRecord]) -> Vec<RegimeMetrics> {
        let lookback = self.config.regime_lookback;
        let regimes: Vec<Regime> = (0..records.len())
            .map(|i| {
                if i >= lookback && records[i - lookback].actual != 0.0 {
                    let ret = records[i].actual / records[i - lookback].actual - 1.0;
                    if ret.abs() > self.config.trend_threshold {
                        Regime::Trending
                    } else {
                        Regime::Sideways
                    }
                } else {
                    // Warmup rows have no lookback return and count as sideways.
                    Regime::Sideways
                }
            })
            .collect();

        [Regime::Trending, Regime::Sideways]
            .into_iter()
            .filter_map(|regime| {
                let bucket: Vec<&PredictionRecord> = records
                    .iter()
                    .zip(&regimes)
                    .filter(|(_, r)| **r == regime)
                    .map(|(rec, _)| rec)
                    .collect();
                if bucket.is_empty() {
                    return None;
                }
                let predicted: Vec<f64> = bucket.iter().map(|r| r.predicted).collect();
                let actual: Vec<f64> = bucket.iter().map(|r| r.actual).collect();
                Some(RegimeMetrics {
                    regime,
                    count: bucket.len(),
                    rmse: crate::confidence::rmse(&predicted, &actual),
                    mae: crate::confidence::mae(&predicted, &actual),
                    directional_accuracy: crate::confidence::directional_accuracy(
                        &predicted, &actual,
                    ),
                })
            })
            .collect()
    }
}

/// Standard deviation of close-to-close returns.
pub fn daily_volatility(closes: &[f64]) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{Forecast, PredictorError};
    use chrono::NaiveDate;
    use crate::domain::PriceBar;

    fn series(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let bars = (0..n)
            .map(|i| {
                let close = 70_000.0 + (i as f64 * 0.3).sin() * 500.0 + i as f64 * 10.0;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 100.0,
                    low: close - 100.0,
                    close,
                    volume: 10_000,
                }
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    /// Predictor whose fit always fails, to exercise failure isolation.
    struct FailingPredictor;

    impl Predictor for FailingPredictor {
        fn fit(&mut self, _: &[Vec<f64>], _: &[f64]) -> Result<(), PredictorError> {
            Err(PredictorError::Fit("synthetic failure".into()))
        }
        fn predict(&self, _: &[Vec<f64>]) -> Result<Forecast, PredictorError> {
            Err(PredictorError::Predict("synthetic failure".into()))
        }
    }

    /// Fails on the first fold only, then behaves like the baseline.
    struct FlakyPredictor {
        calls: usize,
        inner: crate::predictor::LastValuePredictor,
    }

    impl Predictor for FlakyPredictor {
        fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), PredictorError> {
            self.calls += 1;
            if self.calls == 1 {
                return Err(PredictorError::Fit("first fold down".into()));
            }
            self.inner.fit(features, targets)
        }
        fn predict(&self, features: &[Vec<f64>]) -> Result<Forecast, PredictorError> {
            self.inner.predict(features)
        }
    }

    #[test]
    fn empty_series_fails_fast() {
        let validator = Validator::default();
        let empty = PriceSeries::new(vec![]).unwrap();
        let features = FeatureTable::lagged_returns(&series(10), &[1]).unwrap();
        let mut model = crate::predictor::LastValuePredictor::default();
        assert!(matches!(
            validator.run(&mut model, &empty, &features, None),
            Err(ValidationError::EmptySeries)
        ));
    }

    #[test]
    fn all_folds_failing_is_an_error() {
        let validator = Validator::default();
        let s = series(300);
        let features = FeatureTable::lagged_returns(&s, &[1, 5]).unwrap();
        let mut model = FailingPredictor;
        let err = validator.run(&mut model, &s, &features, None).unwrap_err();
        match err {
            ValidationError::NoUsableWindows { failed, .. } => assert_eq!(failed, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn single_fold_failure_does_not_abort() {
        let validator = Validator::default();
        let s = series(300);
        let features = FeatureTable::lagged_returns(&s, &[1, 5]).unwrap();
        let mut model = FlakyPredictor {
            calls: 0,
            inner: crate::predictor::LastValuePredictor::default(),
        };
        let report = validator.run(&mut model, &s, &features, None).unwrap();
        assert_eq!(report.folds.failed, 1);
        assert_eq!(report.folds.evaluated, 1);
        // Only the surviving fold contributes predictions.
        assert_eq!(report.records.len(), 30);
    }

    #[test]
    fn base_prediction_enables_stress_and_advice() {
        let validator = Validator::default();
        let s = series(300);
        let features = FeatureTable::lagged_returns(&s, &[1, 5]).unwrap();
        let mut model = crate::predictor::LastValuePredictor::default();
        let report = validator
            .run(&mut model, &s, &features, Some(70_000.0))
            .unwrap();
        let sweep = report.scenarios.unwrap();
        assert_eq!(sweep.results.len(), 3);
        assert!(report.advice.is_some());
        // Fixed section order in the plain-text summary.
        let confidence_at = report.summary.find("MODEL CONFIDENCE").unwrap();
        let stress_at = report.summary.find("STRESS TEST").unwrap();
        let reco_at = report.summary.find("POSITION RECOMMENDATIONS").unwrap();
        assert!(confidence_at < stress_at && stress_at < reco_at);
    }

    #[test]
    fn regime_breakdown_covers_all_records() {
        let validator = Validator::default();
        let s = series(300);
        let features = FeatureTable::lagged_returns(&s, &[1, 5]).unwrap();
        let mut model = crate::predictor::LastValuePredictor::default();
        let report = validator.run(&mut model, &s, &features, None).unwrap();
        let total: usize = report.regimes.iter().map(|r| r.count).sum();
        assert_eq!(total, report.records.len());
    }

    #[test]
    fn daily_volatility_of_constant_series_is_zero() {
        assert_eq!(daily_volatility(&[100.0, 100.0, 100.0]), 0.0);
    }
}
