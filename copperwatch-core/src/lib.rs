//! CopperWatch Core — forecast validation engine for copper price models.
//!
//! This crate judges whether an external price forecast should be trusted:
//! - Domain types (price bars, validated series, feature tables, prediction records)
//! - Walk-forward windowing (rolling train/test splits)
//! - Scenario shock library (demand collapse, liquidity crisis, supply disruption)
//! - Confidence scoring (accuracy metrics + composite 0–100 score)
//! - Position risk advisor (sizing, stop-loss/take-profit levels)
//! - Validation orchestrator composing all of the above into one run
//!
//! Forecasting models are external collaborators consumed through the
//! [`predictor::Predictor`] trait; this crate never owns a model.

pub mod confidence;
pub mod domain;
pub mod position;
pub mod predictor;
pub mod report;
pub mod scenario;
pub mod validate;
pub mod windower;

pub use confidence::{ConfidenceBand, ConfidenceError, ConfidenceMetrics};
pub use domain::{
    AlignedData, FeatureError, FeatureTable, PredictionRecord, PriceBar, PriceSeries, SeriesError,
};
pub use position::{PositionAdvice, PositionConfig, PositionStatus};
pub use predictor::{Forecast, LastValuePredictor, Predictor, PredictorError};
pub use scenario::{RiskTier, ScenarioConfig, ScenarioError, ScenarioResult, ScenarioSweep};
pub use validate::{
    FoldOutcomes, Regime, RegimeMetrics, ValidationConfig, ValidationError, ValidationReport,
    Validator,
};
pub use windower::{ValidationWindow, WindowConfig, WindowError, WindowPlan};
