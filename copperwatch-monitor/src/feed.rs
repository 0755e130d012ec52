//! Market snapshots and the feed trait the background scheduler polls.
//!
//! Data-source connectors live outside this crate; they only need to produce
//! a [`MarketSnapshot`] per poll.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use copperwatch_core::domain::PriceSeries;

use crate::aggregate::SqueezeReading;

/// Errors from a market feed poll. The scheduler logs and retries on the
/// next interval.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

/// The two freshest values of one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPair {
    pub latest: f64,
    pub previous: f64,
}

/// Everything one monitor tick evaluates: per-indicator (latest, previous)
/// pairs plus optional structural readings for the squeeze detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    indicators: HashMap<String, IndicatorPair>,
    pub squeeze: Option<SqueezeReading>,
}

impl MarketSnapshot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            indicators: HashMap::new(),
            squeeze: None,
        }
    }

    /// Build a snapshot from the two freshest bars of a price series,
    /// populating the `close` indicator. Needs at least two bars.
    pub fn from_series(series: &PriceSeries, timestamp: DateTime<Utc>) -> Option<Self> {
        let (latest, previous) = series.latest_pair()?;
        let mut snapshot = Self::new(timestamp);
        snapshot.set(
            "close",
            IndicatorPair {
                latest: latest.close,
                previous: previous.close,
            },
        );
        Some(snapshot)
    }

    pub fn set(&mut self, indicator: &str, pair: IndicatorPair) {
        self.indicators.insert(indicator.to_string(), pair);
    }

    pub fn with_squeeze(mut self, reading: SqueezeReading) -> Self {
        self.squeeze = Some(reading);
        self
    }

    pub fn pair(&self, indicator: &str) -> Option<IndicatorPair> {
        self.indicators.get(indicator).copied()
    }
}

/// Periodic data source for the background scheduler.
pub trait MarketFeed: Send {
    fn poll(&mut self) -> Result<MarketSnapshot, FeedError>;
}
