//! Alert signals — immutable records created when a rule fires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::AlertLevel;

/// Closed set of signal categories so the aggregator's match stays
/// exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    PriceAction,
    TermStructure,
    Inventory,
    Sentiment,
    Macro,
    Squeeze,
}

/// One fired alert. Immutable once created; appended to the monitor's
/// bounded history and dispatched to notification sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSignal {
    pub level: AlertLevel,
    pub category: AlertCategory,
    pub indicator: String,
    pub current_value: f64,
    pub threshold: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub recommended_actions: Vec<String>,
}

impl AlertSignal {
    /// Age relative to `now`, for history pruning and recency queries.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.timestamp
    }
}
