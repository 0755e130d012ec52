//! Alert levels — a totally ordered, closed three-tier ladder.

use serde::{Deserialize, Serialize};

/// Overall alert state. Ordering is contractual: the aggregator and the
/// squeeze detector combine by taking the higher level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum AlertLevel {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "level_1")]
    Level1,
    #[serde(rename = "level_2")]
    Level2,
    #[serde(rename = "level_3")]
    Level3,
}

impl AlertLevel {
    /// Fixed display label for external feeds.
    pub fn label(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "normal",
            AlertLevel::Level1 => "level-1 watch",
            AlertLevel::Level2 => "level-2 alert",
            AlertLevel::Level3 => "level-3 emergency",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "🟢",
            AlertLevel::Level1 => "🟡",
            AlertLevel::Level2 => "🟠",
            AlertLevel::Level3 => "🔴",
        }
    }

    /// Hex color used by dashboard consumers.
    pub fn color(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "#22c55e",
            AlertLevel::Level1 => "#f59e0b",
            AlertLevel::Level2 => "#f97316",
            AlertLevel::Level3 => "#dc2626",
        }
    }
}
