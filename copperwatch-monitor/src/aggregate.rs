//! Signal aggregation — the escalation ladder and the conjunctive squeeze
//! detector.
//!
//! The ladder encodes "many weak signals = one strong signal": co-occurring
//! level-2 signals escalate to level 3, and a volume of level-1 signals
//! escalates to level 2. The squeeze detector independently fires level 3
//! when enough structural conditions coincide; callers combine the two by
//! taking the higher level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::AlertLevel;
use crate::signal::{AlertCategory, AlertSignal};

/// Aggregate the signals fired in one tick into a single level.
///
/// Applied in order, first match wins:
/// 1. any level-3 → level 3
/// 2. ≥2 level-2 → level 3 (co-occurrence escalation)
/// 3. ≥1 level-2 → level 2
/// 4. ≥3 level-1 → level 2 (volume escalation)
/// 5. ≥1 level-1 → level 1
/// 6. otherwise   → normal
pub fn aggregate_level(signals: &[AlertSignal]) -> AlertLevel {
    let mut level_1 = 0usize;
    let mut level_2 = 0usize;
    let mut level_3 = 0usize;
    for signal in signals {
        match signal.level {
            AlertLevel::Level3 => level_3 += 1,
            AlertLevel::Level2 => level_2 += 1,
            AlertLevel::Level1 => level_1 += 1,
            AlertLevel::Normal => {}
        }
    }

    if level_3 > 0 {
        AlertLevel::Level3
    } else if level_2 >= 2 {
        AlertLevel::Level3
    } else if level_2 >= 1 {
        AlertLevel::Level2
    } else if level_1 >= 3 {
        AlertLevel::Level2
    } else if level_1 >= 1 {
        AlertLevel::Level1
    } else {
        AlertLevel::Normal
    }
}

/// Structural limits for the squeeze scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqueezeThresholds {
    /// Cash-3M backwardation limit ($/tonne).
    pub backwardation: f64,
    /// Registered inventory floor (10k tonnes).
    pub inventory: f64,
    /// Warrant cancellation ratio limit (%).
    pub cancel_ratio: f64,
    /// Single-entity position concentration limit (%).
    pub concentration: f64,
}

impl Default for SqueezeThresholds {
    fn default() -> Self {
        Self {
            backwardation: 200.0,
            inventory: 5.0,
            cancel_ratio: 60.0,
            concentration: 40.0,
        }
    }
}

/// Structural market readings the squeeze detector inspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqueezeReading {
    /// Cash-3M spread ($/tonne); positive = backwardation.
    pub cash_3m_spread: f64,
    /// Registered inventory (10k tonnes).
    pub registered_inventory: f64,
    /// Previous registered inventory reading, for the "still falling" test.
    pub registered_inventory_prev: f64,
    /// Warrant cancellation ratio (%).
    pub cancel_ratio: f64,
    /// Single-entity position concentration (%).
    pub concentration: f64,
}

/// Conjunctive squeeze rule: fire level 3 when at least 3 of the 4
/// structural conditions hold simultaneously. The inventory condition also
/// requires the inventory to still be falling.
pub fn check_squeeze(
    reading: &SqueezeReading,
    thresholds: &SqueezeThresholds,
    now: DateTime<Utc>,
) -> Option<AlertSignal> {
    let conditions = [
        reading.cash_3m_spread > thresholds.backwardation,
        reading.registered_inventory < thresholds.inventory
            && reading.registered_inventory < reading.registered_inventory_prev,
        reading.cancel_ratio > thresholds.cancel_ratio,
        reading.concentration > thresholds.concentration,
    ];
    let met = conditions.iter().filter(|&&c| c).count();
    if met < 3 {
        return None;
    }

    Some(AlertSignal {
        level: AlertLevel::Level3,
        category: AlertCategory::Squeeze,
        indicator: "squeeze_conditions".into(),
        current_value: met as f64,
        threshold: 3.0,
        message: format!(
            "squeeze risk: {met}/4 conditions met (backwardation ${:.0}, inventory {:.1}, \
             cancel ratio {:.1}%, concentration {:.1}%)",
            reading.cash_3m_spread,
            reading.registered_inventory,
            reading.cancel_ratio,
            reading.concentration
        ),
        timestamp: now,
        recommended_actions: vec![
            "verify short positions can deliver".into(),
            "line up alternative physical supply".into(),
            "estimate roll cost and consider rolling early".into(),
            "check margin headroom".into(),
        ],
    })
}

/// Combine the ladder result with an independent squeeze check by taking the
/// higher level.
pub fn overall_level(ladder: AlertLevel, squeeze: Option<&AlertSignal>) -> AlertLevel {
    match squeeze {
        Some(signal) => ladder.max(signal.level),
        None => ladder,
    }
}
