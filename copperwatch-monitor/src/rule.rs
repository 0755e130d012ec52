//! Threshold rules — single-indicator boundary tests with cooldowns, plus
//! JSON rule-set import/export.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::level::AlertLevel;
use crate::signal::AlertCategory;

/// Comparison operator over (latest, previous) data points.
///
/// `CrossUp`/`CrossDown` are edge-triggered: they fire only on the single
/// transition across the threshold and stay quiet while the series remains
/// on the new side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Above,
    Below,
    CrossUp,
    CrossDown,
    /// Percent-change magnitude test. Non-firing when previous == 0.
    PctChangeAbove,
}

impl ComparisonOp {
    pub fn evaluate(self, threshold: f64, latest: f64, previous: f64) -> bool {
        match self {
            ComparisonOp::Above => latest > threshold,
            ComparisonOp::Below => latest < threshold,
            ComparisonOp::CrossUp => previous <= threshold && latest > threshold,
            ComparisonOp::CrossDown => previous >= threshold && latest < threshold,
            ComparisonOp::PctChangeAbove => {
                if previous == 0.0 {
                    return false;
                }
                ((latest / previous - 1.0) * 100.0).abs() > threshold
            }
        }
    }
}

/// A persistent alert rule. Owned exclusively by the monitor; `last_fired_at`
/// is its cooldown clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub category: AlertCategory,
    /// Level of the signal this rule emits when it fires.
    pub level: AlertLevel,
    /// Snapshot indicator the rule watches (e.g. "close", "volatility_20d").
    pub indicator: String,
    pub op: ComparisonOp,
    pub threshold: f64,
    pub cooldown_minutes: i64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub last_fired_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actions: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl AlertRule {
    /// True when the rule may fire at `now`: enabled and strictly past its
    /// cooldown window (t0, t0 + cooldown].
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        match self.last_fired_at {
            None => true,
            Some(fired) => now - fired > Duration::minutes(self.cooldown_minutes),
        }
    }

    pub fn evaluate(&self, latest: f64, previous: f64) -> bool {
        self.op.evaluate(self.threshold, latest, previous)
    }
}

/// Errors from rule-set import/export.
#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("rule set is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate rule id: {0}")]
    DuplicateId(String),
}

/// Serialize rules as pretty JSON, sorted by id for stable diffs.
pub fn export_rules<'a>(rules: impl Iterator<Item = &'a AlertRule>) -> Result<String, RuleSetError> {
    let mut rules: Vec<&AlertRule> = rules.collect();
    rules.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(serde_json::to_string_pretty(&rules)?)
}

/// Parse a rule set exported by [`export_rules`]. Duplicate ids are rejected.
pub fn import_rules(text: &str) -> Result<Vec<AlertRule>, RuleSetError> {
    let rules: Vec<AlertRule> = serde_json::from_str(text)?;
    let mut seen = std::collections::HashSet::new();
    for rule in &rules {
        if !seen.insert(rule.id.clone()) {
            return Err(RuleSetError::DuplicateId(rule.id.clone()));
        }
    }
    Ok(rules)
}

/// Default rule templates for the copper contract.
pub fn default_rules() -> Vec<AlertRule> {
    vec![
        AlertRule {
            id: "price_breakout".into(),
            name: "price breakout".into(),
            category: AlertCategory::PriceAction,
            level: AlertLevel::Level1,
            indicator: "close".into(),
            op: ComparisonOp::CrossUp,
            threshold: 75_000.0,
            cooldown_minutes: 30,
            enabled: true,
            last_fired_at: None,
            actions: vec!["review resistance levels".into()],
        },
        AlertRule {
            id: "price_support_break".into(),
            name: "support broken".into(),
            category: AlertCategory::PriceAction,
            level: AlertLevel::Level2,
            indicator: "close".into(),
            op: ComparisonOp::CrossDown,
            threshold: 65_000.0,
            cooldown_minutes: 30,
            enabled: true,
            last_fired_at: None,
            actions: vec!["check stop placement".into(), "reassess downside targets".into()],
        },
        AlertRule {
            id: "big_daily_move".into(),
            name: "large daily move".into(),
            category: AlertCategory::PriceAction,
            level: AlertLevel::Level2,
            indicator: "close".into(),
            op: ComparisonOp::PctChangeAbove,
            threshold: 2.5,
            cooldown_minutes: 15,
            enabled: true,
            last_fired_at: None,
            actions: vec!["check overnight news".into()],
        },
        AlertRule {
            id: "high_volatility".into(),
            name: "high realized volatility".into(),
            category: AlertCategory::Sentiment,
            level: AlertLevel::Level1,
            indicator: "volatility_20d".into(),
            op: ComparisonOp::Above,
            threshold: 4.0,
            cooldown_minutes: 120,
            enabled: true,
            last_fired_at: None,
            actions: vec!["review margin headroom".into()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn above_and_below_are_strict() {
        assert!(!ComparisonOp::Above.evaluate(10.0, 10.0, 9.0));
        assert!(ComparisonOp::Above.evaluate(10.0, 10.1, 9.0));
        assert!(!ComparisonOp::Below.evaluate(10.0, 10.0, 11.0));
        assert!(ComparisonOp::Below.evaluate(10.0, 9.9, 11.0));
    }

    #[test]
    fn cross_up_fires_only_on_the_transition() {
        let op = ComparisonOp::CrossUp;
        // Rising series crossing 100 exactly once: 98, 99, 101, 103.
        assert!(!op.evaluate(100.0, 99.0, 98.0));
        assert!(op.evaluate(100.0, 101.0, 99.0));
        // Still above: must not re-fire.
        assert!(!op.evaluate(100.0, 103.0, 101.0));
    }

    #[test]
    fn cross_up_never_fires_when_starting_above() {
        let op = ComparisonOp::CrossUp;
        assert!(!op.evaluate(100.0, 103.0, 102.0));
        assert!(!op.evaluate(100.0, 105.0, 103.0));
    }

    #[test]
    fn cross_down_mirrors_cross_up() {
        let op = ComparisonOp::CrossDown;
        assert!(op.evaluate(100.0, 99.0, 101.0));
        assert!(!op.evaluate(100.0, 98.0, 99.0));
        // Touching the threshold from above without crossing strictly below.
        assert!(!op.evaluate(100.0, 100.0, 101.0));
    }

    #[test]
    fn pct_change_undefined_at_zero_previous() {
        assert!(!ComparisonOp::PctChangeAbove.evaluate(1.0, 50.0, 0.0));
    }

    #[test]
    fn pct_change_tests_magnitude() {
        assert!(ComparisonOp::PctChangeAbove.evaluate(2.5, 103.0, 100.0));
        assert!(ComparisonOp::PctChangeAbove.evaluate(2.5, 97.0, 100.0));
        assert!(!ComparisonOp::PctChangeAbove.evaluate(2.5, 102.0, 100.0));
    }

    #[test]
    fn cooldown_holds_through_the_closed_boundary() {
        let mut rule = default_rules().remove(0);
        let t0 = Utc::now();
        rule.last_fired_at = Some(t0);
        rule.cooldown_minutes = 60;

        assert!(!rule.is_ready(t0 + Duration::minutes(1)));
        assert!(!rule.is_ready(t0 + Duration::minutes(60)));
        assert!(rule.is_ready(t0 + Duration::minutes(60) + Duration::seconds(1)));
    }

    #[test]
    fn disabled_rule_is_never_ready() {
        let mut rule = default_rules().remove(0);
        rule.enabled = false;
        assert!(!rule.is_ready(Utc::now()));
    }

    #[test]
    fn rule_set_roundtrip_preserves_identity() {
        let rules = default_rules();
        let text = export_rules(rules.iter()).unwrap();
        let imported = import_rules(&text).unwrap();
        let mut sorted = rules.clone();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(imported, sorted);
    }

    #[test]
    fn duplicate_ids_rejected_on_import() {
        let mut rules = default_rules();
        let dup = rules[0].clone();
        rules.push(dup);
        let text = serde_json::to_string(&rules).unwrap();
        assert!(matches!(
            import_rules(&text),
            Err(RuleSetError::DuplicateId(_))
        ));
    }
}
