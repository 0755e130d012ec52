//! The alert monitor — the only long-lived stateful component.
//!
//! Owns the rule map, cooldown clocks, and a bounded, age-pruned alert
//! history. Ticks are driven externally: either directly via
//! [`AlertMonitor::tick`] or by the background scheduler in
//! [`MonitorHandle`]. Rule mutation and ticks are serialized behind one
//! mutex; history reads hand out cloned snapshots.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregate::{aggregate_level, check_squeeze, overall_level, SqueezeThresholds};
use crate::feed::{MarketFeed, MarketSnapshot};
use crate::level::AlertLevel;
use crate::rule::{self, AlertRule, RuleSetError};
use crate::signal::AlertSignal;
use crate::sink::NotificationSink;

/// Errors from monitor rule management.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("a rule with id {0} already exists")]
    DuplicateRule(String),
    #[error("no rule with id {0}")]
    UnknownRule(String),
    #[error("failed to spawn monitor thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error(transparent)]
    RuleSet(#[from] RuleSetError),
}

/// Monitor limits and squeeze thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Hard cap on retained alerts (default 1000).
    pub max_history: usize,
    /// Alerts older than this are pruned (default 7 days).
    pub history_retention_hours: i64,
    pub squeeze: SqueezeThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_history: 1_000,
            history_retention_hours: 7 * 24,
            squeeze: SqueezeThresholds::default(),
        }
    }
}

/// Outcome of one evaluation tick.
#[derive(Debug)]
pub struct TickReport {
    pub fired: Vec<AlertSignal>,
    /// Ladder result over the rule-driven signals.
    pub ladder: AlertLevel,
    /// Independent squeeze check, when structural readings were supplied.
    pub squeeze: Option<AlertSignal>,
    /// Higher of ladder and squeeze.
    pub overall: AlertLevel,
    /// Per-rule evaluation errors, skipped for this tick only.
    pub errors: Vec<String>,
}

/// Persistent rule state, cooldowns, and alert history.
pub struct AlertMonitor {
    config: MonitorConfig,
    rules: HashMap<String, AlertRule>,
    history: VecDeque<AlertSignal>,
    sinks: Vec<Box<dyn NotificationSink>>,
    current_level: AlertLevel,
}

impl AlertMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            rules: HashMap::new(),
            history: VecDeque::new(),
            sinks: Vec::new(),
            current_level: AlertLevel::Normal,
        }
    }

    /// Monitor preloaded with the default copper rule templates.
    pub fn with_default_rules(config: MonitorConfig) -> Self {
        let mut monitor = Self::new(config);
        for r in rule::default_rules() {
            // Template ids are distinct by construction.
            let _ = monitor.add_rule(r);
        }
        monitor
    }

    // ─── Rule management ─────────────────────────────────────────────

    pub fn add_rule(&mut self, rule: AlertRule) -> Result<(), MonitorError> {
        if self.rules.contains_key(&rule.id) {
            return Err(MonitorError::DuplicateRule(rule.id));
        }
        self.rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    pub fn remove_rule(&mut self, id: &str) -> Option<AlertRule> {
        self.rules.remove(id)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), MonitorError> {
        match self.rules.get_mut(id) {
            Some(rule) => {
                rule.enabled = enabled;
                Ok(())
            }
            None => Err(MonitorError::UnknownRule(id.to_string())),
        }
    }

    pub fn rule(&self, id: &str) -> Option<&AlertRule> {
        self.rules.get(id)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    /// Export the rule set as JSON text.
    pub fn export_rules(&self) -> Result<String, RuleSetError> {
        rule::export_rules(self.rules.values())
    }

    /// Import rules from JSON text. Ids colliding with existing rules are
    /// rejected before anything is inserted.
    pub fn import_rules(&mut self, text: &str) -> Result<usize, MonitorError> {
        let imported = rule::import_rules(text)?;
        for r in &imported {
            if self.rules.contains_key(&r.id) {
                return Err(MonitorError::DuplicateRule(r.id.clone()));
            }
        }
        let count = imported.len();
        for r in imported {
            self.rules.insert(r.id.clone(), r);
        }
        Ok(count)
    }

    // ─── Evaluation ──────────────────────────────────────────────────

    /// Evaluate every enabled, non-cooling rule against the snapshot.
    ///
    /// A single rule's evaluation error is recorded and skipped; the tick
    /// always runs to completion.
    pub fn tick(&mut self, now: DateTime<Utc>, snapshot: &MarketSnapshot) -> TickReport {
        let mut fired = Vec::new();
        let mut errors = Vec::new();

        // Deterministic evaluation order.
        let mut ids: Vec<String> = self.rules.keys().cloned().collect();
        ids.sort();

        for id in ids {
            let Some(rule) = self.rules.get_mut(&id) else {
                continue;
            };
            if !rule.is_ready(now) {
                continue;
            }
            let Some(pair) = snapshot.pair(&rule.indicator) else {
                warn!(rule = %id, indicator = %rule.indicator, "indicator missing from snapshot, rule skipped this tick");
                errors.push(format!("{id}: indicator {} missing", rule.indicator));
                continue;
            };
            if !pair.latest.is_finite() || !pair.previous.is_finite() {
                warn!(rule = %id, "non-finite indicator value, rule skipped this tick");
                errors.push(format!("{id}: non-finite indicator value"));
                continue;
            }

            if rule.evaluate(pair.latest, pair.previous) {
                let signal = AlertSignal {
                    level: rule.level,
                    category: rule.category,
                    indicator: rule.indicator.clone(),
                    current_value: pair.latest,
                    threshold: rule.threshold,
                    message: format!(
                        "{}: {} at {:.2} (threshold {:.2})",
                        rule.name, rule.indicator, pair.latest, rule.threshold
                    ),
                    timestamp: now,
                    recommended_actions: rule.actions.clone(),
                };
                rule.last_fired_at = Some(now);
                self.dispatch(&signal);
                fired.push(signal);
            }
        }

        let ladder = aggregate_level(&fired);
        let squeeze = snapshot
            .squeeze
            .as_ref()
            .and_then(|reading| check_squeeze(reading, &self.config.squeeze, now));
        if let Some(signal) = &squeeze {
            self.dispatch(signal);
        }

        let overall = overall_level(ladder, squeeze.as_ref());
        self.current_level = overall;
        self.prune_history(now);

        TickReport {
            fired,
            ladder,
            squeeze,
            overall,
            errors,
        }
    }

    fn dispatch(&mut self, signal: &AlertSignal) {
        for sink in &self.sinks {
            sink.notify(signal);
        }
        self.history.push_back(signal.clone());
    }

    fn prune_history(&mut self, now: DateTime<Utc>) {
        let retention = Duration::hours(self.config.history_retention_hours);
        while let Some(front) = self.history.front() {
            if now - front.timestamp > retention {
                self.history.pop_front();
            } else {
                break;
            }
        }
        while self.history.len() > self.config.max_history {
            self.history.pop_front();
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────

    pub fn current_level(&self) -> AlertLevel {
        self.current_level
    }

    /// Alerts fired within the last `hours`, as a cloned snapshot.
    pub fn recent_alerts(&self, now: DateTime<Utc>, hours: i64) -> Vec<AlertSignal> {
        let cutoff = now - Duration::hours(hours);
        self.history
            .iter()
            .filter(|s| s.timestamp > cutoff)
            .cloned()
            .collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

// ─── Background scheduler ────────────────────────────────────────────

/// Handle to a monitor running on its own thread.
///
/// The monitor stays owned by the caller through the shared mutex: rule
/// mutation from other threads and in-progress ticks are mutually
/// exclusive. Dropping the handle without calling [`stop`](Self::stop)
/// leaves the thread running until the process exits.
pub struct MonitorHandle {
    monitor: Arc<Mutex<AlertMonitor>>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Spawn the polling loop. `poll_interval` defaults to 60s at the
    /// call sites that read it from config.
    pub fn spawn<F>(
        monitor: AlertMonitor,
        mut feed: F,
        poll_interval: StdDuration,
    ) -> Result<Self, MonitorError>
    where
        F: MarketFeed + 'static,
    {
        let monitor = Arc::new(Mutex::new(monitor));
        let stop = Arc::new(AtomicBool::new(false));

        let thread_monitor = Arc::clone(&monitor);
        let thread_stop = Arc::clone(&stop);
        let join = thread::Builder::new()
            .name("copperwatch-monitor".into())
            .spawn(move || {
                info!(interval_secs = poll_interval.as_secs(), "alert monitor started");
                while !thread_stop.load(Ordering::Relaxed) {
                    match feed.poll() {
                        Ok(snapshot) => {
                            if let Ok(mut guard) = thread_monitor.lock() {
                                let report = guard.tick(Utc::now(), &snapshot);
                                if !report.fired.is_empty() {
                                    info!(
                                        fired = report.fired.len(),
                                        level = report.overall.label(),
                                        "tick complete"
                                    );
                                }
                            }
                        }
                        Err(err) => warn!(%err, "feed poll failed, will retry next interval"),
                    }

                    // Sleep in short slices so stop() takes effect promptly.
                    let deadline = Instant::now() + poll_interval;
                    while Instant::now() < deadline {
                        if thread_stop.load(Ordering::Relaxed) {
                            break;
                        }
                        thread::sleep(StdDuration::from_millis(50).min(poll_interval));
                    }
                }
                info!("alert monitor stopped");
            })?;

        Ok(Self {
            monitor,
            stop,
            join: Some(join),
        })
    }

    /// Shared access to the monitor for rule mutation and history queries.
    pub fn monitor(&self) -> Arc<Mutex<AlertMonitor>> {
        Arc::clone(&self.monitor)
    }

    /// Signal the loop to stop and join the thread.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::IndicatorPair;
    use crate::rule::ComparisonOp;
    use crate::signal::AlertCategory;

    fn snapshot(latest: f64, previous: f64) -> MarketSnapshot {
        let mut s = MarketSnapshot::new(Utc::now());
        s.set("close", IndicatorPair { latest, previous });
        s
    }

    fn above_rule(id: &str, level: AlertLevel, threshold: f64) -> AlertRule {
        AlertRule {
            id: id.into(),
            name: id.into(),
            category: AlertCategory::PriceAction,
            level,
            indicator: "close".into(),
            op: ComparisonOp::Above,
            threshold,
            cooldown_minutes: 60,
            enabled: true,
            last_fired_at: None,
            actions: vec![],
        }
    }

    #[test]
    fn tick_fires_and_aggregates() {
        let mut monitor = AlertMonitor::new(MonitorConfig::default());
        monitor.add_rule(above_rule("a", AlertLevel::Level1, 100.0)).unwrap();
        monitor.add_rule(above_rule("b", AlertLevel::Level2, 100.0)).unwrap();

        let report = monitor.tick(Utc::now(), &snapshot(101.0, 99.0));
        assert_eq!(report.fired.len(), 2);
        assert_eq!(report.overall, AlertLevel::Level2);
        assert_eq!(monitor.current_level(), AlertLevel::Level2);
        assert_eq!(monitor.history_len(), 2);
    }

    #[test]
    fn cooldown_suppresses_refire_until_elapsed() {
        let mut monitor = AlertMonitor::new(MonitorConfig::default());
        monitor.add_rule(above_rule("a", AlertLevel::Level1, 100.0)).unwrap();

        let t0 = Utc::now();
        let report = monitor.tick(t0, &snapshot(101.0, 99.0));
        assert_eq!(report.fired.len(), 1);

        // Condition stays true through the whole cooldown window.
        for minutes in [1i64, 30, 60] {
            let report = monitor.tick(t0 + Duration::minutes(minutes), &snapshot(101.0, 99.0));
            assert!(report.fired.is_empty(), "fired again at +{minutes}min");
        }

        let report = monitor.tick(
            t0 + Duration::minutes(60) + Duration::seconds(1),
            &snapshot(101.0, 99.0),
        );
        assert_eq!(report.fired.len(), 1);
    }

    #[test]
    fn missing_indicator_skips_rule_but_not_tick() {
        let mut monitor = AlertMonitor::new(MonitorConfig::default());
        let mut rule = above_rule("needs_vol", AlertLevel::Level1, 1.0);
        rule.indicator = "volatility_20d".into();
        monitor.add_rule(rule).unwrap();
        monitor.add_rule(above_rule("a", AlertLevel::Level1, 100.0)).unwrap();

        let report = monitor.tick(Utc::now(), &snapshot(101.0, 99.0));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.fired.len(), 1);
    }

    #[test]
    fn disabled_rule_does_not_fire() {
        let mut monitor = AlertMonitor::new(MonitorConfig::default());
        monitor.add_rule(above_rule("a", AlertLevel::Level1, 100.0)).unwrap();
        monitor.set_enabled("a", false).unwrap();

        let report = monitor.tick(Utc::now(), &snapshot(101.0, 99.0));
        assert!(report.fired.is_empty());

        monitor.set_enabled("a", true).unwrap();
        let report = monitor.tick(Utc::now(), &snapshot(101.0, 99.0));
        assert_eq!(report.fired.len(), 1);
    }

    #[test]
    fn history_is_bounded() {
        let config = MonitorConfig {
            max_history: 3,
            ..MonitorConfig::default()
        };
        let mut monitor = AlertMonitor::new(config);
        let mut rule = above_rule("a", AlertLevel::Level1, 100.0);
        rule.cooldown_minutes = 0;
        monitor.add_rule(rule).unwrap();

        let t0 = Utc::now();
        for i in 0..10 {
            monitor.tick(t0 + Duration::minutes(i), &snapshot(101.0, 99.0));
        }
        assert_eq!(monitor.history_len(), 3);
    }

    #[test]
    fn recent_alerts_filters_by_age() {
        let mut monitor = AlertMonitor::new(MonitorConfig::default());
        let mut rule = above_rule("a", AlertLevel::Level1, 100.0);
        rule.cooldown_minutes = 0;
        monitor.add_rule(rule).unwrap();

        let t0 = Utc::now();
        monitor.tick(t0, &snapshot(101.0, 99.0));
        monitor.tick(t0 + Duration::hours(30), &snapshot(101.0, 99.0));

        let recent = monitor.recent_alerts(t0 + Duration::hours(30), 24);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn rule_roundtrip_through_monitor() {
        let mut monitor = AlertMonitor::with_default_rules(MonitorConfig::default());
        let text = monitor.export_rules().unwrap();

        let mut restored = AlertMonitor::new(MonitorConfig::default());
        let count = restored.import_rules(&text).unwrap();
        assert_eq!(count, monitor.rule_count());
        assert_eq!(restored.export_rules().unwrap(), text);

        // Second import collides on every id.
        assert!(matches!(
            monitor.import_rules(&text),
            Err(MonitorError::DuplicateRule(_))
        ));
    }
}
