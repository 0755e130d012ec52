//! CopperWatch Monitor — rule-based, multi-tier market risk alerting.
//!
//! This crate screens market data for risk conditions:
//! - A totally ordered three-tier alert level with fixed label/emoji/color
//! - Pure threshold rules (boundary, edge-triggered cross, percent change)
//! - A multi-signal aggregation ladder with co-occurrence and volume
//!   escalation ("many weak signals = one strong signal")
//! - A conjunctive squeeze detector over structural market conditions
//! - A long-lived [`monitor::AlertMonitor`] owning rule state, cooldowns and
//!   a bounded alert history, driven by a periodic background scheduler
//!
//! Notification transport and data connectors are external collaborators
//! behind the [`sink::NotificationSink`] and [`feed::MarketFeed`] traits.

pub mod aggregate;
pub mod feed;
pub mod level;
pub mod monitor;
pub mod rule;
pub mod signal;
pub mod sink;

pub use aggregate::{aggregate_level, check_squeeze, overall_level, SqueezeReading, SqueezeThresholds};
pub use feed::{FeedError, IndicatorPair, MarketFeed, MarketSnapshot};
pub use level::AlertLevel;
pub use monitor::{AlertMonitor, MonitorConfig, MonitorError, MonitorHandle, TickReport};
pub use rule::{AlertRule, ComparisonOp, RuleSetError};
pub use signal::{AlertCategory, AlertSignal};
pub use sink::{ConsoleSink, NotificationSink};
