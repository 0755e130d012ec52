//! Notification sinks — transport is an external collaborator.

use tracing::info;

use crate::signal::AlertSignal;

/// Receives every fired alert. Email, webhook, or chat transports implement
/// this outside the monitor crate.
pub trait NotificationSink: Send {
    fn notify(&self, signal: &AlertSignal);
}

/// Logs fired alerts through `tracing`.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, signal: &AlertSignal) {
        info!(
            level = signal.level.label(),
            indicator = %signal.indicator,
            value = signal.current_value,
            threshold = signal.threshold,
            "{} {}",
            signal.level.emoji(),
            signal.message
        );
    }
}
