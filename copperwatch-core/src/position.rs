//! Position risk advisor — sizing and protective levels derived from a
//! confidence score and realized volatility.

use serde::{Deserialize, Serialize};

/// Sizing and protective-level parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionConfig {
    /// Fraction of account value committed at full confidence (default 2%).
    pub base_fraction: f64,
    /// Hard cap on the committed fraction (default 10%).
    pub max_fraction: f64,
    /// Stop-loss distance from entry (default 3%).
    pub stop_loss_pct: f64,
    /// Take-profit distance from entry (default 5%).
    pub take_profit_pct: f64,
    /// Daily volatility at which sizing is calibrated; higher volatility
    /// shrinks the position and widens the stop (default 5%).
    pub vol_calibration: f64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            base_fraction: 0.02,
            max_fraction: 0.10,
            stop_loss_pct: 0.03,
            take_profit_pct: 0.05,
            vol_calibration: 0.05,
        }
    }
}

/// Position sizing and protective levels for one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionAdvice {
    pub position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub volatility: f64,
}

/// Classification of an open position against its protective levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Hold,
    StopLoss,
    TakeProfit,
}

impl PositionConfig {
    /// Recommended position size in account currency.
    ///
    /// `account * min(max_fraction, base_fraction * score/100 * min(1, calib/vol))`.
    pub fn position_size(&self, account_value: f64, confidence_score: f64, volatility: f64) -> f64 {
        let confidence_factor = confidence_score / 100.0;
        let vol_adjustment = if volatility > 0.0 {
            (self.vol_calibration / volatility).min(1.0)
        } else {
            1.0
        };
        let fraction = (self.base_fraction * confidence_factor * vol_adjustment)
            .min(self.max_fraction);
        account_value * fraction
    }

    /// Stop-loss and take-profit levels from an entry price.
    ///
    /// When volatility exceeds the calibration point the stop widens by
    /// `min(2.0, volatility * 100)`.
    pub fn protective_levels(&self, entry_price: f64, volatility: f64) -> (f64, f64) {
        let mut stop_pct = self.stop_loss_pct;
        if volatility > self.vol_calibration {
            stop_pct *= (volatility * 100.0).min(2.0);
        }
        let stop_loss = entry_price * (1.0 - stop_pct);
        let take_profit = entry_price * (1.0 + self.take_profit_pct);
        (stop_loss, take_profit)
    }

    /// Full advice bundle for one prospective entry.
    pub fn advise(
        &self,
        account_value: f64,
        confidence_score: f64,
        entry_price: f64,
        volatility: f64,
    ) -> PositionAdvice {
        let (stop_loss, take_profit) = self.protective_levels(entry_price, volatility);
        PositionAdvice {
            position_size: self.position_size(account_value, confidence_score, volatility),
            stop_loss,
            take_profit,
            volatility,
        }
    }
}

/// Classify an open position and report realized pnl percent.
pub fn check_position(
    current_price: f64,
    entry_price: f64,
    stop_loss: f64,
    take_profit: f64,
) -> (PositionStatus, f64) {
    let pnl_pct = (current_price - entry_price) / entry_price * 100.0;
    let status = if current_price <= stop_loss {
        PositionStatus::StopLoss
    } else if current_price >= take_profit {
        PositionStatus::TakeProfit
    } else {
        PositionStatus::Hold
    };
    (status, pnl_pct)
}
