//! Plain-text risk report with a fixed section order:
//! model confidence → stress test → position recommendations.
//!
//! Downstream layers (web front end, slide generation) format this further;
//! this module only produces structured plain text.

use std::fmt::Write;

use crate::confidence::{ConfidenceBand, ConfidenceMetrics};
use crate::position::{PositionAdvice, PositionConfig};
use crate::scenario::ScenarioSweep;
use crate::validate::{FoldOutcomes, Regime, RegimeMetrics};

const RULE: &str = "============================================================";

/// Render the validation outcome as a fixed-order plain-text report.
pub fn render(
    metrics: &ConfidenceMetrics,
    band: ConfidenceBand,
    folds: &FoldOutcomes,
    regimes: &[RegimeMetrics],
    scenarios: Option<&ScenarioSweep>,
    advice: Option<&PositionAdvice>,
    position: &PositionConfig,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "RISK VALIDATION REPORT");
    let _ = writeln!(out, "{RULE}");

    render_confidence(&mut out, metrics, band, folds, regimes);
    render_stress_test(&mut out, scenarios);
    render_recommendations(&mut out, advice, position);

    let _ = writeln!(out, "{RULE}");
    out
}

fn render_confidence(
    out: &mut String,
    metrics: &ConfidenceMetrics,
    band: ConfidenceBand,
    folds: &FoldOutcomes,
    regimes: &[RegimeMetrics],
) {
    let _ = writeln!(out, "\n[MODEL CONFIDENCE]");
    let _ = writeln!(out, "  composite score: {:.2}/100 ({band:?})", metrics.composite_score);
    let _ = writeln!(out, "  r²: {:.4}", metrics.r2);
    let _ = writeln!(
        out,
        "  directional accuracy: {:.2}%",
        metrics.directional_accuracy * 100.0
    );
    let _ = writeln!(
        out,
        "  rmse: {:.2} (normalized {:.2}%)",
        metrics.rmse,
        metrics.normalized_rmse * 100.0
    );
    let _ = writeln!(out, "  mae: {:.2}", metrics.mae);
    let _ = writeln!(
        out,
        "  max error: {:.2} ({:.2}%)",
        metrics.max_error, metrics.max_error_pct
    );
    let _ = writeln!(
        out,
        "  windows: {} evaluated, {} skipped, {} failed",
        folds.evaluated, folds.skipped, folds.failed
    );
    for regime in regimes {
        let label = match regime.regime {
            Regime::Trending => "trending",
            Regime::Sideways => "sideways",
        };
        let _ = writeln!(
            out,
            "  {label} market ({} samples): rmse {:.2}, mae {:.2}, dir acc {:.2}%",
            regime.count,
            regime.rmse,
            regime.mae,
            regime.directional_accuracy * 100.0
        );
    }
}

fn render_stress_test(out: &mut String, scenarios: Option<&ScenarioSweep>) {
    let _ = writeln!(out, "\n[STRESS TEST]");
    let Some(sweep) = scenarios else {
        let _ = writeln!(out, "  not run (no base prediction supplied)");
        return;
    };
    for result in &sweep.results {
        let _ = writeln!(
            out,
            "  {}: {:.2} -> {:.2} ({:+.2}%, {:?})",
            result.name,
            result.baseline_price,
            result.shocked_price,
            result.pct_change,
            result.risk_tier
        );
    }
    for failure in &sweep.failures {
        let _ = writeln!(out, "  omitted: {failure}");
    }
    if let Some(worst) = &sweep.worst {
        let _ = writeln!(
            out,
            "  worst case: {} at {:.2} ({:+.2}%)",
            worst.name, worst.shocked_price, worst.pct_change
        );
        let _ = writeln!(
            out,
            "  max potential loss: {:.2}%",
            worst.pct_change.min(0.0).abs()
        );
    }
}

fn render_recommendations(
    out: &mut String,
    advice: Option<&PositionAdvice>,
    position: &PositionConfig,
) {
    let _ = writeln!(out, "\n[POSITION RECOMMENDATIONS]");
    if let Some(advice) = advice {
        let _ = writeln!(out, "  recommended position: {:.2}", advice.position_size);
        let _ = writeln!(out, "  stop-loss: {:.2}", advice.stop_loss);
        let _ = writeln!(out, "  take-profit: {:.2}", advice.take_profit);
        let _ = writeln!(
            out,
            "  realized daily volatility: {:.2}%",
            advice.volatility * 100.0
        );
    }
    let _ = writeln!(
        out,
        "  max single-day stop: {:.1}%",
        position.stop_loss_pct * 100.0
    );
    let _ = writeln!(
        out,
        "  profit target: {:.1}%",
        position.take_profit_pct * 100.0
    );
    let _ = writeln!(
        out,
        "  position cap: {:.0}% of account, scaled by confidence",
        position.max_fraction * 100.0
    );
}
