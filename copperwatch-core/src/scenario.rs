//! Scenario shock library — pure functions mapping a shock scenario to a
//! post-shock price and risk tier.
//!
//! Every shock uses the same elasticity arithmetic:
//! `shocked_price = base_price * (1 + shock_pct * elasticity)`.
//! Scenarios with several historical variants or sub-events evaluate each
//! one and keep the worst.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from scenario computation. Non-fatal: `run_all` omits the failing
/// scenario and records the failure.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("base price must be finite and positive, got {0}")]
    BadBasePrice(f64),
    #[error("scenario {name} has no variants to evaluate")]
    NoVariants { name: &'static str },
    #[error("scenario {name} has a non-finite parameter")]
    BadParameter { name: &'static str },
}

/// Risk tier ladder over the absolute post-shock move (percent units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskTier {
    /// |pct| > 20 → Extreme, > 10 → High, > 5 → Medium, else Low.
    pub fn from_pct_change(pct_change: f64) -> Self {
        let magnitude = pct_change.abs();
        if magnitude > 20.0 {
            RiskTier::Extreme
        } else if magnitude > 10.0 {
            RiskTier::High
        } else if magnitude > 5.0 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

/// Outcome of one shock scenario applied to a baseline price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub baseline_price: f64,
    pub shocked_price: f64,
    /// Percent units: -21.0 means a 21% drop.
    pub pct_change: f64,
    pub risk_tier: RiskTier,
}

/// One historical liquidity-crisis variant: a dollar spike and the copper
/// drawdown realized alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityVariant {
    pub name: String,
    /// Fractional USD index spike (0.08 = +8%).
    pub usd_spike: f64,
    /// Fractional copper drawdown realized in that episode (negative).
    pub copper_drop: f64,
}

/// One named supply disruption sub-event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyEvent {
    pub name: String,
    /// Fractional global supply change (negative = lost supply).
    pub supply_drop: f64,
    /// Price elasticity to a supply loss.
    pub elasticity: f64,
}

/// Parameters for every scenario in the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Fractional demand drop for the demand-collapse scenario (default -30%).
    pub demand_drop: f64,
    /// Copper price elasticity to demand (default 0.7).
    pub demand_elasticity: f64,
    /// USD/copper correlation used by the liquidity-crisis scenario.
    pub usd_copper_correlation: f64,
    pub liquidity_variants: Vec<LiquidityVariant>,
    pub supply_events: Vec<SupplyEvent>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            demand_drop: -0.30,
            demand_elasticity: 0.7,
            usd_copper_correlation: -0.7,
            liquidity_variants: vec![
                LiquidityVariant {
                    name: "covid crash (Mar 2020)".into(),
                    usd_spike: 0.08,
                    copper_drop: -0.30,
                },
                LiquidityVariant {
                    name: "rate shock (Sep 2022)".into(),
                    usd_spike: 0.05,
                    copper_drop: -0.20,
                },
            ],
            supply_events: vec![
                SupplyEvent {
                    name: "chile earthquake".into(),
                    supply_drop: -0.07,
                    elasticity: 2.0,
                },
                SupplyEvent {
                    name: "panama drought".into(),
                    supply_drop: -0.03,
                    elasticity: 1.5,
                },
            ],
        }
    }
}

fn check_base(base_price: f64) -> Result<(), ScenarioError> {
    if !base_price.is_finite() || base_price <= 0.0 {
        return Err(ScenarioError::BadBasePrice(base_price));
    }
    Ok(())
}

fn shock(name: &str, base_price: f64, impact: f64) -> ScenarioResult {
    let shocked_price = base_price * (1.0 + impact);
    let pct_change = impact * 100.0;
    ScenarioResult {
        name: name.to_string(),
        baseline_price: base_price,
        shocked_price,
        pct_change,
        risk_tier: RiskTier::from_pct_change(pct_change),
    }
}

/// Demand-collapse scenario: a demand drop scaled by the demand elasticity.
pub fn demand_collapse(
    base_price: f64,
    config: &ScenarioConfig,
) -> Result<ScenarioResult, ScenarioError> {
    check_base(base_price)?;
    if !config.demand_drop.is_finite() || !config.demand_elasticity.is_finite() {
        return Err(ScenarioError::BadParameter {
            name: "demand_collapse",
        });
    }
    let impact = config.demand_drop * config.demand_elasticity;
    Ok(shock("demand_collapse", base_price, impact))
}

/// Liquidity-crisis scenario: evaluate every historical variant and keep the
/// worst.
///
/// Per variant the impact is the more negative of the correlation-implied
/// move and the drawdown actually realized in that episode.
pub fn liquidity_crisis(
    base_price: f64,
    config: &ScenarioConfig,
) -> Result<ScenarioResult, ScenarioError> {
    check_base(base_price)?;
    if config.liquidity_variants.is_empty() {
        return Err(ScenarioError::NoVariants {
            name: "liquidity_crisis",
        });
    }

    let mut worst: Option<ScenarioResult> = None;
    for variant in &config.liquidity_variants {
        if !variant.usd_spike.is_finite() || !variant.copper_drop.is_finite() {
            return Err(ScenarioError::BadParameter {
                name: "liquidity_crisis",
            });
        }
        let implied = config.usd_copper_correlation * variant.usd_spike;
        let impact = implied.min(variant.copper_drop);
        let result = shock(
            &format!("liquidity_crisis/{}", variant.name),
            base_price,
            impact,
        );
        worst = match worst {
            Some(prev) if prev.pct_change <= result.pct_change => Some(prev),
            _ => Some(result),
        };
    }
    // Non-empty variant list guarantees a result.
    worst.ok_or(ScenarioError::NoVariants {
        name: "liquidity_crisis",
    })
}

/// Supply-disruption scenario: evaluate every named sub-event and keep the
/// one with the largest move. Lost supply pushes the price up.
pub fn supply_disruption(
    base_price: f64,
    config: &ScenarioConfig,
) -> Result<ScenarioResult, ScenarioError> {
    check_base(base_price)?;
    if config.supply_events.is_empty() {
        return Err(ScenarioError::NoVariants {
            name: "supply_disruption",
        });
    }

    let mut worst: Option<ScenarioResult> = None;
    for event in &config.supply_events {
        if !event.supply_drop.is_finite() || !event.elasticity.is_finite() {
            return Err(ScenarioError::BadParameter {
                name: "supply_disruption",
            });
        }
        let impact = event.supply_drop.abs() * event.elasticity;
        let result = shock(
            &format!("supply_disruption/{}", event.name),
            base_price,
            impact,
        );
        worst = match worst {
            Some(prev) if prev.pct_change.abs() >= result.pct_change.abs() => Some(prev),
            _ => Some(result),
        };
    }
    worst.ok_or(ScenarioError::NoVariants {
        name: "supply_disruption",
    })
}

/// Every scenario result plus the single overall worst (most negative
/// pct_change). Failed scenarios are omitted and recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSweep {
    pub results: Vec<ScenarioResult>,
    pub worst: Option<ScenarioResult>,
    pub failures: Vec<String>,
}

/// Run the whole scenario library against one baseline price.
pub fn run_all(base_price: f64, config: &ScenarioConfig) -> ScenarioSweep {
    let mut results = Vec::new();
    let mut failures = Vec::new();

    let scenarios: [(&str, Result<ScenarioResult, ScenarioError>); 3] = [
        ("demand_collapse", demand_collapse(base_price, config)),
        ("liquidity_crisis", liquidity_crisis(base_price, config)),
        ("supply_disruption", supply_disruption(base_price, config)),
    ];
    for (name, outcome) in scenarios {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => failures.push(format!("{name}: {err}")),
        }
    }

    let worst = results
        .iter()
        .min_by(|a, b| a.pct_change.total_cmp(&b.pct_change))
        .cloned();

    ScenarioSweep {
        results,
        worst,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_collapse_reference_vector() {
        // 70000 * (1 + (-0.30 * 0.7)) = 55300.00, -21%, extreme
        let result = demand_collapse(70_000.0, &ScenarioConfig::default()).unwrap();
        assert!((result.shocked_price - 55_300.0).abs() < 1e-9);
        assert!((result.pct_change - (-21.0)).abs() < 1e-9);
        assert_eq!(result.risk_tier, RiskTier::Extreme);
    }

    #[test]
    fn risk_tier_ladder_boundaries() {
        assert_eq!(RiskTier::from_pct_change(-21.0), RiskTier::Extreme);
        assert_eq!(RiskTier::from_pct_change(20.0), RiskTier::High);
        assert_eq!(RiskTier::from_pct_change(-10.5), RiskTier::High);
        assert_eq!(RiskTier::from_pct_change(10.0), RiskTier::Medium);
        assert_eq!(RiskTier::from_pct_change(5.0), RiskTier::Low);
        assert_eq!(RiskTier::from_pct_change(0.0), RiskTier::Low);
    }

    #[test]
    fn liquidity_crisis_takes_worst_variant() {
        let result = liquidity_crisis(70_000.0, &ScenarioConfig::default()).unwrap();
        // Mar 2020: min(-0.7*0.08, -0.30) = -0.30, worse than Sep 2022's -0.20.
        assert!((result.pct_change - (-30.0)).abs() < 1e-9);
        assert!(result.name.contains("Mar 2020"));
        assert_eq!(result.risk_tier, RiskTier::Extreme);
    }

    #[test]
    fn supply_disruption_takes_largest_move() {
        let result = supply_disruption(70_000.0, &ScenarioConfig::default()).unwrap();
        // chile: |-0.07| * 2.0 = +14%; panama: |-0.03| * 1.5 = +4.5%.
        assert!((result.pct_change - 14.0).abs() < 1e-9);
        assert!(result.shocked_price > 70_000.0);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn run_all_reports_every_scenario_and_overall_worst() {
        let sweep = run_all(70_000.0, &ScenarioConfig::default());
        assert_eq!(sweep.results.len(), 3);
        assert!(sweep.failures.is_empty());
        let worst = sweep.worst.unwrap();
        assert!((worst.pct_change - (-30.0)).abs() < 1e-9);
    }

    #[test]
    fn malformed_scenario_omitted_not_fatal() {
        let config = ScenarioConfig {
            demand_drop: f64::NAN,
            ..ScenarioConfig::default()
        };
        let sweep = run_all(70_000.0, &config);
        assert_eq!(sweep.results.len(), 2);
        assert_eq!(sweep.failures.len(), 1);
        assert!(sweep.failures[0].contains("demand_collapse"));
        assert!(sweep.worst.is_some());
    }

    #[test]
    fn bad_base_price_rejected() {
        assert!(matches!(
            demand_collapse(-1.0, &ScenarioConfig::default()),
            Err(ScenarioError::BadBasePrice(_))
        ));
    }
}
