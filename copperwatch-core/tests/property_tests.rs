//! Property tests for validation invariants.
//!
//! Uses proptest to verify:
//! 1. Window plan recurrence — test starts advance by step_size and
//!    train always ends where test begins
//! 2. Directional accuracy stays in [0, 1]
//! 3. Composite confidence score stays in [0, 100]
//! 4. Risk tier ladder is monotone in |pct_change|

use proptest::prelude::*;

use copperwatch_core::confidence::{directional_accuracy, ConfidenceMetrics};
use copperwatch_core::scenario::RiskTier;
use copperwatch_core::windower::{WindowConfig, WindowPlan};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_window_config() -> impl Strategy<Value = WindowConfig> {
    (10usize..400, 1usize..60, 1usize..40, 1usize..300).prop_map(
        |(initial_train_size, test_size, step_size, min_train_size)| WindowConfig {
            initial_train_size,
            test_size,
            step_size,
            min_train_size,
        },
    )
}

fn arb_price_vec() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..200_000.0_f64, 2..64)
}

// ── 1. Window plan recurrence ────────────────────────────────────────

proptest! {
    /// Emitted windows advance test_start by a multiple of step_size and
    /// keep train/test adjacency with no overlap.
    #[test]
    fn window_plan_recurrence(config in arb_window_config(), n in 0usize..1500) {
        let step = config.step_size;
        let min_train = config.min_train_size;
        let test_size = config.test_size;
        let plan = WindowPlan::new(config, n).unwrap();

        let windows: Vec<_> = plan.iter().collect();
        for w in &windows {
            prop_assert_eq!(w.train.end, w.test.start);
            prop_assert_eq!(w.test.len(), test_size);
            prop_assert!(w.train.len() >= min_train);
            prop_assert!(w.test.end <= n);
        }
        for pair in windows.windows(2) {
            let gap = pair[1].test.start - pair[0].test.start;
            prop_assert!(gap >= step);
            prop_assert_eq!(gap % step, 0);
        }
    }

    /// Restarting the iterator yields the identical sequence.
    #[test]
    fn window_plan_restartable(config in arb_window_config(), n in 0usize..1500) {
        let plan = WindowPlan::new(config, n).unwrap();
        let first: Vec<_> = plan.iter().collect();
        let second: Vec<_> = plan.iter().collect();
        prop_assert_eq!(first, second);
    }
}

// ── 2 & 3. Metric bounds ─────────────────────────────────────────────

proptest! {
    #[test]
    fn directional_accuracy_bounded(
        (predicted, actual) in arb_price_vec().prop_flat_map(|p| {
            let len = p.len();
            (Just(p), prop::collection::vec(1.0..200_000.0_f64, len))
        })
    ) {
        let acc = directional_accuracy(&predicted, &actual);
        prop_assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn composite_score_bounded(
        (predicted, actual) in arb_price_vec().prop_flat_map(|p| {
            let len = p.len();
            (Just(p), prop::collection::vec(1.0..200_000.0_f64, len))
        })
    ) {
        let metrics = ConfidenceMetrics::compute(&predicted, &actual).unwrap();
        prop_assert!((0.0..=100.0).contains(&metrics.composite_score));
        prop_assert!(metrics.composite_score.is_finite());
    }
}

// ── 4. Risk tier monotonicity ────────────────────────────────────────

proptest! {
    #[test]
    fn risk_tier_monotone_in_magnitude(a in -100.0..100.0_f64, b in -100.0..100.0_f64) {
        let (small, large) = if a.abs() <= b.abs() { (a, b) } else { (b, a) };
        prop_assert!(RiskTier::from_pct_change(small) <= RiskTier::from_pct_change(large));
    }
}
