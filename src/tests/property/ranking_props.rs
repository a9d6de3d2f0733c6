//! Property-based tests for Candidate Ranking
//!
//! Tests invariants:
//! - Scores never increase down the list
//! - Ranks are 1..=n
//! - Equal scores keep input order
//! - More DPS never lowers a score

use proptest::prelude::*;

use crate::core::build::stats::{
    CHAOS_RES, COLD_RES, DPS, EFFECTIVE_HEALTH_POOL, FIRE_RES, LIGHTNING_RES, MOVEMENT_SPEED,
};
use crate::core::build::{BuildGoal, StatMap, ValidationStatus};
use crate::core::ranking::{score, RankingEngine};
use crate::tests::common::candidate;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

fn arb_stats() -> impl Strategy<Value = StatMap> {
    (
        0.0f64..1e6,
        0.0f64..1e5,
        0.0f64..5.0,
        -60.0f64..90.0,
        -60.0f64..90.0,
        -60.0f64..90.0,
        -60.0f64..90.0,
    )
        .prop_map(|(dps, ehp, ms, fire, cold, lightning, chaos)| {
            [
                (DPS, dps),
                (EFFECTIVE_HEALTH_POOL, ehp),
                (MOVEMENT_SPEED, ms),
                (FIRE_RES, fire),
                (COLD_RES, cold),
                (LIGHTNING_RES, lightning),
                (CHAOS_RES, chaos),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
        })
}

fn arb_goal() -> impl Strategy<Value = BuildGoal> {
    prop::sample::select(BuildGoal::all().to_vec())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: output is ordered best first with dense 1-based ranks
    #[test]
    fn prop_ranked_descending(goal in arb_goal(), all_stats in proptest::collection::vec(arb_stats(), 0..12)) {
        let candidates = all_stats
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut c = candidate(&format!("c{i}"), &[], ValidationStatus::Valid);
                c.computed_stats = s.clone();
                c
            })
            .collect::<Vec<_>>();
        let n = candidates.len();
        let ranked = RankingEngine::default().rank(goal, candidates);

        prop_assert_eq!(ranked.len(), n);
        for (i, r) in ranked.iter().enumerate() {
            prop_assert_eq!(r.rank(), i + 1);
        }
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score() >= pair[1].score());
        }
    }

    /// Property: ties keep their input order
    #[test]
    fn prop_ties_are_stable(goal in arb_goal(), stats in arb_stats(), copies in 2usize..8) {
        let candidates = (0..copies)
            .map(|i| {
                let mut c = candidate(&format!("copy{i}"), &[], ValidationStatus::Valid);
                c.computed_stats = stats.clone();
                c
            })
            .collect::<Vec<_>>();
        let ranked = RankingEngine::default().rank(goal, candidates);
        let names: Vec<String> = ranked.iter().map(|r| r.candidate().name().to_string()).collect();
        let expected: Vec<String> = (0..copies).map(|i| format!("copy{i}")).collect();
        prop_assert_eq!(names, expected);
    }

    /// Property: more DPS never lowers the score
    #[test]
    fn prop_dps_monotone(goal in arb_goal(), stats in arb_stats(), extra in 0.0f64..1e5) {
        let mut boosted = stats.clone();
        *boosted.entry(DPS.to_string()).or_insert(0.0) += extra;
        prop_assert!(score(goal, &boosted) >= score(goal, &stats));
    }

    /// Property: scoring is deterministic
    #[test]
    fn prop_score_deterministic(goal in arb_goal(), stats in arb_stats()) {
        prop_assert_eq!(score(goal, &stats).to_bits(), score(goal, &stats.clone()).to_bits());
    }
}
