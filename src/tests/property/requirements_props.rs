//! Property-based tests for Requirement Normalization
//!
//! Tests invariants:
//! - Never panics on arbitrary maps
//! - Level target and budget always land in range
//! - The goal's style tag is always preferred

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use crate::core::build::{BuildGoal, MAX_LEVEL, MIN_LEVEL};
use crate::core::requirements::{normalize_requirement, LEAGUE_START_BUDGET_CEILING};

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        (-1e4f64..1e4).prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::from),
        ((-100.0f64..100.0), "[a-z]{0,8}").prop_map(|(amount, currency)| json!({"amount": amount, "currency": currency})),
    ]
}

fn arb_preferences() -> impl Strategy<Value = Value> {
    let key = prop::sample::select(vec![
        "class", "ascendancy", "goal", "build_goal", "budget", "level_target", "playstyle",
        "preferred_styles", "defensive_focus", "offensive_focus", "calculation_flags",
        "calculate_stats", "unrelated",
    ]);
    proptest::collection::btree_map(key, arb_value(), 0..10).prop_map(|map| {
        Value::Object(map.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<Map<_, _>>())
    })
}

proptest! {
    /// Property: normalized requirements are always in range
    #[test]
    fn prop_requirement_in_range(prefs in arb_preferences()) {
        let requirement = normalize_requirement(&prefs).requirement;

        prop_assert!((MIN_LEVEL..=MAX_LEVEL).contains(&requirement.level_target));
        prop_assert!(requirement.budget.amount.is_finite());
        prop_assert!(requirement.budget.amount >= 0.0);
        if requirement.build_goal == BuildGoal::LeagueStart {
            prop_assert!(requirement.budget.amount <= LEAGUE_START_BUDGET_CEILING);
        }
        if let Some(ascendancy) = requirement.ascendancy {
            prop_assert_eq!(ascendancy.class(), requirement.class);
        }
    }

    /// Property: the goal's style tag and the playstyle are always preferred
    #[test]
    fn prop_goal_style_preferred(prefs in arb_preferences()) {
        let requirement = normalize_requirement(&prefs).requirement;
        prop_assert!(requirement.prefers(requirement.build_goal.style_tag()));
        prop_assert!(requirement.preferred_styles.contains(&requirement.playstyle));
    }

    /// Property: normalization is deterministic
    #[test]
    fn prop_normalization_deterministic(prefs in arb_preferences()) {
        prop_assert_eq!(normalize_requirement(&prefs), normalize_requirement(&prefs));
    }
}
