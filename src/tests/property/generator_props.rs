//! Property-based tests for Candidate Generation
//!
//! Tests invariants:
//! - Generation always yields at least one draft
//! - Draft count never exceeds the cap
//! - Every draft matches the requirement's class and level

use proptest::prelude::*;
use serde_json::json;

use crate::core::build::CharacterClass;
use crate::core::codec::validate;
use crate::core::generator::{builtin_templates, CandidateGenerator, GeneratorConfig, PopularSkills};
use crate::core::requirements::{normalize_requirement, Requirement};

fn arb_requirement() -> impl Strategy<Value = Requirement> {
    (
        prop::sample::select(vec![
            "warrior", "ranger", "huntress", "mercenary", "sorceress", "witch", "monk", "druid",
            "Titan", "Infernalist", "unknown",
        ]),
        prop::sample::select(vec![
            "clear_speed", "boss_killing", "endgame_content", "league_start", "budget_friendly", "?",
        ]),
        0.0f64..60.0,
        1u32..=100,
        prop::option::of(prop::sample::select(vec!["mapping", "bossing", "endgame", "budget"])),
    )
        .prop_map(|(class, goal, budget, level, style)| {
            let mut prefs = json!({"class": class, "goal": goal, "budget": budget, "level_target": level});
            if let Some(style) = style {
                prefs["preferred_styles"] = json!([style]);
            }
            normalize_requirement(&prefs).requirement
        })
}

proptest! {
    /// Property: generation is total and respects the cap
    #[test]
    fn prop_generation_total_and_capped(
        requirement in arb_requirement(),
        cap in 0usize..8,
        use_templates in any::<bool>(),
    ) {
        let generator = CandidateGenerator::new(GeneratorConfig { max_candidates: cap, meta_adjustment: true });
        let templates = if use_templates { builtin_templates() } else { Vec::new() };

        let output = generator.generate(&requirement, &templates, &PopularSkills::new()).unwrap();

        prop_assert!(!output.drafts.is_empty());
        prop_assert!(output.drafts.len() <= cap.max(1));
        if !use_templates {
            prop_assert!(output.used_default);
            prop_assert_eq!(output.drafts.len(), 1);
        }
    }

    /// Property: drafts follow the requirement and pass structural checks
    #[test]
    fn prop_drafts_follow_requirement(requirement in arb_requirement()) {
        let output = CandidateGenerator::default()
            .generate(&requirement, &builtin_templates(), &PopularSkills::new())
            .unwrap();

        for draft in &output.drafts {
            prop_assert_eq!(draft.class(), requirement.class);
            prop_assert_eq!(draft.level(), requirement.level_target);
            prop_assert_eq!(draft.metadata.build_goal, requirement.build_goal);
            prop_assert!(draft.metadata.budget >= 0.0);
            let report = validate(draft);
            prop_assert!(report.valid, "{}: {:?}", draft.metadata.name, report.errors);
        }
    }

    /// Property: meta adjustment only ever installs the top popular skill
    #[test]
    fn prop_meta_adjustment_uses_top_skill(
        requirement in arb_requirement(),
        skills in proptest::collection::vec("[A-Z][a-z]{2,8}", 1..4),
    ) {
        let mut popular = PopularSkills::new();
        popular.insert(requirement.class, skills.clone());
        let output = CandidateGenerator::default()
            .generate(&requirement, &builtin_templates(), &popular)
            .unwrap();

        for draft in &output.drafts {
            let main = draft.main_skill().map(|g| g.name.clone()).unwrap_or_default();
            prop_assert!(skills.iter().any(|s| s.eq_ignore_ascii_case(&main)), "{main}");
        }
        prop_assert!(CharacterClass::all().contains(&requirement.class));
    }
}
