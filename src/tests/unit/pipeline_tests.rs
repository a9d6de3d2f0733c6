//! Pipeline behaviour against in-process engines.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::core::build::stats::{stat, DPS};
use crate::core::build::{CalculationMethod, CharacterClass, ConfigValue, ValidationStatus};
use crate::core::codec::encode_compact;
use crate::core::engine::{CalculationEngine, CancelHandle};
use crate::core::generator::GeneratorConfig;
use crate::core::pipeline::{BuildPipeline, PipelineConfig, PipelineInputs};
use crate::core::requirements::CurrencyRates;
use crate::tests::common::{overrides, preferences, sample_record};
use crate::tests::mocks::{dps_stats, Reply, ScriptedEngine};

fn pipeline_with(engine: Arc<ScriptedEngine>) -> BuildPipeline {
    crate::core::logging::init_for_tests();
    let engine: Arc<dyn CalculationEngine> = engine;
    BuildPipeline::new(PipelineConfig::default(), Some(engine))
}

fn names(result: &crate::core::pipeline::PipelineResult) -> Vec<String> {
    result
        .candidates
        .iter()
        .map(|c| c.candidate().name().to_string())
        .collect()
}

// ============================================================================
// Engine Validation
// ============================================================================

#[tokio::test]
async fn test_engine_results_mark_candidates_valid() {
    let engine = ScriptedEngine::dps(5_000.0).into_arc();
    let result = pipeline_with(engine.clone())
        .recommend(&preferences("ranger", "boss_killing", 15.0), &PipelineInputs::default())
        .await
        .unwrap();

    assert_eq!(result.candidates.len(), 3);
    assert_eq!(result.metadata.engine_validated, 3);
    assert_eq!(result.metadata.fallback_validated, 0);
    assert_eq!(engine.calls(), 3);
    for ranked in &result.candidates {
        assert_eq!(ranked.candidate().validation_status, ValidationStatus::Valid);
        assert_eq!(stat(&ranked.candidate().computed_stats, DPS), 5_000.0);
    }
}

#[tokio::test]
async fn test_engine_stats_drive_ranking() {
    let engine = ScriptedEngine::dps(2_000.0)
        .when("(Premium)", Reply::Stats(dps_stats(3_000.0)))
        .when("(Budget)", Reply::Stats(dps_stats(1_000.0)))
        .into_arc();
    let result = pipeline_with(engine)
        .recommend(&preferences("ranger", "bossing", 15.0), &PipelineInputs::default())
        .await
        .unwrap();

    assert_eq!(
        names(&result),
        vec![
            "Lightning Arrow Deadeye (Premium)",
            "Lightning Arrow Deadeye (Standard)",
            "Lightning Arrow Deadeye (Budget)",
        ]
    );
    let ranks: Vec<_> = result.candidates.iter().map(|c| c.rank()).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert!((result.candidates[0].score() - 0.6 * 3_000.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_single_engine_failure_falls_back_for_that_candidate_only() {
    let engine = ScriptedEngine::dps(1_000.0)
        .when("(Standard)", Reply::Fail)
        .into_arc();
    let result = pipeline_with(engine)
        .recommend(&preferences("ranger", "boss_killing", 15.0), &PipelineInputs::default())
        .await
        .unwrap();

    assert_eq!(result.metadata.engine_validated, 2);
    assert_eq!(result.metadata.fallback_validated, 1);
    for ranked in &result.candidates {
        let candidate = ranked.candidate();
        let expected = if candidate.name().ends_with("(Standard)") {
            ValidationStatus::Fallback
        } else {
            ValidationStatus::Valid
        };
        assert_eq!(candidate.validation_status, expected, "{}", candidate.name());
    }
    assert!(result
        .metadata
        .warnings
        .iter()
        .any(|w| w.contains("(Standard)") && w.contains("engine_failed")));
}

#[tokio::test]
async fn test_unavailable_engine_means_all_fallback() {
    let engine = ScriptedEngine::unavailable().into_arc();
    let result = pipeline_with(engine.clone())
        .recommend(&preferences("sorceress", "clear_speed", 10.0), &PipelineInputs::default())
        .await
        .unwrap();

    assert!(!result.candidates.is_empty());
    assert_eq!(result.metadata.engine_validated, 0);
    assert_eq!(engine.calls(), 0);
    assert!(result
        .candidates
        .iter()
        .all(|c| c.candidate().validation_status == ValidationStatus::Fallback));
}

// ============================================================================
// Overrides
// ============================================================================

#[tokio::test]
async fn test_overrides_reach_the_engine_document() {
    let engine = ScriptedEngine::dps(1.0).into_arc();
    let inputs = PipelineInputs {
        config_overrides: overrides(&[
            ("enemy_level", ConfigValue::Number(84.0)),
            ("teleport_enemy", ConfigValue::Bool(true)),
        ]),
        ..PipelineInputs::default()
    };
    let result = pipeline_with(engine.clone())
        .recommend(&preferences("warrior", "boss_killing", 10.0), &inputs)
        .await
        .unwrap();

    let documents = engine.documents();
    assert_eq!(documents.len(), result.candidates.len());
    for document in &documents {
        assert!(document.contains(r#"name="enemyLevel" number="84""#), "{document}");
        assert!(document.contains(r#"name="enemyIsBoss" boolean="true""#), "{document}");
    }
    assert!(result
        .metadata
        .warnings
        .iter()
        .any(|w| w.contains("unknown config override 'teleport_enemy' ignored")));
    // Overrides are applied for calculation only.
    for ranked in &result.candidates {
        assert!(!ranked.candidate().record.config_flags.contains_key("enemyLevel"));
    }
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancellation_keeps_finished_candidates() {
    let engine = ScriptedEngine::dps(1_000.0)
        .when("(Premium)", Reply::Hang)
        .into_arc();
    let pipeline = pipeline_with(engine);
    let handle = CancelHandle::new();
    let prefs = preferences("ranger", "boss_killing", 15.0);
    let inputs = PipelineInputs::default();

    let run = pipeline.recommend_cancellable(&prefs, &inputs, handle.token());
    let canceller = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.cancel();
    };
    let (result, _) = tokio::join!(run, canceller);
    let result = result.unwrap();

    assert!(result.metadata.cancelled);
    assert_eq!(result.metadata.generated, 3);
    assert_eq!(result.candidates.len(), 2);
    assert!(names(&result).iter().all(|n| !n.ends_with("(Premium)")));
}

// ============================================================================
// Generation Inputs
// ============================================================================

#[tokio::test]
async fn test_meta_adjustment_is_reported() {
    let mut popular = BTreeMap::new();
    popular.insert(CharacterClass::Ranger, vec!["Ice Shot".to_string()]);
    let inputs = PipelineInputs {
        popular_skills: popular,
        ..PipelineInputs::default()
    };
    let result = BuildPipeline::new(PipelineConfig::default(), None)
        .recommend(&preferences("ranger", "boss_killing", 15.0), &inputs)
        .await
        .unwrap();

    for ranked in &result.candidates {
        let main = ranked.candidate().record.main_skill().unwrap();
        assert_eq!(main.name, "Ice Shot");
    }
    assert!(result.metadata.warnings.iter().any(|w| w.starts_with("meta adjustment")));
}

#[tokio::test]
async fn test_candidate_cap_from_config() {
    let config = PipelineConfig {
        generator: GeneratorConfig {
            max_candidates: 2,
            meta_adjustment: true,
        },
        ..PipelineConfig::default()
    };
    let result = BuildPipeline::new(config, None)
        .recommend(&preferences("ranger", "boss_killing", 15.0), &PipelineInputs::default())
        .await
        .unwrap();
    assert_eq!(result.candidates.len(), 2);
}

#[tokio::test]
async fn test_budget_converted_with_currency_rates() {
    let inputs = PipelineInputs {
        currency_rates: CurrencyRates::new("divine").with_rate("exalted", 0.1),
        ..PipelineInputs::default()
    };
    let prefs = json!({"class": "ranger", "goal": "boss_killing", "budget": "100 exalted"});
    let result = BuildPipeline::new(PipelineConfig::default(), None)
        .recommend(&prefs, &inputs)
        .await
        .unwrap();

    assert!((result.requirement.budget.amount - 10.0).abs() < 1e-9);
    let standard = result
        .candidates
        .iter()
        .find(|c| c.candidate().name().ends_with("(Standard)"))
        .unwrap();
    assert!((standard.candidate().record.metadata.budget - 10.0).abs() < 1e-9);
    assert!(result.metadata.warnings.iter().any(|w| w.contains("converted")));
}

#[tokio::test]
async fn test_unmatched_class_uses_default_build() {
    let inputs = PipelineInputs {
        templates: Some(Vec::new()),
        ..PipelineInputs::default()
    };
    let result = BuildPipeline::new(PipelineConfig::default(), None)
        .recommend(&preferences("druid", "clear_speed", 3.0), &inputs)
        .await
        .unwrap();

    assert!(result.metadata.used_default_template);
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.candidates[0].candidate().name(), "Druid Default Build");
    assert_eq!(result.candidates[0].candidate().record.class(), CharacterClass::Druid);
}

// ============================================================================
// Import
// ============================================================================

#[tokio::test]
async fn test_import_with_engine() {
    let engine = ScriptedEngine::dps(77_000.0).into_arc();
    let code = encode_compact(&sample_record()).unwrap();
    let imported = pipeline_with(engine)
        .import_build(&code, &BTreeMap::new())
        .await
        .unwrap();

    assert_eq!(imported.method, CalculationMethod::Engine);
    assert_eq!(imported.candidate.validation_status, ValidationStatus::Valid);
    assert_eq!(stat(&imported.candidate.computed_stats, DPS), 77_000.0);
    assert!(imported.report.valid);
    assert_eq!(imported.candidate.interchange_code.as_deref(), Some(code.as_str()));
}
