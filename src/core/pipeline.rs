//! Pipeline Orchestrator
//!
//! Normalize → Generate → (structural check) → Calculate → Rank.
//!
//! Engine problems never fail a request; they surface as fallback-validated
//! candidates plus warnings in the result metadata. The only hard failures
//! are generation producing nothing and an undecodable import string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::core::build::{
    BuildRecord, CalculationMethod, ConfigValue, StatMap, ValidatedCandidate, ValidationStatus,
};
use crate::core::codec::{self, CodecError, ValidationReport};
use crate::core::engine::{
    CalculationEngine, CalculationResult, CancelToken, ProcessEngine, ValidationAdapter,
};
use crate::core::generator::{
    builtin_templates, BuildTemplate, CandidateGenerator, GenerationError, GeneratorConfig,
    PopularSkills,
};
use crate::core::ranking::{RankedCandidate, RankingConfig, RankingEngine};
use crate::core::requirements::{normalize_requirement_with_rates, CurrencyRates, Requirement};

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Pipeline configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Codec(e) => e.kind(),
            Self::Generation(e) => e.kind(),
            Self::Config(_) => "config",
        }
    }
}

// ============================================================================
// Inputs & Outputs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub generator: GeneratorConfig,
    pub ranking: RankingConfig,
    pub max_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            ranking: RankingConfig::default(),
            max_workers: crate::core::engine::DEFAULT_MAX_WORKERS,
        }
    }
}

/// Data supplied by the surrounding system for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineInputs {
    /// Templates to expand; the built-in library is used when `None`.
    pub templates: Option<Vec<BuildTemplate>>,
    pub popular_skills: PopularSkills,
    pub currency_rates: CurrencyRates,
    /// Logical engine overrides such as `enemy_level`.
    pub config_overrides: BTreeMap<String, ConfigValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineMetadata {
    pub warnings: Vec<String>,
    pub generated: usize,
    pub engine_validated: usize,
    pub fallback_validated: usize,
    pub rejected: usize,
    pub used_default_template: bool,
    /// Set when the request was cancelled before every candidate finished.
    pub cancelled: bool,
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub requirement: Requirement,
    pub candidates: Vec<RankedCandidate>,
    pub rejected: Vec<ValidatedCandidate>,
    pub metadata: PipelineMetadata,
}

/// A caller-supplied build after decoding, checking and calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedBuild {
    pub candidate: ValidatedCandidate,
    pub report: ValidationReport,
    pub method: CalculationMethod,
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Clone)]
pub struct BuildPipeline {
    generator: CandidateGenerator,
    ranking: RankingEngine,
    adapter: ValidationAdapter,
}

impl BuildPipeline {
    pub fn new(config: PipelineConfig, engine: Option<Arc<dyn CalculationEngine>>) -> Self {
        let adapter = match engine {
            Some(engine) => ValidationAdapter::new(engine),
            None => ValidationAdapter::fallback_only(),
        };
        Self {
            generator: CandidateGenerator::new(config.generator),
            ranking: RankingEngine::new(config.ranking),
            adapter: adapter.with_max_workers(config.max_workers),
        }
    }

    /// Pipeline backed by the subprocess engine described in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let engine: Arc<dyn CalculationEngine> = Arc::new(ProcessEngine::new(config.engine.clone()));
        Self::new(config.pipeline_config(), Some(engine))
    }

    pub fn adapter(&self) -> &ValidationAdapter {
        &self.adapter
    }

    pub async fn recommend(
        &self,
        preferences: &Value,
        inputs: &PipelineInputs,
    ) -> Result<PipelineResult, PipelineError> {
        self.recommend_cancellable(preferences, inputs, CancelToken::never())
            .await
    }

    /// Run the full pipeline. Candidates still calculating when `cancel`
    /// fires are dropped; finished ones are ranked as usual.
    pub async fn recommend_cancellable(
        &self,
        preferences: &Value,
        inputs: &PipelineInputs,
        cancel: CancelToken,
    ) -> Result<PipelineResult, PipelineError> {
        let started = Instant::now();
        let mut warnings = Vec::new();

        let normalized = normalize_requirement_with_rates(preferences, &inputs.currency_rates);
        warnings.extend(normalized.warnings.into_iter().map(|w| format!("requirement: {w}")));
        let requirement = normalized.requirement;
        let flags = requirement.calculation_flags;

        let builtin;
        let templates: &[BuildTemplate] = match &inputs.templates {
            Some(templates) => templates,
            None => {
                builtin = builtin_templates();
                &builtin
            }
        };
        let generation = self
            .generator
            .generate(&requirement, templates, &inputs.popular_skills)?;
        warnings.extend(generation.notes.iter().cloned());
        let generated = generation.drafts.len();

        // Structural check before any engine time is spent.
        let mut accepted: Vec<(BuildRecord, Vec<String>)> = Vec::with_capacity(generated);
        let mut rejected = Vec::new();
        for draft in generation.drafts {
            if !flags.validate_build {
                accepted.push((draft, Vec::new()));
                continue;
            }
            let report = codec::validate(&draft);
            if report.valid {
                accepted.push((draft, report.warnings));
            } else {
                warnings.push(format!(
                    "{}: rejected ({})",
                    draft.metadata.name,
                    report.errors.join("; ")
                ));
                rejected.push(ValidatedCandidate {
                    record: draft,
                    computed_stats: StatMap::new(),
                    interchange_code: None,
                    validation_status: ValidationStatus::Rejected,
                    warnings: report.errors,
                });
            }
        }

        let records: Vec<BuildRecord> = accepted.iter().map(|(r, _)| r.clone()).collect();
        let results: Vec<Option<CalculationResult>> = if flags.calculate_stats {
            self.adapter
                .batch_calculate_cancellable(&records, &inputs.config_overrides, cancel)
                .await
                .into_iter()
                .map(|entry| {
                    if let Some(error) = &entry.error {
                        warnings.push(format!("candidate {}: worker error: {error}", entry.index));
                    }
                    entry.result
                })
                .collect()
        } else {
            records
                .iter()
                .map(|r| Some(self.adapter.estimate_only(r, "stat calculation disabled")))
                .collect()
        };

        let mut cancelled = false;
        let mut validated = Vec::with_capacity(records.len());
        for ((record, mut candidate_warnings), result) in accepted.into_iter().zip(results) {
            let Some(result) = result else {
                cancelled = true;
                continue;
            };
            candidate_warnings.extend(result.warnings);
            let interchange_code = if flags.generate_import_code {
                match codec::encode_compact(&record) {
                    Ok(code) => Some(code),
                    Err(e) => {
                        candidate_warnings.push(format!("import code unavailable: {e}"));
                        None
                    }
                }
            } else {
                None
            };
            for w in &candidate_warnings {
                warnings.push(format!("{}: {w}", record.metadata.name));
            }
            validated.push(ValidatedCandidate {
                record,
                computed_stats: result.stats,
                interchange_code,
                validation_status: result.method.status(),
                warnings: candidate_warnings,
            });
        }

        let engine_validated = validated
            .iter()
            .filter(|c| c.validation_status == ValidationStatus::Valid)
            .count();
        let fallback_validated = validated.len() - engine_validated;
        let candidates = self.ranking.rank(requirement.build_goal, validated);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if cancelled {
            warn!(completed = candidates.len(), generated, "pipeline cancelled; returning partial results");
        }
        info!(
            class = %requirement.class,
            goal = %requirement.build_goal,
            generated,
            ranked = candidates.len(),
            engine_validated,
            fallback_validated,
            rejected = rejected.len(),
            elapsed_ms,
            "build pipeline finished"
        );

        Ok(PipelineResult {
            metadata: PipelineMetadata {
                warnings,
                generated,
                engine_validated,
                fallback_validated,
                rejected: rejected.len(),
                used_default_template: generation.used_default,
                cancelled,
                elapsed_ms,
                generated_at: Utc::now(),
            },
            requirement,
            candidates,
            rejected,
        })
    }

    /// Decode a compact build string, check it and calculate its stats.
    pub async fn import_build(
        &self,
        code: &str,
        overrides: &BTreeMap<String, ConfigValue>,
    ) -> Result<ImportedBuild, PipelineError> {
        let normalized = codec::decode_compact_normalized(code)?;
        let record = normalized.record;
        let report = codec::validate(&record);

        let result = self.adapter.calculate(&record, overrides).await;
        let mut warnings = normalized.warnings;
        warnings.extend(report.warnings.iter().cloned());
        warnings.extend(report.errors.iter().cloned());
        warnings.extend(result.warnings);

        let status = if report.valid {
            result.method.status()
        } else {
            ValidationStatus::Rejected
        };
        let interchange_code = codec::encode_compact(&record)?;

        Ok(ImportedBuild {
            candidate: ValidatedCandidate {
                record,
                computed_stats: result.stats,
                interchange_code: Some(interchange_code),
                validation_status: status,
                warnings,
            },
            report,
            method: result.method,
        })
    }
}
