//! Candidate Generator
//!
//! Expands matching templates into budget-tier variants for a requirement.
//! When nothing matches, a single draft is synthesized from class defaults,
//! so generation always yields at least one candidate.

pub mod defaults;
pub mod templates;

pub use defaults::default_draft;
pub use templates::{builtin_templates, BuildTemplate};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::core::build::{BuildRecord, CharacterClass, EquipmentSlot, Rarity};
use crate::core::requirements::Requirement;

/// Popular main skills per class, most popular first.
pub type PopularSkills = BTreeMap<CharacterClass, Vec<String>>;

pub const DEFAULT_MAX_CANDIDATES: usize = 5;

/// Below this budget every slot is magic.
pub const MAGIC_TIER_CEILING: f64 = 5.0;
/// At or above this budget the marquee slots become eligible for uniques.
pub const PREMIUM_TIER_FLOOR: f64 = 15.0;
/// Marquee slots turn unique only strictly above this budget.
pub const UNIQUE_THRESHOLD: f64 = 20.0;

// ============================================================================
// Errors & Config
// ============================================================================

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("No template matched and no default build exists for class {class}")]
    NoTemplateAndNoDefault { class: CharacterClass },
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoTemplateAndNoDefault { .. } => "no_template_and_no_default",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeneratorConfig {
    pub max_candidates: usize,
    /// Swap off-meta main skills for the class's most popular one.
    pub meta_adjustment: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            meta_adjustment: true,
        }
    }
}

// ============================================================================
// Budget Tiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Budget,
    Standard,
    Premium,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 3] = [Self::Budget, Self::Standard, Self::Premium];

    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Budget => 0.7,
            Self::Standard => 1.0,
            Self::Premium => 1.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Budget => "Budget",
            Self::Standard => "Standard",
            Self::Premium => "Premium",
        }
    }
}

/// Item rarity for `slot` at the given budget.
pub fn rarity_for_budget(slot: EquipmentSlot, budget: f64) -> Rarity {
    if budget < MAGIC_TIER_CEILING {
        Rarity::Magic
    } else if budget < PREMIUM_TIER_FLOOR {
        Rarity::Rare
    } else if slot.is_marquee() && budget > UNIQUE_THRESHOLD {
        Rarity::Unique
    } else {
        Rarity::Rare
    }
}

/// Copy of `record` with every item re-tiered for `budget`.
pub fn apply_budget(record: &BuildRecord, budget: f64) -> BuildRecord {
    let mut next = record.clone();
    for (slot, item) in next.items.iter_mut() {
        item.rarity = rarity_for_budget(*slot, budget);
    }
    next.metadata.budget = budget;
    next
}

// ============================================================================
// Generator
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub drafts: Vec<BuildRecord>,
    /// Human-readable notes such as meta substitutions.
    pub notes: Vec<String>,
    pub used_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CandidateGenerator {
    config: GeneratorConfig,
}

impl CandidateGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Templates whose class equals the requirement's and whose style the
    /// requirement prefers, in input order.
    pub fn matching<'a>(&self, requirement: &Requirement, templates: &'a [BuildTemplate]) -> Vec<&'a BuildTemplate> {
        templates
            .iter()
            .filter(|t| t.class == requirement.class && requirement.prefers(&t.style))
            .collect()
    }

    pub fn generate(
        &self,
        requirement: &Requirement,
        templates: &[BuildTemplate],
        popular: &PopularSkills,
    ) -> Result<GenerationOutput, GenerationError> {
        let cap = self.config.max_candidates.max(1);
        let popular = popular.get(&requirement.class).map(Vec::as_slice).unwrap_or_default();
        let mut output = GenerationOutput::default();

        let matched = self.matching(requirement, templates);
        debug!(
            class = %requirement.class,
            goal = %requirement.build_goal,
            matched = matched.len(),
            "expanding templates"
        );

        'templates: for template in matched {
            for tier in BudgetTier::ALL {
                if output.drafts.len() >= cap {
                    break 'templates;
                }
                let budget = requirement.budget.amount * tier.multiplier();
                let name = format!("{} ({})", template.name, tier.label());
                let draft = self.prepare(&template.record, requirement, budget, name, &template.description);
                let draft = self.adjust_for_meta(draft, popular, &mut output.notes);
                output.drafts.push(draft);
            }
        }

        if output.drafts.is_empty() {
            let base = default_draft(requirement.class);
            let name = base.metadata.name.clone();
            let description = base.metadata.description.clone();
            let draft = self.prepare(&base, requirement, requirement.budget.amount, name, &description);
            let draft = self.adjust_for_meta(draft, popular, &mut output.notes);
            output.drafts.push(draft);
            output.used_default = true;
        }

        if output.drafts.is_empty() {
            return Err(GenerationError::NoTemplateAndNoDefault {
                class: requirement.class,
            });
        }
        Ok(output)
    }

    fn prepare(
        &self,
        base: &BuildRecord,
        requirement: &Requirement,
        budget: f64,
        name: String,
        description: &str,
    ) -> BuildRecord {
        let mut draft = apply_budget(base, budget);
        draft.character.class = requirement.class;
        if let Some(ascendancy) = requirement.ascendancy {
            draft.character.ascendancy = Some(ascendancy);
            draft.passive_tree.ascendancy_name = ascendancy.display_name().to_string();
        }
        draft.character.level = requirement.level_target;
        draft.metadata.target_level = requirement.level_target;
        draft.metadata.build_goal = requirement.build_goal;
        draft.metadata.name = name;
        draft.metadata.description = description.to_string();
        draft
    }

    fn adjust_for_meta(&self, draft: BuildRecord, popular: &[String], notes: &mut Vec<String>) -> BuildRecord {
        if !self.config.meta_adjustment {
            return draft;
        }
        let (Some(top), Some(current)) = (popular.first(), draft.main_skill()) else {
            return draft;
        };
        let is_popular = popular.iter().any(|p| p.eq_ignore_ascii_case(&current.name));
        if is_popular {
            return draft;
        }
        notes.push(format!(
            "meta adjustment: '{}' main skill {} replaced by {}",
            draft.metadata.name, current.name, top
        ));
        draft.with_main_skill(top)
    }
}
