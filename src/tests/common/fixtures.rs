//! Test Fixtures
//!
//! Small, fully populated builds and candidates used across the unit and
//! property suites.

#![allow(dead_code)]

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::core::build::{
    Ascendancy, BuildGoal, BuildRecord, CharacterClass, ConfigValue, EquipmentSlot, Gem, Item,
    Rarity, SkillGroup, StatMap, ValidatedCandidate, ValidationStatus,
};
use crate::core::generator::default_draft;

// =============================================================================
// Build Records
// =============================================================================

/// A level 92 Deadeye with every region populated.
pub fn sample_record() -> BuildRecord {
    let mut record = default_draft(CharacterClass::Ranger);
    record.character.level = 92;
    record.character.ascendancy = Some(Ascendancy::Deadeye);
    record.passive_tree.ascendancy_name = Ascendancy::Deadeye.display_name().to_string();
    record.passive_tree.mastery_effects.insert(4, 2);
    record.skill_setup[0] = SkillGroup::new("Weapon 1", Gem::active("Lightning Arrow", 20, 20))
        .with_support(Gem::support("Chain", 20, 0))
        .with_support(Gem::support("Lightning Penetration", 19, 5));
    record.items.insert(
        EquipmentSlot::MainHand,
        Item::new("Storm Pull", "Recurve Bow", Rarity::Rare)
            .with_affixes("+52% increased Lightning Damage\nAdds 3 to 88 Lightning Damage"),
    );
    record
        .config_flags
        .insert("enemyIsBoss".to_string(), ConfigValue::Bool(true));
    record.metadata.name = "Storm Deadeye".to_string();
    record.metadata.description = "Chain lightning <fast> & loud".to_string();
    record.metadata.budget = 12.5;
    record.metadata.target_level = 95;
    record.metadata.build_goal = BuildGoal::BossKilling;
    record
}

/// A record with a chosen name and level, otherwise the class defaults.
pub fn named_record(name: &str, level: u32) -> BuildRecord {
    let mut record = default_draft(CharacterClass::Warrior);
    record.character.level = level;
    record.metadata.name = name.to_string();
    record
}

// =============================================================================
// Candidates
// =============================================================================

pub fn stats(pairs: &[(&str, f64)]) -> StatMap {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn candidate(name: &str, stat_pairs: &[(&str, f64)], status: ValidationStatus) -> ValidatedCandidate {
    ValidatedCandidate {
        record: named_record(name, 90),
        computed_stats: stats(stat_pairs),
        interchange_code: None,
        validation_status: status,
        warnings: Vec::new(),
    }
}

// =============================================================================
// Requests
// =============================================================================

pub fn preferences(class: &str, goal: &str, budget: f64) -> Value {
    json!({"class": class, "goal": goal, "budget": budget})
}

pub fn overrides(pairs: &[(&str, ConfigValue)]) -> BTreeMap<String, ConfigValue> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}
