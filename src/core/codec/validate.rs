//! Structural validation of build records.
//!
//! Errors make a record unusable; warnings flag builds that look unfinished
//! but can still be calculated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::is_supported_version;
use crate::core::build::{BuildRecord, CharacterClass, EquipmentSlot, MAX_LEVEL, MIN_LEVEL};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// Check a typed record.
pub fn validate(record: &BuildRecord) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !is_supported_version(&record.version) {
        report
            .errors
            .push(format!("unsupported format version '{}'", record.version));
    }

    let level_range = MIN_LEVEL..=MAX_LEVEL;
    if !level_range.contains(&record.character.level) {
        report.errors.push(format!(
            "character level {} outside {MIN_LEVEL}-{MAX_LEVEL}",
            record.character.level
        ));
    }
    if !level_range.contains(&record.metadata.target_level) {
        report.errors.push(format!(
            "target level {} outside {MIN_LEVEL}-{MAX_LEVEL}",
            record.metadata.target_level
        ));
    }

    let budget = record.metadata.budget;
    if !budget.is_finite() || budget < 0.0 {
        report.errors.push(format!("budget {budget} must be a non-negative amount"));
    }

    if let Some(ascendancy) = record.character.ascendancy {
        if ascendancy.class() != record.character.class {
            report.errors.push(format!(
                "ascendancy {} does not belong to class {}",
                ascendancy.display_name(),
                record.character.class.display_name()
            ));
        }
    }

    if record.skill_setup.is_empty() {
        report.warnings.push("build has no skill groups".to_string());
    }
    if record.passive_tree.allocated_nodes.is_empty() {
        report.warnings.push("passive tree has no allocated nodes".to_string());
    }
    for slot in EquipmentSlot::ALL.iter().filter(|s| s.is_key_slot()) {
        if !record.items.contains_key(slot) {
            report.warnings.push(format!("key equipment slot {slot} is empty"));
        }
    }
    if record.metadata.name.trim().is_empty() {
        report.warnings.push("build has no name".to_string());
    }

    report.finish()
}

/// Check raw build data before normalization: the top-level regions must be
/// present and the class must resolve.
pub fn validate_value(raw: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(obj) = raw.as_object() else {
        report.errors.push("build data is not an object".to_string());
        return report.finish();
    };

    for (region, alias) in [
        ("character", None),
        ("skill_setup", Some("skills")),
        ("items", None),
        ("passive_tree", Some("tree")),
    ] {
        let found = obj.contains_key(region) || alias.is_some_and(|a| obj.contains_key(a));
        if !found {
            report.errors.push(format!("missing required field '{region}'"));
        }
    }

    let class = obj
        .get("character")
        .and_then(|c| c.get("class"))
        .and_then(Value::as_str);
    match class {
        Some(name) if CharacterClass::parse(name).is_some() => {}
        Some(name) => report.errors.push(format!("class '{name}' is not recognised")),
        None => report.errors.push("character class is missing".to_string()),
    }

    report.finish()
}
