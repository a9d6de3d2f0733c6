//! Built-in template library, used when the caller supplies none.

use serde::{Deserialize, Serialize};

use super::defaults::kit_record;
use crate::core::build::{Ascendancy, BuildRecord, CharacterClass, ConfigValue};

/// A reusable build shape that the generator expands into budget tiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildTemplate {
    pub name: String,
    pub class: CharacterClass,
    /// Style tag matched against the requirement's preferred styles.
    pub style: String,
    pub record: BuildRecord,
    #[serde(default)]
    pub description: String,
}

impl BuildTemplate {
    pub fn new(name: impl Into<String>, style: impl Into<String>, record: BuildRecord) -> Self {
        Self {
            name: name.into(),
            class: record.character.class,
            style: style.into().trim().to_lowercase(),
            record,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn template(
    name: &str,
    class: CharacterClass,
    ascendancy: Ascendancy,
    main_skill: &str,
    style: &str,
    description: &str,
) -> BuildTemplate {
    let mut record = kit_record(class, Some(main_skill));
    record.character.ascendancy = Some(ascendancy);
    record.passive_tree.ascendancy_name = ascendancy.display_name().to_string();
    record.metadata.name = name.to_string();
    record.metadata.description = description.to_string();
    if style == "bossing" {
        record
            .config_flags
            .insert("enemyIsBoss".to_string(), ConfigValue::Bool(true));
    }
    BuildTemplate::new(name, style, record).with_description(description)
}

pub fn builtin_templates() -> Vec<BuildTemplate> {
    use Ascendancy::*;
    use CharacterClass::*;
    vec![
        template("Earthquake Titan", Warrior, Titan, "Earthquake", "bossing",
            "Slow, heavy slams with stacked armour."),
        template("Leap Slam Warbringer", Warrior, Warbringer, "Leap Slam", "mapping",
            "Jump from pack to pack with warcry support."),
        template("Lightning Arrow Deadeye", Ranger, Deadeye, "Lightning Arrow", "bossing",
            "Chaining arrows with projectile scaling."),
        template("Poisonburst Pathfinder", Ranger, Pathfinder, "Poisonburst Arrow", "mapping",
            "Poison clouds that spread through packs."),
        template("Lightning Spear Amazon", Huntress, Amazon, "Lightning Spear", "endgame",
            "Reliable spear thrower for all content."),
        template("Grenadier Witchhunter", Mercenary, Witchhunter, "Explosive Grenade", "league_start",
            "Cheap grenade setup that scales with any crossbow."),
        template("Spark Stormweaver", Sorceress, Stormweaver, "Spark", "mapping",
            "Fast spark clear with chain support."),
        template("Comet Chronomancer", Sorceress, Chronomancer, "Comet", "bossing",
            "Large single hits with temporal control."),
        template("Minion Infernalist", Witch, Infernalist, "Raise Zombie", "endgame",
            "Zombie army backed by infernal hound."),
        template("Essence Drain Blood Mage", Witch, BloodMage, "Essence Drain", "budget",
            "Self-found friendly chaos damage over time."),
        template("Tempest Flurry Invoker", Monk, Invoker, "Tempest Flurry", "endgame",
            "Fast lightning strikes with elemental charges."),
        template("Volcano Shaman", Druid, Shaman, "Volcano", "league_start",
            "Fire eruptions from a staff, no gear requirements."),
    ]
}
