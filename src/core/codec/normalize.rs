//! Build Normalization
//!
//! Turns loosely typed, possibly partial build data into a fully populated
//! [`BuildRecord`]. Normalization never fails: anything it cannot use is
//! defaulted or dropped, and every such decision is recorded as a warning.
//!
//! Accepted input shapes include the record's own serialized form (so
//! normalization is idempotent), the intermediate map produced by the tagged
//! decoder, and hand-written JSON with common aliases (`skills`, `tree`,
//! `Weapon 1`, `Body Armour`, numeric strings, ...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::build::{
    Ascendancy, BuildGoal, BuildMetadata, BuildRecord, CharacterClass, CharacterInfo,
    ConfigValue, EquipmentSlot, Gem, Item, PassiveTree, Rarity, SkillGroup, FORMAT_VERSION,
    MAX_GEM_LEVEL, MAX_GEM_QUALITY, MAX_LEVEL, MIN_GEM_LEVEL, MIN_LEVEL,
};

/// A normalized record together with every coercion applied to produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub record: BuildRecord,
    pub warnings: Vec<String>,
}

/// Fill every field of a [`BuildRecord`] from `raw`, defaulting what is
/// missing and discarding skill groups without a main skill.
pub fn normalize(raw: &Value) -> NormalizedRecord {
    let mut normalizer = Normalizer::default();
    let record = normalizer.record(raw);
    NormalizedRecord {
        record,
        warnings: normalizer.warnings,
    }
}

// ============================================================================
// Scalar Coercion
// ============================================================================

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn node_id(value: &Value) -> Option<u32> {
    number(value).filter(|n| *n >= 0.0 && *n <= u32::MAX as f64 && n.fract() == 0.0).map(|n| n as u32)
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn is_support_gem(value: &Value) -> bool {
    match value.get("support") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

// ============================================================================
// Normalizer
// ============================================================================

#[derive(Default)]
struct Normalizer {
    warnings: Vec<String>,
}

impl Normalizer {
    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn record(&mut self, raw: &Value) -> BuildRecord {
        let empty = Map::new();
        let obj = match raw.as_object() {
            Some(obj) => obj,
            None => {
                self.warn("build data is not an object; using an empty build");
                &empty
            }
        };

        let version = present(obj.get("version"))
            .and_then(text)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| FORMAT_VERSION.to_string());

        let character = self.character(obj);
        let skill_setup = self.skills(obj);
        let items = self.items(obj);
        let passive_tree = self.tree(obj, &character);
        let config_flags = self.config(obj);
        let metadata = self.metadata(obj, &character);

        BuildRecord {
            version,
            character,
            skill_setup,
            items,
            passive_tree,
            config_flags,
            metadata,
        }
    }

    /// Clamp an integer field into `[min, max]`, warning on any adjustment.
    fn bounded(&mut self, value: Option<&Value>, field: &str, min: u32, max: u32, default: u32) -> u32 {
        let Some(value) = present(value) else {
            return default;
        };
        match number(value) {
            Some(n) => {
                let rounded = n.round();
                let clamped = rounded.clamp(min as f64, max as f64);
                if clamped != n {
                    self.warn(format!("{field} {n} adjusted to {clamped}"));
                }
                clamped as u32
            }
            None => {
                self.warn(format!("{field} is not a number; defaulting to {default}"));
                default
            }
        }
    }

    // ------------------------------------------------------------------------
    // Character
    // ------------------------------------------------------------------------

    fn character(&mut self, obj: &Map<String, Value>) -> CharacterInfo {
        let section = obj.get("character").and_then(Value::as_object);
        let field = |key: &str| present(section.and_then(|s| s.get(key)).or_else(|| obj.get(key)));

        let ascendancy = match field("ascendancy").and_then(text) {
            Some(name) if !name.trim().is_empty() => {
                let parsed = Ascendancy::parse(&name);
                if parsed.is_none() {
                    self.warn(format!("unknown ascendancy '{name}' ignored"));
                }
                parsed
            }
            _ => None,
        };

        let class = match field("class").and_then(text) {
            Some(name) => match CharacterClass::parse(&name) {
                Some(class) => class,
                None => {
                    let fallback = ascendancy.map(|a| a.class()).unwrap_or_default();
                    self.warn(format!("unknown class '{name}'; using {}", fallback.id()));
                    fallback
                }
            },
            None => {
                let fallback = ascendancy.map(|a| a.class()).unwrap_or_default();
                self.warn(format!("class missing; using {}", fallback.id()));
                fallback
            }
        };

        let level = self.bounded(field("level"), "character level", MIN_LEVEL, MAX_LEVEL, MIN_LEVEL);

        CharacterInfo {
            class,
            ascendancy,
            level,
        }
    }

    // ------------------------------------------------------------------------
    // Skills
    // ------------------------------------------------------------------------

    fn skills(&mut self, obj: &Map<String, Value>) -> Vec<SkillGroup> {
        let raw = present(obj.get("skill_setup")).or_else(|| present(obj.get("skills")));
        let list = match raw {
            Some(Value::Array(list)) => list,
            Some(_) => {
                self.warn("skill setup is not a list; ignored");
                return Vec::new();
            }
            None => return Vec::new(),
        };

        let mut groups = Vec::with_capacity(list.len());
        for (index, raw_group) in list.iter().enumerate() {
            if let Some(group) = self.skill_group(index, raw_group) {
                groups.push(group);
            }
        }
        groups
    }

    fn skill_group(&mut self, index: usize, raw: &Value) -> Option<SkillGroup> {
        let Some(obj) = raw.as_object() else {
            self.warn(format!("skill group {index} is not an object; discarded"));
            return None;
        };
        let slot = present(obj.get("slot")).and_then(text).unwrap_or_default();

        let (main_raw, support_raws): (Option<&Value>, Vec<&Value>) =
            if let Some(main) = present(obj.get("main_skill")) {
                let supports = obj
                    .get("supports")
                    .and_then(Value::as_array)
                    .map(|list| list.iter().collect())
                    .unwrap_or_default();
                (Some(main), supports)
            } else if let Some(gems) = obj.get("gems").and_then(Value::as_array) {
                let main_index = gems.iter().position(|g| !is_support_gem(g));
                let supports = gems
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != main_index)
                    .map(|(_, g)| g)
                    .collect();
                (main_index.map(|i| &gems[i]), supports)
            } else {
                (None, Vec::new())
            };

        let main_skill = main_raw.and_then(|g| self.gem(g, false));
        let Some(main_skill) = main_skill else {
            self.warn(format!("skill group {index} ('{slot}') has no main skill; discarded"));
            return None;
        };

        let supports = support_raws
            .into_iter()
            .filter_map(|g| self.gem(g, true))
            .collect();

        Some(SkillGroup {
            slot,
            main_skill,
            supports,
        })
    }

    fn gem(&mut self, raw: &Value, support: bool) -> Option<Gem> {
        let (name, level, quality) = match raw {
            Value::String(name) => (name.clone(), None, None),
            Value::Object(obj) => (
                present(obj.get("name")).and_then(text).unwrap_or_default(),
                obj.get("level"),
                obj.get("quality"),
            ),
            _ => (String::new(), None, None),
        };

        if name.trim().is_empty() {
            if support {
                self.warn("support gem without a name dropped");
            }
            return None;
        }

        let level = self.bounded(
            level,
            &format!("gem '{name}' level"),
            MIN_GEM_LEVEL as u32,
            MAX_GEM_LEVEL as u32,
            MIN_GEM_LEVEL as u32,
        ) as u8;
        let quality = self.bounded(
            quality,
            &format!("gem '{name}' quality"),
            0,
            MAX_GEM_QUALITY as u32,
            0,
        ) as u8;

        Some(Gem {
            name,
            level,
            quality,
            support,
        })
    }

    // ------------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------------

    fn items(&mut self, obj: &Map<String, Value>) -> BTreeMap<EquipmentSlot, Item> {
        let mut entries: Vec<(String, &Value)> = Vec::new();
        match present(obj.get("items")) {
            Some(Value::Object(map)) => {
                entries.extend(map.iter().map(|(slot, item)| (slot.clone(), item)));
            }
            Some(Value::Array(list)) => {
                for (index, item) in list.iter().enumerate() {
                    match present(item.get("slot")).and_then(text) {
                        Some(slot) => entries.push((slot, item)),
                        None => self.warn(format!("item {index} has no slot; dropped")),
                    }
                }
            }
            Some(_) => self.warn("items is neither a map nor a list; ignored"),
            None => {}
        }

        let mut items = BTreeMap::new();
        for (slot_name, raw_item) in entries {
            let Some(slot) = EquipmentSlot::parse(&slot_name) else {
                self.warn(format!("unknown equipment slot '{slot_name}'; item dropped"));
                continue;
            };
            let Some(item) = self.item(&slot_name, raw_item) else {
                continue;
            };
            if items.insert(slot, item).is_some() {
                self.warn(format!("duplicate item for slot {slot}; last one kept"));
            }
        }
        items
    }

    fn item(&mut self, slot_name: &str, raw: &Value) -> Option<Item> {
        let obj = match raw {
            Value::String(name) => return Some(Item::new(name.clone(), "", Rarity::Normal)),
            Value::Object(obj) => obj,
            _ => {
                self.warn(format!("item in slot '{slot_name}' is not an object; dropped"));
                return None;
            }
        };

        let name = present(obj.get("name")).and_then(text).unwrap_or_default();
        let base_type = present(obj.get("type"))
            .or_else(|| present(obj.get("base_type")))
            .and_then(text)
            .unwrap_or_default();

        let rarity = match present(obj.get("rarity")).and_then(text) {
            Some(r) => Rarity::parse(&r).unwrap_or_else(|| {
                self.warn(format!("unknown rarity '{r}' in slot '{slot_name}'; using normal"));
                Rarity::Normal
            }),
            None => Rarity::Normal,
        };

        let affixes = match present(obj.get("affixes")).or_else(|| present(obj.get("mods"))) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(lines)) => lines.iter().filter_map(text).collect::<Vec<_>>().join("\n"),
            _ => String::new(),
        };

        Some(Item {
            name,
            base_type,
            rarity,
            affixes,
        })
    }

    // ------------------------------------------------------------------------
    // Passive Tree
    // ------------------------------------------------------------------------

    fn tree(&mut self, obj: &Map<String, Value>, character: &CharacterInfo) -> PassiveTree {
        let default_ascendancy = character
            .ascendancy
            .map(|a| a.display_name().to_string())
            .unwrap_or_default();

        let section = present(obj.get("passive_tree"))
            .or_else(|| present(obj.get("tree")))
            .and_then(Value::as_object);
        let Some(section) = section else {
            return PassiveTree {
                class_id: character.class.tree_class_id(),
                ascendancy_name: default_ascendancy,
                ..PassiveTree::default()
            };
        };

        let class_id = match present(section.get("class_id")) {
            Some(v) => node_id(v).unwrap_or_else(|| {
                self.warn("passive tree class_id is not a valid id; using class default");
                character.class.tree_class_id()
            }),
            None => character.class.tree_class_id(),
        };

        let ascendancy_name = present(section.get("ascendancy_name"))
            .and_then(text)
            .unwrap_or(default_ascendancy);

        let node_values: Vec<Value> = match present(section.get("allocated_nodes"))
            .or_else(|| present(section.get("nodes")))
        {
            Some(Value::Array(list)) => list.clone(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
            Some(_) => {
                self.warn("allocated nodes are neither a list nor a delimited string; ignored");
                Vec::new()
            }
            None => Vec::new(),
        };

        let mut allocated_nodes = BTreeSet::new();
        let mut duplicates = 0usize;
        for value in &node_values {
            match node_id(value) {
                Some(id) => {
                    if !allocated_nodes.insert(id) {
                        duplicates += 1;
                    }
                }
                None => self.warn(format!("invalid passive node id {value} dropped")),
            }
        }
        if duplicates > 0 {
            self.warn(format!("{duplicates} duplicate passive node id(s) removed"));
        }

        let mut mastery_effects = BTreeMap::new();
        match present(section.get("mastery_effects")).or_else(|| present(section.get("masteries"))) {
            Some(Value::Object(map)) => {
                for (node, effect) in map {
                    match (node.trim().parse::<u32>().ok(), node_id(effect)) {
                        (Some(node), Some(effect)) => {
                            mastery_effects.insert(node, effect);
                        }
                        _ => self.warn(format!("invalid mastery entry {node}={effect} dropped")),
                    }
                }
            }
            Some(Value::Array(list)) => {
                for entry in list {
                    let node = entry.get("node").and_then(node_id);
                    let effect = entry.get("effect").and_then(node_id);
                    match (node, effect) {
                        (Some(node), Some(effect)) => {
                            mastery_effects.insert(node, effect);
                        }
                        _ => self.warn(format!("invalid mastery entry {entry} dropped")),
                    }
                }
            }
            Some(_) => self.warn("mastery effects are neither a map nor a list; ignored"),
            None => {}
        }

        PassiveTree {
            class_id,
            ascendancy_name,
            allocated_nodes,
            mastery_effects,
        }
    }

    // ------------------------------------------------------------------------
    // Config Flags
    // ------------------------------------------------------------------------

    fn config(&mut self, obj: &Map<String, Value>) -> BTreeMap<String, ConfigValue> {
        let mut flags = BTreeMap::new();
        let Some(section) = present(obj.get("config_flags")).or_else(|| present(obj.get("config"))) else {
            return flags;
        };
        let Some(map) = section.as_object() else {
            self.warn("config flags are not a map; ignored");
            return flags;
        };

        for (name, value) in map {
            let parsed = match value {
                Value::Bool(b) => Some(ConfigValue::Bool(*b)),
                Value::Number(_) => number(value).map(ConfigValue::Number),
                Value::String(s) if s.eq_ignore_ascii_case("true") => Some(ConfigValue::Bool(true)),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Some(ConfigValue::Bool(false)),
                Value::String(_) => number(value).map(ConfigValue::Number),
                _ => None,
            };
            match parsed {
                Some(v) => {
                    flags.insert(name.clone(), v);
                }
                None => self.warn(format!("config flag '{name}' has unsupported value {value}; dropped")),
            }
        }
        flags
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    fn metadata(&mut self, obj: &Map<String, Value>, character: &CharacterInfo) -> BuildMetadata {
        let section = obj.get("metadata").and_then(Value::as_object);
        let field = |key: &str| present(section.and_then(|s| s.get(key)).or_else(|| obj.get(key)));

        let name = field("name").and_then(text).unwrap_or_default();
        let description = field("description").and_then(text).unwrap_or_default();

        let budget = match field("budget") {
            Some(v) => match number(v) {
                Some(b) if b < 0.0 => {
                    self.warn(format!("negative budget {b} clamped to 0"));
                    0.0
                }
                Some(b) => b,
                None => {
                    self.warn("budget is not a finite number; using 0");
                    0.0
                }
            },
            None => 0.0,
        };

        let target_level = self.bounded(
            field("target_level"),
            "target level",
            MIN_LEVEL,
            MAX_LEVEL,
            character.level,
        );

        let build_goal = match field("build_goal").or_else(|| field("goal")).and_then(text) {
            Some(goal) => BuildGoal::parse(&goal).unwrap_or_else(|| {
                self.warn(format!("unknown build goal '{goal}'; using {}", BuildGoal::default()));
                BuildGoal::default()
            }),
            None => BuildGoal::default(),
        };

        BuildMetadata {
            name,
            description,
            budget,
            target_level,
            build_goal,
        }
    }
}
