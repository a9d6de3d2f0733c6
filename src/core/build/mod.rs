//! Canonical Build Record
//!
//! The fully typed representation of one character build. Every stage of
//! the candidate pipeline consumes and produces these records:
//! - the codec converts them to and from the compact and tagged forms
//! - the generator derives budget-tier variants from templates
//! - the engine adapter attaches computed stats
//! - the ranking engine orders the validated candidates
//!
//! Records are never mutated across a component boundary. Transformations
//! such as [`BuildRecord::with_config_flags`] return a new record.

pub mod classes;
pub mod stats;

pub use classes::{Ascendancy, CharacterClass};
pub use stats::StatMap;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Current interchange format version.
pub const FORMAT_VERSION: &str = "1";

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 100;
pub const MIN_GEM_LEVEL: u8 = 1;
pub const MAX_GEM_LEVEL: u8 = 20;
pub const MAX_GEM_QUALITY: u8 = 23;

// ============================================================================
// Build Goal
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuildGoal {
    ClearSpeed,
    BossKilling,
    #[default]
    EndgameContent,
    LeagueStart,
    BudgetFriendly,
}

impl BuildGoal {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "clear_speed" | "clearspeed" | "mapping" | "clear" => Some(Self::ClearSpeed),
            "boss_killing" | "bossing" | "boss" | "single_target" => Some(Self::BossKilling),
            "endgame_content" | "endgame" | "balanced" => Some(Self::EndgameContent),
            "league_start" | "league_starter" | "starter" => Some(Self::LeagueStart),
            "budget_friendly" | "budget" | "cheap" => Some(Self::BudgetFriendly),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::ClearSpeed => "clear_speed",
            Self::BossKilling => "boss_killing",
            Self::EndgameContent => "endgame_content",
            Self::LeagueStart => "league_start",
            Self::BudgetFriendly => "budget_friendly",
        }
    }

    /// Template style tag implied by this goal.
    pub fn style_tag(&self) -> &'static str {
        match self {
            Self::ClearSpeed => "mapping",
            Self::BossKilling => "bossing",
            Self::EndgameContent => "endgame",
            Self::LeagueStart => "league_start",
            Self::BudgetFriendly => "budget",
        }
    }

    pub fn all() -> &'static [BuildGoal] {
        &[
            Self::ClearSpeed,
            Self::BossKilling,
            Self::EndgameContent,
            Self::LeagueStart,
            Self::BudgetFriendly,
        ]
    }
}

impl fmt::Display for BuildGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ============================================================================
// Equipment
// ============================================================================

/// The fixed ten-slot equipment enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Helmet,
    BodyArmour,
    Gloves,
    Boots,
    Belt,
    Ring1,
    Ring2,
    Amulet,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 10] = [
        Self::MainHand,
        Self::OffHand,
        Self::Helmet,
        Self::BodyArmour,
        Self::Gloves,
        Self::Boots,
        Self::Belt,
        Self::Ring1,
        Self::Ring2,
        Self::Amulet,
    ];

    /// Resolve a canonical slot identifier or a common alias
    /// (`Weapon 1`, `Body Armour`, `Ring 2`, `helm`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "main_hand" | "mainhand" | "weapon" | "weapon_1" | "weapon1" => Some(Self::MainHand),
            "off_hand" | "offhand" | "weapon_2" | "weapon2" | "shield" | "quiver" => {
                Some(Self::OffHand)
            }
            "helmet" | "helm" | "head" => Some(Self::Helmet),
            "body_armour" | "body_armor" | "body" | "chest" => Some(Self::BodyArmour),
            "gloves" | "hands" => Some(Self::Gloves),
            "boots" | "feet" => Some(Self::Boots),
            "belt" => Some(Self::Belt),
            "ring_1" | "ring1" | "ring" | "left_ring" => Some(Self::Ring1),
            "ring_2" | "ring2" | "right_ring" => Some(Self::Ring2),
            "amulet" | "amulet_1" | "neck" => Some(Self::Amulet),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::MainHand => "main_hand",
            Self::OffHand => "off_hand",
            Self::Helmet => "helmet",
            Self::BodyArmour => "body_armour",
            Self::Gloves => "gloves",
            Self::Boots => "boots",
            Self::Belt => "belt",
            Self::Ring1 => "ring_1",
            Self::Ring2 => "ring_2",
            Self::Amulet => "amulet",
        }
    }

    /// Slots whose absence makes a build look unfinished.
    pub fn is_key_slot(&self) -> bool {
        matches!(self, Self::MainHand | Self::BodyArmour)
    }

    /// Slots promoted to unique at the highest budget tier.
    pub fn is_marquee(&self) -> bool {
        matches!(self, Self::MainHand | Self::BodyArmour)
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Normal,
    Magic,
    Rare,
    Unique,
}

impl Rarity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "white" => Some(Self::Normal),
            "magic" | "blue" => Some(Self::Magic),
            "rare" | "yellow" => Some(Self::Rare),
            "unique" | "orange" => Some(Self::Unique),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Magic => "magic",
            Self::Rare => "rare",
            Self::Unique => "unique",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub name: String,
    #[serde(rename = "type")]
    pub base_type: String,
    pub rarity: Rarity,
    /// Free-text affix block, one modifier per line.
    pub affixes: String,
}

impl Item {
    pub fn new(name: impl Into<String>, base_type: impl Into<String>, rarity: Rarity) -> Self {
        Self {
            name: name.into(),
            base_type: base_type.into(),
            rarity,
            affixes: String::new(),
        }
    }

    pub fn with_affixes(mut self, affixes: impl Into<String>) -> Self {
        self.affixes = affixes.into();
        self
    }
}

// ============================================================================
// Skills
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Gem {
    pub name: String,
    pub level: u8,
    pub quality: u8,
    #[serde(default)]
    pub support: bool,
}

impl Gem {
    pub fn active(name: impl Into<String>, level: u8, quality: u8) -> Self {
        Self {
            name: name.into(),
            level,
            quality,
            support: false,
        }
    }

    pub fn support(name: impl Into<String>, level: u8, quality: u8) -> Self {
        Self {
            name: name.into(),
            level,
            quality,
            support: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillGroup {
    pub slot: String,
    pub main_skill: Gem,
    pub supports: Vec<Gem>,
}

impl SkillGroup {
    pub fn new(slot: impl Into<String>, main_skill: Gem) -> Self {
        Self {
            slot: slot.into(),
            main_skill,
            supports: Vec::new(),
        }
    }

    pub fn with_support(mut self, gem: Gem) -> Self {
        self.supports.push(gem);
        self
    }
}

// ============================================================================
// Character, Tree, Config, Metadata
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterInfo {
    pub class: CharacterClass,
    pub ascendancy: Option<Ascendancy>,
    pub level: u32,
}

impl Default for CharacterInfo {
    fn default() -> Self {
        Self {
            class: CharacterClass::default(),
            ascendancy: None,
            level: MIN_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PassiveTree {
    pub class_id: u32,
    pub ascendancy_name: String,
    pub allocated_nodes: BTreeSet<u32>,
    pub mastery_effects: BTreeMap<u32, u32>,
}

/// A simulation toggle consumed only by the calculation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildMetadata {
    pub name: String,
    pub description: String,
    pub budget: f64,
    pub target_level: u32,
    pub build_goal: BuildGoal,
}

impl Default for BuildMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            budget: 0.0,
            target_level: MAX_LEVEL,
            build_goal: BuildGoal::default(),
        }
    }
}

// ============================================================================
// Build Record
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildRecord {
    pub version: String,
    pub character: CharacterInfo,
    pub skill_setup: Vec<SkillGroup>,
    pub items: BTreeMap<EquipmentSlot, Item>,
    pub passive_tree: PassiveTree,
    pub config_flags: BTreeMap<String, ConfigValue>,
    pub metadata: BuildMetadata,
}

impl Default for BuildRecord {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            character: CharacterInfo::default(),
            skill_setup: Vec::new(),
            items: BTreeMap::new(),
            passive_tree: PassiveTree::default(),
            config_flags: BTreeMap::new(),
            metadata: BuildMetadata::default(),
        }
    }
}

impl BuildRecord {
    /// The build's primary skill: the main gem of the first skill group.
    pub fn main_skill(&self) -> Option<&Gem> {
        self.skill_setup.first().map(|g| &g.main_skill)
    }

    pub fn class(&self) -> CharacterClass {
        self.character.class
    }

    pub fn level(&self) -> u32 {
        self.character.level
    }

    /// Return a copy with `flags` merged over the existing config flags.
    pub fn with_config_flags(&self, flags: &BTreeMap<String, ConfigValue>) -> BuildRecord {
        let mut next = self.clone();
        for (name, value) in flags {
            next.config_flags.insert(name.clone(), value.clone());
        }
        next
    }

    /// Return a copy whose first skill group uses `skill` as its main gem,
    /// keeping the original gem level and quality.
    pub fn with_main_skill(&self, skill: &str) -> BuildRecord {
        let mut next = self.clone();
        if let Some(group) = next.skill_setup.first_mut() {
            group.main_skill.name = skill.to_string();
        }
        next
    }
}

// ============================================================================
// Validated Candidate
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Fallback,
    Rejected,
}

/// How a candidate's stats were obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Engine,
    Fallback,
}

impl CalculationMethod {
    pub fn status(&self) -> ValidationStatus {
        match self {
            Self::Engine => ValidationStatus::Valid,
            Self::Fallback => ValidationStatus::Fallback,
        }
    }
}

/// A draft record enriched with computed stats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatedCandidate {
    pub record: BuildRecord,
    pub computed_stats: StatMap,
    pub interchange_code: Option<String>,
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidatedCandidate {
    pub fn name(&self) -> &str {
        &self.record.metadata.name
    }
}
