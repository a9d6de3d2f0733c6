//! Character classes and ascendancies.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Character Class
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    #[default]
    Warrior,
    Ranger,
    Huntress,
    Mercenary,
    Sorceress,
    Witch,
    Monk,
    Druid,
}

impl CharacterClass {
    /// Resolve a loosely written class name. Ascendancy names resolve to
    /// their base class.
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "warrior" | "str" => Some(Self::Warrior),
            "ranger" | "dex" => Some(Self::Ranger),
            "huntress" => Some(Self::Huntress),
            "mercenary" | "merc" => Some(Self::Mercenary),
            "sorceress" | "sorc" | "int" => Some(Self::Sorceress),
            "witch" => Some(Self::Witch),
            "monk" => Some(Self::Monk),
            "druid" => Some(Self::Druid),
            other => Ascendancy::parse(other).map(|a| a.class()),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Warrior => "warrior",
            Self::Ranger => "ranger",
            Self::Huntress => "huntress",
            Self::Mercenary => "mercenary",
            Self::Sorceress => "sorceress",
            Self::Witch => "witch",
            Self::Monk => "monk",
            Self::Druid => "druid",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Warrior => "Warrior",
            Self::Ranger => "Ranger",
            Self::Huntress => "Huntress",
            Self::Mercenary => "Mercenary",
            Self::Sorceress => "Sorceress",
            Self::Witch => "Witch",
            Self::Monk => "Monk",
            Self::Druid => "Druid",
        }
    }

    /// Passive tree class identifier used by the calculation engine.
    pub fn tree_class_id(&self) -> u32 {
        match self {
            Self::Warrior => 1,
            Self::Ranger => 2,
            Self::Huntress => 3,
            Self::Mercenary => 4,
            Self::Sorceress => 5,
            Self::Witch => 6,
            Self::Monk => 7,
            Self::Druid => 8,
        }
    }

    pub fn ascendancies(&self) -> &'static [Ascendancy] {
        use Ascendancy::*;
        match self {
            Self::Warrior => &[Titan, Warbringer, SmithOfKitava],
            Self::Ranger => &[Deadeye, Pathfinder],
            Self::Huntress => &[Amazon, Ritualist],
            Self::Mercenary => &[Witchhunter, GemlingLegionnaire, Tactician],
            Self::Sorceress => &[Stormweaver, Chronomancer, DiscipleOfVarashta],
            Self::Witch => &[Infernalist, BloodMage, Lich],
            Self::Monk => &[Invoker, AcolyteOfChayula],
            Self::Druid => &[Oracle, Shaman],
        }
    }

    pub fn all() -> &'static [CharacterClass] {
        &[
            Self::Warrior,
            Self::Ranger,
            Self::Huntress,
            Self::Mercenary,
            Self::Sorceress,
            Self::Witch,
            Self::Monk,
            Self::Druid,
        ]
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Ascendancy
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Ascendancy {
    Titan,
    Warbringer,
    SmithOfKitava,
    Deadeye,
    Pathfinder,
    Amazon,
    Ritualist,
    Witchhunter,
    GemlingLegionnaire,
    Tactician,
    Stormweaver,
    Chronomancer,
    DiscipleOfVarashta,
    Infernalist,
    BloodMage,
    Lich,
    Invoker,
    AcolyteOfChayula,
    Oracle,
    Shaman,
}

impl Ascendancy {
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        let found = Self::all().iter().copied().find(|a| a.id() == key);
        found.or(match key.as_str() {
            "smith" | "smith_of_kitava" => Some(Self::SmithOfKitava),
            "gemling" => Some(Self::GemlingLegionnaire),
            "disciple" => Some(Self::DiscipleOfVarashta),
            "blood_mage" | "bloodmage" => Some(Self::BloodMage),
            "acolyte" => Some(Self::AcolyteOfChayula),
            _ => None,
        })
    }

    pub fn class(&self) -> CharacterClass {
        CharacterClass::all()
            .iter()
            .copied()
            .find(|c| c.ascendancies().contains(self))
            .unwrap_or_default()
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Titan => "titan",
            Self::Warbringer => "warbringer",
            Self::SmithOfKitava => "smith_of_kitava",
            Self::Deadeye => "deadeye",
            Self::Pathfinder => "pathfinder",
            Self::Amazon => "amazon",
            Self::Ritualist => "ritualist",
            Self::Witchhunter => "witchhunter",
            Self::GemlingLegionnaire => "gemling_legionnaire",
            Self::Tactician => "tactician",
            Self::Stormweaver => "stormweaver",
            Self::Chronomancer => "chronomancer",
            Self::DiscipleOfVarashta => "disciple_of_varashta",
            Self::Infernalist => "infernalist",
            Self::BloodMage => "blood_mage",
            Self::Lich => "lich",
            Self::Invoker => "invoker",
            Self::AcolyteOfChayula => "acolyte_of_chayula",
            Self::Oracle => "oracle",
            Self::Shaman => "shaman",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Titan => "Titan",
            Self::Warbringer => "Warbringer",
            Self::SmithOfKitava => "Smith of Kitava",
            Self::Deadeye => "Deadeye",
            Self::Pathfinder => "Pathfinder",
            Self::Amazon => "Amazon",
            Self::Ritualist => "Ritualist",
            Self::Witchhunter => "Witchhunter",
            Self::GemlingLegionnaire => "Gemling Legionnaire",
            Self::Tactician => "Tactician",
            Self::Stormweaver => "Stormweaver",
            Self::Chronomancer => "Chronomancer",
            Self::DiscipleOfVarashta => "Disciple of Varashta",
            Self::Infernalist => "Infernalist",
            Self::BloodMage => "Blood Mage",
            Self::Lich => "Lich",
            Self::Invoker => "Invoker",
            Self::AcolyteOfChayula => "Acolyte of Chayula",
            Self::Oracle => "Oracle",
            Self::Shaman => "Shaman",
        }
    }

    pub fn all() -> &'static [Ascendancy] {
        use Ascendancy::*;
        &[
            Titan,
            Warbringer,
            SmithOfKitava,
            Deadeye,
            Pathfinder,
            Amazon,
            Ritualist,
            Witchhunter,
            GemlingLegionnaire,
            Tactician,
            Stormweaver,
            Chronomancer,
            DiscipleOfVarashta,
            Infernalist,
            BloodMage,
            Lich,
            Invoker,
            AcolyteOfChayula,
            Oracle,
            Shaman,
        ]
    }
}

impl fmt::Display for Ascendancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
