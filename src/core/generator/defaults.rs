//! Static per-class kits used to synthesize a draft when no template
//! matches, and as the gear baseline for the built-in templates.

use crate::core::build::{
    BuildRecord, CharacterClass, CharacterInfo, EquipmentSlot, Gem, Item, PassiveTree, Rarity,
    SkillGroup,
};

/// Gear and skills every class can fall back on.
pub(crate) struct ClassKit {
    pub main_skill: &'static str,
    pub supports: &'static [&'static str],
    pub secondary: (&'static str, &'static [&'static str]),
    /// Base type per slot, in [`EquipmentSlot::ALL`] order.
    pub bases: [&'static str; 10],
    pub nodes: &'static [u32],
}

const STR_JEWELLERY: [&str; 3] = ["Ruby Ring", "Ruby Ring", "Amber Amulet"];
const DEX_JEWELLERY: [&str; 3] = ["Emerald Ring", "Emerald Ring", "Jade Amulet"];
const INT_JEWELLERY: [&str; 3] = ["Sapphire Ring", "Sapphire Ring", "Lapis Amulet"];

macro_rules! bases {
    ($main:expr, $off:expr, $helm:expr, $body:expr, $gloves:expr, $boots:expr, $jewellery:expr) => {
        [
            $main,
            $off,
            $helm,
            $body,
            $gloves,
            $boots,
            "Heavy Belt",
            $jewellery[0],
            $jewellery[1],
            $jewellery[2],
        ]
    };
}

pub(crate) fn kit(class: CharacterClass) -> ClassKit {
    match class {
        CharacterClass::Warrior => ClassKit {
            main_skill: "Earthquake",
            supports: &["Brutality", "Heavy Swing", "Concentrated Effect"],
            secondary: ("Shield Wall", &["Fortress"]),
            bases: bases!(
                "Forge Maul", "Crude Tower Shield", "Iron Cap", "Chieftain Cuirass",
                "Riveted Mitts", "Iron Greaves", STR_JEWELLERY
            ),
            nodes: &[1010, 1024, 1031, 1047, 1052, 1068],
        },
        CharacterClass::Ranger => ClassKit {
            main_skill: "Lightning Arrow",
            supports: &["Lightning Infusion", "Scattershot", "Primal Armament"],
            secondary: ("Escape Shot", &["Rapid Attacks"]),
            bases: bases!(
                "Recurve Bow", "Visceral Quiver", "Leatherbound Hood", "Quilted Vest",
                "Suede Bracers", "Rawhide Boots", DEX_JEWELLERY
            ),
            nodes: &[2011, 2019, 2030, 2044, 2051, 2063],
        },
        CharacterClass::Huntress => ClassKit {
            main_skill: "Lightning Spear",
            supports: &["Pierce", "Elemental Focus", "Lightning Mastery"],
            secondary: ("Parry", &["Fortify"]),
            bases: bases!(
                "Hunting Spear", "Crude Buckler", "Felt Cap", "Leather Vest",
                "Leather Bracers", "Laced Boots", DEX_JEWELLERY
            ),
            nodes: &[3008, 3017, 3026, 3039, 3045, 3057],
        },
        CharacterClass::Mercenary => ClassKit {
            main_skill: "Explosive Grenade",
            supports: &["Scattershot", "Fire Infusion", "Overcharge"],
            secondary: ("Galvanic Shards", &["Pierce"]),
            bases: bases!(
                "Bombard Crossbow", "Crude Buckler", "Rusted Greathelm", "Leather Vest",
                "Stocky Mitts", "Mail Sabatons", DEX_JEWELLERY
            ),
            nodes: &[4012, 4020, 4033, 4041, 4058, 4066],
        },
        CharacterClass::Sorceress => ClassKit {
            main_skill: "Spark",
            supports: &["Arcane Surge", "Lightning Penetration", "Chain"],
            secondary: ("Frost Wall", &["Cold Exposure"]),
            bases: bases!(
                "Chiming Staff", "Tasalian Focus", "Twig Circlet", "Silk Robe",
                "Torn Gloves", "Straw Sandals", INT_JEWELLERY
            ),
            nodes: &[5003, 5015, 5027, 5034, 5049, 5061],
        },
        CharacterClass::Witch => ClassKit {
            main_skill: "Raise Zombie",
            supports: &["Minion Instability", "Meat Shield", "Feeding Frenzy"],
            secondary: ("Contagion", &["Persistence"]),
            bases: bases!(
                "Withered Wand", "Crackling Focus", "Wicker Tiara", "Garment",
                "Silk Gloves", "Velvet Slippers", INT_JEWELLERY
            ),
            nodes: &[6005, 6018, 6022, 6037, 6043, 6059],
        },
        CharacterClass::Monk => ClassKit {
            main_skill: "Tempest Flurry",
            supports: &["Martial Tempo", "Lightning Infusion", "Close Combat"],
            secondary: ("Tempest Bell", &["Concentrated Effect"]),
            bases: bases!(
                "Wrapped Quarterstaff", "Tasalian Focus", "Felt Cap", "Hermit Garb",
                "Wrapped Mitts", "Wrapped Sandals", DEX_JEWELLERY
            ),
            nodes: &[7002, 7014, 7029, 7036, 7048, 7055],
        },
        CharacterClass::Druid => ClassKit {
            main_skill: "Volcano",
            supports: &["Fire Penetration", "Magnified Area", "Ignite"],
            secondary: ("Wolf Pack", &["Meat Shield"]),
            bases: bases!(
                "Ashen Staff", "Crude Tower Shield", "Iron Cap", "Chieftain Cuirass",
                "Riveted Mitts", "Iron Greaves", STR_JEWELLERY
            ),
            nodes: &[8009, 8016, 8025, 8038, 8042, 8054],
        },
    }
}

/// Build a record from the class kit, using `main_skill` in place of the
/// kit's own when given. Every equipment slot is filled with a normal item.
pub(crate) fn kit_record(class: CharacterClass, main_skill: Option<&str>) -> BuildRecord {
    let kit = kit(class);

    let mut primary = SkillGroup::new("Weapon 1", Gem::active(main_skill.unwrap_or(kit.main_skill), 20, 20));
    for support in kit.supports {
        primary = primary.with_support(Gem::support(*support, 20, 0));
    }
    let (secondary_name, secondary_supports) = kit.secondary;
    let mut secondary = SkillGroup::new("Body Armour", Gem::active(secondary_name, 18, 0));
    for support in secondary_supports {
        secondary = secondary.with_support(Gem::support(*support, 18, 0));
    }

    let items = EquipmentSlot::ALL
        .iter()
        .zip(kit.bases.iter())
        .map(|(slot, base)| (*slot, Item::new(*base, *base, Rarity::Normal)))
        .collect();

    BuildRecord {
        character: CharacterInfo {
            class,
            ascendancy: None,
            level: 1,
        },
        skill_setup: vec![primary, secondary],
        items,
        passive_tree: PassiveTree {
            class_id: class.tree_class_id(),
            allocated_nodes: kit.nodes.iter().copied().collect(),
            ..PassiveTree::default()
        },
        ..BuildRecord::default()
    }
}

/// The basic draft synthesized when no template matches.
pub fn default_draft(class: CharacterClass) -> BuildRecord {
    let mut record = kit_record(class, None);
    record.metadata.name = format!("{} Default Build", class.display_name());
    record.metadata.description = format!(
        "Baseline {} build assembled from class defaults.",
        class.display_name()
    );
    record
}
