//! Canonical stat names shared by the engine adapter and the ranking engine.

use std::collections::BTreeMap;

pub type StatMap = BTreeMap<String, f64>;

pub const DPS: &str = "dps";
pub const LIFE: &str = "life";
pub const ENERGY_SHIELD: &str = "energy_shield";
pub const MANA: &str = "mana";
pub const ARMOUR: &str = "armour";
pub const EVASION: &str = "evasion";
pub const FIRE_RES: &str = "fire_res";
pub const COLD_RES: &str = "cold_res";
pub const LIGHTNING_RES: &str = "lightning_res";
pub const CHAOS_RES: &str = "chaos_res";
pub const MOVEMENT_SPEED: &str = "movement_speed";
pub const EFFECTIVE_HEALTH_POOL: &str = "effective_health_pool";

/// Read a stat, treating missing and non-finite values as zero.
pub fn stat(stats: &StatMap, name: &str) -> f64 {
    stats
        .get(name)
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Sum of the three elemental resistances.
pub fn elemental_resist_sum(stats: &StatMap) -> f64 {
    stat(stats, FIRE_RES) + stat(stats, COLD_RES) + stat(stats, LIGHTNING_RES)
}
