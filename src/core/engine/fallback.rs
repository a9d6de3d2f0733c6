//! Analytic fallback: a closed-form estimate used whenever the calculation
//! engine cannot produce stats. Results from here are always reported with
//! [`CalculationMethod::Fallback`](crate::core::build::CalculationMethod).

use crate::core::build::stats::{
    COLD_RES, CHAOS_RES, DPS, EFFECTIVE_HEALTH_POOL, ENERGY_SHIELD, FIRE_RES, LIFE,
    LIGHTNING_RES, MOVEMENT_SPEED,
};
use crate::core::build::{BuildRecord, StatMap, MAX_LEVEL, MIN_LEVEL};

const BASE_LIFE: f64 = 50.0;
const LIFE_PER_LEVEL: f64 = 12.0;
const LIFE_MULTIPLIER: f64 = 2.5;
const DPS_PER_LEVEL: f64 = 1000.0;
const CAPPED_ELEMENTAL_RES: f64 = 75.0;

pub fn estimate(record: &BuildRecord) -> StatMap {
    let level = record.character.level.clamp(MIN_LEVEL, MAX_LEVEL) as f64;
    let life = LIFE_MULTIPLIER * (BASE_LIFE + LIFE_PER_LEVEL * (level - 1.0));
    let dps = DPS_PER_LEVEL * level;

    [
        (DPS, dps),
        (LIFE, life),
        (ENERGY_SHIELD, 0.0),
        (EFFECTIVE_HEALTH_POOL, life),
        (FIRE_RES, CAPPED_ELEMENTAL_RES),
        (COLD_RES, CAPPED_ELEMENTAL_RES),
        (LIGHTNING_RES, CAPPED_ELEMENTAL_RES),
        (CHAOS_RES, 0.0),
        (MOVEMENT_SPEED, 0.0),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}
