//! Engine output parsing.
//!
//! Structured output (a JSON object, optionally wrapped in `"stats"`) is
//! tried first. Free-form text is scanned with a fixed set of named-value
//! patterns only when no structured data is found; that path is best-effort.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::ValidationError;
use crate::core::build::stats::{
    ARMOUR, CHAOS_RES, COLD_RES, DPS, EFFECTIVE_HEALTH_POOL, ENERGY_SHIELD, EVASION, FIRE_RES,
    LIFE, LIGHTNING_RES, MANA, MOVEMENT_SPEED,
};
use crate::core::build::StatMap;

/// Map an engine stat name onto the canonical name, if known.
pub fn canonical_stat_name(name: &str) -> Option<&'static str> {
    let key: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    let canonical = match key.as_str() {
        "dps" | "totaldps" | "combineddps" | "fulldps" | "averagedps" => DPS,
        "life" | "maxlife" | "totallife" => LIFE,
        "energyshield" | "es" | "maxenergyshield" | "totalenergyshield" => ENERGY_SHIELD,
        "mana" | "maxmana" | "totalmana" => MANA,
        "armour" | "armor" | "totalarmour" => ARMOUR,
        "evasion" | "evasionrating" | "totalevasion" => EVASION,
        "fireres" | "fireresist" | "fireresistance" => FIRE_RES,
        "coldres" | "coldresist" | "coldresistance" => COLD_RES,
        "lightningres" | "lightningresist" | "lightningresistance" => LIGHTNING_RES,
        "chaosres" | "chaosresist" | "chaosresistance" => CHAOS_RES,
        "movementspeed" | "movespeed" | "effectivemovementspeedmod" => MOVEMENT_SPEED,
        "effectivehealthpool" | "ehp" | "totalehp" => EFFECTIVE_HEALTH_POOL,
        _ => return None,
    };
    Some(canonical)
}

fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').replace(',', "").parse().ok(),
        _ => None,
    };
    n.filter(|n: &f64| n.is_finite())
}

/// Fill in the effective health pool from life and energy shield when the
/// engine did not report it.
fn derive_ehp(stats: &mut StatMap) {
    if stats.contains_key(EFFECTIVE_HEALTH_POOL) || !stats.contains_key(LIFE) {
        return;
    }
    let life = stats.get(LIFE).copied().unwrap_or(0.0);
    let es = stats.get(ENERGY_SHIELD).copied().unwrap_or(0.0);
    stats.insert(EFFECTIVE_HEALTH_POOL.to_string(), life + es);
}

/// Parse structured output. Returns `None` unless at least one known stat
/// is present.
pub fn parse_structured(output: &str) -> Option<StatMap> {
    let value: Value = serde_json::from_str(output.trim()).ok()?;
    let object = value
        .get("stats")
        .and_then(Value::as_object)
        .or_else(|| value.as_object())?;

    let mut stats = StatMap::new();
    for (name, raw) in object {
        if let (Some(canonical), Some(n)) = (canonical_stat_name(name), numeric(raw)) {
            stats.insert(canonical.to_string(), n);
        }
    }
    if stats.is_empty() {
        return None;
    }
    derive_ehp(&mut stats);
    Some(stats)
}

const NUMBER: &str = r"([-+]?\d[\d,]*(?:\.\d+)?)";

static TEXT_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    let specs: [(&'static str, &str); 12] = [
        (DPS, r"(?:total\s+|combined\s+|full\s+)?dps"),
        (LIFE, r"(?:total\s+|maximum\s+)?life"),
        (ENERGY_SHIELD, r"(?:total\s+|maximum\s+)?energy\s*shield"),
        (MANA, r"(?:total\s+|maximum\s+)?mana"),
        (ARMOUR, r"armou?r"),
        (EVASION, r"evasion(?:\s+rating)?"),
        (FIRE_RES, r"fire\s+res(?:istance|ist)?"),
        (COLD_RES, r"cold\s+res(?:istance|ist)?"),
        (LIGHTNING_RES, r"lightning\s+res(?:istance|ist)?"),
        (CHAOS_RES, r"chaos\s+res(?:istance|ist)?"),
        (MOVEMENT_SPEED, r"movement\s+speed"),
        (EFFECTIVE_HEALTH_POOL, r"(?:effective\s+health\s+pool|ehp)"),
    ];
    specs
        .into_iter()
        .filter_map(|(name, label)| {
            let pattern = format!(r"(?im)^\s*{label}\s*[:=]\s*{NUMBER}");
            match Regex::new(&pattern) {
                Ok(re) => Some((name, re)),
                Err(e) => {
                    tracing::error!(stat = name, error = %e, "invalid stat pattern");
                    None
                }
            }
        })
        .collect()
});

/// Scan free-form text for `Label: value` lines.
pub fn parse_text(output: &str) -> Option<StatMap> {
    let mut stats = StatMap::new();
    for (name, re) in TEXT_PATTERNS.iter() {
        let value = re
            .captures(output)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
            .filter(|n| n.is_finite());
        if let Some(value) = value {
            stats.insert(name.to_string(), value);
        }
    }
    if stats.is_empty() {
        return None;
    }
    derive_ehp(&mut stats);
    Some(stats)
}

/// Parse engine stdout, structured first, then text.
pub fn parse_output(output: &str) -> Result<StatMap, ValidationError> {
    if let Some(stats) = parse_structured(output) {
        return Ok(stats);
    }
    if let Some(stats) = parse_text(output) {
        tracing::debug!(stats = stats.len(), "engine output parsed from text");
        return Ok(stats);
    }
    let preview: String = output.chars().take(120).collect();
    Err(ValidationError::UnparseableOutput {
        reason: if preview.trim().is_empty() {
            "engine produced no output".to_string()
        } else {
            format!("no recognisable stats in output: {preview}")
        },
    })
}
