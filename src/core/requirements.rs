//! Requirement Normalizer
//!
//! Converts a loosely structured preferences map into a fully populated
//! [`Requirement`]. This stage never fails: unknown classes and goals map to
//! fixed fallbacks and every adjustment is reported as a warning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::build::{Ascendancy, BuildGoal, CharacterClass, MAX_LEVEL, MIN_LEVEL};

pub const DEFAULT_BUDGET: f64 = 10.0;
pub const DEFAULT_CURRENCY: &str = "divine";
pub const LEAGUE_START_BUDGET_CEILING: f64 = 5.0;
pub const DEFAULT_LEVEL_TARGET: u32 = 90;
pub const DEFAULT_PLAYSTYLE: &str = "balanced";

// ============================================================================
// Focus Enums
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DefensiveFocus {
    #[default]
    Balanced,
    Tanky,
    Evasive,
}

impl DefensiveFocus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "balanced" | "default" => Some(Self::Balanced),
            "tanky" | "tank" | "armour" | "armor" => Some(Self::Tanky),
            "evasive" | "evasion" | "dodge" => Some(Self::Evasive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OffensiveFocus {
    #[default]
    Balanced,
    SingleTarget,
    Aoe,
}

impl OffensiveFocus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "balanced" | "default" => Some(Self::Balanced),
            "single_target" | "single" | "st" => Some(Self::SingleTarget),
            "aoe" | "area" | "clear" => Some(Self::Aoe),
            _ => None,
        }
    }
}

// ============================================================================
// Budget & Currency
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub amount: f64,
    pub currency: String,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            amount: DEFAULT_BUDGET,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Exchange table supplied by the surrounding system.
///
/// `rates` maps a currency name to its value in units of `base`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrencyRates {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

impl Default for CurrencyRates {
    fn default() -> Self {
        Self {
            base: DEFAULT_CURRENCY.to_string(),
            rates: BTreeMap::new(),
        }
    }
}

impl CurrencyRates {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: canonical_currency(&base.into()),
            rates: BTreeMap::new(),
        }
    }

    pub fn with_rate(mut self, currency: &str, value_in_base: f64) -> Self {
        self.rates.insert(canonical_currency(currency), value_in_base);
        self
    }

    /// Convert `amount` of `currency` into the base currency. Returns `None`
    /// when no usable rate is known.
    pub fn to_base(&self, amount: f64, currency: &str) -> Option<f64> {
        let currency = canonical_currency(currency);
        if currency == canonical_currency(&self.base) {
            return Some(amount);
        }
        self.rates
            .get(&currency)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .map(|rate| amount * rate)
    }
}

/// Lowercase, drop an `orb(s)` suffix and resolve the usual abbreviations.
fn canonical_currency(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stem = lowered
        .trim_end_matches(" orbs")
        .trim_end_matches(" orb")
        .trim();
    match stem {
        "div" | "divs" | "divines" => "divine".to_string(),
        "ex" | "exa" | "exalt" | "exalts" | "exalted" => "exalted".to_string(),
        "c" | "chaos" => "chaos".to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// Requirement Object
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CalculationFlags {
    pub generate_import_code: bool,
    pub calculate_stats: bool,
    pub validate_build: bool,
}

impl Default for CalculationFlags {
    fn default() -> Self {
        Self {
            generate_import_code: true,
            calculate_stats: true,
            validate_build: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Requirement {
    pub class: CharacterClass,
    pub ascendancy: Option<Ascendancy>,
    pub build_goal: BuildGoal,
    pub budget: Budget,
    pub level_target: u32,
    pub defensive_focus: DefensiveFocus,
    pub offensive_focus: OffensiveFocus,
    pub playstyle: String,
    /// Template style tags this request accepts.
    pub preferred_styles: BTreeSet<String>,
    pub calculation_flags: CalculationFlags,
}

impl Default for Requirement {
    fn default() -> Self {
        let goal = BuildGoal::default();
        Self {
            class: CharacterClass::default(),
            ascendancy: None,
            build_goal: goal,
            budget: Budget::default(),
            level_target: DEFAULT_LEVEL_TARGET,
            defensive_focus: DefensiveFocus::default(),
            offensive_focus: OffensiveFocus::default(),
            playstyle: DEFAULT_PLAYSTYLE.to_string(),
            preferred_styles: [goal.style_tag().to_string(), DEFAULT_PLAYSTYLE.to_string()]
                .into_iter()
                .collect(),
            calculation_flags: CalculationFlags::default(),
        }
    }
}

impl Requirement {
    pub fn prefers(&self, style: &str) -> bool {
        self.preferred_styles.contains(&style.trim().to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRequirement {
    pub requirement: Requirement,
    pub warnings: Vec<String>,
}

// ============================================================================
// Normalization
// ============================================================================

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    let n: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

/// Normalize a preferences map with no currency conversion table.
pub fn normalize_requirement(preferences: &Value) -> NormalizedRequirement {
    normalize_requirement_with_rates(preferences, &CurrencyRates::default())
}

/// Normalize a preferences map, converting the budget into `rates.base`.
pub fn normalize_requirement_with_rates(
    preferences: &Value,
    rates: &CurrencyRates,
) -> NormalizedRequirement {
    let mut warnings = Vec::new();
    let empty = Map::new();
    let prefs = match preferences {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            warnings.push("preferences are not an object; using defaults".to_string());
            &empty
        }
    };
    let get = |keys: &[&str]| keys.iter().find_map(|k| prefs.get(*k).filter(|v| !v.is_null()));

    // Ascendancy first: it can imply the class.
    let ascendancy = get(&["ascendancy"]).and_then(text).and_then(|name| {
        let parsed = Ascendancy::parse(&name);
        if parsed.is_none() {
            warnings.push(format!("unknown ascendancy '{name}' ignored"));
        }
        parsed
    });

    let class = match get(&["class", "character_class"]).and_then(text) {
        Some(name) => CharacterClass::parse(&name).unwrap_or_else(|| {
            let fallback = ascendancy.map(|a| a.class()).unwrap_or_default();
            warnings.push(format!("unknown class '{name}'; using {}", fallback.id()));
            fallback
        }),
        None => match ascendancy {
            Some(a) => a.class(),
            None => {
                warnings.push(format!("no class given; using {}", CharacterClass::default().id()));
                CharacterClass::default()
            }
        },
    };

    let ascendancy = match ascendancy {
        Some(a) if a.class() != class => {
            warnings.push(format!(
                "ascendancy {} does not belong to {}; ignored",
                a.display_name(),
                class.display_name()
            ));
            None
        }
        other => other,
    };

    let build_goal = match get(&["build_goal", "goal"]).and_then(text) {
        Some(name) => BuildGoal::parse(&name).unwrap_or_else(|| {
            warnings.push(format!("unknown build goal '{name}'; using {}", BuildGoal::default()));
            BuildGoal::default()
        }),
        None => BuildGoal::default(),
    };

    let mut budget = parse_budget(get(&["budget"]), rates, &mut warnings);
    if build_goal == BuildGoal::LeagueStart && budget.amount > LEAGUE_START_BUDGET_CEILING {
        warnings.push(format!(
            "league start budget {} capped at {LEAGUE_START_BUDGET_CEILING}",
            budget.amount
        ));
        budget.amount = LEAGUE_START_BUDGET_CEILING;
    }

    let level_target = match get(&["level_target", "target_level", "level"]) {
        Some(raw) => match number(raw) {
            Some(n) => {
                let clamped = n.round().clamp(MIN_LEVEL as f64, MAX_LEVEL as f64);
                if clamped != n {
                    warnings.push(format!("level target {n} adjusted to {clamped}"));
                }
                clamped as u32
            }
            None => {
                warnings.push(format!("level target {raw} is not a number; using {DEFAULT_LEVEL_TARGET}"));
                DEFAULT_LEVEL_TARGET
            }
        },
        None => DEFAULT_LEVEL_TARGET,
    };

    let (goal_defense, goal_offense) = match build_goal {
        BuildGoal::BossKilling => (DefensiveFocus::Tanky, OffensiveFocus::SingleTarget),
        BuildGoal::ClearSpeed => (DefensiveFocus::Balanced, OffensiveFocus::Aoe),
        _ => (DefensiveFocus::Balanced, OffensiveFocus::Balanced),
    };
    let defensive_focus = match get(&["defensive_focus", "defense"]).and_then(text) {
        Some(name) => DefensiveFocus::parse(&name).unwrap_or_else(|| {
            warnings.push(format!("unknown defensive focus '{name}' ignored"));
            goal_defense
        }),
        None => goal_defense,
    };
    let offensive_focus = match get(&["offensive_focus", "offense"]).and_then(text) {
        Some(name) => OffensiveFocus::parse(&name).unwrap_or_else(|| {
            warnings.push(format!("unknown offensive focus '{name}' ignored"));
            goal_offense
        }),
        None => goal_offense,
    };

    let playstyle = get(&["playstyle"])
        .and_then(text)
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| DEFAULT_PLAYSTYLE.to_string());

    let mut preferred_styles: BTreeSet<String> = match get(&["preferred_styles", "styles"]) {
        Some(Value::Array(list)) => list.iter().filter_map(text).map(|s| s.to_lowercase()).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => BTreeSet::new(),
    };
    preferred_styles.insert(build_goal.style_tag().to_string());
    preferred_styles.insert(playstyle.clone());

    let flags_section = get(&["calculation_flags", "flags"]).and_then(Value::as_object);
    let flag_value = |key: &str| {
        flags_section
            .and_then(|s| s.get(key))
            .or_else(|| prefs.get(key))
            .and_then(flag)
    };
    let defaults = CalculationFlags::default();
    let calculation_flags = CalculationFlags {
        generate_import_code: flag_value("generate_import_code").unwrap_or(defaults.generate_import_code),
        calculate_stats: flag_value("calculate_stats").unwrap_or(defaults.calculate_stats),
        validate_build: flag_value("validate_build").unwrap_or(defaults.validate_build),
    };

    NormalizedRequirement {
        requirement: Requirement {
            class,
            ascendancy,
            build_goal,
            budget,
            level_target,
            defensive_focus,
            offensive_focus,
            playstyle,
            preferred_styles,
            calculation_flags,
        },
        warnings,
    }
}

/// Accepts `15`, `"15"`, `"15 divine"` or `{"amount": 15, "currency": "exalted"}`.
fn parse_budget(raw: Option<&Value>, rates: &CurrencyRates, warnings: &mut Vec<String>) -> Budget {
    let base = canonical_currency(&rates.base);
    let Some(raw) = raw else {
        return Budget {
            amount: DEFAULT_BUDGET,
            currency: base,
        };
    };

    let parsed: Option<(f64, Option<String>)> = match raw {
        Value::Number(_) => number(raw).map(|n| (n, None)),
        Value::String(s) => {
            let mut parts = s.split_whitespace();
            let amount = parts.next().and_then(|a| a.parse::<f64>().ok()).filter(|a| a.is_finite());
            let currency = parts.collect::<Vec<_>>().join(" ");
            amount.map(|a| (a, Some(currency).filter(|c| !c.is_empty())))
        }
        Value::Object(obj) => obj
            .get("amount")
            .and_then(number)
            .map(|a| (a, obj.get("currency").and_then(text))),
        _ => None,
    };

    let Some((amount, currency)) = parsed else {
        warnings.push(format!("budget {raw} not understood; using {DEFAULT_BUDGET} {base}"));
        return Budget {
            amount: DEFAULT_BUDGET,
            currency: base,
        };
    };

    let amount = if amount < 0.0 {
        warnings.push(format!("negative budget {amount} clamped to 0"));
        0.0
    } else {
        amount
    };

    let amount = match currency {
        Some(currency) => match rates.to_base(amount, &currency) {
            Some(converted) => {
                if canonical_currency(&currency) != base {
                    warnings.push(format!("budget {amount} {currency} converted to {converted} {base}"));
                }
                converted
            }
            None => {
                warnings.push(format!("no exchange rate for '{currency}'; treating amount as {base}"));
                amount
            }
        },
        None => amount,
    };

    Budget { amount, currency: base }
}
