//! Codec behaviour across both dialects and the validators.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

use crate::core::build::{CharacterClass, EquipmentSlot, Rarity};
use crate::core::codec::{
    decode_compact, decode_compact_normalized, decode_tagged, encode_compact, encode_tagged,
    validate, validate_value,
};
use crate::tests::common::sample_record;

#[test]
fn test_compact_to_tagged_and_back() {
    let record = sample_record();
    let code = encode_compact(&record).unwrap();
    let via_tagged = decode_tagged(&encode_tagged(&decode_compact(&code).unwrap()).unwrap()).unwrap();
    assert_eq!(via_tagged, record);
    assert_eq!(encode_compact(&via_tagged).unwrap(), code);
}

#[test]
fn test_standard_alphabet_and_whitespace_accepted() {
    let record = sample_record();
    let code = encode_compact(&record).unwrap();
    let standard = code.replace('-', "+").replace('_', "/");
    let wrapped = format!("  {}\n{}  ", &standard[..10], &standard[10..]);
    assert_eq!(decode_compact(&wrapped).unwrap(), record);
}

#[test]
fn test_loose_uncompressed_payload_decodes_with_warnings() {
    let loose = json!({
        "class": "Deadeye",
        "level": "250",
        "skills": [
            {"gems": [{"name": "Chain", "support": true}, {"name": "Lightning Arrow", "level": 25}]},
            {"gems": [{"name": "Pierce", "support": true}]}
        ],
        "items": [
            {"slot": "Weapon 1", "name": "Bow", "rarity": "RARE"},
            {"slot": "tail", "name": "??"}
        ],
        "tree": {"nodes": "3, 1, 2, 2"},
        "config": {"enemyIsBoss": "true", "enemyLevel": "83"}
    });
    let code = STANDARD.encode(serde_json::to_vec(&loose).unwrap());

    let decoded = decode_compact_normalized(&code).unwrap();
    let record = &decoded.record;
    assert_eq!(record.class(), CharacterClass::Ranger);
    assert_eq!(record.level(), 100);
    assert_eq!(record.skill_setup.len(), 1);
    assert_eq!(record.main_skill().unwrap().name, "Lightning Arrow");
    assert_eq!(record.main_skill().unwrap().level, 20);
    assert_eq!(record.skill_setup[0].supports.len(), 1);
    assert_eq!(record.items[&EquipmentSlot::MainHand].rarity, Rarity::Rare);
    assert_eq!(record.items.len(), 1);
    assert_eq!(
        record.passive_tree.allocated_nodes.iter().copied().collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(record.config_flags.len(), 2);

    assert!(decoded.warnings.iter().any(|w| w.contains("character level")));
    assert!(decoded.warnings.iter().any(|w| w.contains("discarded")));
    assert!(decoded.warnings.iter().any(|w| w.contains("'tail'")));
    assert!(decoded.warnings.iter().any(|w| w.contains("duplicate")));
}

#[test]
fn test_raw_and_typed_validation_agree_on_complete_builds() {
    let record = sample_record();
    let raw = serde_json::to_value(&record).unwrap();
    let raw_report = validate_value(&raw);
    let typed_report = validate(&record);
    assert!(raw_report.valid, "{:?}", raw_report.errors);
    assert!(typed_report.valid, "{:?}", typed_report.errors);
}

#[test]
fn test_raw_validation_flags_missing_regions() {
    let report = validate_value(&json!({"character": {"class": "Bard"}}));
    assert!(!report.valid);
    assert!(report.errors.len() >= 2, "{:?}", report.errors);
}
