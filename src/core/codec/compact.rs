//! Compact interchange string: JSON, zlib-compressed, URL-safe base64.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;
use std::io::{Read, Write};

use super::normalize::{normalize, NormalizedRecord};
use super::{check_version, CodecError, Result};
use crate::core::build::BuildRecord;

/// Encode a record as a compact, copy-pasteable string.
///
/// The output is deterministic for a given record: the record's maps are
/// ordered and the compressor runs with fixed settings.
pub fn encode_compact(record: &BuildRecord) -> Result<String> {
    let json = serde_json::to_vec(record).map_err(CodecError::serialization)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).map_err(CodecError::serialization)?;
    let compressed = encoder.finish().map_err(CodecError::serialization)?;

    Ok(URL_SAFE.encode(compressed))
}

/// Decode a compact string back into a record.
pub fn decode_compact(code: &str) -> Result<BuildRecord> {
    decode_compact_normalized(code).map(|n| n.record)
}

/// Decode a compact string, keeping the normalization warnings.
///
/// Accepts either base64 alphabet, with or without padding, and tolerates
/// payloads that were never compressed.
pub fn decode_compact_normalized(code: &str) -> Result<NormalizedRecord> {
    let cleaned: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim_end_matches('=');
    if cleaned.is_empty() {
        return Err(CodecError::malformed("empty build code"));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(cleaned)
        .map_err(|e| CodecError::malformed(format!("invalid base64: {e}")))?;

    let mut inflated = Vec::new();
    let payload = match ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut inflated) {
        Ok(_) => inflated,
        Err(e) => {
            tracing::debug!(error = %e, "build code is not zlib-compressed, trying raw payload");
            bytes
        }
    };

    let value: Value = serde_json::from_slice(&payload).map_err(|e| {
        CodecError::malformed(format!("payload is neither compressed nor structured data: {e}"))
    })?;
    if !value.is_object() {
        return Err(CodecError::malformed("payload is not a build object"));
    }

    if let Some(version) = value.get("version").and_then(Value::as_str) {
        check_version(version)?;
    }

    Ok(normalize(&value))
}
