//! Build Codec
//!
//! Lossless conversion between [`BuildRecord`] and its two wire forms:
//! - the compact interchange string (JSON, zlib, URL-safe base64)
//! - the tagged dialect, a diffable XML document with one region per
//!   logical section of the record
//!
//! Both decoders funnel their output through [`normalize`], so anything that
//! decodes is a fully populated record and the round-trip law
//! `decode(encode(r)) == r` holds for every normalized record.

pub mod compact;
pub mod normalize;
pub mod tagged;
pub mod validate;

pub use compact::{decode_compact, decode_compact_normalized, encode_compact};
pub use normalize::{normalize, NormalizedRecord};
pub use tagged::{decode_tagged, decode_tagged_normalized, encode_tagged};
pub use validate::{validate, validate_value, ValidationReport};

use thiserror::Error;

use crate::core::build::FORMAT_VERSION;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed build input: {reason}")]
    MalformedInput { reason: String },

    #[error("Unsupported build format version '{version}' (expected {}.x)", FORMAT_VERSION)]
    UnsupportedVersion { version: String },

    #[error("Failed to serialize build: {reason}")]
    Serialization { reason: String },
}

impl CodecError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn serialization(reason: impl ToString) -> Self {
        Self::Serialization {
            reason: reason.to_string(),
        }
    }

    /// Stable identifier for display and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput { .. } => "malformed_input",
            Self::UnsupportedVersion { .. } => "unsupported_version",
            Self::Serialization { .. } => "serialization",
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Accepts the current major version in any `N` or `N.x` spelling.
pub fn is_supported_version(version: &str) -> bool {
    let major = version.trim().split('.').next().unwrap_or_default();
    major == FORMAT_VERSION
}

pub(crate) fn check_version(version: &str) -> Result<()> {
    if is_supported_version(version) {
        Ok(())
    } else {
        Err(CodecError::UnsupportedVersion {
            version: version.to_string(),
        })
    }
}
