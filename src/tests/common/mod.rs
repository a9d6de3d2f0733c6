//! Common Test Utilities
//!
//! Shared fixtures for building records, requirements and candidates.

pub mod fixtures;

pub use fixtures::*;
