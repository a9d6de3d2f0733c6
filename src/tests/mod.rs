//! Crate-level test suites
//!
//! - `common`: shared fixtures
//! - `mocks`: in-process calculation engines
//! - `unit`: cross-module unit tests
//! - `property`: proptest invariants

mod common;
mod mocks;
mod property;
mod unit;
