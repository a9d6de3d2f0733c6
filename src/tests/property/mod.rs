//! Property-based tests for the build pipeline
//!
//! This module contains property-based tests using the proptest framework.
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Running Property Tests
//!
//! Run all property tests:
//! ```sh
//! cargo test property --release
//! ```
//!
//! Run a specific property test module:
//! ```sh
//! cargo test property::codec_props --release
//! ```
//!
//! ## Test Modules
//!
//! - `codec_props`: Tests for the build codec
//!   - Compact decode inverts compact encode
//!   - Tagged decode inverts tagged encode
//!   - Normalizing a normalized record changes nothing
//!   - Arbitrary loose input always normalizes into bounds
//!
//! - `generator_props`: Tests for candidate generation
//!   - Generation always yields at least one draft
//!   - Draft count never exceeds the cap
//!   - Every draft matches the requirement's class and level
//!
//! - `requirements_props`: Tests for preference normalization
//!   - Never panics on arbitrary maps
//!   - Level target and budget always land in range
//!   - The goal's style tag is always preferred
//!
//! - `ranking_props`: Tests for candidate ranking
//!   - Scores never increase down the list
//!   - Ranks are 1..=n
//!   - Equal scores keep input order
//!   - More DPS never lowers a score
//!
//! ## Configuration
//!
//! By default, proptest runs 256 cases per property. This can be configured
//! via the `PROPTEST_CASES` environment variable:
//!
//! ```sh
//! PROPTEST_CASES=1000 cargo test property --release
//! ```

mod generator_props;
mod ranking_props;
mod requirements_props;
