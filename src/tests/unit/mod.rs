//! Unit Tests
//!
//! ## Test Coverage
//!
//! ### Pipeline (`pipeline_tests`)
//! - Engine-validated and fallback candidates side by side
//! - Goal-weighted ordering driven by engine stats
//! - Config overrides reaching the engine document
//! - Cancellation keeping finished candidates
//! - Meta adjustment, candidate caps, currency conversion
//! - Importing a build code with a live engine
//!
//! ### Codec (`codec_tests`)
//! - Cross-dialect conversion
//! - Loose payloads decoded with warnings
//! - Raw and typed validation agreeing

mod codec_tests;
mod pipeline_tests;
