pub mod logging;

// Canonical build record and its wire forms
pub mod build;
pub mod codec;

// Pipeline stages
pub mod requirements;
pub mod generator;
pub mod engine;
pub mod ranking;

// Normalize -> Generate -> Calculate -> Rank
pub mod pipeline;
