/// Buildsmith - Build Candidate Pipeline
///
/// Turns loosely specified player preferences into a ranked list of
/// complete character builds, validated against an external calculation
/// engine when one is installed and estimated analytically otherwise.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
