use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::engine::{EngineConfig, DEFAULT_MAX_WORKERS};
use crate::core::generator::{GeneratorConfig, DEFAULT_MAX_CANDIDATES};
use crate::core::pipeline::PipelineConfig;
use crate::core::ranking::RankingConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub pipeline: PipelineSettings,
    pub data: DataConfig,
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Upper bound on concurrent engine runs.
    pub max_workers: usize,
    /// Upper bound on generated candidates per request.
    pub max_candidates: usize,
    /// Swap off-meta main skills for the class's most popular one.
    pub meta_adjustment: bool,
    /// Score multiplier for fallback-validated candidates.
    pub fallback_weight: f64,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            meta_adjustment: true,
            fallback_weight: 1.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/buildsmith/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e}; using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {}; using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Directory the rolling file log is written to.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            max_candidates: self.pipeline.max_candidates,
            meta_adjustment: self.pipeline.meta_adjustment,
        }
    }

    pub fn ranking_config(&self) -> RankingConfig {
        RankingConfig {
            fallback_weight: self.pipeline.fallback_weight,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            generator: self.generator_config(),
            ranking: self.ranking_config(),
            max_workers: self.pipeline.max_workers,
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("buildsmith").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("buildsmith"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
