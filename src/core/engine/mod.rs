//! External Validation Adapter
//!
//! Obtains computed stats for a build, either from the external calculation
//! engine or from the analytic fallback. Engine runs return a tagged
//! [`EngineOutcome`] rather than propagating errors, and the adapter turns
//! every failure into a fallback result, so callers always get stats.
//!
//! ## Flow
//!
//! 1. Map logical config overrides onto engine flag names.
//! 2. Encode the record in the tagged dialect.
//! 3. Run the engine under a hard timeout and an optional cancel signal.
//! 4. Parse structured or text output; fall back on any failure.

pub mod fallback;
pub mod parse;
pub mod process;

pub use fallback::estimate;
pub use process::ProcessEngine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{watch, Semaphore};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::core::build::{BuildRecord, CalculationMethod, ConfigValue, StatMap};
use crate::core::codec::encode_tagged;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BINARY_NAME: &str = "pob2-calc";
pub const DEFAULT_MAX_WORKERS: usize = 4;

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Calculation engine timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Calculation engine unavailable: {reason}")]
    ProcessUnavailable { reason: String },

    #[error("Could not parse engine output: {reason}")]
    UnparseableOutput { reason: String },

    #[error("Calculation engine exited with {}: {stderr}", exit_label(.exit_code))]
    EngineFailed { exit_code: Option<i32>, stderr: String },

    #[error("I/O error during engine run: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::ProcessUnavailable { .. } => "process_unavailable",
            Self::UnparseableOutput { .. } => "unparseable_output",
            Self::EngineFailed { .. } => "engine_failed",
            Self::Io(_) => "io",
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Explicit engine path; takes precedence over `binary_name`.
    pub binary: Option<PathBuf>,
    pub binary_name: String,
    pub timeout_secs: u64,
    pub output_format: String,
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: None,
            binary_name: DEFAULT_BINARY_NAME.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_format: "json".to_string(),
            extra_args: Vec::new(),
        }
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Owner side of a cancel signal shared by every in-flight engine run.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ============================================================================
// Engine Seam
// ============================================================================

/// Result of one engine run. Failures are values, so the adapter's fallback
/// substitution is a plain `match`.
#[derive(Debug)]
pub enum EngineOutcome {
    Completed(StatMap),
    Failed(ValidationError),
    Cancelled,
}

#[async_trait]
pub trait CalculationEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap liveness probe.
    async fn is_available(&self) -> bool;

    /// Calculate stats for one tagged-dialect document.
    async fn run(&self, interchange: &str, cancel: CancelToken) -> EngineOutcome;
}

// ============================================================================
// Config Overrides
// ============================================================================

/// Logical override names and the engine flag each one sets.
pub const OVERRIDE_NAMES: &[(&str, &str)] = &[
    ("enemy_level", "enemyLevel"),
    ("enemy_is_boss", "enemyIsBoss"),
    ("is_stationary", "conditionStationary"),
    ("stationary", "conditionStationary"),
    ("is_moving", "conditionMoving"),
    ("moving", "conditionMoving"),
    ("full_life", "conditionFullLife"),
    ("low_life", "conditionLowLife"),
    ("onslaught", "buffOnslaught"),
    ("fortify", "buffFortify"),
    ("use_power_charges", "usePowerCharges"),
    ("use_frenzy_charges", "useFrenzyCharges"),
    ("use_endurance_charges", "useEnduranceCharges"),
    ("enemy_shocked", "conditionEnemyShocked"),
    ("enemy_ignited", "conditionEnemyIgnited"),
    ("enemy_chilled", "conditionEnemyChilled"),
];

/// Translate logical overrides into engine flags. Keys already spelled as
/// engine flags pass through; anything else is ignored and returned in the
/// second element.
pub fn map_overrides(
    overrides: &BTreeMap<String, ConfigValue>,
) -> (BTreeMap<String, ConfigValue>, Vec<String>) {
    let mut mapped = BTreeMap::new();
    let mut ignored = Vec::new();
    for (key, value) in overrides {
        let flag = OVERRIDE_NAMES
            .iter()
            .find(|(logical, engine)| logical.eq_ignore_ascii_case(key) || *engine == key.as_str())
            .map(|(_, engine)| *engine);
        match flag {
            Some(flag) => {
                mapped.insert(flag.to_string(), value.clone());
            }
            None => ignored.push(key.clone()),
        }
    }
    (mapped, ignored)
}

// ============================================================================
// Adapter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub stats: StatMap,
    pub method: CalculationMethod,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

/// One entry of a batch run, keyed by the record's input position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub index: usize,
    /// `None` when the run was cancelled before producing a result.
    pub result: Option<CalculationResult>,
    /// Set when the worker itself failed; `result` then holds the fallback.
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct ValidationAdapter {
    engine: Option<Arc<dyn CalculationEngine>>,
    max_workers: usize,
}

impl ValidationAdapter {
    pub fn new(engine: Arc<dyn CalculationEngine>) -> Self {
        Self {
            engine: Some(engine),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// An adapter that always uses the analytic fallback.
    pub fn fallback_only() -> Self {
        Self {
            engine: None,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub async fn is_available(&self) -> bool {
        match &self.engine {
            Some(engine) => engine.is_available().await,
            None => false,
        }
    }

    /// Stats for one record. Never fails: any engine problem yields a
    /// fallback result.
    pub async fn calculate(
        &self,
        record: &BuildRecord,
        overrides: &BTreeMap<String, ConfigValue>,
    ) -> CalculationResult {
        match self.calculate_cancellable(record, overrides, CancelToken::never()).await {
            Some(result) => result,
            None => self.fallback(record, Vec::new(), "cancelled", Instant::now()),
        }
    }

    /// Like [`calculate`](Self::calculate) but returns `None` if `cancel`
    /// fires before the engine finishes.
    pub async fn calculate_cancellable(
        &self,
        record: &BuildRecord,
        overrides: &BTreeMap<String, ConfigValue>,
        cancel: CancelToken,
    ) -> Option<CalculationResult> {
        if cancel.is_cancelled() {
            return None;
        }
        let started = Instant::now();

        let (flags, ignored) = map_overrides(overrides);
        let prepared = record.with_config_flags(&flags);
        let mut warnings: Vec<String> = ignored
            .into_iter()
            .map(|key| format!("unknown config override '{key}' ignored"))
            .collect();

        let Some(engine) = &self.engine else {
            return Some(self.fallback(&prepared, warnings, "no calculation engine configured", started));
        };
        if !engine.is_available().await {
            let reason = format!("calculation engine '{}' is unavailable", engine.name());
            return Some(self.fallback(&prepared, warnings, &reason, started));
        }

        let interchange = match encode_tagged(&prepared) {
            Ok(xml) => xml,
            Err(e) => {
                let reason = format!("could not encode build for the engine: {e}");
                return Some(self.fallback(&prepared, warnings, &reason, started));
            }
        };

        match engine.run(&interchange, cancel).await {
            EngineOutcome::Completed(stats) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                debug!(
                    candidate = %prepared.metadata.name,
                    method = "engine",
                    elapsed_ms,
                    "stats calculated"
                );
                Some(CalculationResult {
                    stats,
                    method: CalculationMethod::Engine,
                    warnings,
                    elapsed_ms,
                })
            }
            EngineOutcome::Failed(err) => {
                warnings.push(format!("engine {}: {err}", err.kind()));
                Some(self.fallback(&prepared, warnings, &err.to_string(), started))
            }
            EngineOutcome::Cancelled => None,
        }
    }

    /// Analytic estimate without consulting the engine.
    pub fn estimate_only(&self, record: &BuildRecord, reason: &str) -> CalculationResult {
        self.fallback(record, Vec::new(), reason, Instant::now())
    }

    fn fallback(
        &self,
        record: &BuildRecord,
        mut warnings: Vec<String>,
        reason: &str,
        started: Instant,
    ) -> CalculationResult {
        warn!(candidate = %record.metadata.name, method = "fallback", reason, "using analytic fallback");
        warnings.push(format!("analytic fallback used: {reason}"));
        CalculationResult {
            stats: estimate(record),
            method: CalculationMethod::Fallback,
            warnings,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Calculate every record independently on a pool of
    /// `min(records.len(), max_workers)` workers.
    pub async fn batch_calculate(
        &self,
        records: &[BuildRecord],
        overrides: &BTreeMap<String, ConfigValue>,
    ) -> Vec<BatchEntry> {
        self.batch_calculate_cancellable(records, overrides, CancelToken::never())
            .await
    }

    pub async fn batch_calculate_cancellable(
        &self,
        records: &[BuildRecord],
        overrides: &BTreeMap<String, ConfigValue>,
        cancel: CancelToken,
    ) -> Vec<BatchEntry> {
        if records.is_empty() {
            return Vec::new();
        }
        let workers = records.len().min(self.max_workers).max(1);
        let permits = Arc::new(Semaphore::new(workers));
        debug!(candidates = records.len(), workers, "starting batch calculation");

        let handles: Vec<JoinHandle<Option<CalculationResult>>> = records
            .iter()
            .cloned()
            .map(|record| {
                let adapter = self.clone();
                let overrides = overrides.clone();
                let permits = Arc::clone(&permits);
                let mut cancel = cancel.clone();
                tokio::spawn(async move {
                    let permit = tokio::select! {
                        permit = permits.acquire_owned() => permit.ok(),
                        _ = cancel.cancelled() => None,
                    };
                    let Some(_permit) = permit else {
                        return None;
                    };
                    adapter.calculate_cancellable(&record, &overrides, cancel).await
                })
            })
            .collect();

        // Dropping this future (caller timeout, lost select!, disconnect)
        // must not leave engine children or temp files behind.
        let _abort = AbortOnDrop(handles.iter().map(JoinHandle::abort_handle).collect());
        let joined = futures::future::join_all(handles).await;
        joined
            .into_iter()
            .enumerate()
            .map(|(index, joined)| match joined {
                Ok(result) => BatchEntry {
                    index,
                    result,
                    error: None,
                },
                Err(e) => {
                    warn!(index, error = %e, "calculation worker failed");
                    let record = &records[index];
                    BatchEntry {
                        index,
                        result: Some(self.fallback(record, Vec::new(), "calculation worker failed", Instant::now())),
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }
}

/// Aborts the batch workers when the batch future is dropped. Aborting a
/// worker drops its engine run, which kills the child and removes its
/// interchange file.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}
