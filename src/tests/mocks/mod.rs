//! In-process calculation engines
//!
//! Stand-ins for the external engine so pipeline behaviour can be tested
//! without spawning processes.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::build::stats::DPS;
use crate::core::build::StatMap;
use crate::core::engine::{CalculationEngine, CancelToken, EngineOutcome, ValidationError};

/// What the engine does with a document containing a given marker.
#[derive(Debug, Clone)]
pub enum Reply {
    Stats(StatMap),
    Fail,
    /// Block until cancelled.
    Hang,
}

/// Engine whose reply is picked by the first marker found in the
/// interchange document, or `default` when none match.
pub struct ScriptedEngine {
    available: bool,
    rules: Vec<(String, Reply)>,
    default: Reply,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new(default: Reply) -> Self {
        Self {
            available: true,
            rules: Vec::new(),
            default,
            delay: Duration::from_millis(5),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Engine returning only a DPS figure.
    pub fn dps(dps: f64) -> Self {
        Self::new(Reply::Stats(dps_stats(dps)))
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Reply::Fail)
        }
    }

    pub fn when(mut self, marker: &str, reply: Reply) -> Self {
        self.rules.push((marker.to_string(), reply));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every interchange document received, in arrival order.
    pub fn documents(&self) -> Vec<String> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

pub fn dps_stats(dps: f64) -> StatMap {
    let mut stats = StatMap::new();
    stats.insert(DPS.to_string(), dps);
    stats
}

#[async_trait]
impl CalculationEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn run(&self, interchange: &str, mut cancel: CancelToken) -> EngineOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(interchange.to_string());
        }

        let reply = self
            .rules
            .iter()
            .find(|(marker, _)| interchange.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default.clone());

        match reply {
            Reply::Stats(stats) => {
                tokio::select! {
                    _ = tokio::time::sleep(self.delay) => EngineOutcome::Completed(stats),
                    _ = cancel.cancelled() => EngineOutcome::Cancelled,
                }
            }
            Reply::Fail => EngineOutcome::Failed(ValidationError::EngineFailed {
                exit_code: Some(2),
                stderr: "scripted failure".to_string(),
            }),
            Reply::Hang => {
                cancel.cancelled().await;
                EngineOutcome::Cancelled
            }
        }
    }
}
