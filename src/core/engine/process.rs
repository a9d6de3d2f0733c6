//! Subprocess-backed calculation engine.
//!
//! Each run writes the tagged interchange document to its own temporary
//! file, invokes `<binary> <file> --output <format> [extra args]` and reads
//! stdout. The child is killed on timeout or cancellation, and the temp file
//! is removed when the run returns, whatever the outcome.

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use super::parse::parse_output;
use super::{CalculationEngine, CancelToken, EngineConfig, EngineOutcome, ValidationError};

const STDERR_PREVIEW: usize = 500;

pub struct ProcessEngine {
    config: EngineConfig,
}

impl ProcessEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Locate the engine binary: the explicit path if configured, otherwise
    /// `binary_name` on `PATH`.
    pub fn resolve_binary(&self) -> Result<PathBuf, ValidationError> {
        match &self.config.binary {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => which::which(path).map_err(|e| ValidationError::ProcessUnavailable {
                reason: format!("{}: {e}", path.display()),
            }),
            None => which::which(&self.config.binary_name).map_err(|e| {
                ValidationError::ProcessUnavailable {
                    reason: format!("'{}' not found on PATH: {e}", self.config.binary_name),
                }
            }),
        }
    }

    async fn invoke(&self, interchange: &str, mut cancel: CancelToken) -> EngineOutcome {
        let binary = match self.resolve_binary() {
            Ok(binary) => binary,
            Err(e) => return EngineOutcome::Failed(e),
        };

        // Removed on drop, which covers every return path below.
        let mut input = match tempfile::Builder::new()
            .prefix("buildsmith-")
            .suffix(".xml")
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => return EngineOutcome::Failed(ValidationError::Io(e)),
        };
        if let Err(e) = input.write_all(interchange.as_bytes()).and_then(|_| input.flush()) {
            return EngineOutcome::Failed(ValidationError::Io(e));
        }

        let mut cmd = Command::new(&binary);
        cmd.arg(input.path())
            .arg("--output")
            .arg(&self.config.output_format)
            .args(&self.config.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = ?cmd, timeout_secs = self.config.timeout_secs, "invoking calculation engine");

        let started = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return EngineOutcome::Failed(ValidationError::ProcessUnavailable {
                    reason: format!("{}: {e}", binary.display()),
                })
            }
            Err(e) => return EngineOutcome::Failed(ValidationError::Io(e)),
        };

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let result = {
            let run = async {
                let mut stdout = Vec::new();
                let mut stderr = Vec::new();
                tokio::try_join!(
                    read_pipe(stdout_pipe.as_mut(), &mut stdout),
                    read_pipe(stderr_pipe.as_mut(), &mut stderr),
                )?;
                let status = child.wait().await?;
                Ok::<_, std::io::Error>((status, stdout, stderr))
            };

            tokio::select! {
                result = tokio::time::timeout(timeout, run) => Some(result),
                _ = cancel.cancelled() => None,
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            None => {
                debug!(elapsed_ms, "engine run cancelled");
                let _ = child.kill().await;
                EngineOutcome::Cancelled
            }
            Some(Err(_)) => {
                warn!(timeout_secs = self.config.timeout_secs, "calculation engine timed out");
                let _ = child.kill().await;
                EngineOutcome::Failed(ValidationError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
            Some(Ok(Err(e))) => {
                let _ = child.kill().await;
                EngineOutcome::Failed(ValidationError::Io(e))
            }
            Some(Ok(Ok((status, stdout, stderr)))) => {
                debug!(
                    status = %status,
                    stdout_len = stdout.len(),
                    stderr_len = stderr.len(),
                    elapsed_ms,
                    "calculation engine finished"
                );
                if !status.success() {
                    let stderr: String = String::from_utf8_lossy(&stderr)
                        .chars()
                        .take(STDERR_PREVIEW)
                        .collect();
                    return EngineOutcome::Failed(ValidationError::EngineFailed {
                        exit_code: status.code(),
                        stderr: stderr.trim().to_string(),
                    });
                }
                match parse_output(&String::from_utf8_lossy(&stdout)) {
                    Ok(stats) => EngineOutcome::Completed(stats),
                    Err(e) => EngineOutcome::Failed(e),
                }
            }
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<()> {
    if let Some(pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

#[async_trait]
impl CalculationEngine for ProcessEngine {
    fn name(&self) -> &str {
        &self.config.binary_name
    }

    async fn is_available(&self) -> bool {
        self.resolve_binary().is_ok()
    }

    async fn run(&self, interchange: &str, cancel: CancelToken) -> EngineOutcome {
        self.invoke(interchange, cancel).await
    }
}
