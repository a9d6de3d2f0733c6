use std::io::Read;

use serde::Deserialize;
use serde_json::Value;

use buildsmith::config::AppConfig;
use buildsmith::core::engine::CancelHandle;
use buildsmith::core::pipeline::{BuildPipeline, PipelineInputs};

/// One request read from stdin.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Request {
    preferences: Value,
    inputs: PipelineInputs,
    /// When set, the request imports this build instead of generating.
    import_code: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load();
    let _log_guard = buildsmith::core::logging::init(&config.log_dir());
    log::info!("Buildsmith v{} starting", buildsmith::VERSION);
    tracing::debug!(data_dir = %config.data_dir().display(), engine = ?config.engine, "configuration loaded");

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let request: Request = if raw.trim().is_empty() {
        Request::default()
    } else {
        serde_json::from_str(&raw)?
    };

    let pipeline = BuildPipeline::from_config(&config);

    let output = match &request.import_code {
        Some(code) => {
            let imported = pipeline
                .import_build(code, &request.inputs.config_overrides)
                .await
                .inspect_err(|e| tracing::error!(kind = e.kind(), error = %e, "import failed"))?;
            serde_json::to_string_pretty(&imported)?
        }
        None => {
            let handle = CancelHandle::new();
            let token = handle.token();
            let run = pipeline.recommend_cancellable(&request.preferences, &request.inputs, token);
            tokio::pin!(run);

            let result = tokio::select! {
                result = &mut run => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("interrupt received, cancelling in-flight calculations");
                    handle.cancel();
                    run.await
                }
            };
            let result =
                result.inspect_err(|e| tracing::error!(kind = e.kind(), error = %e, "pipeline failed"))?;
            serde_json::to_string_pretty(&result)?
        }
    };

    println!("{output}");
    Ok(())
}
