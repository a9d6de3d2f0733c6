//! Logging Initialization
//!
//! Two sinks behind one `EnvFilter` (`RUST_LOG`, default `info`):
//! - a JSON file log, rolled daily under the configured log directory
//! - a human-readable stderr log
//!
//! Stdout stays free for the binary's JSON output. `log` records from
//! configuration code are bridged into `tracing`.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "buildsmith.log";

/// Initialize the logging system, writing the file log under `log_dir`.
///
/// Returns a `WorkerGuard` which must be kept alive for the duration of the
/// application so buffered file logs are flushed on shutdown.
pub fn init(log_dir: &Path) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // File Layer: JSON format for easy parsing/ingestion
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter.clone());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    }

    // Redirect standard `log` macros to `tracing`
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    // Compress old logs in background (AFTER logging is initialized so log macros work)
    let compress_dir = log_dir.to_path_buf();
    std::thread::spawn(move || {
        compress_old_logs(&compress_dir);
    });

    tracing::info!(
        path = %log_dir.join(LOG_FILE_PREFIX).display(),
        "logging initialized (daily rolling)"
    );

    guard
}

/// Install a test-writer subscriber once per process.
pub fn init_for_tests() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Gzip every rotated log except today's. Returns the number of files
/// compressed.
pub fn compress_old_logs(log_dir: &Path) -> usize {
    let today_suffix = chrono::Local::now().format("%Y-%m-%d").to_string();
    let Ok(entries) = fs::read_dir(log_dir) else {
        return 0;
    };

    let mut compressed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let rotated = name.starts_with(&format!("{LOG_FILE_PREFIX}."))
            && !name.ends_with(&today_suffix)
            && !name.ends_with(".gz");
        if !rotated {
            continue;
        }
        match compress_file(&path) {
            Ok(()) => {
                log::info!("Compressed old log: {:?}", path);
                compressed += 1;
            }
            Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
        }
    }
    compressed
}

fn compress_file(path: &Path) -> io::Result<()> {
    let mut gz_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_name.push(".gz");
    let gz_path = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?
        .join(gz_name);

    // Skip if already exists
    if gz_path.exists() {
        return Ok(());
    }

    let mut reader = io::BufReader::new(fs::File::open(path)?);
    let mut encoder = GzEncoder::new(fs::File::create(&gz_path)?, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)
}
