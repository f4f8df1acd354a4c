// Veriscan
// Deepfake detection workflow client: media submission, report polling,
// result normalization.

pub mod error;
pub mod models;
pub mod services;

pub use error::VerifyError;
pub use models::{
    DetectionDetails, MediaFile, MediaKind, NormalizerPolicy, StatusPolicy, StatusSnapshot,
    VerificationResult, VerificationStatus,
};
pub use services::client::{DetectorEndpoints, VerificationClient};
pub use services::session::{JsonSessionStore, SessionStore};
pub use services::verification::{classify, normalize_report, poll_report, NormalizeContext};

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn default_logs_dir() -> PathBuf {
    services::config_store::default_config_dir()
        .map(|p| p.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn init_console_only_logging(env_filter: EnvFilter) {
    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true);
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

/// Initialize logging: console always, plus a non-blocking per-session log
/// file unless disabled. Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let disable_file_log = matches!(
        env::var("VERISCAN_DISABLE_FILE_LOG").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    );
    if disable_file_log {
        init_console_only_logging(env_filter);
        return;
    }

    let logs_dir = match env::var("VERISCAN_LOG_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => default_logs_dir(),
    };

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Failed to create logs directory: {}", e);
        init_console_only_logging(env_filter);
        info!("Falling back to console-only logging (log dir not writable)");
        return;
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("veriscan_{}.log", timestamp);

    // One file per session; log writes stay non-blocking.
    let file_appender = rolling::never(&logs_dir, &log_filename);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(file_guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    info!("Logging initialized, log file: {}", log_filename);
}
