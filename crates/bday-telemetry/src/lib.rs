//! # Birthday Invite Telemetry
//!
//! Structured logging and Prometheus counters shared by the invite crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bday_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     tracing::info!("ready");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `bday-invite` | Service name attached to log lines |
//! | `BDAY_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `BDAY_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |
//! | `BDAY_CONSOLE_OUTPUT` | `true` | Write logs to stderr at all |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingGuard};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, LEDGER_FETCHES, LEDGER_SUBMISSIONS,
    SKIPPED_ACCOUNTS, SUBMISSION_FAILURES, UNCONFIRMED_WRITES, VALIDATION_REJECTIONS,
};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A collector could not be registered.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Configuration values were rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register the invite counters.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let logging = init_logging(&config)?;

    Ok(TelemetryGuard {
        logging,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    logging: LoggingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = self.logging.service_name(), "Shutting down telemetry");
    }
}
