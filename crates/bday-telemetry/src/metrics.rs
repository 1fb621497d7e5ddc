//! Prometheus counters for ledger traffic.
//!
//! Names follow `bday_<area>_<metric>_total`.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Gateway reads by kind (`one`, `all`)
    pub static ref LEDGER_FETCHES: CounterVec = CounterVec::new(
        Opts::new("bday_ledger_fetches_total", "Ledger reads issued by the gateway"),
        &["kind"]
    ).expect("metric creation failed");

    /// Transactions handed to the gateway, by on-chain method
    pub static ref LEDGER_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("bday_ledger_submissions_total", "Transactions submitted"),
        &["method"]
    ).expect("metric creation failed");

    /// Submissions that failed at the signer or the network
    pub static ref SUBMISSION_FAILURES: Counter = Counter::new(
        "bday_ledger_submission_failures_total",
        "Submissions rejected by the signer or the network"
    ).expect("metric creation failed");

    /// Writes that never became visible within the confirmation bound
    pub static ref UNCONFIRMED_WRITES: Counter = Counter::new(
        "bday_reconcile_unconfirmed_writes_total",
        "Writes not visible after the confirmation bound"
    ).expect("metric creation failed");

    /// Event accounts left out of a listing, by stage (`decode`, `map`)
    pub static ref SKIPPED_ACCOUNTS: CounterVec = CounterVec::new(
        Opts::new("bday_ledger_skipped_accounts_total", "Event accounts that could not be read"),
        &["stage"]
    ).expect("metric creation failed");

    /// Inputs rejected before any transaction was built
    pub static ref VALIDATION_REJECTIONS: Counter = Counter::new(
        "bday_validation_rejections_total",
        "Inputs rejected by local validation"
    ).expect("metric creation failed");
}

/// Keeps the registry alive.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all counters with the global registry.
///
/// Calling this twice returns an error from the second registration.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(LEDGER_FETCHES.clone()),
        Box::new(LEDGER_SUBMISSIONS.clone()),
        Box::new(SUBMISSION_FAILURES.clone()),
        Box::new(UNCONFIRMED_WRITES.clone()),
        Box::new(VALIDATION_REJECTIONS.clone()),
        Box::new(SKIPPED_ACCOUNTS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
