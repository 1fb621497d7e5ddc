//! # Invite Configuration
//!
//! Endpoint, program identity and timing knobs for the access layer.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::algorithms::ReconcilePolicy;
use crate::domain::InviteError;

/// Program id used when none is configured.
pub const DEFAULT_PROGRAM_ID: &str = "BDayxrx5cLBs9FDQ6e2FXwDJ7L5Ke3X2HMn8mq3Rw1UE";

/// Access layer configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InviteConfig {
    /// Base58 id of the invite program.
    pub program_id: String,

    /// JSON-RPC endpoint.
    pub rpc_url: String,

    /// Cluster name used in explorer links.
    pub cluster: String,

    /// Commitment level for reads.
    pub commitment: String,

    /// Wait after a submission before the first visibility check.
    pub settle_delay_ms: u64,

    /// Visibility checks before a write is reported unconfirmed.
    pub max_confirm_attempts: u32,

    /// Delay multiplier between checks.
    pub backoff_factor: u32,

    /// Upper bound on a single check delay.
    pub max_backoff_ms: u64,

    /// Background event refresh period.
    pub refresh_interval_secs: u64,

    /// HTTP request timeout.
    pub request_timeout_secs: u64,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            rpc_url: "https://api.devnet.solana.com".to_string(),
            cluster: "devnet".to_string(),
            commitment: "confirmed".to_string(),
            settle_delay_ms: 2000,
            max_confirm_attempts: 5,
            backoff_factor: 2,
            max_backoff_ms: 8000,
            refresh_interval_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

impl InviteConfig {
    /// Config for tests: millisecond delays, few checks.
    pub fn for_testing() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8899".to_string(),
            cluster: "localnet".to_string(),
            settle_delay_ms: 1,
            max_confirm_attempts: 3,
            max_backoff_ms: 4,
            refresh_interval_secs: 30,
            request_timeout_secs: 2,
            ..Self::default()
        }
    }

    /// Read overrides from the environment.
    ///
    /// - `BDAY_PROGRAM_ID`, `BDAY_RPC_URL`, `BDAY_CLUSTER`, `BDAY_COMMITMENT`
    /// - `BDAY_SETTLE_DELAY_MS`, `BDAY_MAX_CONFIRM_ATTEMPTS`, `BDAY_MAX_BACKOFF_MS`
    /// - `BDAY_REFRESH_INTERVAL_SECS`, `BDAY_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            program_id: env::var("BDAY_PROGRAM_ID").unwrap_or(defaults.program_id),
            rpc_url: env::var("BDAY_RPC_URL").unwrap_or(defaults.rpc_url),
            cluster: env::var("BDAY_CLUSTER").unwrap_or(defaults.cluster),
            commitment: env::var("BDAY_COMMITMENT").unwrap_or(defaults.commitment),
            settle_delay_ms: env_parse("BDAY_SETTLE_DELAY_MS").unwrap_or(defaults.settle_delay_ms),
            max_confirm_attempts: env_parse("BDAY_MAX_CONFIRM_ATTEMPTS")
                .unwrap_or(defaults.max_confirm_attempts),
            backoff_factor: defaults.backoff_factor,
            max_backoff_ms: env_parse("BDAY_MAX_BACKOFF_MS").unwrap_or(defaults.max_backoff_ms),
            refresh_interval_secs: env_parse("BDAY_REFRESH_INTERVAL_SECS")
                .unwrap_or(defaults.refresh_interval_secs),
            request_timeout_secs: env_parse("BDAY_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Parsed program id.
    pub fn program_id(&self) -> Result<Pubkey, InviteError> {
        Pubkey::from_str(&self.program_id)
            .map_err(|e| InviteError::Config(format!("program_id {:?}: {}", self.program_id, e)))
    }

    /// Reconciliation schedule.
    pub fn reconcile_policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            max_attempts: self.max_confirm_attempts,
            backoff_factor: self.backoff_factor,
            max_delay: Duration::from_millis(self.max_backoff_ms),
        }
    }

    /// Background refresh period.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
