//! # Write Reconciliation
//!
//! After a submission the ledger needs time before the write is readable.
//! Wait a settle delay, check, then back off exponentially until the write
//! shows up or the attempt bound is reached.

use std::future::Future;
use std::time::Duration;

use crate::domain::{InviteError, TransactionId};

/// How long and how often to look for a submitted write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Wait before the first check.
    pub settle_delay: Duration,
    /// Checks before giving up. Zero means a single check.
    pub max_attempts: u32,
    /// Delay multiplier between checks.
    pub backoff_factor: u32,
    /// Cap on any single delay.
    pub max_delay: Duration,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            max_attempts: 5,
            backoff_factor: 2,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl ReconcilePolicy {
    /// Delay before check number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1).saturating_pow(attempt);
        self.settle_delay
            .saturating_mul(factor)
            .min(self.max_delay.max(self.settle_delay))
    }
}

/// Poll `check` until it reports the write as visible.
///
/// Returns the number of checks used. Check errors count as "not yet
/// visible". After the last check fails, returns
/// [`InviteError::UnconfirmedWrite`].
pub async fn await_visible<F, Fut>(
    policy: &ReconcilePolicy,
    tx: &TransactionId,
    mut check: F,
) -> Result<u32, InviteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, InviteError>>,
{
    let attempts = policy.max_attempts.max(1);

    for attempt in 0..attempts {
        tokio::time::sleep(policy.delay_for(attempt)).await;

        match check().await {
            Ok(true) => {
                tracing::debug!(tx = %tx, attempt = attempt + 1, "Write visible");
                return Ok(attempt + 1);
            }
            Ok(false) => {
                tracing::debug!(tx = %tx, attempt = attempt + 1, "Write not visible yet");
            }
            Err(e) => {
                tracing::warn!(tx = %tx, attempt = attempt + 1, "Visibility check failed: {}", e);
            }
        }
    }

    Err(InviteError::UnconfirmedWrite {
        tx: tx.clone(),
        attempts,
    })
}
