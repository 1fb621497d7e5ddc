//! In-Memory Ledger Adapter
//!
//! Implements `LedgerGateway` against a local account table that enforces
//! the program's rules. Writes become readable only after a configurable
//! number of reads, which models a ledger that lags behind submission.

use async_trait::async_trait;
use parking_lot::RwLock;
use solana_program::hash::hashv;
use solana_program::pubkey::Pubkey;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::algorithms::derive_event_address;
use crate::domain::{InviteError, TransactionId, MAX_COMMENT_TEXT};
use crate::ports::outbound::{LedgerGateway, ProgramOperation, TransactionSigner};
use crate::ports::records::{RawComment, RawEventAccount, RawEventRecord, RawNumber};

/// Event account as the program stores it.
#[derive(Clone, Debug, PartialEq, Eq)]
struct StoredEvent {
    name: String,
    date_seconds: i64,
    creator: Pubkey,
    coming: u64,
    busy: u64,
    comments: Vec<StoredComment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct StoredComment {
    id: u64,
    author: Pubkey,
    content: String,
}

impl StoredEvent {
    fn to_raw(&self) -> RawEventAccount {
        RawEventAccount {
            event_name: self.name.clone(),
            // 64-bit fields come through big-integer wrappers
            event_date: RawNumber::Big(self.date_seconds.to_string()),
            creator: self.creator.to_string(),
            coming_count: RawNumber::from(self.coming),
            busy_count: RawNumber::from(self.busy),
            comments: Some(
                self.comments
                    .iter()
                    .map(|c| RawComment {
                        comment_id: Some(RawNumber::from(c.id)),
                        comment_author: c.author.to_string(),
                        content: c.content.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

type Accounts = BTreeMap<Pubkey, StoredEvent>;

struct LedgerState {
    /// Every accepted write applied.
    committed: Accounts,
    /// What reads currently see.
    visible: Accounts,
    /// Snapshots waiting to become visible, with reads remaining.
    pending: VecDeque<(u32, Accounts)>,
    visibility_lag: u32,
}

impl LedgerState {
    fn publish(&mut self) {
        if self.visibility_lag == 0 {
            self.visible = self.committed.clone();
        } else {
            self.pending
                .push_back((self.visibility_lag, self.committed.clone()));
        }
    }

    fn on_read(&mut self) {
        for (remaining, _) in self.pending.iter_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        while matches!(self.pending.front(), Some((0, _))) {
            if let Some((_, snapshot)) = self.pending.pop_front() {
                self.visible = snapshot;
            }
        }
    }
}

/// In-memory ledger.
///
/// Enforces: an event address can only be initialized once and only at the
/// address derived from its name and creator; attendance and comments need
/// an existing account.
pub struct InMemoryLedger {
    program_id: Pubkey,
    state: RwLock<LedgerState>,
    reject_signatures: AtomicBool,
    fail_reads: AtomicBool,
    submissions: AtomicU64,
    reads: AtomicU64,
}

impl InMemoryLedger {
    /// Empty ledger with immediate visibility.
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            state: RwLock::new(LedgerState {
                committed: Accounts::new(),
                visible: Accounts::new(),
                pending: VecDeque::new(),
                visibility_lag: 0,
            }),
            reject_signatures: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            submissions: AtomicU64::new(0),
            reads: AtomicU64::new(0),
        }
    }

    /// Writes become readable only after `reads` subsequent reads.
    pub fn with_visibility_lag(self, reads: u32) -> Self {
        self.set_visibility_lag(reads);
        self
    }

    /// Change the visibility lag for future writes.
    pub fn set_visibility_lag(&self, reads: u32) {
        self.state.write().visibility_lag = reads;
    }

    /// Make every submission fail as a signer rejection.
    pub fn set_reject_signatures(&self, reject: bool) {
        self.reject_signatures.store(reject, Ordering::SeqCst);
    }

    /// Make every read fail as a network error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Submissions attempted so far, accepted or not.
    pub fn submission_count(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Reads served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Insert an event directly, visible at once. Returns its address.
    pub fn seed_event(
        &self,
        name: &str,
        date_seconds: i64,
        creator: Pubkey,
    ) -> Result<Pubkey, InviteError> {
        let (address, _) = derive_event_address(&self.program_id, name, &creator)?;
        let mut state = self.state.write();
        let event = StoredEvent {
            name: name.to_string(),
            date_seconds,
            creator,
            coming: 0,
            busy: 0,
            comments: Vec::new(),
        };
        state.committed.insert(address, event.clone());
        state.visible.insert(address, event);
        Ok(address)
    }

    fn begin_read(&self) -> Result<(), InviteError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(InviteError::Fetch("connection refused".to_string()));
        }
        Ok(())
    }

    fn apply(
        &self,
        accounts: &mut Accounts,
        operation: &ProgramOperation,
        signer: Pubkey,
    ) -> Result<(), InviteError> {
        let event = *operation.event();
        match operation {
            ProgramOperation::InitializeBdayEvent {
                name, date_seconds, ..
            } => {
                let (expected, _) = derive_event_address(&self.program_id, name, &signer)
                    .map_err(|e| InviteError::Submission(e.to_string()))?;
                if expected != event {
                    return Err(InviteError::Submission(
                        "ConstraintSeeds: event address does not match seeds".to_string(),
                    ));
                }
                if accounts.contains_key(&event) {
                    return Err(InviteError::Submission(format!(
                        "Allocate: account {} already in use",
                        event
                    )));
                }
                accounts.insert(
                    event,
                    StoredEvent {
                        name: name.clone(),
                        date_seconds: *date_seconds,
                        creator: signer,
                        coming: 0,
                        busy: 0,
                        comments: Vec::new(),
                    },
                );
            }
            ProgramOperation::ConfirmAttendance { name, .. } => {
                existing(accounts, &event, name)?.coming += 1;
            }
            ProgramOperation::DeclineAttendance { name, .. } => {
                existing(accounts, &event, name)?.busy += 1;
            }
            ProgramOperation::AddComment { name, text, .. } => {
                if text.chars().count() > MAX_COMMENT_TEXT {
                    return Err(InviteError::Submission(
                        "CommentTooLong: comment exceeds 500 characters".to_string(),
                    ));
                }
                let stored = existing(accounts, &event, name)?;
                let id = stored.comments.len() as u64;
                stored.comments.push(StoredComment {
                    id,
                    author: signer,
                    content: text.clone(),
                });
            }
        }
        Ok(())
    }
}

fn existing<'a>(
    accounts: &'a mut Accounts,
    address: &Pubkey,
    name: &str,
) -> Result<&'a mut StoredEvent, InviteError> {
    let stored = accounts.get_mut(address).ok_or_else(|| {
        InviteError::Submission(format!("AccountNotInitialized: {}", address))
    })?;
    if stored.name != name {
        return Err(InviteError::Submission(
            "ConstraintSeeds: event name does not match account".to_string(),
        ));
    }
    Ok(stored)
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    async fn fetch_event(&self, address: &Pubkey) -> Result<Option<RawEventAccount>, InviteError> {
        self.begin_read()?;
        let mut state = self.state.write();
        state.on_read();
        Ok(state.visible.get(address).map(StoredEvent::to_raw))
    }

    async fn fetch_all_events(&self) -> Result<Vec<RawEventRecord>, InviteError> {
        self.begin_read()?;
        let mut state = self.state.write();
        state.on_read();
        Ok(state
            .visible
            .iter()
            .map(|(address, event)| RawEventRecord {
                address: *address,
                account: event.to_raw(),
            })
            .collect())
    }

    async fn submit(
        &self,
        operation: &ProgramOperation,
        signer: &dyn TransactionSigner,
    ) -> Result<TransactionId, InviteError> {
        let sequence = self.submissions.fetch_add(1, Ordering::SeqCst);
        let method = operation.method_name();

        if self.reject_signatures.load(Ordering::SeqCst) {
            warn!(method, "Signer rejected submission");
            return Err(InviteError::Submission(
                "User rejected the request.".to_string(),
            ));
        }

        let identity = signer.pubkey();
        let mut state = self.state.write();
        let mut next = state.committed.clone();
        self.apply(&mut next, operation, identity)?;
        state.committed = next;
        state.publish();

        let signature = hashv(&[
            &sequence.to_le_bytes(),
            method.as_bytes(),
            operation.event().as_ref(),
            identity.as_ref(),
        ]);
        debug!(method, event = %operation.event(), "Accepted submission");
        Ok(TransactionId::new(signature.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::KeypairSigner;

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::new(Pubkey::new_from_array([7u8; 32]))
    }

    fn init(ledger: &InMemoryLedger, signer: &KeypairSigner, name: &str) -> ProgramOperation {
        let (event, _) =
            derive_event_address(&ledger.program_id(), name, &signer.pubkey()).unwrap();
        ProgramOperation::InitializeBdayEvent {
            name: name.to_string(),
            date_seconds: 4_070_908_800,
            event,
        }
    }

    #[tokio::test]
    async fn test_initialize_then_fetch() {
        let ledger = ledger();
        let signer = KeypairSigner::from_seed([1u8; 32]);
        let op = init(&ledger, &signer, "Party");

        let tx = ledger.submit(&op, &signer).await.unwrap();
        assert!(!tx.as_str().is_empty());

        let raw = ledger.fetch_event(op.event()).await.unwrap().unwrap();
        assert_eq!(raw.event_name, "Party");
        assert_eq!(raw.creator, signer.pubkey().to_string());
        assert_eq!(raw.event_date, RawNumber::Big("4070908800".to_string()));
        assert_eq!(ledger.fetch_all_events().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_initialize_rejected() {
        let ledger = ledger();
        let signer = KeypairSigner::from_seed([1u8; 32]);
        let op = init(&ledger, &signer, "Party");

        ledger.submit(&op, &signer).await.unwrap();
        let err = ledger.submit(&op, &signer).await.unwrap_err();
        assert!(err.to_string().contains("already in use"));
        assert_eq!(ledger.submission_count(), 2);
    }

    #[tokio::test]
    async fn test_initialize_at_foreign_address_rejected() {
        let ledger = ledger();
        let alice = KeypairSigner::from_seed([1u8; 32]);
        let bob = KeypairSigner::from_seed([2u8; 32]);
        let op = init(&ledger, &alice, "Party");

        assert!(matches!(
            ledger.submit(&op, &bob).await,
            Err(InviteError::Submission(_))
        ));
    }

    #[tokio::test]
    async fn test_attendance_needs_account() {
        let ledger = ledger();
        let signer = KeypairSigner::from_seed([1u8; 32]);
        let op = ProgramOperation::ConfirmAttendance {
            name: "Ghost".to_string(),
            event: Pubkey::new_unique(),
        };
        let err = ledger.submit(&op, &signer).await.unwrap_err();
        assert!(err.to_string().contains("AccountNotInitialized"));
    }

    #[tokio::test]
    async fn test_counters_and_comments_accumulate() {
        let ledger = ledger();
        let signer = KeypairSigner::from_seed([1u8; 32]);
        let op = init(&ledger, &signer, "Party");
        let event = *op.event();
        ledger.submit(&op, &signer).await.unwrap();

        for op in [
            ProgramOperation::ConfirmAttendance {
                name: "Party".into(),
                event,
            },
            ProgramOperation::ConfirmAttendance {
                name: "Party".into(),
                event,
            },
            ProgramOperation::DeclineAttendance {
                name: "Party".into(),
                event,
            },
            ProgramOperation::AddComment {
                name: "Party".into(),
                text: "See you".into(),
                event,
            },
        ] {
            ledger.submit(&op, &signer).await.unwrap();
        }

        let raw = ledger.fetch_event(&event).await.unwrap().unwrap();
        assert_eq!(raw.coming_count.to_u64("comingCount").unwrap(), 2);
        assert_eq!(raw.busy_count.to_u64("busyCount").unwrap(), 1);
        assert_eq!(raw.comment_count(), 1);
    }

    #[tokio::test]
    async fn test_visibility_lag_counts_reads() {
        let ledger = ledger().with_visibility_lag(2);
        let signer = KeypairSigner::from_seed([1u8; 32]);
        let op = init(&ledger, &signer, "Party");
        ledger.submit(&op, &signer).await.unwrap();

        assert!(ledger.fetch_event(op.event()).await.unwrap().is_none());
        assert!(ledger.fetch_event(op.event()).await.unwrap().is_some());
        assert_eq!(ledger.read_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_signature_changes_nothing() {
        let ledger = ledger();
        let signer = KeypairSigner::from_seed([1u8; 32]);
        ledger.set_reject_signatures(true);

        let op = init(&ledger, &signer, "Party");
        assert!(matches!(
            ledger.submit(&op, &signer).await,
            Err(InviteError::Submission(_))
        ));
        assert!(ledger.fetch_all_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reads() {
        let ledger = ledger();
        ledger.set_fail_reads(true);
        assert!(matches!(
            ledger.fetch_all_events().await,
            Err(InviteError::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn test_seeded_event_is_visible() {
        let ledger = ledger().with_visibility_lag(5);
        let creator = Pubkey::new_from_array([3u8; 32]);
        let address = ledger.seed_event("Bob's bash", 4_070_908_800, creator).unwrap();
        let raw = ledger.fetch_event(&address).await.unwrap().unwrap();
        assert_eq!(raw.creator, creator.to_string());
    }
}
