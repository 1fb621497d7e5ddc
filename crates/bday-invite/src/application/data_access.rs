//! # Data Access Service
//!
//! Named ledger operations over the address deriver, gateway and mapper.
//!
//! Every write runs the same protocol:
//! 1. validate locally, before any transaction exists
//! 2. derive the event address and submit
//! 3. poll until the write is visible, then re-fetch the affected collection
//!
//! Fetches never fail to the caller: errors land in the shared `error` slot
//! and the collection is emptied. Writes record the same message and then
//! return the error.

use bday_telemetry::log_tx_event;
use bday_telemetry::metrics::{
    LEDGER_FETCHES, LEDGER_SUBMISSIONS, SKIPPED_ACCOUNTS, SUBMISSION_FAILURES,
    UNCONFIRMED_WRITES, VALIDATION_REJECTIONS,
};
use chrono::Utc;
use solana_program::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, warn};

use super::state::{LoadingGuard, SharedState};
use crate::algorithms::{
    await_visible, derive_event_address, map_comments, map_events, ReconcilePolicy,
};
use crate::domain::{
    parse_event_date, validate_comment, validate_event_date, validate_new_event_name,
    BirthdayEvent, Comment, InviteError, TransactionId,
};
use crate::ports::outbound::{LedgerGateway, ProgramOperation, TransactionSigner, WalletProvider};
use crate::ports::records::RawEventAccount;

/// Data access service - ledger operations with validation and reconciliation.
pub struct DataAccessService<G: LedgerGateway> {
    gateway: Arc<G>,
    wallet: Arc<dyn WalletProvider>,
    state: SharedState,
    policy: ReconcilePolicy,
}

impl<G: LedgerGateway> DataAccessService<G> {
    /// Create a new data access service writing into `state`.
    pub fn new(
        gateway: Arc<G>,
        wallet: Arc<dyn WalletProvider>,
        state: SharedState,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            gateway,
            wallet,
            state,
            policy,
        }
    }

    /// Shared state this service writes into.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Underlying gateway.
    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Whether a signer is connected.
    pub fn is_ready_for_transactions(&self) -> bool {
        self.wallet.is_connected()
    }

    /// Drop the recorded error.
    pub fn clear_error(&self) {
        self.state.write().clear_error();
    }

    /// List every event.
    ///
    /// Without a wallet, or on any failure, the list is emptied and the error
    /// recorded.
    pub async fn fetch_events(&self) -> Vec<BirthdayEvent> {
        if !self.wallet.is_connected() {
            let err = InviteError::NotInitialized("Wallet not connected".to_string());
            let mut state = self.state.write();
            state.set_events(Vec::new());
            state.set_error(err.to_string());
            return Vec::new();
        }

        let _loading = LoadingGuard::begin(&self.state);
        LEDGER_FETCHES.with_label_values(&["all"]).inc();

        let fetched = self.gateway.fetch_all_events().await.map(|records| {
            let mapped = map_events(&records);
            for (address, e) in &mapped.skipped {
                SKIPPED_ACCOUNTS.with_label_values(&["map"]).inc();
                warn!(event = %address, "Skipping event: {}", e);
            }
            mapped.events
        });

        let mut state = self.state.write();
        match fetched {
            Ok(events) => {
                debug!(count = events.len(), "Fetched events");
                state.set_events(events.clone());
                state.refresh_selected();
                state.clear_error();
                events
            }
            Err(e) => {
                warn!("Failed to fetch events: {}", e);
                state.set_events(Vec::new());
                state.set_error(e.to_string());
                Vec::new()
            }
        }
    }

    /// Comments of the event `name` created by `creator`.
    ///
    /// Empty without a wallet or for a name that cannot address an event.
    pub async fn fetch_comments(&self, name: &str, creator: &Pubkey) -> Vec<Comment> {
        if !self.wallet.is_connected() {
            self.state.write().set_comments(Vec::new());
            return Vec::new();
        }
        let Ok((address, _)) = derive_event_address(&self.gateway.program_id(), name, creator)
        else {
            self.state.write().set_comments(Vec::new());
            return Vec::new();
        };

        let _loading = LoadingGuard::begin(&self.state);
        LEDGER_FETCHES.with_label_values(&["one"]).inc();

        let fetched = match self.gateway.fetch_event(&address).await {
            Ok(Some(account)) => map_comments(account.comments.as_deref(), Utc::now()),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(e),
        };

        let mut state = self.state.write();
        match fetched {
            Ok(comments) => {
                debug!(event = %address, count = comments.len(), "Fetched comments");
                state.set_comments(comments.clone());
                state.clear_error();
                comments
            }
            Err(e) => {
                warn!(event = %address, "Failed to fetch comments: {}", e);
                state.set_comments(Vec::new());
                state.set_error(e.to_string());
                Vec::new()
            }
        }
    }

    /// Create an event owned by the connected wallet.
    ///
    /// `date` is `YYYY-MM-DD` or RFC 3339 and must lie strictly in the future.
    pub async fn create_event(&self, name: &str, date: &str) -> Result<TransactionId, InviteError> {
        let date_seconds = validate_new_event_name(name)
            .and_then(|_| parse_event_date(date))
            .and_then(|parsed| validate_event_date(parsed, Utc::now()).map(|_| parsed.timestamp()))
            .map_err(|e| self.reject(e))?;

        let signer = self.signer()?;
        let creator = signer.pubkey();
        let (event, _) = derive_event_address(&self.gateway.program_id(), name, &creator)
            .map_err(|e| self.reject(e))?;

        let _loading = LoadingGuard::begin(&self.state);

        match self.gateway.fetch_event(&event).await {
            Ok(Some(_)) => {
                return Err(self.reject(InviteError::Validation(format!(
                    "You already have an event named {:?}",
                    name
                ))));
            }
            Ok(None) => {}
            Err(e) => warn!(event = %event, "Duplicate check skipped: {}", e),
        }

        let operation = ProgramOperation::InitializeBdayEvent {
            name: name.to_string(),
            date_seconds,
            event,
        };
        let tx = self.submit(&operation, signer.as_ref()).await?;
        let outcome = self
            .reconcile(&operation, tx, |account| account.is_some())
            .await;
        self.fetch_events().await;
        self.finish(outcome)
    }

    /// RSVP "coming" to the event `name` created by `creator`.
    pub async fn confirm_attendance(
        &self,
        name: &str,
        creator: &Pubkey,
    ) -> Result<TransactionId, InviteError> {
        self.attendance(name, creator, true).await
    }

    /// RSVP "busy" to the event `name` created by `creator`.
    pub async fn decline_attendance(
        &self,
        name: &str,
        creator: &Pubkey,
    ) -> Result<TransactionId, InviteError> {
        self.attendance(name, creator, false).await
    }

    async fn attendance(
        &self,
        name: &str,
        creator: &Pubkey,
        coming: bool,
    ) -> Result<TransactionId, InviteError> {
        let signer = self.signer()?;
        let (event, _) = derive_event_address(&self.gateway.program_id(), name, creator)
            .map_err(|e| self.reject(e))?;

        let _loading = LoadingGuard::begin(&self.state);

        let prior = self.existing(&event, name).await?;
        let before = attendance_count(&prior, coming).map_err(|e| self.record(e))?;

        let operation = if coming {
            ProgramOperation::ConfirmAttendance {
                name: name.to_string(),
                event,
            }
        } else {
            ProgramOperation::DeclineAttendance {
                name: name.to_string(),
                event,
            }
        };
        let tx = self.submit(&operation, signer.as_ref()).await?;
        let outcome = self
            .reconcile(&operation, tx, |account| {
                account
                    .and_then(|a| attendance_count(a, coming).ok())
                    .map_or(false, |now| now > before)
            })
            .await;
        self.fetch_events().await;
        self.finish(outcome)
    }

    /// Comment on the event `name` created by `creator`.
    pub async fn add_comment(
        &self,
        name: &str,
        creator: &Pubkey,
        text: &str,
    ) -> Result<TransactionId, InviteError> {
        validate_comment(text).map_err(|e| self.reject(e))?;
        let signer = self.signer()?;
        let (event, _) = derive_event_address(&self.gateway.program_id(), name, creator)
            .map_err(|e| self.reject(e))?;

        let _loading = LoadingGuard::begin(&self.state);

        let before = self.existing(&event, name).await?.comment_count();
        let operation = ProgramOperation::AddComment {
            name: name.to_string(),
            text: text.to_string(),
            event,
        };
        let tx = self.submit(&operation, signer.as_ref()).await?;
        let outcome = self
            .reconcile(&operation, tx, |account| {
                account.map_or(false, |a| a.comment_count() > before)
            })
            .await;
        self.fetch_comments(name, creator).await;
        self.finish(outcome)
    }

    /// Re-fetch events, and the comments of `selected` if given.
    pub async fn refresh_data(&self, selected: Option<&BirthdayEvent>) {
        self.fetch_events().await;
        if let Some(event) = selected {
            self.fetch_comments(&event.name, &event.creator).await;
        }
    }

    fn signer(&self) -> Result<Arc<dyn TransactionSigner>, InviteError> {
        self.wallet.current_signer().ok_or_else(|| {
            self.record(InviteError::NotInitialized(
                "Wallet not connected".to_string(),
            ))
        })
    }

    async fn existing(&self, event: &Pubkey, name: &str) -> Result<RawEventAccount, InviteError> {
        LEDGER_FETCHES.with_label_values(&["one"]).inc();
        match self.gateway.fetch_event(event).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(self.record(InviteError::NotFound(format!(
                "event {:?} at {}",
                name, event
            )))),
            Err(e) => Err(self.record(e)),
        }
    }

    async fn submit(
        &self,
        operation: &ProgramOperation,
        signer: &dyn TransactionSigner,
    ) -> Result<TransactionId, InviteError> {
        let method = operation.method_name();
        LEDGER_SUBMISSIONS.with_label_values(&[method]).inc();

        match self.gateway.submit(operation, signer).await {
            Ok(tx) => {
                log_tx_event!(info, "data_access", "Submitted", tx, method, event = %operation.event());
                Ok(tx)
            }
            Err(e) => {
                SUBMISSION_FAILURES.inc();
                warn!(method, "Submission failed: {}", e);
                Err(self.record(e))
            }
        }
    }

    /// Poll the event account until `visible` holds for it.
    async fn reconcile<P>(
        &self,
        operation: &ProgramOperation,
        tx: TransactionId,
        visible: P,
    ) -> Result<TransactionId, InviteError>
    where
        P: Fn(Option<&RawEventAccount>) -> bool + Sync,
    {
        let method = operation.method_name();
        let address = *operation.event();
        let gateway = &self.gateway;
        let visible = &visible;
        let check = move || async move {
            LEDGER_FETCHES.with_label_values(&["one"]).inc();
            let account = gateway.fetch_event(&address).await?;
            Ok::<bool, InviteError>(visible(account.as_ref()))
        };

        match await_visible(&self.policy, &tx, check).await {
            Ok(attempts) => {
                debug!(method, tx = %tx, attempts, "Write reconciled");
                Ok(tx)
            }
            Err(e) => {
                UNCONFIRMED_WRITES.inc();
                warn!(method, tx = %tx, "{}", e);
                Err(e)
            }
        }
    }

    /// Record the outcome of a write after the re-fetch, which may have
    /// cleared the error slot.
    fn finish(
        &self,
        outcome: Result<TransactionId, InviteError>,
    ) -> Result<TransactionId, InviteError> {
        match outcome {
            Ok(tx) => {
                self.state.write().clear_error();
                Ok(tx)
            }
            Err(e) => Err(self.record(e)),
        }
    }

    fn reject(&self, err: InviteError) -> InviteError {
        VALIDATION_REJECTIONS.inc();
        self.record(err)
    }

    fn record(&self, err: InviteError) -> InviteError {
        self.state.write().set_error(err.to_string());
        err
    }
}

fn attendance_count(account: &RawEventAccount, coming: bool) -> Result<u64, InviteError> {
    if coming {
        account.coming_count.to_u64("comingCount")
    } else {
        account.busy_count.to_u64("busyCount")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLedger, KeypairSigner, LocalWallet};
    use crate::application::state::InviteState;
    use crate::config::InviteConfig;
    use crate::ports::records::{RawEventRecord, RawNumber};

    struct Fixture {
        ledger: Arc<InMemoryLedger>,
        wallet: Arc<LocalWallet>,
        service: DataAccessService<InMemoryLedger>,
        identity: Pubkey,
    }

    fn fixture() -> Fixture {
        let config = InviteConfig::for_testing();
        let ledger = Arc::new(InMemoryLedger::new(config.program_id().unwrap()));
        let signer = Arc::new(KeypairSigner::from_seed([1u8; 32]));
        let identity = signer.pubkey();
        let wallet = Arc::new(LocalWallet::connected(signer));
        let service = DataAccessService::new(
            Arc::clone(&ledger),
            wallet.clone(),
            InviteState::shared(),
            config.reconcile_policy(),
        );
        Fixture {
            ledger,
            wallet,
            service,
            identity,
        }
    }

    #[tokio::test]
    async fn test_fetch_events_without_wallet() {
        let f = fixture();
        f.wallet.disconnect();

        assert!(f.service.fetch_events().await.is_empty());
        let state = f.service.state().read();
        assert!(state.error().unwrap().contains("Wallet not connected"));
        assert_eq!(f.ledger.read_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_events_failure_empties_list() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();
        assert_eq!(f.service.fetch_events().await.len(), 1);

        f.ledger.set_fail_reads(true);
        assert!(f.service.fetch_events().await.is_empty());
        let state = f.service.state().read();
        assert!(state.events().is_empty());
        assert!(state.error().unwrap().starts_with("Fetch failed"));
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_create_event_rejects_past_date_without_ledger_call() {
        let f = fixture();
        let err = f.service.create_event("Party", "2000-01-01").await.unwrap_err();
        assert_eq!(err.to_string(), "Please select a future date");
        assert_eq!(f.ledger.submission_count(), 0);
        assert_eq!(f.ledger.read_count(), 0);
    }

    #[tokio::test]
    async fn test_create_event_rejects_unparseable_date() {
        let f = fixture();
        let err = f.service.create_event("Party", "someday").await.unwrap_err();
        assert!(matches!(err, InviteError::Validation(_)));
        assert_eq!(f.ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_create_event_duplicate_caught_before_submit() {
        let f = fixture();
        f.service.create_event("Party", "2099-01-01").await.unwrap();

        let err = f.service.create_event("Party", "2099-06-01").await.unwrap_err();
        assert!(err.to_string().contains("already have an event"));
        assert_eq!(f.ledger.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_write_without_wallet_is_not_initialized() {
        let f = fixture();
        f.wallet.disconnect();
        let err = f.service.create_event("Party", "2099-01-01").await.unwrap_err();
        assert!(matches!(err, InviteError::NotInitialized(_)));
    }

    #[tokio::test]
    async fn test_attendance_on_missing_event() {
        let f = fixture();
        let err = f
            .service
            .confirm_attendance("Nobody's party", &f.identity)
            .await
            .unwrap_err();
        assert!(matches!(err, InviteError::NotFound(_)));
        assert_eq!(f.ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_decline_increments_busy() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();

        f.service.decline_attendance("Party", &f.identity).await.unwrap();
        let state = f.service.state().read();
        assert_eq!(state.events()[0].busy, 1);
        assert_eq!(state.events()[0].coming, 0);
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_comment_validation() {
        let f = fixture();
        let long = "x".repeat(501);
        assert!(f.service.add_comment("Party", &f.identity, "   ").await.is_err());
        assert!(f.service.add_comment("Party", &f.identity, &long).await.is_err());
        assert_eq!(f.ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_comment_on_someone_elses_event() {
        let f = fixture();
        let bob = Pubkey::new_from_array([5u8; 32]);
        f.ledger.seed_event("Bob's bash", 4_070_908_800, bob).unwrap();

        f.service
            .add_comment("Bob's bash", &bob, "Count me in")
            .await
            .unwrap();
        let comments = f.service.state().read().comments().to_vec();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, f.identity);
    }

    #[tokio::test]
    async fn test_fetch_comments_for_unknown_event_is_empty() {
        let f = fixture();
        assert!(f.service.fetch_comments("Ghost", &f.identity).await.is_empty());
        assert!(f.service.state().read().error().is_none());
    }

    #[tokio::test]
    async fn test_refresh_data_fetches_selected_comments() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();
        f.service
            .add_comment("Party", &f.identity, "First")
            .await
            .unwrap();
        f.service.state().write().set_comments(Vec::new());

        let events = f.service.fetch_events().await;
        f.service.refresh_data(events.first()).await;
        assert_eq!(f.service.state().read().comments().len(), 1);
    }

    fn assert_unconfirmed(f: &Fixture, result: Result<TransactionId, InviteError>) {
        let err = result.unwrap_err();
        assert!(
            matches!(err, InviteError::UnconfirmedWrite { attempts: 3, .. }),
            "{:?}",
            err
        );
        assert_eq!(f.ledger.submission_count(), 1);
        let state = f.service.state().read();
        assert_eq!(state.error(), Some(err.to_string().as_str()));
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_create_event_rejects_blank_name() {
        let f = fixture();
        let err = f.service.create_event("   ", "2099-01-01").await.unwrap_err();
        assert_eq!(err.to_string(), "Event name is required");
        assert_eq!(f.ledger.submission_count(), 0);
        assert_eq!(f.ledger.read_count(), 0);
    }

    #[tokio::test]
    async fn test_attendance_reconciles_through_lag() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();
        f.ledger.set_visibility_lag(2);

        f.service.confirm_attendance("Party", &f.identity).await.unwrap();
        assert_eq!(f.service.state().read().events()[0].coming, 1);

        f.service.decline_attendance("Party", &f.identity).await.unwrap();
        let state = f.service.state().read();
        assert_eq!(state.events()[0].busy, 1);
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_confirm_never_visible_is_unconfirmed() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();
        f.ledger.set_visibility_lag(1_000);

        let result = f.service.confirm_attendance("Party", &f.identity).await;
        assert_unconfirmed(&f, result);
        assert_eq!(f.service.state().read().events()[0].coming, 0);
    }

    #[tokio::test]
    async fn test_decline_never_visible_is_unconfirmed() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();
        f.ledger.set_visibility_lag(1_000);

        let result = f.service.decline_attendance("Party", &f.identity).await;
        assert_unconfirmed(&f, result);
        assert_eq!(f.service.state().read().events()[0].busy, 0);
    }

    #[tokio::test]
    async fn test_comment_reconciles_through_lag() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();
        f.ledger.set_visibility_lag(2);

        f.service
            .add_comment("Party", &f.identity, "On my way")
            .await
            .unwrap();
        let comments = f.service.state().read().comments().to_vec();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "On my way");
    }

    #[tokio::test]
    async fn test_comment_never_visible_is_unconfirmed() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();
        f.ledger.set_visibility_lag(1_000);

        let result = f.service.add_comment("Party", &f.identity, "Hello").await;
        assert_unconfirmed(&f, result);
        assert!(f.service.state().read().comments().is_empty());
    }

    #[tokio::test]
    async fn test_comment_refetches_comments_only() {
        let f = fixture();
        f.ledger
            .seed_event("Party", 4_070_908_800, f.identity)
            .unwrap();

        f.service
            .add_comment("Party", &f.identity, "Hello")
            .await
            .unwrap();
        let state = f.service.state().read();
        assert_eq!(state.comments().len(), 1);
        assert!(state.events().is_empty());
    }

    /// Gateway whose single-account reads carry a count in no known shape.
    struct GarbledCounts(InMemoryLedger);

    #[async_trait::async_trait]
    impl LedgerGateway for GarbledCounts {
        fn program_id(&self) -> Pubkey {
            self.0.program_id()
        }

        async fn fetch_event(
            &self,
            address: &Pubkey,
        ) -> Result<Option<RawEventAccount>, InviteError> {
            let mut account = self.0.fetch_event(address).await?;
            if let Some(account) = account.as_mut() {
                account.coming_count = RawNumber::Other(serde_json::json!({ "toNumber": null }));
            }
            Ok(account)
        }

        async fn fetch_all_events(&self) -> Result<Vec<RawEventRecord>, InviteError> {
            self.0.fetch_all_events().await
        }

        async fn submit(
            &self,
            operation: &ProgramOperation,
            signer: &dyn TransactionSigner,
        ) -> Result<TransactionId, InviteError> {
            self.0.submit(operation, signer).await
        }
    }

    #[tokio::test]
    async fn test_unreadable_prior_count_stops_the_write() {
        let config = InviteConfig::for_testing();
        let inner = InMemoryLedger::new(config.program_id().unwrap());
        let signer = Arc::new(KeypairSigner::from_seed([1u8; 32]));
        let identity = signer.pubkey();
        inner.seed_event("Party", 4_070_908_800, identity).unwrap();
        let ledger = Arc::new(GarbledCounts(inner));
        let service = DataAccessService::new(
            Arc::clone(&ledger),
            Arc::new(LocalWallet::connected(signer)),
            InviteState::shared(),
            config.reconcile_policy(),
        );

        let err = service
            .confirm_attendance("Party", &identity)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InviteError::Mapping {
                field: "comingCount",
                ..
            }
        ));
        assert_eq!(ledger.0.submission_count(), 0);
        assert_eq!(service.state().read().error(), Some(err.to_string().as_str()));
    }
}
