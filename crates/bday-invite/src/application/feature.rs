//! # Feature Service
//!
//! Presentation-facing orchestration: event selection, local RSVP status,
//! the one-shot initial fetch and guarded background polling.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::data_access::DataAccessService;
use super::state::{InviteState, SharedState};
use crate::config::InviteConfig;
use crate::domain::{BirthdayEvent, Comment, EventStats, OperationResult, RsvpStatus};
use crate::ports::inbound::InviteFeatureApi;
use crate::ports::outbound::{LedgerGateway, WalletProvider};

/// Feature service - owns the shared state and drives the data access layer.
pub struct FeatureService<G: LedgerGateway> {
    data: DataAccessService<G>,
    state: SharedState,
    initial_fetch_done: AtomicBool,
    last_fetch: Mutex<Option<Instant>>,
    refresh_interval: Duration,
}

impl<G: LedgerGateway> FeatureService<G> {
    /// Create a new feature service with fresh state.
    pub fn new(gateway: Arc<G>, wallet: Arc<dyn WalletProvider>, config: &InviteConfig) -> Self {
        let state = InviteState::shared();
        Self {
            data: DataAccessService::new(
                gateway,
                wallet,
                Arc::clone(&state),
                config.reconcile_policy(),
            ),
            state,
            initial_fetch_done: AtomicBool::new(false),
            last_fetch: Mutex::new(None),
            refresh_interval: config.refresh_interval(),
        }
    }

    /// Data access layer underneath.
    pub fn data_access(&self) -> &DataAccessService<G> {
        &self.data
    }

    /// Shared state.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Run the initial fetch once per connection session.
    ///
    /// Returns whether a fetch happened.
    pub async fn on_connection_ready(&self) -> bool {
        if !self.data.is_ready_for_transactions() {
            return false;
        }
        if self.initial_fetch_done.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("Connection ready, fetching events");
        self.fetch_events().await;
        true
    }

    /// End the connection session; the next `on_connection_ready` fetches again.
    pub fn on_disconnect(&self) {
        self.initial_fetch_done.store(false, Ordering::SeqCst);
    }

    /// One polling step: re-fetch events if connected and the refresh
    /// interval has passed since the last fetch.
    ///
    /// Returns whether a fetch happened.
    pub async fn poll_tick(&self) -> bool {
        if !self.data.is_ready_for_transactions() {
            return false;
        }
        let last = *self.last_fetch.lock();
        let due = last.map_or(true, |at| at.elapsed() >= self.refresh_interval);
        if !due {
            return false;
        }
        debug!("Polling events");
        self.fetch_events().await;
        true
    }

    async fn fetch_events(&self) -> Vec<BirthdayEvent> {
        self.mark_fetch();
        self.data.fetch_events().await
    }

    /// Stamp the start of a fetch so its latency does not push back the next poll.
    fn mark_fetch(&self) {
        *self.last_fetch.lock() = Some(Instant::now());
    }
}

impl<G: LedgerGateway + 'static> FeatureService<G> {
    /// Poll in the background at the refresh interval until aborted.
    pub fn spawn_polling(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut poll_interval = tokio::time::interval(self.refresh_interval);
            poll_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                poll_interval.tick().await;
                self.poll_tick().await;
            }
        })
    }
}

#[async_trait]
impl<G: LedgerGateway> InviteFeatureApi for FeatureService<G> {
    async fn handle_create_event(&self, name: &str, date: &str) -> OperationResult {
        self.mark_fetch();
        match self.data.create_event(name, date).await {
            Ok(tx) => {
                self.select_event(None).await;
                self.initial_fetch_done.store(false, Ordering::SeqCst);
                OperationResult::ok(&tx)
            }
            Err(e) => e.into(),
        }
    }

    async fn select_event(&self, event: Option<BirthdayEvent>) {
        let target = event.clone();
        {
            let mut state = self.state.write();
            state.set_selected(event);
            state.set_comments(Vec::new());
        }
        if let Some(event) = target {
            debug!(event = %event.address, "Selected event");
            self.data.fetch_comments(&event.name, &event.creator).await;
        }
    }

    async fn handle_confirm_attendance(&self, event: &BirthdayEvent) -> OperationResult {
        self.mark_fetch();
        match self.data.confirm_attendance(&event.name, &event.creator).await {
            Ok(tx) => {
                self.state.write().set_rsvp(RsvpStatus::Coming);
                OperationResult::ok(&tx)
            }
            Err(e) => e.into(),
        }
    }

    async fn handle_decline_attendance(&self, event: &BirthdayEvent) -> OperationResult {
        self.mark_fetch();
        match self.data.decline_attendance(&event.name, &event.creator).await {
            Ok(tx) => {
                self.state.write().set_rsvp(RsvpStatus::Busy);
                OperationResult::ok(&tx)
            }
            Err(e) => e.into(),
        }
    }

    async fn handle_add_comment(&self, event: &BirthdayEvent, text: &str) -> OperationResult {
        match self.data.add_comment(&event.name, &event.creator, text).await {
            Ok(tx) => OperationResult::ok(&tx),
            Err(e) => e.into(),
        }
    }

    async fn refresh_data(&self) {
        let selected = self.selected_event();
        self.mark_fetch();
        self.data.refresh_data(selected.as_ref()).await;
    }

    fn events(&self) -> Vec<BirthdayEvent> {
        self.state.read().events().to_vec()
    }

    fn selected_event(&self) -> Option<BirthdayEvent> {
        self.state.read().selected().cloned()
    }

    fn event_comments(&self) -> Vec<Comment> {
        self.state.read().comments().to_vec()
    }

    fn rsvp_status(&self) -> RsvpStatus {
        self.state.read().rsvp()
    }

    fn is_loading(&self) -> bool {
        self.state.read().is_loading()
    }

    fn error(&self) -> Option<String> {
        self.state.read().error().map(str::to_string)
    }

    fn clear_error(&self) {
        self.data.clear_error();
    }

    fn is_ready_for_operations(&self) -> bool {
        self.data.is_ready_for_transactions() && !self.is_loading()
    }

    fn event_stats(&self) -> Option<EventStats> {
        let state = self.state.read();
        state
            .selected()
            .map(|event| EventStats::new(event, state.comments().to_vec()))
    }
}
