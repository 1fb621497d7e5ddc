//! # Invite State
//!
//! Explicit state container shared by the data access and feature services.
//! Collections are replaced wholesale on every fetch, never patched.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::domain::{BirthdayEvent, Comment, RsvpStatus};

/// State shared between services.
pub type SharedState = Arc<RwLock<InviteState>>;

/// Presentation-facing state.
#[derive(Debug, Default)]
pub struct InviteState {
    events: Vec<BirthdayEvent>,
    comments: Vec<Comment>,
    selected: Option<BirthdayEvent>,
    rsvp: RsvpStatus,
    in_flight: usize,
    error: Option<String>,
}

impl InviteState {
    /// Fresh shared state.
    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::default()))
    }

    /// Loaded events.
    pub fn events(&self) -> &[BirthdayEvent] {
        &self.events
    }

    /// Replace the event list.
    pub fn set_events(&mut self, events: Vec<BirthdayEvent>) {
        self.events = events;
    }

    /// Comments of the selected event.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Replace the comment list.
    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
    }

    /// Selected event.
    pub fn selected(&self) -> Option<&BirthdayEvent> {
        self.selected.as_ref()
    }

    /// Change the selection. Always resets the local RSVP status.
    pub fn set_selected(&mut self, event: Option<BirthdayEvent>) {
        self.selected = event;
        self.rsvp = RsvpStatus::None;
    }

    /// Swap the selected event for its freshly fetched copy, keeping RSVP.
    pub fn refresh_selected(&mut self) {
        let Some(current) = &self.selected else {
            return;
        };
        if let Some(fresh) = self.events.iter().find(|e| e.address == current.address) {
            self.selected = Some(fresh.clone());
        }
    }

    /// Local RSVP status.
    pub fn rsvp(&self) -> RsvpStatus {
        self.rsvp
    }

    /// Set the local RSVP status.
    pub fn set_rsvp(&mut self, status: RsvpStatus) {
        self.rsvp = status;
    }

    /// Whether any operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Last recorded error.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record an error message.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Drop the recorded error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Marks an operation in flight until dropped.
pub struct LoadingGuard {
    state: SharedState,
}

impl LoadingGuard {
    /// Start an in-flight operation.
    pub fn begin(state: &SharedState) -> Self {
        state.write().in_flight += 1;
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut state = self.state.write();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}
