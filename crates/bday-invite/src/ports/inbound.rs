//! # Inbound Ports
//!
//! What a presentation layer can ask of the invite feature.

use async_trait::async_trait;

use crate::domain::{BirthdayEvent, Comment, EventStats, OperationResult, RsvpStatus};

/// Invite feature API - inbound port.
///
/// Handlers never return `Err`; failures come back as
/// `OperationResult { success: false, .. }`.
#[async_trait]
pub trait InviteFeatureApi: Send + Sync {
    /// Create an event owned by the connected wallet.
    async fn handle_create_event(&self, name: &str, date: &str) -> OperationResult;

    /// Change the selection. `None` clears selection, comments and RSVP status.
    async fn select_event(&self, event: Option<BirthdayEvent>);

    /// RSVP "coming" to `event`.
    async fn handle_confirm_attendance(&self, event: &BirthdayEvent) -> OperationResult;

    /// RSVP "busy" to `event`.
    async fn handle_decline_attendance(&self, event: &BirthdayEvent) -> OperationResult;

    /// Comment on `event`.
    async fn handle_add_comment(&self, event: &BirthdayEvent, text: &str) -> OperationResult;

    /// Re-fetch events, and comments of the selected event.
    async fn refresh_data(&self);

    /// Current event list.
    fn events(&self) -> Vec<BirthdayEvent>;

    /// Currently selected event.
    fn selected_event(&self) -> Option<BirthdayEvent>;

    /// Comments of the selected event.
    fn event_comments(&self) -> Vec<Comment>;

    /// Local RSVP status for the selection.
    fn rsvp_status(&self) -> RsvpStatus;

    /// Whether an operation is in flight.
    fn is_loading(&self) -> bool;

    /// Last recorded error.
    fn error(&self) -> Option<String>;

    /// Drop the recorded error.
    fn clear_error(&self);

    /// Whether writes can be attempted right now.
    fn is_ready_for_operations(&self) -> bool;

    /// Summary of the selected event.
    fn event_stats(&self) -> Option<EventStats>;
}
