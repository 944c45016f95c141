//! Queue Service - the single controller owning queue state
//!
//! Presentation code holds one `QueueService` and drives it through these
//! command handlers. Each mutation runs against a copy of the store, is
//! persisted, and only then replaces the live store, so a failed save leaves
//! nothing half-applied. Announcements go out after the commit and never
//! influence queue state.

use crate::domain::error::DomainError;
use crate::domain::queue::DISPLAY_SLOTS;
use crate::domain::{
    Analytics, CallOutcome, CounterId, DailyReport, IssuedTicket, QueueStore, Ticket,
    TicketNumber,
};
use crate::error::Result;
use crate::port::{Announcer, StateStore, TimeProvider};
use chrono::{NaiveDate, TimeZone};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Spoken/displayed text for a call
pub fn call_announcement(outcome: &CallOutcome) -> String {
    let counter = outcome
        .ticket
        .called_to()
        .map(|c| c.as_str())
        .unwrap_or_default();
    format!(
        "Ticket number {}, please proceed to {}.",
        outcome.ticket.number, counter
    )
}

pub struct QueueService {
    store: QueueStore,
    state_store: Arc<dyn StateStore>,
    announcer: Arc<dyn Announcer>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueService {
    /// Start a fresh session (nothing loaded)
    pub fn new(
        state_store: Arc<dyn StateStore>,
        announcer: Arc<dyn Announcer>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            store: QueueStore::new(),
            state_store,
            announcer,
            time_provider,
        }
    }

    /// Resume the persisted session, or start empty if none was saved
    pub async fn load(
        state_store: Arc<dyn StateStore>,
        announcer: Arc<dyn Announcer>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self> {
        let store = match state_store.load().await? {
            Some(snapshot) => {
                let store = QueueStore::from_snapshot(snapshot)?;
                info!(
                    tickets = store.tickets().len(),
                    current_ticket_number = store.current_ticket_number(),
                    "Queue state restored"
                );
                store
            }
            None => {
                debug!("No saved queue state, starting empty");
                QueueStore::new()
            }
        };

        Ok(Self {
            store,
            state_store,
            announcer,
            time_provider,
        })
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn tickets(&self) -> &[Ticket] {
        self.store.tickets()
    }

    pub fn counter_display(&self) -> [Option<TicketNumber>; DISPLAY_SLOTS] {
        self.store.counter_display()
    }

    /// Issue a new ticket
    pub async fn create_ticket(&mut self) -> Result<IssuedTicket> {
        let now = self.time_provider.now_millis();
        let issued = self.commit(|store| Ok(store.create_ticket(now))).await?;

        info!(
            ticket = %issued.ticket.number,
            position = issued.position,
            "Ticket issued"
        );
        Ok(issued)
    }

    /// Call the earliest Waiting ticket to `counter`
    pub async fn call_next(&mut self, counter: &str) -> Result<CallOutcome> {
        let counter = CounterId::new(counter)?;
        let now = self.time_provider.now_millis();
        let outcome = self
            .commit(|store| store.call_next(counter, now))
            .await?;

        info!(
            ticket = %outcome.ticket.number,
            counter = %counter_of(&outcome),
            "Called next ticket"
        );
        self.speak(&call_announcement(&outcome)).await;
        Ok(outcome)
    }

    /// Call (or re-call) a ticket by its number
    pub async fn call_by_number(&mut self, number: &str, counter: &str) -> Result<CallOutcome> {
        let number = TicketNumber::parse_input(number)?;
        let counter = CounterId::new(counter)?;
        let now = self.time_provider.now_millis();
        let outcome = self
            .commit(|store| store.call_by_number(&number, counter, now))
            .await?;

        info!(
            ticket = %outcome.ticket.number,
            counter = %counter_of(&outcome),
            recalled = outcome.recalled,
            "Called ticket by number"
        );
        self.speak(&call_announcement(&outcome)).await;
        Ok(outcome)
    }

    /// Clear the queue and restart numbering (caller confirms first)
    pub async fn reset(&mut self) -> Result<()> {
        let dropped = self.store.tickets().len();
        self.commit(|store| {
            store.reset();
            Ok(())
        })
        .await?;

        info!(dropped_tickets = dropped, "Queue reset");
        Ok(())
    }

    /// Free-text announcement; returns the text actually announced
    pub async fn announce(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(
                DomainError::InvalidInput("Please enter an announcement text".to_string()).into(),
            );
        }

        self.speak(text).await;
        Ok(text.to_string())
    }

    pub fn daily_report<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> DailyReport {
        debug!(date = %date, "Building daily report");
        DailyReport::build(self.store.tickets(), date, tz)
    }

    pub fn analytics<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> Analytics {
        debug!(date = %date, "Building analytics");
        Analytics::build(self.store.tickets(), date, tz)
    }

    /// Apply `change` to a copy, persist it, then swap it in
    async fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut QueueStore) -> std::result::Result<T, DomainError>,
    ) -> Result<T> {
        let mut next = self.store.clone();
        let value = change(&mut next)?;

        self.state_store.save(&next.snapshot()).await?;
        self.store = next;
        Ok(value)
    }

    async fn speak(&self, message: &str) {
        if let Err(e) = self.announcer.announce(message).await {
            warn!(error = %e, message = %message, "Voice announcement failed, visual only");
        }
    }
}

fn counter_of(outcome: &CallOutcome) -> &str {
    outcome
        .ticket
        .called_to()
        .map(|c| c.as_str())
        .unwrap_or_default()
}
