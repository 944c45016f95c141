//! Stored JSON record
//!
//! Shape: `{ "queue": [ticket...], "currentTicketNumber": n }` with camelCase
//! ticket fields, matching what the browser kiosk kept in local storage so
//! an exported blob can be imported unchanged.
//!
//! Load-path compatibility: early records carry only a human-readable
//! `calledTime` for called tickets. Those get `calledTimestamp` backfilled as
//! `timestamp + 15 min`. This shim lives here and nowhere else.

use chrono::{DateTime, TimeZone};
use mediqueue_core::domain::{CallRecord, CounterId, QueueSnapshot, Ticket, TicketNumber};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Wait assumed for legacy called tickets without a call timestamp (15 min)
pub const LEGACY_ASSUMED_WAIT_MS: i64 = 15 * 60 * 1000;

const STATUS_WAITING: &str = "waiting";
const STATUS_CALLED: &str = "called";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default)]
    pub queue: Option<Vec<StoredTicket>>,
    #[serde(default)]
    pub current_ticket_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTicket {
    pub number: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    pub status: String,
    #[serde(default)]
    pub called_to: Option<String>,
    #[serde(default)]
    pub called_time: Option<String>,
    /// Creation instant, epoch ms
    pub timestamp: i64,
    #[serde(default)]
    pub called_timestamp: Option<i64>,
}

impl StoredState {
    /// Build the record for a snapshot; display strings use `tz`
    pub fn from_snapshot<Tz>(snapshot: &QueueSnapshot, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            queue: Some(
                snapshot
                    .tickets
                    .iter()
                    .map(|t| StoredTicket::from_ticket(t, tz))
                    .collect(),
            ),
            current_ticket_number: Some(snapshot.current_ticket_number),
        }
    }

    /// Convert to the domain snapshot, applying the legacy backfill
    pub fn into_snapshot(self) -> QueueSnapshot {
        QueueSnapshot {
            tickets: self
                .queue
                .unwrap_or_default()
                .into_iter()
                .map(StoredTicket::into_ticket)
                .collect(),
            current_ticket_number: self.current_ticket_number.unwrap_or(0),
        }
    }
}

fn local<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(millis).single()
}

impl StoredTicket {
    fn from_ticket<Tz>(ticket: &Ticket, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let created = local(ticket.created_at, tz);
        let called = ticket.called_at().and_then(|ms| local(ms, tz));

        Self {
            number: ticket.number.to_string(),
            date: created.as_ref().map(|dt| dt.format("%m/%d/%Y").to_string()),
            time: created.as_ref().map(|dt| dt.format("%H:%M").to_string()),
            status: ticket.status().to_string(),
            called_to: ticket.called_to().map(|c| c.to_string()),
            called_time: called.map(|dt| dt.format("%H:%M:%S").to_string()),
            timestamp: ticket.created_at,
            called_timestamp: ticket.called_at(),
        }
    }

    fn into_ticket(self) -> Ticket {
        let mut ticket = Ticket::new(TicketNumber::from_stored(self.number), self.timestamp);

        if self.status != STATUS_CALLED {
            if self.status != STATUS_WAITING {
                warn!(
                    ticket = %ticket.number,
                    status = %self.status,
                    "Unknown stored status, restoring as waiting"
                );
            }
            return ticket;
        }

        let counter = self.called_to.and_then(|name| CounterId::new(name).ok());
        let called_at = match (self.called_timestamp, self.called_time.as_deref()) {
            (Some(ts), _) => Some(ts),
            (None, Some(_)) => Some(self.timestamp.saturating_add(LEGACY_ASSUMED_WAIT_MS)),
            (None, None) => None,
        };

        match (counter, called_at) {
            (Some(counter), Some(called_at)) => {
                // Same clamp as a live call
                ticket.call = Some(CallRecord {
                    counter,
                    called_at: called_at.max(self.timestamp),
                });
            }
            _ => {
                warn!(
                    ticket = %ticket.number,
                    "Called ticket without counter or call time, restoring as waiting"
                );
            }
        }
        ticket
    }
}
