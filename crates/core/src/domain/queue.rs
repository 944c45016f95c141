// Queue Store - ordered tickets plus the session counter

use crate::domain::error::{DomainError, Result};
use crate::domain::ticket::{CounterId, Ticket, TicketNumber, TicketStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Number of "now serving" slots on the counter display
pub const DISPLAY_SLOTS: usize = 3;

/// Highest ticket sequence a restored record may carry
pub const SEQUENCE_LIMIT: u32 = 1_000_000_000;

/// Full queue state as handed to / received from the persistence adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub tickets: Vec<Ticket>,
    pub current_ticket_number: u32,
}

impl QueueSnapshot {
    /// Highest sequence among the counter and the ticket numbers
    pub fn highest_sequence(&self) -> u32 {
        self.tickets
            .iter()
            .filter_map(|t| t.number.sequence())
            .fold(self.current_ticket_number, u32::max)
    }

    /// Check a restored record before it becomes live state
    ///
    /// Ticket numbers must be unique and the counter must stay below
    /// [`SEQUENCE_LIMIT`] so issuing can never wrap around.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.tickets.len());
        if let Some(duplicate) = self.tickets.iter().find(|t| !seen.insert(&t.number)) {
            return Err(DomainError::InvalidState(format!(
                "duplicate ticket number {}",
                duplicate.number
            )));
        }

        if self.highest_sequence() >= SEQUENCE_LIMIT {
            return Err(DomainError::InvalidState(format!(
                "ticket counter {} exceeds {}",
                self.highest_sequence(),
                SEQUENCE_LIMIT
            )));
        }
        Ok(())
    }
}

/// Result of issuing a ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTicket {
    pub ticket: Ticket,
    /// 1-based position in the queue at issue time
    pub position: usize,
}

/// Result of a call operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub ticket: Ticket,
    /// The ticket had already been called before (messaging only)
    pub recalled: bool,
}

/// Queue Store
///
/// Tickets stay in insertion order for their whole life; calling a ticket
/// never moves or removes it. Only `reset` drops tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStore {
    tickets: Vec<Ticket>,
    current_ticket_number: u32,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted state
    ///
    /// The snapshot is validated first. The counter is raised to the highest
    /// restored sequence so a stale counter can never reissue an existing
    /// number.
    pub fn from_snapshot(snapshot: QueueSnapshot) -> Result<Self> {
        snapshot.validate()?;

        Ok(Self {
            current_ticket_number: snapshot.highest_sequence(),
            tickets: snapshot.tickets,
        })
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tickets: self.tickets.clone(),
            current_ticket_number: self.current_ticket_number,
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn current_ticket_number(&self) -> u32 {
        self.current_ticket_number
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn waiting_count(&self) -> usize {
        self.tickets.iter().filter(|t| t.is_waiting()).count()
    }

    pub fn find(&self, number: &TicketNumber) -> Option<&Ticket> {
        self.tickets.iter().find(|t| &t.number == number)
    }

    /// Issue the next ticket (always Waiting, appended at the end)
    pub fn create_ticket(&mut self, now_millis: i64) -> IssuedTicket {
        self.current_ticket_number += 1;
        let ticket = Ticket::new(
            TicketNumber::from_sequence(self.current_ticket_number),
            now_millis,
        );
        self.tickets.push(ticket.clone());

        IssuedTicket {
            ticket,
            position: self.tickets.len(),
        }
    }

    /// Call the earliest-created Waiting ticket
    pub fn call_next(&mut self, counter: CounterId, now_millis: i64) -> Result<CallOutcome> {
        let ticket = self
            .tickets
            .iter_mut()
            .find(|t| t.is_waiting())
            .ok_or(DomainError::NoWaitingTicket)?;

        let previous = ticket.call(counter, now_millis);
        Ok(CallOutcome {
            ticket: ticket.clone(),
            recalled: previous == TicketStatus::Called,
        })
    }

    /// Call a specific ticket regardless of its current status
    pub fn call_by_number(
        &mut self,
        number: &TicketNumber,
        counter: CounterId,
        now_millis: i64,
    ) -> Result<CallOutcome> {
        let ticket = self
            .tickets
            .iter_mut()
            .find(|t| &t.number == number)
            .ok_or_else(|| DomainError::TicketNotFound(number.to_string()))?;

        let previous = ticket.call(counter, now_millis);
        Ok(CallOutcome {
            ticket: ticket.clone(),
            recalled: previous == TicketStatus::Called,
        })
    }

    /// Drop every ticket and restart numbering at A001
    pub fn reset(&mut self) {
        self.tickets.clear();
        self.current_ticket_number = 0;
    }

    /// Up to `n` Called tickets, most recent call first
    ///
    /// Equal call times keep creation order (stable sort).
    pub fn most_recently_called(&self, n: usize) -> Vec<&Ticket> {
        let mut called: Vec<&Ticket> = self.tickets.iter().filter(|t| !t.is_waiting()).collect();
        called.sort_by(|a, b| b.called_at().cmp(&a.called_at()));
        called.truncate(n);
        called
    }

    /// "Now serving" slots, most recent first; `None` for an empty slot
    pub fn counter_display(&self) -> [Option<TicketNumber>; DISPLAY_SLOTS] {
        let mut slots: [Option<TicketNumber>; DISPLAY_SLOTS] = Default::default();
        for (slot, ticket) in slots
            .iter_mut()
            .zip(self.most_recently_called(DISPLAY_SLOTS))
        {
            *slot = Some(ticket.number.clone());
        }
        slots
    }

    /// Ticket most recently called to each counter
    pub fn latest_by_counter(&self) -> BTreeMap<CounterId, &Ticket> {
        let mut latest: BTreeMap<CounterId, &Ticket> = BTreeMap::new();
        for ticket in &self.tickets {
            let Some(call) = &ticket.call else {
                continue;
            };
            match latest.get(&call.counter) {
                Some(current) if current.called_at() >= Some(call.called_at) => {}
                _ => {
                    latest.insert(call.counter.clone(), ticket);
                }
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(name: &str) -> CounterId {
        CounterId::new(name).unwrap()
    }

    fn numbers(tickets: &[&Ticket]) -> Vec<String> {
        tickets.iter().map(|t| t.number.to_string()).collect()
    }

    #[test]
    fn test_numbers_strictly_increasing() {
        let mut store = QueueStore::new();
        let mut previous = 0;
        for i in 1..=120 {
            let issued = store.create_ticket(i * 1000);
            let seq = issued.ticket.number.sequence().unwrap();
            assert!(seq > previous);
            previous = seq;
            assert_eq!(issued.position, i as usize);
        }
        assert_eq!(store.tickets()[0].number.as_str(), "A001");
        assert_eq!(store.tickets()[100].number.as_str(), "A101");
    }

    #[test]
    fn test_call_next_fifo() {
        let mut store = QueueStore::new();
        store.create_ticket(1000);
        store.create_ticket(2000);

        let first = store.call_next(counter("Counter 1"), 3000).unwrap();
        assert_eq!(first.ticket.number.as_str(), "A001");
        assert!(!first.recalled);

        let second = store.call_next(counter("Counter 2"), 4000).unwrap();
        assert_eq!(second.ticket.number.as_str(), "A002");

        // Called tickets remain in place but are never selected again
        assert_eq!(store.tickets().len(), 2);
        let err = store.call_next(counter("Counter 1"), 5000).unwrap_err();
        assert_eq!(err, DomainError::NoWaitingTicket);
    }

    #[test]
    fn test_call_next_on_empty_queue() {
        let mut store = QueueStore::new();
        let err = store.call_next(counter("Counter 1"), 1000).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_call_by_number_recall() {
        let mut store = QueueStore::new();
        store.create_ticket(1000);
        let number = TicketNumber::parse_input("a001").unwrap();

        let outcome = store
            .call_by_number(&number, counter("Counter 1"), 2000)
            .unwrap();
        assert!(!outcome.recalled);

        let outcome = store
            .call_by_number(&number, counter("Counter 3"), 6000)
            .unwrap();
        assert!(outcome.recalled);
        assert_eq!(outcome.ticket.called_to().unwrap().as_str(), "Counter 3");
        assert_eq!(outcome.ticket.called_at(), Some(6000));
        assert_eq!(store.find(&number).unwrap().called_at(), Some(6000));
    }

    #[test]
    fn test_call_by_number_missing_leaves_state() {
        let mut store = QueueStore::new();
        store.create_ticket(1000);
        let before = store.clone();

        let err = store
            .call_by_number(
                &TicketNumber::from_stored("A999"),
                counter("Counter 1"),
                2000,
            )
            .unwrap_err();
        assert_eq!(err, DomainError::TicketNotFound("A999".to_string()));
        assert_eq!(store, before);
    }

    #[test]
    fn test_reset_restarts_numbering() {
        let mut store = QueueStore::new();
        store.create_ticket(1000);
        store.create_ticket(2000);
        store.reset();

        assert!(store.is_empty());
        assert_eq!(store.current_ticket_number(), 0);
        let issued = store.create_ticket(3000);
        assert_eq!(issued.ticket.number.as_str(), "A001");
        assert_eq!(issued.position, 1);
    }

    #[test]
    fn test_most_recently_called_order() {
        let mut store = QueueStore::new();
        for i in 0..3 {
            store.create_ticket(i * 1000);
        }
        store.call_next(counter("Counter 1"), 10_000).unwrap();
        store.call_next(counter("Counter 2"), 20_000).unwrap();
        store.call_next(counter("Counter 3"), 30_000).unwrap();

        let recent = store.most_recently_called(2);
        assert_eq!(numbers(&recent), vec!["A003", "A002"]);
    }

    #[test]
    fn test_most_recently_called_ties_keep_creation_order() {
        let mut store = QueueStore::new();
        for i in 0..3 {
            store.create_ticket(i);
        }
        store.call_next(counter("Counter 1"), 500).unwrap();
        store.call_next(counter("Counter 2"), 500).unwrap();
        store.call_next(counter("Counter 3"), 500).unwrap();

        let recent = store.most_recently_called(3);
        assert_eq!(numbers(&recent), vec!["A001", "A002", "A003"]);
    }

    #[test]
    fn test_manual_then_next_scenario() {
        let mut store = QueueStore::new();
        store.create_ticket(1000);
        store.create_ticket(2000);
        store.create_ticket(3000);

        let a002 = TicketNumber::from_sequence(2);
        store
            .call_by_number(&a002, counter("Counter 1"), 10_000)
            .unwrap();
        let next = store.call_next(counter("Counter 2"), 20_000).unwrap();
        assert_eq!(next.ticket.number.as_str(), "A001");

        let tickets = store.tickets();
        assert_eq!(tickets[0].called_to().unwrap().as_str(), "Counter 2");
        assert_eq!(tickets[1].called_to().unwrap().as_str(), "Counter 1");
        assert_eq!(tickets[2].status(), TicketStatus::Waiting);

        let recent = store.most_recently_called(2);
        assert_eq!(numbers(&recent), vec!["A001", "A002"]);
    }

    #[test]
    fn test_counter_display_slots() {
        let mut store = QueueStore::new();
        assert_eq!(store.counter_display(), [None, None, None]);

        store.create_ticket(0);
        store.create_ticket(1);
        store.call_next(counter("Counter 1"), 100).unwrap();
        store.call_next(counter("Counter 1"), 200).unwrap();

        let slots = store.counter_display();
        assert_eq!(slots[0], Some(TicketNumber::from_sequence(2)));
        assert_eq!(slots[1], Some(TicketNumber::from_sequence(1)));
        assert_eq!(slots[2], None);
    }

    #[test]
    fn test_latest_by_counter() {
        let mut store = QueueStore::new();
        for i in 0..4 {
            store.create_ticket(i);
        }
        store.call_next(counter("Counter 1"), 100).unwrap();
        store.call_next(counter("Counter 2"), 200).unwrap();
        store.call_next(counter("Counter 1"), 300).unwrap();

        let latest = store.latest_by_counter();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[&counter("Counter 1")].number.as_str(), "A003");
        assert_eq!(latest[&counter("Counter 2")].number.as_str(), "A002");
    }

    #[test]
    fn test_from_snapshot_raises_stale_counter() {
        let snapshot = QueueSnapshot {
            tickets: vec![
                Ticket::new(TicketNumber::from_sequence(4), 0),
                Ticket::new(TicketNumber::from_sequence(5), 0),
            ],
            current_ticket_number: 2,
        };
        let mut store = QueueStore::from_snapshot(snapshot).unwrap();
        assert_eq!(store.current_ticket_number(), 5);
        assert_eq!(store.create_ticket(0).ticket.number.as_str(), "A006");
    }

    #[test]
    fn test_from_snapshot_rejects_duplicate_numbers() {
        let snapshot = QueueSnapshot {
            tickets: vec![
                Ticket::new(TicketNumber::from_sequence(1), 0),
                Ticket::new(TicketNumber::from_sequence(1), 10),
            ],
            current_ticket_number: 1,
        };
        let err = QueueStore::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn test_from_snapshot_rejects_exhausted_counter() {
        let at_max = QueueSnapshot {
            tickets: Vec::new(),
            current_ticket_number: u32::MAX,
        };
        assert!(QueueStore::from_snapshot(at_max).is_err());

        let huge_number = QueueSnapshot {
            tickets: vec![Ticket::new(TicketNumber::from_stored("A4294967295"), 0)],
            current_ticket_number: 0,
        };
        assert!(QueueStore::from_snapshot(huge_number).is_err());

        let below_limit = QueueSnapshot {
            tickets: Vec::new(),
            current_ticket_number: SEQUENCE_LIMIT - 1,
        };
        let mut store = QueueStore::from_snapshot(below_limit).unwrap();
        assert_eq!(store.create_ticket(0).ticket.number.sequence(), Some(SEQUENCE_LIMIT));
    }
}
