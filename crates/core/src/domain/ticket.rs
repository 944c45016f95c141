// Ticket Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Prefix shared by every ticket number
pub const TICKET_PREFIX: char = 'A';

/// Minimum digit count after the prefix (`A001`)
pub const TICKET_DIGITS: usize = 3;

/// Ticket identifier, `A` + zero-padded sequence (`A007`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketNumber(String);

impl TicketNumber {
    /// Build the number for the n-th ticket of a session
    pub fn from_sequence(sequence: u32) -> Self {
        Self(format!(
            "{}{:0width$}",
            TICKET_PREFIX,
            sequence,
            width = TICKET_DIGITS
        ))
    }

    /// Normalize operator input (trim, upper-case)
    ///
    /// Any non-empty string is accepted: lookups use exact match, so an
    /// unknown number surfaces later as NotFound rather than here.
    pub fn parse_input(input: &str) -> Result<Self> {
        let normalized = input.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(DomainError::InvalidInput(
                "Please enter a ticket number".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    /// Wrap a stored number verbatim
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Sequence encoded in the number, if it has the standard shape
    pub fn sequence(&self) -> Option<u32> {
        self.0.strip_prefix(TICKET_PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Service point name, free text (e.g. "Counter 1")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterId(String);

impl CounterId {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::InvalidInput(
                "Counter name must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CounterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ticket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Waiting,
    Called,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Waiting => write!(f, "waiting"),
            TicketStatus::Called => write!(f, "called"),
        }
    }
}

/// Most recent call of a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub counter: CounterId,
    pub called_at: i64, // epoch ms
}

/// Ticket Entity
///
/// Counter and call time live together in `call`, so a ticket is Called
/// exactly when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub number: TicketNumber,
    pub created_at: i64, // epoch ms
    pub call: Option<CallRecord>,
}

impl Ticket {
    /// Create a Waiting ticket
    ///
    /// # Arguments
    ///
    /// * `number` - Ticket number (assigned by the store)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(number: TicketNumber, created_at: i64) -> Self {
        Self {
            number,
            created_at,
            call: None,
        }
    }

    pub fn status(&self) -> TicketStatus {
        if self.call.is_some() {
            TicketStatus::Called
        } else {
            TicketStatus::Waiting
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.call.is_none()
    }

    pub fn called_to(&self) -> Option<&CounterId> {
        self.call.as_ref().map(|c| &c.counter)
    }

    pub fn called_at(&self) -> Option<i64> {
        self.call.as_ref().map(|c| c.called_at)
    }

    /// Waiting -> Called, or Called -> Called (re-call overwrites the call)
    ///
    /// Returns the previous status. A clock reading earlier than the creation
    /// instant is clamped so `called_at >= created_at` always holds.
    pub fn call(&mut self, counter: CounterId, now_millis: i64) -> TicketStatus {
        let previous = self.status();
        self.call = Some(CallRecord {
            counter,
            called_at: now_millis.max(self.created_at),
        });
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(TicketNumber::from_sequence(1).as_str(), "A001");
        assert_eq!(TicketNumber::from_sequence(7).as_str(), "A007");
        assert_eq!(TicketNumber::from_sequence(101).as_str(), "A101");
        assert_eq!(TicketNumber::from_sequence(1000).as_str(), "A1000");
    }

    #[test]
    fn test_parse_input_normalizes() {
        let number = TicketNumber::parse_input("  a002 ").unwrap();
        assert_eq!(number.as_str(), "A002");
        assert_eq!(number.sequence(), Some(2));
    }

    #[test]
    fn test_parse_input_rejects_empty() {
        let err = TicketNumber::parse_input("   ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_sequence_of_foreign_number() {
        assert_eq!(TicketNumber::from_stored("B12").sequence(), None);
        assert_eq!(TicketNumber::from_stored("A").sequence(), None);
    }

    #[test]
    fn test_counter_rejects_blank() {
        assert!(CounterId::new(" ").is_err());
        assert_eq!(CounterId::new(" Counter 2 ").unwrap().as_str(), "Counter 2");
    }

    #[test]
    fn test_call_lifecycle() {
        let mut ticket = Ticket::new(TicketNumber::from_sequence(1), 1_000);
        assert_eq!(ticket.status(), TicketStatus::Waiting);
        assert!(ticket.called_to().is_none());
        assert!(ticket.called_at().is_none());

        let previous = ticket.call(CounterId::new("Counter 1").unwrap(), 5_000);
        assert_eq!(previous, TicketStatus::Waiting);
        assert_eq!(ticket.status(), TicketStatus::Called);
        assert_eq!(ticket.called_at(), Some(5_000));

        // Re-call overwrites counter and time, status stays Called
        let previous = ticket.call(CounterId::new("Counter 3").unwrap(), 9_000);
        assert_eq!(previous, TicketStatus::Called);
        assert_eq!(ticket.called_to().unwrap().as_str(), "Counter 3");
        assert_eq!(ticket.called_at(), Some(9_000));
    }

    #[test]
    fn test_call_clamps_clock_skew() {
        let mut ticket = Ticket::new(TicketNumber::from_sequence(1), 10_000);
        ticket.call(CounterId::new("Counter 1").unwrap(), 4_000);
        assert_eq!(ticket.called_at(), Some(10_000));
    }
}
