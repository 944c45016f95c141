// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Ticket {0} not found in the queue")]
    TicketNotFound(String),

    #[error("No waiting patients in the queue")]
    NoWaitingTicket,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid queue state: {0}")]
    InvalidState(String),
}

impl DomainError {
    /// True for both flavours of "nothing to call"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::TicketNotFound(_) | DomainError::NoWaitingTicket
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
