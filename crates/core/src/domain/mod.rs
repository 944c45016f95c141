// Domain Layer - Pure queue state and reporting logic

pub mod error;
pub mod queue;
pub mod report;
pub mod ticket;

// Re-exports
pub use error::DomainError;
pub use queue::{CallOutcome, IssuedTicket, QueueSnapshot, QueueStore};
pub use report::{Analytics, DailyReport, EfficiencyRating, HourlyDistribution, SummaryStats};
pub use ticket::{CallRecord, CounterId, Ticket, TicketNumber, TicketStatus};
