//! Terminal presentation: queue list, counter display, reports

use chrono::{Local, TimeZone};
use colored::Colorize;
use mediqueue_core::application::call_announcement;
use mediqueue_core::domain::report::hour_label;
use mediqueue_core::domain::{
    Analytics, CallOutcome, DailyReport, IssuedTicket, QueueStore, Ticket, TicketNumber,
};
use tabled::{Table, Tabled};

const EMPTY_SLOT: &str = "---";

fn clock(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

fn day(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "--/--/----".to_string())
}

#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "Ticket")]
    number: String,
    #[tabled(rename = "Issued")]
    issued: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Ticket> for QueueRow {
    fn from(ticket: &Ticket) -> Self {
        let status = match &ticket.call {
            Some(call) => format!("Called to {} at {}", call.counter, clock(call.called_at)),
            None => "Waiting".to_string(),
        };
        Self {
            number: ticket.number.to_string(),
            issued: format!("{} {}", day(ticket.created_at), clock(ticket.created_at)),
            status,
        }
    }
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Tickets")]
    count: usize,
}

pub fn ticket_issued(issued: &IssuedTicket) {
    println!(
        "{}",
        format!(
            "✓ Ticket {} generated successfully! Your position in queue is {}.",
            issued.ticket.number, issued.position
        )
        .green()
        .bold()
    );
    println!("  {} {}", "Date:".bold(), day(issued.ticket.created_at));
    println!("  {} {}", "Time:".bold(), clock(issued.ticket.created_at));
}

pub fn call(outcome: &CallOutcome) {
    let counter = outcome
        .ticket
        .called_to()
        .map(|c| c.to_string())
        .unwrap_or_default();

    if outcome.recalled {
        println!(
            "{}",
            format!(
                "✓ Re-called ticket {} to {}. This ticket was already called before.",
                outcome.ticket.number, counter
            )
            .yellow()
            .bold()
        );
    } else {
        println!(
            "{}",
            format!("✓ Called ticket {} to {}.", outcome.ticket.number, counter)
                .green()
                .bold()
        );
    }
    announcement(&call_announcement(outcome));
}

/// Visual side of an announcement (always shown, spoken or not)
pub fn announcement(text: &str) {
    println!("  {} {}", "📢".bold(), text.cyan());
}

pub fn queue(store: &QueueStore) {
    if store.is_empty() {
        println!("{}", "No patients in the queue.".yellow());
        return;
    }

    let rows: Vec<QueueRow> = store.tickets().iter().map(QueueRow::from).collect();
    println!("{}", Table::new(rows));
    println!(
        "  {} {} of {}",
        "Waiting:".bold(),
        store.waiting_count(),
        store.tickets().len()
    );
}

pub fn display(store: &QueueStore) {
    println!("{}", "Now Serving".cyan().bold());
    let slots = store.counter_display();
    for (i, slot) in slots.iter().enumerate() {
        let label = slot
            .as_ref()
            .map(TicketNumber::to_string)
            .unwrap_or_else(|| EMPTY_SLOT.to_string());
        println!("  {} {}", format!("Display {}:", i + 1).bold(), label);
    }

    let latest = store.latest_by_counter();
    if !latest.is_empty() {
        println!();
        println!("{}", "Last call per counter".cyan().bold());
        for (counter, ticket) in latest {
            let at = ticket.called_at().map(clock).unwrap_or_default();
            println!("  {} {} ({})", format!("{}:", counter).bold(), ticket.number, at);
        }
    }
}

pub fn daily_report(report: &DailyReport) {
    println!(
        "{}",
        format!("Daily Report for {}", report.date).cyan().bold()
    );
    if !report.has_data() {
        println!("  {}", "No tickets were issued on this date.".yellow());
        return;
    }

    let stats = &report.stats;
    println!("  {} {}", "Total Tickets Issued:".bold(), stats.total);
    println!("  {} {}", "Tickets Served:".bold(), stats.called_count);
    println!("  {} {}", "Tickets Waiting:".bold(), stats.waiting_count);
    println!("  {} {} min", "Average Wait Time:".bold(), stats.avg_wait_minutes);
    println!();
    println!("  {} {}%", "Service Rate:".bold(), stats.service_rate_percent);
    println!("  {} {}", "Efficiency:".bold(), report.rating);
    if stats.called_count == 0 {
        println!("  {}", "No tickets were served on this date.".yellow());
    }
    recommendations(&report.recommendations);
}

pub fn analytics(analytics: &Analytics) {
    println!(
        "{}",
        format!("Analytics for {}", analytics.date).cyan().bold()
    );
    if !analytics.has_data() {
        println!("  {}", "No tickets were issued on this date.".yellow());
        return;
    }

    if !analytics.counter_breakdown.is_empty() {
        println!();
        println!("{}", "Counter Performance".bold());
        let rows: Vec<CountRow> = analytics
            .counter_breakdown
            .iter()
            .map(|(counter, count)| CountRow {
                name: counter.to_string(),
                count: *count,
            })
            .collect();
        println!("{}", Table::new(rows));
    }

    println!();
    println!("{}", "Hourly Distribution".bold());
    let rows: Vec<CountRow> = analytics
        .hourly_distribution
        .iter()
        .map(|(hour, count)| CountRow {
            name: hour_label(*hour),
            count: *count,
        })
        .collect();
    println!("{}", Table::new(rows));

    println!();
    println!("{}", "Peak Hours".bold());
    for (hour, count) in &analytics.peak_hours {
        println!("  {}: {} tickets", hour_label(*hour), count);
    }

    println!();
    println!(
        "  {} {}%",
        "Efficiency Score:".bold(),
        analytics.efficiency_score
    );
    println!(
        "  {} {} min",
        "Average Wait Time:".bold(),
        analytics.stats.avg_wait_minutes
    );
    println!(
        "  {} {} min",
        "Total Wait Time:".bold(),
        analytics.total_wait_minutes
    );
    recommendations(&analytics.recommendations);
}

fn recommendations(notes: &[String]) {
    if notes.is_empty() {
        return;
    }
    println!();
    println!("{}", "Recommendations".bold());
    for note in notes {
        println!("  • {}", note);
    }
}
