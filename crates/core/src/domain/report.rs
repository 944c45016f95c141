//! Reporting Engine - statistics derived from a ticket list
//!
//! Everything here is a pure function of `(tickets, date, time zone)`.
//! Calendar days and hours are taken in the supplied time zone, so callers
//! pass `chrono::Local` in production and a fixed offset in tests.

use crate::domain::ticket::{CounterId, Ticket};
use chrono::{DateTime, NaiveDate, TimeZone, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Number of peak hours shown in analytics
pub const PEAK_HOURS_SHOWN: usize = 3;

/// Waiting share above which more counters are suggested (percent)
pub const WAITING_RATIO_THRESHOLD: f64 = 30.0;

/// Average wait above which an efficiency review is suggested (minutes)
pub const AVG_WAIT_THRESHOLD_MINUTES: i64 = 30;

/// Service rate below which a staffing review is suggested (percent)
pub const SERVICE_RATE_THRESHOLD: u32 = 60;

/// Hour of day (0-23) -> tickets created in that hour
pub type HourlyDistribution = BTreeMap<u32, usize>;

/// Headline numbers for a set of tickets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    pub called_count: usize,
    pub waiting_count: usize,
    pub service_rate_percent: u32,
    pub avg_wait_minutes: i64,
}

/// Qualitative label for the service rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EfficiencyRating {
    Excellent,
    Good,
    NeedsImprovement,
}

impl EfficiencyRating {
    pub fn from_service_rate(percent: u32) -> Self {
        if percent > 80 {
            EfficiencyRating::Excellent
        } else if percent > 60 {
            EfficiencyRating::Good
        } else {
            EfficiencyRating::NeedsImprovement
        }
    }
}

impl std::fmt::Display for EfficiencyRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EfficiencyRating::Excellent => write!(f, "Excellent"),
            EfficiencyRating::Good => write!(f, "Good"),
            EfficiencyRating::NeedsImprovement => write!(f, "Needs Improvement"),
        }
    }
}

/// Daily report: the date's tickets summarized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub stats: SummaryStats,
    pub rating: EfficiencyRating,
    pub recommendations: Vec<String>,
}

impl DailyReport {
    pub fn build<Tz: TimeZone>(tickets: &[Ticket], date: NaiveDate, tz: &Tz) -> Self {
        let day = filter_by_date(tickets, date, tz);
        let stats = summary_stats(&day);
        Self {
            date,
            rating: EfficiencyRating::from_service_rate(stats.service_rate_percent),
            recommendations: recommendations(&stats),
            stats,
        }
    }

    pub fn has_data(&self) -> bool {
        self.stats.total > 0
    }
}

/// Analytics view: breakdowns on top of the daily summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analytics {
    pub date: NaiveDate,
    pub stats: SummaryStats,
    pub counter_breakdown: BTreeMap<CounterId, usize>,
    pub hourly_distribution: HourlyDistribution,
    pub peak_hours: Vec<(u32, usize)>,
    /// Same figure as the service rate, shown under its analytics name
    pub efficiency_score: u32,
    /// Summed wait of the date's called tickets
    pub total_wait_minutes: i64,
    pub recommendations: Vec<String>,
}

impl Analytics {
    pub fn build<Tz: TimeZone>(tickets: &[Ticket], date: NaiveDate, tz: &Tz) -> Self {
        let day = filter_by_date(tickets, date, tz);
        let stats = summary_stats(&day);
        let hourly_distribution = hourly_distribution(&day, tz);

        Self {
            date,
            counter_breakdown: counter_breakdown(&day),
            peak_hours: peak_hours(&hourly_distribution, PEAK_HOURS_SHOWN),
            hourly_distribution,
            efficiency_score: stats.service_rate_percent,
            total_wait_minutes: total_wait_minutes(&day),
            recommendations: recommendations(&stats),
            stats,
        }
    }

    pub fn has_data(&self) -> bool {
        self.stats.total > 0
    }
}

fn local_time<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(millis).single()
}

/// Tickets created on `date` (calendar day in `tz`)
pub fn filter_by_date<Tz: TimeZone>(tickets: &[Ticket], date: NaiveDate, tz: &Tz) -> Vec<Ticket> {
    tickets
        .iter()
        .filter(|t| {
            local_time(t.created_at, tz)
                .map(|dt| dt.date_naive() == date)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Elapsed wait for tickets with a strictly positive wait, in ms
fn qualifying_waits(tickets: &[Ticket]) -> impl Iterator<Item = i64> + '_ {
    tickets
        .iter()
        .filter_map(|t| t.called_at().map(|called| called.saturating_sub(t.created_at)))
        .filter(|elapsed| *elapsed > 0)
}

pub fn summary_stats(tickets: &[Ticket]) -> SummaryStats {
    let total = tickets.len();
    let called_count = tickets.iter().filter(|t| !t.is_waiting()).count();
    let waiting_count = total - called_count;

    let service_rate_percent = if total == 0 {
        0
    } else {
        (called_count as f64 / total as f64 * 100.0).round() as u32
    };

    let (sum_ms, samples) = qualifying_waits(tickets).fold((0i64, 0usize), |(sum, n), elapsed| {
        (sum.saturating_add(elapsed), n + 1)
    });
    let avg_wait_minutes = if samples == 0 {
        0
    } else {
        (sum_ms as f64 / samples as f64 / MILLIS_PER_MINUTE).round() as i64
    };

    SummaryStats {
        total,
        called_count,
        waiting_count,
        service_rate_percent,
        avg_wait_minutes,
    }
}

/// Total wait across qualifying tickets, rounded to minutes
pub fn total_wait_minutes(tickets: &[Ticket]) -> i64 {
    let sum_ms = qualifying_waits(tickets).fold(0i64, i64::saturating_add);
    (sum_ms as f64 / MILLIS_PER_MINUTE).round() as i64
}

pub fn counter_breakdown(tickets: &[Ticket]) -> BTreeMap<CounterId, usize> {
    let mut breakdown = BTreeMap::new();
    for counter in tickets.iter().filter_map(|t| t.called_to()) {
        *breakdown.entry(counter.clone()).or_insert(0) += 1;
    }
    breakdown
}

/// Tickets per creation hour (in `tz`)
pub fn hourly_distribution<Tz: TimeZone>(tickets: &[Ticket], tz: &Tz) -> HourlyDistribution {
    let mut distribution = HourlyDistribution::new();
    for dt in tickets.iter().filter_map(|t| local_time(t.created_at, tz)) {
        *distribution.entry(dt.hour()).or_insert(0) += 1;
    }
    distribution
}

/// Top `k` hours by count; equal counts keep the earlier hour first
pub fn peak_hours(distribution: &HourlyDistribution, k: usize) -> Vec<(u32, usize)> {
    let mut hours: Vec<(u32, usize)> = distribution.iter().map(|(h, c)| (*h, *c)).collect();
    hours.sort_by(|a, b| b.1.cmp(&a.1));
    hours.truncate(k);
    hours
}

/// `HH:00` label for an hour of day
pub fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// Advisory notes from fixed thresholds; empty when there is no data
pub fn recommendations(stats: &SummaryStats) -> Vec<String> {
    if stats.total == 0 {
        return Vec::new();
    }

    let mut notes = Vec::new();

    let waiting_ratio = stats.waiting_count as f64 / stats.total as f64 * 100.0;
    if waiting_ratio > WAITING_RATIO_THRESHOLD {
        notes.push("Consider opening additional counters during peak hours".to_string());
    }
    if stats.avg_wait_minutes > AVG_WAIT_THRESHOLD_MINUTES {
        notes.push("Implement measures to reduce wait times".to_string());
    }
    if stats.service_rate_percent < SERVICE_RATE_THRESHOLD {
        notes.push("Review counter staffing and efficiency".to_string());
    }

    if notes.is_empty() {
        notes.push("Queue is operating normally; current wait times are within acceptable range".to_string());
    }
    notes
}
