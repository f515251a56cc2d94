//! Timezone-resolved calendar event types.
//!
//! The extractor owns construction of these; every later stage reads them as
//! immutable inputs.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

/// A single calendar event after timezone resolution and sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub title: String,
    pub start: EventStart,
    /// Free text, post-sanitization.
    pub description: String,
    /// Free text, post-sanitization.
    pub location: String,
    /// Calendar date in the reference timezone; drives range filtering and
    /// day grouping.
    pub date: NaiveDate,
}

/// Start of an event, resolved to the run's reference timezone.
#[derive(Debug, Clone, PartialEq)]
pub enum EventStart {
    Timed(DateTime<Tz>),
    /// All-day event carrying no time of day.
    AllDay(NaiveDate),
}

impl CalendarEvent {
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, EventStart::AllDay(_))
    }

    /// Start time as shown in prompt text: `YYYY-MM-DD HH:MM`, or the bare
    /// date for all-day events.
    pub fn time_label(&self) -> String {
        match &self.start {
            EventStart::Timed(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            EventStart::AllDay(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Events sharing one calendar date, in discovery order within their source.
///
/// Invariant: every event's `date` equals the bucket `date`.
#[derive(Debug, Clone)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub events: Vec<CalendarEvent>,
}
