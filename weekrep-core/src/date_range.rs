//! Validated report date range.

use chrono::NaiveDate;

use crate::error::{WeekrepError, WeekrepResult};

/// Canonical date entry format. Earlier script variants disagreed between
/// `mm-dd-yyyy` and `yyyy-mm-dd`; ISO is the one format accepted everywhere.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date range for event filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> WeekrepResult<Self> {
        if end < start {
            return Err(WeekrepError::DateRange(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok(ReportRange { start, end })
    }

    /// Parse `YYYY-MM-DD` bounds, rejecting anything else before any
    /// processing begins.
    pub fn from_args(start: &str, end: &str) -> WeekrepResult<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Parse a user-supplied date, strictly.
pub fn parse_date(s: &str) -> WeekrepResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
        WeekrepError::DateRange(format!("invalid date '{}', expected YYYY-MM-DD", s.trim()))
    })
}
