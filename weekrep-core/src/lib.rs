//! Core pipeline for weekrep.
//!
//! This crate turns local `.ics` calendar files into a cross-validated
//! weekly report:
//! - `extract` parses calendar sources into timezone-resolved day buckets
//! - `sanitize` redacts sensitive substrings from free-text fields
//! - `summarize` issues independent summarization passes per day to the
//!   generation service behind the `generate::TextGenerator` boundary
//! - `consolidate` compares the accumulated passes and escalates at most once
//!   before emitting the final report
//! - `store` holds the append-only pass logs and the overwritten report

pub mod config;
pub mod consolidate;
pub mod date_range;
pub mod error;
pub mod event;
pub mod extract;
pub mod generate;
pub mod prompt;
pub mod sanitize;
pub mod store;
pub mod summarize;

pub use error::{WeekrepError, WeekrepResult};
pub use event::{CalendarEvent, DayBucket, EventStart};
