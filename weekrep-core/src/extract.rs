//! Event extraction: parse `.ics` sources, resolve timezones, filter by date
//! range, sanitize free text, and group events into day buckets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold, Component};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use log::warn;

use crate::date_range::ReportRange;
use crate::error::{WeekrepError, WeekrepResult};
use crate::event::{CalendarEvent, DayBucket, EventStart};
use crate::sanitize::sanitize;

/// Marker left in descriptions by scheduling add-ons; such auto-generated
/// events are dropped entirely.
pub const AUTO_GENERATED_MARKER: &str = "This event was created by";

/// Default description for events without one.
pub const NO_DESCRIPTION: &str = "No description";
/// Default location for events without one.
pub const NO_LOCATION: &str = "No location specified";

/// Extract day buckets from one calendar document.
///
/// Events outside `range` and auto-generated events are dropped. Surviving
/// events keep their discovery order within each bucket; buckets come back
/// sorted ascending by date.
pub fn extract(
    content: &str,
    source_label: &str,
    range: &ReportRange,
    tz: Tz,
) -> WeekrepResult<Vec<DayBucket>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| WeekrepError::Parse {
        source_label: source_label.to_string(),
        reason: e.to_string(),
    })?;

    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();

    for vevent in calendar.components.iter().filter(|c| c.name == "VEVENT") {
        let Some(event) = build_event(vevent, tz) else {
            continue;
        };
        if !range.contains(event.date) {
            continue;
        }
        if event.description.contains(AUTO_GENERATED_MARKER) {
            continue;
        }
        days.entry(event.date).or_default().push(event);
    }

    Ok(days
        .into_iter()
        .map(|(date, events)| DayBucket { date, events })
        .collect())
}

/// Extract day buckets from an `.ics` file. An unreadable file is reported as
/// a parse error so the caller can skip the source and continue.
pub fn extract_file(path: &Path, range: &ReportRange, tz: Tz) -> WeekrepResult<Vec<DayBucket>> {
    let label = source_label(path);
    let content = std::fs::read_to_string(path).map_err(|e| WeekrepError::Parse {
        source_label: label.clone(),
        reason: e.to_string(),
    })?;
    extract(&content, &label, range, tz)
}

/// Display label for a source file.
pub fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// All `.ics` files in `dir`, sorted by filename for a stable batch order.
pub fn discover_sources(dir: &Path) -> WeekrepResult<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("ics"))
        .collect();
    sources.sort();
    Ok(sources)
}

/// Merge per-source bucket batches into one ascending sequence, appending
/// same-date events in batch order.
pub fn merge_batches(batches: Vec<Vec<DayBucket>>) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for batch in batches {
        for bucket in batch {
            days.entry(bucket.date).or_default().extend(bucket.events);
        }
    }
    days.into_iter()
        .map(|(date, events)| DayBucket { date, events })
        .collect()
}

fn build_event(vevent: &Component<'_>, tz: Tz) -> Option<CalendarEvent> {
    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .unwrap_or_else(|| "(No title)".to_string());

    let Some(dtstart) = vevent.find_prop("DTSTART") else {
        warn!("skipping event '{}' without DTSTART", title);
        return None;
    };
    let Ok(dpt) = DatePerhapsTime::try_from(dtstart) else {
        warn!("skipping event '{}' with unparsable DTSTART", title);
        return None;
    };
    let start = resolve_start(dpt, tz)?;

    let description = vevent
        .find_prop("DESCRIPTION")
        .map(|p| sanitize(&unescape_text(p.val.as_ref())))
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());
    let location = vevent
        .find_prop("LOCATION")
        .map(|p| sanitize(&unescape_text(p.val.as_ref())))
        .unwrap_or_else(|| NO_LOCATION.to_string());

    let date = match &start {
        EventStart::Timed(dt) => dt.date_naive(),
        EventStart::AllDay(d) => *d,
    };

    Some(CalendarEvent {
        title,
        start,
        description,
        location,
        date,
    })
}

/// Resolve a DTSTART to the reference timezone: zoned values are converted,
/// floating values are assumed to already be in the reference timezone, and
/// date-only values become all-day starts.
fn resolve_start(dpt: DatePerhapsTime, tz: Tz) -> Option<EventStart> {
    match dpt {
        DatePerhapsTime::Date(d) => Some(EventStart::AllDay(d)),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => Some(EventStart::Timed(dt.with_timezone(&tz))),
            CalendarDateTime::Floating(naive) => naive
                .and_local_timezone(tz)
                .earliest()
                .map(EventStart::Timed),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                let source_tz: Tz = match tzid.parse() {
                    Ok(parsed) => parsed,
                    Err(_) => {
                        warn!("unknown TZID '{}', assuming reference timezone", tzid);
                        tz
                    }
                };
                date_time
                    .and_local_timezone(source_tz)
                    .earliest()
                    .map(|dt| EventStart::Timed(dt.with_timezone(&tz)))
            }
        },
    }
}

/// Undo RFC 5545 text escaping; the parser leaves `\n`, `\,`, `\;` and `\\`
/// sequences in place.
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') | Some('N') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::REDACTION_TOKEN;
    use chrono_tz::Tz;

    fn utc() -> Tz {
        "UTC".parse().unwrap()
    }

    fn range(start: &str, end: &str) -> ReportRange {
        ReportRange::from_args(start, end).unwrap()
    }

    fn wrap_events(events: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\n{}END:VCALENDAR",
            events
        )
    }

    #[test]
    fn buckets_filter_by_range_and_redact() {
        // Two events on Jan 1 (one with an email in its description), one on
        // Jan 3; nothing on Jan 2.
        let ics = wrap_events(
            "BEGIN:VEVENT\n\
             UID:a\n\
             SUMMARY:Standup\n\
             DTSTART:20240101T090000Z\n\
             END:VEVENT\n\
             BEGIN:VEVENT\n\
             UID:b\n\
             SUMMARY:Planning\n\
             DESCRIPTION:Ping alice@example.com about the deck\n\
             DTSTART:20240101T140000Z\n\
             END:VEVENT\n\
             BEGIN:VEVENT\n\
             UID:c\n\
             SUMMARY:Retro\n\
             DTSTART:20240103T100000Z\n\
             END:VEVENT\n\
             BEGIN:VEVENT\n\
             UID:d\n\
             SUMMARY:Out of range\n\
             DTSTART:20240110T100000Z\n\
             END:VEVENT\n",
        );

        let buckets = extract(&ics, "test.ics", &range("2024-01-01", "2024-01-03"), utc()).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date.to_string(), "2024-01-01");
        assert_eq!(buckets[0].events.len(), 2);
        assert_eq!(buckets[0].events[0].title, "Standup");
        assert_eq!(buckets[0].events[1].title, "Planning");
        assert!(buckets[0].events[1].description.contains(REDACTION_TOKEN));
        assert!(!buckets[0].events[1].description.contains("alice@example.com"));
        assert_eq!(buckets[1].date.to_string(), "2024-01-03");
        assert_eq!(buckets[1].events.len(), 1);
    }

    #[test]
    fn buckets_partition_events_without_duplicate_dates() {
        let ics = wrap_events(
            "BEGIN:VEVENT\nUID:a\nSUMMARY:One\nDTSTART:20240102T090000Z\nEND:VEVENT\n\
             BEGIN:VEVENT\nUID:b\nSUMMARY:Two\nDTSTART:20240101T090000Z\nEND:VEVENT\n\
             BEGIN:VEVENT\nUID:c\nSUMMARY:Three\nDTSTART:20240102T120000Z\nEND:VEVENT\n",
        );

        let buckets = extract(&ics, "test.ics", &range("2024-01-01", "2024-01-07"), utc()).unwrap();

        let total: usize = buckets.iter().map(|b| b.events.len()).sum();
        assert_eq!(total, 3);
        let dates: Vec<_> = buckets.iter().map(|b| b.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(dates, sorted, "buckets must be sorted with unique dates");
        for bucket in &buckets {
            for event in &bucket.events {
                assert_eq!(event.date, bucket.date);
            }
        }
    }

    #[test]
    fn auto_generated_events_are_dropped() {
        let ics = wrap_events(
            "BEGIN:VEVENT\n\
             UID:a\n\
             SUMMARY:Synthetic\n\
             DESCRIPTION:This event was created by a scheduling add-on.\n\
             DTSTART:20240101T090000Z\n\
             END:VEVENT\n",
        );

        let buckets = extract(&ics, "test.ics", &range("2024-01-01", "2024-01-07"), utc()).unwrap();
        assert!(buckets.is_empty());
    }

    #[test]
    fn all_day_events_use_the_date_directly() {
        let ics = wrap_events(
            "BEGIN:VEVENT\n\
             UID:a\n\
             SUMMARY:Holiday\n\
             DTSTART;VALUE=DATE:20240102\n\
             END:VEVENT\n",
        );

        let buckets = extract(&ics, "test.ics", &range("2024-01-01", "2024-01-07"), utc()).unwrap();
        assert_eq!(buckets.len(), 1);
        let event = &buckets[0].events[0];
        assert!(event.is_all_day());
        assert_eq!(event.time_label(), "2024-01-02");
        assert_eq!(event.description, "No description");
        assert_eq!(event.location, "No location specified");
    }

    #[test]
    fn utc_starts_resolve_to_the_reference_timezone() {
        // 00:30 UTC on Jan 2 is still Jan 1 in New York, so the event falls
        // out of a range that starts on Jan 2.
        let ics = wrap_events(
            "BEGIN:VEVENT\n\
             UID:a\n\
             SUMMARY:Late call\n\
             DTSTART:20240102T003000Z\n\
             END:VEVENT\n",
        );
        let ny: Tz = "America/New_York".parse().unwrap();

        let buckets = extract(&ics, "test.ics", &range("2024-01-02", "2024-01-07"), ny).unwrap();
        assert!(buckets.is_empty());

        let buckets = extract(&ics, "test.ics", &range("2024-01-01", "2024-01-07"), ny).unwrap();
        assert_eq!(buckets[0].date.to_string(), "2024-01-01");
        assert_eq!(buckets[0].events[0].time_label(), "2024-01-01 19:30");
    }

    #[test]
    fn floating_starts_assume_the_reference_timezone() {
        let ics = wrap_events(
            "BEGIN:VEVENT\n\
             UID:a\n\
             SUMMARY:Gym\n\
             DTSTART:20240103T073000\n\
             END:VEVENT\n",
        );
        let ny: Tz = "America/New_York".parse().unwrap();

        let buckets = extract(&ics, "test.ics", &range("2024-01-01", "2024-01-07"), ny).unwrap();
        assert_eq!(buckets[0].events[0].time_label(), "2024-01-03 07:30");
    }

    #[test]
    fn events_without_dtstart_are_skipped_not_fatal() {
        let ics = wrap_events(
            "BEGIN:VEVENT\n\
             UID:a\n\
             SUMMARY:No start\n\
             END:VEVENT\n\
             BEGIN:VEVENT\n\
             UID:b\n\
             SUMMARY:Standup\n\
             DTSTART:20240101T090000Z\n\
             END:VEVENT\n",
        );

        let buckets = extract(&ics, "test.ics", &range("2024-01-01", "2024-01-07"), utc()).unwrap();

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].events.len(), 1);
        assert_eq!(buckets[0].events[0].title, "Standup");
    }

    #[test]
    fn escaped_text_is_unescaped_before_storage() {
        let ics = wrap_events(
            "BEGIN:VEVENT\n\
             UID:a\n\
             SUMMARY:Lunch\\, then retro\n\
             DESCRIPTION:line one\\nline two\\; done\n\
             LOCATION:Caf\\\\e\n\
             DTSTART:20240101T120000Z\n\
             END:VEVENT\n",
        );

        let buckets = extract(&ics, "test.ics", &range("2024-01-01", "2024-01-07"), utc()).unwrap();

        let event = &buckets[0].events[0];
        assert_eq!(event.title, "Lunch, then retro");
        assert_eq!(event.description, "line one\nline two; done");
        assert_eq!(event.location, "Caf\\e");
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        let err = extract("not a calendar", "bad.ics", &range("2024-01-01", "2024-01-07"), utc())
            .unwrap_err();
        assert!(matches!(err, WeekrepError::Parse { .. }));
    }

    #[test]
    fn merge_batches_appends_same_date_events_in_batch_order() {
        let ics_a = wrap_events(
            "BEGIN:VEVENT\nUID:a\nSUMMARY:First\nDTSTART:20240101T090000Z\nEND:VEVENT\n",
        );
        let ics_b = wrap_events(
            "BEGIN:VEVENT\nUID:b\nSUMMARY:Second\nDTSTART:20240101T100000Z\nEND:VEVENT\n\
             BEGIN:VEVENT\nUID:c\nSUMMARY:Other day\nDTSTART:20240102T100000Z\nEND:VEVENT\n",
        );
        let r = range("2024-01-01", "2024-01-07");
        let a = extract(&ics_a, "a.ics", &r, utc()).unwrap();
        let b = extract(&ics_b, "b.ics", &r, utc()).unwrap();

        let merged = merge_batches(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].events.len(), 2);
        assert_eq!(merged[0].events[0].title, "First");
        assert_eq!(merged[0].events[1].title, "Second");
    }
}
