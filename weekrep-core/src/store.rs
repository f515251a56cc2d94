//! Append-only pass logs and the overwritten final-report artifact.
//!
//! One pipeline instance per report directory: the logs are single-writer,
//! and concurrent runs against the same directory are unsafe.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::date_range::DATE_FORMAT;
use crate::error::WeekrepResult;
use crate::summarize::Pass;

pub const FINAL_REPORT_FILE: &str = "final-report.txt";

/// One re-read pass-log entry. The header fields are `None` for entries
/// written by other tooling without a date tag.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub date: Option<NaiveDate>,
    pub pass_id: Option<u8>,
    pub text: String,
}

pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReportStore { dir: dir.into() }
    }

    pub fn log_path(&self, pass_id: u8) -> PathBuf {
        self.dir.join(format!("passes-{}.log", pass_id))
    }

    pub fn final_report_path(&self) -> PathBuf {
        self.dir.join(FINAL_REPORT_FILE)
    }

    /// Truncate the pass logs at the start of a run. A stale escalation log
    /// from a previous run must not trip the three-way comparison.
    pub fn reset_run(&self, passes: u8) -> WeekrepResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        for pass_id in 1..=passes {
            File::create(self.log_path(pass_id))?;
        }
        if passes < 3 {
            let third = self.log_path(3);
            if third.exists() {
                std::fs::remove_file(third)?;
            }
        }
        Ok(())
    }

    /// Append one date-tagged entry to the pass's log. Never touches prior
    /// entries.
    pub fn append(&self, pass: &Pass) -> WeekrepResult<()> {
        self.append_entry(pass.pass_id, pass.date, &pass.source_label, &pass.text)
    }

    /// Append the escalation pass, tagged with today's date.
    pub fn append_escalation(&self, pass_id: u8, text: &str) -> WeekrepResult<()> {
        self.append_entry(pass_id, chrono::Local::now().date_naive(), "escalation", text)
    }

    fn append_entry(
        &self,
        pass_id: u8,
        date: NaiveDate,
        label: &str,
        text: &str,
    ) -> WeekrepResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(pass_id))?;
        write!(
            file,
            "[{}] pass {} ({})\n{}\n\n",
            date.format(DATE_FORMAT),
            pass_id,
            label,
            strip_blank_lines(text)
        )?;
        Ok(())
    }

    /// Full text of a pass log; an absent log reads as the empty string so it
    /// can still participate in comparison.
    pub fn read_log(&self, pass_id: u8) -> WeekrepResult<String> {
        let path = self.log_path(pass_id);
        if !path.exists() {
            return Ok(String::new());
        }
        Ok(std::fs::read_to_string(path)?)
    }

    pub fn has_entries(&self, pass_id: u8) -> WeekrepResult<bool> {
        Ok(!self.read_log(pass_id)?.trim().is_empty())
    }

    /// Blank-line-delimited entries of a pass log, in append order.
    pub fn entries(&self, pass_id: u8) -> WeekrepResult<Vec<LogEntry>> {
        let text = self.read_log(pass_id)?;
        Ok(text
            .split("\n\n")
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .map(parse_entry)
            .collect())
    }

    /// Overwrite the final report artifact.
    pub fn write_final_report(&self, text: &str) -> WeekrepResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.final_report_path(), text)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn parse_entry(block: &str) -> LogEntry {
    let mut lines = block.lines();
    let header = lines.next().unwrap_or("");
    let (date, pass_id) = parse_header(header);
    let text = if date.is_some() {
        lines.collect::<Vec<_>>().join("\n")
    } else {
        block.to_string()
    };
    LogEntry {
        date,
        pass_id,
        text,
    }
}

fn parse_header(line: &str) -> (Option<NaiveDate>, Option<u8>) {
    let Some(rest) = line.strip_prefix('[') else {
        return (None, None);
    };
    let Some((date_str, tail)) = rest.split_once(']') else {
        return (None, None);
    };
    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).ok();
    let pass_id = tail
        .trim()
        .strip_prefix("pass ")
        .and_then(|t| t.split_whitespace().next())
        .and_then(|n| n.parse().ok());
    (date, pass_id)
}

/// Blank lines delimit entries, so they are stripped from entry bodies.
fn strip_blank_lines(text: &str) -> String {
    text.trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
