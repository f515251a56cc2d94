pub mod consolidate;
pub mod events;
pub mod run;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use dialoguer::Input;
use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use weekrep_core::config::WeekrepConfig;
use weekrep_core::consolidate::ConsolidationOutcome;
use weekrep_core::date_range::ReportRange;
use weekrep_core::store::ReportStore;

/// Resolve the report range from flags, prompting for missing bounds.
/// Validation is strict and happens before any processing.
pub(crate) fn resolve_range(from: Option<&str>, to: Option<&str>) -> Result<ReportRange> {
    let from = match from {
        Some(s) => s.to_string(),
        None => Input::new()
            .with_prompt("Start date (YYYY-MM-DD)")
            .interact_text()
            .context("Failed to read start date")?,
    };
    let to = match to {
        Some(s) => s.to_string(),
        None => Input::new()
            .with_prompt("End date (YYYY-MM-DD)")
            .interact_text()
            .context("Failed to read end date")?,
    };
    ReportRange::from_args(&from, &to).map_err(Into::into)
}

/// Flag override, then config, then the system timezone.
pub(crate) fn resolve_timezone(flag: Option<&str>, cfg: &WeekrepConfig) -> Result<Tz> {
    let name = match flag {
        Some(name) => name.to_string(),
        None if !cfg.timezone.is_empty() => cfg.timezone.clone(),
        None => iana_time_zone::get_timezone().context("Could not detect the system timezone")?,
    };
    name.parse()
        .map_err(|_| anyhow::anyhow!("Unknown timezone '{}'", name))
}

pub(crate) fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Print a consolidation outcome to the operator.
pub(crate) fn report_outcome(outcome: ConsolidationOutcome, store: &ReportStore) -> Result<()> {
    match outcome {
        ConsolidationOutcome::Consistent { .. } => {
            println!(
                "{} Final report written to {}",
                "✓".green(),
                store.final_report_path().display()
            );
        }
        ConsolidationOutcome::MismatchEscalated => {
            println!(
                "{} Pass summaries disagree; a third pass was recorded.",
                "!".yellow()
            );
            println!("Run `weekrep consolidate` to finish the report.");
        }
        ConsolidationOutcome::MismatchTerminal {
            response,
            first,
            second,
        } => {
            println!(
                "{} Summaries still disagree after escalation; manual review needed.",
                "✗".red()
            );
            println!("\nLatest comparison response:\n{}", response);
            println!("\nFirst pass log:\n{}", first);
            println!("\nSecond pass log:\n{}", second);
        }
    }
    Ok(())
}
