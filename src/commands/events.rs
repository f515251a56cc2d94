use anyhow::Result;
use log::warn;
use owo_colors::OwoColorize;

use weekrep_core::config::WeekrepConfig;
use weekrep_core::extract;

/// Extraction dry-run: list the day buckets a `run` would summarize, without
/// touching the generation service.
pub fn run(
    from: Option<String>,
    to: Option<String>,
    timezone: Option<String>,
    dir: Option<String>,
) -> Result<()> {
    let mut cfg = WeekrepConfig::load()?;
    if let Some(dir) = dir {
        cfg.calendar_dir = dir;
    }

    let range = super::resolve_range(from.as_deref(), to.as_deref())?;
    let tz = super::resolve_timezone(timezone.as_deref(), &cfg)?;

    let calendar_dir = cfg.calendar_path();
    let sources = extract::discover_sources(&calendar_dir)?;
    if sources.is_empty() {
        anyhow::bail!("No .ics files found in {}", calendar_dir.display());
    }

    let mut any_events = false;
    for path in &sources {
        let label = extract::source_label(path);
        let buckets = match extract::extract_file(path, &range, tz) {
            Ok(buckets) => buckets,
            Err(e) => {
                warn!("{}", e);
                println!("{}", format!("skipped {}: {}", label, e).red());
                continue;
            }
        };
        if buckets.is_empty() {
            continue;
        }

        any_events = true;
        println!("\n📅 {}", label);
        for bucket in &buckets {
            println!("  {}", bucket.date.to_string().bold());
            for event in &bucket.events {
                if event.is_all_day() {
                    println!("    all day — {}", event.title);
                } else {
                    println!("    {} — {}", event.time_label(), event.title);
                }
                if event.description != extract::NO_DESCRIPTION {
                    println!("      {}", event.description.replace('\n', " "));
                }
            }
        }
    }

    if !any_events {
        println!("No events in range.");
    }

    Ok(())
}
