use anyhow::Result;
use dialoguer::Input;
use log::warn;
use owo_colors::OwoColorize;

use weekrep_core::config::WeekrepConfig;
use weekrep_core::consolidate::Consolidator;
use weekrep_core::event::DayBucket;
use weekrep_core::extract;
use weekrep_core::generate::HttpGenerator;
use weekrep_core::store::ReportStore;
use weekrep_core::summarize::PassSummarizer;

use super::create_spinner;

pub fn run(
    from: Option<String>,
    to: Option<String>,
    name: Option<String>,
    timezone: Option<String>,
    dir: Option<String>,
    merge_sources: bool,
) -> Result<()> {
    let mut cfg = WeekrepConfig::load()?;
    if let Some(dir) = dir {
        cfg.calendar_dir = dir;
    }
    if merge_sources {
        cfg.merge_sources = true;
    }
    if let Some(name) = name {
        cfg.user_name = Some(name);
    } else if cfg.user_name.is_none() {
        let entered: String = Input::new()
            .with_prompt("Your name (blank to skip)")
            .allow_empty(true)
            .interact_text()?;
        if !entered.trim().is_empty() {
            cfg.user_name = Some(entered.trim().to_string());
        }
    }

    // Fatal input validation happens before any processing.
    let range = super::resolve_range(from.as_deref(), to.as_deref())?;
    let tz = super::resolve_timezone(timezone.as_deref(), &cfg)?;

    let calendar_dir = cfg.calendar_path();
    let sources = extract::discover_sources(&calendar_dir)?;
    if sources.is_empty() {
        anyhow::bail!("No .ics files found in {}", calendar_dir.display());
    }

    let store = ReportStore::new(cfg.report_path());
    store.reset_run(cfg.passes)?;

    let generator = HttpGenerator::new(&cfg.generator)?;
    let summarizer = PassSummarizer::new(&generator, &cfg);

    // Extract each source as its own batch; a malformed source is skipped,
    // not fatal.
    let mut batches: Vec<(String, Vec<DayBucket>)> = Vec::new();
    for path in &sources {
        let label = extract::source_label(path);
        match extract::extract_file(path, &range, tz) {
            Ok(buckets) => {
                println!(
                    "📅 {}: {} day(s) with events",
                    label,
                    buckets.len()
                );
                batches.push((label, buckets));
            }
            Err(e) => {
                warn!("{}", e);
                println!("   {}", format!("skipped {}: {}", label, e).red());
            }
        }
    }

    if cfg.merge_sources {
        let merged = extract::merge_batches(batches.into_iter().map(|(_, b)| b).collect());
        batches = vec![("merged".to_string(), merged)];
    }

    let total_days: usize = batches.iter().map(|(_, buckets)| buckets.len()).sum();
    if total_days == 0 {
        store.write_final_report("")?;
        println!("No events in range; wrote an empty report.");
        return Ok(());
    }

    for (label, buckets) in &batches {
        for bucket in buckets {
            for pass_id in 1..=cfg.passes {
                let spinner =
                    create_spinner(format!("Summarizing {} (pass {})", bucket.date, pass_id));
                let pass = summarizer.summarize(bucket, pass_id, label);
                spinner.finish_and_clear();
                store.append(&pass)?;
                println!("  {} pass {} for {}", "✓".green(), pass_id, bucket.date);
            }
        }
    }

    let spinner = create_spinner("Consolidating pass summaries".to_string());
    let mut consolidator = Consolidator::new(&generator, &store, &cfg);
    let outcome = consolidator.run()?;
    spinner.finish_and_clear();

    super::report_outcome(outcome, &store)
}
