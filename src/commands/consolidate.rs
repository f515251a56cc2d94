use anyhow::Result;

use weekrep_core::config::WeekrepConfig;
use weekrep_core::consolidate::Consolidator;
use weekrep_core::generate::HttpGenerator;
use weekrep_core::store::ReportStore;

use super::create_spinner;

/// Consolidate the existing pass logs. This is the required second
/// invocation after a run ends in an escalation.
pub fn run() -> Result<()> {
    let cfg = WeekrepConfig::load()?;
    let store = ReportStore::new(cfg.report_path());
    let generator = HttpGenerator::new(&cfg.generator)?;

    let spinner = create_spinner("Consolidating pass summaries".to_string());
    let mut consolidator = Consolidator::new(&generator, &store, &cfg);
    let outcome = consolidator.run()?;
    spinner.finish_and_clear();

    super::report_outcome(outcome, &store)
}
