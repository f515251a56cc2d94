mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "weekrep")]
#[command(about = "Cross-validated weekly reports from local .ics calendars")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, summarize and consolidate a date range end to end
    Run {
        /// Start date (YYYY-MM-DD); prompted when omitted
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD); prompted when omitted
        #[arg(long)]
        to: Option<String>,

        /// Calendar owner's display name
        #[arg(long)]
        name: Option<String>,

        /// IANA timezone (defaults to config, then the system timezone)
        #[arg(long)]
        timezone: Option<String>,

        /// Directory containing .ics files (defaults to config)
        #[arg(long)]
        dir: Option<String>,

        /// Merge same-date events across sources before summarizing
        #[arg(long)]
        merge_sources: bool,
    },
    /// Re-run consolidation over the recorded pass logs
    Consolidate,
    /// List the extracted day buckets without calling the generation service
    Events {
        /// Start date (YYYY-MM-DD); prompted when omitted
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD); prompted when omitted
        #[arg(long)]
        to: Option<String>,

        /// IANA timezone (defaults to config, then the system timezone)
        #[arg(long)]
        timezone: Option<String>,

        /// Directory containing .ics files (defaults to config)
        #[arg(long)]
        dir: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            from,
            to,
            name,
            timezone,
            dir,
            merge_sources,
        } => commands::run::run(from, to, name, timezone, dir, merge_sources),
        Commands::Consolidate => commands::consolidate::run(),
        Commands::Events {
            from,
            to,
            timezone,
            dir,
        } => commands::events::run(from, to, timezone, dir),
    }
}
