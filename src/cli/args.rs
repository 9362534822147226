use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "a11ytrend",
    version,
    about = "Accessibility audit aggregation, diffing and trends"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Debug-level logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Config file (defaults to ./a11ytrend.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate a scan, diff it against the last run and persist a snapshot
    Run {
        /// Scanner output: JSON array of per-page records
        #[arg(long, short, value_name = "FILE")]
        input: PathBuf,
        /// Site identity (URL or name); derived from the first page otherwise
        #[arg(long, short)]
        site: Option<String>,
        /// Compare against this snapshot instead of the site's latest
        #[arg(long, value_name = "NAME")]
        baseline: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a site's violation trend across stored snapshots
    History {
        #[arg(long, short)]
        site: String,
        #[arg(long)]
        json: bool,
    },
}
