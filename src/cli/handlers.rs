// src/cli/handlers.rs
//! Run and history command handlers.

use crate::config::Config;
use crate::engine::{self, Baseline};
use crate::exit::A11yExit;
use crate::history::HistoryIndex;
use crate::reporting;
use crate::site::SiteId;
use crate::store::{FileSnapshotStore, FsStorage};
use crate::types::ScanRecord;
use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub input: PathBuf,
    pub site: Option<String>,
    pub baseline: Option<String>,
    pub json: bool,
}

/// Handles the run command.
///
/// # Errors
/// Returns error if the snapshot cannot be persisted or printed.
pub fn handle_run(config: &Config, args: &RunArgs) -> Result<A11yExit> {
    let records = match load_records(&args.input) {
        Ok(records) => records,
        Err(e) => return Ok(invalid_input(&e)),
    };

    let site = match args.site.as_deref() {
        Some(raw) => SiteId::parse(raw),
        None => SiteId::from_records(&records),
    };
    let site = match site {
        Ok(site) => site,
        Err(e) => return Ok(invalid_input(&anyhow::Error::from(e))),
    };

    let baseline = args
        .baseline
        .clone()
        .map_or(Baseline::Latest, Baseline::Named);
    let store = FileSnapshotStore::on_disk(&config.results_dir);

    let outcome = engine::run(
        &records,
        &site,
        &baseline,
        &store,
        config.run_options(),
        Utc::now(),
    )
    .context("Failed to persist snapshot")?;

    if args.json {
        reporting::print_json(&outcome.analysis.report)?;
    } else {
        reporting::print_run(&outcome.analysis, &outcome.location, config.priority_min_rules);
    }

    Ok(if outcome.analysis.report.diff_totals.has_regressions() {
        A11yExit::Regressed
    } else {
        A11yExit::Success
    })
}

/// Handles the history command.
///
/// # Errors
/// Returns error if JSON output fails.
pub fn handle_history(config: &Config, site: &str, json: bool) -> Result<A11yExit> {
    let site = match SiteId::parse(site) {
        Ok(site) => site,
        Err(e) => return Ok(invalid_input(&anyhow::Error::from(e))),
    };

    let points = HistoryIndex::new(&FsStorage, &config.results_dir)
        .with_limit(config.history_limit)
        .trend(&site);

    if json {
        reporting::print_json(&points)?;
    } else {
        reporting::print_trend(&site, &points);
    }
    Ok(A11yExit::Success)
}

/// Reads the scanner's JSON array of per-page records.
///
/// # Errors
/// Returns error if the file cannot be read or is not a record array.
pub fn load_records(path: &Path) -> Result<Vec<ScanRecord>> {
    let content =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&content)
        .with_context(|| format!("Invalid scan records in {}", path.display()))
}

fn invalid_input(e: &anyhow::Error) -> A11yExit {
    eprintln!("{} {e:#}", "Error:".red());
    A11yExit::InvalidInput
}
