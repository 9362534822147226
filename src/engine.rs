// src/engine.rs
//! One audit run: aggregate, diff against the baseline, rank, persist.
//!
//! Persisting is the last step of [`run`]. Runs for the same site must not
//! overlap; callers serialize them.

use crate::aggregate::{self, CatalogSummary, DEFAULT_SUMMARY_TOP};
use crate::diff;
use crate::error::Result;
use crate::priority::{self, PrioritySummary, DEFAULT_PRIORITY_TOP};
use crate::site::SiteId;
use crate::store::SnapshotStore;
use crate::types::{AggregatedRule, DiffTotals, ResolvedRule, ScanRecord, Snapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub summary_top: usize,
    pub priority_top: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            summary_top: DEFAULT_SUMMARY_TOP,
            priority_top: DEFAULT_PRIORITY_TOP,
        }
    }
}

/// Which snapshot the run is compared against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Baseline {
    /// The site's latest pointer.
    #[default]
    Latest,
    /// A specific snapshot file, relative to the results directory.
    Named(String),
}

/// Everything the report renderer consumes, and nothing more.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub rules: Vec<AggregatedRule>,
    pub priority_rules: Vec<AggregatedRule>,
    pub diff_totals: DiffTotals,
    pub fully_resolved_rules: Vec<ResolvedRule>,
    pub priority_summary: PrioritySummary,
    pub pages_audited: usize,
}

impl RunReport {
    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        self.rules.iter().map(AggregatedRule::occurrence_count).sum()
    }

    /// Occurrences fixed since the baseline, including those of rules that
    /// left the catalog. `diff_totals.resolved` counts current rules only.
    #[must_use]
    pub fn resolved_total(&self) -> usize {
        self.diff_totals.resolved + self.gone_total()
    }

    /// Occurrences fixed by rules that no longer appear at all.
    #[must_use]
    pub fn gone_total(&self) -> usize {
        self.fully_resolved_rules.iter().map(|r| r.resolved).sum()
    }
}

/// The pure part of a run, before anything is persisted.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: RunReport,
    pub catalog_summary: CatalogSummary,
    pub has_baseline: bool,
}

impl Analysis {
    #[must_use]
    pub fn to_snapshot(&self, site: &SiteId, timestamp: DateTime<Utc>) -> Snapshot {
        Snapshot {
            site: site.slug().to_string(),
            timestamp,
            pages_audited: self.report.pages_audited,
            rules: self.report.rules.clone(),
            diff_totals: self.report.diff_totals,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub analysis: Analysis,
    pub snapshot: Snapshot,
    /// Where the store put the snapshot.
    pub location: String,
}

/// Aggregates, diffs and ranks without touching storage.
#[must_use]
pub fn analyze(records: &[ScanRecord], previous: Option<&Snapshot>, options: RunOptions) -> Analysis {
    let catalog = aggregate::aggregate(records, options.summary_top);
    let diffed = diff::diff(&catalog.rules, previous);
    let ranked = priority::rank(&diffed.rules, catalog.pages_audited, options.priority_top);

    Analysis {
        report: RunReport {
            rules: ranked.rules,
            priority_rules: ranked.priority_rules,
            diff_totals: diffed.totals,
            fully_resolved_rules: diffed.fully_resolved,
            priority_summary: ranked.summary,
            pages_audited: catalog.pages_audited,
        },
        catalog_summary: catalog.summary,
        has_baseline: diffed.has_baseline,
    }
}

/// Runs one audit for `site` and persists it as the site's new latest
/// snapshot.
///
/// # Errors
/// Returns error only if persisting the snapshot fails.
pub fn run<S: SnapshotStore>(
    records: &[ScanRecord],
    site: &SiteId,
    baseline: &Baseline,
    store: &S,
    options: RunOptions,
    now: DateTime<Utc>,
) -> Result<RunOutcome> {
    let previous = match baseline {
        Baseline::Latest => store.get(site),
        Baseline::Named(name) => store.get_named(name),
    };
    debug!(site = %site, baseline = ?baseline, found = previous.is_some(), "resolved baseline");

    let analysis = analyze(records, previous.as_ref(), options);
    let snapshot = analysis.to_snapshot(site, now);
    let location = store.put(site, &snapshot)?;

    info!(
        site = %site,
        rules = analysis.report.rules.len(),
        new = analysis.report.diff_totals.new,
        resolved = analysis.report.diff_totals.resolved,
        "audit run complete"
    );

    Ok(RunOutcome {
        analysis,
        snapshot,
        location,
    })
}
