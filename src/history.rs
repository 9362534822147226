// src/history.rs
//! Trend series over a site's persisted snapshots.
//!
//! Result directories accumulate two file shapes: the scanner's raw per-page
//! array (older runs) and processed snapshots. Each file is resolved once into
//! a [`RecordShape`] and tallied from there.

use crate::site::SiteId;
use crate::store::Storage;
use crate::types::{HistoryPoint, Impact, ScanRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Page count assumed when a record states none.
const DEFAULT_PAGE_COUNT: usize = 1;

/// A persisted file, classified at ingestion.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecordShape {
    /// The scanner's per-page array, stored unprocessed.
    Raw(Vec<ScanRecord>),
    Processed(ProcessedRecord),
}

/// The parts of a processed snapshot the trend needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRecord {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pages_audited: Option<usize>,
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    pub rules: Vec<RuleTally>,
}

#[derive(Debug, Deserialize)]
pub struct RuleTally {
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub occurrences: Vec<IgnoredAny>,
}

impl RecordShape {
    /// # Errors
    /// Returns error if `bytes` is neither shape.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    #[must_use]
    pub fn violation_count(&self) -> usize {
        self.weighted_counts().map(|(count, _)| count).sum()
    }

    /// Occurrences weighted by their impact.
    #[must_use]
    pub fn total_penalty(&self) -> u64 {
        self.weighted_counts()
            .map(|(count, impact)| {
                u64::try_from(count)
                    .unwrap_or(u64::MAX)
                    .saturating_mul(impact.weight())
            })
            .fold(0, u64::saturating_add)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        match self {
            Self::Raw(records) => records.iter().filter(|r| !r.is_error()).count(),
            Self::Processed(p) => p
                .pages_audited
                .or_else(|| p.urls.as_ref().map(Vec::len))
                .unwrap_or(DEFAULT_PAGE_COUNT),
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Raw(_) => None,
            Self::Processed(p) => p.timestamp,
        }
    }

    fn weighted_counts(&self) -> Box<dyn Iterator<Item = (usize, Impact)> + '_> {
        match self {
            Self::Raw(records) => Box::new(
                records
                    .iter()
                    .flat_map(|r| &r.violations)
                    .map(|v| (v.nodes.len(), v.impact)),
            ),
            Self::Processed(p) => Box::new(p.rules.iter().map(|r| (r.occurrences.len(), r.impact))),
        }
    }
}

/// Reads a results directory and builds one site's trend.
pub struct HistoryIndex<'a, S: Storage> {
    storage: &'a S,
    dir: PathBuf,
    limit: usize,
}

impl<'a, S: Storage> HistoryIndex<'a, S> {
    pub fn new(storage: &'a S, dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            dir: dir.into(),
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Oldest-first trend, keeping only the most recent `limit` points.
    ///
    /// A missing directory is an empty history. Files that cannot be read,
    /// parsed, or dated are skipped with a warning.
    #[must_use]
    pub fn trend(&self, site: &SiteId) -> Vec<HistoryPoint> {
        let names = match self.storage.list(&self.dir) {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "no results directory yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot list results directory");
                return Vec::new();
            }
        };

        let mut points: Vec<HistoryPoint> = names
            .iter()
            .filter(|name| site.matches_file(name))
            .filter_map(|name| self.point_for(name))
            .collect();

        points.sort_by_key(|p| p.timestamp_epoch);
        let excess = points.len().saturating_sub(self.limit);
        points.drain(..excess);
        points
    }

    fn point_for(&self, name: &str) -> Option<HistoryPoint> {
        let path = self.dir.join(name);
        let shape = read_shape(self.storage, &path)?;

        let Some(timestamp) = shape.timestamp().or_else(|| stamp_from_name(name)) else {
            warn!(path = %path.display(), "skipping snapshot with no recoverable timestamp");
            return None;
        };

        Some(HistoryPoint {
            date: timestamp.format("%Y-%m-%d %H:%M").to_string(),
            violation_count: shape.violation_count(),
            total_penalty: shape.total_penalty(),
            page_count: shape.page_count(),
            timestamp_epoch: timestamp.timestamp_millis(),
        })
    }
}

fn read_shape<S: Storage>(storage: &S, path: &Path) -> Option<RecordShape> {
    let bytes = match storage.read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable snapshot");
            return None;
        }
    };
    match RecordShape::from_slice(&bytes) {
        Ok(shape) => Some(shape),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping malformed snapshot");
            None
        }
    }
}

static COMPACT_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{8})T(\d{6})(\d{3})?").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static DASHED_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})[T_ ](\d{2})[-:](\d{2})[-:](\d{2})")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static EPOCH_MILLIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{13})(?:\D|$)").unwrap_or_else(|_| panic!("Invalid Regex")));

/// Recovers a run time embedded in a snapshot file name.
#[must_use]
pub fn stamp_from_name(name: &str) -> Option<DateTime<Utc>> {
    if let Some(caps) = COMPACT_STAMP.captures(name) {
        let naive = NaiveDateTime::parse_from_str(
            &format!("{}{}", &caps[1], &caps[2]),
            "%Y%m%d%H%M%S",
        )
        .ok()?;
        let millis: i64 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        return Some(Utc.from_utc_datetime(&naive) + chrono::Duration::milliseconds(millis));
    }

    if let Some(caps) = DASHED_STAMP.captures(name) {
        let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
        let time = date.and_hms_opt(
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
            caps[4].parse().ok()?,
        )?;
        return Some(Utc.from_utc_datetime(&time));
    }

    let caps = EPOCH_MILLIS.captures(name)?;
    let millis: i64 = caps[1].parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
