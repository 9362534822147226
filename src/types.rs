// src/types.rs
//! Data model shared by the aggregation, diff, ranking and history stages.
//!
//! Field names serialize in camelCase so snapshots written here stay readable
//! by the scanner and renderer that sit on either side of this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Severity tier of a rule violation.
///
/// Declaration order is the display rank: `Critical` sorts first and
/// `Unknown` last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Impact {
    Critical,
    Serious,
    Moderate,
    Minor,
    #[default]
    Unknown,
}

impl Impact {
    /// Parses a scanner impact label. Anything unrecognized is `Unknown`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "serious" => Self::Serious,
            "moderate" => Self::Moderate,
            "minor" => Self::Minor,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Serious => "serious",
            Self::Moderate => "moderate",
            Self::Minor => "minor",
            Self::Unknown => "unknown",
        }
    }

    /// Penalty weight. Each tier outweighs any realistic page reach of the
    /// tier below it.
    #[must_use]
    pub fn weight(self) -> u64 {
        match self {
            Self::Critical => 10_000,
            Self::Serious => 1_000,
            Self::Moderate => 100,
            Self::Minor => 10,
            Self::Unknown => 0,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Impact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Scanners emit `null` for rules that passed in some contexts and free-form
// strings in others; neither may reject the record.
impl<'de> Deserialize<'de> for Impact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Unknown, Self::parse))
    }
}

/// Selector path identifying one element on a page.
///
/// Equality and hashing use [`TargetPath::canonical`], so `["main", "img"]`
/// and `"main > img"` identify the same element.
#[derive(Debug, Clone, Default)]
pub struct TargetPath {
    segments: Vec<String>,
}

impl TargetPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// `>`-joined path with whitespace around each step removed.
    ///
    /// Only child combinators split a step; a `>` inside an attribute
    /// selector, a quoted value or a pseudo-class argument is kept verbatim.
    #[must_use]
    pub fn canonical(&self) -> String {
        let steps: Vec<&str> = self
            .segments
            .iter()
            .flat_map(|s| child_steps(s))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        steps.join(">")
    }
}

/// Splits a selector on its top-level `>` combinators.
fn child_steps(selector: &str) -> Vec<&str> {
    let mut steps = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in selector.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, '>') if depth == 0 => {
                steps.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    steps.push(&selector[start..]);
    steps
}

impl PartialEq for TargetPath {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for TargetPath {}

impl Hash for TargetPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl From<&str> for TargetPath {
    fn from(joined: &str) -> Self {
        Self::new([joined])
    }
}

impl Serialize for TargetPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.segments.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Joined(String),
    Segments(Vec<RawSegment>),
}

/// Frame and shadow-root hops arrive as nested lists.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSegment {
    One(String),
    Nested(Vec<String>),
}

impl<'de> Deserialize<'de> for TargetPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let path = match RawTarget::deserialize(deserializer)? {
            RawTarget::Joined(joined) => Self::from(joined.as_str()),
            RawTarget::Segments(segments) => Self::new(segments.into_iter().map(|s| match s {
                RawSegment::One(one) => one,
                RawSegment::Nested(parts) => parts.join(" "),
            })),
        };
        Ok(path)
    }
}

/// One audited page as produced by the scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub url: String,
    #[serde(default)]
    pub violations: Vec<Violation>,
    /// Set when the scanner could not audit the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanRecord {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A rule violated on one page, with every matching element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "id")]
    pub rule_id: String,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub description: String,
    /// Short display name of the rule.
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub help_url: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub nodes: Vec<MatchedElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedElement {
    #[serde(default)]
    pub html: String,
    #[serde(rename = "target", default)]
    pub target_path: TargetPath,
}

/// One concrete element violating a rule on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub page: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub target_path: TargetPath,
    #[serde(default)]
    pub is_new_occurrence: bool,
    #[serde(default)]
    pub is_new_page: bool,
}

/// Run-over-run change for a single rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDiff {
    pub new: usize,
    pub resolved: usize,
    pub unchanged: usize,
    #[serde(default)]
    pub new_pages: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffTotals {
    pub new: usize,
    pub resolved: usize,
    pub unchanged: usize,
}

impl DiffTotals {
    pub fn absorb(&mut self, diff: &RuleDiff) {
        self.new += diff.new;
        self.resolved += diff.resolved;
        self.unchanged += diff.unchanged;
    }

    #[must_use]
    pub fn has_regressions(&self) -> bool {
        self.new > 0
    }
}

/// Every occurrence of one rule across the audited pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRule {
    pub id: String,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub help_url: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
    #[serde(default)]
    pub pages_affected: usize,
    #[serde(default)]
    pub density: f64,
    #[serde(default)]
    pub is_systemic: bool,
    #[serde(default)]
    pub diff: RuleDiff,
    #[serde(default)]
    pub is_new_rule: bool,
    #[serde(default)]
    pub priority_score: u64,
}

impl AggregatedRule {
    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }

    /// The rule's short name, or its id when the scanner gave none.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.help.is_empty() {
            &self.id
        } else {
            &self.help
        }
    }
}

/// A rule present in the baseline with no occurrence in the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRule {
    pub id: String,
    pub impact: Impact,
    pub help: String,
    /// Occurrences the baseline held for this rule.
    pub resolved: usize,
}

/// The persisted result of one audit run for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub site: String,
    pub timestamp: DateTime<Utc>,
    pub pages_audited: usize,
    pub rules: Vec<AggregatedRule>,
    #[serde(default)]
    pub diff_totals: DiffTotals,
}

/// One point of a site's trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: String,
    pub violation_count: usize,
    pub total_penalty: u64,
    pub page_count: usize,
    pub timestamp_epoch: i64,
}
