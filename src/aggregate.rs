// src/aggregate.rs
//! Rule catalog construction.
//!
//! Folds the scanner's per-page records into one [`AggregatedRule`] per rule
//! id, with every matched element attached as an [`Occurrence`]. All grouping
//! state lives in a per-call accumulator; nothing survives between calls.

use crate::diff::{normalize_page, occurrence_key};
use crate::types::{AggregatedRule, Occurrence, RuleDiff, ScanRecord, Violation};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

pub const DEFAULT_SUMMARY_TOP: usize = 5;

/// How much of the audit the leading rules account for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub top_rule_ids: Vec<String>,
    pub percent_of_occurrences: u32,
    pub percent_of_pages: u32,
}

/// Output of [`aggregate`]: rules in display order plus their summary.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub rules: Vec<AggregatedRule>,
    pub summary: CatalogSummary,
    pub pages_audited: usize,
}

struct RuleGroup {
    rule: AggregatedRule,
    pages: HashSet<String>,
    keys: HashSet<String>,
}

impl RuleGroup {
    fn new(v: &Violation) -> Self {
        Self {
            rule: AggregatedRule {
                id: v.rule_id.clone(),
                impact: v.impact,
                help: v.help.clone(),
                description: v.description.clone(),
                help_url: v.help_url.clone(),
                tags: BTreeSet::new(),
                occurrences: Vec::new(),
                pages_affected: 0,
                density: 0.0,
                is_systemic: false,
                diff: RuleDiff::default(),
                is_new_rule: false,
                priority_score: 0,
            },
            pages: HashSet::new(),
            keys: HashSet::new(),
        }
    }

    fn ingest(&mut self, page: &str, v: &Violation) {
        // Pages may disagree on severity; the most severe report wins.
        self.rule.impact = self.rule.impact.min(v.impact);
        self.rule.tags.extend(v.tags.iter().cloned());
        fill_if_empty(&mut self.rule.help, &v.help);
        fill_if_empty(&mut self.rule.description, &v.description);
        fill_if_empty(&mut self.rule.help_url, &v.help_url);

        for node in &v.nodes {
            let key = occurrence_key(page, &v.rule_id, &node.target_path);
            if !self.keys.insert(key) {
                debug!(rule = %v.rule_id, page, "folding repeated element");
                continue;
            }
            self.pages.insert(normalize_page(page).to_string());
            self.rule.occurrences.push(Occurrence {
                page: page.to_string(),
                html: node.html.clone(),
                target_path: node.target_path.clone(),
                is_new_occurrence: false,
                is_new_page: false,
            });
        }
    }

    fn finish(self, pages_audited: usize) -> AggregatedRule {
        let pages_affected = self.pages.len();
        AggregatedRule {
            pages_affected,
            density: density(pages_affected, pages_audited),
            is_systemic: is_systemic(pages_affected, pages_audited),
            ..self.rule
        }
    }
}

fn fill_if_empty(slot: &mut String, value: &str) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
    }
}

/// Groups the scanner records by rule id.
///
/// Pages carrying an error marker are skipped and do not count as audited.
#[must_use]
pub fn aggregate(records: &[ScanRecord], summary_top: usize) -> Catalog {
    let mut audited: HashSet<&str> = HashSet::new();
    let mut groups: Vec<RuleGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        if let Some(error) = &record.error {
            warn!(url = %record.url, %error, "skipping page the scanner could not audit");
            continue;
        }
        audited.insert(normalize_page(&record.url));

        for v in &record.violations {
            let slot = *index.entry(v.rule_id.as_str()).or_insert_with(|| {
                groups.push(RuleGroup::new(v));
                groups.len() - 1
            });
            if let Some(group) = groups.get_mut(slot) {
                group.ingest(&record.url, v);
            }
        }
    }

    let pages_audited = audited.len();
    let mut rules: Vec<AggregatedRule> = groups
        .into_iter()
        .map(|g| g.finish(pages_audited))
        .collect();
    rules.sort_by(display_order);

    let summary = summarize(&rules, pages_audited, summary_top);
    debug!(
        rules = rules.len(),
        pages = pages_audited,
        "aggregated scanner records"
    );

    Catalog {
        rules,
        summary,
        pages_audited,
    }
}

/// Impact rank, then systemic rules, then occurrence count descending.
#[must_use]
pub fn display_order(a: &AggregatedRule, b: &AggregatedRule) -> Ordering {
    a.impact
        .cmp(&b.impact)
        .then_with(|| b.is_systemic.cmp(&a.is_systemic))
        .then_with(|| b.occurrence_count().cmp(&a.occurrence_count()))
}

#[must_use]
pub fn is_systemic(pages_affected: usize, pages_audited: usize) -> bool {
    pages_audited > 1 && pages_affected == pages_audited
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(pages_affected: usize, pages_audited: usize) -> f64 {
    if pages_audited == 0 {
        return 0.0;
    }
    pages_affected as f64 / pages_audited as f64
}

/// Share of the audit covered by the first `top` rules of `rules`.
#[must_use]
pub fn summarize(rules: &[AggregatedRule], pages_audited: usize, top: usize) -> CatalogSummary {
    let leading = &rules[..top.min(rules.len())];
    let total: usize = rules.iter().map(AggregatedRule::occurrence_count).sum();

    CatalogSummary {
        top_rule_ids: leading.iter().map(|r| r.id.clone()).collect(),
        percent_of_occurrences: percent(occurrences_in(leading), total),
        percent_of_pages: percent(pages_touched(leading), pages_audited),
    }
}

pub(crate) fn occurrences_in(rules: &[AggregatedRule]) -> usize {
    rules.iter().map(AggregatedRule::occurrence_count).sum()
}

pub(crate) fn pages_touched(rules: &[AggregatedRule]) -> usize {
    rules
        .iter()
        .flat_map(|r| &r.occurrences)
        .map(|o| normalize_page(&o.page))
        .collect::<HashSet<_>>()
        .len()
}

/// Rounded percentage, half up. A zero denominator yields `0`.
#[must_use]
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let rounded = (part * 100 + whole / 2) / whole;
    u32::try_from(rounded).unwrap_or(u32::MAX)
}
