// src/diff.rs
//! Run-over-run classification of rule occurrences.
//!
//! Every occurrence is identified by its page, rule id and selector path (see
//! [`occurrence_key`]). The captured HTML snippet is not part of the identity:
//! attribute reordering or whitespace in the markup never shows up as a
//! resolved/new pair.

use crate::types::{AggregatedRule, DiffTotals, ResolvedRule, RuleDiff, Snapshot, TargetPath};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Strips the fragment, then one trailing slash.
#[must_use]
pub fn normalize_page(page: &str) -> &str {
    let page = page.split_once('#').map_or(page, |(base, _)| base);
    page.strip_suffix('/').unwrap_or(page)
}

/// Identity of one occurrence: `page|rule|selector>path`.
#[must_use]
pub fn occurrence_key(page: &str, rule_id: &str, target: &TargetPath) -> String {
    format!("{}|{rule_id}|{}", normalize_page(page), target.canonical())
}

/// Current rules with diff data attached, plus what the baseline lost.
#[derive(Debug, Clone, Default)]
pub struct DiffOutcome {
    pub rules: Vec<AggregatedRule>,
    /// Sum of every rule's `diff` in `rules`.
    pub totals: DiffTotals,
    /// Baseline rules with no occurrence left in the current run.
    pub fully_resolved: Vec<ResolvedRule>,
    pub has_baseline: bool,
}

#[derive(Default)]
struct PriorRule<'a> {
    keys: HashSet<String>,
    pages: HashSet<&'a str>,
}

/// Classifies `current` against the previous snapshot of the same site.
///
/// Without a previous snapshot every occurrence is baseline: nothing is new
/// and nothing is resolved. The inputs are never modified.
#[must_use]
pub fn diff(current: &[AggregatedRule], previous: Option<&Snapshot>) -> DiffOutcome {
    let Some(previous) = previous else {
        return first_run(current);
    };

    let prior = index_previous(previous);
    let mut totals = DiffTotals::default();
    let rules: Vec<AggregatedRule> = current
        .iter()
        .map(|rule| {
            let annotated = annotate(rule, prior.get(rule.id.as_str()));
            totals.absorb(&annotated.diff);
            annotated
        })
        .collect();

    let fully_resolved = fully_resolved(current, &prior, previous);
    debug!(
        new = totals.new,
        resolved = totals.resolved,
        unchanged = totals.unchanged,
        gone = fully_resolved.len(),
        "diffed against baseline"
    );

    DiffOutcome {
        rules,
        totals,
        fully_resolved,
        has_baseline: true,
    }
}

fn first_run(current: &[AggregatedRule]) -> DiffOutcome {
    let mut totals = DiffTotals::default();
    let rules = current
        .iter()
        .map(|rule| {
            let mut annotated = rule.clone();
            annotated.diff = RuleDiff {
                unchanged: current_keys(rule).len(),
                ..RuleDiff::default()
            };
            annotated.is_new_rule = false;
            for occurrence in &mut annotated.occurrences {
                occurrence.is_new_occurrence = false;
                occurrence.is_new_page = false;
            }
            totals.absorb(&annotated.diff);
            annotated
        })
        .collect();

    DiffOutcome {
        rules,
        totals,
        fully_resolved: Vec::new(),
        has_baseline: false,
    }
}

fn index_previous(previous: &Snapshot) -> HashMap<&str, PriorRule<'_>> {
    let mut prior: HashMap<&str, PriorRule<'_>> = HashMap::new();
    for rule in &previous.rules {
        let entry = prior.entry(rule.id.as_str()).or_default();
        for o in &rule.occurrences {
            entry.keys.insert(occurrence_key(&o.page, &rule.id, &o.target_path));
            entry.pages.insert(normalize_page(&o.page));
        }
    }
    prior
}

fn current_keys(rule: &AggregatedRule) -> HashSet<String> {
    rule.occurrences
        .iter()
        .map(|o| occurrence_key(&o.page, &rule.id, &o.target_path))
        .collect()
}

fn annotate(rule: &AggregatedRule, prior: Option<&PriorRule<'_>>) -> AggregatedRule {
    let empty = PriorRule::default();
    let before = prior.unwrap_or(&empty);
    let now = current_keys(rule);

    let mut seen_pages = HashSet::new();
    let new_pages: BTreeSet<String> = rule
        .occurrences
        .iter()
        .filter(|o| !before.pages.contains(normalize_page(&o.page)))
        .filter(|o| seen_pages.insert(normalize_page(&o.page)))
        .map(|o| o.page.clone())
        .collect();

    let mut annotated = rule.clone();
    for o in &mut annotated.occurrences {
        let key = occurrence_key(&o.page, &rule.id, &o.target_path);
        o.is_new_occurrence = !before.keys.contains(&key);
        o.is_new_page = !before.pages.contains(normalize_page(&o.page));
    }

    annotated.diff = RuleDiff {
        new: now.difference(&before.keys).count(),
        resolved: before.keys.difference(&now).count(),
        unchanged: now.intersection(&before.keys).count(),
        new_pages,
    };
    annotated.is_new_rule = prior.is_none();
    annotated
}

fn fully_resolved(
    current: &[AggregatedRule],
    prior: &HashMap<&str, PriorRule<'_>>,
    previous: &Snapshot,
) -> Vec<ResolvedRule> {
    let live: HashSet<&str> = current.iter().map(|r| r.id.as_str()).collect();
    let mut reported = HashSet::new();

    previous
        .rules
        .iter()
        .filter(|r| !live.contains(r.id.as_str()))
        .filter(|r| reported.insert(r.id.as_str()))
        .map(|r| ResolvedRule {
            id: r.id.clone(),
            impact: r.impact,
            help: r.display_name().to_string(),
            resolved: prior.get(r.id.as_str()).map_or(0, |p| p.keys.len()),
        })
        .collect()
}
