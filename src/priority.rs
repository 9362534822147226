// src/priority.rs
//! Fix-first ranking.
//!
//! Severity dominates the score and page reach breaks ties inside a tier, so a
//! critical rule on one page still outranks a serious rule on every page.

use crate::aggregate::{occurrences_in, pages_touched, percent};
use crate::types::AggregatedRule;
use serde::Serialize;

pub const DEFAULT_PRIORITY_TOP: usize = 5;

/// Leverage of the selected priority rules over the whole audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritySummary {
    pub percent_of_violations: u32,
    pub percent_of_pages: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Prioritization {
    /// Input rules, same order, with `priority_score` filled in.
    pub rules: Vec<AggregatedRule>,
    /// The `top` highest scoring rules, best first.
    pub priority_rules: Vec<AggregatedRule>,
    pub summary: PrioritySummary,
}

#[must_use]
pub fn priority_score(rule: &AggregatedRule) -> u64 {
    let reach = u64::try_from(rule.pages_affected).unwrap_or(u64::MAX);
    rule.impact.weight().saturating_add(reach)
}

/// Scores every rule and selects the `top` to fix first.
///
/// Scores are computed regardless of how many rules there are; whether a short
/// list is worth showing is the caller's decision.
#[must_use]
pub fn rank(rules: &[AggregatedRule], pages_audited: usize, top: usize) -> Prioritization {
    let scored: Vec<AggregatedRule> = rules
        .iter()
        .map(|r| AggregatedRule {
            priority_score: priority_score(r),
            ..r.clone()
        })
        .collect();

    // Stable: equal scores keep catalog order.
    let mut by_score: Vec<&AggregatedRule> = scored.iter().collect();
    by_score.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    let priority_rules: Vec<AggregatedRule> = by_score.into_iter().take(top).cloned().collect();

    let summary = PrioritySummary {
        percent_of_violations: percent(occurrences_in(&priority_rules), occurrences_in(&scored)),
        percent_of_pages: percent(pages_touched(&priority_rules), pages_audited),
    };

    Prioritization {
        rules: scored,
        priority_rules,
        summary,
    }
}
