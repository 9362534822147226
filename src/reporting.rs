// src/reporting.rs
//! Terminal summaries of a run and of a site's trend.

use crate::aggregate::CatalogSummary;
use crate::engine::{Analysis, RunReport};
use crate::site::SiteId;
use crate::types::{AggregatedRule, HistoryPoint, Impact};
use anyhow::Result;
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// Prints any report as pretty JSON on stdout.
///
/// # Errors
/// Returns error if serialization fails.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the run summary. The fix-first list appears only once at least
/// `priority_min_rules` rules are active.
pub fn print_run(analysis: &Analysis, location: &str, priority_min_rules: usize) {
    let report = &analysis.report;

    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!("{}", " ACCESSIBILITY AUDIT".bold());
    println!("{}", "─".repeat(60).dimmed());
    println!();

    print_stats(report);
    print_diff(analysis);

    if !report.rules.is_empty() {
        println!();
        print_catalog(report, &analysis.catalog_summary);
    }

    if report.rules.len() >= priority_min_rules && !report.priority_rules.is_empty() {
        println!();
        print_priorities(report);
    }

    if !report.fully_resolved_rules.is_empty() {
        println!();
        print_resolved(report);
    }

    println!();
    println!("  {} {}", "Snapshot:".white(), location.dimmed());
    println!("{}", "─".repeat(60).dimmed());
}

fn print_stats(report: &RunReport) {
    let systemic = report.rules.iter().filter(|r| r.is_systemic).count();

    println!("  {} {}", "Pages Audited:".white(), report.pages_audited);
    println!("  {} {}", "Rules Violated:".white(), report.rules.len());
    println!("  {} {}", "Occurrences:".white(), report.occurrence_count());
    if systemic > 0 {
        println!(
            "  {} {}",
            "Systemic:".white(),
            pluralize(systemic, "rule on every page", "rules on every page").yellow()
        );
    }
}

fn print_diff(analysis: &Analysis) {
    let report = &analysis.report;
    let totals = report.diff_totals;
    if !analysis.has_baseline {
        println!(
            "  {} {}",
            "Changes:".white(),
            "first run, recorded as baseline".dimmed()
        );
        return;
    }

    let new = format!("+{} new", totals.new);
    let new = if totals.new > 0 { new.red().bold() } else { new.green() };
    let gone = report.gone_total();
    let resolved = if gone > 0 {
        format!("-{} resolved ({gone} from fully resolved rules)", report.resolved_total())
    } else {
        format!("-{} resolved", totals.resolved)
    };
    println!(
        "  {} {}  {}  {}",
        "Changes:".white(),
        new,
        resolved.green(),
        format!("={} unchanged", totals.unchanged).dimmed()
    );
}

fn print_catalog(report: &RunReport, summary: &CatalogSummary) {
    println!("{}", " TOP RULES".bold());
    let leading = report
        .rules
        .iter()
        .filter(|r| summary.top_rule_ids.contains(&r.id));

    for rule in leading {
        print_rule_line(rule, report.pages_audited);
    }
    println!(
        "  {} {}% of occurrences, {}% of pages",
        "Coverage:".white(),
        summary.percent_of_occurrences,
        summary.percent_of_pages
    );
}

fn print_rule_line(rule: &AggregatedRule, pages_audited: usize) {
    let mut marks = Vec::new();
    if rule.is_systemic {
        marks.push("systemic".yellow().to_string());
    }
    if rule.is_new_rule {
        marks.push("new rule".red().to_string());
    } else if rule.diff.new > 0 {
        marks.push(format!("+{}", rule.diff.new).red().to_string());
    }

    println!(
        "  {:<10} {:<28} {:>4} × on {}/{} pages {}",
        impact_label(rule.impact),
        rule.id,
        rule.occurrence_count(),
        rule.pages_affected,
        pages_audited,
        marks.join(" ")
    );
}

fn print_priorities(report: &RunReport) {
    println!("{}", " FIX FIRST".bold());
    for (i, rule) in report.priority_rules.iter().enumerate() {
        println!(
            "  {}. {} {} {}",
            i + 1,
            impact_label(rule.impact),
            rule.display_name(),
            format!("(score {})", rule.priority_score).dimmed()
        );
    }
    let summary = report.priority_summary;
    println!(
        "  {} {}% of violations across {}% of pages",
        "Leverage:".white(),
        summary.percent_of_violations,
        summary.percent_of_pages
    );
}

fn print_resolved(report: &RunReport) {
    println!("{}", " FULLY RESOLVED".bold().green());
    for rule in &report.fully_resolved_rules {
        println!(
            "  {} {} {}",
            "✓".green(),
            if rule.help.is_empty() { &rule.id } else { &rule.help },
            format!("({}, {} fixed)", rule.impact, rule.resolved).dimmed()
        );
    }
}

/// Prints a site's trend, oldest first, with the change against the previous
/// point.
pub fn print_trend(site: &SiteId, points: &[HistoryPoint]) {
    println!();
    println!("{} {}", " TREND".bold(), site.slug().dimmed());
    if points.is_empty() {
        println!("  {}", "No snapshots recorded for this site.".dimmed());
        return;
    }

    let mut previous: Option<&HistoryPoint> = None;
    for point in points {
        let delta = previous.map_or_else(String::new, |p| format_delta(point, p));
        println!(
            "  {}  {:>6} violations  {:>9} penalty  {:>4} pages  {}",
            point.date,
            point.violation_count,
            point.total_penalty,
            point.page_count,
            delta
        );
        previous = Some(point);
    }
}

fn format_delta(current: &HistoryPoint, previous: &HistoryPoint) -> String {
    match current.violation_count.cmp(&previous.violation_count) {
        std::cmp::Ordering::Greater => {
            format!("▲ {}", current.violation_count - previous.violation_count)
                .red()
                .to_string()
        }
        std::cmp::Ordering::Less => {
            format!("▼ {}", previous.violation_count - current.violation_count)
                .green()
                .to_string()
        }
        std::cmp::Ordering::Equal => "=".dimmed().to_string(),
    }
}

fn impact_label(impact: Impact) -> ColoredString {
    let label = impact.as_str();
    match impact {
        Impact::Critical => label.red().bold(),
        Impact::Serious => label.red(),
        Impact::Moderate => label.yellow(),
        Impact::Minor => label.blue(),
        Impact::Unknown => label.dimmed(),
    }
}

fn pluralize(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}
