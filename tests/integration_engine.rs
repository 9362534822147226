// tests/integration_engine.rs
use a11ytrend_core::engine::{self, Baseline, RunOptions};
use a11ytrend_core::store::{FileSnapshotStore, MemoryStorage, SnapshotStore};
use a11ytrend_core::types::{DiffTotals, Impact, ScanRecord, Snapshot};
use a11ytrend_core::SiteId;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

fn records(value: serde_json::Value) -> Vec<ScanRecord> {
    serde_json::from_value(value).unwrap()
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
}

fn first_scan() -> Vec<ScanRecord> {
    records(json!([
        {"url": "https://shop.test/", "violations": [
            {"id": "image-alt", "impact": "critical", "help": "Images must have alternate text",
             "tags": ["wcag2a", "wcag111"],
             "nodes": [{"html": "<img src=a>", "target": ["main", "img.a"]},
                       {"html": "<img src=b>", "target": ["main", "img.b"]}]},
            {"id": "region", "impact": "moderate", "nodes": [{"html": "<div>", "target": ["div.banner"]}]}
        ]},
        {"url": "https://shop.test/cart", "violations": [
            {"id": "region", "impact": "moderate", "nodes": [{"html": "<div>", "target": ["div.banner"]}]},
            {"id": "color-contrast", "impact": "serious", "help": "Elements must meet minimum color contrast",
             "nodes": [{"html": "<p>", "target": "footer > p"}]}
        ]}
    ]))
}

fn second_scan() -> Vec<ScanRecord> {
    records(json!([
        {"url": "https://shop.test/", "violations": [
            {"id": "image-alt", "impact": "critical",
             "nodes": [{"html": "<img   src=a >", "target": "main > img.a"}]},
            {"id": "region", "impact": "moderate", "nodes": [{"html": "<div>", "target": ["div.banner"]}]}
        ]},
        {"url": "https://shop.test/cart/", "violations": [
            {"id": "region", "impact": "moderate", "nodes": [{"html": "<div>", "target": ["div.banner"]}]}
        ]},
        {"url": "https://shop.test/checkout", "violations": [
            {"id": "image-alt", "impact": "critical", "nodes": [{"html": "<img>", "target": ["img.logo"]}]},
            {"id": "region", "impact": "moderate", "nodes": [{"html": "<div>", "target": ["div.banner"]}]},
            {"id": "label", "impact": "critical", "nodes": [{"html": "<input>", "target": ["#email"]}]}
        ]}
    ]))
}

fn assert_totals_consistent(snapshot: &Snapshot) {
    let mut summed = DiffTotals::default();
    for rule in &snapshot.rules {
        summed.absorb(&rule.diff);
    }
    assert_eq!(summed, snapshot.diff_totals);
}

#[test]
fn test_first_run_records_baseline() {
    let store = FileSnapshotStore::new(MemoryStorage::new(), "results");
    let site = SiteId::parse("https://shop.test").unwrap();

    let outcome = engine::run(&first_scan(), &site, &Baseline::Latest, &store, RunOptions::default(), t0()).unwrap();
    let report = &outcome.analysis.report;

    assert!(!outcome.analysis.has_baseline);
    assert_eq!(report.diff_totals, DiffTotals { new: 0, resolved: 0, unchanged: 5 });
    assert!(report.rules.iter().all(|r| !r.is_new_rule));
    assert_eq!(report.pages_audited, 2);

    let ids: Vec<_> = report.rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["image-alt", "color-contrast", "region"]);

    let region = report.rules.iter().find(|r| r.id == "region").unwrap();
    assert!(region.is_systemic);
    assert_eq!(region.priority_score, 102);

    assert_eq!(store.get(&site), Some(outcome.snapshot.clone()));
    assert_totals_consistent(&outcome.snapshot);
}

#[test]
fn test_second_run_classifies_changes() {
    let store = FileSnapshotStore::new(MemoryStorage::new(), "results");
    let site = SiteId::parse("https://shop.test").unwrap();

    engine::run(&first_scan(), &site, &Baseline::Latest, &store, RunOptions::default(), t0()).unwrap();
    let outcome = engine::run(
        &second_scan(),
        &site,
        &Baseline::Latest,
        &store,
        RunOptions::default(),
        t0() + Duration::days(1),
    )
    .unwrap();
    let report = &outcome.analysis.report;

    let image_alt = report.rules.iter().find(|r| r.id == "image-alt").unwrap();
    assert_eq!((image_alt.diff.new, image_alt.diff.resolved, image_alt.diff.unchanged), (1, 1, 1));
    assert_eq!(
        image_alt.diff.new_pages.iter().collect::<Vec<_>>(),
        vec!["https://shop.test/checkout"]
    );

    let region = report.rules.iter().find(|r| r.id == "region").unwrap();
    assert_eq!((region.diff.new, region.diff.resolved, region.diff.unchanged), (1, 0, 2));

    let label = report.rules.iter().find(|r| r.id == "label").unwrap();
    assert!(label.is_new_rule);

    assert_eq!(report.fully_resolved_rules.len(), 1);
    assert_eq!(report.fully_resolved_rules[0].id, "color-contrast");
    assert_eq!(report.fully_resolved_rules[0].impact, Impact::Serious);
    assert_eq!(report.fully_resolved_rules[0].help, "Elements must meet minimum color contrast");

    assert_eq!(report.diff_totals, DiffTotals { new: 3, resolved: 1, unchanged: 3 });
    assert_eq!(report.gone_total(), 1);
    assert_eq!(report.resolved_total(), 2);
    assert_totals_consistent(&outcome.snapshot);

    assert_eq!(report.priority_rules[0].id, "image-alt");
    assert_eq!(report.priority_rules[1].id, "label");
}

#[test]
fn test_clean_run_counts_every_fix() {
    let store = FileSnapshotStore::new(MemoryStorage::new(), "results");
    let site = SiteId::parse("shop.test").unwrap();
    engine::run(&first_scan(), &site, &Baseline::Latest, &store, RunOptions::default(), t0()).unwrap();

    let clean = records(json!([
        {"url": "https://shop.test/", "violations": []},
        {"url": "https://shop.test/cart", "violations": []}
    ]));
    let outcome = engine::run(&clean, &site, &Baseline::Latest, &store, RunOptions::default(), t0() + Duration::days(1)).unwrap();
    let report = &outcome.analysis.report;

    assert!(report.rules.is_empty());
    assert_eq!(report.diff_totals, DiffTotals::default());
    assert_eq!(report.fully_resolved_rules.len(), 3);
    assert_eq!(report.resolved_total(), 5);
}

#[test]
fn test_rerun_against_same_baseline_is_idempotent() {
    let store = FileSnapshotStore::new(MemoryStorage::new(), "results");
    let site = SiteId::parse("shop.test").unwrap();
    let first = engine::run(&first_scan(), &site, &Baseline::Latest, &store, RunOptions::default(), t0()).unwrap();
    let baseline = Baseline::Named(
        first
            .location
            .trim_start_matches("results/")
            .to_string(),
    );

    let a = engine::run(&first_scan(), &site, &baseline, &store, RunOptions::default(), t0() + Duration::hours(1)).unwrap();
    let b = engine::run(&first_scan(), &site, &baseline, &store, RunOptions::default(), t0() + Duration::hours(2)).unwrap();

    assert_eq!(a.analysis.report.rules, b.analysis.report.rules);
    assert_eq!(a.analysis.report.diff_totals, DiffTotals { new: 0, resolved: 0, unchanged: 5 });
    assert!(a.analysis.report.fully_resolved_rules.is_empty());
}

#[test]
fn test_missing_named_baseline_is_first_run() {
    let store = FileSnapshotStore::new(MemoryStorage::new(), "results");
    let site = SiteId::parse("shop.test").unwrap();
    let outcome = engine::run(
        &first_scan(),
        &site,
        &Baseline::Named("nope.json".to_string()),
        &store,
        RunOptions::default(),
        t0(),
    )
    .unwrap();
    assert!(!outcome.analysis.has_baseline);
    assert_eq!(outcome.analysis.report.diff_totals.new, 0);
}

#[test]
fn test_report_matches_renderer_contract() {
    let analysis = engine::analyze(&first_scan(), None, RunOptions::default());
    let value = serde_json::to_value(&analysis.report).unwrap();
    let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "diffTotals",
            "fullyResolvedRules",
            "pagesAudited",
            "priorityRules",
            "prioritySummary",
            "rules"
        ]
    );

    let rule = &value["rules"][0];
    assert_eq!(rule["id"], "image-alt");
    assert_eq!(rule["isSystemic"], false);
    assert_eq!(rule["occurrences"][0]["targetPath"], json!(["main", "img.a"]));
    assert_eq!(rule["diff"]["newPages"], json!([]));
}

#[test]
fn test_snapshot_round_trips_through_store() {
    let store = FileSnapshotStore::new(MemoryStorage::new(), "results");
    let site = SiteId::parse("shop.test").unwrap();
    let outcome = engine::run(&second_scan(), &site, &Baseline::Latest, &store, RunOptions::default(), t0()).unwrap();

    let stored = store.get(&site).unwrap();
    assert_eq!(stored, outcome.snapshot);
    assert_eq!(stored.site, "shop-test");
    assert_eq!(stored.pages_audited, 3);
}
