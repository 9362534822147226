// tests/integration_history.rs
use a11ytrend_core::engine::{self, Baseline, RunOptions};
use a11ytrend_core::history::HistoryIndex;
use a11ytrend_core::store::{FileSnapshotStore, FsStorage, MemoryStorage, Storage};
use a11ytrend_core::types::ScanRecord;
use a11ytrend_core::SiteId;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use std::fs;
use std::path::Path;

/// A processed snapshot holding `count` minor occurrences.
fn snapshot_json(count: usize, epoch_day: i64) -> String {
    let ts = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(epoch_day);
    let occurrences: Vec<_> = (0..count)
        .map(|i| json!({"page": "https://a.test/", "html": "", "targetPath": [format!("li:nth-child({i})")]}))
        .collect();
    json!({
        "site": "a-test",
        "timestamp": ts,
        "pagesAudited": 1,
        "rules": [{"id": "listitem", "impact": "minor", "occurrences": occurrences}],
        "diffTotals": {"new": 0, "resolved": 0, "unchanged": count}
    })
    .to_string()
}

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn test_trend_is_chronological_regardless_of_names() {
    let dir = tempfile::tempdir().unwrap();
    // Names sort opposite to creation order.
    write(dir.path(), "a-test_c.json", &snapshot_json(10, 0));
    write(dir.path(), "a-test_b.json", &snapshot_json(7, 1));
    write(dir.path(), "a-test_a.json", &snapshot_json(4, 2));

    let site = SiteId::parse("https://a.test").unwrap();
    let points = HistoryIndex::new(&FsStorage, dir.path()).trend(&site);

    let counts: Vec<_> = points.iter().map(|p| p.violation_count).collect();
    assert_eq!(counts, vec![10, 7, 4]);
    assert_eq!(points[0].total_penalty, 100);
    assert_eq!(points[0].date, "2026-01-01 12:00");
    assert!(points.windows(2).all(|w| w[0].timestamp_epoch < w[1].timestamp_epoch));
}

#[test]
fn test_trend_keeps_latest_ten() {
    let dir = tempfile::tempdir().unwrap();
    for day in 0..12 {
        write(dir.path(), &format!("a_test_{day:02}.json"), &snapshot_json(day as usize + 1, day));
    }
    let site = SiteId::parse("a.test").unwrap();
    let points = HistoryIndex::new(&FsStorage, dir.path()).trend(&site);

    assert_eq!(points.len(), 10);
    assert_eq!(points[0].violation_count, 3);
    assert_eq!(points[9].violation_count, 12);

    let short = HistoryIndex::new(&FsStorage, dir.path()).with_limit(3).trend(&site);
    assert_eq!(short.iter().map(|p| p.violation_count).collect::<Vec<_>>(), vec![10, 11, 12]);
}

#[test]
fn test_legacy_and_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    let raw = json!([
        {"url": "https://a.test/", "violations": [
            {"id": "image-alt", "impact": "serious", "nodes": [{"html": "", "target": ["img"]}]}
        ]},
        {"url": "https://a.test/about", "violations": []}
    ]);
    write(dir.path(), "a-test_2025-12-31T08-00-00.json", &raw.to_string());
    write(dir.path(), "a-test_20260101T000000Z.json", "{ truncated");
    write(dir.path(), "a-test_undated.json", &raw.to_string());
    write(dir.path(), "a-test_20260102.csv", "url,count");
    write(dir.path(), "other-site_20260101T000000Z.json", &snapshot_json(3, 0));
    write(dir.path(), "beta-test_20260101T000000Z.json", &snapshot_json(8, 0));
    write(dir.path(), "a-test_latest.json", &snapshot_json(5, 3));

    let site = SiteId::parse("a.test").unwrap();
    let points = HistoryIndex::new(&FsStorage, dir.path()).trend(&site);

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].violation_count, 1);
    assert_eq!(points[0].total_penalty, 1_000);
    assert_eq!(points[0].page_count, 2);
    assert_eq!(points[0].date, "2025-12-31 08:00");
    assert_eq!(points[1].violation_count, 5);
}

#[test]
fn test_missing_directory_is_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let site = SiteId::parse("a.test").unwrap();
    let points = HistoryIndex::new(&FsStorage, dir.path().join("results")).trend(&site);
    assert!(points.is_empty());
}

#[test]
fn test_engine_runs_feed_history() {
    let store = FileSnapshotStore::new(MemoryStorage::new(), "results");
    let site = SiteId::parse("https://a.test").unwrap();
    let start = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

    for (day, count) in [5usize, 3, 1].into_iter().enumerate() {
        let nodes: Vec<_> = (0..count)
            .map(|i| json!({"html": "", "target": [format!("a:nth-of-type({i})")]}))
            .collect();
        let records: Vec<ScanRecord> = serde_json::from_value(json!([
            {"url": "https://a.test/", "violations": [{"id": "link-name", "impact": "serious", "nodes": nodes}]}
        ]))
        .unwrap();
        engine::run(
            &records,
            &site,
            &Baseline::Latest,
            &store,
            RunOptions::default(),
            start + Duration::days(day as i64),
        )
        .unwrap();
    }

    // The latest pointer lives in a subdirectory and is not listed.
    assert_eq!(store.storage().list(Path::new("results")).unwrap().len(), 3);

    let points = HistoryIndex::new(store.storage(), "results").trend(&site);
    let counts: Vec<_> = points.iter().map(|p| p.violation_count).collect();
    assert_eq!(counts, vec![5, 3, 1]);
    assert_eq!(points[2].total_penalty, 1_000);
}
