use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Value};

use chartlift_db::{append_table, open_memory, CellValue, Frame, CLEAN_TABLE, ENRICHED_TABLE};
use chartlift_pipeline::{
    enrich_tracks, BatchOutcome, CacheStore, MemoryCacheStore, PipelineConfig, TrackFetcher,
};

/// Fetcher that serves canned payloads and counts network calls.
/// Unknown keys get an empty payload, the same degradation a transport
/// failure produces.
struct ScriptedFetcher {
    responses: HashMap<(String, String), Value>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(responses: Vec<((&str, &str), Value)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|((a, t), v)| ((a.to_string(), t.to_string()), v))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TrackFetcher for ScriptedFetcher {
    async fn fetch(&self, artist: &str, track: &str) -> Value {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(&(artist.to_string(), track.to_string()))
            .cloned()
            .unwrap_or_else(|| json!({}))
    }
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        database: PathBuf::from(":memory:"),
        api_key: String::new(),
        api_url: "http://localhost/unused".to_string(),
        cache_dir: PathBuf::from("unused"),
        reports_dir: PathBuf::from("unused"),
        batch_size: 500,
        workers: 4,
        timeout_secs: 10,
        numeric_keywords: chartlift_pipeline::config::DEFAULT_NUMERIC_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .collect(),
    }
}

fn seed_clean_table(conn: &rusqlite::Connection, rows: &[(&str, &str, &str)]) {
    let mut frame = Frame::new(vec![
        "Artist".to_string(),
        "Track".to_string(),
        "Spotify Streams".to_string(),
    ]);
    for (artist, track, streams) in rows {
        frame.push_row(vec![
            CellValue::text(*artist),
            CellValue::text(*track),
            CellValue::text(*streams),
        ]);
    }
    append_table(conn, CLEAN_TABLE, &frame).unwrap();
}

fn daft_punk_payload() -> Value {
    json!({
        "track": {
            "duration": "203000",
            "listeners": "1264297",
            "playcount": "14052569",
            "album": {"title": "Discovery"},
            "wiki": {"published": "07 Jun 2008, 14:49"},
            "toptags": {"tag": [{"name": "house"}, {"name": "electronic"}]}
        }
    })
}

#[tokio::test]
async fn end_to_end_dedup_failure_and_success() {
    let conn = open_memory().unwrap();
    // One duplicate pair, one track whose fetch fails, one that succeeds.
    seed_clean_table(
        &conn,
        &[
            ("Daft Punk", "One More Time", "1,000"),
            ("Daft Punk", "One More Time", "1,000"),
            ("Air", "Ce Matin-La", "500"),
        ],
    );
    let cache = MemoryCacheStore::new();
    let fetcher = ScriptedFetcher::new(vec![(("Daft Punk", "One More Time"), daft_punk_payload())]);

    let report = enrich_tracks(&conn, &test_config(), &cache, &fetcher, |_| {})
        .await
        .unwrap();

    assert_eq!(report.candidates, 2);
    assert_eq!(report.persisted(), 2);
    assert_eq!(report.rows_dropped(), 0);
    assert_eq!(report.failed_tasks(), 0);
    assert!(report.all_persisted());
    // One call per unique pair; the duplicate never hit the network.
    assert_eq!(fetcher.calls(), 2);

    let enriched = chartlift_db::read_table(&conn, ENRICHED_TABLE).unwrap();
    assert_eq!(enriched.len(), 2);

    let artist_col = enriched.column_index("Artist").unwrap();
    let duration_col = enriched.column_index("duration_ms").unwrap();
    let album_col = enriched.column_index("album").unwrap();
    let streams_col = enriched.column_index("Spotify Streams").unwrap();

    for row in 0..enriched.len() {
        match enriched.cell(row, artist_col).as_text().unwrap() {
            "Daft Punk" => {
                assert_eq!(*enriched.cell(row, duration_col), CellValue::Integer(203000));
                assert_eq!(*enriched.cell(row, album_col), CellValue::text("Discovery"));
                assert_eq!(*enriched.cell(row, streams_col), CellValue::Integer(1000));
            }
            "Air" => {
                // Failed fetch degrades to sentinels: zeros for numerics,
                // null for text after sanitizing. The row is kept.
                assert_eq!(*enriched.cell(row, duration_col), CellValue::Integer(0));
                assert_eq!(*enriched.cell(row, album_col), CellValue::Null);
                assert_eq!(*enriched.cell(row, streams_col), CellValue::Integer(500));
            }
            other => panic!("unexpected artist {}", other),
        }
    }

    // Fully persisted run purges the cache.
    assert!(cache.is_empty());
}

#[tokio::test]
async fn cache_hit_short_circuits_the_network() {
    let conn = open_memory().unwrap();
    seed_clean_table(&conn, &[("Daft Punk", "One More Time", "1000")]);

    let cache = MemoryCacheStore::new();
    cache
        .put("Daft Punk", "One More Time", &daft_punk_payload())
        .unwrap();
    let fetcher = ScriptedFetcher::new(vec![]);

    let report = enrich_tracks(&conn, &test_config(), &cache, &fetcher, |_| {})
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(report.persisted(), 1);
}

#[tokio::test]
async fn batch_partitioning_covers_all_candidates() {
    let conn = open_memory().unwrap();
    seed_clean_table(
        &conn,
        &[
            ("a", "1", "1"),
            ("b", "2", "2"),
            ("c", "3", "3"),
            ("d", "4", "4"),
            ("e", "5", "5"),
        ],
    );
    let cache = MemoryCacheStore::new();
    let fetcher = ScriptedFetcher::new(vec![]);
    let cfg = PipelineConfig {
        batch_size: 2,
        ..test_config()
    };

    let mut outcomes: Vec<BatchOutcome> = Vec::new();
    let report = enrich_tracks(&conn, &cfg, &cache, &fetcher, |o| outcomes.push(o.clone()))
        .await
        .unwrap();

    // All batches are full size except possibly the last.
    let attempted: Vec<usize> = outcomes.iter().map(|o| o.attempted).collect();
    assert_eq!(attempted, vec![2, 2, 1]);
    assert_eq!(report.persisted(), 5);
    assert_eq!(chartlift_db::row_count(&conn, ENRICHED_TABLE).unwrap(), 5);
}

#[tokio::test]
async fn write_failure_is_recorded_and_run_continues() {
    let conn = open_memory().unwrap();
    seed_clean_table(&conn, &[("a", "1", "1"), ("b", "2", "2")]);

    // Pre-create the destination with an incompatible shape so every
    // batch write fails.
    let mut wrong = Frame::new(vec!["unrelated".to_string()]);
    wrong.push_row(vec![CellValue::Null]);
    append_table(&conn, ENRICHED_TABLE, &wrong).unwrap();

    let cache = MemoryCacheStore::new();
    cache.put("a", "1", &daft_punk_payload()).unwrap();
    let fetcher = ScriptedFetcher::new(vec![]);
    let cfg = PipelineConfig {
        batch_size: 1,
        ..test_config()
    };

    let report = enrich_tracks(&conn, &cfg, &cache, &fetcher, |_| {})
        .await
        .unwrap();

    assert_eq!(report.batches.len(), 2);
    assert!(report.batches.iter().all(|b| b.write_error.is_some()));
    assert_eq!(report.persisted(), 0);
    assert!(!report.all_persisted());
    // Failed runs keep the cache for the retry.
    assert_eq!(cache.len(), 1);
}
