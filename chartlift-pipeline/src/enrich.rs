//! The batch enrichment orchestrator.
//!
//! Loads the clean table once, deduplicates by (artist, track), then
//! walks the candidates in fixed-size batches. Within a batch one
//! fetch task per record runs on a bounded `buffer_unordered` pool;
//! the orchestrator barriers on the whole batch before sanitizing and
//! persisting it. Batches that fail to persist are recorded in the
//! run report and the run continues.
//!
//! All database access stays on the calling thread; the async portion
//! only produces rows (`Connection` is `!Send`).

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use rusqlite::Connection;
use serde_json::Value;

use chartlift_db::{read_table, CellValue, Frame, CLEAN_TABLE};

use crate::cache::CacheStore;
use crate::client::TrackFetcher;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::sanitize::{persist_batch, sanitize_batch, SanitizeRules};
use crate::track_info::TrackInfo;

/// Outcome of one batch, success or not.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Zero-based batch index.
    pub index: usize,
    /// Candidates dispatched in this batch.
    pub attempted: usize,
    /// Rows that came back from the fetch pool.
    pub enriched: usize,
    /// Tasks that failed outright (cache read errors).
    pub failed_tasks: usize,
    /// Rows the sanitizer dropped for irreducible numeric text.
    pub rows_dropped: usize,
    /// Rows written to the destination table.
    pub persisted: usize,
    /// Destination write error, if the batch failed to persist.
    pub write_error: Option<String>,
}

/// Aggregated result of an enrichment run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Deduplicated candidates considered by the run.
    pub candidates: usize,
    pub batches: Vec<BatchOutcome>,
}

impl RunReport {
    pub fn persisted(&self) -> usize {
        self.batches.iter().map(|b| b.persisted).sum()
    }

    pub fn rows_dropped(&self) -> usize {
        self.batches.iter().map(|b| b.rows_dropped).sum()
    }

    pub fn failed_tasks(&self) -> usize {
        self.batches.iter().map(|b| b.failed_tasks).sum()
    }

    /// Whether every batch reached the destination table.
    pub fn all_persisted(&self) -> bool {
        self.batches.iter().all(|b| b.write_error.is_none())
    }
}

/// Drop rows with a missing artist or track and deduplicate by the
/// (artist, track) pair, first occurrence winning. Idempotent.
pub fn dedup_candidates(frame: &Frame) -> Result<Frame, PipelineError> {
    let artist_idx = frame
        .column_index("Artist")
        .ok_or(PipelineError::MissingKeyColumn("Artist"))?;
    let track_idx = frame
        .column_index("Track")
        .ok_or(PipelineError::MissingKeyColumn("Track"))?;

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Frame::new(frame.columns().to_vec());
    for row in frame.rows() {
        let (Some(artist), Some(track)) = (row[artist_idx].as_text(), row[track_idx].as_text())
        else {
            continue;
        };
        if artist.is_empty() || track.is_empty() {
            continue;
        }
        if seen.insert((artist.to_string(), track.to_string())) {
            out.push_row(row.clone());
        }
    }
    Ok(out)
}

/// Destination columns: source columns first, then the enrichment
/// columns that are not already present. The returned mapping gives the
/// destination index of each enrichment field; enrichment overwrites a
/// same-named source column in place.
fn merged_columns(source: &[String]) -> (Vec<String>, [usize; 6]) {
    let mut columns = source.to_vec();
    let mut mapping = [0usize; 6];
    for (i, name) in TrackInfo::COLUMNS.iter().enumerate() {
        mapping[i] = match columns.iter().position(|c| c == name) {
            Some(existing) => existing,
            None => {
                columns.push(name.to_string());
                columns.len() - 1
            }
        };
    }
    (columns, mapping)
}

/// Payloads with no content are never cached, so a transient outage
/// cannot poison the cache with permanent empties.
fn is_empty_payload(payload: &Value) -> bool {
    payload.as_object().map_or(true, |o| o.is_empty())
}

/// Enrich one candidate: cache-lookup-or-fetch, parse, merge.
///
/// A failed fetch is not a failed task; it degrades to an all-sentinel
/// row. Only a cache read error fails the task.
async fn enrich_candidate<F: TrackFetcher>(
    row: &[CellValue],
    artist_idx: usize,
    track_idx: usize,
    cache: &dyn CacheStore,
    fetcher: &F,
    mapping: &[usize; 6],
    width: usize,
) -> Result<Vec<CellValue>, PipelineError> {
    // Guaranteed text by deduplication.
    let artist = row[artist_idx].as_text().unwrap_or_default();
    let track = row[track_idx].as_text().unwrap_or_default();
    log::info!("Processing: {} - {}", artist, track);

    let payload = match cache.get(artist, track)? {
        Some(cached) => cached,
        None => {
            let fetched = fetcher.fetch(artist, track).await;
            if !is_empty_payload(&fetched) {
                if let Err(e) = cache.put(artist, track, &fetched) {
                    log::warn!("Failed to cache response for {} - {}: {}", artist, track, e);
                }
            }
            fetched
        }
    };

    let info = TrackInfo::from_payload(&payload);
    let mut out = Vec::with_capacity(width);
    out.extend_from_slice(row);
    out.resize(width, CellValue::Null);
    for (cell, &dest) in info.cells().into_iter().zip(mapping.iter()) {
        out[dest] = cell;
    }
    Ok(out)
}

/// Run the enrichment stage end to end.
///
/// `progress` is invoked after each batch with its outcome. The cache is
/// purged only when every batch persisted, so a failed run keeps its
/// partial cache and a retry skips the network for fetched keys.
pub async fn enrich_tracks<F: TrackFetcher>(
    conn: &Connection,
    cfg: &PipelineConfig,
    cache: &dyn CacheStore,
    fetcher: &F,
    mut progress: impl FnMut(&BatchOutcome),
) -> Result<RunReport, PipelineError> {
    let source = read_table(conn, CLEAN_TABLE)?;
    let candidates = dedup_candidates(&source)?;
    let artist_idx = candidates
        .column_index("Artist")
        .ok_or(PipelineError::MissingKeyColumn("Artist"))?;
    let track_idx = candidates
        .column_index("Track")
        .ok_or(PipelineError::MissingKeyColumn("Track"))?;

    let (columns, mapping) = merged_columns(candidates.columns());
    let rules = SanitizeRules::from_config(cfg);
    let total = candidates.len();
    let batch_size = cfg.batch_size.max(1);
    log::info!("Enriching {} track(s) in batches of {}", total, batch_size);

    let rows = candidates.into_rows();
    let mut report = RunReport {
        candidates: total,
        batches: Vec::new(),
    };

    for (index, chunk) in rows.chunks(batch_size).enumerate() {
        let start = index * batch_size;
        let end = start + chunk.len();

        let results: Vec<Result<Vec<CellValue>, PipelineError>> = stream::iter(chunk.iter())
            .map(|row| {
                enrich_candidate(
                    row,
                    artist_idx,
                    track_idx,
                    cache,
                    fetcher,
                    &mapping,
                    columns.len(),
                )
            })
            .buffer_unordered(cfg.workers.max(1))
            .collect()
            .await;

        let mut batch = Frame::new(columns.clone());
        let mut failed_tasks = 0usize;
        for result in results {
            match result {
                Ok(row) => batch.push_row(row),
                Err(e) => {
                    failed_tasks += 1;
                    log::warn!("Enrichment task failed: {}", e);
                }
            }
        }
        let enriched = batch.len();

        let sanitized = sanitize_batch(batch, &rules);
        let ready = sanitized.frame.len();
        let write_error = if ready == 0 {
            None
        } else {
            match persist_batch(conn, &sanitized.frame) {
                Ok(()) => {
                    log::info!("Saved batch {}: {}/{} candidates processed", index + 1, end, total);
                    None
                }
                Err(e) => {
                    log::error!(
                        "Failed to persist batch {} (candidates {}..{} of {}): {}",
                        index + 1,
                        start,
                        end,
                        total,
                        e
                    );
                    Some(e.to_string())
                }
            }
        };

        let outcome = BatchOutcome {
            index,
            attempted: chunk.len(),
            enriched,
            failed_tasks,
            rows_dropped: sanitized.rows_dropped,
            persisted: if write_error.is_none() { ready } else { 0 },
            write_error,
        };
        progress(&outcome);
        report.batches.push(outcome);
    }

    if report.all_persisted() {
        cache.purge()?;
        log::info!(
            "Enrichment complete: {} row(s) persisted, {} dropped, cache purged",
            report.persisted(),
            report.rows_dropped()
        );
    } else {
        log::warn!("One or more batches failed to persist; keeping cache for retry");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate_frame(pairs: &[(&str, &str)]) -> Frame {
        let mut frame = Frame::new(vec!["Artist".to_string(), "Track".to_string()]);
        for (artist, track) in pairs {
            frame.push_row(vec![CellValue::text(*artist), CellValue::text(*track)]);
        }
        frame
    }

    #[test]
    fn dedup_drops_repeats_and_missing_keys() {
        let mut frame = candidate_frame(&[
            ("Daft Punk", "One More Time"),
            ("Daft Punk", "One More Time"),
            ("Air", "La Femme d'Argent"),
        ]);
        frame.push_row(vec![CellValue::Null, CellValue::text("orphan")]);
        frame.push_row(vec![CellValue::text(""), CellValue::text("empty artist")]);

        let deduped = dedup_candidates(&frame).unwrap();
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn dedup_is_idempotent() {
        let frame = candidate_frame(&[
            ("a", "1"),
            ("a", "1"),
            ("b", "2"),
            ("a", "2"),
        ]);
        let once = dedup_candidates(&frame).unwrap();
        let twice = dedup_candidates(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn dedup_requires_key_columns() {
        let frame = Frame::new(vec!["Artist".to_string()]);
        let err = dedup_candidates(&frame).unwrap_err();
        assert!(matches!(err, PipelineError::MissingKeyColumn("Track")));
    }

    #[test]
    fn merged_columns_appends_new_and_reuses_existing() {
        let source = vec!["Artist".to_string(), "tags".to_string()];
        let (columns, mapping) = merged_columns(&source);

        // "tags" is overwritten in place, the other five append.
        assert_eq!(columns.len(), 7);
        assert_eq!(columns[0], "Artist");
        assert_eq!(columns[1], "tags");
        assert_eq!(mapping[5], 1);
        assert_eq!(columns[2], "duration_ms");
        assert_eq!(mapping[0], 2);
    }
}
