//! Batch enrichment pipeline for music chart data.
//!
//! Stages: extract a raw chart table, clean it, enrich each
//! (artist, track) pair via the Last.fm API (concurrent within a batch,
//! cached on disk, best-effort), then sanitize, validate and publish a
//! curated table. Enrichment appends batch by batch and validation
//! deduplicates; a failed batch never stops the ones after it.

pub mod cache;
pub mod client;
pub mod config;
pub mod enrich;
pub mod error;
pub mod sanitize;
pub mod stages;
pub mod track_info;

pub use cache::{CacheStore, FsCacheStore, MemoryCacheStore};
pub use client::{LastfmClient, TrackFetcher};
pub use config::{config_path, PipelineConfig};
pub use enrich::{enrich_tracks, BatchOutcome, RunReport};
pub use error::PipelineError;
pub use sanitize::{sanitize_batch, SanitizeRules, SanitizedBatch};
pub use track_info::{safe_int, TrackInfo, UNKNOWN};
