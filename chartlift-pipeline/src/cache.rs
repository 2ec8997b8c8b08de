//! On-disk cache of raw Last.fm responses.
//!
//! One JSON file per (artist, track) pair. Presence of an entry means
//! the API was already queried for that key in some run; entries are
//! never invalidated automatically. The whole store is purged only after
//! a fully persisted enrichment run, so a failed run keeps its partial
//! cache and a retry skips the network for everything already fetched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::PipelineError;

/// Key-value store of raw API responses keyed by (artist, track).
///
/// The orchestrator only depends on this trait, so the filesystem store
/// can be swapped for an embedded KV store without touching it. Workers
/// within a batch share one store; keys are disjoint after
/// deduplication, so per-key writes need no coordination.
pub trait CacheStore: Sync {
    fn get(&self, artist: &str, track: &str) -> Result<Option<Value>, PipelineError>;
    fn put(&self, artist: &str, track: &str, payload: &Value) -> Result<(), PipelineError>;
    /// Remove every entry.
    fn purge(&self) -> Result<(), PipelineError>;
}

/// Filesystem-backed cache store.
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, artist: &str, track: &str) -> PathBuf {
        self.root.join(format!(
            "{}__{}.json",
            sanitize_key(artist),
            sanitize_key(track)
        ))
    }

    /// Entry count and total size in bytes, for cache maintenance output.
    pub fn stats(&self) -> Result<(usize, u64), PipelineError> {
        let mut count = 0usize;
        let mut bytes = 0u64;
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().extension().is_some_and(|e| e == "json") {
                count += 1;
                bytes += entry.metadata()?.len();
            }
        }
        Ok((count, bytes))
    }
}

/// Deterministic, filesystem-safe encoding of one key component.
fn sanitize_key(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            other => other,
        })
        .collect()
}

impl CacheStore for FsCacheStore {
    fn get(&self, artist: &str, track: &str) -> Result<Option<Value>, PipelineError> {
        let path = self.entry_path(artist, track);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PipelineError::Cache {
                    artist: artist.to_string(),
                    track: track.to_string(),
                    message: e.to_string(),
                })
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // A truncated entry (e.g. from a killed run) is a miss,
                // not a fatal error; the fetch will rewrite it.
                log::warn!(
                    "Discarding corrupt cache entry {}: {}",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn put(&self, artist: &str, track: &str, payload: &Value) -> Result<(), PipelineError> {
        let path = self.entry_path(artist, track);
        let content = serde_json::to_string_pretty(payload)?;
        std::fs::write(&path, content).map_err(|e| PipelineError::Cache {
            artist: artist.to_string(),
            track: track.to_string(),
            message: e.to_string(),
        })
    }

    fn purge(&self) -> Result<(), PipelineError> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// In-memory cache store for tests and tooling.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, artist: &str, track: &str) -> Result<Option<Value>, PipelineError> {
        Ok(self
            .entries
            .lock()
            .expect("cache mutex poisoned")
            .get(&(artist.to_string(), track.to_string()))
            .cloned())
    }

    fn put(&self, artist: &str, track: &str, payload: &Value) -> Result<(), PipelineError> {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .insert((artist.to_string(), track.to_string()), payload.clone());
        Ok(())
    }

    fn purge(&self) -> Result<(), PipelineError> {
        self.entries.lock().expect("cache mutex poisoned").clear();
        Ok(())
    }
}
