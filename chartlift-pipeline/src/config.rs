use std::path::PathBuf;

use crate::error::PipelineError;

/// Default batch size for the enrichment stage.
pub const DEFAULT_BATCH_SIZE: usize = 500;
/// Default width of the per-batch fetch pool.
pub const DEFAULT_WORKERS: usize = 10;
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default Last.fm API endpoint.
pub const DEFAULT_API_URL: &str = "http://ws.audioscrobbler.com/2.0/";

/// Column-name substrings that mark a column as numeric-like for the
/// sanitizer. Matching is case-insensitive.
pub const DEFAULT_NUMERIC_KEYWORDS: &[&str] = &[
    "stream",
    "count",
    "view",
    "rank",
    "score",
    "popularity",
    "spin",
    "post",
    "listener",
    "duration",
    "playcount",
];

/// Pipeline configuration, constructed once at process start and passed
/// by reference to each stage. No process-wide mutable state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to the SQLite database holding all stage tables.
    pub database: PathBuf,
    /// Last.fm API key. May be empty; requests then fail and enrichment
    /// degrades to sentinel values.
    pub api_key: String,
    /// Last.fm API endpoint.
    pub api_url: String,
    /// Root directory for cached API responses.
    pub cache_dir: PathBuf,
    /// Directory validation summaries are written to.
    pub reports_dir: PathBuf,
    /// Candidates per batch.
    pub batch_size: usize,
    /// Concurrent fetches per batch.
    pub workers: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Substrings identifying numeric-like columns.
    pub numeric_keywords: Vec<String>,
}

/// TOML config file format.
#[derive(Debug, serde::Deserialize)]
struct ConfigFile {
    pipeline: Option<PipelineSection>,
}

#[derive(Debug, serde::Deserialize)]
struct PipelineSection {
    database: Option<PathBuf>,
    api_key: Option<String>,
    api_url: Option<String>,
    cache_dir: Option<PathBuf>,
    reports_dir: Option<PathBuf>,
    batch_size: Option<usize>,
    workers: Option<usize>,
    timeout_secs: Option<u64>,
    numeric_keywords: Option<Vec<String>>,
}

impl PipelineConfig {
    /// Load configuration from environment variables and the config file.
    ///
    /// Priority: env vars > config file > defaults.
    /// Required: the database path (`CHARTLIFT_DB`). A run with no
    /// database is meaningless, so its absence aborts before any work.
    pub fn load() -> Result<Self, PipelineError> {
        Self::load_with_database(None)
    }

    /// Like [`load`](Self::load), with an explicit database path (e.g.
    /// from a CLI flag) taking priority over the environment.
    pub fn load_with_database(database: Option<PathBuf>) -> Result<Self, PipelineError> {
        let file = load_config_file();
        let section = file.as_ref();

        let database = database
            .or_else(|| std::env::var_os("CHARTLIFT_DB").map(PathBuf::from))
            .or_else(|| section.and_then(|s| s.database.clone()))
            .ok_or_else(|| {
                PipelineError::Config(
                    "Missing database path. Set CHARTLIFT_DB env var or add to config file"
                        .to_string(),
                )
            })?;

        let api_key = std::env::var("LASTFM_API_KEY")
            .ok()
            .or_else(|| section.and_then(|s| s.api_key.clone()))
            .unwrap_or_default();

        let api_url = std::env::var("LASTFM_API_URL")
            .ok()
            .or_else(|| section.and_then(|s| s.api_url.clone()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let cache_dir = std::env::var_os("CHARTLIFT_CACHE_DIR")
            .map(PathBuf::from)
            .or_else(|| section.and_then(|s| s.cache_dir.clone()))
            .unwrap_or_else(default_cache_dir);

        let reports_dir = std::env::var_os("CHARTLIFT_REPORTS_DIR")
            .map(PathBuf::from)
            .or_else(|| section.and_then(|s| s.reports_dir.clone()))
            .unwrap_or_else(|| PathBuf::from("reports"));

        let batch_size = section
            .and_then(|s| s.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let workers = section.and_then(|s| s.workers).unwrap_or(DEFAULT_WORKERS);
        let timeout_secs = section
            .and_then(|s| s.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let numeric_keywords = section
            .and_then(|s| s.numeric_keywords.clone())
            .unwrap_or_else(|| {
                DEFAULT_NUMERIC_KEYWORDS
                    .iter()
                    .map(|k| k.to_string())
                    .collect()
            });

        Ok(Self {
            database,
            api_key,
            api_url,
            cache_dir,
            reports_dir,
            batch_size,
            workers,
            timeout_secs,
            numeric_keywords,
        })
    }

    /// Apply CLI flag overrides.
    pub fn with_overrides(mut self, batch_size: Option<usize>, workers: Option<usize>) -> Self {
        if let Some(size) = batch_size {
            self.batch_size = size.max(1);
        }
        if let Some(width) = workers {
            self.workers = width.max(1);
        }
        self
    }
}

/// Return the path to the config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chartlift").join("config.toml"))
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chartlift")
        .join("lastfm")
}

fn load_config_file() -> Option<PipelineSection> {
    let path = config_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    let config: ConfigFile = toml::from_str(&content).ok()?;
    config.pipeline
}
