use std::future::Future;

use serde_json::Value;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Source of raw enrichment payloads. Implemented by [`LastfmClient`]
/// and by scripted fetchers in tests.
pub trait TrackFetcher: Sync {
    /// Fetch the raw payload for one (artist, track) pair.
    ///
    /// Must not fail: any transport-level problem yields an empty JSON
    /// object, which parses to an all-sentinel response downstream.
    fn fetch(&self, artist: &str, track: &str) -> impl Future<Output = Value>;
}

/// HTTP client for the Last.fm track.getInfo endpoint.
pub struct LastfmClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl LastfmClient {
    /// Build a client with the configured endpoint and request timeout.
    pub fn new(cfg: &PipelineConfig) -> Result<Self, PipelineError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
        })
    }

    async fn request(&self, artist: &str, track: &str) -> Result<Value, reqwest::Error> {
        let params = [
            ("method", "track.getInfo"),
            ("api_key", self.api_key.as_str()),
            ("artist", artist),
            ("track", track),
            ("format", "json"),
        ];
        self.http
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?
            .json::<Value>()
            .await
    }
}

impl TrackFetcher for LastfmClient {
    async fn fetch(&self, artist: &str, track: &str) -> Value {
        match self.request(artist, track).await {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Last.fm request failed for {} - {}: {}", artist, track, e);
                Value::Object(serde_json::Map::new())
            }
        }
    }
}
