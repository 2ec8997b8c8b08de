//! Normalization of raw track.getInfo payloads.
//!
//! Every field access has a default: the API omits `album` for singles,
//! `wiki` for obscure tracks, and returns numbers as strings. A missing
//! or malformed payload yields the all-sentinel response rather than an
//! error, so one bad lookup can never fail a batch.

use chartlift_db::CellValue;
use serde_json::Value;

/// Sentinel for missing text fields.
pub const UNKNOWN: &str = "Unknown";

/// Normalized enrichment fields for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub duration_ms: i64,
    pub album: String,
    pub release_date: String,
    pub listeners: i64,
    pub playcount: i64,
    pub tags: String,
}

impl Default for TrackInfo {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            album: UNKNOWN.to_string(),
            release_date: UNKNOWN.to_string(),
            listeners: 0,
            playcount: 0,
            tags: UNKNOWN.to_string(),
        }
    }
}

impl TrackInfo {
    /// Column names, in the order [`cells`](Self::cells) emits values.
    pub const COLUMNS: [&'static str; 6] = [
        "duration_ms",
        "album",
        "release_date",
        "listeners",
        "playcount",
        "tags",
    ];

    /// Extract the fields of interest from a raw payload.
    pub fn from_payload(payload: &Value) -> Self {
        let Some(track) = payload.get("track") else {
            return Self::default();
        };

        let album = track
            .pointer("/album/title")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN)
            .to_string();
        let release_date = track
            .pointer("/wiki/published")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN)
            .to_string();

        let tags = match track.pointer("/toptags/tag") {
            Some(Value::Array(tags)) => tags
                .iter()
                .take(3)
                .map(|t| t.get("name").and_then(Value::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join(", "),
            _ => UNKNOWN.to_string(),
        };

        Self {
            duration_ms: safe_int(track.get("duration").unwrap_or(&Value::Null)),
            album,
            release_date,
            listeners: safe_int(track.get("listeners").unwrap_or(&Value::Null)),
            playcount: safe_int(track.get("playcount").unwrap_or(&Value::Null)),
            tags,
        }
    }

    /// The enrichment fields as cells, ordered per [`COLUMNS`](Self::COLUMNS).
    pub fn cells(&self) -> [CellValue; 6] {
        [
            CellValue::Integer(self.duration_ms),
            CellValue::Text(self.album.clone()),
            CellValue::Text(self.release_date.clone()),
            CellValue::Integer(self.listeners),
            CellValue::Integer(self.playcount),
            CellValue::Text(self.tags.clone()),
        ]
    }
}

/// Coerce a JSON value to i64, treating invalid input as zero.
///
/// Accepts `"123.0"`-style values (float parse, then truncate). Null,
/// empty strings and the "Unknown"/"N/A" sentinels are zero; so is
/// anything that fails to parse. Never fails.
pub fn safe_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as i64).unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == UNKNOWN || s == "N/A" {
                0
            } else {
                s.parse::<f64>().map(|f| f as i64).unwrap_or(0)
            }
        }
        _ => 0,
    }
}
