//! Type cleanup and persistence for enriched batches.
//!
//! Heterogeneous enriched rows are coerced to well-typed columns before
//! they reach the destination table. The numeric-column heuristic is
//! name-based and configuration-driven because the upstream chart schema
//! is not statically known.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use chartlift_db::{append_table, CellValue, Frame, ENRICHED_TABLE};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::track_info::UNKNOWN;

/// The column holding the release date, treated as a date rather than a
/// numeric despite its free-text source.
const DATE_COLUMN: &str = "release_date";

/// Stored date format. SQLite has no date type, so parsed dates become
/// ISO text.
const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column classification rules for the sanitizer.
#[derive(Debug, Clone)]
pub struct SanitizeRules {
    numeric_keywords: Vec<String>,
}

impl SanitizeRules {
    pub fn new(numeric_keywords: Vec<String>) -> Self {
        Self {
            numeric_keywords: numeric_keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(cfg.numeric_keywords.clone())
    }

    /// Case-insensitive substring match against the keyword list.
    pub fn is_numeric_like(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        self.numeric_keywords.iter().any(|k| lower.contains(k))
    }
}

/// A sanitized batch ready for persistence.
#[derive(Debug)]
pub struct SanitizedBatch {
    pub frame: Frame,
    /// Rows dropped because a numeric-like cell held irreducible text.
    pub rows_dropped: usize,
}

/// Clean one enriched batch: sentinels to null, numeric coercion with
/// row-level exclusion, zero fill, and release-date parsing.
pub fn sanitize_batch(mut frame: Frame, rules: &SanitizeRules) -> SanitizedBatch {
    // Sentinels become null uniformly before any coercion, so a failed
    // enrichment ("Unknown" everywhere) is nullable data, not bad data.
    for col in 0..frame.columns().len() {
        frame.map_column(col, |cell| match cell.as_text() {
            Some(s) if s.is_empty() || s == UNKNOWN || s == "N/A" => CellValue::Null,
            _ => cell.clone(),
        });
    }

    let numeric_cols: Vec<usize> = frame
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| rules.is_numeric_like(name))
        .map(|(i, _)| i)
        .collect();

    // Coerce numeric-like text cells. A cell that still fails to parse
    // after comma stripping poisons its whole row.
    let mut drop_row = vec![false; frame.len()];
    for &col in &numeric_cols {
        for row in 0..frame.len() {
            if let Some(text) = frame.cell(row, col).as_text() {
                match coerce_numeric(text) {
                    Some(value) => frame.set_cell(row, col, value),
                    None => drop_row[row] = true,
                }
            }
        }
    }

    let rows_dropped = frame.retain_rows(|index, _| !drop_row[index]);
    if rows_dropped > 0 {
        log::warn!(
            "Omitting {} row(s) with non-numeric text in numeric columns",
            rows_dropped
        );
    }

    for &col in &numeric_cols {
        frame.map_column(col, |cell| {
            if cell.is_null() {
                CellValue::Integer(0)
            } else {
                cell.clone()
            }
        });
    }

    if let Some(col) = frame.column_index(DATE_COLUMN) {
        frame.map_column(col, |cell| match cell.as_text() {
            Some(s) => match parse_release_date(s) {
                Some(date) => CellValue::Text(date.format(DATE_OUTPUT_FORMAT).to_string()),
                None => CellValue::Null,
            },
            None => cell.clone(),
        });
    }

    SanitizedBatch {
        frame,
        rows_dropped,
    }
}

/// Append a sanitized batch to the enriched table.
pub fn persist_batch(conn: &Connection, frame: &Frame) -> Result<(), PipelineError> {
    append_table(conn, ENRICHED_TABLE, frame)?;
    Ok(())
}

/// Parse a numeric-like text cell: commas stripped, float-then-int.
///
/// Integral values land as [`CellValue::Integer`]; anything fractional
/// stays a real. Returns None for irreducible text.
pub fn coerce_numeric(text: &str) -> Option<CellValue> {
    let cleaned = text.replace(',', "");
    let cleaned = cleaned.trim();
    let value: f64 = cleaned.parse().ok()?;
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(CellValue::Integer(value as i64))
    } else {
        Some(CellValue::Real(value))
    }
}

/// Parse a release date in the formats the API and chart dumps use.
/// The Last.fm wiki format ("07 Jun 2008, 14:49") comes first.
pub fn parse_release_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in ["%d %b %Y, %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%d %b %Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}
