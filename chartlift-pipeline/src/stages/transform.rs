use std::collections::HashSet;

use rusqlite::Connection;

use chartlift_db::{read_table, replace_table, CellValue, Frame, CLEAN_TABLE};

use crate::error::PipelineError;
use crate::sanitize::{coerce_numeric, parse_release_date};
use crate::track_info::UNKNOWN;

/// Column-name substrings given numeric coercion during cleanup. A
/// superset of chart metrics; the enrichment columns are not present yet
/// at this stage.
const NUMERIC_CLEANUP_KEYWORDS: &[&str] = &[
    "stream",
    "count",
    "view",
    "like",
    "score",
    "popularity",
    "rank",
    "spin",
    "post",
];

/// Clean and normalize the working table in place: numeric coercion
/// with comma stripping, date parsing, null filling and duplicate
/// removal. Returns the row count after cleanup.
pub fn transform_clean(conn: &Connection) -> Result<usize, PipelineError> {
    let mut frame = read_table(conn, CLEAN_TABLE)?;
    log::info!("Transforming {} row(s) from '{}'", frame.len(), CLEAN_TABLE);

    for col in 0..frame.columns().len() {
        let name = frame.columns()[col].to_lowercase();

        if NUMERIC_CLEANUP_KEYWORDS.iter().any(|k| name.contains(k)) {
            frame.map_column(col, |cell| match cell.as_text() {
                Some(s) => coerce_numeric(s).unwrap_or(CellValue::Null),
                None => cell.clone(),
            });
        } else if name.contains("date") || name.contains("release") {
            frame.map_column(col, |cell| match cell.as_text() {
                Some(s) => match parse_release_date(s) {
                    Some(dt) => CellValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                    None => CellValue::Null,
                },
                None => cell.clone(),
            });
        }
    }

    // Missing explicit flags default to "not explicit" before the
    // blanket sentinel fill turns the remaining nulls into text.
    if let Some(col) = frame.column_index("Explicit Track") {
        frame.map_column(col, |cell| {
            if cell.is_null() {
                CellValue::Integer(0)
            } else {
                cell.clone()
            }
        });
    }
    for col in 0..frame.columns().len() {
        frame.map_column(col, |cell| {
            if cell.is_null() {
                CellValue::text(UNKNOWN)
            } else {
                cell.clone()
            }
        });
    }

    let mut seen: HashSet<String> = HashSet::new();
    let removed = frame.retain_rows(|_, row| seen.insert(row_key(row)));
    if removed > 0 {
        log::info!("Removed {} duplicate row(s)", removed);
    }

    replace_table(conn, CLEAN_TABLE, &frame)?;
    log::info!("Updated '{}' with {} row(s)", CLEAN_TABLE, frame.len());
    Ok(frame.len())
}

/// Stable key for exact-duplicate detection across mixed cell types.
fn row_key(row: &[CellValue]) -> String {
    let mut key = String::new();
    for cell in row {
        match cell {
            CellValue::Null => key.push('\u{0}'),
            CellValue::Integer(v) => key.push_str(&format!("i{}", v)),
            CellValue::Real(v) => key.push_str(&format!("r{}", v)),
            CellValue::Text(s) => {
                key.push('t');
                key.push_str(s);
            }
        }
        key.push('\u{1f}');
    }
    key
}
