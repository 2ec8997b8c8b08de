use std::path::PathBuf;

use rusqlite::Connection;

use chartlift_db::{read_table, replace_table, CellValue, ENRICHED_TABLE, VALIDATED_TABLE};

use crate::config::PipelineConfig;
use crate::enrich::dedup_candidates;
use crate::error::PipelineError;
use crate::track_info::UNKNOWN;

/// Tracks shorter than this are treated as snippets and removed.
const MIN_DURATION_MS: i64 = 30_000;

/// Result of the validation stage.
#[derive(Debug)]
pub struct ValidateSummary {
    pub rows: usize,
    pub columns: usize,
    pub report_path: PathBuf,
}

/// Validate the enriched table and write the validated copy plus a
/// small text summary for operators.
pub fn validate_enriched(
    conn: &Connection,
    cfg: &PipelineConfig,
) -> Result<ValidateSummary, PipelineError> {
    let mut frame = read_table(conn, ENRICHED_TABLE)?;
    log::info!("Validating {} record(s)", frame.len());

    if let Some(col) = frame.column_index("release_date") {
        frame.map_column(col, |cell| {
            if cell.is_null() {
                CellValue::text(UNKNOWN)
            } else {
                cell.clone()
            }
        });
    }

    if let Some(col) = frame.column_index("duration_ms") {
        frame.retain_rows(|_, row| match &row[col] {
            CellValue::Null => true,
            cell => cell.as_integer().map_or(true, |ms| ms >= MIN_DURATION_MS),
        });
    }

    let frame = dedup_candidates(&frame)?;

    std::fs::create_dir_all(&cfg.reports_dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let report_path = cfg.reports_dir.join(format!("summary_{}.txt", timestamp));
    let summary = format!(
        "Rows after validation: {}\nColumns: {}\nValidated at: {}\n",
        frame.len(),
        frame.columns().len(),
        timestamp
    );
    std::fs::write(&report_path, summary)?;

    replace_table(conn, VALIDATED_TABLE, &frame)?;
    log::info!(
        "Validation complete: {} row(s) in '{}', summary at {}",
        frame.len(),
        VALIDATED_TABLE,
        report_path.display()
    );

    Ok(ValidateSummary {
        rows: frame.len(),
        columns: frame.columns().len(),
        report_path,
    })
}
