use rusqlite::Connection;

use chartlift_db::{read_table, replace_table, CLEAN_TABLE, RAW_TABLE};

use crate::error::PipelineError;

/// Copy the raw chart dump into the clean working table.
///
/// Returns the number of rows extracted.
pub fn extract_raw(conn: &Connection) -> Result<usize, PipelineError> {
    log::info!("Extracting raw data from '{}'", RAW_TABLE);
    let frame = read_table(conn, RAW_TABLE)?;
    replace_table(conn, CLEAN_TABLE, &frame)?;
    log::info!("Created '{}' with {} row(s)", CLEAN_TABLE, frame.len());
    Ok(frame.len())
}
