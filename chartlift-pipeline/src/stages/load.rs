use rusqlite::Connection;

use chartlift_db::{read_table, replace_table, CURATED_TABLE, VALIDATED_TABLE};

use crate::error::PipelineError;

/// Publish the validated table as the final curated table.
///
/// An empty validated table aborts the stage: overwriting the curated
/// table with nothing would silently destroy the previous publication.
pub fn publish_curated(conn: &Connection) -> Result<usize, PipelineError> {
    log::info!("Reading validated table '{}'", VALIDATED_TABLE);
    let frame = read_table(conn, VALIDATED_TABLE)?;

    if frame.is_empty() {
        return Err(PipelineError::EmptyValidatedTable);
    }

    replace_table(conn, CURATED_TABLE, &frame)?;
    log::info!(
        "Published '{}' with {} row(s)",
        CURATED_TABLE,
        frame.len()
    );
    Ok(frame.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartlift_db::{append_table, open_memory, CellValue, Frame};

    #[test]
    fn empty_validated_table_is_fatal() {
        let conn = open_memory().unwrap();
        let frame = Frame::new(vec!["Artist".to_string()]);
        append_table(&conn, VALIDATED_TABLE, &frame).unwrap();

        let err = publish_curated(&conn).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyValidatedTable));
    }

    #[test]
    fn publishes_and_replaces() {
        let conn = open_memory().unwrap();
        let mut frame = Frame::new(vec!["Artist".to_string()]);
        frame.push_row(vec![CellValue::text("Moderat")]);
        append_table(&conn, VALIDATED_TABLE, &frame).unwrap();

        assert_eq!(publish_curated(&conn).unwrap(), 1);
        assert_eq!(publish_curated(&conn).unwrap(), 1);
        assert_eq!(
            chartlift_db::row_count(&conn, CURATED_TABLE).unwrap(),
            1
        );
    }
}
