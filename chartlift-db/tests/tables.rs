use chartlift_db::*;

fn sample_frame() -> Frame {
    let mut frame = Frame::new(vec![
        "Artist".to_string(),
        "Track".to_string(),
        "Spotify Streams".to_string(),
    ]);
    frame.push_row(vec![
        CellValue::text("Daft Punk"),
        CellValue::text("One More Time"),
        CellValue::Integer(1_500_000),
    ]);
    frame.push_row(vec![
        CellValue::text("Air"),
        CellValue::text("La Femme d'Argent"),
        CellValue::Null,
    ]);
    frame
}

#[test]
fn append_creates_table_and_round_trips() {
    let conn = open_memory().unwrap();
    let frame = sample_frame();
    append_table(&conn, "tracks_clean", &frame).unwrap();

    let read = read_table(&conn, "tracks_clean").unwrap();
    assert_eq!(read.columns(), frame.columns());
    assert_eq!(read.rows(), frame.rows());
}

#[test]
fn append_accumulates_rows() {
    let conn = open_memory().unwrap();
    let frame = sample_frame();
    append_table(&conn, "tracks_enriched", &frame).unwrap();
    append_table(&conn, "tracks_enriched", &frame).unwrap();

    assert_eq!(row_count(&conn, "tracks_enriched").unwrap(), 4);
}

#[test]
fn replace_overwrites_previous_contents() {
    let conn = open_memory().unwrap();
    append_table(&conn, "tracks_raw", &sample_frame()).unwrap();

    let mut smaller = Frame::new(vec!["Artist".to_string()]);
    smaller.push_row(vec![CellValue::text("Moderat")]);
    replace_table(&conn, "tracks_raw", &smaller).unwrap();

    let read = read_table(&conn, "tracks_raw").unwrap();
    assert_eq!(read.columns(), &["Artist".to_string()]);
    assert_eq!(read.len(), 1);
}

#[test]
fn quoted_identifiers_allow_spaces() {
    let conn = open_memory().unwrap();
    let mut frame = Frame::new(vec!["All Time Rank".to_string()]);
    frame.push_row(vec![CellValue::text("1,234")]);
    append_table(&conn, "tracks_clean", &frame).unwrap();

    let read = read_table(&conn, "tracks_clean").unwrap();
    assert_eq!(read.cell(0, 0), &CellValue::text("1,234"));
}

#[test]
fn reading_missing_table_is_an_error() {
    let conn = open_memory().unwrap();
    let err = read_table(&conn, "tracks_curated").unwrap_err();
    assert!(matches!(err, DbError::NoSuchTable(_)));
}

#[test]
fn append_rejects_mismatched_columns() {
    let conn = open_memory().unwrap();
    append_table(&conn, "tracks_clean", &sample_frame()).unwrap();

    let mut other = Frame::new(vec!["Artist".to_string()]);
    other.push_row(vec![CellValue::text("Moderat")]);
    let err = append_table(&conn, "tracks_clean", &other).unwrap_err();
    assert!(matches!(err, DbError::ColumnMismatch { .. }));
}

#[test]
fn database_file_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.db");

    {
        let conn = open_database(&path).unwrap();
        append_table(&conn, "tracks_raw", &sample_frame()).unwrap();
    }

    let conn = open_database(&path).unwrap();
    assert_eq!(row_count(&conn, "tracks_raw").unwrap(), 2);
}
