//! Full-table reads and writes for dynamically shaped stage tables.

use rusqlite::Connection;
use thiserror::Error;

use crate::frame::{CellValue, Frame};
use crate::schema::{table_exists, SchemaError};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Table '{0}' does not exist")]
    NoSuchTable(String),
    #[error("Cannot write a frame with no columns to '{0}'")]
    EmptyFrame(String),
    #[error(
        "Frame has {frame_cols} columns but table '{table}' has {table_cols}"
    )]
    ColumnMismatch {
        table: String,
        frame_cols: usize,
        table_cols: usize,
    },
}

impl From<SchemaError> for DbError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::Sqlite(inner) => DbError::Sqlite(inner),
        }
    }
}

/// Quote an identifier for embedding in SQL. Column names in chart dumps
/// contain spaces ("All Time Rank", "Explicit Track").
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Read an entire table into a [`Frame`], preserving column order.
pub fn read_table(conn: &Connection, table: &str) -> Result<Frame, DbError> {
    if !table_exists(conn, table)? {
        return Err(DbError::NoSuchTable(table.to_string()));
    }

    let sql = format!("SELECT * FROM {}", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = columns.len();

    let mut frame = Frame::new(columns);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for i in 0..column_count {
            cells.push(CellValue::from(row.get_ref(i)?));
        }
        frame.push_row(cells);
    }
    Ok(frame)
}

/// Number of rows in a table.
pub fn row_count(conn: &Connection, table: &str) -> Result<usize, DbError> {
    if !table_exists(conn, table)? {
        return Err(DbError::NoSuchTable(table.to_string()));
    }
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Append a frame to a table, creating the table from the frame's
/// columns if it does not exist yet. The insert runs in one transaction
/// so a failed batch leaves no partial rows behind.
pub fn append_table(conn: &Connection, table: &str, frame: &Frame) -> Result<(), DbError> {
    if frame.columns().is_empty() {
        return Err(DbError::EmptyFrame(table.to_string()));
    }

    if !table_exists(conn, table)? {
        create_table(conn, table, frame.columns())?;
    } else {
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1)",
            [table],
            |row| row.get(0),
        )?;
        if existing as usize != frame.columns().len() {
            return Err(DbError::ColumnMismatch {
                table: table.to_string(),
                frame_cols: frame.columns().len(),
                table_cols: existing as usize,
            });
        }
    }

    let column_list = frame
        .columns()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=frame.columns().len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        column_list,
        placeholders
    );

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(&sql)?;
        for row in frame.rows() {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Replace a table's contents with a frame (drop and re-create).
pub fn replace_table(conn: &Connection, table: &str, frame: &Frame) -> Result<(), DbError> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;
    append_table(conn, table, frame)
}

/// SQLite columns are declared without a type; affinity follows the data.
fn create_table(conn: &Connection, table: &str, columns: &[String]) -> Result<(), DbError> {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute_batch(&format!(
        "CREATE TABLE {} ({})",
        quote_ident(table),
        column_list
    ))?;
    Ok(())
}
