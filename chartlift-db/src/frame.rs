//! Dynamic tabular data model shared by all pipeline stages.

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};

/// A single cell, mirroring SQLite's storage classes.
///
/// Blobs have no meaning in the pipeline and are read back as [`CellValue::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    /// Text content of the cell, if it is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric content as i64 (reals truncate), if the cell is numeric.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            CellValue::Real(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Convenience constructor for text cells.
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::Owned(Value::Null),
            CellValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            CellValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            CellValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(v) => CellValue::Integer(v),
            ValueRef::Real(v) => CellValue::Real(v),
            ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(_) => CellValue::Null,
        }
    }
}

/// An ordered set of named columns and the rows beneath them.
///
/// Column order is significant: it is preserved through every stage so
/// the destination table ends up with source columns first and
/// enrichment columns after them.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row. The row must have one cell per column.
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        &self.rows[row][col]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) {
        self.rows[row][col] = value;
    }

    /// Apply `f` to every cell of one column.
    pub fn map_column(&mut self, col: usize, mut f: impl FnMut(&CellValue) -> CellValue) {
        for row in &mut self.rows {
            row[col] = f(&row[col]);
        }
    }

    /// Keep only the rows whose index satisfies the predicate. Returns
    /// the number of rows removed.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(usize, &[CellValue]) -> bool) -> usize {
        let before = self.rows.len();
        let mut index = 0;
        self.rows.retain(|row| {
            let kept = keep(index, row);
            index += 1;
            kept
        });
        before - self.rows.len()
    }

    /// Consume the frame, yielding its rows.
    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_and_mutation() {
        let mut frame = Frame::new(vec!["a".to_string(), "b".to_string()]);
        frame.push_row(vec![CellValue::Integer(1), CellValue::text("x")]);
        frame.push_row(vec![CellValue::Integer(2), CellValue::Null]);

        assert_eq!(frame.column_index("b"), Some(1));
        assert_eq!(frame.column_index("c"), None);

        frame.map_column(0, |c| match c {
            CellValue::Integer(v) => CellValue::Integer(v * 10),
            other => other.clone(),
        });
        assert_eq!(*frame.cell(0, 0), CellValue::Integer(10));
        assert_eq!(*frame.cell(1, 0), CellValue::Integer(20));
    }

    #[test]
    fn retain_reports_removed_count() {
        let mut frame = Frame::new(vec!["n".to_string()]);
        for v in 0..5 {
            frame.push_row(vec![CellValue::Integer(v)]);
        }
        let removed = frame.retain_rows(|_, row| row[0].as_integer().unwrap() % 2 == 0);
        assert_eq!(removed, 2);
        assert_eq!(frame.len(), 3);
    }
}
