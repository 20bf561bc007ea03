//! The tabular value fed into the pipeline.
//!
//! A [`DataTable`] is a rectangular grid of strings with named columns. Tables
//! come from CSV files, from the tidy adapters (see [`crate::tidy`]), or are
//! built directly by callers.

use crate::error::{Result, TableError};
use std::io::Read;
use std::path::Path;

/// Rows × named columns, all cells kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    name: Option<String>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Build a table, rejecting inputs that are not rectangular.
    ///
    /// Zero rows are accepted here so adapters can build up tables; the
    /// publish pipeline rejects empty tables before rendering.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(TableError::InputValidation(
                "table has no columns".to_string(),
            ));
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::InputValidation(format!(
                    "row {} has {} cells but the table has {} columns",
                    index + 1,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self {
            name: None,
            columns,
            rows,
        })
    }

    /// Attach a name, used to derive the output filename.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a CSV document whose first record holds the column names.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns = csv_reader
            .headers()
            .map_err(|e| TableError::InputValidation(format!("unreadable CSV header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record =
                record.map_err(|e| TableError::InputValidation(format!("invalid CSV: {e}")))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(columns, rows)
    }

    /// Read a CSV file; the table is named after the file stem.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            std::fs::File::open(path).map_err(|source| TableError::filesystem(path, source))?;
        let table = Self::from_csv_reader(file)?;
        match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => Ok(table.with_name(stem)),
            None => Ok(table),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-column flag: true when every non-empty cell parses as a number and
    /// at least one cell is non-empty.
    pub fn numeric_columns(&self) -> Vec<bool> {
        (0..self.columns.len())
            .map(|col| {
                let mut seen = false;
                for row in &self.rows {
                    let cell = row[col].trim();
                    if cell.is_empty() {
                        continue;
                    }
                    if cell.parse::<f64>().is_err() {
                        return false;
                    }
                    seen = true;
                }
                seen
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rejects_ragged_rows() {
        let result = DataTable::new(
            strings(&["a", "b"]),
            vec![strings(&["1", "2"]), strings(&["3"])],
        );
        match result {
            Err(TableError::InputValidation(msg)) => assert!(msg.contains("row 2")),
            other => panic!("expected InputValidation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_tables_without_columns() {
        assert!(matches!(
            DataTable::new(vec![], vec![]),
            Err(TableError::InputValidation(_))
        ));
    }

    #[test]
    fn reads_csv_with_header() {
        let csv = "term,estimate\nx,1.25\ny,-0.5\n";
        let table = DataTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["term", "estimate"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][1], "-0.5");
    }

    #[test]
    fn detects_numeric_columns() {
        let table = DataTable::new(
            strings(&["name", "value", "blank"]),
            vec![strings(&["a", "1.5", ""]), strings(&["b", "", ""])],
        )
        .unwrap();
        assert_eq!(table.numeric_columns(), vec![false, true, false]);
    }

    #[test]
    fn csv_path_names_table_after_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        let table = DataTable::from_csv_path(&path).unwrap();
        assert_eq!(table.name(), Some("results"));
    }
}
