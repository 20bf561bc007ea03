//! Loading input files into tables.
//!
//! `.json` files (or any file when `--kind` is given) go through the tidy
//! adapters; everything else is read as CSV with a header row.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tabtex::{AdapterRegistry, DataTable, TableError};

pub fn is_json(path: &Path, kind: Option<&str>) -> bool {
    kind.is_some()
        || path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn load_table(path: &Path, kind: Option<&str>) -> Result<DataTable, TableError> {
    if !is_json(path, kind) {
        return DataTable::from_csv_path(path);
    }

    let text = fs::read_to_string(path).map_err(|source| TableError::Filesystem {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        TableError::InputValidation(format!("{} is not valid JSON: {e}", path.display()))
    })?;
    let table = AdapterRegistry::with_defaults().convert(&value, kind)?;

    Ok(match path.file_stem() {
        Some(stem) => table.with_name(stem.to_string_lossy()),
        None => table,
    })
}
