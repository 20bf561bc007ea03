//! Escaping of column names, cell values and filenames.
//!
//! Every string that ends up in the generated markup goes through exactly one
//! of these passes. The pipeline runs them once per call, so content is never
//! escaped twice.

use crate::data::DataTable;

/// Characters with a special meaning in LaTeX markup.
pub const RESERVED_CHARS: &[char] = &['#', '%', '&', '$', '_', '{', '}', '~', '^', '\\'];

/// Prefix placed in front of each reserved character.
pub const ESCAPE_MARKER: char = '\\';

const FILENAME_FALLBACK: &str = "table";

/// A column name before and after sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnName {
    pub original: String,
    pub safe: String,
}

/// Markup-safe view of a [`DataTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedTable {
    /// Original → safe name, one entry per column, in column order
    pub columns: Vec<ColumnName>,
    /// Header labels ready to be placed in the markup
    pub header: Vec<String>,
    /// Escaped cell grid
    pub cells: Vec<Vec<String>>,
}

impl SanitizedTable {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }
}

fn is_safe_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
///
/// One output per input, in order. Distinct inputs may collapse onto the same
/// output; the mapping is deterministic.
pub fn sanitize_column_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            name.as_ref()
                .chars()
                .map(|c| if is_safe_identifier_char(c) { c } else { '_' })
                .collect()
        })
        .collect()
}

/// Escape a single string for inclusion in markup.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if RESERVED_CHARS.contains(&c) {
            out.push(ESCAPE_MARKER);
        }
        out.push(c);
    }
    out
}

/// Escape every cell of a grid.
pub fn sanitize_table_cells(cells: &[Vec<String>]) -> Vec<Vec<String>> {
    cells
        .iter()
        .map(|row| row.iter().map(|cell| escape_markup(cell)).collect())
        .collect()
}

/// Turn an arbitrary name into a single valid path segment.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            ':' | '|' | '<' | '>' | '*' | '/' | '\\' | '?' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Windows refuses segments ending in a dot or a space
    let trimmed = replaced.trim_end_matches(['.', ' ']).trim_start();

    match trimmed {
        "" | "." | ".." => FILENAME_FALLBACK.to_string(),
        other => other.to_string(),
    }
}

/// [`sanitize_filename`], then also replace whitespace and characters the
/// compiler would read as markup, so the result works as a job name.
pub fn sanitize_jobname(name: &str) -> String {
    sanitize_filename(name)
        .chars()
        .map(|c| {
            if c.is_whitespace() || (c != '_' && RESERVED_CHARS.contains(&c)) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Apply the column-name and cell passes to a whole table.
pub fn sanitize_table(table: &DataTable) -> SanitizedTable {
    let safe_names = sanitize_column_names(table.columns());
    let columns = table
        .columns()
        .iter()
        .zip(&safe_names)
        .map(|(original, safe)| ColumnName {
            original: original.clone(),
            safe: safe.clone(),
        })
        .collect();
    let header = safe_names.iter().map(|name| escape_markup(name)).collect();

    SanitizedTable {
        columns,
        header,
        cells: sanitize_table_cells(table.rows()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn column_names_keep_order_and_length() {
        let names = ["p value", "Std. Error", "x", "p-value"];
        let safe = sanitize_column_names(&names);
        assert_eq!(safe, vec!["p_value", "Std__Error", "x", "p_value"]);
    }

    #[test]
    fn duplicates_are_repeatable() {
        let names = ["a b", "a-b"];
        assert_eq!(sanitize_column_names(&names), sanitize_column_names(&names));
    }

    #[test]
    fn escapes_every_reserved_character() {
        assert_eq!(escape_markup("50% & $5"), "50\\% \\& \\$5");
        assert_eq!(escape_markup("a_b{c}"), "a\\_b\\{c\\}");
        assert_eq!(escape_markup("~^#"), "\\~\\^\\#");
        assert_eq!(escape_markup("C:\\dir"), "C:\\\\dir");
        assert_eq!(escape_markup("plain text 1.5"), "plain text 1.5");
    }

    #[test]
    fn filename_replaces_separators() {
        assert_eq!(sanitize_filename("model: a/b"), "model_ a_b");
        assert_eq!(sanitize_filename("what?<>|*\"x"), "what______x");
        assert_eq!(sanitize_filename("C:\\tmp\\out"), "C__tmp_out");
    }

    #[test]
    fn jobname_has_no_markup_or_spaces() {
        assert_eq!(sanitize_jobname("growth_50%"), "growth_50_");
        assert_eq!(sanitize_jobname("a b#c$d&e~f^g{h}"), "a_b_c_d_e_f_g_h_");
        assert_eq!(sanitize_jobname("plain_name"), "plain_name");
        assert_eq!(sanitize_jobname(" "), "table");
    }

    #[test]
    fn filename_never_empty_or_relative() {
        assert_eq!(sanitize_filename(""), "table");
        assert_eq!(sanitize_filename(".."), "table");
        assert_eq!(sanitize_filename("report. "), "report");
    }

    #[test]
    fn sanitized_table_escapes_header_labels() {
        let table = DataTable::new(
            vec!["std error".to_string(), "n".to_string()],
            vec![vec!["1%".to_string(), "2".to_string()]],
        )
        .unwrap();
        let sanitized = sanitize_table(&table);
        assert_eq!(sanitized.columns[0].original, "std error");
        assert_eq!(sanitized.columns[0].safe, "std_error");
        assert_eq!(sanitized.header[0], "std\\_error");
        assert_eq!(sanitized.cells[0][0], "1\\%");
    }

    proptest! {
        #[test]
        fn column_names_use_safe_set_only(names in proptest::collection::vec(".*", 0..8)) {
            let safe = sanitize_column_names(&names);
            prop_assert_eq!(safe.len(), names.len());
            for (original, cleaned) in names.iter().zip(&safe) {
                prop_assert!(cleaned.chars().all(is_safe_identifier_char));
                prop_assert_eq!(cleaned.chars().count(), original.chars().count());
            }
        }

        #[test]
        fn escaping_only_prefixes_reserved(text in ".*") {
            let escaped = escape_markup(&text);
            // Removing one marker before each reserved char restores the input
            let mut restored = String::new();
            let mut chars = escaped.chars().peekable();
            while let Some(c) = chars.next() {
                if c == ESCAPE_MARKER {
                    let next = chars.next();
                    prop_assert!(next.is_some_and(|n| RESERVED_CHARS.contains(&n)));
                    restored.extend(next);
                } else {
                    prop_assert!(!RESERVED_CHARS.contains(&c));
                    restored.push(c);
                }
            }
            prop_assert_eq!(restored, text);
        }

        #[test]
        fn filenames_have_no_separators(name in ".*") {
            let cleaned = sanitize_filename(&name);
            prop_assert!(!cleaned.is_empty());
            prop_assert!(!cleaned.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']));
            prop_assert!(cleaned != "." && cleaned != "..");
        }
    }
}
