//! Row collapsing: runs of identical values in a column become one `\multirow`.
//!
//! Columns are processed in the order given. A run in a later column never
//! crosses a run boundary of an earlier one, so collapsing `[1, 2]` groups the
//! second column within each group of the first.

use super::{body_range, map_lines, RowLine};
use crate::error::{Result, TableError};
use std::fmt;
use std::str::FromStr;

/// Vertical placement of the collapsed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VAlign {
    /// Position argument of `\multirow`.
    pub fn token(&self) -> &'static str {
        match self {
            VAlign::Top => "t",
            VAlign::Middle => "c",
            VAlign::Bottom => "b",
        }
    }
}

impl FromStr for VAlign {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "top" => Ok(VAlign::Top),
            "c" | "m" | "middle" | "center" => Ok(VAlign::Middle),
            "b" | "bottom" => Ok(VAlign::Bottom),
            other => Err(TableError::Configuration(format!(
                "unknown vertical alignment '{other}' (expected top, middle or bottom)"
            ))),
        }
    }
}

impl fmt::Display for VAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VAlign::Top => "top",
            VAlign::Middle => "middle",
            VAlign::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseRows {
    /// 1-indexed columns, in processing order
    pub columns: Vec<usize>,
    pub valign: VAlign,
}

impl CollapseRows {
    pub fn new(columns: Vec<usize>) -> Self {
        Self {
            columns,
            valign: VAlign::default(),
        }
    }

    pub fn with_valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }

    pub fn validate(&self, column_count: usize) -> Result<()> {
        if self.columns.is_empty() {
            return Err(TableError::Configuration(
                "collapse needs at least one column".to_string(),
            ));
        }
        for (i, &column) in self.columns.iter().enumerate() {
            if column == 0 || column > column_count {
                return Err(TableError::Configuration(format!(
                    "collapse column {column} is out of range (table has {column_count} columns)"
                )));
            }
            if self.columns[..i].contains(&column) {
                return Err(TableError::Configuration(format!(
                    "collapse column {column} is listed twice"
                )));
            }
        }
        Ok(())
    }
}

/// Merge vertical runs of equal body cells in the configured columns.
pub fn collapse_rows(markup: &str, collapse: &CollapseRows) -> Result<String> {
    let lines: Vec<String> = markup.lines().map(str::to_string).collect();
    let (start, end) = body_range(&lines).ok_or_else(|| {
        TableError::Configuration("cannot collapse rows: no table body found".to_string())
    })?;

    let row_lines: Vec<usize> = (start..end)
        .filter(|&i| RowLine::parse(&lines[i]).is_some())
        .collect();
    let mut rows: Vec<Vec<String>> = row_lines
        .iter()
        .filter_map(|&i| RowLine::parse(&lines[i]))
        .map(|row| row.cells.iter().map(|c| c.trim().to_string()).collect())
        .collect();

    if rows.len() < 2 {
        return Ok(markup.to_string());
    }
    let width = rows.iter().map(Vec::len).min().unwrap_or(0);
    collapse.validate(width)?;

    let mut boundaries = vec![false; rows.len()];
    boundaries[0] = true;
    for &column in &collapse.columns {
        let c = column - 1;
        let mut starts = boundaries.clone();
        for r in 1..rows.len() {
            if rows[r][c] != rows[r - 1][c] {
                starts[r] = true;
            }
        }

        let mut r = 0;
        while r < rows.len() {
            let mut e = r + 1;
            while e < rows.len() && !starts[e] {
                e += 1;
            }
            let span = e - r;
            if span > 1 && !rows[r][c].is_empty() {
                log::debug!("collapsing column {column}, rows {}..{}", r + 1, e);
                rows[r][c] = format!(
                    "\\multirow[{}]{{{span}}}{{*}}{{{}}}",
                    collapse.valign.token(),
                    rows[r][c]
                );
                for row in &mut rows[r + 1..e] {
                    row[c].clear();
                }
            }
            r = e;
        }
        boundaries = starts;
    }

    Ok(map_lines(markup, |mut lines| {
        for (&index, row) in row_lines.iter().zip(&rows) {
            lines[index] = format!("{} \\\\", row.join(" & "));
        }
        lines
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP: &str = "\\begin{tabular}{llr}\n\\toprule\ngroup & sub & n \\\\\n\\midrule\na & x & 1 \\\\\na & x & 2 \\\\\na & y & 3 \\\\\nb & y & 4 \\\\\n\\bottomrule\n\\end{tabular}\n";

    fn body(out: &str) -> Vec<&str> {
        out.lines().skip(4).take(4).collect()
    }

    #[test]
    fn collapses_single_column() {
        let out = collapse_rows(MARKUP, &CollapseRows::new(vec![1])).unwrap();
        insta::assert_snapshot!(body(&out)[0], @r"\multirow[t]{3}{*}{a} & x & 1 \\");
        assert_eq!(
            body(&out)[1..],
            [" & x & 2 \\\\", " & y & 3 \\\\", "b & y & 4 \\\\"]
        );
    }

    #[test]
    fn later_columns_respect_earlier_boundaries() {
        let out = collapse_rows(MARKUP, &CollapseRows::new(vec![1, 2])).unwrap();
        let rows = body(&out);
        assert!(rows[0].contains("\\multirow[t]{2}{*}{x}"));
        // "y" spans rows 3 and 4 but the group boundary between a and b splits it
        assert!(!out.contains("{2}{*}{y}"));
        assert_eq!(rows[2], " & y & 3 \\\\");
        assert_eq!(rows[3], "b & y & 4 \\\\");
    }

    #[test]
    fn valign_selects_position() {
        let collapse = CollapseRows::new(vec![1]).with_valign(VAlign::Middle);
        let out = collapse_rows(MARKUP, &collapse).unwrap();
        assert!(out.contains("\\multirow[c]{3}{*}{a}"));
        assert_eq!("bottom".parse::<VAlign>().unwrap(), VAlign::Bottom);
        assert!("sideways".parse::<VAlign>().is_err());
    }

    #[test]
    fn valign_accepts_every_completion_spelling() {
        let expected = [
            ("top", VAlign::Top),
            ("middle", VAlign::Middle),
            ("bottom", VAlign::Bottom),
            ("center", VAlign::Middle),
            ("t", VAlign::Top),
            ("c", VAlign::Middle),
            ("m", VAlign::Middle),
            ("b", VAlign::Bottom),
        ];
        for (spelling, valign) in expected {
            assert_eq!(spelling.parse::<VAlign>().unwrap(), valign, "{spelling}");
        }
    }

    #[test]
    fn out_of_range_column_is_rejected() {
        for columns in [vec![0], vec![4], vec![1, 1], vec![]] {
            let result = CollapseRows::new(columns).validate(3);
            assert!(matches!(result, Err(TableError::Configuration(_))));
        }
        assert!(collapse_rows(MARKUP, &CollapseRows::new(vec![4])).is_err());
    }

    #[test]
    fn header_and_rules_are_untouched() {
        let out = collapse_rows(MARKUP, &CollapseRows::new(vec![1])).unwrap();
        assert!(out.starts_with("\\begin{tabular}{llr}\n\\toprule\ngroup & sub & n \\\\\n\\midrule\n"));
        assert!(out.ends_with("\\bottomrule\n\\end{tabular}\n"));
    }
}
