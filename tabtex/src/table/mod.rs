//! Table assembly
//!
//! Runs the renderer and then post-processes its markup, strictly in this order:
//!
//! 1. render the base markup ([`crate::render`])
//! 2. header protection for decimal columns ([`header`])
//! 3. footnotes ([`footnote`])
//! 4. grouped header row ([`group`])
//! 5. row collapsing ([`collapse`])
//!
//! Options that can be checked without rendering (span sums, column indices)
//! are checked before step 1.
//!
//! The post-processing steps are line based: they rely on the row layout
//! documented in [`crate::render`].

pub mod collapse;
pub mod footnote;
pub mod group;
pub mod header;

use crate::colspec::ColumnSpec;
use crate::document::Package;
use crate::error::Result;
use crate::render::{TableLayout, TableRenderer};
use crate::sanitize::SanitizedTable;
use crate::theme::Theme;

pub use collapse::{collapse_rows, CollapseRows, VAlign};
pub use footnote::{add_footnote, Footnote};
pub use group::{insert_header_groups, HeaderGroups};
pub use header::protect_header;

/// Everything about a table beyond data, style and column spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    pub layout: TableLayout,
    pub footnote: Option<Footnote>,
    pub header_groups: Option<HeaderGroups>,
    pub collapse: Option<CollapseRows>,
}

impl TableOptions {
    /// Checks that need only the column count.
    pub fn validate(&self, column_count: usize) -> Result<()> {
        if let Some(groups) = &self.header_groups {
            groups.validate(column_count)?;
        }
        if let Some(collapse) = &self.collapse {
            collapse.validate(column_count)?;
        }
        Ok(())
    }
}

/// Final table markup plus the packages it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledTable {
    pub markup: String,
    pub packages: Vec<Package>,
}

/// Render and post-process a table.
pub fn assemble_table(
    renderer: &dyn TableRenderer,
    table: &SanitizedTable,
    style: &Theme,
    spec: &ColumnSpec,
    options: &TableOptions,
) -> Result<AssembledTable> {
    let columns = table.column_count();
    options.validate(columns)?;

    let mut markup = renderer.render(table, style, spec, &options.layout)?;
    let mut packages = renderer.required_packages(style, &options.layout);
    packages.extend(spec.packages.iter().map(Package::new));

    if !spec.decimal_columns.is_empty() {
        log::debug!("protecting header cells {:?}", spec.decimal_columns);
        markup = protect_header(&markup, &spec.decimal_columns);
    }

    if let Some(footnote) = &options.footnote {
        markup = add_footnote(&markup, footnote, columns, options.layout.longtable)?;
        packages.extend(footnote.required_packages(options.layout.longtable));
    }

    if let Some(groups) = &options.header_groups {
        markup = insert_header_groups(&markup, groups, columns)?;
    }

    if let Some(collapse) = &options.collapse {
        markup = collapse_rows(&markup, collapse)?;
        packages.push(Package::new("multirow"));
    }

    Ok(AssembledTable { markup, packages })
}

/// Apply `f` to the lines of `markup`, keeping a trailing newline if present.
pub(crate) fn map_lines<F>(markup: &str, f: F) -> String
where
    F: FnOnce(Vec<String>) -> Vec<String>,
{
    let lines = markup.lines().map(str::to_string).collect();
    let mut out = f(lines).join("\n");
    if markup.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// A table row split into its cell segments and its `\\` tail.
///
/// Segments keep their surrounding whitespace, so joining them back with `&`
/// and appending the tail restores the line byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowLine {
    pub cells: Vec<String>,
    pub tail: String,
}

impl RowLine {
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim_end();
        let body = trimmed.strip_suffix("\\\\")?;
        let tail = line[body.len()..].to_string();
        Some(Self {
            cells: split_cells(body),
            tail,
        })
    }

    pub fn to_line(&self) -> String {
        format!("{}{}", self.cells.join("&"), self.tail)
    }
}

/// Split a row body at unescaped `&`.
fn split_cells(body: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut backslashes = 0usize;
    for c in body.chars() {
        if c == '&' && backslashes % 2 == 0 {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
    }
    cells.push(current);
    cells
}

fn is_rule(line: &str, rule: &str) -> bool {
    line.trim() == rule
}

/// Index of the header row: the first row after `\toprule`.
pub(crate) fn find_header_row(lines: &[String]) -> Option<usize> {
    let top = lines.iter().position(|l| is_rule(l, "\\toprule"))?;
    lines
        .iter()
        .enumerate()
        .skip(top + 1)
        .find(|(_, l)| l.trim_end().ends_with("\\\\"))
        .map(|(index, _)| index)
}

/// Half-open range of the body lines, between `\midrule` and `\bottomrule`.
pub(crate) fn body_range(lines: &[String]) -> Option<(usize, usize)> {
    let header = find_header_row(lines)?;
    let mid = lines
        .iter()
        .enumerate()
        .skip(header + 1)
        .find(|(_, l)| is_rule(l, "\\midrule"))
        .map(|(index, _)| index)?;
    let bottom = lines
        .iter()
        .enumerate()
        .skip(mid + 1)
        .find(|(_, l)| is_rule(l, "\\bottomrule"))
        .map(|(index, _)| index)?;
    Some((mid + 1, bottom))
}
