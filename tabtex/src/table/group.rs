//! Grouped header row above the column header.

use super::{find_header_row, map_lines};
use crate::error::{Result, TableError};
use crate::sanitize::escape_markup;

/// Ordered (label, span) pairs. An empty label leaves its columns ungrouped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderGroups {
    groups: Vec<(String, usize)>,
}

impl HeaderGroups {
    pub fn new<S: Into<String>>(groups: Vec<(S, usize)>) -> Self {
        Self {
            groups: groups
                .into_iter()
                .map(|(label, span)| (label.into(), span))
                .collect(),
        }
    }

    pub fn groups(&self) -> &[(String, usize)] {
        &self.groups
    }

    pub fn total_span(&self) -> usize {
        self.groups.iter().map(|(_, span)| span).sum()
    }

    /// Spans must be positive and add up to `column_count`.
    pub fn validate(&self, column_count: usize) -> Result<()> {
        if let Some((label, _)) = self.groups.iter().find(|(_, span)| *span == 0) {
            return Err(TableError::Configuration(format!(
                "header group '{label}' has a zero span"
            )));
        }
        let total = self.total_span();
        if total != column_count {
            return Err(TableError::Configuration(format!(
                "header groups span {total} columns but the table has {column_count}"
            )));
        }
        Ok(())
    }

    fn row(&self) -> String {
        let cells: Vec<String> = self
            .groups
            .iter()
            .map(|(label, span)| match (label.trim().is_empty(), *span) {
                (true, 1) => String::new(),
                (true, span) => format!("\\multicolumn{{{span}}}{{c}}{{}}"),
                (false, span) => {
                    format!("\\multicolumn{{{span}}}{{c}}{{{}}}", escape_markup(label))
                }
            })
            .collect();
        format!("{} \\\\", cells.join(" & "))
    }

    fn rules(&self) -> Option<String> {
        let mut start = 1;
        let mut rules = Vec::new();
        for (label, span) in &self.groups {
            let end = start + span - 1;
            if !label.trim().is_empty() {
                rules.push(format!("\\cmidrule(lr){{{start}-{end}}}"));
            }
            start = end + 1;
        }
        (!rules.is_empty()).then(|| rules.join(" "))
    }
}

/// Insert the grouped header row directly above the column header.
pub fn insert_header_groups(
    markup: &str,
    groups: &HeaderGroups,
    column_count: usize,
) -> Result<String> {
    groups.validate(column_count)?;

    let lines: Vec<String> = markup.lines().map(str::to_string).collect();
    let index = find_header_row(&lines).ok_or_else(|| {
        TableError::Configuration("cannot place header groups: no header row".to_string())
    })?;

    Ok(map_lines(markup, |mut lines| {
        let mut inserted = vec![groups.row()];
        inserted.extend(groups.rules());
        lines.splice(index..index, inserted);
        lines
    }))
}
