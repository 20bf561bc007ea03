//! Table notes.
//!
//! A [`Footnote`] holds a general note, numbered notes and symbol notes. They
//! are emitted in that order, numbered notes labelled `1, 2, ...` and symbol
//! notes `*, **, ...`. With the wrapper flag set the notes go into a
//! `threeparttable` (or `ThreePartTable` for longtables) so they line up with
//! the table width; otherwise they become full-width rows under the bottom rule.

use crate::document::Package;
use crate::error::{Result, TableError};
use crate::sanitize::escape_markup;
use super::map_lines;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    pub general: Option<String>,
    pub numbered: Vec<String>,
    pub symbol: Vec<String>,
    /// Wrap the table in a note-capable environment
    pub threeparttable: bool,
    /// Prefix of the general note
    pub general_title: String,
    /// Escape the note text. Turn off to pass markup through.
    pub escape: bool,
}

impl Default for Footnote {
    fn default() -> Self {
        Self {
            general: None,
            numbered: Vec::new(),
            symbol: Vec::new(),
            threeparttable: true,
            general_title: "Note:".to_string(),
            escape: true,
        }
    }
}

impl Footnote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_general(mut self, note: impl Into<String>) -> Self {
        self.general = Some(note.into());
        self
    }

    pub fn with_numbered(mut self, note: impl Into<String>) -> Self {
        self.numbered.push(note.into());
        self
    }

    pub fn with_symbol(mut self, note: impl Into<String>) -> Self {
        self.symbol.push(note.into());
        self
    }

    pub fn with_threeparttable(mut self, enabled: bool) -> Self {
        self.threeparttable = enabled;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.general.is_none() && self.numbered.is_empty() && self.symbol.is_empty()
    }

    /// Label of the `index`-th (0-based) numbered note.
    pub fn number_label(index: usize) -> String {
        (index + 1).to_string()
    }

    /// Label of the `index`-th (0-based) symbol note.
    pub fn symbol_label(index: usize) -> String {
        "*".repeat(index + 1)
    }

    pub fn required_packages(&self, longtable: bool) -> Vec<Package> {
        match (self.threeparttable && !self.is_empty(), longtable) {
            (false, _) => Vec::new(),
            (true, false) => vec![Package::new("threeparttable")],
            (true, true) => vec![Package::new("threeparttablex")],
        }
    }

    fn text(&self, note: &str) -> String {
        if self.escape {
            escape_markup(note)
        } else {
            note.to_string()
        }
    }

    /// (label, text) pairs in output order; the general note has no label.
    fn entries(&self) -> Vec<(Option<String>, String)> {
        let mut entries = Vec::new();
        if let Some(general) = &self.general {
            entries.push((None, self.text(general)));
        }
        for (i, note) in self.numbered.iter().enumerate() {
            entries.push((Some(Self::number_label(i)), self.text(note)));
        }
        for (i, note) in self.symbol.iter().enumerate() {
            entries.push((Some(Self::symbol_label(i)), self.text(note)));
        }
        entries
    }

    fn items(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(label, text)| match label {
                None => format!("\\item \\textit{{{}}} {text}", self.general_title),
                Some(label) => format!("\\item[{label}] {text}"),
            })
            .collect()
    }

    /// Label reference for notes set as plain rows.
    fn marker(label: &str) -> String {
        format!("\\textsuperscript{{{label}}}")
    }

    fn rows(&self, column_count: usize) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(label, text)| {
                let content = match label {
                    None => format!("\\textit{{{}}} {text}", self.general_title),
                    Some(label) => format!("{} {text}", Self::marker(&label)),
                };
                format!("\\multicolumn{{{column_count}}}{{l}}{{{content}}}\\\\")
            })
            .collect()
    }
}

fn position_of(lines: &[String], prefix: &str) -> Result<usize> {
    lines
        .iter()
        .position(|l| l.trim_start().starts_with(prefix))
        .ok_or_else(|| TableError::Configuration(format!("cannot place notes: no '{prefix}' line")))
}

/// Inject `footnote` into rendered table markup.
pub fn add_footnote(
    markup: &str,
    footnote: &Footnote,
    column_count: usize,
    longtable: bool,
) -> Result<String> {
    if footnote.is_empty() {
        return Ok(markup.to_string());
    }
    let env = if longtable { "longtable" } else { "tabular" };
    let begin = format!("\\begin{{{env}}}");
    let end = format!("\\end{{{env}}}");

    let mut lines: Vec<String> = markup.lines().map(str::to_string).collect();
    let begin_at = position_of(&lines, &begin)?;
    let end_at = position_of(&lines, &end)?;

    match (footnote.threeparttable, longtable) {
        (true, false) => {
            let mut notes = vec!["\\begin{tablenotes}".to_string()];
            notes.extend(footnote.items());
            notes.push("\\end{tablenotes}".to_string());
            notes.push("\\end{threeparttable}".to_string());
            lines.splice(end_at + 1..end_at + 1, notes);
            lines.insert(begin_at, "\\begin{threeparttable}".to_string());
        }
        (true, true) => {
            lines.splice(end_at..end_at, ["\\insertTableNotes\\\\".to_string()]);
            lines.insert(end_at + 2, "\\end{ThreePartTable}".to_string());
            let mut notes = vec![
                "\\begin{ThreePartTable}".to_string(),
                "\\begin{TableNotes}".to_string(),
            ];
            notes.extend(footnote.items());
            notes.push("\\end{TableNotes}".to_string());
            lines.splice(begin_at..begin_at, notes);
        }
        (false, _) => {
            lines.splice(end_at..end_at, footnote.rows(column_count));
        }
    }

    Ok(map_lines(markup, |_| lines))
}
