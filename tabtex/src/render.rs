//! Base table rendering
//!
//! The [`TableRenderer`] trait turns a sanitized grid, an effective style and a
//! column spec into tabular markup. Everything the table assembler does
//! afterwards (header protection, notes, groups, collapsing) works on the text
//! produced here, so renderers must follow a few layout rules:
//!
//! - one table row per line, terminated by `\\`
//! - cells separated by ` & `
//! - the header is the first row after `\toprule`, the body sits between
//!   `\midrule` and `\bottomrule`
//!
//! [`TabularRenderer`] is the default implementation (booktabs rules, optional
//! longtable, xcolor striping).

use crate::colspec::ColumnSpec;
use crate::document::Package;
use crate::error::{Result, TableError};
use crate::sanitize::SanitizedTable;
use crate::theme::Theme;
use std::fmt::Write;

/// Extension key selecting where the caption goes (`top` or `bottom`).
pub const CAPTION_POSITION_KEY: &str = "caption-position";

/// Placement and float options of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Use `longtable` so the table can break across pages
    pub longtable: bool,
    /// Already escaped caption text
    pub caption: Option<String>,
    pub label: Option<String>,
    /// Float placement specifier for the `table` environment
    pub placement: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            longtable: false,
            caption: None,
            label: None,
            placement: "!htbp".to_string(),
        }
    }
}

impl TableLayout {
    fn is_float(&self) -> bool {
        !self.longtable && (self.caption.is_some() || self.label.is_some())
    }
}

/// Trait for table renderers
///
/// Implementors produce the base markup of a table; see the module docs for the
/// layout the post-processing steps rely on.
pub trait TableRenderer: Send + Sync {
    /// The name of this renderer (e.g., "tabular")
    fn name(&self) -> &str;

    /// Render the base markup
    fn render(
        &self,
        table: &SanitizedTable,
        style: &Theme,
        spec: &ColumnSpec,
        layout: &TableLayout,
    ) -> Result<String>;

    /// Packages the rendered markup depends on
    fn required_packages(&self, _style: &Theme, _layout: &TableLayout) -> Vec<Package> {
        Vec::new()
    }
}

/// booktabs-style `tabular`/`longtable` renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TabularRenderer;

impl TabularRenderer {
    fn stripe_command(style: &Theme) -> Option<String> {
        match (&style.shading_color, style.striped) {
            (Some(color), true) => Some(format!("\\rowcolors{{2}}{{{color}}}{{white}}")),
            _ => None,
        }
    }

    fn caption_lines(layout: &TableLayout) -> String {
        let mut out = String::new();
        if let Some(caption) = &layout.caption {
            let _ = write!(out, "\\caption{{{caption}}}");
        }
        if let Some(label) = &layout.label {
            let _ = write!(out, "\\label{{{label}}}");
        }
        out
    }

    fn header_row(table: &SanitizedTable, style: &Theme) -> String {
        let cells: Vec<String> = table
            .header
            .iter()
            .map(|label| {
                if style.header_bold {
                    format!("\\textbf{{{label}}}")
                } else {
                    label.clone()
                }
            })
            .collect();
        format!("{} \\\\", cells.join(" & "))
    }
}

impl TableRenderer for TabularRenderer {
    fn name(&self) -> &str {
        "tabular"
    }

    fn render(
        &self,
        table: &SanitizedTable,
        style: &Theme,
        spec: &ColumnSpec,
        layout: &TableLayout,
    ) -> Result<String> {
        if spec.len() != table.column_count() {
            return Err(TableError::Configuration(format!(
                "column spec has {} columns but the table has {}",
                spec.len(),
                table.column_count()
            )));
        }

        let caption_at_bottom = style
            .extensions
            .get(CAPTION_POSITION_KEY)
            .is_some_and(|pos| pos == "bottom");
        let captions = Self::caption_lines(layout);
        let env = if layout.longtable {
            "longtable"
        } else {
            "tabular"
        };

        let mut out = String::new();
        if layout.is_float() {
            let _ = writeln!(out, "\\begin{{table}}[{}]", layout.placement);
            out.push_str("\\centering\n");
            if !caption_at_bottom {
                let _ = writeln!(out, "{captions}");
            }
        }
        if let Some(size) = style.font_size {
            let _ = writeln!(out, "{{{}", size.command());
        }
        if let Some(stripes) = Self::stripe_command(style) {
            let _ = writeln!(out, "{stripes}");
        }

        let _ = writeln!(out, "\\begin{{{env}}}{{{}}}", spec.to_markup());
        if layout.longtable && !captions.is_empty() {
            let _ = writeln!(out, "{captions}\\\\");
        }
        out.push_str("\\toprule\n");
        let _ = writeln!(out, "{}", Self::header_row(table, style));
        out.push_str("\\midrule\n");
        if layout.longtable {
            out.push_str("\\endhead\n");
        }
        for row in &table.cells {
            let _ = writeln!(out, "{} \\\\", row.join(" & "));
        }
        out.push_str("\\bottomrule\n");
        let _ = writeln!(out, "\\end{{{env}}}");

        if style.font_size.is_some() {
            out.push_str("}\n");
        }
        if layout.is_float() {
            if caption_at_bottom {
                let _ = writeln!(out, "{captions}");
            }
            out.push_str("\\end{table}\n");
        }
        Ok(out)
    }

    fn required_packages(&self, style: &Theme, layout: &TableLayout) -> Vec<Package> {
        let mut packages = vec![Package::new("booktabs")];
        if Self::stripe_command(style).is_some() {
            packages.push(Package::Structured {
                name: "xcolor".to_string(),
                options: vec!["table".to_string()],
            });
        }
        if layout.longtable {
            packages.push(Package::new("longtable"));
        }
        packages
    }
}
