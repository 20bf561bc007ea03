//! Table publishing pipeline.
//!
//! Provides the single-call API: a [`PublishSpec`] describes the table and every
//! option, [`render_source`] turns it into document source, and [`publish`]
//! additionally compiles and crops it.
//!
//! All validation (theme names, column specs, header-group spans, package
//! descriptions, tool discovery) happens before anything is written to disk.
//!
//! For more control, use the pieces directly: [`crate::theme::resolve_style`],
//! [`crate::table::assemble_table`], [`crate::document::build_document`] and
//! [`crate::compile::Orchestrator`].

use crate::colspec::{Alignment, ColumnSpec};
use crate::data::DataTable;
use crate::document::{build_document, DocumentOptions};
use crate::error::{Result, TableError};
use crate::registry::{read_global, ThemeRegistry};
use crate::render::{TableLayout, TableRenderer, TabularRenderer};
use crate::sanitize::{escape_markup, sanitize_jobname, sanitize_table};
use crate::table::{assemble_table, CollapseRows, Footnote, HeaderGroups, TableOptions};
use crate::theme::{resolve_style, StyleOverrides, Theme, ThemeRef, DEFAULT_SHADING_COLOR};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "native-export")]
use crate::compile::{CompileOptions, CompileResult, CropOptions, Orchestrator, ToolOverrides, Toolchain};

/// Specifies how to publish a table.
///
/// Use the builder pattern to configure the publication:
///
/// ```ignore
/// let spec = PublishSpec::new(&table)
///     .with_output_directory("out")
///     .with_theme("striped")
///     .with_caption("Model estimates");
/// ```
pub struct PublishSpec<'a> {
    pub table: &'a DataTable,
    /// Output base name; derived from the table name when absent.
    pub filename: Option<String>,
    pub output_directory: PathBuf,
    pub theme: Option<ThemeRef>,
    pub style: StyleOverrides,
    /// Lowest-priority shading color. It only shows up in the output when the
    /// effective style is striped; under `minimal` it has no visible effect.
    pub shading_color: String,
    pub alignment: Alignment,
    pub longtable: bool,
    pub caption: Option<String>,
    pub label: Option<String>,
    pub footnote: Option<Footnote>,
    pub header_groups: Option<HeaderGroups>,
    pub collapse: Option<CollapseRows>,
    pub document: DocumentOptions,
    #[cfg(feature = "native-export")]
    pub crop: CropOptions,
    #[cfg(feature = "native-export")]
    pub tools: ToolOverrides,
    pub timeout: Option<Duration>,
    pub verbose: bool,
    /// Resolve themes against this registry instead of the process-wide one.
    pub registry: Option<&'a ThemeRegistry>,
    pub renderer: Option<&'a dyn TableRenderer>,
}

impl<'a> PublishSpec<'a> {
    pub fn new(table: &'a DataTable) -> Self {
        Self {
            table,
            filename: None,
            output_directory: PathBuf::from("."),
            theme: None,
            style: StyleOverrides::default(),
            shading_color: DEFAULT_SHADING_COLOR.to_string(),
            alignment: Alignment::Auto,
            longtable: false,
            caption: None,
            label: None,
            footnote: None,
            header_groups: None,
            collapse: None,
            document: DocumentOptions::default(),
            #[cfg(feature = "native-export")]
            crop: CropOptions::default(),
            #[cfg(feature = "native-export")]
            tools: ToolOverrides::default(),
            timeout: None,
            verbose: false,
            registry: None,
            renderer: None,
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    pub fn with_output_directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_directory = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_theme(mut self, theme: impl Into<ThemeRef>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn with_style(mut self, style: StyleOverrides) -> Self {
        self.style = style;
        self
    }

    /// See [`PublishSpec::shading_color`]: visible on striped styles only.
    pub fn with_shading_color(mut self, color: impl Into<String>) -> Self {
        self.shading_color = color.into();
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_longtable(mut self, longtable: bool) -> Self {
        self.longtable = longtable;
        self
    }

    /// Caption text; escaped during rendering.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_footnote(mut self, footnote: Footnote) -> Self {
        self.footnote = Some(footnote);
        self
    }

    pub fn with_header_groups(mut self, groups: HeaderGroups) -> Self {
        self.header_groups = Some(groups);
        self
    }

    pub fn with_collapse(mut self, collapse: CollapseRows) -> Self {
        self.collapse = Some(collapse);
        self
    }

    pub fn with_document(mut self, document: DocumentOptions) -> Self {
        self.document = document;
        self
    }

    #[cfg(feature = "native-export")]
    pub fn with_crop(mut self, enabled: bool) -> Self {
        self.crop.enabled = enabled;
        self
    }

    #[cfg(feature = "native-export")]
    pub fn with_crop_margin(mut self, margin: f64) -> Self {
        self.crop.margin = margin;
        self
    }

    #[cfg(feature = "native-export")]
    pub fn with_tools(mut self, tools: ToolOverrides) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_registry(mut self, registry: &'a ThemeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_renderer(mut self, renderer: &'a dyn TableRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Base name of the output files.
    pub fn output_name(&self) -> String {
        let name = self
            .filename
            .as_deref()
            .or(self.table.name())
            .unwrap_or("table");
        sanitize_jobname(name)
    }

    fn effective_style(&self) -> Result<Theme> {
        match self.registry {
            Some(registry) => resolve_style(
                registry,
                self.theme.as_ref(),
                &self.style,
                &self.shading_color,
            ),
            None => {
                let registry = read_global();
                resolve_style(&registry, self.theme.as_ref(), &self.style, &self.shading_color)
            }
        }
    }

    fn log_progress(&self, message: &str) {
        let level = if self.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        log::log!(level, "{message}");
    }
}

/// Document source ready to be written or compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    /// Base name of the output files
    pub name: String,
    pub source: String,
}

/// Build the complete document source for `spec` without touching the disk.
///
/// # Errors
///
/// Returns [`TableError::InputValidation`] for an empty table and
/// [`TableError::Configuration`] for any option that cannot be satisfied.
pub fn render_source(spec: &PublishSpec<'_>) -> Result<GeneratedSource> {
    let table = spec.table;
    if table.is_empty() {
        return Err(TableError::InputValidation(
            "table has no rows".to_string(),
        ));
    }
    let name = spec.output_name();
    spec.log_progress(&format!(
        "rendering '{name}' ({} rows x {} columns)",
        table.row_count(),
        table.column_count()
    ));

    let style = spec.effective_style()?;
    let column_spec = ColumnSpec::build(&spec.alignment, &table.numeric_columns())?;
    let options = TableOptions {
        layout: TableLayout {
            longtable: spec.longtable,
            caption: spec.caption.as_deref().map(escape_markup),
            label: spec.label.clone(),
            ..TableLayout::default()
        },
        footnote: spec.footnote.clone(),
        header_groups: spec.header_groups.clone(),
        collapse: spec.collapse.clone(),
    };
    options.validate(table.column_count())?;

    let sanitized = sanitize_table(table);
    let renderer = spec.renderer.unwrap_or(&TabularRenderer);
    log::debug!("rendering with '{}' and theme '{}'", renderer.name(), style.name);
    let assembled = assemble_table(renderer, &sanitized, &style, &column_spec, &options)?;
    let source = build_document(&spec.document, &assembled.packages, &assembled.markup)?;

    Ok(GeneratedSource { name, source })
}

/// Render and write `<name>.tex` only.
pub fn write_source(spec: &PublishSpec<'_>) -> Result<PathBuf> {
    let generated = render_source(spec)?;
    let dir = &spec.output_directory;
    fs::create_dir_all(dir).map_err(|e| TableError::filesystem(dir, e))?;
    let path = dir.join(format!("{}.tex", generated.name));
    fs::write(&path, generated.source).map_err(|e| TableError::filesystem(&path, e))?;
    spec.log_progress(&format!("wrote {}", path.display()));
    Ok(path)
}

/// Render, compile and crop a table.
///
/// A crop failure is reported in the returned [`CompileResult`] (see
/// [`CompileResult::into_result`]); every other failure is an error.
#[cfg(feature = "native-export")]
pub fn publish(spec: PublishSpec<'_>) -> Result<CompileResult> {
    let generated = render_source(&spec)?;
    let toolchain = Toolchain::resolve(&spec.tools, spec.crop.enabled)?;

    let mut orchestrator = Orchestrator::new(
        toolchain,
        CompileOptions {
            crop: spec.crop,
            timeout: spec.timeout,
            verbose: spec.verbose,
        },
    );
    let result = orchestrator.run(&generated.source, &generated.name, &spec.output_directory)?;
    spec.log_progress(&format!(
        "published '{}' ({})",
        generated.name, result.stage
    ));
    Ok(result)
}
