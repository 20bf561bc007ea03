//! Typeset tables from tabular data
//!
//!     This crate turns a table (or a tidy view of a statistical result) into a set of
//!     includable artifacts: the generated LaTeX source, the compiled PDF and a cropped PDF
//!     holding only the table.
//!
//!     This is a pure lib, that is, it powers tabtex-cli but is shell agnostic: nothing here
//!     prints to stdout or reads command line arguments. The only environment it consults is
//!     the tool override variables (see ./compile/tools.rs).
//!
//! Pipeline
//!
//!     DataTable ─▶ sanitize ─▶ theme resolution ─▶ column spec ─▶ table assembly
//!               ─▶ document assembly ─▶ compile ─▶ crop
//!
//!     Every step before compile is pure and returns a Result; validation and configuration
//!     errors surface there, before anything is written. [`publish::publish`] runs the whole
//!     chain, [`publish::render_source`] stops before the disk.
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # TableError
//!     ├── data.rs                 # DataTable, CSV loading
//!     ├── sanitize.rs             # escaping of names, cells, filenames
//!     ├── theme.rs                # Theme, StyleOverrides, resolve_style
//!     ├── registry.rs             # ThemeRegistry and the process-wide instance
//!     ├── colspec.rs              # alignment parsing, decimal columns
//!     ├── render.rs               # TableRenderer trait, TabularRenderer
//!     ├── table                   # post-processing of rendered markup
//!     │   ├── header.rs
//!     │   ├── footnote.rs
//!     │   ├── group.rs
//!     │   └── collapse.rs
//!     ├── document.rs             # preamble and packages
//!     ├── compile                 # compile/crop state machine (native-export)
//!     ├── tidy.rs                 # JSON results to DataTable
//!     └── publish.rs              # PublishSpec, render_source, publish
//!
//! Post-processing
//!
//!     The table steps operate on the rendered text rather than on a tree. They depend on
//!     the row layout described in ./render.rs: one row per line, header right after
//!     \toprule, body between \midrule and \bottomrule. A custom renderer has to keep to it.
//!
//! Themes
//!
//!     The effective style of a call comes from per-call fields, then the theme passed with
//!     the call, then the current theme, then `minimal`. See ./theme.rs for the exact rules.
//!     The process-wide registry lives behind a lock; pass a registry of your own with
//!     [`publish::PublishSpec::with_registry`] to stay independent of global state.

pub mod colspec;
#[cfg(feature = "native-export")]
pub mod compile;
pub mod data;
pub mod document;
pub mod error;
pub mod publish;
pub mod registry;
pub mod render;
pub mod sanitize;
pub mod table;
pub mod theme;
pub mod tidy;

pub use colspec::{detect_decimal_columns, Alignment, ColumnDirective, ColumnSpec, DecimalSpec};
pub use data::DataTable;
pub use document::{build_document, DocumentOptions, Package};
pub use error::{Result, TableError};
pub use publish::{render_source, write_source, GeneratedSource, PublishSpec};
pub use registry::ThemeRegistry;
pub use render::{TableRenderer, TabularRenderer};
pub use sanitize::{
    sanitize_column_names, sanitize_filename, sanitize_jobname, sanitize_table,
    sanitize_table_cells,
};
pub use table::{protect_header, CollapseRows, Footnote, HeaderGroups, VAlign};
pub use theme::{resolve_style, FontSize, StyleOverrides, Theme, ThemeRef};
pub use tidy::AdapterRegistry;

#[cfg(feature = "native-export")]
pub use compile::{check_tools, CompileResult, CompileStage, CropOptions, ToolOverrides};
#[cfg(feature = "native-export")]
pub use publish::publish;
