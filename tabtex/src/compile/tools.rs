//! Locating the compiler and cropper binaries.
//!
//! Resolution order for each tool: explicit path, then the `TABTEX_COMPILER` /
//! `TABTEX_CROPPER` environment variables, then a `PATH` search for the
//! default binary name.

use crate::error::{Result, TableError};
use std::env;
use std::path::{Path, PathBuf};
use which::which;

pub const COMPILER_ENV: &str = "TABTEX_COMPILER";
pub const CROPPER_ENV: &str = "TABTEX_CROPPER";
pub const DEFAULT_COMPILER: &str = "pdflatex";
pub const DEFAULT_CROPPER: &str = "pdfcrop";

/// Explicit tool locations, usually from configuration or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOverrides {
    pub compiler: Option<PathBuf>,
    pub cropper: Option<PathBuf>,
}

/// Resolved tool paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub compiler: PathBuf,
    /// `None` when cropping is disabled
    pub cropper: Option<PathBuf>,
}

impl Toolchain {
    /// Find the tools before anything is written. The cropper is only looked up
    /// when `crop` is set.
    pub fn resolve(overrides: &ToolOverrides, crop: bool) -> Result<Self> {
        let compiler = locate(overrides.compiler.as_deref(), COMPILER_ENV, DEFAULT_COMPILER)?;
        let cropper = if crop {
            Some(locate(
                overrides.cropper.as_deref(),
                CROPPER_ENV,
                DEFAULT_CROPPER,
            )?)
        } else {
            None
        };
        log::debug!("using compiler {}", compiler.display());
        Ok(Toolchain { compiler, cropper })
    }
}

/// Availability of one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub name: &'static str,
    pub path: Option<PathBuf>,
    /// Why the tool could not be found
    pub problem: Option<String>,
}

impl ToolStatus {
    pub fn available(&self) -> bool {
        self.path.is_some()
    }
}

/// Report which tools can be found, without failing.
pub fn check_tools(overrides: &ToolOverrides) -> Vec<ToolStatus> {
    let probe = |name, explicit: Option<&Path>, var| match locate(explicit, var, name) {
        Ok(path) => ToolStatus {
            name,
            path: Some(path),
            problem: None,
        },
        Err(err) => ToolStatus {
            name,
            path: None,
            problem: Some(err.to_string()),
        },
    };
    vec![
        probe(DEFAULT_COMPILER, overrides.compiler.as_deref(), COMPILER_ENV),
        probe(DEFAULT_CROPPER, overrides.cropper.as_deref(), CROPPER_ENV),
    ]
}

fn locate(explicit: Option<&Path>, env_var: &str, default: &str) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return find(path, default);
    }
    if let Some(path) = env::var_os(env_var) {
        if !path.is_empty() {
            return find(Path::new(&path), default);
        }
    }
    which(default).map_err(|_| {
        TableError::tool(
            default,
            format!("'{default}' not found on PATH. Install it or set {env_var} to override the detection."),
        )
    })
}

/// An existing file is taken as-is, anything else is looked up on `PATH`.
fn find(path: &Path, tool: &str) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    which(path).map_err(|_| TableError::tool(tool, format!("'{}' not found", path.display())))
}

/// Short name of a tool for messages.
pub(crate) fn tool_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
