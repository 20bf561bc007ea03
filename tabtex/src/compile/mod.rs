//! Compile-then-crop orchestration
//!
//!     The orchestrator takes a finished document source and produces the
//!     artifact set `<name>.tex`, `<name>.pdf` and `<name>_cropped.pdf` in an
//!     output directory. It is a small state machine:
//!
//!         Prepared -> Compiling -> Compiled -> Cropping -> Cropped
//!                              \-> CompileFailed        \-> CropFailed
//!                                         Compiled -> CropSkipped
//!
//!     Both tools run with their working directory set to the output
//!     directory, the process-wide current directory is never touched.
//!
//!     A failed compile is an error. A failed crop is not: the full document
//!     exists and is returned with `success == false` and the crop detail, see
//!     [`CompileResult::into_result`] to treat it as an error instead.

pub mod logfile;
mod process;
pub mod tools;

use crate::error::{Result, TableError};
use process::run_tool;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tools::tool_name;

pub use tools::{check_tools, ToolOverrides, ToolStatus, Toolchain};

/// Default crop margin in points
pub const DEFAULT_CROP_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStage {
    Prepared,
    Compiling,
    Compiled,
    CompileFailed,
    Cropping,
    Cropped,
    CropFailed,
    CropSkipped,
}

impl CompileStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CompileStage::CompileFailed
                | CompileStage::Cropped
                | CompileStage::CropFailed
                | CompileStage::CropSkipped
        )
    }
}

impl fmt::Display for CompileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompileStage::Prepared => "prepared",
            CompileStage::Compiling => "compiling",
            CompileStage::Compiled => "compiled",
            CompileStage::CompileFailed => "compile failed",
            CompileStage::Cropping => "cropping",
            CompileStage::Cropped => "cropped",
            CompileStage::CropFailed => "crop failed",
            CompileStage::CropSkipped => "crop skipped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropOptions {
    pub enabled: bool,
    /// Margin added around the content, in points
    pub margin: f64,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            margin: DEFAULT_CROP_MARGIN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    pub crop: CropOptions,
    /// Limit for each tool invocation
    pub timeout: Option<Duration>,
    /// Report progress at info level instead of debug
    pub verbose: bool,
}

/// Outcome of a compile/crop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub source_path: PathBuf,
    pub full_artifact: PathBuf,
    pub cropped_artifact: Option<PathBuf>,
    pub stage: CompileStage,
    pub success: bool,
    /// Captured compiler output
    pub log: String,
    pub crop_error: Option<String>,
}

impl CompileResult {
    /// Turn a crop failure into [`TableError::CropFailed`].
    pub fn into_result(self) -> Result<Self> {
        match self.stage {
            CompileStage::CropFailed => Err(TableError::CropFailed {
                full_artifact: self.full_artifact,
                detail: self.crop_error.unwrap_or_default(),
            }),
            _ => Ok(self),
        }
    }

    /// Paths of every artifact that exists after the run
    pub fn artifacts(&self) -> Vec<&Path> {
        let mut paths = vec![self.source_path.as_path(), self.full_artifact.as_path()];
        paths.extend(self.cropped_artifact.as_deref());
        paths
    }
}

/// Drives one document through compile and crop.
#[derive(Debug)]
pub struct Orchestrator {
    toolchain: Toolchain,
    options: CompileOptions,
    stage: CompileStage,
}

impl Orchestrator {
    pub fn new(toolchain: Toolchain, options: CompileOptions) -> Self {
        Self {
            toolchain,
            options,
            stage: CompileStage::Prepared,
        }
    }

    pub fn stage(&self) -> CompileStage {
        self.stage
    }

    fn transition(&mut self, next: CompileStage) {
        let level = if self.options.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        log::log!(level, "{} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Write `source` as `<name>.tex` in `output_dir`, compile it and crop the
    /// result.
    pub fn run(&mut self, source: &str, name: &str, output_dir: &Path) -> Result<CompileResult> {
        self.stage = CompileStage::Prepared;
        fs::create_dir_all(output_dir).map_err(|e| TableError::filesystem(output_dir, e))?;
        remove_stale_artifacts(name, output_dir)?;
        let source_path = output_dir.join(format!("{name}.tex"));
        fs::write(&source_path, source).map_err(|e| TableError::filesystem(&source_path, e))?;

        let (full_artifact, compiler_log) = self.compile(name, output_dir)?;
        let mut result = CompileResult {
            source_path,
            full_artifact,
            cropped_artifact: None,
            stage: self.stage,
            success: true,
            log: compiler_log,
            crop_error: None,
        };

        let cropper = match (&self.toolchain.cropper, self.options.crop.enabled) {
            (Some(cropper), true) => cropper.clone(),
            _ => {
                self.transition(CompileStage::CropSkipped);
                result.stage = self.stage;
                return Ok(result);
            }
        };

        match self.crop(&cropper, name, output_dir) {
            Ok(cropped) => result.cropped_artifact = Some(cropped),
            Err(detail) => {
                log::warn!(
                    "cropping failed, keeping the full document {}: {detail}",
                    result.full_artifact.display()
                );
                result.success = false;
                result.crop_error = Some(detail);
            }
        }
        result.stage = self.stage;
        Ok(result)
    }

    fn compile(&mut self, name: &str, output_dir: &Path) -> Result<(PathBuf, String)> {
        self.transition(CompileStage::Compiling);
        let compiler = tool_name(&self.toolchain.compiler);

        let mut command = Command::new(&self.toolchain.compiler);
        command
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(format!("{name}.tex"))
            .current_dir(output_dir);
        let output = run_tool(&compiler, command, self.options.timeout)?;
        let captured = output.combined();

        if !output.success() {
            self.transition(CompileStage::CompileFailed);
            let log_text = fs::read_to_string(output_dir.join(format!("{name}.log"))).ok();
            let detail = logfile::failure_detail(log_text.as_deref(), &captured);
            return Err(TableError::tool(
                compiler,
                format!("exited with {}:\n{detail}", output.status),
            ));
        }

        let full_artifact = output_dir.join(format!("{name}.pdf"));
        if !full_artifact.is_file() {
            self.transition(CompileStage::CompileFailed);
            return Err(TableError::tool(
                compiler,
                format!("finished but {} was not produced", full_artifact.display()),
            ));
        }
        self.transition(CompileStage::Compiled);
        Ok((full_artifact, captured))
    }

    /// Any failure here, including a cropper that cannot start or times out,
    /// leaves a usable partial result, so it comes back as a detail string.
    fn crop(
        &mut self,
        cropper: &Path,
        name: &str,
        output_dir: &Path,
    ) -> std::result::Result<PathBuf, String> {
        self.transition(CompileStage::Cropping);
        let margin = format_margin(self.options.crop.margin);
        let cropped_name = format!("{name}_cropped.pdf");

        let mut command = Command::new(cropper);
        command
            .arg("--margins")
            .arg(format!("{margin} {margin} {margin} {margin}"))
            .arg(format!("{name}.pdf"))
            .arg(&cropped_name)
            .current_dir(output_dir);
        let output = match run_tool(&tool_name(cropper), command, self.options.timeout) {
            Ok(output) => output,
            Err(err) => {
                self.transition(CompileStage::CropFailed);
                return Err(err.to_string());
            }
        };

        let cropped = output_dir.join(cropped_name);
        if !output.success() {
            self.transition(CompileStage::CropFailed);
            let detail = logfile::failure_detail(None, &output.combined());
            return Err(format!("exited with {}: {detail}", output.status));
        }
        if !cropped.is_file() {
            self.transition(CompileStage::CropFailed);
            return Err(format!("{} was not produced", cropped.display()));
        }
        self.transition(CompileStage::Cropped);
        Ok(cropped)
    }
}

/// Outputs of an earlier run must not pass for outputs of this one.
fn remove_stale_artifacts(name: &str, output_dir: &Path) -> Result<()> {
    for suffix in [".pdf", ".log", "_cropped.pdf"] {
        let path = output_dir.join(format!("{name}{suffix}"));
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("removed stale {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(TableError::filesystem(&path, e)),
        }
    }
    Ok(())
}

fn format_margin(margin: f64) -> String {
    if margin.fract() == 0.0 {
        format!("{margin:.0}")
    } else {
        margin.to_string()
    }
}
