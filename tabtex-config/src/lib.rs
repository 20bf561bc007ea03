//! Shared configuration loader for tabtex.
//!
//! `defaults/tabtex.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`TabtexConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabtex::compile::{CropOptions, ToolOverrides};
use tabtex::{DocumentOptions, Package, TableError, Theme, ThemeRegistry};

const DEFAULT_TOML: &str = include_str!("../defaults/tabtex.default.toml");

/// Name of the optional per-project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "tabtex.toml";

/// Top-level configuration consumed by tabtex applications.
#[derive(Debug, Clone, Deserialize)]
pub struct TabtexConfig {
    pub output: OutputConfig,
    pub document: DocumentConfig,
    pub style: StyleConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub themes: BTreeMap<String, Theme>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub crop: bool,
    pub crop_margin: f64,
    pub timeout_secs: u64,
}

impl OutputConfig {
    pub fn crop_options(&self) -> CropOptions {
        CropOptions {
            enabled: self.crop,
            margin: self.crop_margin,
        }
    }

    /// `None` when `timeout_secs` is 0.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Preamble settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    pub class: String,
    pub class_options: Vec<String>,
    pub packages: Vec<String>,
    pub raw_packages: Vec<String>,
    pub geometry: Vec<String>,
    #[serde(default)]
    pub font_encoding: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
}

impl DocumentConfig {
    /// Build document options, validating every package description.
    pub fn document_options(&self) -> Result<DocumentOptions, TableError> {
        let mut extra_packages = self
            .packages
            .iter()
            .map(|spec| parse_package(spec))
            .collect::<Result<Vec<_>, _>>()?;
        extra_packages.extend(self.raw_packages.iter().map(Package::raw));

        Ok(DocumentOptions {
            class: self.class.clone(),
            class_options: self.class_options.clone(),
            font_encoding: non_empty(&self.font_encoding),
            font: non_empty(&self.font),
            language: non_empty(&self.language),
            geometry: self.geometry.clone(),
            extra_packages,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse `name` or `name[opt1,opt2]` into a validated package.
pub fn parse_package(spec: &str) -> Result<Package, TableError> {
    let spec = spec.trim();
    let (name, options) = match spec.split_once('[') {
        Some((name, rest)) => {
            let options = rest.strip_suffix(']').ok_or_else(|| {
                TableError::Configuration(format!("invalid package description '{spec}'"))
            })?;
            (name, options.split(',').map(str::trim).collect::<Vec<_>>())
        }
        None => (spec, Vec::new()),
    };
    options
        .into_iter()
        .fold(Package::builder(name.trim()), |builder, option| builder.option(option))
        .build()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    pub theme: Option<String>,
    pub shading_color: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub compiler: Option<PathBuf>,
    #[serde(default)]
    pub cropper: Option<PathBuf>,
}

impl From<&ToolsConfig> for ToolOverrides {
    fn from(config: &ToolsConfig) -> Self {
        ToolOverrides {
            compiler: config.compiler.clone(),
            cropper: config.cropper.clone(),
        }
    }
}

impl TabtexConfig {
    /// Register the `[themes.*]` tables, then point the registry's current
    /// theme at `style.theme` when it is set.
    pub fn apply_themes(&self, registry: &mut ThemeRegistry) -> Result<(), TableError> {
        for (name, theme) in &self.themes {
            registry.register(theme.clone(), Some(name), true)?;
        }
        if let Some(theme) = non_empty(&self.style.theme) {
            registry.set_current(Some(theme.into()))?;
        }
        Ok(())
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<TabtexConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<TabtexConfig, ConfigError> {
    Loader::new().build()
}
