//! Table themes and style resolution.
//!
//! A [`Theme`] bundles the styling defaults of a table. The effective style of a
//! call is resolved from up to four layers, highest priority first:
//!
//! 1. explicit per-call fields ([`StyleOverrides`])
//! 2. the theme passed with the call ([`ThemeRef`])
//! 3. the registry's current theme, consulted only when no theme was passed
//! 4. the built-in `minimal` theme
//!
//! Layers 2 to 4 do not merge with each other: the first one present is taken
//! whole. Per-call fields then override it field by field, and the default
//! shading color fills in last, only where nothing else set one.

use crate::error::{Result, TableError};
use crate::registry::ThemeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Shading used when neither the theme nor the call picks one.
pub const DEFAULT_SHADING_COLOR: &str = "blue!10";

/// Name of the built-in fallback theme.
pub const MINIMAL_THEME: &str = "minimal";

/// LaTeX font size switches, smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Tiny,
    ScriptSize,
    FootnoteSize,
    Small,
    NormalSize,
    Large,
}

impl FontSize {
    /// The switch command, e.g. `\small`.
    pub fn command(&self) -> &'static str {
        match self {
            FontSize::Tiny => "\\tiny",
            FontSize::ScriptSize => "\\scriptsize",
            FontSize::FootnoteSize => "\\footnotesize",
            FontSize::Small => "\\small",
            FontSize::NormalSize => "\\normalsize",
            FontSize::Large => "\\large",
        }
    }
}

impl FromStr for FontSize {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('\\').to_lowercase().as_str() {
            "tiny" => Ok(FontSize::Tiny),
            "scriptsize" => Ok(FontSize::ScriptSize),
            "footnotesize" => Ok(FontSize::FootnoteSize),
            "small" => Ok(FontSize::Small),
            "normalsize" | "normal" => Ok(FontSize::NormalSize),
            "large" => Ok(FontSize::Large),
            other => Err(TableError::Configuration(format!(
                "unknown font size '{other}'"
            ))),
        }
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command().trim_start_matches('\\'))
    }
}

/// A named bundle of styling defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shading_color: Option<String>,
    #[serde(default = "default_true")]
    pub header_bold: bool,
    #[serde(default)]
    pub font_size: Option<FontSize>,
    #[serde(default)]
    pub striped: bool,
    /// Free-form fields for renderers that understand more than the above
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shading_color: None,
            header_bold: true,
            font_size: None,
            striped: false,
            extensions: BTreeMap::new(),
        }
    }

    /// The hard-coded fallback: bold header, no color, no striping.
    pub fn minimal() -> Self {
        Self::new(MINIMAL_THEME)
    }

    pub fn with_shading(mut self, color: impl Into<String>) -> Self {
        self.shading_color = Some(color.into());
        self
    }

    pub fn with_header_bold(mut self, bold: bool) -> Self {
        self.header_bold = bold;
        self
    }

    pub fn with_font_size(mut self, size: FontSize) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_striping(mut self, striped: bool) -> Self {
        self.striped = striped;
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Themes shipped with the crate. These names can never be registered over.
    pub fn builtins() -> Vec<Theme> {
        vec![
            Theme::minimal(),
            Theme::new("striped")
                .with_shading(DEFAULT_SHADING_COLOR)
                .with_striping(true),
            Theme::new("compact")
                .with_font_size(FontSize::Small)
                .with_header_bold(false),
            Theme::new("academic")
                .with_font_size(FontSize::FootnoteSize)
                .with_extension("caption-position", "top"),
        ]
    }
}

/// A theme passed with a call, either by name or as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeRef {
    Named(String),
    Inline(Theme),
}

impl From<&str> for ThemeRef {
    fn from(name: &str) -> Self {
        ThemeRef::Named(name.to_string())
    }
}

impl From<String> for ThemeRef {
    fn from(name: String) -> Self {
        ThemeRef::Named(name)
    }
}

impl From<Theme> for ThemeRef {
    fn from(theme: Theme) -> Self {
        ThemeRef::Inline(theme)
    }
}

/// Per-call style fields. `None` leaves the theme's value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOverrides {
    pub shading_color: Option<String>,
    pub header_bold: Option<bool>,
    pub font_size: Option<FontSize>,
    pub striped: Option<bool>,
    pub extensions: BTreeMap<String, String>,
}

impl StyleOverrides {
    pub fn is_empty(&self) -> bool {
        self.shading_color.is_none()
            && self.header_bold.is_none()
            && self.font_size.is_none()
            && self.striped.is_none()
            && self.extensions.is_empty()
    }

    /// Set a field from its textual key, as used by `--extra-<key>` on the CLI.
    ///
    /// Unknown keys land in the extension map.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "shading-color" | "shading_color" | "shading" => {
                self.shading_color = Some(value.to_string());
            }
            "header-bold" | "header_bold" => {
                self.header_bold = Some(parse_bool(key, value)?);
            }
            "font-size" | "font_size" => {
                self.font_size = Some(value.parse()?);
            }
            "striped" | "stripe" => {
                self.striped = Some(parse_bool(key, value)?);
            }
            other => {
                self.extensions.insert(other.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    fn apply_to(&self, theme: &mut Theme) {
        if let Some(color) = &self.shading_color {
            theme.shading_color = Some(color.clone());
        }
        if let Some(bold) = self.header_bold {
            theme.header_bold = bold;
        }
        if let Some(size) = self.font_size {
            theme.font_size = Some(size);
        }
        if let Some(striped) = self.striped {
            theme.striped = striped;
        }
        for (key, value) in &self.extensions {
            theme.extensions.insert(key.clone(), value.clone());
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "" | "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        other => Err(TableError::Configuration(format!(
            "invalid boolean value '{other}' for {key}"
        ))),
    }
}

/// Compute the effective style of a call.
///
/// `default_shading` is the lowest layer and only fills an unset shading color.
pub fn resolve_style(
    registry: &ThemeRegistry,
    theme: Option<&ThemeRef>,
    overrides: &StyleOverrides,
    default_shading: &str,
) -> Result<Theme> {
    let mut effective = match theme {
        Some(ThemeRef::Named(name)) => registry.lookup(name)?.clone(),
        Some(ThemeRef::Inline(theme)) => theme.clone(),
        None => registry.current().cloned().unwrap_or_else(Theme::minimal),
    };

    overrides.apply_to(&mut effective);

    if effective.shading_color.is_none() && !default_shading.is_empty() {
        effective.shading_color = Some(default_shading.to_string());
    }

    Ok(effective)
}
