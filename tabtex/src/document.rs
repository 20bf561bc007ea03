//! Standalone document assembly.
//!
//! Wraps an assembled table in a complete, compilable document: class line,
//! deduplicated package list, and an empty page style so the cropper only sees
//! the table.

use crate::error::{Result, TableError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

static PACKAGE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("valid package name pattern"));

const FORBIDDEN_OPTION_CHARS: &[char] = &[',', '[', ']', '{', '}'];

/// A `\usepackage` line, either built from parts or passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Package {
    Structured { name: String, options: Vec<String> },
    Raw(String),
}

impl Package {
    /// A package without options. Use [`Package::builder`] for validated options.
    pub fn new(name: impl Into<String>) -> Self {
        Package::Structured {
            name: name.into(),
            options: Vec::new(),
        }
    }

    pub fn builder(name: impl Into<String>) -> PackageBuilder {
        PackageBuilder {
            name: name.into(),
            options: Vec::new(),
        }
    }

    /// Text inserted into the preamble as-is, e.g. `\usepackage[x]{y}` or
    /// any other preamble command.
    pub fn raw(text: impl Into<String>) -> Self {
        Package::Raw(text.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Package::Structured { name, .. } => Some(name),
            Package::Raw(_) => None,
        }
    }

    pub fn to_markup(&self) -> String {
        match self {
            Package::Structured { name, options } if options.is_empty() => {
                format!("\\usepackage{{{name}}}")
            }
            Package::Structured { name, options } => {
                format!("\\usepackage[{}]{{{name}}}", options.join(","))
            }
            Package::Raw(text) => text.trim().to_string(),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Package::Structured { name, options } => {
                if !PACKAGE_NAME.is_match(name) {
                    return Err(TableError::Configuration(format!(
                        "invalid package name '{name}'"
                    )));
                }
                for option in options {
                    check_option(name, option)?;
                }
                Ok(())
            }
            Package::Raw(text) if text.trim().is_empty() => Err(TableError::Configuration(
                "raw package text is empty".to_string(),
            )),
            Package::Raw(_) => Ok(()),
        }
    }
}

fn check_option(package: &str, option: &str) -> Result<()> {
    if option.trim().is_empty() || option.contains(FORBIDDEN_OPTION_CHARS) {
        return Err(TableError::Configuration(format!(
            "invalid option '{option}' for package '{package}'"
        )));
    }
    Ok(())
}

/// Builder for [`Package::Structured`] that validates as it goes.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    name: String,
    options: Vec<String>,
}

impl PackageBuilder {
    /// A flag option, e.g. `table` in `\usepackage[table]{xcolor}`.
    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    /// A `key=value` option.
    pub fn key_value(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.options.push(format!("{key}={}", value.as_ref()));
        self
    }

    pub fn build(self) -> Result<Package> {
        let package = Package::Structured {
            name: self.name,
            options: self.options,
        };
        package.validate()?;
        Ok(package)
    }
}

/// Merge package lists keeping first-seen order.
///
/// Structured packages with the same name collapse into one entry with the
/// union of their options; raw entries are deduplicated by exact text.
pub fn merge_packages<'a, I>(packages: I) -> Vec<Package>
where
    I: IntoIterator<Item = &'a Package>,
{
    let mut merged: Vec<Package> = Vec::new();
    for package in packages {
        match package {
            Package::Structured { name, options } => {
                let existing = merged.iter_mut().find_map(|p| match p {
                    Package::Structured {
                        name: existing_name,
                        options: existing_options,
                    } if existing_name == name => Some(existing_options),
                    _ => None,
                });
                match existing {
                    Some(existing_options) => {
                        for option in options {
                            if !existing_options.contains(option) {
                                existing_options.push(option.clone());
                            }
                        }
                    }
                    None => merged.push(package.clone()),
                }
            }
            Package::Raw(text) => {
                let duplicate = merged
                    .iter()
                    .any(|p| matches!(p, Package::Raw(existing) if existing.trim() == text.trim()));
                if !duplicate {
                    merged.push(package.clone());
                }
            }
        }
    }
    merged
}

/// Preamble settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    pub class: String,
    pub class_options: Vec<String>,
    /// Font encoding passed to fontenc (`T1` by default)
    pub font_encoding: Option<String>,
    /// Font package, e.g. `lmodern`
    pub font: Option<String>,
    /// babel language
    pub language: Option<String>,
    /// geometry options, e.g. `margin=1in`
    pub geometry: Vec<String>,
    pub extra_packages: Vec<Package>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            class: "article".to_string(),
            class_options: Vec::new(),
            font_encoding: Some("T1".to_string()),
            font: None,
            language: None,
            geometry: Vec::new(),
            extra_packages: Vec::new(),
        }
    }
}

impl DocumentOptions {
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.extra_packages.push(package);
        self
    }

    pub fn with_geometry(mut self, option: impl Into<String>) -> Self {
        self.geometry.push(option.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    /// Packages implied by the font, language and geometry settings.
    fn base_packages(&self) -> Vec<Package> {
        let mut packages = Vec::new();
        if let Some(encoding) = &self.font_encoding {
            packages.push(Package::Structured {
                name: "fontenc".to_string(),
                options: vec![encoding.clone()],
            });
        }
        if let Some(font) = &self.font {
            packages.push(Package::new(font.clone()));
        }
        if let Some(language) = &self.language {
            packages.push(Package::Structured {
                name: "babel".to_string(),
                options: vec![language.clone()],
            });
        }
        if !self.geometry.is_empty() {
            packages.push(Package::Structured {
                name: "geometry".to_string(),
                options: self.geometry.clone(),
            });
        }
        packages
    }

    fn validate(&self) -> Result<()> {
        if !PACKAGE_NAME.is_match(&self.class) {
            return Err(TableError::Configuration(format!(
                "invalid document class '{}'",
                self.class
            )));
        }
        for option in &self.class_options {
            check_option(&self.class, option)?;
        }
        Ok(())
    }
}

/// Build the complete document source.
///
/// `table_packages` are the packages the table markup needs (including the
/// decimal-column packages); they are merged with the preamble settings and the
/// caller's extra packages, without duplicates.
pub fn build_document(
    options: &DocumentOptions,
    table_packages: &[Package],
    body: &str,
) -> Result<String> {
    options.validate()?;

    let base = options.base_packages();
    let all = base
        .iter()
        .chain(table_packages)
        .chain(&options.extra_packages);
    let packages = merge_packages(all);
    for package in &packages {
        package.validate()?;
    }

    let mut out = String::new();
    if options.class_options.is_empty() {
        let _ = writeln!(out, "\\documentclass{{{}}}", options.class);
    } else {
        let _ = writeln!(
            out,
            "\\documentclass[{}]{{{}}}",
            options.class_options.join(","),
            options.class
        );
    }
    for package in &packages {
        let _ = writeln!(out, "{}", package.to_markup());
    }
    out.push_str("\\pagestyle{empty}\n");
    out.push_str("\\begin{document}\n");
    out.push_str(body.trim_end());
    out.push('\n');
    out.push_str("\\end{document}\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validates_options() {
        let package = Package::builder("geometry")
            .key_value("margin", "1in")
            .option("landscape")
            .build()
            .unwrap();
        assert_eq!(
            package.to_markup(),
            "\\usepackage[margin=1in,landscape]{geometry}"
        );

        assert!(Package::builder("bad name").build().is_err());
        assert!(Package::builder("xcolor").option("a,b").build().is_err());
    }

    #[test]
    fn merge_unions_options_and_drops_duplicates() {
        let packages = vec![
            Package::new("booktabs"),
            Package::raw("\\usepackage{amsmath}"),
            Package::Structured {
                name: "xcolor".into(),
                options: vec!["table".into()],
            },
            Package::new("booktabs"),
            Package::Structured {
                name: "xcolor".into(),
                options: vec!["dvipsnames".into(), "table".into()],
            },
            Package::raw("\\usepackage{amsmath} "),
        ];
        let merged = merge_packages(&packages);
        let lines: Vec<String> = merged.iter().map(Package::to_markup).collect();
        assert_eq!(
            lines,
            vec![
                "\\usepackage{booktabs}",
                "\\usepackage{amsmath}",
                "\\usepackage[table,dvipsnames]{xcolor}",
            ]
        );
    }

    #[test]
    fn document_contains_preamble_and_body() {
        let options = DocumentOptions::default()
            .with_geometry("margin=1in")
            .with_language("english")
            .with_font("lmodern")
            .with_package(Package::new("siunitx"));
        let doc = build_document(
            &options,
            &[Package::new("booktabs"), Package::new("siunitx")],
            "BODY\n",
        )
        .unwrap();

        assert!(doc.starts_with("\\documentclass{article}\n\\usepackage[T1]{fontenc}\n"));
        assert!(doc.contains("\\usepackage{lmodern}\n"));
        assert!(doc.contains("\\usepackage[english]{babel}\n"));
        assert!(doc.contains("\\usepackage[margin=1in]{geometry}\n"));
        assert_eq!(doc.matches("\\usepackage{siunitx}").count(), 1);
        assert!(doc.ends_with("\\begin{document}\nBODY\n\\end{document}\n"));
    }

    #[test]
    fn rejects_invalid_class() {
        let options = DocumentOptions::default().with_class("art icle");
        assert!(matches!(
            build_document(&options, &[], ""),
            Err(TableError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_invalid_extra_package() {
        let options = DocumentOptions::default().with_package(Package::new("no/slash"));
        assert!(build_document(&options, &[], "").is_err());
    }
}
