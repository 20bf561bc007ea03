//! Column specifications.
//!
//! An [`Alignment`] is what the caller asks for; a [`ColumnSpec`] is what the
//! renderer consumes: one directive per column, the positions of the
//! decimal-aligned columns (their headers need protecting) and the packages the
//! directives pull in.
//!
//! Decimal alignment uses the siunitx `S` column type. Directives can be given
//! structurally ([`DecimalSpec`]) or as raw text (`S`, `S[table-format=3.2]`);
//! both are recognized as decimal columns.

use crate::error::{Result, TableError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static DECIMAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S(\[[^\]]*\])?$").expect("valid decimal column pattern"));

static TABLE_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^S\[table-format=(-?)(\d+)\.(\d+)\]$").expect("valid table-format pattern")
});

static PLAIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([lcr]|[pmb]\{[^{}]+\})$").expect("valid plain column pattern"));

const SIUNITX: &str = "siunitx";

/// Decimal-aligned column: `integer_digits.decimal_digits`, optionally signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalSpec {
    pub integer_digits: u32,
    pub decimal_digits: u32,
    pub signed: bool,
    packages: Vec<String>,
}

impl DecimalSpec {
    pub fn new(integer_digits: u32, decimal_digits: u32) -> Self {
        Self {
            integer_digits,
            decimal_digits,
            signed: false,
            packages: vec![SIUNITX.to_string()],
        }
    }

    /// Reserve room for a minus sign.
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Add a package the column depends on beyond siunitx.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        if !self.packages.contains(&package) {
            self.packages.push(package);
        }
        self
    }

    /// Parse `3.2` or `-3.2`.
    pub fn parse_format(format: &str) -> Result<Self> {
        let (signed, digits) = match format.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, format),
        };
        let invalid = || {
            TableError::Configuration(format!(
                "invalid decimal format '{format}' (expected integer-digits.decimal-digits)"
            ))
        };
        let (int_part, dec_part) = digits.split_once('.').ok_or_else(invalid)?;
        let integer_digits = int_part.parse::<u32>().map_err(|_| invalid())?;
        let decimal_digits = dec_part.parse::<u32>().map_err(|_| invalid())?;
        let spec = Self::new(integer_digits, decimal_digits);
        Ok(if signed { spec.signed() } else { spec })
    }

    /// The `integer.decimal` format string.
    pub fn format(&self) -> String {
        let sign = if self.signed { "-" } else { "" };
        format!("{sign}{}.{}", self.integer_digits, self.decimal_digits)
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }
}

/// One column of the spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDirective {
    /// `l`, `c`, `r`, or a width column such as `p{3cm}`
    Plain(String),
    Decimal(DecimalSpec),
    /// Passed to the renderer untouched
    Raw(String),
}

impl ColumnDirective {
    pub fn left() -> Self {
        ColumnDirective::Plain("l".to_string())
    }

    pub fn center() -> Self {
        ColumnDirective::Plain("c".to_string())
    }

    pub fn right() -> Self {
        ColumnDirective::Plain("r".to_string())
    }

    pub fn decimal(integer_digits: u32, decimal_digits: u32) -> Self {
        ColumnDirective::Decimal(DecimalSpec::new(integer_digits, decimal_digits))
    }

    /// Classify a single column token.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if let Some(caps) = TABLE_FORMAT.captures(token) {
            let integer_digits = caps[2].parse::<u32>();
            let decimal_digits = caps[3].parse::<u32>();
            if let (Ok(integer_digits), Ok(decimal_digits)) = (integer_digits, decimal_digits) {
                let spec = DecimalSpec::new(integer_digits, decimal_digits);
                return ColumnDirective::Decimal(if caps[1].is_empty() {
                    spec
                } else {
                    spec.signed()
                });
            }
        }
        if PLAIN_PATTERN.is_match(token) {
            ColumnDirective::Plain(token.to_string())
        } else {
            ColumnDirective::Raw(token.to_string())
        }
    }

    /// True for structured decimal specs and for raw `S` / `S[...]` strings.
    pub fn is_decimal(&self) -> bool {
        match self {
            ColumnDirective::Decimal(_) => true,
            ColumnDirective::Raw(raw) => DECIMAL_PATTERN.is_match(raw.trim()),
            ColumnDirective::Plain(_) => false,
        }
    }

    /// The column definition as written into the tabular preamble.
    pub fn to_markup(&self) -> String {
        match self {
            ColumnDirective::Plain(token) | ColumnDirective::Raw(token) => token.clone(),
            ColumnDirective::Decimal(spec) => format!("S[table-format={}]", spec.format()),
        }
    }

    fn packages(&self) -> Vec<String> {
        match self {
            ColumnDirective::Decimal(spec) => spec.packages().to_vec(),
            ColumnDirective::Raw(_) if self.is_decimal() => vec![SIUNITX.to_string()],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for ColumnDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

impl From<&str> for ColumnDirective {
    fn from(token: &str) -> Self {
        ColumnDirective::parse(token)
    }
}

impl From<DecimalSpec> for ColumnDirective {
    fn from(spec: DecimalSpec) -> Self {
        ColumnDirective::Decimal(spec)
    }
}

/// What the caller asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Right-align numeric columns, left-align the rest
    #[default]
    Auto,
    /// Same directive for every column
    Uniform(ColumnDirective),
    /// One directive per column; length must match the column count
    PerColumn(Vec<ColumnDirective>),
}

impl FromStr for Alignment {
    type Err = TableError;

    /// Accepts `auto`, a single token (`c`), a packed string (`lcr`) or
    /// whitespace/comma separated tokens (`l S[table-format=3.2] r`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            return Ok(Alignment::Auto);
        }
        let tokens = split_alignment(s)?;
        let mut directives: Vec<ColumnDirective> =
            tokens.iter().map(|t| ColumnDirective::parse(t)).collect();
        if directives.len() == 1 {
            Ok(Alignment::Uniform(directives.remove(0)))
        } else {
            Ok(Alignment::PerColumn(directives))
        }
    }
}

fn split_alignment(s: &str) -> Result<Vec<String>> {
    if s.contains(|c: char| c.is_whitespace() || c == ',') {
        return Ok(s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect());
    }

    // Packed form: a column letter followed by optional [..] and {..} groups
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ']' | '}' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    TableError::Configuration(format!("unbalanced alignment '{s}'"))
                })?;
                current.push(c);
            }
            c if depth == 0 && c.is_alphabetic() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                current.push(c);
            }
            c => current.push(c),
        }
    }
    if depth != 0 {
        return Err(TableError::Configuration(format!(
            "unbalanced alignment '{s}'"
        )));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// 1-indexed positions of the decimal-aligned columns.
pub fn detect_decimal_columns(spec: &[ColumnDirective]) -> Vec<usize> {
    spec.iter()
        .enumerate()
        .filter(|(_, directive)| directive.is_decimal())
        .map(|(index, _)| index + 1)
        .collect()
}

/// Renderer-ready column directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub directives: Vec<ColumnDirective>,
    /// 1-indexed, see [`detect_decimal_columns`]
    pub decimal_columns: Vec<usize>,
    /// Packages required by the directives, deduplicated
    pub packages: Vec<String>,
}

impl ColumnSpec {
    /// Expand an [`Alignment`] over the table's columns.
    ///
    /// `numeric` carries one flag per column and fixes the column count.
    pub fn build(alignment: &Alignment, numeric: &[bool]) -> Result<Self> {
        let count = numeric.len();
        let directives = match alignment {
            Alignment::Auto => numeric
                .iter()
                .map(|&is_number| {
                    if is_number {
                        ColumnDirective::right()
                    } else {
                        ColumnDirective::left()
                    }
                })
                .collect(),
            Alignment::Uniform(directive) => vec![directive.clone(); count],
            Alignment::PerColumn(directives) => {
                if directives.len() != count {
                    return Err(TableError::Configuration(format!(
                        "alignment has {} columns but the table has {count}",
                        directives.len()
                    )));
                }
                directives.clone()
            }
        };
        Ok(Self::from_directives(directives))
    }

    pub fn from_directives(directives: Vec<ColumnDirective>) -> Self {
        let decimal_columns = detect_decimal_columns(&directives);
        let mut packages: Vec<String> = Vec::new();
        for package in directives.iter().flat_map(ColumnDirective::packages) {
            if !packages.contains(&package) {
                packages.push(package);
            }
        }
        Self {
            directives,
            decimal_columns,
            packages,
        }
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// The full preamble, e.g. `lS[table-format=3.2]r`.
    pub fn to_markup(&self) -> String {
        self.directives
            .iter()
            .map(ColumnDirective::to_markup)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_structured_decimal_columns() {
        let spec = vec![
            ColumnDirective::from("l"),
            ColumnDirective::decimal(3, 2),
            ColumnDirective::from("r"),
            ColumnDirective::decimal(2, 3),
        ];
        assert_eq!(detect_decimal_columns(&spec), vec![2, 4]);
    }

    #[test]
    fn plain_spec_has_no_decimal_columns() {
        let spec: Vec<ColumnDirective> = ["l", "c", "r"].into_iter().map(Into::into).collect();
        assert!(detect_decimal_columns(&spec).is_empty());
    }

    #[test]
    fn detects_raw_decimal_patterns() {
        let spec = vec![
            ColumnDirective::Raw("S".to_string()),
            ColumnDirective::Raw(">{\\bfseries}l".to_string()),
            ColumnDirective::Raw("S[round-precision=2]".to_string()),
        ];
        assert_eq!(detect_decimal_columns(&spec), vec![1, 3]);
    }

    #[test]
    fn parses_table_format_tokens_into_structured_specs() {
        assert_eq!(
            ColumnDirective::parse("S[table-format=-2.3]"),
            ColumnDirective::Decimal(DecimalSpec::new(2, 3).signed())
        );
        assert_eq!(ColumnDirective::parse("p{3cm}"), ColumnDirective::Plain("p{3cm}".into()));
        assert_eq!(ColumnDirective::parse("X"), ColumnDirective::Raw("X".into()));
    }

    #[test]
    fn parses_alignment_strings() {
        assert_eq!(Alignment::from_str("auto").unwrap(), Alignment::Auto);
        assert_eq!(
            Alignment::from_str("c").unwrap(),
            Alignment::Uniform(ColumnDirective::center())
        );
        assert_eq!(
            Alignment::from_str("lcr").unwrap(),
            Alignment::PerColumn(vec![
                ColumnDirective::left(),
                ColumnDirective::center(),
                ColumnDirective::right()
            ])
        );
        assert_eq!(
            Alignment::from_str("l S[table-format=3.2] r").unwrap(),
            Alignment::PerColumn(vec![
                ColumnDirective::left(),
                ColumnDirective::decimal(3, 2),
                ColumnDirective::right()
            ])
        );
        assert_eq!(
            Alignment::from_str("lS[table-format=1.1]p{2cm}").unwrap(),
            Alignment::PerColumn(vec![
                ColumnDirective::left(),
                ColumnDirective::decimal(1, 1),
                ColumnDirective::Plain("p{2cm}".into())
            ])
        );
        assert!(Alignment::from_str("lS[table-format=1.1").is_err());
    }

    #[test]
    fn build_rejects_length_mismatch() {
        let alignment = Alignment::from_str("lcr").unwrap();
        match ColumnSpec::build(&alignment, &[false, false]) {
            Err(TableError::Configuration(msg)) => assert!(msg.contains("3 columns")),
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn build_auto_and_uniform() {
        let auto = ColumnSpec::build(&Alignment::Auto, &[false, true]).unwrap();
        assert_eq!(auto.to_markup(), "lr");

        let uniform =
            ColumnSpec::build(&Alignment::Uniform(ColumnDirective::decimal(1, 2)), &[true; 3])
                .unwrap();
        assert_eq!(uniform.decimal_columns, vec![1, 2, 3]);
        assert_eq!(uniform.packages, vec!["siunitx"]);
    }

    #[test]
    fn decimal_packages_are_merged_once() {
        let spec = ColumnSpec::from_directives(vec![
            DecimalSpec::new(1, 1).with_package("xcolor").into(),
            ColumnDirective::decimal(2, 2),
            ColumnDirective::Raw("S".into()),
        ]);
        assert_eq!(spec.packages, vec!["siunitx", "xcolor"]);
        assert_eq!(
            spec.to_markup(),
            "S[table-format=1.1]S[table-format=2.2]S"
        );
    }

    #[test]
    fn decimal_format_round_trips() {
        let spec = DecimalSpec::parse_format("-4.1").unwrap();
        assert!(spec.signed);
        assert_eq!(spec.format(), "-4.1");
        assert!(DecimalSpec::parse_format("4").is_err());
        assert!(DecimalSpec::parse_format("a.b").is_err());
    }
}
