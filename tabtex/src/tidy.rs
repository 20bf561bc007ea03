//! Tidy adapters: statistical results to tables
//!
//! An adapter turns a JSON value describing some result into a [`DataTable`].
//! Adapters are plain functions registered under a tag in an
//! [`AdapterRegistry`]; supporting a new kind of result means registering one
//! more function.
//!
//! Built-in tags:
//!
//! - `coefficients`: an array of `{term, estimate, std_error, statistic,
//!   p_value}` objects (dotted names such as `std.error` are accepted too)
//! - `records`: an array of flat objects, one row each

use crate::data::DataTable;
use crate::error::{Result, TableError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Extraction function for one kind of result.
pub type Adapter = fn(&Value) -> Result<DataTable>;

/// Registry of tidy adapters, keyed by tag
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Adapter>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        AdapterRegistry {
            adapters: BTreeMap::new(),
        }
    }

    /// Create a registry with the built-in adapters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("coefficients", coefficients);
        registry.register("records", records);
        registry
    }

    /// Register an adapter, returning the one it replaced
    pub fn register(&mut self, tag: impl Into<String>, adapter: Adapter) -> Option<Adapter> {
        self.adapters.insert(tag.into(), adapter)
    }

    pub fn has(&self, tag: &str) -> bool {
        self.adapters.contains_key(tag)
    }

    pub fn list_tags(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }

    /// Convert `value` with the adapter registered under `tag`
    pub fn to_table(&self, tag: &str, value: &Value) -> Result<DataTable> {
        let adapter = self.adapters.get(tag).ok_or_else(|| {
            TableError::Configuration(format!(
                "no adapter for '{tag}' (available: {})",
                self.list_tags().join(", ")
            ))
        })?;
        adapter(value)
    }

    /// Convert `value`, picking the adapter from `tag`, or else from an
    /// envelope of the form `{"kind": <tag>, "data": ...}`, or else `records`
    /// for a bare array.
    pub fn convert(&self, value: &Value, tag: Option<&str>) -> Result<DataTable> {
        if let Some(tag) = tag {
            return self.to_table(tag, value);
        }
        if let (Some(kind), Some(data)) = (
            value.get("kind").and_then(Value::as_str),
            value.get("data"),
        ) {
            return self.to_table(kind, data);
        }
        if value.is_array() {
            return self.to_table("records", value);
        }
        Err(TableError::InputValidation(
            "cannot tell what kind of result this is; pass a kind explicitly".to_string(),
        ))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn objects<'a>(value: &'a Value, what: &str) -> Result<Vec<&'a Map<String, Value>>> {
    let items = value.as_array().ok_or_else(|| {
        TableError::InputValidation(format!("{what} must be a JSON array of objects"))
    })?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object().ok_or_else(|| {
                TableError::InputValidation(format!(
                    "{what} entry {} is not an object",
                    index + 1
                ))
            })
        })
        .collect()
}

/// First present key among `names`.
fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

fn format_estimate(value: Option<&Value>) -> Result<String> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::Number(n)) => Ok(n.as_f64().map(|f| format!("{f:.3}")).unwrap_or_default()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(TableError::InputValidation(format!(
            "expected a number, found {other}"
        ))),
    }
}

fn format_p_value(value: Option<&Value>) -> Result<String> {
    match value {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(p) if p < 0.001 => Ok("<0.001".to_string()),
            Some(p) => Ok(format!("{p:.3}")),
            None => Ok(String::new()),
        },
        other => format_estimate(other),
    }
}

/// Coefficient table of a fitted model.
pub fn coefficients(value: &Value) -> Result<DataTable> {
    let columns = ["term", "estimate", "std.error", "statistic", "p.value"]
        .iter()
        .map(|c| c.to_string())
        .collect();

    let rows = objects(value, "coefficients")?
        .into_iter()
        .enumerate()
        .map(|(index, object)| -> Result<Vec<String>> {
            let term = field(object, &["term"])
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    TableError::InputValidation(format!(
                        "coefficient {} has no 'term'",
                        index + 1
                    ))
                })?;
            Ok(vec![
                term.to_string(),
                format_estimate(field(object, &["estimate"]))?,
                format_estimate(field(object, &["std_error", "std.error"]))?,
                format_estimate(field(object, &["statistic"]))?,
                format_p_value(field(object, &["p_value", "p.value"]))?,
            ])
        })
        .collect::<Result<Vec<_>>>()?;

    DataTable::new(columns, rows)
}

/// One row per object, columns in order of first appearance.
pub fn records(value: &Value) -> Result<DataTable> {
    let objects = objects(value, "records")?;

    let mut columns: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|object| {
            columns
                .iter()
                .map(|column| match object.get(column) {
                    None | Some(Value::Null) => Ok(String::new()),
                    Some(Value::String(s)) => Ok(s.clone()),
                    Some(Value::Number(n)) => Ok(n.to_string()),
                    Some(Value::Bool(b)) => Ok(b.to_string()),
                    Some(_) => Err(TableError::InputValidation(format!(
                        "field '{column}' holds a nested value"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    DataTable::new(columns, rows)
}
