//! Generic decoded document tree.
//!
//! The loader works on [`Value`], a format-neutral tree of maps, lists and
//! scalars. Adapters convert YAML (keeping `!shorthand` tags), JSON and
//! TOML into it.

use crate::{Error, Result};
use std::path::Path;

/// Tag that forces a scalar to be read as a shorthand expression
pub const SHORTHAND_TAG: &str = "shorthand";

/// A node of a decoded document
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    /// Entries in document order
    Map(Vec<(String, Value)>),
    /// A tagged node such as `!shorthand 225:3:5`; the tag has no leading `!`
    Tagged { tag: String, value: Box<Value> },
}

impl Value {
    /// Human-readable kind used in loader error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Tagged { .. } => "tagged value",
        }
    }

    /// Look up a key in a map node
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ============================================================================
// Adapters
// ============================================================================

/// Parse a YAML document
pub fn from_yaml_str(input: &str) -> Result<Value> {
    let raw: serde_yaml::Value = serde_yaml::from_str(input)?;
    from_yaml(raw)
}

/// Parse a JSON document
pub fn from_json_str(input: &str) -> Result<Value> {
    let raw: serde_json::Value = serde_json::from_str(input)?;
    Ok(from_json(raw))
}

/// Parse a TOML document
pub fn from_toml_str(input: &str) -> Result<Value> {
    let raw: toml::Value = toml::from_str(input)?;
    Ok(from_toml(raw))
}

/// Read a document from disk, choosing the format by extension
///
/// `.json` and `.toml` are recognised; anything else is read as YAML.
pub fn from_path(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    tracing::debug!("Reading program document {:?}", path);
    match extension.as_deref() {
        Some("json") => from_json_str(&contents),
        Some("toml") => from_toml_str(&contents),
        _ => from_yaml_str(&contents),
    }
}

fn from_yaml(raw: serde_yaml::Value) -> Result<Value> {
    Ok(match raw {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => match n.as_f64() {
            Some(f) => Value::Number(f),
            None => return Err(Error::InvalidProgram(format!("unsupported number {}", n))),
        },
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::List(items.into_iter().map(from_yaml).collect::<Result<_>>()?)
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut entries = Vec::with_capacity(mapping.len());
            for (key, value) in mapping {
                entries.push((yaml_key(key)?, from_yaml(value)?));
            }
            Value::Map(entries)
        }
        serde_yaml::Value::Tagged(tagged) => {
            let tagged = *tagged;
            Value::Tagged {
                tag: tagged.tag.to_string().trim_start_matches('!').to_string(),
                value: Box::new(from_yaml(tagged.value)?),
            }
        }
    })
}

// Map keys are names; scalar keys such as `5:` are accepted as their text.
fn yaml_key(key: serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::InvalidProgram(format!(
            "unsupported map key {:?}",
            other
        ))),
    }
}

fn from_json(raw: serde_json::Value) -> Value {
    match raw {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            Value::Map(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

fn from_toml(raw: toml::Value) -> Value {
    match raw {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i as f64),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => {
            Value::Map(table.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
    }
}
