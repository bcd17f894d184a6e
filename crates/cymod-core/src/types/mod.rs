//! # Core Type Definitions
//!
//! This module contains all core types for the cymod query translator:
//! - Parameter values and checked parameter maps (`ParamValue`, `ParameterSet`)
//! - Query provenance (`SourceKind`, `QuerySource`)
//! - The executable unit (`Query`, `QueryParams`)
//! - Error types (`CymodError`)
//!
//! ## Determinism Guarantees
//!
//! - `ParameterSet` iterates in key order (`BTreeMap`)
//! - `QueryParams` iterates in first-seen placeholder order
//! - Rendering of literals is canonical (see `ParamValue::literal`)

use crate::parser::substitute_placeholders;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// PARAMETER VALUES
// =============================================================================

/// A scalar parameter or property value.
///
/// Closed over the three JSON scalar kinds that parameter blocks and
/// transition tables actually carry. Numbers keep their source form
/// (`3` stays `3`, `2.5` stays `2.5`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl ParamValue {
    /// Build a value from a decoded JSON scalar.
    ///
    /// Returns `None` for `null`, arrays and objects.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => Some(Self::Number(n.clone())),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    /// Build a value from a decoded YAML scalar.
    #[must_use]
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<Self> {
        match value {
            serde_yaml::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_yaml::Value::String(s) => Some(Self::String(s.clone())),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Number(i.into()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self::Number(u.into()))
                } else {
                    n.as_f64()
                        .and_then(serde_json::Number::from_f64)
                        .map(Self::Number)
                }
            }
            _ => None,
        }
    }

    /// Build a value from a decoded TOML scalar.
    #[must_use]
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::Boolean(b) => Some(Self::Bool(*b)),
            toml::Value::String(s) => Some(Self::String(s.clone())),
            toml::Value::Integer(i) => Some(Self::Number((*i).into())),
            toml::Value::Float(f) => serde_json::Number::from_f64(*f).map(Self::Number),
            _ => None,
        }
    }

    /// Convert back into a JSON value (for sinks and JSON output).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Render the value as a Cypher literal.
    ///
    /// - strings are double-quoted (`\` and `"` escaped)
    /// - booleans are lowercase `true` / `false`
    /// - numbers use their default textual form
    #[must_use]
    pub fn literal(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::String(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
                out
            }
        }
    }

    /// Coerce the value to an integer, as required for the `priority` key.
    ///
    /// Floats are truncated toward zero, numeric strings are parsed.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Self::String(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    /// Infer a value from untyped text such as a CSV cell.
    ///
    /// `true`/`false` become booleans, integer or decimal text becomes a
    /// number, everything else stays a string.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        match text {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(i) = text.parse::<i64>() {
            return Self::Number(i.into());
        }
        if text.contains('.')
            && let Some(n) = text.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
        {
            return Self::Number(n);
        }
        Self::String(text.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal())
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Number(i.into())
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        Self::Number(i.into())
    }
}

impl From<u64> for ParamValue {
    fn from(u: u64) -> Self {
        Self::Number(u.into())
    }
}

// =============================================================================
// PARAMETER SET
// =============================================================================

/// A checked, string-keyed parameter mapping.
///
/// Constructible from an in-memory map or from a JSON, YAML or TOML file.
/// Keys are always strings: dynamic sources with non-string keys are
/// rejected with `CymodError::NonStringParameterKey`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet(BTreeMap<String, ParamValue>);

impl ParameterSet {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a parameter file. The format is chosen by extension:
    /// `.json`, `.yaml`/`.yml` or `.toml`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CymodError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            tracing::error!("Could not read parameter file {}: {}", path.display(), source);
            CymodError::UnreadableFile {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml" | "yml") => {
                let value: serde_yaml::Value = serde_yaml::from_str(&text)
                    .map_err(|e| CymodError::SerializationError(e.to_string()))?;
                Self::from_yaml(&value)
            }
            Some("toml") => {
                let table: toml::Table = toml::from_str(&text)
                    .map_err(|e| CymodError::SerializationError(e.to_string()))?;
                Self::from_toml(&table)
            }
            _ => {
                let value: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| CymodError::SerializationError(e.to_string()))?;
                Self::from_json(&value)
            }
        }
    }

    /// Build from a decoded JSON object.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CymodError> {
        let object = value.as_object().ok_or_else(|| {
            CymodError::SerializationError("parameters must be a JSON object".to_string())
        })?;

        let mut set = Self::new();
        for (key, value) in object {
            let value = ParamValue::from_json(value).ok_or_else(|| {
                CymodError::UnsupportedValue {
                    key: key.clone(),
                    reason: format!("expected string, number or boolean, found {}", value),
                }
            })?;
            set.insert(key.clone(), value);
        }
        Ok(set)
    }

    /// Build from a decoded YAML mapping.
    pub fn from_yaml(value: &serde_yaml::Value) -> Result<Self, CymodError> {
        let mapping = value.as_mapping().ok_or_else(|| {
            CymodError::SerializationError("parameters must be a YAML mapping".to_string())
        })?;

        let mut set = Self::new();
        for (key, value) in mapping {
            let key = key
                .as_str()
                .ok_or_else(|| CymodError::NonStringParameterKey(format!("{:?}", key)))?;
            let value = ParamValue::from_yaml(value).ok_or_else(|| {
                CymodError::UnsupportedValue {
                    key: key.to_string(),
                    reason: format!("expected string, number or boolean, found {:?}", value),
                }
            })?;
            set.insert(key, value);
        }
        Ok(set)
    }

    /// Build from a decoded TOML table.
    pub fn from_toml(table: &toml::Table) -> Result<Self, CymodError> {
        let mut set = Self::new();
        for (key, value) in table {
            let value = ParamValue::from_toml(value).ok_or_else(|| {
                CymodError::UnsupportedValue {
                    key: key.clone(),
                    reason: format!("expected string, number or boolean, found {:?}", value),
                }
            })?;
            set.insert(key.clone(), value);
        }
        Ok(set)
    }

    /// Insert a value, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Check if a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`. Values from `other` win on conflict.
    pub fn merge(&mut self, other: &ParameterSet) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Return the underlying map.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<String, ParamValue> {
        self.0
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, ParamValue>> for ParameterSet {
    fn from(map: BTreeMap<String, ParamValue>) -> Self {
        Self(map)
    }
}

// =============================================================================
// QUERY SOURCE
// =============================================================================

/// The kind of source a query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A hand-written query file.
    File,
    /// A row of a transition table.
    Tabular,
}

impl SourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Tabular => "tabular",
        }
    }
}

impl FromStr for SourceKind {
    type Err = CymodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "tabular" => Ok(Self::Tabular),
            other => Err(CymodError::InvalidSourceKind(other.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a query originally came from.
///
/// `index` is the statement ordinal within a file, or the row ordinal
/// within a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySource {
    reference: String,
    kind: SourceKind,
    index: usize,
}

impl QuerySource {
    /// Create a source from an untyped kind tag.
    ///
    /// Returns `CymodError::InvalidSourceKind` unless `kind` is
    /// `"file"` or `"tabular"`.
    pub fn new(reference: impl Into<String>, kind: &str, index: usize) -> Result<Self, CymodError> {
        Ok(Self {
            reference: reference.into(),
            kind: kind.parse()?,
            index,
        })
    }

    /// Source for the `index`-th statement of a query file.
    #[must_use]
    pub fn file(path: &Path, index: usize) -> Self {
        Self {
            reference: path.display().to_string(),
            kind: SourceKind::File,
            index,
        }
    }

    /// Source for the `index`-th row of a named table.
    #[must_use]
    pub fn tabular(table: impl Into<String>, index: usize) -> Self {
        Self {
            reference: table.into(),
            kind: SourceKind::Tabular,
            index,
        }
    }

    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        self.kind
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kind: {}\nindex: {}\nref: {}",
            self.kind, self.index, self.reference
        )
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// Per-statement parameter mapping in first-seen placeholder order.
///
/// A `None` slot marks a placeholder that has not been resolved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams(IndexMap<String, Option<ParamValue>>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot. Existing slots keep their position.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<ParamValue>) {
        self.0.insert(name.into(), value);
    }

    /// The slot for `name`: `None` if absent, `Some(None)` if unresolved.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Option<&ParamValue>> {
        self.0.get(name).map(Option::as_ref)
    }

    /// Fill an existing unresolved slot. Returns `true` if a slot was filled.
    pub fn fill(&mut self, name: &str, value: ParamValue) -> bool {
        match self.0.get_mut(name) {
            Some(slot) if slot.is_none() => {
                *slot = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Names of unresolved slots, in first-seen order.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.0.values().all(Option::is_some)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ParamValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object view; unresolved slots become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .0
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    v.as_ref()
                        .map_or(serde_json::Value::Null, ParamValue::to_json),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Option<ParamValue>)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, Option<ParamValue>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// An executable unit: statement text, its parameters and its provenance.
///
/// `params` is `None` when the statement has no placeholders at all, which
/// is distinct from an empty mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub statement: String,
    pub params: Option<QueryParams>,
    pub source: QuerySource,
}

impl Query {
    /// Wrap a statement, its parameters and its source.
    #[must_use]
    pub fn new(statement: impl Into<String>, params: Option<QueryParams>, source: QuerySource) -> Self {
        Self {
            statement: statement.into(),
            params,
            source,
        }
    }

    /// Names of unresolved placeholders, in first-seen order.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.params.iter().flat_map(QueryParams::unresolved)
    }

    /// Error describing an unresolved placeholder of this query.
    #[must_use]
    pub fn unresolved_error(&self, placeholder: &str) -> CymodError {
        CymodError::UnresolvedRequiredParameter {
            placeholder: placeholder.to_string(),
            statement: self.statement.clone(),
            source_ref: self.source.reference().to_string(),
            index: self.source.index(),
        }
    }

    /// The statement with every placeholder replaced by its literal value.
    ///
    /// Substitution is a single pass over the original statement, so a
    /// sigil inside an inserted string literal is left alone.
    pub fn render_inline(&self) -> Result<String, CymodError> {
        let Some(params) = &self.params else {
            return Ok(self.statement.clone());
        };
        if let Some(name) = params.unresolved().next() {
            return Err(self.unresolved_error(name));
        }

        Ok(substitute_placeholders(&self.statement, |name| {
            params.get(name).flatten().map(ParamValue::literal)
        }))
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while translating sources into queries.
///
/// - No silent failures
/// - Use `Result<T, CymodError>` for fallible operations
/// - The core never panics; all errors are returned to the caller
#[derive(Debug, Error)]
pub enum CymodError {
    /// A leading parameter block is present but is not a valid object.
    #[error("Malformed parameter block in {path}: {reason}")]
    MalformedParameterBlock { path: String, reason: String },

    /// A query source was tagged with an unrecognised kind.
    #[error("Invalid query source kind '{0}' (expected 'file' or 'tabular')")]
    InvalidSourceKind(String),

    /// A parameter mapping used a non-string key.
    #[error("Parameter keys must be strings, found {0}")]
    NonStringParameterKey(String),

    /// A file could not be opened or read.
    #[error("Unreadable file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A placeholder has no value after every parameter layer was applied.
    #[error(
        "Query {index} of {source_ref} requires parameter '${placeholder}', which is given \
         neither in its originating file nor in the global parameters: {statement}"
    )]
    UnresolvedRequiredParameter {
        placeholder: String,
        statement: String,
        source_ref: String,
        index: usize,
    },

    /// A custom label override named an unknown node label.
    #[error("Unknown node label '{0}' (expected State, Transition or Condition)")]
    UnknownLabel(String),

    /// A designated state column is missing from a table.
    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { column: String, table: String },

    /// A value outside the string/number/boolean union.
    #[error("Unsupported value for '{key}': {reason}")]
    UnsupportedValue { key: String, reason: String },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The journal store failed.
    #[error("Storage error: {0}")]
    StorageError(String),
}

// =============================================================================
// TESTS
// =============================================================================
