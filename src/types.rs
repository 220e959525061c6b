//! Core data types for streamstats
//!
//! These types represent the tabular model that flows from the catalog
//! through the engine and into the exported reports.

use crate::error::{Result, StatsError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Cell values
// =============================================================================

/// A single cell of a dataset row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Real number (may be non-finite if the source produced one)
    Number(f64),
    /// Category label, e.g. a genre or artist name
    Category(String),
    /// Null or absent
    Missing,
}

static MISSING: Value = Value::Missing;

impl Value {
    /// Any numeric value, finite or not
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value only if it is finite (not NaN, not infinite)
    pub fn as_finite(&self) -> Option<f64> {
        self.as_number().filter(|n| n.is_finite())
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Value::Category(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Present in the presence-only sense: finite number or non-empty label
    pub fn is_present(&self) -> bool {
        match self {
            Value::Number(n) => n.is_finite(),
            Value::Category(s) => !s.is_empty(),
            Value::Missing => false,
        }
    }

    /// Key used when this value partitions rows into groups
    ///
    /// Labels are matched exactly (case-sensitive) and never merge with
    /// numbers, so the label `"2019"` and the number `2019` are distinct
    /// groups. `-0.0` and `0.0` share a group.
    pub fn group_key(&self) -> Option<GroupKey> {
        match self {
            Value::Category(s) if !s.is_empty() => Some(GroupKey::Label(s.clone())),
            Value::Number(n) if n.is_finite() => {
                let normalized = if *n == 0.0 { 0.0 } else { *n };
                Some(GroupKey::Number(normalized.to_bits()))
            }
            _ => None,
        }
    }
}

/// Typed identity of a group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Label(String),
    /// Bit pattern of a finite, zero-normalized number
    Number(u64),
}

/// Whether a group key came from a label or a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Label,
    Number,
}

impl GroupKey {
    pub fn kind(&self) -> KeyKind {
        match self {
            GroupKey::Label(_) => KeyKind::Label,
            GroupKey::Number(_) => KeyKind::Number,
        }
    }

    /// Display form; numbers use their shortest round-trip rendering
    pub fn display(&self) -> String {
        match self {
            GroupKey::Label(s) => s.clone(),
            GroupKey::Number(bits) => f64::from_bits(*bits).to_string(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Missing),
            serde_json::Value::String(s) => Value::Category(s),
            serde_json::Value::Bool(b) => Value::Category(b.to_string()),
            // Nested structures carry no scalar statistic
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => Value::Missing,
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Category(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Category(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

// =============================================================================
// Rows and datasets
// =============================================================================

/// A record mapping field names to values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Look up a field; an absent key reads as `Value::Missing`
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    /// Finite numeric value of a field
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_finite()
    }

    pub fn category(&self, field: &str) -> Option<&str> {
        self.get(field).as_category()
    }

    /// True if the field is part of this row's schema (even when null)
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Ordered sequence of rows, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if at least one row carries the field
    pub fn has_field(&self, field: &str) -> bool {
        self.rows.iter().any(|row| row.has_field(field))
    }

    /// Union of field names over all rows
    pub fn schema(&self) -> BTreeSet<&str> {
        self.rows.iter().flat_map(Row::field_names).collect()
    }

    /// Fail with `InvalidArgument` if a non-empty dataset lacks the field entirely
    ///
    /// An empty dataset has no schema to check against and accepts any name.
    pub fn require_field(&self, field: &str) -> Result<()> {
        if self.is_empty() || self.has_field(field) {
            Ok(())
        } else {
            Err(StatsError::unknown_field(field))
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// =============================================================================
// Feature selection
// =============================================================================

/// Non-empty ordered list of numeric fields
///
/// Order defines the row/column order of correlation output. Duplicate names
/// are allowed and simply produce a redundant column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSet {
    names: Vec<String>,
}

impl FeatureSet {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(StatsError::empty_feature_set());
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Never true for a constructed set
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// First position holding this name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Each feature as a numeric completeness requirement
    pub fn as_requirements(&self) -> Vec<RequiredField> {
        self.iter().map(RequiredField::numeric).collect()
    }
}

/// How strictly a field must be populated for a row to count as complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Must hold a finite number
    Numeric,
    /// Must be non-null; labels must be non-empty
    Present,
}

/// A field name paired with its completeness requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredField {
    pub name: String,
    pub requirement: Requirement,
}

impl RequiredField {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirement: Requirement::Numeric,
        }
    }

    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirement: Requirement::Present,
        }
    }

    pub fn is_satisfied_by(&self, row: &Row) -> bool {
        let value = row.get(&self.name);
        match self.requirement {
            Requirement::Numeric => value.as_finite().is_some(),
            Requirement::Present => value.is_present(),
        }
    }
}
