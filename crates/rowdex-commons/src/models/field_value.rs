//! Field values persisted alongside every record.
//!
//! The table store keeps a flat map of property name to typed value next to the
//! `(PartitionKey, RowKey)` address. The set of supported kinds is closed: an entity
//! that needs anything else must convert it to one of these kinds itself.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::errors::{ConvertError, Result};

/// Kind tag of a stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Int32,
    Int64,
    Guid,
    Double,
    DateTime,
    DateTimeOffset,
    Bool,
    Binary,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A typed value stored in a record's field map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Guid(Uuid),
    Double(f64),
    DateTime(DateTime<Utc>),
    DateTimeOffset(DateTime<FixedOffset>),
    Bool(bool),
    Binary(Vec<u8>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Int32(_) => FieldKind::Int32,
            FieldValue::Int64(_) => FieldKind::Int64,
            FieldValue::Guid(_) => FieldKind::Guid,
            FieldValue::Double(_) => FieldKind::Double,
            FieldValue::DateTime(_) => FieldKind::DateTime,
            FieldValue::DateTimeOffset(_) => FieldKind::DateTimeOffset,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Binary(_) => FieldKind::Binary,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int32(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int64(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Guid(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        FieldValue::DateTimeOffset(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Binary(value)
    }
}

/// Property name → value map of a single record.
///
/// An absent entry is a null. Keys are kept sorted so the JSON rendering of a map is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

// Generates a required getter and an optional getter for one field kind.
macro_rules! typed_getters {
    ($get:ident, $opt:ident, $variant:ident, $ty:ty) => {
        #[doc = concat!("Returns the `", stringify!($variant), "` field, failing when absent.")]
        pub fn $get(&self, name: &str) -> Result<$ty> {
            self.$opt(name)?.ok_or_else(|| ConvertError::missing(name))
        }

        #[doc = concat!("Returns the `", stringify!($variant), "` field, or `None` when absent.")]
        pub fn $opt(&self, name: &str) -> Result<Option<$ty>> {
            match self.0.get(name) {
                None => Ok(None),
                Some(FieldValue::$variant(v)) => Ok(Some(v.clone())),
                Some(other) => Err(ConvertError::KindMismatch {
                    field: name.to_string(),
                    expected: FieldKind::$variant,
                    actual: other.kind(),
                }),
            }
        }
    };
}

impl FieldMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style insert that skips `None`.
    pub fn with_opt<V: Into<FieldValue>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(name, value);
        }
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    typed_getters!(get_string, opt_string, String, String);
    typed_getters!(get_i32, opt_i32, Int32, i32);
    typed_getters!(get_i64, opt_i64, Int64, i64);
    typed_getters!(get_guid, opt_guid, Guid, Uuid);
    typed_getters!(get_f64, opt_f64, Double, f64);
    typed_getters!(get_datetime, opt_datetime, DateTime, DateTime<Utc>);
    typed_getters!(get_datetime_offset, opt_datetime_offset, DateTimeOffset, DateTime<FixedOffset>);
    typed_getters!(get_bool, opt_bool, Bool, bool);
    typed_getters!(get_binary, opt_binary, Binary, Vec<u8>);
}

impl FromIterator<(String, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
