use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use uuid::Uuid;

/// A typed scalar projected out of an entity to become one fragment of a key.
///
/// The set is closed on purpose: every kind here has an order-preserving string
/// encoding (see `rowdex_store::key_encoding`). Enum-like values go through
/// [`KeyValue::from_display`] and are keyed by their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Int32(i32),
    Int64(i64),
    Guid(Uuid),
    String(String),
    Bool(bool),
    /// UTC timestamp, keyed by its UTC clock time.
    Timestamp(DateTime<Utc>),
    /// Timestamp with offset, keyed by its clock time in its own offset.
    TimestampOffset(DateTime<FixedOffset>),
}

impl KeyValue {
    /// Key an enum-like value by its `Display` output.
    ///
    /// ```rust
    /// use rowdex_commons::KeyValue;
    ///
    /// #[derive(Debug)]
    /// enum Level { Senior }
    ///
    /// impl std::fmt::Display for Level {
    ///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    ///         write!(f, "{:?}", self)
    ///     }
    /// }
    ///
    /// assert_eq!(KeyValue::from_display(&Level::Senior), KeyValue::String("Senior".into()));
    /// ```
    pub fn from_display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        KeyValue::String(value.to_string())
    }

    /// Short name of the kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            KeyValue::Int32(_) => "Int32",
            KeyValue::Int64(_) => "Int64",
            KeyValue::Guid(_) => "Guid",
            KeyValue::String(_) => "String",
            KeyValue::Bool(_) => "Bool",
            KeyValue::Timestamp(_) => "Timestamp",
            KeyValue::TimestampOffset(_) => "TimestampOffset",
        }
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int32(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int64(value)
    }
}

impl From<Uuid> for KeyValue {
    fn from(value: Uuid) -> Self {
        KeyValue::Guid(value)
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<&String> for KeyValue {
    fn from(value: &String) -> Self {
        KeyValue::String(value.clone())
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        KeyValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for KeyValue {
    fn from(value: DateTime<Utc>) -> Self {
        KeyValue::Timestamp(value)
    }
}

impl From<DateTime<FixedOffset>> for KeyValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        KeyValue::TimestampOffset(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(KeyValue::from(5_i32), KeyValue::Int32(5));
        assert_eq!(KeyValue::from(5_i64), KeyValue::Int64(5));
        assert_eq!(KeyValue::from("abc"), KeyValue::String("abc".into()));
        assert_eq!(KeyValue::from(true), KeyValue::Bool(true));
        assert_eq!(KeyValue::from(Uuid::nil()).kind_name(), "Guid");
    }
}
