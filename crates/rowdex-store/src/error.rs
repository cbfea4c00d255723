//! Error types for index configuration and table access.

use rowdex_commons::ConvertError;
use thiserror::Error;

use crate::storage_trait::{StoreError, WriteKind};

/// Raised while building index definitions, registries and converters.
///
/// These are startup failures; nothing here is produced by a per-call operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Index name must not be empty")]
    EmptyIndexName,

    #[error("Index '{0}' is already registered")]
    DuplicateIndex(String),

    #[error("Entity '{entity}' has no field 'Id' of kind Guid")]
    MissingIdentity { entity: &'static str },

    #[error("Entity '{entity}' declares no fields")]
    NoFields { entity: &'static str },

    #[error("Entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: &'static str, field: &'static str },

    #[error("Entity '{entity}' declares reserved field '{field}'")]
    ReservedField { entity: &'static str, field: &'static str },
}

/// Coarse classification of a [`TableError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Lookup,
    Argument,
    Conflict,
    Unknown,
    Cancelled,
    Conversion,
}

/// Failure of an `IndexedTable` call.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Range spans partitions: '{start}' != '{end}'")]
    RangeSpansPartitions { start: String, end: String },

    /// Insert hit an existing key.
    #[error("Conflict: entity ({partition_key}, {row_key}) already exists")]
    Conflict {
        partition_key: String,
        row_key: String,
    },

    /// Replace presented a stale concurrency token.
    #[error("Precondition failed: entity ({partition_key}, {row_key}) was modified")]
    PreconditionFailed {
        partition_key: String,
        row_key: String,
    },

    #[error("Unknown store failure during {operation} of ({partition_key}, {row_key}): {source}")]
    Unknown {
        operation: String,
        partition_key: String,
        row_key: String,
        #[source]
        source: StoreError,
    },

    /// A scan still had a continuation after `max_pages` store calls.
    #[error("Scan of partition '{partition_key}' exceeded {pages} pages with {collected} records")]
    PageLimitExceeded {
        partition_key: String,
        pages: usize,
        collected: usize,
    },

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::Config(_) => ErrorKind::Configuration,
            TableError::UnknownIndex(_) => ErrorKind::Lookup,
            TableError::InvalidArgument(_) | TableError::RangeSpansPartitions { .. } => {
                ErrorKind::Argument
            }
            TableError::Conflict { .. } | TableError::PreconditionFailed { .. } => {
                ErrorKind::Conflict
            }
            TableError::Unknown { .. } | TableError::PageLimitExceeded { .. } => ErrorKind::Unknown,
            TableError::Conversion(_) => ErrorKind::Conversion,
            TableError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Wrap a store failure that has no dedicated mapping.
    pub fn unknown(
        operation: impl Into<String>,
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
        source: StoreError,
    ) -> Self {
        TableError::Unknown {
            operation: operation.into(),
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            source,
        }
    }

    pub(crate) fn from_write(kind: WriteKind, partition_key: &str, row_key: &str, err: StoreError) -> Self {
        use crate::storage_trait::StoreStatus;

        match (kind, err.status) {
            (WriteKind::Insert, StoreStatus::Conflict) => TableError::Conflict {
                partition_key: partition_key.to_string(),
                row_key: row_key.to_string(),
            },
            (WriteKind::Replace, StoreStatus::PreconditionFailed) => {
                TableError::PreconditionFailed {
                    partition_key: partition_key.to_string(),
                    row_key: row_key.to_string(),
                }
            }
            _ => TableError::unknown(kind.to_string(), partition_key, row_key, err),
        }
    }
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_trait::StoreStatus;

    #[test]
    fn test_write_status_mapping() {
        let err = TableError::from_write(WriteKind::Insert, "p", "r", StoreError::conflict("exists"));
        assert!(matches!(err, TableError::Conflict { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = TableError::from_write(
            WriteKind::Replace,
            "p",
            "r",
            StoreError::precondition_failed("stale"),
        );
        assert!(matches!(err, TableError::PreconditionFailed { .. }));
    }

    #[test]
    fn test_unmapped_status_is_unknown() {
        // a conflict outside Insert has no dedicated mapping
        let err = TableError::from_write(WriteKind::Replace, "p", "r", StoreError::conflict("busy"));
        match err {
            TableError::Unknown {
                operation, source, ..
            } => {
                assert_eq!(operation, "replace");
                assert_eq!(source.status, StoreStatus::Conflict);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let err = TableError::from_write(
            WriteKind::Insert,
            "p",
            "r",
            StoreError::new(StoreStatus::Other(500), "boom"),
        );
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.to_string().contains("insert of (p, r)"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: TableError = ConfigError::DuplicateIndex("default".into()).into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            err.to_string(),
            "Configuration error: Index 'default' is already registered"
        );
    }
}
