//! Table store abstraction consumed by the index layer.
//!
//! The index layer never talks to a concrete store. It needs exactly four things
//! from one:
//! - point get by `(PartitionKey, RowKey)`
//! - point write (insert / replace / insert-or-replace / delete) guarded by a
//!   concurrency token
//! - a segmented range scan inside one partition, resumable through a
//!   continuation token
//! - create/delete of the table itself
//!
//! ## Status Model
//!
//! Failed calls carry a [`StoreStatus`] mirroring the remote store's HTTP-style
//! status codes. The index layer maps those onto its own error taxonomy
//! (see `crate::error::TableError`); a store implementation only has to report
//! what happened.
//!
//! ## Implementing a Custom Store
//!
//! ```rust,ignore
//! use rowdex_store::storage_trait::*;
//!
//! pub struct RemoteTable {
//!     // connection state
//! }
//!
//! #[async_trait::async_trait]
//! impl TableStore for RemoteTable {
//!     fn table_name(&self) -> &str {
//!         "employee"
//!     }
//!
//!     async fn get(&self, id: &TableEntityId) -> Result<Option<StoredRecord>> {
//!         // issue the point read
//!         todo!()
//!     }
//!
//!     // ... implement the other required methods
//! }
//! ```

use rowdex_commons::{ETag, FieldMap, TableEntityId};
use std::fmt;
use thiserror::Error;

use crate::query::ScanFilter;

/// Result type for table store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome classification of a failed store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreStatus {
    /// 409: the key already exists (insert) or the table is in a conflicting state
    Conflict,
    /// 412: the presented concurrency token does not match the stored one
    PreconditionFailed,
    /// 404: the entity or table does not exist
    NotFound,
    /// Any other status code reported by the store
    Other(u16),
}

impl StoreStatus {
    /// Classify a raw HTTP-style status code.
    pub fn from_code(code: u16) -> Self {
        match code {
            409 => StoreStatus::Conflict,
            412 => StoreStatus::PreconditionFailed,
            404 => StoreStatus::NotFound,
            other => StoreStatus::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            StoreStatus::Conflict => 409,
            StoreStatus::PreconditionFailed => 412,
            StoreStatus::NotFound => 404,
            StoreStatus::Other(code) => *code,
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreStatus::Conflict => write!(f, "Conflict (409)"),
            StoreStatus::PreconditionFailed => write!(f, "PreconditionFailed (412)"),
            StoreStatus::NotFound => write!(f, "NotFound (404)"),
            StoreStatus::Other(code) => write!(f, "Status {}", code),
        }
    }
}

/// A failed store call.
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct StoreError {
    pub status: StoreStatus,
    pub message: String,
}

impl StoreError {
    pub fn new(status: StoreStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StoreStatus::Conflict, message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(StoreStatus::PreconditionFailed, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreStatus::NotFound, message)
    }
}

/// Kind of point write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    /// Fails with `Conflict` when the key exists
    Insert,
    /// Requires a matching concurrency token (or the wildcard)
    Replace,
    /// Creates or overwrites, never checks the token
    InsertOrReplace,
    /// Removes the key; the token may be the wildcard
    Delete,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteKind::Insert => "insert",
            WriteKind::Replace => "replace",
            WriteKind::InsertOrReplace => "insert_or_replace",
            WriteKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A record as sent to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub id: TableEntityId,
    pub fields: FieldMap,
}

impl TableRecord {
    pub fn new(id: TableEntityId, fields: FieldMap) -> Self {
        Self { id, fields }
    }

    /// A key-only record, used for deletes.
    pub fn key_only(id: TableEntityId) -> Self {
        Self {
            id,
            fields: FieldMap::new(),
        }
    }
}

/// A record as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: TableEntityId,
    pub fields: FieldMap,
    /// `None` when the store did not report a token for this record
    pub etag: Option<ETag>,
}

/// Opaque resume point of a segmented scan.
///
/// Mirrors the remote store's `NextPartitionKey` / `NextRowKey` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContinuationToken {
    next_partition_key: String,
    next_row_key: String,
}

impl ContinuationToken {
    pub fn new(next_partition_key: impl Into<String>, next_row_key: impl Into<String>) -> Self {
        Self {
            next_partition_key: next_partition_key.into(),
            next_row_key: next_row_key.into(),
        }
    }

    pub fn next_partition_key(&self) -> &str {
        &self.next_partition_key
    }

    pub fn next_row_key(&self) -> &str {
        &self.next_row_key
    }
}

/// One page request of a segmented scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub filter: ScanFilter,
    /// Maximum number of records the store may return for this page
    pub take: usize,
    pub continuation: Option<ContinuationToken>,
}

/// One page of a segmented scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSegment {
    pub records: Vec<StoredRecord>,
    /// `Some` while more matching records may remain
    pub continuation: Option<ContinuationToken>,
}

/// A partitioned, sorted key-value table.
///
/// Implementations must be thread-safe (Send + Sync); the index layer shares one
/// store handle across concurrent calls and never holds it across calls.
#[async_trait::async_trait]
pub trait TableStore: Send + Sync {
    /// Name of the table this handle points at.
    fn table_name(&self) -> &str;

    /// Creates the table. Returns `Ok(false)` when it already existed.
    async fn create_table_if_not_exists(&self) -> Result<bool>;

    /// Deletes the table and all its records. Returns `Ok(false)` when it did not exist.
    async fn delete_table_if_exists(&self) -> Result<bool>;

    /// Point read. A missing entity is `Ok(None)`, not an error.
    async fn get(&self, id: &TableEntityId) -> Result<Option<StoredRecord>>;

    /// Point write.
    ///
    /// Returns the token assigned to the written record (`None` for deletes).
    /// `etag` is consulted for `Replace` and `Delete` only.
    async fn write(
        &self,
        kind: WriteKind,
        record: &TableRecord,
        etag: Option<&ETag>,
    ) -> Result<Option<ETag>>;

    /// Returns one page of records matching `request.filter`, in key order.
    async fn scan(&self, request: &ScanRequest) -> Result<ScanSegment>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for code in [409_u16, 412, 404, 500, 503] {
            assert_eq!(StoreStatus::from_code(code).code(), code);
        }
        assert_eq!(StoreStatus::from_code(409), StoreStatus::Conflict);
        assert_eq!(StoreStatus::from_code(500), StoreStatus::Other(500));
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::conflict("entity already exists");
        assert_eq!(err.to_string(), "Conflict (409): entity already exists");

        let err = StoreError::new(StoreStatus::Other(503), "server busy");
        assert_eq!(err.to_string(), "Status 503: server busy");
    }

    #[test]
    fn test_write_kind_display() {
        assert_eq!(WriteKind::InsertOrReplace.to_string(), "insert_or_replace");
        assert_eq!(WriteKind::Delete.to_string(), "delete");
    }
}
