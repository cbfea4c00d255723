//! # rowdex-store
//!
//! Typed secondary indexes over a partitioned, sorted key-value table.
//!
//! ## Architecture
//!
//! ```text
//! application
//!     ↓
//! IndexedTable<E>            (CRUD, optimistic concurrency, pagination)
//!     ↓
//! IndexRegistry<E>           (index name → IndexDefinition)
//!     ↓
//! key_encoding               (typed values → order-preserving key fragments)
//!     ↓
//! dyn TableStore             (remote table, or InMemoryTableStore)
//! ```
//!
//! ## Key Layout
//!
//! - **PartitionKey**: partition projections of the index, encoded and joined by `-`
//! - **RowKey**: row-key projections of the index, encoded and joined by `-`
//!
//! Range and prefix queries never leave the partition of their criterion.

pub mod converter;
pub mod error;
pub mod in_memory;
pub mod index;
pub mod indexed_table;
pub mod key_encoding;
pub mod query;
pub mod storage_trait;

pub use converter::{DescriptorConverter, EntityConverter};
pub use error::{ConfigError, ErrorKind, TableError};
pub use in_memory::InMemoryTableStore;
pub use index::{IndexBuilder, IndexDefinition, IndexRegistry, KeyBuilder, KeyProjection};
pub use indexed_table::IndexedTable;
pub use query::{QuerySettings, QueryShape, RowKeyBound, ScanFilter};
pub use storage_trait::{
    ContinuationToken, ScanRequest, ScanSegment, StoreError, StoreStatus, StoredRecord,
    TableRecord, TableStore, WriteKind,
};

// Re-export the shared model types so callers need a single dependency.
pub use rowdex_commons::{ETag, FieldKind, FieldMap, FieldValue, KeyValue, TableEntity, TableEntityId};

// Make test_utils available for testing in dependent crates
pub mod test_utils;
