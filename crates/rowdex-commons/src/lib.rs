//! # rowdex-commons
//!
//! Shared types used across the rowdex crates.
//!
//! ## Key Types
//!
//! - `TableEntityId`: the encoded `(PartitionKey, RowKey)` address of one entity
//! - `KeyValue`: a typed scalar projected out of an entity to build a key
//! - `FieldValue` / `FieldMap`: the field map persisted next to every record
//! - `ETag`: the opaque concurrency token assigned by the table store
//! - `TableEntity`: the explicit field-descriptor contract an entity type implements
//!
//! ## Example Usage
//!
//! ```rust
//! use rowdex_commons::{KeyValue, TableEntityId};
//!
//! let id = TableEntityId::new("0000000001", "aaa");
//! assert_eq!(id.partition_key(), "0000000001");
//!
//! let value: KeyValue = 42_i32.into();
//! assert_eq!(value, KeyValue::Int32(42));
//! ```

pub mod errors;
pub mod models;

pub use errors::{ConvertError, Result};
pub use models::{
    ETag, FieldDescriptor, FieldKind, FieldMap, FieldValue, KeyValue, TableEntity, TableEntityId,
    IDENTITY_FIELD, RESERVED_FIELDS,
};
