//! Explicit entity contract for the table layer.
//!
//! Every entity stored through rowdex declares its persisted fields up front as a
//! static descriptor list and implements the two conversions by hand. The converter
//! in `rowdex-store` validates the descriptor list once, when it is constructed.
//!
//! ## Example
//!
//! ```rust
//! use rowdex_commons::{ETag, FieldDescriptor, FieldKind, FieldMap, TableEntity};
//! use uuid::Uuid;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Employee {
//!     id: Uuid,
//!     department_id: i32,
//!     etag: Option<ETag>,
//! }
//!
//! impl TableEntity for Employee {
//!     const TABLE_NAME: &'static str = "employee";
//!     const FIELDS: &'static [FieldDescriptor] = &[
//!         FieldDescriptor::new("Id", FieldKind::Guid),
//!         FieldDescriptor::new("DepartmentId", FieldKind::Int32),
//!     ];
//!
//!     fn to_fields(&self) -> FieldMap {
//!         FieldMap::new().with("Id", self.id).with("DepartmentId", self.department_id)
//!     }
//!
//!     fn from_fields(fields: &FieldMap) -> rowdex_commons::Result<Self> {
//!         Ok(Self {
//!             id: fields.get_guid("Id")?,
//!             department_id: fields.get_i32("DepartmentId")?,
//!             etag: None,
//!         })
//!     }
//!
//!     fn etag(&self) -> Option<&ETag> {
//!         self.etag.as_ref()
//!     }
//!
//!     fn set_etag(&mut self, etag: Option<ETag>) {
//!         self.etag = etag;
//!     }
//! }
//!
//! assert!(Employee::descriptor("Id").is_some());
//! ```

use crate::errors::Result;
use crate::models::{ETag, FieldKind, FieldMap};

/// Name of the canonical identity field used by `KeyBuilder::identity()`.
pub const IDENTITY_FIELD: &str = "Id";

/// Property names owned by the table store itself.
pub const RESERVED_FIELDS: &[&str] = &["PartitionKey", "RowKey", "Timestamp", "ETag"];

/// One declared, persisted property of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// An entity type that can be stored in a partitioned table.
pub trait TableEntity: Sized + Send + Sync + 'static {
    /// Table the entity type lives in.
    const TABLE_NAME: &'static str;

    /// Persisted fields, in declaration order.
    const FIELDS: &'static [FieldDescriptor];

    /// Map the entity to its persisted field map.
    fn to_fields(&self) -> FieldMap;

    /// Rebuild the entity from a persisted field map.
    fn from_fields(fields: &FieldMap) -> Result<Self>;

    /// Concurrency token carried by this instance, if it was read from or written to
    /// the store.
    fn etag(&self) -> Option<&ETag>;

    fn set_etag(&mut self, etag: Option<ETag>);

    /// Look up a declared field by name.
    fn descriptor(name: &str) -> Option<&'static FieldDescriptor> {
        Self::FIELDS.iter().find(|field| field.name == name)
    }
}
