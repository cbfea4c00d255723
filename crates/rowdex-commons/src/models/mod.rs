//! Core models shared by the index layer and the table store.

pub mod entity;
pub mod etag;
pub mod field_value;
pub mod key_value;
pub mod table_entity_id;

pub use entity::{FieldDescriptor, TableEntity, IDENTITY_FIELD, RESERVED_FIELDS};
pub use etag::ETag;
pub use field_value::{FieldKind, FieldMap, FieldValue};
pub use key_value::KeyValue;
pub use table_entity_id::TableEntityId;
