//! Index definitions and their builder.
//!
//! An index derives the `(PartitionKey, RowKey)` address of an entity from an
//! ordered list of projections per key, plus an optional content projection.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rowdex_store::IndexBuilder;
//!
//! // Employees partitioned by department, ordered by id.
//! let by_id = IndexBuilder::<Employee>::new("default")
//!     .partition(|k| k.add(|e: &Employee| e.department_id))
//!     .row_key(|k| k.identity())
//!     .build()?;
//!
//! // A namespaced secondary sort key inside the same partition.
//! let by_name = IndexBuilder::<Employee>::new("name")
//!     .partition(|k| k.add(|e: &Employee| e.department_id))
//!     .row_key(|k| k.constant("namerow").add(|e: &Employee| e.name.clone()))
//!     .content_json(|e: &Employee| e.id)
//!     .build()?;
//! ```

use rowdex_commons::{ConvertError, FieldKind, TableEntity, TableEntityId, IDENTITY_FIELD};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::index::extractor::{
    ConstantProjection, FunctionProjection, IdentityProjection, KeyProjection,
};
use crate::key_encoding;

type Projection<E> = Arc<dyn KeyProjection<E>>;
type ContentFn<E> = Arc<dyn Fn(&E) -> Result<String, ConvertError> + Send + Sync>;

// ============================================================================
// KeyBuilder
// ============================================================================

/// Ordered projection list for one key (partition or row).
pub struct KeyBuilder<E> {
    projections: Vec<Projection<E>>,
    uses_identity: bool,
}

impl<E: TableEntity> KeyBuilder<E> {
    fn new() -> Self {
        Self {
            projections: Vec::new(),
            uses_identity: false,
        }
    }

    /// Append a projected fragment.
    pub fn add<V, F>(mut self, func: F) -> Self
    where
        F: Fn(&E) -> V + Send + Sync + 'static,
        V: Into<rowdex_commons::KeyValue> + 'static,
    {
        self.projections.push(Arc::new(FunctionProjection::new(func)));
        self
    }

    /// Append a custom projection.
    pub fn add_projection(mut self, projection: impl KeyProjection<E> + 'static) -> Self {
        self.projections.push(Arc::new(projection));
        self
    }

    /// Append the entity's `Id` GUID.
    pub fn identity(mut self) -> Self {
        self.uses_identity = true;
        self.projections.push(Arc::new(IdentityProjection));
        self
    }

    /// Append a fixed fragment.
    pub fn constant(mut self, value: impl Into<rowdex_commons::KeyValue>) -> Self {
        self.projections.push(Arc::new(ConstantProjection::new(value)));
        self
    }

    /// Shorthand for `constant("instance")`, used by single-row indexes.
    pub fn instance(self) -> Self {
        self.constant("instance")
    }
}

// ============================================================================
// IndexBuilder
// ============================================================================

/// Immutable builder for an [`IndexDefinition`].
///
/// Every method consumes the builder; nothing is evaluated until keys are requested
/// from the finished definition.
pub struct IndexBuilder<E> {
    name: String,
    partition: KeyBuilder<E>,
    row_key: KeyBuilder<E>,
    content: Option<ContentFn<E>>,
}

impl<E: TableEntity> IndexBuilder<E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition: KeyBuilder::new(),
            row_key: KeyBuilder::new(),
            content: None,
        }
    }

    pub fn partition(mut self, configure: impl FnOnce(KeyBuilder<E>) -> KeyBuilder<E>) -> Self {
        self.partition = configure(self.partition);
        self
    }

    pub fn row_key(mut self, configure: impl FnOnce(KeyBuilder<E>) -> KeyBuilder<E>) -> Self {
        self.row_key = configure(self.row_key);
        self
    }

    /// Use a string-valued content projection.
    pub fn content<F>(mut self, func: F) -> Self
    where
        F: Fn(&E) -> String + Send + Sync + 'static,
    {
        self.content = Some(Arc::new(move |entity: &E| Ok(func(entity))));
        self
    }

    /// Use a content projection rendered as JSON.
    pub fn content_json<T, F>(mut self, func: F) -> Self
    where
        T: Serialize,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        self.content = Some(Arc::new(move |entity: &E| to_json(&func(entity))));
        self
    }

    pub fn build(self) -> Result<IndexDefinition<E>, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyIndexName);
        }

        if self.partition.uses_identity || self.row_key.uses_identity {
            let declared = E::descriptor(IDENTITY_FIELD).map(|field| field.kind);
            if declared != Some(FieldKind::Guid) {
                return Err(ConfigError::MissingIdentity {
                    entity: E::TABLE_NAME,
                });
            }
        }

        Ok(IndexDefinition {
            name: self.name,
            partition: self.partition.projections,
            row_key: self.row_key.projections,
            content: self.content,
        })
    }
}

// ============================================================================
// IndexDefinition
// ============================================================================

/// A named, read-only index over entity type `E`.
pub struct IndexDefinition<E> {
    name: String,
    partition: Vec<Projection<E>>,
    row_key: Vec<Projection<E>>,
    content: Option<ContentFn<E>>,
}

impl<E: TableEntity> IndexDefinition<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate every projection in declaration order and combine each key.
    pub fn index_keys(&self, entity: &E) -> Result<TableEntityId, ConvertError> {
        Ok(TableEntityId::new(
            self.partition_key(entity)?,
            self.row_key(entity)?,
        ))
    }

    pub fn partition_key(&self, entity: &E) -> Result<String, ConvertError> {
        compose(&self.partition, entity)
    }

    pub fn row_key(&self, entity: &E) -> Result<String, ConvertError> {
        compose(&self.row_key, entity)
    }

    /// Auxiliary payload for the entity.
    ///
    /// Without a content projection this is the JSON rendering of the entity's
    /// field map.
    pub fn index_content(&self, entity: &E) -> Result<String, ConvertError> {
        match &self.content {
            Some(content) => content(entity),
            None => to_json(&entity.to_fields()),
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

impl<E> Clone for IndexDefinition<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            partition: self.partition.clone(),
            row_key: self.row_key.clone(),
            content: self.content.clone(),
        }
    }
}

impl<E> fmt::Debug for IndexDefinition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDefinition")
            .field("name", &self.name)
            .field("partition_projections", &self.partition.len())
            .field("row_key_projections", &self.row_key.len())
            .field("has_content", &self.content.is_some())
            .finish()
    }
}

fn compose<E>(projections: &[Projection<E>], entity: &E) -> Result<String, ConvertError> {
    let fragments = projections
        .iter()
        .map(|projection| projection.project(entity).map(|value| key_encoding::encode(&value)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(key_encoding::combine(fragments))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ConvertError> {
    serde_json::to_string(value).map_err(|e| ConvertError::invalid("content", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{NoIdentity, TestDepartment, TestEmployee};
    use uuid::Uuid;

    fn employee_default() -> IndexDefinition<TestEmployee> {
        IndexBuilder::new("default")
            .partition(|k| k.add(|e: &TestEmployee| e.department_id))
            .row_key(|k| k.identity())
            .build()
            .unwrap()
    }

    #[test]
    fn test_index_keys() {
        let id = Uuid::parse_str("3abad168-6bfc-4b0a-9c95-2960fee61833").unwrap();
        let employee = TestEmployee::new(1, id, "alice");

        let keys = employee_default().index_keys(&employee).unwrap();
        assert_eq!(keys.partition_key(), "0000000001");
        assert_eq!(keys.row_key(), "3abad1686bfc4b0a9c952960fee61833");
    }

    #[test]
    fn test_multi_fragment_keys() {
        let index = IndexBuilder::<TestDepartment>::new("name")
            .partition(|k| k.add(|d: &TestDepartment| d.company_id).instance())
            .row_key(|k| k.constant("namerow").add(|d: &TestDepartment| d.name.clone()))
            .build()
            .unwrap();

        let department = TestDepartment::new(3, 12, "R&D/West");
        let keys = index.index_keys(&department).unwrap();
        assert_eq!(keys.partition_key(), "0000000003-instance");
        assert_eq!(keys.row_key(), "namerow-R&D\u{21C3}West");
    }

    #[test]
    fn test_empty_row_key() {
        let index = IndexBuilder::<TestDepartment>::new("by_company")
            .partition(|k| k.add(|d: &TestDepartment| d.company_id))
            .build()
            .unwrap();
        let keys = index.index_keys(&TestDepartment::new(1, 1, "x")).unwrap();
        assert_eq!(keys.row_key(), "");
    }

    #[test]
    fn test_identity_requires_guid_id_field() {
        let err = IndexBuilder::<NoIdentity>::new("default")
            .partition(|k| k.instance())
            .row_key(|k| k.identity())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingIdentity { entity: "no_identity" });

        // TestDepartment declares Id, but as Int32
        let err = IndexBuilder::<TestDepartment>::new("default")
            .row_key(|k| k.identity())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingIdentity { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = IndexBuilder::<TestEmployee>::new("  ").build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyIndexName);
    }

    #[test]
    fn test_default_content_is_field_map_json() {
        let employee = TestEmployee::new(2, Uuid::nil(), "bob");
        let content = employee_default().index_content(&employee).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["DepartmentId"], 2);
        assert_eq!(json["Name"], "bob");
    }

    #[test]
    fn test_custom_content() {
        let index = IndexBuilder::<TestEmployee>::new("name")
            .partition(|k| k.add(|e: &TestEmployee| e.department_id))
            .row_key(|k| k.add(|e: &TestEmployee| e.name.clone()))
            .content(|e: &TestEmployee| e.name.to_uppercase())
            .build()
            .unwrap();
        let employee = TestEmployee::new(2, Uuid::nil(), "bob");
        assert_eq!(index.index_content(&employee).unwrap(), "BOB");

        let index = IndexBuilder::<TestEmployee>::new("json")
            .content_json(|e: &TestEmployee| vec![e.department_id])
            .build()
            .unwrap();
        assert_eq!(index.index_content(&employee).unwrap(), "[2]");
    }
}
