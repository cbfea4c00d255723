use rowdex_commons::TableEntity;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ConfigError, TableError};
use crate::index::definition::IndexDefinition;

/// Per-entity-type map from index name to definition.
///
/// Built once at startup, then shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone)]
pub struct IndexRegistry<E> {
    table_name: String,
    indexes: HashMap<String, Arc<IndexDefinition<E>>>,
}

impl<E: TableEntity> IndexRegistry<E> {
    /// Empty registry targeting `E::TABLE_NAME`.
    pub fn new() -> Self {
        Self::with_table_name(E::TABLE_NAME)
    }

    pub fn with_table_name(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            indexes: HashMap::new(),
        }
    }

    /// Same indexes, different physical table.
    pub fn renamed(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn register(&mut self, definition: IndexDefinition<E>) -> Result<(), ConfigError> {
        let name = definition.name().to_string();
        if self.indexes.contains_key(&name) {
            return Err(ConfigError::DuplicateIndex(name));
        }
        log::debug!("Registered index '{}' for table '{}'", name, self.table_name);
        self.indexes.insert(name, Arc::new(definition));
        Ok(())
    }

    /// Chainable form of [`register`](Self::register).
    pub fn with_index(mut self, definition: IndexDefinition<E>) -> Result<Self, ConfigError> {
        self.register(definition)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&Arc<IndexDefinition<E>>, TableError> {
        self.indexes
            .get(name)
            .ok_or_else(|| TableError::UnknownIndex(name.to_string()))
    }

    /// All definitions, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<IndexDefinition<E>>> {
        self.indexes.values()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

impl<E: TableEntity> Default for IndexRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
