//! Indexed table access.
//!
//! `IndexedTable<E>` is the entry point applications use. Each call names one
//! index; the index turns the entity (or a criterion entity carrying only the
//! key fields) into a `(PartitionKey, RowKey)` address, and the call is then
//! executed against the table store.
//!
//! ## Architecture
//!
//! ```text
//! IndexedTable<E>
//!     │
//!     ├── insert / replace / insert_or_replace (entity, index)
//!     │       │
//!     │       ▼
//!     │   registry.get(index) → index_keys(entity) → converter.serialize(entity)
//!     │       │
//!     │       ▼
//!     │   store.write(kind, record, etag) → entity + store-assigned etag
//!     │
//!     ├── get / delete (criterion, index)
//!     │       │
//!     │       ▼
//!     │   store.get / store.write(Delete, key, *)
//!     │
//!     └── query_by_prefix / query_by_range / query (shape)
//!             │
//!             ▼
//!         ScanFilter → store.scan(page) … until count reached or no continuation
//! ```
//!
//! ## Optimistic Concurrency
//!
//! - `insert` fails with `TableError::Conflict` when the key exists
//! - `replace` sends the entity's etag; a stale one fails with
//!   `TableError::PreconditionFailed`, the wildcard `*` always wins
//! - `insert_or_replace` never checks
//! - `delete` always uses the wildcard; a missing key is a store failure
//!
//! No call retries. Every call takes a `CancellationToken`; firing it abandons the
//! in-flight store request and returns `TableError::Cancelled`.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let table = IndexedTable::new(store, Arc::new(registry), Arc::new(DescriptorConverter::new()?));
//! let cancel = CancellationToken::new();
//!
//! let mut saved = table.insert(&employee, "default", &cancel).await?;
//! saved.name = "renamed".into();
//! let saved = table.replace(&saved, "default", &cancel).await?;
//!
//! let same_department = table
//!     .query_by_range("default", Some(&first), true, Some(&last), true, 100, &cancel)
//!     .await?;
//! ```

use rowdex_commons::{ETag, TableEntity, TableEntityId};
use rowdex_configs::RowdexConfig;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::converter::EntityConverter;
use crate::error::{Result, TableError};
use crate::index::{IndexDefinition, IndexRegistry};
use crate::query::{QuerySettings, QueryShape, ScanFilter};
use crate::storage_trait::{
    ScanRequest, StoreError, StoreStatus, StoredRecord, TableRecord, TableStore, WriteKind,
};

/// CRUD and query façade over one table for entity type `E`.
pub struct IndexedTable<E> {
    store: Arc<dyn TableStore>,
    registry: Arc<IndexRegistry<E>>,
    converter: Arc<dyn EntityConverter<E>>,
    settings: QuerySettings,
}

impl<E> Clone for IndexedTable<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            converter: Arc::clone(&self.converter),
            settings: self.settings,
        }
    }
}

impl<E: TableEntity> IndexedTable<E> {
    pub fn new(
        store: Arc<dyn TableStore>,
        registry: Arc<IndexRegistry<E>>,
        converter: Arc<dyn EntityConverter<E>>,
    ) -> Self {
        if store.table_name() != registry.table_name() {
            log::warn!(
                "Index registry targets table '{}' but store handle points at '{}'",
                registry.table_name(),
                store.table_name()
            );
        }
        Self {
            store,
            registry,
            converter,
            settings: QuerySettings::default(),
        }
    }

    /// Build from loaded configuration: `[query]` limits plus the optional `[table] name` override.
    pub fn from_config(
        store: Arc<dyn TableStore>,
        registry: IndexRegistry<E>,
        converter: Arc<dyn EntityConverter<E>>,
        config: &RowdexConfig,
    ) -> Self {
        let registry = match config.table.name.as_deref() {
            Some(name) => registry.renamed(name),
            None => registry,
        };
        Self::new(store, Arc::new(registry), converter).with_settings(QuerySettings::from(&config.query))
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn table_name(&self) -> &str {
        self.registry.table_name()
    }

    pub fn registry(&self) -> &IndexRegistry<E> {
        &self.registry
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    // ========================================================================
    // Table lifecycle
    // ========================================================================

    pub async fn create_table_if_not_exists(&self, cancel: &CancellationToken) -> Result<bool> {
        cancellable(cancel, self.store.create_table_if_not_exists())
            .await?
            .map_err(|err| TableError::unknown("create_table", self.table_name(), "", err))
    }

    pub async fn delete_table_if_exists(&self, cancel: &CancellationToken) -> Result<bool> {
        cancellable(cancel, self.store.delete_table_if_exists())
            .await?
            .map_err(|err| TableError::unknown("delete_table", self.table_name(), "", err))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a new entity. Fails with `Conflict` when the key is taken.
    pub async fn insert(&self, entity: &E, index: &str, cancel: &CancellationToken) -> Result<E> {
        self.write_entity(WriteKind::Insert, entity, index, cancel).await
    }

    /// Replace an existing entity, guarded by the etag it carries.
    pub async fn replace(&self, entity: &E, index: &str, cancel: &CancellationToken) -> Result<E> {
        self.write_entity(WriteKind::Replace, entity, index, cancel).await
    }

    /// Create or overwrite without a concurrency check.
    pub async fn insert_or_replace(
        &self,
        entity: &E,
        index: &str,
        cancel: &CancellationToken,
    ) -> Result<E> {
        self.write_entity(WriteKind::InsertOrReplace, entity, index, cancel).await
    }

    /// Delete the entity addressed by `criterion`, whatever its current etag.
    ///
    /// A missing entity is reported by the store and surfaces as `TableError::Unknown`.
    pub async fn delete(&self, criterion: &E, index: &str, cancel: &CancellationToken) -> Result<()> {
        let id = self.index_keys(index, criterion)?;
        log::debug!("delete {} via index '{}'", id, index);

        let record = TableRecord::key_only(id);
        let any = ETag::any();
        cancellable(cancel, self.store.write(WriteKind::Delete, &record, Some(&any)))
            .await?
            .map_err(|err| {
                TableError::from_write(
                    WriteKind::Delete,
                    record.id.partition_key(),
                    record.id.row_key(),
                    err,
                )
            })?;
        Ok(())
    }

    async fn write_entity(
        &self,
        kind: WriteKind,
        entity: &E,
        index: &str,
        cancel: &CancellationToken,
    ) -> Result<E> {
        let id = self.index_keys(index, entity)?;

        let etag = match kind {
            WriteKind::Replace => match entity.etag() {
                Some(etag) if !etag.is_empty() => Some(etag.clone()),
                _ => {
                    return Err(TableError::InvalidArgument(format!(
                        "replace of {} requires the entity's etag",
                        id
                    )))
                }
            },
            _ => None,
        };

        let record = TableRecord::new(id, self.converter.serialize(entity));
        log::debug!("{} {} via index '{}'", kind, record.id, index);

        let assigned = cancellable(cancel, self.store.write(kind, &record, etag.as_ref()))
            .await?
            .map_err(|err| {
                TableError::from_write(kind, record.id.partition_key(), record.id.row_key(), err)
            })?
            .ok_or_else(|| {
                TableError::unknown(
                    kind.to_string(),
                    record.id.partition_key(),
                    record.id.row_key(),
                    StoreError::new(StoreStatus::Other(200), "write returned no etag"),
                )
            })?;

        let mut written = self.converter.deserialize(&record.fields)?;
        written.set_etag(Some(assigned));
        Ok(written)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Point read. `Ok(None)` when nothing is stored under the criterion's key.
    pub async fn get(
        &self,
        criterion: &E,
        index: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<E>> {
        let id = self.index_keys(index, criterion)?;
        log::debug!("get {} via index '{}'", id, index);
        self.get_by_id(&id, cancel).await
    }

    async fn get_by_id(&self, id: &TableEntityId, cancel: &CancellationToken) -> Result<Option<E>> {
        match cancellable(cancel, self.store.get(id)).await? {
            Ok(Some(record)) => self.decode(record).map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(TableError::unknown(
                "get",
                id.partition_key(),
                id.row_key(),
                err,
            )),
        }
    }

    /// Entities whose RowKey under `index` starts with the criterion's RowKey,
    /// within the criterion's partition.
    pub async fn query_by_prefix(
        &self,
        index: &str,
        prefix: &E,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        let (partition_key, row_key_prefix) = self.index_keys(index, prefix)?.into_parts();
        let shape = QueryShape::Prefix {
            partition_key,
            row_key_prefix,
        };
        self.query(&shape, count, cancel).await
    }

    /// Entities between the criteria's RowKeys under `index`.
    ///
    /// At least one bound is required; when both are given they must fall in the
    /// same partition.
    #[allow(clippy::too_many_arguments)]
    pub async fn query_by_range(
        &self,
        index: &str,
        start: Option<&E>,
        start_inclusive: bool,
        end: Option<&E>,
        end_inclusive: bool,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        let definition = self.registry.get(index)?;
        let start_id = start.map(|e| definition.index_keys(e)).transpose()?;
        let end_id = end.map(|e| definition.index_keys(e)).transpose()?;

        let partition_key = match (&start_id, &end_id) {
            (Some(s), Some(e)) if !s.same_partition(e) => {
                return Err(TableError::RangeSpansPartitions {
                    start: s.partition_key().to_string(),
                    end: e.partition_key().to_string(),
                })
            }
            (Some(id), _) | (None, Some(id)) => id.partition_key().to_string(),
            (None, None) => {
                return Err(TableError::InvalidArgument(
                    "range query requires a start or an end entity".to_string(),
                ))
            }
        };

        self.execute_range_query(
            &partition_key,
            start_id.as_ref().map(|id| id.row_key()),
            start_inclusive,
            end_id.as_ref().map(|id| id.row_key()),
            end_inclusive,
            count,
            cancel,
        )
        .await
    }

    /// Range scan over already encoded keys inside one partition.
    #[allow(clippy::too_many_arguments)]
    pub async fn execute_range_query(
        &self,
        partition_key: &str,
        row_key_start: Option<&str>,
        start_inclusive: bool,
        row_key_end: Option<&str>,
        end_inclusive: bool,
        max_count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        let shape = QueryShape::Range {
            partition_key: partition_key.to_string(),
            row_key_start: row_key_start.map(str::to_string),
            start_inclusive,
            row_key_end: row_key_end.map(str::to_string),
            end_inclusive,
        };
        self.query(&shape, max_count, cancel).await
    }

    /// Run any query shape, returning at most `count` entities in key order.
    pub async fn query(
        &self,
        shape: &QueryShape,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        if let QueryShape::Point { id } = shape {
            if count == 0 {
                return Ok(Vec::new());
            }
            return Ok(self.get_by_id(id, cancel).await?.into_iter().collect());
        }

        let filter = shape.to_filter()?;
        self.scan(filter, count, cancel).await
    }

    async fn scan(
        &self,
        filter: ScanFilter,
        max_count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        let mut results = Vec::new();
        if max_count == 0 {
            return Ok(results);
        }
        log::debug!("scan [{}] up to {} records", filter, max_count);

        let mut request = ScanRequest {
            filter,
            take: 0,
            continuation: None,
        };
        let mut pages = 0;

        loop {
            request.take = self.settings.page_take(max_count - results.len());
            let segment = cancellable(cancel, self.store.scan(&request))
                .await?
                .map_err(|err| {
                    let row_key = request.filter.lower.as_ref().map_or("", |b| b.value.as_str());
                    TableError::unknown("scan", request.filter.partition_key.as_str(), row_key, err)
                })?;
            pages += 1;
            log::trace!(
                "scan page {}: {} records, continuation: {}",
                pages,
                segment.records.len(),
                segment.continuation.is_some()
            );

            for record in segment.records {
                if results.len() == max_count {
                    break;
                }
                results.push(self.decode(record)?);
            }

            match segment.continuation {
                Some(token) if results.len() < max_count => {
                    if pages >= self.settings.max_pages {
                        log::warn!(
                            "scan [{}] hit the page cap after {} pages with {} of {} records",
                            request.filter,
                            pages,
                            results.len(),
                            max_count
                        );
                        return Err(TableError::PageLimitExceeded {
                            partition_key: request.filter.partition_key.clone(),
                            pages,
                            collected: results.len(),
                        });
                    }
                    request.continuation = Some(token);
                }
                _ => break,
            }
        }

        Ok(results)
    }

    // ========================================================================
    // Index helpers
    // ========================================================================

    pub fn index(&self, name: &str) -> Result<&Arc<IndexDefinition<E>>> {
        self.registry.get(name)
    }

    /// Encoded address of `entity` under `index`.
    pub fn index_keys(&self, index: &str, entity: &E) -> Result<TableEntityId> {
        Ok(self.registry.get(index)?.index_keys(entity)?)
    }

    /// Content payload of `entity` under `index`.
    pub fn index_content(&self, index: &str, entity: &E) -> Result<String> {
        Ok(self.registry.get(index)?.index_content(entity)?)
    }

    fn decode(&self, record: StoredRecord) -> Result<E> {
        let mut entity = self.converter.deserialize(&record.fields)?;
        // records without a token come back as fresh entities
        entity.set_etag(record.etag.filter(|etag| !etag.is_empty()));
        Ok(entity)
    }
}

async fn cancellable<T>(cancel: &CancellationToken, fut: impl Future<Output = T>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TableError::Cancelled),
        output = fut => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::DescriptorConverter;
    use crate::error::ErrorKind;
    use crate::in_memory::InMemoryTableStore;
    use crate::index::IndexBuilder;
    use crate::test_utils::{employee_table, TestEmployee};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_index_helpers() {
        let store = Arc::new(InMemoryTableStore::created("employee"));
        let table = employee_table(store);
        let employee = TestEmployee::new(1, Uuid::nil(), "n");

        let id = table.index_keys("name", &employee).unwrap();
        assert_eq!(id.row_key(), "n");
        assert!(table.index_content("default", &employee).unwrap().contains("\"Name\":\"n\""));
        assert!(matches!(
            table.index_keys("missing", &employee),
            Err(TableError::UnknownIndex(_))
        ));
        assert_eq!(table.table_name(), "employee");
    }

    #[tokio::test]
    async fn test_from_config_applies_overrides() {
        let config = RowdexConfig::from_toml_str(
            "[table]\nname = \"employee_v2\"\n\n[query]\nmax_page_size = 25\nmax_pages = 4\n",
        )
        .unwrap();
        let store = Arc::new(InMemoryTableStore::created("employee_v2"));
        let registry = IndexRegistry::new()
            .with_index(
                IndexBuilder::<TestEmployee>::new("default")
                    .partition(|k| k.add(|e: &TestEmployee| e.department_id))
                    .row_key(|k| k.identity())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let table = IndexedTable::from_config(
            store,
            registry,
            Arc::new(DescriptorConverter::<TestEmployee>::new().unwrap()),
            &config,
        );

        assert_eq!(table.table_name(), "employee_v2");
        assert_eq!(table.settings().max_page_size, 25);
        assert_eq!(table.settings().max_pages, 4);
    }

    #[tokio::test]
    async fn test_replace_without_etag_is_rejected_before_store_call() {
        let store = Arc::new(InMemoryTableStore::created("employee"));
        let table = employee_table(store.clone());
        let cancel = CancellationToken::new();

        let err = table
            .replace(&TestEmployee::new(1, Uuid::new_v4(), "x"), "default", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TableError::InvalidArgument(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_zero_count_skips_store() {
        let store = Arc::new(InMemoryTableStore::created("employee"));
        let table = employee_table(store.clone());
        let cancel = CancellationToken::new();

        let criterion = TestEmployee::new(1, Uuid::nil(), "a");
        let rows = table.query_by_prefix("name", &criterion, 0, &cancel).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(store.scan_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let store = Arc::new(InMemoryTableStore::created("employee"));
        let table = employee_table(store.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = table
            .insert(&TestEmployee::new(1, Uuid::new_v4(), "x"), "default", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TableError::Cancelled));
        assert!(store.is_empty());
    }

    /// Accepts every write but never hands back a token.
    struct TokenlessStore;

    #[async_trait::async_trait]
    impl TableStore for TokenlessStore {
        fn table_name(&self) -> &str {
            "employee"
        }

        async fn create_table_if_not_exists(&self) -> std::result::Result<bool, StoreError> {
            Ok(false)
        }

        async fn delete_table_if_exists(&self) -> std::result::Result<bool, StoreError> {
            Ok(false)
        }

        async fn get(&self, _id: &TableEntityId) -> std::result::Result<Option<StoredRecord>, StoreError> {
            Ok(None)
        }

        async fn write(
            &self,
            _kind: WriteKind,
            _record: &TableRecord,
            _etag: Option<&ETag>,
        ) -> std::result::Result<Option<ETag>, StoreError> {
            Ok(None)
        }

        async fn scan(
            &self,
            _request: &ScanRequest,
        ) -> std::result::Result<crate::storage_trait::ScanSegment, StoreError> {
            Ok(Default::default())
        }
    }

    #[tokio::test]
    async fn test_write_without_assigned_etag_is_unknown() {
        let registry = IndexRegistry::new()
            .with_index(
                IndexBuilder::<TestEmployee>::new("default")
                    .partition(|k| k.add(|e: &TestEmployee| e.department_id))
                    .row_key(|k| k.identity())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let table = IndexedTable::new(
            Arc::new(TokenlessStore),
            Arc::new(registry),
            Arc::new(DescriptorConverter::<TestEmployee>::new().unwrap()),
        );
        let cancel = CancellationToken::new();
        let mut employee = TestEmployee::new(1, Uuid::new_v4(), "x");

        let err = table.insert(&employee, "default", &cancel).await.unwrap_err();
        assert!(matches!(&err, TableError::Unknown { operation, .. } if operation == "insert"));

        let err = table.insert_or_replace(&employee, "default", &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        employee.etag = Some(ETag::any());
        let err = table.replace(&employee, "default", &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        // deletes carry no token
        table.delete(&employee, "default", &cancel).await.unwrap();
    }
}
