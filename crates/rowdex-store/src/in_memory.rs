//! In-memory `TableStore`.
//!
//! Behaves like the remote table store as far as the index layer can observe:
//! records sorted by `(PartitionKey, RowKey)`, a fresh concurrency token on every
//! write, 409/412/404 statuses, and segmented scans that stop at a per-response
//! cap and hand back a continuation token.
//!
//! **IMPORTANT**: data lives only as long as the store value. This is a reference
//! and test double, not a storage engine.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rowdex_commons::{ETag, FieldMap, TableEntityId};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::storage_trait::{
    ContinuationToken, Result, ScanRequest, ScanSegment, StoreError, StoredRecord, TableRecord,
    TableStore, WriteKind,
};

/// Maximum records the remote store returns per scan response.
pub const DEFAULT_SEGMENT_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
struct Entry {
    fields: FieldMap,
    etag: Option<ETag>,
}

type Rows = BTreeMap<TableEntityId, Entry>;

/// Sorted, partitioned table kept in memory.
pub struct InMemoryTableStore {
    table_name: String,
    // None while the table does not exist
    rows: RwLock<Option<Rows>>,
    etag_counter: AtomicU64,
    segment_limit: usize,
    latency: Option<Duration>,
    injected_failure: Mutex<Option<StoreError>>,
    scan_calls: AtomicU64,
}

impl InMemoryTableStore {
    /// Handle to a table that has not been created yet.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            rows: RwLock::new(None),
            etag_counter: AtomicU64::new(0),
            segment_limit: DEFAULT_SEGMENT_LIMIT,
            latency: None,
            injected_failure: Mutex::new(None),
            scan_calls: AtomicU64::new(0),
        }
    }

    /// Handle to an existing, empty table.
    pub fn created(table_name: impl Into<String>) -> Self {
        let store = Self::new(table_name);
        *store.rows.write() = Some(Rows::new());
        store
    }

    /// Cap the number of records returned by one scan response.
    pub fn with_segment_limit(mut self, limit: usize) -> Self {
        self.segment_limit = limit.max(1);
        self
    }

    /// Delay every call, simulating a remote round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        *self.injected_failure.lock() = Some(error);
    }

    /// Store a record without a concurrency token, as legacy rows may be.
    pub fn seed(&self, record: TableRecord) -> Result<()> {
        let mut guard = self.rows.write();
        let rows = guard.as_mut().ok_or_else(|| self.table_missing())?;
        rows.insert(
            record.id,
            Entry {
                fields: record.fields,
                etag: None,
            },
        );
        Ok(())
    }

    /// Number of records across all partitions.
    pub fn len(&self) -> usize {
        self.rows.read().as_ref().map_or(0, |rows| rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of scan requests served so far.
    pub fn scan_calls(&self) -> u64 {
        self.scan_calls.load(Ordering::Relaxed)
    }

    fn next_etag(&self) -> ETag {
        let n = self.etag_counter.fetch_add(1, Ordering::Relaxed) + 1;
        ETag::new(format!("W/\"{}\"", n))
    }

    fn table_missing(&self) -> StoreError {
        StoreError::not_found(format!("table '{}' does not exist", self.table_name))
    }

    async fn round_trip(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.injected_failure.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn apply_write(
        &self,
        rows: &mut Rows,
        kind: WriteKind,
        record: &TableRecord,
        etag: Option<&ETag>,
    ) -> Result<Option<ETag>> {
        let id = &record.id;
        match kind {
            WriteKind::Insert => {
                if rows.contains_key(id) {
                    return Err(StoreError::conflict(format!("entity {} already exists", id)));
                }
            }
            WriteKind::Replace | WriteKind::Delete => {
                let current = rows
                    .get(id)
                    .ok_or_else(|| StoreError::not_found(format!("entity {} not found", id)))?;
                let presented = etag.ok_or_else(|| {
                    StoreError::precondition_failed(format!("{} of {} requires an etag", kind, id))
                })?;
                if !presented.is_any() && current.etag.as_ref() != Some(presented) {
                    return Err(StoreError::precondition_failed(format!(
                        "etag {} does not match entity {}",
                        presented, id
                    )));
                }
            }
            WriteKind::InsertOrReplace => {}
        }

        if kind == WriteKind::Delete {
            rows.remove(id);
            return Ok(None);
        }

        let etag = self.next_etag();
        rows.insert(
            id.clone(),
            Entry {
                fields: record.fields.clone(),
                etag: Some(etag.clone()),
            },
        );
        Ok(Some(etag))
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn create_table_if_not_exists(&self) -> Result<bool> {
        self.round_trip().await?;
        let mut guard = self.rows.write();
        if guard.is_some() {
            return Ok(false);
        }
        *guard = Some(Rows::new());
        log::debug!("Created in-memory table '{}'", self.table_name);
        Ok(true)
    }

    async fn delete_table_if_exists(&self) -> Result<bool> {
        self.round_trip().await?;
        let dropped = self.rows.write().take().is_some();
        if dropped {
            log::debug!("Dropped in-memory table '{}'", self.table_name);
        }
        Ok(dropped)
    }

    async fn get(&self, id: &TableEntityId) -> Result<Option<StoredRecord>> {
        self.round_trip().await?;
        let guard = self.rows.read();
        let rows = guard.as_ref().ok_or_else(|| self.table_missing())?;
        Ok(rows.get(id).map(|entry| StoredRecord {
            id: id.clone(),
            fields: entry.fields.clone(),
            etag: entry.etag.clone(),
        }))
    }

    async fn write(
        &self,
        kind: WriteKind,
        record: &TableRecord,
        etag: Option<&ETag>,
    ) -> Result<Option<ETag>> {
        self.round_trip().await?;
        let mut guard = self.rows.write();
        let rows = guard.as_mut().ok_or_else(|| self.table_missing())?;
        let assigned = self.apply_write(rows, kind, record, etag)?;
        log::trace!("{} {} -> {:?}", kind, record.id, assigned);
        Ok(assigned)
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ScanSegment> {
        self.round_trip().await?;
        self.scan_calls.fetch_add(1, Ordering::Relaxed);

        let guard = self.rows.read();
        let rows = guard.as_ref().ok_or_else(|| self.table_missing())?;
        let filter = &request.filter;

        let start = match &request.continuation {
            Some(token) => TableEntityId::new(token.next_partition_key(), token.next_row_key()),
            None => TableEntityId::new(filter.partition_key.clone(), ""),
        };
        let limit = request.take.min(self.segment_limit);

        let mut matching = rows
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(|(id, _)| id.partition_key() == filter.partition_key)
            .filter(|(id, _)| filter.matches(id));

        let records: Vec<StoredRecord> = matching
            .by_ref()
            .take(limit)
            .map(|(id, entry)| StoredRecord {
                id: id.clone(),
                fields: entry.fields.clone(),
                etag: entry.etag.clone(),
            })
            .collect();

        let continuation = matching
            .next()
            .map(|(id, _)| ContinuationToken::new(id.partition_key(), id.row_key()));

        log::trace!(
            "Scan '{}' [{}] returned {} records (more: {})",
            self.table_name,
            filter,
            records.len(),
            continuation.is_some()
        );

        Ok(ScanSegment {
            records,
            continuation,
        })
    }
}
