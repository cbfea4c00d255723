// Composite (PartitionKey, RowKey) address of one entity under one index

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully encoded composite address of an entity under a single index.
///
/// Both components are already order-preserving strings, so the derived ordering
/// (partition key first, then row key, plain byte-wise string comparison) matches the
/// order in which the table store keeps records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableEntityId {
    partition_key: String,
    row_key: String,
}

impl TableEntityId {
    /// Create a new id from already encoded key strings.
    #[inline]
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }

    /// Get the partition key component
    #[inline]
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Get the row key component
    #[inline]
    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// Returns true when both ids live in the same partition.
    #[inline]
    pub fn same_partition(&self, other: &TableEntityId) -> bool {
        self.partition_key == other.partition_key
    }

    /// Consume and return inner components
    pub fn into_parts(self) -> (String, String) {
        (self.partition_key, self.row_key)
    }
}

impl fmt::Display for TableEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.partition_key, self.row_key)
    }
}
