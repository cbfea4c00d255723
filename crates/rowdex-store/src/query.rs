//! Query shapes and their translation into store scan filters.
//!
//! Every query the index layer runs is one partition-equality test plus an
//! optional lower and upper bound on the RowKey:
//!
//! ```text
//! Point  { id }                     -> PartitionKey eq pk and RowKey ge rk and RowKey le rk
//! Prefix { pk, prefix }             -> PartitionKey eq pk and RowKey ge prefix
//!                                                          and RowKey le prefix + char::MAX
//! Range  { pk, start?, end?, .. }   -> PartitionKey eq pk [and RowKey ge|gt start]
//!                                                          [and RowKey le|lt end]
//! ```
//!
//! Pagination itself lives in `IndexedTable`; this module only decides what to ask
//! the store for.

use rowdex_commons::TableEntityId;
use rowdex_configs::QueryConfig;
use std::fmt;

use crate::error::TableError;

/// Upper sentinel appended to a prefix to close the prefix range.
pub const PREFIX_UPPER_SENTINEL: char = char::MAX;

/// One side of a RowKey range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKeyBound {
    pub value: String,
    pub inclusive: bool,
}

impl RowKeyBound {
    pub fn new(value: impl Into<String>, inclusive: bool) -> Self {
        Self {
            value: value.into(),
            inclusive,
        }
    }

    pub fn inclusive(value: impl Into<String>) -> Self {
        Self::new(value, true)
    }

    pub fn exclusive(value: impl Into<String>) -> Self {
        Self::new(value, false)
    }
}

/// Store-native filter: partition equality plus optional RowKey bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    pub partition_key: String,
    pub lower: Option<RowKeyBound>,
    pub upper: Option<RowKeyBound>,
}

impl ScanFilter {
    /// Whole-partition filter.
    pub fn partition(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            lower: None,
            upper: None,
        }
    }

    pub fn with_lower(mut self, bound: RowKeyBound) -> Self {
        self.lower = Some(bound);
        self
    }

    pub fn with_upper(mut self, bound: RowKeyBound) -> Self {
        self.upper = Some(bound);
        self
    }

    /// Inclusive range covering every RowKey that starts with `prefix`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rowdex_commons::TableEntityId;
    /// use rowdex_store::query::ScanFilter;
    ///
    /// let filter = ScanFilter::prefix("p", "aaa");
    /// assert!(filter.matches(&TableEntityId::new("p", "aaa")));
    /// assert!(filter.matches(&TableEntityId::new("p", "aaazzzz")));
    /// assert!(!filter.matches(&TableEntityId::new("p", "aab")));
    /// ```
    pub fn prefix(partition_key: impl Into<String>, prefix: &str) -> Self {
        let mut upper = String::with_capacity(prefix.len() + PREFIX_UPPER_SENTINEL.len_utf8());
        upper.push_str(prefix);
        upper.push(PREFIX_UPPER_SENTINEL);

        Self::partition(partition_key)
            .with_lower(RowKeyBound::inclusive(prefix))
            .with_upper(RowKeyBound::inclusive(upper))
    }

    /// Whether a record address falls inside the filter.
    pub fn matches(&self, id: &TableEntityId) -> bool {
        if id.partition_key() != self.partition_key {
            return false;
        }
        let row_key = id.row_key();
        let above_lower = self.lower.as_ref().map_or(true, |bound| {
            if bound.inclusive {
                row_key >= bound.value.as_str()
            } else {
                row_key > bound.value.as_str()
            }
        });
        let below_upper = self.upper.as_ref().map_or(true, |bound| {
            if bound.inclusive {
                row_key <= bound.value.as_str()
            } else {
                row_key < bound.value.as_str()
            }
        });
        above_lower && below_upper
    }

    /// Render the filter in the remote store's query syntax.
    ///
    /// ```
    /// use rowdex_store::query::{RowKeyBound, ScanFilter};
    ///
    /// let filter = ScanFilter::partition("0000000001")
    ///     .with_lower(RowKeyBound::exclusive("o'neil"));
    /// assert_eq!(
    ///     filter.to_odata(),
    ///     "PartitionKey eq '0000000001' and RowKey gt 'o''neil'"
    /// );
    /// ```
    pub fn to_odata(&self) -> String {
        let mut filter = format!("PartitionKey eq {}", quote(&self.partition_key));
        if let Some(bound) = &self.lower {
            let op = if bound.inclusive { "ge" } else { "gt" };
            filter.push_str(&format!(" and RowKey {} {}", op, quote(&bound.value)));
        }
        if let Some(bound) = &self.upper {
            let op = if bound.inclusive { "le" } else { "lt" };
            filter.push_str(&format!(" and RowKey {} {}", op, quote(&bound.value)));
        }
        filter
    }
}

impl fmt::Display for ScanFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_odata())
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A query over already encoded keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryShape {
    Point {
        id: TableEntityId,
    },
    Prefix {
        partition_key: String,
        row_key_prefix: String,
    },
    Range {
        partition_key: String,
        row_key_start: Option<String>,
        start_inclusive: bool,
        row_key_end: Option<String>,
        end_inclusive: bool,
    },
}

impl QueryShape {
    /// Translate into a scan filter. A range without bounds is rejected.
    pub fn to_filter(&self) -> Result<ScanFilter, TableError> {
        match self {
            QueryShape::Point { id } => Ok(ScanFilter::partition(id.partition_key())
                .with_lower(RowKeyBound::inclusive(id.row_key()))
                .with_upper(RowKeyBound::inclusive(id.row_key()))),
            QueryShape::Prefix {
                partition_key,
                row_key_prefix,
            } => Ok(ScanFilter::prefix(partition_key.clone(), row_key_prefix)),
            QueryShape::Range {
                partition_key,
                row_key_start,
                start_inclusive,
                row_key_end,
                end_inclusive,
            } => {
                if row_key_start.is_none() && row_key_end.is_none() {
                    return Err(TableError::InvalidArgument(
                        "range query requires a start or an end bound".to_string(),
                    ));
                }
                let mut filter = ScanFilter::partition(partition_key.clone());
                if let Some(start) = row_key_start {
                    filter = filter.with_lower(RowKeyBound::new(start.clone(), *start_inclusive));
                }
                if let Some(end) = row_key_end {
                    filter = filter.with_upper(RowKeyBound::new(end.clone(), *end_inclusive));
                }
                Ok(filter)
            }
        }
    }

    pub fn partition_key(&self) -> &str {
        match self {
            QueryShape::Point { id } => id.partition_key(),
            QueryShape::Prefix { partition_key, .. } | QueryShape::Range { partition_key, .. } => {
                partition_key
            }
        }
    }
}

/// Pagination limits applied to every range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    /// Upper bound on the `take` of a single page request
    pub max_page_size: usize,
    /// Safety cap on the number of page requests per query
    pub max_pages: usize,
}

impl QuerySettings {
    /// Number of records to request next.
    pub fn page_take(&self, remaining: usize) -> usize {
        remaining.min(self.max_page_size).max(1)
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        QuerySettings::from(&QueryConfig::default())
    }
}

impl From<&QueryConfig> for QuerySettings {
    fn from(config: &QueryConfig) -> Self {
        Self {
            max_page_size: config.max_page_size,
            max_pages: config.max_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(rk: &str) -> TableEntityId {
        TableEntityId::new("p", rk)
    }

    #[test]
    fn test_prefix_matches() {
        let filter = ScanFilter::prefix("p", "aaa");
        for rk in ["aaa", "aaab", "aaazzzz", "aaa\u{FFFF}"] {
            assert!(filter.matches(&id(rk)), "{rk}");
        }
        for rk in ["aab", "aa", "", "b"] {
            assert!(!filter.matches(&id(rk)), "{rk}");
        }
        assert!(!filter.matches(&TableEntityId::new("q", "aaa")));
    }

    #[test]
    fn test_range_bounds() {
        let filter = ScanFilter::partition("p")
            .with_lower(RowKeyBound::exclusive("b"))
            .with_upper(RowKeyBound::inclusive("d"));
        assert!(!filter.matches(&id("b")));
        assert!(filter.matches(&id("c")));
        assert!(filter.matches(&id("d")));
        assert!(!filter.matches(&id("da")));
    }

    #[test]
    fn test_odata_rendering() {
        let filter = ScanFilter::partition("0000000001")
            .with_lower(RowKeyBound::inclusive("a"))
            .with_upper(RowKeyBound::exclusive("z"));
        assert_eq!(
            filter.to_odata(),
            "PartitionKey eq '0000000001' and RowKey ge 'a' and RowKey lt 'z'"
        );
        assert_eq!(ScanFilter::partition("x").to_string(), "PartitionKey eq 'x'");
    }

    #[test]
    fn test_shape_translation() {
        let point = QueryShape::Point { id: id("k") };
        let filter = point.to_filter().unwrap();
        assert!(filter.matches(&id("k")));
        assert!(!filter.matches(&id("ka")));

        let open_end = QueryShape::Range {
            partition_key: "p".into(),
            row_key_start: Some("m".into()),
            start_inclusive: true,
            row_key_end: None,
            end_inclusive: false,
        };
        let filter = open_end.to_filter().unwrap();
        assert!(filter.upper.is_none());
        assert_eq!(open_end.partition_key(), "p");
    }

    #[test]
    fn test_unbounded_range_rejected() {
        let shape = QueryShape::Range {
            partition_key: "p".into(),
            row_key_start: None,
            start_inclusive: true,
            row_key_end: None,
            end_inclusive: true,
        };
        assert!(matches!(shape.to_filter(), Err(TableError::InvalidArgument(_))));
    }

    #[test]
    fn test_page_take() {
        let settings = QuerySettings {
            max_page_size: 1000,
            max_pages: 10,
        };
        assert_eq!(settings.page_take(5), 5);
        assert_eq!(settings.page_take(2500), 1000);
    }
}
