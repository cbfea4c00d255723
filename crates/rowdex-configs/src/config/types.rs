use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level configuration, usually loaded from `rowdex.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowdexConfig {
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    /// Overrides the entity's declared table name
    #[serde(default)]
    pub name: Option<String>,
}

/// Paging limits for range and prefix queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Rows requested per store call (1..=1000)
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Upper bound on store calls for a single query
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// Append logs to this file in addition to (or instead of) the console
    #[serde(default)]
    pub file_path: Option<String>,
    /// Optional per-target log level overrides (e.g., rowdex_store="debug")
    /// Configure via a TOML table:
    /// [logging.targets]
    /// rowdex_store = "debug"
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_to_console: default_true(),
            file_path: None,
            targets: HashMap::new(),
        }
    }
}
