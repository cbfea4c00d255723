use super::types::RowdexConfig;
use std::env;
use std::fs;
use std::path::Path;

const VALID_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const VALID_FORMATS: [&str; 3] = ["compact", "pretty", "json"];

/// Hard ceiling of the remote table service per scan call
pub const MAX_PAGE_SIZE_LIMIT: usize = 1000;

impl RowdexConfig {
    /// Load configuration from a TOML file
    ///
    /// Note: Environment overrides are applied separately via `apply_env_overrides()`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: RowdexConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Apply `ROWDEX_*` environment variables on top of the loaded values, then re-validate.
    ///
    /// - `ROWDEX_TABLE_NAME`
    /// - `ROWDEX_MAX_PAGE_SIZE`
    /// - `ROWDEX_MAX_PAGES`
    /// - `ROWDEX_LOG_LEVEL`
    /// - `ROWDEX_LOG_FORMAT`
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("ROWDEX_TABLE_NAME") {
            self.table.name = Some(name);
        }
        if let Some(value) = lookup("ROWDEX_MAX_PAGE_SIZE") {
            self.query.max_page_size = parse_usize("ROWDEX_MAX_PAGE_SIZE", &value)?;
        }
        if let Some(value) = lookup("ROWDEX_MAX_PAGES") {
            self.query.max_pages = parse_usize("ROWDEX_MAX_PAGES", &value)?;
        }
        if let Some(level) = lookup("ROWDEX_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Some(format) = lookup("ROWDEX_LOG_FORMAT") {
            self.logging.format = format.to_lowercase();
        }

        self.validate()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(name) = &self.table.name {
            if name.trim().is_empty() {
                return Err(anyhow::anyhow!("table.name cannot be empty"));
            }
        }

        // Validate paging limits
        if self.query.max_page_size == 0 || self.query.max_page_size > MAX_PAGE_SIZE_LIMIT {
            return Err(anyhow::anyhow!(
                "max_page_size ({}) must be between 1 and {}",
                self.query.max_page_size,
                MAX_PAGE_SIZE_LIMIT
            ));
        }

        if self.query.max_pages == 0 {
            return Err(anyhow::anyhow!("max_pages cannot be 0"));
        }

        // Validate log level
        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            ));
        }

        // Validate log format
        if !VALID_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                VALID_FORMATS.join(", ")
            ));
        }

        // Validate per-target log levels if provided
        for (target, level) in &self.logging.targets {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}' for target '{}'. Must be one of: {}",
                    level,
                    target,
                    VALID_LEVELS.join(", ")
                ));
            }
        }

        Ok(())
    }
}

fn parse_usize(key: &str, value: &str) -> anyhow::Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", value, key, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = RowdexConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.query.max_page_size, 1000);
        assert_eq!(config.query.max_pages, 10_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = RowdexConfig::from_toml_str("").unwrap();
        assert!(config.table.name.is_none());
        assert_eq!(config.logging.format, "compact");
        assert!(config.logging.log_to_console);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[table]
name = "employees_v2"

[query]
max_page_size = 250

[logging]
level = "debug"
format = "json"

[logging.targets]
rowdex_store = "trace"
"#
        )
        .unwrap();

        let config = RowdexConfig::from_file(file.path()).unwrap();
        assert_eq!(config.table.name.as_deref(), Some("employees_v2"));
        assert_eq!(config.query.max_page_size, 250);
        assert_eq!(config.query.max_pages, 10_000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.targets.get("rowdex_store").map(String::as_str), Some("trace"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RowdexConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = RowdexConfig::from_toml_str("[query\nmax_page_size = ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = RowdexConfig::default();
        config.query.max_page_size = 0;
        assert!(config.validate().is_err());
        config.query.max_page_size = 1001;
        assert!(config.validate().is_err());
        config.query.max_page_size = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_pages() {
        let mut config = RowdexConfig::default();
        config.query.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = RowdexConfig::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_target_level() {
        let mut config = RowdexConfig::default();
        config.logging.targets.insert("rowdex_store".into(), "loud".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rowdex_store"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ROWDEX_TABLE_NAME", "staging_employee"),
            ("ROWDEX_MAX_PAGE_SIZE", "100"),
            ("ROWDEX_LOG_LEVEL", "WARN"),
        ]
        .into_iter()
        .collect();

        let mut config = RowdexConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.table.name.as_deref(), Some("staging_employee"));
        assert_eq!(config.query.max_page_size, 100);
        assert_eq!(config.query.max_pages, 10_000);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_overrides_reject_bad_numbers() {
        let mut config = RowdexConfig::default();
        let err = config
            .apply_overrides(|key| (key == "ROWDEX_MAX_PAGES").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("ROWDEX_MAX_PAGES"));
    }
}
