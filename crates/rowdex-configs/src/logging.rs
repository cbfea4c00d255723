// Logging setup powered by tracing-subscriber
//
// Library crates log through the `log` facade. `tracing_log::LogTracer`
// forwards those records into the tracing subscriber installed here.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    Compact,
    /// Multi-line, human friendly output
    Pretty,
    /// JSON Lines format for structured logging
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

/// Build the `EnvFilter` from the base level and optional per-target overrides.
pub fn build_env_filter(
    level: &str,
    target_levels: Option<&HashMap<String, String>>,
) -> anyhow::Result<EnvFilter> {
    let mut directives = vec![level.to_string()];

    // Keep the runtime quiet unless asked
    for (target, lvl) in [("tokio", "warn"), ("runtime", "warn")] {
        directives.push(format!("{}={}", target, lvl));
    }

    if let Some(map) = target_levels {
        // Sorted so the resulting filter string is stable
        let mut overrides: Vec<_> = map.iter().collect();
        overrides.sort();
        for (target, lvl) in overrides {
            directives.push(format!("{}={}", target, lvl));
        }
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer {
    let layer = tracing_subscriber::fmt::layer().with_target(true);
    match format {
        LogFormat::Json => layer.json().with_filter(filter).boxed(),
        LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => layer.compact().with_filter(filter).boxed(),
    }
}

fn file_layer(format: LogFormat, file_path: &str, filter: EnvFilter) -> anyhow::Result<BoxedLayer> {
    if let Some(parent) = Path::new(file_path).parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(file_path)?;

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(log_file);
    let boxed = if format == LogFormat::Json {
        layer.json().with_filter(filter).boxed()
    } else {
        layer.with_filter(filter).boxed()
    };
    Ok(boxed)
}

/// Initialize logging based on configuration.
///
/// Installs a console layer (when `log_to_console` is set), a file layer
/// (when `file_path` is set) and the `LogTracer` bridge. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let format = LogFormat::parse(&config.format);
    let targets = Some(&config.targets);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.log_to_console {
        layers.push(console_layer(format, build_env_filter(&config.level, targets)?));
    }
    if let Some(path) = config.file_path.as_deref() {
        layers.push(file_layer(format, path, build_env_filter(&config.level, targets)?)?);
    }

    // ok() in case a bridge is already installed
    tracing_log::LogTracer::init().ok();

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::trace!(
        "Logging initialized: level={}, format={:?}, console={}, file={:?}",
        config.level,
        format,
        config.log_to_console,
        config.file_path
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSONL"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Compact);
    }

    #[test]
    fn test_build_env_filter_with_targets() {
        let mut targets = HashMap::new();
        targets.insert("rowdex_store".to_string(), "debug".to_string());
        let filter = build_env_filter("info", Some(&targets)).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("rowdex_store=debug"), "{rendered}");
    }

    #[test]
    fn test_build_env_filter_rejects_garbage() {
        let mut targets = HashMap::new();
        targets.insert("rowdex_store".to_string(), "loud".to_string());
        assert!(build_env_filter("info", Some(&targets)).is_err());
    }
}
