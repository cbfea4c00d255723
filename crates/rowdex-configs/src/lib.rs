//! rowdex-configs
//!
//! Configuration types, TOML loader and logging setup for rowdex.

pub mod config;
pub mod logging;

pub use config::defaults;
pub use config::*;
pub use logging::{build_env_filter, init_logging, LogFormat};
