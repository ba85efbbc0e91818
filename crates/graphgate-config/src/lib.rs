//! Configuration system for the graphgate gateway.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[llm]`, `[mcp]`, `[tools]` and `[graph]` sections, all optional
//! - Config file layering (user config dir + project-local overrides)
//! - API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    load_explicit, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
