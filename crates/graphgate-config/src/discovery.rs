//! Finding config files and stacking them.
//!
//! Layers, lowest precedence first:
//! 1. `config.toml` in the user config dir (`$GRAPHGATE_CONFIG_DIR`, else
//!    the platform config dir joined with `graphgate`)
//! 2. `graphgate.toml` in the project directory
//!
//! Command-line flags are applied by the binary on top of the result.

use std::path::{Path, PathBuf};

use crate::{ConfigError, GatewayConfig, Result};

const PROJECT_CONFIG_FILE: &str = "graphgate.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const APP_NAME: &str = "graphgate";
const CONFIG_DIR_ENV: &str = "GRAPHGATE_CONFIG_DIR";

/// One candidate file and whether it contributed to the result.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub loaded: bool,
}

/// A merged config plus the trail of how it was assembled.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: GatewayConfig,
    /// Every candidate, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Non-fatal problems to surface to the operator.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter_map(|s| s.loaded.then_some(s.path.as_path()))
            .collect()
    }

    /// Merge `path` on top if it exists. A broken file is skipped with a
    /// warning so one bad layer cannot keep the gateway from starting.
    fn stack(&mut self, path: PathBuf) {
        let loaded = path.is_file()
            && match load_config_file(&path) {
                Ok(layer) => {
                    self.config.merge(layer);
                    true
                }
                Err(e) => {
                    self.warnings
                        .push(format!("ignoring {}: {}", path.display(), e));
                    false
                }
            };
        self.sources.push(ConfigSource { path, loaded });
    }

    fn finish(mut self) -> Self {
        if let Some(llm) = &self.config.llm
            && llm.has_plaintext_api_key()
        {
            self.warnings.push(format!(
                "[llm] api_key is stored in plaintext; set {} instead",
                llm.api_key_env
            ));
        }
        self
    }
}

/// Discover and merge the user and project layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Like [`load_config`], with `config_dir` standing in for the user config
/// directory (tests use this to stay out of the real home directory).
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig::default();

    let user_file = config_dir
        .map(|dir| dir.join(USER_CONFIG_FILE))
        .or_else(xdg_config_path);
    if let Some(path) = user_file {
        loaded.stack(path);
    }

    let project_file = match project_dir {
        Some(dir) => dir.join(PROJECT_CONFIG_FILE),
        None => PathBuf::from(PROJECT_CONFIG_FILE),
    };
    loaded.stack(project_file);

    Ok(loaded.finish())
}

/// Load exactly one file named by the operator. Missing or invalid is fatal.
pub fn load_explicit(path: &Path) -> Result<LoadedConfig> {
    let loaded = LoadedConfig {
        config: load_config_file(path)?,
        sources: vec![ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        }],
        warnings: Vec::new(),
    };
    Ok(loaded.finish())
}

pub fn load_config_file(path: &Path) -> Result<GatewayConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    GatewayConfig::from_toml(&text)
}

pub fn xdg_config_path() -> Option<PathBuf> {
    Some(xdg_config_dir()?.join(USER_CONFIG_FILE))
}

/// Directory holding the user config file and the log directory.
pub fn xdg_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join(APP_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_layer_wins_over_user_layer() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::write(
            user.path().join("config.toml"),
            "[server]\nport = 9000\n[mcp]\nurl = \"http://user/mcp\"",
        )
        .unwrap();
        std::fs::write(project.path().join("graphgate.toml"), "[server]\nport = 9500").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();

        assert_eq!(loaded.config.server().port, 9500);
        assert_eq!(loaded.config.mcp().url, "http://user/mcp");
        assert_eq!(loaded.loaded_from().len(), 2);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_no_files_means_defaults() {
        let empty = TempDir::new().unwrap();
        let loaded = load_config_with_options(Some(empty.path()), Some(empty.path())).unwrap();
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
        assert_eq!(loaded.config.server().port, crate::DEFAULT_PORT);
    }

    #[test]
    fn test_broken_layer_is_skipped_with_warning() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("graphgate.toml"), "[server\nport = 1").unwrap();
        let loaded = load_config_with_options(Some(dir.path()), Some(dir.path())).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].starts_with("ignoring"));
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_plaintext_key_warns() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("graphgate.toml"), "[llm]\napi_key = \"sk-x\"").unwrap();
        let loaded = load_config_with_options(Some(dir.path()), Some(dir.path())).unwrap();
        assert!(loaded.warnings.iter().any(|w| w.contains("plaintext")));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = load_explicit(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
