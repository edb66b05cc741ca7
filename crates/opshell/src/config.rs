use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::ServiceEndpoint;
use crate::error::{ShellError, ShellResult};

pub const SHELL_CONFIG_FILENAME: &str = "opshell.json";
pub const SHELL_CONFIG_VERSION: &str = "1.0.0";

/// Persisted shell configuration backing the context's config accessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    pub version: String,
    /// Namespace selected when a REPL session starts.
    pub default_namespace: Option<String>,
    pub output: OutputPreferences,
    pub history: HistoryPreferences,
    /// When set, dispatch short-circuits before any handler runs.
    pub dry_run: bool,
    /// Service endpoints known ahead of discovery.
    pub services: Vec<ServiceEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPreferences {
    /// "text" or "json".
    pub format: String,
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPreferences {
    pub max_entries: usize,
}

impl ShellConfig {
    pub fn default_new() -> Self {
        Self {
            version: SHELL_CONFIG_VERSION.to_string(),
            default_namespace: None,
            output: OutputPreferences {
                format: "text".to_string(),
                color: true,
            },
            history: HistoryPreferences { max_entries: 500 },
            dry_run: false,
            services: Vec::new(),
        }
    }

    /// Default location under the user config dir, when one exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("opshell").join(SHELL_CONFIG_FILENAME))
    }

    /// Load a config from disk. A missing file yields the default config.
    pub fn load(path: &Path) -> ShellResult<Self> {
        if !path.exists() {
            return Ok(Self::default_new());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShellError::Internal(format!("failed to read config at {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| ShellError::Internal(format!("failed to parse config: {e}")))
    }

    pub fn save(&self, path: &Path) -> ShellResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ShellError::Internal(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ShellError::Internal(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content).map_err(|e| {
            ShellError::Internal(format!("failed to write config at {}: {e}", path.display()))
        })
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::default_new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShellConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.version, SHELL_CONFIG_VERSION);
        assert!(!config.dry_run);
        assert!(config.services.is_empty());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SHELL_CONFIG_FILENAME);

        let mut config = ShellConfig::default_new();
        config.default_namespace = Some("compute".to_string());
        config.dry_run = true;
        config.output.format = "json".to_string();
        config.services.push(ServiceEndpoint {
            name: "compute".to_string(),
            base_url: "https://compute.example.com".to_string(),
            description: Some("compute jobs".to_string()),
        });
        config.save(&path).unwrap();

        let loaded = ShellConfig::load(&path).unwrap();
        assert_eq!(loaded.default_namespace.as_deref(), Some("compute"));
        assert!(loaded.dry_run);
        assert_eq!(loaded.output.format, "json");
        assert_eq!(loaded.services.len(), 1);
        assert_eq!(loaded.services[0].name, "compute");
    }

    #[test]
    fn default_path_points_at_the_config_filename() {
        // Absent only on platforms without a config dir.
        if let Some(path) = ShellConfig::default_path() {
            assert!(path.ends_with(Path::new("opshell").join(SHELL_CONFIG_FILENAME)));
        }
    }

    #[test]
    fn malformed_file_is_an_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SHELL_CONFIG_FILENAME);
        std::fs::write(&path, "not json").unwrap();
        let err = ShellConfig::load(&path).unwrap_err();
        assert!(matches!(err, ShellError::Internal(_)));
    }
}
