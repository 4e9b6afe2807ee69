use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;
use crate::error::{Result, FfpipeError};

/// Binary name used when nothing else is configured
pub const FALLBACK_BINARY: &str = "ffmpeg";

static DEFAULT_BINARY_PATH: RwLock<Option<String>> = RwLock::new(None);

/// Set the process-wide default path to the media tool.
///
/// Intended for one-time configuration at startup. Invocations already in
/// flight keep the path they resolved when they started.
pub fn set_default_binary_path<S: Into<String>>(path: S) {
    let mut guard = DEFAULT_BINARY_PATH
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(path.into());
}

/// Current process-wide default path to the media tool
pub fn default_binary_path() -> String {
    DEFAULT_BINARY_PATH
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
        .unwrap_or_else(|| FALLBACK_BINARY.to_string())
}

fn default_concurrency() -> usize {
    2
}

fn default_extensions() -> Vec<String> {
    ["mp4", "mov", "mkv", "avi", "webm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_output_extension() -> String {
    "mp4".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub invoker: InvokerConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Path to ffmpeg binary; falls back to the process-wide default when unset
    #[serde(default)]
    pub binary_path: Option<String>,
    /// Surface the tool's stderr through the logger
    #[serde(default)]
    pub verbose: bool,
}

impl InvokerConfig {
    /// Resolve the binary path, preferring a per-call override
    pub fn resolve_binary_path(&self, override_path: Option<&str>) -> String {
        override_path
            .map(str::to_string)
            .or_else(|| self.binary_path.clone())
            .unwrap_or_else(default_binary_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of ffmpeg processes running at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Input file extensions picked up when walking a directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Extension given to each output file
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            extensions: default_extensions(),
            output_extension: default_output_extension(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FfpipeError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| FfpipeError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FfpipeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| FfpipeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_over_config() {
        let config = InvokerConfig {
            binary_path: Some("/opt/ffmpeg/bin/ffmpeg".to_string()),
            verbose: false,
        };
        assert_eq!(config.resolve_binary_path(Some("/usr/bin/ffmpeg")), "/usr/bin/ffmpeg");
        assert_eq!(config.resolve_binary_path(None), "/opt/ffmpeg/bin/ffmpeg");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[invoker]\nverbose = true\n").unwrap();
        assert!(config.invoker.verbose);
        assert!(config.invoker.binary_path.is_none());
        assert_eq!(config.batch.concurrency, 2);
        assert_eq!(config.batch.output_extension, "mp4");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffpipe.toml");

        let mut config = Config::default();
        config.invoker.binary_path = Some("/usr/local/bin/ffmpeg".to_string());
        config.batch.concurrency = 4;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.invoker.binary_path.as_deref(), Some("/usr/local/bin/ffmpeg"));
        assert_eq!(loaded.batch.concurrency, 4);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/nonexistent/ffpipe.toml").unwrap_err();
        assert!(matches!(err, FfpipeError::Config(_)));
    }
}
