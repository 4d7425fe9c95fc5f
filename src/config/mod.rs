//! Configuration management using the prefer crate for file discovery.

mod loader;
mod service;
mod settings;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::{InputFormat, OutputFormat, ParserLanguage, ParserLevel, ParserTool};

pub use loader::{load_settings_with_options, LoadOptions};
pub use service::ServiceConfig;
pub use settings::{Settings, DEFAULT_HOST, DEFAULT_PORT};

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Worker pool size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Dictionary files or directories, relative to the config file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dictionaries: Vec<String>,
    /// Formats every job writes (e.g. `["json", "xml", "a1"]`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_formats: Vec<String>,
    /// Default input format for requests that don't set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<InputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser_tool: Option<ParserTool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser_language: Option<ParserLanguage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser_level: Option<ParserLevel>,
    /// Path to a false positives list (one term per line).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_positives: Option<String>,
    /// Semantic group renames applied when exporting.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub groups_normalization: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviations: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers annobatch config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("annobatch").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(workers) = self.workers {
            if workers == 0 {
                tracing::warn!("Ignoring workers = 0 in config");
            } else {
                settings.workers = workers;
            }
        }
        if !self.dictionaries.is_empty() {
            settings.dictionary_paths = self
                .dictionaries
                .iter()
                .map(|d| self.resolve_path(d, base_dir))
                .collect();
        }
        if !self.output_formats.is_empty() {
            let mut formats = Vec::new();
            for name in &self.output_formats {
                match name.parse::<OutputFormat>() {
                    Ok(format) => formats.push(format),
                    Err(e) => tracing::error!("Invalid output format in config: {}", e),
                }
            }
            if !formats.is_empty() {
                settings.output_formats = formats;
            }
        }
        if let Some(input_format) = self.input_format {
            settings.input_format = input_format;
        }
        if let Some(tool) = self.parser_tool {
            settings.parser_tool = tool;
        }
        if let Some(language) = self.parser_language {
            settings.parser_language = language;
        }
        if let Some(level) = self.parser_level {
            settings.parser_level = level;
        }
        if let Some(ref fp) = self.false_positives {
            let path = self.resolve_path(fp, base_dir);
            match std::fs::read_to_string(&path) {
                Ok(contents) => settings.service.false_positives = Some(contents),
                Err(e) => tracing::error!(
                    "Failed to read false positives {}: {}",
                    path.display(),
                    e
                ),
            }
        }
        if !self.groups_normalization.is_empty() {
            settings.service.groups_normalization = self.groups_normalization.clone();
        }
        if let Some(abbreviations) = self.abbreviations {
            settings.service.abbreviations = abbreviations;
        }
        if let Some(disambiguation) = self.disambiguation {
            settings.service.disambiguation = disambiguation;
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
    }
}
