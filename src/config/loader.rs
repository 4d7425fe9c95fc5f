//! Configuration loading and environment overrides.

use std::path::PathBuf;

use super::{Config, Settings};

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions) -> anyhow::Result<Config> {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path).await;
    }

    // Priority 2: Auto-discover via prefer
    Ok(Config::load().await)
}

/// Load settings with explicit options.
///
/// An explicit config path that cannot be loaded is an error; a missing
/// auto-discovered config falls back to defaults.
pub async fn load_settings_with_options(options: LoadOptions) -> anyhow::Result<Settings> {
    let config = load_file_config(&options).await?;
    let mut settings = Settings::default();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd
    } else {
        config.base_dir().unwrap_or(cwd)
    };

    config.apply_to_settings(&mut settings, &base_dir);
    apply_env_overrides(&mut settings);

    Ok(settings)
}

/// ANNOBATCH_WORKERS and ANNOBATCH_DICTIONARIES take precedence over files.
fn apply_env_overrides(settings: &mut Settings) {
    if let Some(workers) = std::env::var("ANNOBATCH_WORKERS")
        .ok()
        .filter(|s| !s.is_empty())
    {
        match workers.parse::<usize>() {
            Ok(n) if n > 0 => {
                tracing::debug!("Using ANNOBATCH_WORKERS from environment: {}", n);
                settings.workers = n;
            }
            _ => tracing::warn!("Ignoring invalid ANNOBATCH_WORKERS: {}", workers),
        }
    }

    if let Some(dicts) = std::env::var("ANNOBATCH_DICTIONARIES")
        .ok()
        .filter(|s| !s.is_empty())
    {
        tracing::debug!("Using ANNOBATCH_DICTIONARIES from environment: {}", dicts);
        settings.dictionary_paths = dicts
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| PathBuf::from(shellexpand::tilde(s).as_ref()))
            .collect();
    }
}
