//! Settings file loading and writing

use std::path::{Path, PathBuf};

use fetchflow_core::prelude::*;

use super::types::Settings;

/// Per-project configuration directory
pub const FETCHFLOW_DIR: &str = ".fetchflow";

/// Settings file inside [`FETCHFLOW_DIR`]
pub const CONFIG_FILENAME: &str = "config.toml";

/// Path of the settings file for `project_path`
pub fn config_path(project_path: &Path) -> PathBuf {
    project_path.join(FETCHFLOW_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `.fetchflow/config.toml`.
///
/// A missing file means defaults. An unreadable, unparsable or invalid file
/// also falls back to defaults, with a warning.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = config_path(project_path);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            return Settings::default();
        }
    };

    let settings: Settings = match toml::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to parse {:?}: {}", config_path, e);
            return Settings::default();
        }
    };

    if let Err(e) = settings.validate() {
        warn!("Ignoring {:?}: {}", config_path, e);
        return Settings::default();
    }

    debug!("Loaded settings from {:?}", config_path);
    settings
}

/// Create `.fetchflow/config.toml` with commented defaults if missing
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let dir = project_path.join(FETCHFLOW_DIR);

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        info!("Created {} directory", FETCHFLOW_DIR);
    }

    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, generate_default_config())
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        info!("Created default {}", CONFIG_FILENAME);
    }

    Ok(())
}

/// Write `settings` to `.fetchflow/config.toml` (temp file, then rename)
pub fn save_settings(project_path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;

    let dir = project_path.join(FETCHFLOW_DIR);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("# fetchflow configuration\n\n{}", content);

    let config_path = dir.join(CONFIG_FILENAME);
    let temp_path = dir.join(".config.toml.tmp");

    std::fs::write(&temp_path, &full_content).context("Failed to write temp settings file")?;
    std::fs::rename(&temp_path, &config_path).context("Failed to replace settings file")?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}

fn generate_default_config() -> &'static str {
    r#"# fetchflow configuration

[retry]
# Total executions of the retried load, including the first
max_attempts = 3
# Wait before the second attempt; multiplied by backoff_factor afterwards
initial_delay_ms = 1000
backoff_factor = 2.0

[timeout]
limit_ms = 3000
message = "Timeout fetching users"

[search]
# Quiet period before a typed query runs
debounce_ms = 300

[simulation]
stable_latency_ms = 1500
stable_failure_rate = 0.25
unstable_latency_ms = 1000
unstable_failure_rate = 0.70
slow_latency_ms = 15000
products_latency_ms = 1200
# Every n-th products call fails (0 = never)
products_fail_every = 5
search_latency_ms = 500
# seed = 42
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        assert_eq!(load_settings(dir.path()), Settings::default());
    }

    #[test]
    fn test_init_writes_parsable_defaults() {
        let dir = tempdir().unwrap();

        init_config_dir(dir.path()).unwrap();

        assert!(config_path(dir.path()).exists());
        assert_eq!(load_settings(dir.path()), Settings::default());
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(FETCHFLOW_DIR)).unwrap();
        std::fs::write(config_path(dir.path()), "[retry]\nmax_attempts = 7\n").unwrap();

        init_config_dir(dir.path()).unwrap();

        assert_eq!(load_settings(dir.path()).retry.max_attempts, 7);
    }

    #[test]
    fn test_invalid_toml_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(FETCHFLOW_DIR)).unwrap();
        std::fs::write(config_path(dir.path()), "this is not [valid toml").unwrap();

        assert_eq!(load_settings(dir.path()), Settings::default());
    }

    #[test]
    fn test_out_of_range_values_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(FETCHFLOW_DIR)).unwrap();
        std::fs::write(config_path(dir.path()), "[retry]\nbackoff_factor = 0.1\n").unwrap();

        assert_eq!(load_settings(dir.path()), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.timeout.limit_ms = 1500;
        settings.simulation.seed = Some(9);

        save_settings(dir.path(), &settings).unwrap();

        assert_eq!(load_settings(dir.path()), settings);
        assert!(!dir.path().join(FETCHFLOW_DIR).join(".config.toml.tmp").exists());
    }

    #[test]
    fn test_save_rejects_invalid_settings() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.retry.max_attempts = 0;

        assert!(save_settings(dir.path(), &settings).is_err());
        assert!(!config_path(dir.path()).exists());
    }

    #[test]
    fn test_init_under_a_file_reports_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let err = init_config_dir(&blocker).unwrap_err();

        assert!(matches!(err, Error::Io(_)), "unexpected error: {:?}", err);
    }
}
