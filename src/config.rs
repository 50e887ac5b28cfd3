//! Configuration module
//!
//! Settings are read once at startup from a TOML file
//! (`~/.config/parkcharge/config.toml` by default), overlaid with the
//! `APPWRITE_*` environment variables, and then passed to components as
//! plain structs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::support::errors::ConfigError;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "PARKCHARGE_CONFIG";

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parkcharge")
        .join("config.toml")
}

/// Pick the config path: explicit argument, then env, then default
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub appwrite: AppwriteConfig,
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the Appwrite database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project: String,
    pub api_key: String,
    pub database_id: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub collections: CollectionIds,
}

impl Default for AppwriteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            project: String::new(),
            api_key: String::new(),
            database_id: "parkcharge_db".to_string(),
            timeout_secs: 30,
            collections: CollectionIds::default(),
        }
    }
}

impl AppwriteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Collection identifiers inside the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionIds {
    pub stations: String,
    pub slots: String,
    pub bookings: String,
    pub users: String,
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            stations: "stations".to_string(),
            slots: "slots".to_string(),
            bookings: "bookings".to_string(),
            users: "users".to_string(),
        }
    }
}

/// Driver pacing and randomness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of one sleep "time unit" in milliseconds
    pub time_unit_ms: u64,
    /// Fixed seed for a reproducible run
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: 1000,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Overlay process environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values produced by `lookup` for the `APPWRITE_*` keys
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let aw = &mut self.appwrite;
        let targets: [(&str, &mut String); 8] = [
            ("APPWRITE_ENDPOINT", &mut aw.endpoint),
            ("APPWRITE_PROJECT_ID", &mut aw.project),
            ("APPWRITE_API_KEY", &mut aw.api_key),
            ("APPWRITE_DATABASE_ID", &mut aw.database_id),
            ("APPWRITE_STATIONS_COLLECTION_ID", &mut aw.collections.stations),
            ("APPWRITE_SLOTS_COLLECTION_ID", &mut aw.collections.slots),
            ("APPWRITE_BOOKINGS_COLLECTION_ID", &mut aw.collections.bookings),
            ("APPWRITE_USERS_COLLECTION_ID", &mut aw.collections.users),
        ];
        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        }
    }

    /// Settings the Appwrite backend cannot run without
    pub fn validate_remote(&self) -> Result<(), ConfigError> {
        let aw = &self.appwrite;
        if aw.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("appwrite.endpoint (APPWRITE_ENDPOINT)"));
        }
        if !(aw.endpoint.starts_with("http://") || aw.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "appwrite.endpoint",
                reason: format!("'{}' is not an http(s) URL", aw.endpoint),
            });
        }
        if aw.project.trim().is_empty() {
            return Err(ConfigError::Missing("appwrite.project (APPWRITE_PROJECT_ID)"));
        }
        if aw.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("appwrite.api_key (APPWRITE_API_KEY)"));
        }
        if aw.database_id.trim().is_empty() {
            return Err(ConfigError::Missing("appwrite.database_id (APPWRITE_DATABASE_ID)"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [appwrite]
            project = "demo"
            api_key = "secret"

            [appwrite.collections]
            slots = "slots_v2"

            [simulation]
            time_unit_ms = 10
            seed = 7

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.appwrite.project, "demo");
        assert_eq!(cfg.appwrite.database_id, "parkcharge_db");
        assert_eq!(cfg.appwrite.collections.slots, "slots_v2");
        assert_eq!(cfg.appwrite.collections.stations, "stations");
        assert_eq!(cfg.simulation.time_unit(), Duration::from_millis(10));
        assert_eq!(cfg.simulation.seed, Some(7));
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn env_overrides_replace_non_empty_values() {
        let env: HashMap<&str, &str> = [
            ("APPWRITE_PROJECT_ID", "from-env"),
            ("APPWRITE_API_KEY", ""),
            ("APPWRITE_USERS_COLLECTION_ID", "people"),
        ]
        .into_iter()
        .collect();

        let mut cfg = AppConfig::default();
        cfg.appwrite.api_key = "file-key".into();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.appwrite.project, "from-env");
        assert_eq!(cfg.appwrite.api_key, "file-key");
        assert_eq!(cfg.appwrite.collections.users, "people");
    }

    #[test]
    fn validate_remote_reports_missing_credentials() {
        let mut cfg = AppConfig::default();
        assert!(matches!(cfg.validate_remote(), Err(ConfigError::Missing(_))));

        cfg.appwrite.project = "p".into();
        cfg.appwrite.api_key = "k".into();
        assert!(cfg.validate_remote().is_ok());

        cfg.appwrite.endpoint = "ftp://example".into();
        assert!(matches!(cfg.validate_remote(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn load_reads_file_and_reports_parse_errors() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "[appwrite]\ndatabase_id = \"other\"").unwrap();
        let cfg = AppConfig::load(good.path()).unwrap();
        assert_eq!(cfg.appwrite.database_id, "other");

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[appwrite\nendpoint = ").unwrap();
        assert!(matches!(
            AppConfig::load(bad.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
