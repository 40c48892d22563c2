//! Service Configuration

use serde::{Deserialize, Serialize};
use session::SessionConfig;
use std::path::PathBuf;

/// Default configuration file (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "drone-telemetry";

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "DRONE_CONFIG";

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Max log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Recent session events kept for `/api/v1/session/events`
    pub event_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            log_level: "info".to_string(),
            event_buffer: 256,
        }
    }
}

/// Where accepted and rejected samples go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Csv,
    Memory,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Accepted-sample session file
    pub session_path: PathBuf,
    /// Reject log
    pub rejects_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Csv,
            session_path: PathBuf::from("drone_measurements_session.csv"),
            rejects_path: PathBuf::from("drone_rejects.csv"),
        }
    }
}

/// Complete service configuration, read once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

impl ServiceConfig {
    /// Load from the default file (or `$DRONE_CONFIG`) and `DRONE_*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load from an optional file, then environment overrides
    ///
    /// Nested keys use `__`, e.g. `DRONE_SESSION__ANOMALY__WIND_THRESHOLD=12`.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("DRONE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session::Strictness;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let config = ServiceConfig::load_from(path.to_str().unwrap()).unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Csv);
        assert_eq!(config.session.anomaly.acceleration_threshold, 2.0);
        assert_eq!(config.session.bounds.accel_z_range, (-12.0, 15.0));
    }

    #[test]
    fn test_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind_addr = "127.0.0.1:6000"

[storage]
backend = "memory"

[session]
strictness = "nack"

[session.anomaly]
wind_threshold = 7.5

[session.band]
percentage = 0.1
absolute_threshold = 2.0
rule = "either"

[session.bounds]
wind_angle_range = [0.0, 360.0]
"#,
        )
        .unwrap();

        let config = ServiceConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:6000");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.session.strictness, Strictness::Nack);
        assert_eq!(config.session.anomaly.wind_threshold, 7.5);
        assert_eq!(config.session.anomaly.threshold_percentage, 20.0);
        assert_eq!(config.session.band.absolute_threshold, 2.0);
        assert_eq!(config.session.bounds.wind_angle_range, (0.0, 360.0));
        assert_eq!(config.session.bounds.accel_x_range, (-1.0, 1.0));
        assert_eq!(config.server.event_buffer, 256);
    }

    #[test]
    fn test_partial_meta_bounds_keep_meta_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.toml");
        std::fs::write(
            &path,
            r#"
[session.meta_bounds]
accel_z_range = [-5.0, 5.0]
"#,
        )
        .unwrap();

        let config = ServiceConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.session.meta_bounds.accel_z_range, (-5.0, 5.0));
        assert_eq!(config.session.meta_bounds.wind_angle_range, (0.0, 360.0));
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        // keys not asserted by any other test in this module
        std::env::set_var("DRONE_SESSION__BAND__PERCENTAGE", "0.35");
        std::env::set_var("DRONE_STORAGE__REJECTS_PATH", "env_rejects.csv");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let loaded = ServiceConfig::load_from(path.to_str().unwrap());

        std::env::remove_var("DRONE_SESSION__BAND__PERCENTAGE");
        std::env::remove_var("DRONE_STORAGE__REJECTS_PATH");

        let config = loaded.unwrap();
        assert_eq!(config.session.band.percentage, 0.35);
        assert_eq!(config.storage.rejects_path, PathBuf::from("env_rejects.csv"));
    }
}
