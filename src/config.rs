use crate::analytics::DEFAULT_REFRESH_INTERVAL;
use crate::error::AppError;
use crate::window::Period;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub device: Option<DeviceSection>,
    #[serde(default)]
    pub feed: Option<FeedSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceSection {
    /// Device whose detections are aggregated at startup
    pub paired_device_id: Option<String>,
    /// One of day, week, month, year (default: week)
    pub default_period: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSection {
    /// JSON array of detection documents loaded into the store at startup
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
    /// Seconds between window refreshes of the analytics view (default: 60)
    pub refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] AppError),
    #[error("invalid config: [server] refresh_interval_secs must be at least 1")]
    ZeroRefreshInterval,
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.default_period()?;
    if config.refresh_interval().is_zero() {
        return Err(ConfigError::ZeroRefreshInterval);
    }
    Ok(config)
}

impl Config {
    /// Parsed `[logging] level`, `None` when it is not a tracing level name.
    pub fn log_level(&self) -> Option<tracing::Level> {
        tracing::Level::from_str(self.logging.level.trim()).ok()
    }

    /// Paired device id, or `None` when unset or blank.
    pub fn paired_device_id(&self) -> Option<&str> {
        let id = self.device.as_ref()?.paired_device_id.as_deref()?.trim();
        if id.is_empty() { None } else { Some(id) }
    }

    pub fn default_period(&self) -> Result<Period, AppError> {
        match self
            .device
            .as_ref()
            .and_then(|d| d.default_period.as_deref())
        {
            Some(value) => value.parse(),
            None => Ok(crate::state::DEFAULT_PERIOD),
        }
    }

    pub fn seed_path(&self) -> Option<&Path> {
        let path = self.feed.as_ref()?.seed_path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn refresh_interval(&self) -> Duration {
        self.server
            .as_ref()
            .and_then(|s| s.refresh_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_temp(name: &str, contents: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = std::env::temp_dir().join(format!("organic-eye-{name}-{unique}.toml"));
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn default_config_pairs_a_device_and_seed() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_default()?;
        assert!(config.paired_device_id().is_some());
        assert!(config.seed_path().is_some());
        assert_eq!(config.default_period()?, Period::Week);
        Ok(())
    }

    #[test]
    fn minimal_config_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp(
            "minimal",
            r#"
[app]
name = "organic-eye"

[logging]
level = "info"
"#,
        )?;

        let config = load_from_path(&path)?;
        let _ = fs::remove_file(&path);

        assert_eq!(config.paired_device_id(), None);
        assert_eq!(config.seed_path(), None);
        assert_eq!(config.default_period()?, Period::Week);
        assert_eq!(config.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(config.refresh_interval(), DEFAULT_REFRESH_INTERVAL);
        Ok(())
    }

    #[test]
    fn blank_device_id_is_treated_as_unpaired() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp(
            "blank-device",
            r#"
[app]
name = "organic-eye"

[logging]
level = "info"

[device]
paired_device_id = "  "
default_period = "month"

[server]
port = 9090
refresh_interval_secs = 15
"#,
        )?;

        let config = load_from_path(&path)?;
        let _ = fs::remove_file(&path);

        assert_eq!(config.paired_device_id(), None);
        assert_eq!(config.default_period()?, Period::Month);
        assert_eq!(config.server_port(), 9090);
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
        Ok(())
    }

    #[test]
    fn unknown_default_period_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp(
            "bad-period",
            r#"
[app]
name = "organic-eye"

[logging]
level = "info"

[device]
default_period = "quarter"
"#,
        )?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(
            result,
            Err(ConfigError::Invalid(AppError::InvalidPeriod(_)))
        ));
        Ok(())
    }

    #[test]
    fn missing_config_file_returns_read_error() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("organic-eye-missing-{unique}.toml"));

        let result = load_from_path(&path);

        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn invalid_toml_returns_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp("invalid", "not = [valid")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        Ok(())
    }

    #[test]
    fn zero_refresh_interval_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp(
            "zero-refresh",
            r#"
[app]
name = "organic-eye"

[logging]
level = "info"

[server]
refresh_interval_secs = 0
"#,
        )?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::ZeroRefreshInterval)));
        Ok(())
    }

    #[test]
    fn log_level_parses_known_names_only() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp(
            "log-level",
            r#"
[app]
name = "organic-eye"

[logging]
level = "Debug"
"#,
        )?;
        let mut config = load_from_path(&path)?;
        let _ = fs::remove_file(&path);

        assert_eq!(config.log_level(), Some(tracing::Level::DEBUG));

        config.logging.level = "verbose".to_string();
        assert_eq!(config.log_level(), None);
        Ok(())
    }
}
