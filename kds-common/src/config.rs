//! Configuration loading and data directory resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (applied by the binary, highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file degrades to defaults with a warning; missing remote
//! credentials are a hard error because the board cannot poll without them.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Connection settings for the remote order source
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the order source, e.g. `https://shop.example.org`
    pub base_url: String,
    /// API consumer key (HTTP Basic username)
    pub consumer_key: String,
    /// API consumer secret (HTTP Basic password)
    pub consumer_secret: String,
}

/// Full board service configuration
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub listen_port: u16,
    /// Directory holding the local SQLite database
    pub data_dir: PathBuf,
    /// Seconds between order polls
    pub poll_interval_s: u64,
    /// Seconds between repeated alert rings while orders are outstanding
    pub alert_repeat_s: u64,
    /// Password gating the dashboard session endpoints
    pub session_password: Option<String>,
    pub remote: RemoteConfig,
}

/// On-disk TOML shape; every field optional so partial files work
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    listen_port: Option<u16>,
    data_dir: Option<PathBuf>,
    poll_interval_s: Option<u64>,
    alert_repeat_s: Option<u64>,
    session_password: Option<String>,
    remote: Option<TomlRemote>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlRemote {
    base_url: Option<String>,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
}

pub const DEFAULT_LISTEN_PORT: u16 = 5760;
pub const DEFAULT_POLL_INTERVAL_S: u64 = 10;
pub const DEFAULT_ALERT_REPEAT_S: u64 = 15;

impl BoardConfig {
    /// Load configuration, optionally from an explicit TOML path
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let toml_config = match locate_config_file(explicit_path) {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(contents) => toml::from_str::<TomlConfig>(&contents)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?,
                Err(e) => {
                    warn!("Could not read config file {}: {}", path.display(), e);
                    TomlConfig::default()
                }
            },
            None => {
                warn!("No config file found, using environment and defaults");
                TomlConfig::default()
            }
        };

        let toml_remote = toml_config.remote.unwrap_or_default();

        let base_url = env_or("KDS_REMOTE_URL", toml_remote.base_url)
            .ok_or_else(|| Error::Config("remote base_url is not configured".to_string()))?;
        let consumer_key = env_or("KDS_CONSUMER_KEY", toml_remote.consumer_key)
            .ok_or_else(|| Error::Config("remote consumer_key is not configured".to_string()))?;
        let consumer_secret = env_or("KDS_CONSUMER_SECRET", toml_remote.consumer_secret)
            .ok_or_else(|| Error::Config("remote consumer_secret is not configured".to_string()))?;

        let listen_port = env_parsed("KDS_PORT")?
            .or(toml_config.listen_port)
            .unwrap_or(DEFAULT_LISTEN_PORT);
        let poll_interval_s = env_parsed("KDS_POLL_INTERVAL_S")?
            .or(toml_config.poll_interval_s)
            .unwrap_or(DEFAULT_POLL_INTERVAL_S);
        let alert_repeat_s = env_parsed("KDS_ALERT_REPEAT_S")?
            .or(toml_config.alert_repeat_s)
            .unwrap_or(DEFAULT_ALERT_REPEAT_S);

        if poll_interval_s == 0 {
            return Err(Error::Config("poll_interval_s must be at least 1".to_string()));
        }
        if alert_repeat_s == 0 {
            return Err(Error::Config("alert_repeat_s must be at least 1".to_string()));
        }

        let data_dir = std::env::var("KDS_DATA_DIR")
            .map(PathBuf::from)
            .ok()
            .or(toml_config.data_dir)
            .unwrap_or_else(default_data_dir);

        let session_password =
            env_or("KDS_SESSION_PASSWORD", toml_config.session_password);

        Ok(BoardConfig {
            listen_port,
            data_dir,
            poll_interval_s,
            alert_repeat_s,
            session_password,
            remote: RemoteConfig {
                base_url,
                consumer_key,
                consumer_secret,
            },
        })
    }

    /// Path of the local SQLite database inside the data directory
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("kds.db")
    }
}

fn env_or(var: &str, fallback: Option<String>) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty()).or(fallback)
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> Result<Option<T>> {
    match std::env::var(var) {
        Ok(raw) if !raw.is_empty() => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", var, raw))),
        _ => Ok(None),
    }
}

/// Locate the config file: explicit path, then $KDS_CONFIG, then the
/// platform config directory, then /etc/kds/config.toml on unix
fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("KDS_CONFIG") {
        return Some(PathBuf::from(path));
    }
    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("kds").join("config.toml");
        if candidate.exists() {
            return Some(candidate);
        }
    }
    let system = PathBuf::from("/etc/kds/config.toml");
    if system.exists() {
        return Some(system);
    }
    None
}

/// Platform-local data directory for the board database
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("kds"))
        .unwrap_or_else(|| PathBuf::from("./kds_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn full_toml_config_loads() {
        let (_dir, path) = write_config(
            r#"
            listen_port = 6000
            poll_interval_s = 5
            alert_repeat_s = 20
            session_password = "pass"

            [remote]
            base_url = "https://shop.example.org"
            consumer_key = "ck_test"
            consumer_secret = "cs_test"
            "#,
        );
        let config = BoardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.listen_port, 6000);
        assert_eq!(config.poll_interval_s, 5);
        assert_eq!(config.alert_repeat_s, 20);
        assert_eq!(config.session_password.as_deref(), Some("pass"));
        assert_eq!(config.remote.base_url, "https://shop.example.org");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let (_dir, path) = write_config(
            r#"
            [remote]
            base_url = "https://shop.example.org"
            consumer_key = "ck_test"
            consumer_secret = "cs_test"
            "#,
        );
        let config = BoardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.listen_port, DEFAULT_LISTEN_PORT);
        assert_eq!(config.poll_interval_s, DEFAULT_POLL_INTERVAL_S);
        assert_eq!(config.alert_repeat_s, DEFAULT_ALERT_REPEAT_S);
        assert!(config.session_password.is_none());
    }

    #[test]
    fn missing_remote_credentials_is_an_error() {
        let (_dir, path) = write_config("listen_port = 6000\n");
        let result = BoardConfig::load(Some(&path));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let (_dir, path) = write_config(
            r#"
            poll_interval_s = 0

            [remote]
            base_url = "https://shop.example.org"
            consumer_key = "ck_test"
            consumer_secret = "cs_test"
            "#,
        );
        assert!(matches!(BoardConfig::load(Some(&path)), Err(Error::Config(_))));
    }
}
