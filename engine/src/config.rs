use serde::Deserialize;
use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use toml::de;
use url::Url;

use cmdpad_client::DEFAULT_ENDPOINT;

/// Environment override for `[service] endpoint`.
pub const ENDPOINT_ENV: &str = "CMDPAD_ENDPOINT";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NOTIFICATION_SECS: u64 = 5;

/// On-disk configuration (`~/.cmdpad/config.toml`). Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConsoleConfig {
    pub service: Option<ServiceConfig>,
    pub ui: Option<UiConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceConfig {
    /// Full URL of the analyze endpoint.
    pub endpoint: Option<String>,
    /// Whole-request timeout. Default: 30.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UiConfig {
    /// How long a notification stays visible. Default: 5.
    pub notification_secs: Option<u64>,
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: de::Error,
    },
    #[error("invalid service endpoint {value:?}: {source}")]
    InvalidEndpoint {
        value: String,
        source: url::ParseError,
    },
    #[error("service endpoint must be http or https, got {0:?}")]
    UnsupportedScheme(String),
}

/// Display preferences passed through to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    pub ascii_only: bool,
    pub high_contrast: bool,
}

/// Fully resolved settings with defaults applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Url,
    pub timeout: Duration,
    pub notification_delay: Duration,
    pub ui: UiOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            notification_delay: Duration::from_secs(DEFAULT_NOTIFICATION_SECS),
            ui: UiOptions::default(),
        }
    }
}

fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL")
}

impl ConsoleConfig {
    /// Load from the default location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Apply defaults and the endpoint environment override.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        self.resolve_with_env(env::var(ENDPOINT_ENV).ok())
    }

    fn resolve_with_env(&self, env_endpoint: Option<String>) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();
        let service = self.service.as_ref();
        let ui = self.ui.as_ref();

        let endpoint = match env_endpoint
            .filter(|value| !value.trim().is_empty())
            .or_else(|| service.and_then(|s| s.endpoint.clone()))
        {
            Some(raw) => parse_endpoint(&raw)?,
            None => defaults.endpoint,
        };

        let timeout = service
            .and_then(|s| s.timeout_secs)
            .filter(|secs| *secs > 0)
            .map_or(defaults.timeout, Duration::from_secs);

        let notification_delay = ui
            .and_then(|u| u.notification_secs)
            .filter(|secs| *secs > 0)
            .map_or(defaults.notification_delay, Duration::from_secs);

        Ok(Settings {
            endpoint,
            timeout,
            notification_delay,
            ui: UiOptions {
                ascii_only: ui.is_some_and(|u| u.ascii_only),
                high_contrast: ui.is_some_and(|u| u.high_contrast),
            },
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidEndpoint {
        value: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cmdpad").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> ConsoleConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn empty_config_resolves_to_defaults() {
        let settings = ConsoleConfig::default().resolve_with_env(None).unwrap();
        assert_eq!(settings.endpoint.as_str(), "http://localhost:3000/analyze");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.notification_delay, Duration::from_secs(5));
        assert_eq!(settings.ui, UiOptions::default());
    }

    #[test]
    fn reads_all_sections() {
        let config = parse(
            r#"
            [service]
            endpoint = "http://10.0.0.2:8080/analyze"
            timeout_secs = 12

            [ui]
            notification_secs = 3
            ascii_only = true
            "#,
        );
        let settings = config.resolve_with_env(None).unwrap();
        assert_eq!(settings.endpoint.as_str(), "http://10.0.0.2:8080/analyze");
        assert_eq!(settings.timeout, Duration::from_secs(12));
        assert_eq!(settings.notification_delay, Duration::from_secs(3));
        assert!(settings.ui.ascii_only);
        assert!(!settings.ui.high_contrast);
    }

    #[test]
    fn env_endpoint_wins_over_file() {
        let config = parse("[service]\nendpoint = \"http://file/analyze\"\n");
        let settings = config
            .resolve_with_env(Some("http://env:9000/analyze".to_string()))
            .unwrap();
        assert_eq!(settings.endpoint.as_str(), "http://env:9000/analyze");
    }

    #[test]
    fn blank_env_endpoint_is_ignored() {
        let settings = ConsoleConfig::default()
            .resolve_with_env(Some("   ".to_string()))
            .unwrap();
        assert_eq!(settings.endpoint.as_str(), "http://localhost:3000/analyze");
    }

    #[test]
    fn zero_durations_fall_back_to_defaults() {
        let config = parse("[service]\ntimeout_secs = 0\n[ui]\nnotification_secs = 0\n");
        let settings = config.resolve_with_env(None).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.notification_delay, Duration::from_secs(5));
    }

    #[test]
    fn invalid_endpoint_is_reported() {
        let config = parse("[service]\nendpoint = \"not a url\"\n");
        let err = config.resolve_with_env(None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let config = parse("[service]\nendpoint = \"ftp://host/analyze\"\n");
        let err = config.resolve_with_env(None).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(ref s) if s == "ftp"));
    }

    #[test]
    fn load_from_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ConsoleConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[service\nendpoint = 1").unwrap();

        let err = ConsoleConfig::load_from(&path).unwrap_err();
        match err {
            ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ui]\nhigh_contrast = true\n").unwrap();

        let config = ConsoleConfig::load_from(&path).unwrap().unwrap();
        assert!(config.ui.unwrap().high_contrast);
    }
}
