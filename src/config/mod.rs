//! Configuration management.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config`, `./media-explorer.toml` or
//!    `<config dir>/media-explorer/config.toml`)
//! 3. `MEDIA_EXPLORER_*` environment variables, nested keys separated by `__`
//!    (e.g. `MEDIA_EXPLORER_API__BASE_URL`)
//! 4. the `NEXT_PUBLIC_API_URL` / `MEDIA_EXPLORER_API_URL` shorthands for the
//!    API base URL
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_seconds = 30
//! page_size = 12
//!
//! [images]
//! placeholder_path = "public/placeholder-image.jpg"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Base URL used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variables that override the API base URL, checked in order
pub const API_URL_ENV_VARS: [&str; 2] = ["MEDIA_EXPLORER_API_URL", "NEXT_PUBLIC_API_URL"];

const ENV_PREFIX: &str = "MEDIA_EXPLORER";
const CONFIG_FILE_NAME: &str = "media-explorer.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Search API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Image loading settings
    #[serde(default)]
    pub images: ImageConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Search API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the archive search service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport timeout for a single request
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Items requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    crate::models::DEFAULT_PAGE_SIZE
}

/// Image loading configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Local image shown when a remote image cannot be loaded
    #[serde(default = "default_placeholder")]
    pub placeholder_path: PathBuf,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            placeholder_path: default_placeholder(),
        }
    }
}

fn default_placeholder() -> PathBuf {
    PathBuf::from(crate::image::DEFAULT_PLACEHOLDER_PATH)
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, anything else for plain text
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

impl Config {
    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from defaults, an optional file and the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with the base-URL shorthand variables looked up
/// through `lookup`
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<Config, config::ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?);

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("api.base_url", api_url_override(lookup))?
        .build()?;

    settings.try_deserialize()
}

/// First non-empty base-URL shorthand variable
pub fn api_url_override<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_URL_ENV_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Per-user configuration file location
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("media-explorer").join("config.toml"))
}

/// Find the first existing configuration file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    user_config_path().filter(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.page_size, 12);
        assert_eq!(
            config.images.placeholder_path,
            PathBuf::from("public/placeholder-image.jpg")
        );
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = load_config_with(None, no_env).unwrap();
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[api]
base_url = "https://archive.example.com"
page_size = 24

[images]
placeholder_path = "/srv/static/missing.jpg"

[logging]
level = "debug"
format = "json"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config_with(Some(&path), no_env).unwrap();

        assert_eq!(config.api.base_url, "https://archive.example.com");
        assert_eq!(config.api.page_size, 24);
        // untouched keys keep their defaults
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(
            config.images.placeholder_path,
            PathBuf::from("/srv/static/missing.jpg")
        );
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_api_url_shorthand_wins_over_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"https://file.example\"\n").unwrap();

        let config = load_config_with(Some(&path), |key| {
            (key == "NEXT_PUBLIC_API_URL").then(|| "https://env.example".to_string())
        })
        .unwrap();
        assert_eq!(config.api.base_url, "https://env.example");
    }

    #[test]
    fn test_api_url_override_skips_blank_values() {
        let found = api_url_override(|key| match key {
            "MEDIA_EXPLORER_API_URL" => Some("  ".to_string()),
            "NEXT_PUBLIC_API_URL" => Some("http://api:9000".to_string()),
            _ => None,
        });
        assert_eq!(found.as_deref(), Some("http://api:9000"));
        assert!(api_url_override(no_env).is_none());
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.api.base_url = "https://saved.example".to_string();
        config.api.page_size = 30;

        config.save(&path).unwrap();

        let loaded = load_config_with(Some(&path), no_env).unwrap();
        assert_eq!(loaded.api.base_url, "https://saved.example");
        assert_eq!(loaded.api.page_size, 30);
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/media-explorer.toml");
        assert!(load_config_with(Some(&path), no_env).is_err());
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(load_config_with(Some(&path), no_env).is_err());
    }
}
