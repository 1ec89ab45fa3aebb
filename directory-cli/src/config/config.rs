use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "DIRECTORY_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub behavior: BehaviorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root URL of the directory backend
    pub base_url: String,

    /// Give up on a request after this many seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use Unicode glyphs for rating stars and badges
    pub use_glyphs: bool,

    /// Number result rows across pages
    pub show_row_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Keep shell history between sessions
    pub enable_history: bool,

    /// Maximum history entries
    pub max_history_entries: usize,

    /// Fetch categories and locations when the shell starts
    pub load_filters_on_start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset ("error", "warn", "info", "debug", "trace")
    pub level: String,

    /// Also write logs to a file under the data directory
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            display: DisplayConfig::default(),
            behavior: BehaviorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            use_glyphs: true,
            show_row_numbers: true,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enable_history: true,
            max_history_entries: 1000,
            load_filters_on_start: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: true,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Config {
    /// Load config from `path`, writing the defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("directory-cli").join("config.toml"))
    }

    /// Backend URL: command line flag, then environment, then config file
    pub fn resolve_api_url(&self, flag: Option<&str>, env: Option<String>) -> String {
        flag.map(str::to_string)
            .or_else(|| env.filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| self.api.base_url.clone())
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Directory CLI Configuration File
# Location: ~/.config/directory-cli/config.toml (Linux)
#           ~/Library/Application Support/directory-cli/config.toml (macOS)
#           %APPDATA%\directory-cli\config.toml (Windows)

[api]
# Directory backend (overridden by DIRECTORY_API_URL or --api-url)
base_url = "http://localhost:5000"

# Seconds before a request is abandoned
timeout_secs = 30

[display]
# Use Unicode stars and badges; set to false for ASCII-only terminals
use_glyphs = true

# Number result rows across pages
show_row_numbers = true

[behavior]
# Keep shell history between sessions
enable_history = true

# Maximum number of history entries to keep
max_history_entries = 1000

# Fetch categories and locations when the shell starts (used for Tab completion)
load_filters_on_start = true

[logging]
# Default log level when RUST_LOG is not set
level = "info"

# Write logs to ~/.local/share/directory-cli/logs as well
log_to_file = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nbase_url = \"http://directory.test\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "http://directory.test");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.display.use_glyphs);
    }

    #[test]
    fn commented_template_parses_to_defaults() {
        let config: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let config = Config::default();
        assert_eq!(
            config.resolve_api_url(Some("http://flag"), Some("http://env".into())),
            "http://flag"
        );
        assert_eq!(
            config.resolve_api_url(None, Some("http://env".into())),
            "http://env"
        );
        assert_eq!(
            config.resolve_api_url(None, Some(" ".into())),
            "http://localhost:5000"
        );
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }
}
