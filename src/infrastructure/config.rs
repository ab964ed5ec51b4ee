//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate, later sources overriding
//! earlier ones:
//! 1. Built-in defaults (`defaults` module)
//! 2. `config/default.*` in the working directory
//! 3. `<user config dir>/catalog-crawler/config.*`
//! 4. The file named by `CATALOG_CRAWLER_CONFIG`
//! 5. Environment variables, e.g. `CATALOG_CRAWLER_CRAWL__MAX_OPS_BEFORE_RECYCLE=10`

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::parsing::SelectorConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target site
    pub site: SiteConfig,

    /// Headless browser launch and timing settings
    pub browser: BrowserSettings,

    /// Stage behaviour (caps, recycle budget, readiness gate)
    pub crawl: CrawlConfig,

    /// Where checkpoint artifacts are written
    pub checkpoint: CheckpointConfig,

    pub logging: LoggingConfig,

    /// CSS selectors for every extractor
    pub selectors: SelectorConfig,
}

/// Target site settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme + host used to resolve relative links and image paths
    pub base_origin: String,

    /// Landing page listing the top-level categories
    pub catalog_url: String,
}

/// Headless browser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,

    /// Explicit Chrome/Chromium executable; autodetected when unset
    pub executable: Option<PathBuf>,

    /// Extra command line arguments passed to the browser
    pub extra_args: Vec<String>,

    /// Disable the Chrome sandbox (needed in most containers)
    pub no_sandbox: bool,

    /// Upper bound for a navigation to reach network idle
    pub navigation_timeout_ms: u64,

    /// Network is idle once no new resource loads are seen for this long
    pub network_idle_window_ms: u64,

    /// Interval between readiness predicate evaluations
    pub poll_interval_ms: u64,
}

/// Crawl behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Subcategories taken per category, in document order. 0 (or a JSON
    /// `null`) takes all.
    pub max_subcategories_per_category: Option<usize>,

    /// Completed page operations before the browser is recycled. 0 disables recycling.
    pub max_ops_before_recycle: usize,

    /// Upper bound for the product image readiness gate
    pub readiness_timeout_ms: u64,

    /// Scroll detail pages to the bottom before the readiness gate
    pub auto_scroll: bool,

    /// Scroll step for `auto_scroll`
    pub scroll_step_px: u32,

    /// Delay between scroll steps for `auto_scroll`
    pub scroll_delay_ms: u64,
}

/// Checkpoint artifact location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Root directory; stage folders (`category_result`, `product_initial`, ...) live below it
    pub output_root: PathBuf,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Directory for log files
    pub directory: PathBuf,

    /// Log file name prefix
    pub file_name: String,

    /// Rotation strategy: "daily" or "never"
    pub rotation: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_origin: rigel_medical::BASE_ORIGIN.to_string(),
            catalog_url: rigel_medical::CATALOG_URL.to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: defaults::BROWSER_HEADLESS,
            executable: None,
            extra_args: Vec::new(),
            no_sandbox: defaults::BROWSER_NO_SANDBOX,
            navigation_timeout_ms: defaults::NAVIGATION_TIMEOUT_MS,
            network_idle_window_ms: defaults::NETWORK_IDLE_WINDOW_MS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_subcategories_per_category: Some(defaults::MAX_SUBCATEGORIES_PER_CATEGORY),
            max_ops_before_recycle: defaults::MAX_OPS_BEFORE_RECYCLE,
            readiness_timeout_ms: defaults::READINESS_TIMEOUT_MS,
            auto_scroll: defaults::AUTO_SCROLL,
            scroll_step_px: defaults::SCROLL_STEP_PX,
            scroll_delay_ms: defaults::SCROLL_DELAY_MS,
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(defaults::OUTPUT_ROOT),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: PathBuf::from(defaults::LOG_DIRECTORY),
            file_name: defaults::LOG_FILE_NAME.to_string(),
            rotation: defaults::LOG_ROTATION.to_string(),
        }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn network_idle_window(&self) -> Duration {
        Duration::from_millis(self.network_idle_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl CrawlConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    /// Effective subcategory cap; `None` means uncapped
    pub fn subcategory_cap(&self) -> Option<usize> {
        self.max_subcategories_per_category.filter(|&cap| cap > 0)
    }
}

impl AppConfig {
    /// Load the layered configuration (see module docs)
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.site.base_origin).map_err(|e| ConfigError::Validation {
            message: format!("site.base_origin '{}' is not a URL: {}", self.site.base_origin, e),
        })?;

        url::Url::parse(&self.site.catalog_url).map_err(|e| ConfigError::Validation {
            message: format!("site.catalog_url '{}' is not a URL: {}", self.site.catalog_url, e),
        })?;

        if self.browser.navigation_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                message: "browser.navigation_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.browser.poll_interval_ms == 0 {
            return Err(ConfigError::Validation {
                message: "browser.poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.crawl.readiness_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                message: "crawl.readiness_timeout_ms must be greater than 0".to_string(),
            });
        }

        if !matches!(self.logging.rotation.as_str(), "daily" | "never") {
            return Err(ConfigError::Validation {
                message: format!(
                    "logging.rotation must be 'daily' or 'never', got '{}'",
                    self.logging.rotation
                ),
            });
        }

        Ok(())
    }
}

/// Builds an `AppConfig` from files and environment
pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            explicit_file: std::env::var_os(defaults::CONFIG_PATH_ENV).map(PathBuf::from),
            env_prefix: defaults::ENV_PREFIX.to_string(),
        }
    }

    /// Use this file instead of the one named by `CATALOG_CRAWLER_CONFIG`
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Read environment overrides under a different prefix
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Per-user configuration directory
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("catalog-crawler"))
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        // Missing keys fall back to the serde defaults
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(user_dir) = Self::user_config_dir() {
            let user_file = user_dir.join("config");
            debug!("Looking for user configuration at {:?}", user_file);
            builder = builder.add_source(
                config::File::with_name(&user_file.to_string_lossy()).required(false),
            );
        }

        if let Some(path) = &self.explicit_file {
            info!("Loading configuration file {:?}", path);
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Rigel Medical website constants
pub mod rigel_medical {
    /// Scheme + host every relative catalog path resolves against
    pub const BASE_ORIGIN: &str = "https://www.rigelmedical.com";

    /// Product catalog landing page (UK storefront)
    pub const CATALOG_URL: &str = "https://www.rigelmedical.com/gb/products/";

    /// Query marker the site appends to request resized thumbnails
    pub const DISPLAY_SIZE_SUFFIX: &str = "&height=500";
}

/// Default configuration values
pub mod defaults {
    /// Subcategories crawled per category, first cards in document order
    pub const MAX_SUBCATEGORIES_PER_CATEGORY: usize = 2;

    /// Completed operations between browser recycles
    pub const MAX_OPS_BEFORE_RECYCLE: usize = 5;

    /// Product image readiness gate timeout
    pub const READINESS_TIMEOUT_MS: u64 = 60_000;

    /// Navigation (load + network idle) timeout
    pub const NAVIGATION_TIMEOUT_MS: u64 = 60_000;

    /// Quiet period that counts as network idle
    pub const NETWORK_IDLE_WINDOW_MS: u64 = 500;

    /// Readiness predicate poll interval
    pub const POLL_INTERVAL_MS: u64 = 250;

    pub const AUTO_SCROLL: bool = true;
    pub const SCROLL_STEP_PX: u32 = 100;
    pub const SCROLL_DELAY_MS: u64 = 100;

    pub const BROWSER_HEADLESS: bool = true;
    pub const BROWSER_NO_SANDBOX: bool = true;

    /// Checkpoint root, relative to the working directory
    pub const OUTPUT_ROOT: &str = ".";

    // Log configuration defaults
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_DIRECTORY: &str = "logs";
    pub const LOG_FILE_NAME: &str = "catalog-crawler.log";
    pub const LOG_ROTATION: &str = "daily";

    /// Environment variable naming an explicit configuration file
    pub const CONFIG_PATH_ENV: &str = "CATALOG_CRAWLER_CONFIG";

    /// Prefix for environment overrides
    pub const ENV_PREFIX: &str = "CATALOG_CRAWLER";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crawl.max_subcategories_per_category, Some(2));
        assert_eq!(config.crawl.max_ops_before_recycle, 5);
        assert_eq!(config.crawl.readiness_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_subcategory_cap_means_uncapped() {
        let mut config = CrawlConfig::default();
        assert_eq!(config.subcategory_cap(), Some(2));

        config.max_subcategories_per_category = Some(0);
        assert_eq!(config.subcategory_cap(), None);

        config.max_subcategories_per_category = None;
        assert_eq!(config.subcategory_cap(), None);
    }

    #[test]
    fn test_zero_cap_from_toml_file_is_uncapped() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "[crawl]\nmax_subcategories_per_category = 0\n").unwrap();

        let config = ConfigLoader::new()
            .with_env_prefix("CATALOG_CRAWLER_TEST_UNUSED")
            .with_file(file.path())
            .load()
            .unwrap();

        assert_eq!(config.crawl.subcategory_cap(), None);
    }

    #[test]
    fn test_zero_readiness_timeout_is_rejected() {
        let mut config = AppConfig::default();
        config.crawl.readiness_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_unknown_rotation_is_rejected() {
        let mut config = AppConfig::default();
        config.logging.rotation = "hourly-ish".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"crawl": {{"max_ops_before_recycle": 9}}, "checkpoint": {{"output_root": "/tmp/catalog"}}}}"#
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_env_prefix("CATALOG_CRAWLER_TEST_UNUSED")
            .with_file(file.path())
            .load()
            .unwrap();

        assert_eq!(config.crawl.max_ops_before_recycle, 9);
        assert_eq!(config.checkpoint.output_root, PathBuf::from("/tmp/catalog"));
        assert_eq!(config.crawl.max_subcategories_per_category, Some(2));
        assert_eq!(config.site.catalog_url, rigel_medical::CATALOG_URL);
    }
}
