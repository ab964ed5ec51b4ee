//! Logging system configuration and initialization
//!
//! - Console output with local timestamps
//! - Optional file output (daily rotation or a single file), plain or JSON
//! - `RUST_LOG` overrides the configured level
//! - Browser protocol chatter (chromiumoxide, tungstenite) is suppressed unless
//!   the level is `trace`

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Local;
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive for the life of the process
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Local time with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured level with
/// noisy dependencies turned down
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for directive in [
            "chromiumoxide=warn",
            "chromiumoxide::conn=error",
            "chromiumoxide::handler=error",
            "tungstenite=warn",
            "tokio_tungstenite=warn",
            "hyper=warn",
        ] {
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e| anyhow!("Invalid log directive '{}': {}", directive, e))?,
            );
        }
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;
    let registry = Registry::default().with(env_filter);

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    });

    match (config.file_output, config.json_format) {
        (true, json) => {
            std::fs::create_dir_all(&config.directory).map_err(|e| {
                anyhow!("Failed to create log directory {:?}: {}", config.directory, e)
            })?;

            let appender = file_appender(&config.directory, &config.file_name, &config.rotation);
            let (file_writer, guard) = non_blocking(appender);
            LOG_GUARD
                .set(guard)
                .map_err(|_| anyhow!("Logging already initialized"))?;

            if json {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false);
                registry
                    .with(console_layer)
                    .with(file_layer)
                    .try_init()
                    .map_err(|e| anyhow!("Failed to install subscriber: {}", e))?;
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false)
                    .with_ansi(false);
                registry
                    .with(console_layer)
                    .with(file_layer)
                    .try_init()
                    .map_err(|e| anyhow!("Failed to install subscriber: {}", e))?;
            }
        }
        (false, _) => {
            if console_layer.is_none() {
                return Err(anyhow!("No logging output configured"));
            }
            registry
                .with(console_layer)
                .try_init()
                .map_err(|e| anyhow!("Failed to install subscriber: {}", e))?;
        }
    }

    info!(
        level = %config.level,
        file_output = config.file_output,
        json = config.json_format,
        "Logging system initialized"
    );
    if config.file_output {
        info!("Log directory: {:?}", config.directory);
    }

    Ok(())
}

fn file_appender(directory: &Path, file_name: &str, rotation: &str) -> rolling::RollingFileAppender {
    match rotation {
        "never" => rolling::never(directory, file_name),
        _ => rolling::daily(directory, file_name),
    }
}

/// Log build and host information for diagnostics
pub fn log_system_info() {
    info!("=== Catalog Crawler ===");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.file_output);
    }

    #[test]
    fn test_invalid_level_is_reported() {
        // Only meaningful when RUST_LOG is not set in the test environment
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "info,catalog_crawler=verbose".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_env_filter(&config).is_err());
    }
}
