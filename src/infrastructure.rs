//! Infrastructure layer: browser sessions, HTML parsing, checkpoints,
//! configuration, and logging

pub mod browser;
pub mod checkpoint;
pub mod chromium;
pub mod config; // Configuration constants and layered loading
pub mod crawl_error;
pub mod logging;
pub mod parsing;
pub mod session;

// Re-export commonly used items
pub use browser::{BrowserHandle, BrowserLauncher, PageHandle};
pub use checkpoint::CheckpointStore;
pub use chromium::ChromiumLauncher;
pub use config::{AppConfig, ConfigError, ConfigLoader};
pub use crawl_error::{CrawlError, CrawlResult};
pub use session::{PageSessionManager, PageSnapshot, SessionSettings};
