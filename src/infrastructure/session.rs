//! Page session manager
//!
//! Owns the single browser/page pair the crawl drives. Long headless sessions
//! leak memory, so after a configured number of completed operations the pair
//! is closed and a fresh one is launched on the next navigation. Callers never
//! see the swap.

#![allow(clippy::uninlined_format_args)]

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::infrastructure::browser::{BrowserHandle, BrowserLauncher, PageHandle, scripts};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::crawl_error::{CrawlError, CrawlResult};

/// Serialized DOM and the URL it was taken from. Holds no live page reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub html: String,
    pub final_url: Option<String>,
}

/// Timing and recycle budget for a session
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub navigation_timeout: Duration,
    pub network_idle_window: Duration,
    pub poll_interval: Duration,
    /// 0 disables recycling
    pub max_ops_before_recycle: usize,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            navigation_timeout: config.browser.navigation_timeout(),
            network_idle_window: config.browser.network_idle_window(),
            poll_interval: config.browser.poll_interval(),
            max_ops_before_recycle: config.crawl.max_ops_before_recycle,
        }
    }
}

#[derive(Deserialize)]
struct NetworkActivity {
    ready: bool,
    resources: u64,
}

pub struct PageSessionManager {
    launcher: Arc<dyn BrowserLauncher>,
    settings: SessionSettings,
    browser: Option<Box<dyn BrowserHandle>>,
    page: Option<Box<dyn PageHandle>>,
    last_url: String,
    ops_since_recycle: usize,
    recycle_count: usize,
}

impl PageSessionManager {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: SessionSettings) -> Self {
        Self {
            launcher,
            settings,
            browser: None,
            page: None,
            last_url: String::new(),
            ops_since_recycle: 0,
            recycle_count: 0,
        }
    }

    /// Launch the browser and open a page unless already running
    pub async fn start(&mut self) -> CrawlResult<()> {
        if self.page.is_some() {
            return Ok(());
        }

        debug!("Launching browser");
        let mut browser = self
            .launcher
            .launch()
            .await
            .map_err(|e| CrawlError::browser(format!("launch failed: {:#}", e)))?;

        let page = match browser.new_page().await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!("Failed to close browser after page error: {:#}", close_err);
                }
                return Err(CrawlError::browser(format!("failed to open page: {:#}", e)));
            }
        };

        self.browser = Some(browser);
        self.page = Some(page);
        Ok(())
    }

    async fn page(&mut self) -> CrawlResult<&mut Box<dyn PageHandle>> {
        self.start().await?;
        self.page
            .as_mut()
            .ok_or_else(|| CrawlError::browser("page is not open"))
    }

    /// Navigate and wait until the network has been idle for the configured
    /// window, bounded by the navigation timeout
    pub async fn navigate(&mut self, url: &str) -> CrawlResult<()> {
        let settings = self.settings;
        self.last_url = url.to_string();
        let page = self.page().await?;

        match timeout(
            settings.navigation_timeout,
            goto_and_settle(page.as_mut(), url, &settings),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CrawlError::navigation(
                url,
                format!(
                    "timed out after {} ms waiting for network idle",
                    settings.navigation_timeout.as_millis()
                ),
            )),
        }
    }

    pub async fn snapshot(&mut self) -> CrawlResult<PageSnapshot> {
        let url = self.last_url.clone();
        let page = self.page().await?;

        let html = page
            .content()
            .await
            .map_err(|e| CrawlError::extraction(&url, format!("{:#}", e)))?;
        let final_url = page
            .current_url()
            .await
            .map_err(|e| CrawlError::extraction(&url, format!("{:#}", e)))?;

        Ok(PageSnapshot { html, final_url })
    }

    pub async fn evaluate(&mut self, script: &str) -> CrawlResult<Value> {
        let url = self.last_url.clone();
        self.page()
            .await?
            .evaluate(script)
            .await
            .map_err(|e| CrawlError::extraction(&url, format!("{:#}", e)))
    }

    /// Poll a boolean script until it returns `true`
    pub async fn wait_for(&mut self, predicate: &str, limit: Duration) -> CrawlResult<()> {
        let url = self.last_url.clone();
        let poll_interval = self.settings.poll_interval;
        let page = self.page().await?;

        match timeout(
            limit,
            poll_until_true(page.as_mut(), predicate, poll_interval, &url),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CrawlError::readiness_timeout(
                &url,
                u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    /// Count one finished item (success or failure) against the recycle budget
    pub async fn complete_operation(&mut self) {
        self.ops_since_recycle += 1;
        self.recycle_if_due().await;
    }

    /// Close the browser once the budget is spent; the next navigation
    /// launches a fresh one
    pub async fn recycle_if_due(&mut self) {
        let budget = self.settings.max_ops_before_recycle;
        if budget == 0 || self.ops_since_recycle < budget {
            return;
        }

        info!(
            "Restarting browser after {} operations",
            self.ops_since_recycle
        );
        self.close_browser().await;
        self.ops_since_recycle = 0;
        self.recycle_count += 1;
    }

    /// Close the browser; the manager can still be reused afterwards
    pub async fn shutdown(&mut self) {
        self.close_browser().await;
        debug!("Browser session shut down after {} recycles", self.recycle_count);
    }

    async fn close_browser(&mut self) {
        self.page = None;
        if let Some(browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser cleanly: {:#}", e);
            }
        }
    }

    pub fn recycle_count(&self) -> usize {
        self.recycle_count
    }

    pub fn ops_since_recycle(&self) -> usize {
        self.ops_since_recycle
    }

    pub fn is_running(&self) -> bool {
        self.page.is_some()
    }
}

async fn goto_and_settle(
    page: &mut dyn PageHandle,
    url: &str,
    settings: &SessionSettings,
) -> CrawlResult<()> {
    page.goto(url)
        .await
        .map_err(|e| CrawlError::navigation(url, format!("{:#}", e)))?;

    // Idle once the resource count stops changing for the idle window
    let mut last_seen: Option<u64> = None;
    let mut quiet_since = Instant::now();
    loop {
        let probe = page
            .evaluate(scripts::NETWORK_ACTIVITY_PROBE)
            .await
            .map_err(|e| CrawlError::navigation(url, format!("{:#}", e)))?;
        let activity: NetworkActivity = serde_json::from_value(probe).map_err(|e| {
            CrawlError::navigation(url, format!("unexpected network probe result: {}", e))
        })?;

        if activity.ready && last_seen == Some(activity.resources) {
            if quiet_since.elapsed() >= settings.network_idle_window {
                return Ok(());
            }
        } else {
            last_seen = Some(activity.resources);
            quiet_since = Instant::now();
        }

        sleep(settings.poll_interval).await;
    }
}

async fn poll_until_true(
    page: &mut dyn PageHandle,
    predicate: &str,
    poll_interval: Duration,
    url: &str,
) -> CrawlResult<()> {
    loop {
        let value = page
            .evaluate(predicate)
            .await
            .map_err(|e| CrawlError::extraction(url, format!("{:#}", e)))?;
        if value.as_bool() == Some(true) {
            return Ok(());
        }
        sleep(poll_interval).await;
    }
}
