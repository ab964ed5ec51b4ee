//! Chrome DevTools Protocol browser backed by `chromiumoxide`

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::infrastructure::browser::{BrowserHandle, BrowserLauncher, PageHandle};
use crate::infrastructure::config::BrowserSettings;

/// Launches a local Chrome/Chromium per session
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder().request_timeout(self.settings.navigation_timeout());

        // with_head means NOT headless
        if !self.settings.headless {
            builder = builder.with_head();
        }

        if let Some(executable) = &self.settings.executable {
            builder = builder.chrome_executable(executable);
        }

        if self.settings.no_sandbox {
            builder = builder.no_sandbox();
        }

        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        for arg in &self.settings.extra_args {
            builder = builder.arg(arg);
        }

        builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        // Drives the CDP connection; ends when the browser goes away
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                // Unknown CDP events surface as errors here and are not fatal
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        info!(headless = self.settings.headless, "Browser launched");
        Ok(Box::new(ChromiumBrowser {
            browser,
            handler_task,
        }))
    }
}

struct ChromiumBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserHandle for ChromiumBrowser {
    async fn new_page(&mut self) -> Result<Box<dyn PageHandle>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut this = *self;
        let closed = this.browser.close().await.context("Failed to close browser");
        // Reap the child process even if the close command failed
        let _ = this.browser.wait().await;
        this.handler_task.abort();
        closed.map(|_| ())
    }
}

struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script.to_string())
            .await
            .context("Script evaluation failed")?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn content(&mut self) -> Result<String> {
        self.page
            .content()
            .await
            .context("Failed to read page content")
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        self.page.url().await.context("Failed to read page URL")
    }
}
