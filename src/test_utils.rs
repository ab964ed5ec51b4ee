//! Test utilities for catalog-crawler
//!
//! A scripted in-memory browser: a map from URL to canned HTML plus a few
//! misbehaviours (failing navigation, images that never load, a network that
//! never goes idle). Every launch, close, and visit is recorded so tests can
//! assert on recycling and visit order.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::infrastructure::browser::{BrowserHandle, BrowserLauncher, PageHandle, scripts};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Behavior {
    Ready,
    NeverReady,
    Busy,
    NavigationFails(String),
}

#[derive(Debug, Clone)]
struct ScriptedPage {
    html: String,
    final_url: Option<String>,
    behavior: Behavior,
}

/// URL → page table served by `ScriptedLauncher`. Unknown URLs fail to resolve.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSite {
    pages: HashMap<String, ScriptedPage>,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, url: &str, html: &str, final_url: Option<&str>, behavior: Behavior) -> Self {
        self.pages.insert(
            url.to_string(),
            ScriptedPage {
                html: html.to_string(),
                final_url: final_url.map(String::from),
                behavior,
            },
        );
        self
    }

    /// A page that loads and passes every readiness check
    pub fn page(self, url: &str, html: &str) -> Self {
        self.with(url, html, None, Behavior::Ready)
    }

    /// A page that ends up on `final_url` after navigation
    pub fn redirect(self, url: &str, final_url: &str, html: &str) -> Self {
        self.with(url, html, Some(final_url), Behavior::Ready)
    }

    /// Navigation to `url` fails with `reason`
    pub fn failing(self, url: &str, reason: &str) -> Self {
        self.with(url, "", None, Behavior::NavigationFails(reason.to_string()))
    }

    /// Loads, but the image readiness predicate never turns true
    pub fn never_ready(self, url: &str, html: &str) -> Self {
        self.with(url, html, None, Behavior::NeverReady)
    }

    /// Loads, but keeps fetching resources so the network never goes idle
    pub fn busy(self, url: &str, html: &str) -> Self {
        self.with(url, html, None, Behavior::Busy)
    }
}

/// What the scripted browser observed
#[derive(Debug, Clone, Default)]
pub struct BrowserLog {
    pub launches: usize,
    pub closes: usize,
    pub visits: Vec<String>,
}

#[derive(Clone)]
pub struct ScriptedLauncher {
    site: Arc<ScriptedSite>,
    log: Arc<Mutex<BrowserLog>>,
}

impl ScriptedLauncher {
    pub fn new(site: ScriptedSite) -> Self {
        Self {
            site: Arc::new(site),
            log: Arc::new(Mutex::new(BrowserLog::default())),
        }
    }

    pub fn log(&self) -> BrowserLog {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).launches += 1;
        Ok(Box::new(ScriptedBrowser {
            site: Arc::clone(&self.site),
            log: Arc::clone(&self.log),
        }))
    }
}

struct ScriptedBrowser {
    site: Arc<ScriptedSite>,
    log: Arc<Mutex<BrowserLog>>,
}

#[async_trait]
impl BrowserHandle for ScriptedBrowser {
    async fn new_page(&mut self) -> Result<Box<dyn PageHandle>> {
        Ok(Box::new(ScriptedPageHandle {
            site: Arc::clone(&self.site),
            log: Arc::clone(&self.log),
            current: None,
            resources: AtomicU64::new(0),
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).closes += 1;
        Ok(())
    }
}

struct ScriptedPageHandle {
    site: Arc<ScriptedSite>,
    log: Arc<Mutex<BrowserLog>>,
    current: Option<String>,
    resources: AtomicU64,
}

impl ScriptedPageHandle {
    fn current_page(&self) -> Option<&ScriptedPage> {
        self.current.as_ref().and_then(|url| self.site.pages.get(url))
    }
}

#[async_trait]
impl PageHandle for ScriptedPageHandle {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .visits
            .push(url.to_string());

        match self.site.pages.get(url).map(|page| &page.behavior) {
            None => bail!("net::ERR_NAME_NOT_RESOLVED at {url}"),
            Some(Behavior::NavigationFails(reason)) => bail!("{reason} at {url}"),
            Some(_) => {
                self.current = Some(url.to_string());
                Ok(())
            }
        }
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        let behavior = self.current_page().map(|page| page.behavior.clone());

        if script == scripts::NETWORK_ACTIVITY_PROBE {
            let resources = if behavior == Some(Behavior::Busy) {
                self.resources.fetch_add(1, Ordering::Relaxed)
            } else {
                self.resources.load(Ordering::Relaxed)
            };
            return Ok(json!({ "ready": true, "resources": resources }));
        }

        if script.contains("naturalWidth") {
            return Ok(Value::Bool(behavior != Some(Behavior::NeverReady)));
        }

        Ok(Value::Null)
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self
            .current_page()
            .map(|page| page.html.clone())
            .unwrap_or_else(|| "<html><head></head><body></body></html>".to_string()))
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        Ok(self
            .current_page()
            .and_then(|page| page.final_url.clone())
            .or_else(|| self.current.clone()))
    }
}
