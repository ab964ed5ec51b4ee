//! Headless browser capability boundary
//!
//! The crawl core only needs a handful of operations from a browser: launch,
//! open a page, navigate, evaluate a script, read the serialized DOM and the
//! current URL, close. They are expressed as object-safe traits so the
//! session manager can hold any implementation (Chrome via CDP in production,
//! a scripted in-memory site in tests).

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Starts browser instances
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>>;
}

/// A running browser process
#[async_trait]
pub trait BrowserHandle: Send {
    async fn new_page(&mut self) -> Result<Box<dyn PageHandle>>;

    /// Close the browser and every page it owns
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A single tab
#[async_trait]
pub trait PageHandle: Send {
    /// Navigate and wait for the load event
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression; promises are awaited, the result is
    /// returned by value (`Value::Null` for `undefined`)
    async fn evaluate(&mut self, script: &str) -> Result<Value>;

    /// Serialized DOM of the current document
    async fn content(&mut self) -> Result<String>;

    /// `window.location.href` after redirects
    async fn current_url(&mut self) -> Result<Option<String>>;
}

/// Scripts evaluated in page context
pub mod scripts {
    /// Reports document readiness and the number of resources fetched so far.
    /// The session manager treats the network as idle once this count stops
    /// changing for the configured window.
    pub const NETWORK_ACTIVITY_PROBE: &str = "(() => ({ \
        ready: document.readyState === 'complete', \
        resources: performance.getEntriesByType('resource').length \
    }))()";

    /// Boolean predicate: the primary image and every preview image are fully
    /// decoded with a nonzero natural width. False while the primary image is
    /// absent.
    pub fn images_ready_predicate(primary_selector: &str, preview_selector: &str) -> String {
        let primary = js_string(primary_selector);
        let previews = js_string(preview_selector);
        format!(
            "(() => {{ \
                const main = document.querySelector({primary}); \
                if (!main) return false; \
                const loaded = (img) => img.complete && img.naturalWidth > 0; \
                const previews = Array.from(document.querySelectorAll({previews})); \
                return loaded(main) && previews.every(loaded); \
            }})()"
        )
    }

    /// Scroll to the bottom of the document in fixed steps so lazy-loaded
    /// images get requested. Resolves once the bottom is reached.
    pub fn auto_scroll(step_px: u32, delay_ms: u64) -> String {
        format!(
            "(async () => {{ \
                await new Promise((resolve) => {{ \
                    let scrolled = 0; \
                    const timer = setInterval(() => {{ \
                        window.scrollBy(0, {step_px}); \
                        scrolled += {step_px}; \
                        if (scrolled >= document.body.scrollHeight) {{ \
                            clearInterval(timer); \
                            resolve(); \
                        }} \
                    }}, {delay_ms}); \
                }}); \
            }})()"
        )
    }

    fn js_string(raw: &str) -> String {
        serde_json::to_string(raw).unwrap_or_else(|_| "\"\"".to_string())
    }
}
