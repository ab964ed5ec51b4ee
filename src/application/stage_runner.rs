//! Stage runner
//!
//! Drives one hierarchy level at a time through the page session: navigate,
//! optionally pass a readiness gate, snapshot, extract, append. Discovery
//! stages stop at the first error. The detail stage isolates each item, so
//! every input yields exactly one record or one `FailureRecord`.

#![allow(clippy::uninlined_format_args)]

use scraper::Html;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::domain::{FailureRecord, LinkRecord};
use crate::infrastructure::browser::scripts;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::crawl_error::{CrawlError, CrawlResult};
use crate::infrastructure::parsing::{ContextualParser, ExtractContext};
use crate::infrastructure::session::{PageSessionManager, PageSnapshot};

/// Bounded wait run after navigation and before the snapshot
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    /// Script scrolling the page before the wait, so lazy content is requested
    pub scroll_script: Option<String>,
    /// Boolean script polled until true
    pub predicate: String,
    pub timeout: Duration,
}

impl ReadinessGate {
    /// Product detail gate: primary image and every preview decoded
    pub fn product_images(config: &AppConfig) -> Self {
        let selectors = &config.selectors.product_detail;
        let crawl = &config.crawl;
        Self {
            scroll_script: crawl
                .auto_scroll
                .then(|| scripts::auto_scroll(crawl.scroll_step_px, crawl.scroll_delay_ms)),
            predicate: scripts::images_ready_predicate(
                &selectors.primary_image,
                &selectors.preview_images,
            ),
            timeout: crawl.readiness_timeout(),
        }
    }

    async fn pass(&self, session: &mut PageSessionManager, url: &str) -> CrawlResult<()> {
        if let Some(scroll) = &self.scroll_script {
            timeout(self.timeout, session.evaluate(scroll))
                .await
                .map_err(|_| {
                    CrawlError::readiness_timeout(
                        url,
                        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    )
                })??;
        }

        info!("Waiting for images to load...");
        session.wait_for(&self.predicate, self.timeout).await
    }
}

/// Detail stage result: one entry in either list per input, input order kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedOutcome<T> {
    pub records: Vec<T>,
    pub failures: Vec<FailureRecord>,
}

pub struct StageRunner<'s> {
    session: &'s mut PageSessionManager,
    base_origin: String,
}

impl<'s> StageRunner<'s> {
    pub fn new(session: &'s mut PageSessionManager, base_origin: &str) -> Self {
        Self {
            session,
            base_origin: base_origin.to_string(),
        }
    }

    /// Extract a single page; errors are returned to the caller
    pub async fn run_page<P>(
        &mut self,
        link: &str,
        parser: &P,
        parent: &P::Parent,
    ) -> CrawlResult<P::Output>
    where
        P: ContextualParser,
    {
        info!("Scraping from: {}", link);
        let result = self.visit(link, parser, parent, None).await;
        self.session.complete_operation().await;
        result
    }

    /// Extract every source page in order, concatenating their records.
    /// The first error aborts the stage.
    pub async fn run_discovery<S, P, T>(
        &mut self,
        sources: &[S],
        parser: &P,
    ) -> CrawlResult<Vec<T>>
    where
        S: LinkRecord,
        P: ContextualParser<Parent = S, Output = Vec<T>>,
    {
        let mut buffer = Vec::new();

        for source in sources {
            let records = self.run_page(source.link(), parser, source).await?;
            buffer.extend(records);
        }

        Ok(buffer)
    }

    /// Extract one record per source, turning each failure into a
    /// `FailureRecord` and moving on
    pub async fn run_isolated<S, P>(
        &mut self,
        sources: &[S],
        parser: &P,
        gate: Option<&ReadinessGate>,
    ) -> IsolatedOutcome<P::Output>
    where
        S: LinkRecord,
        P: ContextualParser<Parent = S>,
    {
        let total = sources.len();
        let mut outcome = IsolatedOutcome {
            records: Vec::with_capacity(total),
            failures: Vec::new(),
        };

        for (index, source) in sources.iter().enumerate() {
            info!(
                "Scraping product {}/{}: {} ({})",
                index + 1,
                total,
                source.display_name(),
                source.link()
            );

            match self.visit(source.link(), parser, source, gate).await {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    if e.is_item_scoped() {
                        warn!(
                            "Failed to scrape product: {} ({}): {}",
                            source.display_name(),
                            source.link(),
                            e
                        );
                    } else {
                        error!("Browser session failed on {}: {}", source.link(), e);
                    }
                    outcome
                        .failures
                        .push(FailureRecord::new(source.display_name(), source.link(), &e));
                }
            }

            self.session.complete_operation().await;
        }

        outcome
    }

    pub fn recycle_count(&self) -> usize {
        self.session.recycle_count()
    }

    async fn visit<P>(
        &mut self,
        link: &str,
        parser: &P,
        parent: &P::Parent,
        gate: Option<&ReadinessGate>,
    ) -> CrawlResult<P::Output>
    where
        P: ContextualParser,
    {
        self.session.navigate(link).await?;
        if let Some(gate) = gate {
            gate.pass(self.session, link).await?;
        }
        let snapshot = self.session.snapshot().await?;
        self.extract(link, &snapshot, parser, parent)
    }

    /// Parse and extract synchronously; `Html` never lives across an await
    fn extract<P>(
        &self,
        link: &str,
        snapshot: &PageSnapshot,
        parser: &P,
        parent: &P::Parent,
    ) -> CrawlResult<P::Output>
    where
        P: ContextualParser,
    {
        let context = ExtractContext::new(&self.base_origin, link)
            .map_err(|e| CrawlError::extraction(link, e))?
            .with_final_url(snapshot.final_url.clone());
        let html = Html::parse_document(&snapshot.html);

        parser
            .parse_with_context(&html, &context, parent)
            .map_err(|e| CrawlError::extraction(link, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryRecord, ProductSummaryRecord};
    use crate::infrastructure::parsing::{ProductDetailParser, SubcategoryParser};
    use crate::infrastructure::session::SessionSettings;
    use crate::test_utils::{ScriptedLauncher, ScriptedSite};
    use std::sync::Arc;

    const ORIGIN: &str = "https://www.rigelmedical.com";

    fn session(launcher: &ScriptedLauncher, max_ops: usize) -> PageSessionManager {
        PageSessionManager::new(
            Arc::new(launcher.clone()),
            SessionSettings {
                navigation_timeout: Duration::from_secs(5),
                network_idle_window: Duration::ZERO,
                poll_interval: Duration::from_millis(1),
                max_ops_before_recycle: max_ops,
            },
        )
    }

    fn gate() -> ReadinessGate {
        let mut config = AppConfig::default();
        config.crawl.readiness_timeout_ms = 25;
        config.crawl.auto_scroll = true;
        ReadinessGate::product_images(&config)
    }

    fn summary(i: usize) -> ProductSummaryRecord {
        ProductSummaryRecord {
            name: format!("Product {i}"),
            image_url: None,
            short_description: None,
            link: format!("{ORIGIN}/gb/products/p-{i}/"),
            parent_category_name: "Cat".to_string(),
            parent_subcategory_name: "Sub".to_string(),
        }
    }

    fn detail_html(i: usize) -> String {
        format!(
            r#"<h1 class="productName">Product {i}</h1>
               <div id="zoom"><img class="productImage" src="/media/p-{i}.png&height=500"></div>"#
        )
    }

    #[tokio::test]
    async fn test_readiness_timeout_on_item_three_of_five() {
        let products: Vec<_> = (1..=5).map(summary).collect();
        let site = products.iter().enumerate().fold(ScriptedSite::new(), |site, (i, p)| {
            if i == 2 {
                site.never_ready(&p.link, &detail_html(i + 1))
            } else {
                site.page(&p.link, &detail_html(i + 1))
            }
        });
        let launcher = ScriptedLauncher::new(site);
        let mut session = session(&launcher, 5);
        let parser = ProductDetailParser::new().unwrap();
        let gate = gate();

        let outcome = StageRunner::new(&mut session, ORIGIN)
            .run_isolated(&products, &parser, Some(&gate))
            .await;

        assert_eq!(outcome.records.len() + outcome.failures.len(), products.len());
        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "Product 3");
        assert_eq!(outcome.failures[0].link, products[2].link);
        assert!(outcome.failures[0].error_message.contains("did not finish loading"));

        let names: Vec<_> = outcome
            .records
            .iter()
            .filter_map(|r| r.name.as_deref())
            .collect();
        assert_eq!(names, ["Product 1", "Product 2", "Product 4", "Product 5"]);
        assert_eq!(
            outcome.records[0].images,
            vec![format!("{ORIGIN}/media/p-1.png")]
        );

        // Items 4 and 5 were still visited
        assert_eq!(launcher.log().visits.len(), 5);
        assert_eq!(session.recycle_count(), 1);
    }

    #[tokio::test]
    async fn test_every_input_yields_one_outcome() {
        let products: Vec<_> = (1..=4).map(summary).collect();
        let site = ScriptedSite::new()
            .page(&products[0].link, &detail_html(1))
            .failing(&products[1].link, "net::ERR_CONNECTION_RESET");
        // products 3 and 4 are unknown to the site
        let launcher = ScriptedLauncher::new(site);
        let mut session = session(&launcher, 2);
        let parser = ProductDetailParser::new().unwrap();

        let outcome = StageRunner::new(&mut session, ORIGIN)
            .run_isolated(&products, &parser, None)
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures.len(), 3);
        assert!(outcome.failures[0].error_message.contains("ERR_CONNECTION_RESET"));
        assert_eq!(launcher.log().launches, 2);
    }

    #[tokio::test]
    async fn test_discovery_aborts_on_first_error() {
        let categories = vec![
            CategoryRecord {
                name: "A".to_string(),
                image_url: None,
                description: None,
                link: format!("{ORIGIN}/gb/products/a/"),
            },
            CategoryRecord {
                name: "B".to_string(),
                image_url: None,
                description: None,
                link: format!("{ORIGIN}/gb/products/b/"),
            },
            CategoryRecord {
                name: "C".to_string(),
                image_url: None,
                description: None,
                link: format!("{ORIGIN}/gb/products/c/"),
            },
        ];
        let site = ScriptedSite::new()
            .page(&categories[0].link, "<div class=\"row\"></div>")
            .failing(&categories[1].link, "net::ERR_TIMED_OUT");
        let launcher = ScriptedLauncher::new(site);
        let mut session = session(&launcher, 5);
        let parser = SubcategoryParser::new(Some(2)).unwrap();

        let err = StageRunner::new(&mut session, ORIGIN)
            .run_discovery(&categories, &parser)
            .await
            .unwrap_err();

        assert_eq!(err.url(), Some(categories[1].link.as_str()));
        assert_eq!(launcher.log().visits.len(), 2);
    }
}
