use crate::config::ScraperConfig;
use crate::crawlers::{self, PageFetcher, PageWalker, WalkOutcome};
use crate::results::CatalogRecord;
use std::sync::Arc;
use url::Url;

/// Entry point for scraping the whole catalog
pub struct CatalogScraper {
    config: ScraperConfig,
    start_url: Url,
    base_url: Url,
    fetcher: Arc<dyn PageFetcher>,
}

impl CatalogScraper {
    /// Create a scraper using the fetcher selected by `config`
    pub fn new(config: ScraperConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let fetcher: Arc<dyn PageFetcher> = Arc::from(crawlers::build_fetcher(&config)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Create a scraper around an existing fetcher
    pub fn with_fetcher(
        config: ScraperConfig,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let start_url = config.start()?;
        let base_url = config.base()?;
        Ok(Self {
            config,
            start_url,
            base_url,
            fetcher,
        })
    }

    /// Override the page ceiling
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape every reachable page; an empty catalog yields an empty list
    pub async fn run(&self) -> Vec<CatalogRecord> {
        self.run_with_outcome().await.records
    }

    /// Scrape every reachable page, also reporting why the walk ended
    pub async fn run_with_outcome(&self) -> WalkOutcome {
        ::log::info!("Starting catalog scrape at {}", self.start_url);

        let walker = PageWalker::new(self.fetcher.as_ref(), self.base_url.clone(), &self.config);
        let outcome = walker.walk_with_outcome(self.start_url.clone()).await;
        self.fetcher.close().await;

        ::log::info!(
            "Scraping complete. Total products found: {}",
            outcome.records.len()
        );
        outcome
    }
}
