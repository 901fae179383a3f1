use crate::config::ScraperConfig;
use crate::crawlers::PageFetcher;
use crate::parsers::Parser;
use crate::results::CatalogRecord;
use crate::utils::{polite_delay, resolve_link};
use url::Url;

/// Position of the walk in the paginated catalog
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub url: Url,
    /// Pages successfully advanced past so far
    pub page_count: usize,
}

impl PageCursor {
    fn advance(&mut self, next: Url) {
        self.url = next;
        self.page_count += 1;
    }
}

/// Why a walk ended
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The last page had no usable "next page" link
    LastPage,
    /// A page contained no catalog entries
    EmptyPage,
    /// A page answered with a non-success status
    Status(u16),
    /// A page could not be fetched at all
    FetchFailed(String),
    /// The page ceiling was reached
    PageLimit,
}

/// Records collected by a walk, in page-then-entry order
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub records: Vec<CatalogRecord>,
    pub pages_fetched: usize,
    pub skipped_entries: usize,
    pub stop: StopReason,
}

/// Sequentially walks a paginated catalog
///
/// Only one fetch is ever in flight. A randomized pause separates consecutive
/// fetches but never precedes the first one.
pub struct PageWalker<'a> {
    fetcher: &'a dyn PageFetcher,
    base_url: Url,
    category: String,
    max_pages: usize,
    delay_min_ms: u64,
    delay_max_ms: u64,
}

impl<'a> PageWalker<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, base_url: Url, config: &ScraperConfig) -> Self {
        Self {
            fetcher,
            base_url,
            category: config.category.clone(),
            max_pages: config.max_pages,
            delay_min_ms: config.delay_min_ms,
            delay_max_ms: config.delay_max_ms,
        }
    }

    /// Walks from `start_url` and returns the accumulated records
    pub async fn walk(&self, start_url: Url) -> Vec<CatalogRecord> {
        self.walk_with_outcome(start_url).await.records
    }

    /// Walks from `start_url`, also reporting why the walk stopped
    pub async fn walk_with_outcome(&self, start_url: Url) -> WalkOutcome {
        let mut cursor = PageCursor {
            url: start_url,
            page_count: 0,
        };
        let mut records = Vec::new();
        let mut pages_fetched = 0;
        let mut skipped_entries = 0;

        let stop = loop {
            if cursor.page_count >= self.max_pages {
                ::log::warn!(
                    "Reached the limit of {} pages, stopping at {}",
                    self.max_pages,
                    cursor.url
                );
                break StopReason::PageLimit;
            }

            ::log::info!("Scraping page {}: {}", cursor.page_count + 1, cursor.url);

            let page = match self.fetcher.fetch(&cursor.url).await {
                Ok(page) => page,
                Err(e) => {
                    ::log::error!("Request failed for {}: {}", cursor.url, e);
                    break StopReason::FetchFailed(e.to_string());
                }
            };
            pages_fetched += 1;

            if !page.is_success() {
                ::log::warn!("Page returned status {}: {}", page.status, cursor.url);
                break StopReason::Status(page.status);
            }

            let parsed = Parser::parse(&page.body, &self.category);

            if parsed.is_empty() {
                ::log::warn!("No products found on page: {}", cursor.url);
                break StopReason::EmptyPage;
            }

            for failure in &parsed.failures {
                ::log::error!("Skipping entry on {}: {}", cursor.url, failure);
            }
            skipped_entries += parsed.failures.len();

            ::log::info!(
                "Extracted {} of {} products from page {}",
                parsed.records.len(),
                parsed.entries,
                cursor.page_count + 1
            );
            records.extend(parsed.records);

            let next = parsed
                .next_link
                .as_deref()
                .and_then(|href| resolve_link(&self.base_url, href));

            match next {
                Some(next) => {
                    cursor.advance(next);
                    if cursor.page_count >= self.max_pages {
                        continue;
                    }
                    let delay = polite_delay(self.delay_min_ms, self.delay_max_ms);
                    ::log::debug!("Waiting {:?} before the next page", delay);
                    tokio::time::sleep(delay).await;
                }
                None => {
                    ::log::info!("No more pages found, scraping complete");
                    break StopReason::LastPage;
                }
            }
        };

        ::log::info!(
            "Walk finished after {} pages with {} products ({:?})",
            pages_fetched,
            records.len(),
            stop
        );

        WalkOutcome {
            records,
            pages_fetched,
            skipped_entries,
            stop,
        }
    }
}
