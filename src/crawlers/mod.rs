pub mod crawler;
pub mod http;
pub mod walker;
pub mod web;

pub use crawler::{FetchedPage, PageFetcher};
pub use walker::{PageCursor, PageWalker, StopReason, WalkOutcome};

use crate::config::{FetchMode, ScraperConfig};
use crate::error::FetchError;

/// Builds the fetcher selected by the configuration
pub fn build_fetcher(config: &ScraperConfig) -> Result<Box<dyn PageFetcher>, FetchError> {
    match config.fetch_mode {
        FetchMode::Http => Ok(Box::new(http::HttpFetcher::new(config)?)),
        FetchMode::WebDriver => Ok(Box::new(web::WebDriverFetcher::new(
            &config.webdriver_url,
            config.request_timeout_secs,
        ))),
    }
}
