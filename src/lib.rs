// Re-export modules
pub mod catalog;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod ocr;
pub mod parsers;
pub mod results;
pub mod service;
pub mod store;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::CatalogScraper;
pub use config::AppConfig;
pub use results::{BatchReport, CatalogRecord, StoredProduct};
pub use store::ProductStore;

use std::sync::Arc;

/// Assemble the catalog API state from the configuration
pub fn catalog_state(
    config: &AppConfig,
) -> Result<service::CatalogState, Box<dyn std::error::Error + Send + Sync>> {
    let scraper = CatalogScraper::new(config.scraper.clone())?;
    let store = product_store(config)?;
    Ok(service::CatalogState::new(scraper, store))
}

/// Assemble the OCR API state from the configuration
pub fn ocr_state(config: &AppConfig) -> service::OcrState {
    let engine = Arc::new(ocr::TesseractCli::new(&config.ocr));
    service::OcrState::new(engine, config.ocr.max_upload_bytes)
}

/// Build the product store selected by the configuration
pub fn product_store(config: &AppConfig) -> Result<ProductStore, error::StoreError> {
    Ok(ProductStore::new(store::build_backend(&config.store)?))
}
