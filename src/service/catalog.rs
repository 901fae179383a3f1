use crate::catalog::CatalogScraper;
use crate::filter::{ProductFilter, ProductFilterConfig};
use crate::results::StoredProduct;
use crate::service::ApiError;
use crate::store::ProductStore;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// Shared state of the catalog API
#[derive(Clone)]
pub struct CatalogState {
    scraper: Arc<CatalogScraper>,
    store: ProductStore,
    /// Serializes scrape runs so their batches never interleave
    scrape_lock: Arc<Mutex<()>>,
}

impl CatalogState {
    pub fn new(scraper: CatalogScraper, store: ProductStore) -> Self {
        Self {
            scraper: Arc::new(scraper),
            store,
            scrape_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn catalog_router(state: CatalogState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/scrape", post(run_scrape))
        .route("/products", get(list_products))
        .route("/categories", get(list_categories))
        .route("/health", get(health))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Catalog scraper API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/scrape": "Run the catalog scraper",
            "/products": "List products with optional filters",
            "/categories": "List every stored category"
        }
    }))
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub message: String,
    pub total_scraped: usize,
    pub new_products_saved: usize,
    pub duplicates_skipped: usize,
    pub failed: usize,
}

async fn run_scrape(State(state): State<CatalogState>) -> Json<ScrapeResponse> {
    let _guard = state.scrape_lock.lock().await;
    ::log::info!("Starting scrape run");

    let records = state.scraper.run().await;
    if records.is_empty() {
        return Json(ScrapeResponse {
            message: "No products found during scraping".to_string(),
            total_scraped: 0,
            new_products_saved: 0,
            duplicates_skipped: 0,
            failed: 0,
        });
    }

    let report = state.store.insert_batch(&records).await;
    ::log::info!(
        "Scrape run complete, {} new products saved",
        report.inserted
    );

    Json(ScrapeResponse {
        message: "Scraping completed successfully".to_string(),
        total_scraped: report.total,
        new_products_saved: report.inserted,
        duplicates_skipped: report.skipped(),
        failed: report.failed,
    })
}

#[derive(Debug, Deserialize)]
pub struct ProductsParams {
    title: Option<String>,
    category: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<StoredProduct>,
    pub count: usize,
    pub filters_applied: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
}

async fn list_products(
    State(state): State<CatalogState>,
    Query(params): Query<ProductsParams>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let filter = ProductFilter::new(ProductFilterConfig {
        title: params.title,
        category: params.category,
        min_price: params.min_price,
        max_price: params.max_price,
    })
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let outcome = state.store.query(&filter, Some(limit)).await;
    let store_error = outcome.error().map(str::to_string);
    let products = outcome.into_value();

    let mut filters_applied = json!(filter.config());
    filters_applied["limit"] = json!(limit);

    Ok(Json(ProductsResponse {
        count: products.len(),
        products,
        filters_applied,
        store_error,
    }))
}

async fn list_categories(State(state): State<CatalogState>) -> Json<Value> {
    let outcome = state.store.list_categories().await;
    let store_error = outcome.error().map(str::to_string);
    let categories = outcome.into_value();

    let mut body = json!({
        "categories": categories,
        "count": categories.len(),
    });
    if let Some(error) = store_error {
        body["store_error"] = json!(error);
    }
    Json(body)
}

async fn health(State(state): State<CatalogState>) -> Json<Value> {
    let store = if state.store.health().await {
        "available"
    } else {
        "unavailable"
    };
    Json(json!({
        "status": "healthy",
        "service": "catalog scraper",
        "store": store,
    }))
}
