pub mod memory;
pub mod rest;

pub use memory::MemoryTable;
pub use rest::RestTable;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::filter::ProductFilter;
use crate::results::{BatchReport, CatalogRecord, InsertOutcome, ReadOutcome, StoredProduct};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A keyed product table supporting equality, substring and range predicates
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Whether a row with exactly this title exists
    async fn contains_title(&self, title: &str) -> Result<bool, StoreError>;

    /// Writes a row, returning it as stored or `None` if the write had no effect
    async fn insert(&self, record: &CatalogRecord) -> Result<Option<StoredProduct>, StoreError>;

    /// Rows matching every predicate of `filter`
    async fn select(&self, filter: &ProductFilter) -> Result<Vec<StoredProduct>, StoreError>;

    /// The category column of every row, duplicates included
    async fn categories(&self) -> Result<Vec<String>, StoreError>;

    async fn health(&self) -> Result<(), StoreError>;
}

/// Builds the backend described by the configuration
///
/// Falls back to an in-memory table when no remote store is configured.
pub fn build_backend(config: &StoreConfig) -> Result<Arc<dyn TableBackend>, StoreError> {
    match (&config.url, &config.service_key) {
        (Some(url), Some(key)) => Ok(Arc::new(RestTable::new(url, key, &config.table)?)),
        (Some(_), None) => Err(StoreError::Unavailable(
            "a store url is configured but no service key".to_string(),
        )),
        _ => {
            ::log::warn!("No remote store configured, products are kept in memory");
            Ok(Arc::new(MemoryTable::new()))
        }
    }
}

/// Persistence facade with title-based deduplication
///
/// The existence check and the write are separate backend calls, so two
/// concurrent batches with overlapping titles can both insert the same title.
/// Callers that need uniqueness must serialize batches.
#[derive(Clone)]
pub struct ProductStore {
    backend: Arc<dyn TableBackend>,
}

impl ProductStore {
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend }
    }

    pub async fn exists(&self, title: &str) -> Result<bool, StoreError> {
        self.backend.contains_title(title).await
    }

    /// Inserts a record unless one with the same title is already stored
    pub async fn insert_one(&self, record: &CatalogRecord) -> InsertOutcome {
        match self.exists(&record.title).await {
            Ok(true) => {
                ::log::info!("Product {:?} already exists, skipping", record.title);
                return InsertOutcome::Duplicate;
            }
            Ok(false) => {}
            Err(e) => {
                ::log::error!("Error checking product {:?}: {}", record.title, e);
                return InsertOutcome::Failed;
            }
        }

        match self.backend.insert(record).await {
            Ok(Some(stored)) => {
                ::log::debug!("Inserted product {:?} as {}", record.title, stored.id);
                InsertOutcome::Inserted
            }
            Ok(None) => {
                ::log::error!("Insert of product {:?} reported no effect", record.title);
                InsertOutcome::Failed
            }
            Err(e) => {
                ::log::error!("Error inserting product {:?}: {}", record.title, e);
                InsertOutcome::Failed
            }
        }
    }

    /// Inserts every record independently, in input order
    pub async fn insert_batch(&self, records: &[CatalogRecord]) -> BatchReport {
        let mut report = BatchReport::default();
        for record in records {
            report.record(self.insert_one(record).await);
        }

        ::log::info!(
            "Batch insert: {} total, {} inserted, {} duplicates, {} failed",
            report.total,
            report.inserted,
            report.duplicates,
            report.failed
        );
        report
    }

    /// Products matching `filter`, capped at `limit` when given
    pub async fn query(
        &self,
        filter: &ProductFilter,
        limit: Option<usize>,
    ) -> ReadOutcome<Vec<StoredProduct>> {
        match self.backend.select(filter).await {
            Ok(mut products) => {
                if let Some(limit) = limit {
                    products.truncate(limit);
                }
                ReadOutcome::Fresh(products)
            }
            Err(e) => {
                ::log::error!("Error fetching products: {}", e);
                ReadOutcome::Degraded {
                    value: Vec::new(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Sorted, distinct categories currently stored
    pub async fn list_categories(&self) -> ReadOutcome<Vec<String>> {
        match self.backend.categories().await {
            Ok(categories) => {
                let distinct: BTreeSet<String> = categories.into_iter().collect();
                ReadOutcome::Fresh(distinct.into_iter().collect())
            }
            Err(e) => {
                ::log::error!("Error fetching categories: {}", e);
                ReadOutcome::Degraded {
                    value: Vec::new(),
                    error: e.to_string(),
                }
            }
        }
    }

    pub async fn health(&self) -> bool {
        match self.backend.health().await {
            Ok(()) => true,
            Err(e) => {
                ::log::warn!("Store health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ProductFilterConfig;
    use std::sync::Mutex;

    fn record(title: &str, price: f64, category: &str) -> CatalogRecord {
        CatalogRecord::new(title.into(), price, category.into(), 4)
    }

    fn memory_store() -> ProductStore {
        ProductStore::new(Arc::new(MemoryTable::new()))
    }

    /// Backend whose reads always fail and whose writes fail for chosen titles
    struct FlakyTable {
        inner: MemoryTable,
        failing_titles: Vec<&'static str>,
        silent_titles: Vec<&'static str>,
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TableBackend for FlakyTable {
        async fn contains_title(&self, title: &str) -> Result<bool, StoreError> {
            self.inner.contains_title(title).await
        }

        async fn insert(
            &self,
            record: &CatalogRecord,
        ) -> Result<Option<StoredProduct>, StoreError> {
            self.attempts.lock().unwrap().push(record.title.clone());
            if self.failing_titles.contains(&record.title.as_str()) {
                return Err(StoreError::Unavailable("connection reset".into()));
            }
            if self.silent_titles.contains(&record.title.as_str()) {
                return Ok(None);
            }
            self.inner.insert(record).await
        }

        async fn select(&self, _filter: &ProductFilter) -> Result<Vec<StoredProduct>, StoreError> {
            Err(StoreError::Unavailable("backend down".into()))
        }

        async fn categories(&self) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("backend down".into()))
        }

        async fn health(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("backend down".into()))
        }
    }

    #[tokio::test]
    async fn test_insert_one_skips_existing_title() {
        let store = memory_store();
        let book = record("Sharp Objects", 47.82, "Books");

        assert_eq!(store.insert_one(&book).await, InsertOutcome::Inserted);
        assert!(store.exists("Sharp Objects").await.unwrap());
        assert_eq!(store.insert_one(&book).await, InsertOutcome::Duplicate);
        assert!(!store.exists("sharp objects").await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_with_repeated_title() {
        let store = memory_store();
        let records: Vec<_> = ["A", "B", "C", "A", "D"]
            .iter()
            .map(|t| record(t, 10.0, "Books"))
            .collect();

        let report = store.insert_batch(&records).await;

        assert_eq!(report.total, 5);
        assert_eq!(report.inserted, 4);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.skipped(), 1);
    }

    #[tokio::test]
    async fn test_batch_is_idempotent() {
        let store = memory_store();
        let records = vec![
            record("A", 1.0, "Books"),
            record("B", 2.0, "Books"),
            record("C", 3.0, "Books"),
        ];

        let first = store.insert_batch(&records).await;
        let second = store.insert_batch(&records).await;

        assert_eq!(first.inserted, 3);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 3);
        let all = store.query(&ProductFilter::default(), None).await;
        assert_eq!(all.value().len(), 3);
    }

    #[tokio::test]
    async fn test_batch_continues_after_write_failure() {
        let table = Arc::new(FlakyTable {
            inner: MemoryTable::new(),
            failing_titles: vec!["B"],
            silent_titles: vec!["C"],
            attempts: Mutex::new(Vec::new()),
        });
        let store = ProductStore::new(table.clone());
        let records: Vec<_> = ["A", "B", "C", "D"]
            .iter()
            .map(|t| record(t, 10.0, "Books"))
            .collect();

        let report = store.insert_batch(&records).await;

        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.duplicates, 0);
        assert_eq!(report.skipped(), 2);
        assert_eq!(*table.attempts.lock().unwrap(), ["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_query_applies_all_filters() {
        let store = memory_store();
        store
            .insert_batch(&[
                record("Cheap fiction", 5.0, "Fiction"),
                record("Mid fiction", 15.0, "Fiction"),
                record("Edge fiction", 20.0, "Science Fiction"),
                record("Mid poetry", 15.0, "Poetry"),
                record("Dear fiction", 25.0, "Fiction"),
            ])
            .await;

        let filter = ProductFilter::new(ProductFilterConfig {
            category: Some("Fiction".into()),
            min_price: Some(10.0),
            max_price: Some(20.0),
            ..Default::default()
        })
        .unwrap();
        let result = store.query(&filter, None).await;

        assert!(!result.is_degraded());
        let titles: Vec<_> = result.value().iter().map(|p| p.record.title.as_str()).collect();
        assert_eq!(titles, ["Mid fiction", "Edge fiction"]);
    }

    #[tokio::test]
    async fn test_query_limit_is_applied_after_filtering() {
        let store = memory_store();
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("Book {i}"), i as f64, "Books"))
            .collect();
        store.insert_batch(&records).await;

        let filter = ProductFilter::new(ProductFilterConfig {
            min_price: Some(5.0),
            ..Default::default()
        })
        .unwrap();
        let result = store.query(&filter, Some(3)).await.into_value();

        let titles: Vec<_> = result.iter().map(|p| p.record.title.as_str()).collect();
        assert_eq!(titles, ["Book 5", "Book 6", "Book 7"]);
    }

    #[tokio::test]
    async fn test_empty_store_reads_are_fresh_and_empty() {
        let store = memory_store();

        let products = store.query(&ProductFilter::default(), None).await;
        assert_eq!(products, ReadOutcome::Fresh(Vec::new()));

        let categories = store.list_categories().await;
        assert_eq!(categories, ReadOutcome::Fresh(Vec::new()));
    }

    #[tokio::test]
    async fn test_categories_are_sorted_and_distinct() {
        let store = memory_store();
        store
            .insert_batch(&[
                record("a", 1.0, "Poetry"),
                record("b", 1.0, "Books"),
                record("c", 1.0, "Poetry"),
                record("d", 1.0, "Fiction"),
            ])
            .await;

        let categories = store.list_categories().await.into_value();
        assert_eq!(categories, ["Books", "Fiction", "Poetry"]);
    }

    #[tokio::test]
    async fn test_read_failures_are_degraded_not_raised() {
        let store = ProductStore::new(Arc::new(FlakyTable {
            inner: MemoryTable::new(),
            failing_titles: vec![],
            silent_titles: vec![],
            attempts: Mutex::new(Vec::new()),
        }));

        let products = store.query(&ProductFilter::default(), Some(10)).await;
        assert!(products.is_degraded());
        assert!(products.value().is_empty());
        assert!(products.error().unwrap().contains("backend down"));

        let categories = store.list_categories().await;
        assert!(categories.is_degraded());
        assert!(categories.value().is_empty());

        assert!(!store.health().await);
    }

    #[test]
    fn test_build_backend_requires_key_for_remote() {
        let config = StoreConfig {
            url: Some("https://project.example.co".into()),
            service_key: None,
            table: "products".into(),
        };
        assert!(build_backend(&config).is_err());
        assert!(build_backend(&StoreConfig::default()).is_ok());
    }
}
