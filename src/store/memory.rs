use crate::error::StoreError;
use crate::filter::ProductFilter;
use crate::results::{CatalogRecord, StoredProduct};
use crate::store::TableBackend;
use async_trait::async_trait;
use std::sync::Mutex;

/// In-process product table
///
/// Each call is atomic on its own; ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct MemoryTable {
    rows: Mutex<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    products: Vec<StoredProduct>,
    last_id: i64,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Rows> {
        // A panic while holding the lock cannot leave rows half-written
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TableBackend for MemoryTable {
    async fn contains_title(&self, title: &str) -> Result<bool, StoreError> {
        Ok(self.lock().products.iter().any(|p| p.record.title == title))
    }

    async fn insert(&self, record: &CatalogRecord) -> Result<Option<StoredProduct>, StoreError> {
        let mut rows = self.lock();
        rows.last_id += 1;
        let stored = StoredProduct {
            id: rows.last_id,
            record: record.clone(),
        };
        rows.products.push(stored.clone());
        Ok(Some(stored))
    }

    async fn select(&self, filter: &ProductFilter) -> Result<Vec<StoredProduct>, StoreError> {
        Ok(self
            .lock()
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn categories(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()
            .products
            .iter()
            .map(|p| p.record.category.clone())
            .collect())
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let table = MemoryTable::new();
        let a = CatalogRecord::new("A".into(), 1.0, "Books".into(), 1);
        let b = CatalogRecord::new("B".into(), 2.0, "Books".into(), 2);

        let first = table.insert(&a).await.unwrap().unwrap();
        let second = table.insert(&b).await.unwrap().unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.record, b);
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_backend_itself_does_not_deduplicate() {
        let table = MemoryTable::new();
        let a = CatalogRecord::new("A".into(), 1.0, "Books".into(), 1);

        table.insert(&a).await.unwrap();
        table.insert(&a).await.unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.contains_title("A").await.unwrap());
    }
}
