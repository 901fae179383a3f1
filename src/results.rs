use serde::{Deserialize, Serialize};

/// A product scraped from one catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Natural key used for duplicate detection
    pub title: String,

    pub price: f64,

    pub category: String,

    /// Star rating, 0 to 5
    pub rating: u8,
}

impl CatalogRecord {
    pub fn new(title: String, price: f64, category: String, rating: u8) -> Self {
        Self {
            title,
            price,
            category,
            rating,
        }
    }
}

/// A record as persisted by the table store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProduct {
    /// Store-assigned identifier
    pub id: i64,

    #[serde(flatten)]
    pub record: CatalogRecord,
}

/// Result of inserting a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A product with the same title already exists
    Duplicate,
    /// The write failed or reported no effect
    Failed,
}

/// Counts reported by a batch insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn record(&mut self, outcome: InsertOutcome) {
        self.total += 1;
        match outcome {
            InsertOutcome::Inserted => self.inserted += 1,
            InsertOutcome::Duplicate => self.duplicates += 1,
            InsertOutcome::Failed => self.failed += 1,
        }
    }

    /// Everything that was not newly written
    pub fn skipped(&self) -> usize {
        self.total - self.inserted
    }
}

/// Result of a store read that never fails outright
///
/// A backend failure still yields a usable (empty) value, but callers can
/// tell it apart from a genuinely empty result.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    Fresh(T),
    Degraded { value: T, error: String },
}

impl<T> ReadOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            ReadOutcome::Fresh(value) => value,
            ReadOutcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            ReadOutcome::Fresh(value) => value,
            ReadOutcome::Degraded { value, .. } => value,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ReadOutcome::Fresh(_) => None,
            ReadOutcome::Degraded { error, .. } => Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ReadOutcome::Degraded { .. })
    }
}
