use crate::results::StoredProduct;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Optional, conjunctive predicates over stored products
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilterConfig {
    /// Case-insensitive substring of the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Case-insensitive substring of the category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Inclusive lower price bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,

    /// Inclusive upper price bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("min_price cannot be greater than max_price")]
    InvertedPriceRange,

    #[error("{0} cannot be negative")]
    NegativePrice(&'static str),

    #[error("{0} must be a finite number")]
    NonFinitePrice(&'static str),
}

/// Compiled product filter
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    config: ProductFilterConfig,
    title_regex: Option<Regex>,
    category_regex: Option<Regex>,
}

impl ProductFilter {
    /// Validate the bounds and compile the substring matchers
    pub fn new(config: ProductFilterConfig) -> Result<Self, FilterError> {
        check_bound("min_price", config.min_price)?;
        check_bound("max_price", config.max_price)?;
        if let (Some(min), Some(max)) = (config.min_price, config.max_price) {
            if min > max {
                return Err(FilterError::InvertedPriceRange);
            }
        }

        let title_regex = compile_contains(config.title.as_deref());
        let category_regex = compile_contains(config.category.as_deref());

        Ok(Self {
            config,
            title_regex,
            category_regex,
        })
    }

    pub fn config(&self) -> &ProductFilterConfig {
        &self.config
    }

    /// Non-empty title substring, if any
    pub fn title(&self) -> Option<&str> {
        non_empty(self.config.title.as_deref())
    }

    /// Non-empty category substring, if any
    pub fn category(&self) -> Option<&str> {
        non_empty(self.config.category.as_deref())
    }

    pub fn min_price(&self) -> Option<f64> {
        self.config.min_price
    }

    pub fn max_price(&self) -> Option<f64> {
        self.config.max_price
    }

    /// Whether a product satisfies every configured predicate
    pub fn matches(&self, product: &StoredProduct) -> bool {
        let record = &product.record;

        if let Some(regex) = &self.title_regex {
            if !regex.is_match(&record.title) {
                return false;
            }
        }

        if let Some(regex) = &self.category_regex {
            if !regex.is_match(&record.category) {
                return false;
            }
        }

        if let Some(min) = self.config.min_price {
            if record.price < min {
                return false;
            }
        }

        if let Some(max) = self.config.max_price {
            if record.price > max {
                return false;
            }
        }

        true
    }
}

/// NaN would fail every comparison and silently disable the bound
fn check_bound(name: &'static str, bound: Option<f64>) -> Result<(), FilterError> {
    match bound {
        Some(p) if !p.is_finite() => Err(FilterError::NonFinitePrice(name)),
        Some(p) if p < 0.0 => Err(FilterError::NegativePrice(name)),
        _ => Ok(()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Empty substrings impose no constraint
fn compile_contains(needle: Option<&str>) -> Option<Regex> {
    let needle = non_empty(needle)?;
    // An escaped literal always compiles
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()
}
