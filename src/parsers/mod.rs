pub mod html;
pub mod price;
pub mod record;


use crate::error::ExtractError;
use crate::results::CatalogRecord;

/// Result of parsing one listing page
#[derive(Debug, Default)]
pub struct ParsedPage {
    /// Number of entry fragments found, including malformed ones
    pub entries: usize,
    /// Records extracted, in document order
    pub records: Vec<CatalogRecord>,
    /// Entries that were skipped
    pub failures: Vec<ExtractError>,
    /// Raw href of the "next page" link, if present
    pub next_link: Option<String>,
}

impl ParsedPage {
    /// A page without any entry fragment ends the walk
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

/// Main parser for listing pages
pub struct Parser;

impl Parser {
    /// Parse a listing page, tagging every record with `category`
    pub fn parse(content: &str, category: &str) -> ParsedPage {
        html::parse(content, category)
    }
}
