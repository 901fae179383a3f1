use crate::error::ExtractError;
use crate::parsers::price::parse_price;
use crate::results::CatalogRecord;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3 a").unwrap());
static PRICE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".price_color").unwrap());
static RATING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.star-rating").unwrap());

/// Class tokens of the star rating, indexed by their numeric value
const RATING_WORDS: [&str; 6] = ["Zero", "One", "Two", "Three", "Four", "Five"];

/// Extracts a record from one catalog entry, or `None` if the entry is malformed
pub fn extract(entry: ElementRef<'_>, category: &str) -> Option<CatalogRecord> {
    try_extract(entry, category).ok()
}

/// Extracts a record from one catalog entry
///
/// Title and price are required. A missing or unrecognised rating yields 0.
pub fn try_extract(entry: ElementRef<'_>, category: &str) -> Result<CatalogRecord, ExtractError> {
    let title = extract_title(entry).ok_or(ExtractError::MissingTitle)?;

    let price_text = entry
        .select(&PRICE)
        .next()
        .map(|e| e.text().collect::<String>())
        .ok_or(ExtractError::MissingPrice)?;
    let price = parse_price(&price_text)?;

    Ok(CatalogRecord::new(
        title,
        price,
        category.to_string(),
        extract_rating(entry),
    ))
}

/// Prefers the link's `title` attribute, which holds the untruncated name
fn extract_title(entry: ElementRef<'_>) -> Option<String> {
    let link = entry.select(&TITLE).next()?;

    let from_attr = link
        .value()
        .attr("title")
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let title = match from_attr {
        Some(title) => title.to_string(),
        None => link.text().collect::<String>().trim().to_string(),
    };

    if title.is_empty() { None } else { Some(title) }
}

fn extract_rating(entry: ElementRef<'_>) -> u8 {
    let Some(element) = entry.select(&RATING).next() else {
        return 0;
    };

    element
        .value()
        .classes()
        .find_map(|class| RATING_WORDS.iter().position(|word| *word == class))
        .map(|index| index as u8)
        .unwrap_or(0)
}
