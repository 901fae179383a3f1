use crate::parsers::{ParsedPage, record};
use scraper::{Html, Selector};
use std::sync::LazyLock;

static ENTRY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article.product_pod").unwrap());
static NEXT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li.next a").unwrap());

/// Parses a listing page into its records and its "next page" link
pub fn parse(html: &str, category: &str) -> ParsedPage {
    let doc = Html::parse_document(html);

    let mut page = ParsedPage::default();

    for entry in doc.select(&ENTRY) {
        page.entries += 1;
        match record::try_extract(entry, category) {
            Ok(record) => page.records.push(record),
            Err(e) => page.failures.push(e),
        }
    }

    page.next_link = next_link(&doc);

    ::log::debug!(
        "HTML parser found {} entries, {} records, next link: {:?}",
        page.entries,
        page.records.len(),
        page.next_link
    );

    page
}

/// Parses only the "next page" link
pub fn parse_next_link(html: &str) -> Option<String> {
    next_link(&Html::parse_document(html))
}

fn next_link(doc: &Html) -> Option<String> {
    doc.select(&NEXT)
        .filter_map(|e| e.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(|href| href.to_string())
}
