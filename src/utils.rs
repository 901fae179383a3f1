use std::time::Duration;
use url::Url;

/// Picks a pause uniformly from `[min_ms, max_ms]`
///
/// Bounds given in the wrong order are swapped.
pub fn polite_delay(min_ms: u64, max_ms: u64) -> Duration {
    let (low, high) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    Duration::from_millis(fastrand::u64(low..=high))
}

/// Resolves a "next page" href against the catalog base
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    match base.join(href) {
        Ok(mut url) => {
            url.set_fragment(None);
            Some(url)
        }
        Err(e) => {
            ::log::warn!("Cannot resolve link {:?} against {}: {}", href, base, e);
            None
        }
    }
}
