use crate::error::ExtractError;
use regex::Regex;
use std::sync::LazyLock;

/// Currency markers stripped from price text, including the `Â` left behind
/// when a UTF-8 pound sign is decoded as Latin-1
static CURRENCY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[£$€Â]").unwrap());

/// Parses a displayed price such as `£51.77` or `$ 12.50`
pub fn parse_price(text: &str) -> Result<f64, ExtractError> {
    let stripped = CURRENCY.replace_all(text, "");
    let trimmed = stripped.trim();

    let price: f64 = trimmed
        .parse()
        .map_err(|_| ExtractError::InvalidPrice(text.trim().to_string()))?;

    if !price.is_finite() || price < 0.0 {
        return Err(ExtractError::InvalidPrice(text.trim().to_string()));
    }

    Ok(price)
}
