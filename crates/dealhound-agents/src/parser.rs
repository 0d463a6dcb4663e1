use std::sync::LazyLock;

use dealhound_models::estimate::PriceEstimate;
use regex::Regex;

/// A signed decimal (`-1.5`, `.99`) or, failing that, an unsigned integer.
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?[0-9]*\.[0-9]+|[0-9]+").expect("price pattern is valid")
});

/// Extract a price from a free-text oracle reply.
///
/// `$` and `,` are stripped first, then the first number in the text is
/// taken. A reply without any number is `PriceEstimate::NoSignal`, never an
/// error. Negative numbers clamp to zero.
pub fn parse_price(reply: &str) -> PriceEstimate {
    let cleaned: String = reply.chars().filter(|c| *c != '$' && *c != ',').collect();

    let value = PRICE_PATTERN
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok());
    match value {
        Some(value) if value.is_finite() => PriceEstimate::clamped(value),
        _ => PriceEstimate::NoSignal,
    }
}
