/// Provider error normalization
///
/// Aggregator APIs return free-form error payloads. This module maps them to
/// the small set of user-facing quote error categories: an exact-string table
/// is checked first, then regex patterns, then the generic fallback.
use crate::errors::QuoteError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Provider messages matched verbatim
const EXACT_MESSAGES: &[(&str, fn() -> QuoteError)] = &[
    ("ESTIMATED_LOSS_GREATER_THAN_MAX_IMPACT", || QuoteError::PriceImpactTooHigh),
    ("No routes found with enough liquidity", || QuoteError::InsufficientLiquidity),
    ("NoLiquidity", || QuoteError::InsufficientLiquidity),
    ("SellAmountDoesNotCoverFee", || QuoteError::AmountTooSmall),
];

/// Provider messages matched by pattern
static REGEX_MESSAGES: Lazy<Vec<(Regex, fn() -> QuoteError)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)amount.{0,40}too small").unwrap(),
            || QuoteError::AmountTooSmall,
        ),
        (
            Regex::new(r"(?i)(insufficient|not enough) liquidity").unwrap(),
            || QuoteError::InsufficientLiquidity,
        ),
        (
            Regex::new(r"(?i)price impact").unwrap(),
            || QuoteError::PriceImpactTooHigh,
        ),
    ]
});

/// Normalize a raw provider error message into a quote error category.
/// Unrecognized payloads become `Generic` carrying the original message for
/// diagnostics; its user message is the standard fetch-failure string.
pub fn normalize_provider_error(message: &str) -> QuoteError {
    let trimmed = message.trim();

    for (exact, build) in EXACT_MESSAGES {
        if trimmed == *exact {
            return build();
        }
    }

    for (pattern, build) in REGEX_MESSAGES.iter() {
        if pattern.is_match(trimmed) {
            return build();
        }
    }

    QuoteError::Generic {
        message: trimmed.to_string(),
    }
}
