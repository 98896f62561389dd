/// Transaction assembly helpers shared across providers
///
/// A quote is only executable against the exact request it was derived from;
/// `validate_quote_binding` enforces that before any provider build call.
/// Slippage tolerance is applied here, at build time, never at quote time:
/// displayed rates stay raw, executed transactions carry bounds.
use super::config::{BASE_FEE_CLAIMER, DEFAULT_FEE_CLAIMER};
use super::{math, RateQuote, SwapRequest, SwapSide};
use crate::errors::SwapdeskError;

/// Executable bounds derived from a quote plus the request's slippage
/// tolerance. The fixed side of the swap passes through unchanged; only the
/// estimated side gets bounded.
#[derive(Debug, Clone, PartialEq)]
pub struct SlippageBounds {
    /// Most input the transaction may spend
    pub max_input: String,
    /// Least output the transaction must deliver
    pub min_output: String,
}

/// Apply the request's slippage tolerance to the quote's estimated side.
/// Sell fixes the input, so only the output gets a minimum; buy fixes the
/// output, so only the input gets a maximum.
pub fn slippage_bounds(
    request: &SwapRequest,
    quote: &RateQuote,
) -> Result<SlippageBounds, SwapdeskError> {
    match request.side {
        SwapSide::Sell => Ok(SlippageBounds {
            max_input: quote.src_amount.clone(),
            min_output: math::min_output_with_slippage(
                &quote.dest_amount,
                request.max_slippage_pct,
                quote.dest_decimals,
            )?,
        }),
        SwapSide::Buy => Ok(SlippageBounds {
            max_input: math::max_input_with_slippage(
                &quote.src_amount,
                request.max_slippage_pct,
                quote.src_decimals,
            )?,
            min_output: quote.dest_amount.clone(),
        }),
    }
}

/// Fee-claimer contract receiving the positive slippage surplus. One
/// deployment covers every chain except Base, which has its own.
pub fn fee_claimer_for_chain(chain_id: u64) -> &'static str {
    match chain_id {
        super::config::BASE => BASE_FEE_CLAIMER,
        _ => DEFAULT_FEE_CLAIMER,
    }
}

/// Reject a build attempt when the quote does not belong to the request.
/// Token addresses compare case-insensitively; the fixed-side amount must
/// match the request exactly.
pub fn validate_quote_binding(
    request: &SwapRequest,
    quote: &RateQuote,
) -> Result<(), SwapdeskError> {
    if quote.provider != quote.route.provider() {
        return Err(SwapdeskError::validation_error(
            "quote.provider",
            "provider tag does not match route data",
        ));
    }
    if !quote.src_token.eq_ignore_ascii_case(&request.src_token) {
        return Err(SwapdeskError::validation_error(
            "quote.src_token",
            format!("quote is for {}, request is for {}", quote.src_token, request.src_token),
        ));
    }
    if !quote.dest_token.eq_ignore_ascii_case(&request.dest_token) {
        return Err(SwapdeskError::validation_error(
            "quote.dest_token",
            format!("quote is for {}, request is for {}", quote.dest_token, request.dest_token),
        ));
    }
    if quote.side != request.side {
        return Err(SwapdeskError::validation_error(
            "quote.side",
            format!(
                "quote is {}, request is {}",
                quote.side.as_str(),
                request.side.as_str()
            ),
        ));
    }

    // The fixed side must carry the requested amount; the estimated side is
    // whatever the provider returned
    let (fixed, label) = match request.side {
        SwapSide::Sell => (&quote.src_amount, "quote.src_amount"),
        SwapSide::Buy => (&quote.dest_amount, "quote.dest_amount"),
    };
    if !amounts_equal(fixed, &request.amount)? {
        return Err(SwapdeskError::validation_error(
            label,
            format!("quote amount {} does not match requested {}", fixed, request.amount),
        ));
    }

    Ok(())
}

fn amounts_equal(a: &str, b: &str) -> Result<bool, SwapdeskError> {
    use rust_decimal::Decimal;
    use std::str::FromStr;
    let a = Decimal::from_str(a.trim())
        .map_err(|e| SwapdeskError::invalid_amount(a, e.to_string()))?;
    let b = Decimal::from_str(b.trim())
        .map_err(|e| SwapdeskError::invalid_amount(b, e.to_string()))?;
    Ok(a == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swaps::{ProviderId, RouteData, SwapKind};
    use serde_json::json;

    const DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    fn request(side: SwapSide) -> SwapRequest {
        SwapRequest {
            chain_id: 1,
            src_token: DAI.to_string(),
            src_decimals: 18,
            dest_token: USDC.to_string(),
            dest_decimals: 6,
            amount: "100".to_string(),
            side,
            user_address: None,
            max_slippage_pct: 1.0,
            use_flashloan: false,
            swap_kind: SwapKind::Swap,
        }
    }

    fn quote(side: SwapSide) -> RateQuote {
        RateQuote {
            provider: ProviderId::Paraswap,
            src_token: DAI.to_string(),
            dest_token: USDC.to_string(),
            src_amount: "100".to_string(),
            dest_amount: "99.5".to_string(),
            src_usd: "100.00".to_string(),
            dest_usd: "99.48".to_string(),
            src_decimals: 18,
            dest_decimals: 6,
            side,
            route: RouteData::Paraswap(json!({"srcAmount": "100000000000000000000"})),
        }
    }

    #[test]
    fn sell_bounds_floor_the_output_only() {
        let bounds = slippage_bounds(&request(SwapSide::Sell), &quote(SwapSide::Sell)).unwrap();
        assert_eq!(bounds.max_input, "100");
        assert_eq!(bounds.min_output, "98.505");
    }

    #[test]
    fn buy_bounds_cap_the_input_only() {
        let mut req = request(SwapSide::Buy);
        req.amount = "99.5".to_string();
        let bounds = slippage_bounds(&req, &quote(SwapSide::Buy)).unwrap();
        assert_eq!(bounds.max_input, "101");
        assert_eq!(bounds.min_output, "99.5");
    }

    #[test]
    fn zero_slippage_keeps_quote_amounts() {
        let mut req = request(SwapSide::Sell);
        req.max_slippage_pct = 0.0;
        let bounds = slippage_bounds(&req, &quote(SwapSide::Sell)).unwrap();
        assert_eq!(bounds.min_output, "99.5");
    }

    #[test]
    fn binding_accepts_matching_request_and_quote() {
        assert!(validate_quote_binding(&request(SwapSide::Sell), &quote(SwapSide::Sell)).is_ok());
    }

    #[test]
    fn binding_ignores_token_address_case() {
        let mut req = request(SwapSide::Sell);
        req.src_token = DAI.to_uppercase();
        assert!(validate_quote_binding(&req, &quote(SwapSide::Sell)).is_ok());
    }

    #[test]
    fn binding_rejects_token_mismatch() {
        let mut req = request(SwapSide::Sell);
        req.dest_token = "0x0000000000000000000000000000000000000001".to_string();
        assert!(validate_quote_binding(&req, &quote(SwapSide::Sell)).is_err());
    }

    #[test]
    fn binding_rejects_side_mismatch() {
        assert!(validate_quote_binding(&request(SwapSide::Buy), &quote(SwapSide::Sell)).is_err());
    }

    #[test]
    fn binding_rejects_stale_fixed_amount() {
        let mut req = request(SwapSide::Sell);
        req.amount = "250".to_string();
        assert!(validate_quote_binding(&req, &quote(SwapSide::Sell)).is_err());
    }

    #[test]
    fn binding_rejects_mislabeled_route_data() {
        let mut q = quote(SwapSide::Sell);
        q.provider = ProviderId::Cow;
        assert!(validate_quote_binding(&request(SwapSide::Sell), &q).is_err());
    }

    #[test]
    fn fee_claimer_switches_on_base() {
        assert_eq!(fee_claimer_for_chain(8453), BASE_FEE_CLAIMER);
        assert_eq!(fee_claimer_for_chain(1), DEFAULT_FEE_CLAIMER);
        assert_eq!(fee_claimer_for_chain(42161), DEFAULT_FEE_CLAIMER);
    }
}
