/// Pure quote math - slippage bounds, approval margins, unit conversion
///
/// All public amounts in this crate are human-unit decimal strings; provider
/// clients convert to base units at the HTTP boundary with the helpers here.
/// Fixed-point decimals keep the slippage guarantees exact at the displayed
/// precision, which f64 cannot.
use crate::errors::SwapdeskError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// ERC20 decimals never exceed this in practice; guards the 10^n tables
const MAX_DECIMALS: u32 = 18;

fn parse_amount(amount: &str) -> Result<Decimal, SwapdeskError> {
    let value = Decimal::from_str(amount.trim())
        .map_err(|e| SwapdeskError::invalid_amount(amount, e.to_string()))?;
    if value.is_sign_negative() {
        return Err(SwapdeskError::invalid_amount(amount, "amount must not be negative"));
    }
    Ok(value)
}

fn parse_percent(pct: f64, field: &str) -> Result<Decimal, SwapdeskError> {
    if !(0.0..100.0).contains(&pct) {
        return Err(SwapdeskError::validation_error(
            field,
            format!("must be in [0, 100), got {}", pct),
        ));
    }
    Decimal::from_f64_retain(pct)
        .ok_or_else(|| SwapdeskError::validation_error(field, "not representable as a decimal"))
}

fn pow10(decimals: u32) -> Result<Decimal, SwapdeskError> {
    if decimals > MAX_DECIMALS {
        return Err(SwapdeskError::validation_error(
            "decimals",
            format!("must be <= {}, got {}", MAX_DECIMALS, decimals),
        ));
    }
    Ok(Decimal::from(10u64.pow(decimals)))
}

/// Minimum acceptable output for an exact-in swap: `amount * (1 - slippage%)`,
/// rounded down to the asset's decimals. `"0"` passes through unchanged.
pub fn min_output_with_slippage(
    amount: &str,
    slippage_pct: f64,
    decimals: u32,
) -> Result<String, SwapdeskError> {
    let value = parse_amount(amount)?;
    if value.is_zero() {
        return Ok("0".to_string());
    }
    let slippage = parse_percent(slippage_pct, "slippage_pct")?;
    let factor = Decimal::ONE - slippage / Decimal::from(100u64);
    let bounded = (value * factor)
        .round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
        .normalize();
    Ok(bounded.to_string())
}

/// Maximum acceptable input for an exact-out swap: `amount * (1 + slippage%)`,
/// rounded up to the asset's decimals. `"0"` passes through unchanged.
pub fn max_input_with_slippage(
    amount: &str,
    slippage_pct: f64,
    decimals: u32,
) -> Result<String, SwapdeskError> {
    let value = parse_amount(amount)?;
    if value.is_zero() {
        return Ok("0".to_string());
    }
    let slippage = parse_percent(slippage_pct, "slippage_pct")?;
    let factor = Decimal::ONE + slippage / Decimal::from(100u64);
    let bounded = (value * factor)
        .round_dp_with_strategy(decimals, RoundingStrategy::AwayFromZero)
        .normalize();
    Ok(bounded.to_string())
}

/// Approval amount with a safety margin, so an interest-accruing balance does
/// not immediately exceed a previously signed approval.
pub fn margined_approval_amount(
    amount: &str,
    decimals: u32,
    margin_pct: f64,
) -> Result<String, SwapdeskError> {
    let value = parse_amount(amount)?;
    if value.is_zero() {
        return Ok("0".to_string());
    }
    let margin = parse_percent(margin_pct, "margin_pct")?;
    let factor = Decimal::ONE + margin / Decimal::from(100u64);
    let margined = (value * factor)
        .round_dp_with_strategy(decimals, RoundingStrategy::AwayFromZero)
        .normalize();
    Ok(margined.to_string())
}

/// Convert a human-unit amount to an integer base-unit string (truncating
/// precision beyond the asset's decimals).
pub fn to_base_units(amount: &str, decimals: u32) -> Result<String, SwapdeskError> {
    let value = parse_amount(amount)?;
    let scale = pow10(decimals)?;
    let scaled = value
        .checked_mul(scale)
        .ok_or_else(|| SwapdeskError::invalid_amount(amount, "amount too large"))?;
    Ok(scaled.trunc().normalize().to_string())
}

/// Convert an integer base-unit string back to a human-unit decimal string.
pub fn from_base_units(amount: &str, decimals: u32) -> Result<String, SwapdeskError> {
    let value = parse_amount(amount)?;
    let scale = pow10(decimals)?;
    let unscaled = value
        .checked_div(scale)
        .ok_or_else(|| SwapdeskError::invalid_amount(amount, "division overflow"))?;
    Ok(unscaled.normalize().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_passes_through() {
        for slippage in [0.0, 0.5, 1.0, 50.0, 99.9] {
            for decimals in [0, 6, 18] {
                assert_eq!(min_output_with_slippage("0", slippage, decimals).unwrap(), "0");
                assert_eq!(max_input_with_slippage("0", slippage, decimals).unwrap(), "0");
            }
        }
    }

    #[test]
    fn slippage_bounds_hold() {
        let amount = "123.456789";
        for slippage in [0.0, 0.1, 1.0, 5.0, 25.0, 99.0] {
            let min_out: Decimal = min_output_with_slippage(amount, slippage, 6)
                .unwrap()
                .parse()
                .unwrap();
            let max_in: Decimal = max_input_with_slippage(amount, slippage, 6)
                .unwrap()
                .parse()
                .unwrap();
            let original: Decimal = amount.parse().unwrap();
            assert!(min_out <= original, "min_out {} > {}", min_out, original);
            assert!(max_in >= original, "max_in {} < {}", max_in, original);
        }
    }

    #[test]
    fn one_percent_slippage_on_usdc_receipt() {
        // 99.5 USDC at 1% slippage guarantees at least 98.505 USDC
        assert_eq!(min_output_with_slippage("99.5", 1.0, 6).unwrap(), "98.505");
    }

    #[test]
    fn max_input_rounds_up_at_asset_precision() {
        // 100 * 1.01 = 101 exactly; 0.333333 * 1.5% rounds up at 6 decimals
        assert_eq!(max_input_with_slippage("100", 1.0, 6).unwrap(), "101");
        let bumped: Decimal = max_input_with_slippage("0.333333", 1.5, 6)
            .unwrap()
            .parse()
            .unwrap();
        assert!(bumped > "0.333333".parse::<Decimal>().unwrap());
    }

    #[test]
    fn approval_margin_adds_ten_percent() {
        assert_eq!(margined_approval_amount("100", 18, 10.0).unwrap(), "110");
        assert_eq!(margined_approval_amount("0", 18, 10.0).unwrap(), "0");
    }

    #[test]
    fn rejects_out_of_range_slippage() {
        assert!(min_output_with_slippage("1", 100.0, 6).is_err());
        assert!(min_output_with_slippage("1", -1.0, 6).is_err());
        assert!(max_input_with_slippage("1", 250.0, 6).is_err());
    }

    #[test]
    fn rejects_negative_and_malformed_amounts() {
        assert!(min_output_with_slippage("-5", 1.0, 6).is_err());
        assert!(min_output_with_slippage("abc", 1.0, 6).is_err());
    }

    #[test]
    fn base_unit_conversion() {
        assert_eq!(to_base_units("100", 6).unwrap(), "100000000");
        assert_eq!(to_base_units("1.5", 18).unwrap(), "1500000000000000000");
        assert_eq!(from_base_units("98505000", 6).unwrap(), "98.505");
        assert_eq!(from_base_units("0", 18).unwrap(), "0");
    }

    #[test]
    fn base_unit_conversion_truncates_excess_precision() {
        // more fractional digits than the asset carries
        assert_eq!(to_base_units("1.0000005", 6).unwrap(), "1000000");
    }

    #[test]
    fn rejects_excessive_decimals() {
        assert!(to_base_units("1", 30).is_err());
    }
}
