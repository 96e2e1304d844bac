//! Scale-8 fixed-point decimal helpers.
//!
//! All prices, amounts and balances in the exchange are `BigDecimal` values
//! normalized to exactly 8 fractional digits. Multiplication truncates
//! toward zero at scale 8 rather than relying on `BigDecimal`'s own
//! rounding, so the truncation rule is exact and independent of the decimal
//! crate's default rounding behavior.

use crate::error::EngineError;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::str::FromStr;

pub const SCALE: i64 = 8;

fn pow10(exponent: i64) -> BigInt {
    let mut result = BigInt::from(1u32);
    let ten = BigInt::from(10u32);
    for _ in 0..exponent {
        result *= &ten;
    }
    result
}

/// Truncates (rounds toward zero) a decimal to exactly `SCALE` fractional
/// digits, independent of the value's original scale.
pub fn truncate8(value: &BigDecimal) -> BigDecimal {
    let (digits, scale) = value.as_bigint_and_exponent();
    if scale <= SCALE {
        let widened = digits * pow10(SCALE - scale);
        BigDecimal::new(widened, SCALE)
    } else {
        let narrowed = digits / pow10(scale - SCALE);
        BigDecimal::new(narrowed, SCALE)
    }
}

/// Multiplies then truncates to scale 8.
pub fn mul_trunc8(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    truncate8(&(a * b))
}

pub fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

pub fn is_positive(value: &BigDecimal) -> bool {
    value > &zero()
}

/// Parses a decimal from a wire string. The only failure mode here is
/// malformed (non-numeric) input.
pub fn parse(value: &str) -> Result<BigDecimal, EngineError> {
    BigDecimal::from_str(value)
        .map(|d| truncate8(&d))
        .map_err(|_| EngineError::Arithmetic(format!("'{value}' is not a valid decimal")))
}

/// Renders a decimal as a string with exactly 8 fractional digits, the
/// canonical wire format for all decimal fields.
pub fn format8(value: &BigDecimal) -> String {
    truncate8(value).to_string()
}

/// The fixed 1.5% commission charged to the buyer on the executed notional.
pub fn commission_rate() -> BigDecimal {
    BigDecimal::from_str("0.015").expect("0.015 is a valid literal")
}

pub fn commission_on(notional: &BigDecimal) -> BigDecimal {
    mul_trunc8(notional, &commission_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_toward_zero_not_round() {
        let v = BigDecimal::from_str("1.999999995").unwrap();
        assert_eq!(truncate8(&v).to_string(), "1.99999999");
    }

    #[test]
    fn truncate_widens_short_scale() {
        let v = BigDecimal::from_str("50000").unwrap();
        assert_eq!(truncate8(&v).to_string(), "50000.00000000");
    }

    #[test]
    fn mul_trunc_matches_scenario_one() {
        let price = BigDecimal::from_str("50000").unwrap();
        let amount = BigDecimal::from_str("1").unwrap();
        let notional = mul_trunc8(&price, &amount);
        assert_eq!(notional.to_string(), "50000.00000000");
        let commission = commission_on(&notional);
        assert_eq!(commission.to_string(), "750.00000000");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("not-a-number").is_err());
        assert!(parse("50000.00000000").is_ok());
    }
}
