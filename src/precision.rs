//! Fixed-point constants and overflow-checked mul-div.

use crate::errors::Error;
use primitive_types::U256;

/// Scale for prices and dollar-denominated quantities (18 decimals).
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Scale for basis-point-like factors: fees, funding factor (6 decimals).
pub const PRECISION: u128 = 1_000_000;

/// Funding accrues in whole 8-hour windows.
pub const FUNDING_INTERVAL: u64 = 28_800;

/// Oracle lookback window: consider the last `K` rounds when maximising/minimising.
pub const PRICE_LOOKBACK_ROUNDS: usize = 3;

pub const BASIS_POINTS_DIVISOR: u128 = 10_000;

/// `(a * b) / c`, widening through a 256-bit intermediate so the multiply can never
/// silently wrap. Returns `ArithmeticOverflow` if the result doesn't fit back into a
/// `u128`, `DivisionByZero` if `c == 0`.
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, Error> {
    if c == 0 {
        return Err(Error::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    let result = product / U256::from(c);
    result.try_into().map_err(|_| Error::ArithmeticOverflow)
}

/// Signed counterpart used for price-impact and PnL scaling where the caller already
/// knows the sign and passes unsigned magnitudes.
pub fn mul_div_signed(a: i128, b: u128, c: u128) -> Result<i128, Error> {
    let neg = a < 0;
    let magnitude = mul_div(a.unsigned_abs(), b, c)?;
    let signed: i128 = magnitude.try_into().map_err(|_| Error::ArithmeticOverflow)?;
    Ok(if neg { -signed } else { signed })
}

/// `(a * b * c) / d` through a single wide intermediate. Used by the funding
/// accumulator (`fundingRateFactor * reservedAmount * intervals / poolAmount`) so the
/// three-way multiply never wraps before the final divide.
pub fn mul_div3(a: u128, b: u128, c: u128, d: u128) -> Result<u128, Error> {
    if d == 0 {
        return Err(Error::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b) * U256::from(c);
    let result = product / U256::from(d);
    result.try_into().map_err(|_| Error::ArithmeticOverflow)
}

/// `a * b <= c * d` without dividing, so the min-profit-basis-points comparison
/// (`delta * PRECISION <= size * minProfitBasisPoints`) never truncates into a wrong
/// answer near the boundary.
pub fn le_products(a: u128, b: u128, c: u128, d: u128) -> bool {
    U256::from(a) * U256::from(b) <= U256::from(c) * U256::from(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_basic() {
        assert_eq!(mul_div(10, 20, 4).unwrap(), 50);
    }

    #[test]
    fn mul_div_wide_intermediate_does_not_overflow_u128() {
        // a * b alone overflows u128; the u256 intermediate must still divide down fine.
        let a = u128::MAX / 2;
        let b = 4u128;
        let c = 4u128;
        assert_eq!(mul_div(a, b, c).unwrap(), a);
    }

    #[test]
    fn mul_div_rejects_division_by_zero() {
        assert!(matches!(mul_div(1, 1, 0), Err(Error::DivisionByZero)));
    }

    #[test]
    fn mul_div_truncates_toward_zero() {
        assert_eq!(mul_div(7, 1, 2).unwrap(), 3);
    }

    #[test]
    fn mul_div3_basic() {
        assert_eq!(mul_div3(2, 3, 5, 6).unwrap(), 5); // 2*3*5/6 = 5
    }

    #[test]
    fn le_products_boundary() {
        assert!(le_products(2, 3, 1, 6)); // 6 <= 6
        assert!(!le_products(2, 3, 1, 5)); // 6 <= 5 is false
    }
}
