//! amount.rs - Constant-product (x * y = k) swap math
//!
//! All amounts are `Decimal`; floating point is never used for amounts.
//! The output is evaluated as `reserve_to * eff / (reserve_from + eff)`,
//! which equals `reserve_to - k / (reserve_from + eff)` but never forms
//! `k`, so 18-decimal reserves stay inside the 96-bit mantissa.

use rust_decimal::Decimal;

use crate::error::{Result, RouterError};
use crate::graph::SwapGraph;
use crate::models::TokenAddress;

/// KLAYswap trading fee (0.3%)
pub const DEFAULT_FEE_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 3);

/// Reject fee rates outside `[0, 1)`
pub fn validate_fee_rate(fee_rate: Decimal) -> Result<()> {
    if fee_rate.is_sign_negative() || fee_rate >= Decimal::ONE {
        return Err(RouterError::InvalidFeeRate(fee_rate));
    }
    Ok(())
}

/// Output of swapping `amount_in` through a single pool.
///
/// A pool left with no source-side reserve after the trade is treated as
/// having no liquidity and yields zero.
pub fn swap_output(
    reserve_from: Decimal,
    reserve_to: Decimal,
    amount_in: Decimal,
    fee_rate: Decimal,
) -> Result<Decimal> {
    let effective_in = amount_in
        .checked_mul(Decimal::ONE - fee_rate)
        .ok_or(RouterError::AmountOverflow)?;
    let new_reserve_from = reserve_from
        .checked_add(effective_in)
        .ok_or(RouterError::AmountOverflow)?;

    if new_reserve_from.is_zero() {
        log::trace!("zero liquidity hop: reserve_from={} amount_in={}", reserve_from, amount_in);
        return Ok(Decimal::ZERO);
    }

    // Multiply first for precision; divide first only when the product overflows
    let output = match reserve_to
        .checked_mul(effective_in)
        .and_then(|product| product.checked_div(new_reserve_from))
    {
        Some(output) => output,
        None => effective_in
            .checked_div(new_reserve_from)
            .and_then(|share| reserve_to.checked_mul(share))
            .ok_or(RouterError::AmountOverflow)?,
    };

    Ok(output.max(Decimal::ZERO))
}

/// Smallest input that yields at least `amount_out` from a single pool.
///
/// Returns `None` when the pool cannot pay out that much.
pub fn swap_input(
    reserve_from: Decimal,
    reserve_to: Decimal,
    amount_out: Decimal,
    fee_rate: Decimal,
) -> Result<Option<Decimal>> {
    if amount_out.is_zero() {
        return Ok(Some(Decimal::ZERO));
    }
    if amount_out >= reserve_to || fee_rate >= Decimal::ONE {
        return Ok(None);
    }

    // eff = reserve_from * out / (reserve_to - out); in = eff / (1 - fee)
    let remaining = reserve_to - amount_out;
    let effective_in = reserve_from
        .checked_mul(
            amount_out
                .checked_div(remaining)
                .ok_or(RouterError::AmountOverflow)?,
        )
        .ok_or(RouterError::AmountOverflow)?;
    let amount_in = effective_in
        .checked_div(Decimal::ONE - fee_rate)
        .ok_or(RouterError::AmountOverflow)?;

    Ok(Some(amount_in))
}

/// Chain `swap_output` along `path`, feeding each hop's output into the next.
///
/// Consecutive tokens with no edge between them produce zero.
pub fn path_output(
    graph: &SwapGraph,
    path: &[TokenAddress],
    amount_in: Decimal,
    fee_rate: Decimal,
) -> Result<Decimal> {
    let mut amount = amount_in;

    for hop in path.windows(2) {
        let edge = match graph.edge(&hop[0], &hop[1]) {
            Some(edge) => edge,
            None => return Ok(Decimal::ZERO),
        };
        amount = swap_output(edge.reserve_self, edge.reserve_neighbor, amount, fee_rate)?;
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_fee_rate() {
        assert_eq!(DEFAULT_FEE_RATE, dec!(0.003));
    }

    #[test]
    fn test_single_hop_exact() {
        // eff = 99.7, new reserve = 1099.7, out = 1000 - 1_000_000 / 1099.7
        let output = swap_output(dec!(1000), dec!(1000), dec!(100), dec!(0.003)).unwrap();
        assert!((output - dec!(90.661089388014913158134)).abs() < dec!(0.000000000001));
    }

    #[test]
    fn test_matches_invariant_form() {
        let (x, y, a) = (dec!(5000), dec!(12000), dec!(250));
        let eff = a * dec!(0.997);
        let expected = y - (x * y) / (x + eff);

        let output = swap_output(x, y, a, dec!(0.003)).unwrap();
        assert!((output - expected).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_zero_fee() {
        let output = swap_output(dec!(100), dec!(100), dec!(100), Decimal::ZERO).unwrap();
        assert_eq!(output, dec!(50));
    }

    #[test]
    fn test_zero_liquidity_yields_zero() {
        // Empty pool and nothing sent in: denominator is zero
        let output = swap_output(Decimal::ZERO, dec!(1000), Decimal::ZERO, dec!(0.003)).unwrap();
        assert_eq!(output, Decimal::ZERO);

        // Destination side drained
        let output = swap_output(dec!(1000), Decimal::ZERO, dec!(10), dec!(0.003)).unwrap();
        assert_eq!(output, Decimal::ZERO);
    }

    #[test]
    fn test_empty_source_reserve_takes_everything() {
        // Nothing on the source side: any input buys the whole other side
        let output = swap_output(Decimal::ZERO, dec!(1000), dec!(1), dec!(0.003)).unwrap();
        assert_eq!(output, dec!(1000));
    }

    #[test]
    fn test_wei_scale_reserves_do_not_overflow() {
        // 5M tokens a side at 18 decimals; k alone would be 2.5e49
        let reserve = dec!(5000000000000000000000000);
        let input = dec!(1000000000000000000);

        let output = swap_output(reserve, reserve, input, dec!(0.003)).unwrap();
        assert!(output > dec!(996000000000000000));
        assert!(output < input);
    }

    #[test]
    fn test_tiny_input_against_deep_pool_keeps_precision() {
        // eff / (x + eff) is below 1e-28 here and would round to a whole unit
        let output = swap_output(dec!(10000000000000000000000000000), dec!(70000000000000000000000000000), dec!(1), dec!(0.003)).unwrap();
        assert!((output - dec!(6.979)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_swap_input_inverts_output() {
        let (x, y) = (dec!(1000), dec!(1000));
        let wanted = dec!(90);

        let needed = swap_input(x, y, wanted, dec!(0.003)).unwrap().unwrap();
        let got = swap_output(x, y, needed, dec!(0.003)).unwrap();
        assert!((got - wanted).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_swap_input_beyond_reserve() {
        assert_eq!(swap_input(dec!(1000), dec!(1000), dec!(1000), dec!(0.003)).unwrap(), None);
        assert_eq!(swap_input(dec!(1000), dec!(1000), Decimal::ZERO, dec!(0.003)).unwrap(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_validate_fee_rate() {
        assert!(validate_fee_rate(dec!(0.003)).is_ok());
        assert!(validate_fee_rate(Decimal::ZERO).is_ok());
        assert!(validate_fee_rate(Decimal::ONE).is_err());
        assert!(validate_fee_rate(dec!(-0.1)).is_err());
    }
}
