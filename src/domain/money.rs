//! Fixed-point money math in 6-decimal USD-stable units.
//!
//! On-chain amounts (USDC) arrive as integers scaled by 10^6 and stay in
//! integer form until an order size or price is needed, so proportional
//! splits never lose precision to floating point.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

/// Decimal places of the USD-stable settlement unit.
pub const USDC_DECIMALS: u32 = 6;

/// Scale factor for one whole settlement unit (10^6).
pub const UNIT: u64 = 1_000_000;

/// Basis point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Exchange order sizes are quoted to two decimal places.
const SIZE_DECIMALS: u32 = 2;

/// Proportional allocation of `net_amount` to a leg, floored.
///
/// `floor(net_amount * notional_bps / 10000)` in full-width integer
/// arithmetic. The sum over all legs of a strategy never exceeds
/// `net_amount`; the rounding remainder stays unallocated.
#[must_use]
pub fn leg_quote(net_amount: U256, notional_bps: u16) -> U256 {
    net_amount * U256::from(notional_bps) / U256::from(BPS_DENOMINATOR)
}

/// Convert a basis-point price bound to an exchange price.
///
/// `6000` bps becomes `0.6000`.
#[must_use]
pub fn bps_to_price(bps: u16) -> Decimal {
    Decimal::new(i64::from(bps), 4)
}

/// Convert an integer amount in settlement units to a decimal USD value.
pub fn units_to_decimal(amount: U256) -> Result<Decimal> {
    let units = u64::try_from(amount)
        .map_err(|_| Error::Parse(format!("amount {amount} exceeds representable range")))?;
    Ok(Decimal::from_i128_with_scale(
        i128::from(units),
        USDC_DECIMALS,
    ))
}

/// Convert a non-negative decimal USD value to integer settlement units,
/// truncating sub-unit dust.
#[must_use]
pub fn decimal_to_units(value: Decimal) -> U256 {
    let scaled = (value * Decimal::from(UNIT)).trunc();
    match scaled.to_u128() {
        Some(units) => U256::from(units),
        None => U256::ZERO,
    }
}

/// Order size for a quote amount at a limit price, truncated to the
/// exchange's size granularity.
pub fn order_size(quote_amount: U256, price: Decimal) -> Result<Decimal> {
    let quote = units_to_decimal(quote_amount)?;
    Ok((quote / price).round_dp_with_strategy(SIZE_DECIMALS, RoundingStrategy::ToZero))
}

/// Payout factor per 1.000000 unit invested, in settlement units.
///
/// Zero invested yields a zero factor rather than dividing.
#[must_use]
pub fn payout_per_unit(total_payout: U256, net_invested: U256) -> U256 {
    if net_invested.is_zero() {
        return U256::ZERO;
    }
    total_payout * U256::from(UNIT) / net_invested
}
