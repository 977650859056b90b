use std::convert::TryFrom;

use anchor_lang::prelude::*;
use solana_maths::{Decimal, Rate, TryMul, TrySub};
use spl_math::precise_number::PreciseNumber;

use crate::errors::ErrorCode;

pub const ONE_AS_BPS: u64 = 10_000;

pub const INITIAL_EXCHANGE_RATE: u64 = 1;

/// Share price of a wrapped position, expressed as `underlying` units backing `shares`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExchangeRate {
    pub underlying: u64,
    pub shares: u64,
}

impl ExchangeRate {
    pub fn new(underlying: u64, shares: u64) -> Self {
        Self { underlying, shares }
    }

    pub fn underlying_to_shares(&self, amount: u64) -> Option<u64> {
        match self.underlying {
            0 => INITIAL_EXCHANGE_RATE.checked_mul(amount),
            _ => scale(amount, self.shares, self.underlying, false),
        }
    }

    /// Shares backing `amount`, rounded up
    pub fn underlying_to_shares_ceil(&self, amount: u64) -> Option<u64> {
        match self.underlying {
            0 => INITIAL_EXCHANGE_RATE.checked_mul(amount),
            _ => scale(amount, self.shares, self.underlying, true),
        }
    }

    pub fn shares_to_underlying(&self, shares_amount: u64) -> Option<u64> {
        match self.shares {
            0 => INITIAL_EXCHANGE_RATE.checked_mul(shares_amount),
            _ => scale(shares_amount, self.underlying, self.shares, false),
        }
    }
}

/// `amount * numerator / denominator` at full precision
fn scale(amount: u64, numerator: u64, denominator: u64, round_up: bool) -> Option<u64> {
    let amount = PreciseNumber::new(amount as u128)?;
    let numerator = PreciseNumber::new(numerator as u128)?;
    let denominator = PreciseNumber::new(denominator as u128)?;

    let exact = numerator.checked_mul(&amount)?.checked_div(&denominator)?;
    let rounded = if round_up {
        exact.ceiling()?
    } else {
        exact.floor()?
    };

    u64::try_from(rounded.to_imprecise()?).ok()
}

/// `bps` basis points of `amount`, rounded down
pub fn bps_of(amount: u64, bps: u16) -> Result<u64> {
    require!(u64::from(bps) <= ONE_AS_BPS, ErrorCode::InvalidFeeConfig);

    let portion = Rate::from_bips(u64::from(bps))
        .try_mul(amount)
        .and_then(|product| Decimal::from(product).try_floor_u64())?;
    Ok(portion)
}

/// Lowest acceptable output for a conversion quoted at `quote`
pub fn min_amount_out(quote: u64, max_slippage_bps: u16) -> Result<u64> {
    require!(
        u64::from(max_slippage_bps) <= ONE_AS_BPS,
        ErrorCode::InvalidSlippageBound
    );

    let floor = Rate::one()
        .try_sub(Rate::from_bips(u64::from(max_slippage_bps)))?
        .try_mul(quote)
        .and_then(|product| Decimal::from(product).try_floor_u64())?;
    Ok(floor)
}

/// Values `amount` of one asset in units of another using oracle prices quoted in a
/// common denomination, rescaling between the two assets' decimals
pub fn convert_value(
    amount: u64,
    price_in: u64,
    decimals_in: u8,
    price_out: u64,
    decimals_out: u8,
) -> Option<u64> {
    let scale_in = 10u128.checked_pow(u32::from(decimals_in))?;
    let scale_out = 10u128.checked_pow(u32::from(decimals_out))?;

    let numerator = PreciseNumber::new(amount as u128)?
        .checked_mul(&PreciseNumber::new(price_in as u128)?)?
        .checked_mul(&PreciseNumber::new(scale_out)?)?;
    let denominator =
        PreciseNumber::new(price_out as u128)?.checked_mul(&PreciseNumber::new(scale_in)?)?;

    let converted = numerator
        .checked_div(&denominator)?
        .floor()?
        .to_imprecise()?;

    u64::try_from(converted).ok()
}

/// Integer division rounding halves away from zero
pub fn div_round_half_up(numerator: u128, denominator: u128) -> Option<u128> {
    numerator
        .checked_add(denominator / 2)?
        .checked_div(denominator)
}
