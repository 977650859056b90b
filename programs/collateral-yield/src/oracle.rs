#[cfg(test)]
use mockall::*;

use anchor_lang::prelude::*;

use crate::errors::ErrorCode;
use crate::math::{convert_value, min_amount_out};

/// Asset prices quoted in one common denomination
#[cfg_attr(test, automock)]
pub trait PriceOracle {
    fn get_asset_price(&self, asset: &Pubkey) -> Result<u64>;
}

/// Fungible token metadata lookup
#[cfg_attr(test, automock)]
pub trait TokenMetadata {
    fn decimals(&self, asset: &Pubkey) -> Result<u8>;
}

/// Expected value of `amount_in` of `asset_in` in units of `asset_out`
pub fn quote_conversion(
    oracle: &dyn PriceOracle,
    metadata: &dyn TokenMetadata,
    asset_in: &Pubkey,
    asset_out: &Pubkey,
    amount_in: u64,
) -> Result<u64> {
    if asset_in == asset_out {
        return Ok(amount_in);
    }
    let decimals_out = metadata.decimals(asset_out)?;
    quote_conversion_into(oracle, metadata, asset_in, asset_out, decimals_out, amount_in)
}

/// `quote_conversion` into an asset whose decimals are already known
pub fn quote_conversion_into(
    oracle: &dyn PriceOracle,
    metadata: &dyn TokenMetadata,
    asset_in: &Pubkey,
    asset_out: &Pubkey,
    decimals_out: u8,
    amount_in: u64,
) -> Result<u64> {
    if asset_in == asset_out {
        return Ok(amount_in);
    }

    let price_in = oracle.get_asset_price(asset_in)?;
    let price_out = oracle.get_asset_price(asset_out)?;
    let decimals_in = metadata.decimals(asset_in)?;

    let quote = convert_value(amount_in, price_in, decimals_in, price_out, decimals_out)
        .ok_or(ErrorCode::MathError)?;
    Ok(quote)
}

/// Minimum acceptable output when converting `amount_in` of `asset_in` into `asset_out`
pub fn min_conversion_out(
    oracle: &dyn PriceOracle,
    metadata: &dyn TokenMetadata,
    asset_in: &Pubkey,
    asset_out: &Pubkey,
    amount_in: u64,
    max_slippage_bps: u16,
) -> Result<u64> {
    let quote = quote_conversion(oracle, metadata, asset_in, asset_out, amount_in)?;
    min_amount_out(quote, max_slippage_bps)
}
