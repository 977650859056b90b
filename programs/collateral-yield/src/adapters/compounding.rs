use std::convert::TryFrom;

use anchor_lang::prelude::*;

use crate::adapters::{AdapterKind, SharePosition, TokenAmount, WrappedPositionAdapter};
use crate::errors::ErrorCode;
use crate::math::{min_amount_out, ExchangeRate, ONE_AS_BPS};

/// Auto-compounding vault whose share price rises as it reinvests
pub trait YieldVault {
    /// Deposits `amount` of the underlying, returning the shares minted
    fn deposit(&mut self, amount: u64) -> Result<u64>;

    /// Burns `shares`, accepting a loss of at most `max_loss_bps` against the share price
    fn withdraw(&mut self, shares: u64, max_loss_bps: u16) -> Result<u64>;

    fn price_per_share(&self) -> Result<ExchangeRate>;
}

/// Loss in basis points that still satisfies `min_amount_out` on a `quote`
fn max_loss_bps(quote: u64, min_amount_out: u64) -> Result<u16> {
    if quote == 0 || min_amount_out >= quote {
        return Ok(0);
    }
    let shortfall = u128::from(quote - min_amount_out);
    let bps = shortfall
        .checked_mul(u128::from(ONE_AS_BPS))
        .and_then(|scaled| scaled.checked_div(u128::from(quote)))
        .ok_or(ErrorCode::MathError)?;
    Ok(u16::try_from(bps).map_err(|_| ErrorCode::OverflowError)?)
}

/// Holds compounding vault shares; wrapped units are the shares' underlying value
pub struct CompoundingVaultAdapter {
    underlying_mint: Pubkey,
    share_mint: Pubkey,
    vault: Box<dyn YieldVault>,
    position: SharePosition,
}

impl CompoundingVaultAdapter {
    pub fn new(underlying_mint: Pubkey, share_mint: Pubkey, vault: Box<dyn YieldVault>) -> Self {
        Self {
            underlying_mint,
            share_mint,
            vault,
            position: SharePosition::default(),
        }
    }

    pub fn shares(&self) -> u64 {
        self.position.shares()
    }

    fn quote_shares(&self, shares: u64, asset: &Pubkey, rate: &ExchangeRate) -> Result<u64> {
        if *asset == self.underlying_mint {
            SharePosition::value_of(shares, rate)
        } else if *asset == self.share_mint {
            Ok(shares)
        } else {
            Err(error!(ErrorCode::UnsupportedCollateral))
        }
    }

    fn release(
        &mut self,
        shares: u64,
        asset: &Pubkey,
        min_amount_out: u64,
        rate: &ExchangeRate,
    ) -> Result<u64> {
        let amount_out = if *asset == self.underlying_mint {
            let quote = SharePosition::value_of(shares, rate)?;
            self.vault
                .withdraw(shares, max_loss_bps(quote, min_amount_out)?)?
        } else if *asset == self.share_mint {
            shares
        } else {
            return Err(error!(ErrorCode::UnsupportedCollateral));
        };
        require!(amount_out >= min_amount_out, ErrorCode::SlippageExceeded);

        self.position.remove(shares)?;
        Ok(amount_out)
    }
}

impl WrappedPositionAdapter for CompoundingVaultAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::CompoundingVault
    }

    fn underlying_asset(&self) -> Pubkey {
        self.underlying_mint
    }

    fn wrapped_asset(&self) -> Pubkey {
        self.share_mint
    }

    fn wrap(&mut self, amount: u64) -> Result<u64> {
        let shares = self.vault.deposit(amount)?;
        let units = SharePosition::value_of(shares, &self.vault.price_per_share()?)?;
        self.position.add(shares)?;
        Ok(units)
    }

    fn deposit_wrapped(&mut self, amount: u64) -> Result<u64> {
        let units = SharePosition::value_of(amount, &self.vault.price_per_share()?)?;
        self.position.add(amount)?;
        Ok(units)
    }

    fn quote_unwrap(&self, units: u64, asset: &Pubkey) -> Result<u64> {
        let rate = self.vault.price_per_share()?;
        let shares = self.position.shares_for(units, &rate)?;
        self.quote_shares(shares, asset, &rate)
    }

    fn unwrap(&mut self, units: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64> {
        let rate = self.vault.price_per_share()?;
        let shares = self.position.shares_for(units, &rate)?;
        self.release(shares, asset, min_amount_out, &rate)
    }

    fn harvest(&mut self, units: u64, max_slippage_bps: u16) -> Result<Vec<TokenAmount>> {
        let rate = self.vault.price_per_share()?;
        let shares = self.position.surplus_shares_for(units, &rate)?;
        let underlying_mint = self.underlying_mint;

        let quote = self.quote_shares(shares, &underlying_mint, &rate)?;
        let min_out = min_amount_out(quote, max_slippage_bps)?;
        let amount = self.release(shares, &underlying_mint, min_out, &rate)?;
        Ok(vec![TokenAmount {
            asset: underlying_mint,
            amount,
        }])
    }

    fn current_balance(&self) -> Result<u64> {
        self.position.value(&self.vault.price_per_share()?)
    }

    fn harvestable_units(&self, principal: u64) -> Result<u64> {
        self.position
            .harvestable_units(principal, &self.vault.price_per_share()?)
    }
}
