use anchor_lang::prelude::*;

use crate::adapters::{AdapterKind, SharePosition, ShareVenue, TokenAmount, WrappedPositionAdapter};
use crate::errors::ErrorCode;
use crate::math::{bps_of, min_amount_out, ExchangeRate};

/// Liquid staking pool accepting the native asset
pub trait StakePool: ShareVenue {
    /// Fee the pool keeps on native withdrawals
    fn withdrawal_fee_bps(&self) -> u16;
}

/// Holds stake pool tokens; wrapped units are the native value of those tokens
pub struct NativeStakeAdapter {
    native_mint: Pubkey,
    pool_mint: Pubkey,
    pool: Box<dyn StakePool>,
    position: SharePosition,
}

impl NativeStakeAdapter {
    pub fn new(native_mint: Pubkey, pool_mint: Pubkey, pool: Box<dyn StakePool>) -> Self {
        Self {
            native_mint,
            pool_mint,
            pool,
            position: SharePosition::default(),
        }
    }

    pub fn pool_tokens(&self) -> u64 {
        self.position.shares()
    }

    fn quote_pool_tokens(
        &self,
        pool_tokens: u64,
        asset: &Pubkey,
        rate: &ExchangeRate,
    ) -> Result<u64> {
        if *asset == self.native_mint {
            let gross = SharePosition::value_of(pool_tokens, rate)?;
            let fee = bps_of(gross, self.pool.withdrawal_fee_bps())?;
            Ok(gross.checked_sub(fee).ok_or(ErrorCode::MathError)?)
        } else if *asset == self.pool_mint {
            Ok(pool_tokens)
        } else {
            Err(error!(ErrorCode::UnsupportedCollateral))
        }
    }

    fn release(&mut self, pool_tokens: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64> {
        let amount_out = if *asset == self.native_mint {
            self.pool.redeem(pool_tokens)?
        } else if *asset == self.pool_mint {
            pool_tokens
        } else {
            return Err(error!(ErrorCode::UnsupportedCollateral));
        };
        require!(amount_out >= min_amount_out, ErrorCode::SlippageExceeded);

        self.position.remove(pool_tokens)?;
        Ok(amount_out)
    }
}

impl WrappedPositionAdapter for NativeStakeAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::NativeStake
    }

    fn underlying_asset(&self) -> Pubkey {
        self.native_mint
    }

    fn wrapped_asset(&self) -> Pubkey {
        self.pool_mint
    }

    fn wrap(&mut self, amount: u64) -> Result<u64> {
        let minted = self.pool.deposit(amount)?;
        let units = SharePosition::value_of(minted, &self.pool.exchange_rate()?)?;
        self.position.add(minted)?;

        #[cfg(feature = "debug")]
        msg!("Staked {} native for {} pool tokens", amount, minted);

        Ok(units)
    }

    fn deposit_wrapped(&mut self, amount: u64) -> Result<u64> {
        let units = SharePosition::value_of(amount, &self.pool.exchange_rate()?)?;
        self.position.add(amount)?;
        Ok(units)
    }

    fn quote_unwrap(&self, units: u64, asset: &Pubkey) -> Result<u64> {
        let rate = self.pool.exchange_rate()?;
        let pool_tokens = self.position.shares_for(units, &rate)?;
        self.quote_pool_tokens(pool_tokens, asset, &rate)
    }

    fn unwrap(&mut self, units: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64> {
        let pool_tokens = self
            .position
            .shares_for(units, &self.pool.exchange_rate()?)?;
        self.release(pool_tokens, asset, min_amount_out)
    }

    fn harvest(&mut self, units: u64, max_slippage_bps: u16) -> Result<Vec<TokenAmount>> {
        let rate = self.pool.exchange_rate()?;
        let pool_tokens = self.position.surplus_shares_for(units, &rate)?;
        let native_mint = self.native_mint;

        let quote = self.quote_pool_tokens(pool_tokens, &native_mint, &rate)?;
        let amount = self.release(
            pool_tokens,
            &native_mint,
            min_amount_out(quote, max_slippage_bps)?,
        )?;
        Ok(vec![TokenAmount {
            asset: native_mint,
            amount,
        }])
    }

    fn current_balance(&self) -> Result<u64> {
        self.position.value(&self.pool.exchange_rate()?)
    }

    fn harvestable_units(&self, principal: u64) -> Result<u64> {
        self.position
            .harvestable_units(principal, &self.pool.exchange_rate()?)
    }
}
