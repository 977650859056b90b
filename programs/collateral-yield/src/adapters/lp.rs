use anchor_lang::prelude::*;

use crate::adapters::{AdapterKind, SharePosition, ShareVenue, TokenAmount, WrappedPositionAdapter};
use crate::errors::ErrorCode;
use crate::math::{min_amount_out, ExchangeRate};

/// Farm that stakes LP tokens for receipt shares and pays emissions on top
pub trait LiquidityFarm: ShareVenue {
    /// Claims every emission token accrued to the position
    fn claim_rewards(&mut self) -> Result<Vec<TokenAmount>>;
}

/// Two-sided liquidity pool the LP token belongs to
pub trait LiquidityPool {
    fn token_a(&self) -> Pubkey;

    fn token_b(&self) -> Pubkey;

    fn quote_remove_liquidity(&self, lp_amount: u64) -> Result<(u64, u64)>;

    fn remove_liquidity(&mut self, lp_amount: u64, min_a: u64, min_b: u64) -> Result<(u64, u64)>;
}

/// Adds `amount` of `asset` to `proceeds`, folding repeats into one entry
fn push_proceeds(proceeds: &mut Vec<TokenAmount>, asset: Pubkey, amount: u64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    match proceeds.iter_mut().find(|p| p.asset == asset) {
        Some(existing) => {
            existing.amount = existing
                .amount
                .checked_add(amount)
                .ok_or(ErrorCode::OverflowError)?;
        }
        None => proceeds.push(TokenAmount { asset, amount }),
    }
    Ok(())
}

/// Holds farm receipt shares for an LP token. Wrapped units are LP tokens, so the
/// farm compounding trading fees back into LP is what makes units grow.
pub struct LiquidityPoolAdapter {
    lp_mint: Pubkey,
    receipt_mint: Pubkey,
    farm: Box<dyn LiquidityFarm>,
    pool: Box<dyn LiquidityPool>,
    position: SharePosition,
}

impl std::fmt::Debug for LiquidityPoolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiquidityPoolAdapter")
            .field("lp_mint", &self.lp_mint)
            .field("receipt_mint", &self.receipt_mint)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl LiquidityPoolAdapter {
    pub fn new(
        lp_mint: Pubkey,
        receipt_mint: Pubkey,
        farm: Box<dyn LiquidityFarm>,
        pool: Box<dyn LiquidityPool>,
    ) -> Self {
        Self {
            lp_mint,
            receipt_mint,
            farm,
            pool,
            position: SharePosition::default(),
        }
    }

    fn quote_shares(&self, shares: u64, asset: &Pubkey, rate: &ExchangeRate) -> Result<u64> {
        if *asset == self.lp_mint {
            SharePosition::value_of(shares, rate)
        } else if *asset == self.receipt_mint {
            Ok(shares)
        } else {
            Err(error!(ErrorCode::UnsupportedCollateral))
        }
    }

    fn release(&mut self, shares: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64> {
        let amount_out = if *asset == self.lp_mint {
            self.farm.redeem(shares)?
        } else if *asset == self.receipt_mint {
            shares
        } else {
            return Err(error!(ErrorCode::UnsupportedCollateral));
        };
        require!(amount_out >= min_amount_out, ErrorCode::SlippageExceeded);

        self.position.remove(shares)?;
        Ok(amount_out)
    }
}

impl WrappedPositionAdapter for LiquidityPoolAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::LiquidityPool
    }

    fn underlying_asset(&self) -> Pubkey {
        self.lp_mint
    }

    fn wrapped_asset(&self) -> Pubkey {
        self.receipt_mint
    }

    fn wrap(&mut self, amount: u64) -> Result<u64> {
        let shares = self.farm.deposit(amount)?;
        let units = SharePosition::value_of(shares, &self.farm.exchange_rate()?)?;
        self.position.add(shares)?;
        Ok(units)
    }

    fn deposit_wrapped(&mut self, amount: u64) -> Result<u64> {
        let units = SharePosition::value_of(amount, &self.farm.exchange_rate()?)?;
        self.position.add(amount)?;
        Ok(units)
    }

    fn quote_unwrap(&self, units: u64, asset: &Pubkey) -> Result<u64> {
        let rate = self.farm.exchange_rate()?;
        let shares = self.position.shares_for(units, &rate)?;
        self.quote_shares(shares, asset, &rate)
    }

    fn unwrap(&mut self, units: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64> {
        let shares = self
            .position
            .shares_for(units, &self.farm.exchange_rate()?)?;
        self.release(shares, asset, min_amount_out)
    }

    /// Pulls surplus LP out of the farm, breaks it into the pool's pair tokens and
    /// claims outstanding emissions
    fn harvest(&mut self, units: u64, max_slippage_bps: u16) -> Result<Vec<TokenAmount>> {
        let mut proceeds = Vec::new();

        if units > 0 {
            let rate = self.farm.exchange_rate()?;
            let shares = self.position.surplus_shares_for(units, &rate)?;
            let lp_mint = self.lp_mint;
            let quote = self.quote_shares(shares, &lp_mint, &rate)?;
            let min_lp = min_amount_out(quote, max_slippage_bps)?;
            let lp_amount = self.release(shares, &lp_mint, min_lp)?;

            let (quote_a, quote_b) = self.pool.quote_remove_liquidity(lp_amount)?;
            let (amount_a, amount_b) = self.pool.remove_liquidity(
                lp_amount,
                min_amount_out(quote_a, max_slippage_bps)?,
                min_amount_out(quote_b, max_slippage_bps)?,
            )?;
            push_proceeds(&mut proceeds, self.pool.token_a(), amount_a)?;
            push_proceeds(&mut proceeds, self.pool.token_b(), amount_b)?;
        }

        for reward in self.farm.claim_rewards()? {
            push_proceeds(&mut proceeds, reward.asset, reward.amount)?;
        }

        #[cfg(feature = "debug")]
        msg!("Harvested {} reward assets from farm", proceeds.len());

        Ok(proceeds)
    }

    fn current_balance(&self) -> Result<u64> {
        self.position.value(&self.farm.exchange_rate()?)
    }

    fn harvestable_units(&self, principal: u64) -> Result<u64> {
        self.position
            .harvestable_units(principal, &self.farm.exchange_rate()?)
    }
}
