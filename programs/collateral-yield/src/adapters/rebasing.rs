use anchor_lang::prelude::*;

use crate::adapters::{AdapterKind, SharePosition, TokenAmount, WrappedPositionAdapter};
use crate::errors::ErrorCode;
use crate::math::{min_amount_out, ExchangeRate};
use crate::swap::{execute_swap, SwapPath, SwapRouter};

/// Token whose balances rebase upward as the protocol behind it earns
pub trait RebasingToken {
    /// Stakes `amount` of the underlying, returning the internal shares minted
    fn submit(&mut self, amount: u64) -> Result<u64>;

    /// Pooled underlying backing all shares
    fn exchange_rate(&self) -> Result<ExchangeRate>;
}

/// Holds a rebasing token. Wrapped units are the rebasing balance itself, so they
/// grow on every rebase. The token has no instant redemption: exits to the
/// underlying go through a swap venue.
pub struct RebasingTokenAdapter {
    underlying_mint: Pubkey,
    rebasing_mint: Pubkey,
    token: Box<dyn RebasingToken>,
    exit_router: Box<dyn SwapRouter>,
    exit_path: SwapPath,
    position: SharePosition,
}

impl std::fmt::Debug for RebasingTokenAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebasingTokenAdapter")
            .field("underlying_mint", &self.underlying_mint)
            .field("rebasing_mint", &self.rebasing_mint)
            .field("exit_path", &self.exit_path)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl RebasingTokenAdapter {
    pub fn try_new(
        underlying_mint: Pubkey,
        rebasing_mint: Pubkey,
        token: Box<dyn RebasingToken>,
        exit_router: Box<dyn SwapRouter>,
        exit_path: SwapPath,
    ) -> Result<Self> {
        exit_path.validate_endpoints(&rebasing_mint, &underlying_mint)?;
        Ok(Self {
            underlying_mint,
            rebasing_mint,
            token,
            exit_router,
            exit_path,
            position: SharePosition::default(),
        })
    }

    fn release(
        &mut self,
        shares: u64,
        asset: &Pubkey,
        min_amount_out: u64,
        rate: &ExchangeRate,
    ) -> Result<u64> {
        let balance_out = SharePosition::value_of(shares, rate)?;

        let amount_out = if *asset == self.rebasing_mint {
            require!(balance_out >= min_amount_out, ErrorCode::SlippageExceeded);
            balance_out
        } else if *asset == self.underlying_mint {
            execute_swap(
                self.exit_router.as_mut(),
                &self.exit_path,
                balance_out,
                min_amount_out,
            )?
        } else {
            return Err(error!(ErrorCode::UnsupportedCollateral));
        };

        self.position.remove(shares)?;

        #[cfg(feature = "debug")]
        msg!("Released {} rebasing units as {}", balance_out, amount_out);

        Ok(amount_out)
    }
}

impl WrappedPositionAdapter for RebasingTokenAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Rebasing
    }

    fn underlying_asset(&self) -> Pubkey {
        self.underlying_mint
    }

    fn wrapped_asset(&self) -> Pubkey {
        self.rebasing_mint
    }

    fn wrap(&mut self, amount: u64) -> Result<u64> {
        let shares = self.token.submit(amount)?;
        let units = SharePosition::value_of(shares, &self.token.exchange_rate()?)?;
        self.position.add(shares)?;
        Ok(units)
    }

    fn deposit_wrapped(&mut self, amount: u64) -> Result<u64> {
        let rate = self.token.exchange_rate()?;
        let shares = rate
            .underlying_to_shares(amount)
            .ok_or(ErrorCode::MathError)?;
        let units = SharePosition::value_of(shares, &rate)?;
        self.position.add(shares)?;
        Ok(units)
    }

    /// The rebasing balance is pegged 1:1 to the underlying
    fn quote_unwrap(&self, units: u64, asset: &Pubkey) -> Result<u64> {
        let rate = self.token.exchange_rate()?;
        let shares = self.position.shares_for(units, &rate)?;
        require!(
            *asset == self.underlying_mint || *asset == self.rebasing_mint,
            ErrorCode::UnsupportedCollateral
        );
        SharePosition::value_of(shares, &rate)
    }

    fn unwrap(&mut self, units: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64> {
        let rate = self.token.exchange_rate()?;
        let shares = self.position.shares_for(units, &rate)?;
        self.release(shares, asset, min_amount_out, &rate)
    }

    fn harvest(&mut self, units: u64, max_slippage_bps: u16) -> Result<Vec<TokenAmount>> {
        let rate = self.token.exchange_rate()?;
        let shares = self.position.surplus_shares_for(units, &rate)?;
        let underlying_mint = self.underlying_mint;

        let quote = SharePosition::value_of(shares, &rate)?;
        let min_out = min_amount_out(quote, max_slippage_bps)?;
        let amount = self.release(shares, &underlying_mint, min_out, &rate)?;
        Ok(vec![TokenAmount {
            asset: underlying_mint,
            amount,
        }])
    }

    fn current_balance(&self) -> Result<u64> {
        self.position.value(&self.token.exchange_rate()?)
    }

    fn harvestable_units(&self, principal: u64) -> Result<u64> {
        self.position
            .harvestable_units(principal, &self.token.exchange_rate()?)
    }
}
