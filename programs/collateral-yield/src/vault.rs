use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::adapters::{TokenAmount, WrappedPositionAdapter};
use crate::distribution::{split_by_borrow_volume, BorrowVolumeSnapshot};
use crate::errors::ErrorCode;
use crate::events::*;
use crate::ledger::ReserveLedger;
use crate::math::{bps_of, min_amount_out};
use crate::oracle::{min_conversion_out, PriceOracle, TokenMetadata};
use crate::state::{Position, VaultConfig, VaultConfigArg, VaultFlags, VaultState, YieldRoute};
use crate::swap::{execute_swap, SwapPath, SwapRouter};
use crate::token::{RewardSink, TokenTransfer};

/// Collaborators a harvest reaches out to
pub struct HarvestContext<'a> {
    pub ledger: &'a mut dyn ReserveLedger,
    pub router: &'a mut dyn SwapRouter,
    pub oracle: &'a dyn PriceOracle,
    pub metadata: &'a dyn TokenMetadata,
    pub transfer: &'a mut dyn TokenTransfer,
    /// Aggregator entry point, required by vaults that forward rewards
    pub reward_sink: Option<&'a mut dyn RewardSink>,
}

/// Owns the wrapped balance of every depositor of one collateral type and
/// separates their principal from the yield it earns
#[derive(Debug)]
pub struct CollateralVault<A: WrappedPositionAdapter> {
    key: Pubkey,
    state: VaultState,
    positions: BTreeMap<Pubkey, Position>,
    adapter: A,
}

fn check_route(adapter: &impl WrappedPositionAdapter, config: &VaultConfig) -> Result<()> {
    if adapter.kind().forwards_rewards() {
        require!(
            matches!(config.yield_route, YieldRoute::ForwardToAggregator { .. }),
            ErrorCode::InvalidVaultConfig
        );
    }
    Ok(())
}

impl<A: WrappedPositionAdapter> CollateralVault<A> {
    pub fn try_new(key: Pubkey, owner: Pubkey, adapter: A, config: VaultConfigArg) -> Result<Self> {
        let config = VaultConfig::new(config)?;
        check_route(&adapter, &config)?;

        let state = VaultState::new(
            owner,
            adapter.underlying_asset(),
            adapter.wrapped_asset(),
            config,
        );
        Ok(Self {
            key,
            state,
            positions: BTreeMap::new(),
            adapter,
        })
    }

    pub fn key(&self) -> Pubkey {
        self.key
    }

    pub fn state(&self) -> &VaultState {
        &self.state
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn position(&self, depositor: &Pubkey) -> Option<&Position> {
        self.positions.get(depositor)
    }

    pub fn principal_of(&self, depositor: &Pubkey) -> u64 {
        self.positions
            .get(depositor)
            .map_or(0, |p| p.principal_wrapped_units)
    }

    pub fn total_principal(&self) -> u64 {
        self.state.total_principal_wrapped_units
    }

    /// Accepts the underlying (wrapping it first) or the wrapped asset as collateral,
    /// returning the wrapped units credited to the depositor
    pub fn deposit_collateral(
        &mut self,
        depositor: &Pubkey,
        asset: &Pubkey,
        amount: u64,
        ledger: &mut dyn ReserveLedger,
        now: i64,
    ) -> Result<u64> {
        self.state.check_not_halted(VaultFlags::HALT_DEPOSITS)?;
        require!(
            self.state.is_supported_asset(asset),
            ErrorCode::UnsupportedCollateral
        );
        require!(amount > 0, ErrorCode::InvalidAmount);

        let units = if *asset == self.state.underlying_asset {
            self.adapter.wrap(amount)?
        } else {
            self.adapter.deposit_wrapped(amount)?
        };
        require!(units > 0, ErrorCode::InvalidAmount);

        let mut position = self
            .positions
            .get(depositor)
            .cloned()
            .unwrap_or_else(|| Position::new(self.key, *depositor));
        position.credit(units, now)?;
        let total_principal = self
            .state
            .total_principal_wrapped_units
            .checked_add(units)
            .ok_or(ErrorCode::OverflowError)?;

        ledger.record_collateral_claim(depositor, &self.state.wrapped_asset, units)?;

        self.positions.insert(*depositor, position);
        self.state.total_principal_wrapped_units = total_principal;

        #[cfg(feature = "debug")]
        msg!("Deposited {} as {} wrapped units", amount, units);

        emit!(DepositCollateralEvent {
            vault: self.key,
            depositor: *depositor,
            asset: *asset,
            amount,
            wrapped_units: units,
        });

        Ok(units)
    }

    /// Releases `units` of the depositor's principal as `asset` to `recipient`
    #[allow(clippy::too_many_arguments)]
    pub fn withdraw_collateral(
        &mut self,
        depositor: &Pubkey,
        asset: &Pubkey,
        units: u64,
        max_slippage_bps: u16,
        recipient: &Pubkey,
        ledger: &mut dyn ReserveLedger,
        transfer: &mut dyn TokenTransfer,
    ) -> Result<u64> {
        self.state.check_not_halted(VaultFlags::HALT_WITHDRAWALS)?;
        require!(
            self.state.is_supported_asset(asset),
            ErrorCode::UnsupportedCollateral
        );
        require!(units > 0, ErrorCode::InvalidAmount);

        let mut position = self
            .positions
            .get(depositor)
            .cloned()
            .ok_or(ErrorCode::InsufficientPrincipal)?;
        position.debit(units)?;
        let total_principal = self
            .state
            .total_principal_wrapped_units
            .checked_sub(units)
            .ok_or(ErrorCode::PrincipalInvariantViolated)?;

        let quote = self.adapter.quote_unwrap(units, asset)?;
        let min_out = min_amount_out(quote, max_slippage_bps)?;
        let amount_out = self.adapter.unwrap(units, asset, min_out)?;
        require!(amount_out >= min_out, ErrorCode::SlippageExceeded);

        ledger.release_collateral_claim(depositor, &self.state.wrapped_asset, units)?;
        transfer.transfer(asset, recipient, amount_out)?;

        self.positions.insert(*depositor, position);
        self.state.total_principal_wrapped_units = total_principal;

        emit!(WithdrawCollateralEvent {
            vault: self.key,
            depositor: *depositor,
            recipient: *recipient,
            asset: *asset,
            wrapped_units: units,
            amount_out,
        });

        Ok(amount_out)
    }

    /// Wrapped units held beyond total principal that a harvest can release
    pub fn get_yield_amount(&self) -> Result<u64> {
        self.adapter
            .harvestable_units(self.state.total_principal_wrapped_units)
    }

    /// Realizes the current surplus and routes it per the vault's config, returning
    /// the wrapped units harvested. Families paying emissions are harvested even
    /// without surplus. A harvest that realizes nothing changes nothing.
    pub fn process_yield(&mut self, ctx: &mut HarvestContext, now: i64) -> Result<u64> {
        self.state.check_not_halted(VaultFlags::HALT_HARVESTS)?;

        let principal_before = self.state.total_principal_wrapped_units;
        let yield_units = self.get_yield_amount()?;
        if yield_units == 0 && !self.adapter.kind().forwards_rewards() {
            return Ok(0);
        }

        let proceeds = self
            .adapter
            .harvest(yield_units, self.state.config.harvest_slippage_bps)?;
        if proceeds.iter().all(|p| p.amount == 0) {
            return Ok(0);
        }

        match self.state.config.yield_route {
            YieldRoute::DirectToReserves => self.credit_reserves(ctx, &proceeds)?,
            YieldRoute::ForwardToAggregator { aggregator } => {
                self.forward_rewards(ctx, &aggregator, &proceeds)?
            }
        }

        require!(
            self.state.total_principal_wrapped_units == principal_before,
            ErrorCode::PrincipalInvariantViolated
        );
        self.state.last_harvest_timestamp = now;

        emit!(YieldHarvestedEvent {
            vault: self.key,
            yield_units,
            timestamp: now,
        });

        Ok(yield_units)
    }

    /// Treasury cut of `amount`, taken before anything is split
    fn treasury_fee(&self, amount: u64) -> Result<u64> {
        let config = &self.state.config;
        if config.treasury.is_none() || !config.skims_treasury_fee() {
            return Ok(0);
        }
        bps_of(amount, config.treasury_fee_bps)
    }

    fn pay_treasury(
        &self,
        transfer: &mut dyn TokenTransfer,
        asset: &Pubkey,
        fee: u64,
    ) -> Result<()> {
        if fee == 0 {
            return Ok(());
        }
        let treasury = self
            .state
            .config
            .treasury
            .ok_or(ErrorCode::InvalidFeeConfig)?;
        transfer.transfer(asset, &treasury, fee)?;

        emit!(TreasuryFeeEvent {
            vault: self.key,
            treasury,
            asset: *asset,
            amount: fee,
        });
        Ok(())
    }

    fn credit_reserves(&self, ctx: &mut HarvestContext, proceeds: &[TokenAmount]) -> Result<()> {
        let underlying = self.state.underlying_asset;
        let mut harvested: u64 = 0;
        for p in proceeds {
            require!(p.asset == underlying, ErrorCode::UnexpectedHarvestProceeds);
            harvested = harvested
                .checked_add(p.amount)
                .ok_or(ErrorCode::OverflowError)?;
        }

        let snapshot = BorrowVolumeSnapshot::read(&*ctx.ledger)?;
        let fee = self.treasury_fee(harvested)?;
        let distributable = harvested.checked_sub(fee).ok_or(ErrorCode::MathError)?;
        let credits = split_by_borrow_volume(distributable, &snapshot)?;

        // Resolve every conversion before the first swap runs
        let mut legs = Vec::with_capacity(credits.len());
        for credit in credits.iter().filter(|c| c.amount > 0) {
            let path = if credit.asset == underlying {
                SwapPath::identity(underlying)
            } else {
                self.state
                    .reserve_path(&credit.asset)
                    .cloned()
                    .ok_or(ErrorCode::InvalidPath)?
            };
            path.validate_endpoints(&underlying, &credit.asset)?;
            legs.push((credit.asset, credit.amount, path));
        }

        let slippage_bps = self.state.config.harvest_slippage_bps;
        let mut converted = Vec::with_capacity(legs.len());
        for (reserve_asset, amount, path) in legs.iter() {
            let min_out = min_conversion_out(
                ctx.oracle,
                ctx.metadata,
                &underlying,
                reserve_asset,
                *amount,
                slippage_bps,
            )?;
            let amount_out = execute_swap(ctx.router, path, *amount, min_out)?;
            converted.push((*reserve_asset, amount_out));
        }

        self.pay_treasury(ctx.transfer, &underlying, fee)?;
        for (reserve_asset, amount) in converted {
            ctx.ledger.credit_reserve_yield(&reserve_asset, amount)?;
            emit!(ReserveCreditedEvent {
                source: self.key,
                reserve_asset,
                amount,
            });
        }

        Ok(())
    }

    fn forward_rewards(
        &self,
        ctx: &mut HarvestContext,
        aggregator: &Pubkey,
        proceeds: &[TokenAmount],
    ) -> Result<()> {
        let sink = ctx
            .reward_sink
            .as_deref_mut()
            .ok_or(ErrorCode::InvalidVaultConfig)?;

        for p in proceeds.iter().filter(|p| p.amount > 0) {
            let fee = self.treasury_fee(p.amount)?;
            let amount = p.amount.checked_sub(fee).ok_or(ErrorCode::MathError)?;
            self.pay_treasury(ctx.transfer, &p.asset, fee)?;
            if amount == 0 {
                continue;
            }

            ctx.transfer.transfer(&p.asset, aggregator, amount)?;
            sink.receive_reward(&self.key, &p.asset, amount)?;

            emit!(RewardForwardedEvent {
                vault: self.key,
                aggregator: *aggregator,
                asset: p.asset,
                amount,
            });
        }

        Ok(())
    }

    pub fn set_paused(&mut self, signer: &Pubkey, paused: bool) -> Result<()> {
        let flags = if paused {
            VaultFlags::PAUSED
        } else {
            VaultFlags::empty()
        };
        self.update_halt_flags(signer, flags.bits())
    }

    pub fn update_halt_flags(&mut self, signer: &Pubkey, flags: u32) -> Result<()> {
        self.state.check_owner(signer)?;
        self.state.set_halt_flags(flags)?;

        #[cfg(feature = "debug")]
        msg!("Halt flags set to {:?}", self.state.halt_flags());

        emit!(HaltFlagsUpdatedEvent {
            vault: self.key,
            flags,
        });
        Ok(())
    }

    pub fn update_config(&mut self, signer: &Pubkey, config: VaultConfigArg) -> Result<()> {
        self.state.check_owner(signer)?;
        let config = VaultConfig::new(config)?;
        check_route(&self.adapter, &config)?;
        self.state.config = config;
        Ok(())
    }

    /// Sets the conversion used to credit the reserve the path ends at
    pub fn set_reserve_path(&mut self, signer: &Pubkey, path: SwapPath) -> Result<()> {
        self.state.check_owner(signer)?;
        path.validate()?;
        require!(
            path.first() == Some(&self.state.underlying_asset),
            ErrorCode::PathAssetMismatch
        );
        self.state.set_reserve_path(path);
        Ok(())
    }
}
