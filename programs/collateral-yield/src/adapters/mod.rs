#[cfg(test)]
use mockall::*;

use anchor_lang::prelude::*;
use strum_macros::{Display, EnumIter};

use crate::math::min_amount_out;

pub mod compounding;
pub mod lp;
pub mod native;
pub mod rebasing;
pub mod share;

pub use compounding::*;
pub use lp::*;
pub use native::*;
pub use rebasing::*;
pub use share::*;

#[derive(AnchorDeserialize, AnchorSerialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    pub asset: Pubkey,
    pub amount: u64,
}

/// Supported wrapped collateral families
#[derive(Clone, Copy, Debug, Display, EnumIter, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    NativeStake,
    Rebasing,
    CompoundingVault,
    LiquidityPool,
}

impl AdapterKind {
    /// Whether harvests of this family produce raw reward tokens instead of the underlying
    pub fn forwards_rewards(&self) -> bool {
        matches!(self, AdapterKind::LiquidityPool)
    }
}

/// Per-family logic for holding a wrapped position on behalf of a vault.
///
/// Amounts called "units" are wrapped units: the denomination the vault records
/// principal in. They only ever grow through appreciation of the wrapped asset.
#[cfg_attr(test, automock)]
pub trait WrappedPositionAdapter {
    fn kind(&self) -> AdapterKind;

    fn underlying_asset(&self) -> Pubkey;

    fn wrapped_asset(&self) -> Pubkey;

    /// Wraps `amount` of the underlying, returning the wrapped units added
    fn wrap(&mut self, amount: u64) -> Result<u64>;

    /// Takes custody of `amount` already-wrapped tokens, returning the wrapped units added
    fn deposit_wrapped(&mut self, amount: u64) -> Result<u64>;

    /// Output expected from unwrapping `units` into `asset`, without side effects
    fn quote_unwrap(&self, units: u64, asset: &Pubkey) -> Result<u64>;

    /// Releases `units` as `asset`, failing with `SlippageExceeded` below `min_amount_out`
    fn unwrap(&mut self, units: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64>;

    /// Realizes `units` of surplus into whatever tokens this family yields
    fn harvest(&mut self, units: u64, max_slippage_bps: u16) -> Result<Vec<TokenAmount>> {
        let underlying = self.underlying_asset();
        let quote = self.quote_unwrap(units, &underlying)?;
        let amount = self.unwrap(units, &underlying, min_amount_out(quote, max_slippage_bps)?)?;
        Ok(vec![TokenAmount {
            asset: underlying,
            amount,
        }])
    }

    /// Wrapped units currently held
    fn current_balance(&self) -> Result<u64>;

    /// Surplus a harvest can actually release while leaving `principal` backed
    fn harvestable_units(&self, principal: u64) -> Result<u64> {
        Ok(self.current_balance()?.saturating_sub(principal))
    }
}

/// Dispatches over every supported family
pub enum Adapters {
    NativeStake(NativeStakeAdapter),
    Rebasing(RebasingTokenAdapter),
    CompoundingVault(CompoundingVaultAdapter),
    LiquidityPool(LiquidityPoolAdapter),
}

impl WrappedPositionAdapter for Adapters {
    fn kind(&self) -> AdapterKind {
        match self {
            Adapters::NativeStake(a) => a.kind(),
            Adapters::Rebasing(a) => a.kind(),
            Adapters::CompoundingVault(a) => a.kind(),
            Adapters::LiquidityPool(a) => a.kind(),
        }
    }

    fn underlying_asset(&self) -> Pubkey {
        match self {
            Adapters::NativeStake(a) => a.underlying_asset(),
            Adapters::Rebasing(a) => a.underlying_asset(),
            Adapters::CompoundingVault(a) => a.underlying_asset(),
            Adapters::LiquidityPool(a) => a.underlying_asset(),
        }
    }

    fn wrapped_asset(&self) -> Pubkey {
        match self {
            Adapters::NativeStake(a) => a.wrapped_asset(),
            Adapters::Rebasing(a) => a.wrapped_asset(),
            Adapters::CompoundingVault(a) => a.wrapped_asset(),
            Adapters::LiquidityPool(a) => a.wrapped_asset(),
        }
    }

    fn wrap(&mut self, amount: u64) -> Result<u64> {
        match self {
            Adapters::NativeStake(a) => a.wrap(amount),
            Adapters::Rebasing(a) => a.wrap(amount),
            Adapters::CompoundingVault(a) => a.wrap(amount),
            Adapters::LiquidityPool(a) => a.wrap(amount),
        }
    }

    fn deposit_wrapped(&mut self, amount: u64) -> Result<u64> {
        match self {
            Adapters::NativeStake(a) => a.deposit_wrapped(amount),
            Adapters::Rebasing(a) => a.deposit_wrapped(amount),
            Adapters::CompoundingVault(a) => a.deposit_wrapped(amount),
            Adapters::LiquidityPool(a) => a.deposit_wrapped(amount),
        }
    }

    fn quote_unwrap(&self, units: u64, asset: &Pubkey) -> Result<u64> {
        match self {
            Adapters::NativeStake(a) => a.quote_unwrap(units, asset),
            Adapters::Rebasing(a) => a.quote_unwrap(units, asset),
            Adapters::CompoundingVault(a) => a.quote_unwrap(units, asset),
            Adapters::LiquidityPool(a) => a.quote_unwrap(units, asset),
        }
    }

    fn unwrap(&mut self, units: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64> {
        match self {
            Adapters::NativeStake(a) => a.unwrap(units, asset, min_amount_out),
            Adapters::Rebasing(a) => a.unwrap(units, asset, min_amount_out),
            Adapters::CompoundingVault(a) => a.unwrap(units, asset, min_amount_out),
            Adapters::LiquidityPool(a) => a.unwrap(units, asset, min_amount_out),
        }
    }

    fn harvest(&mut self, units: u64, max_slippage_bps: u16) -> Result<Vec<TokenAmount>> {
        match self {
            Adapters::NativeStake(a) => a.harvest(units, max_slippage_bps),
            Adapters::Rebasing(a) => a.harvest(units, max_slippage_bps),
            Adapters::CompoundingVault(a) => a.harvest(units, max_slippage_bps),
            Adapters::LiquidityPool(a) => a.harvest(units, max_slippage_bps),
        }
    }

    fn current_balance(&self) -> Result<u64> {
        match self {
            Adapters::NativeStake(a) => a.current_balance(),
            Adapters::Rebasing(a) => a.current_balance(),
            Adapters::CompoundingVault(a) => a.current_balance(),
            Adapters::LiquidityPool(a) => a.current_balance(),
        }
    }

    fn harvestable_units(&self, principal: u64) -> Result<u64> {
        match self {
            Adapters::NativeStake(a) => a.harvestable_units(principal),
            Adapters::Rebasing(a) => a.harvestable_units(principal),
            Adapters::CompoundingVault(a) => a.harvestable_units(principal),
            Adapters::LiquidityPool(a) => a.harvestable_units(principal),
        }
    }
}
