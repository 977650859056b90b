use anchor_lang::prelude::*;
use boolinator::Boolinator;

use crate::errors::ErrorCode;
use crate::math::ONE_AS_BPS;
use crate::swap::SwapPath;

/// Version of this crate written into newly created state: [major, minor, patch]
pub const STATE_VERSION: [u8; 3] = [0, 1, 0];

/// Aggregate bookkeeping for one collateral type
#[account]
#[derive(Debug)]
pub struct VaultState {
    pub version: [u8; 3],

    /// Account which is allowed to call restricted instructions
    pub owner: Pubkey,

    /// Raw asset a depositor thinks of as their collateral
    pub underlying_asset: Pubkey,

    /// Yield-bearing asset the vault actually holds
    pub wrapped_asset: Pubkey,

    /// Sum of every position's principal, in wrapped units
    pub total_principal_wrapped_units: u64,

    pub last_harvest_timestamp: i64,

    bitflags: u32,

    pub config: VaultConfig,

    /// Conversion paths from the underlying asset into each reserve asset,
    /// used when harvests are credited directly
    pub reserve_paths: Vec<SwapPath>,
}

impl VaultState {
    pub fn new(
        owner: Pubkey,
        underlying_asset: Pubkey,
        wrapped_asset: Pubkey,
        config: VaultConfig,
    ) -> Self {
        Self {
            version: STATE_VERSION,
            owner,
            underlying_asset,
            wrapped_asset,
            total_principal_wrapped_units: 0,
            last_harvest_timestamp: 0,
            bitflags: 0,
            config,
            reserve_paths: Vec::new(),
        }
    }

    pub fn halt_flags(&self) -> VaultFlags {
        VaultFlags::from_bits(self.bitflags)
            .unwrap_or_else(|| panic!("{:?} does not resolve to valid VaultFlags", self.bitflags))
    }

    pub fn set_halt_flags(&mut self, bits: u32) -> Result<()> {
        VaultFlags::from_bits(bits).ok_or(ErrorCode::InvalidVaultFlags)?;
        self.bitflags = bits;
        Ok(())
    }

    pub fn check_not_halted(&self, flag: VaultFlags) -> Result<()> {
        (!self.halt_flags().intersects(flag)).ok_or(ErrorCode::VaultPaused)?;
        Ok(())
    }

    pub fn check_owner(&self, signer: &Pubkey) -> Result<()> {
        (self.owner == *signer).ok_or(ErrorCode::AuthorizationDenied)?;
        Ok(())
    }

    pub fn is_supported_asset(&self, asset: &Pubkey) -> bool {
        *asset == self.underlying_asset || *asset == self.wrapped_asset
    }

    pub fn reserve_path(&self, reserve_asset: &Pubkey) -> Option<&SwapPath> {
        self.reserve_paths
            .iter()
            .find(|path| path.last() == Some(reserve_asset))
    }

    pub fn set_reserve_path(&mut self, path: SwapPath) {
        match self
            .reserve_paths
            .iter_mut()
            .find(|existing| existing.last() == path.last())
        {
            Some(existing) => *existing = path,
            None => self.reserve_paths.push(path),
        }
    }
}

bitflags::bitflags! {
    pub struct VaultFlags: u32 {
        /// Disable deposits
        const HALT_DEPOSITS = 1 << 0;

        /// Disable withdrawals
        const HALT_WITHDRAWALS = 1 << 1;

        /// Disable harvests
        const HALT_HARVESTS = 1 << 2;

        /// Disable all operations
        const PAUSED = Self::HALT_DEPOSITS.bits
                     | Self::HALT_WITHDRAWALS.bits
                     | Self::HALT_HARVESTS.bits;
    }
}

/// Where harvested proceeds go
#[derive(AnchorDeserialize, AnchorSerialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum YieldRoute {
    /// Convert the unwrapped underlying into reserve assets and credit the ledger
    DirectToReserves,
    /// Hand raw reward tokens to a yield distribution aggregator
    ForwardToAggregator { aggregator: Pubkey },
}

#[derive(AnchorDeserialize, AnchorSerialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultConfigArg {
    pub treasury: Option<Pubkey>,
    pub treasury_fee_bps: u16,
    pub harvest_slippage_bps: u16,
    pub yield_route: YieldRoute,
}

#[derive(AnchorDeserialize, AnchorSerialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultConfig {
    /// Receiver of the harvest skim, required when `treasury_fee_bps` is non-zero
    pub treasury: Option<Pubkey>,

    /// Basis points of each harvest routed to the treasury before distribution
    pub treasury_fee_bps: u16,

    /// Slippage tolerated when unwrapping and converting harvested yield
    pub harvest_slippage_bps: u16,

    pub yield_route: YieldRoute,
}

impl VaultConfig {
    pub fn new(config: VaultConfigArg) -> Result<Self> {
        // Fee cannot be over 100%
        require!(
            u64::from(config.treasury_fee_bps) <= ONE_AS_BPS,
            ErrorCode::InvalidFeeConfig
        );

        // A fee needs somewhere to go
        require!(
            config.treasury_fee_bps == 0 || config.treasury.is_some(),
            ErrorCode::InvalidFeeConfig
        );

        require!(
            u64::from(config.harvest_slippage_bps) <= ONE_AS_BPS,
            ErrorCode::InvalidSlippageBound
        );

        if let YieldRoute::ForwardToAggregator { aggregator } = config.yield_route {
            require!(aggregator != Pubkey::default(), ErrorCode::InvalidVaultConfig);
        }

        Ok(Self {
            treasury: config.treasury,
            treasury_fee_bps: config.treasury_fee_bps,
            harvest_slippage_bps: config.harvest_slippage_bps,
            yield_route: config.yield_route,
        })
    }

    pub fn skims_treasury_fee(&self) -> bool {
        self.treasury_fee_bps > 0
    }
}

#[derive(AnchorDeserialize, AnchorSerialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionStatus {
    Empty,
    Funded,
    PartiallyWithdrawn,
}

impl Default for PositionStatus {
    fn default() -> Self {
        PositionStatus::Empty
    }
}

/// One depositor's claim on a vault
#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub vault: Pubkey,

    pub depositor: Pubkey,

    /// Wrapped units owed back to the depositor untouched
    pub principal_wrapped_units: u64,

    pub deposited_at: i64,

    pub status: PositionStatus,
}

impl Position {
    pub fn new(vault: Pubkey, depositor: Pubkey) -> Self {
        Self {
            vault,
            depositor,
            ..Self::default()
        }
    }

    pub fn credit(&mut self, units: u64, timestamp: i64) -> Result<()> {
        self.principal_wrapped_units = self
            .principal_wrapped_units
            .checked_add(units)
            .ok_or(ErrorCode::OverflowError)?;
        if self.status == PositionStatus::Empty {
            self.deposited_at = timestamp;
        }
        self.status = PositionStatus::Funded;
        Ok(())
    }

    pub fn debit(&mut self, units: u64) -> Result<()> {
        self.principal_wrapped_units = self
            .principal_wrapped_units
            .checked_sub(units)
            .ok_or(ErrorCode::InsufficientPrincipal)?;
        self.status = match self.principal_wrapped_units {
            0 => PositionStatus::Empty,
            _ => PositionStatus::PartiallyWithdrawn,
        };
        Ok(())
    }
}

/// Reward balance waiting for conversion into the settlement asset
#[derive(AnchorDeserialize, AnchorSerialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardBucket {
    pub asset: Pubkey,
    pub accumulated_balance: u64,
}

/// Pool used for hops between two assets, registered by the aggregator owner
#[derive(AnchorDeserialize, AnchorSerialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VenuePool {
    pub asset_a: Pubkey,
    pub asset_b: Pubkey,
    pub pool: Pubkey,
}

impl VenuePool {
    pub fn connects(&self, from: &Pubkey, to: &Pubkey) -> bool {
        (self.asset_a == *from && self.asset_b == *to)
            || (self.asset_a == *to && self.asset_b == *from)
    }
}

#[account]
#[derive(Debug)]
pub struct AggregatorState {
    pub version: [u8; 3],

    pub owner: Pubkey,

    /// Asset every reward is converted into before the reserve split
    pub settlement_asset: Option<Pubkey>,

    pub settlement_decimals: u8,

    /// Vaults allowed to submit rewards
    pub registered_vaults: Vec<Pubkey>,

    /// Indexed in registration order, never reordered
    pub reward_buckets: Vec<RewardBucket>,

    pub venue_pools: Vec<VenuePool>,
}

impl AggregatorState {
    pub fn new(owner: Pubkey) -> Self {
        Self {
            version: STATE_VERSION,
            owner,
            settlement_asset: None,
            settlement_decimals: 0,
            registered_vaults: Vec::new(),
            reward_buckets: Vec::new(),
            venue_pools: Vec::new(),
        }
    }

    pub fn check_owner(&self, signer: &Pubkey) -> Result<()> {
        (self.owner == *signer).ok_or(ErrorCode::AuthorizationDenied)?;
        Ok(())
    }

    pub fn is_registered_vault(&self, vault: &Pubkey) -> bool {
        self.registered_vaults.contains(vault)
    }

    pub fn bucket(&self, asset: &Pubkey) -> Option<&RewardBucket> {
        self.reward_buckets.iter().find(|b| b.asset == *asset)
    }

    /// Returns the bucket for `asset`, creating an empty one on first use
    pub fn bucket_mut_or_insert(&mut self, asset: &Pubkey) -> &mut RewardBucket {
        let index = match self.reward_buckets.iter().position(|b| b.asset == *asset) {
            Some(index) => index,
            None => {
                self.reward_buckets.push(RewardBucket {
                    asset: *asset,
                    accumulated_balance: 0,
                });
                self.reward_buckets.len() - 1
            }
        };
        &mut self.reward_buckets[index]
    }

    pub fn venue_pool(&self, from: &Pubkey, to: &Pubkey) -> Option<&VenuePool> {
        self.venue_pools.iter().find(|p| p.connects(from, to))
    }
}
