use anchor_lang::prelude::*;

use crate::distribution::{split_by_borrow_volume, BorrowVolumeSnapshot};
use crate::errors::ErrorCode;
use crate::events::*;
use crate::ledger::ReserveLedger;
use crate::math::min_amount_out;
use crate::oracle::{quote_conversion_into, PriceOracle, TokenMetadata};
use crate::state::{AggregatorState, RewardBucket, VenuePool};
use crate::swap::{execute_swap, HopVenue, SwapPath, SwapRouter};
use crate::token::RewardSink;

/// Collaborators a distribution reaches out to
pub struct DistributionContext<'a> {
    pub ledger: &'a mut dyn ReserveLedger,
    pub router: &'a mut dyn SwapRouter,
    pub oracle: &'a dyn PriceOracle,
    pub metadata: &'a dyn TokenMetadata,
}

/// Collects reward tokens from many vaults, converts them into the settlement
/// asset and spreads the result across the borrowable reserves
pub struct YieldDistributionAggregator {
    key: Pubkey,
    state: AggregatorState,
}

impl YieldDistributionAggregator {
    pub fn new(key: Pubkey, owner: Pubkey) -> Self {
        Self {
            key,
            state: AggregatorState::new(owner),
        }
    }

    pub fn key(&self) -> Pubkey {
        self.key
    }

    pub fn state(&self) -> &AggregatorState {
        &self.state
    }

    pub fn registered_vaults(&self) -> &[Pubkey] {
        &self.state.registered_vaults
    }

    pub fn bucket_count(&self) -> usize {
        self.state.reward_buckets.len()
    }

    pub fn bucket_at(&self, index: usize) -> Option<&RewardBucket> {
        self.state.reward_buckets.get(index)
    }

    pub fn bucket_balance(&self, asset: &Pubkey) -> u64 {
        self.state
            .bucket(asset)
            .map_or(0, |b| b.accumulated_balance)
    }

    pub fn venue_pool(&self, asset_a: &Pubkey, asset_b: &Pubkey) -> Option<Pubkey> {
        self.state.venue_pool(asset_a, asset_b).map(|p| p.pool)
    }

    pub fn register_vault(&mut self, signer: &Pubkey, vault: Pubkey) -> Result<()> {
        self.state.check_owner(signer)?;
        if !self.state.is_registered_vault(&vault) {
            self.state.registered_vaults.push(vault);
        }
        Ok(())
    }

    pub fn deregister_vault(&mut self, signer: &Pubkey, vault: &Pubkey) -> Result<()> {
        self.state.check_owner(signer)?;
        self.state.registered_vaults.retain(|v| v != vault);
        Ok(())
    }

    /// Opens an empty bucket ahead of the first forwarded reward
    pub fn register_reward_asset(&mut self, signer: &Pubkey, asset: &Pubkey) -> Result<()> {
        self.state.check_owner(signer)?;
        self.state.bucket_mut_or_insert(asset);
        Ok(())
    }

    pub fn set_settlement_asset(
        &mut self,
        signer: &Pubkey,
        asset: &Pubkey,
        metadata: &dyn TokenMetadata,
    ) -> Result<()> {
        self.state.check_owner(signer)?;

        // A mint without decimals is not a fungible token we can settle in
        let decimals = metadata.decimals(asset)?;
        require!(decimals > 0, ErrorCode::InvalidSettlementAsset);

        self.state.settlement_asset = Some(*asset);
        self.state.settlement_decimals = decimals;
        Ok(())
    }

    /// Registers the pool used for `RegisteredPool` hops between the two assets,
    /// replacing any earlier registration for the pair
    pub fn register_swap_venue_pool(
        &mut self,
        signer: &Pubkey,
        asset_a: Pubkey,
        asset_b: Pubkey,
        pool: Pubkey,
    ) -> Result<()> {
        self.state.check_owner(signer)?;
        require!(pool != Pubkey::default(), ErrorCode::InvalidPoolReference);
        require!(asset_a != asset_b, ErrorCode::InvalidPath);

        let venue = VenuePool {
            asset_a,
            asset_b,
            pool,
        };
        match self
            .state
            .venue_pools
            .iter_mut()
            .find(|p| p.connects(&asset_a, &asset_b))
        {
            Some(existing) => *existing = venue,
            None => self.state.venue_pools.push(venue),
        }
        Ok(())
    }

    pub fn receive_reward(&mut self, caller: &Pubkey, asset: &Pubkey, amount: u64) -> Result<()> {
        require!(
            self.state.is_registered_vault(caller),
            ErrorCode::UnregisteredCaller
        );
        require!(amount > 0, ErrorCode::InvalidAmount);

        let bucket = self.state.bucket_mut_or_insert(asset);
        bucket.accumulated_balance = bucket
            .accumulated_balance
            .checked_add(amount)
            .ok_or(ErrorCode::OverflowError)?;

        emit!(RewardReceivedEvent {
            aggregator: self.key,
            vault: *caller,
            asset: *asset,
            amount,
        });
        Ok(())
    }

    /// Replaces `RegisteredPool` hops with the pool registered for each pair
    fn resolve_path(&self, path: &SwapPath) -> Result<SwapPath> {
        let venues = path
            .hops()
            .map(|((from, to), venue)| match venue {
                HopVenue::RegisteredPool => self
                    .state
                    .venue_pool(from, to)
                    .map(|p| HopVenue::Pool(p.pool))
                    .ok_or_else(|| error!(ErrorCode::InvalidPath)),
                other => Ok(*other),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SwapPath::new(path.assets.clone(), venues))
    }

    /// Converts buckets `[start_index, end_index)` into the settlement asset along
    /// `swap_paths` and credits the proceeds to the reserves by borrow volume.
    /// Returns the settlement amount distributed.
    pub fn distribute_yield(
        &mut self,
        start_index: usize,
        end_index: usize,
        max_slippage_bps: u16,
        swap_paths: &[SwapPath],
        ctx: &mut DistributionContext,
    ) -> Result<u64> {
        let settlement = self
            .state
            .settlement_asset
            .ok_or(ErrorCode::SettlementAssetNotSet)?;
        require!(
            start_index <= end_index && end_index <= self.state.reward_buckets.len(),
            ErrorCode::IndexOutOfRange
        );
        require!(
            swap_paths.len() == end_index - start_index,
            ErrorCode::LengthMismatch
        );

        // Every path in the slice has to check out before anything is swapped
        let buckets = &self.state.reward_buckets[start_index..end_index];
        let mut legs = Vec::with_capacity(buckets.len());
        for (bucket, path) in buckets.iter().zip(swap_paths) {
            path.validate_endpoints(&bucket.asset, &settlement)?;
            if bucket.accumulated_balance == 0 {
                continue;
            }
            legs.push((*bucket, self.resolve_path(path)?));
        }

        let snapshot = BorrowVolumeSnapshot::read(&*ctx.ledger)?;
        if !legs.is_empty() {
            snapshot.total_volume()?;
        }

        let mut settlement_total: u64 = 0;
        for (bucket, path) in legs.iter() {
            let quote = quote_conversion_into(
                ctx.oracle,
                ctx.metadata,
                &bucket.asset,
                &settlement,
                self.state.settlement_decimals,
                bucket.accumulated_balance,
            )?;
            let min_out = min_amount_out(quote, max_slippage_bps)?;
            let amount_out = execute_swap(ctx.router, path, bucket.accumulated_balance, min_out)?;

            #[cfg(feature = "debug")]
            msg!(
                "Converted {} of bucket into {} settlement",
                bucket.accumulated_balance,
                amount_out
            );

            settlement_total = settlement_total
                .checked_add(amount_out)
                .ok_or(ErrorCode::OverflowError)?;
        }

        let credits = if settlement_total > 0 {
            split_by_borrow_volume(settlement_total, &snapshot)?
        } else {
            Vec::new()
        };
        for credit in credits.iter().filter(|c| c.amount > 0) {
            ctx.ledger.credit_reserve_yield(&credit.asset, credit.amount)?;
            emit!(ReserveCreditedEvent {
                source: self.key,
                reserve_asset: credit.asset,
                amount: credit.amount,
            });
        }

        for bucket in self.state.reward_buckets[start_index..end_index].iter_mut() {
            bucket.accumulated_balance = 0;
        }

        emit!(YieldDistributedEvent {
            aggregator: self.key,
            start_index: start_index as u64,
            end_index: end_index as u64,
            settlement_amount: settlement_total,
        });

        Ok(settlement_total)
    }
}

impl RewardSink for YieldDistributionAggregator {
    fn receive_reward(&mut self, caller: &Pubkey, asset: &Pubkey, amount: u64) -> Result<()> {
        YieldDistributionAggregator::receive_reward(self, caller, asset, amount)
    }
}
