#[cfg(test)]
use mockall::*;

use anchor_lang::prelude::*;
use itertools::Itertools;

use crate::errors::ErrorCode;

/// Venue used for one hop of a swap path
#[derive(AnchorDeserialize, AnchorSerialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HopVenue {
    /// Concentrated liquidity venue selected by the router from its fee tier
    FeeTier(u32),
    /// Pool registered for the asset pair with the aggregator, resolved before swapping
    RegisteredPool,
    /// Explicit pool
    Pool(Pubkey),
}

/// Ordered list of assets with one venue per hop between consecutive assets
#[derive(AnchorDeserialize, AnchorSerialize, Clone, Debug, PartialEq, Eq)]
pub struct SwapPath {
    pub assets: Vec<Pubkey>,
    pub venues: Vec<HopVenue>,
}

impl SwapPath {
    pub fn new(assets: Vec<Pubkey>, venues: Vec<HopVenue>) -> Self {
        Self { assets, venues }
    }

    /// Single-hop path through the router's fee tier venue
    pub fn direct(from: Pubkey, to: Pubkey, fee_tier: u32) -> Self {
        Self::new(vec![from, to], vec![HopVenue::FeeTier(fee_tier)])
    }

    /// A path that performs no conversion
    pub fn identity(asset: Pubkey) -> Self {
        Self::new(vec![asset], vec![])
    }

    pub fn first(&self) -> Option<&Pubkey> {
        self.assets.first()
    }

    pub fn last(&self) -> Option<&Pubkey> {
        self.assets.last()
    }

    pub fn is_identity(&self) -> bool {
        self.assets.len() == 1 && self.venues.is_empty()
    }

    pub fn hops(&self) -> impl Iterator<Item = ((&Pubkey, &Pubkey), &HopVenue)> + '_ {
        self.assets.iter().tuple_windows().zip(self.venues.iter())
    }

    /// Checks the structure of the path without consulting any venue
    pub fn validate(&self) -> Result<()> {
        require!(!self.assets.is_empty(), ErrorCode::InvalidPath);
        require!(
            self.venues.len() + 1 == self.assets.len(),
            ErrorCode::InvalidPath
        );
        require!(
            self.assets.iter().all(|asset| *asset != Pubkey::default()),
            ErrorCode::InvalidPath
        );
        require!(
            self.assets.iter().tuple_windows().all(|(a, b)| a != b),
            ErrorCode::InvalidPath
        );
        require!(
            self.venues
                .iter()
                .all(|venue| *venue != HopVenue::Pool(Pubkey::default())),
            ErrorCode::InvalidPath
        );
        Ok(())
    }

    /// Checks structure and that the path converts `from` into `to`
    pub fn validate_endpoints(&self, from: &Pubkey, to: &Pubkey) -> Result<()> {
        self.validate()?;
        require!(
            self.first() == Some(from) && self.last() == Some(to),
            ErrorCode::PathAssetMismatch
        );
        Ok(())
    }
}

/// Multi-hop conversion venue
#[cfg_attr(test, automock)]
pub trait SwapRouter {
    /// Converts `amount_in` of the path's first asset into its last asset,
    /// failing if the realized output would be below `min_amount_out`
    fn swap(&mut self, path: &SwapPath, amount_in: u64, min_amount_out: u64) -> Result<u64>;
}

/// Runs a swap and enforces the minimum output on the value the router reports
pub fn execute_swap(
    router: &mut dyn SwapRouter,
    path: &SwapPath,
    amount_in: u64,
    min_amount_out: u64,
) -> Result<u64> {
    if path.is_identity() {
        return Ok(amount_in);
    }

    #[cfg(feature = "debug")]
    msg!(
        "Swapping {} along {} hops, min out {}",
        amount_in,
        path.venues.len(),
        min_amount_out
    );

    let amount_out = router.swap(path, amount_in, min_amount_out)?;
    require!(amount_out >= min_amount_out, ErrorCode::SlippageExceeded);
    Ok(amount_out)
}
