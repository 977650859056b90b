use anchor_lang::prelude::*;

pub mod adapters;
pub mod aggregator;
pub mod distribution;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod math;
pub mod oracle;
pub mod state;
pub mod swap;
pub mod token;
pub mod vault;

#[cfg(test)]
mod testing;

pub use aggregator::{DistributionContext, YieldDistributionAggregator};
pub use vault::{CollateralVault, HarvestContext};

declare_id!("8GcUSDcWiqw4MzfUwEELXRgn6G1p5WWbP5QGifo3psG9");
