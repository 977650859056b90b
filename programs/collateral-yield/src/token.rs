#[cfg(test)]
use mockall::*;

use anchor_lang::prelude::*;

/// Moves tokens out of vault custody
#[cfg_attr(test, automock)]
pub trait TokenTransfer {
    fn transfer(&mut self, asset: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;
}

/// Receives raw reward tokens forwarded by a vault
#[cfg_attr(test, automock)]
pub trait RewardSink {
    fn receive_reward(&mut self, caller: &Pubkey, asset: &Pubkey, amount: u64) -> Result<()>;
}
