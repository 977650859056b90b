#[cfg(test)]
use mockall::*;

use anchor_lang::prelude::*;

/// Reserve bookkeeping owned by the lending pool
#[cfg_attr(test, automock)]
pub trait ReserveLedger {
    /// Raises the accrual index of `asset` so every current depositor of that reserve
    /// shares `amount`; no new principal is recorded
    fn credit_reserve_yield(&mut self, asset: &Pubkey, amount: u64) -> Result<()>;

    /// Outstanding borrow volume of every borrowable reserve, in ledger order
    fn get_borrow_volumes(&self) -> Result<(Vec<Pubkey>, Vec<u64>)>;

    fn record_collateral_claim(
        &mut self,
        depositor: &Pubkey,
        vault_asset: &Pubkey,
        amount: u64,
    ) -> Result<()>;

    fn release_collateral_claim(
        &mut self,
        depositor: &Pubkey,
        vault_asset: &Pubkey,
        amount: u64,
    ) -> Result<()>;
}
