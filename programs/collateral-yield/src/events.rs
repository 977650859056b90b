use anchor_lang::prelude::*;

#[event]
pub struct DepositCollateralEvent {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub asset: Pubkey,
    pub amount: u64,
    pub wrapped_units: u64,
}

#[event]
pub struct WithdrawCollateralEvent {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub recipient: Pubkey,
    pub asset: Pubkey,
    pub wrapped_units: u64,
    pub amount_out: u64,
}

#[event]
pub struct YieldHarvestedEvent {
    pub vault: Pubkey,
    pub yield_units: u64,
    pub timestamp: i64,
}

#[event]
pub struct TreasuryFeeEvent {
    pub vault: Pubkey,
    pub treasury: Pubkey,
    pub asset: Pubkey,
    pub amount: u64,
}

#[event]
pub struct RewardForwardedEvent {
    pub vault: Pubkey,
    pub aggregator: Pubkey,
    pub asset: Pubkey,
    pub amount: u64,
}

#[event]
pub struct RewardReceivedEvent {
    pub aggregator: Pubkey,
    pub vault: Pubkey,
    pub asset: Pubkey,
    pub amount: u64,
}

/// Emitted once per reserve credited, by vaults and the aggregator alike
#[event]
pub struct ReserveCreditedEvent {
    pub source: Pubkey,
    pub reserve_asset: Pubkey,
    pub amount: u64,
}

#[event]
pub struct YieldDistributedEvent {
    pub aggregator: Pubkey,
    pub start_index: u64,
    pub end_index: u64,
    pub settlement_amount: u64,
}

#[event]
pub struct HaltFlagsUpdatedEvent {
    pub vault: Pubkey,
    pub flags: u32,
}
