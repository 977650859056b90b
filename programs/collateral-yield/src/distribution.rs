use std::convert::TryFrom;

use anchor_lang::prelude::*;
use itertools::Itertools;

use crate::errors::ErrorCode;
use crate::ledger::ReserveLedger;
use crate::math::div_round_half_up;

/// Borrow volumes read from the ledger at distribution time. Never cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BorrowVolumeSnapshot {
    assets: Vec<Pubkey>,
    volumes: Vec<u64>,
}

impl BorrowVolumeSnapshot {
    pub fn try_new(assets: Vec<Pubkey>, volumes: Vec<u64>) -> Result<Self> {
        require!(assets.len() == volumes.len(), ErrorCode::LengthMismatch);
        Ok(Self { assets, volumes })
    }

    pub fn read(ledger: &dyn ReserveLedger) -> Result<Self> {
        let (assets, volumes) = ledger.get_borrow_volumes()?;
        Self::try_new(assets, volumes)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pubkey, &u64)> + '_ {
        self.assets.iter().zip_eq(self.volumes.iter())
    }

    pub fn total_volume(&self) -> Result<u128> {
        let total = self
            .volumes
            .iter()
            .map(|v| u128::from(*v))
            .sum::<u128>();
        require!(total > 0, ErrorCode::NoBorrowVolume);
        Ok(total)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReserveCredit {
    pub asset: Pubkey,
    pub amount: u64,
}

/// Splits `amount` across reserves in proportion to their borrow volume.
///
/// Each reserve is credited `amount * volume / total_volume`, rounded half up and
/// capped by what is still unallocated. The last reserve in ledger order takes the
/// remainder, so the credits always sum to exactly `amount`.
pub fn split_by_borrow_volume(
    amount: u64,
    snapshot: &BorrowVolumeSnapshot,
) -> Result<Vec<ReserveCredit>> {
    let total_volume = snapshot.total_volume()?;
    let last = snapshot.len() - 1;

    let mut allocated: u64 = 0;
    let mut credits = Vec::with_capacity(snapshot.len());
    for (i, (asset, volume)) in snapshot.iter().enumerate() {
        let remaining = amount
            .checked_sub(allocated)
            .ok_or(ErrorCode::MathError)?;

        let credit = if i == last {
            remaining
        } else {
            let credit = u128::from(amount)
                .checked_mul(u128::from(*volume))
                .and_then(|scaled| div_round_half_up(scaled, total_volume))
                .ok_or(ErrorCode::OverflowError)?;
            u64::try_from(credit)
                .map_err(|_| ErrorCode::OverflowError)?
                .min(remaining)
        };

        allocated = allocated
            .checked_add(credit)
            .ok_or(ErrorCode::OverflowError)?;
        credits.push(ReserveCredit {
            asset: *asset,
            amount: credit,
        });
    }

    #[cfg(feature = "debug")]
    msg!("Split {} across {} reserves", amount, credits.len());

    Ok(credits)
}
