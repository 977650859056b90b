use anchor_lang::prelude::*;

use crate::errors::ErrorCode;
use crate::math::ExchangeRate;

/// External venue that issues shares against deposits of an underlying asset
pub trait ShareVenue {
    /// Deposits `amount` of the underlying, returning the shares minted
    fn deposit(&mut self, amount: u64) -> Result<u64>;

    /// Burns `shares`, returning the underlying released
    fn redeem(&mut self, shares: u64) -> Result<u64>;

    fn exchange_rate(&self) -> Result<ExchangeRate>;
}

/// Shares a vault holds in a `ShareVenue`, valued in underlying units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SharePosition {
    shares: u64,
}

impl SharePosition {
    pub fn shares(&self) -> u64 {
        self.shares
    }

    pub fn value(&self, rate: &ExchangeRate) -> Result<u64> {
        Self::value_of(self.shares, rate)
    }

    pub fn value_of(shares: u64, rate: &ExchangeRate) -> Result<u64> {
        let value = rate
            .shares_to_underlying(shares)
            .ok_or(ErrorCode::MathError)?;
        Ok(value)
    }

    /// Shares backing `units`, rounded down so a release never takes more than asked
    pub fn shares_for(&self, units: u64, rate: &ExchangeRate) -> Result<u64> {
        let shares = rate
            .underlying_to_shares(units)
            .ok_or(ErrorCode::MathError)?;
        require!(shares <= self.shares, ErrorCode::InsufficientPrincipal);
        Ok(shares)
    }

    /// Shares held beyond those backing `principal`, with the backing rounded up
    pub fn surplus_shares(&self, principal: u64, rate: &ExchangeRate) -> Result<u64> {
        let backing = rate
            .underlying_to_shares_ceil(principal)
            .ok_or(ErrorCode::MathError)?;
        Ok(self.shares.saturating_sub(backing))
    }

    pub fn harvestable_units(&self, principal: u64, rate: &ExchangeRate) -> Result<u64> {
        Self::value_of(self.surplus_shares(principal, rate)?, rate)
    }

    /// Shares releasing `units` of surplus, rounded up so a harvest of the full
    /// harvestable amount leaves no surplus share behind
    pub fn surplus_shares_for(&self, units: u64, rate: &ExchangeRate) -> Result<u64> {
        let shares = rate
            .underlying_to_shares_ceil(units)
            .ok_or(ErrorCode::MathError)?;
        require!(shares <= self.shares, ErrorCode::InsufficientPrincipal);
        Ok(shares)
    }

    pub fn add(&mut self, shares: u64) -> Result<()> {
        self.shares = self
            .shares
            .checked_add(shares)
            .ok_or(ErrorCode::OverflowError)?;
        Ok(())
    }

    pub fn remove(&mut self, shares: u64) -> Result<()> {
        self.shares = self
            .shares
            .checked_sub(shares)
            .ok_or(ErrorCode::InsufficientPrincipal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_error;

    #[test]
    fn test_share_position_values_at_rate() {
        let mut position = SharePosition::default();
        position.add(1_000).unwrap();

        let rate = ExchangeRate::new(1_100, 1_000);
        assert_eq!(position.value(&rate).unwrap(), 1_100);
        assert_eq!(position.shares_for(110, &rate).unwrap(), 100);
        // 109 units only buys 99.09 shares
        assert_eq!(position.shares_for(109, &rate).unwrap(), 99);
    }

    #[test]
    fn test_surplus_excludes_shares_backing_principal() {
        let mut position = SharePosition::default();
        position.add(1_000).unwrap();

        // 1 000 principal at 1.001 per share still needs all 1 000 shares
        let rate = ExchangeRate::new(1_001, 1_000);
        assert_eq!(position.value(&rate).unwrap(), 1_001);
        assert_eq!(position.surplus_shares(1_000, &rate).unwrap(), 0);
        assert_eq!(position.harvestable_units(1_000, &rate).unwrap(), 0);

        let rate = ExchangeRate::new(1_100, 1_000);
        assert_eq!(position.surplus_shares(1_000, &rate).unwrap(), 90);
        assert_eq!(position.harvestable_units(1_000, &rate).unwrap(), 99);
        assert_eq!(position.surplus_shares_for(99, &rate).unwrap(), 90);
        assert_eq!(position.shares_for(99, &rate).unwrap(), 90);
        assert_eq!(position.surplus_shares_for(98, &rate).unwrap(), 90);
        assert_eq!(position.shares_for(98, &rate).unwrap(), 89);
    }

    #[test]
    fn test_share_position_cannot_release_more_than_held() {
        let mut position = SharePosition::default();
        position.add(10).unwrap();

        let rate = ExchangeRate::new(10, 10);
        assert_error(position.shares_for(11, &rate), ErrorCode::InsufficientPrincipal);
        assert_error(position.remove(11), ErrorCode::InsufficientPrincipal);
        position.remove(10).unwrap();
        assert_eq!(position.shares(), 0);
    }
}
