//! Stateful in-memory venues for exercising the adapter families and vaults

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anchor_lang::prelude::*;

use crate::adapters::{
    AdapterKind, LiquidityFarm, LiquidityPool, RebasingToken, ShareVenue, StakePool, TokenAmount,
    WrappedPositionAdapter, YieldVault,
};
use crate::errors::ErrorCode;
use crate::ledger::ReserveLedger;
use crate::math::{bps_of, ExchangeRate};

/// Fails the test unless `result` is the anchor error `expected`
#[track_caller]
pub fn assert_error<T: std::fmt::Debug>(result: Result<T>, expected: ErrorCode) {
    match result {
        Err(Error::AnchorError(e)) => assert_eq!(
            e.error_code_number,
            u32::from(expected),
            "got {} instead of {}",
            e.error_name,
            expected.name()
        ),
        other => panic!("expected {}, got {:?}", expected.name(), other),
    }
}

#[derive(Debug, Default)]
struct SharePoolState {
    underlying: u64,
    shares: u64,
    withdrawal_fee_bps: u16,
    emissions: Vec<TokenAmount>,
}

/// Share-issuing venue. Clones share state, so a test can keep a handle while an
/// adapter owns the boxed copy.
#[derive(Clone, Debug, Default)]
pub struct FakeSharePool {
    state: Rc<RefCell<SharePoolState>>,
}

impl FakeSharePool {
    pub fn new(underlying: u64, shares: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(SharePoolState {
                underlying,
                shares,
                ..SharePoolState::default()
            })),
        }
    }

    /// Grows pooled value without minting shares
    pub fn accrue(&self, amount: u64) {
        self.state.borrow_mut().underlying += amount;
    }

    pub fn set_withdrawal_fee_bps(&self, bps: u16) {
        self.state.borrow_mut().withdrawal_fee_bps = bps;
    }

    pub fn add_emission(&self, asset: Pubkey, amount: u64) {
        self.state
            .borrow_mut()
            .emissions
            .push(TokenAmount { asset, amount });
    }

    fn rate(&self) -> ExchangeRate {
        let state = self.state.borrow();
        ExchangeRate::new(state.underlying, state.shares)
    }
}

impl ShareVenue for FakeSharePool {
    fn deposit(&mut self, amount: u64) -> Result<u64> {
        let minted = self
            .rate()
            .underlying_to_shares(amount)
            .ok_or(ErrorCode::MathError)?;
        let mut state = self.state.borrow_mut();
        state.underlying += amount;
        state.shares += minted;
        Ok(minted)
    }

    fn redeem(&mut self, shares: u64) -> Result<u64> {
        let value = self
            .rate()
            .shares_to_underlying(shares)
            .ok_or(ErrorCode::MathError)?;
        let mut state = self.state.borrow_mut();
        let fee = bps_of(value, state.withdrawal_fee_bps)?;
        state.underlying -= value;
        state.shares -= shares;
        Ok(value - fee)
    }

    fn exchange_rate(&self) -> Result<ExchangeRate> {
        Ok(self.rate())
    }
}

impl StakePool for FakeSharePool {
    fn withdrawal_fee_bps(&self) -> u16 {
        self.state.borrow().withdrawal_fee_bps
    }
}

impl YieldVault for FakeSharePool {
    fn deposit(&mut self, amount: u64) -> Result<u64> {
        ShareVenue::deposit(self, amount)
    }

    fn withdraw(&mut self, shares: u64, max_loss_bps: u16) -> Result<u64> {
        require!(
            self.state.borrow().withdrawal_fee_bps <= max_loss_bps,
            ErrorCode::SlippageExceeded
        );
        self.redeem(shares)
    }

    fn price_per_share(&self) -> Result<ExchangeRate> {
        Ok(self.rate())
    }
}

impl LiquidityFarm for FakeSharePool {
    fn claim_rewards(&mut self) -> Result<Vec<TokenAmount>> {
        Ok(std::mem::take(&mut self.state.borrow_mut().emissions))
    }
}

#[derive(Debug, Default)]
struct RebasingState {
    pooled: u64,
    shares: u64,
}

#[derive(Clone, Debug, Default)]
pub struct FakeRebasingToken {
    state: Rc<RefCell<RebasingState>>,
}

impl FakeRebasingToken {
    /// Raises every holder's balance pro rata
    pub fn rebase(&self, amount: u64) {
        self.state.borrow_mut().pooled += amount;
    }
}

impl RebasingToken for FakeRebasingToken {
    fn submit(&mut self, amount: u64) -> Result<u64> {
        let minted = self
            .exchange_rate()?
            .underlying_to_shares(amount)
            .ok_or(ErrorCode::MathError)?;
        let mut state = self.state.borrow_mut();
        state.pooled += amount;
        state.shares += minted;
        Ok(minted)
    }

    fn exchange_rate(&self) -> Result<ExchangeRate> {
        let state = self.state.borrow();
        Ok(ExchangeRate::new(state.pooled, state.shares))
    }
}

/// Pool paying a fixed amount of each pair token per LP token
#[derive(Clone, Debug)]
pub struct FakeLiquidityPool {
    token_a: Pubkey,
    token_b: Pubkey,
    a_per_lp: u64,
    b_per_lp: u64,
}

impl FakeLiquidityPool {
    pub fn new(token_a: Pubkey, token_b: Pubkey, a_per_lp: u64, b_per_lp: u64) -> Self {
        Self {
            token_a,
            token_b,
            a_per_lp,
            b_per_lp,
        }
    }
}

impl LiquidityPool for FakeLiquidityPool {
    fn token_a(&self) -> Pubkey {
        self.token_a
    }

    fn token_b(&self) -> Pubkey {
        self.token_b
    }

    fn quote_remove_liquidity(&self, lp_amount: u64) -> Result<(u64, u64)> {
        Ok((lp_amount * self.a_per_lp, lp_amount * self.b_per_lp))
    }

    fn remove_liquidity(&mut self, lp_amount: u64, min_a: u64, min_b: u64) -> Result<(u64, u64)> {
        let (a, b) = self.quote_remove_liquidity(lp_amount)?;
        require!(a >= min_a && b >= min_b, ErrorCode::SlippageExceeded);
        Ok((a, b))
    }
}

/// Records every call the vaults and aggregator make against the lending pool
#[derive(Clone, Debug, Default)]
pub struct FakeReserveLedger {
    pub reserves: Vec<Pubkey>,
    pub borrow_volumes: Vec<u64>,
    pub credits: Vec<(Pubkey, u64)>,
    pub claims: BTreeMap<(Pubkey, Pubkey), u64>,
}

impl FakeReserveLedger {
    pub fn with_reserves(reserves: &[(Pubkey, u64)]) -> Self {
        Self {
            reserves: reserves.iter().map(|(asset, _)| *asset).collect(),
            borrow_volumes: reserves.iter().map(|(_, volume)| *volume).collect(),
            ..Self::default()
        }
    }

    pub fn credited(&self, asset: &Pubkey) -> u64 {
        self.credits
            .iter()
            .filter(|(a, _)| a == asset)
            .map(|(_, amount)| amount)
            .sum()
    }

    pub fn claim(&self, depositor: &Pubkey, vault_asset: &Pubkey) -> u64 {
        self.claims
            .get(&(*depositor, *vault_asset))
            .copied()
            .unwrap_or_default()
    }
}

impl ReserveLedger for FakeReserveLedger {
    fn credit_reserve_yield(&mut self, asset: &Pubkey, amount: u64) -> Result<()> {
        self.credits.push((*asset, amount));
        Ok(())
    }

    fn get_borrow_volumes(&self) -> Result<(Vec<Pubkey>, Vec<u64>)> {
        Ok((self.reserves.clone(), self.borrow_volumes.clone()))
    }

    fn record_collateral_claim(
        &mut self,
        depositor: &Pubkey,
        vault_asset: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        *self.claims.entry((*depositor, *vault_asset)).or_default() += amount;
        Ok(())
    }

    fn release_collateral_claim(
        &mut self,
        depositor: &Pubkey,
        vault_asset: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let claim = self.claims.entry((*depositor, *vault_asset)).or_default();
        *claim = claim
            .checked_sub(amount)
            .ok_or(ErrorCode::InsufficientPrincipal)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BalanceState {
    balance: u64,
    unwrap_haircut_bps: u16,
}

/// Adapter whose wrapped units track the underlying 1:1, like an interest-bearing
/// balance token. Appreciation is driven by the test.
#[derive(Clone, Debug)]
pub struct FakeBalanceAdapter {
    kind: AdapterKind,
    underlying: Pubkey,
    wrapped: Pubkey,
    state: Rc<RefCell<BalanceState>>,
}

impl FakeBalanceAdapter {
    pub fn new(kind: AdapterKind, underlying: Pubkey, wrapped: Pubkey) -> Self {
        Self {
            kind,
            underlying,
            wrapped,
            state: Rc::new(RefCell::new(BalanceState::default())),
        }
    }

    pub fn appreciate(&self, amount: u64) {
        self.state.borrow_mut().balance += amount;
    }

    /// Makes unwraps realize less than quoted
    pub fn set_unwrap_haircut_bps(&self, bps: u16) {
        self.state.borrow_mut().unwrap_haircut_bps = bps;
    }

    pub fn balance(&self) -> u64 {
        self.state.borrow().balance
    }
}

impl WrappedPositionAdapter for FakeBalanceAdapter {
    fn kind(&self) -> AdapterKind {
        self.kind
    }

    fn underlying_asset(&self) -> Pubkey {
        self.underlying
    }

    fn wrapped_asset(&self) -> Pubkey {
        self.wrapped
    }

    fn wrap(&mut self, amount: u64) -> Result<u64> {
        self.appreciate(amount);
        Ok(amount)
    }

    fn deposit_wrapped(&mut self, amount: u64) -> Result<u64> {
        self.appreciate(amount);
        Ok(amount)
    }

    fn quote_unwrap(&self, units: u64, asset: &Pubkey) -> Result<u64> {
        require!(
            *asset == self.underlying || *asset == self.wrapped,
            ErrorCode::UnsupportedCollateral
        );
        require!(units <= self.balance(), ErrorCode::InsufficientPrincipal);
        Ok(units)
    }

    fn unwrap(&mut self, units: u64, asset: &Pubkey, min_amount_out: u64) -> Result<u64> {
        self.quote_unwrap(units, asset)?;
        let mut state = self.state.borrow_mut();
        let amount_out = units - bps_of(units, state.unwrap_haircut_bps)?;
        require!(amount_out >= min_amount_out, ErrorCode::SlippageExceeded);
        state.balance -= units;
        Ok(amount_out)
    }

    fn current_balance(&self) -> Result<u64> {
        Ok(self.balance())
    }
}
