//! Market façade: delayed market-order requests (spec.md §4.4). All queueing,
//! expiry, and cancellation logic lives in `crate::market`; this service resolves
//! `msg::source()`/`exec::block_timestamp()` and emits `MarketEvent`.

use crate::errors::Error;
use crate::events::MarketEvent;
use crate::market;
use crate::types::*;
use crate::EngineState;
use sails_rs::gstd::{exec, msg};
use sails_rs::prelude::*;

#[derive(Default)]
pub struct MarketService;

impl MarketService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl MarketService {
    pub fn create_increase_position(
        &mut self,
        token: TokenId,
        amount_in: u128,
        size_delta: u128,
        is_long: bool,
        execution_fee: u128,
    ) -> Result<RequestKey, Error> {
        let account = msg::source();
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState { market, ledger, .. } = &mut *state;
        let key = market::create_increase_position_request(
            market,
            ledger,
            account,
            token.clone(),
            amount_in,
            size_delta,
            is_long,
            execution_fee,
            now,
        )?;
        drop(state);

        self.notify_on(MarketEvent::CreateIncreasePosition {
            key,
            account,
            token,
            amount_in,
            size_delta,
            is_long,
            execution_fee,
        })
        .expect("notification failed");
        Ok(key)
    }

    pub fn cancel_increase_position(&mut self, key: RequestKey) -> Result<(), Error> {
        let account = msg::source();
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState { market, ledger, .. } = &mut *state;
        market::cancel_increase_position_request(market, ledger, account, key, now)?;
        drop(state);

        self.notify_on(MarketEvent::CancelIncreasePosition { key }).expect("notification failed");
        Ok(())
    }

    /// `executeIncreasePosition(key)`: silently succeeds (returns `None`) if the
    /// request is already gone — executors may race (spec.md §4.4).
    pub fn execute_increase_position(&mut self, key: RequestKey) -> Result<Option<PositionKey>, Error> {
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState {
            market,
            vault,
            ledger,
            price_feed,
            ..
        } = &mut *state;
        let outcome = market::execute_increase_position_request(market, vault, ledger, price_feed, key, now)?;
        drop(state);

        match outcome {
            Some(outcome) => {
                self.notify_on(MarketEvent::ExecuteIncreasePosition {
                    key,
                    execution_price: outcome.mark_price,
                })
                .expect("notification failed");
                Ok(Some(outcome.key))
            }
            None => Ok(None),
        }
    }

    pub fn create_decrease_position(
        &mut self,
        token: TokenId,
        collateral_delta: u128,
        size_delta: u128,
        is_long: bool,
        execution_fee: u128,
    ) -> Result<RequestKey, Error> {
        let account = msg::source();
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState { market, ledger, .. } = &mut *state;
        let key = market::create_decrease_position_request(
            market,
            ledger,
            account,
            token.clone(),
            collateral_delta,
            size_delta,
            is_long,
            execution_fee,
            now,
        )?;
        drop(state);

        self.notify_on(MarketEvent::CreateDecreasePosition {
            key,
            account,
            token,
            collateral_delta,
            size_delta,
            is_long,
            execution_fee,
        })
        .expect("notification failed");
        Ok(key)
    }

    pub fn cancel_decrease_position(&mut self, key: RequestKey) -> Result<(), Error> {
        let account = msg::source();
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState { market, ledger, .. } = &mut *state;
        market::cancel_decrease_position_request(market, ledger, account, key, now)?;
        drop(state);

        self.notify_on(MarketEvent::CancelDecreasePosition { key }).expect("notification failed");
        Ok(())
    }

    pub fn execute_decrease_position(&mut self, key: RequestKey) -> Result<Option<u128>, Error> {
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState {
            market,
            vault,
            ledger,
            price_feed,
            ..
        } = &mut *state;
        let outcome = market::execute_decrease_position_request(market, vault, ledger, price_feed, key, now)?;
        drop(state);

        match outcome {
            Some(outcome) => {
                self.notify_on(MarketEvent::ExecuteDecreasePosition {
                    key,
                    execution_price: outcome.mark_price,
                })
                .expect("notification failed");
                Ok(Some(outcome.usd_out_after_fee))
            }
            None => Ok(None),
        }
    }

    /// `setMaxTimeDelay(seconds)`: owner-gated, same `owner` as the rest of the
    /// admin surface (spec.md §6).
    pub fn set_max_time_delay(&mut self, seconds: u64) -> Result<(), Error> {
        let caller = msg::source();
        let mut state = EngineState::get_mut();
        if state.vault.admin.owner != caller {
            return Err(Error::NotOwner);
        }
        state.market.max_time_delay = seconds;
        drop(state);

        self.notify_on(MarketEvent::SetMaxTimeDelay { seconds }).expect("notification failed");
        Ok(())
    }

    pub fn increase_requests(&self, key: RequestKey) -> Option<IncreasePositionRequest> {
        EngineState::get().market.increase_requests.get(&key).cloned()
    }

    pub fn decrease_requests(&self, key: RequestKey) -> Option<DecreasePositionRequest> {
        EngineState::get().market.decrease_requests.get(&key).cloned()
    }

    pub fn max_time_delay(&self) -> u64 {
        EngineState::get().market.max_time_delay
    }
}
