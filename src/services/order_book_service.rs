//! OrderBook façade: conditional trigger-price orders (spec.md §4.3). All order
//! storage and the trigger predicate live in `crate::order_book`; this service only
//! resolves `msg::source()`/`exec::block_timestamp()` and emits `OrderBookEvent`.

use crate::errors::Error;
use crate::events::OrderBookEvent;
use crate::order_book;
use crate::types::*;
use crate::EngineState;
use sails_rs::gstd::{exec, msg};
use sails_rs::prelude::*;

#[derive(Default)]
pub struct OrderBookService;

impl OrderBookService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl OrderBookService {
    #[allow(clippy::too_many_arguments)]
    pub fn create_increase_order(
        &mut self,
        token: TokenId,
        amount: u128,
        size_delta: u128,
        is_long: bool,
        trigger_price: u128,
        trigger_above_threshold: bool,
    ) -> Result<OrderIndex, Error> {
        let account = msg::source();
        let mut state = EngineState::get_mut();
        let EngineState { order_book, ledger, .. } = &mut *state;
        let index = order_book::create_increase_order(
            order_book,
            ledger,
            account,
            token.clone(),
            amount,
            size_delta,
            is_long,
            trigger_price,
            trigger_above_threshold,
        )?;
        drop(state);

        self.notify_on(OrderBookEvent::CreateIncreaseOrder {
            account,
            index,
            token,
            amount,
            size_delta,
            is_long,
            trigger_price,
            trigger_above_threshold,
        })
        .expect("notification failed");
        Ok(index)
    }

    pub fn update_increase_order(
        &mut self,
        index: OrderIndex,
        size_delta: u128,
        trigger_price: u128,
        trigger_above_threshold: bool,
    ) -> Result<(), Error> {
        let account = msg::source();
        order_book::update_increase_order(
            &mut EngineState::get_mut().order_book,
            account,
            index,
            size_delta,
            trigger_price,
            trigger_above_threshold,
        )?;

        self.notify_on(OrderBookEvent::UpdateIncreaseOrder {
            account,
            index,
            size_delta,
            trigger_price,
            trigger_above_threshold,
        })
        .expect("notification failed");
        Ok(())
    }

    pub fn cancel_increase_order(&mut self, index: OrderIndex) -> Result<(), Error> {
        let account = msg::source();
        let mut state = EngineState::get_mut();
        let EngineState { order_book, ledger, .. } = &mut *state;
        order_book::cancel_increase_order(order_book, ledger, account, index)?;
        drop(state);

        self.notify_on(OrderBookEvent::CancelIncreaseOrder { account, index })
            .expect("notification failed");
        Ok(())
    }

    /// `executeIncreaseOrder(account, index)`: callable by anyone once the trigger
    /// condition holds (spec.md §4.3).
    pub fn execute_increase_order(&mut self, account: ActorId, index: OrderIndex) -> Result<PositionKey, Error> {
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState {
            order_book,
            vault,
            ledger,
            price_feed,
            ..
        } = &mut *state;
        let outcome = order_book::execute_increase_order(order_book, vault, ledger, price_feed, account, index, now)?;
        drop(state);

        self.notify_on(OrderBookEvent::ExecuteIncreaseOrder {
            account,
            index,
            execution_price: outcome.mark_price,
        })
        .expect("notification failed");
        Ok(outcome.key)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_decrease_order(
        &mut self,
        token: TokenId,
        collateral_delta: u128,
        size_delta: u128,
        is_long: bool,
        trigger_price: u128,
        trigger_above_threshold: bool,
    ) -> Result<OrderIndex, Error> {
        let account = msg::source();
        let index = order_book::create_decrease_order(
            &mut EngineState::get_mut().order_book,
            account,
            token.clone(),
            collateral_delta,
            size_delta,
            is_long,
            trigger_price,
            trigger_above_threshold,
        )?;

        self.notify_on(OrderBookEvent::CreateDecreaseOrder {
            account,
            index,
            token,
            collateral_delta,
            size_delta,
            is_long,
            trigger_price,
            trigger_above_threshold,
        })
        .expect("notification failed");
        Ok(index)
    }

    pub fn update_decrease_order(
        &mut self,
        index: OrderIndex,
        collateral_delta: u128,
        size_delta: u128,
        trigger_price: u128,
        trigger_above_threshold: bool,
    ) -> Result<(), Error> {
        let account = msg::source();
        order_book::update_decrease_order(
            &mut EngineState::get_mut().order_book,
            account,
            index,
            collateral_delta,
            size_delta,
            trigger_price,
            trigger_above_threshold,
        )?;

        self.notify_on(OrderBookEvent::UpdateDecreaseOrder {
            account,
            index,
            collateral_delta,
            size_delta,
            trigger_price,
            trigger_above_threshold,
        })
        .expect("notification failed");
        Ok(())
    }

    pub fn cancel_decrease_order(&mut self, index: OrderIndex) -> Result<(), Error> {
        let account = msg::source();
        order_book::cancel_decrease_order(&mut EngineState::get_mut().order_book, account, index)?;

        self.notify_on(OrderBookEvent::CancelDecreaseOrder { account, index })
            .expect("notification failed");
        Ok(())
    }

    pub fn execute_decrease_order(&mut self, account: ActorId, index: OrderIndex) -> Result<u128, Error> {
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState {
            order_book,
            vault,
            ledger,
            price_feed,
            ..
        } = &mut *state;
        let outcome = order_book::execute_decrease_order(order_book, vault, ledger, price_feed, account, index, now)?;
        drop(state);

        self.notify_on(OrderBookEvent::ExecuteDecreaseOrder {
            account,
            index,
            execution_price: outcome.mark_price,
        })
        .expect("notification failed");
        Ok(outcome.usd_out_after_fee)
    }

    pub fn increase_orders(&self, account: ActorId, index: OrderIndex) -> Option<IncreaseOrder> {
        EngineState::get().order_book.increase_orders.get(&(account, index)).cloned()
    }

    pub fn decrease_orders(&self, account: ActorId, index: OrderIndex) -> Option<DecreaseOrder> {
        EngineState::get().order_book.decrease_orders.get(&(account, index)).cloned()
    }

    pub fn increase_orders_index(&self, account: ActorId) -> OrderIndex {
        EngineState::get().order_book.increase_order_count.get(&account).copied().unwrap_or(0)
    }

    pub fn decrease_orders_index(&self, account: ActorId) -> OrderIndex {
        EngineState::get().order_book.decrease_order_count.get(&account).copied().unwrap_or(0)
    }
}
