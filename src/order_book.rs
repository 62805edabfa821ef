//! OrderBook: conditional trigger-price orders that forward into the Vault once the
//! mark price crosses the trigger (spec.md §4.3). A thin collaborator — all position
//! math still happens in `crate::vault`; this module only owns order storage and the
//! trigger-price predicate.

use crate::errors::Error;
use crate::ledger::Ledger;
use crate::price_feed::PriceFeedState;
use crate::types::*;
use crate::vault::{self, IncreaseOutcome, VaultState};
use sails_rs::collections::BTreeMap;
use sails_rs::prelude::*;

#[derive(Clone, Debug, Default)]
pub struct OrderBookState {
    pub increase_orders: BTreeMap<(ActorId, OrderIndex), IncreaseOrder>,
    pub decrease_orders: BTreeMap<(ActorId, OrderIndex), DecreaseOrder>,
    pub increase_order_count: IndexCounter,
    pub decrease_order_count: IndexCounter,
}

impl OrderBookState {
    /// Per-account counters start at 1 (spec.md §3: "a per-account monotonic
    /// orderIndex starting at 1"), so the first order created is index 1.
    fn next_increase_index(&mut self, account: ActorId) -> OrderIndex {
        let counter = self.increase_order_count.entry(account).or_insert(0);
        *counter += 1;
        *counter
    }

    fn next_decrease_index(&mut self, account: ActorId) -> OrderIndex {
        let counter = self.decrease_order_count.entry(account).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// `createIncreaseOrder`: escrows `amount` (spec.md §4.3.1) and stores the order.
#[allow(clippy::too_many_arguments)]
pub fn create_increase_order(
    book: &mut OrderBookState,
    ledger: &mut Ledger,
    account: ActorId,
    token: TokenId,
    amount: u128,
    size_delta: u128,
    is_long: bool,
    trigger_price: u128,
    trigger_above_threshold: bool,
) -> Result<OrderIndex, Error> {
    ledger.escrow(account, amount)?;
    let index = book.next_increase_index(account);
    book.increase_orders.insert(
        (account, index),
        IncreaseOrder {
            account,
            token,
            amount,
            size_delta,
            is_long,
            trigger_price,
            trigger_above_threshold,
        },
    );
    Ok(index)
}

/// `updateIncreaseOrder`: only `sizeDelta`/`triggerPrice`/`triggerAboveThreshold`
/// change — the escrowed `amount` is fixed at creation (spec.md §4.3.1).
pub fn update_increase_order(
    book: &mut OrderBookState,
    account: ActorId,
    index: OrderIndex,
    size_delta: u128,
    trigger_price: u128,
    trigger_above_threshold: bool,
) -> Result<(), Error> {
    let order = book
        .increase_orders
        .get_mut(&(account, index))
        .ok_or(Error::OrderNotFound)?;
    order.size_delta = size_delta;
    order.trigger_price = trigger_price;
    order.trigger_above_threshold = trigger_above_threshold;
    Ok(())
}

/// `cancelIncreaseOrder`: refunds the escrow and removes the order.
pub fn cancel_increase_order(
    book: &mut OrderBookState,
    ledger: &mut Ledger,
    account: ActorId,
    index: OrderIndex,
) -> Result<(), Error> {
    let order = book
        .increase_orders
        .remove(&(account, index))
        .ok_or(Error::OrderNotFound)?;
    ledger.unescrow(account, order.amount);
    Ok(())
}

/// `executeIncreaseOrder`: anyone may call once the trigger condition holds
/// (spec.md §4.3.1). `maximise = isLong` — a long entering uses the higher of the
/// max/min oracle read, consistent with `increasePosition`'s own mark price.
pub fn execute_increase_order(
    book: &mut OrderBookState,
    vault_state: &mut VaultState,
    ledger: &mut Ledger,
    price_feed: &PriceFeedState,
    account: ActorId,
    index: OrderIndex,
    now: u64,
) -> Result<IncreaseOutcome, Error> {
    let order = book
        .increase_orders
        .get(&(account, index))
        .cloned()
        .ok_or(Error::OrderNotFound)?;

    let mark_price = price_feed.get_price(&order.token, order.is_long)?;
    if !trigger_satisfied(order.trigger_above_threshold, order.trigger_price, mark_price) {
        return Err(Error::InvalidPriceForExecution);
    }

    // Restore the escrow so Vault::increase_position's own transfer_in pulls it
    // through the normal path (single fee-on-transfer application, not double).
    ledger.unescrow(account, order.amount);
    let outcome = vault::increase_position(
        vault_state,
        ledger,
        price_feed,
        PluginId::OrderBook,
        account,
        order.token.clone(),
        order.amount,
        order.size_delta,
        order.is_long,
        now,
    )?;

    book.increase_orders.remove(&(account, index));
    Ok(outcome)
}

/// `createDecreaseOrder`: no escrow — decrease orders release collateral out of an
/// existing position rather than pulling new funds in (spec.md §4.3.2).
#[allow(clippy::too_many_arguments)]
pub fn create_decrease_order(
    book: &mut OrderBookState,
    account: ActorId,
    token: TokenId,
    collateral_delta: u128,
    size_delta: u128,
    is_long: bool,
    trigger_price: u128,
    trigger_above_threshold: bool,
) -> Result<OrderIndex, Error> {
    let index = book.next_decrease_index(account);
    book.decrease_orders.insert(
        (account, index),
        DecreaseOrder {
            account,
            token,
            collateral_delta,
            size_delta,
            is_long,
            trigger_price,
            trigger_above_threshold,
        },
    );
    Ok(index)
}

pub fn update_decrease_order(
    book: &mut OrderBookState,
    account: ActorId,
    index: OrderIndex,
    collateral_delta: u128,
    size_delta: u128,
    trigger_price: u128,
    trigger_above_threshold: bool,
) -> Result<(), Error> {
    let order = book
        .decrease_orders
        .get_mut(&(account, index))
        .ok_or(Error::OrderNotFound)?;
    order.collateral_delta = collateral_delta;
    order.size_delta = size_delta;
    order.trigger_price = trigger_price;
    order.trigger_above_threshold = trigger_above_threshold;
    Ok(())
}

pub fn cancel_decrease_order(book: &mut OrderBookState, account: ActorId, index: OrderIndex) -> Result<(), Error> {
    book.decrease_orders
        .remove(&(account, index))
        .ok_or(Error::OrderNotFound)?;
    Ok(())
}

/// `executeDecreaseOrder`: `maximise = !isLong` — the opposite bias from increase,
/// matching `decreasePosition`'s own mark-price call (spec.md §4.3.2).
pub fn execute_decrease_order(
    book: &mut OrderBookState,
    vault_state: &mut VaultState,
    ledger: &mut Ledger,
    price_feed: &PriceFeedState,
    account: ActorId,
    index: OrderIndex,
    now: u64,
) -> Result<vault::DecreaseOutcome, Error> {
    let order = book
        .decrease_orders
        .get(&(account, index))
        .cloned()
        .ok_or(Error::OrderNotFound)?;

    let mark_price = price_feed.get_price(&order.token, !order.is_long)?;
    if !trigger_satisfied(order.trigger_above_threshold, order.trigger_price, mark_price) {
        return Err(Error::InvalidPriceForExecution);
    }

    let outcome = vault::decrease_position(
        vault_state,
        ledger,
        price_feed,
        PluginId::OrderBook,
        account,
        order.token.clone(),
        order.collateral_delta,
        order.size_delta,
        order.is_long,
        now,
    )?;

    book.decrease_orders.remove(&(account, index));
    Ok(outcome)
}

/// `triggerAboveThreshold ? currentPrice ≥ triggerPrice : currentPrice ≤ triggerPrice`
/// (spec.md §4.3, non-strict both ways — a price landing exactly on the trigger
/// still fires).
fn trigger_satisfied(trigger_above_threshold: bool, trigger_price: u128, mark_price: u128) -> bool {
    if trigger_above_threshold {
        mark_price >= trigger_price
    } else {
        mark_price <= trigger_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::position_key;

    fn actor(n: u8) -> ActorId {
        ActorId::from([n; 32])
    }

    const ONE_USD: u128 = 1_000_000_000_000_000_000;

    struct Harness {
        book: OrderBookState,
        vault: VaultState,
        ledger: Ledger,
        feed: PriceFeedState,
    }

    impl Harness {
        fn new() -> Self {
            let owner = actor(0);
            let mut vault = VaultState::new(owner);
            vault.plugins.insert(PluginId::OrderBook, true);
            vault::set_whitelisted_token(&mut vault, owner, "BNB".to_string(), 0).unwrap();

            let mut feed = PriceFeedState::default();
            feed.config_token("BNB".to_string(), 8, 18);
            feed.push_round("BNB", 200_00000000).unwrap();

            Self {
                book: OrderBookState::default(),
                vault,
                ledger: Ledger::default(),
                feed,
            }
        }
    }

    #[test]
    fn create_increase_order_escrows_amount() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        create_increase_order(
            &mut h.book,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            190_00000000_u128 * 10_000_000_000, // arbitrary trigger in PRICE_PRECISION-ish units
            true,
        )
        .unwrap();
        assert_eq!(h.ledger.balance_of(actor(1)), 800 * ONE_USD);
    }

    #[test]
    fn cancel_increase_order_refunds_escrow() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let idx = create_increase_order(
            &mut h.book,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1,
            true,
        )
        .unwrap();
        cancel_increase_order(&mut h.book, &mut h.ledger, actor(1), idx).unwrap();
        assert_eq!(h.ledger.balance_of(actor(1)), 1_000 * ONE_USD);
        assert!(!h.book.increase_orders.contains_key(&(actor(1), idx)));
    }

    #[test]
    fn execute_increase_order_fails_when_trigger_not_met() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        // trigger above 300 (scaled to PRICE_PRECISION), but mark price is ~200.
        let trigger = 300 * ONE_USD;
        let idx = create_increase_order(
            &mut h.book,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            trigger,
            true,
        )
        .unwrap();

        let err = execute_increase_order(&mut h.book, &mut h.vault, &mut h.ledger, &h.feed, actor(1), idx, 1_000).unwrap_err();
        assert_eq!(err, Error::InvalidPriceForExecution);
    }

    #[test]
    fn execute_increase_order_opens_position_when_trigger_met() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let trigger = 100 * ONE_USD; // mark ~200 > 100 -> triggers
        let idx = create_increase_order(
            &mut h.book,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            trigger,
            true,
        )
        .unwrap();

        let outcome = execute_increase_order(&mut h.book, &mut h.vault, &mut h.ledger, &h.feed, actor(1), idx, 1_000).unwrap();
        assert_eq!(outcome.size, 400 * ONE_USD);
        assert!(!h.book.increase_orders.contains_key(&(actor(1), idx)));
        let key = position_key(actor(1), "BNB", true);
        assert!(h.vault.positions.contains_key(&key));
    }

    #[test]
    fn executing_missing_order_returns_order_not_found() {
        let mut h = Harness::new();
        let err = execute_increase_order(&mut h.book, &mut h.vault, &mut h.ledger, &h.feed, actor(1), 0, 1_000).unwrap_err();
        assert_eq!(err, Error::OrderNotFound);
    }

    #[test]
    fn decrease_order_create_update_cancel_roundtrip() {
        let mut h = Harness::new();
        let idx = create_decrease_order(&mut h.book, actor(1), "BNB".to_string(), 10, 20, true, 50, false).unwrap();
        update_decrease_order(&mut h.book, actor(1), idx, 15, 25, 60, true).unwrap();
        let order = h.book.decrease_orders.get(&(actor(1), idx)).unwrap();
        assert_eq!(order.collateral_delta, 15);
        assert_eq!(order.trigger_above_threshold, true);
        cancel_decrease_order(&mut h.book, actor(1), idx).unwrap();
        assert!(!h.book.decrease_orders.contains_key(&(actor(1), idx)));
    }

    // spec.md §8 scenarios 1-3, literally: a long increase order with
    // `triggerAboveThreshold = false` only fires once the mark price falls to (or
    // below) the trigger.
    #[test]
    fn scenario_reject_then_execute_untriggered_limit_increase() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);

        let idx = create_increase_order(
            &mut h.book,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            180 * ONE_USD,
            false,
        )
        .unwrap();
        assert_eq!(idx, 1, "first order for an account is index 1");

        // feed reports 300 -> above the 180 trigger, so the order is not yet eligible.
        h.feed.push_round("BNB", 300_00000000).unwrap();
        let err = execute_increase_order(&mut h.book, &mut h.vault, &mut h.ledger, &h.feed, actor(1), idx, 1_000).unwrap_err();
        assert_eq!(err, Error::InvalidPriceForExecution);
        assert_eq!(err.to_string(), "OrderBook: invalid price for execution");

        // feed drops to exactly the trigger -> non-strict comparison fires.
        h.feed.push_round("BNB", 180_00000000).unwrap();
        h.feed.push_round("BNB", 180_00000000).unwrap();
        h.feed.push_round("BNB", 180_00000000).unwrap();
        let outcome = execute_increase_order(&mut h.book, &mut h.vault, &mut h.ledger, &h.feed, actor(1), idx, 1_000).unwrap();
        assert_eq!(outcome.size, 400 * ONE_USD);
    }

    // spec.md §8 scenario 3: cancelling a non-existent order index fails with the
    // pinned error string.
    #[test]
    fn scenario_cancel_non_existent_order_index() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        create_increase_order(
            &mut h.book,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            180 * ONE_USD,
            false,
        )
        .unwrap();

        let err = cancel_increase_order(&mut h.book, &mut h.ledger, actor(1), 2).unwrap_err();
        assert_eq!(err, Error::OrderNotFound);
        assert_eq!(err.to_string(), "OrderBook: non-existent order");
    }
}
