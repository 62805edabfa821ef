//! Market: delayed market-order requests (spec.md §4.4). A two-phase
//! create-then-execute flow that lets a keeper apply a slightly later mark price,
//! rather than the trigger-price conditionals `order_book` handles.

use crate::errors::Error;
use crate::ledger::Ledger;
use crate::price_feed::PriceFeedState;
use crate::types::*;
use crate::vault::{self, DecreaseOutcome, IncreaseOutcome, VaultState};
use sails_rs::collections::BTreeMap;
use sails_rs::prelude::*;

/// How long (in the same time unit as `now`/`block_time`) a request stays
/// executable/cancellable before it is considered expired (spec.md §4.4, "default
/// 300s in tests").
pub const MAX_TIME_DELAY: u64 = 300;

#[derive(Clone, Debug)]
pub struct MarketState {
    pub increase_requests: BTreeMap<RequestKey, IncreasePositionRequest>,
    pub decrease_requests: BTreeMap<RequestKey, DecreasePositionRequest>,
    pub increase_index: IndexCounter,
    pub decrease_index: IndexCounter,
    pub max_time_delay: u64,
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            increase_requests: BTreeMap::new(),
            decrease_requests: BTreeMap::new(),
            increase_index: IndexCounter::new(),
            decrease_index: IndexCounter::new(),
            max_time_delay: MAX_TIME_DELAY,
        }
    }
}

/// `hash(account, index)` (spec.md §6), reusing the same keccak construction as
/// `vault::position_key` for a consistent derivation style across the crate.
fn request_key(account: ActorId, index: u64) -> RequestKey {
    use sp_core::hashing::keccak_256;
    let mut data = Vec::new();
    data.extend_from_slice(account.as_ref());
    data.extend_from_slice(&index.to_le_bytes());
    H256::from(keccak_256(&data))
}

fn next_index(counter: &mut IndexCounter, account: ActorId) -> u64 {
    let slot = counter.entry(account).or_insert(0);
    let idx = *slot;
    *slot += 1;
    idx
}

/// `createIncreasePositionRequest`: escrows `amountIn + executionFee` and queues the
/// request keyed off the caller's own request counter.
#[allow(clippy::too_many_arguments)]
pub fn create_increase_position_request(
    market: &mut MarketState,
    ledger: &mut Ledger,
    account: ActorId,
    token: TokenId,
    amount_in: u128,
    size_delta: u128,
    is_long: bool,
    execution_fee: u128,
    now: u64,
) -> Result<RequestKey, Error> {
    let total = amount_in.checked_add(execution_fee).ok_or(Error::ArithmeticOverflow)?;
    ledger.escrow(account, total)?;

    let index = next_index(&mut market.increase_index, account);
    let key = request_key(account, index);
    market.increase_requests.insert(
        key,
        IncreasePositionRequest {
            account,
            token,
            amount_in,
            size_delta,
            is_long,
            block_time: now,
            execution_fee,
        },
    );
    Ok(key)
}

/// `cancelIncreasePositionRequest`: only while `blockTime + maxTimeDelay > now`
/// (spec.md §4.4, the precise per-operation contract — see DESIGN.md for why this is
/// followed over §5's looser narrative about cancelling "expired" requests).
pub fn cancel_increase_position_request(
    market: &mut MarketState,
    ledger: &mut Ledger,
    account: ActorId,
    key: RequestKey,
    now: u64,
) -> Result<(), Error> {
    let request = market.increase_requests.get(&key).ok_or(Error::RequestNotFound)?;
    if request.account != account {
        return Err(Error::RequestNotFound);
    }
    if request.block_time.saturating_add(market.max_time_delay) <= now {
        return Err(Error::RequestExpired);
    }
    let request = market.increase_requests.remove(&key).expect("checked above");
    ledger.unescrow(account, request.amount_in.saturating_add(request.execution_fee));
    Ok(())
}

/// `executeIncreasePositionRequest`: a no-op success if the key is already gone
/// (spec.md §4.4 "silently succeeds if the request no longer exists" — a keeper may
/// race another keeper executing the same request). Fails loudly with the pinned
/// expiry string once `blockTime + maxTimeDelay <= now`.
pub fn execute_increase_position_request(
    market: &mut MarketState,
    vault_state: &mut VaultState,
    ledger: &mut Ledger,
    price_feed: &PriceFeedState,
    key: RequestKey,
    now: u64,
) -> Result<Option<IncreaseOutcome>, Error> {
    let Some(request) = market.increase_requests.get(&key).cloned() else {
        return Ok(None);
    };

    if request.block_time.saturating_add(market.max_time_delay) <= now {
        return Err(Error::RequestExpired);
    }

    ledger.unescrow(request.account, request.amount_in);
    let outcome = vault::increase_position(
        vault_state,
        ledger,
        price_feed,
        PluginId::Market,
        request.account,
        request.token.clone(),
        request.amount_in,
        request.size_delta,
        request.is_long,
        now,
    )?;

    // Execution fee is consumed as a keeper incentive; it never returns to the
    // account, it leaves escrow permanently (spec.md §4.4).
    market.increase_requests.remove(&key);
    Ok(Some(outcome))
}

#[allow(clippy::too_many_arguments)]
pub fn create_decrease_position_request(
    market: &mut MarketState,
    ledger: &mut Ledger,
    account: ActorId,
    token: TokenId,
    collateral_delta: u128,
    size_delta: u128,
    is_long: bool,
    execution_fee: u128,
    now: u64,
) -> Result<RequestKey, Error> {
    ledger.escrow(account, execution_fee)?;

    let index = next_index(&mut market.decrease_index, account);
    let key = request_key(account, index);
    market.decrease_requests.insert(
        key,
        DecreasePositionRequest {
            account,
            token,
            collateral_delta,
            size_delta,
            is_long,
            block_time: now,
            execution_fee,
        },
    );
    Ok(key)
}

pub fn cancel_decrease_position_request(
    market: &mut MarketState,
    ledger: &mut Ledger,
    account: ActorId,
    key: RequestKey,
    now: u64,
) -> Result<(), Error> {
    let request = market.decrease_requests.get(&key).ok_or(Error::RequestNotFound)?;
    if request.account != account {
        return Err(Error::RequestNotFound);
    }
    if request.block_time.saturating_add(market.max_time_delay) <= now {
        return Err(Error::RequestExpired);
    }
    let request = market.decrease_requests.remove(&key).expect("checked above");
    ledger.unescrow(account, request.execution_fee);
    Ok(())
}

pub fn execute_decrease_position_request(
    market: &mut MarketState,
    vault_state: &mut VaultState,
    ledger: &mut Ledger,
    price_feed: &PriceFeedState,
    key: RequestKey,
    now: u64,
) -> Result<Option<DecreaseOutcome>, Error> {
    let Some(request) = market.decrease_requests.get(&key).cloned() else {
        return Ok(None);
    };

    if request.block_time.saturating_add(market.max_time_delay) <= now {
        return Err(Error::RequestExpired);
    }

    let outcome = vault::decrease_position(
        vault_state,
        ledger,
        price_feed,
        PluginId::Market,
        request.account,
        request.token.clone(),
        request.collateral_delta,
        request.size_delta,
        request.is_long,
        now,
    )?;

    market.decrease_requests.remove(&key);
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(n: u8) -> ActorId {
        ActorId::from([n; 32])
    }

    const ONE_USD: u128 = 1_000_000_000_000_000_000;

    struct Harness {
        market: MarketState,
        vault: VaultState,
        ledger: Ledger,
        feed: PriceFeedState,
    }

    impl Harness {
        fn new() -> Self {
            let owner = actor(0);
            let mut vault = VaultState::new(owner);
            vault.plugins.insert(PluginId::Market, true);
            vault::set_whitelisted_token(&mut vault, owner, "BNB".to_string(), 0).unwrap();

            let mut feed = PriceFeedState::default();
            feed.config_token("BNB".to_string(), 8, 18);
            feed.push_round("BNB", 200_00000000).unwrap();

            Self {
                market: MarketState::default(),
                vault,
                ledger: Ledger::default(),
                feed,
            }
        }
    }

    #[test]
    fn create_escrows_amount_plus_execution_fee() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        create_increase_position_request(
            &mut h.market,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1 * ONE_USD,
            0,
        )
        .unwrap();
        assert_eq!(h.ledger.balance_of(actor(1)), 799 * ONE_USD);
    }

    #[test]
    fn execute_before_expiry_opens_position() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let key = create_increase_position_request(
            &mut h.market,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1 * ONE_USD,
            1_000,
        )
        .unwrap();

        let outcome = execute_increase_position_request(&mut h.market, &mut h.vault, &mut h.ledger, &h.feed, key, 1_010)
            .unwrap()
            .expect("request exists");
        assert_eq!(outcome.size, 400 * ONE_USD);
        assert!(!h.market.increase_requests.contains_key(&key));
    }

    #[test]
    fn execute_after_max_time_delay_returns_expired_error() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let key = create_increase_position_request(
            &mut h.market,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1 * ONE_USD,
            1_000,
        )
        .unwrap();

        let now = 1_000 + MAX_TIME_DELAY + 1;
        let err = execute_increase_position_request(&mut h.market, &mut h.vault, &mut h.ledger, &h.feed, key, now).unwrap_err();
        assert_eq!(err, Error::RequestExpired);
        assert_eq!(
            err.to_string(),
            "Market::executeIncreasePosition Request has expired"
        );
    }

    #[test]
    fn execute_missing_request_is_a_silent_no_op() {
        let mut h = Harness::new();
        let key = request_key(actor(1), 9999);
        let result = execute_increase_position_request(&mut h.market, &mut h.vault, &mut h.ledger, &h.feed, key, 1_000).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn cancel_within_window_refunds_escrow() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let key = create_increase_position_request(
            &mut h.market,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1 * ONE_USD,
            1_000,
        )
        .unwrap();
        cancel_increase_position_request(&mut h.market, &mut h.ledger, actor(1), key, 1_050).unwrap();
        assert_eq!(h.ledger.balance_of(actor(1)), 1_000 * ONE_USD);
    }

    #[test]
    fn cancel_after_window_fails_with_expired() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let key = create_increase_position_request(
            &mut h.market,
            &mut h.ledger,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1 * ONE_USD,
            1_000,
        )
        .unwrap();
        let now = 1_000 + MAX_TIME_DELAY + 1;
        let err = cancel_increase_position_request(&mut h.market, &mut h.ledger, actor(1), key, now).unwrap_err();
        assert_eq!(err, Error::RequestExpired);
    }
}
