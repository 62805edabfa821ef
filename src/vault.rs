//! The Vault: position accounting, entry-price averaging, funding accrual, pool
//! invariants, and the liquidation predicate (spec.md §4.2). This is the settlement
//! core; everything else in the crate only marshals inputs into these functions.
//!
//! Deliberately `gstd`-free (per SPEC_FULL.md §0): every function takes `now: u64`
//! and the caller's identity as explicit arguments so the whole state machine is
//! unit-testable under plain `#[cfg(test)]`, matching spec.md §8's testable-properties
//! list directly.

use crate::errors::Error;
use crate::ledger::Ledger;
use crate::precision::{mul_div, mul_div3, le_products, FUNDING_INTERVAL, PRECISION};
use crate::types::*;
use sails_rs::collections::BTreeMap;
use sails_rs::prelude::*;

#[derive(Clone, Debug)]
pub struct VaultState {
    pub positions: BTreeMap<PositionKey, Position>,
    pub pool: PoolState,
    pub funding: FundingState,
    pub admin: AdminState,
    pub whitelisted_tokens: BTreeMap<TokenId, TokenRiskConfig>,
    pub plugins: BTreeMap<PluginId, bool>,
}

impl VaultState {
    pub fn new(owner: ActorId) -> Self {
        Self {
            positions: BTreeMap::new(),
            pool: PoolState::default(),
            funding: FundingState::default(),
            admin: AdminState::new(owner),
            whitelisted_tokens: BTreeMap::new(),
            plugins: BTreeMap::new(),
        }
    }

    pub fn is_plugin(&self, caller: PluginId) -> bool {
        self.plugins.get(&caller).copied().unwrap_or(false)
    }

    pub fn is_whitelisted(&self, token: &str) -> bool {
        self.whitelisted_tokens.contains_key(token)
    }
}

/// `getPositionKey(account, token, isLong) = hash(account, token, isLong)` (spec.md §6).
pub fn position_key(account: ActorId, token: &str, is_long: bool) -> PositionKey {
    use sp_core::hashing::keccak_256;
    let mut data = Vec::new();
    data.extend_from_slice(account.as_ref());
    data.extend_from_slice(token.as_bytes());
    data.push(if is_long { 1 } else { 0 });
    H256::from(keccak_256(&data))
}

/// spec.md §4.2.4. `Delta` (profit-or-loss magnitude signed by `has_profit`) lives in
/// `crate::types` so other modules (order book trigger checks) can share it.
pub fn get_delta(
    entry_price: u128,
    size: u128,
    is_long: bool,
    mark_price: u128,
    min_profit_time: u64,
    min_profit_basis_points: u128,
    last_increased_time: u64,
    now: u64,
) -> Result<Delta, Error> {
    if entry_price == 0 {
        return Err(Error::InvalidPrice);
    }
    let price_delta = entry_price.abs_diff(mark_price);
    let mut delta = mul_div(size, price_delta, entry_price)?;
    let has_profit = if is_long {
        mark_price > entry_price
    } else {
        entry_price > mark_price
    };

    // Anti front-running clamp: inside the min-profit window, a small enough profit
    // is treated as zero so a position can't be opened and instantly closed at a
    // hairline favourable tick.
    if has_profit
        && now <= last_increased_time.saturating_add(min_profit_time)
        && le_products(delta, PRECISION, size, min_profit_basis_points)
    {
        delta = 0;
    }

    Ok(Delta { has_profit, delta })
}

/// spec.md §4.2.2: advance the funding accumulator by whole `FUNDING_INTERVAL`
/// windows, leaving it frozen (not reset) while `poolAmount == 0` — the Open
/// Questions section of spec.md pins this as intended behaviour, not a bug to fix.
pub fn refresh_cumulative_funding_rate(funding: &mut FundingState, pool: &PoolState, now: u64) -> Result<(), Error> {
    let last = funding.last_refresh_funding_rate_timestamp;
    if last == 0 {
        funding.last_refresh_funding_rate_timestamp = now;
        return Ok(());
    }
    let elapsed = now.saturating_sub(last);
    if elapsed < FUNDING_INTERVAL {
        return Ok(());
    }
    let intervals = (elapsed / FUNDING_INTERVAL) as u128;

    if pool.pool_amount != 0 {
        let increment = mul_div3(funding.funding_rate_factor, pool.reserved_amount, intervals, pool.pool_amount)?;
        funding.cumulative_funding_rate = funding
            .cumulative_funding_rate
            .checked_add(increment)
            .ok_or(Error::ArithmeticOverflow)?;
    }
    // Advances by the full elapsed time even though `intervals` truncates — spec.md
    // §4.2.2 calls this out explicitly.
    funding.last_refresh_funding_rate_timestamp = last.saturating_add(elapsed);
    Ok(())
}

fn position_funding_fee(size: u128, cumulative_funding_rate: u128, entry_funding_rate: u128) -> Result<u128, Error> {
    let rate_delta = cumulative_funding_rate.saturating_sub(entry_funding_rate);
    mul_div(size, rate_delta, PRECISION)
}

fn position_margin_fee(size_like: u128, margin_fee: u128) -> Result<u128, Error> {
    mul_div(size_like, margin_fee, PRECISION)
}

// ---------------------------------------------------------------------------
// Pool invariant guarded helpers (spec.md §4.2.8)
// ---------------------------------------------------------------------------

fn increase_pool_amount(pool: &mut PoolState, held_balance: u128, delta: u128) -> Result<(), Error> {
    pool.pool_amount = pool.pool_amount.checked_add(delta).ok_or(Error::ArithmeticOverflow)?;
    if pool.pool_amount > held_balance {
        return Err(Error::PoolExceedsBalance);
    }
    Ok(())
}

fn decrease_pool_amount(pool: &mut PoolState, delta: u128) -> Result<(), Error> {
    pool.pool_amount = pool.pool_amount.checked_sub(delta).ok_or(Error::PoolUnderflow)?;
    if pool.reserved_amount > pool.pool_amount {
        return Err(Error::ReserveExceedsPool);
    }
    Ok(())
}

fn increase_reserved_amount(pool: &mut PoolState, delta: u128) -> Result<(), Error> {
    pool.reserved_amount = pool
        .reserved_amount
        .checked_add(delta)
        .ok_or(Error::ArithmeticOverflow)?;
    if pool.reserved_amount > pool.pool_amount {
        return Err(Error::ReserveExceedsPool);
    }
    Ok(())
}

fn decrease_reserved_amount(pool: &mut PoolState, delta: u128) {
    pool.reserved_amount = pool.reserved_amount.saturating_sub(delta);
}

// ---------------------------------------------------------------------------
// increasePosition / decreasePosition preconditions
// ---------------------------------------------------------------------------

fn require_plugin_and_whitelist(state: &VaultState, caller: PluginId, token: &str) -> Result<(), Error> {
    if state.admin.paused {
        return Err(Error::Paused);
    }
    if !state.is_plugin(caller) {
        return Err(Error::NotPlugin);
    }
    if !state.is_whitelisted(token) {
        return Err(Error::NotWhitelisted);
    }
    Ok(())
}

/// Outcome of a successful `increasePosition`, carrying what the service layer needs
/// to emit `IncreasePosition`/`UpdatePosition` (spec.md §6).
#[derive(Clone, Debug)]
pub struct IncreaseOutcome {
    pub key: PositionKey,
    pub mark_price: u128,
    pub size: u128,
    pub collateral: u128,
    pub fee: u128,
    pub reserve_delta: u128,
    pub pool_delta: u128,
}

/// spec.md §4.2.5.
#[allow(clippy::too_many_arguments)]
pub fn increase_position(
    state: &mut VaultState,
    ledger: &mut Ledger,
    price_feed: &crate::price_feed::PriceFeedState,
    caller: PluginId,
    account: ActorId,
    token: TokenId,
    amount_in: u128,
    size_delta: u128,
    is_long: bool,
    now: u64,
) -> Result<IncreaseOutcome, Error> {
    require_plugin_and_whitelist(state, caller, &token)?;

    // Step 1: refresh funding.
    refresh_cumulative_funding_rate(&mut state.funding, &state.pool, now)?;

    // Step 2: pull collateral, measuring the actual delta (fee-on-transfer safe).
    let actual_amount = ledger.transfer_in(account, amount_in)?;

    let key = position_key(account, &token, is_long);
    let mut pos = state
        .positions
        .remove(&key)
        .unwrap_or_else(|| Position::empty(account, token.clone(), is_long));

    // Step 3: mark price and entry-price averaging.
    let mark_price = price_feed.get_price(&token, is_long)?;
    let risk_cfg = state.whitelisted_tokens.get(&token).copied().unwrap_or_default();

    if pos.size == 0 {
        pos.entry_price = mark_price;
    } else if size_delta > 0 {
        let delta = get_delta(
            pos.entry_price,
            pos.size,
            is_long,
            mark_price,
            state.admin.min_profit_time,
            risk_cfg.min_profit_basis_points,
            pos.last_increased_time,
            now,
        )?;
        pos.entry_price = next_entry_price(mark_price, pos.size, size_delta, is_long, delta)?;
    }

    // Step 4: snapshot funding rate for the fee calc below, *then* update size/time.
    // Deliberate ordering (spec.md §4.2.5 note): the funding fee below uses the new
    // `size` but the *previous* `entryFundingRate`, so we must not overwrite
    // `entry_funding_rate` until after computing `fee`.
    let prev_entry_funding_rate = pos.entry_funding_rate;
    pos.size = pos.size.checked_add(size_delta).ok_or(Error::ArithmeticOverflow)?;
    pos.last_increased_time = now;

    // Step 5: fees.
    let position_fee = position_margin_fee(size_delta, state.admin.margin_fee)?;
    let funding_fee = position_funding_fee(pos.size, state.funding.cumulative_funding_rate, prev_entry_funding_rate)?;
    let fee = position_fee.checked_add(funding_fee).ok_or(Error::ArithmeticOverflow)?;
    state.pool.fee_reserves = state.pool.fee_reserves.checked_add(fee).ok_or(Error::ArithmeticOverflow)?;

    pos.entry_funding_rate = state.funding.cumulative_funding_rate;

    // Step 6: settle collateral.
    let net_in = actual_amount.checked_sub(fee).ok_or(Error::FeeExceedsDeposit)?;
    pos.collateral = pos.collateral.checked_add(net_in).ok_or(Error::ArithmeticOverflow)?;
    if pos.size < pos.collateral {
        return Err(Error::SizeLessThanCollateral);
    }

    // Step 7: the position must not be immediately liquidatable.
    validate_not_liquidatable(&pos, mark_price, &state.admin, &state.funding, risk_cfg, now)?;

    // Step 8: reserve.
    pos.reserve_amount = pos.reserve_amount.checked_add(size_delta).ok_or(Error::ArithmeticOverflow)?;
    increase_reserved_amount(&mut state.pool, size_delta)?;

    // Step 9: longs keep their collateral inside the pool.
    let pool_delta = if is_long {
        increase_pool_amount(&mut state.pool, ledger.dollar_held, actual_amount)?;
        decrease_pool_amount(&mut state.pool, fee)?;
        actual_amount.saturating_sub(fee)
    } else {
        0
    };

    let outcome = IncreaseOutcome {
        key,
        mark_price,
        size: pos.size,
        collateral: pos.collateral,
        fee,
        reserve_delta: size_delta,
        pool_delta,
    };
    state.positions.insert(key, pos);
    Ok(outcome)
}

/// spec.md §4.2.3.
fn next_entry_price(mark_price: u128, size: u128, size_delta: u128, is_long: bool, delta: Delta) -> Result<u128, Error> {
    let next_size = size.checked_add(size_delta).ok_or(Error::ArithmeticOverflow)?;
    let denom = if is_long == delta.has_profit {
        next_size.checked_add(delta.delta).ok_or(Error::ArithmeticOverflow)?
    } else {
        next_size.checked_sub(delta.delta).ok_or(Error::ArithmeticOverflow)?
    };
    mul_div(mark_price, next_size, denom)
}

/// Outcome of a successful `decreasePosition` (spec.md §4.2.6).
#[derive(Clone, Debug)]
pub struct DecreaseOutcome {
    pub key: PositionKey,
    pub mark_price: u128,
    pub usd_out: u128,
    pub usd_out_after_fee: u128,
    pub fee: u128,
    pub is_close: bool,
    pub realised_pnl: i128,
    pub remaining_size: u128,
    pub remaining_collateral: u128,
    pub reserve_delta: u128,
    pub has_profit: bool,
    pub pnl_delta: u128,
}

/// spec.md §4.2.6.
#[allow(clippy::too_many_arguments)]
pub fn decrease_position(
    state: &mut VaultState,
    ledger: &mut Ledger,
    price_feed: &crate::price_feed::PriceFeedState,
    caller: PluginId,
    account: ActorId,
    token: TokenId,
    collateral_delta: u128,
    size_delta: u128,
    is_long: bool,
    now: u64,
) -> Result<DecreaseOutcome, Error> {
    require_plugin_and_whitelist(state, caller, &token)?;
    refresh_cumulative_funding_rate(&mut state.funding, &state.pool, now)?;

    let key = position_key(account, &token, is_long);
    let mut pos = state.positions.remove(&key).ok_or(Error::PositionNotExist)?;

    if pos.size == 0 {
        return Err(Error::PositionNotExist);
    }
    if pos.size < size_delta {
        return Err(Error::InvalidPositionSize);
    }
    if pos.collateral <= collateral_delta {
        return Err(Error::CollateralExceeded);
    }

    // Step 2: release the proportional reserve up front.
    let reserve_delta = mul_div(pos.reserve_amount, size_delta, pos.size)?;
    pos.reserve_amount = pos.reserve_amount.saturating_sub(reserve_delta);
    decrease_reserved_amount(&mut state.pool, reserve_delta);

    // Step 3: the adversarial mark price for closing (opposite of opening).
    let mark_price = price_feed.get_price(&token, !is_long)?;
    let risk_cfg = state.whitelisted_tokens.get(&token).copied().unwrap_or_default();

    // Step 4: adjustCollateral.
    let delta = get_delta(
        pos.entry_price,
        pos.size,
        is_long,
        mark_price,
        state.admin.min_profit_time,
        risk_cfg.min_profit_basis_points,
        pos.last_increased_time,
        now,
    )?;
    let adjusted_delta = mul_div(size_delta, delta.delta, pos.size)?;

    let mut usd_out: u128 = 0;
    if delta.has_profit {
        usd_out = adjusted_delta;
        pos.realised_pnl = pos
            .realised_pnl
            .checked_add(adjusted_delta as i128)
            .ok_or(Error::ArithmeticOverflow)?;
        if !is_long {
            decrease_pool_amount(&mut state.pool, adjusted_delta)?;
        }
    } else {
        pos.collateral = pos
            .collateral
            .checked_sub(adjusted_delta)
            .ok_or(Error::LossesExceedCollateral)?;
        pos.realised_pnl = pos
            .realised_pnl
            .checked_sub(adjusted_delta as i128)
            .ok_or(Error::ArithmeticOverflow)?;
        if !is_long {
            increase_pool_amount(&mut state.pool, ledger.dollar_held, adjusted_delta)?;
        }
    }

    if collateral_delta > 0 {
        usd_out = usd_out.checked_add(collateral_delta).ok_or(Error::ArithmeticOverflow)?;
        pos.collateral = pos
            .collateral
            .checked_sub(collateral_delta)
            .ok_or(Error::CollateralExceeded)?;
    }

    let is_close = pos.size == size_delta;
    if is_close {
        usd_out = usd_out.checked_add(pos.collateral).ok_or(Error::ArithmeticOverflow)?;
        pos.collateral = 0;
    }

    // Fees computed against the size *before* this decrease takes effect.
    let position_fee = position_margin_fee(size_delta, state.admin.margin_fee)?;
    let funding_fee = position_funding_fee(pos.size, state.funding.cumulative_funding_rate, pos.entry_funding_rate)?;
    let fee = position_fee.checked_add(funding_fee).ok_or(Error::ArithmeticOverflow)?;
    state.pool.fee_reserves = state.pool.fee_reserves.checked_add(fee).ok_or(Error::ArithmeticOverflow)?;

    let usd_out_after_fee = if usd_out > fee {
        usd_out - fee
    } else {
        pos.collateral = pos.collateral.saturating_sub(fee);
        if is_long {
            decrease_pool_amount(&mut state.pool, fee)?;
        }
        usd_out
    };

    if !is_close {
        pos.entry_funding_rate = state.funding.cumulative_funding_rate;
        pos.size = pos.size.checked_sub(size_delta).ok_or(Error::ArithmeticOverflow)?;
        if pos.size < pos.collateral {
            return Err(Error::SizeLessThanCollateral);
        }
        validate_not_liquidatable(&pos, mark_price, &state.admin, &state.funding, risk_cfg, now)?;
    }

    let outcome = DecreaseOutcome {
        key,
        mark_price,
        usd_out,
        usd_out_after_fee,
        fee,
        is_close,
        realised_pnl: pos.realised_pnl,
        remaining_size: pos.size,
        remaining_collateral: pos.collateral,
        reserve_delta,
        has_profit: delta.has_profit,
        pnl_delta: delta.delta,
    };

    if !is_close {
        state.positions.insert(key, pos);
    }

    if usd_out > 0 {
        if is_long {
            decrease_pool_amount(&mut state.pool, usd_out)?;
        }
        ledger.transfer_out(account, usd_out_after_fee)?;
    }

    Ok(outcome)
}

/// spec.md §4.2.7, collapsed to a single pass/fail rather than the historical
/// integer-code reporter (spec.md §9 "Errors vs codes"): the specific variant tells
/// the caller *why*, while `liquidate_position` itself only needs pass/fail.
fn validate_not_liquidatable(
    pos: &Position,
    mark_price: u128,
    admin: &AdminState,
    funding: &FundingState,
    risk_cfg: TokenRiskConfig,
    now: u64,
) -> Result<(), Error> {
    if pos.size == 0 {
        return Err(Error::PositionNotExist);
    }
    let delta = get_delta(
        pos.entry_price,
        pos.size,
        pos.is_long,
        mark_price,
        admin.min_profit_time,
        risk_cfg.min_profit_basis_points,
        pos.last_increased_time,
        now,
    )?;

    if !delta.has_profit && pos.collateral <= delta.delta {
        return Err(Error::LossesExceedCollateral);
    }
    let remaining_collateral = if delta.has_profit {
        pos.collateral
    } else {
        pos.collateral - delta.delta
    };

    let funding_fee = position_funding_fee(pos.size, funding.cumulative_funding_rate, pos.entry_funding_rate)?;
    let position_fee = position_margin_fee(pos.size, admin.margin_fee)?;
    let fees = funding_fee.checked_add(position_fee).ok_or(Error::ArithmeticOverflow)?;

    if remaining_collateral < fees {
        return Err(Error::FeesExceedCollateral);
    }
    let fees_plus_liquidation = fees.checked_add(admin.liquidation_fee).ok_or(Error::ArithmeticOverflow)?;
    if remaining_collateral < fees_plus_liquidation {
        return Err(Error::LiquidationFeesExceedCollateral);
    }
    if remaining_collateral == 0 || pos.size / remaining_collateral > admin.max_leverage {
        return Err(Error::MaxLeverageExceeded);
    }
    Ok(())
}

/// `liquidatePositionAllowed(key, token, isLong, raise)`: the externally-callable
/// view (spec.md §4.2.1/§4.2.7). The spec's `raise` toggle only changes whether the
/// EVM original reverts or returns a boolean; a systems port just returns the
/// specific failing variant either way and lets the caller decide how to present it.
pub fn liquidate_position_allowed_for(
    state: &VaultState,
    price_feed: &crate::price_feed::PriceFeedState,
    key: PositionKey,
    token: &str,
    is_long: bool,
    now: u64,
) -> Result<(), Error> {
    let pos = state.positions.get(&key).ok_or(Error::PositionNotExist)?;
    if pos.size == 0 {
        return Err(Error::PositionNotExist);
    }
    let mark_price = price_feed.get_price(token, !is_long)?;
    let risk_cfg = state.whitelisted_tokens.get(token).copied().unwrap_or_default();
    validate_not_liquidatable(pos, mark_price, &state.admin, &state.funding, risk_cfg, now)
}

/// Outcome of a successful `liquidatePosition` (spec.md §4.2.7).
#[derive(Clone, Debug)]
pub struct LiquidationOutcome {
    pub key: PositionKey,
    pub size: u128,
    pub collateral: u128,
    pub reserve_amount: u128,
    pub realised_pnl: i128,
    pub mark_price: u128,
}

/// `liquidatePosition(account, token, isLong)`: callable by anyone (spec.md §4.2.1).
/// Collapses every specific liquidation-predicate failure into the single pinned
/// `NotLiquidatable` ("Vault: position cannot be liquidated") string, matching spec.md
/// §8 scenario 6 and the exact-string requirement in §6.
pub fn liquidate_position(
    state: &mut VaultState,
    price_feed: &crate::price_feed::PriceFeedState,
    account: ActorId,
    token: TokenId,
    is_long: bool,
    now: u64,
) -> Result<LiquidationOutcome, Error> {
    refresh_cumulative_funding_rate(&mut state.funding, &state.pool, now)?;

    let key = position_key(account, &token, is_long);
    let pos = state.positions.get(&key).cloned().ok_or(Error::PositionNotExist)?;
    if pos.size == 0 {
        return Err(Error::PositionNotExist);
    }

    if liquidate_position_allowed_for(state, price_feed, key, &token, is_long, now).is_err() {
        return Err(Error::NotLiquidatable);
    }

    decrease_reserved_amount(&mut state.pool, pos.reserve_amount);
    state.positions.remove(&key);

    let mark_price = price_feed.get_price(&token, !is_long)?;
    Ok(LiquidationOutcome {
        key,
        size: pos.size,
        collateral: pos.collateral,
        reserve_amount: pos.reserve_amount,
        realised_pnl: pos.realised_pnl,
        mark_price,
    })
}

// ---------------------------------------------------------------------------
// buyUSDG / sellUSDG (spec.md §4.2.1)
// ---------------------------------------------------------------------------

/// `buyUSDG(amount)`: pulls `amount` dollars, mints USDG 1:1 against the actually
/// received (fee-on-transfer safe) delta, and grows `poolAmount` by the same delta.
pub fn buy_usdg(state: &mut VaultState, ledger: &mut Ledger, account: ActorId, amount: u128, now: u64) -> Result<u128, Error> {
    if state.admin.paused {
        return Err(Error::Paused);
    }
    if amount == 0 {
        return Err(Error::InvalidUsdgAmount);
    }
    refresh_cumulative_funding_rate(&mut state.funding, &state.pool, now)?;

    let actual_amount = ledger.transfer_in(account, amount)?;
    increase_pool_amount(&mut state.pool, ledger.dollar_held, actual_amount)?;
    ledger.mint_usdg(account, actual_amount);
    Ok(actual_amount)
}

/// `sellUSDG(amount)`: burns USDG, shrinks `poolAmount`, and pays dollars back out.
pub fn sell_usdg(state: &mut VaultState, ledger: &mut Ledger, account: ActorId, amount: u128, now: u64) -> Result<u128, Error> {
    if state.admin.paused {
        return Err(Error::Paused);
    }
    if amount == 0 {
        return Err(Error::InvalidUsdgAmount);
    }
    refresh_cumulative_funding_rate(&mut state.funding, &state.pool, now)?;

    ledger.burn_usdg(account, amount)?;
    decrease_pool_amount(&mut state.pool, amount)?;
    ledger.transfer_out(account, amount)?;
    Ok(amount)
}

// ---------------------------------------------------------------------------
// Admin (spec.md §4.5)
// ---------------------------------------------------------------------------

pub fn set_plugin(state: &mut VaultState, caller: ActorId, plugin: PluginId, allowed: bool) -> Result<(), Error> {
    require_owner(state, caller)?;
    state.plugins.insert(plugin, allowed);
    Ok(())
}

pub fn set_whitelisted_token(
    state: &mut VaultState,
    caller: ActorId,
    token: TokenId,
    min_profit_basis_points: u128,
) -> Result<(), Error> {
    require_owner(state, caller)?;
    if state.whitelisted_tokens.contains_key(&token) {
        return Err(Error::MarketAlreadyWhitelisted);
    }
    state
        .whitelisted_tokens
        .insert(token, TokenRiskConfig { min_profit_basis_points });
    Ok(())
}

pub fn clear_whitelisted_token(state: &mut VaultState, caller: ActorId, token: &str) -> Result<(), Error> {
    require_owner(state, caller)?;
    if state.whitelisted_tokens.remove(token).is_none() {
        return Err(Error::NotWhitelisted);
    }
    Ok(())
}

pub fn pause(state: &mut VaultState, caller: ActorId) -> Result<(), Error> {
    require_owner(state, caller)?;
    state.admin.paused = true;
    Ok(())
}

pub fn unpause(state: &mut VaultState, caller: ActorId) -> Result<(), Error> {
    require_owner(state, caller)?;
    state.admin.paused = false;
    Ok(())
}

/// Owner-only risk-parameter setters (spec.md §3 "Admin state"). The original
/// contract wires these through its constructor/governance surface; here they are
/// plain setters behind the same `owner` gate as `pause`/`setPlugin`.
pub fn set_liquidation_fee(state: &mut VaultState, caller: ActorId, liquidation_fee: u128) -> Result<(), Error> {
    require_owner(state, caller)?;
    state.admin.liquidation_fee = liquidation_fee;
    Ok(())
}

pub fn set_margin_fee(state: &mut VaultState, caller: ActorId, margin_fee: u128) -> Result<(), Error> {
    require_owner(state, caller)?;
    state.admin.margin_fee = margin_fee;
    Ok(())
}

pub fn set_max_leverage(state: &mut VaultState, caller: ActorId, max_leverage: u128) -> Result<(), Error> {
    require_owner(state, caller)?;
    state.admin.max_leverage = max_leverage;
    Ok(())
}

pub fn set_min_profit_time(state: &mut VaultState, caller: ActorId, min_profit_time: u64) -> Result<(), Error> {
    require_owner(state, caller)?;
    state.admin.min_profit_time = min_profit_time;
    Ok(())
}

pub fn set_funding_rate_factor(state: &mut VaultState, caller: ActorId, funding_rate_factor: u128) -> Result<(), Error> {
    require_owner(state, caller)?;
    state.funding.funding_rate_factor = funding_rate_factor;
    Ok(())
}

fn require_owner(state: &VaultState, caller: ActorId) -> Result<(), Error> {
    if state.admin.owner != caller {
        return Err(Error::NotOwner);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_feed::PriceFeedState;

    fn actor(n: u8) -> ActorId {
        ActorId::from([n; 32])
    }

    struct Harness {
        state: VaultState,
        ledger: Ledger,
        feed: PriceFeedState,
    }

    impl Harness {
        fn new() -> Self {
            let owner = actor(0);
            let mut state = VaultState::new(owner);
            state.plugins.insert(PluginId::OrderBook, true);
            set_whitelisted_token(&mut state, owner, "BNB".to_string(), 0).unwrap();

            let mut feed = PriceFeedState::default();
            feed.config_token("BNB".to_string(), 8, 18);

            Self {
                state,
                ledger: Ledger::default(),
                feed,
            }
        }

        fn push_price(&mut self, raw: i128) {
            self.feed.push_round("BNB", raw).unwrap();
        }
    }

    const ONE_USD: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn opening_a_position_sets_entry_price_and_reserves() {
        let mut h = Harness::new();
        h.push_price(200_00000000); // $200, feed decimals 8
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);

        let outcome = increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1_000,
        )
        .unwrap();

        assert_eq!(outcome.size, 400 * ONE_USD);
        assert!(h.state.pool.reserved_amount <= h.state.pool.pool_amount);
        assert!(h.state.pool.reserved_amount > 0);
        let pos = h.state.positions.get(&outcome.key).unwrap();
        assert_eq!(pos.entry_price, outcome.mark_price);
        assert!(pos.size >= pos.collateral);
    }

    #[test]
    fn increase_rejects_unwhitelisted_token() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let err = increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "ETH".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1_000,
        )
        .unwrap_err();
        assert_eq!(err, Error::NotWhitelisted);
    }

    #[test]
    fn increase_rejects_unregistered_plugin() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let err = increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::Market,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1_000,
        )
        .unwrap_err();
        assert_eq!(err, Error::NotPlugin);
    }

    #[test]
    fn full_close_at_unchanged_price_deletes_position_and_pays_back_collateral_minus_fees() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);

        let open = increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1_000,
        )
        .unwrap();

        let close = decrease_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            0,
            400 * ONE_USD,
            true,
            1_500, // within one FUNDING_INTERVAL of open
        )
        .unwrap();

        assert!(close.is_close);
        assert!(!h.state.positions.contains_key(&open.key));
        let final_balance = h.ledger.balance_of(actor(1));
        let expected = 1_000 * ONE_USD - open.fee - close.fee;
        assert_eq!(final_balance, expected);
        // no price movement within the funding interval -> accumulator unchanged.
        assert_eq!(h.state.funding.cumulative_funding_rate, 0);
    }

    #[test]
    fn decrease_requires_existing_position() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        let err = decrease_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            0,
            1,
            true,
            1_000,
        )
        .unwrap_err();
        assert_eq!(err, Error::PositionNotExist);
    }

    #[test]
    fn decrease_with_size_delta_equal_to_size_deletes_position() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        let open = increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            500 * ONE_USD,
            400 * ONE_USD,
            true,
            1_000,
        )
        .unwrap();

        let close = decrease_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            0,
            400 * ONE_USD,
            true,
            1_000,
        )
        .unwrap();
        assert!(close.is_close);
        assert!(!h.state.positions.contains_key(&open.key));
    }

    #[test]
    fn increase_with_zero_size_delta_updates_funding_snapshot_without_moving_entry_price() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);

        let open = increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1_000,
        )
        .unwrap();
        let entry_price_before = h.state.positions.get(&open.key).unwrap().entry_price;

        // price moves, but sizeDelta = 0 and amountIn > 0
        h.push_price(300_00000000);
        let top_up = increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            10 * ONE_USD,
            0,
            true,
            30_000,
        )
        .unwrap();

        let pos = h.state.positions.get(&top_up.key).unwrap();
        assert_eq!(pos.entry_price, entry_price_before);
        assert_eq!(pos.last_increased_time, 30_000);
        assert_eq!(pos.entry_funding_rate, h.state.funding.cumulative_funding_rate);
    }

    #[test]
    fn liquidation_on_price_collapse_retains_collateral_and_zeroes_position() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);

        increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD, // 2x leverage on 200 collateral, well under max_leverage
            true,
            1_000,
        )
        .unwrap();

        h.push_price(100_00000000); // halves: full loss of collateral at 2x
        let outcome = liquidate_position(&mut h.state, &h.feed, actor(1), "BNB".to_string(), true, 100_000).unwrap();

        assert_eq!(outcome.size, 400 * ONE_USD);
        assert_eq!(h.ledger.balance_of(actor(1)), 1_000 * ONE_USD - 200 * ONE_USD);
        let key = position_key(actor(1), "BNB", true);
        assert!(!h.state.positions.contains_key(&key));
    }

    #[test]
    fn no_liquidation_while_in_profit() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);

        increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            200 * ONE_USD,
            400 * ONE_USD,
            true,
            1_000,
        )
        .unwrap();

        h.push_price(220_00000000);
        let err = liquidate_position(&mut h.state, &h.feed, actor(1), "BNB".to_string(), true, 100_000).unwrap_err();
        assert_eq!(err, Error::NotLiquidatable);
    }

    #[test]
    fn funding_accumulator_is_monotone_non_decreasing() {
        let mut h = Harness::new();
        h.push_price(200_00000000);
        h.ledger.credit_external(actor(1), 1_000 * ONE_USD);
        h.ledger.credit_external(actor(2), 1_000 * ONE_USD);

        increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(1),
            "BNB".to_string(),
            500 * ONE_USD,
            400 * ONE_USD,
            true,
            0,
        )
        .unwrap();

        let before = h.state.funding.cumulative_funding_rate;
        increase_position(
            &mut h.state,
            &mut h.ledger,
            &h.feed,
            PluginId::OrderBook,
            actor(2),
            "BNB".to_string(),
            500 * ONE_USD,
            100 * ONE_USD,
            true,
            FUNDING_INTERVAL * 3,
        )
        .unwrap();
        let after = h.state.funding.cumulative_funding_rate;
        assert!(after >= before);
    }

    #[test]
    fn buy_and_sell_usdg_round_trip() {
        let mut h = Harness::new();
        h.ledger.credit_external(actor(1), 500 * ONE_USD);
        let minted = buy_usdg(&mut h.state, &mut h.ledger, actor(1), 300 * ONE_USD, 10).unwrap();
        assert_eq!(minted, 300 * ONE_USD);
        assert_eq!(h.state.pool.pool_amount, 300 * ONE_USD);

        let redeemed = sell_usdg(&mut h.state, &mut h.ledger, actor(1), 100 * ONE_USD, 20).unwrap();
        assert_eq!(redeemed, 100 * ONE_USD);
        assert_eq!(h.state.pool.pool_amount, 200 * ONE_USD);
        assert_eq!(h.ledger.balance_of(actor(1)), 300 * ONE_USD);
    }

    #[test]
    fn only_owner_can_whitelist_tokens() {
        let mut h = Harness::new();
        let err = set_whitelisted_token(&mut h.state, actor(9), "ETH".to_string(), 0).unwrap_err();
        assert_eq!(err, Error::NotOwner);
    }
}
