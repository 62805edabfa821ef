use crate::errors::Error;
use crate::events::VaultEvent;
use crate::types::*;
use crate::vault;
use crate::EngineState;
use sails_rs::gstd::{exec, msg};
use sails_rs::prelude::*;

#[derive(Default)]
pub struct VaultService;

impl VaultService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl VaultService {
    /// `increasePosition(account, token, amountIn, sizeDelta, isLong)` — the
    /// plugin identity is `msg::source()` itself, never a caller-supplied argument
    /// (spec.md §4.5: the gate is "are *you* a plugin", not "is *some* plugin
    /// registered"). The built-in `OrderBook`/`Market` identities are only ever
    /// passed to `crate::vault::increase_position` from those collaborators' own
    /// in-program execute paths, which call the `vault` module directly rather than
    /// going through this service.
    #[allow(clippy::too_many_arguments)]
    pub fn increase_position(
        &mut self,
        account: ActorId,
        token: TokenId,
        amount_in: u128,
        size_delta: u128,
        is_long: bool,
    ) -> Result<PositionKey, Error> {
        let caller_plugin = PluginId::External(msg::source());
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState {
            vault,
            ledger,
            price_feed,
            ..
        } = &mut *state;

        let outcome = vault::increase_position(
            vault,
            ledger,
            price_feed,
            caller_plugin,
            account,
            token.clone(),
            amount_in,
            size_delta,
            is_long,
            now,
        )?;
        let pos = vault.positions.get(&outcome.key).expect("just inserted").clone();
        drop(state);

        self.notify_on(VaultEvent::IncreasePosition {
            key: outcome.key,
            account,
            index_token: token,
            is_long,
            collateral_delta: amount_in,
            size_delta,
            price: outcome.mark_price,
            fee: outcome.fee,
        })
        .expect("notification failed");
        if outcome.reserve_delta > 0 {
            self.notify_on(VaultEvent::IncreaseReservedAmount {
                amount: outcome.reserve_delta,
            })
            .expect("notification failed");
        }
        if outcome.pool_delta > 0 {
            self.notify_on(VaultEvent::IncreasePoolAmount { amount: outcome.pool_delta })
                .expect("notification failed");
        }
        self.notify_on(VaultEvent::UpdatePosition {
            key: outcome.key,
            size: pos.size,
            collateral: pos.collateral,
            entry_price: pos.entry_price,
            entry_funding_rate: pos.entry_funding_rate,
            reserve_amount: pos.reserve_amount,
            realised_pnl: pos.realised_pnl,
            mark_price: outcome.mark_price,
        })
        .expect("notification failed");

        Ok(outcome.key)
    }

    /// `decreasePosition(account, token, collateralDelta, sizeDelta, isLong)` — the
    /// plugin identity is `msg::source()` itself, for the same reason as
    /// `increase_position` above.
    #[allow(clippy::too_many_arguments)]
    pub fn decrease_position(
        &mut self,
        account: ActorId,
        token: TokenId,
        collateral_delta: u128,
        size_delta: u128,
        is_long: bool,
    ) -> Result<u128, Error> {
        let caller_plugin = PluginId::External(msg::source());
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState {
            vault,
            ledger,
            price_feed,
            ..
        } = &mut *state;

        let outcome = vault::decrease_position(
            vault,
            ledger,
            price_feed,
            caller_plugin,
            account,
            token.clone(),
            collateral_delta,
            size_delta,
            is_long,
            now,
        )?;
        let remaining = if outcome.is_close {
            None
        } else {
            vault.positions.get(&outcome.key).cloned()
        };
        drop(state);

        self.notify_on(VaultEvent::DecreasePosition {
            key: outcome.key,
            account,
            index_token: token,
            is_long,
            collateral_delta,
            size_delta,
            price: outcome.mark_price,
            fee: outcome.fee,
        })
        .expect("notification failed");
        if outcome.reserve_delta > 0 {
            self.notify_on(VaultEvent::DecreaseReservedAmount {
                amount: outcome.reserve_delta,
            })
            .expect("notification failed");
        }
        if outcome.pnl_delta > 0 {
            self.notify_on(VaultEvent::UpdatePnl {
                key: outcome.key,
                has_profit: outcome.has_profit,
                delta: outcome.pnl_delta,
            })
            .expect("notification failed");
        }

        match remaining {
            Some(pos) => {
                self.notify_on(VaultEvent::UpdatePosition {
                    key: outcome.key,
                    size: pos.size,
                    collateral: pos.collateral,
                    entry_price: pos.entry_price,
                    entry_funding_rate: pos.entry_funding_rate,
                    reserve_amount: pos.reserve_amount,
                    realised_pnl: pos.realised_pnl,
                    mark_price: outcome.mark_price,
                })
                .expect("notification failed");
            }
            None => {
                self.notify_on(VaultEvent::ClosePosition {
                    key: outcome.key,
                    size: outcome.remaining_size,
                    collateral: outcome.remaining_collateral,
                    entry_price: 0,
                    entry_funding_rate: 0,
                    reserve_amount: 0,
                    realised_pnl: outcome.realised_pnl,
                })
                .expect("notification failed");
            }
        }

        Ok(outcome.usd_out_after_fee)
    }

    pub fn liquidate_position(&mut self, account: ActorId, token: TokenId, is_long: bool) -> Result<(), Error> {
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let outcome = vault::liquidate_position(&mut state.vault, &state.price_feed, account, token.clone(), is_long, now)?;
        drop(state);

        self.notify_on(VaultEvent::LiquidatePosition {
            key: outcome.key,
            account,
            index_token: token,
            is_long,
            size: outcome.size,
            collateral: outcome.collateral,
            reserve_amount: outcome.reserve_amount,
            realised_pnl: outcome.realised_pnl,
            mark_price: outcome.mark_price,
        })
        .expect("notification failed");
        if outcome.reserve_amount > 0 {
            self.notify_on(VaultEvent::DecreaseReservedAmount {
                amount: outcome.reserve_amount,
            })
            .expect("notification failed");
        }
        Ok(())
    }

    /// View-only: `liquidatePositionAllowed(account, token, isLong)` surfaces the
    /// specific failing reason rather than collapsing to `NotLiquidatable`.
    pub fn liquidate_position_allowed(&self, account: ActorId, token: TokenId, is_long: bool) -> Result<(), Error> {
        let now = exec::block_timestamp();
        let state = EngineState::get();
        let key = vault::position_key(account, &token, is_long);
        vault::liquidate_position_allowed_for(&state.vault, &state.price_feed, key, &token, is_long, now)
    }

    /// `getDelta(token, size, entryPrice, isLong, lastIncreasedTime?)` (spec.md
    /// §4.2.1/§4.2.4): a pure view over the min-profit-clamped PnL magnitude, using
    /// the token's current mark price and this Vault's configured
    /// `minProfitTime`/per-token `minProfitBasisPoints`. Returns `(hasProfit, delta)`.
    pub fn get_delta(
        &self,
        token: TokenId,
        size: u128,
        entry_price: u128,
        is_long: bool,
        last_increased_time: u64,
    ) -> Result<(bool, u128), Error> {
        let now = exec::block_timestamp();
        let state = EngineState::get();
        let mark_price = state.price_feed.get_price(&token, !is_long)?;
        let risk_cfg = state.vault.whitelisted_tokens.get(&token).copied().unwrap_or_default();
        let delta = vault::get_delta(
            entry_price,
            size,
            is_long,
            mark_price,
            state.vault.admin.min_profit_time,
            risk_cfg.min_profit_basis_points,
            last_increased_time,
            now,
        )?;
        Ok((delta.has_profit, delta.delta))
    }

    /// `refreshCumulativeFundingRate(token?)` (spec.md §4.2.1): callable by anyone,
    /// advances the accumulator up to the current time. The `token` argument is
    /// accepted for interface parity with the multi-market variant but ignored here
    /// (single-market Vault, see DESIGN.md's Open Question decision) — there is only
    /// one global `FundingState` to advance.
    pub fn refresh_cumulative_funding_rate(&mut self, _token: Option<TokenId>) -> Result<(), Error> {
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        vault::refresh_cumulative_funding_rate(&mut state.vault.funding, &state.vault.pool, now)
    }

    pub fn buy_usdg(&mut self, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let minted = vault::buy_usdg(&mut state.vault, &mut state.ledger, caller, amount, now)?;
        drop(state);
        self.notify_on(VaultEvent::IncreasePoolAmount { amount: minted })
            .expect("notification failed");
        self.notify_on(VaultEvent::BuyUsdg {
            account: caller,
            amount_in: amount,
            usdg_minted: minted,
        })
        .expect("notification failed");
        Ok(minted)
    }

    pub fn sell_usdg(&mut self, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let paid_out = vault::sell_usdg(&mut state.vault, &mut state.ledger, caller, amount, now)?;
        drop(state);
        self.notify_on(VaultEvent::DecreasePoolAmount { amount: paid_out })
            .expect("notification failed");
        self.notify_on(VaultEvent::SellUsdg {
            account: caller,
            usdg_burned: amount,
            amount_out: paid_out,
        })
        .expect("notification failed");
        Ok(paid_out)
    }

    pub fn position(&self, key: PositionKey) -> Option<Position> {
        EngineState::get().vault.positions.get(&key).cloned()
    }

    pub fn get_position_key(&self, account: ActorId, token: TokenId, is_long: bool) -> PositionKey {
        vault::position_key(account, &token, is_long)
    }

    pub fn pool_amount(&self) -> u128 {
        EngineState::get().vault.pool.pool_amount
    }

    pub fn reserved_amount(&self) -> u128 {
        EngineState::get().vault.pool.reserved_amount
    }

    pub fn cumulative_funding_rate(&self) -> u128 {
        EngineState::get().vault.funding.cumulative_funding_rate
    }

    pub fn fee_reserves(&self) -> u128 {
        EngineState::get().vault.pool.fee_reserves
    }

    pub fn is_whitelisted_token(&self, token: TokenId) -> bool {
        EngineState::get().vault.is_whitelisted(&token)
    }

    pub fn is_plugin(&self, plugin: PluginId) -> bool {
        EngineState::get().vault.is_plugin(plugin)
    }
}
