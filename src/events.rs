//! Event payloads emitted by each service, grouped the way spec.md §6 lists them per
//! collaborator. Field orders follow the operations they're emitted from exactly —
//! spec.md calls out that "argument orderings must match event orderings to the
//! letter" since tests inspect fields positionally.

use crate::types::*;
use sails_rs::prelude::*;

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum VaultEvent {
    SetPlugin { plugin: PluginId, allowed: bool },
    SetWhitelistedToken { token: TokenId, min_profit_basis_points: u128 },
    IncreaseReservedAmount { amount: u128 },
    DecreaseReservedAmount { amount: u128 },
    IncreasePoolAmount { amount: u128 },
    DecreasePoolAmount { amount: u128 },
    IncreasePosition {
        key: PositionKey,
        account: ActorId,
        index_token: TokenId,
        is_long: bool,
        collateral_delta: u128,
        size_delta: u128,
        price: u128,
        fee: u128,
    },
    DecreasePosition {
        key: PositionKey,
        account: ActorId,
        index_token: TokenId,
        is_long: bool,
        collateral_delta: u128,
        size_delta: u128,
        price: u128,
        fee: u128,
    },
    UpdatePosition {
        key: PositionKey,
        size: u128,
        collateral: u128,
        entry_price: u128,
        entry_funding_rate: u128,
        reserve_amount: u128,
        realised_pnl: i128,
        mark_price: u128,
    },
    ClosePosition {
        key: PositionKey,
        size: u128,
        collateral: u128,
        entry_price: u128,
        entry_funding_rate: u128,
        reserve_amount: u128,
        realised_pnl: i128,
    },
    LiquidatePosition {
        key: PositionKey,
        account: ActorId,
        index_token: TokenId,
        is_long: bool,
        size: u128,
        collateral: u128,
        reserve_amount: u128,
        realised_pnl: i128,
        mark_price: u128,
    },
    UpdatePnl { key: PositionKey, has_profit: bool, delta: u128 },
    BuyUsdg { account: ActorId, amount_in: u128, usdg_minted: u128 },
    SellUsdg { account: ActorId, usdg_burned: u128, amount_out: u128 },
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum OrderBookEvent {
    CreateIncreaseOrder {
        account: ActorId,
        index: OrderIndex,
        token: TokenId,
        amount: u128,
        size_delta: u128,
        is_long: bool,
        trigger_price: u128,
        trigger_above_threshold: bool,
    },
    UpdateIncreaseOrder {
        account: ActorId,
        index: OrderIndex,
        size_delta: u128,
        trigger_price: u128,
        trigger_above_threshold: bool,
    },
    CancelIncreaseOrder { account: ActorId, index: OrderIndex },
    ExecuteIncreaseOrder { account: ActorId, index: OrderIndex, execution_price: u128 },
    CreateDecreaseOrder {
        account: ActorId,
        index: OrderIndex,
        token: TokenId,
        collateral_delta: u128,
        size_delta: u128,
        is_long: bool,
        trigger_price: u128,
        trigger_above_threshold: bool,
    },
    UpdateDecreaseOrder {
        account: ActorId,
        index: OrderIndex,
        collateral_delta: u128,
        size_delta: u128,
        trigger_price: u128,
        trigger_above_threshold: bool,
    },
    CancelDecreaseOrder { account: ActorId, index: OrderIndex },
    ExecuteDecreaseOrder { account: ActorId, index: OrderIndex, execution_price: u128 },
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum MarketEvent {
    CreateIncreasePosition {
        key: RequestKey,
        account: ActorId,
        token: TokenId,
        amount_in: u128,
        size_delta: u128,
        is_long: bool,
        execution_fee: u128,
    },
    ExecuteIncreasePosition { key: RequestKey, execution_price: u128 },
    CancelIncreasePosition { key: RequestKey },
    CreateDecreasePosition {
        key: RequestKey,
        account: ActorId,
        token: TokenId,
        collateral_delta: u128,
        size_delta: u128,
        is_long: bool,
        execution_fee: u128,
    },
    ExecuteDecreasePosition { key: RequestKey, execution_price: u128 },
    CancelDecreasePosition { key: RequestKey },
    SetMaxTimeDelay { seconds: u64 },
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum GlpEvent {
    AddLiquidity { account: ActorId, dollar_amount: u128, glp_minted: u128 },
    RemoveLiquidity { account: ActorId, glp_burned: u128, dollar_amount: u128 },
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum PriceFeedEvent {
    ConfigToken { token: TokenId, feed_decimals: u8, token_decimals: u8 },
    PriceUpdated { token: TokenId, raw_answer: i128 },
}
