//! Shared data model: positions, pool/funding state, admin config, orders and
//! delayed-execution requests. Field orders follow spec.md §3/§6 exactly since the
//! event payloads mirror these structs positionally.

use sails_rs::collections::BTreeMap;
use sails_rs::prelude::*;

/// Whitelisted index/collateral token identifier (a market symbol, e.g. `"BNB"`).
pub type TokenId = String;

pub type PositionKey = H256;
pub type RequestKey = H256;

/// An open leveraged exposure, keyed by `(account, indexToken, isLong)`.
#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct Position {
    pub account: ActorId,
    pub index_token: TokenId,
    pub is_long: bool,
    pub size: u128,
    pub collateral: u128,
    pub entry_price: u128,
    pub entry_funding_rate: u128,
    pub reserve_amount: u128,
    pub realised_pnl: i128,
    pub last_increased_time: u64,
}

impl Position {
    pub fn empty(account: ActorId, index_token: TokenId, is_long: bool) -> Self {
        Self {
            account,
            index_token,
            is_long,
            size: 0,
            collateral: 0,
            entry_price: 0,
            entry_funding_rate: 0,
            reserve_amount: 0,
            realised_pnl: 0,
            last_increased_time: 0,
        }
    }

    pub fn exists(&self) -> bool {
        self.size > 0
    }
}

/// Shared pool state. Single-market variant: one pool backs every whitelisted token.
#[derive(Encode, Decode, TypeInfo, Clone, Debug, Default, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct PoolState {
    pub pool_amount: u128,
    pub reserved_amount: u128,
    pub fee_reserves: u128,
}

/// Funding accumulator state, global in the single-market variant.
#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct FundingState {
    pub cumulative_funding_rate: u128,
    pub last_refresh_funding_rate_timestamp: u64,
    pub funding_rate_factor: u128,
}

impl Default for FundingState {
    fn default() -> Self {
        Self {
            cumulative_funding_rate: 0,
            last_refresh_funding_rate_timestamp: 0,
            funding_rate_factor: 100, // PRECISION-scaled, modest default
        }
    }
}

/// A registered caller authorised to invoke Vault position mutators. Modeled as a
/// closed-plus-open sum type rather than a bare address set: `OrderBook` and
/// `Market` are built-in collaborators living in this same program, while
/// `External` covers any other deployed plugin contract.
#[derive(Encode, Decode, TypeInfo, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum PluginId {
    OrderBook,
    Market,
    External(ActorId),
}

/// Admin / risk configuration, mutated only by `owner` (spec.md §3 "Admin state").
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct AdminState {
    pub owner: ActorId,
    pub paused: bool,
    pub liquidation_fee: u128,
    pub margin_fee: u128,
    pub max_leverage: u128,
    pub min_profit_time: u64,
}

impl AdminState {
    pub fn new(owner: ActorId) -> Self {
        Self {
            owner,
            paused: false,
            liquidation_fee: 5 * crate::precision::PRICE_PRECISION / 10, // 0.5 USD flat fee
            margin_fee: 100,                                             // 0.01% of PRECISION=1e6 -> 100/1e6
            max_leverage: 50,                                            // 50x
            min_profit_time: 0,
        }
    }
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct IncreaseOrder {
    pub account: ActorId,
    pub token: TokenId,
    pub amount: u128,
    pub size_delta: u128,
    pub is_long: bool,
    pub trigger_price: u128,
    pub trigger_above_threshold: bool,
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct DecreaseOrder {
    pub account: ActorId,
    pub token: TokenId,
    pub collateral_delta: u128,
    pub size_delta: u128,
    pub is_long: bool,
    pub trigger_price: u128,
    pub trigger_above_threshold: bool,
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct IncreasePositionRequest {
    pub account: ActorId,
    pub token: TokenId,
    pub amount_in: u128,
    pub size_delta: u128,
    pub is_long: bool,
    pub block_time: u64,
    pub execution_fee: u128,
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct DecreasePositionRequest {
    pub account: ActorId,
    pub token: TokenId,
    pub collateral_delta: u128,
    pub size_delta: u128,
    pub is_long: bool,
    pub block_time: u64,
    pub execution_fee: u128,
}

/// Per-token risk parameters the owner configures at whitelist time
/// (spec.md §3 "Admin state": `minProfitBasisPoints[token]`).
#[derive(Encode, Decode, TypeInfo, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct TokenRiskConfig {
    pub min_profit_basis_points: u128,
}

/// Result of `Vault::getDelta` — profit-or-loss magnitude, signed by `hasProfit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delta {
    pub has_profit: bool,
    pub delta: u128,
}

pub type OrderIndex = u64;

/// Helper map newtype kept out of generated SCALE types: internal, not crossing a
/// service boundary.
pub type IndexCounter = BTreeMap<ActorId, OrderIndex>;
