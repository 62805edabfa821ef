use core::fmt;
use sails_rs::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum Error {
    // Authorization
    NotOwner,
    NotPlugin,
    NotWhitelisted,
    Paused,

    // Invariant / math
    SizeLessThanCollateral,
    PoolUnderflow,
    ReserveExceedsPool,
    PoolExceedsBalance,
    InsufficientReserve,
    ArithmeticOverflow,
    DivisionByZero,

    // Position lifecycle
    PositionNotExist,
    EmptyPosition,
    InvalidPositionSize,
    CollateralExceeded,

    // Liquidation
    LossesExceedCollateral,
    FeesExceedCollateral,
    LiquidationFeesExceedCollateral,
    MaxLeverageExceeded,
    NotLiquidatable,

    // Oracle
    InvalidPrice,
    TokenNotConfigured,

    // Orders & requests
    OrderNotFound,
    InvalidPriceForExecution,
    RequestExpired,
    RequestNotFound,

    // USDG
    InvalidUsdgAmount,

    // Ledger (internal dollar/USDG collaborators, spec.md §1 "opaque balance-transferring
    // collaborators")
    InsufficientBalance,
    FeeExceedsDeposit,
    InsufficientUsdg,

    // Misc
    MarketAlreadyWhitelisted,
    InvalidParameter,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            // The test suite pins these four strings exactly; everything else is
            // free-form but stable.
            Error::InvalidPriceForExecution => "OrderBook: invalid price for execution",
            Error::OrderNotFound => "OrderBook: non-existent order",
            Error::NotLiquidatable => "Vault: position cannot be liquidated",
            Error::RequestExpired => "Market::executeIncreasePosition Request has expired",

            Error::NotOwner => "Vault: forbidden",
            Error::NotPlugin => "Vault: invalid plugin",
            Error::NotWhitelisted => "Vault: token not whitelisted",
            Error::Paused => "Vault: paused",
            Error::SizeLessThanCollateral => "Vault: size must be more than collateral",
            Error::PoolUnderflow => "Vault: poolAmount exceeded",
            Error::ReserveExceedsPool => "Vault: reserve exceeds pool",
            Error::PoolExceedsBalance => "Vault: max pool amount exceeded",
            Error::InsufficientReserve => "Vault: insufficient reserve",
            Error::ArithmeticOverflow => "Vault: arithmetic overflow",
            Error::DivisionByZero => "Vault: division by zero",
            Error::PositionNotExist => "Vault: position does not exist",
            Error::EmptyPosition => "Vault: empty position",
            Error::InvalidPositionSize => "Vault: invalid position size",
            Error::CollateralExceeded => "Vault: collateralDelta exceeds collateral",
            Error::LossesExceedCollateral => "Vault: losses exceed collateral",
            Error::FeesExceedCollateral => "Vault: fees exceed collateral",
            Error::LiquidationFeesExceedCollateral => "Vault: liquidation fees exceed collateral",
            Error::MaxLeverageExceeded => "Vault: max leverage exceeded",
            Error::InvalidPrice => "PriceFeed: invalid price",
            Error::TokenNotConfigured => "PriceFeed: token not configured",
            Error::RequestNotFound => "Market: non-existent request",
            Error::InvalidUsdgAmount => "Vault: invalid USDG amount",
            Error::InsufficientBalance => "Ledger: insufficient balance",
            Error::FeeExceedsDeposit => "Vault: fee exceeds deposited amount",
            Error::InsufficientUsdg => "Vault: insufficient USDG balance",
            Error::MarketAlreadyWhitelisted => "Vault: token already whitelisted",
            Error::InvalidParameter => "invalid parameter",
        };
        f.write_str(msg)
    }
}
