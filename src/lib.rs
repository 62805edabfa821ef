#![no_std]

extern crate alloc;

pub mod errors;
pub mod events;
pub mod glp_manager;
pub mod ledger;
pub mod market;
pub mod order_book;
pub mod precision;
pub mod price_feed;
mod services;
pub mod types;
pub mod vault;

use sails_rs::cell::RefCell;
use sails_rs::gstd::msg;
use sails_rs::prelude::*;
use core::cell::{Ref, RefMut};

use glp_manager::GlpState;
use ledger::Ledger;
use market::MarketState;
use order_book::OrderBookState;
use price_feed::PriceFeedState;
use vault::VaultState;

struct SyncRefCell<T>(RefCell<T>);
unsafe impl<T> Sync for SyncRefCell<T> {}

static STATE: SyncRefCell<Option<EngineState>> = SyncRefCell(RefCell::new(None));

/// Everything the program owns, shared by every `#[service]` façade. One Vault
/// settles positions; OrderBook and Market are plugins gated through it; GlpManager
/// and PriceFeed sit alongside as the remaining spec.md §2 components.
pub struct EngineState {
    pub vault: VaultState,
    pub order_book: OrderBookState,
    pub market: MarketState,
    pub glp: GlpState,
    pub ledger: Ledger,
    pub price_feed: PriceFeedState,
}

impl EngineState {
    fn new(owner: ActorId) -> Self {
        // `owner` must still call `setPlugin` to authorize OrderBook/Market before
        // either can move positions (spec.md §9: registration is never implicit).
        let vault = VaultState::new(owner);

        Self {
            vault,
            order_book: OrderBookState::default(),
            market: MarketState::default(),
            glp: GlpState::default(),
            ledger: Ledger::default(),
            price_feed: PriceFeedState::default(),
        }
    }

    pub fn get() -> Ref<'static, Self> {
        Ref::map(STATE.0.borrow(), |opt| opt.as_ref().expect("state not initialized"))
    }

    pub fn get_mut() -> RefMut<'static, Self> {
        RefMut::map(STATE.0.borrow_mut(), |opt| opt.as_mut().expect("state not initialized"))
    }

    fn init(owner: ActorId) {
        let mut state = STATE.0.borrow_mut();
        if state.is_some() {
            panic!("state already initialized");
        }
        *state = Some(Self::new(owner));
    }
}

use services::{AdminService, GlpService, MarketService, OrderBookService, PriceFeedService, VaultService, WalletService};

pub struct GmxVaultEngineProgram(());

#[sails_rs::program]
impl GmxVaultEngineProgram {
    /// `owner` is whoever deploys the program (spec.md §3 "Admin state").
    pub fn new() -> Self {
        let owner = msg::source();
        EngineState::init(owner);
        Self(())
    }

    pub fn vault(&self) -> VaultService {
        Default::default()
    }

    pub fn order_book(&self) -> OrderBookService {
        Default::default()
    }

    pub fn market(&self) -> MarketService {
        Default::default()
    }

    pub fn glp_manager(&self) -> GlpService {
        Default::default()
    }

    pub fn price_feed(&self) -> PriceFeedService {
        Default::default()
    }

    pub fn admin(&self) -> AdminService {
        Default::default()
    }

    pub fn wallet(&self) -> WalletService {
        Default::default()
    }
}
