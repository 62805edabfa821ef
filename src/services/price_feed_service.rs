//! PriceFeed façade (spec.md §4.1, write path supplemented in SPEC_FULL.md §2):
//! owner registers `(feedDecimals, tokenDecimals)` per token; any keeper pushes raw
//! oracle rounds; `getPrice` is the read-side view every other service calls through.

use crate::errors::Error;
use crate::events::PriceFeedEvent;
use crate::EngineState;
use sails_rs::gstd::msg;
use sails_rs::prelude::*;

#[derive(Default)]
pub struct PriceFeedService;

impl PriceFeedService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl PriceFeedService {
    /// `configToken(token, feedDecimals, tokenDecimals)`: owner-gated, since it fixes
    /// the scale every subsequent `pushRound`/`getPrice` call for this token uses.
    pub fn config_token(&mut self, token: String, feed_decimals: u8, token_decimals: u8) -> Result<(), Error> {
        let caller = msg::source();
        let mut state = EngineState::get_mut();
        if state.vault.admin.owner != caller {
            return Err(Error::NotOwner);
        }
        state.price_feed.config_token(token.clone(), feed_decimals, token_decimals);
        drop(state);

        self.notify_on(PriceFeedEvent::ConfigToken {
            token,
            feed_decimals,
            token_decimals,
        })
        .expect("notification failed");
        Ok(())
    }

    /// `pushRound(token, rawAnswer)`: open to any caller, matching `price_feed.rs`'s
    /// own doc comment — this module has no opinion on keeper authorization, and the
    /// spec treats the feed as "assumed honest" (out of scope: oracle manipulation).
    pub fn push_round(&mut self, token: String, raw_answer: i128) -> Result<(), Error> {
        let mut state = EngineState::get_mut();
        state.price_feed.push_round(&token, raw_answer)?;
        drop(state);

        self.notify_on(PriceFeedEvent::PriceUpdated { token, raw_answer })
            .expect("notification failed");
        Ok(())
    }

    pub fn get_price(&self, token: String, maximise: bool) -> Result<u128, Error> {
        EngineState::get().price_feed.get_price(&token, maximise)
    }

    pub fn is_configured(&self, token: String) -> bool {
        EngineState::get().price_feed.is_configured(&token)
    }
}
