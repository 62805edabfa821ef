//! PriceFeed (spec.md §4.1): a conservative max/min over the last `K` oracle rounds,
//! scaled to 18-decimal `PRICE_PRECISION`.
//!
//! The distilled spec treats the feed as "assumed honest" and only specifies the read
//! side (`getPrice`). SPEC_FULL.md §2 supplements the write side — `configToken` and
//! `pushRound` — so the engine is actually drivable without inventing oracle-manipulation
//! defenses (still out of scope).

use crate::errors::Error;
use crate::precision::{mul_div, PRICE_LOOKBACK_ROUNDS};
use crate::types::TokenId;
use sails_rs::collections::BTreeMap;
use sails_rs::prelude::*;

/// Registered `(priceUnit, baseUnit)` pair for a token, spec.md §4.1:
/// `priceUnit = 10^feedDecimals`, `baseUnit = 10^tokenDecimals`.
#[derive(Clone, Copy, Debug)]
struct FeedConfig {
    feed_decimals: u8,
    token_decimals: u8,
}

/// Bounded ring of raw oracle round answers. Only the last `PRICE_LOOKBACK_ROUNDS`
/// are ever read, so we cap storage at that many and drop the oldest on push.
#[derive(Clone, Debug, Default)]
struct RoundHistory {
    rounds: Vec<i128>,
}

impl RoundHistory {
    fn push(&mut self, answer: i128) {
        self.rounds.push(answer);
        if self.rounds.len() > PRICE_LOOKBACK_ROUNDS {
            self.rounds.remove(0);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PriceFeedState {
    configs: BTreeMap<TokenId, FeedConfig>,
    history: BTreeMap<TokenId, RoundHistory>,
}

impl PriceFeedState {
    pub fn config_token(&mut self, token: TokenId, feed_decimals: u8, token_decimals: u8) {
        self.configs.insert(
            token,
            FeedConfig {
                feed_decimals,
                token_decimals,
            },
        );
    }

    pub fn is_configured(&self, token: &str) -> bool {
        self.configs.contains_key(token)
    }

    /// Append one raw oracle round answer for `token`. Callable by any registered
    /// keeper at the service layer; this module has no opinion on authorization.
    pub fn push_round(&mut self, token: &str, raw_answer: i128) -> Result<(), Error> {
        if !self.configs.contains_key(token) {
            return Err(Error::TokenNotConfigured);
        }
        self.history.entry(String::from(token)).or_default().push(raw_answer);
        Ok(())
    }

    /// `getPrice(token, maximise)`: walk back up to `K` rounds from the latest and
    /// return the maximum (if `maximise`) or minimum observed, scaled to
    /// `PRICE_PRECISION`. Any nonpositive round fails the whole call with
    /// `InvalidPrice`.
    pub fn get_price(&self, token: &str, maximise: bool) -> Result<u128, Error> {
        let cfg = *self.configs.get(token).ok_or(Error::TokenNotConfigured)?;
        let history = self.history.get(token).ok_or(Error::InvalidPrice)?;
        if history.rounds.is_empty() {
            return Err(Error::InvalidPrice);
        }

        let mut chosen: Option<i128> = None;
        for &answer in history.rounds.iter().rev().take(PRICE_LOOKBACK_ROUNDS) {
            if answer <= 0 {
                return Err(Error::InvalidPrice);
            }
            chosen = Some(match chosen {
                None => answer,
                Some(prev) => {
                    if maximise {
                        prev.max(answer)
                    } else {
                        prev.min(answer)
                    }
                }
            });
        }

        let raw = chosen.expect("non-empty rounds checked above") as u128;
        scale_to_price_precision(raw, cfg.feed_decimals, cfg.token_decimals)
    }
}

/// `(10^36 * rawPrice) / priceUnit / baseUnit`, combined into one wide division —
/// `floor(floor(x/a)/b) == floor(x/(a*b))` for positive integers, so folding the two
/// spec-mandated divisions into a single denominator is exact, not an approximation.
fn scale_to_price_precision(raw: u128, feed_decimals: u8, token_decimals: u8) -> Result<u128, Error> {
    const SCALE_36: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000;
    let price_unit = 10u128
        .checked_pow(feed_decimals as u32)
        .ok_or(Error::ArithmeticOverflow)?;
    let base_unit = 10u128
        .checked_pow(token_decimals as u32)
        .ok_or(Error::ArithmeticOverflow)?;
    let denom = price_unit.checked_mul(base_unit).ok_or(Error::ArithmeticOverflow)?;
    mul_div(raw, SCALE_36, denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> PriceFeedState {
        let mut f = PriceFeedState::default();
        f.config_token(String::from("BNB"), 8, 18);
        f
    }

    #[test]
    fn uses_max_of_last_k_rounds_when_maximising() {
        let mut f = feed();
        for round in [100_00000000i128, 300_00000000, 200_00000000, 250_00000000] {
            f.push_round("BNB", round).unwrap();
        }
        // last 3 rounds: 300, 200, 250 -> max is 300
        let price = f.get_price("BNB", true).unwrap();
        let expected = scale_to_price_precision(300_00000000, 8, 18).unwrap();
        assert_eq!(price, expected);
    }

    #[test]
    fn uses_min_of_last_k_rounds_when_minimising() {
        let mut f = feed();
        for round in [100_00000000i128, 300_00000000, 200_00000000, 250_00000000] {
            f.push_round("BNB", round).unwrap();
        }
        let price = f.get_price("BNB", false).unwrap();
        let expected = scale_to_price_precision(200_00000000, 8, 18).unwrap();
        assert_eq!(price, expected);
    }

    #[test]
    fn nonpositive_round_is_invalid_price() {
        let mut f = feed();
        f.push_round("BNB", 100).unwrap();
        f.push_round("BNB", -1).unwrap();
        assert!(matches!(f.get_price("BNB", true), Err(Error::InvalidPrice)));
    }

    #[test]
    fn unconfigured_token_errors() {
        let f = PriceFeedState::default();
        assert!(matches!(f.get_price("ETH", true), Err(Error::TokenNotConfigured)));
    }

    #[test]
    fn fewer_than_k_rounds_still_works() {
        let mut f = feed();
        f.push_round("BNB", 180_00000000).unwrap();
        let price = f.get_price("BNB", true).unwrap();
        let expected = scale_to_price_precision(180_00000000, 8, 18).unwrap();
        assert_eq!(price, expected);
    }
}
