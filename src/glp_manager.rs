//! GlpManager (spec.md §2 table, "optional ~5%, minimal"): wraps
//! `Vault::buy_usdg`/`sell_usdg` with a pro-rata pool-share token ("GLP"). The spec
//! names this component without a `[MODULE]` contract, so SPEC_FULL.md §6 supplements
//! it in the teacher's `add_liquidity`/`remove_liquidity` idiom — no fee distribution,
//! staking, or cooldown (those stay out of scope per spec.md's Non-goals).

use crate::errors::Error;
use crate::ledger::Ledger;
use crate::precision::mul_div;
use crate::vault::{self, VaultState};
use sails_rs::collections::BTreeMap;
use sails_rs::prelude::*;

#[derive(Clone, Debug, Default)]
pub struct GlpState {
    pub balances: BTreeMap<ActorId, u128>,
    pub total_supply: u128,
}

impl GlpState {
    pub fn balance_of(&self, account: ActorId) -> u128 {
        self.balances.get(&account).copied().unwrap_or(0)
    }
}

/// `addLiquidity(account, dollarAmount)`: mint USDG via the vault, then mint GLP
/// pro-rata to the USDG value just created. The first depositor mints 1:1 — there is
/// no pre-existing pool share price to match.
pub fn add_liquidity(
    glp: &mut GlpState,
    vault_state: &mut VaultState,
    ledger: &mut Ledger,
    account: ActorId,
    dollar_amount: u128,
    now: u64,
) -> Result<u128, Error> {
    let usdg_minted = vault::buy_usdg(vault_state, ledger, account, dollar_amount, now)?;

    let glp_minted = if glp.total_supply == 0 {
        usdg_minted
    } else {
        let usdg_supply_before = ledger.usdg_supply.checked_sub(usdg_minted).ok_or(Error::ArithmeticOverflow)?;
        if usdg_supply_before == 0 {
            usdg_minted
        } else {
            mul_div(usdg_minted, glp.total_supply, usdg_supply_before)?
        }
    };

    glp.total_supply = glp.total_supply.checked_add(glp_minted).ok_or(Error::ArithmeticOverflow)?;
    let bal = glp.balances.entry(account).or_insert(0);
    *bal = bal.checked_add(glp_minted).ok_or(Error::ArithmeticOverflow)?;
    Ok(glp_minted)
}

/// `removeLiquidity(account, glpAmount)`: burn GLP, redeem the pro-rata USDG value
/// through the vault, and pay the dollars out.
pub fn remove_liquidity(
    glp: &mut GlpState,
    vault_state: &mut VaultState,
    ledger: &mut Ledger,
    account: ActorId,
    glp_amount: u128,
    now: u64,
) -> Result<u128, Error> {
    let bal = glp.balances.get_mut(&account).ok_or(Error::InsufficientBalance)?;
    if *bal < glp_amount {
        return Err(Error::InsufficientBalance);
    }

    let usdg_value = mul_div(glp_amount, ledger.usdg_supply, glp.total_supply)?;

    *bal -= glp_amount;
    glp.total_supply = glp.total_supply.checked_sub(glp_amount).ok_or(Error::ArithmeticOverflow)?;

    vault::sell_usdg(vault_state, ledger, account, usdg_value, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(n: u8) -> ActorId {
        ActorId::from([n; 32])
    }

    const ONE_USD: u128 = 1_000_000_000_000_000_000;

    fn harness() -> (GlpState, VaultState, Ledger) {
        let owner = actor(0);
        (GlpState::default(), VaultState::new(owner), Ledger::default())
    }

    #[test]
    fn first_depositor_mints_glp_one_to_one() {
        let (mut glp, mut vault, mut ledger) = harness();
        ledger.credit_external(actor(1), 500 * ONE_USD);
        let minted = add_liquidity(&mut glp, &mut vault, &mut ledger, actor(1), 300 * ONE_USD, 10).unwrap();
        assert_eq!(minted, 300 * ONE_USD);
        assert_eq!(glp.balance_of(actor(1)), 300 * ONE_USD);
    }

    #[test]
    fn second_depositor_mints_pro_rata() {
        let (mut glp, mut vault, mut ledger) = harness();
        ledger.credit_external(actor(1), 1_000 * ONE_USD);
        ledger.credit_external(actor(2), 1_000 * ONE_USD);
        add_liquidity(&mut glp, &mut vault, &mut ledger, actor(1), 300 * ONE_USD, 10).unwrap();
        let minted = add_liquidity(&mut glp, &mut vault, &mut ledger, actor(2), 300 * ONE_USD, 20).unwrap();
        // equal deposits into an unchanged pool -> equal GLP minted
        assert_eq!(minted, 300 * ONE_USD);
        assert_eq!(glp.total_supply, 600 * ONE_USD);
    }

    #[test]
    fn remove_liquidity_round_trips_full_withdrawal() {
        let (mut glp, mut vault, mut ledger) = harness();
        ledger.credit_external(actor(1), 500 * ONE_USD);
        let minted = add_liquidity(&mut glp, &mut vault, &mut ledger, actor(1), 300 * ONE_USD, 10).unwrap();

        let redeemed = remove_liquidity(&mut glp, &mut vault, &mut ledger, actor(1), minted, 20).unwrap();
        assert_eq!(redeemed, 300 * ONE_USD);
        assert_eq!(glp.balance_of(actor(1)), 0);
        assert_eq!(glp.total_supply, 0);
        assert_eq!(ledger.balance_of(actor(1)), 500 * ONE_USD);
    }

    #[test]
    fn remove_liquidity_rejects_insufficient_glp_balance() {
        let (mut glp, mut vault, mut ledger) = harness();
        ledger.credit_external(actor(1), 500 * ONE_USD);
        add_liquidity(&mut glp, &mut vault, &mut ledger, actor(1), 300 * ONE_USD, 10).unwrap();
        let err = remove_liquidity(&mut glp, &mut vault, &mut ledger, actor(1), 9_999_999 * ONE_USD, 20).unwrap_err();
        assert_eq!(err, Error::InsufficientBalance);
    }
}
