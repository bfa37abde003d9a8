//! # Reference In-Memory Token
//!
//! An ERC-20-shaped fungible asset that lives entirely in memory: balances,
//! allowances, and a fixed genesis supply minted to a treasury account at
//! construction. The daemon custodies this token by default, and the test
//! suite uses it as the external collaborator the vault is exercised
//! against.
//!
//! This is deliberately *not* a production token. It has no supply
//! governance, no mint/burn surface, no events — exactly the slice of
//! ERC-20 the vault consumes and nothing more.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::asset::{Address, AssetError, FungibleAsset};
use crate::config;

// ---------------------------------------------------------------------------
// InMemoryToken
// ---------------------------------------------------------------------------

/// A fungible token held entirely in process memory.
///
/// Allowances are a nested map (`owner -> spender -> amount`), the same
/// shape ERC-20 uses, and are overwritten by
/// [`approve`](FungibleAsset::approve). Every successful `transfer_from`
/// decrements the spent allowance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InMemoryToken {
    /// Display name (e.g., "Coffer Test Token").
    name: String,

    /// Ticker symbol (e.g., "CTT").
    symbol: String,

    /// Display decimals. The ledger arithmetic never uses this.
    decimals: u8,

    /// Total units in existence. Fixed at construction — this token has
    /// no mint or burn surface.
    total_supply: u64,

    /// Per-account balances. Absent accounts hold zero.
    balances: HashMap<Address, u64>,

    /// Spending allowances: `owner -> spender -> amount`.
    allowances: HashMap<Address, HashMap<Address, u64>>,
}

impl InMemoryToken {
    /// Creates a token and mints the full `initial_supply` to `treasury`.
    pub fn new(name: &str, symbol: &str, decimals: u8, treasury: &str, initial_supply: u64) -> Self {
        let mut balances = HashMap::new();
        balances.insert(treasury.to_string(), initial_supply);

        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            total_supply: initial_supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    /// Creates the default reference token with parameters from
    /// [`config`]: full supply minted to the default treasury.
    pub fn default_token() -> Self {
        Self::new(
            config::TOKEN_NAME,
            config::TOKEN_SYMBOL,
            config::TOKEN_DECIMALS,
            config::DEFAULT_TREASURY_ADDRESS,
            config::TOKEN_INITIAL_SUPPLY,
        )
    }

    /// Returns the token's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the display decimals.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Returns the allowance `spender` may pull from `owner`.
    pub fn allowance(&self, owner: &str, spender: &str) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|per_spender| per_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Moves `amount` from `from` to `to`, checking balance first.
    ///
    /// All checks happen before any mutation so a failure leaves the
    /// ledger untouched.
    fn do_transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<(), AssetError> {
        if amount == 0 {
            return Ok(());
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(AssetError::InsufficientBalance {
                account: from.to_string(),
                available: from_balance,
                requested: amount,
            });
        }

        // Self-transfer is net zero. Debiting and crediting the same
        // account through separate reads would double-count, so stop
        // here once the balance check has passed.
        if from == to {
            return Ok(());
        }

        let to_balance = self.balance_of(to);
        let new_to = to_balance
            .checked_add(amount)
            .ok_or_else(|| AssetError::Overflow {
                account: to.to_string(),
            })?;

        self.balances.insert(from.to_string(), from_balance - amount);
        self.balances.insert(to.to_string(), new_to);
        Ok(())
    }
}

impl FungibleAsset for InMemoryToken {
    fn total_supply(&self) -> u64 {
        self.total_supply
    }

    fn balance_of(&self, account: &str) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<(), AssetError> {
        self.do_transfer(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &str,
        owner: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), AssetError> {
        if amount == 0 {
            return Ok(());
        }

        let granted = self.allowance(owner, spender);
        if granted < amount {
            return Err(AssetError::InsufficientAllowance {
                owner: owner.to_string(),
                spender: spender.to_string(),
                allowance: granted,
                requested: amount,
            });
        }

        // Balance check happens inside do_transfer; the allowance is only
        // decremented once the transfer has succeeded.
        self.do_transfer(owner, to, amount)?;
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), granted - amount);
        Ok(())
    }

    fn approve(&mut self, owner: &str, spender: &str, amount: u64) {
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), amount);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> InMemoryToken {
        InMemoryToken::new("Test", "TST", 8, "treasury", 1_000_000)
    }

    #[test]
    fn genesis_supply_goes_to_treasury() {
        let t = token();
        assert_eq!(t.total_supply(), 1_000_000);
        assert_eq!(t.balance_of("treasury"), 1_000_000);
        assert_eq!(t.balance_of("nobody"), 0);
    }

    #[test]
    fn transfer_moves_exact_amount() {
        let mut t = token();
        t.transfer("treasury", "alice", 400).unwrap();

        assert_eq!(t.balance_of("treasury"), 999_600);
        assert_eq!(t.balance_of("alice"), 400);
    }

    #[test]
    fn transfer_conserves_supply() {
        let mut t = token();
        t.transfer("treasury", "alice", 123_456).unwrap();
        t.transfer("alice", "bob", 456).unwrap();

        let sum = t.balance_of("treasury") + t.balance_of("alice") + t.balance_of("bob");
        assert_eq!(sum, t.total_supply());
    }

    #[test]
    fn transfer_insufficient_balance_rejected() {
        let mut t = token();
        let result = t.transfer("alice", "bob", 1);
        assert!(matches!(
            result,
            Err(AssetError::InsufficientBalance {
                available: 0,
                requested: 1,
                ..
            })
        ));
    }

    #[test]
    fn failed_transfer_changes_nothing() {
        let mut t = token();
        t.transfer("treasury", "alice", 100).unwrap();

        let result = t.transfer("alice", "bob", 500);
        assert!(result.is_err());
        assert_eq!(t.balance_of("alice"), 100);
        assert_eq!(t.balance_of("bob"), 0);
    }

    #[test]
    fn self_transfer_is_net_zero() {
        let mut t = token();
        t.transfer("treasury", "alice", 100).unwrap();

        t.transfer("alice", "alice", 40).unwrap();
        assert_eq!(t.balance_of("alice"), 100);
        assert_eq!(t.balance_of("treasury") + t.balance_of("alice"), t.total_supply());

        // The balance check still applies.
        let result = t.transfer("alice", "alice", 500);
        assert!(matches!(
            result,
            Err(AssetError::InsufficientBalance {
                available: 100,
                requested: 500,
                ..
            })
        ));
    }

    #[test]
    fn self_transfer_from_spends_allowance_without_moving_funds() {
        let mut t = token();
        t.transfer("treasury", "alice", 100).unwrap();
        t.approve("alice", "vault", 80);

        t.transfer_from("vault", "alice", "alice", 50).unwrap();
        assert_eq!(t.balance_of("alice"), 100);
        assert_eq!(t.allowance("alice", "vault"), 30);
    }

    #[test]
    fn zero_transfer_is_a_noop() {
        let mut t = token();
        t.transfer("alice", "bob", 0).unwrap();
        assert_eq!(t.balance_of("alice"), 0);
        assert_eq!(t.balance_of("bob"), 0);
    }

    #[test]
    fn approve_sets_and_overwrites_allowance() {
        let mut t = token();
        t.approve("treasury", "vault", 500);
        assert_eq!(t.allowance("treasury", "vault"), 500);

        t.approve("treasury", "vault", 200);
        assert_eq!(t.allowance("treasury", "vault"), 200);
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut t = token();
        t.approve("treasury", "vault", 1_000);

        t.transfer_from("vault", "treasury", "vault-account", 600)
            .unwrap();

        assert_eq!(t.balance_of("vault-account"), 600);
        assert_eq!(t.balance_of("treasury"), 999_400);
        assert_eq!(t.allowance("treasury", "vault"), 400);
    }

    #[test]
    fn transfer_from_without_allowance_rejected() {
        let mut t = token();
        let result = t.transfer_from("vault", "treasury", "vault-account", 1);
        assert!(matches!(
            result,
            Err(AssetError::InsufficientAllowance {
                allowance: 0,
                requested: 1,
                ..
            })
        ));
    }

    #[test]
    fn transfer_from_insufficient_balance_keeps_allowance() {
        let mut t = token();
        t.transfer("treasury", "alice", 100).unwrap();
        t.approve("alice", "vault", 1_000);

        let result = t.transfer_from("vault", "alice", "vault-account", 500);
        assert!(matches!(
            result,
            Err(AssetError::InsufficientBalance { .. })
        ));

        // Failure must not burn the allowance.
        assert_eq!(t.allowance("alice", "vault"), 1_000);
        assert_eq!(t.balance_of("alice"), 100);
    }

    #[test]
    fn zero_transfer_from_is_a_noop() {
        let mut t = token();
        t.transfer_from("vault", "treasury", "anywhere", 0).unwrap();
        assert_eq!(t.balance_of("treasury"), 1_000_000);
    }

    #[test]
    fn default_token_uses_config_parameters() {
        let t = InMemoryToken::default_token();
        assert_eq!(t.symbol(), crate::config::TOKEN_SYMBOL);
        assert_eq!(t.total_supply(), crate::config::TOKEN_INITIAL_SUPPLY);
        assert_eq!(
            t.balance_of(crate::config::DEFAULT_TREASURY_ADDRESS),
            crate::config::TOKEN_INITIAL_SUPPLY
        );
    }

    #[test]
    fn token_serialization_roundtrip() {
        let mut t = token();
        t.transfer("treasury", "alice", 777).unwrap();
        t.approve("alice", "vault", 42);

        let json = serde_json::to_string(&t).expect("serialize");
        let recovered: InMemoryToken = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.balance_of("alice"), 777);
        assert_eq!(recovered.allowance("alice", "vault"), 42);
        assert_eq!(recovered.total_supply(), 1_000_000);
    }
}
