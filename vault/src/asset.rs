//! # Fungible Asset Interface
//!
//! The vault does not implement token logic. It consumes a collaborator —
//! any ledger that can answer "how much does this account hold", push value
//! with [`transfer`](FungibleAsset::transfer), and pull pre-approved value
//! with [`transfer_from`](FungibleAsset::transfer_from).
//!
//! ## Allowance Model
//!
//! Deposits use the classic pull pattern: the depositor first calls
//! [`approve`](FungibleAsset::approve) granting the vault a spending
//! allowance, then asks the vault to deposit. The vault pulls the funds
//! via `transfer_from` acting as the spender. If either the depositor's
//! balance or the granted allowance is short, the pull fails and nothing
//! moves.
//!
//! ## Atomicity Contract
//!
//! Every implementation must be all-or-nothing: a transfer that fails for
//! any reason leaves all balances and allowances untouched. The vault leans
//! on this to provide its own rollback guarantee — it never pre-validates
//! balances, it just forwards the transfer and maps the failure.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// An opaque account identifier on the asset ledger.
///
/// The vault attaches no meaning to the contents — it only compares for
/// identity. Any non-empty string the underlying asset accepts is fine.
pub type Address = String;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a fungible-asset collaborator.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The source account holds less than the requested amount.
    #[error("insufficient balance: account {account} holds {available}, requested {requested}")]
    InsufficientBalance {
        /// The account that was being debited.
        account: Address,
        /// Its current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// The spender's allowance from the owner is less than the requested pull.
    #[error(
        "insufficient allowance: {spender} may spend {allowance} of {owner}'s funds, requested {requested}"
    )]
    InsufficientAllowance {
        /// The account whose funds were being pulled.
        owner: Address,
        /// The account attempting the pull.
        spender: Address,
        /// The currently granted allowance.
        allowance: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// A credit would overflow `u64`. If you hit this, someone is moving
    /// more than 18.4 quintillion units and it is not a legitimate deposit.
    #[error("balance overflow crediting account {account}")]
    Overflow {
        /// The account that was being credited.
        account: Address,
    },
}

// ---------------------------------------------------------------------------
// FungibleAsset
// ---------------------------------------------------------------------------

/// The external fungible-asset contract the vault consumes.
///
/// Implementations must uphold two properties the vault depends on:
///
/// 1. **Atomicity** — a failed operation changes no state.
/// 2. **Conservation** — a successful transfer debits and credits by
///    exactly the same amount; no units appear or vanish.
///
/// Zero-amount transfers are valid no-ops, not errors.
pub trait FungibleAsset {
    /// Returns the total number of units in existence.
    fn total_supply(&self) -> u64;

    /// Returns the balance held by `account`. Unknown accounts hold zero.
    fn balance_of(&self, account: &str) -> u64;

    /// Moves `amount` units from `from` to `to`. Direct push — the caller
    /// is understood to act with the authority of `from`.
    fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<(), AssetError>;

    /// Pulls `amount` units from `owner` to `to`, spending `spender`'s
    /// allowance. The allowance is decremented by `amount` on success.
    fn transfer_from(
        &mut self,
        spender: &str,
        owner: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), AssetError>;

    /// Grants `spender` permission to pull up to `amount` units from
    /// `owner`. Overwrites any previous allowance for the pair.
    fn approve(&mut self, owner: &str, spender: &str, amount: u64);
}

/// Shared handle to a fungible asset.
///
/// The vault holds one of these (installed once by the administrator) and
/// the hosting process keeps a clone for balance queries and test
/// assertions. `parking_lot::RwLock` because asset operations are short
/// and synchronous — no async locking needed at this layer.
pub type SharedAsset = Arc<RwLock<dyn FungibleAsset + Send + Sync>>;
