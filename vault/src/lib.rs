// Copyright (c) 2026 Coffer Labs. MIT License.
// See LICENSE for details.

//! # COFFER — Core Vault Library
//!
//! COFFER is an access-controlled custodial vault for a single fungible
//! asset. Anyone can deposit; only accounts holding the *withdrawer*
//! capability can move funds out, and even they answer to a global
//! enable/disable switch and a per-call ceiling set by the administrator.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of a
//! custody system:
//!
//! - **asset** — The fungible-asset interface the vault consumes. The vault
//!   never implements token logic itself; it holds a handle.
//! - **token** — A reference in-memory token for the daemon and tests.
//!   ERC-20 shaped: balances, allowances, pull-transfers.
//! - **policy** — Who may withdraw, and under what global constraints.
//!   Mutated only by the administrative authority.
//! - **vault** — The ledger overlay: deposit and withdraw as policy-gated
//!   transfers against the asset.
//! - **config** — Constants and defaults. One home for every magic number.
//!
//! ## Design Philosophy
//!
//! 1. All amounts are `u64` in smallest-unit denomination. No floats near
//!    money, ever.
//! 2. Every failure is a typed error. Callers can discriminate cause;
//!    nothing is swallowed.
//! 3. Operations are atomic — a failed deposit or withdrawal leaves every
//!    balance exactly where it was.
//! 4. If it touches money, it has tests. Plural.

pub mod asset;
pub mod config;
pub mod policy;
pub mod token;
pub mod vault;

pub use asset::{Address, AssetError, FungibleAsset, SharedAsset};
pub use policy::{PolicyError, PolicyStore, WithdrawPolicy};
pub use token::InMemoryToken;
pub use vault::{DepositReceipt, Vault, VaultError, WithdrawReceipt};
