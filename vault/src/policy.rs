//! # Withdrawal Policy Store
//!
//! The single source of truth for "who may withdraw" and "under what
//! global constraints". Three pieces of state:
//!
//! - the **withdrawer set** — accounts granted the withdrawer capability,
//! - the **enabled flag** — the global withdrawal gate,
//! - the **max amount** — a per-call ceiling on withdrawals.
//!
//! All mutation is funneled through administrator-gated setters. The
//! capability model is plain set membership — an account either holds the
//! capability or it doesn't, with no expiry and no hierarchy. Granting a
//! capability twice is a no-op, not an error, and so is revoking one that
//! was never granted.
//!
//! A freshly constructed store is *closed*: withdrawals disabled, ceiling
//! zero. Nothing leaves the vault until the administrator explicitly
//! configures both.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::Address;
use crate::config;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during policy mutation.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// An administrative setter was called by someone other than the
    /// administrative authority.
    #[error("unauthorized: {caller} is not the administrative authority")]
    Unauthorized {
        /// The account that attempted the mutation.
        caller: Address,
    },
}

// ---------------------------------------------------------------------------
// WithdrawPolicy
// ---------------------------------------------------------------------------

/// The global withdrawal constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPolicy {
    /// The global gate. While `false`, every withdrawal fails regardless
    /// of who asks or how much.
    pub enabled: bool,

    /// Per-call ceiling in smallest units. Zero blocks all withdrawals
    /// even when `enabled` is true.
    pub max_amount: u64,
}

impl Default for WithdrawPolicy {
    /// Closed until explicitly configured.
    fn default() -> Self {
        Self {
            enabled: config::DEFAULT_WITHDRAW_ENABLED,
            max_amount: config::DEFAULT_MAX_WITHDRAW_AMOUNT,
        }
    }
}

// ---------------------------------------------------------------------------
// PolicyStore
// ---------------------------------------------------------------------------

/// Authorization and withdrawal-policy state for one vault.
///
/// Owned by the [`Vault`](crate::vault::Vault); every setter checks the
/// caller against the administrative authority fixed at construction.
/// Admin rotation is deliberately out of scope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyStore {
    /// The administrative authority. The only account allowed to mutate
    /// this store.
    admin: Address,

    /// Accounts holding the withdrawer capability.
    withdrawers: HashSet<Address>,

    /// The global withdrawal constraints.
    policy: WithdrawPolicy,

    /// Timestamp of the most recent successful mutation.
    updated_at: DateTime<Utc>,
}

impl PolicyStore {
    /// Creates a closed policy store governed by `admin`.
    pub fn new(admin: &str) -> Self {
        Self {
            admin: admin.to_string(),
            withdrawers: HashSet::new(),
            policy: WithdrawPolicy::default(),
            updated_at: Utc::now(),
        }
    }

    /// Returns the administrative authority's address.
    pub fn admin(&self) -> &str {
        &self.admin
    }

    /// Returns the current withdrawal constraints.
    pub fn policy(&self) -> WithdrawPolicy {
        self.policy
    }

    /// Returns when this store was last mutated.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` if `account` holds the withdrawer capability.
    /// Open query — no authorization required.
    pub fn is_withdrawer(&self, account: &str) -> bool {
        self.withdrawers.contains(account)
    }

    /// Returns the number of accounts holding the withdrawer capability.
    pub fn withdrawer_count(&self) -> usize {
        self.withdrawers.len()
    }

    /// Fails with [`PolicyError::Unauthorized`] unless `caller` is the
    /// administrative authority. Shared gate for every setter here and
    /// for the vault's own admin surface.
    pub fn ensure_admin(&self, caller: &str) -> Result<(), PolicyError> {
        if caller != self.admin {
            return Err(PolicyError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Grants the withdrawer capability to `account`. Idempotent.
    pub fn grant_withdrawer(&mut self, caller: &str, account: &str) -> Result<(), PolicyError> {
        self.ensure_admin(caller)?;

        if self.withdrawers.insert(account.to_string()) {
            tracing::info!(account, "withdrawer capability granted");
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Revokes the withdrawer capability from `account`. Idempotent.
    pub fn revoke_withdrawer(&mut self, caller: &str, account: &str) -> Result<(), PolicyError> {
        self.ensure_admin(caller)?;

        if self.withdrawers.remove(account) {
            tracing::info!(account, "withdrawer capability revoked");
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sets the global withdrawal gate.
    pub fn set_withdraw_enabled(&mut self, caller: &str, enabled: bool) -> Result<(), PolicyError> {
        self.ensure_admin(caller)?;

        self.policy.enabled = enabled;
        self.updated_at = Utc::now();
        tracing::info!(enabled, "withdraw gate updated");
        Ok(())
    }

    /// Sets the per-call withdrawal ceiling. Any `u64` is accepted —
    /// zero effectively re-closes the vault without touching the gate.
    pub fn set_max_withdraw_amount(&mut self, caller: &str, amount: u64) -> Result<(), PolicyError> {
        self.ensure_admin(caller)?;

        self.policy.max_amount = amount;
        self.updated_at = Utc::now();
        tracing::info!(max_amount = amount, "withdraw ceiling updated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
