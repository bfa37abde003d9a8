//! # Vault Ledger
//!
//! The custodial ledger overlay. A [`Vault`] holds exactly one handle to
//! an external fungible asset and implements deposit and withdraw as
//! policy-gated transfers against it:
//!
//! - **deposit** is open to any account. It pulls pre-approved funds from
//!   the depositor into the vault's own asset account.
//! - **withdraw** runs a guarded predicate chain — withdrawer capability,
//!   global gate, per-call ceiling — before pushing funds from the vault's
//!   account to the named recipient.
//!
//! The vault stores no balance of its own. Its holdings are always derived
//! from the asset ledger via `balance_of`, so the asset remains the single
//! ground truth.
//!
//! ## Withdraw Check Order
//!
//! The checks run in a fixed order and the first failure wins:
//!
//! 1. caller holds the withdrawer capability → [`VaultError::CallerNotWithdrawer`]
//! 2. the global gate is open → [`VaultError::WithdrawDisabled`]
//! 3. amount within the ceiling → [`VaultError::ExceedsMaximumAmount`]
//! 4. the vault actually holds the funds → [`VaultError::InsufficientVaultBalance`]
//!
//! Check 4 is not pre-validated by the vault — it is enforced by the
//! asset's own transfer and surfaced as a mapped failure. Each call is
//! evaluated independently against current policy state; there is no
//! session or multi-step protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::asset::{Address, AssetError, SharedAsset};
use crate::policy::{PolicyError, PolicyStore};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
///
/// Every failure aborts the entire operation with no partial state change.
/// The caller always receives the specific kind, never a generic failure,
/// so retries and alerts can discriminate cause.
#[derive(Debug, Error)]
pub enum VaultError {
    /// A policy mutation or admin action failed authorization.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Withdraw called by an account outside the withdrawer set.
    #[error("caller {caller} does not hold the withdrawer capability")]
    CallerNotWithdrawer {
        /// The account that attempted the withdrawal.
        caller: Address,
    },

    /// Withdraw called while the global gate is closed.
    #[error("withdrawals are disabled")]
    WithdrawDisabled,

    /// The requested amount exceeds the configured per-call ceiling.
    #[error("amount {requested} exceeds the maximum withdrawal of {max_amount}")]
    ExceedsMaximumAmount {
        /// The amount that was requested.
        requested: u64,
        /// The configured ceiling.
        max_amount: u64,
    },

    /// The depositor's spendable funds (balance or allowance granted to
    /// the vault) are less than the deposit amount.
    #[error("insufficient balance: {depositor} cannot cover a deposit of {requested}")]
    InsufficientBalance {
        /// The account attempting the deposit.
        depositor: Address,
        /// The amount that was requested.
        requested: u64,
    },

    /// The vault's own holdings are less than the requested withdrawal.
    /// Surfaced from the asset's transfer, not pre-validated here.
    #[error("vault holds {available}, cannot withdraw {requested}")]
    InsufficientVaultBalance {
        /// The vault's current holdings.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// No asset handle has been installed yet.
    #[error("no asset configured for this vault")]
    AssetNotConfigured,
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// Receipt returned by a successful [`Vault::deposit`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Unique identifier for this deposit.
    pub id: Uuid,

    /// The account the funds were pulled from.
    pub depositor: Address,

    /// The amount deposited (smallest units).
    pub amount: u64,

    /// The vault's holdings after the deposit.
    pub vault_balance: u64,

    /// When the deposit was executed (UTC).
    pub timestamp: DateTime<Utc>,
}

/// Receipt returned by a successful [`Vault::withdraw`].
///
/// The withdrawer acts as an authorized disburser, not a personal account
/// holder — funds go to `recipient`, which may or may not be the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    /// Unique identifier for this withdrawal.
    pub id: Uuid,

    /// The withdrawer that authorized the disbursement.
    pub withdrawer: Address,

    /// The account the funds were pushed to.
    pub recipient: Address,

    /// The amount withdrawn (smallest units).
    pub amount: u64,

    /// The vault's holdings after the withdrawal.
    pub vault_balance: u64,

    /// When the withdrawal was executed (UTC).
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// An access-controlled custodial vault for a single fungible asset.
///
/// Construction fixes the vault's own asset-ledger account and the
/// administrative authority; the asset handle is installed afterwards by
/// the administrator via [`set_asset`](Self::set_asset). Until then, every
/// deposit and withdrawal fails with [`VaultError::AssetNotConfigured`].
///
/// # Thread Safety
///
/// `Vault` is `Send` and `Sync` (the asset sits behind a lock), but the
/// serialization guarantee the accounting relies on — no two operations
/// interleave partially — comes from the hosting layer, which wraps the
/// whole vault in a lock of its own.
pub struct Vault {
    /// The vault's own account on the asset ledger.
    address: Address,

    /// Handle to the external asset. `None` until the administrator
    /// installs it.
    asset: Option<SharedAsset>,

    /// Authorization and withdrawal-policy state.
    policy: PolicyStore,

    /// When this vault was constructed.
    created_at: DateTime<Utc>,
}

impl Vault {
    /// Creates a vault with no asset handle and a closed policy store.
    ///
    /// # Arguments
    ///
    /// * `admin` — the administrative authority. Fixed for the vault's
    ///   lifetime; rotation is out of scope.
    /// * `address` — the vault's own account on the asset ledger.
    pub fn new(admin: &str, address: &str) -> Self {
        Self {
            address: address.to_string(),
            asset: None,
            policy: PolicyStore::new(admin),
            created_at: Utc::now(),
        }
    }

    /// Returns the vault's own asset-ledger account.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns when this vault was constructed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns a reference to the policy store (open queries).
    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// Returns a mutable reference to the policy store. Every setter on
    /// the store is itself caller-gated, so exposing this does not bypass
    /// the administrative authority.
    pub fn policy_mut(&mut self) -> &mut PolicyStore {
        &mut self.policy
    }

    /// Installs the asset handle. Administrator only.
    ///
    /// Re-installing is permitted — it is an explicit admin action — but
    /// the operational expectation is set-once.
    pub fn set_asset(&mut self, caller: &str, asset: SharedAsset) -> Result<(), VaultError> {
        self.policy.ensure_admin(caller)?;
        self.asset = Some(asset);
        tracing::info!(vault = %self.address, "asset handle installed");
        Ok(())
    }

    /// Returns `true` if an asset handle has been installed.
    pub fn has_asset(&self) -> bool {
        self.asset.is_some()
    }

    /// Returns the vault's current holdings, derived from the asset ledger.
    pub fn balance(&self) -> Result<u64, VaultError> {
        let asset = self.asset.as_ref().ok_or(VaultError::AssetNotConfigured)?;
        Ok(asset.read().balance_of(&self.address))
    }

    /// Deposits `amount` units from `depositor` into the vault.
    ///
    /// Open to any account — no capability required. The funds are pulled
    /// via the asset's allowance mechanism, so the depositor must have
    /// approved the vault for at least `amount` beforehand.
    ///
    /// A zero `amount` is a no-op at the asset level and succeeds without
    /// moving anything.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AssetNotConfigured`] if no asset is installed.
    /// Returns [`VaultError::InsufficientBalance`] if the depositor's
    /// balance or allowance cannot cover `amount`; nothing changes.
    pub fn deposit(&mut self, depositor: &str, amount: u64) -> Result<DepositReceipt, VaultError> {
        let asset = self.asset.as_ref().ok_or(VaultError::AssetNotConfigured)?;

        let mut ledger = asset.write();
        ledger
            .transfer_from(&self.address, depositor, &self.address, amount)
            .map_err(|e| match e {
                AssetError::InsufficientBalance { .. }
                | AssetError::InsufficientAllowance { .. } => VaultError::InsufficientBalance {
                    depositor: depositor.to_string(),
                    requested: amount,
                },
                other => map_asset_error(other),
            })?;

        let vault_balance = ledger.balance_of(&self.address);
        drop(ledger);

        tracing::info!(depositor, amount, vault_balance, "deposit accepted");
        Ok(DepositReceipt {
            id: Uuid::new_v4(),
            depositor: depositor.to_string(),
            amount,
            vault_balance,
            timestamp: Utc::now(),
        })
    }

    /// Withdraws `amount` units from the vault to `recipient`, authorized
    /// by `caller`.
    ///
    /// The caller must hold the withdrawer capability; the global gate
    /// must be open; `amount` must not exceed the ceiling; and the vault
    /// must hold the funds. The checks run in exactly that order and the
    /// first failure aborts the call with nothing changed.
    ///
    /// `recipient == caller` is permitted — nothing requires a withdrawer
    /// to disburse to someone else.
    ///
    /// # Errors
    ///
    /// See [`VaultError`] — each failing check has its own variant.
    pub fn withdraw(
        &mut self,
        caller: &str,
        amount: u64,
        recipient: &str,
    ) -> Result<WithdrawReceipt, VaultError> {
        // 1. Capability check.
        if !self.policy.is_withdrawer(caller) {
            return Err(VaultError::CallerNotWithdrawer {
                caller: caller.to_string(),
            });
        }

        // 2. Global gate.
        let policy = self.policy.policy();
        if !policy.enabled {
            return Err(VaultError::WithdrawDisabled);
        }

        // 3. Per-call ceiling.
        if amount > policy.max_amount {
            return Err(VaultError::ExceedsMaximumAmount {
                requested: amount,
                max_amount: policy.max_amount,
            });
        }

        let asset = self.asset.as_ref().ok_or(VaultError::AssetNotConfigured)?;

        // 4. Funds check — delegated to the asset's own transfer.
        let mut ledger = asset.write();
        ledger
            .transfer(&self.address, recipient, amount)
            .map_err(map_asset_error)?;

        let vault_balance = ledger.balance_of(&self.address);
        drop(ledger);

        tracing::info!(
            withdrawer = caller,
            recipient,
            amount,
            vault_balance,
            "withdrawal disbursed"
        );
        Ok(WithdrawReceipt {
            id: Uuid::new_v4(),
            withdrawer: caller.to_string(),
            recipient: recipient.to_string(),
            amount,
            vault_balance,
            timestamp: Utc::now(),
        })
    }
}

/// Maps an asset failure on the vault's own account to the vault taxonomy.
fn map_asset_error(e: AssetError) -> VaultError {
    match e {
        AssetError::InsufficientBalance {
            available,
            requested,
            ..
        } => VaultError::InsufficientVaultBalance {
            available,
            requested,
        },
        AssetError::InsufficientAllowance { requested, .. } => VaultError::InsufficientVaultBalance {
            available: 0,
            requested,
        },
        AssetError::Overflow { account } => {
            // A credit overflow on withdraw means the recipient's balance
            // would wrap. Report it as the vault being unable to disburse.
            tracing::warn!(%account, "credit overflow during vault transfer");
            VaultError::InsufficientVaultBalance {
                available: 0,
                requested: u64::MAX,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::RwLock;

    use super::*;
    use crate::token::InMemoryToken;

    const ADMIN: &str = "coffer:admin";
    const VAULT: &str = "coffer:vault";

    /// A vault wired to a fresh token whose whole supply sits with the
    /// treasury. Returns the vault and a handle for assertions.
    fn vault_with_token() -> (Vault, SharedAsset) {
        let token = InMemoryToken::new("Test", "TST", 8, "treasury", 10_000_000);
        let handle: SharedAsset = Arc::new(RwLock::new(token));

        let mut vault = Vault::new(ADMIN, VAULT);
        vault.set_asset(ADMIN, Arc::clone(&handle)).unwrap();
        (vault, handle)
    }

    /// Funds `account` from the treasury and approves the vault for the
    /// full funded amount.
    fn fund_and_approve(handle: &SharedAsset, account: &str, amount: u64) {
        let mut ledger = handle.write();
        ledger.transfer("treasury", account, amount).unwrap();
        ledger.approve(account, VAULT, amount);
    }

    #[test]
    fn new_vault_has_no_asset() {
        let vault = Vault::new(ADMIN, VAULT);
        assert!(!vault.has_asset());
        assert!(matches!(
            vault.balance(),
            Err(VaultError::AssetNotConfigured)
        ));
    }

    #[test]
    fn deposit_without_asset_rejected() {
        let mut vault = Vault::new(ADMIN, VAULT);
        let result = vault.deposit("alice", 100);
        assert!(matches!(result, Err(VaultError::AssetNotConfigured)));
    }

    #[test]
    fn non_admin_cannot_install_asset() {
        let token = InMemoryToken::new("Test", "TST", 8, "treasury", 1_000);
        let handle: SharedAsset = Arc::new(RwLock::new(token));

        let mut vault = Vault::new(ADMIN, VAULT);
        let result = vault.set_asset("mallory", handle);

        assert!(matches!(
            result,
            Err(VaultError::Policy(PolicyError::Unauthorized { .. }))
        ));
        assert!(!vault.has_asset());
    }

    #[test]
    fn deposit_pulls_approved_funds() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000);

        let receipt = vault.deposit("alice", 600).unwrap();
        assert_eq!(receipt.amount, 600);
        assert_eq!(receipt.vault_balance, 600);

        assert_eq!(vault.balance().unwrap(), 600);
        assert_eq!(handle.read().balance_of("alice"), 400);
    }

    #[test]
    fn deposit_without_approval_rejected() {
        let (mut vault, handle) = vault_with_token();
        handle.write().transfer("treasury", "alice", 1_000).unwrap();

        let result = vault.deposit("alice", 500);
        assert!(matches!(
            result,
            Err(VaultError::InsufficientBalance { requested: 500, .. })
        ));
        // Nothing moved.
        assert_eq!(handle.read().balance_of("alice"), 1_000);
        assert_eq!(vault.balance().unwrap(), 0);
    }

    #[test]
    fn deposit_beyond_balance_rejected_atomically() {
        let (mut vault, handle) = vault_with_token();
        // Approve more than alice actually holds.
        handle.write().transfer("treasury", "alice", 100).unwrap();
        handle.write().approve("alice", VAULT, 10_000);

        let result = vault.deposit("alice", 5_000);
        assert!(matches!(result, Err(VaultError::InsufficientBalance { .. })));

        let ledger = handle.read();
        assert_eq!(ledger.balance_of("alice"), 100);
        assert_eq!(ledger.balance_of(VAULT), 0);
    }

    #[test]
    fn zero_deposit_is_a_noop() {
        let (mut vault, _handle) = vault_with_token();
        let receipt = vault.deposit("alice", 0).unwrap();
        assert_eq!(receipt.vault_balance, 0);
    }

    #[test]
    fn withdraw_requires_capability_first() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000);
        vault.deposit("alice", 1_000).unwrap();

        // Gate open, ceiling generous — but carol holds no capability.
        vault.policy_mut().set_withdraw_enabled(ADMIN, true).unwrap();
        vault
            .policy_mut()
            .set_max_withdraw_amount(ADMIN, 1_000_000)
            .unwrap();

        let result = vault.withdraw("carol", 10, "carol");
        assert!(matches!(
            result,
            Err(VaultError::CallerNotWithdrawer { .. })
        ));
        assert_eq!(vault.balance().unwrap(), 1_000);
    }

    #[test]
    fn withdraw_blocked_while_disabled() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000);
        vault.deposit("alice", 1_000).unwrap();

        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        vault
            .policy_mut()
            .set_max_withdraw_amount(ADMIN, 1_000_000)
            .unwrap();
        // Gate stays closed.

        let result = vault.withdraw("bob", 10, "alice");
        assert!(matches!(result, Err(VaultError::WithdrawDisabled)));
    }

    #[test]
    fn withdraw_blocked_above_ceiling() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000);
        vault.deposit("alice", 1_000).unwrap();

        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        vault.policy_mut().set_withdraw_enabled(ADMIN, true).unwrap();
        vault.policy_mut().set_max_withdraw_amount(ADMIN, 100).unwrap();

        let result = vault.withdraw("bob", 101, "alice");
        assert!(matches!(
            result,
            Err(VaultError::ExceedsMaximumAmount {
                requested: 101,
                max_amount: 100,
            })
        ));
    }

    #[test]
    fn ceiling_of_zero_blocks_even_when_enabled() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000);
        vault.deposit("alice", 1_000).unwrap();

        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        vault.policy_mut().set_withdraw_enabled(ADMIN, true).unwrap();
        // max_amount stays at the default 0.

        let result = vault.withdraw("bob", 1, "bob");
        assert!(matches!(
            result,
            Err(VaultError::ExceedsMaximumAmount { .. })
        ));
    }

    #[test]
    fn withdraw_beyond_vault_balance_surfaces_from_asset() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 2_000);
        vault.deposit("alice", 2_000).unwrap();

        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        vault.policy_mut().set_withdraw_enabled(ADMIN, true).unwrap();
        vault
            .policy_mut()
            .set_max_withdraw_amount(ADMIN, 5_000)
            .unwrap();

        let result = vault.withdraw("bob", 3_000, "alice");
        assert!(matches!(
            result,
            Err(VaultError::InsufficientVaultBalance {
                available: 2_000,
                requested: 3_000,
            })
        ));
        // Atomic: nothing moved.
        assert_eq!(vault.balance().unwrap(), 2_000);
    }

    #[test]
    fn withdraw_happy_path_disburses_to_recipient() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000_000);
        vault.deposit("alice", 500_000).unwrap();

        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        vault.policy_mut().set_withdraw_enabled(ADMIN, true).unwrap();
        vault
            .policy_mut()
            .set_max_withdraw_amount(ADMIN, 1_000_000)
            .unwrap();

        let receipt = vault.withdraw("bob", 300_000, "alice").unwrap();
        assert_eq!(receipt.withdrawer, "bob");
        assert_eq!(receipt.recipient, "alice");
        assert_eq!(receipt.vault_balance, 200_000);

        assert_eq!(vault.balance().unwrap(), 200_000);
        assert_eq!(handle.read().balance_of("alice"), 800_000);
        // The withdrawer disbursed; they received nothing themselves.
        assert_eq!(handle.read().balance_of("bob"), 0);
    }

    #[test]
    fn withdraw_to_self_is_permitted() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000);
        vault.deposit("alice", 1_000).unwrap();

        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        vault.policy_mut().set_withdraw_enabled(ADMIN, true).unwrap();
        vault.policy_mut().set_max_withdraw_amount(ADMIN, 1_000).unwrap();

        vault.withdraw("bob", 250, "bob").unwrap();
        assert_eq!(handle.read().balance_of("bob"), 250);
    }

    #[test]
    fn withdraw_to_vault_address_leaves_holdings_unchanged() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000_000);
        vault.deposit("alice", 500_000).unwrap();

        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        vault.policy_mut().set_withdraw_enabled(ADMIN, true).unwrap();
        vault
            .policy_mut()
            .set_max_withdraw_amount(ADMIN, 1_000_000)
            .unwrap();

        // Disbursing to the vault's own account must not mint anything.
        let receipt = vault.withdraw("bob", 300_000, VAULT).unwrap();
        assert_eq!(receipt.vault_balance, 500_000);
        assert_eq!(vault.balance().unwrap(), 500_000);
        assert_eq!(handle.read().total_supply(), 10_000_000);
    }

    #[test]
    fn capability_check_precedes_gate_check() {
        let (mut vault, _handle) = vault_with_token();
        // Gate closed AND caller unauthorized: the capability failure
        // must win because it is evaluated first.
        let result = vault.withdraw("carol", 10, "carol");
        assert!(matches!(
            result,
            Err(VaultError::CallerNotWithdrawer { .. })
        ));
    }

    #[test]
    fn gate_check_precedes_ceiling_check() {
        let (mut vault, _handle) = vault_with_token();
        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        // Gate closed and amount over the (zero) ceiling: gate wins.
        let result = vault.withdraw("bob", 10, "bob");
        assert!(matches!(result, Err(VaultError::WithdrawDisabled)));
    }

    #[test]
    fn revoked_withdrawer_loses_access() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000);
        vault.deposit("alice", 1_000).unwrap();

        vault.policy_mut().grant_withdrawer(ADMIN, "bob").unwrap();
        vault.policy_mut().set_withdraw_enabled(ADMIN, true).unwrap();
        vault.policy_mut().set_max_withdraw_amount(ADMIN, 1_000).unwrap();
        vault.withdraw("bob", 100, "bob").unwrap();

        vault.policy_mut().revoke_withdrawer(ADMIN, "bob").unwrap();
        let result = vault.withdraw("bob", 100, "bob");
        assert!(matches!(
            result,
            Err(VaultError::CallerNotWithdrawer { .. })
        ));
    }

    #[test]
    fn receipt_serialization_roundtrip() {
        let (mut vault, handle) = vault_with_token();
        fund_and_approve(&handle, "alice", 1_000);
        let receipt = vault.deposit("alice", 750).unwrap();

        let json = serde_json::to_string(&receipt).expect("serialize");
        let recovered: DepositReceipt = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.depositor, "alice");
        assert_eq!(recovered.amount, 750);
        assert_eq!(recovered.vault_balance, 750);
    }
}
