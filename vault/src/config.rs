//! # Configuration & Constants
//!
//! Every magic number in COFFER lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// The vault core version string. Reported by the daemon's `/status`
/// endpoint alongside the binary version.
pub const VAULT_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Withdraw Policy Defaults
// ---------------------------------------------------------------------------

/// Withdrawals start disabled. A freshly constructed vault accepts deposits
/// but cannot disburse a single unit until the administrator flips the gate.
pub const DEFAULT_WITHDRAW_ENABLED: bool = false;

/// The default per-call withdrawal ceiling. Zero — which blocks all
/// withdrawals even once the gate is open. Closed until configured is the
/// only safe default for a custody system.
pub const DEFAULT_MAX_WITHDRAW_AMOUNT: u64 = 0;

// ---------------------------------------------------------------------------
// Well-Known Accounts
// ---------------------------------------------------------------------------

/// The vault's own account on the asset ledger. Funds custodied by the
/// vault sit here; the vault's balance is always *derived* from the asset,
/// never stored.
pub const DEFAULT_VAULT_ADDRESS: &str = "coffer:vault";

/// The account the reference token mints its genesis supply to.
pub const DEFAULT_TREASURY_ADDRESS: &str = "coffer:treasury";

/// The default administrative authority for a daemon-hosted vault.
/// Override with `--admin` in production — this default exists so that
/// local development works out of the box.
pub const DEFAULT_ADMIN_ADDRESS: &str = "coffer:admin";

// ---------------------------------------------------------------------------
// Reference Token Parameters
// ---------------------------------------------------------------------------

/// Display name of the reference in-memory token.
pub const TOKEN_NAME: &str = "Coffer Test Token";

/// Ticker symbol of the reference token.
pub const TOKEN_SYMBOL: &str = "CTT";

/// Display decimals. Purely cosmetic — the core never divides.
pub const TOKEN_DECIMALS: u8 = 8;

/// Genesis supply minted to the treasury: 50 million whole tokens at
/// 8 decimals. Plenty for any test scenario, comfortably far from u64::MAX.
pub const TOKEN_INITIAL_SUPPLY: u64 = 5_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Daemon Defaults
// ---------------------------------------------------------------------------

/// Default REST API port.
pub const DEFAULT_API_PORT: u16 = 9850;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9851;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_closed() {
        // A new vault must not be able to disburse anything.
        assert!(!DEFAULT_WITHDRAW_ENABLED);
        assert_eq!(DEFAULT_MAX_WITHDRAW_AMOUNT, 0);
    }

    #[test]
    fn well_known_accounts_are_distinct() {
        assert_ne!(DEFAULT_VAULT_ADDRESS, DEFAULT_TREASURY_ADDRESS);
        assert_ne!(DEFAULT_VAULT_ADDRESS, DEFAULT_ADMIN_ADDRESS);
        assert_ne!(DEFAULT_TREASURY_ADDRESS, DEFAULT_ADMIN_ADDRESS);
    }

    #[test]
    fn api_and_metrics_ports_differ() {
        assert_ne!(DEFAULT_API_PORT, DEFAULT_METRICS_PORT);
    }
}
