//! # CLI Interface
//!
//! Defines the command-line argument structure for `coffer-node` using
//! `clap` derive. Supports two subcommands: `run` and `version`.

use clap::{Parser, Subcommand};

use coffer_vault::config;

/// COFFER vault daemon.
///
/// Hosts a single custodial vault behind a REST API: open deposits,
/// role-gated withdrawals, an administrator-only policy surface, and
/// Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "coffer-node",
    about = "COFFER custodial vault daemon",
    version,
    propagate_version = true
)]
pub struct CofferNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the coffer-node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the vault daemon.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST API.
    #[arg(long, env = "COFFER_API_PORT", default_value_t = config::DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "COFFER_METRICS_PORT", default_value_t = config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Address of the administrative authority. Only this account may
    /// mutate the withdrawal policy or the withdrawer set.
    #[arg(long, env = "COFFER_ADMIN", default_value = config::DEFAULT_ADMIN_ADDRESS)]
    pub admin: String,

    /// The vault's own account on the asset ledger.
    #[arg(long, env = "COFFER_VAULT_ADDRESS", default_value = config::DEFAULT_VAULT_ADDRESS)]
    pub vault_address: String,

    /// Account the reference token mints its genesis supply to.
    #[arg(long, env = "COFFER_TREASURY", default_value = config::DEFAULT_TREASURY_ADDRESS)]
    pub treasury: String,

    /// Genesis supply of the reference token, in smallest units.
    #[arg(long, env = "COFFER_INITIAL_SUPPLY", default_value_t = config::TOKEN_INITIAL_SUPPLY)]
    pub initial_supply: u64,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "COFFER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}
