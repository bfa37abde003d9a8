// Copyright (c) 2026 Coffer Labs. MIT License.
// See LICENSE for details.

//! # COFFER Vault Daemon
//!
//! Entry point for the `coffer-node` binary. Parses CLI arguments,
//! initializes logging and metrics, constructs the hosted vault over the
//! reference token ledger, and serves the REST API.
//!
//! The binary supports two subcommands:
//!
//! - `run`     — start the vault daemon
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;

use coffer_vault::{InMemoryToken, SharedAsset, Vault};

use cli::{CofferNodeCli, Commands};
use logging::LogFormat;
use metrics::VaultMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CofferNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full daemon: vault construction, API server, and metrics
/// endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "coffer_node=info,coffer_vault=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        admin = %args.admin,
        vault_address = %args.vault_address,
        "starting coffer-node"
    );

    // --- Asset ledger ---
    let token = InMemoryToken::new(
        coffer_vault::config::TOKEN_NAME,
        coffer_vault::config::TOKEN_SYMBOL,
        coffer_vault::config::TOKEN_DECIMALS,
        &args.treasury,
        args.initial_supply,
    );
    let asset: SharedAsset = Arc::new(parking_lot::RwLock::new(token));
    tracing::info!(
        treasury = %args.treasury,
        supply = args.initial_supply,
        "reference token minted"
    );

    // --- Vault ---
    let mut vault = Vault::new(&args.admin, &args.vault_address);
    vault
        .set_asset(&args.admin, Arc::clone(&asset))
        .context("failed to install asset handle on the vault")?;
    tracing::info!(address = %args.vault_address, admin = %args.admin, "vault constructed");

    // --- Metrics ---
    let vault_metrics = Arc::new(VaultMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (vault {})",
            env!("CARGO_PKG_VERSION"),
            coffer_vault::config::VAULT_VERSION,
        ),
        started_at: chrono::Utc::now(),
        vault: Arc::new(RwLock::new(vault)),
        asset,
        metrics: Arc::clone(&vault_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&vault_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("coffer-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("coffer-node {}", env!("CARGO_PKG_VERSION"));
    println!("vault       {}", coffer_vault::config::VAULT_VERSION);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
