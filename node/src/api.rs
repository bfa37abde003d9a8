//! # REST API
//!
//! Builds the axum router that exposes the vault daemon's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                          | Description                        |
//! |--------|-------------------------------|------------------------------------|
//! | GET    | `/health`                     | Liveness probe                     |
//! | GET    | `/status`                     | Daemon + vault status summary      |
//! | GET    | `/vault/balance`              | Vault holdings on the asset ledger |
//! | GET    | `/vault/policy`               | Current withdrawal policy          |
//! | GET    | `/accounts/:address/balance`  | Any account's asset balance        |
//! | POST   | `/vault/deposit`              | Pull approved funds into the vault |
//! | POST   | `/vault/withdraw`             | Role-gated disbursement            |
//! | POST   | `/admin/withdrawers`          | Grant the withdrawer capability    |
//! | DELETE | `/admin/withdrawers/:address` | Revoke the withdrawer capability   |
//! | POST   | `/admin/policy/enabled`       | Flip the global withdrawal gate    |
//! | POST   | `/admin/policy/max-amount`    | Set the per-call ceiling           |
//!
//! Every vault failure maps to a distinct HTTP status plus a stable
//! machine-readable `error` discriminant, so API consumers can discriminate
//! cause exactly like library consumers matching on [`VaultError`].

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use coffer_vault::{PolicyError, SharedAsset, Vault, VaultError};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`. The vault sits behind a
/// `tokio::sync::RwLock`, which provides the serialization guarantee the
/// accounting relies on: each deposit, withdrawal, or policy mutation runs
/// to completion before the next observes state.
#[derive(Clone)]
pub struct AppState {
    /// The daemon's reported version string.
    pub version: String,
    /// When the daemon started.
    pub started_at: DateTime<Utc>,
    /// The hosted vault.
    pub vault: Arc<RwLock<Vault>>,
    /// The custodied asset, shared with the vault. Used for read-only
    /// account balance queries.
    pub asset: SharedAsset,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured API port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/vault/balance", get(vault_balance_handler))
        .route("/vault/policy", get(vault_policy_handler))
        .route("/accounts/:address/balance", get(account_balance_handler))
        .route("/vault/deposit", post(deposit_handler))
        .route("/vault/withdraw", post(withdraw_handler))
        .route("/admin/withdrawers", post(grant_withdrawer_handler))
        .route(
            "/admin/withdrawers/:address",
            delete(revoke_withdrawer_handler),
        )
        .route("/admin/policy/enabled", post(set_enabled_handler))
        .route("/admin/policy/max-amount", post(set_max_amount_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body for `POST /vault/deposit`.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    /// The account the funds are pulled from. Must have approved the
    /// vault for at least `amount` on the asset ledger.
    pub depositor: String,
    /// Amount in smallest units.
    pub amount: u64,
}

/// Body for `POST /vault/withdraw`.
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    /// The withdrawer authorizing the disbursement.
    pub caller: String,
    /// Amount in smallest units.
    pub amount: u64,
    /// The account receiving the funds. May equal `caller`.
    pub recipient: String,
}

/// Body for `POST /admin/withdrawers`.
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    /// The account invoking the admin surface.
    pub caller: String,
    /// The account being granted the withdrawer capability.
    pub account: String,
}

/// Body for `DELETE /admin/withdrawers/:address`.
#[derive(Debug, Deserialize)]
pub struct AdminCallerRequest {
    /// The account invoking the admin surface.
    pub caller: String,
}

/// Body for `POST /admin/policy/enabled`.
#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    /// The account invoking the admin surface.
    pub caller: String,
    /// The new gate state.
    pub enabled: bool,
}

/// Body for `POST /admin/policy/max-amount`.
#[derive(Debug, Deserialize)]
pub struct SetMaxAmountRequest {
    /// The account invoking the admin surface.
    pub caller: String,
    /// The new per-call ceiling in smallest units.
    pub max_amount: u64,
}

/// Stable error envelope returned for every rejected operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error discriminant.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Maps a vault failure to `(status, discriminant)`.
///
/// The discriminants are part of the API contract — automated callers key
/// retry and alerting decisions off them. Do not rename casually.
fn classify(e: &VaultError) -> (StatusCode, &'static str) {
    match e {
        VaultError::Policy(PolicyError::Unauthorized { .. }) => {
            (StatusCode::FORBIDDEN, "unauthorized")
        }
        VaultError::CallerNotWithdrawer { .. } => (StatusCode::FORBIDDEN, "caller_not_withdrawer"),
        VaultError::WithdrawDisabled => (StatusCode::CONFLICT, "withdraw_disabled"),
        VaultError::ExceedsMaximumAmount { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "exceeds_maximum_amount")
        }
        VaultError::InsufficientBalance { .. } => (StatusCode::CONFLICT, "insufficient_balance"),
        VaultError::InsufficientVaultBalance { .. } => {
            (StatusCode::CONFLICT, "insufficient_vault_balance")
        }
        VaultError::AssetNotConfigured => (StatusCode::SERVICE_UNAVAILABLE, "asset_not_configured"),
    }
}

/// Renders a vault failure as the standard error envelope and counts it.
fn reject(metrics: &SharedMetrics, e: VaultError) -> (StatusCode, Json<ErrorBody>) {
    metrics.rejected_operations_total.inc();
    let (status, kind) = classify(&e);
    tracing::debug!(error = kind, "operation rejected: {}", e);
    (
        status,
        Json(ErrorBody {
            error: kind.to_string(),
            message: e.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Read Handlers
// ---------------------------------------------------------------------------

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let vault = state.vault.read().await;
    let policy = vault.policy().policy();
    let balance = vault.balance().unwrap_or(0);

    Json(serde_json::json!({
        "version": state.version,
        "vault_address": vault.address(),
        "admin": vault.policy().admin(),
        "asset_configured": vault.has_asset(),
        "balance": balance,
        "policy": {
            "enabled": policy.enabled,
            "max_amount": policy.max_amount,
        },
        "withdrawer_count": vault.policy().withdrawer_count(),
        "uptime_secs": (Utc::now() - state.started_at).num_seconds(),
    }))
}

async fn vault_balance_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let vault = state.vault.read().await;
    let balance = vault
        .balance()
        .map_err(|e| reject(&state.metrics, e))?;
    Ok(Json(serde_json::json!({ "balance": balance })))
}

async fn vault_policy_handler(State(state): State<AppState>) -> impl IntoResponse {
    let vault = state.vault.read().await;
    let policy = vault.policy().policy();
    Json(serde_json::json!({
        "enabled": policy.enabled,
        "max_amount": policy.max_amount,
        "withdrawer_count": vault.policy().withdrawer_count(),
    }))
}

async fn account_balance_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let balance = state.asset.read().balance_of(&address);
    Json(serde_json::json!({ "address": address, "balance": balance }))
}

// ---------------------------------------------------------------------------
// Ledger Handlers
// ---------------------------------------------------------------------------

async fn deposit_handler(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let mut vault = state.vault.write().await;
    let receipt = vault
        .deposit(&req.depositor, req.amount)
        .map_err(|e| reject(&state.metrics, e))?;

    state.metrics.deposits_total.inc();
    state.metrics.deposited_units_total.inc_by(receipt.amount);
    state
        .metrics
        .vault_balance
        .set(i64::try_from(receipt.vault_balance).unwrap_or(i64::MAX));
    Ok(Json(receipt))
}

async fn withdraw_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let mut vault = state.vault.write().await;
    let receipt = vault
        .withdraw(&req.caller, req.amount, &req.recipient)
        .map_err(|e| reject(&state.metrics, e))?;

    state.metrics.withdrawals_total.inc();
    state.metrics.withdrawn_units_total.inc_by(receipt.amount);
    state
        .metrics
        .vault_balance
        .set(i64::try_from(receipt.vault_balance).unwrap_or(i64::MAX));
    Ok(Json(receipt))
}

// ---------------------------------------------------------------------------
// Admin Handlers
// ---------------------------------------------------------------------------

async fn grant_withdrawer_handler(
    State(state): State<AppState>,
    Json(req): Json<GrantRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let mut vault = state.vault.write().await;
    vault
        .policy_mut()
        .grant_withdrawer(&req.caller, &req.account)
        .map_err(|e| reject(&state.metrics, VaultError::from(e)))?;
    Ok(Json(serde_json::json!({ "granted": req.account })))
}

async fn revoke_withdrawer_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(req): Json<AdminCallerRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let mut vault = state.vault.write().await;
    vault
        .policy_mut()
        .revoke_withdrawer(&req.caller, &address)
        .map_err(|e| reject(&state.metrics, VaultError::from(e)))?;
    Ok(Json(serde_json::json!({ "revoked": address })))
}

async fn set_enabled_handler(
    State(state): State<AppState>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let mut vault = state.vault.write().await;
    vault
        .policy_mut()
        .set_withdraw_enabled(&req.caller, req.enabled)
        .map_err(|e| reject(&state.metrics, VaultError::from(e)))?;
    Ok(Json(serde_json::json!({ "enabled": req.enabled })))
}

async fn set_max_amount_handler(
    State(state): State<AppState>,
    Json(req): Json<SetMaxAmountRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let mut vault = state.vault.write().await;
    vault
        .policy_mut()
        .set_max_withdraw_amount(&req.caller, req.max_amount)
        .map_err(|e| reject(&state.metrics, VaultError::from(e)))?;
    Ok(Json(serde_json::json!({ "max_amount": req.max_amount })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
