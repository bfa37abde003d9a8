//! # Prometheus Metrics
//!
//! Exposes operational metrics for the vault daemon. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the daemon.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct VaultMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of accepted deposits.
    pub deposits_total: IntCounter,
    /// Total units deposited across all accepted deposits.
    pub deposited_units_total: IntCounter,
    /// Total number of disbursed withdrawals.
    pub withdrawals_total: IntCounter,
    /// Total units disbursed across all withdrawals.
    pub withdrawn_units_total: IntCounter,
    /// Total number of rejected operations (any typed failure).
    pub rejected_operations_total: IntCounter,
    /// The vault's current holdings on the asset ledger.
    pub vault_balance: IntGauge,
}

impl VaultMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("coffer".into()), None)
            .expect("failed to create prometheus registry");

        let deposits_total = IntCounter::new("deposits_total", "Total number of accepted deposits")
            .expect("metric creation");
        registry
            .register(Box::new(deposits_total.clone()))
            .expect("metric registration");

        let deposited_units_total = IntCounter::new(
            "deposited_units_total",
            "Total units deposited into the vault (smallest denomination)",
        )
        .expect("metric creation");
        registry
            .register(Box::new(deposited_units_total.clone()))
            .expect("metric registration");

        let withdrawals_total = IntCounter::new(
            "withdrawals_total",
            "Total number of disbursed withdrawals",
        )
        .expect("metric creation");
        registry
            .register(Box::new(withdrawals_total.clone()))
            .expect("metric registration");

        let withdrawn_units_total = IntCounter::new(
            "withdrawn_units_total",
            "Total units disbursed from the vault (smallest denomination)",
        )
        .expect("metric creation");
        registry
            .register(Box::new(withdrawn_units_total.clone()))
            .expect("metric registration");

        let rejected_operations_total = IntCounter::new(
            "rejected_operations_total",
            "Total number of operations rejected with a typed error",
        )
        .expect("metric creation");
        registry
            .register(Box::new(rejected_operations_total.clone()))
            .expect("metric registration");

        let vault_balance = IntGauge::new(
            "vault_balance",
            "Current vault holdings on the asset ledger",
        )
        .expect("metric creation");
        registry
            .register(Box::new(vault_balance.clone()))
            .expect("metric registration");

        Self {
            registry,
            deposits_total,
            deposited_units_total,
            withdrawals_total,
            withdrawn_units_total,
            rejected_operations_total,
            vault_balance,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for VaultMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<VaultMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
