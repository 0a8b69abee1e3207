//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Mint attempts and accepted broadcasts
//! - Failures by error kind
//! - Nonce progress and gas price

use crate::error::{MintError, MintResult};

use axum::{http::StatusCode, routing::get, Router};
use ethers::types::U256;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, register_int_gauge, CounterVec,
    Encoder, Gauge, IntCounter, IntGauge, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    pub static ref MINT_ATTEMPTS: IntCounter = register_int_counter!(
        "inscription_mint_attempts_total",
        "Total mint attempts, including retries"
    ).unwrap();

    pub static ref MINT_SUCCESS: IntCounter = register_int_counter!(
        "inscription_mint_success_total",
        "Total broadcasts accepted by the node"
    ).unwrap();

    pub static ref MINT_FAILURES: CounterVec = register_counter_vec!(
        "inscription_mint_failures_total",
        "Total failed attempts by error kind",
        &["kind"]
    ).unwrap();

    pub static ref CURRENT_NONCE: IntGauge = register_int_gauge!(
        "inscription_current_nonce",
        "Next nonce the minter will use"
    ).unwrap();

    pub static ref GAS_PRICE_GWEI: Gauge = register_gauge!(
        "inscription_gas_price_gwei",
        "Gas price of the last accepted mint"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> MintResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| MintError::Internal(format!("Metrics bind on {} failed: {}", addr, e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| MintError::Internal(format!("Metrics server failed: {}", e)))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, (StatusCode, String)> {
    render().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

/// Text exposition of every registered metric
pub fn render() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

// Helper functions to record metrics

pub fn record_attempt() {
    MINT_ATTEMPTS.inc();
}

pub fn record_success() {
    MINT_SUCCESS.inc();
}

pub fn record_failure(err: &MintError) {
    MINT_FAILURES.with_label_values(&[err.kind()]).inc();
}

pub fn record_nonce(nonce: u64) {
    CURRENT_NONCE.set(i64::try_from(nonce).unwrap_or(i64::MAX));
}

pub fn record_gas_price(price_wei: U256) {
    let wei = if price_wei > U256::from(u128::MAX) {
        f64::MAX
    } else {
        price_wei.low_u128() as f64
    };
    GAS_PRICE_GWEI.set(wei / 1e9);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_labelled_by_kind() {
        let before = MINT_FAILURES.with_label_values(&["chain_id"]).get();
        record_failure(&MintError::ChainId("timeout".into()));
        let after = MINT_FAILURES.with_label_values(&["chain_id"]).get();
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_gas_price_is_reported_in_gwei() {
        record_gas_price(U256::from(30_000_000_000u64));
        let rendered = render().unwrap();
        assert!(rendered.contains("inscription_gas_price_gwei"));
    }
}
