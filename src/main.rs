//! Inscription Minter - sequential inscription mints on EVM chains
//!
//! Reads the account's pending nonce once, then sends one zero-value
//! transaction per mint with the inscription in its data field, advancing the
//! nonce only after the node accepts each broadcast.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod chain;
mod config;
mod error;
mod metrics;
mod payload;
mod submission;
mod tx;

use chain::{ChainClient, ChainProvider};
use config::Settings;
use metrics::MetricsServer;
use submission::SubmissionEngine;
use tx::TransactionSender;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Inscription Minter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()
        .inspect_err(|e| error!("Configuration error: {:#}", e))
        .context("Failed to load configuration")?;
    info!(
        "Minting {} x {} to {}",
        settings.mint_count(),
        settings.payload(),
        settings.to_address
    );

    // Start metrics server
    let metrics_handle = settings.metrics_port.map(|port| {
        tokio::spawn(async move {
            if let Err(e) = MetricsServer::new(port).run().await {
                error!("Metrics server error: {}", e);
            }
        })
    });

    // Establish the starting nonce; any failure here is fatal
    let chain_provider =
        ChainProvider::connect(&settings.polygon_rpc).inspect_err(|e| error!("{}", e))?;
    info!("Using RPC endpoint {}", chain_provider.url());
    let provider: Arc<dyn ChainClient> = Arc::new(chain_provider);
    let (_, start_nonce) = tx::resolve_start(provider.as_ref(), &settings.private_key)
        .await
        .inspect_err(|e| error!("{}", e))?;

    let sender = TransactionSender::new(provider, &settings);
    let engine = SubmissionEngine::new(sender, settings.retry_policy());

    let result = tokio::select! {
        result = engine.run(start_nonce, settings.mint_count()) => Some(result),
        _ = shutdown_signal() => None,
    };

    if let Some(h) = metrics_handle {
        h.abort();
    }

    match result {
        Some(Ok(summary)) => {
            info!(
                "Done: {} mints from nonce {}, next nonce {}, {} failed attempts",
                summary.tx_hashes.len(),
                summary.start_nonce,
                summary.next_nonce,
                summary.failed_attempts
            );
            Ok(())
        }
        Some(Err(e)) => {
            error!("Minting aborted: {}", e);
            Err(e.into())
        }
        None => {
            warn!("Shutdown signal received, stopping before all mints completed");
            Ok(())
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,inscription_minter=debug,hyper=warn,reqwest=warn")
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
