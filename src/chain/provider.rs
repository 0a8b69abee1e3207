//! HTTP JSON-RPC provider for a single EVM endpoint

use super::ChainClient;
use crate::error::{MintError, MintResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider, ProviderError, RpcError};
use std::time::Duration;
use tracing::debug;

/// Wrapper around an ethers HTTP provider
pub struct ChainProvider {
    /// RPC endpoint URL
    url: String,
    /// HTTP provider
    http: Provider<Http>,
}

impl ChainProvider {
    /// Dial an RPC endpoint. Only the URL is checked here; reachability shows
    /// up as a connection error on the first call.
    pub fn connect(url: &str) -> MintResult<Self> {
        let http = Provider::<Http>::try_from(url)
            .map_err(|e| MintError::ChainConnection(format!("Invalid RPC URL {}: {}", url, e)))?
            .interval(Duration::from_millis(100));

        debug!("HTTP provider ready for {}", url);

        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    /// Get the endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChainClient for ChainProvider {
    async fn pending_nonce(&self, address: Address) -> MintResult<u64> {
        let nonce = self
            .http
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| classify(e, MintError::Nonce))?;

        u64::try_from(nonce).map_err(|_| MintError::Nonce(format!("Nonce {} overflows u64", nonce)))
    }

    async fn gas_price(&self) -> MintResult<U256> {
        self.http
            .get_gas_price()
            .await
            .map_err(|e| classify(e, MintError::GasPrice))
    }

    async fn chain_id(&self) -> MintResult<u64> {
        let chain_id = self
            .http
            .get_chainid()
            .await
            .map_err(|e| classify(e, MintError::ChainId))?;

        u64::try_from(chain_id)
            .map_err(|_| MintError::ChainId(format!("Chain id {} overflows u64", chain_id)))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> MintResult<H256> {
        let pending = self
            .http
            .send_raw_transaction(raw)
            .await
            .map_err(|e| classify(e, MintError::Broadcast))?;

        Ok(pending.tx_hash())
    }
}

/// Errors the node answered with belong to the step that made the call.
/// Anything without a JSON-RPC answer is a transport failure.
fn classify(err: ProviderError, step: fn(String) -> MintError) -> MintError {
    if let Some(rpc_err) = RpcError::as_error_response(&err) {
        step(rpc_err.message.clone())
    } else if RpcError::as_serde_error(&err).is_some() {
        step(err.to_string())
    } else {
        MintError::ChainConnection(err.to_string())
    }
}
