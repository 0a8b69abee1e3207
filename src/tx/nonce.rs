//! Nonce tracking for sequential submission
//!
//! The starting point is read once from the node. After that the submission
//! loop owns a [`NonceCursor`] and only advances it after a broadcast the node
//! accepted.

use super::sender::load_wallet;
use crate::chain::ChainClient;
use crate::error::{MintError, MintResult};

use ethers::signers::Signer;
use ethers::types::Address;
use tracing::{debug, info};

/// Startup step: derive the account from the key and read its pending nonce.
/// Runs once, before any transaction is built; callers treat errors as fatal.
pub async fn resolve_start(
    client: &dyn ChainClient,
    private_key: &str,
) -> MintResult<(Address, u64)> {
    let address = load_wallet(private_key)?.address();
    let nonce = fetch_starting_nonce(client, address).await?;
    info!("Account {:?} starts at nonce {}", address, nonce);
    Ok((address, nonce))
}

/// Read the account's pending nonce, the first one the loop will use
pub async fn fetch_starting_nonce(client: &dyn ChainClient, address: Address) -> MintResult<u64> {
    let nonce = client.pending_nonce(address).await?;
    debug!("Pending nonce for {:?}: {}", address, nonce);
    Ok(nonce)
}

/// Loop-local nonce counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceCursor {
    start: u64,
    current: u64,
}

impl NonceCursor {
    pub fn new(start: u64) -> Self {
        Self {
            start,
            current: start,
        }
    }

    /// Nonce for the next attempt
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Nonce the run started from
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Move past a nonce the node accepted
    pub fn advance(&mut self) -> MintResult<u64> {
        self.current = self
            .current
            .checked_add(1)
            .ok_or_else(|| MintError::Nonce(format!("Nonce {} cannot advance", self.current)))?;
        Ok(self.current)
    }

    /// Number of nonces consumed so far
    pub fn issued(&self) -> u64 {
        self.current - self.start
    }
}
