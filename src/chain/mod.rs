//! Chain module - the RPC operations the minter needs from an EVM node
//!
//! The node is treated as an opaque service. [`ChainClient`] names the four
//! calls the minter makes; [`ChainProvider`] serves them over HTTP JSON-RPC.

pub mod provider;

pub use provider::ChainProvider;

use crate::error::MintResult;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};

/// RPC operations used by the nonce fetcher and the transaction sender
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Next nonce for `address`, counting transactions still in the mempool
    async fn pending_nonce(&self, address: Address) -> MintResult<u64>;

    /// Gas price suggested by the node's oracle, in wei
    async fn gas_price(&self) -> MintResult<U256>;

    /// Chain identifier used for replay-protected signing
    async fn chain_id(&self) -> MintResult<u64>;

    /// Broadcast an RLP-encoded signed transaction
    async fn send_raw_transaction(&self, raw: Bytes) -> MintResult<H256>;
}
