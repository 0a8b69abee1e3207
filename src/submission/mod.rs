//! Sequential submission of mint transactions
//!
//! The engine walks nonces upward from the pending nonce, retrying a nonce
//! until the node accepts it before moving to the next.

mod engine;

pub use engine::SubmissionEngine;

use crate::error::MintResult;

use async_trait::async_trait;
use ethers::types::H256;
use std::time::Duration;

/// One mint attempt at a given nonce
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Submit: Send + Sync {
    async fn submit(&self, nonce: u64) -> MintResult<H256>;
}

/// How failed attempts are handled
///
/// The default retries immediately and forever, treating every error alike.
/// Note there is no backoff unless `delay` is set, so a persistent failure
/// spins on the RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Pause after each failed attempt
    pub delay: Duration,
    /// Attempts per nonce before the run aborts; `None` never gives up
    pub max_attempts: Option<u32>,
    /// Abort on errors that only a configuration change can fix
    pub fail_fast_on_config: bool,
}
