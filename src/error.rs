//! Error types for the inscription minter

use thiserror::Error;

/// Main error type for the minter
#[derive(Error, Debug)]
pub enum MintError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain connection error: {0}")]
    ChainConnection(String),

    #[error("Private key error: {0}")]
    Key(String),

    #[error("Gas price query failed: {0}")]
    GasPrice(String),

    #[error("Chain id query failed: {0}")]
    ChainId(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Broadcast rejected: {0}")]
    Broadcast(String),

    #[error("Pending nonce query failed: {0}")]
    Nonce(String),

    #[error("Gave up on nonce {nonce} after {attempts} attempts")]
    RetriesExhausted { nonce: u64, attempts: u32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MintError {
    /// Stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            MintError::Config(_) => "config",
            MintError::ChainConnection(_) => "connection",
            MintError::Key(_) => "key",
            MintError::GasPrice(_) => "gas_price",
            MintError::ChainId(_) => "chain_id",
            MintError::Signing(_) => "signing",
            MintError::Broadcast(_) => "broadcast",
            MintError::Nonce(_) => "nonce",
            MintError::RetriesExhausted { .. } => "retries_exhausted",
            MintError::Internal(_) => "internal",
        }
    }

    /// Errors caused by malformed configuration; retrying cannot fix them
    pub fn is_config_error(&self) -> bool {
        matches!(self, MintError::Config(_) | MintError::Key(_))
    }
}

/// Result type for minter operations
pub type MintResult<T> = Result<T, MintError>;
