//! Gas parameters for mint transactions
//!
//! The price comes from a single oracle query per attempt; no buffering or
//! fee-market strategy is applied.

use crate::chain::ChainClient;
use crate::error::MintResult;

use ethers::types::U256;
use tracing::debug;

/// Gas limit for a plain value transfer with a short data payload
pub const MINT_GAS_LIMIT: u64 = 30_000;

/// Gas parameters for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    pub gas_price: U256,
    pub gas_limit: U256,
}

impl GasQuote {
    /// Ask the node for its current suggested price
    pub async fn fetch(client: &dyn ChainClient) -> MintResult<Self> {
        let gas_price = client.gas_price().await?;
        let quote = Self {
            gas_price,
            gas_limit: U256::from(MINT_GAS_LIMIT),
        };
        debug!(
            "Gas price {} wei, worst-case cost {} wei",
            quote.gas_price,
            quote.max_cost()
        );
        Ok(quote)
    }

    /// Upper bound on the fee paid, in wei
    pub fn max_cost(&self) -> U256 {
        self.gas_limit.saturating_mul(self.gas_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use crate::error::MintError;

    #[tokio::test]
    async fn test_fetch_uses_fixed_limit() {
        let mut client = MockChainClient::new();
        client
            .expect_gas_price()
            .times(1)
            .returning(|| Ok(U256::from(30_000_000_000u64)));

        let quote = GasQuote::fetch(&client).await.unwrap();
        assert_eq!(quote.gas_limit, U256::from(30_000u64));
        assert_eq!(quote.max_cost(), U256::from(900_000_000_000_000u64));
    }

    #[tokio::test]
    async fn test_fetch_propagates_oracle_error() {
        let mut client = MockChainClient::new();
        client
            .expect_gas_price()
            .returning(|| Err(MintError::GasPrice("upstream timeout".into())));

        let err = GasQuote::fetch(&client).await.unwrap_err();
        assert!(matches!(err, MintError::GasPrice(_)));
    }
}
