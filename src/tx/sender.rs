//! Transaction sender: builds, signs and broadcasts one inscription mint

use super::gas::GasQuote;
use crate::chain::ChainClient;
use crate::config::Settings;
use crate::error::{MintError, MintResult};
use crate::payload::InscriptionPayload;
use crate::submission::Submit;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::keccak256;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parse a hex-encoded secp256k1 key. A `0x` prefix is tolerated.
pub fn load_wallet(private_key: &str) -> MintResult<LocalWallet> {
    private_key
        .trim()
        .parse::<LocalWallet>()
        .map_err(|e| MintError::Key(format!("Invalid private key: {}", e)))
}

/// Sends mint transactions for a single account
///
/// Every attempt re-reads the key and recipient and queries a fresh gas
/// price, so a retry at the same nonce is a new transaction, not a resend.
pub struct TransactionSender {
    /// RPC client
    client: Arc<dyn ChainClient>,
    /// Raw key material from configuration
    private_key: String,
    /// Raw recipient from configuration
    to_address: String,
    /// Data field content
    payload: InscriptionPayload,
}

impl TransactionSender {
    /// Create a new transaction sender
    pub fn new(client: Arc<dyn ChainClient>, settings: &Settings) -> Self {
        Self {
            client,
            private_key: settings.private_key.clone(),
            to_address: settings.to_address.clone(),
            payload: settings.payload(),
        }
    }

    /// Build, sign and broadcast one mint at `nonce`
    pub async fn mint(&self, nonce: u64) -> MintResult<H256> {
        let wallet = load_wallet(&self.private_key)?;
        let gas = GasQuote::fetch(self.client.as_ref()).await?;
        let to = parse_recipient(&self.to_address)?;

        let mut tx = build_mint_tx(nonce, to, &gas, self.payload.to_bytes());

        let chain_id = self.client.chain_id().await?;
        tx.set_chain_id(chain_id);

        let raw = sign(&wallet.with_chain_id(chain_id), &tx).await?;
        let local_hash = H256::from(keccak256(&raw));
        debug!("Signed tx {:?} at nonce {} for chain {}", local_hash, nonce, chain_id);

        let tx_hash = self.client.send_raw_transaction(raw).await?;
        if tx_hash != local_hash {
            warn!(
                "Node reported hash {:?}, locally computed {:?}",
                tx_hash, local_hash
            );
        }

        info!("Tx Hash {:?}", tx_hash);
        crate::metrics::record_gas_price(gas.gas_price);

        Ok(tx_hash)
    }
}

#[async_trait]
impl Submit for TransactionSender {
    async fn submit(&self, nonce: u64) -> MintResult<H256> {
        self.mint(nonce).await
    }
}

fn parse_recipient(to_address: &str) -> MintResult<Address> {
    to_address
        .trim()
        .parse::<Address>()
        .map_err(|e| MintError::Config(format!("Invalid recipient address {}: {}", to_address, e)))
}

/// Legacy transfer of zero value carrying the inscription as data
fn build_mint_tx(nonce: u64, to: Address, gas: &GasQuote, data: Vec<u8>) -> TypedTransaction {
    let request = TransactionRequest::new()
        .to(to)
        .value(U256::zero())
        .gas(gas.gas_limit)
        .gas_price(gas.gas_price)
        .data(data)
        .nonce(nonce);

    TypedTransaction::Legacy(request)
}

/// Sign with an EIP-155 signature and return the RLP bytes ready to broadcast
async fn sign(wallet: &LocalWallet, tx: &TypedTransaction) -> MintResult<Bytes> {
    let signature = wallet
        .sign_transaction(tx)
        .await
        .map_err(|e| MintError::Signing(e.to_string()))?;

    Ok(tx.rlp_signed(&signature))
}
