//! Transaction submission.
//!
//! Supports pluggable submission backends via the [`TransactionSubmitter`] trait.
//! Includes [`WalletRpcSubmitter`] for a wallet-backed JSON-RPC endpoint and
//! [`DryRunSubmitter`] for testing.

use std::sync::{Arc, Mutex};

use serde_json::json;
use signalpool_core::{encode_hex, Address, TxHash, U256};
use signalpool_rpc::wire::quantity;
use signalpool_rpc::{JsonRpcClient, RpcClientError};
use thiserror::Error;
use tracing::info;

/// JSON-RPC code wallets use when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("signer declined: {0}")]
    Rejected(String),
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("network: {0}")]
    Network(String),
}

/// Revert reasons are free text and may themselves say "rejected", so a
/// revert wins over any wording; a decline needs the wallet's code.
impl From<RpcClientError> for SubmitError {
    fn from(err: RpcClientError) -> Self {
        let message = err.message();
        if message.to_ascii_lowercase().contains("execution reverted") {
            return Self::Reverted(message);
        }
        match err {
            RpcClientError::Node { code, .. } if code == USER_REJECTED_CODE => {
                Self::Rejected(message)
            }
            _ => Self::Network(message),
        }
    }
}

/// Represents a built transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub from: Address,
    pub to: Address,
    /// Selector plus ABI-encoded arguments.
    pub data: Vec<u8>,
    /// Wei.
    pub value: U256,
    /// Human-readable description for logging.
    pub description: String,
}

/// Trait for handing transactions to the ledger. Returns as soon as the
/// transaction is accepted; confirmation is a separate step.
#[async_trait::async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, tx: &BuiltTransaction) -> Result<TxHash, SubmitError>;
}

/// Submits through `eth_sendTransaction` on the wallet's RPC endpoint, which
/// holds the signing key.
pub struct WalletRpcSubmitter {
    client: Arc<JsonRpcClient>,
}

impl WalletRpcSubmitter {
    pub fn new(client: Arc<JsonRpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl TransactionSubmitter for WalletRpcSubmitter {
    async fn submit(&self, tx: &BuiltTransaction) -> Result<TxHash, SubmitError> {
        let params = json!([{
            "from": tx.from.to_string(),
            "to": tx.to.to_string(),
            "data": encode_hex(&tx.data),
            "value": quantity(tx.value),
        }]);

        let raw: String = self.client.call("eth_sendTransaction", params).await?;
        let hash: TxHash = raw
            .parse()
            .map_err(|e| SubmitError::Network(format!("invalid transaction hash {raw}: {e}")))?;

        info!(
            tx = %hash,
            description = %tx.description,
            value = %tx.value,
            "submitted transaction"
        );
        Ok(hash)
    }
}

/// Dry-run submitter for testing. Records all submitted transactions and
/// returns sequential synthetic hashes.
pub struct DryRunSubmitter {
    submissions: Mutex<Vec<BuiltTransaction>>,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Get all recorded submissions.
    pub fn submissions(&self) -> Vec<BuiltTransaction> {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of recorded submissions.
    pub fn submission_count(&self) -> usize {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Hash returned for the `n`-th submission (1-based).
    pub fn hash_for(n: usize) -> TxHash {
        let mut hash = TxHash::ZERO;
        hash.0[24..].copy_from_slice(&(n as u64).to_be_bytes());
        hash
    }
}

impl Default for DryRunSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TransactionSubmitter for DryRunSubmitter {
    async fn submit(&self, tx: &BuiltTransaction) -> Result<TxHash, SubmitError> {
        let n = {
            let mut submissions = self.submissions.lock().unwrap_or_else(|e| e.into_inner());
            submissions.push(tx.clone());
            submissions.len()
        };
        info!(description = %tx.description, n, "dry-run: recorded transaction");
        Ok(Self::hash_for(n))
    }
}
