//! Remote entity reader
//!
//! Read-only access to ledger state through the public endpoint. Never used
//! for submissions, so receipt polling does not depend on the wallet session.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use signalpool_core::{Address, Aggregation, CiphertextHandle, Receipt, Signal, TxHash, U256};
use signalpool_ledger::{
    decode_aggregation, decode_handle, decode_result, decode_signal, decode_uint, uint_to_u64,
    EncodeError, LedgerInterface, LedgerQuery,
};
use thiserror::Error;
use tracing::trace;

use crate::client::{JsonRpcClient, RpcClientError};
use crate::wire;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("RPC: {0}")]
    Rpc(#[from] RpcClientError),
    #[error("Codec: {0}")]
    Codec(#[from] EncodeError),
}

impl ReadError {
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Rpc(e) => e.is_rate_limited(),
            Self::Codec(_) => false,
        }
    }
}

/// Typed reads of ledger entities.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Wire variant this reader decodes with.
    fn interface(&self) -> LedgerInterface;

    async fn signal(&self, id: u64) -> Result<Signal, ReadError>;

    async fn aggregation(&self, id: u64) -> Result<Aggregation, ReadError>;

    /// Plaintext aggregation result. Unsupported on the encrypted interface.
    async fn aggregation_result(&self, id: u64) -> Result<u64, ReadError>;

    /// Ciphertext handle of an encrypted aggregation result.
    async fn encrypted_result_handle(&self, id: u64) -> Result<CiphertextHandle, ReadError>;

    /// Accrued revenue in wei.
    async fn contributor_revenue(&self, contributor: Address) -> Result<U256, ReadError>;

    async fn signal_count(&self) -> Result<u64, ReadError>;

    async fn aggregation_count(&self) -> Result<u64, ReadError>;

    /// `None` while the transaction is not yet final.
    async fn transaction_receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, ReadError>;
}

/// [`LedgerReader`] over `eth_call` and `eth_getTransactionReceipt`.
pub struct RpcLedgerReader {
    client: Arc<JsonRpcClient>,
    interface: LedgerInterface,
    contract: Address,
}

impl RpcLedgerReader {
    pub fn new(client: Arc<JsonRpcClient>, interface: LedgerInterface, contract: Address) -> Self {
        Self {
            client,
            interface,
            contract,
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    async fn eth_call(&self, query: LedgerQuery) -> Result<Vec<u8>, ReadError> {
        let data = self.interface.encode_query(&query)?;
        trace!(function = query.function_name(), contract = %self.contract, "eth_call");
        let raw: String = self
            .client
            .call("eth_call", wire::call_params(&self.contract, &data))
            .await?;
        Ok(wire::parse_data(&raw)?)
    }

    async fn read_u64(&self, query: LedgerQuery) -> Result<u64, ReadError> {
        let data = self.eth_call(query).await?;
        let value = decode_uint(self.interface, &query, &data)?;
        Ok(uint_to_u64(query.function_name(), value)?)
    }
}

#[async_trait]
impl LedgerReader for RpcLedgerReader {
    fn interface(&self) -> LedgerInterface {
        self.interface
    }

    async fn signal(&self, id: u64) -> Result<Signal, ReadError> {
        let data = self.eth_call(LedgerQuery::SignalMetadata(id)).await?;
        Ok(decode_signal(self.interface, &data)?)
    }

    async fn aggregation(&self, id: u64) -> Result<Aggregation, ReadError> {
        let data = self.eth_call(LedgerQuery::Aggregation(id)).await?;
        Ok(decode_aggregation(self.interface, &data)?)
    }

    async fn aggregation_result(&self, id: u64) -> Result<u64, ReadError> {
        let data = self.eth_call(LedgerQuery::AggregationResult(id)).await?;
        Ok(decode_result(self.interface, &data)?)
    }

    async fn encrypted_result_handle(&self, id: u64) -> Result<CiphertextHandle, ReadError> {
        let data = self.eth_call(LedgerQuery::EncryptedResult(id)).await?;
        Ok(decode_handle(self.interface, &data)?)
    }

    async fn contributor_revenue(&self, contributor: Address) -> Result<U256, ReadError> {
        let query = LedgerQuery::ContributorRevenue(contributor);
        let data = self.eth_call(query).await?;
        Ok(decode_uint(self.interface, &query, &data)?)
    }

    async fn signal_count(&self) -> Result<u64, ReadError> {
        self.read_u64(LedgerQuery::SignalCount).await
    }

    async fn aggregation_count(&self) -> Result<u64, ReadError> {
        self.read_u64(LedgerQuery::AggregationCount).await
    }

    async fn transaction_receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, ReadError> {
        let value = self
            .client
            .request("eth_getTransactionReceipt", json!([tx_hash.to_string()]))
            .await?;
        Ok(wire::parse_receipt(value)?)
    }
}
