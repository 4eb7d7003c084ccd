//! Ethereum JSON encodings: hex quantities, hex data and receipts.

use serde::Deserialize;
use serde_json::{json, Value};
use signalpool_core::{decode_hex, encode_hex, Address, Bytes, Log, Receipt, TxHash, B256, U256};

use crate::client::RpcClientError;

/// Quantity encoding: `0x` + hex without leading zeros.
pub fn quantity(value: U256) -> String {
    format!("{value:#x}")
}

pub fn parse_quantity(raw: &str) -> Result<U256, RpcClientError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| RpcClientError::InvalidResponse(format!("quantity without 0x: {raw}")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| RpcClientError::InvalidResponse(format!("quantity {raw}: {e}")))
}

pub fn parse_data(raw: &str) -> Result<Vec<u8>, RpcClientError> {
    decode_hex(raw).map_err(|e| RpcClientError::InvalidResponse(e.to_string()))
}

/// Parameters for `eth_call` against the latest block.
pub fn call_params(to: &Address, data: &[u8]) -> Value {
    json!([{ "to": to.to_string(), "data": encode_hex(data) }, "latest"])
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogJson {
    address: String,
    topics: Vec<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptJson {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
    #[serde(default)]
    logs: Vec<LogJson>,
}

/// Parse an `eth_getTransactionReceipt` result. `null` means not yet mined.
pub fn parse_receipt(value: Value) -> Result<Option<Receipt>, RpcClientError> {
    if value.is_null() {
        return Ok(None);
    }
    let raw: ReceiptJson =
        serde_json::from_value(value).map_err(|e| RpcClientError::InvalidResponse(e.to_string()))?;

    // Pending receipts from some nodes carry no block yet.
    let block_number = match raw.block_number.as_deref() {
        Some(n) => parse_quantity(n)?,
        None => return Ok(None),
    };

    let mut logs = Vec::with_capacity(raw.logs.len());
    for log in raw.logs {
        let topics = log
            .topics
            .iter()
            .map(|t| {
                let bytes = parse_data(t)?;
                B256::try_from(bytes.as_slice())
                    .map_err(|_| RpcClientError::InvalidResponse(format!("topic {t}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let address: Address = log
            .address
            .parse()
            .map_err(|e| RpcClientError::InvalidResponse(format!("log address: {e}")))?;
        logs.push(Log::new_unchecked(
            address,
            topics,
            Bytes::from(parse_data(&log.data)?),
        ));
    }

    let transaction_hash: TxHash = raw
        .transaction_hash
        .parse()
        .map_err(|e| RpcClientError::InvalidResponse(format!("transactionHash: {e}")))?;

    Ok(Some(Receipt {
        transaction_hash,
        block_number: u64::try_from(block_number)
            .map_err(|_| RpcClientError::InvalidResponse("blockNumber overflow".to_string()))?,
        // pre-Byzantium receipts have no status; treat as success
        status: match raw.status.as_deref() {
            Some(s) => parse_quantity(s)? == U256::from(1u8),
            None => true,
        },
        logs,
    }))
}

/// Inverse of [`parse_receipt`], used by test doubles serving receipts.
pub fn receipt_json(receipt: &Receipt) -> Value {
    let logs: Vec<Value> = receipt
        .logs
        .iter()
        .map(|log| {
            json!({
                "address": log.address.to_string(),
                "topics": log.data.topics().iter().map(|t| encode_hex(t.as_slice())).collect::<Vec<_>>(),
                "data": encode_hex(&log.data.data),
            })
        })
        .collect();
    json!({
        "transactionHash": receipt.transaction_hash.to_string(),
        "blockNumber": quantity(U256::from(receipt.block_number)),
        "status": if receipt.status { "0x1" } else { "0x0" },
        "logs": logs,
    })
}
