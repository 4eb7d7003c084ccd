//! SignalPool Core
//!
//! Generic types and errors shared by every SignalPool crate: ledger records,
//! operating mode and finalized transaction receipts. EVM identifiers and
//! log types are alloy's.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use alloy_primitives::{Address, Bytes, Log, LogData, TxHash, B256, U256};

/// Errors produced while parsing core identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Unknown signal type: {0}")]
    UnknownSignalType(u8),
    #[error("Unknown aggregation type: {0}")]
    UnknownAggregationType(u8),
    #[error("Unknown operating mode: {0}")]
    UnknownMode(String),
}

/// Decode a hex string with an optional `0x` prefix.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, CoreError> {
    let trimmed = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    hex::decode(trimmed).map_err(|e| CoreError::InvalidHex(format!("{input}: {e}")))
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Opaque reference to an encrypted value, resolvable only through the
/// decryption gateway.
pub type CiphertextHandle = B256;

/// Process-wide wire mode. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    #[default]
    Plaintext,
    Encrypted,
}

impl OperatingMode {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Plaintext => "plaintext",
            Self::Encrypted => "encrypted",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperatingMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "mock" | "false" => Ok(Self::Plaintext),
            "encrypted" | "fhe" | "true" => Ok(Self::Encrypted),
            other => Err(CoreError::UnknownMode(other.to_string())),
        }
    }
}

/// Kind of signal a contributor submits (`uint8` on the ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SignalType {
    PricePrediction = 0,
    VolatilityEstimate = 1,
    BuySellVote = 2,
}

impl SignalType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::PricePrediction),
            1 => Some(Self::VolatilityEstimate),
            2 => Some(Self::BuySellVote),
            _ => None,
        }
    }
}

impl TryFrom<u8> for SignalType {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(CoreError::UnknownSignalType(value))
    }
}

/// Aggregation function executed by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AggType {
    Mean = 0,
    WeightedMean = 1,
}

impl AggType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Mean),
            1 => Some(Self::WeightedMean),
            _ => None,
        }
    }
}

impl TryFrom<u8> for AggType {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(CoreError::UnknownAggregationType(value))
    }
}

/// A contributed signal, as recorded by the ledger. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub id: u64,
    pub contributor: Address,
    pub signal_type: SignalType,
    /// Unix seconds.
    pub timestamp: u64,
    pub weight: u64,
    pub active: bool,
}

/// An aggregation over a set of signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub id: u64,
    pub agg_type: AggType,
    /// `None` while the result only exists as a ciphertext handle.
    pub result: Option<u64>,
    pub timestamp: u64,
    /// Wei.
    pub total_revenue: U256,
    pub revenue_distributed: bool,
}

/// Finalized record of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// `false` when the ledger reverted the transaction.
    pub status: bool,
    pub logs: Vec<Log>,
}
