//! SignalPool RPC
//!
//! HTTP plumbing for the SignalPool client: a JSON-RPC 2.0 client for
//! Ethereum endpoints, the read-only ledger reader built on top of it, and the
//! decryption gateway client.

pub mod client;
pub mod gateway;
pub mod protocol;
pub mod reader;
pub mod wire;

pub use client::{JsonRpcClient, RpcClientError, RATE_LIMIT_CODE};
pub use gateway::{DecryptionGateway, GatewayError, HttpGateway};
pub use protocol::{RpcError, RpcRequest, RpcResponse};
pub use reader::{LedgerReader, ReadError, RpcLedgerReader};
