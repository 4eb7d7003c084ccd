//! SignalPool Ledger
//!
//! Client-side view of the SignalPool contract: Solidity bindings for the two
//! wire variants (plaintext and encrypted), call selection, event decoding and
//! accessor decoding.
//!
//! This crate does NOT talk to a node. It turns logical calls into calldata
//! and raw return data or logs back into typed values.

pub mod bindings;
pub mod events;
pub mod interface;
pub mod records;

pub use bindings::{ISignalPoolFhe, ISignalPoolPlain};
pub use events::{
    AggregationCompleted, AggregationRequested, CompletedOutcome, DecodedEvent,
    DistributionDetails, LedgerEvent, SignalContributed,
};
pub use interface::*;
pub use records::*;
