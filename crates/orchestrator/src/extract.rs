//! Event extraction from finalized receipts.

use signalpool_core::Receipt;
use signalpool_ledger::{DecodedEvent, LedgerEvent, LedgerInterface};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("event {event} not found in {logs} receipt logs")]
    EventNotFound { event: String, logs: usize },
}

/// First log in `receipt` that decodes as `event` under `interface`.
/// Logs that do not decode are skipped.
pub fn extract(
    interface: LedgerInterface,
    receipt: &Receipt,
    event: &str,
) -> Result<DecodedEvent, ExtractError> {
    for (index, log) in receipt.logs.iter().enumerate() {
        match interface.decode_log(log) {
            Ok(decoded) if decoded.name() == event => return Ok(decoded),
            Ok(decoded) => trace!(index, name = decoded.name(), "skipping event"),
            Err(e) => trace!(index, error = %e, "skipping undecodable log"),
        }
    }
    Err(ExtractError::EventNotFound {
        event: event.to_string(),
        logs: receipt.logs.len(),
    })
}

/// [`extract`] followed by conversion into a typed event.
pub fn extract_typed<E: LedgerEvent>(
    interface: LedgerInterface,
    receipt: &Receipt,
) -> Result<E, ExtractError> {
    let decoded = extract(interface, receipt, E::NAME)?;
    E::from_event(decoded).ok_or_else(|| ExtractError::EventNotFound {
        event: E::NAME.to_string(),
        logs: receipt.logs.len(),
    })
}
