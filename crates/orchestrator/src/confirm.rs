//! Confirmation poller: waits for a submitted transaction's receipt.
//!
//! Depends only on the transaction hash and the public reader, so a caller
//! that lost track of an operation can resume from the hash alone.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use signalpool_core::{Receipt, TxHash};
use signalpool_rpc::LedgerReader;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::wait::Sleeper;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfirmError {
    #[error("transaction {tx_hash} not confirmed after {attempts} attempts")]
    Timeout { tx_hash: TxHash, attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOptions {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(2),
        }
    }
}

pub struct ConfirmationPoller {
    reader: Arc<dyn LedgerReader>,
    sleeper: Arc<dyn Sleeper>,
}

impl ConfirmationPoller {
    pub fn new(reader: Arc<dyn LedgerReader>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { reader, sleeper }
    }

    /// Poll until a receipt exists. Read errors count as "not yet known".
    /// Makes exactly `max_attempts` reads and waits between them only.
    pub async fn confirm(
        &self,
        tx_hash: TxHash,
        options: &ConfirmOptions,
    ) -> Result<Receipt, ConfirmError> {
        for attempt in 1..=options.max_attempts {
            match self.reader.transaction_receipt(&tx_hash).await {
                Ok(Some(receipt)) => {
                    info!(
                        tx = %tx_hash,
                        block = receipt.block_number,
                        status = receipt.status,
                        attempt,
                        "transaction confirmed"
                    );
                    return Ok(receipt);
                }
                Ok(None) => {
                    debug!(tx = %tx_hash, attempt, max_attempts = options.max_attempts, "receipt not available yet");
                }
                Err(e) => {
                    warn!(tx = %tx_hash, attempt, error = %e, "receipt read failed");
                }
            }

            if attempt < options.max_attempts {
                self.sleeper.sleep(options.interval).await;
            }
        }

        Err(ConfirmError::Timeout {
            tx_hash,
            attempts: options.max_attempts,
        })
    }
}
