//! Per-mode session context.
//!
//! A session pins the operating mode, its protocol descriptor, the contract
//! and the reader together. Changing mode means building a new session;
//! operations already running keep the one they were given.

use std::sync::Arc;

use signalpool_core::{Address, OperatingMode};
use signalpool_ledger::LedgerInterface;
use signalpool_rpc::LedgerReader;

use crate::error::{ClientError, Result};

#[derive(Clone)]
pub struct Session {
    mode: OperatingMode,
    interface: LedgerInterface,
    contract: Address,
    sender: Option<Address>,
    reader: Arc<dyn LedgerReader>,
}

impl Session {
    /// The mode follows the reader's interface, so the two cannot disagree.
    pub fn new(reader: Arc<dyn LedgerReader>, contract: Address, sender: Option<Address>) -> Self {
        let interface = reader.interface();
        Self {
            mode: interface.mode(),
            interface,
            contract,
            sender,
            reader,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn interface(&self) -> LedgerInterface {
        self.interface
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn sender(&self) -> Option<Address> {
        self.sender
    }

    pub fn reader(&self) -> Arc<dyn LedgerReader> {
        self.reader.clone()
    }

    pub(crate) fn require_sender(&self) -> Result<Address> {
        self.sender.ok_or(ClientError::MissingSender)
    }

    pub(crate) fn require_contract(&self) -> Result<Address> {
        if self.contract == Address::ZERO {
            return Err(ClientError::ContractNotConfigured(self.mode));
        }
        Ok(self.contract)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("contract", &self.contract)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}
