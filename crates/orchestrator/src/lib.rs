//! SignalPool Orchestrator
//!
//! Drives ledger operations end to end: optional client-side encryption,
//! call encoding, serialized submission, receipt confirmation, event
//! extraction, decryption polling of encrypted results and paced batch reads.
//! [`SignalPoolClient`] is the facade; everything else is a pluggable step.

pub mod batch;
pub mod client;
pub mod confirm;
pub mod decryption;
pub mod encryption;
pub mod error;
pub mod extract;
pub mod session;
pub mod submitter;
pub mod wait;

pub use batch::{BatchEntry, BatchLoader, BatchOptions, BatchReport, MissReason, RateLimitSignal};
pub use client::{
    AggregateOutcome, AggregateRequest, AggregationValue, ClientOptions, ContributeOutcome,
    ContributeRequest, DistributeOutcome, OperationKind, PendingOperation, SignalPoolClient,
    Stage, StageListener,
};
pub use confirm::{ConfirmError, ConfirmOptions, ConfirmationPoller};
pub use decryption::{
    transition, DecryptionError, DecryptionOptions, DecryptionSession, DecryptionStatus,
    PollEvent, PollOutcome, Progress, SessionState,
};
pub use encryption::{EncryptedInput, EncryptionAdapter, EncryptionContext, EncryptionError};
pub use error::{ClientError, ErrorCategory, Result};
pub use extract::{extract, extract_typed, ExtractError};
pub use session::Session;
pub use submitter::{
    BuiltTransaction, DryRunSubmitter, SubmitError, TransactionSubmitter, WalletRpcSubmitter,
};
pub use wait::{InstantSleeper, Sleeper, TokioSleeper};
