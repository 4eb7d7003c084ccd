//! Facade error and its user-facing categories.

use signalpool_core::{OperatingMode, TxHash};
use signalpool_ledger::EncodeError;
use signalpool_rpc::ReadError;
use thiserror::Error;

use crate::confirm::ConfirmError;
use crate::decryption::DecryptionError;
use crate::encryption::EncryptionError;
use crate::extract::ExtractError;
use crate::submitter::SubmitError;

/// How a failure should be presented and whether retrying can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    UserDeclined,
    Transient,
    ProtocolMismatch,
    Timeout,
    RemoteRejection,
    Configuration,
}

impl ErrorCategory {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("session has no sender account")]
    MissingSender,
    #[error("no contract configured for {0} mode")]
    ContractNotConfigured(OperatingMode),
    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("{0}")]
    Encryption(#[from] EncryptionError),
    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),
    #[error("{0}")]
    Confirm(#[from] ConfirmError),
    #[error("transaction {tx_hash} was reverted by the ledger")]
    RemoteRejected { tx_hash: TxHash },
    #[error("{0}")]
    Extract(#[from] ExtractError),
    #[error("read failed: {0}")]
    Read(#[from] ReadError),
    #[error("decryption failed: {0}")]
    Decryption(#[from] DecryptionError),
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingSender | Self::ContractNotConfigured(_) => ErrorCategory::Configuration,
            Self::Encode(_) | Self::Extract(_) => ErrorCategory::ProtocolMismatch,
            Self::Encryption(EncryptionError::Failed(_)) => ErrorCategory::Transient,
            Self::Encryption(_) => ErrorCategory::Configuration,
            Self::Submit(SubmitError::Rejected(_)) => ErrorCategory::UserDeclined,
            Self::Submit(SubmitError::Reverted(_)) | Self::RemoteRejected { .. } => {
                ErrorCategory::RemoteRejection
            }
            Self::Submit(SubmitError::Network(_)) => ErrorCategory::Transient,
            Self::Confirm(ConfirmError::Timeout { .. }) => ErrorCategory::Timeout,
            Self::Read(ReadError::Rpc(_)) => ErrorCategory::Transient,
            Self::Read(ReadError::Codec(_)) => ErrorCategory::ProtocolMismatch,
            Self::Decryption(DecryptionError::Timeout { .. }) => ErrorCategory::Timeout,
            Self::Decryption(DecryptionError::Gateway(_)) => ErrorCategory::Transient,
            Self::Decryption(DecryptionError::AlreadyPolling) => ErrorCategory::Configuration,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use signalpool_rpc::{GatewayError, RpcClientError};

    #[test]
    fn test_categories() {
        let cases: Vec<(ClientError, ErrorCategory)> = vec![
            (
                SubmitError::Rejected("User denied".into()).into(),
                ErrorCategory::UserDeclined,
            ),
            (
                SubmitError::Network("reset".into()).into(),
                ErrorCategory::Transient,
            ),
            (
                SubmitError::Reverted("Insufficient signals".into()).into(),
                ErrorCategory::RemoteRejection,
            ),
            (
                ClientError::RemoteRejected {
                    tx_hash: TxHash::repeat_byte(1),
                },
                ErrorCategory::RemoteRejection,
            ),
            (
                ConfirmError::Timeout {
                    tx_hash: TxHash::repeat_byte(1),
                    attempts: 3,
                }
                .into(),
                ErrorCategory::Timeout,
            ),
            (
                DecryptionError::Timeout { attempts: 60 }.into(),
                ErrorCategory::Timeout,
            ),
            (
                DecryptionError::Gateway(GatewayError::Transport("dns".into())).into(),
                ErrorCategory::Transient,
            ),
            (
                EncodeError::InvalidArgument("weight".into()).into(),
                ErrorCategory::ProtocolMismatch,
            ),
            (
                ExtractError::EventNotFound {
                    event: "SignalContributed".into(),
                    logs: 0,
                }
                .into(),
                ErrorCategory::ProtocolMismatch,
            ),
            (
                ReadError::Rpc(RpcClientError::Http {
                    status: 429,
                    body: String::new(),
                })
                .into(),
                ErrorCategory::Transient,
            ),
            (EncryptionError::Unavailable.into(), ErrorCategory::Configuration),
            (EncryptionError::Failed("relayer".into()).into(), ErrorCategory::Transient),
            (ClientError::MissingSender, ErrorCategory::Configuration),
        ];

        for (err, expected) in cases {
            assert_eq!(err.category(), expected, "{err}");
        }
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::UserDeclined.is_retryable());
        assert!(!ErrorCategory::Timeout.is_retryable());
        assert!(!ClientError::MissingSender.is_retryable());
    }
}
