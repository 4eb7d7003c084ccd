//! Encryption adapter contract.
//!
//! The encryption scheme itself lives outside this crate. An adapter turns a
//! cleartext value into a ciphertext handle plus an input proof that binds it
//! to a target contract and submitting account.

use signalpool_core::{Address, CiphertextHandle};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("encryption unavailable: no submitting account")]
    Unavailable,
    #[error("invalid encryption target {0}")]
    InvalidTarget(Address),
    #[error("encryption failed: {0}")]
    Failed(String),
    #[error("no encryption adapter configured")]
    NotConfigured,
}

/// Binding for an encrypted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionContext {
    pub target: Address,
    pub submitter: Option<Address>,
}

impl EncryptionContext {
    /// Check the binding before calling an adapter. Returns the submitter.
    pub fn validate(&self) -> Result<Address, EncryptionError> {
        let submitter = self.submitter.ok_or(EncryptionError::Unavailable)?;
        if self.target == Address::ZERO {
            return Err(EncryptionError::InvalidTarget(self.target));
        }
        Ok(submitter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: CiphertextHandle,
    pub proof: Vec<u8>,
}

#[async_trait::async_trait]
pub trait EncryptionAdapter: Send + Sync {
    /// Encrypt a 32-bit value for `context`. Called once per contribution.
    async fn encrypt(
        &self,
        value: u32,
        context: &EncryptionContext,
    ) -> Result<EncryptedInput, EncryptionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let ok = EncryptionContext {
            target: Address::repeat_byte(0x01),
            submitter: Some(Address::repeat_byte(0x02)),
        };
        assert_eq!(ok.validate().unwrap(), Address::repeat_byte(0x02));

        let no_submitter = EncryptionContext {
            submitter: None,
            ..ok
        };
        assert_eq!(no_submitter.validate(), Err(EncryptionError::Unavailable));

        let zero_target = EncryptionContext {
            target: Address::ZERO,
            ..ok
        };
        assert_eq!(
            zero_target.validate(),
            Err(EncryptionError::InvalidTarget(Address::ZERO))
        );
    }
}
